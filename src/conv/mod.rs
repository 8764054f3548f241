//! Core of the record-conversion API
//!
//! This module contains definitions for the high-level transcoding traits
//! [`Encode`] and [`Decode`], which are motivationally equivalent to the
//! `Serialize` and `Deserialize` traits defined in `serde`. They form the
//! boundary between record types (generated or hand-written) and the
//! protocol readers and writers of [`crate::protocol`]: a record encodes
//! itself by driving a [`ProtocolWriter`] through the struct call sequence,
//! and decodes itself by driving a [`ProtocolReader`] through the mirror
//! sequence, skipping whatever fields it does not recognize.
//!
//! Implementations are provided here for the scalar types, for `String`
//! and `str`, for [`Bytes`](crate::schema::Bytes), and for the standard
//! collections that correspond to the three container types:
//!
//! | Rust type                      | Tag      |
//! |--------------------------------|----------|
//! | `Vec<T>`                       | `list`   |
//! | `BTreeSet<T>`, `HashSet<T>`    | `set`    |
//! | `BTreeMap<K, V>`, `HashMap<K, V>` | `map` |
//!
//! The trait [`Typed`] carries the tag of a type statically, which is
//! required of container elements so that an empty container can still
//! write a complete header.
//!
//! An additional submodule, [`target`], offers an abstraction along the
//! lines of [`std::io::Write`], namely the [`target::Target`] trait. This is
//! the dual to [`crate::parse::Source`], and the generic bound over which
//! every protocol writer is defined.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::error::{MalformedError, ProtocolResult};
use crate::protocol::{Format, ProtocolReader, ProtocolWriter};
use crate::tag::{header_size, ListHeader, MapHeader, SetHeader, TypeTag};

pub mod error;
pub mod target;

pub use error::{DecodeError, DecodeResult};

/// Upper bound on the capacity reserved up-front for a decoded container
///
/// Larger containers grow as their elements are actually read, so that a
/// corrupt size header cannot trigger a large allocation on its own.
const PREALLOC_MAX: usize = 1024;

/// Types whose protocol tag is known statically
pub trait Typed {
    const TAG: TypeTag;
}

/// Trait for types that can be written through any [`ProtocolWriter`]
pub trait Encode {
    /// Tag under which this value is written
    ///
    /// For [`Typed`] types this is always `Self::TAG`; dynamically-shaped
    /// values report the tag of their current variant.
    fn tag(&self) -> TypeTag;

    /// Drives `w` through the call sequence for this value, returning the
    /// total number of bytes written
    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize>;
}

/// Trait for types that can be read through any [`ProtocolReader`]
pub trait Decode: Sized {
    /// Drives `r` through the call sequence for a value of this type
    ///
    /// Implementations for record types skip fields they do not recognize,
    /// and fail rather than produce a partially-populated value when the
    /// stream cannot be read.
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self>;
}

/// Extension trait for `Encode` computing exact serialized lengths
pub trait EncodeLength: Encode {
    /// Computes, without allocation, the number of bytes in the serialized
    /// form of `self` under the format `F`.
    ///
    /// The value is written through a writer over
    /// [`ByteCounter`](target::ByteCounter), whose return value is the
    /// number of bytes that would have been written.
    fn serialized_size<F: Format>(&self) -> ProtocolResult<usize> {
        F::PROTOCOL.serialized_size(self)
    }

    /// Serializes `self` under the format `F` into a freshly-allocated buffer
    fn to_bytes<F: Format>(&self) -> ProtocolResult<Vec<u8>> {
        F::PROTOCOL.serialize(self)
    }
}

impl<T: Encode + ?Sized> EncodeLength for T {}

/// Checks the element tag of a container header against the tag expected
/// by the schema, tolerating any tag on an empty container
pub(crate) fn expect_elem(expected: TypeTag, actual: TypeTag, size: u32) -> ProtocolResult<()> {
    if size == 0 || actual.matches(expected) {
        Ok(())
    } else {
        Err(MalformedError::TypeMismatch { expected, actual }.into())
    }
}

#[inline]
pub(crate) fn prealloc(size: u32) -> usize {
    (size as usize).min(PREALLOC_MAX)
}

macro_rules! scalar_impl {
    ($t:ty, $tag:ident, $write:ident, $read:ident) => {
        impl Typed for $t {
            const TAG: TypeTag = TypeTag::$tag;
        }

        impl Encode for $t {
            #[inline]
            fn tag(&self) -> TypeTag {
                TypeTag::$tag
            }

            #[inline]
            fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
                w.$write(*self)
            }
        }

        impl Decode for $t {
            #[inline]
            fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
                r.$read()
            }
        }
    };
}

scalar_impl!(bool, Bool, write_bool, read_bool);
scalar_impl!(i8, Byte, write_byte, read_byte);
scalar_impl!(i16, I16, write_i16, read_i16);
scalar_impl!(i32, I32, write_i32, read_i32);
scalar_impl!(i64, I64, write_i64, read_i64);
scalar_impl!(f64, Double, write_double, read_double);
scalar_impl!(f32, Float, write_float, read_float);

impl Typed for str {
    const TAG: TypeTag = TypeTag::String;
}

impl Encode for str {
    fn tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        w.write_string(self)
    }
}

impl Typed for String {
    const TAG: TypeTag = TypeTag::String;
}

impl Encode for String {
    fn tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        w.write_string(self)
    }
}

impl Decode for String {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        r.read_string()
    }
}

impl<T: Typed + ?Sized> Typed for Box<T> {
    const TAG: TypeTag = T::TAG;
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn tag(&self) -> TypeTag {
        self.as_ref().tag()
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        self.as_ref().write(w)
    }
}

impl<T: Decode> Decode for Box<T> {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        T::read(r).map(Box::new)
    }
}

impl<T: Typed> Typed for Vec<T> {
    const TAG: TypeTag = TypeTag::List;
}

impl<T: Encode + Typed> Encode for Vec<T> {
    fn tag(&self) -> TypeTag {
        TypeTag::List
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        let mut n = w.write_list_begin(ListHeader::new(T::TAG, header_size(self.len())?))?;
        for elem in self {
            n += elem.write(w)?;
        }
        Ok(n + w.write_list_end()?)
    }
}

impl<T: Decode + Typed> Decode for Vec<T> {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        let header = r.read_list_begin()?;
        expect_elem(T::TAG, header.elem, header.size)?;
        let mut ret = Vec::with_capacity(prealloc(header.size));
        for _ in 0..header.size {
            ret.push(T::read(r)?);
        }
        r.read_list_end()?;
        Ok(ret)
    }
}

macro_rules! set_impl {
    ($set:ident, $($bound:ident),+) => {
        impl<T: Typed> Typed for $set<T> {
            const TAG: TypeTag = TypeTag::Set;
        }

        impl<T: Encode + Typed> Encode for $set<T> {
            fn tag(&self) -> TypeTag {
                TypeTag::Set
            }

            fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
                let mut n = w.write_set_begin(SetHeader::new(T::TAG, header_size(self.len())?))?;
                for elem in self {
                    n += elem.write(w)?;
                }
                Ok(n + w.write_set_end()?)
            }
        }

        impl<T: Decode + Typed $(+ $bound)+> Decode for $set<T> {
            fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
                let header = r.read_set_begin()?;
                expect_elem(T::TAG, header.elem, header.size)?;
                let mut ret = $set::new();
                for _ in 0..header.size {
                    ret.insert(T::read(r)?);
                }
                r.read_set_end()?;
                Ok(ret)
            }
        }
    };
}

set_impl!(BTreeSet, Ord);
set_impl!(HashSet, Eq, Hash);

macro_rules! map_impl {
    ($map:ident, $($bound:ident),+) => {
        impl<K: Typed, V: Typed> Typed for $map<K, V> {
            const TAG: TypeTag = TypeTag::Map;
        }

        impl<K: Encode + Typed, V: Encode + Typed> Encode for $map<K, V> {
            fn tag(&self) -> TypeTag {
                TypeTag::Map
            }

            fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
                let header = MapHeader::new(K::TAG, V::TAG, header_size(self.len())?);
                let mut n = w.write_map_begin(header)?;
                for (k, v) in self {
                    n += k.write(w)? + v.write(w)?;
                }
                Ok(n + w.write_map_end()?)
            }
        }

        impl<K: Decode + Typed $(+ $bound)+, V: Decode + Typed> Decode for $map<K, V> {
            fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
                let header = r.read_map_begin()?;
                expect_elem(K::TAG, header.key, header.size)?;
                expect_elem(V::TAG, header.value, header.size)?;
                let mut ret = $map::new();
                for _ in 0..header.size {
                    let k = K::read(r)?;
                    let v = V::read(r)?;
                    ret.insert(k, v);
                }
                r.read_map_end()?;
                Ok(ret)
            }
        }
    };
}

map_impl!(BTreeMap, Ord);
map_impl!(HashMap, Eq, Hash);
