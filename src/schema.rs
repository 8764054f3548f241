//! Schema descriptors and specialized schema types
//!
//! A protocol stream is not self-describing enough to be decoded into a
//! typed value on its own: the Binary and Compact protocols cannot tell a
//! string from a binary blob, and no protocol records the names of fields.
//! Generated record types carry this knowledge statically, through their
//! [`Decode`] implementations. For dynamically-shaped values, the same
//! knowledge is supplied at run time as a [`TypeDesc`].
//!
//! # Descriptors
//!
//! [`TypeDesc`] mirrors [`TypeTag`], except that container descriptors
//! carry the descriptors of their elements, and struct descriptors carry a
//! [`StructDesc`] listing every known field as a [`FieldDesc`]. Struct
//! descriptors are reference-counted, so that a record type shared by
//! several fields or containers is described without cloning its
//! descriptor at each use.
//!
//! Decoding a [`Value`](crate::value::Value) against a `StructDesc` reads
//! every field whose id is listed and whose wire tag matches the listed
//! type, and skips all other fields.
//!
//! # `Bytes`
//!
//! [`Bytes`] is a variable-length byte-sequence whose contents are otherwise
//! opaque. Because `Vec<u8>` is already the list-of-byte type, record fields
//! of the `binary` type use `Bytes` instead.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

#[cfg(feature = "serde_impls")]
use serde::{Deserialize, Serialize};

use crate::conv::{Decode, Encode, Typed};
use crate::error::ProtocolResult;
use crate::protocol::{ProtocolReader, ProtocolWriter};
use crate::tag::TypeTag;

/// Run-time description of the type of a value
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub enum TypeDesc {
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Float,
    String,
    Binary,
    List(Box<TypeDesc>),
    Set(Box<TypeDesc>),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Struct(Arc<StructDesc>),
}

impl TypeDesc {
    /// Returns the tag under which values of this type are written
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            TypeDesc::Bool => TypeTag::Bool,
            TypeDesc::Byte => TypeTag::Byte,
            TypeDesc::I16 => TypeTag::I16,
            TypeDesc::I32 => TypeTag::I32,
            TypeDesc::I64 => TypeTag::I64,
            TypeDesc::Double => TypeTag::Double,
            TypeDesc::Float => TypeTag::Float,
            TypeDesc::String => TypeTag::String,
            TypeDesc::Binary => TypeTag::Binary,
            TypeDesc::List(_) => TypeTag::List,
            TypeDesc::Set(_) => TypeTag::Set,
            TypeDesc::Map(_, _) => TypeTag::Map,
            TypeDesc::Struct(_) => TypeTag::Struct,
        }
    }

    #[must_use]
    pub fn list(elem: TypeDesc) -> Self {
        TypeDesc::List(Box::new(elem))
    }

    #[must_use]
    pub fn set(elem: TypeDesc) -> Self {
        TypeDesc::Set(Box::new(elem))
    }

    #[must_use]
    pub fn map(key: TypeDesc, value: TypeDesc) -> Self {
        TypeDesc::Map(Box::new(key), Box::new(value))
    }
}

impl From<StructDesc> for TypeDesc {
    fn from(desc: StructDesc) -> Self {
        TypeDesc::Struct(Arc::new(desc))
    }
}

impl From<Arc<StructDesc>> for TypeDesc {
    fn from(desc: Arc<StructDesc>) -> Self {
        TypeDesc::Struct(desc)
    }
}

/// Description of a record type: its name and its known fields
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct StructDesc {
    pub name: String,
    pub fields: Vec<FieldDesc>,
}

impl StructDesc {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field to the descriptor, returning the extended descriptor
    #[must_use]
    pub fn with_field(mut self, id: i16, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.fields.push(FieldDesc {
            id,
            name: name.into(),
            ty,
        });
        self
    }

    /// Looks up a field by id
    #[must_use]
    pub fn field(&self, id: i16) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Description of a single field of a record type
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(Serialize, Deserialize))]
pub struct FieldDesc {
    pub id: i16,
    pub name: String,
    pub ty: TypeDesc,
}

/// Variable-length opaque byte-sequence, written with the `binary` tag
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Bytes(Vec<u8>);

#[cfg(feature = "serde_impls")]
impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl Bytes {
    /// Empty blob; does not allocate
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub const fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Unwraps the underlying buffer
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Bytes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl From<Vec<u8>> for Bytes {
    #[inline]
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<Bytes> for Vec<u8> {
    #[inline]
    fn from(val: Bytes) -> Self {
        val.0
    }
}

impl<const N: usize> From<[u8; N]> for Bytes {
    #[inline]
    fn from(bytes: [u8; N]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&'_ [u8]> for Bytes {
    #[inline]
    fn from(bytes: &'_ [u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Typed for Bytes {
    const TAG: TypeTag = TypeTag::Binary;
}

impl Encode for Bytes {
    fn tag(&self) -> TypeTag {
        Self::TAG
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        w.write_binary(&self.0)
    }
}

impl Decode for Bytes {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        r.read_binary().map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn descriptor_tags() {
        let point = StructDesc::new("Point")
            .with_field(1, "x", TypeDesc::I32)
            .with_field(2, "y", TypeDesc::I32);
        assert_eq!(point.field(2).map(|f| f.name.as_str()), Some("y"));
        assert!(point.field(3).is_none());

        let ty = TypeDesc::map(TypeDesc::String, TypeDesc::list(point.into()));
        assert_eq!(ty.tag(), TypeTag::Map);
        match ty {
            TypeDesc::Map(k, v) => {
                assert_eq!(k.tag(), TypeTag::String);
                assert_eq!(v.tag(), TypeTag::List);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn bytes_conversions() {
        let b = Bytes::from([1u8, 2, 3]);
        assert_eq!(&*b, &[1, 2, 3]);
        assert_eq!(b.clone().into_vec(), vec![1, 2, 3]);
        assert_eq!(Vec::from(b), vec![1, 2, 3]);
    }
}
