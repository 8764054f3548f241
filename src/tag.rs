//! Type tags and the structural headers every protocol must express
//!
//! This module defines [`TypeTag`], the closed enumeration of primitive and
//! container types that can appear in an encoded stream, along with the
//! header records a reader returns and a writer consumes:
//! [`FieldHeader`], [`ListHeader`], [`SetHeader`], and [`MapHeader`].
//!
//! The Binary protocol's one-byte type identifiers are the canonical
//! numbering of the tags, and are defined here; the Compact and SimpleJSON
//! protocols keep their own mappings next to their codecs.
//!
//! # String and Binary
//!
//! `String` and `Binary` are distinct tags in the value model, but every
//! protocol writes them with the same type identifier. A reader that
//! discovers a header can therefore only ever report [`TypeTag::String`];
//! it is the schema of the consumer that decides whether the payload is
//! materialized as UTF-8 text or as opaque bytes. [`TypeTag::matches`]
//! encodes this equivalence.

use std::fmt::{Display, Formatter};

use crate::error::{MalformedError, ProtocolResult};

/// Closed enumeration of the types that can be carried in a field or
/// container element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeTag {
    /// Sentinel marking the end of a struct's fields; never a field type
    Stop,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    Float,
    String,
    Binary,
    List,
    Set,
    Map,
    Struct,
}

impl TypeTag {
    /// Returns the Binary protocol type identifier of this tag
    ///
    /// `String` and `Binary` share identifier `11`.
    #[must_use]
    pub const fn wire_id(self) -> u8 {
        match self {
            TypeTag::Stop => 0,
            TypeTag::Bool => 2,
            TypeTag::Byte => 3,
            TypeTag::Double => 4,
            TypeTag::I16 => 6,
            TypeTag::I32 => 8,
            TypeTag::I64 => 10,
            TypeTag::String | TypeTag::Binary => 11,
            TypeTag::Struct => 12,
            TypeTag::Map => 13,
            TypeTag::Set => 14,
            TypeTag::List => 15,
            TypeTag::Float => 19,
        }
    }

    /// Interprets a Binary protocol type identifier
    ///
    /// # Errors
    ///
    /// Returns `MalformedError::InvalidTypeId` for any byte not assigned
    /// to a tag.
    pub fn from_wire_id(id: u8) -> ProtocolResult<Self> {
        Ok(match id {
            0 => TypeTag::Stop,
            2 => TypeTag::Bool,
            3 => TypeTag::Byte,
            4 => TypeTag::Double,
            6 => TypeTag::I16,
            8 => TypeTag::I32,
            10 => TypeTag::I64,
            11 => TypeTag::String,
            12 => TypeTag::Struct,
            13 => TypeTag::Map,
            14 => TypeTag::Set,
            15 => TypeTag::List,
            19 => TypeTag::Float,
            _ => {
                return Err(MalformedError::InvalidTypeId {
                    protocol: "binary",
                    id,
                }
                .into())
            }
        })
    }

    /// Returns `true` if a value written with tag `self` can be read as
    /// a value of tag `other`
    ///
    /// This is equality, except that `String` and `Binary` are
    /// interchangeable.
    #[must_use]
    pub const fn matches(self, other: TypeTag) -> bool {
        self.wire_id() == other.wire_id()
    }

    /// Returns `true` for `List`, `Set`, `Map`, and `Struct`
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(
            self,
            TypeTag::List | TypeTag::Set | TypeTag::Map | TypeTag::Struct
        )
    }

    /// Number of bytes a value of this tag occupies in the Binary protocol,
    /// if that number does not depend on the value
    #[must_use]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            TypeTag::Bool | TypeTag::Byte => Some(1),
            TypeTag::I16 => Some(2),
            TypeTag::I32 | TypeTag::Float => Some(4),
            TypeTag::I64 | TypeTag::Double => Some(8),
            _ => None,
        }
    }

    /// Lowercase human-readable name of the tag
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TypeTag::Stop => "stop",
            TypeTag::Bool => "bool",
            TypeTag::Byte => "byte",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::Double => "double",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Binary => "binary",
            TypeTag::List => "list",
            TypeTag::Set => "set",
            TypeTag::Map => "map",
            TypeTag::Struct => "struct",
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Header preceding each field value of a struct
///
/// A header with `tag == TypeTag::Stop` marks the end of the struct; its
/// `id` is meaningless and is reported as `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldHeader {
    pub id: i16,
    pub tag: TypeTag,
}

impl FieldHeader {
    /// The end-of-fields marker
    pub const STOP: FieldHeader = FieldHeader {
        id: 0,
        tag: TypeTag::Stop,
    };

    #[must_use]
    pub const fn new(id: i16, tag: TypeTag) -> Self {
        Self { id, tag }
    }

    #[must_use]
    pub const fn is_stop(&self) -> bool {
        matches!(self.tag, TypeTag::Stop)
    }
}

/// Header preceding the elements of a list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListHeader {
    pub elem: TypeTag,
    pub size: u32,
}

/// Header preceding the elements of a set
///
/// Structurally identical to [`ListHeader`]; kept distinct so that the
/// call sequence of a writer says which container it is producing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SetHeader {
    pub elem: TypeTag,
    pub size: u32,
}

/// Header preceding the key-value pairs of a map
///
/// When `size == 0`, protocols that do not transmit the key and value
/// tags of empty maps report both as [`TypeTag::Stop`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapHeader {
    pub key: TypeTag,
    pub value: TypeTag,
    pub size: u32,
}

impl ListHeader {
    #[must_use]
    pub const fn new(elem: TypeTag, size: u32) -> Self {
        Self { elem, size }
    }
}

impl SetHeader {
    #[must_use]
    pub const fn new(elem: TypeTag, size: u32) -> Self {
        Self { elem, size }
    }
}

impl MapHeader {
    #[must_use]
    pub const fn new(key: TypeTag, value: TypeTag, size: u32) -> Self {
        Self { key, value, size }
    }
}

/// Converts the element count of an in-memory container into a header size
///
/// # Errors
///
/// Every protocol bounds sizes by `i32::MAX`; larger counts cannot be
/// written.
pub fn header_size(len: usize) -> ProtocolResult<u32> {
    if len > i32::MAX as usize {
        Err(crate::error::OverflowError::Unrepresentable { actual: len }.into())
    } else {
        Ok(len as u32)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [TypeTag; 14] = [
        TypeTag::Stop,
        TypeTag::Bool,
        TypeTag::Byte,
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::Double,
        TypeTag::Float,
        TypeTag::String,
        TypeTag::Binary,
        TypeTag::List,
        TypeTag::Set,
        TypeTag::Map,
        TypeTag::Struct,
    ];

    #[test]
    fn wire_ids_invert() {
        for tag in ALL {
            let back = TypeTag::from_wire_id(tag.wire_id()).unwrap();
            assert!(back.matches(tag), "{tag} came back as {back}");
        }
        assert_eq!(TypeTag::from_wire_id(11).unwrap(), TypeTag::String);
    }

    #[test]
    fn unassigned_ids_rejected() {
        for id in [1u8, 5, 7, 9, 16, 17, 18, 20, 0xff] {
            assert!(TypeTag::from_wire_id(id).is_err(), "id {id} accepted");
        }
    }

    #[test]
    fn string_binary_interchangeable() {
        assert!(TypeTag::String.matches(TypeTag::Binary));
        assert!(TypeTag::Binary.matches(TypeTag::String));
        assert!(!TypeTag::I32.matches(TypeTag::I64));
    }

    #[test]
    fn header_size_bounds() {
        assert_eq!(header_size(14).unwrap(), 14);
        assert!(header_size(i32::MAX as usize + 1).is_err());
    }
}
