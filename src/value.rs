//! Format-agnostic tree of structured values
//!
//! [`Value`] represents any encodable value whose shape is only known at
//! run time. It can be written through any protocol writer directly, via
//! its [`Encode`] implementation, and read back through any protocol
//! reader given a [`TypeDesc`] describing the expected shape.
//!
//! Containers carry the tags of their elements, so that an empty container
//! still has a complete header, and so that a writer can reject a
//! container holding elements of a different type than its header claims.

use crate::conv::{expect_elem, prealloc, Encode};
use crate::error::{MalformedError, NestingError, ProtocolResult};
use crate::protocol::{ProtocolReader, ProtocolWriter};
use crate::schema::TypeDesc;
use crate::skip::skip_at;
use crate::tag::{header_size, FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};

/// Dynamically-shaped structured value
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Bool(bool),
    Byte(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Double(f64),
    Float(f32),
    String(String),
    Binary(Vec<u8>),
    List(List),
    Set(List),
    Map(Map),
    Struct(Struct),
}

/// Elements of a list or set, with their common tag
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct List {
    pub elem: TypeTag,
    pub items: Vec<Value>,
}

/// Entries of a map, with the common tags of their keys and values
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Map {
    pub key: TypeTag,
    pub value: TypeTag,
    pub entries: Vec<(Value, Value)>,
}

/// Fields of a struct, in the order they are written
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Struct {
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde_impls", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub id: i16,
    pub value: Value,
}

impl Field {
    #[must_use]
    pub fn header(&self) -> FieldHeader {
        FieldHeader::new(self.id, self.value.tag())
    }
}

impl Struct {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, returning the extended struct
    #[must_use]
    pub fn with(mut self, id: i16, value: impl Into<Value>) -> Self {
        self.fields.push(Field {
            id,
            value: value.into(),
        });
        self
    }

    /// Returns the value of the first field with the given id
    #[must_use]
    pub fn get(&self, id: i16) -> Option<&Value> {
        self.fields.iter().find(|f| f.id == id).map(|f| &f.value)
    }
}

impl List {
    #[must_use]
    pub fn new(elem: TypeTag, items: Vec<Value>) -> Self {
        Self { elem, items }
    }
}

impl Map {
    #[must_use]
    pub fn new(key: TypeTag, value: TypeTag, entries: Vec<(Value, Value)>) -> Self {
        Self {
            key,
            value,
            entries,
        }
    }
}

impl Value {
    /// Returns the tag of the current variant
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::Byte(_) => TypeTag::Byte,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::Double(_) => TypeTag::Double,
            Value::Float(_) => TypeTag::Float,
            Value::String(_) => TypeTag::String,
            Value::Binary(_) => TypeTag::Binary,
            Value::List(_) => TypeTag::List,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Struct(_) => TypeTag::Struct,
        }
    }

    #[must_use]
    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Reads a value of the shape described by `desc`
    ///
    /// Struct fields are read when their id is described and their wire tag
    /// matches the described type; every other field is skipped. A
    /// non-empty container whose element tags differ from the described
    /// ones is an error.
    pub fn read<R: ProtocolReader>(r: &mut R, desc: &TypeDesc) -> ProtocolResult<Value> {
        read_at(r, desc, 0)
    }
}

fn check_items(expected: TypeTag, items: &[Value]) -> ProtocolResult<()> {
    match items.iter().find(|v| !v.tag().matches(expected)) {
        Some(v) => Err(MalformedError::TypeMismatch {
            expected,
            actual: v.tag(),
        }
        .into()),
        None => Ok(()),
    }
}

impl Encode for Value {
    fn tag(&self) -> TypeTag {
        Value::tag(self)
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        match self {
            Value::Bool(b) => w.write_bool(*b),
            Value::Byte(n) => w.write_byte(*n),
            Value::I16(n) => w.write_i16(*n),
            Value::I32(n) => w.write_i32(*n),
            Value::I64(n) => w.write_i64(*n),
            Value::Double(d) => w.write_double(*d),
            Value::Float(d) => w.write_float(*d),
            Value::String(s) => w.write_string(s),
            Value::Binary(b) => w.write_binary(b),
            Value::List(list) => {
                check_items(list.elem, &list.items)?;
                let size = header_size(list.items.len())?;
                let mut n = w.write_list_begin(ListHeader::new(list.elem, size))?;
                for item in &list.items {
                    n += item.write(w)?;
                }
                Ok(n + w.write_list_end()?)
            }
            Value::Set(set) => {
                check_items(set.elem, &set.items)?;
                let size = header_size(set.items.len())?;
                let mut n = w.write_set_begin(SetHeader::new(set.elem, size))?;
                for item in &set.items {
                    n += item.write(w)?;
                }
                Ok(n + w.write_set_end()?)
            }
            Value::Map(map) => {
                for (k, v) in &map.entries {
                    check_items(map.key, std::slice::from_ref(k))?;
                    check_items(map.value, std::slice::from_ref(v))?;
                }
                let size = header_size(map.entries.len())?;
                let mut n = w.write_map_begin(MapHeader::new(map.key, map.value, size))?;
                for (k, v) in &map.entries {
                    n += k.write(w)? + v.write(w)?;
                }
                Ok(n + w.write_map_end()?)
            }
            Value::Struct(s) => {
                let mut n = w.write_struct_begin("")?;
                for field in &s.fields {
                    n += w.write_field(field.id, &field.value)?;
                }
                Ok(n + w.write_field_stop()? + w.write_struct_end()?)
            }
        }
    }
}

fn read_at<R: ProtocolReader>(r: &mut R, desc: &TypeDesc, depth: usize) -> ProtocolResult<Value> {
    let max_depth = r.limits().max_depth;
    if desc.tag().is_composite() && depth >= max_depth {
        return Err(NestingError::DepthExceeded { limit: max_depth }.into());
    }
    Ok(match desc {
        TypeDesc::Bool => Value::Bool(r.read_bool()?),
        TypeDesc::Byte => Value::Byte(r.read_byte()?),
        TypeDesc::I16 => Value::I16(r.read_i16()?),
        TypeDesc::I32 => Value::I32(r.read_i32()?),
        TypeDesc::I64 => Value::I64(r.read_i64()?),
        TypeDesc::Double => Value::Double(r.read_double()?),
        TypeDesc::Float => Value::Float(r.read_float()?),
        TypeDesc::String => Value::String(r.read_string()?),
        TypeDesc::Binary => Value::Binary(r.read_binary()?),
        TypeDesc::List(elem) => {
            let header = r.read_list_begin()?;
            expect_elem(elem.tag(), header.elem, header.size)?;
            let items = read_items(r, elem, header.size, depth)?;
            r.read_list_end()?;
            Value::List(List::new(elem.tag(), items))
        }
        TypeDesc::Set(elem) => {
            let header = r.read_set_begin()?;
            expect_elem(elem.tag(), header.elem, header.size)?;
            let items = read_items(r, elem, header.size, depth)?;
            r.read_set_end()?;
            Value::Set(List::new(elem.tag(), items))
        }
        TypeDesc::Map(key, value) => {
            let header = r.read_map_begin()?;
            expect_elem(key.tag(), header.key, header.size)?;
            expect_elem(value.tag(), header.value, header.size)?;
            let mut entries = Vec::with_capacity(prealloc(header.size));
            for _ in 0..header.size {
                let k = read_at(r, key, depth + 1)?;
                let v = read_at(r, value, depth + 1)?;
                entries.push((k, v));
            }
            r.read_map_end()?;
            Value::Map(Map::new(key.tag(), value.tag(), entries))
        }
        TypeDesc::Struct(sd) => {
            let mut fields = Vec::new();
            r.read_struct_begin()?;
            loop {
                let header = r.read_field_begin()?;
                if header.is_stop() {
                    break;
                }
                match sd.field(header.id) {
                    Some(fd) if header.tag.matches(fd.ty.tag()) => {
                        let value = read_at(r, &fd.ty, depth + 1)?;
                        fields.push(Field {
                            id: header.id,
                            value,
                        });
                    }
                    known => {
                        tracing::trace!(
                            record = %sd.name,
                            id = header.id,
                            tag = %header.tag,
                            described = known.is_some(),
                            "skipping field"
                        );
                        skip_at(r, header.tag, depth + 1, max_depth)?;
                    }
                }
                r.read_field_end()?;
            }
            r.read_struct_end()?;
            Value::Struct(Struct { fields })
        }
    })
}

fn read_items<R: ProtocolReader>(
    r: &mut R,
    elem: &TypeDesc,
    size: u32,
    depth: usize,
) -> ProtocolResult<Vec<Value>> {
    let mut items = Vec::with_capacity(prealloc(size));
    for _ in 0..size {
        items.push(read_at(r, elem, depth + 1)?);
    }
    Ok(items)
}

macro_rules! value_from {
    ($($t:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(val: $t) -> Self {
                    Value::$variant(val.into())
                }
            }
        )+
    };
}

value_from! {
    bool => Bool,
    i8 => Byte,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f64 => Double,
    f32 => Float,
    String => String,
    &str => String,
    Vec<u8> => Binary,
    Struct => Struct,
}
