//! Compact protocol
//!
//! The Compact protocol trades the fixed widths of the Binary protocol for
//! a denser encoding:
//!
//!   * integers wider than a byte are zigzag varints (see [`crate::varint`])
//!   * field ids are encoded as a delta from the previous field id of the
//!     same struct whenever that delta is in `1..=15`
//!   * type identifiers are 4-bit nibbles, packed alongside a delta or a
//!     small container size in a single byte
//!   * bool struct fields carry their value in the type nibble of the field
//!     header, and have no separate value byte
//!
//! # Layout
//!
//! | Construct    | Encoding                                                    |
//! |--------------|-------------------------------------------------------------|
//! | field header | `delta << 4 \| type` if `1 <= delta <= 15`, else `type` then zigzag varint id |
//! | struct end   | `0x00`                                                      |
//! | list / set   | `size << 4 \| elem` if `size <= 14`, else `0xF0 \| elem` then varint size |
//! | map          | `0x00` if empty, else varint size then `key << 4 \| value`  |
//! | bool         | in a field header: type `1` (true) or `2` (false); elsewhere one byte with the same values |
//! | i16/i32/i64  | zigzag varint                                               |
//! | double/float | 8/4 bytes, little-endian IEEE-754 bit pattern               |
//! | string/binary| varint length, bytes                                        |
//!
//! # Field Id Scopes
//!
//! The previous field id is tracked per open struct in a
//! [`FieldIdScopes`] stack; beginning a struct saves the enclosing struct's
//! previous id and resets it to zero, and ending a struct restores it.

use crate::conv::target::Target;
use crate::error::{MalformedError, NestingError, OverflowError, ProtocolResult};
use crate::internal::{FrameStack, Stack};
use crate::parse::Source;
use crate::tag::{header_size, FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};
use crate::varint;

use super::{private, Format, Limits, Protocol, ProtocolReader, ProtocolWriter};

/// Marker type for the Compact format
#[derive(Clone, Copy, Debug, Default)]
pub struct Compact;

impl private::Sealed for Compact {}

impl Format for Compact {
    const PROTOCOL: Protocol = Protocol::Compact;
}

const TYPE_STOP: u8 = 0x00;
const TYPE_BOOL_TRUE: u8 = 0x01;
const TYPE_BOOL_FALSE: u8 = 0x02;
const TYPE_BYTE: u8 = 0x03;
const TYPE_I16: u8 = 0x04;
const TYPE_I32: u8 = 0x05;
const TYPE_I64: u8 = 0x06;
const TYPE_DOUBLE: u8 = 0x07;
const TYPE_BINARY: u8 = 0x08;
const TYPE_LIST: u8 = 0x09;
const TYPE_SET: u8 = 0x0a;
const TYPE_MAP: u8 = 0x0b;
const TYPE_STRUCT: u8 = 0x0c;
const TYPE_FLOAT: u8 = 0x0d;

/// Largest container size that fits in the high nibble of a list header
const SHORT_LIST_MAX: u32 = 14;
/// Largest field-id delta that fits in the high nibble of a field header
const SHORT_DELTA_MAX: i32 = 15;

/// Returns the Compact type nibble of `tag`
///
/// Bools outside of field headers are always described by the `true` nibble.
#[must_use]
pub const fn compact_type(tag: TypeTag) -> u8 {
    match tag {
        TypeTag::Stop => TYPE_STOP,
        TypeTag::Bool => TYPE_BOOL_TRUE,
        TypeTag::Byte => TYPE_BYTE,
        TypeTag::I16 => TYPE_I16,
        TypeTag::I32 => TYPE_I32,
        TypeTag::I64 => TYPE_I64,
        TypeTag::Double => TYPE_DOUBLE,
        TypeTag::String | TypeTag::Binary => TYPE_BINARY,
        TypeTag::List => TYPE_LIST,
        TypeTag::Set => TYPE_SET,
        TypeTag::Map => TYPE_MAP,
        TypeTag::Struct => TYPE_STRUCT,
        TypeTag::Float => TYPE_FLOAT,
    }
}

/// Interprets a Compact type nibble
pub fn from_compact_type(nibble: u8) -> ProtocolResult<TypeTag> {
    Ok(match nibble {
        TYPE_STOP => TypeTag::Stop,
        TYPE_BOOL_TRUE | TYPE_BOOL_FALSE => TypeTag::Bool,
        TYPE_BYTE => TypeTag::Byte,
        TYPE_I16 => TypeTag::I16,
        TYPE_I32 => TypeTag::I32,
        TYPE_I64 => TypeTag::I64,
        TYPE_DOUBLE => TypeTag::Double,
        TYPE_BINARY => TypeTag::String,
        TYPE_LIST => TypeTag::List,
        TYPE_SET => TypeTag::Set,
        TYPE_MAP => TypeTag::Map,
        TYPE_STRUCT => TypeTag::Struct,
        TYPE_FLOAT => TypeTag::Float,
        id => {
            return Err(MalformedError::InvalidTypeId {
                protocol: "compact",
                id,
            }
            .into())
        }
    })
}

/// Stack of previous-field-id values, one per open struct
///
/// The current struct's previous id is held in `last`; the ids of every
/// enclosing struct are saved on the stack. The depth of the stack is
/// therefore the number of structs currently open, and is zero whenever
/// no struct is being read or written.
#[derive(Debug, Default, Clone)]
pub struct FieldIdScopes {
    saved: FrameStack<i16>,
    last: i16,
}

impl FieldIdScopes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new struct scope, failing if `max_depth` scopes are already open
    pub fn begin(&mut self, max_depth: usize) -> ProtocolResult<()> {
        self.saved.push_validated(self.last, |depth, _| {
            (depth >= max_depth).then_some(NestingError::DepthExceeded { limit: max_depth })
        })?;
        self.last = 0;
        Ok(())
    }

    /// Closes the innermost struct scope, restoring the enclosing one
    pub fn end(&mut self) -> ProtocolResult<()> {
        match Stack::pop(&mut self.saved) {
            Some(last) => {
                self.last = last;
                Ok(())
            }
            None => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    /// Previous field id in the innermost scope
    #[must_use]
    pub fn last(&self) -> i16 {
        self.last
    }

    pub fn set_last(&mut self, id: i16) {
        self.last = id;
    }

    /// Number of open struct scopes
    #[must_use]
    pub fn depth(&self) -> usize {
        self.saved.depth()
    }

    /// Returns the short-form delta for a field `id` following the
    /// previous id of the innermost scope, if one applies
    #[must_use]
    pub fn short_delta(&self, id: i16) -> Option<u8> {
        let delta = i32::from(id) - i32::from(self.last);
        (1..=SHORT_DELTA_MAX).contains(&delta).then_some(delta as u8)
    }
}

/// Compact protocol writer over an arbitrary [`Target`]
#[derive(Debug, Default)]
pub struct CompactWriter<U: Target> {
    buf: U,
    scopes: FieldIdScopes,
    pending_bool: Option<i16>,
}

impl<U: Target> CompactWriter<U> {
    pub fn new(buf: U) -> Self {
        Self {
            buf,
            scopes: FieldIdScopes::new(),
            pending_bool: None,
        }
    }

    pub fn get_ref(&self) -> &U {
        &self.buf
    }

    pub fn into_inner(self) -> U {
        self.buf
    }

    pub fn scopes(&self) -> &FieldIdScopes {
        &self.scopes
    }

    fn write_field_header(&mut self, id: i16, ty: u8) -> usize {
        let n = match self.scopes.short_delta(id) {
            Some(delta) => self.buf.push_one(delta << 4 | ty),
            None => {
                self.buf.push_one(ty)
                    + varint::write(&mut self.buf, u64::from(varint::zigzag_32(i32::from(id))))
            }
        };
        self.scopes.set_last(id);
        n
    }

    fn write_collection_begin(&mut self, elem: TypeTag, size: u32) -> ProtocolResult<usize> {
        let size = header_size(size as usize)?;
        let ty = compact_type(elem);
        if size <= SHORT_LIST_MAX {
            Ok(self.buf.push_one((size as u8) << 4 | ty))
        } else {
            Ok(self.buf.push_one(0xf0 | ty) + varint::write(&mut self.buf, u64::from(size)))
        }
    }
}

impl<U: Target> private::Sealed for CompactWriter<U> {}

impl<U: Target> ProtocolWriter for CompactWriter<U> {
    const PROTOCOL: Protocol = Protocol::Compact;

    fn write_struct_begin(&mut self, _name: &str) -> ProtocolResult<usize> {
        self.scopes.begin(usize::MAX)?;
        Ok(0)
    }

    fn write_struct_end(&mut self) -> ProtocolResult<usize> {
        self.scopes.end()?;
        Ok(0)
    }

    fn write_field_begin(&mut self, id: i16, tag: TypeTag) -> ProtocolResult<usize> {
        if tag == TypeTag::Bool {
            // the header is emitted together with the value in write_bool
            self.pending_bool = Some(id);
            Ok(0)
        } else {
            Ok(self.write_field_header(id, compact_type(tag)))
        }
    }

    fn write_field_end(&mut self) -> ProtocolResult<usize> {
        match self.pending_bool {
            Some(_) => Err(NestingError::Misplaced("bool field without a value").into()),
            None => Ok(0),
        }
    }

    fn write_field_stop(&mut self) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(TYPE_STOP))
    }

    fn write_list_begin(&mut self, header: ListHeader) -> ProtocolResult<usize> {
        self.write_collection_begin(header.elem, header.size)
    }

    fn write_list_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_set_begin(&mut self, header: SetHeader) -> ProtocolResult<usize> {
        self.write_collection_begin(header.elem, header.size)
    }

    fn write_set_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_map_begin(&mut self, header: MapHeader) -> ProtocolResult<usize> {
        let size = header_size(header.size as usize)?;
        if size == 0 {
            Ok(self.buf.push_one(0))
        } else {
            Ok(varint::write(&mut self.buf, u64::from(size))
                + self
                    .buf
                    .push_one(compact_type(header.key) << 4 | compact_type(header.value)))
        }
    }

    fn write_map_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_bool(&mut self, val: bool) -> ProtocolResult<usize> {
        let ty = if val { TYPE_BOOL_TRUE } else { TYPE_BOOL_FALSE };
        match self.pending_bool.take() {
            Some(id) => Ok(self.write_field_header(id, ty)),
            None => Ok(self.buf.push_one(ty)),
        }
    }

    fn write_byte(&mut self, val: i8) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(val as u8))
    }

    fn write_i16(&mut self, val: i16) -> ProtocolResult<usize> {
        let raw = varint::zigzag_32(i32::from(val));
        Ok(varint::write(&mut self.buf, u64::from(raw)))
    }

    fn write_i32(&mut self, val: i32) -> ProtocolResult<usize> {
        Ok(varint::write(&mut self.buf, u64::from(varint::zigzag_32(val))))
    }

    fn write_i64(&mut self, val: i64) -> ProtocolResult<usize> {
        Ok(varint::write(&mut self.buf, varint::zigzag_64(val)))
    }

    fn write_double(&mut self, val: f64) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_bits().to_le_bytes()))
    }

    fn write_float(&mut self, val: f32) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_bits().to_le_bytes()))
    }

    fn write_string(&mut self, val: &str) -> ProtocolResult<usize> {
        self.write_binary(val.as_bytes())
    }

    fn write_binary(&mut self, val: &[u8]) -> ProtocolResult<usize> {
        let len = header_size(val.len())?;
        Ok(varint::write(&mut self.buf, u64::from(len)) + self.buf.push_all(val))
    }
}

/// Compact protocol reader over an arbitrary [`Source`]
#[derive(Debug)]
pub struct CompactReader<S: Source> {
    src: S,
    limits: Limits,
    scopes: FieldIdScopes,
    pending_bool: Option<bool>,
}

impl<S: Source> CompactReader<S> {
    pub fn new(src: S) -> Self {
        Self::with_limits(src, Limits::default())
    }

    pub fn with_limits(src: S, limits: Limits) -> Self {
        Self {
            src,
            limits,
            scopes: FieldIdScopes::new(),
            pending_bool: None,
        }
    }

    pub fn into_inner(self) -> S {
        self.src
    }

    pub fn scopes(&self) -> &FieldIdScopes {
        &self.scopes
    }

    fn read_size(&mut self) -> ProtocolResult<u32> {
        let size = varint::read_u32(&mut self.src)?;
        if size > i32::MAX as u32 {
            return Err(OverflowError::OutOfRange {
                tag: TypeTag::I32,
                value: i128::from(size),
            }
            .into());
        }
        self.limits.check_container(size as usize)?;
        Ok(size)
    }

    fn read_len(&mut self) -> ProtocolResult<usize> {
        let len = varint::read_u32(&mut self.src)?;
        if len > i32::MAX as u32 {
            return Err(OverflowError::OutOfRange {
                tag: TypeTag::I32,
                value: i128::from(len),
            }
            .into());
        }
        self.limits.check_string(len as usize)?;
        Ok(len as usize)
    }

    fn read_collection_begin(&mut self) -> ProtocolResult<(TypeTag, u32)> {
        let lead = self.src.consume_byte()?;
        let elem = from_compact_type(lead & 0x0f)?;
        let short = u32::from(lead >> 4);
        let size = if short == 0x0f {
            self.read_size()?
        } else {
            self.limits.check_container(short as usize)?;
            short
        };
        Ok((elem, size))
    }
}

impl<S: Source> private::Sealed for CompactReader<S> {}

impl<S: Source> ProtocolReader for CompactReader<S> {
    const PROTOCOL: Protocol = Protocol::Compact;

    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn position(&self) -> usize {
        self.src.offset()
    }

    fn trailing(&mut self) -> usize {
        self.src.remainder()
    }

    fn read_struct_begin(&mut self) -> ProtocolResult<()> {
        self.scopes.begin(self.limits.max_depth)
    }

    fn read_struct_end(&mut self) -> ProtocolResult<()> {
        self.scopes.end()
    }

    fn read_field_begin(&mut self) -> ProtocolResult<FieldHeader> {
        let byte = self.src.consume_byte()?;
        let ty = byte & 0x0f;
        if ty == TYPE_STOP {
            return Ok(FieldHeader::STOP);
        }
        let delta = byte >> 4;
        let id = if delta == 0 {
            varint::read_i16(&mut self.src)?
        } else {
            self.scopes
                .last()
                .checked_add(i16::from(delta))
                .ok_or(OverflowError::OutOfRange {
                    tag: TypeTag::I16,
                    value: i128::from(self.scopes.last()) + i128::from(delta),
                })?
        };
        let tag = from_compact_type(ty)?;
        if tag == TypeTag::Bool {
            self.pending_bool = Some(ty == TYPE_BOOL_TRUE);
        }
        self.scopes.set_last(id);
        Ok(FieldHeader::new(id, tag))
    }

    fn read_field_end(&mut self) -> ProtocolResult<()> {
        self.pending_bool = None;
        Ok(())
    }

    fn read_list_begin(&mut self) -> ProtocolResult<ListHeader> {
        let (elem, size) = self.read_collection_begin()?;
        Ok(ListHeader::new(elem, size))
    }

    fn read_list_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> ProtocolResult<SetHeader> {
        let (elem, size) = self.read_collection_begin()?;
        Ok(SetHeader::new(elem, size))
    }

    fn read_set_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> ProtocolResult<MapHeader> {
        let size = self.read_size()?;
        if size == 0 {
            return Ok(MapHeader::new(TypeTag::Stop, TypeTag::Stop, 0));
        }
        let kv = self.src.consume_byte()?;
        let key = from_compact_type(kv >> 4)?;
        let value = from_compact_type(kv & 0x0f)?;
        Ok(MapHeader::new(key, value, size))
    }

    fn read_map_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> ProtocolResult<bool> {
        if let Some(val) = self.pending_bool.take() {
            return Ok(val);
        }
        match self.src.consume_byte()? {
            TYPE_BOOL_TRUE => Ok(true),
            // 0 is written by some older implementations for false
            TYPE_BOOL_FALSE | 0 => Ok(false),
            byte => Err(MalformedError::InvalidBoolean(byte).into()),
        }
    }

    fn read_byte(&mut self) -> ProtocolResult<i8> {
        self.src.take_i8()
    }

    fn read_i16(&mut self) -> ProtocolResult<i16> {
        varint::read_i16(&mut self.src)
    }

    fn read_i32(&mut self) -> ProtocolResult<i32> {
        varint::read_i32(&mut self.src)
    }

    fn read_i64(&mut self) -> ProtocolResult<i64> {
        varint::read_i64(&mut self.src)
    }

    fn read_double(&mut self) -> ProtocolResult<f64> {
        self.src
            .consume_arr::<8>()
            .map(|b| f64::from_bits(u64::from_le_bytes(b)))
    }

    fn read_float(&mut self) -> ProtocolResult<f32> {
        self.src
            .consume_arr::<4>()
            .map(|b| f32::from_bits(u32::from_le_bytes(b)))
    }

    fn read_string(&mut self) -> ProtocolResult<String> {
        let bytes = self.read_binary()?;
        Ok(String::from_utf8(bytes)?)
    }

    fn read_binary(&mut self) -> ProtocolResult<Vec<u8>> {
        let len = self.read_len()?;
        self.src.take_dynamic(len)
    }

    fn skip_scalar(&mut self, tag: TypeTag) -> ProtocolResult<()> {
        match tag {
            TypeTag::Bool => self.read_bool().map(drop),
            TypeTag::Byte => self.src.discard(1),
            TypeTag::I16 => varint::read(&mut self.src, varint::MAX_BYTES_16).map(drop),
            TypeTag::I32 => varint::read(&mut self.src, varint::MAX_BYTES_32).map(drop),
            TypeTag::I64 => varint::read(&mut self.src, varint::MAX_BYTES_64).map(drop),
            TypeTag::Double => self.src.discard(8),
            TypeTag::Float => self.src.discard(4),
            TypeTag::String | TypeTag::Binary => {
                let len = self.read_len()?;
                self.src.discard(len)
            }
            _ => Err(NestingError::Misplaced("skipping a non-scalar tag as a scalar").into()),
        }
    }
}
