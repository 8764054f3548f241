//! Binary protocol
//!
//! The Binary protocol is the simplest of the three formats: every scalar
//! has a fixed big-endian width, and every header is a fixed sequence of
//! type identifiers ([`TypeTag::wire_id`]) and 32-bit signed sizes.
//!
//! # Layout
//!
//! | Construct    | Encoding                                        |
//! |--------------|-------------------------------------------------|
//! | field header | `tag: u8`, `id: i16`                            |
//! | struct end   | `0x00`                                          |
//! | list / set   | `elem: u8`, `size: i32`, elements               |
//! | map          | `key: u8`, `value: u8`, `size: i32`, pairs      |
//! | bool         | `0x01` or `0x00`                                |
//! | byte         | one byte                                        |
//! | i16/i32/i64  | 2/4/8 bytes, big-endian two's complement        |
//! | double/float | 8/4 bytes, big-endian IEEE-754 bit pattern      |
//! | string/binary| `len: i32`, bytes                               |
//!
//! Struct begin and end, and the end of every field and container, write
//! nothing.

use crate::conv::target::Target;
use crate::error::{MalformedError, ProtocolResult};
use crate::parse::Source;
use crate::tag::{header_size, FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};

use super::{private, Format, Limits, Protocol, ProtocolReader, ProtocolWriter};

/// Marker type for the Binary format
#[derive(Clone, Copy, Debug, Default)]
pub struct Binary;

impl private::Sealed for Binary {}

impl Format for Binary {
    const PROTOCOL: Protocol = Protocol::Binary;
}

/// Binary protocol writer over an arbitrary [`Target`]
#[derive(Debug, Default)]
pub struct BinaryWriter<U: Target> {
    buf: U,
}

impl<U: Target> BinaryWriter<U> {
    pub fn new(buf: U) -> Self {
        Self { buf }
    }

    /// Returns a reference to the bytes written so far
    pub fn get_ref(&self) -> &U {
        &self.buf
    }

    pub fn into_inner(self) -> U {
        self.buf
    }

    fn write_size(&mut self, size: u32) -> ProtocolResult<usize> {
        let size = header_size(size as usize)?;
        Ok(self.buf.push_many((size as i32).to_be_bytes()))
    }
}

impl<U: Target> private::Sealed for BinaryWriter<U> {}

impl<U: Target> ProtocolWriter for BinaryWriter<U> {
    const PROTOCOL: Protocol = Protocol::Binary;

    fn write_struct_begin(&mut self, _name: &str) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_struct_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_field_begin(&mut self, id: i16, tag: TypeTag) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(tag.wire_id()) + self.buf.push_many(id.to_be_bytes()))
    }

    fn write_field_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_field_stop(&mut self) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(TypeTag::Stop.wire_id()))
    }

    fn write_list_begin(&mut self, header: ListHeader) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(header.elem.wire_id()) + self.write_size(header.size)?)
    }

    fn write_list_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_set_begin(&mut self, header: SetHeader) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(header.elem.wire_id()) + self.write_size(header.size)?)
    }

    fn write_set_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_map_begin(&mut self, header: MapHeader) -> ProtocolResult<usize> {
        Ok(self
            .buf
            .push_many([header.key.wire_id(), header.value.wire_id()])
            + self.write_size(header.size)?)
    }

    fn write_map_end(&mut self) -> ProtocolResult<usize> {
        Ok(0)
    }

    fn write_bool(&mut self, val: bool) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(u8::from(val)))
    }

    fn write_byte(&mut self, val: i8) -> ProtocolResult<usize> {
        Ok(self.buf.push_one(val as u8))
    }

    fn write_i16(&mut self, val: i16) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_be_bytes()))
    }

    fn write_i32(&mut self, val: i32) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_be_bytes()))
    }

    fn write_i64(&mut self, val: i64) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_be_bytes()))
    }

    fn write_double(&mut self, val: f64) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_bits().to_be_bytes()))
    }

    fn write_float(&mut self, val: f32) -> ProtocolResult<usize> {
        Ok(self.buf.push_many(val.to_bits().to_be_bytes()))
    }

    fn write_string(&mut self, val: &str) -> ProtocolResult<usize> {
        self.write_binary(val.as_bytes())
    }

    fn write_binary(&mut self, val: &[u8]) -> ProtocolResult<usize> {
        let len = header_size(val.len())?;
        Ok(self.buf.push_many((len as i32).to_be_bytes()) + self.buf.push_all(val))
    }
}

/// Binary protocol reader over an arbitrary [`Source`]
#[derive(Debug)]
pub struct BinaryReader<S: Source> {
    src: S,
    limits: Limits,
}

impl<S: Source> BinaryReader<S> {
    pub fn new(src: S) -> Self {
        Self::with_limits(src, Limits::default())
    }

    pub fn with_limits(src: S, limits: Limits) -> Self {
        Self { src, limits }
    }

    pub fn into_inner(self) -> S {
        self.src
    }

    fn read_tag(&mut self) -> ProtocolResult<TypeTag> {
        TypeTag::from_wire_id(self.src.consume_byte()?)
    }

    fn read_size(&mut self) -> ProtocolResult<u32> {
        let size = self.src.take_i32()?;
        if size < 0 {
            return Err(MalformedError::NegativeSize(i64::from(size)).into());
        }
        self.limits.check_container(size as usize)?;
        Ok(size as u32)
    }

    fn read_len(&mut self) -> ProtocolResult<usize> {
        let len = self.src.take_i32()?;
        if len < 0 {
            return Err(MalformedError::NegativeSize(i64::from(len)).into());
        }
        self.limits.check_string(len as usize)?;
        Ok(len as usize)
    }
}

impl<S: Source> private::Sealed for BinaryReader<S> {}

impl<S: Source> ProtocolReader for BinaryReader<S> {
    const PROTOCOL: Protocol = Protocol::Binary;

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
        Ok(())
    }

    fn read_struct_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_field_begin(&mut self) -> ProtocolResult<FieldHeader> {
        let tag = self.read_tag()?;
        if tag == TypeTag::Stop {
            return Ok(FieldHeader::STOP);
        }
        let id = self.src.take_i16()?;
        Ok(FieldHeader::new(id, tag))
    }

    fn read_field_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_list_begin(&mut self) -> ProtocolResult<ListHeader> {
        let elem = self.read_tag()?;
        let size = self.read_size()?;
        Ok(ListHeader::new(elem, size))
    }

    fn read_list_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_set_begin(&mut self) -> ProtocolResult<SetHeader> {
        let elem = self.read_tag()?;
        let size = self.read_size()?;
        Ok(SetHeader::new(elem, size))
    }

    fn read_set_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_map_begin(&mut self) -> ProtocolResult<MapHeader> {
        let key = self.read_tag()?;
        let value = self.read_tag()?;
        let size = self.read_size()?;
        Ok(MapHeader::new(key, value, size))
    }

    fn read_map_end(&mut self) -> ProtocolResult<()> {
        Ok(())
    }

    fn read_bool(&mut self) -> ProtocolResult<bool> {
        match self.src.consume_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(MalformedError::InvalidBoolean(byte).into()),
        }
    }

    fn read_byte(&mut self) -> ProtocolResult<i8> {
        self.src.take_i8()
    }

    fn read_i16(&mut self) -> ProtocolResult<i16> {
        self.src.take_i16()
    }

    fn read_i32(&mut self) -> ProtocolResult<i32> {
        self.src.take_i32()
    }

    fn read_i64(&mut self) -> ProtocolResult<i64> {
        self.src.take_i64()
    }

    fn read_double(&mut self) -> ProtocolResult<f64> {
        self.src.take_f64()
    }

    fn read_float(&mut self) -> ProtocolResult<f32> {
        self.src.take_f32()
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
            // bools are still validated rather than stepped over
            TypeTag::Bool => self.read_bool().map(drop),
            TypeTag::String | TypeTag::Binary => {
                let len = self.read_len()?;
                self.src.discard(len)
            }
            _ => match tag.fixed_width() {
                Some(width) => self.src.discard(width),
                None => Err(crate::error::NestingError::Misplaced(
                    "skipping a non-scalar tag as a scalar",
                )
                .into()),
            },
        }
    }
}
