//! Protocol readers and writers
//!
//! This module defines the call sequence shared by every wire format,
//! in the form of the [`ProtocolWriter`] and [`ProtocolReader`] traits,
//! along with the three formats that implement them:
//!
//!   * [`binary`]: fixed-width, big-endian encoding
//!   * [`compact`]: zigzag varints, delta-encoded field ids, packed headers
//!   * [`json`]: the self-describing SimpleJSON text encoding
//!
//! # Call Sequence
//!
//! A struct is written as
//!
//! ```text
//! write_struct_begin
//!   ( write_field_begin(id, tag)  <value>  write_field_end )*
//!   write_field_stop
//! write_struct_end
//! ```
//!
//! where `<value>` is a single scalar write, a nested struct, or a container:
//!
//! ```text
//! write_list_begin(header)  <value>{size}          write_list_end
//! write_set_begin(header)   <value>{size}          write_set_end
//! write_map_begin(header)   (<value> <value>){size} write_map_end
//! ```
//!
//! Readers mirror this sequence, with [`ProtocolReader::read_field_begin`]
//! reporting a [`FieldHeader`] whose tag is [`TypeTag::Stop`] once the
//! fields of the current struct are exhausted. A reader that does not
//! recognize a field calls [`ProtocolReader::skip`] with the discovered tag.
//!
//! # Dispatch
//!
//! Both traits are sealed; the set of formats is closed. Code that is
//! generic over `W: ProtocolWriter` is monomorphized per format, and code
//! that selects a format at run time does so by matching on the
//! [`Protocol`] enum rather than through trait objects.
//!
//! # Concurrency
//!
//! Every reader and writer carries streaming state (its cursor, the Compact
//! field-id scopes, the SimpleJSON frame stack) and is not reentrant.
//! Sharing one instance between threads requires external locking for the
//! full span of a top-level value; see [`crate::sync`].

use crate::conv::error::{DecodeError, DecodeResult};
use crate::conv::target::{ByteCounter, Target};
use crate::conv::{Decode, Encode};
use crate::error::{LimitError, LimitKind, ProtocolResult};
use crate::parse::SliceSource;
use crate::schema::TypeDesc;
use crate::tag::{FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};
use crate::value::Value;

pub mod binary;
pub mod compact;
pub mod json;

pub use binary::{Binary, BinaryReader, BinaryWriter};
pub use compact::{Compact, CompactReader, CompactWriter, FieldIdScopes};
pub use json::{JsonReader, JsonWriter, SimpleJson};

mod private {
    pub trait Sealed {}
}

/// Type-level name for one of the wire formats
///
/// Implemented by the zero-sized markers [`Binary`], [`Compact`], and
/// [`SimpleJson`], for use where a format is selected statically, as in
/// [`EncodeLength::serialized_size`](crate::conv::EncodeLength::serialized_size).
pub trait Format: private::Sealed {
    const PROTOCOL: Protocol;
}

/// Default bound on the nesting depth of structs and containers
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Run-time limits enforced by protocol readers
///
/// The Binary and Compact readers check declared lengths against these
/// limits as soon as a header is read, before any storage is reserved for
/// the value. SimpleJSON strings carry no length prefix: the reader stops
/// buffering a literal once it is longer than any in-limit value could be
/// encoded as, and checks the exact length after unescaping or decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Maximum byte-length of a string or binary value
    pub string_limit: usize,
    /// Maximum element count of a list, set, or map
    pub container_limit: usize,
    /// Maximum nesting depth of structs and containers during skip and
    /// schema-guided decoding
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            string_limit: i32::MAX as usize,
            container_limit: i32::MAX as usize,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Limits {
    /// Checks a declared string or binary length
    pub fn check_string(&self, len: usize) -> ProtocolResult<()> {
        if len > self.string_limit {
            Err(LimitError {
                kind: LimitKind::String,
                limit: self.string_limit,
                actual: len,
            }
            .into())
        } else {
            Ok(())
        }
    }

    /// Checks a declared container size
    pub fn check_container(&self, size: usize) -> ProtocolResult<()> {
        if size > self.container_limit {
            Err(LimitError {
                kind: LimitKind::Container,
                limit: self.container_limit,
                actual: size,
            }
            .into())
        } else {
            Ok(())
        }
    }
}

/// Closed enumeration of the supported wire formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Protocol {
    Binary,
    Compact,
    SimpleJson,
}

/// Write half of the protocol call sequence
///
/// Every method returns the number of bytes it appended to the underlying
/// [`Target`], so that summing the results of a full call sequence yields
/// the serialized length of the value.
pub trait ProtocolWriter: private::Sealed {
    /// Format implemented by this writer
    const PROTOCOL: Protocol;

    /// Begins a struct; `name` is informational and not written by any format
    fn write_struct_begin(&mut self, name: &str) -> ProtocolResult<usize>;
    fn write_struct_end(&mut self) -> ProtocolResult<usize>;

    fn write_field_begin(&mut self, id: i16, tag: TypeTag) -> ProtocolResult<usize>;
    fn write_field_end(&mut self) -> ProtocolResult<usize>;
    /// Marks the end of the current struct's fields
    fn write_field_stop(&mut self) -> ProtocolResult<usize>;

    fn write_list_begin(&mut self, header: ListHeader) -> ProtocolResult<usize>;
    fn write_list_end(&mut self) -> ProtocolResult<usize>;
    fn write_set_begin(&mut self, header: SetHeader) -> ProtocolResult<usize>;
    fn write_set_end(&mut self) -> ProtocolResult<usize>;
    fn write_map_begin(&mut self, header: MapHeader) -> ProtocolResult<usize>;
    fn write_map_end(&mut self) -> ProtocolResult<usize>;

    fn write_bool(&mut self, val: bool) -> ProtocolResult<usize>;
    fn write_byte(&mut self, val: i8) -> ProtocolResult<usize>;
    fn write_i16(&mut self, val: i16) -> ProtocolResult<usize>;
    fn write_i32(&mut self, val: i32) -> ProtocolResult<usize>;
    fn write_i64(&mut self, val: i64) -> ProtocolResult<usize>;
    fn write_double(&mut self, val: f64) -> ProtocolResult<usize>;
    fn write_float(&mut self, val: f32) -> ProtocolResult<usize>;
    fn write_string(&mut self, val: &str) -> ProtocolResult<usize>;
    fn write_binary(&mut self, val: &[u8]) -> ProtocolResult<usize>;

    /// Writes one complete field: header, value, and field-end
    fn write_field<T: Encode + ?Sized>(&mut self, id: i16, val: &T) -> ProtocolResult<usize>
    where
        Self: Sized,
    {
        Ok(self.write_field_begin(id, val.tag())? + val.write(self)? + self.write_field_end()?)
    }
}

/// Read half of the protocol call sequence
pub trait ProtocolReader: private::Sealed {
    /// Format implemented by this reader
    const PROTOCOL: Protocol;

    /// Limits this reader enforces
    fn limits(&self) -> &Limits;

    /// Number of bytes consumed from the source so far
    fn position(&self) -> usize;

    /// Number of unconsumed bytes, ignoring any insignificant trailing
    /// content the format allows (such as whitespace in text formats)
    fn trailing(&mut self) -> usize;

    fn read_struct_begin(&mut self) -> ProtocolResult<()>;
    fn read_struct_end(&mut self) -> ProtocolResult<()>;

    /// Reads the next field header, or [`FieldHeader::STOP`] at the end of
    /// the current struct
    fn read_field_begin(&mut self) -> ProtocolResult<FieldHeader>;
    fn read_field_end(&mut self) -> ProtocolResult<()>;

    fn read_list_begin(&mut self) -> ProtocolResult<ListHeader>;
    fn read_list_end(&mut self) -> ProtocolResult<()>;
    fn read_set_begin(&mut self) -> ProtocolResult<SetHeader>;
    fn read_set_end(&mut self) -> ProtocolResult<()>;
    fn read_map_begin(&mut self) -> ProtocolResult<MapHeader>;
    fn read_map_end(&mut self) -> ProtocolResult<()>;

    fn read_bool(&mut self) -> ProtocolResult<bool>;
    fn read_byte(&mut self) -> ProtocolResult<i8>;
    fn read_i16(&mut self) -> ProtocolResult<i16>;
    fn read_i32(&mut self) -> ProtocolResult<i32>;
    fn read_i64(&mut self) -> ProtocolResult<i64>;
    fn read_double(&mut self) -> ProtocolResult<f64>;
    fn read_float(&mut self) -> ProtocolResult<f32>;
    fn read_string(&mut self) -> ProtocolResult<String>;
    fn read_binary(&mut self) -> ProtocolResult<Vec<u8>>;

    /// Consumes one scalar value of the given tag without materializing it
    ///
    /// The default implementation reads and drops the value. Formats
    /// override this where the encoded width can be stepped over directly.
    fn skip_scalar(&mut self, tag: TypeTag) -> ProtocolResult<()> {
        match tag {
            TypeTag::Bool => self.read_bool().map(drop),
            TypeTag::Byte => self.read_byte().map(drop),
            TypeTag::I16 => self.read_i16().map(drop),
            TypeTag::I32 => self.read_i32().map(drop),
            TypeTag::I64 => self.read_i64().map(drop),
            TypeTag::Double => self.read_double().map(drop),
            TypeTag::Float => self.read_float().map(drop),
            TypeTag::String | TypeTag::Binary => self.read_binary().map(drop),
            TypeTag::Stop
            | TypeTag::List
            | TypeTag::Set
            | TypeTag::Map
            | TypeTag::Struct => Err(crate::error::NestingError::Misplaced(
                "skipping a non-scalar tag as a scalar",
            )
            .into()),
        }
    }

    /// Consumes one complete value of the given tag without materializing it
    ///
    /// See [`crate::skip`].
    fn skip(&mut self, tag: TypeTag) -> ProtocolResult<()>
    where
        Self: Sized,
    {
        crate::skip::skip(self, tag)
    }

    /// Reads a whole struct, handing each field header to `on_field`
    ///
    /// `on_field` returns `Ok(true)` if it consumed the field value, or
    /// `Ok(false)` to have the value skipped. This is the loop generated
    /// record types run in their `Decode` implementations.
    fn read_fields<F>(&mut self, mut on_field: F) -> ProtocolResult<()>
    where
        Self: Sized,
        F: FnMut(&mut Self, FieldHeader) -> ProtocolResult<bool>,
    {
        self.read_struct_begin()?;
        loop {
            let header = self.read_field_begin()?;
            if header.is_stop() {
                break;
            }
            if !on_field(self, header)? {
                tracing::trace!(id = header.id, tag = %header.tag, "skipping unrecognized field");
                self.skip(header.tag)?;
            }
            self.read_field_end()?;
        }
        self.read_struct_end()
    }
}

macro_rules! with_writer {
    ($proto:expr, $tgt:expr, |$w:ident| $body:expr) => {
        match $proto {
            Protocol::Binary => {
                let mut $w = BinaryWriter::new($tgt);
                let n = $body?;
                (n, $w.into_inner())
            }
            Protocol::Compact => {
                let mut $w = CompactWriter::new($tgt);
                let n = $body?;
                (n, $w.into_inner())
            }
            Protocol::SimpleJson => {
                let mut $w = JsonWriter::new($tgt);
                let n = $body?;
                (n, $w.into_inner())
            }
        }
    };
}

macro_rules! with_reader {
    ($proto:expr, $src:expr, $limits:expr, |$r:ident| $body:expr) => {
        match $proto {
            Protocol::Binary => {
                let mut $r = BinaryReader::with_limits($src, $limits);
                finish($body, &mut $r)
            }
            Protocol::Compact => {
                let mut $r = CompactReader::with_limits($src, $limits);
                finish($body, &mut $r)
            }
            Protocol::SimpleJson => {
                let mut $r = JsonReader::with_limits($src, $limits);
                finish($body, &mut $r)
            }
        }
    };
}

/// Converts the result of a top-level read into a [`DecodeResult`],
/// checking for leftover input when `check_complete_parse` is enabled.
fn finish<T, R: ProtocolReader>(res: ProtocolResult<T>, r: &mut R) -> DecodeResult<T> {
    let ret = res.map_err(|err| {
        tracing::debug!(protocol = ?R::PROTOCOL, offset = r.position(), %err, "decode failed");
        DecodeError::from(err)
    })?;
    cfg_if::cfg_if! {
        if #[cfg(feature = "check_complete_parse")] {
            let remaining = r.trailing();
            if remaining != 0 {
                tracing::debug!(protocol = ?R::PROTOCOL, remaining, "trailing bytes after complete value");
                return Err(DecodeError::Trailing { remaining });
            }
        }
    }
    Ok(ret)
}

impl Protocol {
    /// Serializes `val`, pre-sizing the buffer for the formats whose exact
    /// length can be computed cheaply in advance
    pub fn serialize<T: Encode + ?Sized>(self, val: &T) -> ProtocolResult<Vec<u8>> {
        let mut buf = Vec::new();
        if matches!(self, Protocol::Binary | Protocol::Compact) {
            buf.anticipate(self.serialized_size(val)?);
        }
        let (_, buf) = with_writer!(self, buf, |w| val.write(&mut w));
        Ok(buf)
    }

    /// Serializes a dynamically-shaped [`Value`]
    pub fn serialize_value(self, val: &Value) -> ProtocolResult<Vec<u8>> {
        self.serialize(val)
    }

    /// Computes the exact number of bytes [`serialize`](Self::serialize)
    /// would produce for `val`, without allocating
    pub fn serialized_size<T: Encode + ?Sized>(self, val: &T) -> ProtocolResult<usize> {
        let counter: ByteCounter = Target::create();
        let (n, _) = with_writer!(self, counter, |w| val.write(&mut w));
        Ok(n)
    }

    /// Deserializes a value of type `T` from `bytes` with default limits
    pub fn deserialize<T: Decode>(self, bytes: &[u8]) -> DecodeResult<T> {
        self.deserialize_with_limits(bytes, Limits::default())
    }

    /// Deserializes a value of type `T` from `bytes`, enforcing `limits`
    pub fn deserialize_with_limits<T: Decode>(self, bytes: &[u8], limits: Limits) -> DecodeResult<T> {
        let src = SliceSource::new(bytes);
        with_reader!(self, src, limits, |r| T::read(&mut r))
    }

    /// Deserializes a [`Value`] of the shape described by `desc`
    pub fn deserialize_value(self, bytes: &[u8], desc: &TypeDesc) -> DecodeResult<Value> {
        let src = SliceSource::new(bytes);
        with_reader!(self, src, Limits::default(), |r| Value::read(&mut r, desc))
    }
}
