//! SimpleJSON protocol
//!
//! A self-describing text encoding in which every struct field and every
//! container carries its type as a short token, so that a document can be
//! skipped or inspected without a schema.
//!
//! # Layout
//!
//! ```text
//! struct  {"<id>":["<tag>",<value>],"<id>":["<tag>",<value>]}
//! list    ["<elem>",<size>,<e1>,<e2>,...]
//! set     ["<elem>",<size>,<e1>,<e2>,...]
//! map     ["<key>","<value>",<size>,<k1>,<v1>,<k2>,<v2>,...]
//! ```
//!
//! Scalars are JSON literals: `true`/`false`, integers as numbers, strings
//! as escaped JSON strings, and binary values as standard base64 in a JSON
//! string (padding is optional on read). Doubles and floats use the
//! shortest decimal that round-trips, except for the non-finite values,
//! which are the strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
//!
//! The type tokens are:
//!
//! | tag          | token |   | tag    | token |
//! |--------------|-------|---|--------|-------|
//! | bool         | `tf`  |   | float  | `flt` |
//! | byte         | `i8`  |   | string, binary | `str` |
//! | i16          | `i16` |   | list   | `lst` |
//! | i32          | `i32` |   | set    | `set` |
//! | i64          | `i64` |   | map    | `map` |
//! | double       | `dbl` |   | struct | `rec` |
//!
//! Whitespace between tokens is accepted on read and never written.
//!
//! # Frames
//!
//! Separators depend on the enclosing construct, which both the reader and
//! the writer track on a frame stack: inside a field value no separator is
//! needed, inside a container every value is preceded by `,`, and inside a
//! struct every field after the first is preceded by `,`.

use std::collections::HashMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use lazy_static::lazy_static;

use crate::conv::target::Target;
use crate::error::{
    LimitError, LimitKind, MalformedError, NestingError, OverflowError, ProtocolResult,
};
use crate::internal::{FrameStack, Stack};
use crate::parse::Source;
use crate::tag::{header_size, FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};

use super::{private, Format, Limits, Protocol, ProtocolReader, ProtocolWriter};

/// Marker type for the SimpleJSON format
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleJson;

impl private::Sealed for SimpleJson {}

impl Format for SimpleJson {
    const PROTOCOL: Protocol = Protocol::SimpleJson;
}

/// Bound on the raw length of type tokens, field ids, and non-finite spellings
const MAX_TOKEN_LEN: usize = 32;

lazy_static! {
    static ref TYPE_TOKENS: HashMap<&'static str, TypeTag> = {
        let mut m = HashMap::new();
        m.insert("tf", TypeTag::Bool);
        m.insert("i8", TypeTag::Byte);
        m.insert("i16", TypeTag::I16);
        m.insert("i32", TypeTag::I32);
        m.insert("i64", TypeTag::I64);
        m.insert("dbl", TypeTag::Double);
        m.insert("flt", TypeTag::Float);
        m.insert("str", TypeTag::String);
        m.insert("lst", TypeTag::List);
        m.insert("set", TypeTag::Set);
        m.insert("map", TypeTag::Map);
        m.insert("rec", TypeTag::Struct);
        m
    };
}

/// Base64 engine accepting both padded and unpadded input
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

/// Returns the text token of `tag`
pub fn type_token(tag: TypeTag) -> ProtocolResult<&'static str> {
    Ok(match tag {
        TypeTag::Bool => "tf",
        TypeTag::Byte => "i8",
        TypeTag::I16 => "i16",
        TypeTag::I32 => "i32",
        TypeTag::I64 => "i64",
        TypeTag::Double => "dbl",
        TypeTag::Float => "flt",
        TypeTag::String | TypeTag::Binary => "str",
        TypeTag::List => "lst",
        TypeTag::Set => "set",
        TypeTag::Map => "map",
        TypeTag::Struct => "rec",
        TypeTag::Stop => return Err(NestingError::Misplaced("stop tag in a type position").into()),
    })
}

/// Interprets a text type token
pub fn from_type_token(token: &str) -> ProtocolResult<TypeTag> {
    TYPE_TOKENS
        .get(token)
        .copied()
        .ok_or_else(|| MalformedError::InvalidTypeToken(token.to_owned()).into())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Frame {
    Struct { first: bool },
    Field,
    Seq,
}

/// SimpleJSON writer over an arbitrary [`Target`]
#[derive(Debug, Default)]
pub struct JsonWriter<U: Target> {
    buf: U,
    frames: FrameStack<Frame>,
}

impl<U: Target> JsonWriter<U> {
    pub fn new(buf: U) -> Self {
        Self {
            buf,
            frames: FrameStack::new(),
        }
    }

    pub fn get_ref(&self) -> &U {
        &self.buf
    }

    pub fn into_inner(self) -> U {
        self.buf
    }

    /// Writes whatever separator precedes a value in the current frame
    fn value_sep(&mut self) -> ProtocolResult<usize> {
        match self.frames.peek() {
            None | Some(Frame::Field) => Ok(0),
            Some(Frame::Seq) => Ok(self.buf.push_one(b',')),
            Some(Frame::Struct { .. }) => {
                Err(NestingError::Misplaced("value without a field header").into())
            }
        }
    }

    fn write_token(&mut self, tag: TypeTag) -> ProtocolResult<usize> {
        let tok = type_token(tag)?;
        Ok(self.buf.push_one(b'"') + self.buf.push_all(tok.as_bytes()) + self.buf.push_one(b'"'))
    }

    fn write_raw(&mut self, text: &str) -> ProtocolResult<usize> {
        Ok(self.value_sep()? + self.buf.push_all(text.as_bytes()))
    }

    fn close_seq(&mut self) -> ProtocolResult<usize> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Seq) => Ok(self.buf.push_one(b']')),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    fn write_seq_header(&mut self, tags: &[TypeTag], size: u32) -> ProtocolResult<usize> {
        let size = header_size(size as usize)?;
        let mut n = self.value_sep()? + self.buf.push_one(b'[');
        for &tag in tags {
            n += self.write_token(tag)? + self.buf.push_one(b',');
        }
        n += self.buf.push_all(size.to_string().as_bytes());
        self.frames.push(Frame::Seq);
        Ok(n)
    }
}

impl<U: Target> private::Sealed for JsonWriter<U> {}

impl<U: Target> ProtocolWriter for JsonWriter<U> {
    const PROTOCOL: Protocol = Protocol::SimpleJson;

    fn write_struct_begin(&mut self, _name: &str) -> ProtocolResult<usize> {
        let n = self.value_sep()? + self.buf.push_one(b'{');
        self.frames.push(Frame::Struct { first: true });
        Ok(n)
    }

    fn write_struct_end(&mut self) -> ProtocolResult<usize> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Struct { .. }) => Ok(self.buf.push_one(b'}')),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    fn write_field_begin(&mut self, id: i16, tag: TypeTag) -> ProtocolResult<usize> {
        let first = match self.frames.peek_mut() {
            Some(Frame::Struct { first }) => std::mem::replace(first, false),
            _ => return Err(NestingError::Misplaced("field header outside of a struct").into()),
        };
        let mut n = if first { 0 } else { self.buf.push_one(b',') };
        n += self.buf.push_one(b'"')
            + self.buf.push_all(id.to_string().as_bytes())
            + self.buf.push_all(b"\":[")
            + self.write_token(tag)?
            + self.buf.push_one(b',');
        self.frames.push(Frame::Field);
        Ok(n)
    }

    fn write_field_end(&mut self) -> ProtocolResult<usize> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Field) => Ok(self.buf.push_one(b']')),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    fn write_field_stop(&mut self) -> ProtocolResult<usize> {
        match self.frames.peek() {
            Some(Frame::Struct { .. }) => Ok(0),
            _ => Err(NestingError::Misplaced("field stop outside of a struct").into()),
        }
    }

    fn write_list_begin(&mut self, header: ListHeader) -> ProtocolResult<usize> {
        self.write_seq_header(&[header.elem], header.size)
    }

    fn write_list_end(&mut self) -> ProtocolResult<usize> {
        self.close_seq()
    }

    fn write_set_begin(&mut self, header: SetHeader) -> ProtocolResult<usize> {
        self.write_seq_header(&[header.elem], header.size)
    }

    fn write_set_end(&mut self) -> ProtocolResult<usize> {
        self.close_seq()
    }

    fn write_map_begin(&mut self, header: MapHeader) -> ProtocolResult<usize> {
        self.write_seq_header(&[header.key, header.value], header.size)
    }

    fn write_map_end(&mut self) -> ProtocolResult<usize> {
        self.close_seq()
    }

    fn write_bool(&mut self, val: bool) -> ProtocolResult<usize> {
        self.write_raw(if val { "true" } else { "false" })
    }

    fn write_byte(&mut self, val: i8) -> ProtocolResult<usize> {
        self.write_raw(&val.to_string())
    }

    fn write_i16(&mut self, val: i16) -> ProtocolResult<usize> {
        self.write_raw(&val.to_string())
    }

    fn write_i32(&mut self, val: i32) -> ProtocolResult<usize> {
        self.write_raw(&val.to_string())
    }

    fn write_i64(&mut self, val: i64) -> ProtocolResult<usize> {
        self.write_raw(&val.to_string())
    }

    fn write_double(&mut self, val: f64) -> ProtocolResult<usize> {
        if val.is_nan() {
            self.write_string(NAN)
        } else if val.is_infinite() {
            self.write_string(if val > 0.0 { INFINITY } else { NEG_INFINITY })
        } else {
            self.write_raw(&format!("{val:?}"))
        }
    }

    fn write_float(&mut self, val: f32) -> ProtocolResult<usize> {
        if val.is_nan() {
            self.write_string(NAN)
        } else if val.is_infinite() {
            self.write_string(if val > 0.0 { INFINITY } else { NEG_INFINITY })
        } else {
            self.write_raw(&format!("{val:?}"))
        }
    }

    fn write_string(&mut self, val: &str) -> ProtocolResult<usize> {
        let escaped = serde_json::Value::from(val).to_string();
        self.write_raw(&escaped)
    }

    fn write_binary(&mut self, val: &[u8]) -> ProtocolResult<usize> {
        header_size(val.len())?;
        let encoded = STANDARD.encode(val);
        Ok(self.value_sep()?
            + self.buf.push_one(b'"')
            + self.buf.push_all(encoded.as_bytes())
            + self.buf.push_one(b'"'))
    }
}

/// SimpleJSON reader over an arbitrary [`Source`]
#[derive(Debug)]
pub struct JsonReader<S: Source> {
    src: S,
    limits: Limits,
    frames: FrameStack<Frame>,
}

impl<S: Source> JsonReader<S> {
    pub fn new(src: S) -> Self {
        Self::with_limits(src, Limits::default())
    }

    pub fn with_limits(src: S, limits: Limits) -> Self {
        Self {
            src,
            limits,
            frames: FrameStack::new(),
        }
    }

    pub fn into_inner(self) -> S {
        self.src
    }

    fn skip_ws(&mut self) {
        while let Some(b' ' | b'\t' | b'\n' | b'\r') = self.src.peek_byte() {
            // peeked byte is always available
            let _ = self.src.consume_byte();
        }
    }

    fn found(&self) -> String {
        match self.src.peek_byte() {
            Some(b) => char::from(b).to_string(),
            None => String::from("end of input"),
        }
    }

    fn unexpected(&self, expected: &'static str) -> crate::error::ProtocolError {
        MalformedError::UnexpectedToken {
            offset: self.src.offset(),
            expected,
            found: self.found(),
        }
        .into()
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> ProtocolResult<()> {
        self.skip_ws();
        if self.src.peek_byte() == Some(byte) {
            self.src.consume_byte().map(drop)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_close(&mut self, close: u8) -> ProtocolResult<()> {
        self.skip_ws();
        match self.src.peek_byte() {
            Some(b) if b == close => self.src.consume_byte().map(drop),
            Some(b) => Err(NestingError::UnexpectedClose {
                expected: char::from(close),
                found: char::from(b),
            }
            .into()),
            None => Err(NestingError::Unclosed {
                expected: char::from(close),
            }
            .into()),
        }
    }

    /// Consumes whatever separator precedes a value in the current frame
    fn value_sep(&mut self) -> ProtocolResult<()> {
        match self.frames.peek() {
            None | Some(Frame::Field) => Ok(()),
            Some(Frame::Seq) => self.expect(b',', "`,`"),
            Some(Frame::Struct { .. }) => {
                Err(NestingError::Misplaced("value without a field header").into())
            }
        }
    }

    /// Longest raw literal that can unescape to a string within the limit
    ///
    /// A single unescaped byte is written as at most six raw bytes (`\u0001`).
    fn string_literal_bound(&self) -> usize {
        self.limits.string_limit.saturating_mul(6).saturating_add(2)
    }

    /// Longest raw literal that can decode to a blob within the limit
    fn binary_literal_bound(&self) -> usize {
        let encoded = (self.limits.string_limit / 3).saturating_add(1).saturating_mul(4);
        encoded.saturating_mul(6).saturating_add(2)
    }

    /// Consumes a JSON string literal and returns its unescaped contents
    ///
    /// Fails without buffering further once the raw literal, quotes
    /// included, is longer than `max_raw` bytes.
    fn read_json_string(&mut self, max_raw: usize) -> ProtocolResult<String> {
        self.skip_ws();
        let start = self.src.offset();
        if self.src.peek_byte() != Some(b'"') {
            return Err(self.unexpected("string"));
        }
        let mut raw = vec![self.src.consume_byte()?];
        let mut escaped = false;
        loop {
            if raw.len() >= max_raw {
                return Err(LimitError {
                    kind: LimitKind::String,
                    limit: self.limits.string_limit,
                    actual: raw.len() + 1,
                }
                .into());
            }
            let b = self.src.consume_byte()?;
            raw.push(b);
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                break;
            }
        }
        let raw = String::from_utf8(raw)?;
        serde_json::from_str::<String>(&raw).map_err(|_| {
            MalformedError::UnexpectedToken {
                offset: start,
                expected: "string",
                found: raw.clone(),
            }
            .into()
        })
    }

    /// Consumes the characters of a JSON number literal
    fn read_number_text(&mut self) -> ProtocolResult<String> {
        self.skip_ws();
        let mut text = String::new();
        while let Some(b) = self.src.peek_byte() {
            if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E') {
                text.push(char::from(self.src.consume_byte()?));
            } else {
                break;
            }
        }
        if text.is_empty() {
            Err(self.unexpected("number"))
        } else {
            Ok(text)
        }
    }

    fn read_integer(&mut self, tag: TypeTag) -> ProtocolResult<i64> {
        let start = self.src.offset();
        let text = self.read_number_text()?;
        match text.parse::<i64>() {
            Ok(n) => Ok(n),
            Err(_) => match text.parse::<i128>() {
                Ok(value) => Err(OverflowError::OutOfRange { tag, value }.into()),
                Err(_) => Err(MalformedError::UnexpectedToken {
                    offset: start,
                    expected: "integer",
                    found: text,
                }
                .into()),
            },
        }
    }

    /// Reads a value that is either a number or one of the non-finite
    /// string spellings, as text
    fn read_float_text(&mut self) -> ProtocolResult<String> {
        self.skip_ws();
        if self.src.peek_byte() == Some(b'"') {
            let start = self.src.offset();
            let text = self.read_json_string(MAX_TOKEN_LEN)?;
            match text.as_str() {
                NAN | INFINITY | NEG_INFINITY => Ok(text),
                _ => Err(MalformedError::UnexpectedToken {
                    offset: start,
                    expected: "number",
                    found: text,
                }
                .into()),
            }
        } else {
            self.read_number_text()
        }
    }

    fn read_token(&mut self) -> ProtocolResult<TypeTag> {
        let tok = self.read_json_string(MAX_TOKEN_LEN)?;
        from_type_token(&tok)
    }

    fn read_seq_size(&mut self) -> ProtocolResult<u32> {
        let size = self.read_integer(TypeTag::I32)?;
        if size < 0 {
            return Err(MalformedError::NegativeSize(size).into());
        }
        if size > i64::from(i32::MAX) {
            return Err(OverflowError::OutOfRange {
                tag: TypeTag::I32,
                value: i128::from(size),
            }
            .into());
        }
        self.limits.check_container(size as usize)?;
        Ok(size as u32)
    }

    fn read_seq_begin(&mut self, ntags: usize) -> ProtocolResult<([TypeTag; 2], u32)> {
        self.value_sep()?;
        self.expect(b'[', "`[`")?;
        let mut tags = [TypeTag::Stop; 2];
        for tag in tags.iter_mut().take(ntags) {
            *tag = self.read_token()?;
            self.expect(b',', "`,`")?;
        }
        let size = self.read_seq_size()?;
        self.frames.push(Frame::Seq);
        Ok((tags, size))
    }

    fn read_seq_end(&mut self) -> ProtocolResult<()> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Seq) => self.expect_close(b']'),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }
}

fn parse_float<T: std::str::FromStr>(text: &str, nan: T, inf: T, neg_inf: T) -> Option<T> {
    match text {
        NAN => Some(nan),
        INFINITY => Some(inf),
        NEG_INFINITY => Some(neg_inf),
        _ => text.parse().ok(),
    }
}

impl<S: Source> private::Sealed for JsonReader<S> {}

impl<S: Source> ProtocolReader for JsonReader<S> {
    const PROTOCOL: Protocol = Protocol::SimpleJson;

    fn limits(&self) -> &Limits {
        &self.limits
    }

    fn position(&self) -> usize {
        self.src.offset()
    }

    fn trailing(&mut self) -> usize {
        self.skip_ws();
        self.src.remainder()
    }

    fn read_struct_begin(&mut self) -> ProtocolResult<()> {
        self.value_sep()?;
        self.expect(b'{', "`{`")?;
        self.frames.push(Frame::Struct { first: true });
        Ok(())
    }

    fn read_struct_end(&mut self) -> ProtocolResult<()> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Struct { .. }) => self.expect_close(b'}'),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    fn read_field_begin(&mut self) -> ProtocolResult<FieldHeader> {
        let first = match self.frames.peek() {
            Some(Frame::Struct { first }) => first,
            _ => return Err(NestingError::Misplaced("field header outside of a struct").into()),
        };
        self.skip_ws();
        if self.src.peek_byte() == Some(b'}') {
            return Ok(FieldHeader::STOP);
        }
        if !first {
            self.expect(b',', "`,` or `}`")?;
        }
        if let Some(Frame::Struct { first }) = self.frames.peek_mut() {
            *first = false;
        }
        let key = self.read_json_string(MAX_TOKEN_LEN)?;
        let id = key
            .parse::<i16>()
            .map_err(|_| MalformedError::InvalidFieldId(key.clone()))?;
        self.expect(b':', "`:`")?;
        self.expect(b'[', "`[`")?;
        let tag = self.read_token()?;
        self.expect(b',', "`,`")?;
        self.frames.push(Frame::Field);
        Ok(FieldHeader::new(id, tag))
    }

    fn read_field_end(&mut self) -> ProtocolResult<()> {
        match Stack::pop(&mut self.frames) {
            Some(Frame::Field) => self.expect_close(b']'),
            _ => Err(NestingError::ScopeUnderflow.into()),
        }
    }

    fn read_list_begin(&mut self) -> ProtocolResult<ListHeader> {
        let ([elem, _], size) = self.read_seq_begin(1)?;
        Ok(ListHeader::new(elem, size))
    }

    fn read_list_end(&mut self) -> ProtocolResult<()> {
        self.read_seq_end()
    }

    fn read_set_begin(&mut self) -> ProtocolResult<SetHeader> {
        let ([elem, _], size) = self.read_seq_begin(1)?;
        Ok(SetHeader::new(elem, size))
    }

    fn read_set_end(&mut self) -> ProtocolResult<()> {
        self.read_seq_end()
    }

    fn read_map_begin(&mut self) -> ProtocolResult<MapHeader> {
        let ([key, value], size) = self.read_seq_begin(2)?;
        Ok(MapHeader::new(key, value, size))
    }

    fn read_map_end(&mut self) -> ProtocolResult<()> {
        self.read_seq_end()
    }

    fn read_bool(&mut self) -> ProtocolResult<bool> {
        self.value_sep()?;
        self.skip_ws();
        let start = self.src.offset();
        let mut word = String::new();
        while let Some(b) = self.src.peek_byte() {
            if !b.is_ascii_alphabetic() {
                break;
            }
            word.push(char::from(self.src.consume_byte()?));
        }
        match word.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            "" => Err(self.unexpected("boolean")),
            _ => Err(MalformedError::UnexpectedToken {
                offset: start,
                expected: "boolean",
                found: word,
            }
            .into()),
        }
    }

    fn read_byte(&mut self) -> ProtocolResult<i8> {
        self.value_sep()?;
        let n = self.read_integer(TypeTag::Byte)?;
        i8::try_from(n).map_err(|_| {
            OverflowError::OutOfRange {
                tag: TypeTag::Byte,
                value: i128::from(n),
            }
            .into()
        })
    }

    fn read_i16(&mut self) -> ProtocolResult<i16> {
        self.value_sep()?;
        let n = self.read_integer(TypeTag::I16)?;
        i16::try_from(n).map_err(|_| {
            OverflowError::OutOfRange {
                tag: TypeTag::I16,
                value: i128::from(n),
            }
            .into()
        })
    }

    fn read_i32(&mut self) -> ProtocolResult<i32> {
        self.value_sep()?;
        let n = self.read_integer(TypeTag::I32)?;
        i32::try_from(n).map_err(|_| {
            OverflowError::OutOfRange {
                tag: TypeTag::I32,
                value: i128::from(n),
            }
            .into()
        })
    }

    fn read_i64(&mut self) -> ProtocolResult<i64> {
        self.value_sep()?;
        self.read_integer(TypeTag::I64)
    }

    fn read_double(&mut self) -> ProtocolResult<f64> {
        self.value_sep()?;
        let start = self.src.offset();
        let text = self.read_float_text()?;
        parse_float(&text, f64::NAN, f64::INFINITY, f64::NEG_INFINITY).ok_or_else(|| {
            MalformedError::UnexpectedToken {
                offset: start,
                expected: "number",
                found: text,
            }
            .into()
        })
    }

    fn read_float(&mut self) -> ProtocolResult<f32> {
        self.value_sep()?;
        let start = self.src.offset();
        let text = self.read_float_text()?;
        parse_float(&text, f32::NAN, f32::INFINITY, f32::NEG_INFINITY).ok_or_else(|| {
            MalformedError::UnexpectedToken {
                offset: start,
                expected: "number",
                found: text,
            }
            .into()
        })
    }

    fn read_string(&mut self) -> ProtocolResult<String> {
        self.value_sep()?;
        let max_raw = self.string_literal_bound();
        let s = self.read_json_string(max_raw)?;
        self.limits.check_string(s.len())?;
        Ok(s)
    }

    fn read_binary(&mut self) -> ProtocolResult<Vec<u8>> {
        self.value_sep()?;
        let max_raw = self.binary_literal_bound();
        let encoded = self.read_json_string(max_raw)?;
        let bytes = LENIENT_BASE64
            .decode(encoded.as_bytes())
            .map_err(|err| MalformedError::InvalidBase64(err.to_string()))?;
        self.limits.check_string(bytes.len())?;
        Ok(bytes)
    }

    fn skip_scalar(&mut self, tag: TypeTag) -> ProtocolResult<()> {
        match tag {
            // text is stepped over as a literal; only `read_binary` decodes base64
            TypeTag::String | TypeTag::Binary => {
                self.value_sep()?;
                let max_raw = self.binary_literal_bound();
                self.read_json_string(max_raw).map(drop)
            }
            TypeTag::Bool => self.read_bool().map(drop),
            TypeTag::Byte => self.read_byte().map(drop),
            TypeTag::I16 => self.read_i16().map(drop),
            TypeTag::I32 => self.read_i32().map(drop),
            TypeTag::I64 => self.read_i64().map(drop),
            TypeTag::Double => self.read_double().map(drop),
            TypeTag::Float => self.read_float().map(drop),
            TypeTag::Stop | TypeTag::List | TypeTag::Set | TypeTag::Map | TypeTag::Struct => {
                Err(NestingError::Misplaced("skipping a non-scalar tag as a scalar").into())
            }
        }
    }
}
