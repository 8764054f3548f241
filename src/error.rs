//! Error types used to report failure in protocol encoding and decoding
//!
//! This module contains a hierarchy of types representing the specific
//! classes of error that may arise from calls to
//! [`ProtocolReader`](crate::protocol::ProtocolReader) and
//! [`ProtocolWriter`](crate::protocol::ProtocolWriter) methods, as well as
//! from the lower-level [`Source`](crate::parse::Source) operations those
//! readers are built on.
//!
//! # Layout
//!
//! The primary type is [`ProtocolError`], along with the alias
//! [`ProtocolResult<T>`]. Each variant of `ProtocolError` wraps a refinement
//! type grouping errors of similar provenance:
//!
//!   * [`TruncationError`]: the input ran out before the format's declared
//!     length or structure was complete.
//!   * [`MalformedError`]: a tag byte, varint, or text token fell outside the
//!     legal set for the format.
//!   * [`OverflowError`]: a varint, integer, or length exceeded the width or
//!     limit it is allowed to occupy.
//!   * [`NestingError`]: structure delimiters did not balance, or nesting
//!     went deeper than permitted.
//!
//! None of these conditions are retried internally; a malformed stream does
//! not become well-formed by reading it again.

use std::error::Error;
use std::fmt::{Display, Formatter, Result};
use std::string::FromUtf8Error;

use crate::tag::TypeTag;

/// Enumeration type over all errors that may be encountered when calling
/// methods on protocol readers and writers.
#[derive(Debug)]
pub enum ProtocolError {
    /// Error class encountered when the byte source is exhausted before
    /// the value being read is complete
    Truncated(TruncationError),
    /// Error class encountered when the bytes or tokens of the source do not
    /// form a legal encoding
    Malformed(MalformedError),
    /// Error class encountered when a value is legal in form but too wide
    /// for its target, or exceeds a configured limit
    Overflow(OverflowError),
    /// Error class encountered when structural delimiters are missing,
    /// mismatched, or nested too deeply
    Unbalanced(NestingError),
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ProtocolError::Truncated(err) => Display::fmt(err, f),
            ProtocolError::Malformed(err) => Display::fmt(err, f),
            ProtocolError::Overflow(err) => Display::fmt(err, f),
            ProtocolError::Unbalanced(err) => Display::fmt(err, f),
        }
    }
}

impl Error for ProtocolError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProtocolError::Truncated(err) => Some(err),
            ProtocolError::Malformed(err) => Some(err),
            ProtocolError::Overflow(err) => Some(err),
            ProtocolError::Unbalanced(err) => Some(err),
        }
    }
}

/// Type alias for Result with an error type of [`ProtocolError`]
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Error raised when a read would consume more bytes than remain in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncationError {
    /// Offset into the source at which the read was attempted
    pub offset: usize,
    /// Number of bytes the read required
    pub requested: usize,
    /// Number of bytes that were actually left
    pub available: usize,
}

impl From<TruncationError> for ProtocolError {
    fn from(err: TruncationError) -> Self {
        Self::Truncated(err)
    }
}

impl Display for TruncationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.available == 0 {
            write!(
                f,
                "cannot consume {} bytes at offset {}: input has been fully consumed",
                self.requested, self.offset
            )
        } else {
            write!(
                f,
                "cannot consume {} bytes at offset {}: only {} bytes remaining",
                self.requested, self.offset, self.available
            )
        }
    }
}

impl Error for TruncationError {}

/// Errors arising from bytes or tokens outside the legal set of a format
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedError {
    /// Type identifier byte (or nibble) not assigned to any [`TypeTag`]
    InvalidTypeId { protocol: &'static str, id: u8 },
    /// Text type token not assigned to any [`TypeTag`]
    InvalidTypeToken(String),
    /// Byte could not be interpreted as a boolean
    InvalidBoolean(u8),
    /// Text token did not match the grammar at this position
    UnexpectedToken {
        offset: usize,
        expected: &'static str,
        found: String,
    },
    /// Text field key could not be interpreted as a 16-bit field id
    InvalidFieldId(String),
    /// Length-prefixed string was not valid UTF-8
    InvalidUtf8(FromUtf8Error),
    /// Binary value in a text encoding was not valid base64
    InvalidBase64(String),
    /// Container or string length was negative
    NegativeSize(i64),
    /// Value on the wire had a different type than the schema expected
    TypeMismatch { expected: TypeTag, actual: TypeTag },
}

impl From<MalformedError> for ProtocolError {
    fn from(err: MalformedError) -> Self {
        Self::Malformed(err)
    }
}

impl From<FromUtf8Error> for ProtocolError {
    fn from(err: FromUtf8Error) -> Self {
        Self::Malformed(MalformedError::InvalidUtf8(err))
    }
}

impl Display for MalformedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::InvalidTypeId { protocol, id } => {
                write!(f, "invalid {protocol} type identifier 0x{id:02x}")
            }
            Self::InvalidTypeToken(tok) => write!(f, "invalid type token `{tok}`"),
            Self::InvalidBoolean(byte) => write!(f, "invalid boolean encoding 0x{byte:02x}"),
            Self::UnexpectedToken {
                offset,
                expected,
                found,
            } => write!(f, "expected {expected} at offset {offset}, found `{found}`"),
            Self::InvalidFieldId(key) => write!(f, "field key `{key}` is not a 16-bit integer"),
            Self::InvalidUtf8(_) => write!(f, "string value is not valid UTF-8"),
            Self::InvalidBase64(msg) => write!(f, "binary value is not valid base64: {msg}"),
            Self::NegativeSize(n) => write!(f, "negative length or size {n}"),
            Self::TypeMismatch { expected, actual } => {
                write!(f, "expected value of type {expected}, found {actual}")
            }
        }
    }
}

impl Error for MalformedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUtf8(err) => Some(err),
            _ => None,
        }
    }
}

/// Which kind of length a [`LimitError`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Byte-length of a string or binary value
    String,
    /// Element count of a list, set, or map
    Container,
}

impl Display for LimitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            LimitKind::String => f.write_str("string"),
            LimitKind::Container => f.write_str("container"),
        }
    }
}

/// Restriction on a declared length exceeded
///
/// Structurally similar to the length and width errors of a schema-checked
/// sequence type, but applied to lengths as they are declared in a header,
/// before any element is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitError {
    pub kind: LimitKind,
    pub limit: usize,
    pub actual: usize,
}

impl Display for LimitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "{} length {} exceeded limit of {}",
            self.kind, self.actual, self.limit
        )
    }
}

impl Error for LimitError {}

/// Errors arising from values too wide for their representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowError {
    /// Varint did not terminate within the maximum byte count of its width
    VarintTooLong { max_bytes: usize },
    /// Decoded integer does not fit into the target type
    OutOfRange { tag: TypeTag, value: i128 },
    /// Declared length exceeds a configured limit
    Limit(LimitError),
    /// Length of a value to be written cannot be represented in a header
    Unrepresentable { actual: usize },
}

impl From<OverflowError> for ProtocolError {
    fn from(err: OverflowError) -> Self {
        Self::Overflow(err)
    }
}

impl From<LimitError> for ProtocolError {
    fn from(err: LimitError) -> Self {
        Self::Overflow(OverflowError::Limit(err))
    }
}

impl Display for OverflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::VarintTooLong { max_bytes } => {
                write!(f, "varint did not terminate within {max_bytes} bytes")
            }
            Self::OutOfRange { tag, value } => {
                write!(f, "value {value} out of range for {tag}")
            }
            Self::Limit(err) => Display::fmt(err, f),
            Self::Unrepresentable { actual } => {
                write!(f, "length {actual} cannot be represented in a 32-bit header")
            }
        }
    }
}

impl Error for OverflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Limit(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors arising from unbalanced or excessive nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingError {
    /// Nesting of structs and containers went deeper than the configured limit
    DepthExceeded { limit: usize },
    /// A struct-end (or container-end) was issued with no matching begin
    ScopeUnderflow,
    /// A closing token did not match the innermost open construct
    UnexpectedClose { expected: char, found: char },
    /// Input ended where a closing token was required
    Unclosed { expected: char },
    /// A call was made in a context where it cannot be encoded, e.g. a field
    /// header outside of any struct
    Misplaced(&'static str),
}

impl From<NestingError> for ProtocolError {
    fn from(err: NestingError) -> Self {
        Self::Unbalanced(err)
    }
}

impl Display for NestingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match *self {
            Self::DepthExceeded { limit } => {
                write!(f, "nesting depth exceeded limit of {limit}")
            }
            Self::ScopeUnderflow => write!(f, "end of scope without matching begin"),
            Self::UnexpectedClose { expected, found } => {
                write!(f, "expected closing `{expected}`, found `{found}`")
            }
            Self::Unclosed { expected } => {
                write!(f, "input ended before closing `{expected}`")
            }
            Self::Misplaced(what) => write!(f, "{what} is not valid in the current context"),
        }
    }
}

impl Error for NestingError {}

#[cfg(test)]
mod test {
    use super::*;

    fn dummy<T: Send + Sync>() {}

    #[test]
    fn protocol_error_threadsafe() {
        dummy::<ProtocolError>()
    }

    #[test]
    fn display_truncation() {
        let err = ProtocolError::from(TruncationError {
            offset: 3,
            requested: 4,
            available: 0,
        });
        assert_eq!(
            err.to_string(),
            "cannot consume 4 bytes at offset 3: input has been fully consumed"
        );
    }

    #[test]
    fn limit_error_is_overflow() {
        let err = ProtocolError::from(LimitError {
            kind: LimitKind::Container,
            limit: 10,
            actual: 11,
        });
        assert!(matches!(
            err,
            ProtocolError::Overflow(OverflowError::Limit(_))
        ));
        assert!(err.source().is_some());
    }
}
