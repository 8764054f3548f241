use crate::error::ProtocolError;

/// Error returned by top-level decoding through [`Protocol`](crate::protocol::Protocol)
#[derive(Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The reader failed before a complete value was read
    Protocol(ProtocolError),
    /// A complete value was read, but input remained after it
    Trailing { remaining: usize },
}

impl From<ProtocolError> for DecodeError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Protocol(err) => {
                write!(f, "protocol reader encountered error: {}", err)
            }
            DecodeError::Trailing { remaining } => {
                write!(f, "{} bytes left over after complete value", remaining)
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Protocol(err) => Some(err),
            DecodeError::Trailing { .. } => None,
        }
    }
}

pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod test {
    fn dummy<T: Send + Sync>() {}

    #[test]
    fn decode_error_threadsafe() {
        dummy::<super::DecodeError>()
    }

    #[test]
    fn trailing_display() {
        let err = super::DecodeError::Trailing { remaining: 3 };
        assert_eq!(err.to_string(), "3 bytes left over after complete value");
    }
}
