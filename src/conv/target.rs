/// Append-only byte sink driven by the protocol writers
///
/// Every push succeeds and reports how many bytes it appended. Writers sum
/// these counts to report the encoded length of a value, which is how
/// [`ByteCounter`] measures a value without storing it.
///
/// Nothing is ever removed or overwritten, so when an encode fails part way
/// the sink still holds a valid prefix of the stream.
pub trait Target {
    /// Hints that roughly `extra` more bytes are about to be pushed
    fn anticipate(&mut self, extra: usize);

    /// Returns an empty sink
    fn create() -> Self;

    /// Appends one byte, returning `1`
    fn push_one(&mut self, b: u8) -> usize;

    /// Appends a fixed-size array, returning `N`
    ///
    /// Equivalent to `push_one` on each byte in turn.
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize;

    /// Appends a slice, returning its length
    fn push_all(&mut self, buf: &[u8]) -> usize;
}

/// Sink that keeps only the count of bytes pushed into it
///
/// Used by [`Protocol::serialized_size`](crate::Protocol::serialized_size).
pub type ByteCounter = std::io::Sink;

impl Target for ByteCounter {
    #[inline(always)]
    fn anticipate(&mut self, _: usize) {}

    #[inline]
    fn create() -> Self {
        std::io::sink()
    }

    #[inline(always)]
    fn push_one(&mut self, _: u8) -> usize {
        1
    }

    #[inline(always)]
    fn push_many<const N: usize>(&mut self, _: [u8; N]) -> usize {
        N
    }

    #[inline(always)]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        buf.len()
    }
}

impl Target for Vec<u8> {
    #[inline]
    fn anticipate(&mut self, extra: usize) {
        self.reserve(extra)
    }

    #[inline]
    fn create() -> Self {
        Self::new()
    }

    #[inline]
    fn push_one(&mut self, b: u8) -> usize {
        self.push(b);
        1
    }

    #[inline]
    fn push_many<const N: usize>(&mut self, arr: [u8; N]) -> usize {
        self.extend_from_slice(&arr);
        N
    }

    #[inline]
    fn push_all(&mut self, buf: &[u8]) -> usize {
        self.extend_from_slice(buf);
        buf.len()
    }
}
