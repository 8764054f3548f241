//! Sequential byte sources for protocol readers
//!
//! This module defines the [`Source`] trait, the read-side dual of
//! [`Target`](crate::conv::target::Target), along with the two provided
//! implementors: [`SliceSource`], a cursor over a borrowed slice, and
//! [`VecSource`], a cursor over an owned buffer.
//!
//! # Model
//!
//!  * The source is constructed over an immutable byte-buffer.
//!  * All reading is done in a non-backtracking fashion with at most one byte
//!    of lookahead ([`Source::peek_byte`]); after a byte is consumed it
//!    cannot be consumed again.
//!  * A read that would run past the end of the buffer fails with a
//!    [`TruncationError`] and consumes nothing.
//!
//! Multi-byte fixed-width numeric reads (`take_X`) are big-endian; the
//! Compact protocol performs its own little-endian conversions over
//! [`Source::consume_arr`].

use crate::error::{ProtocolResult, TruncationError};

/// Abstraction over a sequential read cursor
///
/// The following properties should be respected by each implementation:
///
/// * A fresh source has `offset() == 0` and `remainder()` equal to the
///   length of its buffer
/// * `consume(n)` succeeds if and only if `n <= remainder()`, and on success
///   advances `offset()` by exactly `n`
/// * `peek_byte()` never advances `offset()`
pub trait Source {
    /// Number of bytes consumed so far
    fn offset(&self) -> usize;

    /// Number of bytes that may still be consumed
    fn remainder(&self) -> usize;

    /// Returns the next byte without consuming it, or `None` at end of input
    fn peek_byte(&self) -> Option<u8>;

    /// Consumes and returns a single byte
    fn consume_byte(&mut self) -> ProtocolResult<u8>;

    /// Attempt to consume and return a slice of length `nbytes`, starting
    /// from the first unconsumed byte in the buffer.
    ///
    /// # Invariants
    ///
    /// This method **MUST** return `Ok(s)` when and only when `nbytes` bytes
    /// were available, and in such cases, `s.len() == nbytes`.
    fn consume(&mut self, nbytes: usize) -> ProtocolResult<&[u8]>;

    /// Consumes `N` bytes and returns them in array-form
    fn consume_arr<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut ret = [0u8; N];
        ret.copy_from_slice(self.consume(N)?);
        Ok(ret)
    }

    /// Consumes `nbytes` bytes without returning them
    fn discard(&mut self, nbytes: usize) -> ProtocolResult<()> {
        self.consume(nbytes).map(|_| ())
    }

    /// Consumes one byte and returns it as an `i8` value
    #[inline]
    fn take_i8(&mut self) -> ProtocolResult<i8> {
        Ok(self.consume_byte()? as i8)
    }

    /// Consumes two bytes and returns the corresponding big-endian `i16` value
    #[inline]
    fn take_i16(&mut self) -> ProtocolResult<i16> {
        self.consume_arr::<2>().map(i16::from_be_bytes)
    }

    /// Consumes four bytes and returns the corresponding big-endian `i32` value
    #[inline]
    fn take_i32(&mut self) -> ProtocolResult<i32> {
        self.consume_arr::<4>().map(i32::from_be_bytes)
    }

    /// Consumes eight bytes and returns the corresponding big-endian `i64` value
    #[inline]
    fn take_i64(&mut self) -> ProtocolResult<i64> {
        self.consume_arr::<8>().map(i64::from_be_bytes)
    }

    /// Consumes eight bytes and returns the `f64` with that big-endian bit pattern
    #[inline]
    fn take_f64(&mut self) -> ProtocolResult<f64> {
        self.consume_arr::<8>().map(f64::from_be_bytes)
    }

    /// Consumes four bytes and returns the `f32` with that big-endian bit pattern
    #[inline]
    fn take_f32(&mut self) -> ProtocolResult<f32> {
        self.consume_arr::<4>().map(f32::from_be_bytes)
    }

    /// Consumes and returns a `Vec<u8>` of length `nbytes`
    #[inline]
    fn take_dynamic(&mut self, nbytes: usize) -> ProtocolResult<Vec<u8>> {
        self.consume(nbytes).map(Vec::from)
    }
}

/// Cursor over a borrowed byte-slice
#[derive(Clone, Copy, Debug)]
pub struct SliceSource<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Returns the unconsumed tail of the buffer
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.offset..]
    }

    fn truncation(&self, requested: usize) -> TruncationError {
        TruncationError {
            offset: self.offset,
            requested,
            available: self.buf.len() - self.offset,
        }
    }
}

impl<'a> From<&'a [u8]> for SliceSource<'a> {
    fn from(buf: &'a [u8]) -> Self {
        Self::new(buf)
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn remainder(&self) -> usize {
        self.buf.len() - self.offset
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    fn consume_byte(&mut self) -> ProtocolResult<u8> {
        match self.buf.get(self.offset) {
            Some(&b) => {
                self.offset += 1;
                Ok(b)
            }
            None => Err(self.truncation(1).into()),
        }
    }

    fn consume(&mut self, nbytes: usize) -> ProtocolResult<&[u8]> {
        if nbytes > self.remainder() {
            return Err(self.truncation(nbytes).into());
        }
        let start = self.offset;
        self.offset += nbytes;
        Ok(&self.buf[start..self.offset])
    }
}

/// Cursor over an owned buffer
#[derive(Clone, Debug, Default)]
pub struct VecSource {
    buf: Vec<u8>,
    offset: usize,
}

impl VecSource {
    #[must_use]
    pub fn new(buf: Vec<u8>) -> Self {
        Self { buf, offset: 0 }
    }

    /// Destructs the source and returns its entire buffer, consumed or not
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl From<Vec<u8>> for VecSource {
    fn from(buf: Vec<u8>) -> Self {
        Self::new(buf)
    }
}

impl Source for VecSource {
    #[inline]
    fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    fn remainder(&self) -> usize {
        self.buf.len() - self.offset
    }

    #[inline]
    fn peek_byte(&self) -> Option<u8> {
        self.buf.get(self.offset).copied()
    }

    fn consume_byte(&mut self) -> ProtocolResult<u8> {
        match self.buf.get(self.offset) {
            Some(&b) => {
                self.offset += 1;
                Ok(b)
            }
            None => Err(TruncationError {
                offset: self.offset,
                requested: 1,
                available: 0,
            }
            .into()),
        }
    }

    fn consume(&mut self, nbytes: usize) -> ProtocolResult<&[u8]> {
        let available = self.remainder();
        if nbytes > available {
            return Err(TruncationError {
                offset: self.offset,
                requested: nbytes,
                available,
            }
            .into());
        }
        let start = self.offset;
        self.offset += nbytes;
        Ok(&self.buf[start..self.offset])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ProtocolError;

    #[test]
    fn consume_and_truncate() {
        let mut p = SliceSource::new(&[0x00, 0x2a, 0xff]);
        assert_eq!(p.take_i16().unwrap(), 42);
        assert_eq!(p.peek_byte(), Some(0xff));
        match p.take_i32() {
            Err(ProtocolError::Truncated(e)) => {
                assert_eq!(e.offset, 2);
                assert_eq!(e.requested, 4);
                assert_eq!(e.available, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        // failed read consumes nothing
        assert_eq!(p.remainder(), 1);
        assert_eq!(p.take_i8().unwrap(), -1);
        assert!(p.consume_byte().is_err());
    }

    #[test]
    fn vec_source_matches_slice() {
        let bytes = vec![0x40, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18];
        let mut v = VecSource::new(bytes.clone());
        let mut s = SliceSource::new(&bytes);
        assert_eq!(v.take_f64().unwrap(), std::f64::consts::PI);
        assert_eq!(s.take_f64().unwrap(), std::f64::consts::PI);
        assert_eq!(v.remainder(), 0);
    }
}
