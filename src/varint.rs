//! Zigzag transform and base-128 variable-length integers
//!
//! The Compact protocol writes every integer wider than a byte as a
//! *varint*: the value is split into 7-bit groups, least significant group
//! first, and each group is emitted as one byte whose high bit is set when
//! more groups follow. Signed values are first mapped through the *zigzag*
//! transform, `n ↦ 2n` for `n ≥ 0` and `n ↦ -2n - 1` for `n < 0`, so that
//! small-magnitude negative numbers stay short.
//!
//! Readers bound the number of bytes they are willing to consume by the
//! width of their target type ([`MAX_BYTES_16`], [`MAX_BYTES_32`],
//! [`MAX_BYTES_64`]), which guards against corrupt or hostile streams that
//! never clear the continuation bit.

use arrayvec::ArrayVec;
use num_integer::Integer;

use crate::conv::target::Target;
use crate::error::{OverflowError, ProtocolError, ProtocolResult};
use crate::parse::Source;
use crate::tag::TypeTag;

/// Maximum encoded length of a 16-bit varint
pub const MAX_BYTES_16: usize = 3;
/// Maximum encoded length of a 32-bit varint
pub const MAX_BYTES_32: usize = 5;
/// Maximum encoded length of a 64-bit varint
pub const MAX_BYTES_64: usize = 10;

/// Maps a signed 64-bit integer onto the unsigned integers
#[inline]
#[must_use]
pub const fn zigzag_64(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Inverse of [`zigzag_64`]
#[inline]
#[must_use]
pub const fn unzigzag_64(n: u64) -> i64 {
    ((n >> 1) as i64) ^ -((n & 1) as i64)
}

/// Maps a signed 32-bit integer onto the unsigned integers
#[inline]
#[must_use]
pub const fn zigzag_32(n: i32) -> u32 {
    ((n << 1) ^ (n >> 31)) as u32
}

/// Inverse of [`zigzag_32`]
#[inline]
#[must_use]
pub const fn unzigzag_32(n: u32) -> i32 {
    ((n >> 1) as i32) ^ -((n & 1) as i32)
}

/// Number of bytes in the varint encoding of `n`
#[must_use]
pub fn varint_len(n: u64) -> usize {
    let bits = (u64::BITS - n.leading_zeros()) as usize;
    Integer::div_ceil(&bits, &7).max(1)
}

/// Encodes `n` as a varint into a stack buffer
#[must_use]
pub fn encode(mut n: u64) -> ArrayVec<u8, MAX_BYTES_64> {
    let mut ret = ArrayVec::new();
    loop {
        if n < 0x80 {
            ret.push(n as u8);
            break ret;
        }
        ret.push((n as u8 & 0x7f) | 0x80);
        n >>= 7;
    }
}

/// Appends the varint encoding of `n` to `buf`, returning the number of bytes written
#[inline]
pub fn write<U: Target>(buf: &mut U, n: u64) -> usize {
    buf.push_all(&encode(n))
}

/// Consumes a varint of at most `max_bytes` bytes
///
/// # Errors
///
/// Propagates truncation of the source. Returns
/// `OverflowError::VarintTooLong` if the continuation bit is still set on
/// byte `max_bytes`, or if the final byte carries bits beyond 64.
pub fn read<S: Source>(p: &mut S, max_bytes: usize) -> ProtocolResult<u64> {
    let mut ret: u64 = 0;
    for i in 0..max_bytes {
        let byte = p.consume_byte()?;
        let shift = 7 * i as u32;
        let payload = u64::from(byte & 0x7f);
        if shift == 63 && payload > 1 {
            break;
        }
        ret |= payload << shift;
        if byte & 0x80 == 0 {
            return Ok(ret);
        }
    }
    Err(OverflowError::VarintTooLong { max_bytes }.into())
}

/// Consumes an unsigned 32-bit varint
pub fn read_u32<S: Source>(p: &mut S) -> ProtocolResult<u32> {
    let raw = read(p, MAX_BYTES_32)?;
    u32::try_from(raw).map_err(|_| out_of_range(TypeTag::I32, i128::from(raw)))
}

/// Consumes a zigzag varint and checks that it fits in an `i16`
pub fn read_i16<S: Source>(p: &mut S) -> ProtocolResult<i16> {
    let raw = read(p, MAX_BYTES_16)?;
    let wide = u32::try_from(raw)
        .map(unzigzag_32)
        .map_err(|_| out_of_range(TypeTag::I16, i128::from(raw)))?;
    i16::try_from(wide).map_err(|_| out_of_range(TypeTag::I16, i128::from(wide)))
}

/// Consumes a zigzag varint and checks that it fits in an `i32`
pub fn read_i32<S: Source>(p: &mut S) -> ProtocolResult<i32> {
    let raw = read(p, MAX_BYTES_32)?;
    u32::try_from(raw)
        .map(unzigzag_32)
        .map_err(|_| out_of_range(TypeTag::I32, i128::from(raw)))
}

/// Consumes a zigzag varint as an `i64`
pub fn read_i64<S: Source>(p: &mut S) -> ProtocolResult<i64> {
    read(p, MAX_BYTES_64).map(unzigzag_64)
}

fn out_of_range(tag: TypeTag, value: i128) -> ProtocolError {
    OverflowError::OutOfRange { tag, value }.into()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse::SliceSource;

    #[test]
    fn zigzag_known_values() {
        assert_eq!(zigzag_32(0), 0);
        assert_eq!(zigzag_32(-1), 1);
        assert_eq!(zigzag_32(1), 2);
        assert_eq!(zigzag_32(-2), 3);
        assert_eq!(zigzag_32(i32::MAX), u32::MAX - 1);
        assert_eq!(zigzag_32(i32::MIN), u32::MAX);
        assert_eq!(zigzag_64(i64::MIN), u64::MAX);
        assert_eq!(unzigzag_64(u64::MAX), i64::MIN);
        assert_eq!(unzigzag_32(3), -2);
    }

    #[test]
    fn varint_encoding() {
        assert_eq!(encode(0).as_slice(), &[0x00]);
        assert_eq!(encode(1).as_slice(), &[0x01]);
        assert_eq!(encode(127).as_slice(), &[0x7f]);
        assert_eq!(encode(128).as_slice(), &[0x80, 0x01]);
        assert_eq!(encode(300).as_slice(), &[0xac, 0x02]);
        assert_eq!(encode(u64::MAX).len(), MAX_BYTES_64);
        for n in [0u64, 1, 127, 128, 16383, 16384, u32::MAX as u64, u64::MAX] {
            assert_eq!(varint_len(n), encode(n).len());
        }
    }

    #[test]
    fn read_rejects_unterminated() {
        let mut p = SliceSource::new(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(matches!(
            read_i32(&mut p),
            Err(ProtocolError::Overflow(OverflowError::VarintTooLong { max_bytes: 5 }))
        ));
    }

    #[test]
    fn read_rejects_wide_i32() {
        // 2^32 fits in five varint bytes but not in 32 bits
        let mut p = SliceSource::new(&[0x80, 0x80, 0x80, 0x80, 0x10]);
        assert!(matches!(
            read_i32(&mut p),
            Err(ProtocolError::Overflow(OverflowError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn read_rejects_wide_i16() {
        // zigzag(40000) = 80000 needs three bytes and does not fit in i16
        let bytes = encode(u64::from(zigzag_32(40000)));
        let mut p = SliceSource::new(&bytes);
        assert!(read_i16(&mut p).is_err());
    }

    #[test]
    fn read_rejects_tenth_byte_overflow() {
        let mut bytes = vec![0xff; 9];
        bytes.push(0x02);
        let mut p = SliceSource::new(&bytes);
        assert!(read_i64(&mut p).is_err());
        let max = encode(u64::MAX);
        assert_eq!(read(&mut SliceSource::new(&max), MAX_BYTES_64).unwrap(), u64::MAX);
    }
}
