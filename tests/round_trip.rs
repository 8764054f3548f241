mod common;

use common::*;
use thrift_protocol::prelude::*;
use thrift_protocol::{Limits, ProtocolError, DecodeError};

#[test]
fn one_of_each_all_formats() {
    let ooe = one_of_each();
    for proto in ALL {
        let bytes = proto.serialize(&ooe).unwrap();
        assert_eq!(bytes.len(), proto.serialized_size(&ooe).unwrap(), "{proto:?}");
        let back: OneOfEach = proto.deserialize(&bytes).unwrap();
        assert_eq!(back, ooe, "{proto:?}");
    }
}

#[test]
fn nested_all_formats() {
    let nested = nested();
    for proto in ALL {
        let bytes = proto.serialize(&nested).unwrap();
        assert_eq!(bytes.len(), proto.serialized_size(&nested).unwrap(), "{proto:?}");
        let back: Nested = proto.deserialize(&bytes).unwrap();
        assert_eq!(back, nested, "{proto:?}");
    }
}

#[test]
fn empty_record_all_formats() {
    let empty = OneOfEach::default();
    for proto in ALL {
        let bytes = proto.serialize(&empty).unwrap();
        let back: OneOfEach = proto.deserialize(&bytes).unwrap();
        assert_eq!(back, empty, "{proto:?}");
    }
}

#[test]
fn doubles_preserve_bit_patterns() {
    let d = doubles();
    for proto in ALL {
        let bytes = proto.serialize(&d).unwrap();
        let back: Doubles = proto.deserialize(&bytes).unwrap();
        assert_eq!(back.inf, f64::INFINITY, "{proto:?}");
        assert_eq!(back.neginf, f64::NEG_INFINITY, "{proto:?}");
        assert!(back.nan.is_nan(), "{proto:?}");
        assert_eq!(back.repeating, 9.0 / 11.0, "{proto:?}");
        assert_eq!(back.big, f64::MAX, "{proto:?}");
        assert_eq!(back.small, f64::EPSILON, "{proto:?}");
        assert_eq!(back.zero.to_bits(), 0.0f64.to_bits(), "{proto:?}");
        assert_eq!(back.negzero.to_bits(), (-0.0f64).to_bits(), "{proto:?}");
    }
}

#[test]
fn extreme_integers() {
    let vals = vec![i64::MIN, -1, 0, 1, i64::MAX];
    for proto in ALL {
        let bytes = proto.serialize(&vals).unwrap();
        let back: Vec<i64> = proto.deserialize(&bytes).unwrap();
        assert_eq!(back, vals, "{proto:?}");
    }
    let vals = vec![i16::MIN, i16::MAX];
    for proto in ALL {
        let bytes = proto.serialize(&vals).unwrap();
        let back: Vec<i16> = proto.deserialize(&bytes).unwrap();
        assert_eq!(back, vals, "{proto:?}");
    }
}

#[test]
fn truncated_input_fails() {
    let ooe = one_of_each();
    for proto in ALL {
        let bytes = proto.serialize(&ooe).unwrap();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            let res: Result<OneOfEach, _> = proto.deserialize(&bytes[..cut]);
            assert!(res.is_err(), "{proto:?} accepted {cut} of {} bytes", bytes.len());
        }
    }
}

#[test]
fn string_limit_enforced_before_allocation() {
    let limits = Limits {
        string_limit: 8,
        ..Limits::default()
    };
    for proto in [Protocol::Binary, Protocol::Compact] {
        let bytes = proto.serialize("far too long for the limit").unwrap();
        let res: Result<String, _> = proto.deserialize_with_limits(&bytes, limits);
        assert!(
            matches!(res, Err(DecodeError::Protocol(ProtocolError::Overflow(_)))),
            "{proto:?}: {res:?}"
        );
        let ok: String = proto.deserialize_with_limits(&proto.serialize("short").unwrap(), limits).unwrap();
        assert_eq!(ok, "short");
    }
}

#[test]
fn container_limit_enforced() {
    let limits = Limits {
        container_limit: 2,
        ..Limits::default()
    };
    for proto in ALL {
        let bytes = proto.serialize(&vec![1i32, 2, 3]).unwrap();
        let res: Result<Vec<i32>, _> = proto.deserialize_with_limits(&bytes, limits);
        assert!(res.is_err(), "{proto:?}");
    }
}

#[cfg(feature = "check_complete_parse")]
#[test]
fn trailing_bytes_rejected() {
    for proto in [Protocol::Binary, Protocol::Compact] {
        let mut bytes = proto.serialize(&7i32).unwrap();
        bytes.push(0);
        let res: Result<i32, _> = proto.deserialize(&bytes);
        assert!(matches!(res, Err(DecodeError::Trailing { remaining: 1 })), "{proto:?}");
    }
}

#[cfg(not(feature = "check_complete_parse"))]
#[test]
fn trailing_bytes_ignored() {
    for proto in [Protocol::Binary, Protocol::Compact] {
        let mut bytes = proto.serialize(&7i32).unwrap();
        bytes.push(0);
        let val: i32 = proto.deserialize(&bytes).unwrap();
        assert_eq!(val, 7);
    }
}
