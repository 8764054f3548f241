use proptest::prelude::*;

use thrift_protocol::prelude::*;
use thrift_protocol::varint::{self, MAX_BYTES_64};
use thrift_protocol::SliceSource;

proptest! {
    #[test]
    fn zigzag_is_a_bijection(n in any::<i64>()) {
        prop_assert_eq!(varint::unzigzag_64(varint::zigzag_64(n)), n);
        prop_assert_eq!(varint::unzigzag_32(varint::zigzag_32(n as i32)), n as i32);
    }

    #[test]
    fn zigzag_keeps_small_magnitudes_small(n in -64i64..64) {
        prop_assert!(varint::zigzag_64(n) < 128);
    }

    #[test]
    fn varint_decodes_what_it_encodes(n in any::<u64>()) {
        let bytes = varint::encode(n);
        prop_assert_eq!(bytes.len(), varint::varint_len(n));
        let mut src = SliceSource::new(&bytes);
        prop_assert_eq!(varint::read(&mut src, MAX_BYTES_64).unwrap(), n);
        prop_assert!(src.rest().is_empty());
    }

    #[test]
    fn doubles_keep_their_bits(bits in any::<u64>()) {
        let val = f64::from_bits(bits);
        for proto in [Protocol::Binary, Protocol::Compact] {
            let back: f64 = proto.deserialize(&proto.serialize(&val).unwrap()).unwrap();
            prop_assert_eq!(back.to_bits(), bits);
        }
    }

    #[test]
    fn json_doubles_keep_their_value(val in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        let bytes = Protocol::SimpleJson.serialize(&val).unwrap();
        let back: f64 = Protocol::SimpleJson.deserialize(&bytes).unwrap();
        prop_assert_eq!(back.to_bits(), val.to_bits());
    }

    #[test]
    fn integers_survive_every_format(a in any::<i16>(), b in any::<i32>(), c in any::<i64>()) {
        for proto in [Protocol::Binary, Protocol::Compact, Protocol::SimpleJson] {
            prop_assert_eq!(proto.deserialize::<i16>(&proto.serialize(&a).unwrap()).unwrap(), a);
            prop_assert_eq!(proto.deserialize::<i32>(&proto.serialize(&b).unwrap()).unwrap(), b);
            prop_assert_eq!(proto.deserialize::<i64>(&proto.serialize(&c).unwrap()).unwrap(), c);
        }
    }

    #[test]
    fn strings_survive_every_format(s in any::<String>()) {
        for proto in [Protocol::Binary, Protocol::Compact, Protocol::SimpleJson] {
            let bytes = proto.serialize(s.as_str()).unwrap();
            prop_assert_eq!(bytes.len(), proto.serialized_size(s.as_str()).unwrap());
            prop_assert_eq!(proto.deserialize::<String>(&bytes).unwrap(), s.clone());
        }
    }

    #[test]
    fn binary_survives_every_format(v in proptest::collection::vec(any::<u8>(), 0..64)) {
        let blob = Bytes::from_vec(v.clone());
        for proto in [Protocol::Binary, Protocol::Compact, Protocol::SimpleJson] {
            let back: Bytes = proto.deserialize(&proto.serialize(&blob).unwrap()).unwrap();
            prop_assert_eq!(back.into_vec(), v.clone());
        }
    }
}
