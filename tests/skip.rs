mod common;

use common::*;
use thrift_protocol::prelude::*;
use thrift_protocol::{
    BinaryReader, CompactReader, JsonReader, SliceSource, Struct, StructDesc, TypeDesc, Value,
};

fn read_not_nested<R: ProtocolReader>(mut r: R) -> (NotNested, usize) {
    let nn = NotNested::read(&mut r).unwrap();
    (nn, r.trailing())
}

#[test]
fn unknown_nested_field_is_skipped() {
    let nested = nested();
    for proto in ALL {
        let bytes = proto.serialize(&nested).unwrap();
        let src = SliceSource::new(&bytes);
        let (nn, trailing) = match proto {
            Protocol::Binary => read_not_nested(BinaryReader::new(src)),
            Protocol::Compact => read_not_nested(CompactReader::new(src)),
            Protocol::SimpleJson => read_not_nested(JsonReader::new(src)),
        };
        assert_eq!(nn.bar, 42, "{proto:?}");
        assert_eq!(trailing, 0, "{proto:?}");
    }
}

#[test]
fn skip_consumes_whole_record() {
    let ooe = one_of_each();
    for proto in [Protocol::Binary, Protocol::Compact] {
        let mut bytes = proto.serialize(&ooe).unwrap();
        let len = bytes.len();
        bytes.extend_from_slice(&[0xab, 0xcd]);
        let consumed = match proto {
            Protocol::Binary => {
                let mut r = BinaryReader::new(SliceSource::new(&bytes));
                r.skip(TypeTag::Struct).unwrap();
                assert_eq!(r.trailing(), 2);
                r.position()
            }
            _ => {
                let mut r = CompactReader::new(SliceSource::new(&bytes));
                r.skip(TypeTag::Struct).unwrap();
                assert_eq!(r.trailing(), 2);
                r.position()
            }
        };
        assert_eq!(consumed, len, "{proto:?}");
    }
}

#[test]
fn value_reader_skips_fields_missing_from_descriptor() {
    let desc: TypeDesc = StructDesc::new("NotNested")
        .with_field(2, "bar", TypeDesc::I32)
        .into();
    for proto in ALL {
        let bytes = proto.serialize(&nested()).unwrap();
        let val = proto.deserialize_value(&bytes, &desc).unwrap();
        assert_eq!(val, Value::Struct(Struct::new().with(2, 42i32)), "{proto:?}");
    }
}

#[test]
fn mismatched_field_type_is_skipped() {
    // field 2 holds a string where the reader expects an i32
    let written = Value::Struct(Struct::new().with(1, 5i32).with(2, "forty-two"));
    for proto in ALL {
        let bytes = proto.serialize_value(&written).unwrap();
        let nn: NotNested = proto.deserialize(&bytes).unwrap();
        assert_eq!(nn, NotNested::default(), "{proto:?}");
    }
}
