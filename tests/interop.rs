//! Byte-exact layouts, and agreement between record types and the value tree

mod common;

use common::*;
use thrift_protocol::{
    List, Map, Protocol, StructDesc, Struct, TypeDesc, TypeTag, Value,
};

fn mini() -> Value {
    Value::Struct(
        Struct::new()
            .with(1, true)
            .with(2, -42i8)
            .with(3, 27000i16)
            .with(5, "hi")
            .with(20, vec![1u8, 2, 3, 0xad])
            .with(
                21,
                Value::List(List::new(TypeTag::I32, vec![1i32.into(), (-1i32).into()])),
            )
            .with(
                22,
                Value::Map(Map::new(
                    TypeTag::String,
                    TypeTag::String,
                    vec![("one".into(), "two".into())],
                )),
            ),
    )
}

fn mini_desc() -> TypeDesc {
    StructDesc::new("Mini")
        .with_field(1, "flag", TypeDesc::Bool)
        .with_field(2, "small", TypeDesc::Byte)
        .with_field(3, "medium", TypeDesc::I16)
        .with_field(5, "text", TypeDesc::String)
        .with_field(20, "blob", TypeDesc::Binary)
        .with_field(21, "ints", TypeDesc::list(TypeDesc::I32))
        .with_field(22, "names", TypeDesc::map(TypeDesc::String, TypeDesc::String))
        .into()
}

const MINI_BINARY: &[u8] = &[
    0x02, 0x00, 0x01, 0x01, // 1: bool
    0x03, 0x00, 0x02, 0xd6, // 2: byte
    0x06, 0x00, 0x03, 0x69, 0x78, // 3: i16
    0x0b, 0x00, 0x05, 0x00, 0x00, 0x00, 0x02, b'h', b'i', // 5: string
    0x0b, 0x00, 0x14, 0x00, 0x00, 0x00, 0x04, 0x01, 0x02, 0x03, 0xad, // 20: binary
    0x0f, 0x00, 0x15, 0x08, 0x00, 0x00, 0x00, 0x02, // 21: list<i32>
    0x00, 0x00, 0x00, 0x01, 0xff, 0xff, 0xff, 0xff, //
    0x0d, 0x00, 0x16, 0x0b, 0x0b, 0x00, 0x00, 0x00, 0x01, // 22: map<string, string>
    0x00, 0x00, 0x00, 0x03, b'o', b'n', b'e', //
    0x00, 0x00, 0x00, 0x03, b't', b'w', b'o', //
    0x00,
];

const MINI_COMPACT: &[u8] = &[
    0x11, // 1: true, delta 1
    0x13, 0xd6, // 2: byte
    0x14, 0xf0, 0xa5, 0x03, // 3: i16 zigzag 54000
    0x28, 0x02, b'h', b'i', // 5: delta 2
    0xf8, 0x04, 0x01, 0x02, 0x03, 0xad, // 20: delta 15
    0x19, 0x25, 0x02, 0x01, // 21: list of two i32
    0x1b, 0x01, 0x88, 0x03, b'o', b'n', b'e', 0x03, b't', b'w', b'o', // 22
    0x00,
];

const MINI_JSON: &str = concat!(
    r#"{"1":["tf",true],"2":["i8",-42],"3":["i16",27000],"5":["str","hi"],"#,
    r#""20":["str","AQIDrQ=="],"21":["lst",["i32",2,1,-1]],"#,
    r#""22":["map",["str","str",1,"one","two"]]}"#,
);

fn golden(proto: Protocol) -> &'static [u8] {
    match proto {
        Protocol::Binary => MINI_BINARY,
        Protocol::Compact => MINI_COMPACT,
        Protocol::SimpleJson => MINI_JSON.as_bytes(),
    }
}

#[test]
fn writes_golden_layout() {
    let val = mini();
    for proto in ALL {
        let bytes = proto.serialize_value(&val).unwrap();
        assert_eq!(bytes, golden(proto), "{proto:?}");
        assert_eq!(proto.serialized_size(&val).unwrap(), golden(proto).len());
    }
}

#[test]
fn reads_golden_layout() {
    let desc = mini_desc();
    for proto in ALL {
        let val = proto.deserialize_value(golden(proto), &desc).unwrap();
        assert_eq!(val, mini(), "{proto:?}");
    }
}

#[test]
fn compact_field_deltas() {
    let val = Value::Struct(
        Struct::new()
            .with(1, 0i32)
            .with(16, 0i32)
            .with(32, 0i32)
            .with(10, 0i32),
    );
    let bytes = Protocol::Compact.serialize_value(&val).unwrap();
    assert_eq!(
        bytes,
        [
            0x15, 0x00, // 1: delta 1
            0xf5, 0x00, // 16: delta 15
            0x05, 0x40, 0x00, // 32: delta 16, long form
            0x05, 0x14, 0x00, // 10: negative delta, long form
            0x00,
        ]
    );
}

#[test]
fn compact_nested_struct_restores_field_scope() {
    let inner = Struct::new().with(7, 1i32);
    let val = Value::Struct(Struct::new().with(3, inner).with(4, 2i32));
    let bytes = Protocol::Compact.serialize_value(&val).unwrap();
    assert_eq!(
        bytes,
        [
            0x3c, // 3: struct, delta 3
            0x75, 0x02, 0x00, // inner 7: delta 7 from a fresh scope
            0x15, 0x04, // 4: delta 1 from field 3
            0x00,
        ]
    );
}

#[test]
fn record_and_value_agree() {
    let ooe = one_of_each();
    let desc = TypeDesc::from(one_of_each_desc());
    for proto in ALL {
        let typed = proto.serialize(&ooe).unwrap();
        let val = proto.deserialize_value(&typed, &desc).unwrap();
        assert_eq!(proto.serialize_value(&val).unwrap(), typed, "{proto:?}");

        let back: OneOfEach = proto.deserialize(&proto.serialize_value(&val).unwrap()).unwrap();
        assert_eq!(back, ooe, "{proto:?}");
    }

    let nested = nested();
    let desc = TypeDesc::from(nested_desc());
    for proto in ALL {
        let typed = proto.serialize(&nested).unwrap();
        let val = proto.deserialize_value(&typed, &desc).unwrap();
        assert_eq!(proto.serialize_value(&val).unwrap(), typed, "{proto:?}");
    }
}

#[test]
fn transcode_between_formats() {
    let ooe = one_of_each();
    let desc = TypeDesc::from(one_of_each_desc());
    for from in ALL {
        let val = from.deserialize_value(&from.serialize(&ooe).unwrap(), &desc).unwrap();
        for to in ALL {
            let back: OneOfEach = to.deserialize(&to.serialize_value(&val).unwrap()).unwrap();
            assert_eq!(back, ooe, "{from:?} -> {to:?}");
        }
    }
}

#[test]
fn json_escapes_control_characters() {
    let bytes = Protocol::SimpleJson.serialize("JSON THIS! \"\u{1}").unwrap();
    assert_eq!(bytes, br#""JSON THIS! \"\u0001""#);
    let back: String = Protocol::SimpleJson.deserialize(&bytes).unwrap();
    assert_eq!(back, "JSON THIS! \"\u{1}");
}
