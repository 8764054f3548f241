#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use thrift_protocol::prelude::*;
use thrift_protocol::{StructDesc, TypeDesc};

pub const ALL: [Protocol; 3] = [Protocol::Binary, Protocol::Compact, Protocol::SimpleJson];

/// Reads a field value into `$slot` if the wire tag matches its type
macro_rules! field_into {
    ($r:ident, $h:ident, $slot:expr) => {{
        if $h.tag.matches(typed_tag(&$slot)) {
            $slot = Decode::read($r)?;
            true
        } else {
            false
        }
    }};
}

fn typed_tag<T: Typed>(_: &T) -> TypeTag {
    T::TAG
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OneOfEach {
    pub im_true: bool,
    pub im_false: bool,
    pub a_bite: i8,
    pub integer16: i16,
    pub integer32: i32,
    pub integer64: i64,
    pub double_precision: f64,
    pub some_characters: String,
    pub zomg_unicode: String,
    pub what_who: bool,
    pub base64: Bytes,
    pub byte_list: Vec<i8>,
    pub i16_list: Vec<i16>,
    pub i64_list: Vec<i64>,
    pub string_string_map: BTreeMap<String, String>,
    pub string_string_hash_map: HashMap<String, String>,
    pub rank_map: BTreeMap<i64, f32>,
    pub float_precision: f32,
}

impl Typed for OneOfEach {
    const TAG: TypeTag = TypeTag::Struct;
}

impl Encode for OneOfEach {
    fn tag(&self) -> TypeTag {
        Self::TAG
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        Ok(w.write_struct_begin("OneOfEach")?
            + w.write_field(1, &self.im_true)?
            + w.write_field(2, &self.im_false)?
            + w.write_field(3, &self.a_bite)?
            + w.write_field(4, &self.integer16)?
            + w.write_field(5, &self.integer32)?
            + w.write_field(6, &self.integer64)?
            + w.write_field(7, &self.double_precision)?
            + w.write_field(8, &self.some_characters)?
            + w.write_field(9, &self.zomg_unicode)?
            + w.write_field(10, &self.what_who)?
            + w.write_field(11, &self.base64)?
            + w.write_field(12, &self.byte_list)?
            + w.write_field(13, &self.i16_list)?
            + w.write_field(14, &self.i64_list)?
            + w.write_field(15, &self.string_string_map)?
            + w.write_field(16, &self.string_string_hash_map)?
            + w.write_field(17, &self.rank_map)?
            + w.write_field(18, &self.float_precision)?
            + w.write_field_stop()?
            + w.write_struct_end()?)
    }
}

impl Decode for OneOfEach {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        let mut out = OneOfEach::default();
        r.read_fields(|r, h| {
            Ok(match h.id {
                1 => field_into!(r, h, out.im_true),
                2 => field_into!(r, h, out.im_false),
                3 => field_into!(r, h, out.a_bite),
                4 => field_into!(r, h, out.integer16),
                5 => field_into!(r, h, out.integer32),
                6 => field_into!(r, h, out.integer64),
                7 => field_into!(r, h, out.double_precision),
                8 => field_into!(r, h, out.some_characters),
                9 => field_into!(r, h, out.zomg_unicode),
                10 => field_into!(r, h, out.what_who),
                11 => field_into!(r, h, out.base64),
                12 => field_into!(r, h, out.byte_list),
                13 => field_into!(r, h, out.i16_list),
                14 => field_into!(r, h, out.i64_list),
                15 => field_into!(r, h, out.string_string_map),
                16 => field_into!(r, h, out.string_string_hash_map),
                17 => field_into!(r, h, out.rank_map),
                18 => field_into!(r, h, out.float_precision),
                _ => false,
            })
        })?;
        Ok(out)
    }
}

pub fn one_of_each() -> OneOfEach {
    OneOfEach {
        im_true: true,
        im_false: false,
        a_bite: 0xd6_u8 as i8,
        integer16: 27000,
        integer32: 1 << 24,
        integer64: 6000 * 1000 * 1000,
        double_precision: std::f64::consts::PI,
        some_characters: "JSON THIS! \"\u{1}".to_owned(),
        zomg_unicode: "\u{5d0}\n\u{7}\t".to_owned(),
        what_who: false,
        base64: Bytes::from([1u8, 2, 3, 0xad]),
        byte_list: vec![1, 2, 3],
        i16_list: vec![1, 2, 3],
        i64_list: vec![1, 2, 3],
        string_string_map: [("one".to_owned(), "two".to_owned())].into_iter().collect(),
        string_string_hash_map: [("three".to_owned(), "four".to_owned())]
            .into_iter()
            .collect(),
        rank_map: [(567419810, 0.211184_f32), (507959914, 0.080382_f32)]
            .into_iter()
            .collect(),
        float_precision: 12.345,
    }
}

pub fn one_of_each_desc() -> Arc<StructDesc> {
    let string_map = || TypeDesc::map(TypeDesc::String, TypeDesc::String);
    Arc::new(
        StructDesc::new("OneOfEach")
            .with_field(1, "im_true", TypeDesc::Bool)
            .with_field(2, "im_false", TypeDesc::Bool)
            .with_field(3, "a_bite", TypeDesc::Byte)
            .with_field(4, "integer16", TypeDesc::I16)
            .with_field(5, "integer32", TypeDesc::I32)
            .with_field(6, "integer64", TypeDesc::I64)
            .with_field(7, "double_precision", TypeDesc::Double)
            .with_field(8, "some_characters", TypeDesc::String)
            .with_field(9, "zomg_unicode", TypeDesc::String)
            .with_field(10, "what_who", TypeDesc::Bool)
            .with_field(11, "base64", TypeDesc::Binary)
            .with_field(12, "byte_list", TypeDesc::list(TypeDesc::Byte))
            .with_field(13, "i16_list", TypeDesc::list(TypeDesc::I16))
            .with_field(14, "i64_list", TypeDesc::list(TypeDesc::I64))
            .with_field(15, "string_string_map", string_map())
            .with_field(16, "string_string_hash_map", string_map())
            .with_field(17, "rank_map", TypeDesc::map(TypeDesc::I64, TypeDesc::Float))
            .with_field(18, "float_precision", TypeDesc::Float),
    )
}

pub type Foo = BTreeMap<String, Vec<BTreeSet<BTreeMap<i32, i32>>>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Nested {
    pub foo: Foo,
    pub bar: i32,
}

impl Typed for Nested {
    const TAG: TypeTag = TypeTag::Struct;
}

impl Encode for Nested {
    fn tag(&self) -> TypeTag {
        Self::TAG
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        Ok(w.write_struct_begin("Nested")?
            + w.write_field(1, &self.foo)?
            + w.write_field(2, &self.bar)?
            + w.write_field_stop()?
            + w.write_struct_end()?)
    }
}

impl Decode for Nested {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        let mut out = Nested::default();
        r.read_fields(|r, h| {
            Ok(match h.id {
                1 => field_into!(r, h, out.foo),
                2 => field_into!(r, h, out.bar),
                _ => false,
            })
        })?;
        Ok(out)
    }
}

fn int_map(pairs: &[(i32, i32)]) -> BTreeMap<i32, i32> {
    pairs.iter().copied().collect()
}

pub fn nested() -> Nested {
    let mut foo = Foo::new();
    foo.insert(
        "foo".to_owned(),
        vec![[int_map(&[(3, 2), (4, 5)]), int_map(&[(2, 1), (1, 6)])]
            .into_iter()
            .collect()],
    );
    foo.insert(
        "bar".to_owned(),
        vec![
            [int_map(&[(1, 0), (5, 0)])].into_iter().collect(),
            [int_map(&[(0, 0), (5, 5)])].into_iter().collect(),
        ],
    );
    Nested { foo, bar: 42 }
}

pub fn nested_desc() -> Arc<StructDesc> {
    let inner = TypeDesc::set(TypeDesc::map(TypeDesc::I32, TypeDesc::I32));
    Arc::new(
        StructDesc::new("Nested")
            .with_field(1, "foo", TypeDesc::map(TypeDesc::String, TypeDesc::list(inner)))
            .with_field(2, "bar", TypeDesc::I32),
    )
}

/// Reader-side view of `Nested` that only knows about field 2
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotNested {
    pub bar: i32,
}

impl Decode for NotNested {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        let mut out = NotNested::default();
        r.read_fields(|r, h| {
            Ok(match h.id {
                2 => field_into!(r, h, out.bar),
                _ => false,
            })
        })?;
        Ok(out)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Doubles {
    pub inf: f64,
    pub neginf: f64,
    pub nan: f64,
    pub repeating: f64,
    pub big: f64,
    pub small: f64,
    pub zero: f64,
    pub negzero: f64,
}

impl Encode for Doubles {
    fn tag(&self) -> TypeTag {
        TypeTag::Struct
    }

    fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
        Ok(w.write_struct_begin("Doubles")?
            + w.write_field(1, &self.inf)?
            + w.write_field(2, &self.neginf)?
            + w.write_field(3, &self.nan)?
            + w.write_field(4, &self.repeating)?
            + w.write_field(5, &self.big)?
            + w.write_field(6, &self.small)?
            + w.write_field(7, &self.zero)?
            + w.write_field(8, &self.negzero)?
            + w.write_field_stop()?
            + w.write_struct_end()?)
    }
}

impl Decode for Doubles {
    fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
        let mut out = Doubles::default();
        r.read_fields(|r, h| {
            Ok(match h.id {
                1 => field_into!(r, h, out.inf),
                2 => field_into!(r, h, out.neginf),
                3 => field_into!(r, h, out.nan),
                4 => field_into!(r, h, out.repeating),
                5 => field_into!(r, h, out.big),
                6 => field_into!(r, h, out.small),
                7 => field_into!(r, h, out.zero),
                8 => field_into!(r, h, out.negzero),
                _ => false,
            })
        })?;
        Ok(out)
    }
}

pub fn doubles() -> Doubles {
    Doubles {
        inf: f64::INFINITY,
        neginf: f64::NEG_INFINITY,
        nan: f64::NAN,
        repeating: 9.0 / 11.0,
        big: f64::MAX,
        small: f64::EPSILON,
        zero: 0.0,
        negzero: -0.0,
    }
}
