//! Structured-value model and wire protocols for cross-language record interchange
//!
//! # Overview
//!
//! This library implements the serialization layer of an RPC-style
//! interchange format: a small, closed set of value types (scalars,
//! strings, binary blobs, lists, sets, maps and records of numbered
//! fields), together with three interchangeable wire encodings for them:
//!
//!   * the **Binary** protocol, fixed-width and big-endian
//!   * the **Compact** protocol, built on zigzag varints and delta-encoded
//!     field ids
//!   * the **SimpleJSON** protocol, a self-describing text encoding
//!
//! Every encoding is driven by the same call sequence, defined by the
//! [`ProtocolWriter`] and [`ProtocolReader`] traits, so that a record type
//! written once against those traits can be transcoded through any of the
//! formats. Because every field is tagged with its type on the wire, a
//! reader can [`skip`](skip::skip) fields it does not recognize, and
//! records can evolve without breaking existing readers.
//!
//! # Layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`tag`]       | [`TypeTag`] and the field and container headers                 |
//! | [`schema`]    | run-time type descriptors, and the [`Bytes`] newtype            |
//! | [`value`]     | the dynamically-shaped [`Value`] tree                           |
//! | [`conv`]      | the [`Encode`] and [`Decode`] traits, and the [`Target`] sink   |
//! | [`parse`]     | the [`Source`] trait and its slice and vector implementations   |
//! | [`protocol`]  | the protocol traits, the three formats, and [`Protocol`]        |
//! | [`varint`]    | zigzag and base-128 varint primitives                           |
//! | [`skip`]      | schema-free consumption of encoded values                       |
//! | [`sync`]      | locks for sharing codecs and decoded state between threads      |
//! | [`error`]     | the [`ProtocolError`] hierarchy                                 |
//!
//! # Features
//!
//!   * `check_complete_parse`: top-level decoding through [`Protocol`]
//!     fails if input remains after the value
//!   * `serde_impls`: `serde` support for tags, values and descriptors
//!   * `smallvec_framestack`: inline storage for the nesting stacks of the
//!     Compact and SimpleJSON codecs
//!   * `expose_internal`: makes the `internal` module public
//!
//! # Example
//!
//! ```
//! use thrift_protocol::{Protocol, Struct, Value};
//!
//! let val = Value::Struct(Struct::new().with(1, 42i32).with(2, "hello"));
//! let bytes = Protocol::Compact.serialize_value(&val).unwrap();
//! assert_eq!(bytes.len(), Protocol::Compact.serialized_size(&val).unwrap());
//! ```

pub mod conv;
pub mod error;
pub mod parse;
pub mod prelude;
pub mod protocol;
pub mod schema;
pub mod skip;
pub mod sync;
pub mod tag;
pub mod value;
pub mod varint;

cfg_if::cfg_if! {
    if #[cfg(feature = "expose_internal")] {
        pub mod internal;
    } else {
        mod internal;
    }
}

pub use crate::conv::{
    error::{DecodeError, DecodeResult},
    target::{ByteCounter, Target},
    Decode, Encode, EncodeLength, Typed,
};
pub use crate::error::{ProtocolError, ProtocolResult};
pub use crate::parse::{SliceSource, Source, VecSource};
pub use crate::protocol::{
    BinaryReader, BinaryWriter, CompactReader, CompactWriter, FieldIdScopes, JsonReader,
    JsonWriter, Limits, Protocol, ProtocolReader, ProtocolWriter,
};
pub use crate::schema::{Bytes, FieldDesc, StructDesc, TypeDesc};
pub use crate::sync::{CodecLock, NoStarveRwLock};
pub use crate::tag::{FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};
pub use crate::value::{Field, List, Map, Struct, Value};
