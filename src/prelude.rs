//! Assorted imports for implementing [`Encode`] and [`Decode`] on record types
//!
//! ```
//! use thrift_protocol::prelude::*;
//!
//! struct Ping {
//!     seq: i32,
//! }
//!
//! impl Typed for Ping {
//!     const TAG: TypeTag = TypeTag::Struct;
//! }
//!
//! impl Encode for Ping {
//!     fn tag(&self) -> TypeTag {
//!         Self::TAG
//!     }
//!
//!     fn write<W: ProtocolWriter>(&self, w: &mut W) -> ProtocolResult<usize> {
//!         Ok(w.write_struct_begin("Ping")?
//!             + w.write_field(1, &self.seq)?
//!             + w.write_field_stop()?
//!             + w.write_struct_end()?)
//!     }
//! }
//!
//! impl Decode for Ping {
//!     fn read<R: ProtocolReader>(r: &mut R) -> ProtocolResult<Self> {
//!         let mut seq = None;
//!         r.read_fields(|r, header| match (header.id, header.tag) {
//!             (1, TypeTag::I32) => {
//!                 seq = Some(r.read_i32()?);
//!                 Ok(true)
//!             }
//!             _ => Ok(false),
//!         })?;
//!         Ok(Ping { seq: seq.unwrap_or_default() })
//!     }
//! }
//!
//! let bytes = Protocol::Binary.serialize(&Ping { seq: 7 }).unwrap();
//! let back: Ping = Protocol::Binary.deserialize(&bytes).unwrap();
//! assert_eq!(back.seq, 7);
//! ```

pub use crate::conv::{Decode, Encode, EncodeLength, Typed};
pub use crate::error::{ProtocolError, ProtocolResult};
pub use crate::protocol::{Protocol, ProtocolReader, ProtocolWriter};
pub use crate::schema::Bytes;
pub use crate::tag::{FieldHeader, ListHeader, MapHeader, SetHeader, TypeTag};
