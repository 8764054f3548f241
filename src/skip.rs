//! Schema-free consumption of encoded values
//!
//! [`skip`] consumes exactly one complete value of a known tag from any
//! [`ProtocolReader`], without materializing it. This is how a reader
//! steps over fields it does not recognize, which is what allows records to
//! gain fields without breaking older consumers.
//!
//! Structs are skipped by reading field headers until the end-of-fields
//! marker, skipping each field value in turn; containers are skipped by
//! reading their header and then skipping `size` elements (or `2 * size`
//! for maps). Scalars are delegated to [`ProtocolReader::skip_scalar`], so
//! that each format can step over them in whatever way is cheapest.
//!
//! Recursion is bounded by [`Limits::max_depth`](crate::protocol::Limits);
//! a stream nested more deeply than that fails with
//! [`NestingError::DepthExceeded`] rather than exhausting the stack.

use crate::error::{NestingError, ProtocolResult};
use crate::protocol::ProtocolReader;
use crate::tag::TypeTag;

/// Consumes one value of type `tag` from `r`
pub fn skip<R: ProtocolReader>(r: &mut R, tag: TypeTag) -> ProtocolResult<()> {
    let max_depth = r.limits().max_depth;
    skip_at(r, tag, 0, max_depth)
}

/// Consumes one value of type `tag` found `depth` levels into an enclosing value
pub(crate) fn skip_at<R: ProtocolReader>(
    r: &mut R,
    tag: TypeTag,
    depth: usize,
    max_depth: usize,
) -> ProtocolResult<()> {
    match tag {
        _ if tag.is_composite() && depth >= max_depth => {
            Err(NestingError::DepthExceeded { limit: max_depth }.into())
        }
        TypeTag::Struct => {
            r.read_struct_begin()?;
            loop {
                let header = r.read_field_begin()?;
                if header.is_stop() {
                    break;
                }
                tracing::trace!(id = header.id, tag = %header.tag, depth, "skipping field");
                skip_at(r, header.tag, depth + 1, max_depth)?;
                r.read_field_end()?;
            }
            r.read_struct_end()
        }
        TypeTag::List => {
            let header = r.read_list_begin()?;
            tracing::trace!(elem = %header.elem, size = header.size, depth, "skipping list");
            for _ in 0..header.size {
                skip_at(r, header.elem, depth + 1, max_depth)?;
            }
            r.read_list_end()
        }
        TypeTag::Set => {
            let header = r.read_set_begin()?;
            tracing::trace!(elem = %header.elem, size = header.size, depth, "skipping set");
            for _ in 0..header.size {
                skip_at(r, header.elem, depth + 1, max_depth)?;
            }
            r.read_set_end()
        }
        TypeTag::Map => {
            let header = r.read_map_begin()?;
            tracing::trace!(
                key = %header.key,
                value = %header.value,
                size = header.size,
                depth,
                "skipping map"
            );
            for _ in 0..header.size {
                skip_at(r, header.key, depth + 1, max_depth)?;
                skip_at(r, header.value, depth + 1, max_depth)?;
            }
            r.read_map_end()
        }
        _ => r.skip_scalar(tag),
    }
}
