//! CDR codec for `bagtype`.
//!
//! CDR rules: a 4-byte representation identifier selects the byte order
//! (`00 01 00 00` little-endian, `00 00 00 00` big-endian; writes always
//! emit little-endian). Every primitive thereafter aligns to
//! `min(sizeof, 8)` relative to the start of the payload. Strings carry a
//! `uint32` length that includes the `0x00` terminator; sequences a
//! `uint32` count; fixed arrays just their elements. Empty structs and
//! zero-element arrays occupy zero bytes; trailing padding is never
//! required.

mod de;
mod ser;

pub use de::{Reader, deserialize, deserialize_with};
pub use ser::{Writer, serialize};
