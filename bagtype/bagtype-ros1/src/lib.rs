//! wire1 (ROS1) codec for `bagtype`.
//!
//! wire1 rules: all primitives little-endian, no alignment, fields written
//! in declared order with no gaps. Strings are a `uint32` byte length
//! followed by the bytes, sequences a `uint32` count followed by the
//! elements, fixed arrays just the elements. Nested messages inline.
//! `time` is `uint32 sec, uint32 nsec`; `duration` is the `int32` pair.

mod de;
mod ser;
mod size;

pub use de::{Reader, deserialize, deserialize_with};
pub use ser::serialize;
pub use size::{fixed_size, size};
