//! MSG interface-definition parser for `bagtype`.
//!
//! # Pipeline
//!
//! ```text
//! definition text (UTF-8, possibly a concatenated bundle)
//!   └─ split_bundle        – split sections at `====` separators
//!       └─ parse_msg_bundle – line parser → RawMessage per section
//!           └─ (bagtype-store) normalize + register
//! ```
//!
//! The grammar accepts comments (`# …`), constants (`TYPE NAME = VALUE`),
//! fields (`TYPE name [= DEFAULT]`), bounded strings (`string<=10`), and
//! the `[]` / `[N]` / `[<=N]` array suffixes. Dependency sections are
//! separated by lines of at least eighty `=` and prefaced by `MSG: pkg/Name`
//! headers.

mod bundle;
mod parser;

pub use bundle::{MsgSection, is_separator_line, split_bundle};
pub use parser::{parse_msg, parse_msg_bundle};
