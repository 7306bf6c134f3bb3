//! OMG IDL subset parser for `bagtype`.
//!
//! # Pipeline
//!
//! ```text
//! definition text (UTF-8 IDL, possibly a `====`-separated bundle)
//!   └─ strip_block_comments  – /* … */ removal, line numbers preserved
//!       └─ parse_idl_bundle  – nom-based grammar → RawMessage per struct
//!           └─ (bagtype-store) normalize + register
//! ```
//!
//! Scoped names (`foo::bar::Baz` or `foo/bar/Baz`) map to canonical
//! `foo/bar/Baz` type names. `Foo_Constants` modules and enumerations fold
//! into per-constant entries. `@default` annotations become field defaults;
//! `@verbatim(language="comment")` text is captured as the struct's
//! original-definition text.

mod lex;
mod parser;

pub use lex::{is_separator_line, strip_block_comments, strip_line_comments};
pub use parser::parse_idl_bundle;
