//! Type system and wire1/CDR serialization core for robotics bag tooling.
//!
//! Definitions written in the MSG or IDL interface languages parse into a
//! canonical descriptor model, registered in a [`Typestore`] that hashes
//! (MD5 and RIHS01) and re-emits them. Two runtime codecs convert between
//! the generic [`Value`] tree and bytes — [`ros1`] for the packed
//! little-endian wire1 format, [`cdr`] for aligned, endian-prefixed CDR —
//! and [`ros1_to_cdr`] / [`cdr_to_ros1`] re-encode single messages between
//! the wires without materializing them.
//!
//! ```
//! use bagtype::{Preset, SchemaFormat, Typestore, Value, ros1};
//!
//! let mut store = Typestore::new(Preset::Ros1Defaults);
//! store
//!     .register_text(SchemaFormat::Msg, "uint32 a\nstring b", Some("p/msg/Foo"))
//!     .unwrap();
//!
//! let value = Value::Message(vec![
//!     ("a".into(), Value::U32(1)),
//!     ("b".into(), Value::string("hi")),
//! ]);
//! let bytes = ros1::serialize(&store, "p/msg/Foo", &value).unwrap();
//! assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0, b'h', b'i']);
//! ```

mod translate;

pub use bagtype_core::{
    BaseType, Constant, Descriptor, DescriptorKind, Field, Literal, Mode, ParseError,
    ParseErrorKind, TypeName, TypeSpec, TypeSysError, Value,
};
pub use bagtype_store::{Preset, SchemaFormat, Typestore, normalize};
pub use translate::{cdr_to_ros1, ros1_to_cdr};

/// wire1 (ROS1) codec: packed little-endian, no alignment.
pub mod ros1 {
    pub use bagtype_ros1::{deserialize, deserialize_with, fixed_size, serialize, size};
}

/// CDR codec: aligned, endian-prefixed.
pub mod cdr {
    pub use bagtype_cdr::{deserialize, deserialize_with, serialize};
}

/// Definition-language parsers, for callers that need raw ASTs.
pub mod parse {
    pub use bagtype_idl::parse_idl_bundle;
    pub use bagtype_msg::{parse_msg, parse_msg_bundle};
}
