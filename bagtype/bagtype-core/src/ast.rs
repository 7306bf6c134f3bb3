//! Raw AST produced by the MSG and IDL parsers.
//!
//! Both grammars emit these types; the normalizer in `bagtype-store` turns
//! them into canonical [`crate::Descriptor`]s. Type references are kept as
//! unresolved segment lists because only the normalizer knows the package
//! context needed to absolutize them.

use crate::descriptor::{BaseType, DescriptorKind, Literal, TypeName};

/// A type expression as written in source, before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawType {
    Base(BaseType),
    /// Unresolved (possibly relative) reference: `["Point"]`,
    /// `["geometry_msgs", "Point"]`, or `["geometry_msgs", "msg", "Point"]`.
    Named(Vec<String>),
    Array {
        elem: Box<RawType>,
        len: usize,
    },
    Sequence {
        elem: Box<RawType>,
        bound: Option<usize>,
    },
}

/// A field as parsed, default literal included.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub ty: RawType,
    pub default: Option<Literal>,
}

/// A constant as parsed. Range checking happens in the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawConstant {
    pub name: String,
    pub ty: BaseType,
    pub value: Literal,
}

/// One parsed message (or constants-only group) with its qualified name.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub name: TypeName,
    pub kind: DescriptorKind,
    pub fields: Vec<RawField>,
    pub constants: Vec<RawConstant>,
    /// Original-definition text captured from an IDL `@verbatim` annotation.
    pub verbatim: Option<String>,
}

impl RawMessage {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            kind: DescriptorKind::Message,
            fields: Vec::new(),
            constants: Vec::new(),
            verbatim: None,
        }
    }
}
