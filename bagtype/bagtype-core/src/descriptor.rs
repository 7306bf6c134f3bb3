//! Canonical type descriptors consumed by the codecs, hashers, and emitter.
//!
//! A [`Descriptor`] is the single normalized representation of a message
//! type: parsers produce a raw AST ([`crate::ast`]), the normalizer folds it
//! into descriptors, and everything downstream (typestore, codecs,
//! translator) works exclusively on this model.

use std::borrow::Cow;
use std::fmt;

use crate::error::TypeSysError;

/// Fully-qualified type name in canonical `package/sub/Name` form.
///
/// `sub` is one of `msg`, `srv`, `action`. Two-segment references
/// (`pkg/Name`) normalize by injecting `msg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(String);

impl TypeName {
    /// Parse an absolute name (`pkg/Name` or `pkg/sub/Name`).
    pub fn parse(name: &str) -> Result<Self, TypeSysError> {
        let parts: Vec<&str> = name.split('/').collect();
        let canonical = match parts.as_slice() {
            [pkg, short] if is_ident(pkg) && is_ident(short) => {
                format!("{pkg}/msg/{short}")
            }
            [pkg, sub, short]
                if is_ident(pkg)
                    && matches!(*sub, "msg" | "srv" | "action")
                    && is_ident(short) =>
            {
                name.to_string()
            }
            _ => {
                return Err(TypeSysError::UnknownType {
                    name: name.to_string(),
                });
            }
        };
        Ok(Self(canonical))
    }

    /// Resolve a possibly relative reference within `package`.
    ///
    /// A bare name resolves into `package/msg/`, except `Header`, which is
    /// the conventional alias for `std_msgs/msg/Header`.
    pub fn resolve(reference: &str, package: &str) -> Result<Self, TypeSysError> {
        if reference.contains('/') {
            return Self::parse(reference);
        }
        if reference == "Header" {
            return Ok(Self("std_msgs/msg/Header".to_string()));
        }
        if !is_ident(reference) || !is_ident(package) {
            return Err(TypeSysError::UnknownType {
                name: reference.to_string(),
            });
        }
        Ok(Self(format!("{package}/msg/{reference}")))
    }

    /// Build a name from scoped segments (`["pkg", "msg", "Name"]` or
    /// `["pkg", "Name"]`).
    pub fn from_segments(segments: &[String]) -> Result<Self, TypeSysError> {
        Self::parse(&segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn package(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    /// The namespace segment: `msg`, `srv`, or `action`.
    pub fn middle(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }

    /// The unqualified type name.
    pub fn short(&self) -> &str {
        self.0.split('/').nth(2).unwrap_or_default()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Primitive wire types.
///
/// `byte`, `char`, and `octet` keep their spelling for hashing and emission
/// but share the one-byte unsigned wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BaseType {
    Bool,
    Byte,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// UTF-8 string with an optional maximum byte length.
    String(Option<usize>),
    /// Wide string with an optional maximum character count.
    WString(Option<usize>),
    Time,
    Duration,
    Octet,
}

impl BaseType {
    /// Parse a bare MSG-style primitive name (bounds are handled by the
    /// grammar, not here).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "byte" => Self::Byte,
            "char" => Self::Char,
            "int8" => Self::I8,
            "int16" => Self::I16,
            "int32" => Self::I32,
            "int64" => Self::I64,
            "uint8" => Self::U8,
            "uint16" => Self::U16,
            "uint32" => Self::U32,
            "uint64" => Self::U64,
            "float32" => Self::F32,
            "float64" => Self::F64,
            "string" => Self::String(None),
            "wstring" => Self::WString(None),
            "time" => Self::Time,
            "duration" => Self::Duration,
            "octet" => Self::Octet,
            _ => return None,
        })
    }

    /// Canonical spelling used by the hashers and the emitter.
    pub fn spelling(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Byte => "byte".to_string(),
            Self::Char => "char".to_string(),
            Self::I8 => "int8".to_string(),
            Self::I16 => "int16".to_string(),
            Self::I32 => "int32".to_string(),
            Self::I64 => "int64".to_string(),
            Self::U8 => "uint8".to_string(),
            Self::U16 => "uint16".to_string(),
            Self::U32 => "uint32".to_string(),
            Self::U64 => "uint64".to_string(),
            Self::F32 => "float32".to_string(),
            Self::F64 => "float64".to_string(),
            Self::String(None) => "string".to_string(),
            Self::String(Some(n)) => format!("string<={n}"),
            Self::WString(None) => "wstring".to_string(),
            Self::WString(Some(n)) => format!("wstring<={n}"),
            Self::Time => "time".to_string(),
            Self::Duration => "duration".to_string(),
            Self::Octet => "octet".to_string(),
        }
    }

    /// True for the primitives that share the `u8` wire shape; runs of these
    /// deserialize to [`crate::Value::Bytes`].
    pub fn is_u8_shaped(&self) -> bool {
        matches!(self, Self::Byte | Self::Char | Self::U8 | Self::Octet)
    }

    /// Inclusive integer range, for the integral types.
    pub fn int_bounds(&self) -> Option<(i128, i128)> {
        Some(match self {
            Self::I8 => (i8::MIN as i128, i8::MAX as i128),
            Self::I16 => (i16::MIN as i128, i16::MAX as i128),
            Self::I32 => (i32::MIN as i128, i32::MAX as i128),
            Self::I64 => (i64::MIN as i128, i64::MAX as i128),
            Self::U8 | Self::Byte | Self::Char | Self::Octet => (0, u8::MAX as i128),
            Self::U16 => (0, u16::MAX as i128),
            Self::U32 => (0, u32::MAX as i128),
            Self::U64 => (0, u64::MAX as i128),
            _ => return None,
        })
    }
}

/// A type expression inside a canonical descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Base(BaseType),
    /// Reference to another registered type.
    Named(TypeName),
    /// Fixed-length array, no wire count prefix.
    Array { elem: Box<TypeSpec>, len: usize },
    /// Variable-length sequence with an optional upper bound.
    Sequence {
        elem: Box<TypeSpec>,
        bound: Option<usize>,
    },
}

impl TypeSpec {
    /// The name reference inside this spec, looking through arrays and
    /// sequences.
    pub fn named_ref(&self) -> Option<&TypeName> {
        match self {
            Self::Base(_) => None,
            Self::Named(name) => Some(name),
            Self::Array { elem, .. } | Self::Sequence { elem, .. } => elem.named_ref(),
        }
    }
}

/// A constant or default value as it appears in a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    Seq(Vec<Literal>),
}

impl Literal {
    /// Parse an integer literal: decimal, `0x` hex, `0o` octal, `0b` binary,
    /// with an optional sign.
    pub fn parse_int(s: &str) -> Option<i128> {
        let s = s.trim();
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, s.strip_prefix('+').unwrap_or(s).trim_start()),
        };
        let val = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            i128::from_str_radix(hex, 16).ok()?
        } else if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
            i128::from_str_radix(oct, 8).ok()?
        } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
            i128::from_str_radix(bin, 2).ok()?
        } else {
            body.parse::<i128>().ok()?
        };
        Some(if neg { -val } else { val })
    }

    /// Strip one pair of matching surrounding quotes and decode
    /// `\n \t \r \\ \" \' \uXXXX` escapes. Returns `None` when `s` is not
    /// quoted or an escape is malformed.
    pub fn unquote(s: &str) -> Option<String> {
        let q = s.chars().next()?;
        if (q != '"' && q != '\'') || s.len() < 2 || !s.ends_with(q) {
            return None;
        }
        Self::decode_escapes(&s[1..s.len() - 1])
    }

    /// Decode backslash escapes in a string literal body.
    pub fn decode_escapes(s: &str) -> Option<String> {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 {
                        return None;
                    }
                    let cp = u32::from_str_radix(&hex, 16).ok()?;
                    out.push(char::from_u32(cp)?);
                }
                _ => return None,
            }
        }
        Some(out)
    }

    /// Canonical text rendering used by the hashers and the emitter.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format!("{f:?}"),
            Self::Str(s) => s.clone(),
            Self::Seq(items) => {
                let inner: Vec<String> = items.iter().map(Self::render).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

/// A single message field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeSpec,
    pub default: Option<Literal>,
}

impl Field {
    /// Field name made safe for host-language surfaces: identifiers that
    /// collide with a Rust keyword gain a `_` suffix. The descriptor and
    /// the emitter always keep the original spelling.
    pub fn safe_name(&self) -> Cow<'_, str> {
        if RUST_KEYWORDS.contains(&self.name.as_str()) {
            Cow::Owned(format!("{}_", self.name))
        } else {
            Cow::Borrowed(self.name.as_str())
        }
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "yield",
];

/// A named constant attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub ty: BaseType,
    pub value: Literal,
}

/// Whether a descriptor is a real message or a constants-only group
/// (e.g. an IDL enumeration or a lone `Foo_Constants` module).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Message,
    ConstantGroup,
}

/// Canonical in-memory representation of one message type.
///
/// Field order is part of a type's identity: two descriptors with the same
/// fields in a different order are different types.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: TypeName,
    pub kind: DescriptorKind,
    pub fields: Vec<Field>,
    pub constants: Vec<Constant>,
}

impl Descriptor {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Direct name references of this descriptor, in field order.
    pub fn named_deps(&self) -> impl Iterator<Item = &TypeName> {
        self.fields.iter().filter_map(|f| f.ty.named_ref())
    }
}
