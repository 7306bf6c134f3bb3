//! Generic tagged value tree exchanged with the codecs.

use std::sync::Arc;

/// Value produced and consumed by the wire codecs.
/// All leaves are explicitly typed; no lossy conversions.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(Arc<str>),
    /// Contiguous run of one-byte primitives (`uint8[]`, `byte[N]`, …).
    Bytes(Arc<[u8]>),
    /// Submessage: ordered `(field name, value)` pairs. Lookup is by name,
    /// so callers may supply fields in any order.
    Message(Vec<(Arc<str>, Value)>),
    /// Variable-length sequence.
    List(Vec<Value>),
    /// Fixed-length array.
    Array(Vec<Value>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Self::String(Arc::from(s.as_ref()))
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Self::Bytes(Arc::from(b.as_ref()))
    }

    /// Look up a submessage field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Message(fields) => fields
                .iter()
                .find(|(n, _)| n.as_ref() == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v.as_ref()),
            _ => None,
        }
    }

    /// Widening view of any integral leaf.
    pub fn as_i128(&self) -> Option<i128> {
        Some(match self {
            Self::I8(v) => *v as i128,
            Self::I16(v) => *v as i128,
            Self::I32(v) => *v as i128,
            Self::I64(v) => *v as i128,
            Self::U8(v) => *v as i128,
            Self::U16(v) => *v as i128,
            Self::U32(v) => *v as i128,
            Self::U64(v) => *v as i128,
            _ => return None,
        })
    }

    /// Widening view of any float leaf.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Elements of a `List`, `Array`, or `Bytes` run, the latter widened to
    /// `U8` leaves.
    pub fn elements(&self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) | Self::Array(items) => Some(items.clone()),
            Self::Bytes(b) => Some(b.iter().map(|&x| Value::U8(x)).collect()),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Self::List(items) | Self::Array(items) => Some(items.len()),
            Self::Bytes(b) => Some(b.len()),
            _ => None,
        }
    }
}
