//! wire1 deserialization.

use std::sync::Arc;

use bagtype_core::{BaseType, Descriptor, Mode, TypeSpec, TypeSysError, Value};
use bagtype_store::Typestore;
use bytes::{Buf, Bytes};

/// Deserialize wire1 bytes, tolerating trailing bytes.
pub fn deserialize(store: &Typestore, name: &str, data: &[u8]) -> Result<Value, TypeSysError> {
    deserialize_with(store, name, data, Mode::Lenient)
}

/// Deserialize wire1 bytes with explicit strictness. Strict mode reports
/// trailing bytes as [`TypeSysError::Overlong`].
pub fn deserialize_with(
    store: &Typestore,
    name: &str,
    data: &[u8],
    mode: Mode,
) -> Result<Value, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut r = Reader::new(Bytes::copy_from_slice(data));
    let value = r.read_message(store, desc, desc.name.as_str())?;
    if mode == Mode::Strict && r.remaining() > 0 {
        return Err(TypeSysError::Overlong {
            offset: r.offset(),
            remaining: r.remaining(),
        });
    }
    Ok(value)
}

/// Sequential little-endian cursor over a wire1 payload, tracking the byte
/// offset for error reporting.
pub struct Reader {
    buf: Bytes,
    initial_len: usize,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        let initial_len = buf.len();
        Self { buf, initial_len }
    }

    pub fn offset(&self) -> usize {
        self.initial_len - self.buf.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn truncated(&self, path: &str) -> TypeSysError {
        TypeSysError::Truncated {
            offset: self.offset(),
            path: path.to_string(),
        }
    }

    pub(crate) fn read_message(
        &mut self,
        store: &Typestore,
        desc: &Descriptor,
        path: &str,
    ) -> Result<Value, TypeSysError> {
        let mut fields = Vec::with_capacity(desc.fields.len());
        for field in &desc.fields {
            let field_path = format!("{path}.{}", field.name);
            let v = self.read_spec(store, &field.ty, &field_path)?;
            fields.push((Arc::from(field.name.as_str()), v));
        }
        Ok(Value::Message(fields))
    }

    fn read_spec(
        &mut self,
        store: &Typestore,
        ty: &TypeSpec,
        path: &str,
    ) -> Result<Value, TypeSysError> {
        match ty {
            TypeSpec::Base(base) => self.read_base(base, path),
            TypeSpec::Named(name) => {
                let desc = store.lookup(name.as_str())?;
                self.read_message(store, desc, path)
            }
            TypeSpec::Array { elem, len } => self.read_elements(store, elem, *len, true, path),
            TypeSpec::Sequence { elem, bound } => {
                let count = self.u32(path)? as usize;
                if let Some(max) = bound
                    && count > *max
                {
                    return Err(TypeSysError::BoundViolation {
                        path: path.to_string(),
                        len: count,
                        bound: *max,
                    });
                }
                self.read_elements(store, elem, count, false, path)
            }
        }
    }

    fn read_elements(
        &mut self,
        store: &Typestore,
        elem: &TypeSpec,
        count: usize,
        fixed: bool,
        path: &str,
    ) -> Result<Value, TypeSysError> {
        // Runs of one-byte primitives come back as a contiguous byte leaf.
        if let TypeSpec::Base(base) = elem
            && base.is_u8_shaped()
        {
            let bytes = self.take(count, path)?;
            return Ok(Value::Bytes(Arc::from(bytes.as_ref())));
        }
        let mut items = Vec::with_capacity(count.min(4096));
        for i in 0..count {
            items.push(self.read_spec(store, elem, &format!("{path}[{i}]"))?);
        }
        Ok(if fixed {
            Value::Array(items)
        } else {
            Value::List(items)
        })
    }

    fn read_base(&mut self, base: &BaseType, path: &str) -> Result<Value, TypeSysError> {
        Ok(match base {
            BaseType::Bool => Value::Bool(self.u8(path)? != 0),
            BaseType::I8 => Value::I8(self.u8(path)? as i8),
            BaseType::I16 => {
                Value::I16(self.buf.try_get_i16_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::I32 => {
                Value::I32(self.buf.try_get_i32_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::I64 => {
                Value::I64(self.buf.try_get_i64_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::U8 | BaseType::Byte | BaseType::Char | BaseType::Octet => {
                Value::U8(self.u8(path)?)
            }
            BaseType::U16 => {
                Value::U16(self.buf.try_get_u16_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::U32 => Value::U32(self.u32(path)?),
            BaseType::U64 => {
                Value::U64(self.buf.try_get_u64_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::F32 => {
                Value::F32(self.buf.try_get_f32_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::F64 => {
                Value::F64(self.buf.try_get_f64_le().map_err(|_| self.truncated(path))?)
            }
            BaseType::String(bound) => {
                let s = self.read_string(*bound, path)?;
                Value::String(Arc::from(s))
            }
            BaseType::WString(bound) => {
                let s = self.read_wstring(*bound, path)?;
                Value::String(Arc::from(s))
            }
            BaseType::Time => {
                let sec = self.u32(path)?;
                let nsec = self.u32(path)?;
                stamp_value(Value::U32(sec), Value::U32(nsec))
            }
            BaseType::Duration => {
                let sec = self.buf.try_get_i32_le().map_err(|_| self.truncated(path))?;
                let nsec = self.buf.try_get_i32_le().map_err(|_| self.truncated(path))?;
                stamp_value(Value::I32(sec), Value::I32(nsec))
            }
        })
    }

    fn read_string(&mut self, bound: Option<usize>, path: &str) -> Result<String, TypeSysError> {
        let len = self.u32(path)? as usize;
        self.check_bound(len, bound, path)?;
        let bytes = self.take(len, path)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| TypeSysError::EncodingError {
            path: path.to_string(),
        })
    }

    fn read_wstring(&mut self, bound: Option<usize>, path: &str) -> Result<String, TypeSysError> {
        let units = self.u32(path)? as usize;
        self.check_bound(units, bound, path)?;
        let bytes = self.take(units * 2, path)?;
        let codes: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16(&codes).map_err(|_| TypeSysError::EncodingError {
            path: path.to_string(),
        })
    }

    fn check_bound(
        &self,
        len: usize,
        bound: Option<usize>,
        path: &str,
    ) -> Result<(), TypeSysError> {
        if let Some(max) = bound
            && len > max
        {
            return Err(TypeSysError::BoundViolation {
                path: path.to_string(),
                len,
                bound: max,
            });
        }
        Ok(())
    }

    pub fn u8(&mut self, path: &str) -> Result<u8, TypeSysError> {
        self.buf.try_get_u8().map_err(|_| self.truncated(path))
    }

    pub fn u16(&mut self, path: &str) -> Result<u16, TypeSysError> {
        self.buf.try_get_u16_le().map_err(|_| self.truncated(path))
    }

    pub fn u32(&mut self, path: &str) -> Result<u32, TypeSysError> {
        self.buf.try_get_u32_le().map_err(|_| self.truncated(path))
    }

    pub fn u64(&mut self, path: &str) -> Result<u64, TypeSysError> {
        self.buf.try_get_u64_le().map_err(|_| self.truncated(path))
    }

    pub fn take(&mut self, n: usize, path: &str) -> Result<Bytes, TypeSysError> {
        if self.buf.remaining() < n {
            return Err(self.truncated(path));
        }
        Ok(self.buf.copy_to_bytes(n))
    }
}

fn stamp_value(sec: Value, nsec: Value) -> Value {
    Value::Message(vec![(Arc::from("sec"), sec), (Arc::from("nsec"), nsec)])
}
