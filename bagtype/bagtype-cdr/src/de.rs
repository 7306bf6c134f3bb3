//! CDR decoding to the generic value tree.
//!
//! The first four bytes are the representation identifier; the encoding it
//! selects (little- or big-endian) is observed for the rest of the message.
//! Every primitive aligns to `min(sizeof, 8)` relative to the start of the
//! payload — the identifier itself is excluded from the alignment origin.

use std::sync::Arc;

use bagtype_core::{BaseType, Descriptor, Mode, TypeSpec, TypeSysError, Value};
use bagtype_store::Typestore;
use bytes::{Buf, Bytes};

/// Deserialize CDR bytes, tolerating trailing bytes.
pub fn deserialize(store: &Typestore, name: &str, data: &[u8]) -> Result<Value, TypeSysError> {
    deserialize_with(store, name, data, Mode::Lenient)
}

/// Deserialize CDR bytes with explicit strictness.
pub fn deserialize_with(
    store: &Typestore,
    name: &str,
    data: &[u8],
    mode: Mode,
) -> Result<Value, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut r = Reader::new(Bytes::copy_from_slice(data));
    r.read_encapsulation()?;
    let value = r.read_message(store, desc, desc.name.as_str())?;
    if mode == Mode::Strict && r.remaining() > 0 {
        return Err(TypeSysError::Overlong {
            offset: r.offset(),
            remaining: r.remaining(),
        });
    }
    Ok(value)
}

pub struct Reader {
    buf: Bytes,
    initial_len: usize,
    align_base: usize,
    le: bool,
}

impl Reader {
    pub fn new(buf: Bytes) -> Self {
        let initial_len = buf.len();
        Self {
            buf,
            initial_len,
            align_base: 0,
            le: true,
        }
    }

    pub fn offset(&self) -> usize {
        self.initial_len - self.buf.remaining()
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_le(&self) -> bool {
        self.le
    }

    fn truncated(&self, path: &str) -> TypeSysError {
        TypeSysError::Truncated {
            offset: self.offset(),
            path: path.to_string(),
        }
    }

    /// Read the 4-byte representation identifier and select the byte order.
    pub fn read_encapsulation(&mut self) -> Result<(), TypeSysError> {
        if self.buf.remaining() < 4 {
            return Err(self.truncated("<encapsulation>"));
        }
        let id = [self.buf.get_u8(), self.buf.get_u8()];
        self.buf.advance(2);
        self.le = match id {
            [0x00, 0x01] => true,
            [0x00, 0x00] => false,
            _ => {
                return Err(TypeSysError::ValueMismatch {
                    path: "<encapsulation>".to_string(),
                    expected: "CDR representation identifier".to_string(),
                });
            }
        };
        self.align_base = 4;
        Ok(())
    }

    /// Skip pad bytes up to the next `n`-byte boundary of the payload.
    pub fn align(&mut self, n: usize, path: &str) -> Result<(), TypeSysError> {
        let relative = self.offset() - self.align_base;
        let pad = (n - (relative % n)) % n;
        if self.buf.remaining() < pad {
            return Err(self.truncated(path));
        }
        self.buf.advance(pad);
        Ok(())
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
            BaseType::U8 | BaseType::Byte | BaseType::Char | BaseType::Octet => {
                Value::U8(self.u8(path)?)
            }
            BaseType::I16 => Value::I16(self.u16(path)? as i16),
            BaseType::U16 => Value::U16(self.u16(path)?),
            BaseType::I32 => Value::I32(self.u32(path)? as i32),
            BaseType::U32 => Value::U32(self.u32(path)?),
            BaseType::I64 => Value::I64(self.u64(path)? as i64),
            BaseType::U64 => Value::U64(self.u64(path)?),
            BaseType::F32 => Value::F32(f32::from_bits(self.u32(path)?)),
            BaseType::F64 => Value::F64(f64::from_bits(self.u64(path)?)),
            BaseType::String(bound) => Value::String(Arc::from(self.read_string(*bound, path)?)),
            BaseType::WString(bound) => Value::String(Arc::from(self.read_wstring(*bound, path)?)),
            // CDR stamps: `int32 sec, uint32 nanosec` for both time and
            // duration.
            BaseType::Time | BaseType::Duration => {
                let sec = self.u32(path)? as i32;
                let nanosec = self.u32(path)?;
                Value::Message(vec![
                    (Arc::from("sec"), Value::I32(sec)),
                    (Arc::from("nanosec"), Value::U32(nanosec)),
                ])
            }
        })
    }

    /// `uint32` length including the terminator, then UTF-8 bytes and one
    /// `0x00`. A zero length is accepted as an empty string.
    fn read_string(&mut self, bound: Option<usize>, path: &str) -> Result<String, TypeSysError> {
        let len = self.u32(path)? as usize;
        if len == 0 {
            return Ok(String::new());
        }
        let bytes = self.take(len, path)?;
        if bytes.last() != Some(&0) {
            return Err(TypeSysError::EncodingError {
                path: path.to_string(),
            });
        }
        self.check_bound(len - 1, bound, path)?;
        String::from_utf8(bytes[..len - 1].to_vec()).map_err(|_| TypeSysError::EncodingError {
            path: path.to_string(),
        })
    }

    /// `uint32` code-unit count, then UTF-16 units, no terminator.
    fn read_wstring(&mut self, bound: Option<usize>, path: &str) -> Result<String, TypeSysError> {
        let units = self.u32(path)? as usize;
        self.check_bound(units, bound, path)?;
        let mut codes = Vec::with_capacity(units);
        for _ in 0..units {
            codes.push(self.u16(path)?);
        }
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
        self.align(2, path)?;
        if self.le {
            self.buf.try_get_u16_le().map_err(|_| self.truncated(path))
        } else {
            self.buf.try_get_u16().map_err(|_| self.truncated(path))
        }
    }

    pub fn u32(&mut self, path: &str) -> Result<u32, TypeSysError> {
        self.align(4, path)?;
        if self.le {
            self.buf.try_get_u32_le().map_err(|_| self.truncated(path))
        } else {
            self.buf.try_get_u32().map_err(|_| self.truncated(path))
        }
    }

    pub fn u64(&mut self, path: &str) -> Result<u64, TypeSysError> {
        self.align(8, path)?;
        if self.le {
            self.buf.try_get_u64_le().map_err(|_| self.truncated(path))
        } else {
            self.buf.try_get_u64().map_err(|_| self.truncated(path))
        }
    }

    pub fn take(&mut self, n: usize, path: &str) -> Result<Bytes, TypeSysError> {
        if self.buf.remaining() < n {
            return Err(self.truncated(path));
        }
        Ok(self.buf.copy_to_bytes(n))
    }
}
