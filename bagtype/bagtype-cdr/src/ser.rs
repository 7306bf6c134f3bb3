//! CDR serialization: little-endian, aligned, 4-byte representation header.

use bagtype_core::{BaseType, Descriptor, Field, Literal, TypeSpec, TypeSysError, Value};
use bagtype_store::Typestore;

/// Serialize a value tree to CDR bytes (little-endian representation).
///
/// Fields missing from the tree fall back to their declared default; a
/// missing field without one is an error.
pub fn serialize(store: &Typestore, name: &str, value: &Value) -> Result<Vec<u8>, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut w = Writer::new();
    w.write_message(store, desc, value, desc.name.as_str())?;
    Ok(w.into_bytes())
}

pub struct Writer {
    out: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    pub fn new() -> Self {
        // CDR_LE representation identifier + two option bytes.
        Self {
            out: vec![0x00, 0x01, 0x00, 0x00],
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }

    /// Pad with zeros up to the next `n`-byte boundary of the payload (the
    /// 4-byte header is excluded from the alignment origin).
    pub fn align(&mut self, n: usize) {
        let relative = self.out.len() - 4;
        let pad = (n - (relative % n)) % n;
        self.out.extend(std::iter::repeat_n(0u8, pad));
    }

    pub fn push(&mut self, b: u8) {
        self.out.push(b);
    }

    pub fn u16(&mut self, v: u16) {
        self.align(2);
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.align(4);
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.align(8);
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    pub fn raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub(crate) fn write_message(
        &mut self,
        store: &Typestore,
        desc: &Descriptor,
        value: &Value,
        path: &str,
    ) -> Result<(), TypeSysError> {
        if !matches!(value, Value::Message(_)) {
            return Err(mismatch(path, "submessage"));
        }
        for field in &desc.fields {
            let field_path = format!("{path}.{}", field.name);
            match value.field(&field.name) {
                Some(v) => self.write_spec(store, &field.ty, v, &field_path)?,
                None => self.write_field_default(field, &field_path)?,
            }
        }
        Ok(())
    }

    fn write_spec(
        &mut self,
        store: &Typestore,
        ty: &TypeSpec,
        value: &Value,
        path: &str,
    ) -> Result<(), TypeSysError> {
        match ty {
            TypeSpec::Base(base) => self.write_base(base, value, path),
            TypeSpec::Named(name) => {
                let desc = store.lookup(name.as_str())?;
                self.write_message(store, desc, value, path)
            }
            TypeSpec::Array { elem, len } => {
                if value.len() != Some(*len) {
                    return Err(mismatch(path, &format!("array of {len} elements")));
                }
                self.write_elements(store, elem, value, path)
            }
            TypeSpec::Sequence { elem, bound } => {
                let count = value.len().ok_or_else(|| mismatch(path, "sequence"))?;
                if let Some(max) = bound
                    && count > *max
                {
                    return Err(TypeSysError::BoundViolation {
                        path: path.to_string(),
                        len: count,
                        bound: *max,
                    });
                }
                self.u32(count as u32);
                self.write_elements(store, elem, value, path)
            }
        }
    }

    fn write_elements(
        &mut self,
        store: &Typestore,
        elem: &TypeSpec,
        value: &Value,
        path: &str,
    ) -> Result<(), TypeSysError> {
        if let (TypeSpec::Base(base), Value::Bytes(bytes)) = (elem, value)
            && base.is_u8_shaped()
        {
            self.raw(bytes);
            return Ok(());
        }
        let items = value
            .elements()
            .ok_or_else(|| mismatch(path, "sequence or array"))?;
        for (i, item) in items.iter().enumerate() {
            self.write_spec(store, elem, item, &format!("{path}[{i}]"))?;
        }
        Ok(())
    }

    fn write_base(
        &mut self,
        base: &BaseType,
        value: &Value,
        path: &str,
    ) -> Result<(), TypeSysError> {
        match base {
            BaseType::Bool => {
                let b = value.as_bool().ok_or_else(|| mismatch(path, "bool"))?;
                self.push(b as u8);
            }
            BaseType::F32 => {
                let f = value.as_f64().ok_or_else(|| mismatch(path, "float32"))?;
                self.u32((f as f32).to_bits());
            }
            BaseType::F64 => {
                let f = value.as_f64().ok_or_else(|| mismatch(path, "float64"))?;
                self.u64(f.to_bits());
            }
            BaseType::String(bound) | BaseType::WString(bound) => {
                let s = value.as_str().ok_or_else(|| mismatch(path, "string"))?;
                self.write_string(base, s, *bound, path)?;
            }
            // CDR stamps: `int32 sec, uint32 nanosec`, either `nanosec` or
            // `nsec` spelling accepted on the way in.
            BaseType::Time | BaseType::Duration => {
                let sec = value
                    .field("sec")
                    .and_then(Value::as_i128)
                    .ok_or_else(|| mismatch(path, "stamp with sec/nanosec"))?;
                let nanosec = value
                    .field("nanosec")
                    .or_else(|| value.field("nsec"))
                    .and_then(Value::as_i128)
                    .ok_or_else(|| mismatch(path, "stamp with sec/nanosec"))?;
                self.int(&BaseType::I32, sec, path)?;
                self.int(&BaseType::U32, nanosec, path)?;
            }
            _ => {
                let i = value
                    .as_i128()
                    .ok_or_else(|| mismatch(path, &base.spelling()))?;
                self.int(base, i, path)?;
            }
        }
        Ok(())
    }

    pub fn write_string(
        &mut self,
        base: &BaseType,
        s: &str,
        bound: Option<usize>,
        path: &str,
    ) -> Result<(), TypeSysError> {
        if matches!(base, BaseType::WString(_)) {
            let units: Vec<u16> = s.encode_utf16().collect();
            check_bound(units.len(), bound, path)?;
            self.u32(units.len() as u32);
            for unit in units {
                self.u16(unit);
            }
        } else {
            check_bound(s.len(), bound, path)?;
            self.u32(s.len() as u32 + 1);
            self.raw(s.as_bytes());
            self.push(0);
        }
        Ok(())
    }

    pub fn int(
        &mut self,
        base: &BaseType,
        i: i128,
        path: &str,
    ) -> Result<(), TypeSysError> {
        let (lo, hi) = base
            .int_bounds()
            .ok_or_else(|| mismatch(path, &base.spelling()))?;
        if i < lo || i > hi {
            return Err(mismatch(path, &base.spelling()));
        }
        match base {
            BaseType::I8 => self.push(i as i8 as u8),
            BaseType::I16 => self.u16(i as i16 as u16),
            BaseType::I32 => self.u32(i as i32 as u32),
            BaseType::I64 => self.u64(i as i64 as u64),
            BaseType::U16 => self.u16(i as u16),
            BaseType::U32 => self.u32(i as u32),
            BaseType::U64 => self.u64(i as u64),
            _ => self.push(i as u8),
        }
        Ok(())
    }

    fn write_field_default(&mut self, field: &Field, path: &str) -> Result<(), TypeSysError> {
        let Some(default) = &field.default else {
            return Err(TypeSysError::MissingValue {
                path: path.to_string(),
            });
        };
        self.write_literal(&field.ty, default, path)
    }

    fn write_literal(
        &mut self,
        ty: &TypeSpec,
        lit: &Literal,
        path: &str,
    ) -> Result<(), TypeSysError> {
        match (ty, lit) {
            (TypeSpec::Base(BaseType::Bool), Literal::Bool(b)) => self.push(*b as u8),
            (TypeSpec::Base(BaseType::F32), Literal::Float(f)) => self.u32((*f as f32).to_bits()),
            (TypeSpec::Base(BaseType::F64), Literal::Float(f)) => self.u64(f.to_bits()),
            (
                TypeSpec::Base(base @ (BaseType::String(bound) | BaseType::WString(bound))),
                Literal::Str(s),
            ) => {
                self.write_string(base, s, *bound, path)?;
            }
            (TypeSpec::Base(base), Literal::Int(i)) => self.int(base, *i, path)?,
            (TypeSpec::Array { elem, .. }, Literal::Seq(items)) => {
                for item in items {
                    self.write_literal(elem, item, path)?;
                }
            }
            (TypeSpec::Sequence { elem, .. }, Literal::Seq(items)) => {
                self.u32(items.len() as u32);
                for item in items {
                    self.write_literal(elem, item, path)?;
                }
            }
            _ => return Err(mismatch(path, "default matching the field type")),
        }
        Ok(())
    }
}

fn check_bound(len: usize, bound: Option<usize>, path: &str) -> Result<(), TypeSysError> {
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

pub(crate) fn mismatch(path: &str, expected: &str) -> TypeSysError {
    TypeSysError::ValueMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}
