//! wire1 serialization: declared order, little-endian, no alignment.

use bagtype_core::{BaseType, Descriptor, Field, Literal, TypeSpec, TypeSysError, Value};
use bagtype_store::Typestore;

/// Serialize a value tree to wire1 bytes.
///
/// Fields missing from the tree fall back to their declared default; a
/// missing field without one is an error.
pub fn serialize(store: &Typestore, name: &str, value: &Value) -> Result<Vec<u8>, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut out = Vec::new();
    write_message(store, desc, value, &mut out, desc.name.as_str())?;
    Ok(out)
}

fn write_message(
    store: &Typestore,
    desc: &Descriptor,
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    if !matches!(value, Value::Message(_)) {
        return Err(mismatch(path, "submessage"));
    }
    for field in &desc.fields {
        let field_path = format!("{path}.{}", field.name);
        match value.field(&field.name) {
            Some(v) => write_spec(store, &field.ty, v, out, &field_path)?,
            None => write_default(field, out, &field_path)?,
        }
    }
    Ok(())
}

fn write_spec(
    store: &Typestore,
    ty: &TypeSpec,
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    match ty {
        TypeSpec::Base(base) => write_base(base, value, out, path),
        TypeSpec::Named(name) => {
            let desc = store.lookup(name.as_str())?;
            write_message(store, desc, value, out, path)
        }
        TypeSpec::Array { elem, len } => {
            write_elements(store, elem, value, out, path, Some(*len))
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
            out.extend_from_slice(&(count as u32).to_le_bytes());
            write_elements(store, elem, value, out, path, None)
        }
    }
}

/// Write the elements of a list, array, or byte run. `expect_len` enforces
/// fixed-array length.
fn write_elements(
    store: &Typestore,
    elem: &TypeSpec,
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
    expect_len: Option<usize>,
) -> Result<(), TypeSysError> {
    if let Some(n) = expect_len
        && value.len() != Some(n)
    {
        return Err(mismatch(path, &format!("array of {n} elements")));
    }

    // Byte runs write in one go.
    if let (TypeSpec::Base(base), Value::Bytes(bytes)) = (elem, value)
        && base.is_u8_shaped()
    {
        out.extend_from_slice(bytes);
        return Ok(());
    }

    let items = value
        .elements()
        .ok_or_else(|| mismatch(path, "sequence or array"))?;
    for (i, item) in items.iter().enumerate() {
        write_spec(store, elem, item, out, &format!("{path}[{i}]"))?;
    }
    Ok(())
}

fn write_base(
    base: &BaseType,
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    match base {
        BaseType::Bool => {
            let b = value.as_bool().ok_or_else(|| mismatch(path, "bool"))?;
            out.push(b as u8);
        }
        BaseType::F32 => {
            let f = value.as_f64().ok_or_else(|| mismatch(path, "float32"))?;
            out.extend_from_slice(&(f as f32).to_le_bytes());
        }
        BaseType::F64 => {
            let f = value.as_f64().ok_or_else(|| mismatch(path, "float64"))?;
            out.extend_from_slice(&f.to_le_bytes());
        }
        BaseType::String(bound) | BaseType::WString(bound) => {
            let s = value.as_str().ok_or_else(|| mismatch(path, "string"))?;
            write_string(base, s, *bound, out, path)?;
        }
        // wire1 stamps: `uint32 sec, uint32 nsec` for time,
        // `int32 sec, int32 nsec` for duration.
        BaseType::Time => {
            write_stamp_part(value, "sec", &BaseType::U32, out, path)?;
            write_stamp_part(value, "nsec", &BaseType::U32, out, path)?;
        }
        BaseType::Duration => {
            write_stamp_part(value, "sec", &BaseType::I32, out, path)?;
            write_stamp_part(value, "nsec", &BaseType::I32, out, path)?;
        }
        _ => write_int(base, value, out, path)?,
    }
    Ok(())
}

fn write_string(
    base: &BaseType,
    s: &str,
    bound: Option<usize>,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    if matches!(base, BaseType::WString(_)) {
        let units: Vec<u16> = s.encode_utf16().collect();
        check_bound(units.len(), bound, path)?;
        out.extend_from_slice(&(units.len() as u32).to_le_bytes());
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    } else {
        check_bound(s.len(), bound, path)?;
        out.extend_from_slice(&(s.len() as u32).to_le_bytes());
        out.extend_from_slice(s.as_bytes());
    }
    Ok(())
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

/// Either `nsec` or `nanosec` names the sub-second stamp part; the codec
/// bridges the spelling.
fn write_stamp_part(
    value: &Value,
    part: &str,
    as_ty: &BaseType,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    let v = match part {
        "sec" => value.field("sec"),
        _ => value.field("nsec").or_else(|| value.field("nanosec")),
    }
    .ok_or_else(|| mismatch(path, "stamp with sec/nsec"))?;
    write_int(as_ty, v, out, path)
}

/// Integers accept any integral leaf, checked against the target width.
fn write_int(
    base: &BaseType,
    value: &Value,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    let i = value
        .as_i128()
        .ok_or_else(|| mismatch(path, &base.spelling()))?;
    write_int_raw(base, i, out, path)
}

fn write_int_raw(
    base: &BaseType,
    i: i128,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    let (lo, hi) = base
        .int_bounds()
        .ok_or_else(|| mismatch(path, &base.spelling()))?;
    if i < lo || i > hi {
        return Err(mismatch(path, &base.spelling()));
    }
    match base {
        BaseType::I8 => out.extend_from_slice(&(i as i8).to_le_bytes()),
        BaseType::I16 => out.extend_from_slice(&(i as i16).to_le_bytes()),
        BaseType::I32 => out.extend_from_slice(&(i as i32).to_le_bytes()),
        BaseType::I64 => out.extend_from_slice(&(i as i64).to_le_bytes()),
        BaseType::U16 => out.extend_from_slice(&(i as u16).to_le_bytes()),
        BaseType::U32 => out.extend_from_slice(&(i as u32).to_le_bytes()),
        BaseType::U64 => out.extend_from_slice(&(i as u64).to_le_bytes()),
        _ => out.push(i as u8),
    }
    Ok(())
}

/// Serialize a field's declared default.
fn write_default(field: &Field, out: &mut Vec<u8>, path: &str) -> Result<(), TypeSysError> {
    let Some(default) = &field.default else {
        return Err(TypeSysError::MissingValue {
            path: path.to_string(),
        });
    };
    write_literal(&field.ty, default, out, path)
}

fn write_literal(
    ty: &TypeSpec,
    lit: &Literal,
    out: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    match (ty, lit) {
        (TypeSpec::Base(BaseType::Bool), Literal::Bool(b)) => out.push(*b as u8),
        (TypeSpec::Base(BaseType::F32), Literal::Float(f)) => {
            out.extend_from_slice(&(*f as f32).to_le_bytes());
        }
        (TypeSpec::Base(BaseType::F64), Literal::Float(f)) => {
            out.extend_from_slice(&f.to_le_bytes());
        }
        (TypeSpec::Base(base @ (BaseType::String(bound) | BaseType::WString(bound))), Literal::Str(s)) => {
            write_string(base, s, *bound, out, path)?;
        }
        (TypeSpec::Base(base), Literal::Int(i)) => write_int_raw(base, *i, out, path)?,
        (TypeSpec::Array { elem, .. }, Literal::Seq(items))
        | (TypeSpec::Sequence { elem, .. }, Literal::Seq(items)) => {
            if matches!(ty, TypeSpec::Sequence { .. }) {
                out.extend_from_slice(&(items.len() as u32).to_le_bytes());
            }
            for item in items {
                write_literal(elem, item, out, path)?;
            }
        }
        _ => return Err(mismatch(path, "default matching the field type")),
    }
    Ok(())
}

pub(crate) fn mismatch(path: &str, expected: &str) -> TypeSysError {
    TypeSysError::ValueMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
    }
}
