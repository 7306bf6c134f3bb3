//! Wire-size computation without emission.

use bagtype_core::{BaseType, Descriptor, Field, Literal, TypeSpec, TypeSysError, Value};
use bagtype_store::Typestore;

use crate::ser::mismatch;

/// Number of bytes [`crate::serialize`] would produce for `value`.
pub fn size(store: &Typestore, name: &str, value: &Value) -> Result<usize, TypeSysError> {
    let desc = store.lookup(name)?;
    message_size(store, desc, value, desc.name.as_str())
}

/// Constant wire size of a type, when its closure contains no string or
/// sequence. Fixed-size types let a container slice a block of records
/// without decoding them.
pub fn fixed_size(store: &Typestore, name: &str) -> Result<Option<usize>, TypeSysError> {
    let desc = store.lookup(name)?;
    spec_fixed_size(store, desc)
}

fn spec_fixed_size(store: &Typestore, desc: &Descriptor) -> Result<Option<usize>, TypeSysError> {
    let mut total = 0usize;
    for field in &desc.fields {
        match type_fixed_size(store, &field.ty)? {
            Some(n) => total += n,
            None => return Ok(None),
        }
    }
    Ok(Some(total))
}

fn type_fixed_size(store: &Typestore, ty: &TypeSpec) -> Result<Option<usize>, TypeSysError> {
    Ok(match ty {
        TypeSpec::Base(base) => base_fixed_size(base),
        TypeSpec::Named(name) => {
            let desc = store.lookup(name.as_str())?;
            spec_fixed_size(store, desc)?
        }
        TypeSpec::Array { elem, len } => {
            type_fixed_size(store, elem)?.map(|elem_size| elem_size * len)
        }
        TypeSpec::Sequence { .. } => None,
    })
}

fn base_fixed_size(base: &BaseType) -> Option<usize> {
    Some(match base {
        BaseType::Bool
        | BaseType::Byte
        | BaseType::Char
        | BaseType::I8
        | BaseType::U8
        | BaseType::Octet => 1,
        BaseType::I16 | BaseType::U16 => 2,
        BaseType::I32 | BaseType::U32 | BaseType::F32 => 4,
        BaseType::I64 | BaseType::U64 | BaseType::F64 | BaseType::Time | BaseType::Duration => 8,
        BaseType::String(_) | BaseType::WString(_) => return None,
    })
}

fn message_size(
    store: &Typestore,
    desc: &Descriptor,
    value: &Value,
    path: &str,
) -> Result<usize, TypeSysError> {
    if !matches!(value, Value::Message(_)) {
        return Err(mismatch(path, "submessage"));
    }
    let mut total = 0usize;
    for field in &desc.fields {
        let field_path = format!("{path}.{}", field.name);
        total += match value.field(&field.name) {
            Some(v) => spec_size(store, &field.ty, v, &field_path)?,
            None => default_size(field, &field_path)?,
        };
    }
    Ok(total)
}

fn spec_size(
    store: &Typestore,
    ty: &TypeSpec,
    value: &Value,
    path: &str,
) -> Result<usize, TypeSysError> {
    Ok(match ty {
        TypeSpec::Base(base) => base_size(base, value, path)?,
        TypeSpec::Named(name) => {
            let desc = store.lookup(name.as_str())?;
            message_size(store, desc, value, path)?
        }
        TypeSpec::Array { elem, .. } => elements_size(store, elem, value, path)?,
        TypeSpec::Sequence { elem, .. } => 4 + elements_size(store, elem, value, path)?,
    })
}

fn elements_size(
    store: &Typestore,
    elem: &TypeSpec,
    value: &Value,
    path: &str,
) -> Result<usize, TypeSysError> {
    if let (TypeSpec::Base(base), Some(n)) = (elem, value.len())
        && base.is_u8_shaped()
    {
        return Ok(n);
    }
    let items = value
        .elements()
        .ok_or_else(|| mismatch(path, "sequence or array"))?;
    let mut total = 0usize;
    for (i, item) in items.iter().enumerate() {
        total += spec_size(store, elem, item, &format!("{path}[{i}]"))?;
    }
    Ok(total)
}

fn base_size(base: &BaseType, value: &Value, path: &str) -> Result<usize, TypeSysError> {
    if let Some(n) = base_fixed_size(base) {
        return Ok(n);
    }
    let s = value.as_str().ok_or_else(|| mismatch(path, "string"))?;
    Ok(match base {
        BaseType::WString(_) => 4 + 2 * s.encode_utf16().count(),
        _ => 4 + s.len(),
    })
}

fn default_size(field: &Field, path: &str) -> Result<usize, TypeSysError> {
    let Some(default) = &field.default else {
        return Err(TypeSysError::MissingValue {
            path: path.to_string(),
        });
    };
    literal_size(&field.ty, default, path)
}

fn literal_size(ty: &TypeSpec, lit: &Literal, path: &str) -> Result<usize, TypeSysError> {
    Ok(match (ty, lit) {
        (TypeSpec::Base(BaseType::String(_)), Literal::Str(s)) => 4 + s.len(),
        (TypeSpec::Base(BaseType::WString(_)), Literal::Str(s)) => {
            4 + 2 * s.encode_utf16().count()
        }
        (TypeSpec::Base(base), _) => {
            base_fixed_size(base).ok_or_else(|| mismatch(path, &base.spelling()))?
        }
        (TypeSpec::Array { elem, .. }, Literal::Seq(items)) => {
            let mut total = 0usize;
            for item in items {
                total += literal_size(elem, item, path)?;
            }
            total
        }
        (TypeSpec::Sequence { elem, .. }, Literal::Seq(items)) => {
            let mut total = 4usize;
            for item in items {
                total += literal_size(elem, item, path)?;
            }
            total
        }
        _ => return Err(mismatch(path, "default matching the field type")),
    })
}
