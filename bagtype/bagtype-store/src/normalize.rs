//! AST → canonical descriptor normalization.
//!
//! Resolves type references absolutely, separates constants from fields
//! preserving declaration order, and coerces every constant and default
//! literal to its declared width. Semantically equal inputs produce
//! identical descriptors, so descriptor equality doubles as the store's
//! conflict check.
//!
//! # Reference resolution
//!
//! A nameref resolves in three tiers:
//!
//! 1. **Exact** — the canonical spelling of the reference names a known
//!    type.
//! 2. **Package-relative** — a bare name is qualified with the defining
//!    package (`Name` → `pkg/msg/Name`; bare `Header` is the conventional
//!    alias for `std_msgs/msg/Header`).
//! 3. **Unique suffix** — otherwise, a known name whose trailing segments
//!    match the reference wins, but only when exactly one does; an
//!    ambiguous suffix resolves nothing.
//!
//! `known` covers the other members of the bundle being registered plus
//! everything already in the store. A reference that matches no tier keeps
//! its package-qualified spelling and is checked at closure time, so
//! forward references across separate registrations still work.

use bagtype_core::{
    BaseType, Constant, Descriptor, Field, Literal, RawMessage, RawType, TypeName, TypeSpec,
    TypeSysError,
};

/// Fold one raw message into a canonical [`Descriptor`], resolving its
/// namerefs against `known`.
pub fn normalize(raw: RawMessage, known: &[TypeName]) -> Result<Descriptor, TypeSysError> {
    let package = raw.name.package().to_string();

    let mut constants = Vec::with_capacity(raw.constants.len());
    for c in raw.constants {
        let context = format!("{}.{}", raw.name, c.name);
        let value = coerce_scalar(c.value, &c.ty, &context)?;
        constants.push(Constant {
            name: c.name,
            ty: c.ty,
            value,
        });
    }

    let mut fields = Vec::with_capacity(raw.fields.len());
    for f in raw.fields {
        let ty = resolve_type(f.ty, &package, known)?;
        let context = format!("{}.{}", raw.name, f.name);
        let default = f
            .default
            .map(|lit| coerce_default(lit, &ty, &context))
            .transpose()?;
        fields.push(Field {
            name: f.name,
            ty,
            default,
        });
    }

    Ok(Descriptor {
        name: raw.name,
        kind: raw.kind,
        fields,
        constants,
    })
}

fn resolve_type(
    ty: RawType,
    package: &str,
    known: &[TypeName],
) -> Result<TypeSpec, TypeSysError> {
    Ok(match ty {
        RawType::Base(base) => TypeSpec::Base(base),
        RawType::Named(segments) => TypeSpec::Named(resolve_named(&segments, package, known)?),
        RawType::Array { elem, len } => TypeSpec::Array {
            elem: Box::new(resolve_type(*elem, package, known)?),
            len,
        },
        RawType::Sequence { elem, bound } => TypeSpec::Sequence {
            elem: Box::new(resolve_type(*elem, package, known)?),
            bound,
        },
    })
}

fn resolve_named(
    segments: &[String],
    package: &str,
    known: &[TypeName],
) -> Result<TypeName, TypeSysError> {
    let candidate = match segments {
        [single] => TypeName::resolve(single, package)?,
        _ => TypeName::from_segments(segments)?,
    };
    if known.contains(&candidate) {
        return Ok(candidate);
    }
    if let Some(hit) = find_by_suffix(known, segments) {
        return Ok(hit);
    }
    // Unmatched references stay as spelled; the closure check reports them
    // if they never materialize.
    Ok(candidate)
}

/// Find the unique known name whose trailing segments match `wanted`.
/// More than one match is ambiguous and resolves nothing.
fn find_by_suffix(known: &[TypeName], wanted: &[String]) -> Option<TypeName> {
    let mut found: Option<&TypeName> = None;
    for name in known {
        let segments: Vec<&str> = name.as_str().split('/').collect();
        if segments.len() < wanted.len() {
            continue;
        }
        let tail = &segments[segments.len() - wanted.len()..];
        if tail.iter().zip(wanted).all(|(have, want)| *have == want.as_str()) {
            if found.is_some() {
                return None;
            }
            found = Some(name);
        }
    }
    found.cloned()
}

fn bad(ty: impl std::fmt::Display, context: &str) -> TypeSysError {
    TypeSysError::BadLiteral {
        ty: ty.to_string(),
        context: context.to_string(),
    }
}

/// Coerce a scalar literal to a primitive type, checking integer width and
/// string bounds.
fn coerce_scalar(lit: Literal, ty: &BaseType, context: &str) -> Result<Literal, TypeSysError> {
    match ty {
        BaseType::Bool => match lit {
            Literal::Bool(_) => Ok(lit),
            Literal::Int(0) => Ok(Literal::Bool(false)),
            Literal::Int(1) => Ok(Literal::Bool(true)),
            _ => Err(bad("bool", context)),
        },
        BaseType::F32 => match lit {
            Literal::Float(f) if (f as f32).is_finite() || f.is_infinite() => Ok(lit),
            Literal::Int(i) => Ok(Literal::Float(i as f64)),
            _ => Err(bad("float32", context)),
        },
        BaseType::F64 => match lit {
            Literal::Float(_) => Ok(lit),
            Literal::Int(i) => Ok(Literal::Float(i as f64)),
            _ => Err(bad("float64", context)),
        },
        BaseType::String(bound) | BaseType::WString(bound) => match lit {
            Literal::Str(ref s) => {
                if let Some(max) = bound
                    && s.len() > *max
                {
                    return Err(bad(ty.spelling(), context));
                }
                Ok(lit)
            }
            _ => Err(bad(ty.spelling(), context)),
        },
        BaseType::Time | BaseType::Duration => Err(bad(ty.spelling(), context)),
        _ => {
            let (lo, hi) = ty
                .int_bounds()
                .ok_or_else(|| bad(ty.spelling(), context))?;
            match lit {
                Literal::Int(i) if i >= lo && i <= hi => Ok(lit),
                _ => Err(bad(ty.spelling(), context)),
            }
        }
    }
}

/// Coerce a field default to its type spec. Defaults are only valid on
/// primitives and on arrays/sequences of primitives.
fn coerce_default(lit: Literal, ty: &TypeSpec, context: &str) -> Result<Literal, TypeSysError> {
    match ty {
        TypeSpec::Base(base) => coerce_scalar(lit, base, context),
        TypeSpec::Array { elem, len } => {
            let items = coerce_items(lit, elem, context)?;
            if items.len() != *len {
                return Err(bad(format!("array of {len}"), context));
            }
            Ok(Literal::Seq(items))
        }
        TypeSpec::Sequence { elem, bound } => {
            let items = coerce_items(lit, elem, context)?;
            if let Some(max) = bound
                && items.len() > *max
            {
                return Err(bad(format!("sequence bounded to {max}"), context));
            }
            Ok(Literal::Seq(items))
        }
        TypeSpec::Named(name) => Err(bad(name, context)),
    }
}

fn coerce_items(lit: Literal, elem: &TypeSpec, context: &str) -> Result<Vec<Literal>, TypeSysError> {
    let TypeSpec::Base(base) = elem else {
        return Err(bad("array of primitives", context));
    };
    let Literal::Seq(items) = lit else {
        return Err(bad("bracketed sequence", context));
    };
    items
        .into_iter()
        .map(|item| coerce_scalar(item, base, context))
        .collect()
}
