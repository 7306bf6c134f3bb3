//! Streaming wire1↔CDR translation of a single message.
//!
//! The descriptor is walked once per direction; field bytes are re-emitted
//! with the destination wire's alignment and string framing, materializing
//! nothing beyond the primitive leaf currently in flight.
//!
//! When the top-level type is `std_msgs/msg/Header`, the wire1 `seq`
//! counter is dropped going to CDR and synthesized as `0` coming back —
//! the two wires disagree about that field and the translator bridges it.
//! Every other type translates byte-for-byte bijectively as long as its
//! descriptor matches on both sides.

use bagtype_cdr::{Reader as CdrReader, Writer as CdrWriter};
use bagtype_core::{BaseType, Descriptor, Field, TypeSpec, TypeSysError};
use bagtype_ros1::Reader as Ros1Reader;
use bagtype_store::Typestore;
use bytes::Bytes;

const HEADER: &str = "std_msgs/msg/Header";

/// Re-encode one wire1 message as CDR (little-endian).
pub fn ros1_to_cdr(store: &Typestore, name: &str, data: &[u8]) -> Result<Vec<u8>, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut src = Ros1Reader::new(Bytes::copy_from_slice(data));
    let mut dst = CdrWriter::new();
    let root = format!("{} (wire1 to cdr)", desc.name);

    if desc.name.as_str() == HEADER {
        src.u32(&root)?;
        header_fields(desc, |field, path| {
            r2c_spec(store, &field.ty, &mut src, &mut dst, &path)
        }, &root)?;
    } else {
        r2c_message(store, desc, &mut src, &mut dst, &root)?;
    }
    Ok(dst.into_bytes())
}

/// Re-encode one CDR message as wire1.
pub fn cdr_to_ros1(store: &Typestore, name: &str, data: &[u8]) -> Result<Vec<u8>, TypeSysError> {
    let desc = store.lookup(name)?;
    let mut src = CdrReader::new(Bytes::copy_from_slice(data));
    src.read_encapsulation()?;
    let mut dst: Vec<u8> = Vec::new();
    let root = format!("{} (cdr to wire1)", desc.name);

    if desc.name.as_str() == HEADER {
        dst.extend_from_slice(&0u32.to_le_bytes());
        header_fields(desc, |field, path| {
            c2r_spec(store, &field.ty, &mut src, &mut dst, &path)
        }, &root)?;
    } else {
        c2r_message(store, desc, &mut src, &mut dst, &root)?;
    }
    Ok(dst)
}

/// Walk a Header descriptor's fields with `seq` excluded, whichever flavor
/// of the descriptor the store holds.
fn header_fields(
    desc: &Descriptor,
    mut f: impl FnMut(&Field, String) -> Result<(), TypeSysError>,
    root: &str,
) -> Result<(), TypeSysError> {
    for field in &desc.fields {
        if field.name == "seq" {
            continue;
        }
        f(field, format!("{root}.{}", field.name))?;
    }
    Ok(())
}

// ── wire1 → CDR ──────────────────────────────────────────────────────────────

fn r2c_message(
    store: &Typestore,
    desc: &Descriptor,
    src: &mut Ros1Reader,
    dst: &mut CdrWriter,
    path: &str,
) -> Result<(), TypeSysError> {
    for field in &desc.fields {
        let field_path = format!("{path}.{}", field.name);
        r2c_spec(store, &field.ty, src, dst, &field_path)?;
    }
    Ok(())
}

fn r2c_spec(
    store: &Typestore,
    ty: &TypeSpec,
    src: &mut Ros1Reader,
    dst: &mut CdrWriter,
    path: &str,
) -> Result<(), TypeSysError> {
    match ty {
        TypeSpec::Base(base) => r2c_base(base, src, dst, path),
        TypeSpec::Named(name) => {
            let desc = store.lookup(name.as_str())?;
            r2c_message(store, desc, src, dst, path)
        }
        TypeSpec::Array { elem, len } => r2c_elements(store, elem, *len, src, dst, path),
        TypeSpec::Sequence { elem, .. } => {
            let count = src.u32(path)?;
            dst.u32(count);
            r2c_elements(store, elem, count as usize, src, dst, path)
        }
    }
}

fn r2c_elements(
    store: &Typestore,
    elem: &TypeSpec,
    count: usize,
    src: &mut Ros1Reader,
    dst: &mut CdrWriter,
    path: &str,
) -> Result<(), TypeSysError> {
    if let TypeSpec::Base(base) = elem
        && base.is_u8_shaped()
    {
        let bytes = src.take(count, path)?;
        dst.raw(&bytes);
        return Ok(());
    }
    for i in 0..count {
        r2c_spec(store, elem, src, dst, &format!("{path}[{i}]"))?;
    }
    Ok(())
}

fn r2c_base(
    base: &BaseType,
    src: &mut Ros1Reader,
    dst: &mut CdrWriter,
    path: &str,
) -> Result<(), TypeSysError> {
    match base {
        BaseType::Bool
        | BaseType::Byte
        | BaseType::Char
        | BaseType::I8
        | BaseType::U8
        | BaseType::Octet => dst.push(src.u8(path)?),
        BaseType::I16 | BaseType::U16 => dst.u16(src.u16(path)?),
        BaseType::I32 | BaseType::U32 | BaseType::F32 => dst.u32(src.u32(path)?),
        BaseType::I64 | BaseType::U64 | BaseType::F64 => dst.u64(src.u64(path)?),
        // 2×4 bytes on both wires; only the alignment differs.
        BaseType::Time | BaseType::Duration => {
            dst.u32(src.u32(path)?);
            dst.u32(src.u32(path)?);
        }
        BaseType::String(_) => {
            let len = src.u32(path)? as usize;
            let bytes = src.take(len, path)?;
            dst.u32(len as u32 + 1);
            dst.raw(&bytes);
            dst.push(0);
        }
        BaseType::WString(_) => {
            let units = src.u32(path)?;
            let bytes = src.take(units as usize * 2, path)?;
            dst.u32(units);
            dst.raw(&bytes);
        }
    }
    Ok(())
}

// ── CDR → wire1 ──────────────────────────────────────────────────────────────

fn c2r_message(
    store: &Typestore,
    desc: &Descriptor,
    src: &mut CdrReader,
    dst: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    for field in &desc.fields {
        let field_path = format!("{path}.{}", field.name);
        c2r_spec(store, &field.ty, src, dst, &field_path)?;
    }
    Ok(())
}

fn c2r_spec(
    store: &Typestore,
    ty: &TypeSpec,
    src: &mut CdrReader,
    dst: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    match ty {
        TypeSpec::Base(base) => c2r_base(base, src, dst, path),
        TypeSpec::Named(name) => {
            let desc = store.lookup(name.as_str())?;
            c2r_message(store, desc, src, dst, path)
        }
        TypeSpec::Array { elem, len } => c2r_elements(store, elem, *len, src, dst, path),
        TypeSpec::Sequence { elem, .. } => {
            let count = src.u32(path)?;
            dst.extend_from_slice(&count.to_le_bytes());
            c2r_elements(store, elem, count as usize, src, dst, path)
        }
    }
}

fn c2r_elements(
    store: &Typestore,
    elem: &TypeSpec,
    count: usize,
    src: &mut CdrReader,
    dst: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    if let TypeSpec::Base(base) = elem
        && base.is_u8_shaped()
    {
        let bytes = src.take(count, path)?;
        dst.extend_from_slice(&bytes);
        return Ok(());
    }
    for i in 0..count {
        c2r_spec(store, elem, src, dst, &format!("{path}[{i}]"))?;
    }
    Ok(())
}

fn c2r_base(
    base: &BaseType,
    src: &mut CdrReader,
    dst: &mut Vec<u8>,
    path: &str,
) -> Result<(), TypeSysError> {
    match base {
        BaseType::Bool
        | BaseType::Byte
        | BaseType::Char
        | BaseType::I8
        | BaseType::U8
        | BaseType::Octet => dst.push(src.u8(path)?),
        BaseType::I16 | BaseType::U16 => dst.extend_from_slice(&src.u16(path)?.to_le_bytes()),
        BaseType::I32 | BaseType::U32 | BaseType::F32 => {
            dst.extend_from_slice(&src.u32(path)?.to_le_bytes());
        }
        BaseType::I64 | BaseType::U64 | BaseType::F64 => {
            dst.extend_from_slice(&src.u64(path)?.to_le_bytes());
        }
        BaseType::Time | BaseType::Duration => {
            dst.extend_from_slice(&src.u32(path)?.to_le_bytes());
            dst.extend_from_slice(&src.u32(path)?.to_le_bytes());
        }
        BaseType::String(_) => {
            let len = src.u32(path)? as usize;
            if len == 0 {
                dst.extend_from_slice(&0u32.to_le_bytes());
            } else {
                let bytes = src.take(len, path)?;
                dst.extend_from_slice(&(len as u32 - 1).to_le_bytes());
                dst.extend_from_slice(&bytes[..len - 1]);
            }
        }
        BaseType::WString(_) => {
            let units = src.u32(path)?;
            dst.extend_from_slice(&units.to_le_bytes());
            for _ in 0..units {
                dst.extend_from_slice(&src.u16(path)?.to_le_bytes());
            }
        }
    }
    Ok(())
}
