//! Definition hashing: wire1-style MD5 and the RIHS01 structural hash.

use std::collections::HashMap;

use bagtype_core::{Descriptor, DescriptorKind, TypeSpec, TypeSysError};
use log::trace;
use sha2::{Digest, Sha256};

use crate::store::Typestore;

/// MD5 definition hash, computed over the canonical text of each message:
/// constants in declared order, then fields, with every name reference
/// replaced by the referenced type's own hash string. Comments and
/// whitespace never reach this text, so edits to either cannot change the
/// hash.
pub(crate) fn md5_of(store: &Typestore, name: &str) -> Result<String, TypeSysError> {
    let closure = store.closure(name)?;
    let mut hashes: HashMap<&str, String> = HashMap::with_capacity(closure.len());

    // Postorder guarantees every dependency hash exists before its users.
    for desc in &closure {
        let text = md5_text(desc, &hashes)?;
        let digest = md5::compute(text.as_bytes());
        hashes.insert(desc.name.as_str(), format!("{digest:x}"));
    }

    let root = closure.last().expect("closure contains the root");
    let hash = hashes
        .remove(root.name.as_str())
        .expect("root hash was just computed");
    trace!("md5 for {}: {hash}", root.name);
    Ok(hash)
}

fn md5_text(
    desc: &Descriptor,
    dep_hashes: &HashMap<&str, String>,
) -> Result<String, TypeSysError> {
    let mut lines = Vec::with_capacity(desc.constants.len() + desc.fields.len());
    for c in &desc.constants {
        lines.push(format!("{} {}={}", c.ty.spelling(), c.name, c.value.render()));
    }
    for f in &desc.fields {
        match f.ty.named_ref() {
            Some(dep) => {
                // The array/sequence suffix is dropped on reference fields;
                // the substituted hash already pins the element layout.
                let h = dep_hashes
                    .get(dep.as_str())
                    .ok_or_else(|| TypeSysError::UnknownType {
                        name: dep.to_string(),
                    })?;
                lines.push(format!("{h} {}", f.name));
            }
            None => lines.push(format!("{} {}", spell_type(&f.ty), f.name)),
        }
    }
    Ok(lines.join("\n"))
}

/// Structural RIHS01 hash: a SHA-256 over a canonical rendering of the
/// descriptor graph, dependencies in postorder, root last. Invariant to
/// comment/whitespace edits and to everything that is not structure
/// (defaults included).
pub(crate) fn rihs01_of(store: &Typestore, name: &str) -> Result<String, TypeSysError> {
    let closure = store.closure(name)?;
    let mut canon = String::new();
    for desc in &closure {
        let kind = match desc.kind {
            DescriptorKind::Message => "message",
            DescriptorKind::ConstantGroup => "constants",
        };
        canon.push_str(&format!("{kind} {}\n", desc.name));
        for c in &desc.constants {
            canon.push_str(&format!(
                "const {} {}={}\n",
                c.ty.spelling(),
                c.name,
                c.value.render()
            ));
        }
        for f in &desc.fields {
            canon.push_str(&format!("field {} {}\n", struct_spelling(&f.ty), f.name));
        }
    }

    let mut hasher = Sha256::new();
    hasher.update(canon.as_bytes());
    let digest = hasher.finalize();
    let hash = format!("RIHS01_{}", to_hex(&digest));
    trace!("rihs01 for {name}: {hash}");
    Ok(hash)
}

/// Canonical MSG-style spelling of a non-reference type.
fn spell_type(ty: &TypeSpec) -> String {
    match ty {
        TypeSpec::Base(base) => base.spelling(),
        TypeSpec::Named(name) => name.to_string(),
        TypeSpec::Array { elem, len } => format!("{}[{len}]", spell_type(elem)),
        TypeSpec::Sequence { elem, bound: None } => format!("{}[]", spell_type(elem)),
        TypeSpec::Sequence {
            elem,
            bound: Some(n),
        } => format!("{}[<={n}]", spell_type(elem)),
    }
}

/// Fixed spelling for the structural hash; name references stay explicit.
fn struct_spelling(ty: &TypeSpec) -> String {
    match ty {
        TypeSpec::Base(base) => base.spelling(),
        TypeSpec::Named(name) => format!("ref<{name}>"),
        TypeSpec::Array { elem, len } => format!("array<{},{len}>", struct_spelling(elem)),
        TypeSpec::Sequence { elem, bound: None } => {
            format!("sequence<{}>", struct_spelling(elem))
        }
        TypeSpec::Sequence {
            elem,
            bound: Some(n),
        } => format!("sequence<{},{n}>", struct_spelling(elem)),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
