//! Rendering canonical descriptors back to MSG definition text.
//!
//! The output is the inverse of the bundle grammar: the named type first,
//! then each transitive dependency behind a separator line and a
//! `MSG: pkg/Name` header. Output is byte-deterministic for a given store.

use bagtype_core::{Descriptor, Literal, TypeName, TypeSpec, TypeSysError};

use crate::store::Typestore;

const SEPARATOR: &str =
    "================================================================================";

pub(crate) fn emit_msg(store: &Typestore, name: &str) -> Result<String, TypeSysError> {
    let closure = store.closure(name)?;
    let (root, deps) = closure.split_last().expect("closure contains the root");

    let mut out = render_message(root);
    for dep in deps {
        out.push_str(SEPARATOR);
        out.push('\n');
        out.push_str(&format!("MSG: {}\n", short_name(&dep.name)));
        out.push_str(&render_message(dep));
    }
    Ok(out)
}

/// The conventional `pkg/Name` spelling; `srv` and `action` namespaces stay
/// explicit.
fn short_name(name: &TypeName) -> String {
    if name.middle() == "msg" {
        format!("{}/{}", name.package(), name.short())
    } else {
        name.to_string()
    }
}

fn render_message(desc: &Descriptor) -> String {
    let mut out = String::new();
    for c in &desc.constants {
        out.push_str(&format!(
            "{} {}={}\n",
            c.ty.spelling(),
            c.name,
            render_constant(&c.value)
        ));
    }
    for f in &desc.fields {
        // The original field name is kept; keyword-safe aliases are a
        // runtime-surface concern only.
        match &f.default {
            Some(default) => out.push_str(&format!(
                "{} {}={}\n",
                render_type(&f.ty),
                f.name,
                render_default(default)
            )),
            None => out.push_str(&format!("{} {}\n", render_type(&f.ty), f.name)),
        }
    }
    out
}

fn render_type(ty: &TypeSpec) -> String {
    match ty {
        TypeSpec::Base(base) => base.spelling(),
        TypeSpec::Named(name) => short_name(name),
        TypeSpec::Array { elem, len } => format!("{}[{len}]", render_type(elem)),
        TypeSpec::Sequence { elem, bound: None } => format!("{}[]", render_type(elem)),
        TypeSpec::Sequence {
            elem,
            bound: Some(n),
        } => format!("{}[<={n}]", render_type(elem)),
    }
}

/// String constants are stored verbatim and re-emitted verbatim, matching
/// the grammar's swallow-to-end-of-line rule.
fn render_constant(value: &Literal) -> String {
    value.render()
}

/// Defaults must survive a re-parse, so strings are quoted and escaped.
fn render_default(value: &Literal) -> String {
    match value {
        Literal::Str(s) => quote(s),
        Literal::Seq(items) => {
            let inner: Vec<String> = items.iter().map(render_default).collect();
            format!("[{}]", inner.join(", "))
        }
        other => other.render(),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
