//! Line-oriented parser for the MSG interface definition language.
//!
//! Each meaningful line is a constant (`TYPE NAME = VALUE`, name in
//! `SCREAMING_CASE`), a field (`TYPE name [= DEFAULT]`), or a comment.
//! String constants swallow the rest of the line verbatim (`#` included);
//! everything else is comment-stripped before parsing.

use bagtype_core::{
    BaseType, Literal, ParseError, ParseErrorKind, RawConstant, RawField, RawMessage, RawType,
    TypeName, TypeSysError,
};
use log::trace;

use crate::bundle::{MsgSection, split_bundle};

/// Parse a (possibly concatenated) MSG definition bundle.
///
/// `primary` names the first section when it carries no `MSG:` header, which
/// is how bag containers store the type of a stream. Returns the parsed
/// messages in section order, primary first.
pub fn parse_msg_bundle(
    text: &str,
    primary: Option<&TypeName>,
) -> Result<Vec<RawMessage>, TypeSysError> {
    let sections = split_bundle(text);
    if sections.is_empty() {
        return Err(err(ParseErrorKind::UnexpectedToken, 1, 1, "empty definition").into());
    }
    trace!("msg bundle with {} sections", sections.len());

    let mut out = Vec::with_capacity(sections.len());
    for (idx, section) in sections.iter().enumerate() {
        let name = section_name(section, idx, primary)?;
        out.push(parse_section(name, section)?);
    }
    Ok(out)
}

/// Parse a single MSG definition with a known type name.
pub fn parse_msg(text: &str, name: &TypeName) -> Result<RawMessage, TypeSysError> {
    let mut messages = parse_msg_bundle(text, Some(name))?;
    Ok(messages.remove(0))
}

fn section_name(
    section: &MsgSection<'_>,
    idx: usize,
    primary: Option<&TypeName>,
) -> Result<TypeName, TypeSysError> {
    if let Some((_, header)) = section.header {
        return TypeName::parse(header);
    }
    if idx == 0 {
        if let Some(name) = primary {
            return Ok(name.clone());
        }
    }
    let line = section.lines.first().map_or(1, |(no, _)| *no);
    let what = if idx == 0 {
        "definition bundle lacks a primary type name"
    } else {
        "dependency section lacks a `MSG:` header"
    };
    Err(err(ParseErrorKind::UnexpectedToken, line, 1, what).into())
}

fn parse_section(name: TypeName, section: &MsgSection<'_>) -> Result<RawMessage, TypeSysError> {
    let mut msg = RawMessage::new(name);
    for &(no, raw) in &section.lines {
        let t = raw.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        match parse_line(raw, no)? {
            Line::Field(field) => {
                if msg.fields.iter().any(|f| f.name == field.name) {
                    return Err(err(
                        ParseErrorKind::DuplicateField,
                        no,
                        1,
                        format!("field '{}' already declared", field.name),
                    )
                    .into());
                }
                msg.fields.push(field);
            }
            Line::Constant(constant) => msg.constants.push(constant),
        }
    }
    Ok(msg)
}

enum Line {
    Field(RawField),
    Constant(RawConstant),
}

fn parse_line(raw: &str, no: usize) -> Result<Line, TypeSysError> {
    let bytes = raw.as_bytes();

    let t0 = skip_ws(bytes, 0);
    let t1 = scan_token(bytes, t0);
    let type_tok = &raw[t0..t1];

    let n0 = skip_ws(bytes, t1);
    let n1 = scan_ident(bytes, n0);
    if n1 == n0 {
        return Err(err(
            ParseErrorKind::UnexpectedToken,
            no,
            n0 + 1,
            "expected a field or constant name",
        )
        .into());
    }
    let name = &raw[n0..n1];

    // After the name only whitespace, a comment, or an `=` assignment may
    // follow. Anything else is garbage.
    let p = skip_ws(bytes, n1);
    let assigned = match bytes.get(p) {
        None => None,
        Some(b'#') => None,
        Some(b'=') => Some(&raw[p + 1..]),
        Some(_) => {
            return Err(err(
                ParseErrorKind::UnexpectedToken,
                no,
                p + 1,
                format!("unexpected text after '{name}'"),
            )
            .into());
        }
    };

    if let Some(value_raw) = assigned
        && is_constant_name(name)
    {
        let ty = parse_base_token(type_tok).ok_or_else(|| {
            err(
                ParseErrorKind::BadLiteral,
                no,
                t0 + 1,
                format!("constants must have a primitive type, got '{type_tok}'"),
            )
        })?;
        let value = parse_constant_value(&ty, value_raw).ok_or_else(|| {
            err(
                ParseErrorKind::BadLiteral,
                no,
                p + 2,
                format!("cannot parse '{}' as {}", value_raw.trim(), ty.spelling()),
            )
        })?;
        return Ok(Line::Constant(RawConstant {
            name: name.to_string(),
            ty,
            value,
        }));
    }

    let ty = parse_type_token(type_tok, no, t0 + 1)?;
    let default = match assigned {
        None => None,
        Some(value_raw) => {
            let text = strip_comment(value_raw).trim();
            Some(parse_default(&ty, text).ok_or_else(|| {
                err(
                    ParseErrorKind::BadLiteral,
                    no,
                    p + 2,
                    format!("cannot parse default '{text}'"),
                )
            })?)
        }
    };
    Ok(Line::Field(RawField {
        name: name.to_string(),
        ty,
        default,
    }))
}

/// Constants are spelled in `SCREAMING_CASE`; everything else with an `=`
/// is a field default.
fn is_constant_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

/// Parse a type token into a [`RawType`], handling `<=N` bounds and
/// `[]` / `[N]` / `[<=N]` array suffixes.
fn parse_type_token(tok: &str, no: usize, col: usize) -> Result<RawType, TypeSysError> {
    if let Some(open) = tok.find('[') {
        let inner = tok[open..]
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| {
                err(
                    ParseErrorKind::MalformedArray,
                    no,
                    col + open,
                    format!("malformed array suffix in '{tok}'"),
                )
            })?;
        let elem = parse_scalar_token(&tok[..open], no, col)?;
        let malformed = || {
            err(
                ParseErrorKind::MalformedArray,
                no,
                col + open,
                format!("bad array size in '{tok}'"),
            )
        };
        return Ok(if inner.is_empty() {
            RawType::Sequence {
                elem: Box::new(elem),
                bound: None,
            }
        } else if let Some(bound) = inner.strip_prefix("<=") {
            let bound = bound.parse::<usize>().map_err(|_| malformed())?;
            RawType::Sequence {
                elem: Box::new(elem),
                bound: Some(bound),
            }
        } else {
            let len = inner.parse::<usize>().map_err(|_| malformed())?;
            RawType::Array {
                elem: Box::new(elem),
                len,
            }
        });
    }
    parse_scalar_token(tok, no, col)
}

fn parse_scalar_token(tok: &str, no: usize, col: usize) -> Result<RawType, TypeSysError> {
    if let Some(base) = parse_base_token(tok) {
        return Ok(RawType::Base(base));
    }
    let segments: Vec<&str> = tok.split('/').collect();
    if !segments.is_empty() && segments.iter().all(|s| is_ident(s)) {
        return Ok(RawType::Named(
            segments.into_iter().map(str::to_string).collect(),
        ));
    }
    Err(err(
        ParseErrorKind::UnknownType,
        no,
        col,
        format!("cannot parse type '{tok}'"),
    )
    .into())
}

/// Parse a primitive type token, `string<=N` / `wstring<=N` included.
fn parse_base_token(tok: &str) -> Option<BaseType> {
    if let Some(bound) = tok.strip_prefix("string<=") {
        return Some(BaseType::String(Some(bound.parse().ok()?)));
    }
    if let Some(bound) = tok.strip_prefix("wstring<=") {
        return Some(BaseType::WString(Some(bound.parse().ok()?)));
    }
    BaseType::from_name(tok)
}

/// String constants swallow the raw remainder of the line; numeric and bool
/// constants are comment-stripped first.
fn parse_constant_value(ty: &BaseType, value_raw: &str) -> Option<Literal> {
    match ty {
        BaseType::String(_) | BaseType::WString(_) => {
            let text = value_raw.trim();
            Some(Literal::Str(
                Literal::unquote(text).unwrap_or_else(|| text.to_string()),
            ))
        }
        BaseType::Time | BaseType::Duration => None,
        _ => parse_scalar_literal(ty, strip_comment(value_raw).trim()),
    }
}

fn parse_default(ty: &RawType, text: &str) -> Option<Literal> {
    match ty {
        RawType::Base(base) => parse_scalar_literal(base, text),
        RawType::Array { elem, .. } | RawType::Sequence { elem, .. } => {
            let RawType::Base(base) = elem.as_ref() else {
                return None;
            };
            let items = split_array_items(text)?;
            let parsed: Option<Vec<Literal>> = items
                .iter()
                .map(|item| parse_scalar_literal(base, item))
                .collect();
            Some(Literal::Seq(parsed?))
        }
        RawType::Named(_) => None,
    }
}

fn parse_scalar_literal(ty: &BaseType, text: &str) -> Option<Literal> {
    match ty {
        BaseType::Bool => match text {
            "true" | "1" => Some(Literal::Bool(true)),
            "false" | "0" => Some(Literal::Bool(false)),
            _ => None,
        },
        BaseType::F32 | BaseType::F64 => text.parse::<f64>().ok().map(Literal::Float),
        BaseType::String(_) | BaseType::WString(_) => Some(Literal::Str(
            Literal::unquote(text).unwrap_or_else(|| text.to_string()),
        )),
        BaseType::Time | BaseType::Duration => None,
        _ => Literal::parse_int(text).map(Literal::Int),
    }
}

/// Split a bracketed default (`[1, 2, 3]`) at top-level commas, respecting
/// quotes and nested brackets.
fn split_array_items(s: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix('[')?.strip_suffix(']')?;
    let mut items = Vec::new();
    let mut cur = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in inner.chars() {
        if let Some(q) = quote {
            cur.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => {
                quote = Some(ch);
                cur.push(ch);
            }
            '[' => {
                depth += 1;
                cur.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                cur.push(ch);
            }
            ',' if depth == 0 => {
                items.push(cur.trim().to_string());
                cur.clear();
            }
            _ => cur.push(ch),
        }
    }
    if quote.is_some() || depth != 0 {
        return None;
    }
    let last = cur.trim();
    if !last.is_empty() {
        items.push(last.to_string());
    }
    Some(items)
}

/// Cut a `#` comment, ignoring `#` inside quoted text.
fn strip_comment(s: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '#' => return &s[..i],
            _ => {}
        }
    }
    s
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    i
}

fn scan_token(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i] != b' ' && bytes[i] != b'\t' {
        i += 1;
    }
    i
}

fn scan_ident(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
    }
    i
}

fn is_ident(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty() && scan_ident(bytes, 0) == bytes.len()
}

fn err(kind: ParseErrorKind, line: usize, col: usize, detail: impl Into<String>) -> ParseError {
    ParseError::new(kind, line, col, detail)
}
