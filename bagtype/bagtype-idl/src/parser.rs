//! Parser for the OMG IDL subset used by robotics message definitions.
//!
//! nom combinators handle the token-level grammar (types, fields, consts);
//! a line-state loop tracks module/struct/enum nesting, annotation capture,
//! and typedef scope.
//!
//! # Supported
//!
//! - `module` nesting, `struct`, `enum`, `typedef`, `const`
//! - primitive types in both IDL (`unsigned long long`, `octet`, `boolean`)
//!   and ROS (`uint64`, `bool`) spellings
//! - `sequence<T>` / `sequence<T, N>`, `string<N>`, `wstring<N>`, `name[N]`
//! - scoped type names with `::` or `/` separators
//! - annotations: `@default` (captured as the field default), `@verbatim`
//!   with `language="comment"` (captured as original-definition text),
//!   everything else skipped with balanced-paren scanning
//! - `Foo_Constants` modules folded onto `Foo`, enumerations folded into
//!   per-constant entries
//!
//! # Unsupported
//!
//! `union`, `bitmask`, and `long double` return errors.

use std::collections::HashMap;

use bagtype_core::{
    BaseType, DescriptorKind, Literal, ParseError, ParseErrorKind, RawConstant, RawField,
    RawMessage, RawType, TypeName, TypeSysError,
};
use log::trace;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{alpha1, alphanumeric1, char, space0},
    combinator::{map, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list0},
    sequence::{pair, preceded, terminated, tuple},
};

use crate::lex::{
    find_outside_strings, is_separator_line, strip_block_comments, strip_line_comments,
};

/// Parse an IDL text (single definition or a `====`-separated bundle) into
/// raw messages. Constants-only groups come out as
/// [`DescriptorKind::ConstantGroup`].
pub fn parse_idl_bundle(text: &str) -> Result<Vec<RawMessage>, TypeSysError> {
    let text = strip_block_comments(text);
    let mut state = ParserState::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = strip_line_comments(raw);
        let t = line.trim();
        if t.is_empty() || is_separator_line(t) || t.starts_with("IDL:") {
            continue;
        }
        state.handle_line(t, line_no)?;
    }

    state.finish()
}

// ── parser state ─────────────────────────────────────────────────────────────

#[derive(Debug)]
struct StructEntry {
    path: Vec<String>,
    fields: Vec<RawField>,
    consts: Vec<RawConstant>,
    verbatim: Option<String>,
}

#[derive(Debug, Default)]
struct ParserState {
    modules: Vec<String>,
    structs: Vec<StructEntry>,
    enums: Vec<(Vec<String>, Vec<String>)>,
    typedefs: HashMap<Vec<String>, (RawType, Option<usize>)>,
    /// Constants from `Foo_Constants` modules, keyed by the target path.
    const_groups: Vec<(Vec<String>, Vec<RawConstant>)>,
    current_struct: Option<StructEntry>,
    current_enum: Option<(String, Vec<String>)>,
    pending_default: Option<Literal>,
    pending_verbatim: Option<String>,
    annotation: Option<AnnotationBuf>,
}

impl ParserState {
    fn handle_line(&mut self, line: &str, no: usize) -> Result<(), TypeSysError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(mut ann) = self.annotation.take() {
            return match ann.feed(line) {
                Some(end) => {
                    self.apply_annotation(&ann.text);
                    self.handle_line(&line[end..], no)
                }
                None => {
                    self.annotation = Some(ann);
                    Ok(())
                }
            };
        }

        if line.starts_with('@') {
            let mut ann = AnnotationBuf::default();
            return match ann.feed(line) {
                Some(end) => {
                    self.apply_annotation(&ann.text);
                    self.handle_line(&line[end..], no)
                }
                None => {
                    self.annotation = Some(ann);
                    Ok(())
                }
            };
        }

        if line.starts_with("#include") {
            return Ok(());
        }

        if line.starts_with("union ") || line.starts_with("bitmask ") {
            return Err(unexpected(no, format!("unsupported IDL declaration: {line}")).into());
        }

        if let Some((_, variants)) = self.current_enum.as_mut() {
            let body_end = find_outside_strings(line, '}');
            let body = &line[..body_end.unwrap_or(line.len())];
            for part in body.split(',') {
                let name = parse_enum_variant(part)
                    .map_err(|e| ParseError::new(ParseErrorKind::BadLiteral, no, 1, e))?;
                if let Some(name) = name {
                    variants.push(name);
                }
            }
            if let Some(end) = body_end {
                self.close_scope(no)?;
                let rest = line[end + 1..].trim_start_matches(';');
                return self.handle_line(rest, no);
            }
            return Ok(());
        }

        if let Some((remaining, name)) = try_open(module_decl, line) {
            self.modules.push(name.to_string());
            return self.handle_line(remaining, no);
        }

        if let Some((remaining, name)) = try_open(struct_decl, line) {
            if self.current_struct.is_some() {
                return Err(unexpected(no, "nested struct declarations are unsupported").into());
            }
            let mut path = self.modules.clone();
            path.push(name.to_string());
            self.current_struct = Some(StructEntry {
                path,
                fields: Vec::new(),
                consts: Vec::new(),
                verbatim: self.pending_verbatim.take(),
            });
            return self.handle_line(remaining, no);
        }

        if let Some((remaining, name)) = try_open(enum_decl, line) {
            if self.current_struct.is_some() {
                return Err(unexpected(no, "enum inside struct is unsupported").into());
            }
            self.current_enum = Some((name.to_string(), Vec::new()));
            return self.handle_line(remaining, no);
        }

        if line.starts_with('}') {
            self.close_scope(no)?;
            let rest = line[1..].trim_start().trim_start_matches(';');
            return self.handle_line(rest, no);
        }

        // Everything below is a `;`-terminated statement.
        let Some(semi) = find_outside_strings(line, ';') else {
            return Err(unexpected(no, format!("missing ';' in statement: {line}")).into());
        };
        let (stmt, rest) = (line[..semi].trim(), &line[semi + 1..]);

        if stmt.is_empty() {
            return self.handle_line(rest, no);
        }
        if has_long_double_tokens(stmt) {
            return Err(unexpected(no, "unsupported IDL type `long double`").into());
        }

        if let Some(body) = stmt.strip_prefix("typedef ") {
            self.record_typedef(body.trim(), no)?;
            return self.handle_line(rest, no);
        }

        if let Some(body) = stmt.strip_prefix("const ") {
            let constant = self.parse_const_stmt(body.trim(), no)?;
            if let Some(current) = self.current_struct.as_mut() {
                current.consts.push(constant);
            } else if let Some(target) = self.constants_module_target() {
                match self.const_groups.iter_mut().find(|(p, _)| *p == target) {
                    Some((_, consts)) => consts.push(constant),
                    None => self.const_groups.push((target, vec![constant])),
                }
            } else {
                return Err(
                    unexpected(no, "const outside a struct or a `_Constants` module").into(),
                );
            }
            return self.handle_line(rest, no);
        }

        if self.current_struct.is_some() {
            let field = self.parse_field_stmt(stmt, no)?;
            if let Some(current) = self.current_struct.as_mut() {
                if current.fields.iter().any(|f| f.name == field.name) {
                    return Err(ParseError::new(
                        ParseErrorKind::DuplicateField,
                        no,
                        1,
                        format!("field '{}' already declared", field.name),
                    )
                    .into());
                }
                current.fields.push(field);
            }
            return self.handle_line(rest, no);
        }

        Err(unexpected(no, format!("unexpected top-level statement: {stmt}")).into())
    }

    fn close_scope(&mut self, no: usize) -> Result<(), TypeSysError> {
        if let Some(entry) = self.current_struct.take() {
            self.structs.push(entry);
        } else if let Some((name, variants)) = self.current_enum.take() {
            let mut path = self.modules.clone();
            path.push(name);
            self.enums.push((path, variants));
        } else if self.modules.pop().is_none() {
            return Err(unexpected(no, "unmatched closing brace").into());
        }
        Ok(())
    }

    /// Target path for constants declared in a `Foo_Constants` module.
    fn constants_module_target(&self) -> Option<Vec<String>> {
        let last = self.modules.last()?;
        let stem = last.strip_suffix("_Constants")?;
        let mut target = self.modules[..self.modules.len() - 1].to_vec();
        target.push(stem.to_string());
        Some(target)
    }

    fn record_typedef(&mut self, body: &str, no: usize) -> Result<(), TypeSysError> {
        let (ty, name, fixed_len) = parse_typed_declarator(body)
            .map_err(|e| unexpected(no, format!("bad typedef: {e}")))?;
        let ty = self.substitute_typedef(ty, no)?.0;
        let mut path = self.modules.clone();
        path.push(name);
        self.typedefs.insert(path, (ty, fixed_len));
        Ok(())
    }

    fn parse_const_stmt(&mut self, body: &str, no: usize) -> Result<RawConstant, TypeSysError> {
        let (ty, name, value_text) = parse_const_parts(body)
            .map_err(|e| unexpected(no, format!("bad const declaration: {e}")))?;
        let RawType::Base(base) = ty else {
            return Err(ParseError::new(
                ParseErrorKind::BadLiteral,
                no,
                1,
                "constants must have a primitive type",
            )
            .into());
        };
        let value = parse_idl_literal(&value_text).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::BadLiteral,
                no,
                1,
                format!("cannot parse constant value '{value_text}'"),
            )
        })?;
        Ok(RawConstant {
            name,
            ty: base,
            value,
        })
    }

    fn parse_field_stmt(&mut self, stmt: &str, no: usize) -> Result<RawField, TypeSysError> {
        let (ty, name, fixed_len) = parse_typed_declarator(stmt)
            .map_err(|e| unexpected(no, format!("bad field declaration: {e}")))?;
        let (ty, typedef_len) = self.substitute_typedef(ty, no)?;
        let ty = match (fixed_len, typedef_len) {
            (Some(_), Some(_)) => {
                return Err(unexpected(no, "array of array typedef is unsupported").into());
            }
            (Some(n), None) | (None, Some(n)) => RawType::Array {
                elem: Box::new(ty),
                len: n,
            },
            (None, None) => ty,
        };
        Ok(RawField {
            name,
            ty,
            default: self.pending_default.take(),
        })
    }

    /// Replace a scoped reference with its typedef expansion, if one is in
    /// scope. Returns the (possibly substituted) type and the typedef's
    /// fixed-array length.
    fn substitute_typedef(
        &self,
        ty: RawType,
        no: usize,
    ) -> Result<(RawType, Option<usize>), TypeSysError> {
        match ty {
            RawType::Named(ref segments) => {
                if let Some((expansion, len)) = self.lookup_typedef(segments) {
                    return Ok((expansion, len));
                }
                Ok((ty, None))
            }
            RawType::Sequence { elem, bound } => {
                let (elem, len) = self.substitute_typedef(*elem, no)?;
                if len.is_some() {
                    return Err(unexpected(no, "sequence of array typedef is unsupported").into());
                }
                Ok((
                    RawType::Sequence {
                        elem: Box::new(elem),
                        bound,
                    },
                    None,
                ))
            }
            other => Ok((other, None)),
        }
    }

    fn lookup_typedef(&self, segments: &[String]) -> Option<(RawType, Option<usize>)> {
        let mut candidate = self.modules.clone();
        candidate.extend_from_slice(segments);
        if let Some(found) = self.typedefs.get(&candidate) {
            return Some(found.clone());
        }
        if let Some(found) = self.typedefs.get(segments) {
            return Some(found.clone());
        }
        find_by_suffix(self.typedefs.keys(), segments)
            .and_then(|key| self.typedefs.get(&key).cloned())
    }

    fn apply_annotation(&mut self, text: &str) {
        let Some((name, args)) = split_annotation(text) else {
            return;
        };
        match name {
            "default" => {
                if let Some(raw) = annotation_arg(&args, "value") {
                    self.pending_default = Some(annotation_literal(&raw));
                }
            }
            "verbatim" => {
                let language = annotation_arg(&args, "language");
                if language.as_deref() == Some("comment")
                    && let Some(text) = annotation_arg(&args, "text")
                {
                    self.pending_verbatim = Some(text);
                }
            }
            // @range, @key, @unit and anything unknown carry no information
            // the descriptor model keeps.
            _ => {}
        }
    }

    fn finish(mut self) -> Result<Vec<RawMessage>, TypeSysError> {
        if self.current_struct.is_some() {
            return Err(unexpected(0, "unclosed struct declaration").into());
        }
        if self.current_enum.is_some() {
            return Err(unexpected(0, "unclosed enum declaration").into());
        }
        if !self.modules.is_empty() {
            return Err(unexpected(0, "unclosed module declaration").into());
        }

        let enum_paths: Vec<Vec<String>> = self.enums.iter().map(|(p, _)| p.clone()).collect();
        let mut out = Vec::new();

        // Enumerations become per-constant entries: either on the single
        // struct sharing their module, or as a standalone constants group.
        let mut enum_groups: Vec<(Vec<String>, Vec<RawConstant>)> = Vec::new();
        for (path, variants) in &self.enums {
            let consts: Vec<RawConstant> = variants
                .iter()
                .enumerate()
                .map(|(i, v)| RawConstant {
                    name: v.clone(),
                    ty: BaseType::U32,
                    value: Literal::Int(i as i128),
                })
                .collect();
            let module = &path[..path.len() - 1];
            let mut siblings = self
                .structs
                .iter_mut()
                .filter(|s| &s.path[..s.path.len() - 1] == module);
            match (siblings.next(), siblings.next()) {
                (Some(only), None) => only.consts.extend(consts),
                _ => enum_groups.push((path.clone(), consts)),
            }
        }

        for entry in self.structs {
            let name = TypeName::from_segments(&entry.path)?;
            let mut msg = RawMessage::new(name);
            msg.verbatim = entry.verbatim;
            msg.constants = entry.consts;
            msg.fields = entry
                .fields
                .into_iter()
                .map(|f| RawField {
                    ty: fold_enum_refs(f.ty, &entry.path, &enum_paths),
                    ..f
                })
                .collect();
            if let Some(pos) = self.const_groups.iter().position(|(p, _)| *p == entry.path) {
                let (_, consts) = self.const_groups.remove(pos);
                msg.constants.extend(consts);
            }
            out.push(msg);
        }

        for (path, consts) in self.const_groups.into_iter().chain(enum_groups) {
            let mut msg = RawMessage::new(TypeName::from_segments(&path)?);
            msg.kind = DescriptorKind::ConstantGroup;
            msg.constants = consts;
            out.push(msg);
        }

        trace!(
            "idl parse produced {} messages ({} typedefs in scope)",
            out.len(),
            self.typedefs.len()
        );
        Ok(out)
    }
}

/// An enum-typed field is a plain `uint32` on the wire.
fn fold_enum_refs(ty: RawType, struct_path: &[String], enum_paths: &[Vec<String>]) -> RawType {
    match ty {
        RawType::Named(ref segments) => {
            let mut candidate = struct_path[..struct_path.len() - 1].to_vec();
            candidate.extend_from_slice(segments);
            let hit = enum_paths.iter().any(|p| {
                *p == *segments
                    || *p == candidate
                    || (segments.len() < p.len() && p[p.len() - segments.len()..] == segments[..])
            });
            if hit { RawType::Base(BaseType::U32) } else { ty }
        }
        RawType::Array { elem, len } => RawType::Array {
            elem: Box::new(fold_enum_refs(*elem, struct_path, enum_paths)),
            len,
        },
        RawType::Sequence { elem, bound } => RawType::Sequence {
            elem: Box::new(fold_enum_refs(*elem, struct_path, enum_paths)),
            bound,
        },
        other => other,
    }
}

fn find_by_suffix<'a>(
    keys: impl Iterator<Item = &'a Vec<String>>,
    wanted: &[String],
) -> Option<Vec<String>> {
    let mut found: Option<Vec<String>> = None;
    for key in keys {
        if key.len() < wanted.len() {
            continue;
        }
        if key[key.len() - wanted.len()..] == *wanted {
            if found.is_some() {
                // Ambiguous suffix.
                return None;
            }
            found = Some(key.clone());
        }
    }
    found
}

// ── annotations ──────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AnnotationBuf {
    text: String,
    depth: i32,
    started: bool,
    after_name_ws: bool,
    in_str: bool,
    escaped: bool,
}

impl AnnotationBuf {
    /// Feed one line; returns the byte offset just past the end of the
    /// annotation when it completes on this line. Whitespace may separate
    /// the annotation name from its `(`; a bare annotation (`@key`) ends
    /// where non-annotation content begins.
    fn feed(&mut self, line: &str) -> Option<usize> {
        for (i, ch) in line.char_indices() {
            if self.in_str {
                self.text.push(ch);
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_str = false;
                }
                continue;
            }
            if !self.started {
                match ch {
                    '(' => {
                        self.depth += 1;
                        self.started = true;
                        self.text.push(ch);
                    }
                    c if c.is_whitespace() => self.after_name_ws = true,
                    _ if self.after_name_ws => return Some(i),
                    _ => self.text.push(ch),
                }
                continue;
            }
            match ch {
                '"' => {
                    self.in_str = true;
                    self.text.push(ch);
                }
                '(' => {
                    self.depth += 1;
                    self.text.push(ch);
                }
                ')' => {
                    self.depth -= 1;
                    self.text.push(ch);
                    if self.depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => self.text.push(ch),
            }
        }
        if !self.started {
            return Some(line.len());
        }
        self.text.push('\n');
        None
    }
}

/// Split `@name (args…)` into the annotation name and its argument text.
fn split_annotation(text: &str) -> Option<(&str, String)> {
    let body = text.strip_prefix('@')?;
    let name_end = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let name = &body[..name_end];
    let rest = body[name_end..].trim();
    let args = rest
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or("")
        .to_string();
    Some((name, args))
}

/// Extract one `key=value` argument. Quoted values decode escapes; adjacent
/// quoted chunks concatenate with newlines (the way generated definitions
/// carry multi-line comment text).
fn annotation_arg(args: &str, key: &str) -> Option<String> {
    for part in split_top_level(args) {
        let (k, v) = match part.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => continue,
        };
        if k != key {
            continue;
        }
        if v.starts_with('"') {
            return join_string_chunks(v);
        }
        return Some(v.to_string());
    }
    None
}

fn join_string_chunks(v: &str) -> Option<String> {
    let mut chunks = Vec::new();
    let mut rest = v.trim();
    while !rest.is_empty() {
        if !rest.starts_with('"') {
            return None;
        }
        let mut end = None;
        let mut escaped = false;
        for (i, ch) in rest.char_indices().skip(1) {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                end = Some(i);
                break;
            }
        }
        let end = end?;
        chunks.push(Literal::decode_escapes(&rest[1..end])?);
        rest = rest[end + 1..].trim_start();
    }
    Some(chunks.join("\n"))
}

/// Split annotation arguments at top-level commas.
fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut cur = String::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut escaped = false;
    for ch in s.chars() {
        if in_str {
            cur.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_str = true;
                cur.push(ch);
            }
            '(' => {
                depth += 1;
                cur.push(ch);
            }
            ')' => {
                depth -= 1;
                cur.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(std::mem::take(&mut cur));
            }
            _ => cur.push(ch),
        }
    }
    if !cur.trim().is_empty() {
        parts.push(cur);
    }
    parts
}

/// Parse an annotation or constant literal without type context.
fn annotation_literal(raw: &str) -> Literal {
    let t = raw.trim();
    if let Some(s) = Literal::unquote(t) {
        return Literal::Str(s);
    }
    match t {
        "TRUE" | "true" => return Literal::Bool(true),
        "FALSE" | "false" => return Literal::Bool(false),
        _ => {}
    }
    if let Some(inner) = t.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let items = inner.split(',').map(annotation_literal).collect();
        return Literal::Seq(items);
    }
    if let Some(i) = Literal::parse_int(t) {
        return Literal::Int(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        return Literal::Float(f);
    }
    Literal::Str(t.to_string())
}

fn parse_idl_literal(raw: &str) -> Option<Literal> {
    let lit = annotation_literal(raw);
    match &lit {
        // A bare token that parsed as neither number, bool, nor quoted
        // string is not a valid constant literal.
        Literal::Str(s) if !raw.trim().starts_with(['"', '\'']) && s.contains(char::is_whitespace) => {
            None
        }
        _ => Some(lit),
    }
}

// ── nom grammar ──────────────────────────────────────────────────────────────

fn module_decl(input: &str) -> IResult<&str, &str> {
    map(
        tuple((tag("module"), ws1, identifier, ws, char('{'))),
        |(_, _, name, _, _)| name,
    )(input)
}

fn struct_decl(input: &str) -> IResult<&str, &str> {
    map(
        tuple((tag("struct"), ws1, identifier, ws, char('{'))),
        |(_, _, name, _, _)| name,
    )(input)
}

fn enum_decl(input: &str) -> IResult<&str, &str> {
    map(
        tuple((tag("enum"), ws1, identifier, ws, char('{'))),
        |(_, _, name, _, _)| name,
    )(input)
}

fn try_open<'a>(
    parser: fn(&'a str) -> IResult<&'a str, &'a str>,
    line: &'a str,
) -> Option<(&'a str, &'a str)> {
    parser(line).ok().map(|(rest, name)| (rest, name))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn ws(input: &str) -> IResult<&str, ()> {
    value((), space0)(input)
}

fn ws1(input: &str) -> IResult<&str, ()> {
    value((), take_while1(|c: char| c.is_whitespace()))(input)
}

fn scoped_name(input: &str) -> IResult<&str, Vec<String>> {
    let sep = if input.contains("::") { "::" } else { "/" };
    map(
        separated_list0(tag(sep), map(identifier, String::from)),
        |parts| parts.into_iter().filter(|s| !s.is_empty()).collect(),
    )(input)
}

/// Primitive type names; longer spellings first so that e.g.
/// `unsigned long long` wins over `unsigned long`.
fn primitive_type(input: &str) -> IResult<&str, BaseType> {
    terminated(
        alt((
            value(
                BaseType::U64,
                tuple((tag("unsigned"), ws1, tag("long"), ws1, tag("long"))),
            ),
            value(BaseType::I64, tuple((tag("long"), ws1, tag("long")))),
            value(BaseType::U16, tuple((tag("unsigned"), ws1, tag("short")))),
            value(BaseType::U32, tuple((tag("unsigned"), ws1, tag("long")))),
            value(BaseType::Bool, alt((tag("boolean"), tag("bool")))),
            value(BaseType::I8, tag("int8")),
            value(BaseType::I16, alt((tag("int16"), tag("short")))),
            value(BaseType::I32, alt((tag("int32"), tag("long")))),
            value(BaseType::I64, tag("int64")),
            value(BaseType::U8, tag("uint8")),
            value(BaseType::U16, tag("uint16")),
            value(BaseType::U32, tag("uint32")),
            value(BaseType::U64, tag("uint64")),
            value(BaseType::F32, alt((tag("float32"), tag("float")))),
            value(BaseType::F64, alt((tag("float64"), tag("double")))),
            value(BaseType::String(None), tag("string")),
            value(BaseType::WString(None), tag("wstring")),
            value(BaseType::Octet, tag("octet")),
            value(BaseType::Char, tag("char")),
        )),
        keyword_boundary,
    )(input)
}

fn keyword_boundary(input: &str) -> IResult<&str, ()> {
    if input.chars().next().is_some_and(is_ident_continue) {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    Ok((input, ()))
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn has_long_double_tokens(s: &str) -> bool {
    let mut normalized = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            normalized.push(ch);
        } else {
            normalized.push(' ');
        }
    }
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    tokens
        .windows(2)
        .any(|pair| pair[0] == "long" && pair[1] == "double")
}

fn number(input: &str) -> IResult<&str, usize> {
    map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
        s.parse().unwrap_or(usize::MAX)
    })(input)
}

fn sequence_type(input: &str) -> IResult<&str, RawType> {
    map(
        tuple((
            tag("sequence"),
            ws,
            char('<'),
            ws,
            type_expr_inner,
            opt(preceded(tuple((ws, char(','), ws)), number)),
            ws,
            char('>'),
        )),
        |(_, _, _, _, elem, bound, _, _)| RawType::Sequence {
            elem: Box::new(elem),
            bound,
        },
    )(input)
}

fn bounded_string_type(input: &str) -> IResult<&str, RawType> {
    map(
        tuple((tag("string"), ws, char('<'), ws, number, ws, char('>'))),
        |(_, _, _, _, n, _, _)| RawType::Base(BaseType::String(Some(n))),
    )(input)
}

fn bounded_wstring_type(input: &str) -> IResult<&str, RawType> {
    map(
        tuple((tag("wstring"), ws, char('<'), ws, number, ws, char('>'))),
        |(_, _, _, _, n, _, _)| RawType::Base(BaseType::WString(Some(n))),
    )(input)
}

fn type_expr_inner(input: &str) -> IResult<&str, RawType> {
    alt((
        sequence_type,
        bounded_string_type,
        bounded_wstring_type,
        map(primitive_type, RawType::Base),
        map(scoped_name, RawType::Named),
    ))(input)
}

fn declarator(input: &str) -> IResult<&str, (&str, Option<usize>)> {
    alt((
        map(
            pair(identifier, tuple((char('['), ws, number, ws, char(']')))),
            |(name, (_, _, size, _, _))| (name, Some(size)),
        ),
        map(identifier, |name| (name, None)),
    ))(input)
}

/// Parse `type name` / `type name[N]` — shared by fields and typedefs.
fn parse_typed_declarator(input: &str) -> Result<(RawType, String, Option<usize>), String> {
    match tuple((type_expr_inner, ws1, declarator))(input) {
        Ok((remaining, (ty, _, (name, fixed_len)))) if remaining.trim().is_empty() => {
            Ok((ty, name.to_string(), fixed_len))
        }
        Ok((remaining, _)) => Err(format!("unexpected trailing characters: {remaining}")),
        Err(e) => Err(e.to_string()),
    }
}

/// Parse `type NAME = value` (the `const` keyword already stripped).
fn parse_const_parts(input: &str) -> Result<(RawType, String, String), String> {
    let parser = tuple((
        type_expr_inner,
        ws1,
        identifier,
        ws,
        char('='),
        ws,
        map(take_while1(|_| true), str::trim),
    ));
    match map(parser, |(ty, _, name, _, _, _, value)| (ty, name, value))(input) {
        Ok((remaining, (ty, name, value))) if remaining.trim().is_empty() => {
            Ok((ty, name.to_string(), value.to_string()))
        }
        Ok((remaining, _)) => Err(format!("unexpected trailing characters: {remaining}")),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_enum_variant(part: &str) -> Result<Option<String>, String> {
    let t = part.trim();
    if t.is_empty() {
        return Ok(None);
    }
    let name_part = t.split_once('=').map(|(n, _)| n.trim()).unwrap_or(t);
    match identifier(name_part) {
        Ok((rest, name)) if rest.trim().is_empty() => Ok(Some(name.to_string())),
        _ => Err(format!("bad enum variant '{t}'")),
    }
}

fn unexpected(no: usize, detail: impl Into<String>) -> ParseError {
    ParseError::new(ParseErrorKind::UnexpectedToken, no, 1, detail)
}

