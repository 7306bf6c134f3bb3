//! Low-level text utilities for the IDL grammar.

/// Replace `/* … */` block comments (nest-free) with spaces, preserving
/// newlines so line numbers stay meaningful. String literals are respected.
pub fn strip_block_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut in_str = false;
    let mut escaped = false;
    let mut in_comment = false;
    while i < bytes.len() {
        let ch = bytes[i] as char;
        if in_comment {
            if ch == '*' && bytes.get(i + 1) == Some(&b'/') {
                in_comment = false;
                out.push(' ');
                i += 2;
                continue;
            }
            out.push(if ch == '\n' { '\n' } else { ' ' });
            i += 1;
            continue;
        }
        if in_str {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_str = false;
            }
            out.push(ch);
            i += 1;
            continue;
        }
        if ch == '"' {
            in_str = true;
            out.push(ch);
            i += 1;
            continue;
        }
        if ch == '/' && bytes.get(i + 1) == Some(&b'*') {
            in_comment = true;
            out.push(' ');
            i += 2;
            continue;
        }
        out.push(ch);
        i += 1;
    }
    out
}

/// Cut a `//` comment, ignoring slashes inside string literals.
pub fn strip_line_comments(line: &str) -> &str {
    let mut quoted = false;
    let mut escaped = false;
    let mut slash_at: Option<usize> = None;
    for (i, ch) in line.char_indices() {
        if quoted {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                quoted = false;
            }
            continue;
        }
        match ch {
            '"' => {
                quoted = true;
                slash_at = None;
            }
            '/' => {
                if let Some(start) = slash_at {
                    return &line[..start];
                }
                slash_at = Some(i);
            }
            _ => slash_at = None,
        }
    }
    line
}

/// A bundle separator is a line of nothing but `=`, at least eighty of
/// them — the same rule the MSG bundle grammar uses.
pub fn is_separator_line(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 80 && t.bytes().all(|b| b == b'=')
}

/// Find `needle` outside string literals; returns its byte index.
pub fn find_outside_strings(s: &str, needle: char) -> Option<usize> {
    let mut in_str = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_str {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_str = false;
            }
            continue;
        }
        if ch == '"' {
            in_str = true;
            continue;
        }
        if ch == needle {
            return Some(i);
        }
    }
    None
}
