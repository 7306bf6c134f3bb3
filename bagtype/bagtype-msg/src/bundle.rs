//! Splitting concatenated MSG definition bundles.
//!
//! A bag stamps each stream with the full definition of its message type:
//! the primary definition first, then every transitive dependency, separated
//! by lines of at least eighty `=` characters, each dependency prefaced with
//! a `MSG: pkg/Name` header:
//!
//! ```text
//! std_msgs/Header header
//! uint8[] data
//! ================================================================================
//! MSG: std_msgs/Header
//! uint32 seq
//! time stamp
//! string frame_id
//! ```

/// One section of a definition bundle.
#[derive(Debug, Clone)]
pub struct MsgSection<'a> {
    /// `(line, name)` from a `MSG: pkg/Name` header, absent on the primary
    /// section.
    pub header: Option<(usize, &'a str)>,
    /// Remaining content as `(1-based line number, raw text)` pairs.
    pub lines: Vec<(usize, &'a str)>,
}

/// A separator is a line of nothing but `=`, at least eighty of them.
pub fn is_separator_line(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 80 && t.chars().all(|c| c == '=')
}

/// Split bundle text into sections at separator lines and peel off `MSG:`
/// headers. Sections with no meaningful content are dropped.
pub fn split_bundle(text: &str) -> Vec<MsgSection<'_>> {
    let mut sections = Vec::new();
    let mut buf: Vec<(usize, &str)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        if is_separator_line(raw) {
            push_section(&mut sections, &mut buf);
            continue;
        }
        buf.push((idx + 1, raw));
    }
    push_section(&mut sections, &mut buf);
    sections
}

fn push_section<'a>(sections: &mut Vec<MsgSection<'a>>, buf: &mut Vec<(usize, &'a str)>) {
    let lines = std::mem::take(buf);
    if !lines.iter().any(|(_, l)| !l.trim().is_empty()) {
        return;
    }

    let mut header = None;
    let mut body = Vec::with_capacity(lines.len());
    for (no, line) in lines {
        if header.is_none() && body.is_empty() {
            let t = line.trim();
            if t.is_empty() {
                continue;
            }
            if let Some(name) = t.strip_prefix("MSG:") {
                header = Some((no, name.trim()));
                continue;
            }
        }
        body.push((no, line));
    }
    sections.push(MsgSection { header, lines: body });
}
