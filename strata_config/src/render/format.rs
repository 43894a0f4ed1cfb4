//! Value formatting for the YAML-like renderer.
//!
//! Formatters are tried in a fixed precedence order: plain scalar,
//! single-quoted, whitespace-only escapes, leading/trailing-space quoting,
//! literal block scalar, folded block scalar, then an escaped double-quoted
//! default that always succeeds.

/// Format a value within `max_len` columns. Returns the value lines and the
/// block style indicator (`|`, `|-`, `>-` or empty).
pub(super) fn format_value(v: Option<&str>, max_len: usize) -> (Vec<String>, &'static str) {
    let Some(val) = v else {
        return (vec![String::new()], "");
    };

    let formatters: [fn(&str, usize) -> Option<(Vec<String>, &'static str)>; 7] = [
        try_plain_scalar,
        try_single_quotes,
        try_whitespace_only,
        try_leading_trailing_spaces,
        try_literal_block_scalar,
        try_folded_block_scalar,
        try_quoted_default,
    ];

    for formatter in formatters {
        if let Some(result) = formatter(val, max_len) {
            return result;
        }
    }

    // try_quoted_default always succeeds.
    (vec![val.to_owned()], "")
}

fn try_plain_scalar(val: &str, max_len: usize) -> Option<(Vec<String>, &'static str)> {
    (!val.contains('\n')
        && !has_special_chars(val)
        && !has_special_spaces(val)
        && !is_keyword(val)
        && !is_numeric(val)
        && val.len() <= max_len)
        .then(|| (vec![val.to_owned()], ""))
}

fn try_single_quotes(val: &str, max_len: usize) -> Option<(Vec<String>, &'static str)> {
    (!val.contains('\'')
        && !val.contains('\n')
        && !val.contains('\t')
        && !has_control_chars(val)
        && val.len().saturating_add(2) <= max_len)
        .then(|| (vec![format!("'{val}'")], ""))
}

fn try_whitespace_only(val: &str, _max_len: usize) -> Option<(Vec<String>, &'static str)> {
    (!has_normal_content(val))
        .then(|| (vec![format!("\"{}\"", val.replace('\n', "\\n"))], ""))
}

fn try_leading_trailing_spaces(val: &str, max_len: usize) -> Option<(Vec<String>, &'static str)> {
    (has_special_spaces(val) && !val.contains('\n'))
        .then(|| (chunk_string(quote_and_escape(val), max_len), ""))
}

fn try_literal_block_scalar(val: &str, _max_len: usize) -> Option<(Vec<String>, &'static str)> {
    if !val.contains('\n') || !has_normal_content(val) {
        return None;
    }

    let mut lines: Vec<String> = val.split('\n').map(str::to_owned).collect();
    let mut style = "|-";

    // A trailing newline is preserved by clip style.
    if val.ends_with('\n') {
        style = "|";
        if lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
    }

    Some((lines, style))
}

fn try_folded_block_scalar(val: &str, max_len: usize) -> Option<(Vec<String>, &'static str)> {
    if max_len == usize::MAX || val.len() <= max_len || has_special_chars(val) {
        return None;
    }

    let words: Vec<&str> = val.split_whitespace().collect();
    if words.len() <= 1 || !words.iter().any(|w| w.len() <= max_len) {
        return None;
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in words {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_len {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    Some((lines, ">-"))
}

fn try_quoted_default(val: &str, max_len: usize) -> Option<(Vec<String>, &'static str)> {
    let quoted = quote_and_escape(val);

    if has_special_chars(val) || quoted.len() > max_len {
        return Some((chunk_string(quoted, max_len), ""));
    }

    Some((vec![quoted], ""))
}

/// Strings YAML would interpret as something other than a string.
fn is_keyword(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "null" | "true" | "false" | "~" | ".inf" | "-.inf" | ".nan" | "yes" | "no" | "on" | "off"
    )
}

/// Whether YAML would parse the string as a number. Mirrors a prefix scan:
/// text beginning with a valid number is treated as numeric when a decimal
/// point is present, and all-digit strings (with an optional sign) always
/// are.
fn is_numeric(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return true;
    }

    if s.contains('.') {
        for end in (1..=s.len()).rev() {
            if !s.is_char_boundary(end) {
                continue;
            }
            if s[..end].parse::<f64>().is_ok() {
                return true;
            }
        }
    }

    false
}

fn has_special_chars(s: &str) -> bool {
    let string_level = s.contains(": ") || s.contains('\\');
    for c in s.chars() {
        if c == '\n' || c == '\t' {
            continue;
        }
        if c.is_control() && (c as u32) < 128 {
            return true;
        }
        if "#&*!|'\"%@`".contains(c) {
            return true;
        }
        if string_level {
            return true;
        }
    }
    false
}

fn has_control_chars(s: &str) -> bool {
    s.chars()
        .any(|c| c != '\n' && c != '\t' && c.is_control() && (c as u32) < 128)
}

/// Leading or trailing whitespace (other than a newline) forces quoting.
fn has_special_spaces(s: &str) -> bool {
    let first = s
        .chars()
        .next()
        .is_some_and(|c| c != '\n' && c.is_whitespace());
    let last = s
        .chars()
        .next_back()
        .is_some_and(|c| c != '\n' && c.is_whitespace());
    first || last
}

/// Whether the string contains anything besides whitespace.
fn has_normal_content(s: &str) -> bool {
    s.chars().any(|c| c != '\n' && !c.is_whitespace())
}

/// Split a double-quoted string into continuation chunks ending in `\`,
/// preferring word boundaries.
fn chunk_string(s: String, max_len: usize) -> Vec<String> {
    let s = if s.starts_with('"') {
        s
    } else {
        format!("\"{s}\"")
    };
    if max_len == usize::MAX {
        return vec![s];
    }

    let mut lines = Vec::new();
    let mut remaining = s.as_str();
    while !remaining.is_empty() {
        let split = find_best_split_point(remaining, max_len);
        if split == remaining.len() {
            lines.push(remaining.to_owned());
            break;
        }
        lines.push(format!("{}\\", &remaining[..split]));
        remaining = &remaining[split..];
    }
    lines
}

/// Best split position within `max_len`: a space boundary in the upper half
/// when one exists, otherwise a hard cut (adjusted to a char boundary).
fn find_best_split_point(s: &str, max_len: usize) -> usize {
    if s.len() <= max_len {
        return s.len();
    }

    // Reserve space for the continuation backslash.
    let effective = max_len.saturating_sub(1).max(1);

    let mut i = effective;
    while i > effective / 2 {
        if i < s.len() && s.is_char_boundary(i) && s.as_bytes().get(i) == Some(&b' ') {
            return i + 1;
        }
        i -= 1;
    }

    let mut cut = effective.min(s.len());
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    cut.max(1)
}

/// Quote and escape a value for double-quoted output, leaving it unquoted
/// when no escaping is required.
fn quote_and_escape(val: &str) -> String {
    let quoted = serde_json::to_string(val).unwrap_or_else(|_| format!("\"{val}\""));
    if quoted == format!("\"{val}\"") {
        return val.to_owned();
    }
    quoted
}
