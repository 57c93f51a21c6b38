//! Minimal `key=value` properties reader.
//!
//! Supports `#`/`!` comments, `=`, `:` or whitespace separators, backslash
//! line continuations and the common escapes (`\t`, `\n`, `\r`, `\\`, `\=`,
//! `\:`, `\ `). Later duplicates override earlier ones.

use std::collections::BTreeMap;

pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    let mut pending = String::new();

    for raw in text.lines() {
        let line = raw.trim_start();
        if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        if ends_with_continuation(line) {
            pending.push_str(&line[..line.len() - 1]);
            continue;
        }
        pending.push_str(line);
        let logical = std::mem::take(&mut pending);
        if let Some((key, value)) = split_entry(&logical) {
            props.insert(key, value);
        }
    }
    if !pending.is_empty() {
        if let Some((key, value)) = split_entry(&pending) {
            props.insert(key, value);
        }
    }
    props
}

/// Comma separated list with blanks dropped.
pub fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> Option<(String, String)> {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    let mut escaped = false;

    while let Some(&c) = chars.peek() {
        if escaped {
            key.push(unescape(c));
            escaped = false;
            chars.next();
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => break,
            c if c.is_whitespace() => break,
            c => key.push(c),
        }
        chars.next();
    }

    // skip whitespace, at most one separator, then whitespace again
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
    if chars.peek().is_some_and(|c| *c == '=' || *c == ':') {
        chars.next();
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    let mut value = String::new();
    let mut escaped = false;
    for c in chars {
        if escaped {
            value.push(unescape(c));
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else {
            value.push(c);
        }
    }

    if key.is_empty() { None } else { Some((key, value)) }
}

fn unescape(c: char) -> char {
    match c {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        other => other,
    }
}
