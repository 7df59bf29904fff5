//! Reading Waybar's JSON-with-comments config.
//!
//! Waybar accepts `//` and `/* */` comments and trailing commas;
//! `serde_json` accepts neither.  [`strip_jsonc`] removes them while leaving
//! string literals alone, so values such as `"https://example.org"` or
//! `"a, ]"` survive.

use serde_json::{Map, Value};

/// Remove comments and trailing commas from `text`.
///
/// Newlines inside removed comments are kept so that `serde_json` error
/// positions still point at the right line.
pub fn strip_jsonc(text: &str) -> String {
    let without_comments = strip_comments(text);
    strip_trailing_commas(&without_comments)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let lookahead = chars.peek().copied();
        match (c, lookahead) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some(']') | Some('}')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Error from parsing a JSONC document.
#[derive(Debug, thiserror::Error)]
pub enum JsoncError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("top level is not an object")]
    NotAnObject,
}

/// Strip comments and trailing commas, then parse a top-level object.
pub fn parse_jsonc(text: &str) -> Result<Map<String, Value>, JsoncError> {
    match serde_json::from_str::<Value>(&strip_jsonc(text))? {
        Value::Object(map) => Ok(map),
        _ => Err(JsoncError::NotAnObject),
    }
}
