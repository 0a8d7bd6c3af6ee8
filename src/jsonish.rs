//! Lenient JavaScript-literal to JSON conversion.
//!
//! The inventory data file is hand-written JavaScript: `//` line comments,
//! bare identifier keys and trailing commas. This module turns such a
//! literal into strict JSON in three passes that must run in this order:
//!
//! 1. [`strip_comments`]: drop `//` comments outside string literals.
//! 2. [`quote_keys`]: wrap bare `ident:` keys in double quotes.
//! 3. [`strip_trailing_commas`]: remove `,` before `}` or `]`.
//!
//! The third pass is a plain regex. It is only safe because the first two
//! have already removed comments and normalised keys; block comments,
//! single-quoted strings and template literals are not supported.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::FatalError;

/// Bytes of source shown on either side of a parse error.
const CONTEXT_RADIUS: usize = 100;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("static regex"));

/// Convert a JavaScript array/object literal into a JSON string.
pub fn to_json(src: &str) -> String {
    let cleaned = strip_comments(src);
    let quoted = quote_keys(&cleaned);
    strip_trailing_commas(&quoted)
}

/// Convert a JavaScript literal and deserialize it as `T`.
///
/// A parse failure becomes [`FatalError::MalformedJson`] carrying the byte
/// offset, its 1-based line and a window of the converted text around it.
pub fn parse<T: DeserializeOwned>(src: &str) -> Result<T, FatalError> {
    let json = to_json(src);
    serde_json::from_str(&json).map_err(|e| {
        let offset = byte_offset(&json, e.line(), e.column());
        FatalError::MalformedJson {
            line: line_of(&json, offset),
            offset,
            message: e.to_string(),
            context: context_window(&json, offset),
        }
    })
}

/// Truncate `line` at the first `//` that sits outside a string literal.
pub fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape {
            escape = false;
            continue;
        }
        match b {
            b'\\' => escape = true,
            b'"' => in_string = !in_string,
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Strip comments from every line, dropping lines left blank.
pub fn strip_comments(src: &str) -> String {
    src.lines()
        .map(strip_line_comment)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quote every bare identifier that is followed by optional spaces or tabs
/// and a colon. String contents, escapes included, are copied verbatim.
pub fn quote_keys(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(src.len() + src.len() / 4);
    let mut in_string = false;
    let mut escape = false;
    let mut i = 0;

    while i < n {
        let ch = chars[i];

        if escape {
            out.push(ch);
            escape = false;
            i += 1;
            continue;
        }

        if in_string {
            match ch {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(ch);
            i += 1;
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            i += 1;
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut end = i;
            while end < n && (chars[end].is_alphanumeric() || chars[end] == '_') {
                end += 1;
            }
            let mut k = end;
            while k < n && (chars[k] == ' ' || chars[k] == '\t') {
                k += 1;
            }

            let is_key = k < n && chars[k] == ':';
            if is_key {
                out.push('"');
            }
            out.extend(&chars[i..end]);
            if is_key {
                out.push('"');
            }
            i = end;
            continue;
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// Remove commas followed only by whitespace and a closing bracket.
pub fn strip_trailing_commas(src: &str) -> String {
    TRAILING_COMMA.replace_all(src, "$1").into_owned()
}

/// serde_json reports 1-based line and column; turn that back into a byte offset.
fn byte_offset(src: &str, line: usize, column: usize) -> usize {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(src.len())
}

fn line_of(src: &str, offset: usize) -> usize {
    src.as_bytes()[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

fn context_window(src: &str, offset: usize) -> String {
    let mut start = offset.saturating_sub(CONTEXT_RADIUS);
    while !src.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + CONTEXT_RADIUS).min(src.len());
    while !src.is_char_boundary(end) {
        end += 1;
    }
    src[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn comment_outside_string_is_removed() {
        assert_eq!(strip_line_comment("  { n: 1 }, // a note"), "  { n: 1 }, ");
        assert_eq!(strip_line_comment("// whole line"), "");
    }

    #[test]
    fn comment_marker_inside_string_is_kept() {
        let line = r#"{ u: "https://example.com/a" }, // src"#;
        assert_eq!(strip_line_comment(line), r#"{ u: "https://example.com/a" }, "#);
    }

    #[test]
    fn escaped_quote_does_not_close_string() {
        let line = r#"{ n: "say \"hi // there\"" }"#;
        assert_eq!(strip_line_comment(line), line);
    }

    #[test]
    fn blank_lines_dropped_after_stripping() {
        let src = "[\n  // header\n\n  1,\n]";
        assert_eq!(strip_comments(src), "[\n  1,\n]");
    }

    #[test]
    fn bare_keys_get_quoted() {
        assert_eq!(
            quote_keys("{n: \"Mug\", v :0.5, det:{color:\"red\"}}"),
            "{\"n\": \"Mug\", \"v\" :0.5, \"det\":{\"color\":\"red\"}}"
        );
    }

    #[test]
    fn keys_inside_strings_untouched() {
        let src = r#"{desc: "ratio: 3 to 1, label: x"}"#;
        assert_eq!(quote_keys(src), r#"{"desc": "ratio: 3 to 1, label: x"}"#);
    }

    #[test]
    fn literal_words_not_followed_by_colon_untouched() {
        assert_eq!(quote_keys("[true, false, null]"), "[true, false, null]");
    }

    #[test]
    fn already_quoted_keys_untouched() {
        assert_eq!(quote_keys(r#"{"n": 1}"#), r#"{"n": 1}"#);
    }

    #[test]
    fn trailing_commas_removed() {
        assert_eq!(strip_trailing_commas("[1, 2, ]"), "[1, 2]");
        assert_eq!(strip_trailing_commas("{\"a\": 1,\n  }"), "{\"a\": 1}");
    }

    #[test]
    fn full_literal_parses() {
        let src = r#"[
  // Kitchen
  { n: "Chef's knife", v: 0.3, t: { room: "kitchen", category: "tools" }, }, // sharp
  { n: "Socks (12)", v: 2, t: { room: "bedroom", category: "clothing" },
    det: { contents: "wool, cotton" } },
]"#;
        let value: Value = parse(src).unwrap();
        assert_eq!(
            value,
            json!([
                { "n": "Chef's knife", "v": 0.3, "t": { "room": "kitchen", "category": "tools" } },
                { "n": "Socks (12)", "v": 2, "t": { "room": "bedroom", "category": "clothing" },
                  "det": { "contents": "wool, cotton" } }
            ])
        );
    }

    #[test]
    fn reconverting_serialized_output_is_stable() {
        let src = r#"[{ n: "Lamp // desk", v: 4, t: { room: "office" }, }]"#;
        let first: Value = parse(src).unwrap();
        let again: Value = parse(&serde_json::to_string_pretty(&first).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn malformed_reports_line_and_context() {
        let src = "[\n  { n: \"ok\" },\n  { n: \"bad\" v: 1 },\n]";
        match parse::<Value>(src).unwrap_err() {
            FatalError::MalformedJson {
                line,
                offset,
                context,
                ..
            } => {
                assert_eq!(line, 3);
                assert!(offset > 0);
                assert!(context.contains("\"bad\""));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parses_into_requested_type() {
        let records: Vec<Value> = parse("[\n  { n: 1 },\n  { n: 2 },\n]").unwrap();
        assert_eq!(records.len(), 2);

        // Valid JSON of the wrong shape is reported like any other parse failure.
        assert!(matches!(
            parse::<Vec<Value>>("{ n: 1 }").unwrap_err(),
            FatalError::MalformedJson { line: 1, .. }
        ));
    }

    #[test]
    fn context_window_respects_char_boundaries() {
        let src = "é".repeat(150);
        let window = context_window(&src, 101);
        assert!(!window.is_empty());
    }
}
