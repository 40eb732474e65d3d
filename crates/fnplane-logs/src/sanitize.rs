// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Neutralizes control sequences embedded in log text.
//!
//! Terminal color codes (ANSI CSI sequences) are stripped. Every other control
//! character except tab, plus the Unicode line and paragraph separators, is
//! escaped so a single log line always renders as a single transcript line.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// `ESC [ params intermediates final`, e.g. `\x1b[31m` or `\x1b[2K`.
    static ref ANSI_CSI_REGEX: Regex =
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("failed creating regex");
}

fn needs_escape(ch: char) -> bool {
    (ch.is_control() && ch != '\t') || matches!(ch, '\u{2028}' | '\u{2029}')
}

/// Returns `text` with CSI sequences removed and control characters escaped.
/// Borrows when there is nothing to change.
#[must_use]
pub fn sanitize(text: &str) -> Cow<'_, str> {
    let stripped = ANSI_CSI_REGEX.replace_all(text, "");
    if !stripped.chars().any(needs_escape) {
        return stripped;
    }

    let mut escaped = String::with_capacity(stripped.len() + 8);
    for ch in stripped.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            ch if needs_escape(ch) => escaped.extend(ch.escape_unicode()),
            ch => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// Sanitizes every string inside a JSON value, keys included.
#[must_use]
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize(&s).into_owned()),
        Value::Array(values) => Value::Array(values.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (sanitize(&key).into_owned(), sanitize_value(value)))
                .collect(),
        ),
        other => other,
    }
}
