// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Turns raw function log lines into [`ParsedLine`]s.
//!
//! Lines are tried against the known shapes in order, first match wins:
//!
//! 1. **JSON**: `{"level":"info","time":"...","name":"...","message":"...","more":"k=v || k=v","with":{...}}`
//! 2. **Plain text**: `[<RFC3339 timestamp> ]LEVEL[:] [k=v ...] message`
//! 3. **Panic header**: `panic: ...`, `Traceback (most recent call last):`, ...
//! 4. Anything else is a continuation of the previous record.
//!
//! The parser keeps one bit of state: after a rule removes a record,
//! its continuation lines are dropped too until the next record arrives.

use chrono::{DateTime, SecondsFormat};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::rules::{RuleSet, Verdict};
use crate::record::{Level, LogRecord, ParsedLine};
use crate::sanitize::{sanitize, sanitize_value};

const WORKER_KEYS: [&str; 3] = ["worker", "worker_id", "workerID"];
const MESSAGE_KEYS: [&str; 2] = ["message", "msg"];
const LOGGER_KEYS: [&str; 2] = ["name", "logger"];
const TIME_KEYS: [&str; 3] = ["time", "timestamp", "ts"];

const PANIC_PREFIXES: [&str; 5] = [
    "panic: ",
    "fatal error: ",
    "Traceback (most recent call last):",
    "Exception in thread ",
    "Unhandled exception",
];

lazy_static! {
    static ref PLAIN_LINE_REGEX: Regex = Regex::new(
        r"^(?:(?P<ts>\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:[.,]\d+)?(?:Z|[+-]\d{2}:?\d{2})?)\s+)?(?P<level>TRACE|DEBUG|INFO|WARNING|WARN|ERROR|FATAL|CRITICAL|PANIC):?(?:\s+(?P<rest>.*))?$"
    )
    .expect("failed creating regex");

    /// Leading `key=value` token of a plain-text line.
    static ref KEY_VALUE_REGEX: Regex =
        Regex::new(r"^(?P<key>[A-Za-z_][\w.\-]*)=(?P<value>\S*)(?:\s+|$)").expect("failed creating regex");

    /// Worker segment of a logger name, e.g. `processor.http.w3.python`.
    static ref LOGGER_WORKER_REGEX: Regex =
        Regex::new(r"(?:^|\.)w(?P<id>\d+)(?:\.|$)").expect("failed creating regex");

    /// Rust runtime panics: `thread 'main' panicked at src/main.rs:2:5:`.
    static ref RUST_PANIC_REGEX: Regex =
        Regex::new(r"^thread '[^']*' panicked at").expect("failed creating regex");
}

/// Stateful line parser; one per log stream.
#[derive(Debug, Default)]
pub struct LineParser {
    rules: RuleSet,
    suppressing: bool,
    dropped: usize,
}

impl LineParser {
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Records removed by `drop` or `keep` rules so far.
    #[must_use]
    pub fn dropped_records(&self) -> usize {
        self.dropped
    }

    /// Parses one raw line, without its line terminator.
    ///
    /// Returns `None` for blank lines, for records removed by a rule and for
    /// the continuation lines of a removed record.
    pub fn parse(&mut self, raw: &str) -> Option<ParsedLine> {
        let raw = raw.trim_end_matches(['\n', '\r']);
        if raw.trim().is_empty() {
            return None;
        }

        match parse_line(raw) {
            ParsedLine::Record(mut record) => {
                match self.rules.review(&mut record) {
                    Verdict::Admit => {}
                    Verdict::Dropped { rule } => {
                        debug!(rule, "Dropping log record matched by a drop rule");
                        self.suppress();
                        return None;
                    }
                    Verdict::NotKept => {
                        debug!("Dropping log record matched by no keep rule");
                        self.suppress();
                        return None;
                    }
                }
                self.suppressing = false;
                Some(ParsedLine::Record(record))
            }
            ParsedLine::Continuation(_) if self.suppressing => None,
            ParsedLine::Continuation(mut text) => {
                self.rules.mask_in_place(&mut text);
                Some(ParsedLine::Continuation(text))
            }
        }
    }

    fn suppress(&mut self) {
        self.suppressing = true;
        self.dropped += 1;
    }
}

/// Classifies a single line without any stream state.
#[must_use]
pub fn parse_line(raw: &str) -> ParsedLine {
    if let Some(record) = parse_json_line(raw) {
        return ParsedLine::Record(record);
    }

    let line = sanitize(raw);
    if let Some(record) = parse_plain_line(&line) {
        return ParsedLine::Record(record);
    }
    if let Some(record) = parse_panic_header(&line) {
        return ParsedLine::Record(record);
    }
    ParsedLine::Continuation(line.into_owned())
}

fn parse_json_line(raw: &str) -> Option<LogRecord> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    let mut object: Map<String, Value> = serde_json::from_str(trimmed).ok()?;

    let level_word = object.remove("level").and_then(|v| v.as_str().map(str::to_string))?;
    let message = take_first_string(&mut object, &MESSAGE_KEYS)?;
    let logger = take_first_string(&mut object, &LOGGER_KEYS);
    let timestamp = TIME_KEYS
        .iter()
        .find_map(|key| object.remove(*key))
        .and_then(|time| render_time(&time));

    let mut fields = Map::new();
    if let Some(Value::String(more)) = object.remove("more") {
        fields.extend(parse_more(&more));
    }
    if let Some(Value::Object(with)) = object.remove("with") {
        fields.extend(with);
    }
    fields.extend(object);

    let worker = take_worker(&mut fields).or_else(|| logger.as_deref().and_then(worker_from_logger));
    let fields = match sanitize_value(Value::Object(fields)) {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };

    Some(LogRecord {
        timestamp: timestamp.map(|ts| sanitize(&ts).into_owned()),
        level: Level::parse_lenient(&level_word),
        panic: is_panic_level(&level_word),
        logger: logger.map(|logger| sanitize(&logger).into_owned()),
        worker: worker.map(|worker| sanitize(&worker).into_owned()),
        message: sanitize(&message).into_owned(),
        fields,
    })
}

fn parse_plain_line(line: &str) -> Option<LogRecord> {
    let captures = PLAIN_LINE_REGEX.captures(line)?;
    let level_word = captures.name("level")?.as_str();
    let mut rest = captures.name("rest").map_or("", |m| m.as_str());
    if rest.trim().is_empty() {
        return None;
    }

    let mut fields = Map::new();
    while let Some(kv) = KEY_VALUE_REGEX.captures(rest) {
        let (Some(key), Some(value), Some(whole)) = (kv.name("key"), kv.name("value"), kv.get(0))
        else {
            break;
        };
        fields.insert(key.as_str().to_string(), Value::String(value.as_str().to_string()));
        rest = &rest[whole.end()..];
    }

    Some(LogRecord {
        timestamp: captures.name("ts").map(|ts| ts.as_str().to_string()),
        level: Level::parse_lenient(level_word),
        panic: is_panic_level(level_word),
        logger: None,
        worker: take_worker(&mut fields),
        message: rest.trim_end().to_string(),
        fields,
    })
}

fn parse_panic_header(line: &str) -> Option<LogRecord> {
    let is_header = PANIC_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        || RUST_PANIC_REGEX.is_match(line);
    if !is_header {
        return None;
    }

    Some(LogRecord {
        level: Level::Error,
        panic: true,
        message: line.trim_end().to_string(),
        ..LogRecord::default()
    })
}

fn is_panic_level(word: &str) -> bool {
    word.eq_ignore_ascii_case("panic") || word.eq_ignore_ascii_case("fatal")
}

fn take_first_string(object: &mut Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.remove(*key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
        None => None,
    })
}

fn take_worker(fields: &mut Map<String, Value>) -> Option<String> {
    WORKER_KEYS.iter().find_map(|key| match fields.remove(*key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

fn worker_from_logger(logger: &str) -> Option<String> {
    LOGGER_WORKER_REGEX
        .captures(logger)
        .and_then(|captures| captures.name("id"))
        .map(|id| id.as_str().to_string())
}

/// Splits the `more` string: `k=v || k=v`. Segments without `=` are kept
/// under their own text with an empty value.
fn parse_more(more: &str) -> Map<String, Value> {
    more.split("||")
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), Value::String(value.trim().to_string())),
            None => (segment.to_string(), Value::String(String::new())),
        })
        .collect()
}

/// RFC3339 strings are kept as written; numbers are epoch milliseconds.
fn render_time(time: &Value) -> Option<String> {
    match time {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
                .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rules::{LogRule, RuleAction};
    use tracing_test::traced_test;

    fn record(line: &str) -> LogRecord {
        match parse_line(line) {
            ParsedLine::Record(record) => record,
            ParsedLine::Continuation(text) => panic!("expected a record, got continuation {text:?}"),
        }
    }

    #[test]
    fn test_plain_line_with_worker() {
        let record = record("INFO worker=1 start");
        assert_eq!(record.level, Level::Info);
        assert_eq!(record.worker.as_deref(), Some("1"));
        assert_eq!(record.message, "start");
        assert!(record.fields.is_empty());
        assert!(record.timestamp.is_none());
    }

    #[test]
    fn test_plain_line_with_timestamp_and_fields() {
        let record = record("2025-03-01T10:00:00.123Z WARNING: attempt=2 host=db retrying query");
        assert_eq!(record.timestamp.as_deref(), Some("2025-03-01T10:00:00.123Z"));
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, "retrying query");
        assert_eq!(record.fields["attempt"], "2");
        assert_eq!(record.fields["host"], "db");
    }

    #[test]
    fn test_level_word_must_stand_alone() {
        assert!(matches!(parse_line("INFORMATION follows"), ParsedLine::Continuation(_)));
        assert!(matches!(parse_line("ERROR"), ParsedLine::Continuation(_)));
        assert!(matches!(parse_line("info lowercase"), ParsedLine::Continuation(_)));
    }

    #[test]
    fn test_json_line() {
        let record = record(
            r#"{"level":"debug","time":"2025-03-01T10:00:00Z","name":"processor.http.w2.python.logger","message":"Handling event","more":"path=/ || method=GET","with":{"size":3}}"#,
        );
        assert_eq!(record.level, Level::Debug);
        assert_eq!(record.timestamp.as_deref(), Some("2025-03-01T10:00:00Z"));
        assert_eq!(record.logger.as_deref(), Some("processor.http.w2.python.logger"));
        assert_eq!(record.worker.as_deref(), Some("2"));
        assert_eq!(record.message, "Handling event");
        assert_eq!(
            Value::Object(record.fields),
            serde_json::json!({"method": "GET", "path": "/", "size": 3})
        );
    }

    #[test]
    fn test_json_line_aliases_and_epoch_time() {
        let record =
            record(r#"{"level":"error","ts":1700000000000,"logger":"handler","msg":"failed","workerID":7}"#);
        assert_eq!(record.level, Level::Error);
        assert_eq!(record.timestamp.as_deref(), Some("2023-11-14T22:13:20.000Z"));
        assert_eq!(record.logger.as_deref(), Some("handler"));
        assert_eq!(record.worker.as_deref(), Some("7"));
        assert_eq!(record.message, "failed");
        assert!(record.fields.is_empty());
    }

    #[test]
    fn test_json_without_level_is_continuation() {
        assert!(matches!(
            parse_line(r#"{"message":"no level"}"#),
            ParsedLine::Continuation(_)
        ));
        assert!(matches!(parse_line("{not json"), ParsedLine::Continuation(_)));
    }

    #[test]
    fn test_json_message_is_sanitized() {
        let record = record(r#"{"level":"info","message":"line one\nline two\u001b[31m"}"#);
        assert_eq!(record.message, "line one\\nline two");
    }

    #[test]
    fn test_panic_headers() {
        for line in [
            "panic: runtime error: index out of range [3] with length 3",
            "fatal error: all goroutines are asleep - deadlock!",
            "Traceback (most recent call last):",
            "Exception in thread \"main\" java.lang.NullPointerException",
            "Unhandled exception. System.InvalidOperationException: boom",
            "thread 'main' panicked at src/main.rs:2:5:",
        ] {
            let record = record(line);
            assert!(record.panic, "{line}");
            assert_eq!(record.level, Level::Error);
            assert_eq!(record.message, line);
        }
    }

    #[test]
    fn test_continuations_keep_indentation() {
        assert_eq!(
            parse_line("    at frame1"),
            ParsedLine::Continuation("    at frame1".into())
        );
        assert_eq!(
            parse_line("goroutine 1 [running]:"),
            ParsedLine::Continuation("goroutine 1 [running]:".into())
        );
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let mut parser = LineParser::default();
        assert!(parser.parse("").is_none());
        assert!(parser.parse("   \r\n").is_none());
    }

    fn rule(action: RuleAction, pattern: &str) -> LogRule {
        LogRule {
            name: format!("{action:?} {pattern}"),
            action,
            pattern: pattern.into(),
            placeholder: None,
        }
    }

    #[test]
    #[traced_test]
    fn test_dropped_record_takes_continuations() {
        let mut parser = LineParser::new(RuleSet::compile(&[rule(RuleAction::Drop, "/healthz")]));

        assert!(parser.parse("INFO GET /healthz").is_none());
        assert!(parser.parse("    headers: {}").is_none());
        assert!(parser.parse("INFO GET /orders").is_some());
        assert!(parser.parse("    headers: {}").is_some());
        assert_eq!(parser.dropped_records(), 1);
        assert!(logs_contain("Dropping log record matched by a drop rule"));
    }

    #[test]
    fn test_drop_rule_matches_plain_text_fields() {
        let mut parser = LineParser::new(RuleSet::compile(&[rule(RuleAction::Drop, "^canary$")]));

        assert!(parser.parse("INFO source=canary ping").is_none());
        assert!(parser.parse("INFO source=user ping").is_some());
        assert_eq!(parser.dropped_records(), 1);
    }

    #[test]
    fn test_masking_covers_fields_and_continuations() {
        let mut parser = LineParser::new(RuleSet::compile(&[rule(RuleAction::Mask, "hunter2")]));

        let Some(ParsedLine::Record(plain)) = parser.parse("INFO password=hunter2 login") else {
            panic!("expected a record");
        };
        let Some(ParsedLine::Record(json)) = parser
            .parse(r#"{"level":"info","message":"login","more":"user=ana","with":{"password":"hunter2"}}"#)
        else {
            panic!("expected a record");
        };
        let continuation = parser.parse("    retried with hunter2");

        assert_eq!(plain.fields["password"], "***");
        assert_eq!(json.fields["password"], "***");
        assert_eq!(json.fields["user"], "ana");
        assert_eq!(
            continuation,
            Some(ParsedLine::Continuation("    retried with ***".into()))
        );
        assert_eq!(parser.dropped_records(), 0);
    }
}
