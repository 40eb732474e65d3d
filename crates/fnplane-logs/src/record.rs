// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Structured form of a single function log line.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// Severity of a parsed log record.
///
/// Runtimes disagree on level names, so parsing folds them into five buckets:
/// `trace` reads as `Debug`, `fatal`, `critical` and `panic` read as `Error`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// The line carried no level, or one we do not recognize.
    #[default]
    Unknown,
}

impl Level {
    /// Upper-case level word used in the transcript; `None` for `Unknown`.
    #[must_use]
    pub fn label(self) -> Option<&'static str> {
        match self {
            Level::Debug => Some("DEBUG"),
            Level::Info => Some("INFO"),
            Level::Warn => Some("WARN"),
            Level::Error => Some("ERROR"),
            Level::Unknown => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label().unwrap_or("UNKNOWN"))
    }
}

/// Parses level words case-insensitively. Never fails: unrecognized words
/// map to [`Level::Unknown`].
impl FromStr for Level {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "dbug" => Level::Debug,
            "info" | "information" | "notice" => Level::Info,
            "warn" | "warning" => Level::Warn,
            "error" | "err" | "fatal" | "critical" | "crit" | "panic" => Level::Error,
            _ => Level::Unknown,
        })
    }
}

impl Level {
    /// Shorthand for the infallible [`FromStr`] impl.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

/// One primary log entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    /// RFC3339 timestamp, when the line carried one
    pub timestamp: Option<String>,
    pub level: Level,
    /// Logger name, e.g. `processor.http.w0.python.logger`
    pub logger: Option<String>,
    /// Id of the worker that emitted the line
    pub worker: Option<String>,
    pub message: String,
    /// Structured fields; `serde_json::Map` keeps keys sorted
    pub fields: Map<String, Value>,
    /// Set for runtime panic / uncaught exception headers
    pub panic: bool,
}

impl LogRecord {
    /// Whether the record belongs in the brief error message.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.panic || self.level == Level::Error
    }

    /// Logger name if present, otherwise `worker=<id>`.
    #[must_use]
    pub fn origin(&self) -> Option<String> {
        match (&self.logger, &self.worker) {
            (Some(logger), _) => Some(logger.clone()),
            (None, Some(worker)) => Some(format!("worker={worker}")),
            (None, None) => None,
        }
    }

    /// Equality used for duplicate collapse: timestamps are ignored.
    #[must_use]
    pub fn same_entry(&self, other: &LogRecord) -> bool {
        self.level == other.level
            && self.panic == other.panic
            && self.origin() == other.origin()
            && self.message == other.message
            && self.fields == other.fields
    }
}

/// Outcome of parsing one raw line.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedLine {
    Record(LogRecord),
    /// Text attached to the preceding record, e.g. a stack frame.
    Continuation(String),
}
