// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Renders aggregated blocks into the transcript and the brief error message.
//!
//! Transcript line for a block:
//!
//! ```text
//! [timestamp] [LEVEL] [origin] [message] [{"sorted":"fields"}][ (xN)]
//!     continuation
//! ```
//!
//! The brief error message lists, for every error or panic block, its message
//! followed by an excerpt of its continuation lines: the first and last few
//! lines with a marker counting the ones left out.
//!
//! A message that already ends in ` (xN)` is written as ` \(xN)` so it cannot
//! be mistaken for a collapsed repeat.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::aggregator::AggregatedBlock;
use crate::config::LogsConfig;

const CONTINUATION_INDENT: &str = "    ";

lazy_static! {
    static ref REPEAT_MARKER_REGEX: Regex =
        Regex::new(r" \((x\d+)\)$").expect("failed creating regex");
}

/// Transcript and brief error message of one log stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessedLogs {
    pub formatted_logs: String,
    pub brief_error: String,
    /// Records removed by drop or keep rules before aggregation.
    pub dropped_records: usize,
}

/// Accumulates rendered output one block at a time.
#[derive(Debug)]
pub struct Formatter {
    head: usize,
    tail: usize,
    transcript: Vec<String>,
    brief: Vec<String>,
}

impl Formatter {
    #[must_use]
    pub fn new(config: &LogsConfig) -> Self {
        Self {
            head: config.stack_head_lines,
            tail: config.stack_tail_lines,
            transcript: Vec::new(),
            brief: Vec::new(),
        }
    }

    pub fn push(&mut self, block: &AggregatedBlock) {
        let continuations: Vec<String> = block
            .continuations
            .iter()
            .map(|line| render_continuation(line))
            .collect();

        self.transcript.push(render_block_line(block));
        self.transcript.extend(continuations.iter().cloned());

        if block.record.is_error() {
            self.brief.push(block.record.message.clone());
            self.brief.extend(excerpt(continuations, self.head, self.tail));
        }
    }

    #[must_use]
    pub fn finish(self) -> ProcessedLogs {
        ProcessedLogs {
            formatted_logs: self.transcript.join("\n"),
            brief_error: self.brief.join("\n"),
            dropped_records: 0,
        }
    }
}

/// Primary line of a block, without its continuations.
#[must_use]
pub fn render_block_line(block: &AggregatedBlock) -> String {
    let record = &block.record;
    let mut parts: Vec<String> = Vec::with_capacity(5);

    if let Some(timestamp) = &record.timestamp {
        parts.push(timestamp.clone());
    }
    if let Some(label) = record.level.label() {
        parts.push(label.to_string());
    }
    if let Some(origin) = record.origin() {
        parts.push(origin);
    }
    if !record.message.is_empty() {
        parts.push(escape_repeat_marker(&record.message).into_owned());
    }
    if !record.fields.is_empty() {
        parts.push(Value::Object(record.fields.clone()).to_string());
    }

    let mut line = parts.join(" ");
    if block.repeat_count > 1 {
        line.push_str(&format!(" (x{})", block.repeat_count));
    }
    line
}

fn escape_repeat_marker(message: &str) -> Cow<'_, str> {
    REPEAT_MARKER_REGEX.replace(message, r" \(${1})")
}

fn render_continuation(line: &str) -> String {
    if line.starts_with(char::is_whitespace) {
        line.to_string()
    } else {
        format!("{CONTINUATION_INDENT}{line}")
    }
}

/// Keeps the first `head` and last `tail` lines, replacing the rest with a
/// `... N more lines` marker.
fn excerpt(lines: Vec<String>, head: usize, tail: usize) -> Vec<String> {
    if lines.len() <= head.saturating_add(tail) {
        return lines;
    }

    let omitted = lines.len() - head - tail;
    let mut kept = Vec::with_capacity(head + tail + 1);
    kept.extend_from_slice(&lines[..head]);
    kept.push(format!("{CONTINUATION_INDENT}... {omitted} more lines"));
    kept.extend_from_slice(&lines[lines.len() - tail..]);
    kept
}
