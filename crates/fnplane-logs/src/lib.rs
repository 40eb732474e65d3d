// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Function logs
//!
//! Distills the raw log stream of a function processor into a readable
//! transcript and a brief error message for operators.
//!
//! ```text
//!   raw lines ──> LineParser ──> Aggregator ──> Formatter ──> ProcessedLogs
//!                (records and    (blocks, dup    (transcript,
//!                 continuations)  collapse)       brief error)
//! ```
//!
//! The pipeline is one forward pass over the input. Memory is bounded by the
//! block currently being built plus the rendered output, so arbitrarily long
//! streams can be fed from a reader.
//!
//! Malformed input never fails: lines that match no known shape are kept as
//! continuation text of the previous entry.

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]

use std::io::BufRead;

use tracing::debug;

pub mod aggregator;
pub mod config;
pub mod error;
pub mod formatter;
pub mod parser;
pub mod record;
pub mod rules;
pub mod sanitize;

pub use aggregator::{AggregatedBlock, Aggregator};
pub use config::LogsConfig;
pub use error::{ConfigError, LogsError};
pub use formatter::{Formatter, ProcessedLogs};
pub use parser::LineParser;
pub use record::{Level, LogRecord, ParsedLine};
pub use rules::{LogRule, RuleAction, RuleSet};

/// Drives lines through parser, aggregator and formatter.
struct Pipeline {
    parser: LineParser,
    aggregator: Aggregator,
    formatter: Formatter,
}

impl Pipeline {
    fn new(config: &LogsConfig) -> Self {
        Self {
            parser: LineParser::new(RuleSet::compile(&config.rules)),
            aggregator: Aggregator::new(),
            formatter: Formatter::new(config),
        }
    }

    fn feed(&mut self, raw: &str) {
        let Some(parsed) = self.parser.parse(raw) else {
            return;
        };
        if let Some(block) = self.aggregator.push(parsed) {
            self.formatter.push(&block);
        }
    }

    fn finish(self) -> ProcessedLogs {
        let mut formatter = self.formatter;
        for block in self.aggregator.finish() {
            formatter.push(&block);
        }
        ProcessedLogs {
            dropped_records: self.parser.dropped_records(),
            ..formatter.finish()
        }
    }
}

/// Processes a complete sequence of log lines.
pub fn process_logs<I, S>(lines: I, config: &LogsConfig) -> ProcessedLogs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pipeline = Pipeline::new(config);
    for line in lines {
        pipeline.feed(line.as_ref());
    }
    pipeline.finish()
}

/// Processes a log stream read line by line.
///
/// Invalid UTF-8 is replaced rather than rejected; only a failing reader
/// aborts processing.
pub fn process_reader<R: BufRead>(
    mut reader: R,
    config: &LogsConfig,
) -> Result<ProcessedLogs, LogsError> {
    let mut pipeline = Pipeline::new(config);
    let mut buf = Vec::new();
    let mut line_number = 0;

    loop {
        buf.clear();
        line_number += 1;
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| LogsError::Read {
                line: line_number,
                source,
            })?;
        if read == 0 {
            break;
        }
        pipeline.feed(&String::from_utf8_lossy(&buf));
    }

    debug!(lines = line_number - 1, "Processed function logs");
    Ok(pipeline.finish())
}
