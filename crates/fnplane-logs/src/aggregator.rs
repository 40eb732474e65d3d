// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Groups parsed lines into blocks and collapses consecutive duplicates.
//!
//! The aggregator is a single forward pass holding at most two blocks:
//!
//! - `current`: the block still accepting continuation lines
//! - `pending`: the last completed block, held back until we know whether
//!   the next completed block repeats it
//!
//! Records are never reordered; interleaved output from several workers stays
//! in arrival order and keeps its worker attribution.

use crate::record::{Level, LogRecord, ParsedLine};

/// One logical log entry.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedBlock {
    pub record: LogRecord,
    /// Lines attached to the record, e.g. stack frames
    pub continuations: Vec<String>,
    /// Number of consecutive identical entries collapsed into this one
    pub repeat_count: usize,
}

impl AggregatedBlock {
    #[must_use]
    pub fn new(record: LogRecord) -> Self {
        Self {
            record,
            continuations: Vec::new(),
            repeat_count: 1,
        }
    }

    /// Continuation text with no record to attach to, e.g. the tail of a
    /// stack trace whose header was cut off.
    fn orphan(line: String) -> Self {
        Self::new(LogRecord {
            level: Level::Unknown,
            message: line,
            ..LogRecord::default()
        })
    }

    fn repeats(&self, other: &AggregatedBlock) -> bool {
        self.record.same_entry(&other.record) && self.continuations == other.continuations
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    current: Option<AggregatedBlock>,
    pending: Option<AggregatedBlock>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one parsed line. Returns a block once it can no longer change.
    pub fn push(&mut self, line: ParsedLine) -> Option<AggregatedBlock> {
        match line {
            ParsedLine::Record(record) => {
                let completed = self.current.replace(AggregatedBlock::new(record));
                completed.and_then(|block| self.settle(block))
            }
            ParsedLine::Continuation(text) => {
                match self.current.as_mut() {
                    Some(block) => block.continuations.push(text),
                    None => self.current = Some(AggregatedBlock::orphan(text)),
                }
                None
            }
        }
    }

    /// Flushes the remaining blocks at end of stream.
    #[must_use]
    pub fn finish(mut self) -> Vec<AggregatedBlock> {
        let mut blocks = Vec::with_capacity(2);
        if let Some(block) = self.current.take() {
            blocks.extend(self.settle(block));
        }
        blocks.extend(self.pending.take());
        blocks
    }

    /// Collapses `completed` into the pending block or makes it the new
    /// pending block, releasing the old one.
    fn settle(&mut self, completed: AggregatedBlock) -> Option<AggregatedBlock> {
        match self.pending.as_mut() {
            Some(pending) if pending.repeats(&completed) => {
                pending.repeat_count += completed.repeat_count;
                None
            }
            _ => self.pending.replace(completed),
        }
    }
}

/// Aggregates a complete sequence of parsed lines.
pub fn aggregate<I>(lines: I) -> Vec<AggregatedBlock>
where
    I: IntoIterator<Item = ParsedLine>,
{
    let mut aggregator = Aggregator::new();
    let mut blocks: Vec<AggregatedBlock> =
        lines.into_iter().filter_map(|line| aggregator.push(line)).collect();
    blocks.extend(aggregator.finish());
    blocks
}
