// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Operator-defined rules for redacting and filtering function logs.
//!
//! Rules see the whole record: its message, every string inside its
//! structured fields, and its continuation lines.
//!
//! - `mask` rules run first and rewrite every match to the rule's placeholder
//! - `drop` rules remove a record, and its continuation lines, when any of
//!   its text matches
//! - `keep` rules, when present, remove every record none of them matches
//!
//! Removed records are counted and reported in
//! [`ProcessedLogs::dropped_records`](crate::formatter::ProcessedLogs), so a
//! filtered transcript never looks complete when it is not.
//!
//! ```text
//! FNPLANE_LOGS_RULES='[{"name":"tokens","action":"mask","pattern":"Bearer \\S+","placeholder":"Bearer ***"}]'
//! ```

use std::borrow::Cow;

use regex::Regex;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::record::LogRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Mask,
    Drop,
    Keep,
}

/// A rule as configured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRule {
    pub name: String,
    pub action: RuleAction,
    pub pattern: String,
    /// Replacement text for `mask` rules; `***` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

const DEFAULT_PLACEHOLDER: &str = "***";

/// Reads rules from a JSON array or from a string holding one, as
/// environment variables do. Malformed entries are logged and skipped.
pub fn deserialize_rules<'de, D>(deserializer: D) -> Result<Vec<LogRule>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Encoded {
        Entries(Vec<Value>),
        Text(String),
        Other(IgnoredAny),
    }

    let entries = match Encoded::deserialize(deserializer)? {
        Encoded::Entries(entries) => entries,
        Encoded::Text(text) => match serde_json::from_str::<Vec<Value>>(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring log rules, expected a JSON array: {}", e);
                return Ok(Vec::new());
            }
        },
        Encoded::Other(IgnoredAny) => {
            warn!("Ignoring log rules, expected a JSON array");
            return Ok(Vec::new());
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Ignoring log rule #{}: {}", idx, e);
                None
            }
        })
        .collect())
}

#[derive(Clone, Debug)]
struct Mask {
    regex: Regex,
    placeholder: String,
}

#[derive(Clone, Debug)]
struct Filter {
    name: String,
    regex: Regex,
}

/// What [`RuleSet::review`] decided for a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict<'a> {
    Admit,
    /// A `drop` rule matched.
    Dropped { rule: &'a str },
    /// `keep` rules exist and none matched.
    NotKept,
}

/// Compiled rules, grouped by action.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    masks: Vec<Mask>,
    drops: Vec<Filter>,
    keeps: Vec<Filter>,
}

impl RuleSet {
    /// Compiles `rules`, skipping those whose pattern is not a valid regex.
    #[must_use]
    pub fn compile(rules: &[LogRule]) -> Self {
        let mut set = Self::default();
        for rule in rules {
            let regex = match Regex::new(&rule.pattern) {
                Ok(regex) => regex,
                Err(e) => {
                    warn!(rule = %rule.name, "Skipping log rule with invalid pattern: {}", e);
                    continue;
                }
            };
            match rule.action {
                RuleAction::Mask => set.masks.push(Mask {
                    regex,
                    placeholder: rule
                        .placeholder
                        .clone()
                        .unwrap_or_else(|| DEFAULT_PLACEHOLDER.to_string()),
                }),
                RuleAction::Drop => set.drops.push(Filter {
                    name: rule.name.clone(),
                    regex,
                }),
                RuleAction::Keep => set.keeps.push(Filter {
                    name: rule.name.clone(),
                    regex,
                }),
            }
        }
        set
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty() && self.drops.is_empty() && self.keeps.is_empty()
    }

    /// Masks `record` in place, then decides whether it stays.
    pub fn review(&self, record: &mut LogRecord) -> Verdict<'_> {
        if self.is_empty() {
            return Verdict::Admit;
        }

        self.mask_in_place(&mut record.message);
        for value in record.fields.values_mut() {
            self.mask_value(value);
        }

        let mut texts = vec![record.message.as_str()];
        for value in record.fields.values() {
            collect_strings(value, &mut texts);
        }
        let matches = |filter: &&Filter| texts.iter().any(|text| filter.regex.is_match(text));

        if let Some(filter) = self.drops.iter().find(matches) {
            return Verdict::Dropped { rule: &filter.name };
        }
        if !self.keeps.is_empty() && !self.keeps.iter().any(|filter| matches(&filter)) {
            return Verdict::NotKept;
        }
        Verdict::Admit
    }

    /// Applies every mask rule to `text`, in configuration order.
    #[must_use]
    pub fn mask<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let mut text = Cow::Borrowed(text);
        for mask in &self.masks {
            let masked = match mask.regex.replace_all(&text, mask.placeholder.as_str()) {
                Cow::Owned(masked) => Some(masked),
                Cow::Borrowed(_) => None,
            };
            if let Some(masked) = masked {
                text = Cow::Owned(masked);
            }
        }
        text
    }

    /// Applies every mask rule to `text`, rewriting it only on a match.
    pub fn mask_in_place(&self, text: &mut String) {
        let masked = match self.mask(text) {
            Cow::Owned(masked) => Some(masked),
            Cow::Borrowed(_) => None,
        };
        if let Some(masked) = masked {
            *text = masked;
        }
    }

    fn mask_value(&self, value: &mut Value) {
        match value {
            Value::String(s) => self.mask_in_place(s),
            Value::Array(values) => values.iter_mut().for_each(|v| self.mask_value(v)),
            Value::Object(map) => map.values_mut().for_each(|v| self.mask_value(v)),
            _ => {}
        }
    }
}

fn collect_strings<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(values) => values.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}
