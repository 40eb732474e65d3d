// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log engine configuration.
//!
//! Defaults are overridden by environment variables prefixed with
//! `FNPLANE_LOGS_`, e.g. `FNPLANE_LOGS_STACK_HEAD_LINES=10`.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rules::{deserialize_rules, LogRule};

pub const ENV_PREFIX: &str = "FNPLANE_LOGS_";

pub const DEFAULT_STACK_HEAD_LINES: usize = 5;
pub const DEFAULT_STACK_TAIL_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Leading call-stack lines kept in the brief error message
    pub stack_head_lines: usize,
    /// Trailing call-stack lines kept in the brief error message
    pub stack_tail_lines: usize,
    /// Masking and filtering rules applied to every record
    #[serde(deserialize_with = "deserialize_rules", skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<LogRule>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            stack_head_lines: DEFAULT_STACK_HEAD_LINES,
            stack_tail_lines: DEFAULT_STACK_TAIL_LINES,
            rules: Vec::new(),
        }
    }
}

impl LogsConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stack_head_lines == 0 && self.stack_tail_lines == 0 {
            return Err(ConfigError::Invalid(
                "stack_head_lines and stack_tail_lines cannot both be 0".to_string(),
            ));
        }
        Ok(())
    }
}
