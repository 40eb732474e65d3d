// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;

/// Failure reading the raw log source.
///
/// Malformed log content never produces an error: unparseable lines are kept
/// as continuation text.
#[derive(Debug, thiserror::Error)]
pub enum LogsError {
    #[error("Failed to read log line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load logs configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid logs configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display() {
        let err = LogsError::Read {
            line: 3,
            source: io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"),
        };
        assert_eq!(err.to_string(), "Failed to read log line 3: stream closed");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("stack excerpt must keep at least one line".into());
        assert_eq!(
            err.to_string(),
            "Invalid logs configuration: stack excerpt must keep at least one line"
        );
    }
}
