// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

/// Boxed error returned by registry collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A function configuration violates an admission rule.
///
/// Validation failures are terminal for the request they belong to; the
/// caller decides whether to retry with a corrected configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid function name '{name}': {reason}")]
    InvalidFunctionName { name: String, reason: String },

    #[error("Project '{project}' not found in namespace '{namespace}'")]
    ProjectNotFound { project: String, namespace: String },

    #[error("Invalid replicas: {field} {reason} (minReplicas: {}, maxReplicas: {})", display_bound(.min_replicas), display_bound(.max_replicas))]
    InvalidReplicas {
        field: &'static str,
        reason: &'static str,
        min_replicas: Option<i32>,
        max_replicas: Option<i32>,
    },

    #[error("Function may have at most one http trigger, found {count}: {}", .triggers.join(", "))]
    MultipleHttpTriggers { count: usize, triggers: Vec<String> },

    #[error("Trigger name must not be empty (trigger kind: {kind})")]
    EmptyTriggerName { kind: String },

    #[error("Resource version conflict for function '{name}': requested {requested}, stored {stored}")]
    ResourceVersionConflict {
        name: String,
        requested: String,
        stored: String,
    },
}

fn display_bound(bound: &Option<i32>) -> String {
    bound.map_or_else(|| "unset".to_string(), |value| value.to_string())
}

/// Fieldless discriminant of [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    InvalidFunctionName,
    ProjectNotFound,
    InvalidReplicas,
    MultipleHttpTriggers,
    EmptyTriggerName,
    ResourceVersionConflict,
}

impl ValidationError {
    #[must_use]
    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            Self::InvalidFunctionName { .. } => ValidationErrorKind::InvalidFunctionName,
            Self::ProjectNotFound { .. } => ValidationErrorKind::ProjectNotFound,
            Self::InvalidReplicas { .. } => ValidationErrorKind::InvalidReplicas,
            Self::MultipleHttpTriggers { .. } => ValidationErrorKind::MultipleHttpTriggers,
            Self::EmptyTriggerName { .. } => ValidationErrorKind::EmptyTriggerName,
            Self::ResourceVersionConflict { .. } => ValidationErrorKind::ResourceVersionConflict,
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidFunctionName => "InvalidFunctionName",
            Self::ProjectNotFound => "ProjectNotFound",
            Self::InvalidReplicas => "InvalidReplicas",
            Self::MultipleHttpTriggers => "MultipleHTTPTriggers",
            Self::EmptyTriggerName => "EmptyTriggerName",
            Self::ResourceVersionConflict => "ResourceVersionConflict",
        };
        f.write_str(name)
    }
}

/// Errors returned by admission operations.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The registry collaborator failed to answer a query. Distinct from a
    /// validation failure: the configuration itself may be fine.
    #[error("Failed to query {query}: {source}")]
    Registry {
        query: &'static str,
        #[source]
        source: BoxError,
    },
}

impl AdmissionError {
    /// The validation failure, if this is one.
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Registry { .. } => None,
        }
    }

    #[must_use]
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        self.as_validation().map(ValidationError::kind)
    }
}

/// Errors raised while loading [`crate::config::PlatformConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
