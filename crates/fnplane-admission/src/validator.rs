// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Admission rules for creating and deleting functions.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. **Name**: the function name is a valid identifier
//! 2. **Project**: the function's project exists (registry query)
//! 3. **Replicas**: `0 <= minReplicas <= maxReplicas` and `maxReplicas > 0`
//! 4. **Triggers**: at most one http trigger, no empty trigger names
//!
//! Deletion is checked separately: deleting a missing function is allowed,
//! and a non-empty resource version must match the stored one. That check is
//! the only optimistic-concurrency guard: a stale writer is rejected, never
//! blocked.

use tracing::debug;

use crate::config::PlatformConfig;
use crate::error::{AdmissionError, ValidationError};
use crate::function::{DeleteFunctionOptions, FunctionConfig, FunctionSpec};
use crate::registry::{FunctionFilter, FunctionRegistry, ProjectFilter};

/// Longest accepted function name, the DNS label limit.
pub const MAX_FUNCTION_NAME_LEN: usize = 63;

/// Validates function configurations against the registry.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a, R> {
    config: &'a PlatformConfig,
    registry: &'a R,
}

impl<'a, R: FunctionRegistry> Validator<'a, R> {
    #[must_use]
    pub fn new(config: &'a PlatformConfig, registry: &'a R) -> Self {
        Self { config, registry }
    }

    /// Validates an enriched function configuration for creation.
    pub fn validate_create(&self, function: &FunctionConfig) -> Result<(), AdmissionError> {
        validate_function_name(&function.meta.name)?;
        self.validate_project_exists(function)?;
        validate_replicas(&function.spec)?;
        validate_triggers(&function.spec)?;

        debug!(function = %function.meta.name, "Function passed create validation");
        Ok(())
    }

    /// Validates a delete request against the stored function, if any.
    pub fn validate_delete(&self, options: &DeleteFunctionOptions) -> Result<(), AdmissionError> {
        let filter = FunctionFilter {
            name: options.meta.name.clone(),
            namespace: options.meta.namespace.clone(),
        };
        let existing = self
            .registry
            .list_functions(&filter)
            .map_err(|source| AdmissionError::Registry {
                query: "functions",
                source,
            })?;

        let Some(stored) = existing.first() else {
            debug!(function = %filter.name, "Function does not exist, nothing to delete");
            return Ok(());
        };

        let requested = &options.meta.resource_version;
        if !requested.is_empty() && *requested != stored.meta.resource_version {
            return Err(ValidationError::ResourceVersionConflict {
                name: filter.name,
                requested: requested.clone(),
                stored: stored.meta.resource_version.clone(),
            }
            .into());
        }

        Ok(())
    }

    fn validate_project_exists(&self, function: &FunctionConfig) -> Result<(), AdmissionError> {
        let project = function
            .project_name(&self.config.project_name_label)
            .unwrap_or(&self.config.default_project_name);
        let namespace = if function.meta.namespace.is_empty() {
            &self.config.default_namespace
        } else {
            &function.meta.namespace
        };

        let filter = ProjectFilter {
            name: project.to_string(),
            namespace: namespace.clone(),
        };
        let projects = self
            .registry
            .list_projects(&filter)
            .map_err(|source| AdmissionError::Registry {
                query: "projects",
                source,
            })?;

        if projects.is_empty() {
            return Err(ValidationError::ProjectNotFound {
                project: filter.name,
                namespace: filter.namespace,
            }
            .into());
        }
        Ok(())
    }
}

/// Names are DNS-label-like: alphanumerics plus `-`, `_` and `.`, starting
/// and ending with an alphanumeric.
pub fn validate_function_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidFunctionName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.len() > MAX_FUNCTION_NAME_LEN {
        return Err(invalid("name must be at most 63 characters"));
    }
    if let Some(ch) = name
        .chars()
        .find(|&ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '-' | '_' | '.'))
    {
        return Err(invalid(&format!("invalid character '{ch}'")));
    }

    let alphanumeric_edge = |ch: Option<char>| ch.is_some_and(|ch| ch.is_ascii_alphanumeric());
    if !alphanumeric_edge(name.chars().next()) || !alphanumeric_edge(name.chars().last()) {
        return Err(invalid("name must start and end with an alphanumeric character"));
    }
    Ok(())
}

/// Checks replica bounds as they stand after derivation: an unset bound takes
/// the value of the other one, exactly as enrichment would set it.
pub fn validate_replicas(spec: &FunctionSpec) -> Result<(), ValidationError> {
    let min = spec.min_replicas.or(spec.max_replicas);
    let max = spec.max_replicas.or(spec.min_replicas);
    let invalid = |field, reason| ValidationError::InvalidReplicas {
        field,
        reason,
        min_replicas: spec.min_replicas,
        max_replicas: spec.max_replicas,
    };

    if min.is_some_and(|min| min < 0) {
        return Err(invalid("minReplicas", "must not be negative"));
    }
    if max.is_some_and(|max| max < 0) {
        return Err(invalid("maxReplicas", "must not be negative"));
    }
    if max == Some(0) {
        return Err(invalid("maxReplicas", "must be greater than zero"));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(invalid("minReplicas", "must not exceed maxReplicas"));
        }
    }
    Ok(())
}

pub fn validate_triggers(spec: &FunctionSpec) -> Result<(), ValidationError> {
    let http_triggers: Vec<String> = spec
        .triggers
        .iter()
        .filter(|(_, trigger)| trigger.is_http())
        .map(|(key, _)| key.clone())
        .collect();
    if http_triggers.len() > 1 {
        return Err(ValidationError::MultipleHttpTriggers {
            count: http_triggers.len(),
            triggers: http_triggers,
        });
    }

    if let Some(trigger) = spec.triggers.values().find(|trigger| trigger.name.is_empty()) {
        return Err(ValidationError::EmptyTriggerName {
            kind: trigger.kind.clone(),
        });
    }
    Ok(())
}
