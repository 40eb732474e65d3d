// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Defaulting pass run on a function configuration before validation.
//!
//! Enrichment never fails. It fills in what the submitter left out and leaves
//! anything contradictory for the validator to reject.

use tracing::debug;

use crate::config::PlatformConfig;
use crate::function::{FunctionConfig, FunctionMeta, FunctionSpec, Trigger};

/// Enriches metadata and spec in place.
pub fn enrich_function_config(function: &mut FunctionConfig, config: &PlatformConfig) {
    enrich_meta(&mut function.meta, config);
    enrich_function_spec(&mut function.spec, config);
}

/// Enriches the spec in place: replica bounds first, then triggers.
pub fn enrich_function_spec(spec: &mut FunctionSpec, config: &PlatformConfig) {
    enrich_replicas(spec);
    enrich_triggers(spec, config);
}

fn enrich_meta(meta: &mut FunctionMeta, config: &PlatformConfig) {
    if meta.namespace.is_empty() {
        meta.namespace.clone_from(&config.default_namespace);
    }

    let project = meta
        .labels
        .entry(config.project_name_label.clone())
        .or_default();
    if project.is_empty() {
        debug!(
            function = %meta.name,
            project = %config.default_project_name,
            "Assigning function to default project"
        );
        project.clone_from(&config.default_project_name);
    }
}

/// A single declared bound pins the other one to the same value.
fn enrich_replicas(spec: &mut FunctionSpec) {
    match (spec.min_replicas, spec.max_replicas) {
        (Some(min), None) => spec.max_replicas = Some(min),
        (None, Some(max)) => spec.min_replicas = Some(max),
        _ => {}
    }
}

fn enrich_triggers(spec: &mut FunctionSpec, config: &PlatformConfig) {
    for (key, trigger) in &mut spec.triggers {
        if trigger.name.is_empty() {
            trigger.name.clone_from(key);
        }
        if trigger.max_workers == 0 {
            trigger.max_workers = config.default_trigger_max_workers;
        }
    }

    if spec.triggers.is_empty() {
        let trigger = Trigger::default_http(
            &config.default_http_trigger_name,
            config.default_trigger_max_workers,
        );
        debug!(trigger = %trigger.name, "Injecting default http trigger");
        spec.triggers.insert(trigger.name.clone(), trigger);
    }
}
