// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Function configuration model.
//!
//! A [`FunctionConfig`] is the declarative description of a function as it is
//! submitted for admission: identifying metadata ([`FunctionMeta`]) plus the
//! desired runtime shape ([`FunctionSpec`]). These values are owned by the
//! caller and live only for the duration of one admission request.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trigger kind served by the platform's HTTP ingress.
pub const HTTP_TRIGGER_KIND: &str = "http";

/// Identifying metadata of a function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionMeta {
    /// Unique within the namespace.
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Opaque version token. Empty means the function was never stored.
    #[serde(default)]
    pub resource_version: String,
}

/// Desired runtime shape of a function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    /// `None` means "platform default", which is not the same as zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replicas: Option<i32>,
    /// Keyed by trigger name. Ordered so that enrichment and validation walk
    /// triggers deterministically.
    #[serde(default)]
    pub triggers: BTreeMap<String, Trigger>,
}

/// An event source bound to a function.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub kind: String,
    /// Derived from the trigger's map key during enrichment when empty.
    #[serde(default)]
    pub name: String,
    /// Zero means unset; enrichment replaces it with the platform default.
    #[serde(default)]
    pub max_workers: u32,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl Trigger {
    #[must_use]
    pub fn is_http(&self) -> bool {
        self.kind == HTTP_TRIGGER_KIND
    }

    /// The trigger injected when a function declares none.
    #[must_use]
    pub fn default_http(name: &str, max_workers: u32) -> Self {
        Self {
            kind: HTTP_TRIGGER_KIND.to_string(),
            name: name.to_string(),
            max_workers,
            attributes: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub meta: FunctionMeta,
    #[serde(default)]
    pub spec: FunctionSpec,
}

impl FunctionConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: FunctionMeta {
                name: name.into(),
                ..FunctionMeta::default()
            },
            spec: FunctionSpec::default(),
        }
    }

    /// Project the function claims to belong to, read from `label`.
    #[must_use]
    pub fn project_name(&self, label: &str) -> Option<&str> {
        self.meta
            .labels
            .get(label)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn http_triggers(&self) -> impl Iterator<Item = (&String, &Trigger)> {
        self.spec
            .triggers
            .iter()
            .filter(|(_, trigger)| trigger.is_http())
    }
}

/// A project groups functions; a function may only be created inside an
/// existing one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub namespace: String,
}

/// Request to delete a stored function.
///
/// An empty `resource_version` requests an unconditional delete.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteFunctionOptions {
    pub meta: FunctionMeta,
}

impl DeleteFunctionOptions {
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            meta: FunctionMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..FunctionMeta::default()
            },
        }
    }

    #[must_use]
    pub fn with_resource_version(mut self, resource_version: impl Into<String>) -> Self {
        self.meta.resource_version = resource_version.into();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_function_config() {
        let config: FunctionConfig = serde_json::from_str(
            r#"{
                "meta": {"name": "echo", "labels": {"fnplane.io/project-name": "demo"}},
                "spec": {
                    "maxReplicas": 3,
                    "triggers": {"web": {"kind": "http", "attributes": {"port": 8080}}}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.meta.name, "echo");
        assert!(config.meta.namespace.is_empty());
        assert_eq!(config.spec.min_replicas, None);
        assert_eq!(config.spec.max_replicas, Some(3));
        let web = &config.spec.triggers["web"];
        assert!(web.is_http());
        assert!(web.name.is_empty());
        assert_eq!(web.max_workers, 0);
        assert_eq!(web.attributes["port"], 8080);
    }

    #[test]
    fn test_project_name_ignores_empty_label() {
        let mut config = FunctionConfig::new("f");
        assert_eq!(config.project_name("project"), None);

        config.meta.labels.insert("project".into(), String::new());
        assert_eq!(config.project_name("project"), None);

        config.meta.labels.insert("project".into(), "demo".into());
        assert_eq!(config.project_name("project"), Some("demo"));
    }

    #[test]
    fn test_http_triggers() {
        let mut config = FunctionConfig::new("f");
        config.spec.triggers.insert(
            "cron".into(),
            Trigger {
                kind: "cron".into(),
                ..Trigger::default()
            },
        );
        config
            .spec
            .triggers
            .insert("web".into(), Trigger::default_http("web", 1));

        let names: Vec<_> = config.http_triggers().map(|(key, _)| key.as_str()).collect();
        assert_eq!(names, vec!["web"]);
    }

    #[test]
    fn test_delete_options_builder() {
        let options = DeleteFunctionOptions::new("f", "ns").with_resource_version("7");
        assert_eq!(options.meta.name, "f");
        assert_eq!(options.meta.namespace, "ns");
        assert_eq!(options.meta.resource_version, "7");
    }
}
