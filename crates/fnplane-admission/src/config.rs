// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Platform defaults used during enrichment and validation.
//!
//! Values are taken from the built-in defaults and overridden by environment
//! variables prefixed with `FNPLANE_`, e.g. `FNPLANE_DEFAULT_NAMESPACE=prod`.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_PREFIX: &str = "FNPLANE_";

/// Configuration for function admission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Namespace assigned to functions submitted without one
    pub default_namespace: String,
    /// Project assigned to functions submitted without a project label
    pub default_project_name: String,
    /// Label holding the name of the project a function belongs to
    pub project_name_label: String,
    /// Name (and map key) of the injected HTTP trigger
    pub default_http_trigger_name: String,
    /// Worker count given to triggers that do not declare one
    pub default_trigger_max_workers: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            default_namespace: "default".to_string(),
            default_project_name: "default".to_string(),
            project_name_label: "fnplane.io/project-name".to_string(),
            default_http_trigger_name: "default-http".to_string(),
            default_trigger_max_workers: 1,
        }
    }
}

impl PlatformConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("default_namespace", &self.default_namespace),
            ("default_project_name", &self.default_project_name),
            ("project_name_label", &self.project_name_label),
            ("default_http_trigger_name", &self.default_http_trigger_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} cannot be empty")));
            }
        }

        if self.default_trigger_max_workers == 0 {
            return Err(ConfigError::Invalid(
                "default_trigger_max_workers must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PlatformConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_strings() {
        let config = PlatformConfig {
            default_namespace: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PlatformConfig {
            project_name_label: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_workers() {
        let config = PlatformConfig {
            default_trigger_max_workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let config = PlatformConfig::from_env().unwrap();
            assert_eq!(config, PlatformConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_from_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("FNPLANE_DEFAULT_NAMESPACE", "prod");
            jail.set_env("FNPLANE_DEFAULT_HTTP_TRIGGER_NAME", "ingress");
            jail.set_env("FNPLANE_DEFAULT_TRIGGER_MAX_WORKERS", "4");

            let config = PlatformConfig::from_env().unwrap();
            assert_eq!(config.default_namespace, "prod");
            assert_eq!(config.default_http_trigger_name, "ingress");
            assert_eq!(config.default_trigger_max_workers, 4);
            assert_eq!(config.default_project_name, "default");
            Ok(())
        });
    }

    #[test]
    fn test_from_env_ignores_unrelated_variables() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("FNPLANE_LOG_LEVEL", "verbose");

            let config = PlatformConfig::from_env().unwrap();
            assert_eq!(config, PlatformConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_from_env_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("FNPLANE_DEFAULT_TRIGGER_MAX_WORKERS", "0");
            assert!(matches!(
                PlatformConfig::from_env(),
                Err(ConfigError::Invalid(_))
            ));

            jail.set_env("FNPLANE_DEFAULT_TRIGGER_MAX_WORKERS", "many");
            assert!(matches!(
                PlatformConfig::from_env(),
                Err(ConfigError::Load(_))
            ));
            Ok(())
        });
    }
}
