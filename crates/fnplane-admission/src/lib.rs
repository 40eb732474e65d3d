// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # Function admission
//!
//! Decides whether a function configuration may enter the cluster.
//!
//! Admission is a two step pass run once per request:
//!
//! ```text
//!   FunctionConfig ──> enrich (defaults) ──> validate (rules + registry) ──> ok | error
//! ```
//!
//! - [`enricher`]: fills in namespace, project, replica bounds and triggers
//! - [`validator`]: rejects names, replica bounds and triggers that break the
//!   admission rules, and checks resource versions on delete
//! - [`registry`]: the two read-only queries admission needs from the cluster
//!
//! Nothing here holds shared mutable state; concurrent requests are isolated
//! and any locking is the registry's concern.

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(unused_extern_crates)]

pub mod config;
pub mod enricher;
pub mod error;
pub mod function;
pub mod registry;
pub mod validator;

pub use config::PlatformConfig;
pub use error::{AdmissionError, BoxError, ConfigError, ValidationError, ValidationErrorKind};
pub use function::{
    DeleteFunctionOptions, FunctionConfig, FunctionMeta, FunctionSpec, Project, Trigger,
};
pub use registry::{FunctionFilter, FunctionRegistry, ProjectFilter};
pub use validator::Validator;

/// Admission entry point bundling platform defaults with a registry.
#[derive(Debug, Clone)]
pub struct Admission<R> {
    config: PlatformConfig,
    registry: R,
}

impl<R: FunctionRegistry> Admission<R> {
    #[must_use]
    pub fn new(config: PlatformConfig, registry: R) -> Self {
        Self { config, registry }
    }

    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Fills in defaults. Never fails.
    pub fn enrich(&self, function: &mut FunctionConfig) {
        enricher::enrich_function_config(function, &self.config);
    }

    pub fn validate_create(&self, function: &FunctionConfig) -> Result<(), AdmissionError> {
        Validator::new(&self.config, &self.registry).validate_create(function)
    }

    pub fn validate_delete(&self, options: &DeleteFunctionOptions) -> Result<(), AdmissionError> {
        Validator::new(&self.config, &self.registry).validate_delete(options)
    }

    /// Enriches `function` in place and validates the result.
    pub fn enrich_and_validate_create(
        &self,
        function: &mut FunctionConfig,
    ) -> Result<(), AdmissionError> {
        self.enrich(function);
        self.validate_create(function)
    }
}
