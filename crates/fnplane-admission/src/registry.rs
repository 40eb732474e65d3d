// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Read-only view of the cluster state that admission depends on.
//!
//! The registry itself (storage, scheduling, its own concurrency control)
//! lives outside this crate. Admission only needs two queries, so that is all
//! the trait exposes.

use crate::error::BoxError;
use crate::function::{FunctionConfig, Project};

/// Selects stored functions by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FunctionFilter {
    pub name: String,
    pub namespace: String,
}

/// Selects projects by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProjectFilter {
    pub name: String,
    pub namespace: String,
}

/// Queries answered by the function/project registry.
pub trait FunctionRegistry {
    /// Functions matching `filter`. An empty result means none exist.
    fn list_functions(&self, filter: &FunctionFilter) -> Result<Vec<FunctionConfig>, BoxError>;

    /// Projects matching `filter`. An empty result means none exist.
    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, BoxError>;
}

impl<R: FunctionRegistry + ?Sized> FunctionRegistry for &R {
    fn list_functions(&self, filter: &FunctionFilter) -> Result<Vec<FunctionConfig>, BoxError> {
        (**self).list_functions(filter)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, BoxError> {
        (**self).list_projects(filter)
    }
}

impl<R: FunctionRegistry + ?Sized> FunctionRegistry for std::sync::Arc<R> {
    fn list_functions(&self, filter: &FunctionFilter) -> Result<Vec<FunctionConfig>, BoxError> {
        (**self).list_functions(filter)
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, BoxError> {
        (**self).list_projects(filter)
    }
}
