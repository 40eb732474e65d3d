// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Registry doubles for admission tests

use fnplane_admission::{
    BoxError, FunctionConfig, FunctionFilter, FunctionRegistry, Project, ProjectFilter,
};
use std::sync::Mutex;

/// In-memory registry that records every query it answers
#[derive(Default)]
pub struct MockRegistry {
    pub functions: Vec<FunctionConfig>,
    pub projects: Vec<Project>,
    pub function_queries: Mutex<Vec<FunctionFilter>>,
    pub project_queries: Mutex<Vec<ProjectFilter>>,
}

#[allow(dead_code)]
impl MockRegistry {
    pub fn with_project(name: &str, namespace: &str) -> Self {
        Self {
            projects: vec![Project {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }],
            ..Self::default()
        }
    }

    pub fn with_functions(functions: Vec<FunctionConfig>) -> Self {
        Self {
            functions,
            ..Self::default()
        }
    }

    pub fn project_queries(&self) -> Vec<ProjectFilter> {
        self.project_queries.lock().unwrap().clone()
    }

    pub fn function_queries(&self) -> Vec<FunctionFilter> {
        self.function_queries.lock().unwrap().clone()
    }
}

fn matches_namespace(filter: &str, namespace: &str) -> bool {
    filter.is_empty() || filter == namespace
}

impl FunctionRegistry for MockRegistry {
    fn list_functions(&self, filter: &FunctionFilter) -> Result<Vec<FunctionConfig>, BoxError> {
        self.function_queries.lock().unwrap().push(filter.clone());
        Ok(self
            .functions
            .iter()
            .filter(|function| {
                function.meta.name == filter.name
                    && matches_namespace(&filter.namespace, &function.meta.namespace)
            })
            .cloned()
            .collect())
    }

    fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>, BoxError> {
        self.project_queries.lock().unwrap().push(filter.clone());
        Ok(self
            .projects
            .iter()
            .filter(|project| {
                project.name == filter.name && matches_namespace(&filter.namespace, &project.namespace)
            })
            .cloned()
            .collect())
    }
}

/// Registry whose every query fails
#[allow(dead_code)]
pub struct UnavailableRegistry;

impl FunctionRegistry for UnavailableRegistry {
    fn list_functions(&self, _filter: &FunctionFilter) -> Result<Vec<FunctionConfig>, BoxError> {
        Err("registry unavailable".into())
    }

    fn list_projects(&self, _filter: &ProjectFilter) -> Result<Vec<Project>, BoxError> {
        Err("registry unavailable".into())
    }
}
