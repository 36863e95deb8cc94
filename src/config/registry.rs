//! Built-in project and test-type registries.

use crate::error::ConfigError;
use std::collections::HashSet;
use std::path::PathBuf;

use super::types::{CommandSpec, Framework, ProjectDescriptor, TestTypeDescriptor};

pub fn builtin_projects() -> Vec<ProjectDescriptor> {
    vec![
        ProjectDescriptor {
            key: "backend".to_string(),
            name: "Backend API".to_string(),
            working_dir: PathBuf::from("server"),
            test_command: CommandSpec::new("python", &["-m", "pytest", "-q"]),
            coverage_command: CommandSpec::new(
                "python",
                &["-m", "pytest", "-q", "--cov=app", "--cov-report=term"],
            ),
            language: "python".to_string(),
            framework: Framework::Pytest,
            append_files: true,
        },
        ProjectDescriptor {
            key: "admin".to_string(),
            name: "Admin Dashboard".to_string(),
            working_dir: PathBuf::from("apps/admin"),
            test_command: CommandSpec::new("pnpm", &["exec", "vitest", "run"]),
            coverage_command: CommandSpec::new("pnpm", &["exec", "vitest", "run", "--coverage"]),
            language: "typescript".to_string(),
            framework: Framework::Vitest,
            append_files: true,
        },
        ProjectDescriptor {
            key: "miniapp".to_string(),
            name: "Mini Program".to_string(),
            working_dir: PathBuf::from("apps/miniapp"),
            test_command: CommandSpec::new("pnpm", &["exec", "jest", "--ci"]),
            coverage_command: CommandSpec::new("pnpm", &["exec", "jest", "--ci", "--coverage"]),
            language: "typescript".to_string(),
            framework: Framework::Jest,
            append_files: true,
        },
        ProjectDescriptor {
            key: "utils".to_string(),
            name: "Shared Utilities".to_string(),
            working_dir: PathBuf::from("packages/utils"),
            test_command: CommandSpec::new("pnpm", &["exec", "vitest", "run"]),
            coverage_command: CommandSpec::new("pnpm", &["exec", "vitest", "run", "--coverage"]),
            language: "typescript".to_string(),
            framework: Framework::Vitest,
            append_files: true,
        },
        ProjectDescriptor {
            key: "e2e".to_string(),
            name: "End-to-End Suites".to_string(),
            working_dir: PathBuf::from("e2e"),
            test_command: CommandSpec::new("pnpm", &["exec", "playwright", "test"]),
            coverage_command: CommandSpec::new("pnpm", &["exec", "playwright", "test"]),
            language: "typescript".to_string(),
            framework: Framework::Playwright,
            append_files: true,
        },
    ]
}

pub fn builtin_test_types() -> Vec<TestTypeDescriptor> {
    vec![
        TestTypeDescriptor {
            key: "unit".to_string(),
            name: "Unit".to_string(),
            patterns: vec![
                "**/*.test.{ts,tsx,js,jsx}".to_string(),
                "**/tests/unit/**/test_*.py".to_string(),
            ],
            timeout_ms: 30_000,
            parallel: true,
            priority: 1,
        },
        TestTypeDescriptor {
            key: "integration".to_string(),
            name: "Integration".to_string(),
            patterns: vec![
                "**/*.integration.{ts,tsx,js}".to_string(),
                "**/tests/integration/**/test_*.py".to_string(),
            ],
            timeout_ms: 60_000,
            parallel: true,
            priority: 2,
        },
        TestTypeDescriptor {
            key: "e2e".to_string(),
            name: "End-to-End".to_string(),
            patterns: vec![
                "**/*.e2e.{ts,js}".to_string(),
                "**/*.spec.{ts,js}".to_string(),
                "**/tests/e2e/**/test_*.py".to_string(),
            ],
            timeout_ms: 300_000,
            parallel: false,
            priority: 3,
        },
        TestTypeDescriptor {
            key: "performance".to_string(),
            name: "Performance".to_string(),
            patterns: vec![
                "**/*.perf.{ts,js}".to_string(),
                "**/tests/performance/**/test_*.py".to_string(),
            ],
            timeout_ms: 600_000,
            parallel: false,
            priority: 4,
        },
    ]
}

/// Resolved registries for one invocation.
#[derive(Debug, Clone)]
pub struct Registry {
    pub projects: Vec<ProjectDescriptor>,
    pub test_types: Vec<TestTypeDescriptor>,
}

impl Registry {
    pub fn builtin() -> Self {
        Self {
            projects: builtin_projects(),
            test_types: builtin_test_types(),
        }
    }

    /// Built-in tables, each replaced by the config's table when that one is non-empty
    pub fn from_config(config: &super::Config) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin();
        if !config.projects.is_empty() {
            registry.projects = config.projects.clone();
        }
        if !config.test_types.is_empty() {
            registry.test_types = config.test_types.clone();
        }
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.projects.is_empty() {
            return Err(ConfigError::EmptyRegistry("project"));
        }
        if self.test_types.is_empty() {
            return Err(ConfigError::EmptyRegistry("test type"));
        }

        let mut seen = HashSet::new();
        for project in &self.projects {
            if !seen.insert(project.key.as_str()) {
                return Err(ConfigError::DuplicateKey {
                    kind: "project",
                    key: project.key.clone(),
                });
            }
            if project.test_command.program.trim().is_empty()
                || project.coverage_command.program.trim().is_empty()
            {
                return Err(ConfigError::EmptyCommand(project.key.clone()));
            }
        }

        let mut seen = HashSet::new();
        for test_type in &self.test_types {
            if !seen.insert(test_type.key.as_str()) {
                return Err(ConfigError::DuplicateKey {
                    kind: "test type",
                    key: test_type.key.clone(),
                });
            }
            if test_type.timeout_ms == 0 {
                return Err(ConfigError::ZeroTimeout(test_type.key.clone()));
            }
        }

        Ok(())
    }

    /// Select projects by key, preserving registry order. `None` selects all.
    pub fn select_projects(
        &self,
        keys: Option<&[String]>,
    ) -> Result<Vec<ProjectDescriptor>, ConfigError> {
        let Some(keys) = keys else {
            return Ok(self.projects.clone());
        };
        for key in keys {
            if !self.projects.iter().any(|p| &p.key == key) {
                return Err(ConfigError::UnknownProject {
                    key: key.clone(),
                    known: self.project_keys().join(", "),
                });
            }
        }
        Ok(self
            .projects
            .iter()
            .filter(|p| keys.contains(&p.key))
            .cloned()
            .collect())
    }

    pub fn select_test_types(
        &self,
        keys: Option<&[String]>,
    ) -> Result<Vec<TestTypeDescriptor>, ConfigError> {
        let Some(keys) = keys else {
            return Ok(self.test_types.clone());
        };
        for key in keys {
            if !self.test_types.iter().any(|t| &t.key == key) {
                return Err(ConfigError::UnknownTestType {
                    key: key.clone(),
                    known: self.test_type_keys().join(", "),
                });
            }
        }
        Ok(self
            .test_types
            .iter()
            .filter(|t| keys.contains(&t.key))
            .cloned()
            .collect())
    }

    pub fn project_keys(&self) -> Vec<&str> {
        self.projects.iter().map(|p| p.key.as_str()).collect()
    }

    pub fn test_type_keys(&self) -> Vec<&str> {
        self.test_types.iter().map(|t| t.key.as_str()).collect()
    }
}
