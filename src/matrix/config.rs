//! Run matrix configuration
//!
//! A matrix file names the deployments under test (`versions`) and the
//! scenarios to run against them. JSON and YAML are both accepted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::exec::{normalize_command, BASE_URL_PLACEHOLDER};

/// One matrix row: a name and a command per version label
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Display name
    pub name: String,
    /// Version label -> command template
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
}

impl Scenario {
    pub fn new<I, K, V>(name: &str, commands: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.to_string(),
            commands: commands
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A complete matrix file
#[derive(Deserialize, Debug, Default)]
pub struct MatrixConfig {
    /// Version label -> base URL substituted for `{{BASE_URL}}`
    #[serde(default)]
    pub versions: BTreeMap<String, String>,

    /// Scenarios with per-version commands
    #[serde(default)]
    pub test_cases: Vec<Scenario>,

    /// Older format: each command runs unchanged against every version
    #[serde(default)]
    pub commands: Vec<String>,

    /// Compare only JSON structure, not values
    #[serde(default)]
    pub keys_only: bool,

    /// Per-command timeout in seconds; 0 means the default
    #[serde(default)]
    pub timeout: i64,
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All errors and warnings found in a matrix file
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&errors.join("; "))
    }
}

impl MatrixConfig {
    /// Load and validate a matrix file
    ///
    /// `.yaml` / `.yml` files are parsed as YAML, anything else as JSON.
    /// Validation warnings are logged.
    pub fn load(path: &Path) -> Result<Self> {
        Self::read(path)?.validated()
    }

    /// Parse a matrix file without validating it
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );
        if is_yaml {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::ConfigParse(format!("failed to parse config YAML: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::ConfigParse(format!("failed to parse config JSON: {}", e)))
        }
    }

    /// Parse and validate a JSON matrix
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(data)
            .map_err(|e| Error::ConfigParse(format!("failed to parse config JSON: {}", e)))?;
        config.validated()
    }

    fn validated(self) -> Result<Self> {
        let report = self.validate();
        if !report.is_valid() {
            return Err(Error::Validation(report.to_string()));
        }
        for warning in &report.warnings {
            tracing::warn!("Config: {}", warning);
        }
        Ok(self)
    }

    /// Check the matrix for errors and warnings
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        if self.versions.is_empty() {
            report.error("versions", "at least one version is required");
        }
        for (name, base_url) in &self.versions {
            validate_version(&mut report, name, base_url);
        }

        if self.test_cases.is_empty() && self.commands.is_empty() {
            report.error("test_cases", "at least one test case or command is required");
        }

        for (i, command) in self.commands.iter().enumerate() {
            if command.trim().is_empty() {
                report.error(format!("commands[{i}]"), "command cannot be empty");
            }
        }

        for (i, case) in self.test_cases.iter().enumerate() {
            let field = format!("test_cases[{i}]");
            if case.name.trim().is_empty() {
                report.error(&field, "name cannot be empty");
            }
            if case.commands.is_empty() {
                report.error(&field, "at least one command is required");
            }
            for (version, command) in &case.commands {
                if !self.versions.contains_key(version) {
                    report.error(
                        format!("{field}.commands[{version}]"),
                        "version is not defined in versions",
                    );
                }
                if command.trim().is_empty() {
                    report.error(format!("{field}.commands[{version}]"), "command cannot be empty");
                }
            }
        }

        let has_placeholder = self
            .commands
            .iter()
            .chain(self.test_cases.iter().flat_map(|c| c.commands.values()))
            .any(|c| c.contains(BASE_URL_PLACEHOLDER));
        if !has_placeholder && (!self.commands.is_empty() || !self.test_cases.is_empty()) {
            report.warnings.push(format!(
                "no commands contain {BASE_URL_PLACEHOLDER} placeholder - commands will not use version URLs"
            ));
        }

        if self.timeout < 0 {
            report.error("timeout", "timeout cannot be negative");
        }

        report
    }

    /// All scenarios, with legacy commands expanded to every version
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut scenarios = self.test_cases.clone();
        scenarios.extend(self.commands.iter().map(|command| {
            Scenario::new(
                &normalize_command(command),
                self.versions.keys().map(|v| (v.clone(), command.clone())),
            )
        }));
        scenarios
    }

    /// Configured per-command timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        u64::try_from(self.timeout)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn validate_version(report: &mut ValidationReport, name: &str, base_url: &str) {
    if name.trim().is_empty() {
        report.error("versions", "version name cannot be empty");
        return;
    }

    let field = format!("versions[{name}]");
    if base_url.trim().is_empty() {
        report.error(field, "URL cannot be empty");
        return;
    }

    match url::Url::parse(base_url) {
        Ok(parsed) => {
            if parsed.host_str().map_or(true, str::is_empty) {
                report.error(field, "URL must have a host");
            }
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            report.error(field, "URL must have a scheme (http:// or https://)");
        }
        Err(e) => report.error(field, format!("invalid URL: {}", e)),
    }
}
