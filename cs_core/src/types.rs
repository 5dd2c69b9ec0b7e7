//! Coordinate model and result types.

use errors::ProviderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use validator::{Validate, ValidationError};

/// A single resolved property.
///
/// Structured configuration values keep their decoded shape; certificate and
/// file payloads are base64 strings.
pub type PropertyValue = serde_json::Value;

/// Resolved properties of one category, keyed by property or file name.
pub type Properties = HashMap<String, PropertyValue>;

/// Address of one configuration slice.
///
/// # M-CANONICAL-DOCS
///
/// ## Purpose
/// Identifies the (project, project version, service, service version,
/// environment) tuple a caller wants configuration for. Globals lookups use
/// the project version, service lookups the service version.
///
/// ## Validation
/// Every field becomes one path or key segment of a fetch address, so each
/// must be non-empty, must not be `.` or `..` and must not contain `/` or
/// `\`. The HTTP boundary runs [`Validate::validate`] and answers 400;
/// resolution re-checks with [`Coordinate::ensure_addressable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    #[validate(length(min = 1, max = 255), custom(function = "validate_segment"))]
    pub project_name: String,

    #[validate(length(min = 1, max = 64), custom(function = "validate_segment"))]
    pub project_version: String,

    #[validate(length(min = 1, max = 255), custom(function = "validate_segment"))]
    pub service_name: String,

    #[validate(length(min = 1, max = 64), custom(function = "validate_segment"))]
    pub service_version: String,

    #[validate(length(min = 1, max = 64), custom(function = "validate_segment"))]
    pub environment: String,
}

impl Coordinate {
    pub fn new(
        project_name: impl Into<String>,
        project_version: impl Into<String>,
        service_name: impl Into<String>,
        service_version: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            project_version: project_version.into(),
            service_name: service_name.into(),
            service_version: service_version.into(),
            environment: environment.into(),
        }
    }

    /// Rejects coordinates that cannot name a location under a backend root.
    pub fn ensure_addressable(&self) -> Result<(), ProviderError> {
        self.validate()
            .map_err(|e| ProviderError::not_found(format!("invalid coordinate {}: {}", self, e)))
    }
}

/// One address segment: non-empty, not a relative path component, no
/// separators.
pub fn validate_segment(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("empty_segment"));
    }
    if value == "." || value == ".." {
        return Err(ValidationError::new("relative_segment"));
    }
    if value.contains(['/', '\\']) {
        return Err(ValidationError::new("separator_in_segment"));
    }
    Ok(())
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}/{}@{} ({})",
            self.project_name,
            self.project_version,
            self.service_name,
            self.service_version,
            self.environment
        )
    }
}

/// Kind of externalized content.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    /// Structured key/value settings stored as YAML or JSON.
    Configs,
    /// Opaque certificate files, returned as base64.
    Certs,
    /// Opaque text or binary files, returned as base64.
    Files,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Configs, Category::Certs, Category::Files];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Configs => "configs",
            Category::Certs => "certs",
            Category::Files => "files",
        }
    }

    /// Whether entries of this category are opaque files rather than
    /// structured properties.
    pub fn is_file_based(self) -> bool {
        !matches!(self, Category::Configs)
    }
}

/// Layer of a category: project-wide defaults or service overrides.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scope {
    Globals,
    Service,
}

impl Scope {
    /// Path segment naming the scope: `globals` or the service name.
    pub fn name<'a>(self, coordinate: &'a Coordinate) -> &'a str {
        match self {
            Scope::Globals => crate::address::GLOBALS,
            Scope::Service => &coordinate.service_name,
        }
    }

    /// Version segment of the scope: project version for globals, service
    /// version otherwise.
    pub fn version<'a>(self, coordinate: &'a Coordinate) -> &'a str {
        match self {
            Scope::Globals => &coordinate.project_version,
            Scope::Service => &coordinate.service_version,
        }
    }
}

/// Merged properties of one category for one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResult {
    pub service: Coordinate,
    pub config_properties: Properties,
}

impl ConfigResult {
    pub fn new(service: Coordinate, config_properties: Properties) -> Self {
        Self {
            service,
            config_properties,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.config_properties.is_empty()
    }
}

/// Project/service pair returned by service discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl ServiceRef {
    pub fn new(project_name: impl Into<String>, service_name: Option<String>) -> Self {
        Self {
            project_name: project_name.into(),
            service_name,
        }
    }
}
