//! Filter configuration
//!
//! `PayloadInjectionOptions` is the serde-friendly shape that is loaded from
//! the environment, TOML or YAML. `compile()` validates it once at startup and
//! produces `FilterSettings`, which is immutable and shared by every request.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::decision::ResponseTemplate;
use crate::application::errors::FilterError;
use crate::application::pattern::{PatternMatcher, DEFAULT_PATTERN};
use crate::domain::UNLIMITED_DEPTH;

/// Exempts named properties of one argument on one route from scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Route template, compared verbatim with the request's template
    pub path_template: String,
    /// Bind name of the argument the exemption applies to
    pub parameter_name: String,
    /// Properties of that argument that are not scanned
    #[serde(default)]
    pub property_names: Vec<String>,
    /// Optional endpoint (controller) name that must also match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Reserved. Validated at startup but not used for matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusion_pattern: Option<String>,
}

impl WhitelistEntry {
    pub fn new<I, S>(path_template: impl Into<String>, parameter_name: impl Into<String>, property_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path_template: path_template.into(),
            parameter_name: parameter_name.into(),
            property_names: property_names.into_iter().map(Into::into).collect(),
            endpoint: None,
            exclusion_pattern: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_exclusion_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.exclusion_pattern = Some(pattern.into());
        self
    }
}

/// Payload injection filter options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadInjectionOptions {
    /// HTTP methods the filter runs for. Must be set.
    pub allowed_http_methods: Option<Vec<String>>,
    /// Disallowed-content regex, defaults to `[<>&;]`
    pub pattern: Option<String>,
    /// Status for rejected requests, 0 means 400
    pub response_status_code: u16,
    /// Body for rejected requests
    pub response_content_body: Option<String>,
    /// Content type for rejected requests, defaults to `text`
    pub response_content_type: Option<String>,
    pub whitelist_entries: Vec<WhitelistEntry>,
    /// -1 disables the limit
    pub max_recursion_depth: i32,
}

impl Default for PayloadInjectionOptions {
    fn default() -> Self {
        Self {
            allowed_http_methods: None,
            pattern: None,
            response_status_code: 0,
            response_content_body: None,
            response_content_type: None,
            whitelist_entries: Vec::new(),
            max_recursion_depth: UNLIMITED_DEPTH,
        }
    }
}

impl PayloadInjectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters the methods that carry a body: POST, PUT and PATCH
    pub fn recommended() -> Self {
        Self::new().with_allowed_methods(["POST", "PUT", "PATCH"])
    }

    pub fn with_allowed_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_http_methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_response_status_code(mut self, status: u16) -> Self {
        self.response_status_code = status;
        self
    }

    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_content_body = Some(body.into());
        self
    }

    pub fn with_response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = Some(content_type.into());
        self
    }

    pub fn with_whitelist_entry(mut self, entry: WhitelistEntry) -> Self {
        self.whitelist_entries.push(entry);
        self
    }

    pub fn with_max_recursion_depth(mut self, depth: i32) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Read options from `PAYLOAD_FILTER_*` environment variables.
    ///
    /// Unset variables keep their defaults; a set variable that does not parse
    /// is a `ConfigLoad` error. Whitelist entries cannot be expressed this way;
    /// use a config file.
    pub fn from_env() -> Result<Self, FilterError> {
        let defaults = Self::default();
        Ok(Self {
            allowed_http_methods: std::env::var("PAYLOAD_FILTER_ALLOWED_METHODS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                        .collect()
                }),
            pattern: std::env::var("PAYLOAD_FILTER_PATTERN").ok(),
            response_status_code: parse_env("PAYLOAD_FILTER_STATUS_CODE")?
                .unwrap_or(defaults.response_status_code),
            response_content_body: std::env::var("PAYLOAD_FILTER_RESPONSE_BODY").ok(),
            response_content_type: std::env::var("PAYLOAD_FILTER_CONTENT_TYPE").ok(),
            whitelist_entries: defaults.whitelist_entries,
            max_recursion_depth: parse_env("PAYLOAD_FILTER_MAX_DEPTH")?
                .unwrap_or(defaults.max_recursion_depth),
        })
    }

    pub fn from_toml_str(source: &str) -> Result<Self, FilterError> {
        toml::from_str(source).map_err(|e| FilterError::ConfigLoad(e.to_string()))
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, FilterError> {
        serde_yaml::from_str(source).map_err(|e| FilterError::ConfigLoad(e.to_string()))
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FilterError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| FilterError::ConfigLoad(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            _ => Err(FilterError::ConfigLoad(format!(
                "{}: unsupported config format (expected .toml, .yaml or .yml)",
                path.display()
            ))),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), FilterError> {
        let methods = self
            .allowed_http_methods
            .as_ref()
            .ok_or_else(|| FilterError::configuration("allowed_http_methods must be set"))?;

        if methods.iter().any(|m| m.trim().is_empty()) {
            return Err(FilterError::configuration(
                "allowed_http_methods cannot contain empty method names",
            ));
        }

        if self.response_status_code != 0 && !(100..=599).contains(&self.response_status_code) {
            return Err(FilterError::configuration(format!(
                "response_status_code must be between 100 and 599, got {}",
                self.response_status_code
            )));
        }

        if self.max_recursion_depth < UNLIMITED_DEPTH {
            return Err(FilterError::configuration(format!(
                "max_recursion_depth must be -1 (unlimited) or non-negative, got {}",
                self.max_recursion_depth
            )));
        }

        for entry in &self.whitelist_entries {
            if entry.path_template.is_empty() || entry.parameter_name.is_empty() {
                return Err(FilterError::configuration(
                    "whitelist entries need both path_template and parameter_name",
                ));
            }
            if let Some(pattern) = &entry.exclusion_pattern {
                PatternMatcher::new(pattern)?;
            }
        }

        Ok(())
    }

    /// Validate and compile into immutable settings
    pub fn compile(&self) -> Result<FilterSettings, FilterError> {
        self.validate()?;

        let allowed_methods = self
            .allowed_http_methods
            .iter()
            .flatten()
            .map(|m| m.trim().to_ascii_uppercase())
            .collect();

        let matcher = match self.pattern.as_deref() {
            Some(pattern) if !pattern.is_empty() => PatternMatcher::new(pattern)?,
            _ => PatternMatcher::default(),
        };

        Ok(FilterSettings {
            allowed_methods,
            matcher,
            responses: ResponseTemplate::new(
                self.response_status_code,
                self.response_content_body.as_deref(),
                self.response_content_type.as_deref(),
            ),
            whitelist: self.whitelist_entries.clone(),
            max_depth: self.max_recursion_depth,
        })
    }
}

fn parse_env<T>(name: &str) -> Result<Option<T>, FilterError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| FilterError::ConfigLoad(format!("{}={:?}: {}", name, raw, e))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(FilterError::ConfigLoad(format!("{}: {}", name, e))),
    }
}

/// Validated, read-only filter configuration
#[derive(Debug, Clone)]
pub struct FilterSettings {
    allowed_methods: BTreeSet<String>,
    matcher: PatternMatcher,
    responses: ResponseTemplate,
    whitelist: Vec<WhitelistEntry>,
    max_depth: i32,
}

impl FilterSettings {
    /// Method names compare case-insensitively
    pub fn allows_method(&self, method: &str) -> bool {
        self.allowed_methods.contains(&method.to_ascii_uppercase())
    }

    pub fn allowed_methods(&self) -> impl Iterator<Item = &str> {
        self.allowed_methods.iter().map(String::as_str)
    }

    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    pub fn responses(&self) -> &ResponseTemplate {
        &self.responses
    }

    pub fn whitelist(&self) -> &[WhitelistEntry] {
        &self.whitelist
    }

    pub fn max_depth(&self) -> i32 {
        self.max_depth
    }
}
