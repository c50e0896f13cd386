//! Per-request state handed to the filter by the hosting pipeline.
//!
//! A `RequestContext` is built fresh for every inbound request and owns all
//! mutable state the filter touches, so a shared `PayloadFilter` never carries
//! anything from one request into the next.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::application::decision::ShortCircuitResponse;
use crate::application::errors::FilterError;

/// Model-state key used for every short-circuit annotation
pub const SHORT_CIRCUIT_KEY: &str = "__shortcircuit__";

/// Route identity of the endpoint handling a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteInfo {
    /// Route template as registered with the router, e.g. `items/{id}`
    pub template: String,
    /// Logical endpoint (controller) name, if the pipeline provides one
    pub endpoint: Option<String>,
}

impl RouteInfo {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            endpoint: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// Bound request arguments in binding order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, Value)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }

    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.push(name, value);
        self
    }

    /// Materialize a typed argument through its `Serialize` implementation.
    ///
    /// # Errors
    ///
    /// A value that cannot be represented (e.g. a map with non-string keys)
    /// is a traversal fault; it is logged and returned, never skipped.
    pub fn push_serialized<T>(&mut self, name: impl Into<String>, value: &T) -> Result<(), FilterError>
    where
        T: Serialize + ?Sized,
    {
        let name = name.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.entries.push((name, value));
                Ok(())
            }
            Err(source) => {
                error!(argument = %name, error = %source, "failed to materialize request argument");
                Err(FilterError::Serialization {
                    argument: name,
                    source,
                })
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Validation annotation attached to a rejected request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// The in-flight request as seen by the filter
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: String,
    route: RouteInfo,
    arguments: Arguments,
    validation_errors: Vec<ValidationError>,
    result: Option<ShortCircuitResponse>,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, route: RouteInfo, arguments: Arguments) -> Self {
        Self {
            method: method.into(),
            route,
            arguments,
            validation_errors: Vec::new(),
            result: None,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn route(&self) -> &RouteInfo {
        &self.route
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// False once any validation annotation has been attached
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    pub fn validation_errors(&self) -> &[ValidationError] {
        &self.validation_errors
    }

    /// Replacement response, if the request was short-circuited
    pub fn result(&self) -> Option<&ShortCircuitResponse> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<ShortCircuitResponse> {
        self.result.take()
    }

    pub(crate) fn short_circuit(&mut self, message: &str, response: ShortCircuitResponse) {
        self.validation_errors
            .push(ValidationError::new(SHORT_CIRCUIT_KEY, message));
        self.result = Some(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct SingleValuedModel {
        value: String,
    }

    #[test]
    fn test_arguments_keep_binding_order() {
        let arguments = Arguments::new()
            .with("userId", json!(1))
            .with("email", json!("a@b.com"))
            .with("settings", json!({"name": "x"}));

        let names: Vec<&str> = arguments.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["userId", "email", "settings"]);
        assert_eq!(arguments.len(), 3);
        assert_eq!(arguments.get("email"), Some(&json!("a@b.com")));
        assert_eq!(arguments.get("missing"), None);
    }

    #[test]
    fn test_push_serialized_materializes_struct() {
        let mut arguments = Arguments::new();
        arguments
            .push_serialized(
                "singleValuedModel",
                &SingleValuedModel {
                    value: "hello".to_string(),
                },
            )
            .unwrap();

        assert_eq!(
            arguments.get("singleValuedModel"),
            Some(&json!({"value": "hello"}))
        );
    }

    #[test]
    fn test_push_serialized_reports_unrepresentable_values() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8, 2], "tuple keys are not valid object keys");

        let mut arguments = Arguments::new();
        let err = arguments.push_serialized("lookup", &map).unwrap_err();

        assert!(matches!(err, FilterError::Serialization { ref argument, .. } if argument == "lookup"));
        assert!(arguments.is_empty());
    }

    #[test]
    fn test_short_circuit_marks_context_invalid() {
        let mut ctx = RequestContext::new("POST", RouteInfo::new("items"), Arguments::new());
        assert!(ctx.is_valid());
        assert!(ctx.result().is_none());

        ctx.short_circuit(
            "Malicious content",
            ShortCircuitResponse {
                status: 400,
                body: "no".to_string(),
                content_type: "text".to_string(),
            },
        );

        assert!(!ctx.is_valid());
        assert_eq!(ctx.validation_errors()[0].key, SHORT_CIRCUIT_KEY);
        assert_eq!(ctx.take_result().map(|r| r.status), Some(400));
        assert!(ctx.result().is_none());
    }
}
