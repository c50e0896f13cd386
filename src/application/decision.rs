use crate::domain::ScanVerdict;

pub const DEFAULT_RESPONSE_BODY: &str = "Request short-circuited due to malicious content.";
pub const DEFAULT_STATUS_CODE: u16 = 400;
pub const DEFAULT_CONTENT_TYPE: &str = "text";

pub const TOO_DEEP_STATUS_CODE: u16 = 413;
pub const TOO_DEEP_BODY: &str = "Recursion depth has exceeded";

/// Response that replaces the endpoint's result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortCircuitResponse {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

/// What the filter does with a request once scanning is done
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Outcome {
    #[default]
    Pass,
    Reject(ShortCircuitResponse),
    TooDeep(ShortCircuitResponse),
}

impl Outcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn response(&self) -> Option<&ShortCircuitResponse> {
        match self {
            Outcome::Pass => None,
            Outcome::Reject(response) | Outcome::TooDeep(response) => Some(response),
        }
    }

    /// Validation message attached to the request when it is rejected
    pub fn validation_message(&self) -> Option<&'static str> {
        match self {
            Outcome::Pass => None,
            Outcome::Reject(_) => Some("Malicious content"),
            Outcome::TooDeep(_) => Some("Recursion depth exceeded"),
        }
    }
}

/// Configured response for rejected requests, with defaults already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTemplate {
    status: u16,
    body: String,
    content_type: String,
}

impl ResponseTemplate {
    /// A zero status or an empty body/content type falls back to the default
    pub fn new(status: u16, body: Option<&str>, content_type: Option<&str>) -> Self {
        Self {
            status: if status == 0 { DEFAULT_STATUS_CODE } else { status },
            body: non_empty_or(body, DEFAULT_RESPONSE_BODY),
            content_type: non_empty_or(content_type, DEFAULT_CONTENT_TYPE),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Depth breaches win over matches: a 413 is returned even when
    /// disallowed content was also found.
    pub fn build_outcome(&self, verdict: &ScanVerdict) -> Outcome {
        if verdict.depth_exceeded() {
            Outcome::TooDeep(ShortCircuitResponse {
                status: TOO_DEEP_STATUS_CODE,
                body: TOO_DEEP_BODY.to_string(),
                content_type: self.content_type.clone(),
            })
        } else if verdict.has_matches() {
            Outcome::Reject(ShortCircuitResponse {
                status: self.status,
                body: self.body.clone(),
                content_type: self.content_type.clone(),
            })
        } else {
            Outcome::Pass
        }
    }
}

impl Default for ResponseTemplate {
    fn default() -> Self {
        Self::new(0, None, None)
    }
}

fn non_empty_or(value: Option<&str>, default: &str) -> String {
    match value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}
