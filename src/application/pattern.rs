use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::errors::FilterError;

/// Matches any of `<`, `>`, `&` or `;`
pub const DEFAULT_PATTERN: &str = r"[<>&;]";

/// Cached default pattern
static DEFAULT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(DEFAULT_PATTERN).expect("Invalid default disallowed-content pattern"));

/// Detects disallowed content in string leaves.
///
/// The pattern is unanchored: a string is disallowed if the pattern matches
/// anywhere in it. `Regex` is safe to share across threads, so a single
/// matcher serves every concurrent request.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Regex,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        let pattern = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    pub fn from_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Empty text is never disallowed
    pub fn is_disallowed(&self, text: &str) -> bool {
        !text.is_empty() && self.pattern.is_match(text)
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::from_regex(DEFAULT_REGEX.clone())
    }
}
