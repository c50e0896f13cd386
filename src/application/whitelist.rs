//! Whitelist resolution
//!
//! An entry applies only when both the route template and the argument's bind
//! name match it exactly. Only the first entry with a matching template is
//! considered; later entries for the same template are never consulted.

use std::collections::HashSet;

use crate::application::context::RouteInfo;
use crate::config::WhitelistEntry;

/// Exemptions in force for one top-level argument
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistContext {
    applies: bool,
    exempt_properties: HashSet<String>,
}

impl WhitelistContext {
    /// No exemptions
    pub fn none() -> Self {
        Self::default()
    }

    pub fn exempting<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            applies: true,
            exempt_properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn applies(&self) -> bool {
        self.applies
    }

    pub fn exempt_properties(&self) -> &HashSet<String> {
        &self.exempt_properties
    }

    /// Whether a string property with this name skips the pattern check
    pub fn exempts(&self, property: &str) -> bool {
        self.applies && self.exempt_properties.contains(property)
    }
}

/// Resolve the exemptions for `argument` on `route`
pub fn resolve(route: &RouteInfo, argument: &str, entries: &[WhitelistEntry]) -> WhitelistContext {
    if entries.is_empty() {
        return WhitelistContext::none();
    }

    let Some(entry) = entries
        .iter()
        .find(|entry| entry.path_template == route.template)
    else {
        return WhitelistContext::none();
    };

    let parameter_matched = entry.parameter_name == argument;
    let endpoint_matched = match entry.endpoint.as_deref() {
        Some(endpoint) => route.endpoint.as_deref() == Some(endpoint),
        None => true,
    };

    if parameter_matched && endpoint_matched {
        WhitelistContext::exempting(entry.property_names.iter().cloned())
    } else {
        WhitelistContext::none()
    }
}
