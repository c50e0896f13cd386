use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::context::{Arguments, RequestContext, RouteInfo};
use crate::application::decision::Outcome;
use crate::application::errors::FilterError;
use crate::application::scanner::{ScanState, Scanner};
use crate::application::whitelist;
use crate::config::{FilterSettings, PayloadInjectionOptions};

/// What the filter did with one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    /// False when the method was not one of the allowed methods
    pub executed: bool,
    pub short_circuited: bool,
    pub depth_exceeded: bool,
    /// Disallowed strings in the order they were found
    pub matched: Vec<String>,
    pub max_depth: i32,
    /// Deepest nesting level entered while scanning
    pub recursion_depth: usize,
    pub outcome: Outcome,
}

/// Payload injection filter.
///
/// Holds only the compiled settings, so one instance can be shared by all
/// concurrent requests. Every call to [`PayloadFilter::on_request`] starts from
/// fresh scan state.
#[derive(Debug, Clone)]
pub struct PayloadFilter {
    settings: Arc<FilterSettings>,
}

impl PayloadFilter {
    pub fn new(options: &PayloadInjectionOptions) -> Result<Self, FilterError> {
        Ok(Self::from_settings(Arc::new(options.compile()?)))
    }

    pub fn from_settings(settings: Arc<FilterSettings>) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    /// Scan every argument in binding order into one verdict
    pub fn scan(&self, route: &RouteInfo, arguments: &Arguments) -> ScanState {
        let mut state = ScanState::new(self.settings.max_depth());

        for (name, value) in arguments.iter() {
            let exemptions = whitelist::resolve(route, name, self.settings.whitelist());
            Scanner::new(self.settings.matcher(), &exemptions).scan(value, &mut state);
        }

        state
    }

    /// Run the filter against an in-flight request.
    ///
    /// On rejection the context is annotated with a validation error and its
    /// result is replaced, so the endpoint must not run.
    pub fn on_request(&self, ctx: &mut RequestContext) -> FilterReport {
        let mut report = FilterReport {
            max_depth: self.settings.max_depth(),
            ..FilterReport::default()
        };

        if !self.settings.allows_method(ctx.method()) {
            debug!(method = %ctx.method(), route = %ctx.route().template, "payload filter skipped");
            return report;
        }
        report.executed = true;

        let state = self.scan(ctx.route(), ctx.arguments());
        let outcome = self.settings.responses().build_outcome(&state.verdict);

        report.depth_exceeded = state.verdict.depth_exceeded();
        report.recursion_depth = state.recursion.deepest();

        match &outcome {
            Outcome::Pass => {}
            Outcome::TooDeep(_) => {
                warn!(
                    method = %ctx.method(),
                    route = %ctx.route().template,
                    max_depth = self.settings.max_depth(),
                    "request payload exceeded maximum recursion depth"
                );
            }
            Outcome::Reject(_) => {
                info!(
                    method = %ctx.method(),
                    route = %ctx.route().template,
                    matches = state.verdict.matched().len(),
                    "request short-circuited due to malicious content"
                );
            }
        }

        if let (Some(message), Some(response)) = (outcome.validation_message(), outcome.response()) {
            ctx.short_circuit(message, response.clone());
            report.short_circuited = true;
        }

        report.matched = state.verdict.into_matches();
        report.outcome = outcome;
        report
    }
}
