//! # payload_filter - Request Payload Injection Filter
//!
//! Inspects already-bound request arguments before they reach endpoint logic
//! and rejects requests whose string content matches a disallowed pattern
//! (markup, script tags, control characters). Nothing is escaped or rewritten:
//! a request either passes untouched or is short-circuited.
//!
//! ## Architecture Layers
//!
//! - **Domain**: value classification, recursion budget, scan verdict
//! - **Application**: pattern matcher, whitelist resolver, recursive scanner,
//!   decision builder and the per-request filter entry point
//! - **API**: axum/tower middleware that binds requests and applies decisions
//!
//! ## Example Usage
//!
//! ```
//! use payload_filter::{Arguments, PayloadFilter, PayloadInjectionOptions, RequestContext, RouteInfo};
//! use serde_json::json;
//!
//! let filter = PayloadFilter::new(&PayloadInjectionOptions::recommended()).unwrap();
//!
//! let arguments = Arguments::new().with("email", json!("foo@g<>.com"));
//! let mut ctx = RequestContext::new("POST", RouteInfo::new("api/users"), arguments);
//!
//! let report = filter.on_request(&mut ctx);
//! assert!(report.short_circuited);
//! assert_eq!(ctx.result().map(|r| r.status), Some(400));
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;

pub use api::middleware::payload_injection::{EndpointName, PayloadInjectionLayer, ValidationErrors};
pub use application::{
    Arguments, FilterError, FilterReport, Outcome, PayloadFilter, RequestContext, RouteInfo,
    ShortCircuitResponse, ValidationError,
};
pub use config::{FilterSettings, PayloadInjectionOptions, WhitelistEntry};
pub use domain::{classify, Node, ValueKind};
