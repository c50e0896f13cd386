//! Payload injection middleware
//!
//! Installs [`PayloadFilter`](crate::application::PayloadFilter) in an axum
//! router. For every request with a filtered method the middleware binds the
//! path parameters, query parameters and JSON body into request arguments,
//! runs the filter, and either forwards the request with its body restored or
//! answers with the configured short-circuit response.
//!
//! Add it with `Router::route_layer` so the matched route template is known
//! when whitelist entries are resolved.

pub mod middleware;


pub use middleware::{
    create_payload_injection_middleware, EndpointName, PayloadInjectionLayer,
    PayloadInjectionService, ValidationErrors, DEFAULT_BODY_ARGUMENT, DEFAULT_BODY_LIMIT,
};
