pub mod payload_injection;

pub use payload_injection::{create_payload_injection_middleware, PayloadInjectionLayer};
