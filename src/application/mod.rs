pub mod context;
pub mod decision;
pub mod errors;
pub mod filter;
pub mod pattern;
pub mod scanner;
pub mod whitelist;

pub use context::{Arguments, RequestContext, RouteInfo, ValidationError, SHORT_CIRCUIT_KEY};
pub use decision::{Outcome, ResponseTemplate, ShortCircuitResponse};
pub use errors::FilterError;
pub use filter::{FilterReport, PayloadFilter};
pub use pattern::PatternMatcher;
pub use scanner::{ScanState, Scanner};
pub use whitelist::WhitelistContext;
