pub mod health;
pub mod samples;

pub use health::health_handler;
pub use samples::{
    check_handler, multi_valued_handler, single_valued_handler, MultiValuedModel,
    SingleValuedModel,
};
