//! Type-agnostic building blocks for payload scanning: value classification,
//! recursion budget and the per-request verdict.

pub mod node;
pub mod verdict;

pub use node::{classify, Node, ValueKind};
pub use verdict::{RecursionState, ScanVerdict, UNLIMITED_DEPTH};
