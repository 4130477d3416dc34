//! Adapters: concrete implementations of the domain ports.

pub mod fallback;
pub mod heuristic_analyst;
pub mod json_store;

pub use fallback::FallbackGenerator;
pub use heuristic_analyst::HeuristicAnalyst;
pub use json_store::{JsonFileSink, NullSink};
