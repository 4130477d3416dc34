//! Ports (trait interfaces) following hexagonal architecture.
//!
//! The loop core depends only on these traits; callers supply the concrete
//! generator, validator channels, analyst, and persistence sink.

pub mod analyst;
pub mod generator;
pub mod sink;
pub mod validator;

pub use analyst::{Analyst, Diagnosis, StrategyRecommendation};
pub use generator::{GeneratedArtifact, Generator};
pub use sink::PersistenceSink;
pub use validator::ValidatorChannel;
