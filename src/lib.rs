//! Anneal - Adaptive Quality-Control Generation Loop
//!
//! Anneal wraps an unreliable generation backend in a closed loop: generate
//! an artifact, validate it through independent channels, learn from the
//! failure, mutate the input with a named strategy, and try again -- up to a
//! bounded attempt budget. Strategy outcomes feed a cross-run memory, so the
//! loop gets better at fixing a backend's habitual mistakes over time.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, error taxonomy, and the ports
//!   (generator, validator channels, analyst, persistence sink)
//! - **Service Layer** (`services`): The engine, strategy selection, and the
//!   memory store
//! - **Adapters** (`adapters`): Concrete port implementations (JSON file
//!   persistence, generator fallback chain, heuristic analyst)
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading and
//!   logging setup
//!
//! # Example
//!
//! ```ignore
//! use anneal::{Config, QualityEngine, MemoryStore, TargetSpec, CancelHandle};
//! use anneal::domain::models::request::GenerationRequest;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let memory = Arc::new(MemoryStore::new(config.memory.clone()));
//!     let engine = QualityEngine::new(config, generator, channels, analyst, memory);
//!
//!     let target = TargetSpec::new("daily-update", GenerationRequest::new("..."));
//!     let result = engine.run(target, CancelHandle::new()).await;
//!     println!("passed: {} after {} attempts", result.success, result.attempts.len());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{FallbackGenerator, HeuristicAnalyst, JsonFileSink, NullSink};
pub use domain::errors::{ConfigError, LoopError};
pub use domain::models::{
    Attempt, CancelHandle, Config, GenerationRequest, MemorySnapshot, MemorySummary, Strategy,
    StrategyCatalog, StrategyCategory, TargetSpec, TaskResult, TaskStatus, ValidationOutcome,
};
pub use domain::ports::{Analyst, GeneratedArtifact, Generator, PersistenceSink, ValidatorChannel};
pub use infrastructure::{ConfigLoader, Logger};
pub use services::{MemoryStore, QualityEngine, StrategySelector};
