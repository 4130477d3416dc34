//! Domain models for the quality loop.

pub mod attempt;
pub mod config;
pub mod confirmation;
pub mod diagnostics;
pub mod events;
pub mod memory;
pub mod request;
pub mod strategy;
pub mod task;

pub use attempt::{Attempt, ArtifactRef, ChannelReport, Issue, IssueCategory, ValidationOutcome};
pub use config::{
    Config, ConfirmationConfig, DiagnosticsConfig, EngineConfig, LoggingConfig, MemoryConfig,
    SelectionConfig,
};
pub use confirmation::{ConfirmationRecord, ConfirmationTracker};
pub use diagnostics::{ChannelStats, DiagnosticState, ValidationMode};
pub use events::LoopEvent;
pub use memory::{MemorySnapshot, MemorySummary, RunRecord, StrategyStats};
pub use request::{Directives, GenerationRequest};
pub use strategy::{Strategy, StrategyCatalog, StrategyCategory, Transform};
pub use task::{CancelHandle, StrategyApplication, TargetSpec, TaskResult, TaskStatus};
