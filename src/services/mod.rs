//! Service layer: the generation loop and the components it composes.

pub mod engine;
pub mod memory_store;
pub mod selection;

pub use engine::QualityEngine;
pub use memory_store::MemoryStore;
pub use selection::{SelectedStrategy, StrategySelector};
