//! Domain layer for the Anneal quality loop.
//!
//! This module contains the core models, the error taxonomy, and the ports
//! callers implement to plug their own generators and validators in.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{ConfigError, LoopError};
