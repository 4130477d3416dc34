//! Structured logging setup.

pub mod logger;

pub use logger::Logger;
