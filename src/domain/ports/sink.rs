//! Persistence sink port.

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::memory::MemorySnapshot;

/// Durable storage for the memory snapshot.
///
/// Persistence is strictly best-effort: the memory store logs sink failures
/// and keeps running on in-memory state, so implementations should report
/// errors honestly rather than retrying forever.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Load the previously saved snapshot, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Persistence`] when storage exists but cannot be
    /// read or parsed. A missing snapshot is `Ok(None)`, not an error.
    async fn load(&self) -> Result<Option<MemorySnapshot>, LoopError>;

    /// Save the full snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Persistence`] when the write fails.
    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), LoopError>;
}
