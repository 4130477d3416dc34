//! JSON file persistence for the memory snapshot.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::memory::MemorySnapshot;
use crate::domain::ports::sink::PersistenceSink;

/// Stores the whole memory snapshot as one pretty-printed JSON file.
///
/// Writes go through a sibling temp file and an atomic rename, so a crash
/// mid-write leaves the previous snapshot intact rather than a truncated
/// file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Create a sink writing to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this sink reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PersistenceSink for JsonFileSink {
    async fn load(&self) -> Result<Option<MemorySnapshot>, LoopError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(LoopError::Persistence(format!(
                    "read {}: {err}",
                    self.path.display()
                )));
            }
        };
        let snapshot: MemorySnapshot = serde_json::from_str(&raw).map_err(|err| {
            LoopError::Persistence(format!("parse {}: {err}", self.path.display()))
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &MemorySnapshot) -> Result<(), LoopError> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|err| LoopError::Persistence(format!("serialize snapshot: {err}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|err| {
                    LoopError::Persistence(format!("create {}: {err}", parent.display()))
                })?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|err| {
            LoopError::Persistence(format!("write {}: {err}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|err| {
            LoopError::Persistence(format!("rename {}: {err}", self.path.display()))
        })?;
        Ok(())
    }
}

/// A sink that stores nothing. Useful for tests and one-off runs where
/// cross-run learning is not wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl PersistenceSink for NullSink {
    async fn load(&self) -> Result<Option<MemorySnapshot>, LoopError> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &MemorySnapshot) -> Result<(), LoopError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::memory::StrategyStats;

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("memory.json"));
        assert!(sink.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("memory.json"));

        let mut snapshot = MemorySnapshot::default();
        snapshot.strategies.insert(
            "box_formatting".to_string(),
            StrategyStats::with_initial_rate(0.5),
        );

        sink.save(&snapshot).await.unwrap();
        let loaded = sink.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("nested/state/memory.json"));
        sink.save(&MemorySnapshot::default()).await.unwrap();
        assert!(sink.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        let sink = JsonFileSink::new(path);
        assert!(matches!(
            sink.load().await,
            Err(LoopError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_null_sink_is_empty() {
        let sink = NullSink;
        sink.save(&MemorySnapshot::default()).await.unwrap();
        assert!(sink.load().await.unwrap().is_none());
    }
}
