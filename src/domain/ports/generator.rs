//! Generator port.

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::attempt::ArtifactRef;
use crate::domain::models::request::GenerationRequest;

/// A produced artifact plus its accounting metadata.
#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    /// Opaque handle to the artifact.
    pub artifact: ArtifactRef,
    /// Cost of this single generation call, in dollars. `None` when the
    /// backend does not report cost.
    pub cost: Option<f64>,
}

impl GeneratedArtifact {
    /// Wrap an artifact reference with no cost information.
    pub const fn new(artifact: ArtifactRef) -> Self {
        Self {
            artifact,
            cost: None,
        }
    }
}

/// Produces an artifact from a generation request.
///
/// Implementations wrap whatever backend actually renders artifacts. The
/// loop imposes a deadline on every call; a call that outlives its deadline
/// is abandoned and counted as a failed attempt, so implementations should
/// be safe to drop mid-flight.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Render the request into an artifact.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Generation`] when the backend fails. The loop
    /// records the failure against the attempt budget and retries.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedArtifact, LoopError>;

    /// Stable name for logs and fallback-chain reporting.
    fn name(&self) -> &str;
}
