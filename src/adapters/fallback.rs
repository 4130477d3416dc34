//! Generator fallback chain.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::request::GenerationRequest;
use crate::domain::ports::generator::{GeneratedArtifact, Generator};

/// Tries a sequence of generators in order until one produces an artifact.
///
/// The chain exists for backends with per-model quota: when the preferred
/// backend rejects a call, the next one gets a shot at the same request.
/// Only the error from the last backend is surfaced; earlier failures are
/// logged as they happen.
pub struct FallbackGenerator {
    chain: Vec<Arc<dyn Generator>>,
}

impl FallbackGenerator {
    /// Build a chain from the given generators, preferred first.
    ///
    /// An empty chain is legal to construct but fails every call.
    pub fn new(chain: Vec<Arc<dyn Generator>>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl Generator for FallbackGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedArtifact, LoopError> {
        let mut last_error = LoopError::Generation("empty generator chain".to_string());

        for generator in &self.chain {
            match generator.generate(request).await {
                Ok(artifact) => return Ok(artifact),
                Err(err) => {
                    tracing::warn!(
                        backend = generator.name(),
                        error = %err,
                        "generator backend failed; trying next in chain"
                    );
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    fn name(&self) -> &str {
        "fallback_chain"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
