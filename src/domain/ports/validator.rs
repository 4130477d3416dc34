//! Validator channel port.

use async_trait::async_trait;

use crate::domain::errors::LoopError;
use crate::domain::models::attempt::{ArtifactRef, ChannelReport};
use crate::domain::models::request::GenerationRequest;

/// One independent quality check over a produced artifact.
///
/// Channels are evaluated independently per attempt; combined success
/// requires every active channel to pass. A channel that errors or times
/// out is recorded as a failing verdict, never as a crash -- and feeds the
/// self-diagnostic monitor like any other failure.
#[async_trait]
pub trait ValidatorChannel: Send + Sync {
    /// Judge the artifact against the request that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`LoopError::Validation`] when the channel cannot produce a
    /// verdict at all. The loop converts this into a failing report with a
    /// score of 0.
    async fn validate(
        &self,
        artifact: &ArtifactRef,
        request: &GenerationRequest,
    ) -> Result<ChannelReport, LoopError>;

    /// Stable channel name, used for diagnostics bookkeeping and reports.
    fn name(&self) -> &str;
}
