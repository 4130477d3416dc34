//! The adaptive generation loop.
//!
//! One engine instance drives one or more targets through the
//! generate-validate-learn-retry cycle. The engine owns the strategy
//! selector and the confirmation tracker; per-run state (attempt history,
//! validator diagnostics, tried-strategy set) lives on the stack of
//! [`QualityEngine::run`] so concurrent targets never share it.
//!
//! A run always ends in a structured [`TaskResult`]. Generation errors and
//! validator errors are folded into the attempt history; only the caller's
//! own panic can escape the loop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::domain::errors::LoopError;
use crate::domain::models::attempt::{
    ArtifactRef, Attempt, ChannelReport, Issue, IssueCategory, ValidationOutcome,
};
use crate::domain::models::config::Config;
use crate::domain::models::diagnostics::DiagnosticState;
use crate::domain::models::confirmation::ConfirmationTracker;
use crate::domain::models::events::LoopEvent;
use crate::domain::models::request::GenerationRequest;
use crate::domain::models::strategy::StrategyCatalog;
use crate::domain::models::task::{
    CancelHandle, StrategyApplication, TargetSpec, TaskResult, TaskStatus,
};
use crate::domain::ports::analyst::{Analyst, Diagnosis};
use crate::domain::ports::generator::{GeneratedArtifact, Generator};
use crate::domain::ports::validator::ValidatorChannel;
use crate::services::memory_store::MemoryStore;
use crate::services::selection::{SelectedStrategy, StrategySelector};

/// Drives targets through the generation loop.
pub struct QualityEngine<G, A>
where
    G: Generator,
    A: Analyst,
{
    generator: Arc<G>,
    analyst: Arc<A>,
    channels: Vec<Arc<dyn ValidatorChannel>>,
    memory: Arc<MemoryStore>,
    selector: StrategySelector,
    confirmation: ConfirmationTracker,
    config: Config,
}

impl<G, A> QualityEngine<G, A>
where
    G: Generator,
    A: Analyst,
{
    /// Create an engine with the standard strategy catalog.
    pub fn new(
        config: Config,
        generator: Arc<G>,
        channels: Vec<Arc<dyn ValidatorChannel>>,
        analyst: Arc<A>,
        memory: Arc<MemoryStore>,
    ) -> Self {
        Self::with_catalog(
            config,
            generator,
            channels,
            analyst,
            memory,
            StrategyCatalog::standard(),
        )
    }

    /// Create an engine with an explicit strategy catalog.
    pub fn with_catalog(
        config: Config,
        generator: Arc<G>,
        channels: Vec<Arc<dyn ValidatorChannel>>,
        analyst: Arc<A>,
        memory: Arc<MemoryStore>,
        catalog: StrategyCatalog,
    ) -> Self {
        let selector = StrategySelector::new(catalog, config.selection.clone());
        let confirmation = ConfirmationTracker::with_thresholds(
            config.confirmation.confirm_threshold,
            config.confirmation.blacklist_threshold,
        );
        Self {
            generator,
            analyst,
            channels,
            memory,
            selector,
            confirmation,
            config,
        }
    }

    /// Run one target to a terminal state.
    ///
    /// Cancellation is cooperative: the handle is checked between attempts,
    /// never mid-call. The returned result is also recorded to the memory
    /// store before this method returns.
    pub async fn run(&self, target: TargetSpec, cancel: CancelHandle) -> TaskResult {
        let started_at = Utc::now();
        let max_attempts = target
            .max_attempts
            .unwrap_or(self.config.engine.max_attempts)
            .max(1);

        let mut diagnostics = DiagnosticState::with_thresholds(
            self.config.diagnostics.min_samples,
            self.config.diagnostics.failure_threshold,
            self.config.diagnostics.success_threshold,
        );
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut strategies_applied: Vec<StrategyApplication> = Vec::new();
        let mut tried: HashSet<String> = HashSet::new();
        let mut current_input = target.initial_input.clone();
        let mut pending: Option<SelectedStrategy> = None;

        let status = loop {
            if cancel.is_cancelled() {
                tracing::info!(target_name = %target.name, "cancellation requested");
                break TaskStatus::Cancelled;
            }
            if attempts.len() as u32 >= max_attempts {
                break TaskStatus::Exhausted;
            }

            let attempt_number = attempts.len() as u32 + 1;
            LoopEvent::AttemptStarted {
                target: target.name.clone(),
                attempt: attempt_number,
                max_attempts,
            }
            .emit();

            let clock = Instant::now();
            let generated = self.generate_with_deadline(&current_input).await;

            let attempt = match generated {
                Err(err) => {
                    tracing::warn!(
                        target_name = %target.name,
                        attempt = attempt_number,
                        error = %err,
                        "generation failed"
                    );
                    Attempt {
                        number: attempt_number,
                        input: current_input.clone(),
                        strategy_applied: pending.as_ref().map(|s| s.strategy.name.clone()),
                        artifact: None,
                        validation: None,
                        generation_error: Some(err.to_string()),
                        duration_ms: clock.elapsed().as_millis() as u64,
                        cost_estimate: 0.0,
                        recorded_at: Utc::now(),
                    }
                }
                Ok(generated) => {
                    let outcome = self
                        .validate(&generated.artifact, &current_input, &mut diagnostics)
                        .await;
                    Attempt {
                        number: attempt_number,
                        input: current_input.clone(),
                        strategy_applied: pending.as_ref().map(|s| s.strategy.name.clone()),
                        artifact: Some(generated.artifact),
                        validation: Some(outcome),
                        generation_error: None,
                        duration_ms: clock.elapsed().as_millis() as u64,
                        cost_estimate: generated
                            .cost
                            .unwrap_or(self.config.engine.cost_per_attempt),
                        recorded_at: Utc::now(),
                    }
                }
            };

            LoopEvent::AttemptFinished {
                target: target.name.clone(),
                attempt: attempt_number,
                score: attempt.score(),
                passed: attempt.passed(),
            }
            .emit();

            let generation_failed = attempt.generation_error.is_some();
            let passed = attempt.passed();
            if !generation_failed {
                self.memory.record_attempt(passed);
            }
            attempts.push(attempt);

            // Confirmation and rate learning only apply when the strategy's
            // output was actually validated. A generation failure says
            // nothing about the strategy's content.
            let mut substitute: Option<SelectedStrategy> = None;
            if !generation_failed {
                if let Some(selected) = &pending {
                    substitute = self.learn_from_outcome(selected, passed, &tried);
                }
            }

            if passed {
                break TaskStatus::Succeeded;
            }
            if generation_failed {
                // Retry the same input; the attempt budget is the backstop.
                continue;
            }
            if attempts.len() as u32 >= max_attempts {
                // No point selecting a strategy that will never run.
                break TaskStatus::Exhausted;
            }

            let diagnosis = self.diagnose(&attempts).await;

            let next = if let Some(sub) = substitute {
                Some(sub)
            } else {
                match self.selector.select(
                    attempts.len() as u32,
                    &tried,
                    &diagnosis,
                    &self.memory,
                    &self.confirmation,
                ) {
                    Ok(selected) => Some(selected),
                    Err(LoopError::StrategiesExhausted { .. }) => {
                        break TaskStatus::StrategiesExhausted;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "strategy selection failed");
                        break TaskStatus::StrategiesExhausted;
                    }
                }
            };

            if let Some(selected) = next {
                tried.insert(selected.strategy.name.clone());
                LoopEvent::StrategySelected {
                    target: target.name.clone(),
                    strategy: selected.strategy.name.clone(),
                    category: selected.strategy.category.as_str().to_string(),
                    confidence: selected.confidence,
                }
                .emit();
                strategies_applied.push(StrategyApplication {
                    attempt: attempt_number + 1,
                    strategy: selected.strategy.name.clone(),
                    category: selected.strategy.category.as_str().to_string(),
                    confidence: selected.confidence,
                });
                current_input = selected.strategy.transform.apply(&current_input);
                pending = Some(selected);
            }
        };

        let best_score = attempts
            .iter()
            .map(Attempt::score)
            .fold(0.0_f64, f64::max);
        // An exhausted run reports its best attempt, not whatever the last
        // strategy happened to score.
        let final_score = if matches!(
            status,
            TaskStatus::Exhausted | TaskStatus::StrategiesExhausted
        ) {
            best_score
        } else {
            attempts.last().map_or(0.0, Attempt::score)
        };

        let result = TaskResult {
            task_id: target.id,
            name: target.name.clone(),
            success: status == TaskStatus::Succeeded,
            status,
            final_score,
            best_score,
            strategies_applied,
            total_duration_ms: attempts.iter().map(|a| a.duration_ms).sum(),
            total_cost: attempts.iter().map(|a| a.cost_estimate).sum(),
            attempts,
            started_at,
            finished_at: Utc::now(),
        };

        LoopEvent::TaskFinished {
            target: result.name.clone(),
            status: result.status,
            final_score: result.final_score,
            attempts: result.attempts.len() as u32,
        }
        .emit();

        self.memory.record_task_result(&result).await;
        result
    }

    async fn generate_with_deadline(
        &self,
        input: &GenerationRequest,
    ) -> Result<GeneratedArtifact, LoopError> {
        let deadline = Duration::from_millis(self.config.engine.generator_timeout_ms);
        match tokio::time::timeout(deadline, self.generator.generate(input)).await {
            Ok(result) => result,
            Err(_) => Err(LoopError::Timeout {
                operation: format!("generator '{}'", self.generator.name()),
                timeout_ms: self.config.engine.generator_timeout_ms,
            }),
        }
    }

    /// Run every active validator channel and combine the verdicts.
    ///
    /// Combined success requires every active channel to pass, in which
    /// case the score is 100; otherwise the score is the minimum across the
    /// channels that reported. Degraded mode caps the score: without full
    /// validation the loop never claims a perfect artifact.
    async fn validate(
        &self,
        artifact: &ArtifactRef,
        input: &GenerationRequest,
        diagnostics: &mut DiagnosticState,
    ) -> ValidationOutcome {
        let deadline = Duration::from_millis(self.config.engine.validator_timeout_ms);

        // Channels are independent, so they judge the artifact concurrently.
        let verdicts = futures::future::join_all(
            self.channels
                .iter()
                .filter(|channel| diagnostics.is_active(channel.name()))
                .map(|channel| async move {
                    let verdict =
                        match tokio::time::timeout(deadline, channel.validate(artifact, input))
                            .await
                        {
                            Ok(Ok(report)) => report,
                            Ok(Err(err)) => {
                                tracing::warn!(
                                    channel = channel.name(),
                                    error = %err,
                                    "validator error"
                                );
                                ChannelReport::failing(
                                    0.0,
                                    vec![Issue::new(
                                        IssueCategory::Other("channel_error".to_string()),
                                        err.to_string(),
                                    )],
                                )
                            }
                            Err(_) => {
                                tracing::warn!(
                                    channel = channel.name(),
                                    timeout_ms = self.config.engine.validator_timeout_ms,
                                    "validator timed out"
                                );
                                ChannelReport::failing(
                                    0.0,
                                    vec![Issue::new(
                                        IssueCategory::Other("channel_timeout".to_string()),
                                        "validator deadline exceeded",
                                    )],
                                )
                            }
                        };
                    (channel.name().to_string(), verdict)
                }),
        )
        .await;

        let mut reports: Vec<(String, ChannelReport)> = Vec::with_capacity(verdicts.len());
        for (name, verdict) in verdicts {
            diagnostics.record(&name, verdict.pass);
            reports.push((name, verdict));
        }

        if let Some(disabled) = diagnostics.evaluate() {
            LoopEvent::ChannelDisabled { channel: disabled }.emit();
        }

        let all_pass = !reports.is_empty() && reports.iter().all(|(_, r)| r.pass);
        let mut score = if all_pass {
            100.0
        } else if reports.is_empty() {
            // No channel reported, so nothing vouches for the artifact.
            0.0
        } else {
            reports
                .iter()
                .map(|(_, r)| r.score)
                .fold(f64::INFINITY, f64::min)
                .min(100.0)
                .max(0.0)
        };
        if diagnostics.mode.is_degraded() {
            score = score.min(self.config.engine.degraded_score_cap);
        }

        ValidationOutcome {
            score,
            pass: all_pass,
            channel_reports: reports,
        }
    }

    /// Update confirmation and rate state for the strategy behind an
    /// attempt. Returns a substitute from a different, untried category when
    /// the outcome pushed the strategy over the blacklist threshold.
    fn learn_from_outcome(
        &self,
        selected: &SelectedStrategy,
        passed: bool,
        tried: &HashSet<String>,
    ) -> Option<SelectedStrategy> {
        let name = &selected.strategy.name;
        self.memory.record_strategy_outcome(name, passed);
        self.confirmation.record_outcome(name, passed);

        if self.confirmation.is_confirmed(name) && !self.memory.is_confirmed(name) {
            self.memory.mark_confirmed(name);
            LoopEvent::StrategyConfirmed {
                strategy: name.clone(),
            }
            .emit();
        }

        if !passed && self.confirmation.should_skip(name) && !self.memory.is_blacklisted(name) {
            self.memory.mark_blacklisted(name);
            let substitute =
                self.selector
                    .substitute(&selected.strategy, tried, &self.memory, &self.confirmation);
            LoopEvent::StrategyBlacklisted {
                strategy: name.clone(),
                substitute: substitute.as_ref().map(|s| s.strategy.name.clone()),
            }
            .emit();
            return substitute;
        }

        None
    }

    async fn diagnose(&self, attempts: &[Attempt]) -> Diagnosis {
        let Some(last) = attempts.last() else {
            return Diagnosis::default();
        };
        match self.analyst.diagnose(last, attempts).await {
            Ok(diagnosis) => diagnosis,
            Err(err) => {
                tracing::warn!(error = %err, "analyst failed; selecting without a diagnosis");
                Diagnosis::default()
            }
        }
    }

    /// The confirmation tracker shared across this engine's runs.
    pub const fn confirmation(&self) -> &ConfirmationTracker {
        &self.confirmation
    }

    /// The memory store backing this engine.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
