//! End-to-end tests for the generation loop: scripted generators and
//! validator channels driving the engine through its terminal states.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use anneal::domain::models::attempt::{ArtifactRef, ChannelReport, Issue, IssueCategory};
use anneal::domain::models::config::MemoryConfig;
use anneal::domain::models::request::GenerationRequest;
use anneal::domain::models::strategy::{StrategyCatalog, StrategyCategory};
use anneal::domain::ports::analyst::{Analyst, Diagnosis};
use anneal::{
    CancelHandle, Config, GeneratedArtifact, Generator, JsonFileSink, LoopError, MemoryStore,
    QualityEngine, TargetSpec, TaskStatus, ValidatorChannel,
};

struct ScriptedGenerator {
    calls: AtomicU32,
    cancel_on_call: Option<(u32, CancelHandle)>,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            cancel_on_call: None,
        }
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedArtifact, LoopError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((when, handle)) = &self.cancel_on_call {
            if call == *when {
                handle.cancel();
            }
        }
        Ok(GeneratedArtifact::new(ArtifactRef::new(format!(
            "artifact-{call}"
        ))))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A channel with a fixed verdict for every attempt.
struct ConstantChannel {
    name: String,
    pass: bool,
}

#[async_trait]
impl ValidatorChannel for ConstantChannel {
    async fn validate(
        &self,
        _artifact: &ArtifactRef,
        _request: &GenerationRequest,
    ) -> Result<ChannelReport, LoopError> {
        if self.pass {
            Ok(ChannelReport::passing(92.0))
        } else {
            Ok(ChannelReport::failing(
                30.0,
                vec![Issue::new(IssueCategory::Rendering, "smeared text")],
            ))
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A failing channel whose score follows a per-attempt script.
struct DecliningChannel {
    name: String,
    scores: Vec<f64>,
    seen: AtomicU32,
}

#[async_trait]
impl ValidatorChannel for DecliningChannel {
    async fn validate(
        &self,
        _artifact: &ArtifactRef,
        _request: &GenerationRequest,
    ) -> Result<ChannelReport, LoopError> {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) as usize;
        let score = self.scores.get(n).copied().unwrap_or(0.0);
        Ok(ChannelReport::failing(
            score,
            vec![Issue::new(IssueCategory::Rendering, "smeared text")],
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

struct SilentAnalyst;

#[async_trait]
impl Analyst for SilentAnalyst {
    async fn diagnose(
        &self,
        _failed: &anneal::Attempt,
        _history: &[anneal::Attempt],
    ) -> Result<Diagnosis, LoopError> {
        Ok(Diagnosis::default())
    }
}

#[tokio::test]
async fn test_broken_channel_is_disabled_and_run_recovers() {
    // Vision passes everything, OCR fails everything. After ten attempts the
    // divergence is conclusive: OCR gets disabled and the next attempt
    // passes on vision alone, capped below a perfect score.
    let memory = Arc::new(MemoryStore::new(MemoryConfig::default()));
    let engine = QualityEngine::new(
        Config::default(),
        Arc::new(ScriptedGenerator::new()),
        vec![
            Arc::new(ConstantChannel {
                name: "vision".to_string(),
                pass: true,
            }),
            Arc::new(ConstantChannel {
                name: "ocr".to_string(),
                pass: false,
            }),
        ],
        Arc::new(SilentAnalyst),
        memory,
    );

    let target = TargetSpec::new("degraded-recovery", GenerationRequest::new("prompt"));
    let result = engine.run(target, CancelHandle::new()).await;

    assert!(result.success, "run should succeed once OCR is disabled");
    assert_eq!(result.attempts.len(), 11);
    assert!(
        result.final_score <= 95.0,
        "degraded mode must cap the score, got {}",
        result.final_score
    );

    // The passing attempt validated through vision only.
    let last = result.attempts.last().unwrap();
    let validation = last.validation.as_ref().unwrap();
    assert_eq!(validation.channel_reports.len(), 1);
    assert_eq!(validation.channel_reports[0].0, "vision");
}

#[tokio::test]
async fn test_strategies_exhausted_with_small_catalog() {
    let catalog = StrategyCatalog::standard();
    let one_strategy = StrategyCatalog::new(vec![
        catalog.get("shorten_commentary").cloned().unwrap(),
    ]);

    let memory = Arc::new(MemoryStore::new(MemoryConfig::default()));
    let engine = QualityEngine::with_catalog(
        Config::default(),
        Arc::new(ScriptedGenerator::new()),
        vec![Arc::new(ConstantChannel {
            name: "vision".to_string(),
            pass: false,
        })],
        Arc::new(SilentAnalyst),
        memory,
        one_strategy,
    );

    let target = TargetSpec::new("no-options", GenerationRequest::new("prompt"));
    let result = engine.run(target, CancelHandle::new()).await;

    assert!(!result.success);
    assert_eq!(result.status, TaskStatus::StrategiesExhausted);
    // One raw attempt, one attempt with the only strategy, then nothing left.
    assert_eq!(result.attempts.len(), 2);
    assert_eq!(result.strategies_applied.len(), 1);
    assert_eq!(result.strategies_applied[0].strategy, "shorten_commentary");
}

#[tokio::test]
async fn test_strategy_exhaustion_reports_best_score() {
    let catalog = StrategyCatalog::standard();
    let one_strategy = StrategyCatalog::new(vec![
        catalog.get("shorten_commentary").cloned().unwrap(),
    ]);

    let memory = Arc::new(MemoryStore::new(MemoryConfig::default()));
    let engine = QualityEngine::with_catalog(
        Config::default(),
        Arc::new(ScriptedGenerator::new()),
        vec![Arc::new(DecliningChannel {
            name: "vision".to_string(),
            scores: vec![80.0, 40.0],
            seen: AtomicU32::new(0),
        })],
        Arc::new(SilentAnalyst),
        memory,
        one_strategy,
    );

    let target = TargetSpec::new("declining", GenerationRequest::new("prompt"));
    let result = engine.run(target, CancelHandle::new()).await;

    assert_eq!(result.status, TaskStatus::StrategiesExhausted);
    assert_eq!(result.attempts.len(), 2);
    // The first attempt scored higher than the last; the run reports it.
    assert_eq!(result.best_score, 80.0);
    assert_eq!(result.final_score, 80.0);
}

#[tokio::test]
async fn test_cancellation_between_attempts() {
    let mut generator = ScriptedGenerator::new();
    let cancel = CancelHandle::new();
    generator.cancel_on_call = Some((1, cancel.clone()));

    let memory = Arc::new(MemoryStore::new(MemoryConfig::default()));
    let engine = QualityEngine::new(
        Config::default(),
        Arc::new(generator),
        vec![Arc::new(ConstantChannel {
            name: "vision".to_string(),
            pass: false,
        })],
        Arc::new(SilentAnalyst),
        memory,
    );

    let target = TargetSpec::new("cancelled-mid-run", GenerationRequest::new("prompt"));
    let result = engine.run(target, cancel).await;

    // The in-flight attempt completes; the next loop iteration observes the
    // flag and stops.
    assert_eq!(result.status, TaskStatus::Cancelled);
    assert_eq!(result.attempts.len(), 1);
}

#[tokio::test]
async fn test_strategy_rotation_escalates_categories() {
    let memory = Arc::new(MemoryStore::new(MemoryConfig::default()));
    let engine = QualityEngine::new(
        Config::default(),
        Arc::new(ScriptedGenerator::new()),
        vec![Arc::new(ConstantChannel {
            name: "vision".to_string(),
            pass: false,
        })],
        Arc::new(SilentAnalyst),
        memory,
    );

    let target =
        TargetSpec::new("rotation", GenerationRequest::new("prompt")).with_max_attempts(8);
    let result = engine.run(target, CancelHandle::new()).await;

    assert_eq!(result.status, TaskStatus::Exhausted);
    let categories: Vec<&str> = result
        .strategies_applied
        .iter()
        .map(|s| s.category.as_str())
        .collect();
    // Early selections come from text optimization, later ones from the
    // visual formatting window.
    assert_eq!(categories[0], StrategyCategory::TextOptimization.as_str());
    assert!(
        categories
            .iter()
            .any(|c| *c == StrategyCategory::VisualFormatting.as_str()),
        "rotation never reached visual formatting: {categories:?}"
    );
}

#[tokio::test]
async fn test_learning_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.json");

    // First engine: every attempt fails, strategies accumulate failures.
    {
        let sink = Arc::new(JsonFileSink::new(&path));
        let memory = Arc::new(MemoryStore::with_sink(MemoryConfig::default(), sink));
        memory.hydrate().await;
        let engine = QualityEngine::new(
            Config::default(),
            Arc::new(ScriptedGenerator::new()),
            vec![Arc::new(ConstantChannel {
                name: "vision".to_string(),
                pass: false,
            })],
            Arc::new(SilentAnalyst),
            Arc::clone(&memory),
        );
        let target =
            TargetSpec::new("first-run", GenerationRequest::new("prompt")).with_max_attempts(3);
        let result = engine.run(target, CancelHandle::new()).await;
        assert_eq!(result.status, TaskStatus::Exhausted);
    }

    // Second store hydrates what the first persisted.
    let sink = Arc::new(JsonFileSink::new(&path));
    let memory = MemoryStore::with_sink(MemoryConfig::default(), sink);
    memory.hydrate().await;

    let summary = memory.summary();
    assert_eq!(summary.total_runs, 1);
    assert_eq!(summary.successful_runs, 0);
    assert!(
        !summary.top_strategies.is_empty(),
        "strategy outcomes should have been persisted"
    );
    // Every recorded strategy failed, so its rate sits below the initial 0.5.
    for (name, rate) in &summary.top_strategies {
        assert!(*rate < 0.5, "strategy {name} should have a depressed rate");
    }
}
