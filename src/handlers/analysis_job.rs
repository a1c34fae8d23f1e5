use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::models::{AnalysisFailure, AnalysisResult, CapturedImage, FailureKind};
use crate::services::strategy::{ModelRequestStrategy, StrategyOutcome};
use crate::services::transport::ModelTransport;
use crate::services::{extractor, prompt, staging};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, PartialEq, Eq)]
pub enum JobError {
    /// Analysis requested before any picture was captured.
    NoImage,
    /// One invocation at a time; cancel the running one first.
    AlreadyRunning,
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobError::NoImage => "no picture has been captured yet",
            JobError::AlreadyRunning => "an analysis is already running",
        };
        write!(f, "{}", s)
    }
}

impl std::error::Error for JobError {}

/// Runs the staging → strategy → extraction pipeline off the interactive
/// context and delivers exactly one result per invocation back through the
/// channel handed out at construction. Cancellation is cooperative: the
/// flag is checked between remote attempts, and a response that lands
/// after cancellation was requested is discarded.
pub struct AnalysisJob {
    strategy: Arc<ModelRequestStrategy>,
    state: Arc<Mutex<JobState>>,
    cancelled: Arc<AtomicBool>,
    outcome_tx: mpsc::Sender<AnalysisResult>,
}

impl AnalysisJob {
    /// Wiring happens once, here: the returned receiver is the one
    /// delivery path to the presentation side.
    pub fn new(
        transport: Arc<dyn ModelTransport>,
        config: Arc<AppConfig>,
    ) -> (Self, mpsc::Receiver<AnalysisResult>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(1);
        let job = Self {
            strategy: Arc::new(ModelRequestStrategy::new(transport, config)),
            state: Arc::new(Mutex::new(JobState::Idle)),
            cancelled: Arc::new(AtomicBool::new(false)),
            outcome_tx,
        };
        (job, outcome_rx)
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap()
    }

    pub fn start(&self, image: Option<CapturedImage>) -> Result<(), JobError> {
        let image = image.ok_or(JobError::NoImage)?;

        {
            let mut state = self.state.lock().unwrap();
            if *state == JobState::Running {
                return Err(JobError::AlreadyRunning);
            }
            // Reset under the same lock cancel() takes, so a late cancel
            // of the previous invocation cannot leak into this one.
            self.cancelled.store(false, Ordering::SeqCst);
            *state = JobState::Running;
        }

        let started_at = Utc::now();
        log::info!("📸 Analysis started ({}x{} frame)", image.width, image.height);

        let strategy = self.strategy.clone();
        let state = self.state.clone();
        let cancelled = self.cancelled.clone();
        let outcome_tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            run_pipeline(strategy, state, cancelled, outcome_tx, image, started_at).await;
        });

        Ok(())
    }

    /// Cooperative: an attempt already in flight is not killed, but its
    /// result will be discarded and the terminal state forced to Cancelled.
    pub fn cancel(&self) {
        let state = self.state.lock().unwrap();
        if *state == JobState::Running {
            self.cancelled.store(true, Ordering::SeqCst);
            log::info!("🛑 Cancellation requested");
        }
    }
}

async fn run_pipeline(
    strategy: Arc<ModelRequestStrategy>,
    state: Arc<Mutex<JobState>>,
    cancelled: Arc<AtomicBool>,
    outcome_tx: mpsc::Sender<AnalysisResult>,
    image: CapturedImage,
    started_at: DateTime<Utc>,
) {
    let mut result = analyze(&strategy, &cancelled, image).await;

    if cancelled.load(Ordering::SeqCst) {
        result = AnalysisResult::Failure(AnalysisFailure::cancelled());
    }

    let terminal = match &result {
        AnalysisResult::Success(_) => JobState::Completed,
        AnalysisResult::Failure(f) if f.kind == FailureKind::Cancelled => JobState::Cancelled,
        AnalysisResult::Failure(_) => JobState::Failed,
    };
    *state.lock().unwrap() = terminal;

    let elapsed = Utc::now() - started_at;
    log::info!(
        "🏁 Analysis finished after {}ms: {:?}",
        elapsed.num_milliseconds(),
        terminal
    );

    if outcome_tx.send(result).await.is_err() {
        log::warn!("⚠️ Listener went away before the result could be delivered");
    }
}

async fn analyze(
    strategy: &ModelRequestStrategy,
    cancelled: &AtomicBool,
    image: CapturedImage,
) -> AnalysisResult {
    // The staged artifact lives exactly as long as this function: success,
    // failure or cancellation, the temp file is gone when we return.
    let staged = match staging::stage(&image) {
        Ok(staged) => staged,
        Err(e) => {
            log::error!("💾 Staging failed: {}", e);
            return AnalysisResult::Failure(AnalysisFailure::io(&e));
        }
    };

    let prompt_text = prompt::build();
    let report = strategy.run(&prompt_text, &staged, cancelled).await;
    log::info!("📡 Strategy finished after {} attempt(s)", report.attempts.len());
    for attempt in &report.attempts {
        log::debug!(
            "  ↳ {} via {}: {}",
            attempt.tier,
            attempt.target,
            if attempt.ok { "ok" } else { "failed" }
        );
    }

    match report.outcome {
        StrategyOutcome::MissingCredentials => {
            AnalysisResult::Failure(AnalysisFailure::credential_missing())
        }
        StrategyOutcome::Cancelled => AnalysisResult::Failure(AnalysisFailure::cancelled()),
        StrategyOutcome::Text(raw) => extractor::extract(&raw),
    }
}
