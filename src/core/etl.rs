use crate::domain::model::{LoadResult, Provisioning, VerificationOutcome};
use crate::domain::ports::{Loader, RecordSource, SinkProvisioner, Transformer, Verifier};
use crate::utils::error::{EtlError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Mismatches quoted in a `VerificationMismatch` error.
const MISMATCH_DETAIL_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Provisioning,
    Extracting,
    Transforming,
    Loading,
    Verifying,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Provisioning => "provisioning",
            PipelineState::Extracting => "extracting",
            PipelineState::Transforming => "transforming",
            PipelineState::Loading => "loading",
            PipelineState::Verifying => "verifying",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The step a run stopped in, and why.
#[derive(Debug, Error)]
#[error("pipeline failed while {stage}: {source}")]
pub struct PipelineFailure {
    pub stage: PipelineState,
    pub source: EtlError,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pipeline: String,
    pub source: String,
    pub sink: String,
    pub provisioning: Provisioning,
    pub records_extracted: usize,
    pub load: LoadResult,
    pub verification: VerificationOutcome,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Runs provision, extract, transform, load and verify in that order.
///
/// The engine is a one-shot state machine: `run` starts only from `Idle` and
/// ends in `Done` or `Failed`. Call `reset` to run it again.
pub struct EtlEngine<S, T, K> {
    name: String,
    source: S,
    transformer: T,
    sink: K,
    state: PipelineState,
    strict_verification: bool,
    monitor: SystemMonitor,
}

impl<S, T, K> EtlEngine<S, T, K>
where
    S: RecordSource,
    T: Transformer<Input = S::Record>,
    K: SinkProvisioner + Verifier<Record = T::Output>,
{
    pub fn new(name: impl Into<String>, source: S, transformer: T, sink: K) -> Self {
        Self {
            name: name.into(),
            source,
            transformer,
            sink,
            state: PipelineState::Idle,
            strict_verification: true,
            monitor: SystemMonitor::default(),
        }
    }

    /// Lenient verification reports mismatches instead of failing the run.
    pub fn with_strict_verification(mut self, strict: bool) -> Self {
        self.strict_verification = strict;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Return a finished engine to `Idle`.
    pub fn reset(&mut self) -> Result<()> {
        if !self.state.is_terminal() {
            return Err(EtlError::InvalidState {
                state: self.state.to_string(),
            });
        }
        self.state = PipelineState::Idle;
        Ok(())
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!("{}: {} -> {}", self.name, self.state, state);
        self.state = state;
    }

    fn fail(&mut self, error: EtlError) -> PipelineFailure {
        let stage = self.state;
        self.state = PipelineState::Failed;
        tracing::debug!("{} failed while {}: {}", self.name, stage, error);
        PipelineFailure {
            stage,
            source: error,
        }
    }

    pub fn run(&mut self) -> std::result::Result<RunReport, PipelineFailure> {
        if self.state != PipelineState::Idle {
            return Err(PipelineFailure {
                stage: self.state,
                source: EtlError::InvalidState {
                    state: self.state.to_string(),
                },
            });
        }

        let started_at = Utc::now();
        tracing::info!(
            "🚀 Starting {}: {} -> {}",
            self.name,
            self.source.describe(),
            self.sink.describe()
        );

        self.enter(PipelineState::Provisioning);
        let provisioning = self.sink.provision().map_err(|e| self.fail(e))?;
        self.monitor.log_stats("Provisioning");

        self.enter(PipelineState::Extracting);
        let raw = self.source.read_records().map_err(|e| self.fail(e))?;
        let records_extracted = raw.len();
        tracing::info!("Extracted {} records", records_extracted);
        self.monitor.log_stats("Extracting");

        self.enter(PipelineState::Transforming);
        let transformed: Result<Vec<T::Output>> = raw
            .into_iter()
            .map(|record| self.transformer.transform(record))
            .collect();
        let transformed = transformed.map_err(|e| self.fail(e))?;
        tracing::info!("Transformed {} records", transformed.len());
        self.monitor.log_stats("Transforming");

        self.enter(PipelineState::Loading);
        let load = self.sink.load(&transformed).map_err(|e| self.fail(e))?;
        if !load.confirmed {
            tracing::warn!("Load of {} records was not confirmed by the sink", transformed.len());
        }
        tracing::info!("Loaded {} records", load.records_written);
        self.monitor.log_stats("Loading");

        self.enter(PipelineState::Verifying);
        let verification = self.sink.verify(&transformed).map_err(|e| self.fail(e))?;
        if !verification.is_match() {
            let detail = verification
                .mismatches
                .iter()
                .take(MISMATCH_DETAIL_LIMIT)
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            if self.strict_verification {
                return Err(self.fail(EtlError::VerificationMismatch {
                    mismatches: verification.mismatches.len(),
                    detail,
                }));
            }
            tracing::warn!(
                "Verification found {} mismatch(es): {}",
                verification.mismatches.len(),
                detail
            );
        }
        self.monitor.log_stats("Verifying");

        self.enter(PipelineState::Done);
        self.monitor.log_final_stats();
        tracing::info!(
            "✅ {} done: {} written, {} verified",
            self.name,
            load.records_written,
            verification.checked
        );

        Ok(RunReport {
            pipeline: self.name.clone(),
            source: self.source.describe(),
            sink: self.sink.describe(),
            provisioning,
            records_extracted,
            load,
            verification,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
