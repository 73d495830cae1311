//! Import configuration and the remote job vocabulary.

use std::time::Duration;

/// Process-wide import settings, passed to [`Importer`](super::Importer)
/// at construction rather than read from module globals.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    /// Maximum bytes per upload chunk. Chunk boundaries never split a
    /// record, so a single record longer than this gets its own chunk.
    pub chunk_size_bytes: usize,

    /// Retry ceiling for transient transport failures.
    pub max_retries: u32,

    /// First backoff delay; doubles per retry.
    pub backoff_base: Duration,

    /// Ceiling on any single backoff delay.
    pub backoff_cap: Duration,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: 10_000_000,
            max_retries: 10,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(30),
        }
    }
}

/// What kind of labels an import creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportMode {
    /// Pre-labels presented to annotators for correction.
    Prelabel,
    /// Finished ground-truth labels.
    FinalLabel,
    /// Model predictions attached to a model run.
    ModelPrediction,
}

impl ImportMode {
    /// The wire spelling of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Prelabel => "prelabel",
            ImportMode::FinalLabel => "final-label",
            ImportMode::ModelPrediction => "model-prediction",
        }
    }
}

/// Remote lifecycle of an import job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportState {
    Pending,
    Running,
    Finished,
    Failed,
}

impl ImportState {
    /// Parses the wire spelling of a state.
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(ImportState::Pending),
            "RUNNING" => Some(ImportState::Running),
            "FINISHED" => Some(ImportState::Finished),
            "FAILED" => Some(ImportState::Failed),
            _ => None,
        }
    }

    /// The wire spelling of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportState::Pending => "PENDING",
            ImportState::Running => "RUNNING",
            ImportState::Finished => "FINISHED",
            ImportState::Failed => "FAILED",
        }
    }

    /// Whether polling can stop at this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportState::Finished | ImportState::Failed)
    }
}
