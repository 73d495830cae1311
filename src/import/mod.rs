//! The asynchronous import job.
//!
//! [`Importer::submit`] ships a payload (in-memory records, a local
//! NDJSON file, or an already-uploaded URL) and returns an [`ImportJob`]
//! holding the remote handle. [`ImportJob::wait_until_done`] polls until
//! the job is terminal, retrying transient failures with jittered
//! exponential backoff. The three NDJSON artifacts — inputs, statuses,
//! errors — are fetched lazily and cached per job instance.
//!
//! Per-record failures are data, read through [`ImportJob::errors`];
//! only whole-job failure raises.

mod api;
mod chunk;
mod config;
mod status;

pub use api::{ApiError, HttpImportApi, ImportApi, RemoteImport};
pub use chunk::split_on_record_boundaries;
pub use config::{ImportConfig, ImportMode, ImportState};
pub use status::{RecordError, StatusOutcome, StatusRecord};

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use rand::RngExt;

use crate::error::LabelwireError;
use crate::ndjson::{self, ImportRecord};

/// What to import.
pub enum ImportPayload {
    /// In-memory wire records; serialized, chunked, and uploaded.
    Records(Vec<ImportRecord>),
    /// A local NDJSON file; chunked and uploaded.
    File(PathBuf),
    /// An NDJSON file already reachable by the service; passed through.
    Url(String),
}

/// Entry point for creating import jobs.
pub struct Importer<A: ImportApi> {
    api: A,
    config: ImportConfig,
}

impl<A: ImportApi> Importer<A> {
    /// Creates an importer with default configuration.
    pub fn new(api: A) -> Self {
        Self::with_config(api, ImportConfig::default())
    }

    /// Creates an importer with explicit configuration.
    pub fn with_config(api: A, config: ImportConfig) -> Self {
        Self { api, config }
    }

    /// The underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Ships a payload and returns the job handle.
    ///
    /// In-memory records are spooled to a temporary NDJSON file (deleted
    /// when submission finishes, successfully or not), split into
    /// record-aligned chunks, and uploaded before the import is created.
    pub fn submit(
        &self,
        payload: ImportPayload,
        mode: ImportMode,
    ) -> Result<ImportJob<'_, A>, LabelwireError> {
        let file_url = match payload {
            ImportPayload::Url(url) => url,
            ImportPayload::File(path) => self.upload_file(&path)?,
            ImportPayload::Records(records) => {
                if records.is_empty() {
                    return Err(LabelwireError::EmptyImport);
                }
                let spool = spool_records(&records)?;
                self.upload_file(spool.path())?
                // spool drops here; the temporary file is removed.
            }
        };

        let remote = with_retries(&self.config, "create import", || {
            self.api.create_import(mode, &file_url)
        })
        .map_err(|err| LabelwireError::Upload {
            message: err.to_string(),
        })?;

        tracing::info!(id = %remote.id, mode = mode.as_str(), "import created");
        Ok(ImportJob::attach(&self.api, &self.config, remote))
    }

    /// Reattaches to an existing import by its remote id.
    pub fn resume(&self, id: &str) -> Result<ImportJob<'_, A>, LabelwireError> {
        let remote = with_retries(&self.config, "fetch import", || self.api.fetch_import(id))
            .map_err(|err| LabelwireError::Api {
                message: err.to_string(),
            })?;
        Ok(ImportJob::attach(&self.api, &self.config, remote))
    }

    fn upload_file(&self, path: &Path) -> Result<String, LabelwireError> {
        let bytes = std::fs::read(path)?;
        let chunks = split_on_record_boundaries(&bytes, self.config.chunk_size_bytes);
        if chunks.is_empty() {
            return Err(LabelwireError::EmptyImport);
        }
        tracing::debug!(
            chunks = chunks.len(),
            bytes = bytes.len(),
            "uploading payload"
        );
        with_retries(&self.config, "upload payload", || {
            self.api.upload_chunks(&chunks)
        })
        .map_err(|err| LabelwireError::Upload {
            message: err.to_string(),
        })
    }
}

/// Writes records to a temporary NDJSON file, one compact object per line.
fn spool_records(records: &[ImportRecord]) -> Result<tempfile::NamedTempFile, LabelwireError> {
    let mut spool = tempfile::NamedTempFile::new()?;
    {
        let mut writer = BufWriter::new(&mut spool);
        for record in records {
            serde_json::to_writer(&mut writer, record).map_err(|source| {
                LabelwireError::NdjsonWrite {
                    path: PathBuf::from("<spool>"),
                    source,
                }
            })?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    Ok(spool)
}

/// The three NDJSON artifacts a finished import exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Artifact {
    Inputs,
    Statuses,
    Errors,
}

impl Artifact {
    fn name(&self) -> &'static str {
        match self {
            Artifact::Inputs => "inputs",
            Artifact::Statuses => "statuses",
            Artifact::Errors => "errors",
        }
    }
}

/// A client-side handle on one remote import job.
///
/// Holds only the remote snapshot plus per-instance artifact caches;
/// everything else is read on demand.
#[derive(Debug)]
pub struct ImportJob<'a, A: ImportApi> {
    api: &'a A,
    config: &'a ImportConfig,
    remote: RemoteImport,
    inputs_cache: Option<Vec<ImportRecord>>,
    statuses_cache: Option<Vec<StatusRecord>>,
    errors_cache: Option<Vec<StatusRecord>>,
}

impl<'a, A: ImportApi> ImportJob<'a, A> {
    fn attach(api: &'a A, config: &'a ImportConfig, remote: RemoteImport) -> Self {
        Self {
            api,
            config,
            remote,
            inputs_cache: None,
            statuses_cache: None,
            errors_cache: None,
        }
    }

    /// The remote job id.
    pub fn id(&self) -> &str {
        &self.remote.id
    }

    /// The last observed state, without touching the network.
    pub fn state(&self) -> ImportState {
        self.remote.state
    }

    /// The last observed progress string, if the service reported one.
    pub fn progress(&self) -> Option<&str> {
        self.remote.progress.as_deref()
    }

    /// Fetches a fresh snapshot of the job.
    pub fn refresh(&mut self) -> Result<ImportState, LabelwireError> {
        let remote = with_retries(self.config, "poll import", || {
            self.api.fetch_import(&self.remote.id)
        })
        .map_err(|err| LabelwireError::Api {
            message: err.to_string(),
        })?;
        self.remote = remote;
        Ok(self.remote.state)
    }

    /// Polls until the job reaches a terminal state.
    ///
    /// Sleeps `poll_interval` between polls. With a `deadline`, raises
    /// [`LabelwireError::ProcessingWaitTimeout`] once the wait exceeds
    /// it — the remote job keeps running. A job that lands in FAILED
    /// raises [`LabelwireError::ImportFailed`]; per-record failures do
    /// not, and are read through [`ImportJob::errors`].
    pub fn wait_until_done(
        &mut self,
        poll_interval: Duration,
        deadline: Option<Duration>,
        show_progress: bool,
    ) -> Result<ImportState, LabelwireError> {
        let started = Instant::now();
        let spinner = show_progress.then(|| {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        });

        while !self.remote.state.is_terminal() {
            if let Some(deadline) = deadline {
                if started.elapsed() >= deadline {
                    if let Some(bar) = &spinner {
                        bar.finish_and_clear();
                    }
                    return Err(LabelwireError::ProcessingWaitTimeout {
                        waited: started.elapsed(),
                    });
                }
            }

            std::thread::sleep(poll_interval);
            self.refresh()?;
            tracing::debug!(
                id = %self.remote.id,
                state = self.remote.state.as_str(),
                progress = self.remote.progress.as_deref().unwrap_or(""),
                "polled import"
            );
            if let Some(bar) = &spinner {
                bar.set_message(format!(
                    "import {}: {} {}",
                    self.remote.id,
                    self.remote.state.as_str(),
                    self.remote.progress.as_deref().unwrap_or(""),
                ));
            }
        }

        if let Some(bar) = &spinner {
            bar.finish_and_clear();
        }

        match self.remote.state {
            ImportState::Failed => Err(LabelwireError::ImportFailed {
                message: self
                    .remote
                    .progress
                    .clone()
                    .unwrap_or_else(|| "remote job reported FAILED".to_string()),
            }),
            state => {
                tracing::info!(id = %self.remote.id, state = state.as_str(), "import done");
                Ok(state)
            }
        }
    }

    /// The echo of the submitted records. Lazy; cached until the job is
    /// dropped. Fails with [`LabelwireError::ArtifactExpired`] once the
    /// signed URL lapses.
    pub fn inputs(&mut self) -> Result<&[ImportRecord], LabelwireError> {
        if self.inputs_cache.is_none() {
            let body = self.fetch_artifact(Artifact::Inputs)?;
            self.inputs_cache = Some(ndjson::io::from_ndjson_str(&body)?);
        }
        Ok(self.inputs_cache.as_deref().unwrap_or_default())
    }

    /// Per-record outcomes, one entry per submitted record.
    pub fn statuses(&mut self) -> Result<&[StatusRecord], LabelwireError> {
        if self.statuses_cache.is_none() {
            let body = self.fetch_artifact(Artifact::Statuses)?;
            self.statuses_cache = Some(parse_status_lines(&body)?);
        }
        Ok(self.statuses_cache.as_deref().unwrap_or_default())
    }

    /// The failing subset of [`ImportJob::statuses`].
    pub fn errors(&mut self) -> Result<&[StatusRecord], LabelwireError> {
        if self.errors_cache.is_none() {
            let body = self.fetch_artifact(Artifact::Errors)?;
            self.errors_cache = Some(parse_status_lines(&body)?);
        }
        Ok(self.errors_cache.as_deref().unwrap_or_default())
    }

    fn fetch_artifact(&mut self, artifact: Artifact) -> Result<String, LabelwireError> {
        if self.artifact_url(artifact).is_none() {
            self.refresh()?;
        }
        let url = self.artifact_url(artifact).ok_or_else(|| LabelwireError::Api {
            message: format!("import exposes no {} artifact", artifact.name()),
        })?;

        with_retries(self.config, "fetch artifact", || {
            self.api.fetch_artifact(&url)
        })
        .map_err(|err| match err {
            ApiError::Expired => LabelwireError::ArtifactExpired { url: url.clone() },
            other => LabelwireError::Api {
                message: other.to_string(),
            },
        })
    }

    fn artifact_url(&self, artifact: Artifact) -> Option<String> {
        match artifact {
            Artifact::Inputs => self.remote.inputs_url.clone(),
            Artifact::Statuses => self.remote.statuses_url.clone(),
            Artifact::Errors => self.remote.errors_url.clone(),
        }
    }
}

fn parse_status_lines(body: &str) -> Result<Vec<StatusRecord>, LabelwireError> {
    let mut records = Vec::new();
    for (index, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|source| LabelwireError::NdjsonParse {
            line: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Runs `op`, retrying retryable failures with jittered exponential
/// backoff up to the configured ceiling.
fn with_retries<T>(
    config: &ImportConfig,
    what: &str,
    mut op: impl FnMut() -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let delay = match &err {
                    ApiError::RateLimited {
                        retry_after: Some(after),
                    } => *after,
                    _ => backoff_delay(config, attempt),
                };
                tracing::warn!(
                    op = what,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure; backing off"
                );
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Exponential backoff with jitter: base * 2^attempt, capped, then
/// scaled by a random factor in [0.5, 1.0].
fn backoff_delay(config: &ImportConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.min(16));
    let raw = config.backoff_base.saturating_mul(factor);
    let capped = raw.min(config.backoff_cap);
    capped.mul_f64(rand::rng().random_range(0.5..=1.0))
}
