//! The transport seam between the import state machine and the remote
//! service.
//!
//! [`ImportApi`] is the full surface IMP needs: upload payload chunks,
//! create an import, poll it, and fetch its NDJSON artifacts. The
//! shipping implementation is [`HttpImportApi`] over blocking HTTP;
//! tests substitute in-memory fakes.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::config::{ImportMode, ImportState};

/// Transport-level failures, classified for the retry loop.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure; retryable.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service asked us to slow down; retryable.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Definitive HTTP failure; not retryable.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    /// The artifact URL is no longer valid.
    #[error("artifact URL expired")]
    Expired,

    /// The service answered with something unreadable.
    #[error("unexpected response: {0}")]
    BadResponse(String),
}

impl ApiError {
    /// Whether the retry loop should try again after backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) | ApiError::RateLimited { .. } => true,
            ApiError::Status { code, .. } => *code >= 500,
            ApiError::Expired | ApiError::BadResponse(_) => false,
        }
    }
}

/// A snapshot of the remote import job.
#[derive(Clone, Debug, Deserialize)]
pub struct RemoteImport {
    pub id: String,

    #[serde(with = "state_wire")]
    pub state: ImportState,

    /// Human-readable progress, e.g. `"3 / 10"`.
    #[serde(default)]
    pub progress: Option<String>,

    /// Signed URL echoing the submitted inputs.
    #[serde(rename = "inputsUrl", default)]
    pub inputs_url: Option<String>,

    /// Signed URL of the failing subset.
    #[serde(rename = "errorsUrl", default)]
    pub errors_url: Option<String>,

    /// Signed URL of the per-record status list.
    #[serde(rename = "statusesUrl", default)]
    pub statuses_url: Option<String>,
}

/// Serde adapter for the SCREAMING state spelling.
mod state_wire {
    use serde::{Deserialize, Deserializer};

    use crate::import::config::ImportState;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<ImportState, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImportState::from_str_opt(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown import state '{raw}'")))
    }
}

/// Everything the import state machine needs from the remote service.
pub trait ImportApi {
    /// Uploads payload chunks to the storage layer; returns the file URL
    /// the import will be created from.
    fn upload_chunks(&self, chunks: &[Vec<u8>]) -> Result<String, ApiError>;

    /// Creates an import over an already-uploaded NDJSON file.
    fn create_import(&self, mode: ImportMode, file_url: &str) -> Result<RemoteImport, ApiError>;

    /// Fetches the current snapshot of an import.
    fn fetch_import(&self, id: &str) -> Result<RemoteImport, ApiError>;

    /// Fetches an NDJSON artifact body from its signed URL.
    fn fetch_artifact(&self, url: &str) -> Result<String, ApiError>;
}

/// Blocking HTTP implementation of [`ImportApi`].
pub struct HttpImportApi {
    agent: ureq::Agent,
    base_url: Url,
    api_key: String,
}

impl HttpImportApi {
    /// Creates a client for the service at `base_url`, authenticating
    /// with `api_key`.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .build()
            .into();
        Self {
            agent,
            base_url,
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<String, ApiError> {
        self.base_url
            .join(path)
            .map(|url| url.to_string())
            .map_err(|err| ApiError::BadResponse(format!("bad endpoint '{path}': {err}")))
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.api_key)
    }
}

fn classify(err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::StatusCode(429) => ApiError::RateLimited { retry_after: None },
        ureq::Error::StatusCode(code) => ApiError::Status {
            code,
            message: format!("request rejected with status {code}"),
        },
        other => ApiError::Transport(other.to_string()),
    }
}

fn classify_artifact(err: ureq::Error) -> ApiError {
    match err {
        // Signed artifact URLs answer with 403/404/410 once they lapse.
        ureq::Error::StatusCode(403 | 404 | 410) => ApiError::Expired,
        other => classify(other),
    }
}

impl ImportApi for HttpImportApi {
    fn upload_chunks(&self, chunks: &[Vec<u8>]) -> Result<String, ApiError> {
        #[derive(Deserialize)]
        struct CreatedUpload {
            id: String,
        }
        #[derive(Deserialize)]
        struct CompletedUpload {
            url: String,
        }

        let created: CreatedUpload = self
            .agent
            .post(&self.endpoint("uploads")?)
            .header("Authorization", &self.auth())
            .send_json(serde_json::json!({ "contentType": "application/x-ndjson" }))
            .map_err(classify)?
            .body_mut()
            .read_json()
            .map_err(|err| ApiError::BadResponse(err.to_string()))?;

        for (part, chunk) in chunks.iter().enumerate() {
            let path = format!("uploads/{}/parts/{}", created.id, part + 1);
            tracing::debug!(part = part + 1, bytes = chunk.len(), "uploading chunk");
            self.agent
                .put(&self.endpoint(&path)?)
                .header("Authorization", &self.auth())
                .header("Content-Type", "application/x-ndjson")
                .send(chunk.as_slice())
                .map_err(classify)?;
        }

        let completed: CompletedUpload = self
            .agent
            .post(&self.endpoint(&format!("uploads/{}/complete", created.id))?)
            .header("Authorization", &self.auth())
            .send_json(serde_json::json!({}))
            .map_err(classify)?
            .body_mut()
            .read_json()
            .map_err(|err| ApiError::BadResponse(err.to_string()))?;

        Ok(completed.url)
    }

    fn create_import(&self, mode: ImportMode, file_url: &str) -> Result<RemoteImport, ApiError> {
        self.agent
            .post(&self.endpoint("imports")?)
            .header("Authorization", &self.auth())
            .send_json(serde_json::json!({
                "mode": mode.as_str(),
                "fileUrl": file_url,
            }))
            .map_err(classify)?
            .body_mut()
            .read_json()
            .map_err(|err| ApiError::BadResponse(err.to_string()))
    }

    fn fetch_import(&self, id: &str) -> Result<RemoteImport, ApiError> {
        self.agent
            .get(&self.endpoint(&format!("imports/{id}"))?)
            .header("Authorization", &self.auth())
            .call()
            .map_err(classify)?
            .body_mut()
            .read_json()
            .map_err(|err| ApiError::BadResponse(err.to_string()))
    }

    fn fetch_artifact(&self, url: &str) -> Result<String, ApiError> {
        self.agent
            .get(url)
            .header("Authorization", &self.auth())
            .call()
            .map_err(classify_artifact)?
            .body_mut()
            .read_to_string()
            .map_err(|err| ApiError::BadResponse(err.to_string()))
    }
}
