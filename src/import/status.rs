//! Per-record status artifacts.
//!
//! After an import reaches a terminal state the service exposes NDJSON
//! artifacts keyed by record uuid. The layout is observed rather than
//! specified, so unknown fields are preserved verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ndjson::DataRowRef;

/// Outcome of one submitted record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusOutcome {
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "FAILURE")]
    Failure,
}

/// One error attached to a failing record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordError {
    pub name: String,
    pub message: String,

    #[serde(
        rename = "additionalInfo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_info: Option<serde_json::Value>,
}

/// One line of the statuses / errors artifacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(rename = "dataRow", default, skip_serializing_if = "Option::is_none")]
    pub data_row: Option<DataRowRef>,

    pub status: StatusOutcome,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RecordError>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StatusRecord {
    /// Whether this record failed remotely.
    pub fn is_failure(&self) -> bool {
        self.status == StatusOutcome::Failure
    }
}
