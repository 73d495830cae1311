//! Wire schema for import records.
//!
//! One [`ImportRecord`] is one NDJSON line in the platform's import
//! format. Field names, casing, and shapes here are fixed by the remote
//! service and must not drift. The payload-key table at the bottom is
//! the single source of truth for variant dispatch: serialization and
//! deserialization both go through it, so adding a variant is one change
//! in one place.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LabelwireError;

/// Identifies the data row a record belongs to.
///
/// Exactly one of `id` / `globalKey` identifies an existing row; inline
/// content and URIs travel under media-specific keys in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataRowRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "globalKey", default, skip_serializing_if = "Option::is_none")]
    pub global_key: Option<String>,

    /// Inline content keys and anything else the emitter attached.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl DataRowRef {
    /// A reference to an existing row by internal id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// A reference to an existing row by global key.
    pub fn by_global_key(key: impl Into<String>) -> Self {
        Self {
            global_key: Some(key.into()),
            ..Default::default()
        }
    }
}

/// The wire bbox encoding. Inherently canonical: height and width are
/// non-negative for any well-formed emitter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireBBox {
    pub top: f64,
    pub left: f64,
    pub height: f64,
    pub width: f64,
}

/// A point on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WirePoint {
    pub x: f64,
    pub y: f64,
}

/// RLE raster payload: counts plus a (height, width) extent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireRle {
    pub counts: Vec<u32>,
    pub size: [u32; 2],
}

/// Mask payload. Exactly one of the three forms must be present:
/// `instanceURI` + `colorRGB`, `rle`, or `png`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMask {
    #[serde(rename = "instanceURI", default, skip_serializing_if = "Option::is_none")]
    pub instance_uri: Option<String>,

    #[serde(rename = "colorRGB", default, skip_serializing_if = "Option::is_none")]
    pub color_rgb: Option<[u8; 3]>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rle: Option<WireRle>,

    /// Base64-encoded PNG bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
}

/// A half-open character span.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireSpan {
    pub start: u64,
    pub end: u64,
}

/// One token-id group of a document entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireTokenGroup {
    #[serde(rename = "tokenIds")]
    pub token_ids: Vec<String>,

    #[serde(rename = "groupId")]
    pub group_id: String,

    pub page: u32,
}

/// One keyframe inside a video or DICOM segment. Carries exactly one
/// geometry key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireKeyframe {
    pub frame: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<WireBBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<WirePoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Vec<WirePoint>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<WirePoint>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<WireClassification>,
}

/// A maximal run of consecutive keyframes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireSegment {
    pub keyframes: Vec<WireKeyframe>,
}

/// One ranked message of a ranking task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireRankedMessage {
    #[serde(rename = "messageId")]
    pub message_id: String,

    pub order: u32,
}

/// The data block of a message evaluation task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessageTaskData {
    #[serde(rename = "parentMessageId")]
    pub parent_message_id: String,

    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(
        rename = "rankedMessages",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub ranked_messages: Option<Vec<WireRankedMessage>>,
}

/// A message evaluation task; `format` selects the tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessageTask {
    pub format: String,
    pub data: WireMessageTaskData,
}

/// Wire formats for message evaluation tasks.
pub const MESSAGE_TASK_SINGLE_SELECTION: &str = "message-single-selection";
pub const MESSAGE_TASK_RANKING: &str = "message-ranking";

/// The answer of a classification record. The JSON type discriminates:
/// a string is free text, an object a radio answer, an array a checklist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireAnswerValue {
    Text(String),
    Single(WireAnswer),
    Multiple(Vec<WireAnswer>),
}

/// One selected option of a radio or checklist answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "schemaId", default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<WireClassification>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A classification nested inside an object record or an answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WireClassification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "schemaId", default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<WireAnswerValue>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One line of the import wire format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    #[serde(rename = "dataRow")]
    pub data_row: DataRowRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "schemaId", default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    #[serde(rename = "labelId", default, skip_serializing_if = "Option::is_none")]
    pub label_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Present (and `true`) only when the source label is a benchmark
    /// reference.
    #[serde(
        rename = "isBenchmarkReferenceLabel",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_benchmark_reference_label: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<WireClassification>,

    // Payload keys. Exactly one discriminating key per record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<WireBBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<WirePoint>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Vec<WirePoint>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<WirePoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<WireMask>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<WireSpan>,

    /// Accompanies `location` for conversation entities.
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    #[serde(
        rename = "textSelections",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_selections: Option<Vec<WireTokenGroup>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<WireSegment>>,

    /// DICOM plane or free-form video group key; accompanies `segments`.
    #[serde(rename = "groupKey", default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,

    #[serde(
        rename = "messageEvaluationTask",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_evaluation_task: Option<WireMessageTask>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<WireAnswerValue>,

    /// Accompanies `bbox` for paged media.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Unrecognized keys, preserved verbatim for lossless round trips.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Which payload a record carries, derived from its discriminating key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadKind {
    BBox,
    Polygon,
    Line,
    Point,
    Mask,
    Span,
    DocumentEntity,
    Segments,
    MessageTask,
    Answer,
}

impl ImportRecord {
    /// A record over the given data row with nothing else set.
    pub fn over(data_row: DataRowRef) -> Self {
        Self {
            data_row,
            ..Default::default()
        }
    }

    /// The discriminating payload keys present on this record, with the
    /// kind each one selects. This is the variant table: both converter
    /// directions and the validator consult it.
    pub fn payload_entries(&self) -> Vec<(&'static str, PayloadKind)> {
        let mut entries = Vec::new();
        if self.bbox.is_some() {
            entries.push(("bbox", PayloadKind::BBox));
        }
        if self.polygon.is_some() {
            entries.push(("polygon", PayloadKind::Polygon));
        }
        if self.line.is_some() {
            entries.push(("line", PayloadKind::Line));
        }
        if self.point.is_some() {
            entries.push(("point", PayloadKind::Point));
        }
        if self.mask.is_some() {
            entries.push(("mask", PayloadKind::Mask));
        }
        if self.location.is_some() {
            entries.push(("location", PayloadKind::Span));
        }
        if self.text_selections.is_some() {
            entries.push(("textSelections", PayloadKind::DocumentEntity));
        }
        if self.segments.is_some() {
            entries.push(("segments", PayloadKind::Segments));
        }
        if self.message_evaluation_task.is_some() {
            entries.push(("messageEvaluationTask", PayloadKind::MessageTask));
        }
        if self.answer.is_some() {
            entries.push(("answer", PayloadKind::Answer));
        }
        entries
    }

    /// Resolves the record's payload kind, rejecting records with zero
    /// or multiple discriminating keys.
    pub fn payload_kind(&self) -> Result<PayloadKind, LabelwireError> {
        let entries = self.payload_entries();
        match entries.as_slice() {
            [(_, kind)] => Ok(*kind),
            [] => Err(LabelwireError::malformed(
                self.uuid.as_deref(),
                "record carries no payload key",
            )),
            multiple => {
                let keys: Vec<&str> = multiple.iter().map(|(key, _)| *key).collect();
                Err(LabelwireError::malformed(
                    self.uuid.as_deref(),
                    format!("ambiguous payload keys: {}", keys.join(", ")),
                ))
            }
        }
    }
}
