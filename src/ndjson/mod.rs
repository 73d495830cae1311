//! Bidirectional conversion between labels and the NDJSON import wire
//! format.
//!
//! [`serialize`] turns labels into wire records in label-then-annotation
//! order; [`deserialize`] turns records back into labels grouped by
//! `(dataRow identity, labelId)`. The two are inverses up to documented
//! canonicalizations: rectangle corners normalize to (min, max), uuids
//! are injected where absent, and JSON key order is not significant.
//! Unknown record keys survive a round trip through per-annotation extra
//! bags.
//!
//! File and string NDJSON helpers live in [`io`].

mod de;
pub mod io;
mod record;
mod ser;

pub use de::deserialize;
pub use record::{
    DataRowRef, ImportRecord, PayloadKind, WireAnswer, WireAnswerValue, WireBBox,
    WireClassification, WireKeyframe, WireMask, WireMessageTask, WireMessageTaskData, WirePoint,
    WireRankedMessage, WireRle, WireSegment, WireSpan, WireTokenGroup, MESSAGE_TASK_RANKING,
    MESSAGE_TASK_SINGLE_SELECTION,
};
pub use ser::serialize;
