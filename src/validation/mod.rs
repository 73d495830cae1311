//! Pre-upload validation of import records.
//!
//! Rejects payloads the remote service would reject, before any bytes
//! move: data-row identification, per-label annotation ceilings, feature
//! references, and per-variant structural checks. Validation is pure —
//! no I/O, no mutation — and aggregates every failure instead of
//! stopping at the first.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::HashMap;

use crate::error::LabelwireError;
use crate::ndjson::{ImportRecord, WireAnswerValue, WireClassification};

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// Ceiling on annotations per `(dataRow, labelId)` group. A group
    /// reaching this count is rejected.
    pub max_annotations_per_label: usize,

    /// If true, `ensure_valid` treats warnings as errors.
    pub strict: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            max_annotations_per_label: 5000,
            strict: false,
        }
    }
}

/// Validates a record sequence and returns a report of all issues found.
///
/// The rules mirror what the remote service enforces:
/// - every record identifies its data row by exactly one of id/globalKey
/// - no label group reaches the configured annotation ceiling
/// - every record references a feature by name or schemaId
/// - per-variant structural invariants hold (bbox extents, vertex
///   counts, mask exclusivity and color uniqueness, span ordering,
///   ranking permutations, confidence ranges)
/// - record uuids are unique across the payload
pub fn validate_records(records: &[ImportRecord], opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_data_rows(records, &mut report);
    validate_group_limits(records, opts, &mut report);
    validate_feature_refs(records, &mut report);
    validate_payloads(records, &mut report);
    validate_uuids(records, &mut report);
    validate_mask_colors(records, &mut report);

    report
}

/// Validates records and converts a failing report into an error.
pub fn ensure_valid(
    records: &[ImportRecord],
    opts: &ValidateOptions,
) -> Result<(), LabelwireError> {
    let report = validate_records(records, opts);
    let failed = !report.is_ok() || (opts.strict && report.warning_count() > 0);
    if failed {
        return Err(LabelwireError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        });
    }
    Ok(())
}

fn record_context(index: usize, record: &ImportRecord) -> IssueContext {
    IssueContext::Record {
        index,
        uuid: record.uuid.clone(),
    }
}

/// The grouping identity of a record, when it has a well-formed data-row
/// reference.
fn group_identity(record: &ImportRecord) -> Option<(String, Option<String>)> {
    let row = &record.data_row;
    match (&row.id, &row.global_key) {
        (Some(id), None) if !id.is_empty() => Some((format!("id:{id}"), record.label_id.clone())),
        (None, Some(key)) if !key.is_empty() => {
            Some((format!("gk:{key}"), record.label_id.clone()))
        }
        _ => None,
    }
}

fn validate_data_rows(records: &[ImportRecord], report: &mut ValidationReport) {
    for (index, record) in records.iter().enumerate() {
        let row = &record.data_row;
        match (&row.id, &row.global_key) {
            (None, None) => {
                report.add(ValidationIssue::error(
                    IssueCode::MissingDataRowRef,
                    "dataRow carries neither an id nor a globalKey",
                    record_context(index, record),
                ));
            }
            (Some(_), Some(_)) => {
                report.add(ValidationIssue::error(
                    IssueCode::AmbiguousDataRowRef,
                    "dataRow carries both an id and a globalKey",
                    record_context(index, record),
                ));
            }
            (Some(id), None) if id.is_empty() => {
                report.add(ValidationIssue::error(
                    IssueCode::EmptyDataRowRef,
                    "dataRow id is empty",
                    record_context(index, record),
                ));
            }
            (None, Some(key)) if key.is_empty() => {
                report.add(ValidationIssue::error(
                    IssueCode::EmptyDataRowRef,
                    "dataRow globalKey is empty",
                    record_context(index, record),
                ));
            }
            _ => {}
        }
    }
}

fn validate_group_limits(
    records: &[ImportRecord],
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let mut counts: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut order: Vec<(String, Option<String>)> = Vec::new();

    for record in records {
        if let Some(group) = group_identity(record) {
            let count = counts.entry(group.clone()).or_insert(0);
            if *count == 0 {
                order.push(group);
            }
            *count += 1;
        }
    }

    for group in order {
        let count = counts[&group];
        if count >= opts.max_annotations_per_label {
            report.add(ValidationIssue::error(
                IssueCode::TooManyAnnotations,
                format!(
                    "{count} annotation(s) reach the per-label ceiling of {}",
                    opts.max_annotations_per_label
                ),
                IssueContext::Group {
                    row: group.0,
                    label_id: group.1,
                },
            ));
        }
    }
}

fn validate_feature_refs(records: &[ImportRecord], report: &mut ValidationReport) {
    for (index, record) in records.iter().enumerate() {
        if record.name.is_none() && record.schema_id.is_none() {
            report.add(ValidationIssue::error(
                IssueCode::MissingFeatureRef,
                "record carries neither a name nor a schemaId",
                record_context(index, record),
            ));
        }
    }
}

fn validate_payloads(records: &[ImportRecord], report: &mut ValidationReport) {
    for (index, record) in records.iter().enumerate() {
        let context = record_context(index, record);
        let entries = record.payload_entries();
        match entries.len() {
            0 => {
                report.add(ValidationIssue::error(
                    IssueCode::MissingPayload,
                    "record carries no payload key",
                    context.clone(),
                ));
            }
            1 => {}
            _ => {
                let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
                report.add(ValidationIssue::error(
                    IssueCode::AmbiguousPayload,
                    format!("record carries multiple payload keys: {}", keys.join(", ")),
                    context.clone(),
                ));
            }
        }

        validate_geometry(record, &context, report);
        validate_mask_shape(record, &context, report);
        validate_spans(record, &context, report);
        validate_segments(record, &context, report);
        validate_message_task(record, &context, report);
        validate_confidences(record, &context, report);
    }
}

fn validate_geometry(record: &ImportRecord, context: &IssueContext, report: &mut ValidationReport) {
    if let Some(bbox) = record.bbox {
        let finite = bbox.top.is_finite()
            && bbox.left.is_finite()
            && bbox.height.is_finite()
            && bbox.width.is_finite();
        if !finite || bbox.height < 0.0 || bbox.width < 0.0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidBBoxExtent,
                format!(
                    "bbox extent {}x{} must be finite and non-negative",
                    bbox.width, bbox.height
                ),
                context.clone(),
            ));
        } else if bbox.height == 0.0 || bbox.width == 0.0 {
            report.add(ValidationIssue::warning(
                IssueCode::ZeroAreaBBox,
                format!("bbox has zero area ({}x{})", bbox.width, bbox.height),
                context.clone(),
            ));
        }
        if record.page == Some(0) {
            report.add(ValidationIssue::error(
                IssueCode::InvalidPage,
                "pages are 1-indexed; got 0",
                context.clone(),
            ));
        }
    }

    if let Some(points) = &record.polygon {
        if points.len() < 3 {
            report.add(ValidationIssue::error(
                IssueCode::BadVertexCount,
                format!("polygons need at least 3 vertices; got {}", points.len()),
                context.clone(),
            ));
        }
    }

    if let Some(points) = &record.line {
        if points.len() < 2 {
            report.add(ValidationIssue::error(
                IssueCode::BadVertexCount,
                format!("lines need at least 2 vertices; got {}", points.len()),
                context.clone(),
            ));
        }
    }
}

fn validate_mask_shape(
    record: &ImportRecord,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    let Some(mask) = &record.mask else {
        return;
    };

    let has_instance = mask.instance_uri.is_some() || mask.color_rgb.is_some();
    let form_count = [has_instance, mask.rle.is_some(), mask.png.is_some()]
        .iter()
        .filter(|&&set| set)
        .count();

    if form_count != 1 {
        report.add(ValidationIssue::error(
            IssueCode::MaskVariantConflict,
            format!("mask carries {form_count} payload forms; exactly one is required"),
            context.clone(),
        ));
        return;
    }

    if has_instance && (mask.instance_uri.is_none() || mask.color_rgb.is_none()) {
        report.add(ValidationIssue::error(
            IssueCode::MaskVariantConflict,
            "instance masks need both instanceURI and colorRGB",
            context.clone(),
        ));
    }

    if let Some(rle) = &mask.rle {
        if rle.counts.is_empty() || rle.size[0] == 0 || rle.size[1] == 0 {
            report.add(ValidationIssue::error(
                IssueCode::MaskVariantConflict,
                format!(
                    "RLE masks need counts and a positive size; got {} count(s), {}x{}",
                    rle.counts.len(),
                    rle.size[0],
                    rle.size[1]
                ),
                context.clone(),
            ));
        }
    }
}

fn validate_spans(record: &ImportRecord, context: &IssueContext, report: &mut ValidationReport) {
    if let Some(span) = record.location {
        if span.end <= span.start {
            report.add(ValidationIssue::error(
                IssueCode::InvalidSpan,
                format!("span [{}, {}) is empty or inverted", span.start, span.end),
                context.clone(),
            ));
        }
    }

    if let Some(selections) = &record.text_selections {
        if selections.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::InvalidSpan,
                "textSelections is empty",
                context.clone(),
            ));
        }
        for group in selections {
            if group.token_ids.is_empty() {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidSpan,
                    format!("token group '{}' has no tokens", group.group_id),
                    context.clone(),
                ));
            }
            if group.page == 0 {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidPage,
                    format!("token group '{}': pages are 1-indexed; got 0", group.group_id),
                    context.clone(),
                ));
            }
        }
    }
}

fn validate_segments(record: &ImportRecord, context: &IssueContext, report: &mut ValidationReport) {
    let Some(segments) = &record.segments else {
        return;
    };

    if segments.is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::EmptySegments,
            "segments is empty",
            context.clone(),
        ));
    }
    for (index, segment) in segments.iter().enumerate() {
        if segment.keyframes.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::EmptySegments,
                format!("segment {index} has no keyframes"),
                context.clone(),
            ));
        }
        for keyframe in &segment.keyframes {
            if keyframe.frame == 0 {
                report.add(ValidationIssue::error(
                    IssueCode::InvalidPage,
                    "frames are 1-indexed; got 0",
                    context.clone(),
                ));
            }
            let geometry_count = [
                keyframe.bbox.is_some(),
                keyframe.point.is_some(),
                keyframe.line.is_some(),
                keyframe.polygon.is_some(),
            ]
            .iter()
            .filter(|&&set| set)
            .count();
            if geometry_count != 1 {
                report.add(ValidationIssue::error(
                    IssueCode::AmbiguousPayload,
                    format!(
                        "frame {} carries {geometry_count} geometries; exactly one is required",
                        keyframe.frame
                    ),
                    context.clone(),
                ));
            }
        }
    }
}

fn validate_message_task(
    record: &ImportRecord,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    use crate::ndjson::{MESSAGE_TASK_RANKING, MESSAGE_TASK_SINGLE_SELECTION};

    let Some(task) = &record.message_evaluation_task else {
        return;
    };

    match task.format.as_str() {
        MESSAGE_TASK_SINGLE_SELECTION => {
            if task.data.message_id.is_none() {
                report.add(ValidationIssue::error(
                    IssueCode::BadMessageTask,
                    "single selection without a messageId",
                    context.clone(),
                ));
            }
        }
        MESSAGE_TASK_RANKING => match &task.data.ranked_messages {
            None => {
                report.add(ValidationIssue::error(
                    IssueCode::BadMessageTask,
                    "ranking without rankedMessages",
                    context.clone(),
                ));
            }
            Some(ranked) => {
                let n = ranked.len() as u32;
                let mut orders: Vec<u32> = ranked.iter().map(|entry| entry.order).collect();
                orders.sort_unstable();
                orders.dedup();
                let is_permutation = orders.len() == ranked.len()
                    && orders.first() == Some(&1)
                    && orders.last() == Some(&n);
                if n == 0 || !is_permutation {
                    report.add(ValidationIssue::error(
                        IssueCode::BadRankingOrder,
                        format!("orders must be a permutation of 1..={n}"),
                        context.clone(),
                    ));
                }
            }
        },
        other => {
            report.add(ValidationIssue::error(
                IssueCode::BadMessageTask,
                format!("unknown message task format '{other}'"),
                context.clone(),
            ));
        }
    }
}

fn validate_confidences(
    record: &ImportRecord,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    check_confidence(record.confidence, context, report);
    for classification in &record.classifications {
        check_classification(classification, context, report);
    }
    if let Some(answer) = &record.answer {
        check_answer_value(answer, context, report);
    }
}

fn check_confidence(
    confidence: Option<f64>,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    if let Some(confidence) = confidence {
        if !(0.0..=1.0).contains(&confidence) {
            report.add(ValidationIssue::error(
                IssueCode::ConfidenceOutOfRange,
                format!("confidence {confidence} outside [0, 1]"),
                context.clone(),
            ));
        }
    }
}

fn check_classification(
    classification: &WireClassification,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    check_confidence(classification.confidence, context, report);
    if let Some(answer) = &classification.answer {
        check_answer_value(answer, context, report);
    }
}

fn check_answer_value(
    answer: &WireAnswerValue,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    match answer {
        WireAnswerValue::Text(_) => {}
        WireAnswerValue::Single(single) => {
            check_confidence(single.confidence, context, report);
            for nested in &single.classifications {
                check_classification(nested, context, report);
            }
        }
        WireAnswerValue::Multiple(answers) => {
            let mut seen: Vec<(&Option<String>, &Option<String>)> = Vec::new();
            for entry in answers {
                let identity = (&entry.schema_id, &entry.name);
                if seen.contains(&identity) {
                    report.add(ValidationIssue::warning(
                        IssueCode::DuplicateChecklistAnswer,
                        format!(
                            "checklist repeats answer '{}'",
                            entry
                                .schema_id
                                .as_deref()
                                .or(entry.name.as_deref())
                                .unwrap_or("<unnamed>")
                        ),
                        context.clone(),
                    ));
                } else {
                    seen.push(identity);
                }
                check_confidence(entry.confidence, context, report);
                for nested in &entry.classifications {
                    check_classification(nested, context, report);
                }
            }
        }
    }
}

fn validate_uuids(records: &[ImportRecord], report: &mut ValidationReport) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        let Some(uuid) = record.uuid.as_deref() else {
            continue;
        };
        match seen.get(uuid) {
            Some(first) => {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicateUuid,
                    format!("uuid already used by record {first}"),
                    record_context(index, record),
                ));
            }
            None => {
                seen.insert(uuid, index);
            }
        }
    }
}

fn validate_mask_colors(records: &[ImportRecord], report: &mut ValidationReport) {
    let mut seen: HashMap<(String, Option<String>), Vec<[u8; 3]>> = HashMap::new();

    for record in records {
        let Some(group) = group_identity(record) else {
            continue;
        };
        let Some(mask) = &record.mask else {
            continue;
        };
        let Some(color) = mask.color_rgb else {
            continue;
        };

        let colors = seen.entry(group.clone()).or_default();
        if colors.contains(&color) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateMaskColor,
                format!(
                    "instance color ({}, {}, {}) already used in this label",
                    color[0], color[1], color[2]
                ),
                IssueContext::Group {
                    row: group.0,
                    label_id: group.1,
                },
            ));
        } else {
            colors.push(color);
        }
    }
}
