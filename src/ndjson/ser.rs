//! Serialization: labels to import records.
//!
//! Records come out in the order induced by iterating labels and their
//! annotations. Frame-level video and DICOM annotations that share a
//! feature identity (and group key) collapse into one record of computed
//! segments, emitted at the position of the group's first member.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use uuid::Uuid;

use crate::annotation::{
    segment_runs, Annotation, Answer, ClassificationAnnotation, ClassificationValue, DataRef,
    FeatureIdentity, FeatureRef, FrameGeometry, Label, Mask, ObjectAnnotation, ObjectValue,
};
use crate::error::LabelwireError;

use super::record::{
    DataRowRef, ImportRecord, WireAnswer, WireAnswerValue, WireBBox, WireClassification,
    WireKeyframe, WireMask, WireMessageTask, WireMessageTaskData, WirePoint, WireRankedMessage,
    WireRle, WireSegment, WireSpan, WireTokenGroup, MESSAGE_TASK_RANKING,
    MESSAGE_TASK_SINGLE_SELECTION,
};

/// Converts labels to wire records.
///
/// Every record gets a uuid: the annotation's own when present, a fresh
/// v4 otherwise. Optional fields are omitted entirely when unset.
pub fn serialize(labels: &[Label]) -> Result<Vec<ImportRecord>, LabelwireError> {
    let mut records = Vec::new();
    for label in labels {
        serialize_label(label, &mut records)?;
    }
    Ok(records)
}

/// One output slot per record; frame groups accumulate members until the
/// label is fully walked.
enum Slot<'a> {
    Single(&'a Annotation),
    Frames {
        members: Vec<&'a ObjectAnnotation>,
        dicom: bool,
    },
}

fn serialize_label(label: &Label, records: &mut Vec<ImportRecord>) -> Result<(), LabelwireError> {
    let mut slots: Vec<Slot<'_>> = Vec::new();
    let mut groups: HashMap<(FeatureIdentity, Option<String>), usize> = HashMap::new();

    for annotation in &label.annotations {
        match annotation {
            Annotation::Object(object) => match &object.value {
                ObjectValue::Video(video) => {
                    let key = (object.feature.identity(), video.group_key.clone());
                    match groups.get(&key) {
                        Some(&slot) => push_member(&mut slots, slot, object),
                        None => {
                            groups.insert(key, slots.len());
                            slots.push(Slot::Frames {
                                members: vec![object],
                                dicom: false,
                            });
                        }
                    }
                }
                ObjectValue::Dicom(dicom) => {
                    let key = (
                        object.feature.identity(),
                        Some(dicom.plane.as_str().to_string()),
                    );
                    match groups.get(&key) {
                        Some(&slot) => push_member(&mut slots, slot, object),
                        None => {
                            groups.insert(key, slots.len());
                            slots.push(Slot::Frames {
                                members: vec![object],
                                dicom: true,
                            });
                        }
                    }
                }
                _ => slots.push(Slot::Single(annotation)),
            },
            Annotation::Classification(_) => slots.push(Slot::Single(annotation)),
        }
    }

    for slot in slots {
        let record = match slot {
            Slot::Single(Annotation::Object(object)) => object_record(label, object)?,
            Slot::Single(Annotation::Classification(classification)) => {
                classification_record(label, classification)
            }
            Slot::Frames { members, dicom } => frames_record(label, &members, dicom)?,
        };
        records.push(record);
    }
    Ok(())
}

fn push_member<'a>(slots: &mut [Slot<'a>], slot: usize, object: &'a ObjectAnnotation) {
    if let Some(Slot::Frames { members, .. }) = slots.get_mut(slot) {
        members.push(object);
    }
}

/// Common fields shared by every record of a label.
fn base_record(label: &Label, uuid: Option<&str>, feature: &FeatureRef) -> ImportRecord {
    let mut record = ImportRecord::over(data_row_ref(label));
    record.uuid = Some(
        uuid.map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
    );
    match feature.schema_id() {
        Some(schema_id) => record.schema_id = Some(schema_id.to_string()),
        None => record.name = feature.name().map(str::to_string),
    }
    record.label_id = label.id.clone();
    if label.is_benchmark_reference {
        record.is_benchmark_reference_label = Some(true);
    }
    record
}

fn data_row_ref(label: &Label) -> DataRowRef {
    let mut row = match &label.data {
        DataRef::Id(id) => DataRowRef::by_id(id.clone()),
        DataRef::GlobalKey(key) => DataRowRef::by_global_key(key.clone()),
        DataRef::Inline { media, content } => {
            let mut row = DataRowRef::default();
            row.extra.insert(
                media.inline_key().to_string(),
                serde_json::Value::String(content.clone()),
            );
            row
        }
        DataRef::Uri(uri) => {
            let mut row = DataRowRef::default();
            row.extra
                .insert("uri".to_string(), serde_json::Value::String(uri.clone()));
            row
        }
    };
    for (key, value) in &label.row_extra {
        row.extra.insert(key.clone(), value.clone());
    }
    row
}

fn object_record(label: &Label, object: &ObjectAnnotation) -> Result<ImportRecord, LabelwireError> {
    let mut record = base_record(label, object.uuid.as_deref(), &object.feature);
    record.confidence = object.confidence;
    record.classifications = object
        .classifications
        .iter()
        .map(classification_to_wire)
        .collect();
    record.extra = object.extra.clone();

    match &object.value {
        ObjectValue::Rectangle(rect) => {
            let (top, left, height, width) = rect.to_bbox();
            record.bbox = Some(WireBBox {
                top,
                left,
                height,
                width,
            });
            record.page = rect.page;
            record.unit = rect.unit.map(|unit| unit.as_str().to_string());
        }
        ObjectValue::Polygon(polygon) => {
            record.polygon = Some(points_to_wire(polygon.points()));
        }
        ObjectValue::Line(line) => {
            record.line = Some(points_to_wire(line.points()));
        }
        ObjectValue::Point(point) => {
            record.point = Some(WirePoint {
                x: point.x,
                y: point.y,
            });
        }
        ObjectValue::Mask(mask) => {
            record.mask = Some(mask_to_wire(mask));
        }
        ObjectValue::TextEntity(span) => {
            record.location = Some(WireSpan {
                start: span.start(),
                end: span.end(),
            });
        }
        ObjectValue::ConversationEntity(entity) => {
            record.location = Some(WireSpan {
                start: entity.span.start(),
                end: entity.span.end(),
            });
            record.message_id = Some(entity.message_id.clone());
        }
        ObjectValue::DocumentEntity(entity) => {
            record.text_selections = Some(
                entity
                    .selections()
                    .iter()
                    .map(|group| WireTokenGroup {
                        token_ids: group.token_ids.clone(),
                        group_id: group.group_id.clone(),
                        page: group.page,
                    })
                    .collect(),
            );
        }
        ObjectValue::MessageSelection(selection) => {
            record.message_evaluation_task = Some(WireMessageTask {
                format: MESSAGE_TASK_SINGLE_SELECTION.to_string(),
                data: WireMessageTaskData {
                    parent_message_id: selection.parent_message_id.clone(),
                    message_id: Some(selection.message_id.clone()),
                    ranked_messages: None,
                },
            });
        }
        ObjectValue::MessageRanking(ranking) => {
            record.message_evaluation_task = Some(WireMessageTask {
                format: MESSAGE_TASK_RANKING.to_string(),
                data: WireMessageTaskData {
                    parent_message_id: ranking.parent_message_id().to_string(),
                    message_id: None,
                    ranked_messages: Some(
                        ranking
                            .ranked()
                            .iter()
                            .map(|entry| WireRankedMessage {
                                message_id: entry.message_id.clone(),
                                order: entry.order,
                            })
                            .collect(),
                    ),
                },
            });
        }
        ObjectValue::Video(_) | ObjectValue::Dicom(_) => {
            // Grouped into Slot::Frames before this point.
            return Err(LabelwireError::invalid(
                "annotation.value",
                "frame-level annotation escaped grouping",
            ));
        }
    }
    Ok(record)
}

fn classification_record(label: &Label, classification: &ClassificationAnnotation) -> ImportRecord {
    let mut record = base_record(label, classification.uuid.as_deref(), &classification.feature);
    record.confidence = classification.confidence;
    record.answer = Some(value_to_answer(&classification.value));
    record.extra = classification.extra.clone();
    record
}

fn frames_record(
    label: &Label,
    members: &[&ObjectAnnotation],
    dicom: bool,
) -> Result<ImportRecord, LabelwireError> {
    let first = members.first().ok_or_else(|| {
        LabelwireError::invalid("annotation.value", "empty frame group")
    })?;
    let mut record = base_record(label, first.uuid.as_deref(), &first.feature);
    record.confidence = first.confidence;
    record.extra = first.extra.clone();

    let frames: Vec<(u32, bool)> = members
        .iter()
        .map(|member| frame_of(member))
        .collect::<Result<_, _>>()?;
    let runs = segment_runs(&frames)?;

    let mut segments = Vec::with_capacity(runs.len());
    for run in runs {
        let mut keyframes = Vec::new();
        for index in run {
            let member = members[index];
            if !frames[index].1 {
                // Interpolated frames carry no wire presence.
                continue;
            }
            keyframes.push(keyframe_of(member, dicom)?);
        }
        segments.push(WireSegment { keyframes });
    }
    record.segments = Some(segments);

    record.group_key = match &first.value {
        ObjectValue::Video(video) => video.group_key.clone(),
        ObjectValue::Dicom(polyline) => Some(polyline.plane.as_str().to_string()),
        _ => None,
    };
    Ok(record)
}

fn frame_of(member: &ObjectAnnotation) -> Result<(u32, bool), LabelwireError> {
    match &member.value {
        ObjectValue::Video(video) => Ok((video.frame, video.keyframe)),
        ObjectValue::Dicom(polyline) => Ok((polyline.frame, polyline.keyframe)),
        _ => Err(LabelwireError::invalid(
            "annotation.value",
            "frame group member is not frame-level",
        )),
    }
}

fn keyframe_of(member: &ObjectAnnotation, dicom: bool) -> Result<WireKeyframe, LabelwireError> {
    let mut keyframe = WireKeyframe {
        frame: 0,
        bbox: None,
        point: None,
        line: None,
        polygon: None,
        classifications: member
            .classifications
            .iter()
            .map(classification_to_wire)
            .collect(),
    };

    match &member.value {
        ObjectValue::Video(video) if !dicom => {
            keyframe.frame = video.frame;
            match &video.geometry {
                FrameGeometry::Rectangle(rect) => {
                    let (top, left, height, width) = rect.to_bbox();
                    keyframe.bbox = Some(WireBBox {
                        top,
                        left,
                        height,
                        width,
                    });
                }
                FrameGeometry::Point(point) => {
                    keyframe.point = Some(WirePoint {
                        x: point.x,
                        y: point.y,
                    });
                }
                FrameGeometry::Line(line) => {
                    keyframe.line = Some(points_to_wire(line.points()));
                }
                FrameGeometry::Polygon(polygon) => {
                    keyframe.polygon = Some(points_to_wire(polygon.points()));
                }
            }
            Ok(keyframe)
        }
        ObjectValue::Dicom(polyline) if dicom => {
            keyframe.frame = polyline.frame;
            keyframe.line = Some(points_to_wire(polyline.line.points()));
            Ok(keyframe)
        }
        _ => Err(LabelwireError::invalid(
            "annotation.value",
            "mixed frame kinds within one group",
        )),
    }
}

fn points_to_wire(points: &[crate::annotation::Point]) -> Vec<WirePoint> {
    points
        .iter()
        .map(|point| WirePoint {
            x: point.x,
            y: point.y,
        })
        .collect()
}

fn mask_to_wire(mask: &Mask) -> WireMask {
    match mask {
        Mask::Instance { uri, color } => WireMask {
            instance_uri: Some(uri.clone()),
            color_rgb: Some(*color),
            ..Default::default()
        },
        Mask::Rle { counts, size } => WireMask {
            rle: Some(WireRle {
                counts: counts.clone(),
                size: [size.0, size.1],
            }),
            ..Default::default()
        },
        Mask::Png { bytes } => WireMask {
            png: Some(BASE64.encode(bytes)),
            ..Default::default()
        },
    }
}

fn classification_to_wire(classification: &ClassificationAnnotation) -> WireClassification {
    let mut wire = WireClassification {
        confidence: classification.confidence,
        answer: Some(value_to_answer(&classification.value)),
        extra: classification.extra.clone(),
        ..Default::default()
    };
    match classification.feature.schema_id() {
        Some(schema_id) => wire.schema_id = Some(schema_id.to_string()),
        None => wire.name = classification.feature.name().map(str::to_string),
    }
    wire
}

fn value_to_answer(value: &ClassificationValue) -> WireAnswerValue {
    match value {
        ClassificationValue::Text(text) | ClassificationValue::Prompt(text) => {
            WireAnswerValue::Text(text.answer.clone())
        }
        ClassificationValue::Radio(radio) => WireAnswerValue::Single(answer_to_wire(&radio.answer)),
        ClassificationValue::Checklist(checklist) => WireAnswerValue::Multiple(
            checklist.answers().iter().map(answer_to_wire).collect(),
        ),
    }
}

fn answer_to_wire(answer: &Answer) -> WireAnswer {
    let mut wire = WireAnswer {
        confidence: answer.confidence,
        classifications: answer
            .classifications
            .iter()
            .map(classification_to_wire)
            .collect(),
        extra: answer.extra.clone(),
        ..Default::default()
    };
    match answer.feature.schema_id() {
        Some(schema_id) => wire.schema_id = Some(schema_id.to_string()),
        None => wire.name = answer.feature.name().map(str::to_string),
    }
    wire
}
