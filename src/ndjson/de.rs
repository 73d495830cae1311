//! Deserialization: import records to labels.
//!
//! Each record maps to exactly one annotation (or, for segment records,
//! one annotation per keyframe). Records are grouped into labels by
//! `(dataRow identity, labelId)`, preserving first-seen order, and
//! unknown keys are kept in the annotation's extra bag so a subsequent
//! serialize is lossless.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::annotation::{
    ensure_single_reference, Annotation, Answer, Checklist, ClassificationAnnotation,
    ClassificationValue, ConversationEntity, DataRef, DicomPlane, DicomPolyline, DocumentEntity,
    FeatureRef, FrameGeometry, Label, Line, Mask, MediaKind, MessageRanking, MessageSelection,
    ObjectAnnotation, ObjectValue, Point, Polygon, Radio, RankedMessage, Rectangle, RectangleUnit,
    TextEntity, TextValue, TokenGroup, VideoObject,
};
use crate::error::LabelwireError;

use super::record::{
    DataRowRef, ImportRecord, PayloadKind, WireAnswer, WireAnswerValue, WireClassification,
    WireKeyframe, WireMask, WirePoint, MESSAGE_TASK_RANKING, MESSAGE_TASK_SINGLE_SELECTION,
};

/// Converts wire records to labels, grouping by data row and label id.
pub fn deserialize(records: &[ImportRecord]) -> Result<Vec<Label>, LabelwireError> {
    let mut labels: Vec<Label> = Vec::new();
    let mut index: HashMap<(String, Option<String>), usize> = HashMap::new();

    for record in records {
        let (data, row_extra) = parse_data_row(&record.data_row, record.uuid.as_deref())?;
        let group = (data.group_key(), record.label_id.clone());

        let slot = match index.get(&group) {
            Some(&slot) => slot,
            None => {
                let mut label = Label::new(data);
                label.id = record.label_id.clone();
                label.row_extra = row_extra;
                labels.push(label);
                index.insert(group, labels.len() - 1);
                labels.len() - 1
            }
        };

        if record.is_benchmark_reference_label == Some(true) {
            labels[slot].is_benchmark_reference = true;
        }

        for annotation in record_annotations(record)? {
            labels[slot].append(annotation);
        }
    }

    Ok(labels)
}

/// Splits a `dataRow` object into the domain reference and the leftover
/// keys that must survive a round trip.
fn parse_data_row(
    row: &DataRowRef,
    uuid: Option<&str>,
) -> Result<(DataRef, std::collections::BTreeMap<String, serde_json::Value>), LabelwireError> {
    ensure_single_reference(row.id.as_deref(), row.global_key.as_deref()).map_err(|_| {
        LabelwireError::malformed(uuid, "data row has both an id and a global key")
    })?;

    let mut extra = row.extra.clone();
    let data = if let Some(id) = &row.id {
        DataRef::Id(id.clone())
    } else if let Some(key) = &row.global_key {
        DataRef::GlobalKey(key.clone())
    } else if let Some((key, media)) = row
        .extra
        .keys()
        .find_map(|key| MediaKind::from_inline_key(key).map(|media| (key.clone(), media)))
    {
        let content = content_string(&mut extra, &key, uuid)?;
        DataRef::Inline { media, content }
    } else if row.extra.contains_key("uri") {
        let uri = content_string(&mut extra, "uri", uuid)?;
        DataRef::Uri(uri)
    } else {
        return Err(LabelwireError::malformed(
            uuid,
            "data row carries no reference",
        ));
    };

    Ok((data, extra))
}

fn content_string(
    extra: &mut std::collections::BTreeMap<String, serde_json::Value>,
    key: &str,
    uuid: Option<&str>,
) -> Result<String, LabelwireError> {
    match extra.remove(key) {
        Some(serde_json::Value::String(content)) => Ok(content),
        _ => Err(LabelwireError::malformed(
            uuid,
            format!("data row key '{key}' must be a string"),
        )),
    }
}

/// Maps one record to its annotations. Segment records expand into one
/// annotation per keyframe; everything else maps 1:1.
fn record_annotations(record: &ImportRecord) -> Result<Vec<Annotation>, LabelwireError> {
    let uuid = record.uuid.as_deref();
    let feature = record_feature(record)?;

    match record.payload_kind()? {
        PayloadKind::Segments => segment_annotations(record, &feature),
        PayloadKind::Answer => {
            let value = match record.answer.as_ref() {
                Some(answer) => answer_value(answer, uuid)?,
                None => return Err(LabelwireError::malformed(uuid, "missing answer")),
            };
            let mut classification = ClassificationAnnotation::new(feature, value);
            classification.uuid = record.uuid.clone();
            if let Some(confidence) = record.confidence {
                classification = classification.with_confidence(confidence)?;
            }
            classification.extra = record.extra.clone();
            Ok(vec![Annotation::Classification(classification)])
        }
        kind => {
            let value = object_value(record, kind)?;
            let mut object = ObjectAnnotation::new(feature, value);
            object.uuid = record.uuid.clone();
            if let Some(confidence) = record.confidence {
                object = object.with_confidence(confidence)?;
            }
            object.classifications = record
                .classifications
                .iter()
                .map(|wire| classification_from_wire(wire, uuid))
                .collect::<Result<_, _>>()?;
            object.extra = record.extra.clone();
            Ok(vec![Annotation::Object(object)])
        }
    }
}

fn record_feature(record: &ImportRecord) -> Result<FeatureRef, LabelwireError> {
    FeatureRef::new(record.name.clone(), record.schema_id.clone()).map_err(|_| {
        LabelwireError::malformed(
            record.uuid.as_deref(),
            "record carries neither a name nor a schemaId",
        )
    })
}

fn object_value(record: &ImportRecord, kind: PayloadKind) -> Result<ObjectValue, LabelwireError> {
    let uuid = record.uuid.as_deref();
    match kind {
        PayloadKind::BBox => {
            let bbox = record
                .bbox
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing bbox"))?;
            let mut rect = Rectangle::from_bbox(bbox.top, bbox.left, bbox.height, bbox.width);
            if let Some(page) = record.page {
                rect = rect.with_page(page)?;
            }
            if let Some(unit) = &record.unit {
                let unit = RectangleUnit::from_str_opt(unit).ok_or_else(|| {
                    LabelwireError::malformed(uuid, format!("unknown unit '{unit}'"))
                })?;
                rect = rect.with_unit(unit);
            }
            Ok(ObjectValue::Rectangle(rect))
        }
        PayloadKind::Polygon => {
            let points = record
                .polygon
                .as_ref()
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing polygon"))?;
            Ok(ObjectValue::Polygon(Polygon::new(points_from_wire(points))?))
        }
        PayloadKind::Line => {
            let points = record
                .line
                .as_ref()
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing line"))?;
            Ok(ObjectValue::Line(Line::new(points_from_wire(points))?))
        }
        PayloadKind::Point => {
            let point = record
                .point
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing point"))?;
            Ok(ObjectValue::Point(Point::new(point.x, point.y)))
        }
        PayloadKind::Mask => {
            let mask = record
                .mask
                .as_ref()
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing mask"))?;
            Ok(ObjectValue::Mask(mask_from_wire(mask, uuid)?))
        }
        PayloadKind::Span => {
            let span = record
                .location
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing location"))?;
            match &record.message_id {
                Some(message_id) => Ok(ObjectValue::ConversationEntity(ConversationEntity::new(
                    span.start,
                    span.end,
                    message_id.as_str(),
                )?)),
                None => Ok(ObjectValue::TextEntity(TextEntity::new(span.start, span.end)?)),
            }
        }
        PayloadKind::DocumentEntity => {
            let selections = record
                .text_selections
                .as_ref()
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing textSelections"))?;
            let groups = selections
                .iter()
                .map(|group| TokenGroup {
                    token_ids: group.token_ids.clone(),
                    group_id: group.group_id.clone(),
                    page: group.page,
                })
                .collect();
            Ok(ObjectValue::DocumentEntity(DocumentEntity::new(groups)?))
        }
        PayloadKind::MessageTask => {
            let task = record
                .message_evaluation_task
                .as_ref()
                .ok_or_else(|| LabelwireError::malformed(uuid, "missing messageEvaluationTask"))?;
            match task.format.as_str() {
                MESSAGE_TASK_SINGLE_SELECTION => {
                    let message_id = task.data.message_id.as_deref().ok_or_else(|| {
                        LabelwireError::malformed(uuid, "single selection without messageId")
                    })?;
                    Ok(ObjectValue::MessageSelection(MessageSelection::new(
                        task.data.parent_message_id.clone(),
                        message_id,
                    )?))
                }
                MESSAGE_TASK_RANKING => {
                    let ranked = task.data.ranked_messages.as_ref().ok_or_else(|| {
                        LabelwireError::malformed(uuid, "ranking without rankedMessages")
                    })?;
                    let ranked = ranked
                        .iter()
                        .map(|entry| RankedMessage {
                            message_id: entry.message_id.clone(),
                            order: entry.order,
                        })
                        .collect();
                    Ok(ObjectValue::MessageRanking(MessageRanking::new(
                        task.data.parent_message_id.clone(),
                        ranked,
                    )?))
                }
                other => Err(LabelwireError::malformed(
                    uuid,
                    format!("unknown message task format '{other}'"),
                )),
            }
        }
        PayloadKind::Segments | PayloadKind::Answer => Err(LabelwireError::malformed(
            uuid,
            "payload handled outside object dispatch",
        )),
    }
}

fn segment_annotations(
    record: &ImportRecord,
    feature: &FeatureRef,
) -> Result<Vec<Annotation>, LabelwireError> {
    let uuid = record.uuid.as_deref();
    let segments = record
        .segments
        .as_ref()
        .ok_or_else(|| LabelwireError::malformed(uuid, "missing segments"))?;
    if segments.is_empty() {
        return Err(LabelwireError::malformed(uuid, "segments must be non-empty"));
    }

    let plane = record
        .group_key
        .as_deref()
        .and_then(DicomPlane::from_str_opt);

    let mut annotations = Vec::new();
    for (segment_index, segment) in segments.iter().enumerate() {
        if segment.keyframes.is_empty() {
            return Err(LabelwireError::malformed(
                uuid,
                format!("segment {segment_index} has no keyframes"),
            ));
        }
        for keyframe in &segment.keyframes {
            let value = match plane {
                Some(plane) => dicom_frame(keyframe, plane, segment_index, uuid)?,
                None => video_frame(keyframe, record.group_key.clone(), segment_index, uuid)?,
            };
            let mut object = ObjectAnnotation::new(feature.clone(), value);
            object.uuid = record.uuid.clone();
            if let Some(confidence) = record.confidence {
                object = object.with_confidence(confidence)?;
            }
            object.classifications = keyframe
                .classifications
                .iter()
                .map(|wire| classification_from_wire(wire, uuid))
                .collect::<Result<_, _>>()?;
            object.extra = record.extra.clone();
            annotations.push(Annotation::Object(object));
        }
    }
    Ok(annotations)
}

fn dicom_frame(
    keyframe: &WireKeyframe,
    plane: DicomPlane,
    segment_index: usize,
    uuid: Option<&str>,
) -> Result<ObjectValue, LabelwireError> {
    let points = keyframe.line.as_ref().ok_or_else(|| {
        LabelwireError::malformed(uuid, format!("frame {} has no line", keyframe.frame))
    })?;
    let line = Line::new(points_from_wire(points))?;
    Ok(ObjectValue::Dicom(
        DicomPolyline::new(keyframe.frame, line, plane)?.with_segment_index(segment_index),
    ))
}

fn video_frame(
    keyframe: &WireKeyframe,
    group_key: Option<String>,
    segment_index: usize,
    uuid: Option<&str>,
) -> Result<ObjectValue, LabelwireError> {
    let mut geometries = Vec::new();
    if let Some(bbox) = keyframe.bbox {
        geometries.push(FrameGeometry::Rectangle(Rectangle::from_bbox(
            bbox.top,
            bbox.left,
            bbox.height,
            bbox.width,
        )));
    }
    if let Some(point) = keyframe.point {
        geometries.push(FrameGeometry::Point(Point::new(point.x, point.y)));
    }
    if let Some(points) = &keyframe.line {
        geometries.push(FrameGeometry::Line(Line::new(points_from_wire(points))?));
    }
    if let Some(points) = &keyframe.polygon {
        geometries.push(FrameGeometry::Polygon(Polygon::new(points_from_wire(
            points,
        ))?));
    }

    let geometry = match geometries.len() {
        1 => geometries.remove(0),
        0 => {
            return Err(LabelwireError::malformed(
                uuid,
                format!("frame {} has no geometry", keyframe.frame),
            ))
        }
        _ => {
            return Err(LabelwireError::malformed(
                uuid,
                format!("frame {} has multiple geometries", keyframe.frame),
            ))
        }
    };

    let mut video = VideoObject::new(keyframe.frame, geometry)?.with_segment_index(segment_index);
    if let Some(key) = group_key {
        video = video.with_group_key(key);
    }
    Ok(ObjectValue::Video(video))
}

fn mask_from_wire(mask: &WireMask, uuid: Option<&str>) -> Result<Mask, LabelwireError> {
    let has_instance = mask.instance_uri.is_some() || mask.color_rgb.is_some();
    let forms = [has_instance, mask.rle.is_some(), mask.png.is_some()];
    if forms.iter().filter(|&&set| set).count() != 1 {
        return Err(LabelwireError::malformed(
            uuid,
            "mask must carry exactly one of instanceURI+colorRGB, rle, or png",
        ));
    }

    if has_instance {
        let (uri, color) = match (&mask.instance_uri, &mask.color_rgb) {
            (Some(uri), Some(color)) => (uri.clone(), *color),
            _ => {
                return Err(LabelwireError::malformed(
                    uuid,
                    "instance masks need both instanceURI and colorRGB",
                ));
            }
        };
        return Mask::instance(uri, color);
    }
    if let Some(rle) = &mask.rle {
        return Mask::rle(rle.counts.clone(), (rle.size[0], rle.size[1]));
    }
    if let Some(png) = &mask.png {
        let bytes = BASE64
            .decode(png)
            .map_err(|err| LabelwireError::malformed(uuid, format!("invalid png base64: {err}")))?;
        return Mask::png(bytes);
    }
    Err(LabelwireError::malformed(uuid, "empty mask"))
}

fn answer_value(answer: &WireAnswerValue, uuid: Option<&str>) -> Result<ClassificationValue, LabelwireError> {
    match answer {
        WireAnswerValue::Text(text) => Ok(ClassificationValue::Text(TextValue::new(text.clone()))),
        WireAnswerValue::Single(wire) => Ok(ClassificationValue::Radio(Radio::new(
            answer_from_wire(wire, uuid)?,
        ))),
        WireAnswerValue::Multiple(wires) => {
            let answers = wires
                .iter()
                .map(|wire| answer_from_wire(wire, uuid))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ClassificationValue::Checklist(Checklist::new(answers)))
        }
    }
}

fn answer_from_wire(wire: &WireAnswer, uuid: Option<&str>) -> Result<Answer, LabelwireError> {
    let feature = FeatureRef::new(wire.name.clone(), wire.schema_id.clone())
        .map_err(|_| LabelwireError::malformed(uuid, "answer carries neither name nor schemaId"))?;
    let mut answer = Answer::new(feature);
    if let Some(confidence) = wire.confidence {
        answer = answer.with_confidence(confidence)?;
    }
    answer.classifications = wire
        .classifications
        .iter()
        .map(|nested| classification_from_wire(nested, uuid))
        .collect::<Result<_, _>>()?;
    answer.extra = wire.extra.clone();
    Ok(answer)
}

fn classification_from_wire(
    wire: &WireClassification,
    uuid: Option<&str>,
) -> Result<ClassificationAnnotation, LabelwireError> {
    let feature = FeatureRef::new(wire.name.clone(), wire.schema_id.clone()).map_err(|_| {
        LabelwireError::malformed(uuid, "classification carries neither name nor schemaId")
    })?;
    let value = match &wire.answer {
        Some(answer) => answer_value(answer, uuid)?,
        None => {
            return Err(LabelwireError::malformed(
                uuid,
                "classification carries no answer",
            ))
        }
    };
    let mut classification = ClassificationAnnotation::new(feature, value);
    if let Some(confidence) = wire.confidence {
        classification = classification.with_confidence(confidence)?;
    }
    classification.extra = wire.extra.clone();
    Ok(classification)
}

fn points_from_wire(points: &[WirePoint]) -> Vec<Point> {
    points
        .iter()
        .map(|point| Point::new(point.x, point.y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ImportRecord {
        serde_json::from_str(json).expect("record json")
    }

    #[test]
    fn bbox_records_deserialize_to_ordered_rectangles() {
        let record = parse(
            r#"{"uuid":"u-1","dataRow":{"id":"dr-1"},"name":"box",
                "bbox":{"top":28.0,"left":38.0,"height":41.0,"width":43.0}}"#,
        );
        let labels = deserialize(&[record]).expect("labels");
        assert_eq!(labels.len(), 1);
        match &labels[0].annotations[0] {
            Annotation::Object(object) => match &object.value {
                ObjectValue::Rectangle(rect) => {
                    assert_eq!(rect.start, Point::new(38.0, 28.0));
                    assert_eq!(rect.end, Point::new(81.0, 69.0));
                }
                other => panic!("expected rectangle, got {other:?}"),
            },
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn records_group_by_data_row() {
        let a = parse(r#"{"dataRow":{"id":"dr-1"},"name":"p","point":{"x":1.0,"y":1.0}}"#);
        let b = parse(r#"{"dataRow":{"id":"dr-2"},"name":"p","point":{"x":2.0,"y":2.0}}"#);
        let c = parse(r#"{"dataRow":{"id":"dr-1"},"name":"q","point":{"x":3.0,"y":3.0}}"#);

        let labels = deserialize(&[a, b, c]).expect("labels");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].annotations.len(), 2);
        assert_eq!(labels[1].annotations.len(), 1);
    }

    #[test]
    fn label_id_splits_groups_on_one_row() {
        let a = parse(
            r#"{"dataRow":{"id":"dr-1"},"labelId":"l-1","name":"p","point":{"x":1.0,"y":1.0}}"#,
        );
        let b = parse(
            r#"{"dataRow":{"id":"dr-1"},"labelId":"l-2","name":"p","point":{"x":2.0,"y":2.0}}"#,
        );
        let labels = deserialize(&[a, b]).expect("labels");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].id.as_deref(), Some("l-1"));
    }

    #[test]
    fn dual_row_reference_is_malformed() {
        let record = parse(
            r#"{"uuid":"u-9","dataRow":{"id":"dr-1","globalKey":"gk-1"},
                "name":"p","point":{"x":1.0,"y":1.0}}"#,
        );
        let err = deserialize(&[record]).expect_err("dual reference");
        assert!(err.to_string().contains("u-9"));
    }

    #[test]
    fn global_key_rows_deserialize() {
        let record = parse(r#"{"dataRow":{"globalKey":"gk-1"},"name":"p","point":{"x":1.0,"y":1.0}}"#);
        let labels = deserialize(&[record]).expect("labels");
        assert_eq!(labels[0].data, DataRef::GlobalKey("gk-1".into()));
    }

    #[test]
    fn inline_text_rows_deserialize() {
        let record =
            parse(r#"{"dataRow":{"text":"raw content"},"name":"p","point":{"x":1.0,"y":1.0}}"#);
        let labels = deserialize(&[record]).expect("labels");
        assert_eq!(
            labels[0].data,
            DataRef::Inline {
                media: MediaKind::Text,
                content: "raw content".into()
            }
        );
    }

    #[test]
    fn answer_string_is_text_classification() {
        let record = parse(r#"{"dataRow":{"id":"dr-1"},"name":"notes","answer":"clear sky"}"#);
        let labels = deserialize(&[record]).expect("labels");
        match &labels[0].annotations[0] {
            Annotation::Classification(classification) => {
                assert_eq!(
                    classification.value,
                    ClassificationValue::Text(TextValue::new("clear sky"))
                );
            }
            other => panic!("expected classification, got {other:?}"),
        }
    }

    #[test]
    fn segment_records_expand_per_keyframe() {
        let record = parse(
            r#"{"uuid":"u-5","dataRow":{"id":"dr-1"},"name":"tracker",
                "segments":[{"keyframes":[
                    {"frame":1,"point":{"x":1.0,"y":1.0}},
                    {"frame":2,"point":{"x":2.0,"y":2.0}}]},
                    {"keyframes":[{"frame":9,"point":{"x":9.0,"y":9.0}}]}]}"#,
        );
        let labels = deserialize(&[record]).expect("labels");
        assert_eq!(labels[0].annotations.len(), 3);
        match &labels[0].annotations[2] {
            Annotation::Object(object) => match &object.value {
                ObjectValue::Video(video) => {
                    assert_eq!(video.frame, 9);
                    assert_eq!(video.segment_index, Some(1));
                    assert!(video.keyframe);
                }
                other => panic!("expected video frame, got {other:?}"),
            },
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn axial_group_key_means_dicom() {
        let record = parse(
            r#"{"dataRow":{"id":"dr-1"},"name":"vessel","groupKey":"axial",
                "segments":[{"keyframes":[
                    {"frame":3,"line":[{"x":0.0,"y":0.0},{"x":4.0,"y":4.0}]}]}]}"#,
        );
        let labels = deserialize(&[record]).expect("labels");
        match &labels[0].annotations[0] {
            Annotation::Object(object) => {
                assert!(matches!(&object.value, ObjectValue::Dicom(d) if d.plane == DicomPlane::Axial));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn missing_payload_key_is_malformed() {
        let record = parse(r#"{"uuid":"u-2","dataRow":{"id":"dr-1"},"name":"empty"}"#);
        let err = deserialize(&[record]).expect_err("no payload");
        assert!(err.to_string().contains("no payload"));
    }

    #[test]
    fn benchmark_flag_propagates_to_label() {
        let record = parse(
            r#"{"dataRow":{"id":"dr-1"},"name":"p","point":{"x":1.0,"y":1.0},
                "isBenchmarkReferenceLabel":true}"#,
        );
        let labels = deserialize(&[record]).expect("labels");
        assert!(labels[0].is_benchmark_reference);
    }
}
