//! Integration tests for the NDJSON converter round-trip contract.

use labelwire::annotation::{
    Annotation, Answer, Checklist, ClassificationAnnotation, ClassificationValue,
    ConversationEntity, DataRef, DocumentEntity, FeatureRef, FrameGeometry, Label, Line, Mask,
    MessageRanking, MessageSelection, ObjectAnnotation, ObjectValue, Point, Polygon, RankedMessage,
    Rectangle, TextEntity, TextValue, TokenGroup, VideoObject,
};
use labelwire::ndjson::{deserialize, serialize, ImportRecord, WireAnswerValue};

fn object(name: &str, uuid: &str, value: ObjectValue) -> Annotation {
    Annotation::Object(ObjectAnnotation::new(FeatureRef::named(name), value).with_uuid(uuid))
}

#[test]
fn rectangle_corners_canonicalize_on_round_trip() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "box",
        "00000000-0000-4000-8000-000000000001",
        ObjectValue::Rectangle(Rectangle::new(
            Point::new(81.0, 28.0),
            Point::new(38.0, 69.0),
        )),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let restored = deserialize(&records).expect("deserialize");

    match &restored[0].annotations[0] {
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
fn rectangle_canonicalization_is_corner_order_independent() {
    let swapped = Rectangle::new(Point::new(81.0, 28.0), Point::new(38.0, 69.0));
    let ordered = Rectangle::new(Point::new(38.0, 28.0), Point::new(81.0, 69.0));

    let serialize_one = |rect: Rectangle| {
        let mut label = Label::for_data_row("dr-1");
        label.append(object(
            "box",
            "00000000-0000-4000-8000-000000000002",
            ObjectValue::Rectangle(rect),
        ));
        serialize(&[label]).expect("serialize")
    };

    assert_eq!(serialize_one(swapped)[0].bbox, serialize_one(ordered)[0].bbox);
}

#[test]
fn checklist_wire_form_preserves_answer_order() {
    let mut label = Label::for_data_row("dr-1");
    label.append(Annotation::Classification(
        ClassificationAnnotation::new(
            FeatureRef::named("checklist"),
            ClassificationValue::Checklist(Checklist::new(vec![
                Answer::named("opt-a"),
                Answer::named("opt-b"),
            ])),
        )
        .with_uuid("00000000-0000-4000-8000-000000000003"),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let json = serde_json::to_string(&records[0]).expect("json");
    assert!(
        json.contains(r#""answer":[{"name":"opt-a"},{"name":"opt-b"}]"#),
        "unexpected wire form: {json}"
    );

    let restored = deserialize(&records).expect("deserialize");
    match &restored[0].annotations[0] {
        Annotation::Classification(classification) => match &classification.value {
            ClassificationValue::Checklist(checklist) => {
                let names: Vec<_> = checklist
                    .answers()
                    .iter()
                    .map(|answer| answer.feature.name().unwrap_or_default().to_string())
                    .collect();
                assert_eq!(names, vec!["opt-a", "opt-b"]);
            }
            other => panic!("expected checklist, got {other:?}"),
        },
        other => panic!("expected classification, got {other:?}"),
    }
}

#[test]
fn benchmark_flag_is_emitted_only_when_set() {
    let mut plain = Label::for_data_row("dr-1");
    plain.append(object(
        "poi",
        "00000000-0000-4000-8000-000000000004",
        ObjectValue::Point(Point::new(1.0, 2.0)),
    ));
    let records = serialize(std::slice::from_ref(&plain)).expect("serialize");
    let json = serde_json::to_string(&records[0]).expect("json");
    assert!(!json.contains("isBenchmarkReferenceLabel"));

    let benchmark = plain.clone().as_benchmark_reference();
    let records = serialize(&[benchmark]).expect("serialize");
    let json = serde_json::to_string(&records[0]).expect("json");
    assert!(json.contains(r#""isBenchmarkReferenceLabel":true"#));
}

#[test]
fn unset_optional_keys_are_absent() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "poi",
        "00000000-0000-4000-8000-000000000005",
        ObjectValue::Point(Point::new(1.0, 2.0)),
    ));

    let records = serialize(&[label]).expect("serialize");
    let json = serde_json::to_string(&records[0]).expect("json");

    for key in [
        "confidence",
        "classifications",
        "labelId",
        "schemaId",
        "page",
        "unit",
        "null",
    ] {
        assert!(!json.contains(key), "unexpected key '{key}' in {json}");
    }
}

#[test]
fn unknown_record_keys_survive_a_round_trip() {
    let json = r#"{"uuid":"00000000-0000-4000-8000-000000000006",
        "dataRow":{"id":"dr-1"},"name":"poi","point":{"x":1.0,"y":2.0},
        "vendorField":{"nested":[1,2,3]}}"#;
    let record: ImportRecord = serde_json::from_str(json).expect("parse");

    let labels = deserialize(std::slice::from_ref(&record)).expect("deserialize");
    let records = serialize(&labels).expect("serialize");

    assert_eq!(records, vec![record]);
}

#[test]
fn conversation_and_text_entities_round_trip() {
    let mut label = Label::for_global_key("gk-1");
    label.append(object(
        "quote",
        "00000000-0000-4000-8000-000000000007",
        ObjectValue::TextEntity(TextEntity::new(10, 42).expect("span")),
    ));
    label.append(object(
        "reply",
        "00000000-0000-4000-8000-000000000008",
        ObjectValue::ConversationEntity(
            ConversationEntity::new(0, 5, "message-3").expect("entity"),
        ),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    assert_eq!(records[0].message_id, None);
    assert_eq!(records[1].message_id.as_deref(), Some("message-3"));

    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn document_entity_round_trips() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "clause",
        "00000000-0000-4000-8000-000000000009",
        ObjectValue::DocumentEntity(
            DocumentEntity::new(vec![TokenGroup {
                token_ids: vec!["t-1".into(), "t-2".into()],
                group_id: "g-1".into(),
                page: 3,
            }])
            .expect("entity"),
        ),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn masks_round_trip_in_all_three_forms() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "instance-mask",
        "00000000-0000-4000-8000-00000000000a",
        ObjectValue::Mask(Mask::instance("https://example.com/m.png", [12, 34, 56]).expect("mask")),
    ));
    label.append(object(
        "rle-mask",
        "00000000-0000-4000-8000-00000000000b",
        ObjectValue::Mask(Mask::rle(vec![3, 1, 4, 1, 5], (8, 8)).expect("mask")),
    ));
    label.append(object(
        "png-mask",
        "00000000-0000-4000-8000-00000000000c",
        ObjectValue::Mask(Mask::png(vec![0x89, 0x50, 0x4e, 0x47]).expect("mask")),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn video_segments_round_trip_with_indices() {
    let mut label = Label::for_data_row("dr-1").with_media_type(
        labelwire::annotation::MediaKind::Video,
    );
    for (frame, segment_index) in [(1u32, 0usize), (2, 0), (7, 1)] {
        let geometry = FrameGeometry::Rectangle(Rectangle::new(
            Point::new(0.0, 0.0),
            Point::new(frame as f64, frame as f64),
        ));
        label.append(Annotation::Object(
            ObjectAnnotation::new(
                FeatureRef::named("tracker"),
                ObjectValue::Video(
                    VideoObject::new(frame, geometry)
                        .expect("frame")
                        .with_segment_index(segment_index),
                ),
            )
            .with_uuid("00000000-0000-4000-8000-00000000000d"),
        ));
    }

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    assert_eq!(records.len(), 1, "frames must collapse into one record");
    let segments = records[0].segments.as_ref().expect("segments");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].keyframes.len(), 2);
    assert_eq!(segments[1].keyframes.len(), 1);

    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn message_tools_round_trip() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "pick-best",
        "00000000-0000-4000-8000-00000000000e",
        ObjectValue::MessageSelection(
            MessageSelection::new("parent-1", "child-2").expect("selection"),
        ),
    ));
    label.append(object(
        "rank-all",
        "00000000-0000-4000-8000-00000000000f",
        ObjectValue::MessageRanking(
            MessageRanking::new(
                "parent-1",
                vec![
                    RankedMessage {
                        message_id: "child-1".into(),
                        order: 2,
                    },
                    RankedMessage {
                        message_id: "child-2".into(),
                        order: 1,
                    },
                ],
            )
            .expect("ranking"),
        ),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let task = records[0].message_evaluation_task.as_ref().expect("task");
    assert_eq!(task.format, "message-single-selection");
    let task = records[1].message_evaluation_task.as_ref().expect("task");
    assert_eq!(task.format, "message-ranking");

    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn polygon_and_line_round_trip() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "region",
        "00000000-0000-4000-8000-000000000010",
        ObjectValue::Polygon(
            Polygon::new(vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(5.0, 8.5),
            ])
            .expect("polygon"),
        ),
    ));
    label.append(object(
        "path",
        "00000000-0000-4000-8000-000000000011",
        ObjectValue::Line(
            Line::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 4.0)]).expect("line"),
        ),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn nested_classifications_round_trip_through_answers() {
    let nested = ClassificationAnnotation::new(
        FeatureRef::named("sub-kind"),
        ClassificationValue::Text(TextValue::new("glass")),
    );
    let answer = Answer::named("damaged").with_classifications(vec![nested]);
    let mut label = Label::for_data_row("dr-1");
    label.append(Annotation::Classification(
        ClassificationAnnotation::new(
            FeatureRef::named("condition"),
            ClassificationValue::Radio(labelwire::annotation::Radio::new(answer)),
        )
        .with_uuid("00000000-0000-4000-8000-000000000012"),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    match records[0].answer.as_ref().expect("answer") {
        WireAnswerValue::Single(single) => {
            assert_eq!(single.classifications.len(), 1);
        }
        other => panic!("expected radio answer, got {other:?}"),
    }

    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].annotations, label.annotations);
}

#[test]
fn inline_data_is_emitted_under_its_media_key() {
    let mut label = Label::new(DataRef::Inline {
        media: labelwire::annotation::MediaKind::Text,
        content: "the quick brown fox".into(),
    });
    label.append(object(
        "entity",
        "00000000-0000-4000-8000-000000000013",
        ObjectValue::TextEntity(TextEntity::new(4, 9).expect("span")),
    ));

    let records = serialize(std::slice::from_ref(&label)).expect("serialize");
    let json = serde_json::to_string(&records[0]).expect("json");
    assert!(json.contains(r#""dataRow":{"text":"the quick brown fox"}"#));

    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored[0].data, label.data);
}

#[test]
fn serialization_is_stable_for_supplied_uuids() {
    let mut label = Label::for_data_row("dr-1");
    label.append(object(
        "poi",
        "00000000-0000-4000-8000-000000000014",
        ObjectValue::Point(Point::new(6.0, 7.0)),
    ));

    let first = serialize(std::slice::from_ref(&label)).expect("serialize");
    let second = serialize(std::slice::from_ref(&label)).expect("serialize");
    assert_eq!(first, second);
}

#[test]
fn labels_split_by_data_row_on_deserialize() {
    let mut a = Label::for_data_row("dr-1");
    a.append(object(
        "poi",
        "00000000-0000-4000-8000-000000000015",
        ObjectValue::Point(Point::new(1.0, 1.0)),
    ));
    let mut b = Label::for_data_row("dr-2");
    b.append(object(
        "poi",
        "00000000-0000-4000-8000-000000000016",
        ObjectValue::Point(Point::new(2.0, 2.0)),
    ));

    let records = serialize(&[a.clone(), b.clone()]).expect("serialize");
    let restored = deserialize(&records).expect("deserialize");
    assert_eq!(restored.len(), 2);
    assert_eq!(restored[0].data, a.data);
    assert_eq!(restored[1].data, b.data);
}
