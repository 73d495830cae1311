#![allow(dead_code)]

use labelwire::annotation::{
    Annotation, Answer, Checklist, ClassificationAnnotation, ClassificationValue, FeatureRef,
    Label, Line, ObjectAnnotation, ObjectValue, Point, Polygon, Radio, Rectangle, TextEntity,
    TextValue,
};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Finite coordinates on a quarter-pixel grid; exact under f64 equality.
pub fn arb_coord() -> impl Strategy<Value = f64> {
    (-40_000i32..40_000).prop_map(|v| v as f64 / 4.0)
}

pub fn arb_point() -> impl Strategy<Value = Point> {
    (arb_coord(), arb_coord()).prop_map(|(x, y)| Point::new(x, y))
}

/// A rectangle with ordered corners (start at the minimum corner).
pub fn arb_ordered_rectangle() -> impl Strategy<Value = Rectangle> {
    (arb_point(), 0.25f64..500.0, 0.25f64..500.0).prop_map(|(start, w, h)| {
        Rectangle::new(start, Point::new(start.x + w.floor(), start.y + h.floor()))
    })
}

pub fn arb_polygon() -> impl Strategy<Value = Polygon> {
    proptest::collection::vec(arb_point(), 3..8)
        .prop_map(|points| Polygon::new(points).expect("enough vertices"))
}

pub fn arb_line() -> impl Strategy<Value = Line> {
    proptest::collection::vec(arb_point(), 2..6)
        .prop_map(|points| Line::new(points).expect("enough vertices"))
}

pub fn arb_text_entity() -> impl Strategy<Value = TextEntity> {
    (0u64..10_000, 1u64..500)
        .prop_map(|(start, len)| TextEntity::new(start, start + len).expect("non-empty span"))
}

pub fn arb_object_value() -> impl Strategy<Value = ObjectValue> {
    prop_oneof![
        arb_point().prop_map(ObjectValue::Point),
        arb_ordered_rectangle().prop_map(ObjectValue::Rectangle),
        arb_polygon().prop_map(ObjectValue::Polygon),
        arb_line().prop_map(ObjectValue::Line),
        arb_text_entity().prop_map(ObjectValue::TextEntity),
    ]
}

pub fn arb_feature_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

pub fn arb_uuid() -> impl Strategy<Value = String> {
    any::<u128>().prop_map(|v| format!("{v:032x}"))
}

pub fn arb_confidence() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of((0u32..=100).prop_map(|v| v as f64 / 100.0))
}

pub fn arb_classification_value() -> impl Strategy<Value = ClassificationValue> {
    prop_oneof![
        "[a-z ]{0,16}".prop_map(|answer| ClassificationValue::Text(TextValue::new(answer))),
        arb_feature_name()
            .prop_map(|name| ClassificationValue::Radio(Radio::new(Answer::named(name)))),
        proptest::collection::vec(arb_feature_name(), 1..4).prop_map(|names| {
            ClassificationValue::Checklist(Checklist::new(
                names.into_iter().map(Answer::named).collect(),
            ))
        }),
    ]
}

pub fn arb_annotation() -> impl Strategy<Value = Annotation> {
    prop_oneof![
        (
            arb_feature_name(),
            arb_uuid(),
            arb_confidence(),
            arb_object_value()
        )
            .prop_map(|(name, uuid, confidence, value)| {
                let mut object = ObjectAnnotation::new(FeatureRef::named(name), value);
                object.uuid = Some(uuid);
                object.confidence = confidence;
                Annotation::Object(object)
            }),
        (
            arb_feature_name(),
            arb_uuid(),
            arb_confidence(),
            arb_classification_value()
        )
            .prop_map(|(name, uuid, confidence, value)| {
                let mut classification =
                    ClassificationAnnotation::new(FeatureRef::named(name), value);
                classification.uuid = Some(uuid);
                classification.confidence = confidence;
                Annotation::Classification(classification)
            }),
    ]
}

/// A label over the given data row with 1..=6 generated annotations.
pub fn arb_label(row_id: String) -> impl Strategy<Value = Label> {
    (
        proptest::collection::vec(arb_annotation(), 1..6),
        any::<bool>(),
    )
        .prop_map(move |(annotations, benchmark)| {
            let mut label = Label::for_data_row(row_id.clone());
            label.is_benchmark_reference = benchmark;
            label.extend(annotations);
            label
        })
}

/// Labels over pairwise-distinct data rows, so grouping on the way back
/// is the identity.
pub fn arb_labels() -> impl Strategy<Value = Vec<Label>> {
    (1usize..4).prop_flat_map(|count| {
        (0..count)
            .map(|index| arb_label(format!("dr-{index}")))
            .collect::<Vec<_>>()
    })
}
