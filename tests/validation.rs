//! Integration tests for pre-upload validation.

use labelwire::error::LabelwireError;
use labelwire::ndjson::io::from_ndjson_str;
use labelwire::ndjson::{DataRowRef, ImportRecord, WirePoint};
use labelwire::validation::{ensure_valid, validate_records, IssueCode, IssueContext};
use labelwire::ValidateOptions;

fn point_record(row: DataRowRef, name: &str) -> ImportRecord {
    let mut record = ImportRecord::over(row);
    record.name = Some(name.into());
    record.point = Some(WirePoint { x: 1.0, y: 2.0 });
    record
}

fn limit(max: usize) -> ValidateOptions {
    ValidateOptions {
        max_annotations_per_label: max,
        ..Default::default()
    }
}

#[test]
fn two_annotations_on_one_row_breach_a_limit_of_one() {
    let records = vec![
        point_record(DataRowRef::by_id("dr-x"), "a"),
        point_record(DataRowRef::by_id("dr-x"), "b"),
    ];
    let err = ensure_valid(&records, &limit(1)).expect_err("breach");
    match err {
        LabelwireError::ValidationFailed { report, .. } => {
            assert!(report
                .issues
                .iter()
                .any(|i| i.code == IssueCode::TooManyAnnotations));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn two_rows_also_breach_a_limit_of_one() {
    // The ceiling bounds each label group; with a limit of one, every
    // group that reaches one annotation is rejected.
    let records = vec![
        point_record(DataRowRef::by_id("dr-x"), "a"),
        point_record(DataRowRef::by_id("dr-y"), "b"),
    ];
    let report = validate_records(&records, &limit(1));
    let breaches = report
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::TooManyAnnotations)
        .count();
    assert_eq!(breaches, 2);
}

#[test]
fn single_record_breaches_a_limit_of_one() {
    let records = vec![point_record(DataRowRef::by_id("dr-x"), "a")];
    let report = validate_records(&records, &limit(1));
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == IssueCode::TooManyAnnotations));
}

#[test]
fn default_limit_passes_ordinary_payloads() {
    let records = vec![
        point_record(DataRowRef::by_id("dr-x"), "a"),
        point_record(DataRowRef::by_id("dr-x"), "b"),
        point_record(DataRowRef::by_id("dr-y"), "c"),
    ];
    let report = validate_records(&records, &ValidateOptions::default());
    assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
}

#[test]
fn breach_cites_the_group_identity_and_count() {
    let records = vec![
        point_record(DataRowRef::by_id("dr-x"), "a"),
        point_record(DataRowRef::by_id("dr-x"), "b"),
    ];
    let report = validate_records(&records, &limit(2));
    let issue = report
        .issues
        .iter()
        .find(|i| i.code == IssueCode::TooManyAnnotations)
        .expect("breach issue");
    assert!(issue.message.contains('2'));
    assert_eq!(
        issue.context,
        IssueContext::Group {
            row: "id:dr-x".into(),
            label_id: None
        }
    );
}

#[test]
fn record_without_a_row_reference_cites_its_index() {
    let ndjson = concat!(
        r#"{"dataRow":{"id":"dr-1"},"name":"a","point":{"x":1.0,"y":2.0}}"#,
        "\n",
        r#"{"dataRow":{},"name":"b","point":{"x":1.0,"y":2.0}}"#,
        "\n",
    );
    let records = from_ndjson_str(ndjson).expect("parse");
    let report = validate_records(&records, &ValidateOptions::default());

    assert_eq!(report.error_count(), 1);
    let issue = &report.issues[0];
    assert_eq!(issue.code, IssueCode::MissingDataRowRef);
    assert!(matches!(
        &issue.context,
        IssueContext::Record { index: 1, .. }
    ));
}

#[test]
fn record_with_both_references_is_rejected() {
    let ndjson = concat!(
        r#"{"dataRow":{"id":"dr-1","globalKey":"gk-1"},"name":"a","point":{"x":1.0,"y":2.0}}"#,
        "\n",
    );
    let records = from_ndjson_str(ndjson).expect("parse");
    let report = validate_records(&records, &ValidateOptions::default());
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == IssueCode::AmbiguousDataRowRef));
}

#[test]
fn wire_level_vertex_counts_are_checked() {
    let ndjson = concat!(
        r#"{"dataRow":{"id":"dr-1"},"name":"shape","polygon":[{"x":0.0,"y":0.0},{"x":1.0,"y":1.0}]}"#,
        "\n",
        r#"{"dataRow":{"id":"dr-1"},"name":"path","line":[{"x":0.0,"y":0.0}]}"#,
        "\n",
    );
    let records = from_ndjson_str(ndjson).expect("parse");
    let report = validate_records(&records, &ValidateOptions::default());
    let bad_counts = report
        .issues
        .iter()
        .filter(|i| i.code == IssueCode::BadVertexCount)
        .count();
    assert_eq!(bad_counts, 2);
}

#[test]
fn ranking_orders_must_be_a_permutation() {
    let ndjson = concat!(
        r#"{"dataRow":{"id":"dr-1"},"name":"rank","messageEvaluationTask":"#,
        r#"{"format":"message-ranking","data":{"parentMessageId":"p","rankedMessages":"#,
        r#"[{"messageId":"a","order":1},{"messageId":"b","order":3}]}}}"#,
        "\n",
    );
    let records = from_ndjson_str(ndjson).expect("parse");
    let report = validate_records(&records, &ValidateOptions::default());
    assert!(report
        .issues
        .iter()
        .any(|i| i.code == IssueCode::BadRankingOrder));
}

#[test]
fn validation_is_idempotent_over_its_own_output() {
    let records = vec![
        point_record(DataRowRef::by_id("dr-1"), "a"),
        point_record(DataRowRef::default(), "b"),
    ];
    let opts = ValidateOptions::default();
    assert_eq!(
        validate_records(&records, &opts),
        validate_records(&records, &opts)
    );
}

#[test]
fn validation_does_not_mutate_its_input() {
    let records = vec![point_record(DataRowRef::by_id("dr-1"), "a")];
    let snapshot = records.clone();
    let _ = validate_records(&records, &ValidateOptions::default());
    assert_eq!(records, snapshot);
}
