//! Criterion microbenches for wire-format parsing and serialization.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - NDJSON record parsing (from_ndjson_str, from_ndjson_slice)
//! - Label serialization (serialize)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelwire::annotation::{
    Annotation, FeatureRef, Label, ObjectAnnotation, ObjectValue, Point, Rectangle,
};
use labelwire::ndjson::io::{from_ndjson_slice, from_ndjson_str};
use labelwire::ndjson::serialize;

// Small inline payload for benchmarking (kept representative of a mixed
// import: boxes, points, and a classification per row).
const NDJSON_FIXTURE: &str = r#"{"uuid":"00000000-0000-4000-8000-000000000001","dataRow":{"id":"dr-1"},"name":"car","bbox":{"top":28.0,"left":38.0,"height":41.0,"width":43.0}}
{"uuid":"00000000-0000-4000-8000-000000000002","dataRow":{"id":"dr-1"},"name":"wheel","point":{"x":61.5,"y":48.0}}
{"uuid":"00000000-0000-4000-8000-000000000003","dataRow":{"id":"dr-1"},"name":"condition","answer":{"name":"clean"}}
{"uuid":"00000000-0000-4000-8000-000000000004","dataRow":{"globalKey":"gk-2"},"name":"car","bbox":{"top":10.0,"left":5.0,"height":90.0,"width":120.0}}
{"uuid":"00000000-0000-4000-8000-000000000005","dataRow":{"globalKey":"gk-2"},"name":"tags","answer":[{"name":"blurry"},{"name":"night"}]}
"#;

/// Benchmark NDJSON parsing from string.
fn bench_parse_str(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndjson_parse");
    group.throughput(Throughput::Bytes(NDJSON_FIXTURE.len() as u64));

    group.bench_function("from_ndjson_str", |b| {
        b.iter(|| {
            let records = from_ndjson_str(black_box(NDJSON_FIXTURE)).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

/// Benchmark NDJSON parsing from byte slice.
fn bench_parse_slice(c: &mut Criterion) {
    let bytes = NDJSON_FIXTURE.as_bytes();
    let mut group = c.benchmark_group("ndjson_parse");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("from_ndjson_slice", |b| {
        b.iter(|| {
            let records = from_ndjson_slice(black_box(bytes)).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

/// Benchmark label serialization.
fn bench_serialize(c: &mut Criterion) {
    let labels: Vec<Label> = (0..50)
        .map(|index| {
            let mut label = Label::for_data_row(format!("dr-{index}"));
            for annotation in 0..4 {
                let offset = annotation as f64 * 10.0;
                label.append(Annotation::Object(
                    ObjectAnnotation::new(
                        FeatureRef::named("car"),
                        ObjectValue::Rectangle(Rectangle::new(
                            Point::new(offset, offset),
                            Point::new(offset + 50.0, offset + 30.0),
                        )),
                    )
                    .with_uuid(format!("{index:08}-0000-4000-8000-{annotation:012}")),
                ));
            }
            label
        })
        .collect();

    let mut group = c.benchmark_group("ndjson_serialize");
    group.bench_function("serialize_200_annotations", |b| {
        b.iter(|| {
            let records = serialize(black_box(&labels)).unwrap();
            black_box(records)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_parse_str, bench_parse_slice, bench_serialize);
criterion_main!(benches);
