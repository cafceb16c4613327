// Criterion benchmarks for rpcbridge-common framing and type resolution
//
// Run benchmarks with:
//   cargo bench -p rpcbridge-common
//
// For detailed output with plots:
//   cargo bench -p rpcbridge-common -- --save-baseline main

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rpcbridge_common::{resolve_types, ArgValue, Composite, FrameCodec, ServiceKey};
use serde_json::json;

fn frames(count: usize, size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|i| vec![i as u8; size]).collect()
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_encode");

    for &(count, size) in &[(1, 64), (8, 256), (32, 4096)] {
        let input = frames(count, size);
        group.throughput(Throughput::Bytes((count * size) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", count, size)),
            &input,
            |b, input| b.iter(|| FrameCodec::encode(black_box(input))),
        );
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_decode");

    for &(count, size) in &[(1, 64), (8, 256), (32, 4096)] {
        let encoded = FrameCodec::encode(&frames(count, size)).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", count, size)),
            &encoded,
            |b, encoded| b.iter(|| FrameCodec::decode(black_box(encoded))),
        );
    }

    group.bench_function("reject_malformed", |b| {
        let data = [0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 1, 0xAA];
        b.iter(|| FrameCodec::decode(black_box(&data)));
    });

    group.finish();
}

fn bench_type_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_resolution");

    let args = vec![
        ArgValue::Int(1),
        ArgValue::from("name"),
        ArgValue::Longs(vec![1, 2, 3]),
        ArgValue::Object(Composite::named("com.example.User")),
        ArgValue::Map(vec![]),
    ];

    group.bench_function("infer", |b| {
        b.iter(|| resolve_types(black_box(&args), &[], false));
    });

    group.bench_function("hints", |b| {
        let hints: Vec<String> = (0..args.len()).map(|i| format!("T{}", i)).collect();
        b.iter(|| resolve_types(black_box(&args), black_box(&hints), false));
    });

    group.bench_function("generic", |b| {
        b.iter(|| resolve_types(black_box(&args), &[], true));
    });

    group.bench_function("from_json", |b| {
        let value = json!({"id": 1, "tags": ["a", "b"], "scores": [1.5, 2.5]});
        b.iter(|| ArgValue::from(black_box(value.clone())));
    });

    group.finish();
}

fn bench_service_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("service_key");

    group.bench_function("format", |b| {
        let key = ServiceKey::new("grp", "com.example.Svc", "1.0");
        b.iter(|| black_box(&key).to_string());
    });

    group.bench_function("parse", |b| {
        b.iter(|| ServiceKey::parse(black_box("grp/com.example.Svc:1.0")));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_type_resolution,
    bench_service_key
);
criterion_main!(benches);
