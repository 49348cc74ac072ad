use criterion::{black_box, criterion_group, criterion_main, Criterion};
use params_qs::key::{BracketKeyFormatter, JsonKeyFormatter};
use params_qs::{ParamsProcessor, Value};
use serde::Serialize;
use std::collections::BTreeMap;

// Simple data structures for benchmarking
#[derive(Debug, Clone, Serialize)]
struct SimpleStruct {
    id: u32,
    name: String,
    active: bool,
}

#[derive(Debug, Clone, Serialize)]
struct SimpleVecWrapper {
    items: Vec<u32>,
}

// Complex/nested data structures for benchmarking
#[derive(Debug, Clone, Serialize)]
struct Address {
    city: String,
    street: String,
    postcode: String,
}

#[derive(Debug, Clone, Serialize)]
struct QueryParams {
    id: u8,
    name: String,
    phone: u32,
    address: Address,
    user_ids: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
struct DeepNested {
    level1: Level1,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
struct Level1 {
    level2: Level2,
    tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Level2 {
    level3: Level3,
    config: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, Serialize)]
struct Level3 {
    value: String,
    flags: Vec<bool>,
}

fn simple_value() -> Value {
    params_qs::to_value(&SimpleStruct {
        id: 42,
        name: "test_user".to_string(),
        active: true,
    })
    .unwrap()
}

fn nested_value() -> Value {
    params_qs::to_value(&QueryParams {
        id: 42,
        name: "Acme".to_string(),
        phone: 12345,
        address: Address {
            city: "Carrot City".to_string(),
            street: "Special-Street* No. 11".to_string(),
            postcode: "12345".to_string(),
        },
        user_ids: vec![1, 2, 3, 4],
    })
    .unwrap()
}

fn deep_value() -> Value {
    let mut metadata = BTreeMap::new();
    metadata.insert("version".to_string(), "1.0".to_string());
    metadata.insert("author".to_string(), "test".to_string());

    let mut config = BTreeMap::new();
    config.insert("max_retry".to_string(), 3);
    config.insert("timeout".to_string(), 30);

    params_qs::to_value(&DeepNested {
        level1: Level1 {
            level2: Level2 {
                level3: Level3 {
                    value: "deep_value".to_string(),
                    flags: vec![true, false, true],
                },
                config,
            },
            tags: vec!["tag1".to_string(), "tag2".to_string(), "tag3".to_string()],
        },
        metadata,
    })
    .unwrap()
}

fn large_vec_value() -> Value {
    params_qs::to_value(&SimpleVecWrapper {
        items: (0..100).collect(),
    })
    .unwrap()
}

fn to_value_nested_struct(c: &mut Criterion) {
    let data = QueryParams {
        id: 42,
        name: "Acme".to_string(),
        phone: 12345,
        address: Address {
            city: "Carrot City".to_string(),
            street: "Special-Street* No. 11".to_string(),
            postcode: "12345".to_string(),
        },
        user_ids: vec![1, 2, 3, 4],
    };

    c.bench_function("to_value_nested_struct", |b| {
        b.iter(|| params_qs::to_value(black_box(&data)).unwrap())
    });
}

fn process_simple_struct(c: &mut Criterion) {
    let value = simple_value();
    let processor = ParamsProcessor::new();

    c.bench_function("process_simple_struct", |b| {
        b.iter(|| processor.process("q", black_box(&value)).unwrap())
    });
}

fn process_nested_struct(c: &mut Criterion) {
    let value = nested_value();
    let processor = ParamsProcessor::new();

    c.bench_function("process_nested_struct", |b| {
        b.iter(|| processor.process("q", black_box(&value)).unwrap())
    });
}

fn process_deep_nested(c: &mut Criterion) {
    let value = deep_value();
    let processor = ParamsProcessor::new();

    c.bench_function("process_deep_nested", |b| {
        b.iter(|| processor.process("q", black_box(&value)).unwrap())
    });
}

fn process_large_vec(c: &mut Criterion) {
    let value = large_vec_value();
    let processor = ParamsProcessor::new();

    c.bench_function("process_large_vec", |b| {
        b.iter(|| processor.process("q", black_box(&value)).unwrap())
    });
}

fn query_string_nested_struct(c: &mut Criterion) {
    let value = nested_value();
    let processor = ParamsProcessor::new();

    c.bench_function("query_string_nested_struct", |b| {
        b.iter(|| processor.to_query_string("q", black_box(&value)).unwrap())
    });
}

fn query_string_bracket_keys(c: &mut Criterion) {
    let value = deep_value();
    let processor = ParamsProcessor::new().key_formatter(BracketKeyFormatter::new());

    c.bench_function("query_string_bracket_keys", |b| {
        b.iter(|| processor.to_query_string("q", black_box(&value)).unwrap())
    });
}

fn query_string_json_keys(c: &mut Criterion) {
    let value = deep_value();
    let processor = ParamsProcessor::new().key_formatter(JsonKeyFormatter);

    c.bench_function("query_string_json_keys", |b| {
        b.iter(|| processor.to_query_string("q", black_box(&value)).unwrap())
    });
}

fn plain_object_large_vec(c: &mut Criterion) {
    let value = large_vec_value();
    let processor = ParamsProcessor::new();

    c.bench_function("plain_object_large_vec", |b| {
        b.iter(|| processor.to_plain_object("q", black_box(&value)).unwrap())
    });
}

criterion_group!(
    process_benches,
    to_value_nested_struct,
    process_simple_struct,
    process_nested_struct,
    process_deep_nested,
    process_large_vec
);

criterion_group!(
    output_benches,
    query_string_nested_struct,
    query_string_bracket_keys,
    query_string_json_keys,
    plain_object_large_vec
);

criterion_main!(process_benches, output_benches);
