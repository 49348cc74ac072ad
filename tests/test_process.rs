use params_qs::key::{
    ArrayFormat, ArrayKeyStyle, BracketKeyFormatter, DelimiterKeyFormatter, FlatKeyFormatter,
    JsonKeyFormatter,
};
use params_qs::{Array, Error, Object, ParamsProcessor, ProcessOptions, Value};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn default_formatting() {
    let value = Value::from(json!({"a": [1, 2]}));
    assert_eq!(
        params_qs::process("p", &value).unwrap(),
        entries(&[("p.a[0]", "1"), ("p.a[1]", "2")])
    );
    assert_eq!(
        params_qs::to_query_string("p", &value).unwrap(),
        "p.a%5B0%5D=1&p.a%5B1%5D=2"
    );
}

#[test]
fn nested_array_of_objects() {
    let value = Value::from(json!(["x", {"id": 1}]));
    assert_eq!(
        params_qs::process("items", &value).unwrap(),
        entries(&[("items[0]", "x"), ("items[1].id", "1")])
    );
}

#[test]
fn discriminator_skipping() {
    let value = Value::from(json!({"$type": "T", "a": 1}));
    assert_eq!(
        params_qs::process("p", &value).unwrap(),
        entries(&[("p.a", "1")])
    );
}

#[test]
fn depth_first_preorder() {
    let value = Value::from(json!({
        "z": 1,
        "a": {"y": [true, {"x": "deep"}], "b": 2.5},
        "m": null,
        "c": "last",
    }));
    assert_eq!(
        params_qs::process("q", &value).unwrap(),
        entries(&[
            ("q.z", "1"),
            ("q.a.y[0]", "true"),
            ("q.a.y[1].x", "deep"),
            ("q.a.b", "2.5"),
            ("q.c", "last"),
        ])
    );
}

#[test]
fn nulls_inside_arrays_keep_their_index() {
    let value = Value::from(json!([null, "b", null, "d"]));
    assert_eq!(
        params_qs::process("l", &value).unwrap(),
        entries(&[("l[1]", "b"), ("l[3]", "d")])
    );
}

#[test]
fn bracket_formatter() {
    let processor = ParamsProcessor::new().key_formatter(BracketKeyFormatter::new());
    let value = Value::from(json!({"user": {"name": "John"}}));
    assert_eq!(
        processor.process("filter", &value).unwrap(),
        entries(&[("filter[user][name]", "John")])
    );

    let processor = processor.key_formatter(
        BracketKeyFormatter::new().array_format(ArrayFormat::EmptyIndexed),
    );
    let value = Value::from(json!({"ids": [3, 4]}));
    assert_eq!(
        processor.process("f", &value).unwrap(),
        entries(&[("f[ids][]", "3"), ("f[ids][]", "4")])
    );
}

#[test]
fn flat_and_delimiter_formatters() {
    let value = Value::from(json!({"user": {"tags": ["a"]}}));

    let processor = ParamsProcessor::new().key_formatter(FlatKeyFormatter::default());
    assert_eq!(
        processor.process("f", &value).unwrap(),
        entries(&[("f_user_tags_0", "a")])
    );

    let processor = ParamsProcessor::new().key_formatter(DelimiterKeyFormatter::default());
    assert_eq!(
        processor.process("f", &value).unwrap(),
        entries(&[("f:user:tags[0]", "a")])
    );

    let processor = ParamsProcessor::new()
        .key_formatter(DelimiterKeyFormatter::new("/", ArrayKeyStyle::Delimiter));
    assert_eq!(
        processor.process("f", &value).unwrap(),
        entries(&[("f/user/tags/0", "a")])
    );
}

#[test]
fn json_formatter_embeds_root_subtree() {
    let processor = ParamsProcessor::new().key_formatter(JsonKeyFormatter);
    let value = Value::from(json!({"status": "active", "$type": "Filter", "ids": [1, 2]}));
    let query = processor.to_query_string("filter", &value).unwrap();
    insta::assert_snapshot!(
        query,
        @"filter=%7B%22status%22%3A%22active%22%2C%22%24type%22%3A%22Filter%22%2C%22ids%22%3A%5B1%2C2%5D%7D"
    );

    // scalars are not containers, so they never reach the transform
    assert_eq!(
        processor.process("q", &Value::from("plain")).unwrap(),
        entries(&[("q", "plain")])
    );
}

#[test]
fn cycle_through_self_reference() {
    let object = Object::new();
    object.insert("name", "x");
    object.insert("self", object.clone());

    let err = params_qs::process("filter", &Value::from(object)).unwrap_err();
    match err {
        Error::CycleDetected { ref key } => assert_eq!(key, "filter.self"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "circular reference detected at key: filter.self"
    );
}

#[test]
fn cycle_aborts_every_adapter() {
    let array = Array::new();
    array.push("first");
    array.push(array.clone());
    let value = Value::from(array);

    assert!(params_qs::to_query_string("a", &value).is_err());
    assert!(params_qs::to_query_params("a", &value).is_err());
    assert!(params_qs::to_plain_object("a", &value).is_err());
    assert!(params_qs::build_url("/x", "a", &value).is_err());
}

#[test]
fn shared_container_reached_twice_is_a_cycle() {
    let shared = Object::new();
    shared.insert("v", 1);
    let root = Object::new();
    root.insert("left", shared.clone());
    root.insert("right", shared);

    let err = params_qs::process("r", &Value::from(root)).unwrap_err();
    assert!(matches!(err, Error::CycleDetected { ref key } if key == "r.right"));
}

#[test]
fn json_formatter_reports_cycles() {
    let object = Object::new();
    object.insert("self", object.clone());
    let processor = ParamsProcessor::new().key_formatter(JsonKeyFormatter);
    let err = processor.process("q", &Value::from(object)).unwrap_err();
    assert!(matches!(err, Error::CycleDetected { ref key } if key == "q"));
}

#[test]
fn per_call_options() {
    let processor = ParamsProcessor::new();
    let options = ProcessOptions::new()
        .key_formatter(BracketKeyFormatter::new())
        .value_converters(vec![]);
    let value = Value::from(json!({"a": {"b": 1.0}}));
    assert_eq!(
        processor.with_options(&options).process("p", &value).unwrap(),
        entries(&[("p[a][b]", "1")])
    );
    assert_eq!(
        processor.process("p", &value).unwrap(),
        entries(&[("p.a.b", "1")])
    );
}

#[test]
fn processors_are_shareable_across_threads() {
    let processor = ParamsProcessor::new().key_formatter(BracketKeyFormatter::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let processor = processor.clone();
            std::thread::spawn(move || {
                let value = Value::from(json!({"n": i}));
                processor.to_query_string("t", &value).unwrap()
            })
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, ["t%5Bn%5D=0", "t%5Bn%5D=1", "t%5Bn%5D=2", "t%5Bn%5D=3"]);
}

/// Builds a random acyclic tree, returning it with its count of
/// non-null leaves.
fn random_tree(rng: &mut StdRng, depth: u32) -> (serde_json::Value, usize) {
    let kind = if depth == 0 {
        rng.random_range(0..4)
    } else {
        rng.random_range(0..6)
    };
    match kind {
        0 => (json!(null), 0),
        1 => (json!(rng.random_bool(0.5)), 1),
        2 => (json!(rng.random_range(-1000i64..1000)), 1),
        3 => {
            let s: String = (0..rng.random_range(0..8))
                .map(|_| rng.random_range(b'a'..=b'z') as char)
                .collect();
            (json!(s), 1)
        }
        4 => {
            let mut leaves = 0;
            let items: Vec<_> = (0..rng.random_range(0..5))
                .map(|_| {
                    let (item, n) = random_tree(rng, depth - 1);
                    leaves += n;
                    item
                })
                .collect();
            (json!(items), leaves)
        }
        _ => {
            let mut leaves = 0;
            let mut map = serde_json::Map::new();
            for i in 0..rng.random_range(0..5) {
                let (item, n) = random_tree(rng, depth - 1);
                leaves += n;
                map.insert(format!("k{i} x"), item);
            }
            (serde_json::Value::Object(map), leaves)
        }
    }
}

#[test]
fn random_trees_are_deterministic_and_keep_cardinality() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let (tree, leaves) = random_tree(&mut rng, 4);

        // equal but distinct inputs
        let first = params_qs::process("r", &Value::from(tree.clone())).unwrap();
        let second = params_qs::process("r", &Value::from(tree)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), leaves);
    }
}
