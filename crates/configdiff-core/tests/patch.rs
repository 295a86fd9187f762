use configdiff_core::{compare, DiffOptions, Node, OpKind, Patch, PatchError};
use proptest::prelude::*;
use serde_json::json;

fn node(value: serde_json::Value) -> Node {
    Node::from_json_value(value).unwrap()
}

fn round_trip(old: &Node, new: &Node, opts: &DiffOptions) -> Result<Node, PatchError> {
    let patch = Patch::from_changes(&compare(old, new, opts));
    old.apply_patch(&patch)
}

#[test]
fn apply_patch_replaces_scalar() {
    let (old, new) = (node(json!(1)), node(json!(2)));
    assert_eq!(round_trip(&old, &new, &DiffOptions::default()).unwrap(), new);
}

#[test]
fn apply_patch_handles_object_insertion() {
    let old = node(json!({"a": 1}));
    let new = node(json!({"a": 1, "b": {"c": [1, 2]}}));
    assert_eq!(round_trip(&old, &new, &DiffOptions::default()).unwrap(), new);
}

#[test]
fn apply_patch_shrinks_nested_arrays() {
    let old = node(json!([[1, 2], [3], [4]]));
    let new = node(json!([[1]]));
    assert_eq!(round_trip(&old, &new, &DiffOptions::default()).unwrap(), new);
}

#[test]
fn apply_patch_grows_nested_arrays() {
    let old = node(json!([[1]]));
    let new = node(json!([[1, 2], [3]]));
    assert_eq!(round_trip(&old, &new, &DiffOptions::default()).unwrap(), new);
}

#[test]
fn keyed_patch_reorders_inserts_and_deletes() {
    let old = node(json!({"users": [
        {"login": "ana", "role": "admin"},
        {"login": "bo", "role": "dev"},
        {"login": "cy", "role": "dev"},
        {"login": "di", "role": "ops"}
    ]}));
    let new = node(json!({"users": [
        {"login": "di", "role": "ops"},
        {"login": "eve", "role": "dev"},
        {"login": "ana", "role": "owner"},
        {"login": "cy", "role": "dev"}
    ]}));
    let opts = DiffOptions::default().with_array_key("/users", "login").unwrap();
    assert_eq!(round_trip(&old, &new, &opts).unwrap(), new);
    assert_eq!(round_trip(&old, &new, &opts.clone().with_stable_order(true)).unwrap(), new);
}

#[test]
fn keyed_patch_at_document_root() {
    let old = node(json!([{"id": "a"}, {"id": "b"}, {"id": "c"}]));
    let new = node(json!([{"id": "c"}, {"id": "a", "x": 1}]));
    let opts = DiffOptions::default().with_array_key("/", "id").unwrap();
    assert_eq!(round_trip(&old, &new, &opts).unwrap(), new);
}

#[test]
fn keyed_patch_keeps_number_and_string_ids_apart() {
    let old = node(json!({"items": [{"id": 1, "v": 1}, {"id": "1", "v": 2}]}));
    let new = node(json!({"items": [{"id": 1, "v": 1}, {"id": "1", "v": 3}]}));
    let opts = DiffOptions::default().with_array_key("/items", "id").unwrap();
    assert_eq!(round_trip(&old, &new, &opts).unwrap(), new);

    let retyped = node(json!({"items": [{"id": "1", "v": 1}, {"id": 2}]}));
    let old = node(json!({"items": [{"id": 1, "v": 1}, {"id": 2}]}));
    assert_eq!(round_trip(&old, &retyped, &opts).unwrap(), retyped);
}

#[test]
fn move_operations_carry_source_and_target() {
    let old = node(json!({"items": [{"id": 1}, {"id": 2}]}));
    let new = node(json!({"items": [{"id": 2}, {"id": 1}]}));
    let opts = DiffOptions::default().with_array_key("/items", "id").unwrap();
    let patch = Patch::from_changes(&compare(&old, &new, &opts));
    let moves: Vec<(String, String)> = patch
        .iter()
        .filter(|op| op.op == OpKind::Move)
        .map(|op| (op.from.as_ref().unwrap().to_string(), op.path.to_string()))
        .collect();
    assert_eq!(
        moves,
        [
            ("/items[id=1]".to_string(), "/items[1]".to_string()),
            ("/items[id=2]".to_string(), "/items[0]".to_string()),
        ]
    );
}

#[test]
fn patch_applied_to_a_different_document_fails() {
    let old = node(json!({"a": {"b": 1}}));
    let new = node(json!({"a": {"b": 2}}));
    let patch = Patch::from_changes(&compare(&old, &new, &DiffOptions::default()));
    let err = node(json!({"a": 1})).apply_patch(&patch).unwrap_err();
    assert_eq!(err.to_string(), "replace target /a/b does not exist");
}

#[test]
fn patch_json_round_trips() {
    let old = node(json!({"a": [1, 2], "b": null}));
    let new = node(json!({"a": [1], "c": null}));
    let patch = Patch::from_changes(&compare(&old, &new, &DiffOptions::default()));
    let json = serde_json::to_string_pretty(&patch).unwrap();
    let decoded: Patch = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, patch);
    assert_eq!(old.apply_patch(&decoded).unwrap(), new);
}

fn arb_json_value() -> impl Strategy<Value = serde_json::Value> {
    use proptest::{collection::btree_map, collection::vec, string::string_regex};

    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::Bool),
        (-20i64..20).prop_map(|n| json!(n)),
        (-20i64..20).prop_map(|n| json!(n as f64 / 4.0)),
        string_regex("[a-z]{0,3}").unwrap().prop_map(serde_json::Value::String),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..5).prop_map(serde_json::Value::Array),
            btree_map(string_regex("[a-d]").unwrap(), inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

fn arb_keyed_items() -> impl Strategy<Value = serde_json::Value> {
    use proptest::collection::{btree_map, vec};

    // Ids are numbers or their string forms, so some arrays hold both `3` and `"3"`.
    btree_map((0u8..12, any::<bool>()), (0u8..3, vec(0u8..3, 0..4)), 0..8)
        .prop_map(|elements| {
            elements
                .into_iter()
                .map(|((id, textual), (v, tags))| {
                    let id = if textual { json!(id.to_string()) } else { json!(id) };
                    json!({"id": id, "v": v, "tags": tags})
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
        .prop_map(|items| json!({"items": items}))
}

proptest! {
    #[test]
    fn positional_patches_reproduce_the_target(a in arb_json_value(), b in arb_json_value(), stable in any::<bool>()) {
        let (old, new) = (node(a), node(b));
        let opts = DiffOptions::default().with_stable_order(stable);
        prop_assert_eq!(round_trip(&old, &new, &opts).unwrap(), new);
    }

    #[test]
    fn keyed_patches_reproduce_the_target(a in arb_keyed_items(), b in arb_keyed_items(), stable in any::<bool>()) {
        let (old, new) = (node(a), node(b));
        let opts = DiffOptions::default()
            .with_array_key("/items", "id")
            .unwrap()
            .with_stable_order(stable);
        prop_assert_eq!(round_trip(&old, &new, &opts).unwrap(), new);
    }
}
