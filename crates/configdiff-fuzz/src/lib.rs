//! Fuzzing harnesses for configdiff.
//!
//! Each public function accepts raw bytes so it can be driven from
//! `cargo fuzz` targets as well as from plain unit tests. Recoverable errors
//! are swallowed; broken invariants panic so the fuzzer records them.
//!
//! # Examples
//!
//! ```
//! configdiff_fuzz::fuzz_parse(b"a: [1, 2]\n");
//! configdiff_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! configdiff_fuzz::fuzz_patch(b"[{\"op\":\"remove\",\"path\":\"/a\"}]");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use configdiff_core::{compare, Coercions, DiffOptions, Format, Node, Patch};
use serde_json::{self, json, Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 12;
const MAX_KEYED_ITEMS: u8 = 8;

/// Feeds arbitrary bytes through format detection and every parser.
///
/// ```
/// configdiff_fuzz::fuzz_parse(b"[server]\nport = 80\n");
/// ```
pub fn fuzz_parse(data: &[u8]) {
    if let Ok(format) = Format::from_content(data) {
        assert!(format.parse(data).is_ok(), "detected {format} but parsing failed");
    }
    for format in [Format::Json, Format::Yaml, Format::Toml, Format::Hcl] {
        if let Ok(node) = format.parse(data) {
            assert!(compare(&node, &node, &DiffOptions::default()).is_empty());
        }
    }
}

/// Compares randomly generated documents and checks the core invariants:
/// comparison is reflexive, and the assembled patch turns the old document
/// into the new one, both positionally and with keyed arrays.
///
/// ```
/// configdiff_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Ok(stable) = unstructured.arbitrary::<bool>() else {
        return;
    };

    if let (Some(old), Some(new)) = (random_node(&mut unstructured), random_node(&mut unstructured))
    {
        let opts = DiffOptions::default().with_stable_order(stable);
        assert_round_trip(&old, &new, &opts);

        let lenient = opts.with_coercions(Coercions { numeric_strings: true, bool_strings: true });
        assert!(compare(&old, &old, &lenient).is_empty());
    }

    if let (Some(old), Some(new)) =
        (random_keyed(&mut unstructured), random_keyed(&mut unstructured))
    {
        let Ok(opts) = DiffOptions::default().with_array_key("/items", "id") else {
            return;
        };
        assert_round_trip(&old, &new, &opts.with_stable_order(stable));
    }
}

/// Applies generated and arbitrary patches to random documents.
///
/// The raw bytes are also decoded as a patch and applied to a random
/// document to exercise the error paths of patch application.
///
/// ```
/// configdiff_fuzz::fuzz_patch(b"patch fuzz");
/// ```
pub fn fuzz_patch(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    if let (Some(base), Some(target)) =
        (random_node(&mut unstructured), random_node(&mut unstructured))
    {
        let patch = Patch::from_changes(&compare(&base, &target, &DiffOptions::default()));
        let _ = target.apply_patch(&patch);
        let _ = base.apply_patch(&patch);
    }

    if let Ok(patch) = serde_json::from_slice::<Patch>(data) {
        let mut unstructured = Unstructured::new(data);
        if let Some(seed) = random_node(&mut unstructured) {
            let _ = seed.apply_patch(&patch);
        }
    }
}

fn assert_round_trip(old: &Node, new: &Node, opts: &DiffOptions) {
    let changes = compare(old, new, opts);
    let patch = Patch::from_changes(&changes);
    match old.apply_patch(&patch) {
        Ok(patched) => assert_eq!(&patched, new, "patch {patch:?} did not reproduce the target"),
        Err(err) => panic!("patch {patch:?} failed to apply: {err}"),
    }
}

fn random_node(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let value = json_value_from_unstructured(unstructured, 0).ok()?;
    Node::from_json_value(value).ok()
}

/// `{"items": [...]}` with unique scalar `id` fields in shuffled order.
fn random_keyed(unstructured: &mut Unstructured<'_>) -> Option<Node> {
    let len = unstructured.int_in_range::<u8>(0..=MAX_KEYED_ITEMS).ok()?;
    let mut ids: Vec<u8> = (0..MAX_KEYED_ITEMS * 2).collect();
    let mut items = Vec::with_capacity(usize::from(len));
    for _ in 0..len {
        let pick = unstructured.int_in_range::<usize>(0..=ids.len() - 1).ok()?;
        let id = ids.swap_remove(pick);
        let value = json_value_from_unstructured(unstructured, MAX_DEPTH - 1).ok()?;
        items.push(json!({"id": id, "value": value}));
    }
    Node::from_json_value(json!({ "items": items })).ok()
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    let choice = unstructured.int_in_range::<u8>(0..=5)?;
    match choice {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        3 => Ok(JsonValue::String(random_string(unstructured)?)),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = random_string(unstructured)?;
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    match unstructured.int_in_range::<u8>(0..=3)? {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        // Integers beyond 2^53 lose precision in the f64-backed model.
        let int = unstructured.int_in_range::<i64>(-(1 << 53)..=(1 << 53))?;
        Ok(JsonNumber::from(int))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        let byte = unstructured.int_in_range::<u8>(0x20..=0x7e)?;
        string.push(char::from(byte));
    }
    Ok(string)
}
