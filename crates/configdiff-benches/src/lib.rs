//! Generated configuration corpora for configdiff benchmarks.
//!
//! Every corpus is built from a fixed seed, so repeated runs measure the same
//! documents. A corpus pairs an old and a new document with the options a user
//! would pass for that kind of file.
//!
//! # Examples
//!
//! ```
//! use configdiff_benches::available_corpora;
//!
//! let corpus = available_corpora().iter().find(|c| c.name() == "deployments").unwrap();
//! let dataset = corpus.load();
//! assert!(!dataset.compare().is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use configdiff_core::{compare, report, Change, DiffOptions, Node, Patch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

const SEED: u64 = 0x00c0_ffee;

/// A named, deterministic benchmark input.
#[derive(Clone, Copy, Debug)]
pub struct Corpus {
    name: &'static str,
    build: fn(&mut StdRng) -> Dataset,
}

impl Corpus {
    /// Short identifier used as the benchmark parameter.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Generates the documents.
    pub fn load(&self) -> Dataset {
        (self.build)(&mut StdRng::seed_from_u64(SEED))
    }
}

/// Old and new documents plus the comparison options.
#[derive(Clone, Debug)]
pub struct Dataset {
    old: Node,
    new: Node,
    options: DiffOptions,
}

impl Dataset {
    /// The old document.
    pub fn old(&self) -> &Node {
        &self.old
    }

    /// The new document.
    pub fn new_document(&self) -> &Node {
        &self.new
    }

    /// Options tuned for this corpus.
    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compares the two documents.
    pub fn compare(&self) -> Vec<Change> {
        compare(&self.old, &self.new, &self.options)
    }

    /// Assembles the patch for the comparison.
    pub fn patch(&self) -> Patch {
        Patch::from_changes(&self.compare())
    }

    /// Renders the detailed report for `changes`.
    pub fn render(&self, changes: &[Change]) -> String {
        report::render(changes, &report::ReportOptions::detailed())
    }

    /// Size of both documents serialized as compact JSON.
    pub fn byte_len(&self) -> usize {
        [&self.old, &self.new].iter().map(|node| node.to_json_value().to_string().len()).sum()
    }
}

/// Every registered corpus.
pub fn available_corpora() -> &'static [Corpus] {
    const CORPORA: &[Corpus] = &[
        Corpus { name: "deployments", build: deployments },
        Corpus { name: "flat-settings", build: flat_settings },
        Corpus { name: "positional-lists", build: positional_lists },
    ];
    CORPORA
}

fn node(value: Value) -> Node {
    // Generated values are always finite.
    Node::from_json_value(value).unwrap_or(Node::Null)
}

/// A manifest list whose containers are keyed by name, with reordering,
/// image bumps, removals and additions.
fn deployments(rng: &mut StdRng) -> Dataset {
    let containers: Vec<Value> = (0..200)
        .map(|i| {
            json!({
                "name": format!("svc-{i}"),
                "image": format!("registry.local/svc-{i}:1.{}", rng.gen_range(0..20)),
                "ports": [{"containerPort": 8000 + i}],
                "env": {"LOG_LEVEL": "info", "REPLICA": i % 3},
            })
        })
        .collect();

    let mut updated = containers.clone();
    for container in updated.iter_mut() {
        if rng.gen_bool(0.2) {
            container["image"] = json!(format!("registry.local/next:{}", rng.gen_range(0..100)));
        }
    }
    updated.retain(|_| rng.gen_bool(0.95));
    for i in 0..10 {
        updated.push(json!({"name": format!("new-{i}"), "image": "busybox", "ports": []}));
    }
    for _ in 0..30 {
        let (a, b) = (rng.gen_range(0..updated.len()), rng.gen_range(0..updated.len()));
        updated.swap(a, b);
    }

    let wrap = |containers: Vec<Value>| {
        node(json!({"spec": {"template": {"spec": {"containers": containers}}}}))
    };
    let options = DiffOptions::default()
        .with_array_key("/spec/template/spec/containers", "name")
        .unwrap_or_default();
    Dataset { old: wrap(containers), new: wrap(updated), options }
}

/// A wide two-level settings map with scattered edits and an ignored
/// status section.
fn flat_settings(rng: &mut StdRng) -> Dataset {
    let mut old = Map::new();
    let mut new = Map::new();
    for section in 0..50 {
        let mut before = Map::new();
        let mut after = Map::new();
        for key in 0..40 {
            let value = rng.gen_range(0..1_000);
            before.insert(format!("key{key}"), json!(value));
            let next = if rng.gen_bool(0.05) { json!(value.to_string()) } else { json!(value) };
            after.insert(format!("key{key}"), next);
        }
        old.insert(format!("section{section}"), Value::Object(before));
        new.insert(format!("section{section}"), Value::Object(after));
    }
    old.insert("status".into(), json!({"observed": 1, "ready": false}));
    new.insert("status".into(), json!({"observed": 2, "ready": true}));

    let options = DiffOptions::default().with_ignore_paths(["/status/*"]).unwrap_or_default();
    Dataset { old: node(Value::Object(old)), new: node(Value::Object(new)), options }
}

/// Long unkeyed arrays that grow and change in place.
fn positional_lists(rng: &mut StdRng) -> Dataset {
    let old: Vec<Value> = (0..2_000).map(|_| json!(rng.gen_range(0..50))).collect();
    let mut new = old.clone();
    for value in new.iter_mut() {
        if rng.gen_bool(0.1) {
            *value = json!(rng.gen_range(0..50));
        }
    }
    new.extend((0..100).map(|i| json!({"extra": i})));
    Dataset {
        old: node(json!({"values": old})),
        new: node(json!({"values": new})),
        options: DiffOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpora_are_deterministic() {
        for corpus in available_corpora() {
            let (a, b) = (corpus.load(), corpus.load());
            assert_eq!(a.old(), b.old(), "{}", corpus.name());
            assert_eq!(a.new_document(), b.new_document(), "{}", corpus.name());
        }
    }

    #[test]
    fn every_corpus_has_changes_and_round_trips() {
        for corpus in available_corpora() {
            let dataset = corpus.load();
            let changes = dataset.compare();
            assert!(!changes.is_empty(), "{}", corpus.name());
            let patched = dataset.old().apply_patch(&Patch::from_changes(&changes)).ok();
            // Ignored paths are not carried by the patch.
            if corpus.name() != "flat-settings" {
                assert_eq!(patched.as_ref(), Some(dataset.new_document()), "{}", corpus.name());
            }
            assert!(dataset.byte_len() > 0);
        }
    }

    #[test]
    fn ignored_status_is_absent_from_settings_changes() {
        let corpus = available_corpora().iter().find(|c| c.name() == "flat-settings").unwrap();
        let changes = corpus.load().compare();
        assert!(changes.iter().all(|change| !change.path.to_string().starts_with("/status")));
    }
}
