use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;
use toml::Value as TomlValue;

use crate::{
    diff::{Path, PathSegment},
    Change, DiffOptions, Number, ParseError, Patch, PatchError,
};

/// The normalized, format-agnostic configuration value all inputs are converted into.
///
/// Serializes as its plain JSON content.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// `null`, YAML `~` or an empty document.
    Null,
    /// Boolean.
    Bool(bool),
    /// Number represented as IEEE-754 double precision.
    Number(Number),
    /// String.
    String(String),
    /// Mapping from unique string keys to values.
    Object(BTreeMap<String, Node>),
    /// Ordered sequence.
    Array(Vec<Node>),
}

/// The kind tag of a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    /// [`Node::Null`].
    Null,
    /// [`Node::Bool`].
    Bool,
    /// [`Node::Number`].
    Number,
    /// [`Node::String`].
    String,
    /// [`Node::Object`].
    Object,
    /// [`Node::Array`].
    Array,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

impl Node {
    /// Parses a JSON string into the normalized tree.
    ///
    /// ```
    /// # use configdiff_core::Node;
    /// let node = Node::from_json_str("{\"hello\":\"world\"}")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    pub fn from_json_str(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Ok(Self::Null);
        }
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Parses a YAML string into the normalized tree.
    ///
    /// ```
    /// # use configdiff_core::Node;
    /// let node = Node::from_yaml_str("---\nanswer: 42\n")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    pub fn from_yaml_str(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Ok(Self::Null);
        }
        let value: YamlValue = serde_yaml::from_str(input)?;
        Self::from_yaml_value(value)
    }

    /// Parses a TOML document into the normalized tree.
    ///
    /// ```
    /// # use configdiff_core::Node;
    /// let node = Node::from_toml_str("[server]\nport = 8080\n")?;
    /// assert!(matches!(node, Node::Object(_)));
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    pub fn from_toml_str(input: &str) -> Result<Self, ParseError> {
        let value: TomlValue = toml::from_str(input)?;
        Self::from_toml_value(value)
    }

    /// Parses an HCL body. Attributes become members and blocks become nested
    /// objects keyed by their labels.
    ///
    /// ```
    /// # use configdiff_core::Node;
    /// let node = Node::from_hcl_str("replicas = 3\nregion = \"eu-west-1\"\n")?;
    /// let json = Node::from_json_str(r#"{"replicas": 3, "region": "eu-west-1"}"#)?;
    /// assert_eq!(node, json);
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    pub fn from_hcl_str(input: &str) -> Result<Self, ParseError> {
        let value: JsonValue = hcl::from_str(input)?;
        Self::from_json_value(value)
    }

    /// Converts a serde JSON value into a [`Node`].
    pub fn from_json_value(value: JsonValue) -> Result<Self, ParseError> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(v) => Ok(Self::Bool(v)),
            JsonValue::Number(num) => {
                let Some(as_f64) = num.as_f64() else {
                    return Err(ParseError::NumberOutOfRange { value: num.to_string() });
                };
                Ok(Self::Number(Number::new(as_f64)?))
            }
            JsonValue::String(s) => Ok(Self::String(s)),
            JsonValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_json_value(value)?);
                }
                Ok(Self::Array(items))
            }
            JsonValue::Object(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(key, Self::from_json_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    fn from_yaml_value(value: YamlValue) -> Result<Self, ParseError> {
        match value {
            YamlValue::Null => Ok(Self::Null),
            YamlValue::Bool(v) => Ok(Self::Bool(v)),
            YamlValue::Number(num) => {
                if let Some(f) = num.as_f64() {
                    return Ok(Self::Number(Number::new(f)?));
                }
                if let Some(i) = num.as_i64() {
                    return Ok(Self::Number(Number::new(i as f64)?));
                }
                if let Some(u) = num.as_u64() {
                    return Ok(Self::Number(Number::new(u as f64)?));
                }
                Err(ParseError::NumberOutOfRange { value: num.to_string() })
            }
            YamlValue::String(s) => Ok(Self::String(s)),
            YamlValue::Sequence(seq) => {
                let mut items = Vec::with_capacity(seq.len());
                for value in seq {
                    items.push(Self::from_yaml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            YamlValue::Mapping(map) => {
                let mut object = BTreeMap::new();
                for (key, value) in map {
                    object.insert(yaml_key(key)?, Self::from_yaml_value(value)?);
                }
                Ok(Self::Object(object))
            }
            YamlValue::Tagged(tagged) => {
                Err(ParseError::UnsupportedYamlTag { tag: tagged.tag.to_string() })
            }
        }
    }

    fn from_toml_value(value: TomlValue) -> Result<Self, ParseError> {
        match value {
            TomlValue::String(s) => Ok(Self::String(s)),
            TomlValue::Integer(i) => Ok(Self::Number(Number::new(i as f64)?)),
            TomlValue::Float(f) => Ok(Self::Number(Number::new(f)?)),
            TomlValue::Boolean(b) => Ok(Self::Bool(b)),
            TomlValue::Datetime(datetime) => Ok(Self::String(datetime.to_string())),
            TomlValue::Array(values) => {
                let mut items = Vec::with_capacity(values.len());
                for value in values {
                    items.push(Self::from_toml_value(value)?);
                }
                Ok(Self::Array(items))
            }
            TomlValue::Table(table) => {
                let mut object = BTreeMap::new();
                for (key, value) in table {
                    object.insert(key, Self::from_toml_value(value)?);
                }
                Ok(Self::Object(object))
            }
        }
    }

    /// Converts the node into a serde JSON value.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Number(n) => JsonValue::Number(n.to_json_number()),
            Self::String(s) => JsonValue::String(s.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Self::to_json_value).collect()),
            Self::Object(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json_value());
                }
                JsonValue::Object(object)
            }
        }
    }

    /// Returns the kind tag of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Null => NodeKind::Null,
            Self::Bool(_) => NodeKind::Bool,
            Self::Number(_) => NodeKind::Number,
            Self::String(_) => NodeKind::String,
            Self::Object(_) => NodeKind::Object,
            Self::Array(_) => NodeKind::Array,
        }
    }

    /// Indicates whether the node is a leaf value.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::Array(_))
    }

    /// Retrieves the descendant at `path`, if it exists.
    ///
    /// ```
    /// # use configdiff_core::{diff::Path, Node};
    /// let doc = Node::from_json_str(r#"{"spec":{"containers":[{"image":"nginx"}]}}"#)?;
    /// let path: Path = "/spec/containers[0]/image".parse().unwrap();
    /// assert_eq!(doc.get(&path), Some(&Node::String("nginx".into())));
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Self> {
        let mut current = self;
        for segment in path {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Mutable counterpart of [`Node::get`].
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Self> {
        let mut current = self;
        for segment in path {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    fn child(&self, segment: &PathSegment) -> Option<&Self> {
        match (self, segment) {
            (Self::Object(map), PathSegment::Key(key)) => map.get(key),
            (Self::Array(items), PathSegment::Index(index)) => items.get(*index),
            (Self::Array(items), PathSegment::Identity { field, value }) => {
                items.iter().find(|item| item.has_identity(field, value))
            }
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &PathSegment) -> Option<&mut Self> {
        match (self, segment) {
            (Self::Object(map), PathSegment::Key(key)) => map.get_mut(key),
            (Self::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
            (Self::Array(items), PathSegment::Identity { field, value }) => {
                items.iter_mut().find(|item| item.has_identity(field, value))
            }
            _ => None,
        }
    }

    /// Indicates whether this node is an object whose `field` renders as `value`.
    pub(crate) fn has_identity(&self, field: &str, value: &str) -> bool {
        match self {
            Self::Object(map) => {
                map.get(field).and_then(Self::scalar_text).is_some_and(|text| text == value)
            }
            _ => false,
        }
    }

    /// Renders a scalar the way it appears inside a `[field=value]` selector.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Object(_) | Self::Array(_) => None,
        }
    }

    /// Visits every node depth-first, pairing each with its canonical path.
    ///
    /// Object members are visited in key order.
    ///
    /// ```
    /// # use configdiff_core::Node;
    /// let doc = Node::from_json_str(r#"{"a":[1,{"b":true}]}"#)?;
    /// let paths: Vec<String> = doc.walk().into_iter().map(|(path, _)| path.to_string()).collect();
    /// assert_eq!(paths, ["/", "/a", "/a[0]", "/a[1]", "/a[1]/b"]);
    /// # Ok::<(), configdiff_core::ParseError>(())
    /// ```
    #[must_use]
    pub fn walk(&self) -> Vec<(Path, &Self)> {
        let mut visited = Vec::new();
        let mut pending = vec![(Path::new(), self)];
        while let Some((path, node)) = pending.pop() {
            match node {
                Self::Object(map) => {
                    for (key, child) in map.iter().rev() {
                        pending.push((path.key(key), child));
                    }
                }
                Self::Array(items) => {
                    for (index, child) in items.iter().enumerate().rev() {
                        pending.push((path.index(index), child));
                    }
                }
                _ => {}
            }
            visited.push((path, node));
        }
        visited
    }

    /// Computes the semantic changes that turn `self` into `other`.
    ///
    /// ```
    /// # use configdiff_core::{DiffOptions, Node};
    /// let lhs = Node::from_json_str(r#"{"replicas":1}"#).unwrap();
    /// let rhs = Node::from_json_str(r#"{"replicas":2}"#).unwrap();
    /// let changes = lhs.diff(&rhs, &DiffOptions::default());
    /// assert_eq!(changes.len(), 1);
    /// assert_eq!(changes[0].path.to_string(), "/replicas");
    /// ```
    #[must_use]
    pub fn diff(&self, other: &Self, options: &DiffOptions) -> Vec<Change> {
        crate::diff::compare(self, other, options)
    }

    /// Applies a patch to this node, returning the patched node on success.
    ///
    /// ```
    /// # use configdiff_core::{DiffOptions, Node, Patch};
    /// let base = Node::from_json_str("[1,2,3]")?;
    /// let target = Node::from_json_str("[1,4]")?;
    /// let patch = Patch::from_changes(&base.diff(&target, &DiffOptions::default()));
    /// assert_eq!(base.apply_patch(&patch)?, target);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn apply_patch(&self, patch: &Patch) -> Result<Self, PatchError> {
        crate::patch::apply_patch(self, patch)
    }
}

fn yaml_key(key: YamlValue) -> Result<String, ParseError> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        other => Err(ParseError::UnsupportedYamlKey { found: format!("{other:?}") }),
    }
}

impl TryFrom<JsonValue> for Node {
    type Error = ParseError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json_value(value)
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match n.as_integer() {
                Some(int) if !(n.get() == 0.0 && n.get().is_sign_negative()) => {
                    serializer.serialize_i64(int)
                }
                _ => serializer.serialize_f64(n.get()),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}
