use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::PathParseError;

/// Represents a single element within a canonical path.
///
/// ```
/// # use configdiff_core::diff::PathSegment;
/// let key = PathSegment::key("name");
/// let index = PathSegment::index(2);
/// let identity = PathSegment::identity("id", "7");
/// assert!(matches!(key, PathSegment::Key(_)));
/// assert!(matches!(index, PathSegment::Index(2)));
/// assert_eq!(identity.to_string(), "[id=7]");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Object member lookup.
    Key(String),
    /// Array element lookup by position.
    Index(usize),
    /// Array element lookup by the value of a key field.
    Identity {
        /// Name of the key field.
        field: String,
        /// Rendered scalar value of the key field.
        value: String,
    },
}

impl PathSegment {
    /// Creates a key segment.
    #[must_use]
    pub fn key<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Self::Key(value.into())
    }

    /// Creates an index segment.
    #[must_use]
    pub fn index(value: usize) -> Self {
        Self::Index(value)
    }

    /// Creates an identity segment.
    #[must_use]
    pub fn identity<F, V>(field: F, value: V) -> Self
    where
        F: Into<String>,
        V: Into<String>,
    {
        Self::Identity { field: field.into(), value: value.into() }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "/{key}"),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Identity { field, value } => write!(f, "[{field}={value}]"),
        }
    }
}

/// The canonical location of a node within a document.
///
/// Paths render as slash-delimited strings: object members use `/key`,
/// positional array elements `[i]` and keyed array elements `[field=value]`.
/// The root renders as `/`.
///
/// Ordering compares segment by segment, so parents sort before their
/// children and indices compare numerically.
///
/// ```
/// # use configdiff_core::diff::{Path, PathSegment};
/// let path = Path::new()
///     .with_segment(PathSegment::key("spec"))
///     .with_segment(PathSegment::key("containers"))
///     .with_segment(PathSegment::index(0))
///     .with_segment(PathSegment::key("image"));
/// assert_eq!(path.to_string(), "/spec/containers[0]/image");
/// assert_eq!("/spec/containers[0]/image".parse::<Path>().unwrap(), path);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// Creates the root path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new segment, returning the extended path.
    #[must_use]
    pub fn with_segment(mut self, segment: PathSegment) -> Self {
        self.0.push(segment);
        self
    }

    /// Returns a child path for an object member.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.clone().with_segment(PathSegment::key(key))
    }

    /// Returns a child path for a positional array element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.clone().with_segment(PathSegment::Index(index))
    }

    /// Returns a child path for a keyed array element.
    #[must_use]
    pub fn identity(&self, field: &str, value: &str) -> Self {
        self.clone().with_segment(PathSegment::identity(field, value))
    }

    /// Returns the underlying segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns the number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicates whether this is the root path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path of the enclosing container, or `None` at the root.
    ///
    /// ```
    /// # use configdiff_core::diff::Path;
    /// let path: Path = "/items[2]".parse().unwrap();
    /// assert_eq!(path.parent().unwrap().to_string(), "/items");
    /// assert!(Path::new().parent().is_none());
    /// ```
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// Returns the final segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Pushes a new segment in-place.
    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    /// Pops the last segment off the path.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(value: Vec<PathSegment>) -> Self {
        Self(value)
    }
}

impl From<PathSegment> for Path {
    fn from(value: PathSegment) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !matches!(self.0.first(), Some(PathSegment::Key(_))) {
            f.write_str("/")?;
        }
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some(body) = input.strip_prefix('/') else {
            return Err(PathParseError::NotRooted(input.to_string()));
        };
        let mut segments = Vec::new();
        if body.is_empty() {
            return Ok(Self(segments));
        }
        let leading_selector = body.starts_with('[');
        for (position, part) in body.split('/').enumerate() {
            let (key, mut selectors) = match part.find('[') {
                Some(start) => part.split_at(start),
                None => (part, ""),
            };
            if !(position == 0 && leading_selector) {
                segments.push(PathSegment::key(key));
            }
            while !selectors.is_empty() {
                let Some(end) = selectors.find(']') else {
                    return Err(PathParseError::Unterminated(input.to_string()));
                };
                let selector = &selectors[1..end];
                segments.push(parse_selector(input, selector)?);
                selectors = &selectors[end + 1..];
                if !selectors.is_empty() && !selectors.starts_with('[') {
                    return Err(PathParseError::InvalidSelector {
                        path: input.to_string(),
                        selector: selectors.to_string(),
                    });
                }
            }
        }
        Ok(Self(segments))
    }
}

fn parse_selector(path: &str, selector: &str) -> Result<PathSegment, PathParseError> {
    if let Ok(index) = selector.parse::<usize>() {
        return Ok(PathSegment::Index(index));
    }
    match selector.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok(PathSegment::identity(field, value)),
        _ => Err(PathParseError::InvalidSelector {
            path: path.to_string(),
            selector: selector.to_string(),
        }),
    }
}

impl Serialize for Path {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Reports whether `path` is excluded by any of `patterns`.
///
/// A pattern matches when it equals the path, or when it ends in `/*` and the
/// path starts with the pattern's prefix followed by `/`. Matching is
/// case-sensitive and there are no mid-path wildcards.
///
/// ```
/// # use configdiff_core::diff::is_ignored;
/// let patterns = vec!["/status/*".to_string(), "/metadata/generation".to_string()];
/// assert!(is_ignored("/status/x", &patterns));
/// assert!(is_ignored("/metadata/generation", &patterns));
/// assert!(!is_ignored("/statusx", &patterns));
/// assert!(!is_ignored("/metadata/name", &patterns));
/// ```
#[must_use]
pub fn is_ignored<S>(path: &str, patterns: &[S]) -> bool
where
    S: AsRef<str>,
{
    patterns.iter().any(|pattern| {
        let pattern = pattern.as_ref();
        if path == pattern {
            return true;
        }
        match pattern.strip_suffix("/*") {
            Some(prefix) => {
                path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
            }
            None => false,
        }
    })
}
