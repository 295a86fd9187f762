use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{diff::is_ignored, OptionsError};

/// Rules for treating scalars of different kinds as equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coercions {
    /// A string equals a number when it parses to that number.
    #[serde(default)]
    pub numeric_strings: bool,
    /// The strings `"true"` and `"false"` equal the matching booleans.
    #[serde(default)]
    pub bool_strings: bool,
}

/// Immutable configuration for one comparison.
///
/// Deserialized options go through the same validation as the builders.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawOptions")]
pub struct DiffOptions {
    ignore_paths: Vec<String>,
    array_set_keys: BTreeMap<String, String>,
    coercions: Coercions,
    stable_order: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    ignore_paths: Vec<String>,
    #[serde(default)]
    array_set_keys: BTreeMap<String, String>,
    #[serde(default)]
    coercions: Coercions,
    #[serde(default)]
    stable_order: bool,
}

impl TryFrom<RawOptions> for DiffOptions {
    type Error = OptionsError;

    fn try_from(raw: RawOptions) -> Result<Self, Self::Error> {
        let mut options = Self::default()
            .with_ignore_paths(raw.ignore_paths)?
            .with_coercions(raw.coercions)
            .with_stable_order(raw.stable_order);
        for (path, field) in raw.array_set_keys {
            options = options.with_array_key(path, field)?;
        }
        Ok(options)
    }
}

impl DiffOptions {
    /// Returns the configured ignore patterns.
    ///
    /// ```
    /// # use configdiff_core::DiffOptions;
    /// let opts = DiffOptions::default()
    ///     .with_ignore_paths(["/status/*"])
    ///     .expect("rooted pattern");
    /// assert_eq!(opts.ignore_paths(), ["/status/*"]);
    /// ```
    #[must_use]
    pub fn ignore_paths(&self) -> &[String] {
        &self.ignore_paths
    }

    /// Returns the array path to key field mapping used for set-style matching.
    #[must_use]
    pub fn array_set_keys(&self) -> &BTreeMap<String, String> {
        &self.array_set_keys
    }

    /// Returns the key field configured for the array at `path`, if any.
    ///
    /// ```
    /// # use configdiff_core::DiffOptions;
    /// let opts = DiffOptions::default()
    ///     .with_array_key("/spec/containers", "name")
    ///     .expect("valid key");
    /// assert_eq!(opts.array_key("/spec/containers"), Some("name"));
    /// assert_eq!(opts.array_key("/spec/volumes"), None);
    /// ```
    #[must_use]
    pub fn array_key(&self, path: &str) -> Option<&str> {
        self.array_set_keys.get(path).map(String::as_str)
    }

    /// Returns the configured coercion rules.
    #[must_use]
    pub fn coercions(&self) -> Coercions {
        self.coercions
    }

    /// Indicates whether changes are sorted by canonical path.
    #[must_use]
    pub fn stable_order(&self) -> bool {
        self.stable_order
    }

    /// Reports whether `path` is excluded from comparison.
    #[must_use]
    pub fn ignores(&self, path: &str) -> bool {
        !self.ignore_paths.is_empty() && is_ignored(path, &self.ignore_paths)
    }

    /// Adds ignore patterns. Patterns are exact canonical paths or paths
    /// ending in `/*`.
    ///
    /// ```
    /// # use configdiff_core::{DiffOptions, OptionsError};
    /// let err = DiffOptions::default().with_ignore_paths(["status"]).unwrap_err();
    /// assert_eq!(err, OptionsError::UnrootedIgnorePattern("status".into()));
    /// ```
    pub fn with_ignore_paths<I, S>(mut self, patterns: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            let pattern = pattern.into();
            if !pattern.starts_with('/') {
                return Err(OptionsError::UnrootedIgnorePattern(pattern));
            }
            if !self.ignore_paths.contains(&pattern) {
                self.ignore_paths.push(pattern);
            }
        }
        Ok(self)
    }

    /// Configures set-style matching for the array at `path`, identifying
    /// elements by their `field` member.
    pub fn with_array_key<P, K>(mut self, path: P, field: K) -> Result<Self, OptionsError>
    where
        P: Into<String>,
        K: Into<String>,
    {
        let path = path.into();
        let field = field.into();
        if path.trim().is_empty() {
            return Err(OptionsError::EmptyArrayPath);
        }
        if field.trim().is_empty() {
            return Err(OptionsError::EmptyKeyField { path });
        }
        self.array_set_keys.insert(path, field);
        Ok(self)
    }

    /// Sets the coercion rules.
    #[must_use]
    pub fn with_coercions(mut self, coercions: Coercions) -> Self {
        self.coercions = coercions;
        self
    }

    /// Enables or disables sorting of changes by canonical path.
    #[must_use]
    pub fn with_stable_order(mut self, enabled: bool) -> Self {
        self.stable_order = enabled;
        self
    }
}
