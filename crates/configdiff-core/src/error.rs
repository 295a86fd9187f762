use thiserror::Error;

/// Errors that can occur while parsing external documents into [`Node`](crate::Node).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The provided JSON input was invalid.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The provided YAML input was invalid.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// The provided TOML input was invalid.
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    /// The provided HCL input was invalid.
    #[error("failed to parse HCL: {0}")]
    Hcl(#[from] hcl::Error),
    /// Encountered a number that cannot be represented as an IEEE-754 f64.
    #[error("number {value} cannot be represented as f64")]
    NumberOutOfRange {
        /// The textual representation of the offending number.
        value: String,
    },
    /// Mapping keys must be scalars that can be rendered as strings.
    #[error("unsupported YAML key type: {found}")]
    UnsupportedYamlKey {
        /// A description of the key that triggered the error.
        found: String,
    },
    /// YAML tags carry no meaning in the normalized tree.
    #[error("unsupported YAML tag: {tag}")]
    UnsupportedYamlTag {
        /// The tag identifier encountered in the document.
        tag: String,
    },
    /// Attempted to construct a [`Number`](crate::Number) that is not finite.
    #[error("non-finite number encountered: {value}")]
    NotFinite {
        /// The offending numeric value.
        value: f64,
    },
    /// The requested input format is unknown.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    /// Content-based format detection failed.
    #[error("unable to detect format")]
    UndetectedFormat,
    /// The input was not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Errors emitted when constructing [`DiffOptions`](crate::DiffOptions).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionsError {
    /// Ignore patterns are canonical paths and must be rooted.
    #[error("ignore pattern {0:?} must start with '/'")]
    UnrootedIgnorePattern(String),
    /// Array keys must name an array location.
    #[error("array key paths must be non-empty")]
    EmptyArrayPath,
    /// Key field names must be non-empty strings.
    #[error("key field for {path} must be a non-empty string")]
    EmptyKeyField {
        /// The array path the key was configured for.
        path: String,
    },
}

/// Errors produced while parsing a canonical path string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    /// Canonical paths always start at the root.
    #[error("path {0:?} must start with '/'")]
    NotRooted(String),
    /// A bracketed selector was opened but never closed.
    #[error("unterminated selector in {0:?}")]
    Unterminated(String),
    /// A bracketed selector was neither an index nor `field=value`.
    #[error("invalid selector [{selector}] in {path:?}")]
    InvalidSelector {
        /// The full path being parsed.
        path: String,
        /// The selector contents.
        selector: String,
    },
}

/// Top-level error for the document-level entry points.
#[derive(Debug, Error)]
pub enum Error {
    /// One of the documents could not be parsed.
    #[error("failed to parse format {format}: {source}")]
    Parse {
        /// Format of the offending document.
        format: crate::Format,
        /// Underlying parser failure.
        #[source]
        source: ParseError,
    },
    /// The options were invalid.
    #[error(transparent)]
    Options(#[from] OptionsError),
}
