use std::fmt;
use std::path::Path as FsPath;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Node, ParseError};

/// A supported document format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON.
    Json,
    /// YAML.
    Yaml,
    /// TOML.
    Toml,
    /// HCL, as used by Terraform and other HashiCorp tools.
    Hcl,
}

impl Format {
    /// File extensions recognised for each format.
    pub const EXTENSIONS: [&'static str; 6] = ["json", "yaml", "yml", "toml", "hcl", "tf"];

    /// Infers the format from a file extension, ignoring case.
    ///
    /// ```
    /// # use configdiff_core::Format;
    /// # use std::path::Path;
    /// assert_eq!(Format::from_extension(Path::new("deploy.YML")), Some(Format::Yaml));
    /// assert_eq!(Format::from_extension(Path::new("Cargo.toml")), Some(Format::Toml));
    /// assert_eq!(Format::from_extension(Path::new("main.tf")), Some(Format::Hcl));
    /// assert_eq!(Format::from_extension(Path::new("notes.txt")), None);
    /// ```
    #[must_use]
    pub fn from_extension(path: &FsPath) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "hcl" | "tf" => Some(Self::Hcl),
            _ => None,
        }
    }

    /// Infers the format from document content.
    ///
    /// Content starting with `{` or `[` that parses as JSON is JSON. Otherwise
    /// TOML is tried before YAML, since almost any text is a valid YAML scalar.
    /// HCL is only recognised by extension: its attribute syntax overlaps
    /// with TOML.
    ///
    /// ```
    /// # use configdiff_core::Format;
    /// assert_eq!(Format::from_content(b"  {\"a\": 1}").unwrap(), Format::Json);
    /// assert_eq!(Format::from_content(b"[server]\nport = 80\n").unwrap(), Format::Toml);
    /// assert_eq!(Format::from_content(b"server:\n  port: 80\n").unwrap(), Format::Yaml);
    /// assert!(Format::from_content(b"   ").is_err());
    /// ```
    pub fn from_content(content: &[u8]) -> Result<Self, ParseError> {
        let text = std::str::from_utf8(content)?;
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return Err(ParseError::UndetectedFormat);
        }
        if trimmed.starts_with(['{', '[']) && Node::from_json_str(text).is_ok() {
            return Ok(Self::Json);
        }
        if Node::from_toml_str(text).is_ok() {
            return Ok(Self::Toml);
        }
        if Node::from_yaml_str(text).is_ok() {
            return Ok(Self::Yaml);
        }
        Err(ParseError::UndetectedFormat)
    }

    /// Picks the format for a named input: the extension when recognised,
    /// otherwise the content.
    pub fn detect(path: Option<&FsPath>, content: &[u8]) -> Result<Self, ParseError> {
        if let Some(format) = path.and_then(Self::from_extension) {
            return Ok(format);
        }
        let format = Self::from_content(content)?;
        debug!(%format, "detected format from content");
        Ok(format)
    }

    /// Parses `input` as this format.
    ///
    /// ```
    /// # use configdiff_core::{Format, Node};
    /// let yaml = Format::Yaml.parse(b"a: 1\n").unwrap();
    /// let json = Format::Json.parse(br#"{"a": 1}"#).unwrap();
    /// assert_eq!(yaml, json);
    /// ```
    pub fn parse(self, input: &[u8]) -> Result<Node, ParseError> {
        let text = std::str::from_utf8(input)?;
        match self {
            Self::Json => Node::from_json_str(text),
            Self::Yaml => Node::from_yaml_str(text),
            Self::Toml => Node::from_toml_str(text),
            Self::Hcl => Node::from_hcl_str(text),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Hcl => "hcl",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "toml" => Ok(Self::Toml),
            "hcl" | "tf" => Ok(Self::Hcl),
            _ => Err(ParseError::UnsupportedFormat(value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        let err = "ini".parse::<Format>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format: ini");
    }

    #[test]
    fn extension_wins_over_content() {
        let format = Format::detect(Some(FsPath::new("values.yaml")), b"{\"a\":1}").unwrap();
        assert_eq!(format, Format::Yaml);
    }

    #[test]
    fn hcl_is_detected_by_extension_only() {
        let content = b"region = \"eu-west-1\"\n";
        assert_eq!(Format::detect(Some(FsPath::new("vars.tf")), content).unwrap(), Format::Hcl);
        assert_eq!(Format::detect(None, content).unwrap(), Format::Toml);
        assert_eq!("HCL".parse::<Format>().unwrap(), Format::Hcl);
    }

    #[test]
    fn json_like_toml_is_not_json() {
        assert_eq!(Format::from_content(b"[server]\nport = 80\n").unwrap(), Format::Toml);
        assert_eq!(Format::from_content(b"[1, 2]").unwrap(), Format::Json);
    }

    #[test]
    fn stdin_falls_back_to_content() {
        assert_eq!(Format::detect(None, b"[1, 2]").unwrap(), Format::Json);
        assert_eq!(Format::detect(Some(FsPath::new("-")), b"a: b\n").unwrap(), Format::Yaml);
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let err = Format::Json.parse(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::Utf8(_)));
    }

    #[test]
    fn parse_errors_name_the_format() {
        let err = Format::Json.parse(b"{").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse JSON"));
    }
}
