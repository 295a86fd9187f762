//! Config file loading and flag resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use configdiff_core::{report::ReportOptions, Coercions, DiffOptions};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{Cli, InputFormat, OutputFormat};

const CONFIG_NAMES: [&str; 2] = [".configdiffrc", ".configdiff.yaml"];
const DEFAULT_MAX_VALUE_LENGTH: usize = 80;

/// Defaults read from a YAML config file.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub ignore_paths: Vec<String>,
    pub array_keys: BTreeMap<String, String>,
    pub numeric_strings: bool,
    pub bool_strings: bool,
    pub stable_order: Option<bool>,
    pub output_format: Option<OutputFormat>,
    pub max_value_length: Option<usize>,
    pub no_color: bool,
}

impl ConfigFile {
    /// Loads `explicit` when given. Otherwise the first readable file among
    /// `.configdiffrc` and `.configdiff.yaml` in the working directory, then in
    /// the home directory. No file at all yields the defaults.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for candidate in candidates() {
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(err) => warn!(path = %candidate.display(), "skipping config file: {err:#}"),
            }
        }
        Ok(Self::default())
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&data)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub(crate) fn from_yaml(data: &str) -> Result<Self> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }
}

fn candidates() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = CONFIG_NAMES.iter().map(PathBuf::from).collect();
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        paths.extend(CONFIG_NAMES.iter().map(|name| home.join(name)));
    }
    paths
}

/// Fully resolved run configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Settings {
    pub options: DiffOptions,
    pub old_format: InputFormat,
    pub new_format: InputFormat,
    pub output: OutputFormat,
    pub color: bool,
    pub max_value_length: usize,
    pub quiet: bool,
    pub exit_code: bool,
    pub recursive: bool,
}

impl Settings {
    /// Merges flags with config file defaults.
    ///
    /// Ignore paths are unioned and array keys merged, with flags winning on
    /// conflicts. Boolean switches are enabled by either source. Values given
    /// explicitly on the command line override the file.
    pub(crate) fn resolve(cli: &Cli, config: &ConfigFile) -> Result<Self> {
        let mut options = DiffOptions::default()
            .with_ignore_paths(config.ignore_paths.iter().chain(&cli.ignore).cloned())?;
        for (path, field) in &config.array_keys {
            options = options.with_array_key(rooted(path), field.as_str())?;
        }
        for spec in &cli.array_key {
            let (path, field) = parse_array_key(spec)?;
            options = options.with_array_key(path, field)?;
        }
        let options = options
            .with_coercions(Coercions {
                numeric_strings: cli.numeric_strings || config.numeric_strings,
                bool_strings: cli.bool_strings || config.bool_strings,
            })
            .with_stable_order(cli.stable_order.or(config.stable_order).unwrap_or(true));

        Ok(Self {
            options,
            old_format: cli.old_format.unwrap_or(cli.format),
            new_format: cli.new_format.unwrap_or(cli.format),
            output: cli.output.or(config.output_format).unwrap_or(OutputFormat::Report),
            color: !(cli.no_color || config.no_color),
            max_value_length: cli
                .max_value_length
                .or(config.max_value_length)
                .unwrap_or(DEFAULT_MAX_VALUE_LENGTH),
            quiet: cli.quiet,
            exit_code: cli.exit_code,
            recursive: cli.recursive,
        })
    }

    pub(crate) fn report_options(&self) -> ReportOptions {
        match self.output {
            OutputFormat::Compact => ReportOptions::compact().with_color(self.color),
            _ => ReportOptions::detailed()
                .with_max_value_length(self.max_value_length)
                .with_color(self.color),
        }
    }
}

/// Splits a `path=key` flag value, rooting the path when needed.
pub(crate) fn parse_array_key(spec: &str) -> Result<(String, String)> {
    let Some((path, key)) = spec.split_once('=') else {
        bail!("invalid array-key format {spec:?}, expected path=key");
    };
    Ok((rooted(path), key.to_string()))
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["configdiff"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["old.yaml", "new.yaml"]);
        Cli::parse_from(argv)
    }

    #[test]
    fn array_key_specs_are_rooted() {
        assert_eq!(
            parse_array_key("spec/containers=name").unwrap(),
            ("/spec/containers".to_string(), "name".to_string())
        );
        assert_eq!(parse_array_key("/items=id").unwrap(), ("/items".to_string(), "id".to_string()));
        let err = parse_array_key("items").unwrap_err();
        assert!(err.to_string().contains("expected path=key"));
    }

    #[test]
    fn config_file_parses_all_fields() {
        let config = ConfigFile::from_yaml(
            "ignore_paths: [/status/*]\narray_keys:\n  /items: id\nnumeric_strings: true\nstable_order: false\noutput_format: compact\nmax_value_length: 20\nno_color: true\n",
        )
        .unwrap();
        assert_eq!(config.ignore_paths, ["/status/*"]);
        assert_eq!(config.array_keys.get("/items").map(String::as_str), Some("id"));
        assert!(config.numeric_strings);
        assert!(!config.bool_strings);
        assert_eq!(config.stable_order, Some(false));
        assert_eq!(config.output_format, Some(OutputFormat::Compact));
        assert_eq!(config.max_value_length, Some(20));
        assert!(config.no_color);
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        assert!(ConfigFile::from_yaml("ignore: [/a]\n").is_err());
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(ConfigFile::from_yaml("\n").unwrap(), ConfigFile::default());
    }

    #[test]
    fn defaults_without_config() {
        let settings = Settings::resolve(&cli(&[]), &ConfigFile::default()).unwrap();
        assert!(settings.options.stable_order());
        assert_eq!(settings.output, OutputFormat::Report);
        assert_eq!(settings.max_value_length, 80);
        assert!(settings.color);
        assert_eq!(settings.old_format, InputFormat::Auto);
    }

    #[test]
    fn flags_override_config_values() {
        let config = ConfigFile {
            ignore_paths: vec!["/a".into(), "/b".into()],
            array_keys: BTreeMap::from([("/items".to_string(), "id".to_string())]),
            stable_order: Some(false),
            output_format: Some(OutputFormat::Json),
            max_value_length: Some(10),
            bool_strings: true,
            ..ConfigFile::default()
        };
        let settings = Settings::resolve(
            &cli(&[
                "-i",
                "/b",
                "-i",
                "/c",
                "--array-key",
                "items=name",
                "--stable-order=true",
                "-o",
                "patch",
                "--max-value-length",
                "0",
            ]),
            &config,
        )
        .unwrap();
        assert_eq!(settings.options.ignore_paths(), ["/a", "/b", "/c"]);
        assert_eq!(settings.options.array_key("/items"), Some("name"));
        assert!(settings.options.stable_order());
        assert!(settings.options.coercions().bool_strings);
        assert_eq!(settings.output, OutputFormat::Patch);
        assert_eq!(settings.max_value_length, 0);
    }

    #[test]
    fn config_fills_unset_flags() {
        let config = ConfigFile {
            stable_order: Some(false),
            output_format: Some(OutputFormat::Compact),
            no_color: true,
            ..ConfigFile::default()
        };
        let settings = Settings::resolve(&cli(&[]), &config).unwrap();
        assert!(!settings.options.stable_order());
        assert_eq!(settings.output, OutputFormat::Compact);
        assert!(!settings.color);
        assert!(!settings.report_options().show_values);
    }

    #[test]
    fn per_side_formats_override_the_shared_one() {
        let settings =
            Settings::resolve(&cli(&["-f", "json", "--new-format", "toml"]), &ConfigFile::default())
                .unwrap();
        assert_eq!(settings.old_format, InputFormat::Json);
        assert_eq!(settings.new_format, InputFormat::Toml);
    }

    #[test]
    fn invalid_ignore_patterns_are_reported() {
        let err = Settings::resolve(&cli(&["-i", "status"]), &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }
}
