//! `configdiff`: semantic diffs for YAML, JSON, TOML and HCL configuration files.
//!
//! The binary resolves flags against optional config-file defaults, loads
//! both inputs (files, stdin or whole directories), compares them with
//! `configdiff-core` and prints a report, the raw change list or a patch.

mod compare;
mod input;
mod output;
mod settings;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use configdiff_core::Format;
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::{ConfigFile, Settings};

const EXAMPLES: &str = "\
Examples:
  configdiff old.yaml new.yaml
  configdiff -i /metadata/generation -i '/status/*' old.yaml new.yaml
  configdiff --array-key /spec/containers=name deploy-v1.yaml deploy-v2.yaml
  kubectl get deploy app -o yaml | configdiff - desired.yaml
  configdiff -o patch old.json new.json
  configdiff -r --exit-code configs-old/ configs-new/
  source <(configdiff completion bash)";

/// Input format selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum InputFormat {
    /// Detect from the file extension, then from the content.
    #[default]
    Auto,
    Json,
    #[value(alias = "yml")]
    Yaml,
    Toml,
    #[value(alias = "tf")]
    Hcl,
}

impl InputFormat {
    /// The explicitly requested format, if any.
    pub(crate) fn format(self) -> Option<Format> {
        match self {
            Self::Auto => None,
            Self::Json => Some(Format::Json),
            Self::Yaml => Some(Format::Yaml),
            Self::Toml => Some(Format::Toml),
            Self::Hcl => Some(Format::Hcl),
        }
    }
}

/// What gets printed for a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum OutputFormat {
    /// Summary plus one line per change, with values.
    Report,
    /// Summary plus one line per change, paths only.
    Compact,
    /// The change list as JSON.
    Json,
    /// The apply-style patch as JSON.
    Patch,
}

/// Auxiliary commands. Without one, `configdiff` compares its two inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Subcommand)]
pub(crate) enum Command {
    /// Print a shell completion script to stdout.
    Completion {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Parser)]
#[command(
    name = "configdiff",
    version,
    about = "Semantic diff for YAML, JSON, TOML and HCL configuration files",
    after_help = EXAMPLES,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Old document, directory, or `-` for stdin.
    #[arg(required = true)]
    pub old: Option<PathBuf>,

    /// New document, directory, or `-` for stdin.
    #[arg(required = true)]
    pub new: Option<PathBuf>,

    /// Format of both inputs.
    #[arg(short = 'f', long, value_enum, default_value_t = InputFormat::Auto)]
    pub format: InputFormat,

    /// Format of the old input, overriding --format.
    #[arg(long, value_enum)]
    pub old_format: Option<InputFormat>,

    /// Format of the new input, overriding --format.
    #[arg(long, value_enum)]
    pub new_format: Option<InputFormat>,

    /// Ignore PATH exactly, or everything beneath it when written as PATH/* (repeatable).
    #[arg(short = 'i', long = "ignore", value_name = "PATH", value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Match elements of the array at PATH by the KEY field (repeatable).
    #[arg(long = "array-key", value_name = "PATH=KEY")]
    pub array_key: Vec<String>,

    /// Treat "42" and 42 as equal.
    #[arg(long)]
    pub numeric_strings: bool,

    /// Treat "true" and true as equal.
    #[arg(long)]
    pub bool_strings: bool,

    /// Sort changes by path [default: true].
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub stable_order: Option<bool>,

    /// Output format [default: report].
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable coloured output.
    #[arg(long)]
    pub no_color: bool,

    /// Truncate rendered values to N characters, 0 for no limit [default: 80].
    #[arg(long, value_name = "N")]
    pub max_value_length: Option<usize>,

    /// Print nothing; combine with --exit-code to test for differences.
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with status 1 when differences are found.
    #[arg(long)]
    pub exit_code: bool,

    /// Compare two directories file by file.
    #[arg(short, long)]
    pub recursive: bool,

    /// Read defaults from this config file instead of searching for one.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn main() {
    match try_main() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:#}");
            std::process::exit(2);
        }
    }
}

fn try_main() -> Result<i32> {
    let cli = Cli::parse();
    if let Some(Command::Completion { shell }) = cli.command {
        print_completions(shell, &mut io::stdout().lock())?;
        return Ok(0);
    }
    init_logging(cli.verbose);
    let old = cli.old.as_deref().context("missing <OLD> input")?;
    let new = cli.new.as_deref().context("missing <NEW> input")?;

    let config = ConfigFile::load(cli.config.as_deref())?;
    let mut settings = Settings::resolve(&cli, &config)?;
    settings.color &= io::stdout().is_terminal();
    debug!(?settings, "resolved settings");

    let outcome = compare::run(old, new, &settings)?;
    if !settings.quiet {
        let mut stdout = io::stdout().lock();
        stdout.write_all(outcome.output.as_bytes())?;
        stdout.flush()?;
    }
    if let Some(target) = std::env::var_os("GITHUB_OUTPUT").filter(|value| !value.is_empty()) {
        output::append_github_output(&PathBuf::from(target), &outcome);
    }

    Ok(if settings.exit_code && outcome.has_changes { 1 } else { 0 })
}

fn print_completions(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, out);
    out.flush()?;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
