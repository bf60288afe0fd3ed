//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use fuzzcov::ArtifactFormat;
use std::path::PathBuf;

/// fuzzcov: merge per-target fuzzing coverage into project reports
#[derive(Parser, Debug)]
#[command(name = "fuzzcov")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true, env = "FUZZCOV_LOG_JSON")]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a project's (or every project's) artifacts and publish reports
    Aggregate(AggregateArgs),

    /// Check whether a project supports an instrumentation mode (exit 3 if not)
    Gate(GateArgs),

    /// Run a build command behind the build mode gate
    Build(BuildArgs),

    /// Add URL-fragment navigation to an existing report document
    Patch(PatchArgs),

    /// Show the effective configuration
    Config(ConfigArgs),
}

/// Arguments for the aggregate command
#[derive(Parser, Debug)]
pub struct AggregateArgs {
    /// Profile store root (one directory per project)
    #[arg(long, env = "FUZZCOV_STORE")]
    pub store: PathBuf,

    /// Aggregate only this project (default: every project in the store)
    #[arg(long)]
    pub project: Option<String>,

    /// Directory receiving `<project>/` report directories
    #[arg(long, env = "FUZZCOV_REPORT_ROOT", default_value = "reports")]
    pub report_root: PathBuf,

    /// Fuzzing language, selects the coverage artifact format
    #[arg(long, env = "FUZZING_LANGUAGE")]
    pub language: Option<String>,

    /// Artifact format, overrides --language
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ArtifactFormat>,

    /// Source tree used to render file contents
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Extra path prefix to strip when normalizing (repeatable)
    #[arg(long = "strip-prefix")]
    pub strip_prefixes: Vec<String>,

    /// Do not strip the default `/src/` prefix
    #[arg(long)]
    pub no_default_prefixes: bool,

    /// Number of parallel parse jobs (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    pub jobs: usize,

    /// Print per-project results as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments shared by gate and build
#[derive(Parser, Debug, Clone)]
pub struct GateArgs {
    /// Project name as used in the policy
    #[arg(long)]
    pub project: String,

    /// Requested instrumentation mode
    #[arg(long, env = "SANITIZER")]
    pub mode: Option<String>,

    /// Build mode policy file (YAML)
    #[arg(long, env = "FUZZCOV_POLICY")]
    pub policy: Option<PathBuf>,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Gate settings
    #[command(flatten)]
    pub gate: GateArgs,

    /// Build command and its arguments, after `--`
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for the patch command
#[derive(Parser, Debug)]
pub struct PatchArgs {
    /// HTML report to patch in place
    pub file: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

fn parse_format(s: &str) -> Result<ArtifactFormat, String> {
    s.parse::<ArtifactFormat>().map_err(|e| e.to_string())
}
