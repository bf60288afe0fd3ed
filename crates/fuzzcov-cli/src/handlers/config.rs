//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::ConfigArgs;
use fuzzcov::ArtifactFormat;
use serde::Serialize;

/// Configuration as seen by the commands, including environment inputs
#[derive(Debug, Serialize)]
pub struct EffectiveConfig<'a> {
    /// CLI settings
    #[serde(flatten)]
    pub cli: &'a CliConfig,
    /// Effective parse jobs
    pub effective_jobs: usize,
    /// `FUZZING_LANGUAGE`
    pub language: Option<String>,
    /// Format selected from the language
    pub format: Option<String>,
    /// `SANITIZER`
    pub mode: Option<String>,
    /// `FUZZCOV_POLICY`
    pub policy: Option<String>,
}

impl<'a> EffectiveConfig<'a> {
    /// Collect the effective configuration from the environment
    #[must_use]
    pub fn collect(cli: &'a CliConfig) -> Self {
        let language = std::env::var("FUZZING_LANGUAGE").ok();
        let format = language
            .as_deref()
            .and_then(|l| ArtifactFormat::from_language(l).ok())
            .map(|f| format!("{f} ({})", f.toolchain()));
        Self {
            cli,
            effective_jobs: cli.effective_jobs(),
            language,
            format,
            mode: std::env::var("SANITIZER").ok(),
            policy: std::env::var("FUZZCOV_POLICY").ok(),
        }
    }
}

/// Execute the config command
pub fn execute_config(config: &CliConfig, args: &ConfigArgs) -> CliResult<()> {
    let effective = EffectiveConfig::collect(config);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&effective)?);
    } else {
        print_config(&effective);
    }
    Ok(())
}

fn print_config(effective: &EffectiveConfig<'_>) {
    let unset = || "(unset)".to_string();
    println!("Current configuration:");
    println!("  Verbosity: {:?}", effective.cli.verbosity);
    println!("  Color: {:?}", effective.cli.color);
    println!("  Parallel jobs: {}", effective.effective_jobs);
    println!("  Log JSON: {}", effective.cli.log_json);
    println!("  Report root: {}", effective.cli.report_root.display());
    println!(
        "  Language: {}",
        effective.language.clone().unwrap_or_else(unset)
    );
    println!("  Format: {}", effective.format.clone().unwrap_or_else(unset));
    println!("  Mode: {}", effective.mode.clone().unwrap_or_else(unset));
    println!("  Policy: {}", effective.policy.clone().unwrap_or_else(unset));
}
