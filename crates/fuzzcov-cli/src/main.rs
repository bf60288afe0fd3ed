//! fuzzcov CLI: project-level coverage aggregation and build mode gating
//!
//! ## Usage
//!
//! ```bash
//! fuzzcov aggregate --store /out/store --report-root /out/reports
//! fuzzcov gate --project libpng --mode introspector   # exit 3 if unsupported
//! fuzzcov build --project libpng -- ./build.sh
//! fuzzcov patch reports/libpng/report/index.html
//! ```
//!
//! Exit status: 0 success, 1 failure, 3 build skipped by the gate (or the
//! build command's own status for `build`).

use clap::Parser;
use fuzzcov_cli::{
    handlers::{execute_aggregate, execute_build, execute_config, execute_gate, execute_patch},
    init_tracing, Cli, CliConfig, CliResult, ColorChoice, Commands, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<u8> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    config.color.apply();
    init_tracing(config.log_json, config.verbosity.log_level());

    match cli.command {
        Commands::Aggregate(args) => {
            let config = config
                .with_report_root(args.report_root.clone())
                .with_parallel_jobs(args.jobs);
            execute_aggregate(&config, &args).map(|()| 0)
        }
        Commands::Gate(args) => execute_gate(&config, &args),
        Commands::Build(args) => execute_build(&config, &args),
        Commands::Patch(args) => execute_patch(&config, &args).map(|_| 0),
        Commands::Config(args) => execute_config(&config, &args).map(|()| 0),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    let color: ColorChoice = cli.color.clone().into();

    CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_json(cli.log_json)
}
