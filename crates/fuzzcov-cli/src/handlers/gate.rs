//! Gate command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::GateArgs;
use console::style;
use fuzzcov::{BuildModeGate, GateDecision, InstrumentationMode, EXIT_SKIPPED};

/// Consult the gate for the requested project and mode.
///
/// A missing mode (no `--mode`, no `SANITIZER`) means a plain build.
pub fn evaluate_gate(args: &GateArgs) -> CliResult<GateDecision> {
    let mode: InstrumentationMode = args.mode.as_deref().unwrap_or_default().parse()?;
    let gate = BuildModeGate::from_path(args.policy.as_deref())?;
    Ok(gate.decide(&args.project, mode))
}

/// Exit status for a gate decision
#[must_use]
pub const fn exit_code_for(decision: &GateDecision) -> u8 {
    match decision {
        GateDecision::Proceed => 0,
        GateDecision::Skip { .. } => EXIT_SKIPPED,
    }
}

/// Print a skip notice on stderr
pub fn report_skip(config: &CliConfig, decision: &GateDecision) {
    if let GateDecision::Skip { project, mode } = decision {
        if !config.verbosity.is_quiet() {
            eprintln!(
                "{} {project} does not support {mode} builds, skipping",
                style("skip").yellow().bold()
            );
        }
    }
}

/// Execute the gate command
pub fn execute_gate(config: &CliConfig, args: &GateArgs) -> CliResult<u8> {
    let decision = evaluate_gate(args)?;
    report_skip(config, &decision);
    Ok(exit_code_for(&decision))
}
