//! Build command handler
//!
//! The gate runs before anything else; a skipped build never spawns the
//! build command.

use super::gate::{evaluate_gate, exit_code_for, report_skip};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::BuildArgs;
use fuzzcov::EXIT_SKIPPED;
use std::process::{Command, ExitStatus};

/// Execute the build command
pub fn execute_build(config: &CliConfig, args: &BuildArgs) -> CliResult<u8> {
    let decision = evaluate_gate(&args.gate)?;
    if decision.is_skip() {
        report_skip(config, &decision);
        return Ok(exit_code_for(&decision));
    }

    let (program, rest) = args
        .command
        .split_first()
        .ok_or_else(|| CliError::invalid_argument("no build command given"))?;
    tracing::info!(project = %args.gate.project, %program, "running build");

    let status = Command::new(program)
        .args(rest)
        .status()
        .map_err(|e| CliError::build_spawn(format!("{program}: {e}")))?;
    if !status.success() {
        tracing::warn!(project = %args.gate.project, %status, "build failed");
    }
    Ok(exit_code_from_status(status))
}

/// Propagate a child's exit status.
///
/// Termination by signal maps to 1. So does a child exiting with
/// [`EXIT_SKIPPED`], which is reserved for the gate.
#[must_use]
pub fn exit_code_from_status(status: ExitStatus) -> u8 {
    let code = status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1);
    if code == EXIT_SKIPPED {
        tracing::warn!(
            code,
            "build command exited with the reserved skip status, reporting failure"
        );
        return 1;
    }
    code
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::GateArgs;

    fn build_args(mode: &str, policy: &std::path::Path, command: &[&str]) -> BuildArgs {
        BuildArgs {
            gate: GateArgs {
                project: "libpng".to_string(),
                mode: Some(mode.to_string()),
                policy: Some(policy.to_path_buf()),
            },
            command: command.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn policy(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("policy.yaml");
        std::fs::write(&path, "projects:\n  libpng: [introspector]\n").unwrap();
        path
    }

    #[test]
    fn test_skip_does_not_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("built");
        let script = format!("touch {}", marker.display());
        let args = build_args("introspector", &policy(dir.path()), &["sh", "-c", &script]);

        let code = execute_build(&CliConfig::new(), &args).unwrap();
        assert_eq!(code, EXIT_SKIPPED);
        assert!(!marker.exists());
    }

    #[test]
    fn test_supported_runs_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("built");
        let script = format!("touch {}", marker.display());
        let args = build_args("address", &policy(dir.path()), &["sh", "-c", &script]);

        let code = execute_build(&CliConfig::new(), &args).unwrap();
        assert_eq!(code, 0);
        assert!(marker.exists());
    }

    #[test]
    fn test_failure_status_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let args = build_args("address", &policy(dir.path()), &["sh", "-c", "exit 7"]);
        let code = execute_build(&CliConfig::new(), &args).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn test_build_failing_with_skip_status_is_not_a_skip() {
        let dir = tempfile::tempdir().unwrap();
        let args = build_args("address", &policy(dir.path()), &["sh", "-c", "exit 3"]);
        let code = execute_build(&CliConfig::new(), &args).unwrap();
        assert_ne!(code, EXIT_SKIPPED);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = build_args(
            "address",
            &policy(dir.path()),
            &["/definitely/not/a/build/tool"],
        );
        let err = execute_build(&CliConfig::new(), &args).unwrap_err();
        assert!(matches!(err, CliError::BuildSpawn { .. }));
    }
}
