//! Patch command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use crate::PatchArgs;
use console::style;
use fuzzcov::{NavigationPatcher, PatchOutcome};

/// Execute the patch command
pub fn execute_patch(config: &CliConfig, args: &PatchArgs) -> CliResult<PatchOutcome> {
    let outcome = NavigationPatcher::new().patch_file(&args.file)?;
    if !config.verbosity.is_quiet() {
        match &outcome {
            PatchOutcome::Patched(_) => println!(
                "{} navigation added to {}",
                style("✓").green(),
                args.file.display()
            ),
            PatchOutcome::AlreadyPatched => println!(
                "{} {} already has navigation",
                style("-").dim(),
                args.file.display()
            ),
        }
    }
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;

    const DOC: &str = "<!DOCTYPE html>\n<html>\n<head><title>r</title></head>\n<body>\n</body>\n</html>\n";

    #[test]
    fn test_patch_then_noop() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, DOC).unwrap();
        let config = CliConfig::new().with_verbosity(Verbosity::Quiet);
        let args = PatchArgs { file };

        assert!(execute_patch(&config, &args).unwrap().is_patched());
        assert_eq!(
            execute_patch(&config, &args).unwrap(),
            PatchOutcome::AlreadyPatched
        );
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = PatchArgs {
            file: dir.path().join("absent.html"),
        };
        assert!(execute_patch(&CliConfig::new(), &args).is_err());
    }
}
