//! Build Mode Gate
//!
//! A static policy table says which instrumentation modes a project cannot
//! be built in. Build scripts consult the gate before doing any work and
//! exit with [`EXIT_SKIPPED`] when the requested mode is unsupported, so the
//! orchestrator can tell a skip from a failed build.
//!
//! Policy file format:
//!
//! ```yaml
//! # Modes no project supports unless it has its own entry
//! default: [introspector]
//! projects:
//!   libpng: [introspector, memory]
//!   zlib: []
//! ```

use crate::result::{FuzzcovError, FuzzcovResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Process exit status for a gated-out build
pub const EXIT_SKIPPED: u8 = 3;

/// Instrumentation variant a build is requested in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentationMode {
    /// AddressSanitizer
    Address,
    /// MemorySanitizer
    Memory,
    /// UndefinedBehaviorSanitizer
    Undefined,
    /// ThreadSanitizer
    Thread,
    /// Source-based coverage build
    Coverage,
    /// Static-analysis introspector build
    Introspector,
    /// Plain build
    None,
}

impl InstrumentationMode {
    /// All modes
    pub const ALL: [Self; 7] = [
        Self::Address,
        Self::Memory,
        Self::Undefined,
        Self::Thread,
        Self::Coverage,
        Self::Introspector,
        Self::None,
    ];

    /// Name as used in `SANITIZER` and policy files
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Memory => "memory",
            Self::Undefined => "undefined",
            Self::Thread => "thread",
            Self::Coverage => "coverage",
            Self::Introspector => "introspector",
            Self::None => "none",
        }
    }
}

impl fmt::Display for InstrumentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentationMode {
    type Err = FuzzcovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted.is_empty() {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| FuzzcovError::UnknownMode(s.to_string()))
    }
}

/// Declarative table of unsupported (project, mode) pairs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildModePolicy {
    /// Unsupported modes for projects without an entry
    #[serde(default)]
    default: BTreeSet<InstrumentationMode>,
    /// Unsupported modes per project; an entry replaces the default
    #[serde(default)]
    projects: BTreeMap<String, BTreeSet<InstrumentationMode>>,
}

impl BuildModePolicy {
    /// A policy under which every mode is supported
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Parse a YAML policy
    pub fn from_yaml(yaml: &str) -> FuzzcovResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::permissive());
        }
        let policy: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| FuzzcovError::policy(e.to_string()))?;
        if let Some(empty) = policy.projects.keys().find(|p| p.trim().is_empty()) {
            return Err(FuzzcovError::policy(format!(
                "invalid project name {empty:?}"
            )));
        }
        Ok(policy)
    }

    /// Load a policy file.
    ///
    /// A configured file that does not exist is an error; only the absence of
    /// any configured path means every mode is supported.
    pub fn load(path: &Path) -> FuzzcovResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(yaml) => Self::from_yaml(&yaml)
                .map_err(|e| FuzzcovError::policy(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FuzzcovError::policy(
                format!("policy file {} not found", path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Mark a mode unsupported for a project
    #[must_use]
    pub fn with_unsupported(mut self, project: &str, mode: InstrumentationMode) -> Self {
        let _ = self
            .projects
            .entry(project.to_string())
            .or_default()
            .insert(mode);
        self
    }

    /// Mark a mode unsupported for projects without an entry
    #[must_use]
    pub fn with_default_unsupported(mut self, mode: InstrumentationMode) -> Self {
        let _ = self.default.insert(mode);
        self
    }

    /// Unsupported modes that apply to a project
    #[must_use]
    pub fn unsupported_modes(&self, project: &str) -> &BTreeSet<InstrumentationMode> {
        self.projects.get(project).unwrap_or(&self.default)
    }

    /// Whether a project can be built in a mode
    #[must_use]
    pub fn supported(&self, project: &str, mode: InstrumentationMode) -> bool {
        !self.unsupported_modes(project).contains(&mode)
    }

    /// Number of projects with an explicit entry
    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

/// Outcome of consulting the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// Build may run
    Proceed,
    /// Build must not run
    Skip {
        /// Project
        project: String,
        /// Requested mode
        mode: InstrumentationMode,
    },
}

impl GateDecision {
    /// Whether the build is skipped
    #[must_use]
    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skip { .. })
    }
}

/// Gate over a loaded policy
#[derive(Debug, Clone, Default)]
pub struct BuildModeGate {
    policy: BuildModePolicy,
}

impl BuildModeGate {
    /// Create a gate
    #[must_use]
    pub const fn new(policy: BuildModePolicy) -> Self {
        Self { policy }
    }

    /// Load the gate from an optional policy path
    pub fn from_path(path: Option<&Path>) -> FuzzcovResult<Self> {
        let policy = match path {
            Some(path) => BuildModePolicy::load(path)?,
            None => BuildModePolicy::permissive(),
        };
        Ok(Self::new(policy))
    }

    /// The policy in force
    #[must_use]
    pub const fn policy(&self) -> &BuildModePolicy {
        &self.policy
    }

    /// Whether a project can be built in a mode
    #[must_use]
    pub fn supported(&self, project: &str, mode: InstrumentationMode) -> bool {
        self.policy.supported(project, mode)
    }

    /// Decide whether a build should run
    #[must_use]
    pub fn decide(&self, project: &str, mode: InstrumentationMode) -> GateDecision {
        if self.supported(project, mode) {
            tracing::debug!(project, %mode, "build mode supported");
            GateDecision::Proceed
        } else {
            tracing::info!(project, %mode, "build mode unsupported, skipping");
            GateDecision::Skip {
                project: project.to_string(),
                mode,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const POLICY: &str = "\
default: [introspector]
projects:
  libpng: [introspector, memory]
  zlib: []
";

    #[test]
    fn test_mode_parse() {
        assert_eq!(
            "introspector".parse::<InstrumentationMode>().unwrap(),
            InstrumentationMode::Introspector
        );
        assert_eq!(
            " Address ".parse::<InstrumentationMode>().unwrap(),
            InstrumentationMode::Address
        );
        assert_eq!(
            "".parse::<InstrumentationMode>().unwrap(),
            InstrumentationMode::None
        );
        assert!(matches!(
            "hwasan".parse::<InstrumentationMode>(),
            Err(FuzzcovError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_policy_lookup() {
        let policy = BuildModePolicy::from_yaml(POLICY).unwrap();
        assert!(!policy.supported("libpng", InstrumentationMode::Memory));
        assert!(policy.supported("libpng", InstrumentationMode::Address));
        assert!(policy.supported("zlib", InstrumentationMode::Introspector));
        assert!(!policy.supported("openssl", InstrumentationMode::Introspector));
        assert!(policy.supported("openssl", InstrumentationMode::Coverage));
        assert_eq!(policy.project_count(), 2);
    }

    #[test]
    fn test_empty_policy_is_permissive() {
        let policy = BuildModePolicy::from_yaml("").unwrap();
        for mode in InstrumentationMode::ALL {
            assert!(policy.supported("any", mode));
        }
    }

    #[test]
    fn test_unknown_mode_in_policy_rejected() {
        let err = BuildModePolicy::from_yaml("projects:\n  p: [hwasan]\n").unwrap_err();
        assert!(matches!(err, FuzzcovError::Policy { .. }));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(BuildModePolicy::from_yaml("projcts:\n  p: [memory]\n").is_err());
    }

    #[test]
    fn test_missing_configured_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = BuildModePolicy::load(&path).unwrap_err();
        assert!(matches!(err, FuzzcovError::Policy { .. }));
        assert!(err.to_string().contains("absent.yaml"));
        assert!(BuildModeGate::from_path(Some(&path)).is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, POLICY).unwrap();
        let gate = BuildModeGate::from_path(Some(&path)).unwrap();
        assert!(!gate.supported("libpng", InstrumentationMode::Introspector));
    }

    #[test]
    fn test_decide() {
        let gate = BuildModeGate::new(
            BuildModePolicy::permissive()
                .with_unsupported("p", InstrumentationMode::Introspector)
                .with_default_unsupported(InstrumentationMode::Thread),
        );
        assert_eq!(
            gate.decide("p", InstrumentationMode::Address),
            GateDecision::Proceed
        );
        assert!(gate.decide("p", InstrumentationMode::Introspector).is_skip());
        assert!(gate.decide("q", InstrumentationMode::Thread).is_skip());
        assert!(!gate.decide("p", InstrumentationMode::Thread).is_skip());
    }

    #[test]
    fn test_no_policy_path_supports_everything() {
        let gate = BuildModeGate::from_path(None).unwrap();
        assert!(gate.supported("p", InstrumentationMode::Introspector));
    }
}
