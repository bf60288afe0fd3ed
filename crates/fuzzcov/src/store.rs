//! Profile Store discovery
//!
//! Layout of one project directory:
//!
//! ```text
//! <project>/
//!   coverage/<target>.<ext>              one coverage artifact per target
//!   profiles/<target>.<cpu|heap>.folded  zero or more profiling samples
//! ```
//!
//! Artifacts are found by glob pattern and returned sorted by target, so
//! callers never depend on directory enumeration order.

use crate::coverage::ArtifactFormat;
use crate::profiling::SampleKind;
use crate::result::{FuzzcovError, FuzzcovResult};
use crate::target::FuzzTarget;
use glob::{glob, Pattern};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Subdirectory holding coverage artifacts
pub const COVERAGE_DIR: &str = "coverage";
/// Subdirectory holding profiling artifacts
pub const PROFILES_DIR: &str = "profiles";

/// One coverage artifact in the store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CoverageArtifact {
    /// Producing target
    pub target: FuzzTarget,
    /// File path
    pub path: PathBuf,
}

/// One profiling artifact in the store
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProfilingArtifact {
    /// Producing target
    pub target: FuzzTarget,
    /// Sample kind
    pub kind: SampleKind,
    /// File path
    pub path: PathBuf,
}

fn profile_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^(?P<target>[^./\\]+)\.(?P<kind>cpu|heap)\.folded$").expect("valid regex")
    })
}

/// Artifacts of one project
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
    project: String,
}

impl ProfileStore {
    /// Open the store of a project directory; the project is named after the directory
    pub fn open(project_dir: &Path) -> FuzzcovResult<Self> {
        if !project_dir.is_dir() {
            return Err(FuzzcovError::store(format!(
                "{} is not a directory",
                project_dir.display()
            )));
        }
        let project = project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                FuzzcovError::store(format!("cannot name project at {}", project_dir.display()))
            })?
            .to_string();
        Ok(Self {
            root: project_dir.to_path_buf(),
            project,
        })
    }

    /// Override the project name
    #[must_use]
    pub fn with_project_name(mut self, name: &str) -> Self {
        self.project = name.to_string();
        self
    }

    /// Project name
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Project directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Coverage artifacts of the given format, sorted by target then path
    pub fn coverage_artifacts(&self, format: ArtifactFormat) -> FuzzcovResult<Vec<CoverageArtifact>> {
        let dir = self.root.join(COVERAGE_DIR);
        let mut artifacts = Vec::new();
        for ext in format.extensions() {
            for path in glob_files(&dir, &format!("*.{ext}"))? {
                match FuzzTarget::from_artifact_path(&path) {
                    Some(target) => artifacts.push(CoverageArtifact { target, path }),
                    None => tracing::warn!(
                        path = %path.display(),
                        "coverage artifact name does not encode a target, ignoring"
                    ),
                }
            }
        }
        artifacts.sort();
        artifacts.dedup();
        tracing::debug!(project = %self.project, count = artifacts.len(), "coverage artifacts discovered");
        Ok(artifacts)
    }

    /// Profiling artifacts, sorted by target, kind then path
    pub fn profiling_artifacts(&self) -> FuzzcovResult<Vec<ProfilingArtifact>> {
        let dir = self.root.join(PROFILES_DIR);
        let mut artifacts = Vec::new();
        for path in glob_files(&dir, "*.folded")? {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let parsed = profile_name_re().captures(name).and_then(|caps| {
                let target = FuzzTarget::new(&caps["target"])?;
                let kind = caps["kind"].parse().ok()?;
                Some((target, kind))
            });
            match parsed {
                Some((target, kind)) => artifacts.push(ProfilingArtifact { target, kind, path }),
                None => tracing::warn!(
                    path = %path.display(),
                    "profiling artifact name is not <target>.<cpu|heap>.folded, ignoring"
                ),
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }
}

/// Project directories under a store root, sorted by name
pub fn discover_projects(store_root: &Path) -> FuzzcovResult<Vec<PathBuf>> {
    if !store_root.is_dir() {
        return Err(FuzzcovError::store(format!(
            "{} is not a directory",
            store_root.display()
        )));
    }
    let mut projects = Vec::new();
    for entry in std::fs::read_dir(store_root)? {
        let path = entry?.path();
        if path.is_dir() {
            projects.push(path);
        }
    }
    projects.sort();
    Ok(projects)
}

fn glob_files(dir: &Path, file_pattern: &str) -> FuzzcovResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let escaped = Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{escaped}/{file_pattern}");
    let paths = glob(&pattern).map_err(|e| FuzzcovError::store(e.to_string()))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "unreadable store entry"),
        }
    }
    Ok(files)
}
