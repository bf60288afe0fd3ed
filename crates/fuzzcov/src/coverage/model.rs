//! Project-level merged coverage model
//!
//! The model is the source of truth for every report. It is recomputed from
//! scratch on each aggregation pass; nothing is merged incrementally into a
//! model loaded from disk.

use super::profile::{CoverageProfile, FileCoverage};
use crate::publish::publish_bytes;
use crate::result::FuzzcovResult;
use crate::target::FuzzTarget;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;

/// Union of all coverage profiles of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedCoverageModel {
    project: String,
    targets: BTreeSet<FuzzTarget>,
    files: BTreeMap<String, FileCoverage>,
}

impl MergedCoverageModel {
    /// Create an empty model for a project
    #[must_use]
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            targets: BTreeSet::new(),
            files: BTreeMap::new(),
        }
    }

    /// Fold a (normalized) profile into the model.
    ///
    /// Covered status is the OR across profiles and hit counts sum, so
    /// absorbing never removes coverage.
    pub fn absorb(&mut self, profile: &CoverageProfile) {
        let _ = self.targets.insert(profile.target().clone());
        for (path, coverage) in profile.files() {
            self.files.entry(path.clone()).or_default().merge(coverage);
        }
    }

    /// Project name
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Targets whose profiles contributed
    #[must_use]
    pub fn targets(&self) -> &BTreeSet<FuzzTarget> {
        &self.targets
    }

    /// Files keyed by canonical path
    #[must_use]
    pub fn files(&self) -> &BTreeMap<String, FileCoverage> {
        &self.files
    }

    /// Coverage of a single file
    #[must_use]
    pub fn file(&self, path: &str) -> Option<&FileCoverage> {
        self.files.get(path)
    }

    /// Covered line numbers of a file (empty if the file is unknown)
    #[must_use]
    pub fn covered_lines(&self, path: &str) -> BTreeSet<u32> {
        self.files
            .get(path)
            .map(|f| {
                f.lines()
                    .iter()
                    .filter(|(_, &hits)| hits > 0)
                    .map(|(&line, _)| line)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total instrumented lines across all files
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.files.values().map(FileCoverage::total_lines).sum()
    }

    /// Total reached lines across all files
    #[must_use]
    pub fn covered_line_count(&self) -> usize {
        self.files.values().map(FileCoverage::covered_lines).sum()
    }

    /// Line coverage percentage; an empty model is 0%
    #[must_use]
    pub fn line_percent(&self) -> f64 {
        percent(self.covered_line_count(), self.total_lines())
    }

    /// Canonical binary encoding
    pub fn to_bytes(&self) -> FuzzcovResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a model written by [`Self::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> FuzzcovResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// SHA-256 of the canonical encoding, lowercase hex
    pub fn digest(&self) -> FuzzcovResult<String> {
        let bytes = self.to_bytes()?;
        let hash = Sha256::digest(&bytes);
        let mut out = String::with_capacity(hash.len() * 2);
        for byte in hash {
            let _ = write!(out, "{byte:02x}");
        }
        Ok(out)
    }

    /// Write the binary aggregate, replacing any previous one atomically
    pub fn save(&self, path: &Path) -> FuzzcovResult<()> {
        publish_bytes(path, &self.to_bytes()?)
    }

    /// Load a binary aggregate
    pub fn load(path: &Path) -> FuzzcovResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

/// Percentage helper shared by summaries
#[must_use]
pub fn percent(covered: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (covered as f64 / total as f64) * 100.0
}
