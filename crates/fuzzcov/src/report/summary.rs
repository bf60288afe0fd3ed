//! Text and JSON summaries
//!
//! Both are pure functions of the merged model (plus the skipped-artifact
//! list): no timestamps, fixed ordering, so two runs over the same inputs
//! produce byte-identical files.

use crate::coverage::{percent, ArtifactWarning, FileCoverage, MergedCoverageModel};
use crate::publish::publish_bytes;
use crate::result::FuzzcovResult;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// Covered and total counts of one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    /// Reached
    pub covered: usize,
    /// Instrumented
    pub total: usize,
}

impl Ratio {
    /// Percentage, 0 when nothing is instrumented
    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.covered, self.total)
    }

    fn add(&mut self, other: Self) {
        self.covered += other.covered;
        self.total += other.total;
    }
}

/// Summary of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// Canonical path
    pub path: String,
    /// Line counts
    pub lines: Ratio,
    /// Branch counts
    pub branches: Ratio,
}

impl FileSummary {
    fn from_file(path: &str, file: &FileCoverage) -> Self {
        Self {
            path: path.to_string(),
            lines: Ratio {
                covered: file.covered_lines(),
                total: file.total_lines(),
            },
            branches: Ratio {
                covered: file.covered_branches(),
                total: file.total_branches(),
            },
        }
    }
}

/// Project coverage summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageSummary {
    /// Project name
    pub project: String,
    /// SHA-256 of the merged model
    pub digest: String,
    /// Contributing targets
    pub targets: Vec<String>,
    /// Per-file numbers, sorted by path
    pub files: Vec<FileSummary>,
    /// Aggregate lines
    pub lines: Ratio,
    /// Aggregate branches
    pub branches: Ratio,
    /// Artifacts skipped during the merge
    pub skipped: Vec<ArtifactWarning>,
}

impl CoverageSummary {
    /// Summarize a merged model
    pub fn from_model(model: &MergedCoverageModel) -> FuzzcovResult<Self> {
        let files: Vec<_> = model
            .files()
            .iter()
            .map(|(path, file)| FileSummary::from_file(path, file))
            .collect();
        let mut lines = Ratio::default();
        let mut branches = Ratio::default();
        for file in &files {
            lines.add(file.lines);
            branches.add(file.branches);
        }
        Ok(Self {
            project: model.project().to_string(),
            digest: model.digest()?,
            targets: model.targets().iter().map(|t| t.to_string()).collect(),
            files,
            lines,
            branches,
            skipped: Vec::new(),
        })
    }

    /// Attach the artifacts skipped while merging
    #[must_use]
    pub fn with_skipped(mut self, mut skipped: Vec<ArtifactWarning>) -> Self {
        skipped.sort_by(|a, b| a.target.cmp(&b.target).then_with(|| a.path.cmp(&b.path)));
        self.skipped = skipped;
        self
    }

    /// Plain-text rendering
    #[must_use]
    pub fn to_text(&self) -> String {
        let width = self
            .files
            .iter()
            .map(|f| f.path.len())
            .chain(std::iter::once("TOTAL".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        let _ = writeln!(out, "project: {}", self.project);
        let _ = writeln!(
            out,
            "targets: {} ({})",
            self.targets.len(),
            self.targets.join(", ")
        );
        out.push('\n');
        for file in &self.files {
            row(&mut out, &file.path, width, file.lines, file.branches);
        }
        row(&mut out, "TOTAL", width, self.lines, self.branches);

        if !self.skipped.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "skipped artifacts: {}", self.skipped.len());
            for warning in &self.skipped {
                let _ = writeln!(
                    out,
                    "  {} ({}): {}",
                    warning.target,
                    warning.path.display(),
                    warning.message
                );
            }
        }
        out
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> FuzzcovResult<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Write `summary.txt` and `summary.json` into `dir`
    pub fn save(&self, dir: &Path) -> FuzzcovResult<()> {
        publish_bytes(&dir.join("summary.txt"), self.to_text().as_bytes())?;
        publish_bytes(&dir.join("summary.json"), self.to_json()?.as_bytes())
    }
}

fn row(out: &mut String, label: &str, width: usize, lines: Ratio, branches: Ratio) {
    let _ = write!(
        out,
        "{label:<width$}  lines {}/{} ({:.2}%)",
        lines.covered,
        lines.total,
        lines.percent()
    );
    if branches.total > 0 {
        let _ = write!(
            out,
            "  branches {}/{} ({:.2}%)",
            branches.covered,
            branches.total,
            branches.percent()
        );
    }
    out.push('\n');
}
