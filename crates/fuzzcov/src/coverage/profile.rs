//! Per-file and per-target coverage records

use super::path::PathNormalizer;
use crate::target::FuzzTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Branch identifier within one source file.
///
/// `block` and `branch` follow the LCOV `BRDA` fields; formats without
/// blocks use the column (llvm) or 0 (coverage.py).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BranchId {
    /// Line of the branch point
    pub line: u32,
    /// Block number (or column)
    pub block: u32,
    /// Branch outcome label
    pub branch: String,
}

impl BranchId {
    /// Create a branch identifier
    #[must_use]
    pub fn new(line: u32, block: u32, branch: impl Into<String>) -> Self {
        Self {
            line,
            block,
            branch: branch.into(),
        }
    }
}

/// Function-level record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCoverage {
    /// Line where the function starts
    pub line: u32,
    /// Number of calls
    pub hits: u64,
}

/// Coverage of one source file: instrumented lines and branches with hit counts.
///
/// An entry with a count of 0 is instrumented but not reached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    lines: BTreeMap<u32, u64>,
    branches: BTreeMap<BranchId, u64>,
    functions: BTreeMap<String, FunctionCoverage>,
}

impl FileCoverage {
    /// Create an empty file record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record hits on a line (counts accumulate)
    pub fn record_line(&mut self, line: u32, hits: u64) {
        let entry = self.lines.entry(line).or_insert(0);
        *entry = entry.saturating_add(hits);
    }

    /// Record hits on a branch outcome (counts accumulate)
    pub fn record_branch(&mut self, branch: BranchId, hits: u64) {
        let entry = self.branches.entry(branch).or_insert(0);
        *entry = entry.saturating_add(hits);
    }

    /// Record calls of a function.
    ///
    /// The smallest known start line wins (0 means unknown), so the result
    /// does not depend on record order.
    pub fn record_function(&mut self, name: &str, line: u32, hits: u64) {
        let entry = self
            .functions
            .entry(name.to_string())
            .or_insert(FunctionCoverage { line, hits: 0 });
        if entry.line == 0 || (line != 0 && line < entry.line) {
            entry.line = line;
        }
        entry.hits = entry.hits.saturating_add(hits);
    }

    /// Fold another record of the same file into this one
    pub fn merge(&mut self, other: &Self) {
        for (&line, &hits) in &other.lines {
            self.record_line(line, hits);
        }
        for (branch, &hits) in &other.branches {
            self.record_branch(branch.clone(), hits);
        }
        for (name, func) in &other.functions {
            self.record_function(name, func.line, func.hits);
        }
    }

    /// Fold another record of the same run into this one.
    ///
    /// Counts take the per-entry maximum instead of summing, so combining a
    /// record with itself leaves it unchanged.
    pub fn merge_max(&mut self, other: &Self) {
        for (&line, &hits) in &other.lines {
            let entry = self.lines.entry(line).or_insert(0);
            *entry = (*entry).max(hits);
        }
        for (branch, &hits) in &other.branches {
            let entry = self.branches.entry(branch.clone()).or_insert(0);
            *entry = (*entry).max(hits);
        }
        for (name, func) in &other.functions {
            let entry = self
                .functions
                .entry(name.clone())
                .or_insert(FunctionCoverage {
                    line: func.line,
                    hits: 0,
                });
            if entry.line == 0 || (func.line != 0 && func.line < entry.line) {
                entry.line = func.line;
            }
            entry.hits = entry.hits.max(func.hits);
        }
    }

    /// Hit count of a line, `None` if the line is not instrumented
    #[must_use]
    pub fn line_hits(&self, line: u32) -> Option<u64> {
        self.lines.get(&line).copied()
    }

    /// Whether a line was reached
    #[must_use]
    pub fn is_line_covered(&self, line: u32) -> bool {
        self.line_hits(line).is_some_and(|h| h > 0)
    }

    /// All instrumented lines with their hit counts
    #[must_use]
    pub fn lines(&self) -> &BTreeMap<u32, u64> {
        &self.lines
    }

    /// All branch outcomes with their hit counts
    #[must_use]
    pub fn branches(&self) -> &BTreeMap<BranchId, u64> {
        &self.branches
    }

    /// All functions
    #[must_use]
    pub fn functions(&self) -> &BTreeMap<String, FunctionCoverage> {
        &self.functions
    }

    /// Number of instrumented lines
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Number of reached lines
    #[must_use]
    pub fn covered_lines(&self) -> usize {
        self.lines.values().filter(|&&h| h > 0).count()
    }

    /// Number of branch outcomes
    #[must_use]
    pub fn total_branches(&self) -> usize {
        self.branches.len()
    }

    /// Number of taken branch outcomes
    #[must_use]
    pub fn covered_branches(&self) -> usize {
        self.branches.values().filter(|&&h| h > 0).count()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.branches.is_empty() && self.functions.is_empty()
    }
}

/// Raw coverage of one fuzz target run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageProfile {
    target: FuzzTarget,
    files: BTreeMap<String, FileCoverage>,
}

impl CoverageProfile {
    /// Create an empty profile for a target
    #[must_use]
    pub fn new(target: FuzzTarget) -> Self {
        Self {
            target,
            files: BTreeMap::new(),
        }
    }

    /// Target that produced this profile
    #[must_use]
    pub fn target(&self) -> &FuzzTarget {
        &self.target
    }

    /// Mutable record for a file, created on first use
    pub fn file_mut(&mut self, path: &str) -> &mut FileCoverage {
        self.files.entry(path.to_string()).or_default()
    }

    /// Add a file record, merging if the path is already present
    pub fn add_file(&mut self, path: &str, coverage: &FileCoverage) {
        self.file_mut(path).merge(coverage);
    }

    /// File records keyed by path
    #[must_use]
    pub fn files(&self) -> &BTreeMap<String, FileCoverage> {
        &self.files
    }

    /// Whether the profile has no source records at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.values().all(FileCoverage::is_empty)
    }

    /// Combine another profile of the same target with per-entry maxima.
    ///
    /// Used when one target left more than one artifact.
    pub fn combine(&mut self, other: &Self) {
        for (path, coverage) in &other.files {
            self.file_mut(path).merge_max(coverage);
        }
    }

    /// Re-key every file by its canonical path.
    ///
    /// Records whose paths normalize to the same key are merged.
    #[must_use]
    pub fn normalized(self, normalizer: &PathNormalizer) -> Self {
        let mut out = Self::new(self.target);
        for (path, coverage) in &self.files {
            out.add_file(&normalizer.normalize(path), coverage);
        }
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn target(name: &str) -> FuzzTarget {
        FuzzTarget::new(name).unwrap()
    }

    #[test]
    fn test_zero_hit_line_is_instrumented_not_covered() {
        let mut file = FileCoverage::new();
        file.record_line(3, 0);
        assert_eq!(file.line_hits(3), Some(0));
        assert!(!file.is_line_covered(3));
        assert_eq!(file.total_lines(), 1);
        assert_eq!(file.covered_lines(), 0);
        assert_eq!(file.line_hits(4), None);
    }

    #[test]
    fn test_merge_sums_counts() {
        let mut a = FileCoverage::new();
        a.record_line(1, 2);
        a.record_branch(BranchId::new(1, 0, "0"), 1);
        a.record_function("f", 1, 1);

        let mut b = FileCoverage::new();
        b.record_line(1, 3);
        b.record_line(2, 0);
        b.record_branch(BranchId::new(1, 0, "1"), 0);
        b.record_function("f", 9, 4);

        a.merge(&b);
        assert_eq!(a.line_hits(1), Some(5));
        assert_eq!(a.line_hits(2), Some(0));
        assert_eq!(a.total_branches(), 2);
        assert_eq!(a.covered_branches(), 1);
        assert_eq!(a.functions()["f"], FunctionCoverage { line: 1, hits: 5 });
    }

    #[test]
    fn test_saturating_counts() {
        let mut file = FileCoverage::new();
        file.record_line(1, u64::MAX);
        file.record_line(1, 10);
        assert_eq!(file.line_hits(1), Some(u64::MAX));
    }

    #[test]
    fn test_normalized_merges_aliases() {
        let mut profile = CoverageProfile::new(target("t1"));
        profile.file_mut("/src/p/a.c").record_line(1, 1);
        profile.file_mut("./p/a.c").record_line(2, 1);
        profile.file_mut("p\\a.c").record_line(1, 1);

        let normalized = profile.normalized(&PathNormalizer::new());
        assert_eq!(normalized.files().len(), 1);
        let file = &normalized.files()["p/a.c"];
        assert_eq!(file.line_hits(1), Some(2));
        assert_eq!(file.line_hits(2), Some(1));
        assert_eq!(normalized.target().as_str(), "t1");
    }

    #[test]
    fn test_is_empty() {
        let mut profile = CoverageProfile::new(target("t"));
        assert!(profile.is_empty());
        let _ = profile.file_mut("a.c");
        assert!(profile.is_empty());
        profile.file_mut("a.c").record_line(1, 0);
        assert!(!profile.is_empty());
    }

    #[test]
    fn test_combine_takes_maximum() {
        let mut a = CoverageProfile::new(target("t1"));
        a.file_mut("a.c").record_line(1, 3);
        a.file_mut("a.c").record_function("f", 1, 2);
        let mut b = CoverageProfile::new(target("t1"));
        b.file_mut("a.c").record_line(1, 5);
        b.file_mut("a.c").record_line(2, 0);
        b.file_mut("a.c").record_function("f", 1, 1);

        let same = a.clone();
        a.combine(&same);
        assert_eq!(a.files()["a.c"].line_hits(1), Some(3));

        a.combine(&b);
        let file = &a.files()["a.c"];
        assert_eq!(file.line_hits(1), Some(5));
        assert_eq!(file.line_hits(2), Some(0));
        assert_eq!(file.functions()["f"].hits, 2);
    }
}
