//! Profiling Merger
//!
//! Per-target CPU and heap samples arrive as folded stacks:
//!
//! ```text
//! main;parse_chunk;inflate 120
//! main;parse_chunk;crc32 7
//! ```
//!
//! Samples of all targets are combined per kind by summing the count of
//! identical stacks. The merged model is opaque to this crate; it is written
//! back out in the same folded format for downstream flamegraph viewers.

use crate::coverage::ArtifactWarning;
use crate::parallel::parallel_map;
use crate::publish::publish_dir;
use crate::result::{FuzzcovError, FuzzcovResult};
use crate::store::ProfilingArtifact;
use crate::target::FuzzTarget;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of profiling sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleKind {
    /// CPU time samples
    Cpu,
    /// Heap allocation samples
    Heap,
}

impl SampleKind {
    /// Stable name used in file names
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Heap => "heap",
        }
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Self::Cpu),
            "heap" => Ok(Self::Heap),
            other => Err(format!("unknown sample kind {other:?}")),
        }
    }
}

/// Folded stacks of one sample file: stack -> count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldedStacks {
    stacks: BTreeMap<String, u64>,
}

impl FoldedStacks {
    /// Parse folded-stack text.
    ///
    /// Every non-blank line must be `<frames> <count>`; the count is the
    /// text after the last space.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut folded = Self::default();
        for (idx, raw) in input.lines().enumerate() {
            let line = raw.trim_end();
            if line.trim().is_empty() {
                continue;
            }
            let (stack, count) = line
                .rsplit_once(' ')
                .ok_or_else(|| format!("line {}: missing sample count", idx + 1))?;
            let count: u64 = count
                .parse()
                .map_err(|_| format!("line {}: invalid sample count {count:?}", idx + 1))?;
            let stack = stack.trim();
            if stack.is_empty() {
                return Err(format!("line {}: empty stack", idx + 1));
            }
            folded.add(stack, count);
        }
        Ok(folded)
    }

    /// Add samples for a stack
    pub fn add(&mut self, stack: &str, count: u64) {
        let entry = self.stacks.entry(stack.to_string()).or_insert(0);
        *entry = entry.saturating_add(count);
    }

    /// Fold another sample set into this one
    pub fn merge(&mut self, other: &Self) {
        for (stack, &count) in &other.stacks {
            self.add(stack, count);
        }
    }

    /// Stacks with their counts
    #[must_use]
    pub fn stacks(&self) -> &BTreeMap<String, u64> {
        &self.stacks
    }

    /// Sum of all sample counts
    #[must_use]
    pub fn total(&self) -> u64 {
        self.stacks.values().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Whether there are no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Render in folded format, one stack per line, sorted by stack
    #[must_use]
    pub fn to_folded(&self) -> String {
        let mut out = String::new();
        for (stack, count) in &self.stacks {
            out.push_str(&format!("{stack} {count}\n"));
        }
        out
    }
}

/// Project-level aggregate of profiling samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedProfilingModel {
    project: String,
    targets: BTreeSet<FuzzTarget>,
    kinds: BTreeMap<SampleKind, FoldedStacks>,
}

impl MergedProfilingModel {
    /// Create an empty model
    #[must_use]
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
            ..Self::default()
        }
    }

    /// Fold one target's samples of one kind into the model
    pub fn absorb(&mut self, target: &FuzzTarget, kind: SampleKind, samples: &FoldedStacks) {
        let _ = self.targets.insert(target.clone());
        self.kinds.entry(kind).or_default().merge(samples);
    }

    /// Project name
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Contributing targets
    #[must_use]
    pub fn targets(&self) -> &BTreeSet<FuzzTarget> {
        &self.targets
    }

    /// Merged samples of a kind
    #[must_use]
    pub fn samples(&self, kind: SampleKind) -> Option<&FoldedStacks> {
        self.kinds.get(&kind)
    }

    /// Kinds present in the model
    pub fn kinds(&self) -> impl Iterator<Item = SampleKind> + '_ {
        self.kinds.keys().copied()
    }

    /// Whether no samples were merged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.values().all(FoldedStacks::is_empty)
    }

    /// Replace `dir` with one `merged.<kind>.folded` file per kind.
    ///
    /// Files of kinds absent from this model are removed; an empty model
    /// removes `dir`. Returns the written paths.
    pub fn save(&self, dir: &Path) -> FuzzcovResult<Vec<PathBuf>> {
        let files: Vec<(String, Vec<u8>)> = self
            .kinds
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(kind, samples)| {
                (
                    format!("merged.{kind}.folded"),
                    samples.to_folded().into_bytes(),
                )
            })
            .collect();
        publish_dir(dir, &files)
    }
}

/// Result of merging a project's profiling artifacts
#[derive(Debug, Clone)]
pub struct ProfilingMergeOutcome {
    /// The merged model
    pub model: MergedProfilingModel,
    /// Skipped artifacts, in target order
    pub warnings: Vec<ArtifactWarning>,
}

/// Merges profiling artifacts of one project
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfilingMerger {
    jobs: usize,
}

impl ProfilingMerger {
    /// Create a merger
    #[must_use]
    pub const fn new() -> Self {
        Self { jobs: 0 }
    }

    /// Limit parse parallelism (0 = available parallelism)
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Read, parse and merge profiling artifacts.
    ///
    /// No artifacts at all yields an empty model; artifacts that all fail
    /// to parse yield [`FuzzcovError::NoProfilingData`].
    pub fn merge_artifacts(
        &self,
        project: &str,
        artifacts: &[ProfilingArtifact],
    ) -> FuzzcovResult<ProfilingMergeOutcome> {
        let mut sorted = artifacts.to_vec();
        sorted.sort();

        let parsed = parallel_map(&sorted, self.jobs, |artifact| {
            let text = std::fs::read_to_string(&artifact.path).map_err(|e| e.to_string())?;
            let samples = FoldedStacks::parse(&text)?;
            if samples.is_empty() {
                return Err("no samples".to_string());
            }
            Ok(samples)
        });

        let mut model = MergedProfilingModel::new(project);
        let mut warnings = Vec::new();
        for (artifact, result) in sorted.into_iter().zip(parsed) {
            match result {
                Ok(samples) => model.absorb(&artifact.target, artifact.kind, &samples),
                Err(message) => {
                    tracing::warn!(
                        project,
                        target = %artifact.target,
                        path = %artifact.path.display(),
                        %message,
                        "skipping unparsable profiling artifact"
                    );
                    warnings.push(ArtifactWarning {
                        target: artifact.target,
                        path: artifact.path,
                        message,
                    });
                }
            }
        }

        if !artifacts.is_empty() && model.is_empty() {
            return Err(FuzzcovError::NoProfilingData {
                project: project.to_string(),
                discovered: artifacts.len(),
            });
        }
        tracing::info!(
            project,
            targets = model.targets().len(),
            skipped = warnings.len(),
            "profiling merged"
        );
        Ok(ProfilingMergeOutcome { model, warnings })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    fn artifact(dir: &Path, target: &str, kind: SampleKind, body: &str) -> ProfilingArtifact {
        let path = dir.join(format!("{target}.{kind}.folded"));
        fs::write(&path, body).unwrap();
        ProfilingArtifact {
            target: FuzzTarget::new(target).unwrap(),
            kind,
            path,
        }
    }

    #[test]
    fn test_parse_folded() {
        let folded = FoldedStacks::parse("main;a 3\nmain;b 2\n\nmain;a 1\n").unwrap();
        assert_eq!(folded.stacks()["main;a"], 4);
        assert_eq!(folded.total(), 6);
    }

    #[test]
    fn test_parse_frames_with_spaces() {
        let folded = FoldedStacks::parse("main;operator new(unsigned long) 5\n").unwrap();
        assert_eq!(folded.stacks()["main;operator new(unsigned long)"], 5);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(FoldedStacks::parse("main;a\n").is_err());
        assert!(FoldedStacks::parse("main;a x\n").is_err());
        assert!(FoldedStacks::parse(" 4\n").is_err());
    }

    #[test]
    fn test_to_folded_sorted() {
        let mut folded = FoldedStacks::default();
        folded.add("z", 1);
        folded.add("a;b", 2);
        assert_eq!(folded.to_folded(), "a;b 2\nz 1\n");
    }

    #[test]
    fn test_merge_across_targets_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = vec![
            artifact(dir.path(), "t2", SampleKind::Cpu, "main;f 2\n"),
            artifact(dir.path(), "t1", SampleKind::Cpu, "main;f 3\nmain;g 1\n"),
            artifact(dir.path(), "t1", SampleKind::Heap, "main;malloc 64\n"),
        ];

        let outcome = ProfilingMerger::new().merge_artifacts("p", &artifacts).unwrap();
        let cpu = outcome.model.samples(SampleKind::Cpu).unwrap();
        assert_eq!(cpu.stacks()["main;f"], 5);
        assert_eq!(cpu.total(), 6);
        assert_eq!(outcome.model.samples(SampleKind::Heap).unwrap().total(), 64);
        assert_eq!(outcome.model.targets().len(), 2);
    }

    #[test]
    fn test_bad_artifact_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = vec![
            artifact(dir.path(), "t1", SampleKind::Cpu, "main;f 2\n"),
            artifact(dir.path(), "t2", SampleKind::Cpu, "not folded\n"),
        ];
        let outcome = ProfilingMerger::new()
            .with_jobs(2)
            .merge_artifacts("p", &artifacts)
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].target.as_str(), "t2");
    }

    #[test]
    fn test_all_bad_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = vec![artifact(dir.path(), "t1", SampleKind::Heap, "")];
        let err = ProfilingMerger::new().merge_artifacts("p", &artifacts).unwrap_err();
        assert!(matches!(err, FuzzcovError::NoProfilingData { discovered: 1, .. }));
    }

    #[test]
    fn test_no_artifacts_is_empty_model() {
        let outcome = ProfilingMerger::new().merge_artifacts("p", &[]).unwrap();
        assert!(outcome.model.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_save_writes_one_file_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = MergedProfilingModel::new("p");
        let target = FuzzTarget::new("t1").unwrap();
        model.absorb(&target, SampleKind::Cpu, &FoldedStacks::parse("a 1\n").unwrap());
        model.absorb(&target, SampleKind::Heap, &FoldedStacks::parse("b 2\n").unwrap());

        let written = model.save(&dir.path().join("profiling")).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("profiling/merged.heap.folded")).unwrap(),
            "b 2\n"
        );
    }
}
