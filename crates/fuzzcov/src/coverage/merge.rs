//! Coverage Merger
//!
//! Turns the coverage artifacts of one project into a single
//! [`MergedCoverageModel`]. Broken artifacts are skipped and reported as
//! warnings; only a project with no usable artifact at all is an error.

use super::formats::ArtifactFormat;
use super::model::MergedCoverageModel;
use super::path::PathNormalizer;
use super::profile::CoverageProfile;
use crate::parallel::parallel_map;
use crate::result::{FuzzcovError, FuzzcovResult};
use crate::store::CoverageArtifact;
use crate::target::FuzzTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A skipped artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactWarning {
    /// Producing target
    pub target: FuzzTarget,
    /// Artifact path
    pub path: PathBuf,
    /// Why it was skipped
    pub message: String,
}

/// Result of merging a project's coverage artifacts
#[derive(Debug, Clone)]
pub struct CoverageMergeOutcome {
    /// The merged model
    pub model: MergedCoverageModel,
    /// Skipped artifacts, in target order
    pub warnings: Vec<ArtifactWarning>,
    /// Number of artifacts considered
    pub discovered: usize,
}

impl CoverageMergeOutcome {
    /// Number of artifacts that contributed
    #[must_use]
    pub fn merged(&self) -> usize {
        self.discovered - self.warnings.len()
    }
}

/// Merges coverage artifacts of one format
#[derive(Debug, Clone)]
pub struct CoverageMerger {
    format: ArtifactFormat,
    normalizer: PathNormalizer,
    jobs: usize,
}

impl CoverageMerger {
    /// Create a merger for a format with the default path normalizer
    #[must_use]
    pub fn new(format: ArtifactFormat) -> Self {
        Self {
            format,
            normalizer: PathNormalizer::default(),
            jobs: 0,
        }
    }

    /// Use a custom path normalizer
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: PathNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Limit parse parallelism (0 = available parallelism)
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Artifact format
    #[must_use]
    pub const fn format(&self) -> ArtifactFormat {
        self.format
    }

    /// Read, parse and merge the given artifacts.
    ///
    /// Parsing runs in parallel; the fold runs afterwards in target order.
    pub fn merge_artifacts(
        &self,
        project: &str,
        artifacts: &[CoverageArtifact],
    ) -> FuzzcovResult<CoverageMergeOutcome> {
        let mut sorted = artifacts.to_vec();
        sorted.sort();

        let parsed = parallel_map(&sorted, self.jobs, |artifact| self.load(artifact));

        let mut profiles = Vec::with_capacity(parsed.len());
        let mut warnings = Vec::new();
        for (artifact, result) in sorted.iter().zip(parsed) {
            match result {
                Ok(profile) => profiles.push(profile),
                Err(message) => {
                    tracing::warn!(
                        project,
                        target = %artifact.target,
                        path = %artifact.path.display(),
                        %message,
                        "skipping unparsable coverage artifact"
                    );
                    warnings.push(ArtifactWarning {
                        target: artifact.target.clone(),
                        path: artifact.path.clone(),
                        message,
                    });
                }
            }
        }

        if profiles.is_empty() {
            return Err(FuzzcovError::NoCoverageData {
                project: project.to_string(),
                discovered: sorted.len(),
                parsed: 0,
            });
        }

        let model = self.merge_profiles(project, profiles)?;
        tracing::info!(
            project,
            merged = sorted.len() - warnings.len(),
            skipped = warnings.len(),
            files = model.files().len(),
            "coverage merged"
        );
        Ok(CoverageMergeOutcome {
            model,
            warnings,
            discovered: sorted.len(),
        })
    }

    /// Normalize and fold already-parsed profiles.
    ///
    /// Profiles are folded in target order, so the result does not depend
    /// on the order they are supplied in.
    pub fn merge_profiles<I>(&self, project: &str, profiles: I) -> FuzzcovResult<MergedCoverageModel>
    where
        I: IntoIterator<Item = CoverageProfile>,
    {
        let mut normalized: Vec<CoverageProfile> = profiles
            .into_iter()
            .map(|p| p.normalized(&self.normalizer))
            .collect();
        if normalized.is_empty() {
            return Err(FuzzcovError::NoCoverageData {
                project: project.to_string(),
                discovered: 0,
                parsed: 0,
            });
        }
        normalized.sort_by(|a, b| a.target().cmp(b.target()));

        // Hits sum across distinct targets only; repeats of a target collapse
        let mut per_target: Vec<CoverageProfile> = Vec::with_capacity(normalized.len());
        for profile in normalized {
            match per_target.last_mut() {
                Some(last) if last.target() == profile.target() => {
                    tracing::debug!(
                        project,
                        target = %profile.target(),
                        "combining repeated profile of one target"
                    );
                    last.combine(&profile);
                }
                _ => per_target.push(profile),
            }
        }

        let mut model = MergedCoverageModel::new(project);
        for profile in &per_target {
            model.absorb(profile);
        }
        Ok(model)
    }

    fn load(&self, artifact: &CoverageArtifact) -> Result<CoverageProfile, String> {
        let bytes = std::fs::read(&artifact.path).map_err(|e| e.to_string())?;
        let text = String::from_utf8(bytes).map_err(|_| "artifact is not UTF-8 text".to_string())?;
        let profile = self.format.parse(artifact.target.clone(), &text)?;
        if profile.is_empty() {
            return Err("profile contains no source records".to_string());
        }
        Ok(profile)
    }
}
