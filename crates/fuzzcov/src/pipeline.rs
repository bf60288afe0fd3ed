//! Aggregation pass
//!
//! ```text
//! ProfileStore ─► CoverageMerger ──► MergedCoverageModel ─┬► merged.covdata / merged.lcov
//!             └─► ProfilingMerger ─► MergedProfilingModel ├► profiling/merged.<kind>.folded
//!                                                         ├► report/index.html (+ navigation)
//!                                                         └► summary.txt / summary.json
//! ```
//!
//! Everything is merged and rendered in memory first; files are only
//! published once every step of the project succeeded.

use crate::coverage::{
    ArtifactFormat, ArtifactWarning, CoverageMerger, LcovFormatter, MergedCoverageModel,
    PathNormalizer,
};
use crate::profiling::{MergedProfilingModel, ProfilingMerger};
use crate::publish::{publish_bytes, publish_validated};
use crate::report::{
    validate_document, CoverageSummary, NavigationPatcher, PatchOutcome, Ratio, ReportGenerator,
};
use crate::result::{FuzzcovError, FuzzcovResult};
use crate::store::{discover_projects, ProfileStore};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Name of the binary aggregate
pub const COVDATA_FILE: &str = "merged.covdata";
/// Name of the LCOV export
pub const LCOV_FILE: &str = "merged.lcov";
/// Directory of merged profiling output
pub const PROFILING_DIR: &str = "profiling";
/// Report document, relative to the project output directory
pub const REPORT_FILE: &str = "report/index.html";

/// Settings of one aggregation pass
#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Where per-project outputs are written
    pub report_root: PathBuf,
    /// Artifact format, fixed for the whole pass
    pub format: ArtifactFormat,
    /// Path canonicalization rules
    pub normalizer: PathNormalizer,
    /// Parse parallelism (0 = available parallelism)
    pub jobs: usize,
    /// Source tree used to render file contents
    pub source_root: Option<PathBuf>,
}

impl AggregationConfig {
    /// Create a configuration with default normalization
    #[must_use]
    pub fn new(report_root: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            report_root: report_root.into(),
            format,
            normalizer: PathNormalizer::default(),
            jobs: 0,
            source_root: None,
        }
    }

    /// Set the path normalizer
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: PathNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set parse parallelism
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the source tree
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }
}

/// Files written for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOutputs {
    /// Project output directory
    pub dir: PathBuf,
    /// Binary aggregate
    pub covdata: PathBuf,
    /// LCOV export
    pub lcov: PathBuf,
    /// HTML report
    pub html: PathBuf,
    /// Text summary
    pub summary_text: PathBuf,
    /// JSON summary
    pub summary_json: PathBuf,
    /// Merged profiling files, one per sample kind
    pub profiling: Vec<PathBuf>,
}

/// Result of a successful project pass
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    /// Project name
    pub project: String,
    /// Coverage artifacts considered
    pub discovered: usize,
    /// Skipped coverage artifacts
    pub coverage_warnings: Vec<ArtifactWarning>,
    /// Skipped profiling artifacts
    pub profiling_warnings: Vec<ArtifactWarning>,
    /// Aggregate line numbers
    pub lines: Ratio,
    /// Model digest
    pub digest: String,
    /// Written files
    pub outputs: ReportOutputs,
}

/// Outcome of one project within a fleet pass
#[derive(Debug)]
pub struct ProjectOutcome {
    /// Project name
    pub project: String,
    /// Report or the error that aborted the project
    pub result: FuzzcovResult<ProjectReport>,
}

/// Outcome of a fleet pass
#[derive(Debug, Default)]
pub struct FleetOutcome {
    /// Per-project outcomes, sorted by project
    pub projects: Vec<ProjectOutcome>,
}

impl FleetOutcome {
    /// Number of failed projects
    #[must_use]
    pub fn failed(&self) -> usize {
        self.projects.iter().filter(|p| p.result.is_err()).count()
    }

    /// Number of successful projects
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.projects.len() - self.failed()
    }

    /// Whether every project succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Runs aggregation passes
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    /// Create an aggregator
    #[must_use]
    pub const fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate one project directory of the profile store
    pub fn aggregate_project(&self, project_dir: &Path) -> FuzzcovResult<ProjectReport> {
        let store = ProfileStore::open(project_dir)?;
        let project = store.project().to_string();
        tracing::info!(project = %project, format = %self.config.format, "aggregating project");

        let coverage_artifacts = store.coverage_artifacts(self.config.format)?;
        let coverage = CoverageMerger::new(self.config.format)
            .with_normalizer(self.config.normalizer.clone())
            .with_jobs(self.config.jobs)
            .merge_artifacts(&project, &coverage_artifacts)?;

        let profiling_artifacts = store.profiling_artifacts()?;
        let profiling = ProfilingMerger::new()
            .with_jobs(self.config.jobs)
            .merge_artifacts(&project, &profiling_artifacts)?;

        let document = self.render_document(&coverage.model)?;
        let summary =
            CoverageSummary::from_model(&coverage.model)?.with_skipped(coverage.warnings.clone());

        let outputs = self.publish(&coverage.model, &profiling.model, &document, &summary)?;
        tracing::info!(
            project = %project,
            covered = summary.lines.covered,
            total = summary.lines.total,
            dir = %outputs.dir.display(),
            "report published"
        );

        Ok(ProjectReport {
            project,
            discovered: coverage.discovered,
            coverage_warnings: coverage.warnings,
            profiling_warnings: profiling.warnings,
            lines: summary.lines,
            digest: summary.digest,
            outputs,
        })
    }

    /// Aggregate every project under a store root.
    ///
    /// A failing project is recorded and the pass moves on to the next one.
    pub fn aggregate_fleet(&self, store_root: &Path) -> FuzzcovResult<FleetOutcome> {
        let mut outcome = FleetOutcome::default();
        for dir in discover_projects(store_root)? {
            let project = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let result = self.aggregate_project(&dir);
            if let Err(e) = &result {
                tracing::error!(project = %project, error = %e, "project aggregation failed");
            }
            outcome.projects.push(ProjectOutcome { project, result });
        }
        tracing::info!(
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            "fleet aggregation finished"
        );
        Ok(outcome)
    }

    fn render_document(&self, model: &MergedCoverageModel) -> FuzzcovResult<String> {
        let mut generator = ReportGenerator::new();
        if let Some(root) = &self.config.source_root {
            generator = generator.with_source_root(root);
        }
        let rendered = generator.render(model)?;
        match NavigationPatcher::new().patch(&rendered)? {
            PatchOutcome::Patched(document) => Ok(document),
            PatchOutcome::AlreadyPatched => Ok(rendered),
        }
    }

    fn publish(
        &self,
        model: &MergedCoverageModel,
        profiling: &MergedProfilingModel,
        document: &str,
        summary: &CoverageSummary,
    ) -> FuzzcovResult<ReportOutputs> {
        let dir = self.config.report_root.join(model.project());
        let outputs = ReportOutputs {
            covdata: dir.join(COVDATA_FILE),
            lcov: dir.join(LCOV_FILE),
            html: dir.join(REPORT_FILE),
            summary_text: dir.join("summary.txt"),
            summary_json: dir.join("summary.json"),
            profiling: Vec::new(),
            dir,
        };

        model.save(&outputs.covdata)?;
        LcovFormatter::new(model).save(&outputs.lcov)?;
        let profiling_files = profiling.save(&outputs.dir.join(PROFILING_DIR))?;
        publish_validated(&outputs.html, document, validate_document)?;
        publish_bytes(&outputs.summary_text, summary.to_text().as_bytes())?;
        publish_bytes(&outputs.summary_json, summary.to_json()?.as_bytes())?;

        Ok(ReportOutputs {
            profiling: profiling_files,
            ..outputs
        })
    }
}

/// Pick the artifact format for a pass: an explicit override wins over the language
pub fn select_format(
    explicit: Option<ArtifactFormat>,
    language: Option<&str>,
) -> FuzzcovResult<ArtifactFormat> {
    match (explicit, language) {
        (Some(format), _) => Ok(format),
        (None, Some(language)) => ArtifactFormat::from_language(language),
        (None, None) => Err(FuzzcovError::UnsupportedLanguage(
            "no language given (set FUZZING_LANGUAGE or --format)".to_string(),
        )),
    }
}
