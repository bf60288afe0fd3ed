//! fuzzcov: project-level coverage and profiling aggregation for fuzz fleets
//!
//! Every fuzz target of a project leaves a coverage artifact (and optionally
//! CPU/heap samples) in the project's profile store. fuzzcov merges them
//! into one model per project and renders a single navigable report.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    FUZZCOV Aggregation Pass                       │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐              │
//! │   │ Profile    │    │ Coverage / │    │ Report     │              │
//! │   │ Store      │───►│ Profiling  │───►│ Generator  │──► patcher   │
//! │   │ (per proj) │    │ Mergers    │    │ + summary  │              │
//! │   └────────────┘    └────────────┘    └────────────┘              │
//! │                                                                  │
//! │   Build Mode Gate: consulted before any build, exit 3 on skip     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

/// Coverage Merger: formats, path normalization, merged model
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::uninlined_format_args,
    clippy::redundant_closure_for_method_calls
)]
pub mod coverage;

/// Build Mode Gate
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod gate;

mod parallel;

/// Aggregation pipeline over one project or a whole store
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod pipeline;

/// Profiling Merger
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::format_push_string
)]
pub mod profiling;

mod publish;

/// Report Generator and Report Navigation Patcher
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod report;

mod result;

/// Profile Store discovery
#[allow(clippy::missing_errors_doc)]
pub mod store;

mod target;

pub use coverage::{
    ArtifactFormat, ArtifactWarning, CoverageMerger, CoverageProfile, FileCoverage,
    LcovFormatter, MergedCoverageModel, PathNormalizer,
};
pub use gate::{BuildModeGate, BuildModePolicy, GateDecision, InstrumentationMode, EXIT_SKIPPED};
pub use parallel::available_jobs;
pub use pipeline::{
    select_format, AggregationConfig, Aggregator, FleetOutcome, ProjectOutcome, ProjectReport,
    ReportOutputs,
};
pub use profiling::{FoldedStacks, MergedProfilingModel, ProfilingMerger, SampleKind};
pub use publish::{publish_bytes, publish_dir, publish_validated};
pub use report::{
    CoverageSummary, DocumentHook, NavigationHook, NavigationPatcher, PatchOutcome,
    ReportGenerator,
};
pub use result::{FuzzcovError, FuzzcovResult};
pub use store::{discover_projects, ProfileStore};
pub use target::FuzzTarget;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        AggregationConfig, Aggregator, ArtifactFormat, BuildModeGate, BuildModePolicy,
        CoverageMerger, FuzzcovError, FuzzcovResult, GateDecision, InstrumentationMode,
        MergedCoverageModel, NavigationPatcher, ProfileStore, ProfilingMerger, ReportGenerator,
    };
}
