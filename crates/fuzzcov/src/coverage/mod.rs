//! Coverage merging
//!
//! ```text
//! Profile Store ──► ArtifactFormat parser ──► CoverageProfile (per target)
//!                                                   │ PathNormalizer
//!                                                   ▼
//!                                      MergedCoverageModel (per project)
//! ```
//!
//! Covered status is a union over targets, hit counts sum, and the fold
//! always runs in target order.

pub mod formats;
mod merge;
mod model;
mod path;
mod profile;

pub use formats::{ArtifactFormat, LcovFormatter, ProfileParser};
pub use merge::{ArtifactWarning, CoverageMergeOutcome, CoverageMerger};
pub use model::{percent, MergedCoverageModel};
pub use path::{PathNormalizer, DEFAULT_STRIP_PREFIXES};
pub use profile::{BranchId, CoverageProfile, FileCoverage, FunctionCoverage};
