//! Coverage artifact formats
//!
//! One closed set of formats, each implementing the same parse capability.
//! The format is picked once at the start of an aggregation pass, from the
//! fuzzing language or an explicit override, never re-checked per artifact.

mod coverage_py;
mod lcov;
mod llvm_json;

pub use coverage_py::CoveragePyParser;
pub use lcov::{LcovFormatter, LcovParser};
pub use llvm_json::LlvmJsonParser;

use super::profile::CoverageProfile;
use crate::result::{FuzzcovError, FuzzcovResult};
use crate::target::FuzzTarget;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Parses one raw artifact into a coverage profile
pub trait ProfileParser: Sync {
    /// Parse `input` produced by `target`.
    ///
    /// Errors are plain messages; the caller attaches the artifact path.
    fn parse(&self, target: FuzzTarget, input: &str) -> Result<CoverageProfile, String>;
}

/// Supported coverage artifact formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFormat {
    /// LCOV tracefile (`SF:`/`DA:`/`BRDA:` records)
    Lcov,
    /// `llvm-cov export` JSON
    LlvmJson,
    /// coverage.py JSON report
    CoveragePy,
}

impl ArtifactFormat {
    /// All formats
    pub const ALL: [Self; 3] = [Self::Lcov, Self::LlvmJson, Self::CoveragePy];

    /// Map a fuzzing language (as in `FUZZING_LANGUAGE`) to its coverage toolchain format
    pub fn from_language(language: &str) -> FuzzcovResult<Self> {
        match language.trim().to_ascii_lowercase().as_str() {
            "c" | "c++" | "cpp" | "swift" => Ok(Self::LlvmJson),
            "rust" => Ok(Self::Lcov),
            "python" => Ok(Self::CoveragePy),
            other => Err(FuzzcovError::UnsupportedLanguage(other.to_string())),
        }
    }

    /// Stable name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lcov => "lcov",
            Self::LlvmJson => "llvm-json",
            Self::CoveragePy => "coverage-py",
        }
    }

    /// Human-readable toolchain label shown in reports
    #[must_use]
    pub const fn toolchain(self) -> &'static str {
        match self {
            Self::Lcov => "LCOV",
            Self::LlvmJson => "llvm-cov",
            Self::CoveragePy => "coverage.py",
        }
    }

    /// File extensions of coverage artifacts in the profile store
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Lcov => &["lcov", "info"],
            Self::LlvmJson | Self::CoveragePy => &["json"],
        }
    }

    /// Parser for this format
    #[must_use]
    pub fn parser(self) -> &'static dyn ProfileParser {
        match self {
            Self::Lcov => &LcovParser,
            Self::LlvmJson => &LlvmJsonParser,
            Self::CoveragePy => &CoveragePyParser,
        }
    }

    /// Parse an artifact with this format's parser
    pub fn parse(self, target: FuzzTarget, input: &str) -> Result<CoverageProfile, String> {
        self.parser().parse(target, input)
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArtifactFormat {
    type Err = FuzzcovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| FuzzcovError::UnknownFormat(s.to_string()))
    }
}
