//! Fuzz target identifiers
//!
//! A target is named by the stem of the artifact file it produced. Target
//! ids are not interchangeable with file paths: keeping them a distinct type
//! stops a raw path from being used as a merge key by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier for one compiled fuzzer binary within a project
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FuzzTarget(String);

impl FuzzTarget {
    /// Create a target id, rejecting empty names and names containing path separators
    #[must_use]
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return None;
        }
        Some(Self(name.to_string()))
    }

    /// Derive the target id from an artifact path.
    ///
    /// Everything before the first `.` of the file name is the target, so
    /// `fuzz_png.cpu.folded` and `fuzz_png.json` both belong to `fuzz_png`.
    #[must_use]
    pub fn from_artifact_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        let stem = file_name.split('.').next()?;
        Self::new(stem)
    }

    /// Borrow the target name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FuzzTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
