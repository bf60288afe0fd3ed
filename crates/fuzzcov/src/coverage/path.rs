//! Source path normalization
//!
//! Binaries built from the same tree encode source paths differently
//! (absolute under the build root, relative with `./`, Windows separators).
//! Every path is brought to one canonical form before it is used as a merge
//! key.

use serde::{Deserialize, Serialize};

/// Default source-root prefixes stripped from absolute paths
pub const DEFAULT_STRIP_PREFIXES: &[&str] = &["/src/"];

/// Normalizes raw source paths into canonical merge keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNormalizer {
    strip_prefixes: Vec<String>,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self {
            strip_prefixes: DEFAULT_STRIP_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl PathNormalizer {
    /// Create a normalizer with the default prefixes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer that strips nothing
    #[must_use]
    pub fn without_prefixes() -> Self {
        Self {
            strip_prefixes: Vec::new(),
        }
    }

    /// Add a prefix to strip (e.g. a build directory)
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let mut prefix = clean(prefix);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        if !self.strip_prefixes.contains(&prefix) {
            self.strip_prefixes.push(prefix);
        }
        // Longest prefix wins
        self.strip_prefixes
            .sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    /// Configured prefixes, longest first
    #[must_use]
    pub fn prefixes(&self) -> &[String] {
        &self.strip_prefixes
    }

    /// Normalize a raw path into its canonical form
    #[must_use]
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = clean(raw);
        for prefix in &self.strip_prefixes {
            if let Some(rest) = cleaned.strip_prefix(prefix.as_str()) {
                if !rest.is_empty() {
                    return rest.to_string();
                }
            }
        }
        cleaned
    }
}

/// Lexically clean a path: unify separators, drop `.` and empty segments,
/// resolve `..` against preceding segments.
fn clean(raw: &str) -> String {
    let unified = raw.trim().replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // `..` above the root of an absolute path stays at the root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}
