//! coverage.py JSON report parsing (`coverage json`)
//!
//! Line counts are binary: executed lines get 1, missing lines 0. Branch
//! arcs `[from, to]` become branch outcomes on `from`, labelled by their
//! destination (negative destinations are function exits).

use super::ProfileParser;
use crate::coverage::profile::{BranchId, CoverageProfile, FileCoverage};
use crate::target::FuzzTarget;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct Report {
    files: BTreeMap<String, ReportFile>,
}

#[derive(Debug, Deserialize)]
struct ReportFile {
    #[serde(default)]
    executed_lines: Vec<u32>,
    #[serde(default)]
    missing_lines: Vec<u32>,
    #[serde(default)]
    executed_branches: Vec<(i64, i64)>,
    #[serde(default)]
    missing_branches: Vec<(i64, i64)>,
}

/// Parser for coverage.py JSON reports
#[derive(Debug, Clone, Copy, Default)]
pub struct CoveragePyParser;

impl ProfileParser for CoveragePyParser {
    fn parse(&self, target: FuzzTarget, input: &str) -> Result<CoverageProfile, String> {
        let report: Report = serde_json::from_str(input).map_err(|e| e.to_string())?;

        let mut profile = CoverageProfile::new(target);
        for (path, file) in &report.files {
            let mut coverage = FileCoverage::new();
            for &line in &file.missing_lines {
                coverage.record_line(line, 0);
            }
            for &line in &file.executed_lines {
                coverage.record_line(line, 1);
            }
            for &(from, to) in &file.missing_branches {
                coverage.record_branch(arc(from, to)?, 0);
            }
            for &(from, to) in &file.executed_branches {
                coverage.record_branch(arc(from, to)?, 1);
            }
            profile.add_file(path, &coverage);
        }
        Ok(profile)
    }
}

fn arc(from: i64, to: i64) -> Result<BranchId, String> {
    let line = u32::try_from(from).map_err(|_| format!("invalid branch source line {from}"))?;
    Ok(BranchId::new(line, 0, format!("->{to}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn target() -> FuzzTarget {
        FuzzTarget::new("fuzz_yaml").unwrap()
    }

    const SAMPLE: &str = r#"{
      "meta": {"version": "7.4.0", "branch_coverage": true},
      "files": {
        "/src/pyyaml/lib/yaml/reader.py": {
          "executed_lines": [1, 2, 5],
          "missing_lines": [3, 4],
          "excluded_lines": [],
          "executed_branches": [[2, 5]],
          "missing_branches": [[2, 3], [5, -1]]
        }
      },
      "totals": {}
    }"#;

    #[test]
    fn test_parse_lines_and_arcs() {
        let profile = CoveragePyParser.parse(target(), SAMPLE).unwrap();
        let file = &profile.files()["/src/pyyaml/lib/yaml/reader.py"];

        assert_eq!(file.total_lines(), 5);
        assert_eq!(file.covered_lines(), 3);
        assert_eq!(file.line_hits(3), Some(0));
        assert_eq!(file.total_branches(), 3);
        assert_eq!(file.covered_branches(), 1);
        assert_eq!(file.branches()[&BranchId::new(5, 0, "->-1")], 0);
    }

    #[test]
    fn test_missing_files_key_rejected() {
        assert!(CoveragePyParser.parse(target(), r#"{"totals": {}}"#).is_err());
    }

    #[test]
    fn test_negative_source_line_rejected() {
        let input = r#"{"files": {"a.py": {"executed_branches": [[-1, 2]]}}}"#;
        assert!(CoveragePyParser.parse(target(), input).is_err());
    }
}
