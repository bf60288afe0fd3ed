//! `llvm-cov export -format=text` JSON parsing
//!
//! Line coverage is derived from region segments the way llvm-cov's line
//! view does it: a line is instrumented if a counted region starts on it or
//! a counted region wraps into it from an earlier line; its count is the
//! maximum of the region entries starting on the line, else the wrapped
//! count.

use super::ProfileParser;
use crate::coverage::profile::{BranchId, CoverageProfile, FileCoverage};
use crate::target::FuzzTarget;
use serde::Deserialize;
use serde_json::Value;

const EXPORT_TYPE: &str = "llvm.coverage.json.export";

#[derive(Debug, Deserialize)]
struct Export {
    #[serde(rename = "type")]
    kind: Option<String>,
    data: Vec<ExportData>,
}

#[derive(Debug, Deserialize)]
struct ExportData {
    #[serde(default)]
    files: Vec<ExportFile>,
    #[serde(default)]
    functions: Vec<ExportFunction>,
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    filename: String,
    #[serde(default)]
    segments: Vec<Vec<Value>>,
    #[serde(default)]
    branches: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ExportFunction {
    name: String,
    count: u64,
    #[serde(default)]
    regions: Vec<Vec<Value>>,
    #[serde(default)]
    filenames: Vec<String>,
}

/// One segment: `[line, col, count, has_count, is_region_entry, is_gap_region?]`
#[derive(Debug, Clone, Copy)]
struct Segment {
    line: u32,
    count: u64,
    has_count: bool,
    is_region_entry: bool,
    is_gap: bool,
}

impl Segment {
    fn from_value(raw: &[Value]) -> Result<Self, String> {
        if raw.len() < 5 {
            return Err(format!("segment has {} fields, expected at least 5", raw.len()));
        }
        Ok(Self {
            line: as_u32(&raw[0])?,
            count: as_u64(&raw[2])?,
            has_count: as_bool(&raw[3])?,
            is_region_entry: as_bool(&raw[4])?,
            is_gap: raw.get(5).map(as_bool).transpose()?.unwrap_or(false),
        })
    }

    const fn starts_counted_region(&self) -> bool {
        self.has_count && self.is_region_entry && !self.is_gap
    }
}

fn as_u64(v: &Value) -> Result<u64, String> {
    v.as_u64().ok_or_else(|| format!("expected unsigned integer, got {v}"))
}

fn as_u32(v: &Value) -> Result<u32, String> {
    as_u64(v).and_then(|n| u32::try_from(n).map_err(|_| format!("line number {n} out of range")))
}

fn as_bool(v: &Value) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("expected boolean, got {v}"))
}

/// Parser for `llvm-cov export` JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct LlvmJsonParser;

impl ProfileParser for LlvmJsonParser {
    fn parse(&self, target: FuzzTarget, input: &str) -> Result<CoverageProfile, String> {
        let export: Export = serde_json::from_str(input).map_err(|e| e.to_string())?;
        if let Some(kind) = export.kind.as_deref() {
            if kind != EXPORT_TYPE {
                return Err(format!("unexpected export type {kind:?}"));
            }
        }

        let mut profile = CoverageProfile::new(target);
        for data in &export.data {
            for file in &data.files {
                let coverage = file_coverage(file)?;
                profile.add_file(&file.filename, &coverage);
            }
            for func in &data.functions {
                let Some(path) = func.filenames.first() else {
                    continue;
                };
                let line = match func.regions.first().and_then(|r| r.first()) {
                    Some(v) => as_u32(v)?,
                    None => 0,
                };
                profile.file_mut(path).record_function(&func.name, line, func.count);
            }
        }
        Ok(profile)
    }
}

fn file_coverage(file: &ExportFile) -> Result<FileCoverage, String> {
    let mut segments = file
        .segments
        .iter()
        .map(|s| Segment::from_value(s))
        .collect::<Result<Vec<_>, _>>()?;
    segments.sort_by_key(|s| s.line);

    let mut coverage = FileCoverage::new();
    line_counts(&segments, &mut coverage);

    for raw in &file.branches {
        // [line_start, col_start, line_end, col_end, true_count, false_count, ...]
        if raw.len() < 6 {
            return Err(format!("branch has {} fields, expected at least 6", raw.len()));
        }
        let line = as_u32(&raw[0])?;
        let col = as_u32(&raw[1])?;
        coverage.record_branch(BranchId::new(line, col, "true"), as_u64(&raw[4])?);
        coverage.record_branch(BranchId::new(line, col, "false"), as_u64(&raw[5])?);
    }
    Ok(coverage)
}

fn line_counts(segments: &[Segment], coverage: &mut FileCoverage) {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return;
    };

    let mut wrapped: Option<Segment> = None;
    let mut idx = 0;
    for line in first.line..=last.line {
        let start = idx;
        while idx < segments.len() && segments[idx].line == line {
            idx += 1;
        }
        let on_line = &segments[start..idx];

        let entry_max = on_line
            .iter()
            .filter(|s| s.starts_counted_region())
            .map(|s| s.count)
            .max();
        let count = entry_max.or_else(|| {
            wrapped
                .filter(|w| w.has_count && !w.is_gap)
                .map(|w| w.count)
        });
        if let Some(count) = count {
            coverage.record_line(line, count);
        }

        if let Some(&last_on_line) = on_line.last() {
            wrapped = Some(last_on_line);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn target() -> FuzzTarget {
        FuzzTarget::new("fuzz_inflate").unwrap()
    }

    const SAMPLE: &str = r#"{
      "type": "llvm.coverage.json.export",
      "version": "2.0.1",
      "data": [{
        "files": [{
          "filename": "/src/zlib/inflate.c",
          "segments": [
            [1, 1, 5, true, true, false],
            [3, 2, 0, true, true, false],
            [4, 1, 5, true, false, false],
            [6, 2, 0, false, false, false]
          ],
          "branches": [[2, 7, 2, 12, 4, 1, 0, 0, 4]]
        }],
        "functions": [{
          "name": "inflate",
          "count": 5,
          "regions": [[1, 1, 6, 2, 5, 0, 0, 0]],
          "filenames": ["/src/zlib/inflate.c"]
        }],
        "totals": {}
      }]
    }"#;

    #[test]
    fn test_lines_from_segments() {
        let profile = LlvmJsonParser.parse(target(), SAMPLE).unwrap();
        let file = &profile.files()["/src/zlib/inflate.c"];

        assert_eq!(file.line_hits(1), Some(5));
        // Wrapped into from line 1
        assert_eq!(file.line_hits(2), Some(5));
        // Region entry with count 0
        assert_eq!(file.line_hits(3), Some(0));
        // Wrapped from line 3 (count 0), resumed on line 4 but not an entry
        assert_eq!(file.line_hits(4), Some(0));
        assert_eq!(file.line_hits(5), Some(5));
        // The region closes on line 6, which is still inside it
        assert_eq!(file.line_hits(6), Some(5));
        // Past the last segment
        assert_eq!(file.line_hits(7), None);
        assert_eq!(file.total_lines(), 6);
    }

    #[test]
    fn test_branches_and_functions() {
        let profile = LlvmJsonParser.parse(target(), SAMPLE).unwrap();
        let file = &profile.files()["/src/zlib/inflate.c"];

        assert_eq!(file.total_branches(), 2);
        assert_eq!(file.branches()[&BranchId::new(2, 7, "true")], 4);
        assert_eq!(file.branches()[&BranchId::new(2, 7, "false")], 1);
        assert_eq!(file.functions()["inflate"].hits, 5);
        assert_eq!(file.functions()["inflate"].line, 1);
    }

    #[test]
    fn test_wrong_export_type_rejected() {
        let input = r#"{"type": "something.else", "data": []}"#;
        assert!(LlvmJsonParser.parse(target(), input).is_err());
    }

    #[test]
    fn test_malformed_segment_rejected() {
        let input = r#"{"data": [{"files": [{"filename": "a.c", "segments": [[1, 1]]}]}]}"#;
        let err = LlvmJsonParser.parse(target(), input).unwrap_err();
        assert!(err.contains("segment"));
    }

    #[test]
    fn test_not_json_rejected() {
        assert!(LlvmJsonParser.parse(target(), "SF:a.c").is_err());
    }

    #[test]
    fn test_file_without_segments_is_empty() {
        let input = r#"{"data": [{"files": [{"filename": "a.c", "segments": []}]}]}"#;
        let profile = LlvmJsonParser.parse(target(), input).unwrap();
        assert!(profile.is_empty());
    }
}
