//! LCOV tracefile parsing and export
//!
//! ## LCOV Format
//!
//! ```text
//! TN:<test name>
//! SF:<source file>
//! FN:<line>,<function name>
//! FNDA:<execution count>,<function name>
//! FNF:<functions found>
//! FNH:<functions hit>
//! BRDA:<line>,<block>,<branch>,<taken>
//! BRF:<branches found>
//! BRH:<branches hit>
//! DA:<line>,<execution count>
//! LF:<lines found>
//! LH:<lines hit>
//! end_of_record
//! ```

use super::ProfileParser;
use crate::coverage::model::MergedCoverageModel;
use crate::coverage::profile::{BranchId, CoverageProfile, FileCoverage};
use crate::publish::publish_bytes;
use crate::result::FuzzcovResult;
use crate::target::FuzzTarget;
use std::path::Path;

/// Parser for LCOV tracefiles
#[derive(Debug, Clone, Copy, Default)]
pub struct LcovParser;

impl ProfileParser for LcovParser {
    fn parse(&self, target: FuzzTarget, input: &str) -> Result<CoverageProfile, String> {
        let mut profile = CoverageProfile::new(target);
        let mut current: Option<(String, FileCoverage)> = None;
        let mut records = 0usize;

        for (idx, raw) in input.lines().enumerate() {
            let lineno = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if line == "end_of_record" {
                let (path, coverage) = current
                    .take()
                    .ok_or_else(|| format!("line {lineno}: end_of_record outside a record"))?;
                profile.add_file(&path, &coverage);
                records += 1;
                continue;
            }

            let (tag, value) = line
                .split_once(':')
                .ok_or_else(|| format!("line {lineno}: not an LCOV record: {line:.40}"))?;

            if tag == "SF" {
                if current.is_some() {
                    return Err(format!("line {lineno}: SF before end_of_record"));
                }
                if value.is_empty() {
                    return Err(format!("line {lineno}: empty source file"));
                }
                current = Some((value.to_string(), FileCoverage::new()));
                continue;
            }

            // Header tags are allowed outside records
            if matches!(tag, "TN" | "VER") {
                continue;
            }

            let Some((_, coverage)) = current.as_mut() else {
                return Err(format!("line {lineno}: {tag} outside a record"));
            };

            match tag {
                "DA" => {
                    let mut fields = value.split(',');
                    let line_no = parse_u32(fields.next(), lineno)?;
                    let hits = parse_count(fields.next(), lineno)?;
                    coverage.record_line(line_no, hits);
                }
                "BRDA" => {
                    let fields: Vec<&str> = value.splitn(4, ',').collect();
                    if fields.len() != 4 {
                        return Err(format!("line {lineno}: malformed BRDA"));
                    }
                    let line_no = parse_u32(Some(fields[0]), lineno)?;
                    let block = fields[1].trim().parse().unwrap_or(0);
                    let taken = match fields[3].trim() {
                        "-" => 0,
                        other => parse_count(Some(other), lineno)?,
                    };
                    coverage.record_branch(BranchId::new(line_no, block, fields[2].trim()), taken);
                }
                "FN" => {
                    // LCOV 1.x: FN:<line>,<name>; LCOV 2.x: FN:<start>,<end>,<name>.
                    // Demangled names may contain commas.
                    let (start, rest) = value
                        .split_once(',')
                        .ok_or_else(|| format!("line {lineno}: malformed FN"))?;
                    let start = parse_u32(Some(start), lineno)?;
                    let name = match rest.split_once(',') {
                        Some((end, name)) if end.trim().parse::<u32>().is_ok() => name,
                        _ => rest,
                    }
                    .trim();
                    if name.is_empty() {
                        return Err(format!("line {lineno}: FN without a name"));
                    }
                    coverage.record_function(name, start, 0);
                }
                "FNDA" => {
                    let (count, name) = value
                        .split_once(',')
                        .ok_or_else(|| format!("line {lineno}: malformed FNDA"))?;
                    let hits = parse_count(Some(count), lineno)?;
                    coverage.record_function(name.trim(), 0, hits);
                }
                // Derived totals are recomputed from the records
                _ => {}
            }
        }

        if current.is_some() {
            return Err("truncated tracefile: missing end_of_record".to_string());
        }
        if records == 0 {
            return Err("no LCOV records".to_string());
        }
        Ok(profile)
    }
}

fn parse_u32(field: Option<&str>, lineno: usize) -> Result<u32, String> {
    let field = field.ok_or_else(|| format!("line {lineno}: missing field"))?;
    field
        .trim()
        .parse()
        .map_err(|_| format!("line {lineno}: invalid line number {field:?}"))
}

fn parse_count(field: Option<&str>, lineno: usize) -> Result<u64, String> {
    let field = field.ok_or_else(|| format!("line {lineno}: missing count"))?;
    let field = field.trim();
    // Some producers emit counts as floats (e.g. "1.0e+03")
    field.parse::<u64>().or_else(|_| {
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
            .ok_or_else(|| format!("line {lineno}: invalid count {field:?}"))
    })
}

/// LCOV export of a merged model
#[derive(Debug)]
pub struct LcovFormatter<'a> {
    model: &'a MergedCoverageModel,
    test_name: Option<String>,
}

impl<'a> LcovFormatter<'a> {
    /// Create a new LCOV formatter; the test name defaults to the project
    #[must_use]
    pub fn new(model: &'a MergedCoverageModel) -> Self {
        Self {
            model,
            test_name: Some(model.project().to_string()),
        }
    }

    /// Set the test name for the report
    #[must_use]
    pub fn with_test_name(mut self, name: impl Into<String>) -> Self {
        self.test_name = Some(name.into());
        self
    }

    /// Generate LCOV format report as a string
    #[must_use]
    pub fn generate(&self) -> String {
        use std::fmt::Write;

        let mut output = String::new();

        if let Some(ref name) = self.test_name {
            let _ = writeln!(output, "TN:{name}");
        } else {
            output.push_str("TN:\n");
        }

        for (file, coverage) in self.model.files() {
            let _ = writeln!(output, "SF:{file}");

            let functions = coverage.functions();
            for (name, func) in functions {
                let _ = writeln!(output, "FN:{},{name}", func.line);
            }
            for (name, func) in functions {
                let _ = writeln!(output, "FNDA:{},{name}", func.hits);
            }
            let functions_hit = functions.values().filter(|f| f.hits > 0).count();
            let _ = writeln!(output, "FNF:{}", functions.len());
            let _ = writeln!(output, "FNH:{functions_hit}");

            for (branch, hits) in coverage.branches() {
                let _ = writeln!(
                    output,
                    "BRDA:{},{},{},{hits}",
                    branch.line, branch.block, branch.branch
                );
            }
            if !coverage.branches().is_empty() {
                let _ = writeln!(output, "BRF:{}", coverage.total_branches());
                let _ = writeln!(output, "BRH:{}", coverage.covered_branches());
            }

            for (line, hits) in coverage.lines() {
                let _ = writeln!(output, "DA:{line},{hits}");
            }
            let _ = writeln!(output, "LF:{}", coverage.total_lines());
            let _ = writeln!(output, "LH:{}", coverage.covered_lines());

            output.push_str("end_of_record\n");
        }

        output
    }

    /// Save the LCOV report to a file
    ///
    /// # Errors
    ///
    /// Returns error if file write fails
    pub fn save(&self, path: &Path) -> FuzzcovResult<()> {
        publish_bytes(path, self.generate().as_bytes())
    }
}
