//! HTML report rendering
//!
//! One self-contained document per project: a header with aggregate
//! numbers, a `<select id="file-selector">` listing every file by its
//! canonical path, and one `<section>` per file. Selecting a file shows its
//! section and hides the others.

use super::navigation::FILE_SELECTOR_ID;
use super::outline::Outline;
use crate::coverage::{percent, FileCoverage, MergedCoverageModel};
use crate::publish::publish_validated;
use crate::result::{FuzzcovError, FuzzcovResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

/// Extension point for report documents.
///
/// Hooks contribute raw fragments at the end of `<head>` and the end of
/// `<body>`. Fragments must be well-formed; the rendered document is
/// validated before it is returned.
pub trait DocumentHook: Send + Sync {
    /// Hook name for logs
    fn name(&self) -> &'static str;

    /// Fragment appended to `<head>`
    fn head_end(&self) -> Option<String> {
        None
    }

    /// Fragment appended to `<body>`
    fn body_end(&self) -> Option<String> {
        None
    }
}

const STYLE: &str = r"<style>
body { font-family: sans-serif; margin: 1.5em; }
table.lines { border-collapse: collapse; font-family: monospace; }
table.lines td { padding: 0 0.6em; white-space: pre; }
tr.hit td.count { background: #c8f0c8; }
tr.miss td.count { background: #f6c6c6; }
td.count, td.line { text-align: right; color: #555; }
</style>
";

const SELECTOR_SCRIPT: &str = r"<script id='fuzzcov-selector'>
(function () {
  var selector = document.getElementById('file-selector');
  if (!selector) {
    return;
  }
  selector.addEventListener('change', function () {
    var sections = document.querySelectorAll('section.file');
    for (var i = 0; i < sections.length; i++) {
      sections[i].hidden = sections[i].getAttribute('data-path') !== selector.value;
    }
  });
})();
</script>
";

/// Renders a [`MergedCoverageModel`] as an HTML document
#[derive(Default)]
pub struct ReportGenerator {
    hooks: Vec<Box<dyn DocumentHook>>,
    source_root: Option<PathBuf>,
    generated_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field(
                "hooks",
                &self.hooks.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("source_root", &self.source_root)
            .field("generated_at", &self.generated_at)
            .finish()
    }
}

impl ReportGenerator {
    /// Create a generator with no hooks
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document hook; hooks run in registration order
    #[must_use]
    pub fn with_hook(mut self, hook: impl DocumentHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Render source text from this directory when the file exists there
    #[must_use]
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    /// Fix the timestamp shown in the document (defaults to now)
    #[must_use]
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Render the document
    pub fn render(&self, model: &MergedCoverageModel) -> FuzzcovResult<String> {
        let title = format!("Coverage report: {}", escape(model.project()));
        let generated_at = self
            .generated_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        doc.push_str("<meta charset=\"utf-8\">\n");
        doc.push_str(
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
        );
        let _ = writeln!(doc, "<title>{title}</title>");
        doc.push_str(STYLE);
        for hook in &self.hooks {
            if let Some(fragment) = hook.head_end() {
                doc.push_str(&fragment);
            }
        }
        doc.push_str("</head>\n<body>\n");

        let _ = writeln!(doc, "<h1>{title}</h1>");
        let _ = writeln!(
            doc,
            "<p class=\"totals\">Lines: {} ({})</p>",
            ratio(model.covered_line_count(), model.total_lines()),
            format_percent(model.covered_line_count(), model.total_lines()),
        );
        let targets: Vec<_> = model.targets().iter().map(|t| escape(t.as_str())).collect();
        let _ = writeln!(
            doc,
            "<p class=\"targets\">Targets ({}): {}</p>",
            targets.len(),
            targets.join(", ")
        );
        let _ = writeln!(doc, "<p class=\"generated\">Generated {generated_at}</p>");

        let _ = writeln!(doc, "<select id=\"{FILE_SELECTOR_ID}\">");
        for (path, file) in model.files() {
            let path = escape(path);
            let _ = writeln!(
                doc,
                "<option value=\"{path}\">{path} ({})</option>",
                format_percent(file.covered_lines(), file.total_lines())
            );
        }
        doc.push_str("</select>\n");

        for (idx, (path, file)) in model.files().iter().enumerate() {
            self.render_file(&mut doc, path, file, idx == 0);
        }

        doc.push_str(SELECTOR_SCRIPT);
        for hook in &self.hooks {
            if let Some(fragment) = hook.body_end() {
                doc.push_str(&fragment);
            }
        }
        doc.push_str("</body>\n</html>\n");

        let validation = Outline::parse(&doc).validate();
        if !validation.is_valid() {
            return Err(FuzzcovError::render(validation.errors.join("; ")));
        }
        Ok(doc)
    }

    /// Render and atomically write the document
    pub fn write(&self, model: &MergedCoverageModel, path: &Path) -> FuzzcovResult<()> {
        let doc = self.render(model)?;
        publish_validated(path, &doc, validate_document)
    }

    fn render_file(&self, doc: &mut String, path: &str, file: &FileCoverage, visible: bool) {
        let escaped = escape(path);
        let hidden = if visible { "" } else { " hidden" };
        let _ = writeln!(
            doc,
            "<section class=\"file\" data-path=\"{escaped}\"{hidden}>"
        );
        let _ = write!(
            doc,
            "<h2>{escaped}</h2>\n<p>Lines: {}",
            ratio(file.covered_lines(), file.total_lines())
        );
        if file.total_branches() > 0 {
            let _ = write!(
                doc,
                " Branches: {}",
                ratio(file.covered_branches(), file.total_branches())
            );
        }
        doc.push_str("</p>\n<table class=\"lines\">\n");

        match self.source_text(path) {
            Some(source) => {
                for (idx, text) in source.lines().enumerate() {
                    let line = u32::try_from(idx + 1).unwrap_or(u32::MAX);
                    line_row(doc, line, file.line_hits(line), text);
                }
            }
            None => {
                for (&line, &hits) in file.lines() {
                    line_row(doc, line, Some(hits), "");
                }
            }
        }
        doc.push_str("</table>\n</section>\n");
    }

    fn source_text(&self, path: &str) -> Option<String> {
        let root = self.source_root.as_ref()?;
        let relative = Path::new(path);
        // Paths outside the source tree are never read
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        {
            tracing::debug!(path, "source path escapes the source root, not rendered");
            return None;
        }
        let full = root.join(relative);
        match std::fs::read_to_string(&full) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!(path = %full.display(), error = %e, "source not available");
                None
            }
        }
    }
}

fn line_row(doc: &mut String, line: u32, hits: Option<u64>, text: &str) {
    let (class, count) = match hits {
        Some(0) => (" class=\"miss\"", "0".to_string()),
        Some(n) => (" class=\"hit\"", n.to_string()),
        None => ("", String::new()),
    };
    let _ = writeln!(
        doc,
        "<tr{class}><td class=\"line\">{line}</td><td class=\"count\">{count}</td><td>{}</td></tr>",
        escape(text)
    );
}

fn ratio(covered: usize, total: usize) -> String {
    format!("{covered}/{total}")
}

fn format_percent(covered: usize, total: usize) -> String {
    format!("{:.2}%", percent(covered, total))
}

/// Structural check applied before a document is published
pub fn validate_document(document: &str) -> FuzzcovResult<()> {
    let validation = Outline::parse(document).validate();
    if validation.is_valid() {
        Ok(())
    } else {
        Err(FuzzcovError::render(validation.errors.join("; ")))
    }
}

/// Escape text for HTML content and attribute values
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
