//! Report Navigation Patcher
//!
//! Adds deep-linking to a rendered report: when the page is opened (or the
//! fragment changes) with `#<path>`, the file selector is set to `<path>` and
//! a synthetic `change` event shows that file, exactly as if the user had
//! picked it.
//!
//! The patch is idempotent. The inserted script carries a fixed id that acts
//! as the marker; a document that already contains it is left untouched.

use super::html::DocumentHook;
use super::outline::{Outline, TagKind};
use crate::publish::publish_bytes;
use crate::result::{FuzzcovError, FuzzcovResult};
use std::path::Path;

/// Id of the inserted script element, also the idempotence marker
pub const NAVIGATION_MARKER_ID: &str = "fuzzcov-navigation";

/// Id of the file selector the script drives
pub const FILE_SELECTOR_ID: &str = "file-selector";

/// The navigation script, inserted just before `</body>`.
///
/// Without a URL fragment it does nothing.
pub const NAVIGATION_SCRIPT: &str = r#"<script id="fuzzcov-navigation">
(function () {
  function selectFromFragment() {
    if (!window.location.hash || window.location.hash.length < 2) {
      return;
    }
    var id;
    try {
      id = decodeURIComponent(window.location.hash.substring(1));
    } catch (e) {
      return;
    }
    var selector = document.getElementById('file-selector');
    if (!selector) {
      return;
    }
    for (var i = 0; i < selector.options.length; i++) {
      if (selector.options[i].value === id) {
        selector.value = id;
        selector.dispatchEvent(new Event('change'));
        return;
      }
    }
  }
  window.addEventListener('load', selectFromFragment);
  window.addEventListener('hashchange', selectFromFragment);
})();
</script>
"#;

/// Result of a patch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The script was inserted; holds the new document
    Patched(String),
    /// The marker was already present; nothing changed
    AlreadyPatched,
}

impl PatchOutcome {
    /// Whether the document was changed
    #[must_use]
    pub const fn is_patched(&self) -> bool {
        matches!(self, Self::Patched(_))
    }
}

/// Inserts [`NAVIGATION_SCRIPT`] into well-formed report documents
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationPatcher;

impl NavigationPatcher {
    /// Create a patcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Patch a document in memory.
    ///
    /// Refuses documents that are not well-formed or whose `</body>` anchor
    /// is missing or duplicated.
    pub fn patch(&self, document: &str) -> FuzzcovResult<PatchOutcome> {
        let outline = Outline::parse(document);
        let validation = outline.validate();
        if !validation.is_valid() {
            return Err(FuzzcovError::patch_refused(format!(
                "document is not well-formed: {}",
                validation.errors.join("; ")
            )));
        }

        let anchors: Vec<_> = outline.find("body", TagKind::End).collect();
        let anchor = match anchors.as_slice() {
            [anchor] => *anchor,
            [] => return Err(FuzzcovError::patch_refused("no </body> anchor")),
            many => {
                return Err(FuzzcovError::patch_refused(format!(
                    "{} </body> anchors, expected one",
                    many.len()
                )))
            }
        };

        if outline
            .element_with_id("script", NAVIGATION_MARKER_ID)
            .is_some()
        {
            tracing::debug!("navigation script already present");
            return Ok(PatchOutcome::AlreadyPatched);
        }

        let mut patched = String::with_capacity(document.len() + NAVIGATION_SCRIPT.len());
        patched.push_str(&document[..anchor.start]);
        patched.push_str(NAVIGATION_SCRIPT);
        patched.push_str(&document[anchor.start..]);

        let revalidation = Outline::parse(&patched).validate();
        if !revalidation.is_valid() {
            return Err(FuzzcovError::patch_refused(format!(
                "patched document is not well-formed: {}",
                revalidation.errors.join("; ")
            )));
        }
        Ok(PatchOutcome::Patched(patched))
    }

    /// Patch a document file in place.
    ///
    /// The file is replaced atomically; on refusal or when already patched
    /// it is not touched.
    pub fn patch_file(&self, path: &Path) -> FuzzcovResult<PatchOutcome> {
        let document = std::fs::read_to_string(path)?;
        let outcome = self.patch(&document)?;
        if let PatchOutcome::Patched(patched) = &outcome {
            publish_bytes(path, patched.as_bytes())?;
            tracing::info!(path = %path.display(), "navigation patch applied");
        }
        Ok(outcome)
    }
}

/// Generator hook that renders the navigation script into new reports
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationHook;

impl DocumentHook for NavigationHook {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn body_end(&self) -> Option<String> {
        Some(NAVIGATION_SCRIPT.to_string())
    }
}
