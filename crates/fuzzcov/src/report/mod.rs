//! Report Generator and Report Navigation Patcher
//!
//! Reports are regenerated from the merged model on every pass and replace
//! the previous report atomically. Deep-linking is layered on by the
//! navigation patcher, either as a generator hook or on an existing
//! document.

mod html;
mod navigation;
mod outline;
mod summary;

pub use html::{escape, validate_document, DocumentHook, ReportGenerator};
pub use navigation::{
    NavigationHook, NavigationPatcher, PatchOutcome, FILE_SELECTOR_ID, NAVIGATION_MARKER_ID,
    NAVIGATION_SCRIPT,
};
pub use outline::{Outline, OutlineValidation, Tag, TagKind};
pub use summary::{CoverageSummary, FileSummary, Ratio};
