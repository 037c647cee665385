//! Editor host collaborator interface.
//!
//! The assistant never touches buffer internals directly. Everything it
//! needs from the editor goes through [`EditorHost`]: reading the selected
//! range, replacing a tracked region, and the panel, status-line, and
//! confirmation surfaces.

pub mod file_store;
pub mod memory;
pub mod terminal;

use crate::Result;

/// Identifier of one open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(pub u64);

/// Identifier of one position marker inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

/// A document range whose bounds move with edits.
///
/// Deliberately not `Clone`: a region is consumed at most once and must be
/// handed back through [`EditorHost::release_region`] so the host can drop
/// its markers.
#[derive(Debug, PartialEq, Eq)]
pub struct TrackedRegion {
    document: DocumentId,
    start: MarkerId,
    end: MarkerId,
}

impl TrackedRegion {
    /// Build a region from host-allocated markers.
    #[must_use]
    pub fn new(document: DocumentId, start: MarkerId, end: MarkerId) -> Self {
        Self {
            document,
            start,
            end,
        }
    }

    /// Document the region belongs to.
    #[must_use]
    pub fn document(&self) -> DocumentId {
        self.document
    }

    /// Marker at the start of the region.
    #[must_use]
    pub fn start(&self) -> MarkerId {
        self.start
    }

    /// Marker at the end of the region.
    #[must_use]
    pub fn end(&self) -> MarkerId {
        self.end
    }
}

/// Selected text captured at request time.
#[derive(Debug)]
pub struct Selection {
    /// Text inside the region when it was captured.
    pub text: String,
    /// Tracked bounds of the selection.
    pub region: TrackedRegion,
    /// 1-based line number of the first selected line.
    pub first_line: usize,
    /// 1-based line number of the last selected line.
    pub last_line: usize,
}

/// Operations the assistant consumes from the host editor.
pub trait EditorHost {
    /// Capture the active selection as a tracked region, if there is one.
    fn selected_range(&mut self) -> Option<Selection>;

    /// Language tag of the current document (for example `rust`).
    fn language_tag(&self) -> String;

    /// Replace the region's current contents with `text`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ApplyPrecondition` when the region's document no
    /// longer exists, or `AppError::Editor` when the markers are invalid.
    fn replace_tracked_region(&mut self, region: &TrackedRegion, text: &str) -> Result<()>;

    /// Stop tracking `region`.
    fn release_region(&mut self, region: TrackedRegion);

    /// Replace the panel contents with `text` and make it visible.
    fn show_panel(&mut self, text: &str);

    /// Append `text` to the panel.
    fn append_to_panel(&mut self, text: &str);

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;

    /// Show a short status message.
    fn message(&mut self, text: &str);
}
