//! In-memory editor host.
//!
//! Holds any number of documents with position markers that follow edits,
//! plus a panel, a status-message log, and scripted confirmation answers.
//! The CLI loads files into it and the test suite drives it directly.
//!
//! # Marker movement
//!
//! When `range` is replaced by text of length `n`:
//! - a marker before `range.start` stays put;
//! - a marker at or after `range.end` shifts by `n - range.len()`;
//! - a marker strictly inside the range collapses to `range.start`.
//!
//! A pure insertion (`range.start == range.end`) exactly at a marker is the
//! one case decided by the marker's `Insertion` kind. A region's start
//! marker advances past the new text and its end marker stays put, so text
//! typed at either edge of a region lands outside it.

use std::collections::{HashMap, VecDeque};
use std::ops::Range;

use tracing::debug;

use crate::editor::{DocumentId, EditorHost, MarkerId, Selection, TrackedRegion};
use crate::{AppError, Result};

/// How a marker reacts to text inserted exactly at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Insertion {
    /// Move past the inserted text.
    Advance,
    /// Keep the position; the text lands after the marker.
    Stay,
}

#[derive(Debug, Clone, Copy)]
struct Marker {
    pos: usize,
    insertion: Insertion,
}

#[derive(Debug)]
struct Document {
    name: String,
    language: String,
    text: String,
    markers: HashMap<MarkerId, Marker>,
    selection: Option<Range<usize>>,
}

impl Marker {
    fn start(pos: usize) -> Self {
        Self {
            pos,
            insertion: Insertion::Advance,
        }
    }

    fn end(pos: usize) -> Self {
        Self {
            pos,
            insertion: Insertion::Stay,
        }
    }
}

impl Document {
    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        let valid = range.start <= range.end
            && range.end <= self.text.len()
            && self.text.is_char_boundary(range.start)
            && self.text.is_char_boundary(range.end);
        if valid {
            Ok(())
        } else {
            Err(AppError::Editor(format!(
                "invalid range {}..{} in {}",
                range.start, range.end, self.name
            )))
        }
    }

    fn edit(&mut self, range: Range<usize>, replacement: &str) -> Result<()> {
        self.check_range(&range)?;
        self.text.replace_range(range.clone(), replacement);

        let removed = range.end - range.start;
        for marker in self.markers.values_mut() {
            let pure_insert_here = removed == 0 && marker.pos == range.start;
            if pure_insert_here && marker.insertion == Insertion::Stay {
                continue;
            }
            if marker.pos >= range.end {
                marker.pos = marker.pos - removed + replacement.len();
            } else if marker.pos > range.start {
                marker.pos = range.start;
            }
        }
        // Any edit invalidates the remembered selection.
        self.selection = None;
        Ok(())
    }

    fn line_of(&self, offset: usize) -> usize {
        self.text[..offset].matches('\n').count() + 1
    }
}

/// Multi-document editor kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    documents: HashMap<DocumentId, Document>,
    current: Option<DocumentId>,
    next_id: u64,
    panel: String,
    messages: Vec<String>,
    confirm_answers: VecDeque<bool>,
    confirm_prompts: Vec<String>,
}

impl MemoryEditor {
    /// Create an editor with no documents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn document(&self, id: DocumentId) -> Result<&Document> {
        self.documents
            .get(&id)
            .ok_or_else(|| AppError::Editor(format!("no such document: {}", id.0)))
    }

    fn document_mut(&mut self, id: DocumentId) -> Result<&mut Document> {
        self.documents
            .get_mut(&id)
            .ok_or_else(|| AppError::Editor(format!("no such document: {}", id.0)))
    }

    /// Open a document and make it current.
    pub fn open(
        &mut self,
        name: impl Into<String>,
        language: impl Into<String>,
        text: impl Into<String>,
    ) -> DocumentId {
        let id = DocumentId(self.allocate_id());
        self.documents.insert(
            id,
            Document {
                name: name.into(),
                language: language.into(),
                text: text.into(),
                markers: HashMap::new(),
                selection: None,
            },
        );
        self.current = Some(id);
        id
    }

    /// Close a document, dropping its markers. Returns `false` if unknown.
    pub fn close(&mut self, id: DocumentId) -> bool {
        if self.current == Some(id) {
            self.current = None;
        }
        self.documents.remove(&id).is_some()
    }

    /// Make `id` the current document.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` for an unknown document.
    pub fn set_current(&mut self, id: DocumentId) -> Result<()> {
        self.document(id)?;
        self.current = Some(id);
        Ok(())
    }

    /// Current contents of a document.
    #[must_use]
    pub fn text(&self, id: DocumentId) -> Option<&str> {
        self.documents.get(&id).map(|doc| doc.text.as_str())
    }

    /// Display name of a document.
    #[must_use]
    pub fn name(&self, id: DocumentId) -> Option<&str> {
        self.documents.get(&id).map(|doc| doc.name.as_str())
    }

    /// Select a byte range of `id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` for an unknown document or a range that is
    /// out of bounds or not on character boundaries.
    pub fn select(&mut self, id: DocumentId, range: Range<usize>) -> Result<()> {
        let doc = self.document_mut(id)?;
        doc.check_range(&range)?;
        doc.selection = Some(range);
        Ok(())
    }

    /// Select whole lines `first..=last` (1-based) of `id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` for an unknown document or lines outside
    /// the document.
    pub fn select_lines(&mut self, id: DocumentId, first: usize, last: usize) -> Result<()> {
        let doc = self.document(id)?;
        let starts: Vec<usize> = std::iter::once(0)
            .chain(doc.text.match_indices('\n').map(|(i, _)| i + 1))
            .filter(|&i| i < doc.text.len() || i == 0)
            .collect();

        if first == 0 || first > last || first > starts.len() {
            return Err(AppError::Editor(format!(
                "invalid line range {first}:{last} in {} ({} lines)",
                doc.name,
                starts.len()
            )));
        }

        let start = starts[first - 1];
        let end = starts.get(last).copied().unwrap_or(doc.text.len());
        self.select(id, start..end)
    }

    /// Replace `range` of `id`, moving markers as described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Editor` for an unknown document or invalid range.
    pub fn edit(&mut self, id: DocumentId, range: Range<usize>, replacement: &str) -> Result<()> {
        self.document_mut(id)?.edit(range, replacement)
    }

    /// Current offset of `marker` in `id`.
    #[must_use]
    pub fn marker_position(&self, id: DocumentId, marker: MarkerId) -> Option<usize> {
        self.documents.get(&id)?.markers.get(&marker).map(|m| m.pos)
    }

    /// Number of live markers in `id`.
    #[must_use]
    pub fn marker_count(&self, id: DocumentId) -> usize {
        self.documents.get(&id).map_or(0, |doc| doc.markers.len())
    }

    /// Text currently shown in the panel.
    #[must_use]
    pub fn panel(&self) -> &str {
        &self.panel
    }

    /// Status messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Queue the answer for the next [`EditorHost::confirm`] call.
    pub fn queue_confirm(&mut self, answer: bool) {
        self.confirm_answers.push_back(answer);
    }

    /// Prompts passed to [`EditorHost::confirm`], oldest first.
    #[must_use]
    pub fn confirm_prompts(&self) -> &[String] {
        &self.confirm_prompts
    }
}

impl EditorHost for MemoryEditor {
    fn selected_range(&mut self) -> Option<Selection> {
        let id = self.current?;
        let first_marker = MarkerId(self.allocate_id());
        let second_marker = MarkerId(self.allocate_id());

        let doc = self.documents.get_mut(&id)?;
        let range = doc.selection.clone()?;
        let text = doc.text[range.clone()].to_owned();
        let first_line = doc.line_of(range.start);
        let last_line = if range.end > range.start && doc.text[..range.end].ends_with('\n') {
            doc.line_of(range.end - 1)
        } else {
            doc.line_of(range.end)
        };

        doc.markers.insert(first_marker, Marker::start(range.start));
        doc.markers.insert(second_marker, Marker::end(range.end));

        Some(Selection {
            text,
            region: TrackedRegion::new(id, first_marker, second_marker),
            first_line,
            last_line,
        })
    }

    fn language_tag(&self) -> String {
        self.current
            .and_then(|id| self.documents.get(&id))
            .map_or_else(|| "text".to_owned(), |doc| doc.language.clone())
    }

    fn replace_tracked_region(&mut self, region: &TrackedRegion, text: &str) -> Result<()> {
        let Some(doc) = self.documents.get_mut(&region.document()) else {
            return Err(AppError::ApplyPrecondition(
                "the original document no longer exists".into(),
            ));
        };

        let (Some(start), Some(end)) = (
            doc.markers.get(&region.start()).map(|m| m.pos),
            doc.markers.get(&region.end()).map(|m| m.pos),
        ) else {
            return Err(AppError::Editor("region is no longer tracked".into()));
        };

        // An empty region with text typed into it has start past end; it is
        // still empty, sitting before that text.
        let range = if start <= end { start..end } else { end..end };
        doc.edit(range.clone(), text)?;
        doc.markers.insert(region.start(), Marker::start(range.start));
        doc.markers.insert(region.end(), Marker::end(range.start + text.len()));
        debug!(document = %doc.name, start = range.start, len = text.len(), "region replaced");
        Ok(())
    }

    fn release_region(&mut self, region: TrackedRegion) {
        if let Some(doc) = self.documents.get_mut(&region.document()) {
            doc.markers.remove(&region.start());
            doc.markers.remove(&region.end());
        }
    }

    fn show_panel(&mut self, text: &str) {
        self.panel.clear();
        self.panel.push_str(text);
    }

    fn append_to_panel(&mut self, text: &str) {
        self.panel.push_str(text);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.confirm_prompts.push(prompt.to_owned());
        self.confirm_answers.pop_front().unwrap_or(false)
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_owned());
    }
}
