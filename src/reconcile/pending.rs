//! Pending Apply Slot: at most one proposed edit awaiting confirmation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::editor::{DocumentId, TrackedRegion};

/// A proposed replacement for a tracked region.
#[derive(Debug)]
pub struct PendingEdit {
    /// Code that will replace the region.
    pub code: String,
    /// Region captured when the request was made.
    pub region: TrackedRegion,
}

impl PendingEdit {
    /// Document the edit targets.
    #[must_use]
    pub fn document(&self) -> DocumentId {
        self.region.document()
    }
}

/// Last-writer-wins cell holding the pending edit.
///
/// Cheap to clone; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct PendingSlot {
    inner: Arc<Mutex<Option<PendingEdit>>>,
}

impl PendingSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PendingEdit>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `edit`, returning the edit it displaced.
    ///
    /// The caller owns the displaced edit's region and must release it.
    #[must_use]
    pub fn replace(&self, edit: PendingEdit) -> Option<PendingEdit> {
        self.lock().replace(edit)
    }

    /// Remove and return the pending edit.
    #[must_use]
    pub fn take(&self) -> Option<PendingEdit> {
        self.lock().take()
    }

    /// Whether no edit is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Document targeted by the pending edit, if any.
    #[must_use]
    pub fn document(&self) -> Option<DocumentId> {
        self.lock().as_ref().map(PendingEdit::document)
    }
}
