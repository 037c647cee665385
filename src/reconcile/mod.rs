//! Edit reconciliation: turning a successful answer into a buffer edit.
//!
//! Two flows exist:
//! - [`review_then_apply`] parks the extracted code in a [`PendingSlot`]
//!   and shows the answer; a later [`apply_pending`] performs the edit.
//! - [`confirm_then_apply`] asks inline and edits immediately on "yes".
//!
//! Both consume the [`TrackedRegion`] captured at request time and always
//! release it, whichever way the flow ends.

pub mod extract;
pub mod pending;

use tracing::{debug, info};

use crate::editor::{EditorHost, TrackedRegion};
use crate::{AppError, Result};

pub use extract::{extract_code, match_trailing_newline};
pub use pending::{PendingEdit, PendingSlot};

/// Prompt used by [`confirm_then_apply`].
pub const CONFIRM_PROMPT: &str = "Apply the suggested fix?";

/// Stash the answer's code for a later apply and show the answer.
///
/// `original` is the region's text at request time. An edit already in the
/// slot is displaced and its region released.
pub fn review_then_apply<H: EditorHost + ?Sized>(
    host: &mut H,
    slot: &PendingSlot,
    answer: &str,
    original: &str,
    region: TrackedRegion,
    apply_hint: &str,
) {
    let code = match_trailing_newline(original, extract_code(answer));
    debug!(code_len = code.len(), "proposal stored for review");

    if let Some(displaced) = slot.replace(PendingEdit { code, region }) {
        debug!("displacing earlier pending edit");
        host.release_region(displaced.region);
    }

    host.show_panel(&format!("{}\n\n{apply_hint}", answer.trim_end()));
}

/// Apply the pending edit, clearing the slot.
///
/// # Errors
///
/// - `AppError::ApplyPrecondition` when nothing is pending or the target
///   document is gone. The slot is cleared in the latter case too.
/// - Any error from [`EditorHost::replace_tracked_region`].
pub fn apply_pending<H: EditorHost + ?Sized>(host: &mut H, slot: &PendingSlot) -> Result<()> {
    let Some(edit) = slot.take() else {
        return Err(AppError::ApplyPrecondition(
            "no pending changes to apply".into(),
        ));
    };

    let PendingEdit { code, region } = edit;
    let applied = host.replace_tracked_region(&region, &code);
    host.release_region(region);
    applied?;

    info!(code_len = code.len(), "pending edit applied");
    Ok(())
}

/// Ask whether to apply the answer's code and do so on "yes".
///
/// On "no" the full answer is shown instead. Returns whether the edit was
/// applied.
///
/// # Errors
///
/// Returns any error from [`EditorHost::replace_tracked_region`].
pub fn confirm_then_apply<H: EditorHost + ?Sized>(
    host: &mut H,
    answer: &str,
    original: &str,
    region: TrackedRegion,
) -> Result<bool> {
    let code = match_trailing_newline(original, extract_code(answer));

    if !host.confirm(CONFIRM_PROMPT) {
        host.release_region(region);
        host.show_panel(answer);
        return Ok(false);
    }

    let applied = host.replace_tracked_region(&region, &code);
    host.release_region(region);
    applied?;

    info!(code_len = code.len(), "fix applied");
    Ok(true)
}
