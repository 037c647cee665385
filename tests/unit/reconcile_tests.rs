//! Unit tests for the edit reconciler flows against the in-memory editor.

use editor_assist::editor::memory::MemoryEditor;
use editor_assist::editor::{DocumentId, EditorHost, Selection};
use editor_assist::reconcile::{
    apply_pending, confirm_then_apply, extract_code, review_then_apply, PendingSlot,
    CONFIRM_PROMPT,
};
use editor_assist::AppError;

const SOURCE: &str = "fn a() {}\nfn b() { bug }\nfn c() {}\n";
const HINT: &str = "Press a to apply.";

fn editor_with_selection() -> (MemoryEditor, DocumentId, Selection) {
    let mut editor = MemoryEditor::new();
    let doc = editor.open("lib.rs", "rust", SOURCE);
    editor.select_lines(doc, 2, 2).expect("valid range");
    let selection = editor.selected_range().expect("selection");
    (editor, doc, selection)
}

// ── Extraction ──────────────────────────────────────────────────────────────

#[test]
fn single_fenced_block_is_returned_unchanged() {
    let code = "fn b() {\n    fixed\n}";
    let answer = format!("Sure.\n```rust\n\n{code}\n\n```\nThat should do it.");

    assert_eq!(extract_code(&answer), code);
}

#[test]
fn answer_without_fence_is_trimmed_whole() {
    assert_eq!(extract_code("  fn b() { fixed }\n\n"), "fn b() { fixed }");
}

#[test]
fn indented_fence_markers_still_toggle() {
    let answer = "Steps:\n  ```\n  x\n  ```\n";
    assert_eq!(extract_code(answer), "  x");
}

// ── Review-then-apply ───────────────────────────────────────────────────────

#[test]
fn review_stores_code_and_shows_annotated_answer() {
    let (mut editor, doc, selection) = editor_with_selection();
    let slot = PendingSlot::new();
    let answer = "Here:\n```rust\nfn b() { fixed }\n```\n";

    review_then_apply(
        &mut editor,
        &slot,
        answer,
        &selection.text,
        selection.region,
        HINT,
    );

    assert_eq!(slot.document(), Some(doc));
    assert_eq!(editor.panel(), format!("{}\n\n{HINT}", answer.trim_end()));
    assert_eq!(editor.text(doc).unwrap(), SOURCE, "review must not edit");
}

#[test]
fn apply_replaces_region_releases_markers_and_clears_slot() {
    let (mut editor, doc, selection) = editor_with_selection();
    let slot = PendingSlot::new();
    review_then_apply(
        &mut editor,
        &slot,
        "```\nfn b() { fixed }\n```",
        &selection.text,
        selection.region,
        HINT,
    );

    apply_pending(&mut editor, &slot).expect("apply succeeds");

    assert_eq!(
        editor.text(doc).unwrap(),
        "fn a() {}\nfn b() { fixed }\nfn c() {}\n",
        "the selection's trailing newline is preserved"
    );
    assert!(slot.is_empty());
    assert_eq!(editor.marker_count(doc), 0);
}

#[test]
fn apply_targets_region_after_intervening_edits() {
    let (mut editor, doc, selection) = editor_with_selection();
    let slot = PendingSlot::new();
    review_then_apply(
        &mut editor,
        &slot,
        "fn b() { fixed }",
        &selection.text,
        selection.region,
        HINT,
    );

    editor.edit(doc, 0..0, "use std::fmt;\n").expect("user edit");
    apply_pending(&mut editor, &slot).expect("apply succeeds");

    assert_eq!(
        editor.text(doc).unwrap(),
        "use std::fmt;\nfn a() {}\nfn b() { fixed }\nfn c() {}\n"
    );
}

#[test]
fn apply_with_empty_slot_is_a_precondition_error() {
    let mut editor = MemoryEditor::new();
    let slot = PendingSlot::new();

    let err = apply_pending(&mut editor, &slot).expect_err("nothing pending");

    assert!(matches!(err, AppError::ApplyPrecondition(ref msg) if msg.contains("no pending")));
}

#[test]
fn apply_after_document_closed_reports_and_clears_slot() {
    let (mut editor, doc, selection) = editor_with_selection();
    let slot = PendingSlot::new();
    review_then_apply(
        &mut editor,
        &slot,
        "x",
        &selection.text,
        selection.region,
        HINT,
    );
    editor.close(doc);

    let err = apply_pending(&mut editor, &slot).expect_err("document is gone");

    assert!(matches!(err, AppError::ApplyPrecondition(_)));
    assert!(slot.is_empty(), "a failed apply must not leave a stale edit");
}

#[test]
fn second_review_displaces_first_and_releases_its_region() {
    let mut editor = MemoryEditor::new();
    let doc = editor.open("lib.rs", "rust", SOURCE);
    let slot = PendingSlot::new();

    editor.select_lines(doc, 1, 1).expect("valid range");
    let first = editor.selected_range().expect("selection");
    review_then_apply(&mut editor, &slot, "one", &first.text, first.region, HINT);

    editor.select_lines(doc, 3, 3).expect("valid range");
    let second = editor.selected_range().expect("selection");
    review_then_apply(&mut editor, &slot, "three", &second.text, second.region, HINT);

    assert_eq!(editor.marker_count(doc), 2, "only the newest region is tracked");
    apply_pending(&mut editor, &slot).expect("apply succeeds");
    assert_eq!(
        editor.text(doc).unwrap(),
        "fn a() {}\nfn b() { bug }\nthree\n"
    );
}

// ── Confirm-then-apply ──────────────────────────────────────────────────────

#[test]
fn confirmed_fix_is_applied_immediately() {
    let (mut editor, doc, selection) = editor_with_selection();
    editor.queue_confirm(true);

    let applied = confirm_then_apply(
        &mut editor,
        "```rust\nfn b() { fixed }\n```",
        &selection.text,
        selection.region,
    )
    .expect("apply succeeds");

    assert!(applied);
    assert_eq!(editor.confirm_prompts(), [CONFIRM_PROMPT]);
    assert_eq!(
        editor.text(doc).unwrap(),
        "fn a() {}\nfn b() { fixed }\nfn c() {}\n"
    );
    assert_eq!(editor.marker_count(doc), 0);
}

#[test]
fn declined_fix_shows_answer_and_leaves_buffer() {
    let (mut editor, doc, selection) = editor_with_selection();
    editor.queue_confirm(false);
    let answer = "```rust\nfn b() { fixed }\n```";

    let applied =
        confirm_then_apply(&mut editor, answer, &selection.text, selection.region).expect("ok");

    assert!(!applied);
    assert_eq!(editor.panel(), answer);
    assert_eq!(editor.text(doc).unwrap(), SOURCE);
    assert_eq!(editor.marker_count(doc), 0);
}

#[test]
fn confirmed_fix_on_closed_document_is_an_error() {
    let (mut editor, doc, selection) = editor_with_selection();
    editor.queue_confirm(true);
    editor.close(doc);

    let err = confirm_then_apply(&mut editor, "x", &selection.text, selection.region)
        .expect_err("document is gone");

    assert!(matches!(err, AppError::ApplyPrecondition(_)));
}
