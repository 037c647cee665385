//! Terminal-backed editor host for the CLI.
//!
//! Buffer operations are delegated to a [`MemoryEditor`]; the panel and
//! status messages are written to `output`, and confirmations are read as
//! `y`/`yes` lines from `input`.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::editor::memory::MemoryEditor;
use crate::editor::{EditorHost, Selection, TrackedRegion};
use crate::Result;

/// Editor host that talks to a terminal.
#[derive(Debug)]
pub struct TerminalHost<R, W> {
    editor: MemoryEditor,
    input: R,
    output: W,
    assume_yes: bool,
}

impl<R: BufRead, W: Write> TerminalHost<R, W> {
    /// Wrap `editor`; with `assume_yes` every confirmation answers yes.
    pub fn new(editor: MemoryEditor, input: R, output: W, assume_yes: bool) -> Self {
        Self {
            editor,
            input,
            output,
            assume_yes,
        }
    }

    /// Underlying buffer store.
    pub fn editor(&self) -> &MemoryEditor {
        &self.editor
    }

    /// Mutable access to the underlying buffer store.
    pub fn editor_mut(&mut self) -> &mut MemoryEditor {
        &mut self.editor
    }

    /// Consume the host, returning its output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn emit(&mut self, text: &str) {
        let written = self
            .output
            .write_all(text.as_bytes())
            .and_then(|()| self.output.flush());
        if let Err(err) = written {
            debug!(%err, "terminal write failed");
        }
    }
}

impl<R: BufRead, W: Write> EditorHost for TerminalHost<R, W> {
    fn selected_range(&mut self) -> Option<Selection> {
        self.editor.selected_range()
    }

    fn language_tag(&self) -> String {
        self.editor.language_tag()
    }

    fn replace_tracked_region(&mut self, region: &TrackedRegion, text: &str) -> Result<()> {
        self.editor.replace_tracked_region(region, text)
    }

    fn release_region(&mut self, region: TrackedRegion) {
        self.editor.release_region(region);
    }

    fn show_panel(&mut self, text: &str) {
        self.editor.show_panel(text);
        self.emit(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.emit("\n");
        }
    }

    fn append_to_panel(&mut self, text: &str) {
        self.editor.append_to_panel(text);
        self.emit(text);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            self.emit(&format!("{prompt} [y/N] y\n"));
            return true;
        }

        self.emit(&format!("{prompt} [y/N] "));
        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(err) => {
                debug!(%err, "confirmation read failed, treating as no");
                false
            }
        }
    }

    fn message(&mut self, text: &str) {
        self.editor.message(text);
        self.emit(&format!("{text}\n"));
    }
}
