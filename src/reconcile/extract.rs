//! Code payload extraction from a tool answer.

/// Fence marker recognised at the start of a (trimmed) line.
pub const FENCE: &str = "```";

/// Extract the code the answer proposes.
///
/// Every line starting with [`FENCE`] toggles an "inside" flag; lines seen
/// while inside are collected, so several blocks are concatenated in order.
/// Blank lines at the very start and end of the collected code are dropped.
///
/// An answer with no fence at all is returned whole, trimmed.
#[must_use]
pub fn extract_code(answer: &str) -> String {
    let mut inside = false;
    let mut saw_fence = false;
    let mut lines: Vec<&str> = Vec::new();

    for line in answer.lines() {
        if line.trim_start().starts_with(FENCE) {
            inside = !inside;
            saw_fence = true;
        } else if inside {
            lines.push(line);
        }
    }

    if !saw_fence {
        return answer.trim().to_owned();
    }

    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// Keep a whole-line selection whole after replacement.
///
/// If `original` ended with a newline and `code` does not, one is appended.
#[must_use]
pub fn match_trailing_newline(original: &str, mut code: String) -> String {
    if original.ends_with('\n') && !code.ends_with('\n') {
        code.push('\n');
    }
    code
}
