//! Prompt templates for the editor commands.

use crate::models::Message;

const GENERAL_SYSTEM: &str = "You are a programming assistant embedded in a text editor. \
Answer concisely and use fenced code blocks for code.";

const CODE_ONLY_SYSTEM: &str = "You are a programming assistant embedded in a text editor. \
Reply with exactly one fenced code block containing the complete replacement for the code \
you were given, followed by at most a few sentences of explanation.";

/// A free-form question.
#[must_use]
pub fn ask(question: &str) -> Vec<Message> {
    vec![Message::system(GENERAL_SYSTEM), Message::user(question)]
}

/// Explain a selected range.
#[must_use]
pub fn explain(language: &str, code: &str, first_line: usize, last_line: usize) -> Vec<Message> {
    vec![
        Message::system(GENERAL_SYSTEM),
        Message::user(format!(
            "Explain what the following {language} code (lines {first_line}-{last_line}) does.\n\n{}",
            fenced(language, code)
        )),
    ]
}

/// Rewrite a selected range according to `instruction`.
#[must_use]
pub fn refactor(language: &str, code: &str, instruction: &str) -> Vec<Message> {
    vec![
        Message::system(CODE_ONLY_SYSTEM),
        Message::user(format!(
            "Refactor the following {language} code. {instruction}\n\n{}",
            fenced(language, code)
        )),
    ]
}

/// Find and fix a bug in a selected range.
#[must_use]
pub fn fix(language: &str, code: &str, description: Option<&str>) -> Vec<Message> {
    let symptom = description.map_or_else(String::new, |text| format!(" Observed problem: {text}"));
    vec![
        Message::system(CODE_ONLY_SYSTEM),
        Message::user(format!(
            "Find and fix the bug in the following {language} code.{symptom}\n\n{}",
            fenced(language, code)
        )),
    ]
}

fn fenced(language: &str, code: &str) -> String {
    format!("```{language}\n{}\n```", code.trim_end_matches('\n'))
}
