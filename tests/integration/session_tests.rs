//! Integration tests for one `ProcessSession` against the mock tool.
//!
//! Each test spawns the real mock binary, writes a request to its stdin,
//! and checks the single resolved outcome.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use editor_assist::stream::accumulator::ResponseAccumulator;
use editor_assist::stream::session::ProcessSession;
use editor_assist::stream::spawner::resolve_executable;
use editor_assist::{Message, Outcome, Request};

use super::test_helpers::{mock_config, run_session, CapturingSink};

fn question() -> Vec<Message> {
    vec![Message::user("What is 2 + 2?")]
}

#[tokio::test]
async fn chunked_reply_accumulates_to_full_text() {
    let config = mock_config("reply", &["--reply", "Hello, world", "--chunk", "3"]);

    let outcome = run_session(&config, question(), None).await;

    assert_eq!(outcome, Some(Outcome::content("Hello, world", false)));
}

#[tokio::test]
async fn streaming_sink_sees_every_delta_in_order() {
    let config = mock_config("reply", &["--reply", "Hello, world", "--chunk", "5"]);
    let sink = CapturingSink::default();

    let outcome = run_session(&config, question(), Some(sink.clone())).await;

    assert_eq!(outcome, Some(Outcome::content("Hello, world", true)));
    assert_eq!(sink.prepared(), 1);
    assert_eq!(sink.deltas(), vec!["Hello", ", wor", "ld"]);
}

#[tokio::test]
async fn request_reaches_the_tool() {
    let config = mock_config("echo", &[]);

    let outcome = run_session(&config, vec![Message::user("ping \u{1f600}")], None).await;

    assert_eq!(outcome, Some(Outcome::content("ping \u{1f600}", false)));
}

#[tokio::test]
async fn in_band_error_wins_over_content_and_clean_exit() {
    let outcome = run_session(&mock_config("tool-error", &[]), question(), None).await;

    assert_eq!(outcome, Some(Outcome::error("rate limited")));
}

#[tokio::test]
async fn stderr_text_becomes_the_error() {
    let outcome = run_session(&mock_config("stderr-fail", &[]), question(), None).await;

    match outcome {
        Some(Outcome::Error(message)) => {
            assert!(message.contains("boom: model unavailable"), "got {message:?}");
        }
        other => panic!("expected error outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn silent_nonzero_exit_names_the_code() {
    let outcome = run_session(&mock_config("exit-code", &[]), question(), None).await;

    assert_eq!(
        outcome,
        Some(Outcome::error("tool process exited with code 2"))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn signal_termination_is_reported() {
    let outcome = run_session(&mock_config("signal", &[]), question(), None).await;

    assert_eq!(
        outcome,
        Some(Outcome::error("tool process terminated by signal 9"))
    );
}

#[tokio::test]
async fn unterminated_final_line_is_parsed() {
    let outcome = run_session(&mock_config("no-newline", &[]), question(), None).await;

    assert_eq!(outcome, Some(Outcome::content("head tail", false)));
}

#[tokio::test]
async fn malformed_lines_do_not_abort_the_stream() {
    let outcome = run_session(&mock_config("malformed", &[]), question(), None).await;

    assert_eq!(outcome, Some(Outcome::content("ok!", false)));
}

#[tokio::test]
async fn clean_exit_without_frames_is_empty_success() {
    let outcome = run_session(&mock_config("silent", &[]), question(), None).await;

    assert_eq!(outcome, Some(Outcome::content("", false)));
}

#[tokio::test]
async fn model_flag_is_appended_after_args() {
    let mut config = mock_config("args", &[]);
    config.model = Some("test-model".into());

    let outcome = run_session(&config, question(), None).await;

    assert_eq!(
        outcome,
        Some(Outcome::content(
            "--stdio --scenario args --model test-model",
            false
        ))
    );
}

#[tokio::test]
#[serial_test::serial]
async fn child_environment_is_limited_to_allowlist() {
    std::env::set_var("ANTHROPIC_API_KEY", "sk-test");
    std::env::set_var("EDITOR_ASSIST_UNRELATED_SECRET", "leak");

    let outcome = run_session(&mock_config("env", &[]), question(), None).await;

    std::env::remove_var("ANTHROPIC_API_KEY");
    std::env::remove_var("EDITOR_ASSIST_UNRELATED_SECRET");

    let Some(Outcome::Content { text, .. }) = outcome else {
        panic!("expected content outcome, got {outcome:?}");
    };
    let names: Vec<&str> = text.split(',').collect();
    assert!(names.contains(&"ANTHROPIC_API_KEY"));
    assert!(!names.contains(&"EDITOR_ASSIST_UNRELATED_SECRET"));
}

#[tokio::test]
async fn cancellation_kills_the_tool_without_an_outcome() {
    let config = mock_config("slow", &["--delay-ms", "10000"]);
    let program = resolve_executable(&config).expect("mock tool resolves");
    let session = ProcessSession::spawn(
        "cancelled-session".to_owned(),
        &config,
        &program,
        Request::new(question(), false),
        ResponseAccumulator::new(None),
    )
    .expect("mock tool spawns");

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let outcome = session.run(cancel).await;

    assert_eq!(outcome, None);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "cancellation must not wait for the tool to finish"
    );
}
