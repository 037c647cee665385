use editor_assist::models::{Frame, Message, Outcome, Request, Role};
use editor_assist::AppError;

// ── Frame ───────────────────────────────────────────────────────────────────

#[test]
fn frame_parse_recognises_each_shape() {
    assert_eq!(
        Frame::parse("{\"content\":\"hi\"}").unwrap(),
        Some(Frame::Content("hi".into()))
    );
    assert_eq!(
        Frame::parse("{\"error\":\"bad\"}").unwrap(),
        Some(Frame::Error("bad".into()))
    );
    assert_eq!(Frame::parse("{\"done\":true}").unwrap(), Some(Frame::Done));
}

#[test]
fn frame_parse_error_wins_over_content() {
    let frame = Frame::parse("{\"content\":\"x\",\"error\":\"y\"}").unwrap();
    assert_eq!(frame, Some(Frame::Error("y".into())));
}

#[test]
fn frame_parse_content_wins_over_done() {
    let frame = Frame::parse("{\"content\":\"last\",\"done\":true}").unwrap();
    assert_eq!(frame, Some(Frame::Content("last".into())));
}

#[test]
fn frame_parse_ignores_blank_and_unknown() {
    assert_eq!(Frame::parse("").unwrap(), None);
    assert_eq!(Frame::parse("  \t").unwrap(), None);
    assert_eq!(Frame::parse("{}").unwrap(), None);
    assert_eq!(Frame::parse("{\"usage\":{\"tokens\":3}}").unwrap(), None);
    assert_eq!(Frame::parse("{\"done\":false}").unwrap(), None);
}

#[test]
fn frame_parse_rejects_malformed() {
    for line in ["nope", "{\"content\":", "[1,2]", "{\"content\":1}"] {
        let err = Frame::parse(line).expect_err(line);
        assert!(
            matches!(err, AppError::Protocol(ref msg) if msg.starts_with("malformed frame")),
            "unexpected error for {line}: {err}"
        );
    }
}

#[test]
fn frame_parse_keeps_empty_content() {
    assert_eq!(
        Frame::parse("{\"content\":\"\"}").unwrap(),
        Some(Frame::Content(String::new()))
    );
}

// ── Request ─────────────────────────────────────────────────────────────────

#[test]
fn message_constructors_set_roles() {
    assert_eq!(Message::system("s").role, Role::System);
    assert_eq!(Message::user("u").role, Role::User);
    assert_eq!(Message::assistant("a").role, Role::Assistant);
}

#[test]
fn request_serialises_to_single_line() {
    let request = Request::new(vec![Message::user("line one\nline two")], true);

    let bytes = request.to_json_bytes().expect("serialises");

    assert!(!bytes.contains(&b'\n'), "newlines in content must be escaped");
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["stream"], true);
    assert_eq!(value["messages"][0]["role"], "user");
    assert_eq!(value["messages"][0]["content"], "line one\nline two");
}

// ── Outcome ─────────────────────────────────────────────────────────────────

#[test]
fn outcome_helpers() {
    assert!(Outcome::error("x").is_error());
    assert!(!Outcome::content("x", false).is_error());
    assert_eq!(
        Outcome::content("x", true),
        Outcome::Content {
            text: "x".into(),
            streamed: true
        }
    );
}
