use tokio::io::AsyncReadExt;

use editor_assist::stream::writer::write_request;
use editor_assist::{AppError, Message, Request};

#[tokio::test]
async fn request_is_one_json_line_followed_by_eof() {
    let (client, mut server) = tokio::io::duplex(64 * 1024);
    let request = Request::new(
        vec![Message::system("be brief"), Message::user("hi\nthere")],
        false,
    );

    write_request("test-session", client, &request)
        .await
        .expect("write succeeds");

    let mut raw = String::new();
    server.read_to_string(&mut raw).await.expect("read to eof");

    assert!(raw.ends_with('\n'));
    assert_eq!(raw.matches('\n').count(), 1, "exactly one line");
    let parsed: Request = serde_json::from_str(raw.trim_end()).expect("valid json");
    assert_eq!(parsed, request);
}

#[tokio::test]
async fn closed_reader_yields_io_error() {
    let (client, server) = tokio::io::duplex(16);
    drop(server);
    let request = Request::new(vec![Message::user("x".repeat(1024))], false);

    let err = write_request("test-session", client, &request)
        .await
        .expect_err("peer is gone");

    assert!(matches!(err, AppError::Io(ref msg) if msg.starts_with("write failed")));
}
