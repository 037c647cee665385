use editor_assist::AppError;

#[test]
fn display_prefixes_each_variant() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::ExecutableNotFound("ai".into()), "executable not found: ai"),
        (AppError::Spawn("x".into()), "spawn: x"),
        (AppError::Protocol("x".into()), "protocol: x"),
        (AppError::Process("x".into()), "process: x"),
        (AppError::ApplyPrecondition("x".into()), "cannot apply: x"),
        (AppError::Editor("x".into()), "editor: x"),
        (AppError::Io("x".into()), "io: x"),
    ];

    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn io_error_converts_to_io_variant() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
    let err: AppError = io.into();

    assert!(matches!(err, AppError::Io(ref msg) if msg.contains("pipe closed")));
}

#[test]
fn toml_error_converts_to_config_variant() {
    let toml_err = toml::from_str::<toml::Value>("= nope").expect_err("invalid toml");
    let err: AppError = toml_err.into();

    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("invalid config")));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    assert_error(&AppError::Process("x".into()));
}
