#![forbid(unsafe_code)]

//! `editor-assist-mock`: scripted stand-in for an AI command-line tool.
//!
//! Reads one request line from stdin and answers on stdout with
//! newline-delimited JSON frames according to `--scenario`. The test suite
//! points the tool configuration at this binary to exercise the real process
//! machinery without network access.

use std::io::{Read, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde_json::{json, Value};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Scenario {
    /// Stream `--reply` in small chunks, then a done frame.
    Reply,
    /// Reply with the content of the last user message.
    Echo,
    /// Reply with the raw request line as received.
    Request,
    /// Reply with the sorted names of the inherited environment.
    Env,
    /// Reply with the command-line arguments.
    Args,
    /// One content frame, then an in-band error frame; exit 0.
    ToolError,
    /// Diagnostic text on stderr, no frames, exit 3.
    StderrFail,
    /// No output at all, exit 2.
    ExitCode,
    /// Terminate by SIGKILL.
    Signal,
    /// Final frame without a trailing newline.
    NoNewline,
    /// Garbage and unknown lines mixed with real frames.
    Malformed,
    /// Sleep `--delay-ms`, then behave like `reply`.
    Slow,
    /// Exit 0 without writing anything.
    Silent,
}

#[derive(Debug, Parser)]
#[command(name = "editor-assist-mock", about = "Scripted AI tool for tests", version, long_about = None)]
struct Cli {
    /// Accepted for compatibility with real tools.
    #[arg(long)]
    stdio: bool,

    /// Model name; echoed by the `args` scenario.
    #[arg(long)]
    model: Option<String>,

    /// Behaviour to replay.
    #[arg(long, value_enum, default_value_t = Scenario::Reply)]
    scenario: Scenario,

    /// Answer text for `reply` and `slow`.
    #[arg(long, default_value = "Hello, world")]
    reply: String,

    /// Chunk size in characters for streamed answers.
    #[arg(long, default_value_t = 5)]
    chunk: usize,

    /// Delay before answering in the `slow` scenario.
    #[arg(long, default_value_t = 2_000)]
    delay_ms: u64,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let mut request_line = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut request_line) {
        eprintln!("failed to read request: {err}");
        return ExitCode::from(1);
    }

    match run(&args, request_line.trim_end_matches('\n')) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mock failure: {err}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Cli, request_line: &str) -> std::io::Result<ExitCode> {
    let mut out = std::io::stdout().lock();

    match args.scenario {
        Scenario::Reply => stream_reply(&mut out, &args.reply, args.chunk)?,
        Scenario::Echo => {
            let request: Value = serde_json::from_str(request_line).map_err(std::io::Error::other)?;
            let question = request["messages"]
                .as_array()
                .and_then(|messages| {
                    messages
                        .iter()
                        .rev()
                        .find(|message| message["role"] == "user")
                })
                .and_then(|message| message["content"].as_str())
                .unwrap_or_default()
                .to_owned();
            stream_reply(&mut out, &question, args.chunk)?;
        }
        Scenario::Request => stream_reply(&mut out, request_line, usize::MAX)?,
        Scenario::Env => {
            let mut names: Vec<String> = std::env::vars_os()
                .map(|(name, _)| name.to_string_lossy().into_owned())
                .collect();
            names.sort();
            stream_reply(&mut out, &names.join(","), usize::MAX)?;
        }
        Scenario::Args => {
            let argv: Vec<String> = std::env::args().skip(1).collect();
            stream_reply(&mut out, &argv.join(" "), usize::MAX)?;
        }
        Scenario::ToolError => {
            frame(&mut out, &json!({ "content": "partial " }))?;
            frame(&mut out, &json!({ "error": "rate limited" }))?;
        }
        Scenario::StderrFail => {
            eprintln!("boom: model unavailable");
            return Ok(ExitCode::from(3));
        }
        Scenario::ExitCode => return Ok(ExitCode::from(2)),
        Scenario::Signal => raise_kill()?,
        Scenario::NoNewline => {
            frame(&mut out, &json!({ "content": "head " }))?;
            write!(out, "{}", json!({ "content": "tail" }))?;
            out.flush()?;
        }
        Scenario::Malformed => {
            writeln!(out, "this is not json")?;
            frame(&mut out, &json!({ "content": "ok" }))?;
            writeln!(out)?;
            frame(&mut out, &json!({ "other": 1 }))?;
            writeln!(out, "{{\"content\":")?;
            frame(&mut out, &json!({ "content": "!" }))?;
            frame(&mut out, &json!({ "done": true }))?;
        }
        Scenario::Slow => {
            std::thread::sleep(Duration::from_millis(args.delay_ms));
            stream_reply(&mut out, &args.reply, args.chunk)?;
        }
        Scenario::Silent => {}
    }

    Ok(ExitCode::SUCCESS)
}

fn frame(out: &mut impl Write, value: &Value) -> std::io::Result<()> {
    writeln!(out, "{value}")?;
    out.flush()
}

fn stream_reply(out: &mut impl Write, text: &str, chunk: usize) -> std::io::Result<()> {
    let chars: Vec<char> = text.chars().collect();
    for piece in chars.chunks(chunk.max(1)) {
        let piece: String = piece.iter().collect();
        frame(out, &json!({ "content": piece }))?;
    }
    frame(out, &json!({ "done": true }))
}

#[cfg(unix)]
fn raise_kill() -> std::io::Result<()> {
    use nix::sys::signal::{raise, Signal};

    raise(Signal::SIGKILL).map_err(std::io::Error::other)
}

#[cfg(not(unix))]
fn raise_kill() -> std::io::Result<()> {
    std::process::exit(137)
}
