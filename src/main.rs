#![forbid(unsafe_code)]

//! `editor-assist`: run editor assistant commands against a file.
//!
//! Loads the target file into an in-memory buffer, selects the requested
//! lines, delegates the request to the configured AI tool, and writes the
//! buffer back when an edit was applied. The terminal plays the role of the
//! editor's panel and confirmation prompt.

use std::io::{BufReader, Stdin, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use editor_assist::assistant::{Assistant, RequestTicket};
use editor_assist::editor::file_store::{self, LoadedFile};
use editor_assist::editor::memory::MemoryEditor;
use editor_assist::editor::terminal::TerminalHost;
use editor_assist::editor::DocumentId;
use editor_assist::{AppError, Dispatcher, GlobalConfig, Outcome, Result};

type Host = TerminalHost<BufReader<Stdin>, Stdout>;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "editor-assist", about = "Delegate code requests to an AI tool", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the tool executable from the configuration.
    #[arg(long, global = true)]
    executable: Option<String>,

    /// Override the model name from the configuration.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log output format (text or json). Logs go to stderr.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Answer yes to every confirmation.
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Write the file even if it changed on disk since it was read.
    #[arg(long, global = true)]
    force: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Target {
    /// File to operate on.
    #[arg(long)]
    file: PathBuf,

    /// Inclusive 1-based line range, `A:B` (or a single line `A`).
    #[arg(long, value_parser = parse_line_range)]
    lines: (usize, usize),

    /// Language tag; derived from the file extension when omitted.
    #[arg(long)]
    language: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ask a free-form question.
    Ask {
        /// Question text.
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Explain the selected lines.
    Explain {
        #[command(flatten)]
        target: Target,
    },

    /// Rewrite the selected lines, then review and apply the proposal.
    Refactor {
        #[command(flatten)]
        target: Target,
        /// What to change.
        #[arg(required = true)]
        instruction: Vec<String>,
    },

    /// Fix a bug in the selected lines after confirmation.
    Fix {
        #[command(flatten)]
        target: Target,
        /// Observed problem, if known.
        description: Vec<String>,
    },
}

fn parse_line_range(raw: &str) -> std::result::Result<(usize, usize), String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|err| format!("invalid line number {part:?}: {err}"))
    };
    let (first, last) = match raw.split_once(':') {
        Some((first, last)) => (parse(first)?, parse(last)?),
        None => {
            let line = parse(raw)?;
            (line, line)
        }
    };
    if first == 0 || first > last {
        return Err(format!("invalid line range {raw:?}"));
    }
    Ok((first, last))
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    if let Some(executable) = args.executable.clone() {
        config.tool.executable = executable;
    }
    if let Some(model) = args.model.clone() {
        config.tool.model = Some(model);
    }
    config.validate()?;
    info!(executable = %config.tool.executable, "configuration loaded");

    let dispatcher = Dispatcher::new(config.tool.clone())?;
    let mut editor = MemoryEditor::new();

    // ── Load the target file, if any ────────────────────
    let target = match &args.command {
        Command::Ask { .. } => None,
        Command::Explain { target } | Command::Refactor { target, .. } | Command::Fix { target, .. } => {
            Some(open_target(&mut editor, target)?)
        }
    };

    let host: Host = TerminalHost::new(
        editor,
        BufReader::new(std::io::stdin()),
        std::io::stdout(),
        args.yes,
    );
    let assistant = Assistant::new(Arc::new(Mutex::new(host)), dispatcher, config.display.clone());

    // ── Run the command ─────────────────────────────────
    let outcome = match &args.command {
        Command::Ask { question } => await_outcome(assistant.ask(&question.join(" "))).await?,
        Command::Explain { .. } => await_outcome(assistant.explain_selection()?).await?,
        Command::Refactor { instruction, .. } => {
            let outcome = await_outcome(assistant.refactor_selection(&instruction.join(" "))?).await?;
            if !assistant.pending().is_empty() && confirm(&assistant, "Apply these changes?").await? {
                assistant.apply_pending()?;
            }
            outcome
        }
        Command::Fix { description, .. } => {
            let description = (!description.is_empty()).then(|| description.join(" "));
            await_outcome(assistant.fix_selection(description.as_deref())?).await?
        }
    };

    if let Outcome::Error(message) = outcome {
        return Err(AppError::Process(message.trim().to_owned()));
    }

    // ── Persist edits ───────────────────────────────────
    if let Some((document, loaded)) = target {
        let text = {
            let host = assistant.host().lock().unwrap_or_else(PoisonError::into_inner);
            host.editor().text(document).map(str::to_owned)
        };
        match text {
            Some(text) if text != loaded.content => {
                let summary = file_store::save(&loaded, &text, args.force)?;
                info!(path = %summary.path.display(), bytes = summary.bytes_written, "edits saved");
            }
            Some(_) => info!("no edits to save"),
            None => warn!("document closed before it could be saved"),
        }
    }

    Ok(())
}

/// Read `target.file` into `editor` and select the requested lines.
fn open_target(editor: &mut MemoryEditor, target: &Target) -> Result<(DocumentId, LoadedFile)> {
    let loaded = file_store::load(&target.file)?;
    let language = target
        .language
        .clone()
        .unwrap_or_else(|| file_store::language_for_path(&target.file).to_owned());
    let document = editor.open(
        target.file.display().to_string(),
        language,
        loaded.content.clone(),
    );
    let (first, last) = target.lines;
    editor.select_lines(document, first, last)?;
    Ok((document, loaded))
}

async fn await_outcome(ticket: RequestTicket) -> Result<Outcome> {
    ticket
        .wait()
        .await
        .ok_or_else(|| AppError::Process("request was cancelled".into()))
}

/// Run a host confirmation off the async runtime.
async fn confirm(assistant: &Assistant<Host>, prompt: &'static str) -> Result<bool> {
    let host = Arc::clone(assistant.host());
    tokio::task::spawn_blocking(move || {
        use editor_assist::editor::EditorHost as _;
        host.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .confirm(prompt)
    })
    .await
    .map_err(|err| AppError::Io(format!("confirmation task failed: {err}")))
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
