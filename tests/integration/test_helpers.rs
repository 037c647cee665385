//! Shared helpers for integration tests that drive the mock tool binary.

use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use editor_assist::config::ToolConfig;
use editor_assist::stream::accumulator::{DisplaySink, ResponseAccumulator};
use editor_assist::stream::session::ProcessSession;
use editor_assist::stream::spawner::resolve_executable;
use editor_assist::{Message, Outcome, Request};

/// Path of the scripted tool built alongside the tests.
pub const MOCK_TOOL: &str = env!("CARGO_BIN_EXE_editor-assist-mock");

/// Tool configuration that runs the mock with `scenario` and `extra` args.
pub fn mock_config(scenario: &str, extra: &[&str]) -> ToolConfig {
    let mut args = vec!["--stdio".to_owned(), "--scenario".to_owned(), scenario.to_owned()];
    args.extend(extra.iter().map(|&arg| arg.to_owned()));
    ToolConfig {
        executable: MOCK_TOOL.to_owned(),
        args,
        ..ToolConfig::default()
    }
}

/// Display sink that records every delta.
#[derive(Clone, Default)]
pub struct CapturingSink {
    pub prepared: Arc<Mutex<usize>>,
    pub deltas: Arc<Mutex<Vec<String>>>,
}

impl CapturingSink {
    pub fn deltas(&self) -> Vec<String> {
        self.deltas.lock().unwrap().clone()
    }

    pub fn prepared(&self) -> usize {
        *self.prepared.lock().unwrap()
    }
}

impl DisplaySink for CapturingSink {
    fn prepare(&mut self) {
        *self.prepared.lock().unwrap() += 1;
    }

    fn append(&mut self, delta: &str) {
        self.deltas.lock().unwrap().push(delta.to_owned());
    }
}

/// Spawn and run one session to completion.
pub async fn run_session(
    config: &ToolConfig,
    messages: Vec<Message>,
    sink: Option<CapturingSink>,
) -> Option<Outcome> {
    let program = resolve_executable(config).expect("mock tool resolves");
    let stream = sink.is_some();
    let mut accumulator =
        ResponseAccumulator::new(sink.map(|sink| Box::new(sink) as Box<dyn DisplaySink>));
    accumulator.prepare_sink();

    let session = ProcessSession::spawn(
        "test-session".to_owned(),
        config,
        &program,
        Request::new(messages, stream),
        accumulator,
    )
    .expect("mock tool spawns");

    session.run(CancellationToken::new()).await
}
