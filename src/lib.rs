#![forbid(unsafe_code)]

//! Bridge between a text editor and an AI-backed command-line tool.
//!
//! Requests are delegated to an external process speaking newline-delimited
//! JSON over stdio; answers are shown in a panel or applied to the region
//! they were asked about.

pub mod assistant;
pub mod config;
pub mod dispatcher;
pub mod editor;
pub mod errors;
pub mod models;
pub mod prompts;
pub mod reconcile;
pub mod stream;

pub use config::GlobalConfig;
pub use dispatcher::Dispatcher;
pub use errors::{AppError, Result};
pub use models::{Frame, Message, Outcome, Request};
