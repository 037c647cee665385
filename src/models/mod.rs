//! Domain model module declarations.

pub mod frame;
pub mod outcome;
pub mod request;

pub use frame::Frame;
pub use outcome::Outcome;
pub use request::{Message, Request, Role};
