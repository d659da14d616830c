//! Control surface input
//!
//! Commands arrive as text lines (stdin or a command file) and are applied
//! to the running session.

pub mod commands;

pub use commands::{
    CommandDispatcher, CommandError, CommandOutcome, SessionCommand, SessionStatus,
};
