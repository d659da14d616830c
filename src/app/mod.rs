//! Application orchestration layer
//!
//! This module coordinates between input, domain, UI, and platform layers.
//! It owns the frame loop thread and the board it mutates.

pub mod controller;
pub mod frame_loop;
pub mod state;

pub use controller::{SessionController, SessionError, FRAME_QUEUE_DEPTH};
pub use frame_loop::SessionEvent;
pub use state::{BoardState, FrameEvent, FramePhase, FrameStateMachine, GestureOutcome};
