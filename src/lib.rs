//! Air-canvas: turns tracked hand gestures into strokes on a virtual board
//!
//! Layers:
//! - [`domain`]: gesture classification and the stroke ledger
//! - [`config`]: drawing settings and session configuration
//! - [`platform`]: camera and landmark detector contracts, replay devices
//! - [`ui`]: board compositing and image export
//! - [`app`]: the frame loop and session controller
//! - [`input`]: text commands driving a session

pub mod app;
pub mod config;
pub mod domain;
pub mod input;
pub mod platform;
pub mod ui;
