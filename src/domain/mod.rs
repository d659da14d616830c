//! Domain logic and core data structures
//!
//! This module contains the pure drawing logic: gesture classification and
//! the stroke ledger. It is independent of cameras, threads, and rendering.

pub mod core;
pub mod gesture;
pub mod landmarks;
pub mod ledger;

pub use self::core::{Point, Rgb, StrokeStyle};
pub use gesture::{GestureExtractor, GesturePolicy, GestureState};
pub use landmarks::{Hand, Landmark};
pub use ledger::{Segment, Stroke, StrokeLedger, StrokePoint};
