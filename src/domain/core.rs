//! Core domain types and operations
//!
//! Pixel-space value types shared by the gesture, ledger, and compositing
//! layers. Nothing here knows about cameras, threads, or file formats.

use serde::{Deserialize, Serialize};

/// Point in integer pixel coordinates of the camera frame
///
/// Recomputed every frame from normalized landmark coordinates and never
/// stored on its own, only as part of a [`StrokePoint`](crate::domain::ledger::StrokePoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a new point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Scales a normalized (0..1) coordinate pair to pixel space
    ///
    /// Values are truncated toward zero, so `0.999 * 640` lands on `639`.
    pub fn from_normalized(x: f32, y: f32, width: u32, height: u32) -> Self {
        Self {
            x: (x * width as f32) as i32,
            y: (y * height as f32) as i32,
        }
    }
}

/// 3-channel color in red, green, blue order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Single-value gray shade
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        [color.r, color.g, color.b]
    }
}

/// Thickness and color captured at the moment a point is recorded
///
/// Later settings changes never reach back into already-recorded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StrokeStyle {
    /// Line thickness in pixels, always at least 1
    pub thickness: u32,
    pub color: Rgb,
}

impl StrokeStyle {
    /// Creates a style, raising a zero thickness to 1
    pub fn new(thickness: u32, color: Rgb) -> Self {
        Self {
            thickness: thickness.max(1),
            color,
        }
    }

    /// Radius of the cursor indicator drawn for this style
    pub fn indicator_radius(&self) -> u32 {
        self.thickness / 2
    }
}
