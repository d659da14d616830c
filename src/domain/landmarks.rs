//! Hand landmark data as delivered by a landmark detector
//!
//! Landmarks are normalized to the frame: `x` grows to the right, `y` grows
//! downward, both in `0.0..=1.0`. Indices follow the 21-point hand model.

use serde::{Deserialize, Serialize};

use crate::domain::core::Point;

/// Anatomical landmark indices of the 21-point hand model
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Number of landmarks in a complete hand
    pub const COUNT: usize = 21;
}

/// A single normalized landmark
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; unused by the gesture policies
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Converts this landmark to pixel coordinates of a `width` x `height` frame
    pub fn to_pixel(&self, width: u32, height: u32) -> Point {
        Point::from_normalized(self.x, self.y, width, height)
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f32; 3] {
    fn from(landmark: Landmark) -> Self {
        [landmark.x, landmark.y, landmark.z]
    }
}

/// One detected hand: ordered landmarks indexed by [`index`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    landmarks: Vec<Landmark>,
}

impl Hand {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Returns the landmark at `index`, if the detector reported it
    pub fn landmark(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.get(index)
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

impl From<Vec<Landmark>> for Hand {
    fn from(landmarks: Vec<Landmark>) -> Self {
        Self::new(landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landmark_to_pixel() {
        let landmark = Landmark::new(0.25, 0.5, -0.1);
        assert_eq!(landmark.to_pixel(100, 200), Point::new(25, 100));
    }

    #[test]
    fn missing_landmark_is_none() {
        let hand = Hand::new(vec![Landmark::default(); 5]);
        assert!(hand.landmark(index::THUMB_TIP).is_some());
        assert!(hand.landmark(index::INDEX_FINGER_TIP).is_none());
    }

    #[test]
    fn hand_deserializes_from_triples() {
        let hand: Hand = serde_json::from_str("[[0.1, 0.2, 0.0], [0.3, 0.4, 0.5]]").unwrap();
        assert_eq!(hand.len(), 2);
        assert_eq!(hand.landmark(1), Some(&Landmark::new(0.3, 0.4, 0.5)));
    }
}
