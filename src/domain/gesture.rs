//! Gesture classification from hand landmarks
//!
//! Turns the landmarks of one hand into a per-frame [`GestureState`]: whether
//! the hand is currently "drawing" and where the draw point is in pixels.
//! Two policies exist, selected by configuration.

use serde::{Deserialize, Serialize};

use crate::domain::core::Point;
use crate::domain::landmarks::{index, Hand, Landmark};

/// Default per-axis distance (normalized) under which two fingertips count as pinched
pub const DEFAULT_PINCH_TOLERANCE: f32 = 0.05;

/// Rule set deciding activation and draw point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "kebab-case")]
pub enum GesturePolicy {
    /// Active while two fingertips are within `tolerance` on both axes;
    /// the draw point is their midpoint
    Pinch {
        #[serde(default = "default_pinch_tolerance")]
        tolerance: f32,
        #[serde(default = "default_pinch_first")]
        first: usize,
        #[serde(default = "default_pinch_second")]
        second: usize,
    },
    /// Active while the tracked fingertip is strictly above every other
    /// landmark; the draw point is that fingertip
    FingerUp {
        #[serde(default = "default_finger_up_tip")]
        tip: usize,
    },
}

fn default_pinch_tolerance() -> f32 {
    DEFAULT_PINCH_TOLERANCE
}

fn default_pinch_first() -> usize {
    index::INDEX_FINGER_TIP
}

fn default_pinch_second() -> usize {
    index::THUMB_TIP
}

fn default_finger_up_tip() -> usize {
    index::INDEX_FINGER_TIP
}

impl GesturePolicy {
    /// Index fingertip / thumb tip pinch with the default tolerance
    pub fn pinch() -> Self {
        Self::pinch_with_tolerance(DEFAULT_PINCH_TOLERANCE)
    }

    pub fn pinch_with_tolerance(tolerance: f32) -> Self {
        Self::Pinch {
            tolerance,
            first: index::INDEX_FINGER_TIP,
            second: index::THUMB_TIP,
        }
    }

    /// Raised index finger
    pub fn finger_up() -> Self {
        Self::FingerUp {
            tip: index::INDEX_FINGER_TIP,
        }
    }

    /// Short name used in logs and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pinch { .. } => "pinch",
            Self::FingerUp { .. } => "finger-up",
        }
    }
}

impl Default for GesturePolicy {
    fn default() -> Self {
        Self::pinch()
    }
}

/// Per-frame gesture classification
///
/// `point` is `None` only when no usable hand was seen this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureState {
    pub active: bool,
    pub point: Option<Point>,
}

impl GestureState {
    /// State reported when hand tracking is lost
    pub const NO_HAND: Self = Self {
        active: false,
        point: None,
    };

    /// Returns the draw point when the gesture is active
    pub fn active_point(&self) -> Option<Point> {
        if self.active { self.point } else { None }
    }
}

/// Classifies landmarks of a single hand according to a [`GesturePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureExtractor {
    policy: GesturePolicy,
}

impl GestureExtractor {
    pub fn new(policy: GesturePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> GesturePolicy {
        self.policy
    }

    /// Classifies one frame
    ///
    /// # Arguments
    /// * `hand` - Landmarks of the tracked hand, `None` when tracking is lost
    /// * `width`, `height` - Frame size used to convert the draw point to pixels
    ///
    /// # Returns
    /// Activation and draw point. A missing hand, or a hand lacking the
    /// landmarks the policy needs, yields [`GestureState::NO_HAND`].
    pub fn classify(&self, hand: Option<&Hand>, width: u32, height: u32) -> GestureState {
        let Some(hand) = hand else {
            return GestureState::NO_HAND;
        };

        match self.policy {
            GesturePolicy::Pinch {
                tolerance,
                first,
                second,
            } => {
                let (Some(a), Some(b)) = (hand.landmark(first), hand.landmark(second)) else {
                    return GestureState::NO_HAND;
                };
                GestureState {
                    active: is_pinched(a, b, tolerance),
                    point: Some(midpoint(a, b).to_pixel(width, height)),
                }
            }
            GesturePolicy::FingerUp { tip } => {
                let Some(fingertip) = hand.landmark(tip) else {
                    return GestureState::NO_HAND;
                };
                GestureState {
                    active: is_topmost(hand.landmarks(), tip),
                    point: Some(fingertip.to_pixel(width, height)),
                }
            }
        }
    }
}

fn is_pinched(a: &Landmark, b: &Landmark, tolerance: f32) -> bool {
    (a.x - b.x).abs() < tolerance && (a.y - b.y).abs() < tolerance
}

fn midpoint(a: &Landmark, b: &Landmark) -> Landmark {
    Landmark::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}

// y grows downward, so "up" means the smallest y
fn is_topmost(landmarks: &[Landmark], tip: usize) -> bool {
    let tip_y = landmarks[tip].y;
    landmarks
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != tip)
        .all(|(_, other)| tip_y < other.y)
}
