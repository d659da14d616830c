use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::gesture::GesturePolicy;
use crate::domain::landmarks::index;

/// What the strokes are drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backdrop {
    /// Solid board filled according to the theme
    #[default]
    Board,
    /// The camera frame itself
    Camera,
}

/// Channel order expected by the display sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// Settings fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub gesture: GesturePolicy,
    pub backdrop: Backdrop,
    pub output_order: ChannelOrder,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.gesture {
            GesturePolicy::Pinch {
                tolerance,
                first,
                second,
            } => {
                if !(tolerance > 0.0 && tolerance <= 1.0) {
                    return Err(ConfigError::Invalid(format!(
                        "pinch tolerance {tolerance} must be within (0, 1]"
                    )));
                }
                check_landmark_index(first)?;
                check_landmark_index(second)?;
                if first == second {
                    return Err(ConfigError::Invalid(
                        "pinch needs two distinct landmarks".to_string(),
                    ));
                }
            }
            GesturePolicy::FingerUp { tip } => check_landmark_index(tip)?,
        }
        Ok(())
    }
}

fn check_landmark_index(value: usize) -> Result<(), ConfigError> {
    if value < index::COUNT {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "landmark index {value} is outside the {}-point hand model",
            index::COUNT
        )))
    }
}
