use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::core::{Rgb, StrokeStyle};

/// Light/dark appearance of the generated board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }
}

impl std::str::FromStr for Theme {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(SettingsError::UnknownTheme(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Line thickness {value} is outside {min}..={max}")]
    ThicknessOutOfRange { value: u32, min: u32, max: u32 },
    #[error("Unknown theme '{0}', expected 'dark' or 'light'")]
    UnknownTheme(String),
}

/// User-adjustable drawing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub line_thickness: u32,
    pub line_color: Rgb,
    pub indicator_color: Rgb,
    pub theme: Theme,
}

impl Settings {
    pub const MIN_THICKNESS: u32 = 1;
    pub const MAX_THICKNESS: u32 = 100;
    pub const DEFAULT_THICKNESS: u32 = 10;
    pub const DEFAULT_LINE_COLOR: Rgb = Rgb::new(255, 0, 0);
    pub const DEFAULT_INDICATOR_COLOR: Rgb = Rgb::gray(150);

    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_thickness(self.line_thickness)
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.line_thickness, self.line_color)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            line_thickness: Self::DEFAULT_THICKNESS,
            line_color: Self::DEFAULT_LINE_COLOR,
            indicator_color: Self::DEFAULT_INDICATOR_COLOR,
            theme: Theme::default(),
        }
    }
}

fn validate_thickness(value: u32) -> Result<(), SettingsError> {
    if (Settings::MIN_THICKNESS..=Settings::MAX_THICKNESS).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::ThicknessOutOfRange {
            value,
            min: Settings::MIN_THICKNESS,
            max: Settings::MAX_THICKNESS,
        })
    }
}

/// Read-only view of the settings consumed by the drawing core
///
/// Queried each time a point is appended or a frame is composited, so
/// changes apply from the next point onward.
pub trait StyleProvider: Send + Sync {
    fn stroke_style(&self) -> StrokeStyle;
    fn indicator_color(&self) -> Rgb;
    fn theme(&self) -> Theme;
}

/// Thread-safe settings store shared between the control surface and the frame loop
#[derive(Debug, Default)]
pub struct SettingsStore {
    settings: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings: RwLock::new(settings),
        })
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        *self.settings.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_line_thickness(&self, value: u32) -> Result<(), SettingsError> {
        validate_thickness(value)?;
        self.update(|settings| settings.line_thickness = value);
        Ok(())
    }

    pub fn set_line_color(&self, color: Rgb) {
        self.update(|settings| settings.line_color = color);
    }

    pub fn set_indicator_color(&self, color: Rgb) {
        self.update(|settings| settings.indicator_color = color);
    }

    pub fn set_theme(&self, theme: Theme) {
        self.update(|settings| settings.theme = theme);
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) {
        let mut guard = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        log::debug!("Settings updated: {:?}", *guard);
    }
}

impl StyleProvider for SettingsStore {
    fn stroke_style(&self) -> StrokeStyle {
        self.snapshot().stroke_style()
    }

    fn indicator_color(&self) -> Rgb {
        self.snapshot().indicator_color
    }

    fn theme(&self) -> Theme {
        self.snapshot().theme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_drawing_board() {
        let settings = Settings::default();
        assert_eq!(settings.line_thickness, 10);
        assert_eq!(settings.line_color, Rgb::new(255, 0, 0));
        assert_eq!(settings.indicator_color, Rgb::new(150, 150, 150));
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn store_rejects_invalid_thickness() {
        let store = SettingsStore::default();
        assert_eq!(
            store.set_line_thickness(0),
            Err(SettingsError::ThicknessOutOfRange { value: 0, min: 1, max: 100 })
        );
        assert!(store.set_line_thickness(101).is_err());
        assert_eq!(store.snapshot().line_thickness, 10);

        store.set_line_thickness(42).unwrap();
        assert_eq!(store.stroke_style().thickness, 42);
    }

    #[test]
    fn store_new_validates() {
        let settings = Settings {
            line_thickness: 0,
            ..Settings::default()
        };
        assert!(SettingsStore::new(settings).is_err());
    }

    #[test]
    fn provider_reflects_updates() {
        let store = SettingsStore::default();
        store.set_line_color(Rgb::new(0, 255, 0));
        store.set_indicator_color(Rgb::gray(1));
        store.set_theme(Theme::Light);

        assert_eq!(store.stroke_style().color, Rgb::new(0, 255, 0));
        assert_eq!(store.indicator_color(), Rgb::gray(1));
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(" dark ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("sepia".parse::<Theme>().is_err());
    }
}
