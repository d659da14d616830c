//! Text commands for driving a session
//!
//! One command per line, e.g. `toggle`, `save ~/board.png`, `color 0 0 255`.
//! Parsed commands are executed by a [`CommandDispatcher`] against the
//! session controller and the live settings store.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use thiserror::Error;

use crate::app::{SessionController, SessionError, SessionEvent};
use crate::config::{Settings, SettingsError, SettingsStore, Theme};
use crate::domain::core::Rgb;
use crate::platform::capture::DeviceProvider;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("'{command}' expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// A user command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Flip drawing on or off
    Toggle,
    Undo,
    Clear,
    /// Save the board; without a path the default location is used
    Save(Option<PathBuf>),
    Stop,
    /// Restart the frame loop after a failure
    Retry,
    Thickness(u32),
    Color(Rgb),
    /// Set the theme; without an argument the theme flips
    Theme(Option<Theme>),
    Status,
}

impl FromStr for SessionCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("toggle", []) => Self::Toggle,
            ("undo", []) => Self::Undo,
            ("clear", []) => Self::Clear,
            ("stop" | "quit", []) => Self::Stop,
            ("retry", []) => Self::Retry,
            ("status", []) => Self::Status,
            ("save", []) => Self::Save(None),
            // Paths may contain spaces
            ("save", _) => Self::Save(Some(PathBuf::from(args.join(" ")))),
            ("thickness", [value]) => Self::Thickness(value.parse().map_err(|_| {
                CommandError::Usage {
                    command: "thickness",
                    expected: "a whole number",
                }
            })?),
            ("color", [r, g, b]) => Self::Color(parse_color(r, g, b)?),
            ("theme", []) => Self::Theme(None),
            ("theme", [theme]) => Self::Theme(Some(theme.parse()?)),

            ("toggle" | "undo" | "clear" | "stop" | "quit" | "retry" | "status", _) => {
                return Err(CommandError::Usage {
                    command: "this command",
                    expected: "no arguments",
                });
            }
            ("thickness", _) => {
                return Err(CommandError::Usage {
                    command: "thickness",
                    expected: "one value",
                });
            }
            ("color", _) => {
                return Err(CommandError::Usage {
                    command: "color",
                    expected: "three values from 0 to 255",
                });
            }
            ("theme", _) => {
                return Err(CommandError::Usage {
                    command: "theme",
                    expected: "'dark' or 'light'",
                });
            }
            (other, _) => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn parse_color(r: &str, g: &str, b: &str) -> Result<Rgb, CommandError> {
    let channel = |value: &str| {
        value.parse::<u8>().map_err(|_| CommandError::Usage {
            command: "color",
            expected: "three values from 0 to 255",
        })
    };
    Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
}

/// Snapshot reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub running: bool,
    pub draw_enabled: bool,
    pub strokes: usize,
    pub settings: Settings,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = self.settings.line_color;
        write!(
            f,
            "{} | drawing {} | {} strokes | thickness {} | color {} {} {} | {:?} theme",
            if self.running { "running" } else { "halted" },
            if self.draw_enabled { "on" } else { "off" },
            self.strokes,
            self.settings.line_thickness,
            color.r,
            color.g,
            color.b,
            self.settings.theme,
        )
    }
}

/// Result of executing one command
#[derive(Debug)]
pub enum CommandOutcome {
    Applied,
    Saved { path: PathBuf, written: bool },
    Status(SessionStatus),
    /// The frame loop was restarted; events now arrive on this receiver
    Restarted(Receiver<SessionEvent>),
    Stopped,
}

/// Executes commands against a session
pub struct CommandDispatcher {
    settings: Arc<SettingsStore>,
    devices: Arc<dyn DeviceProvider>,
    default_save_path: PathBuf,
}

impl CommandDispatcher {
    pub fn new(
        settings: Arc<SettingsStore>,
        devices: Arc<dyn DeviceProvider>,
        default_save_path: PathBuf,
    ) -> Self {
        Self {
            settings,
            devices,
            default_save_path,
        }
    }

    pub fn execute(
        &self,
        session: &mut SessionController,
        command: SessionCommand,
    ) -> Result<CommandOutcome, CommandError> {
        log::debug!("Executing command: {command:?}");

        let outcome = match command {
            SessionCommand::Toggle => {
                session.toggle_draw();
                CommandOutcome::Applied
            }
            SessionCommand::Undo => {
                session.undo();
                CommandOutcome::Applied
            }
            SessionCommand::Clear => {
                session.clear();
                CommandOutcome::Applied
            }
            SessionCommand::Save(path) => {
                let path = path.unwrap_or_else(|| self.default_save_path.clone());
                let written = session.save(&path)?;
                CommandOutcome::Saved { path, written }
            }
            SessionCommand::Stop => {
                session.stop()?;
                CommandOutcome::Stopped
            }
            SessionCommand::Retry => {
                log::info!("Restarting frame loop");
                session.stop()?;
                CommandOutcome::Restarted(session.start(Arc::clone(&self.devices))?)
            }
            SessionCommand::Thickness(value) => {
                self.settings.set_line_thickness(value)?;
                CommandOutcome::Applied
            }
            SessionCommand::Color(color) => {
                self.settings.set_line_color(color);
                CommandOutcome::Applied
            }
            SessionCommand::Theme(theme) => {
                let theme = theme.unwrap_or_else(|| {
                    if self.settings.snapshot().theme.is_dark() {
                        Theme::Light
                    } else {
                        Theme::Dark
                    }
                });
                self.settings.set_theme(theme);
                CommandOutcome::Applied
            }
            SessionCommand::Status => CommandOutcome::Status(SessionStatus {
                running: session.is_running(),
                draw_enabled: session.is_draw_enabled(),
                strokes: session.stroke_count(),
                settings: self.settings.snapshot(),
            }),
        };
        Ok(outcome)
    }
}
