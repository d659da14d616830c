use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossbeam_channel::{never, select, unbounded, Receiver, RecvError, Sender};

use air_canvas::app::{SessionController, SessionEvent};
use air_canvas::config::{default_save_path, AppConfig, SettingsStore};
use air_canvas::domain::GesturePolicy;
use air_canvas::input::{CommandDispatcher, CommandOutcome, SessionCommand};
use air_canvas::platform::{DeviceProvider, ReplayDevices, ReplayScript};

#[derive(Parser, Debug)]
#[command(name = "air-canvas", version, about = "Draw on a virtual board with hand gestures")]
struct Cli {
    /// Landmark recording to replay (JSON Lines)
    #[arg(long)]
    script: PathBuf,

    /// TOML file with [settings] and [session] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gesture that activates drawing
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Where the board is saved when the session ends
    #[arg(long)]
    output: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(long)]
    commands: Option<PathBuf>,

    /// Delay between replayed frames in milliseconds
    #[arg(long, default_value_t = 33)]
    frame_interval_ms: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PolicyArg {
    Pinch,
    FingerUp,
}

impl PolicyArg {
    /// Keeps configured parameters when the configured policy is already of this kind
    fn apply(self, current: GesturePolicy) -> GesturePolicy {
        match (self, current) {
            (PolicyArg::Pinch, GesturePolicy::Pinch { .. })
            | (PolicyArg::FingerUp, GesturePolicy::FingerUp { .. }) => current,
            (PolicyArg::Pinch, _) => GesturePolicy::pinch(),
            (PolicyArg::FingerUp, _) => GesturePolicy::finger_up(),
        }
    }
}

/// What woke the control loop
enum Input {
    Session(Result<SessionEvent, RecvError>),
    Command(Result<String, RecvError>),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.session.gesture = policy.apply(config.session.gesture);
    }

    let script = ReplayScript::load(&cli.script)?;
    let devices: Arc<dyn DeviceProvider> = Arc::new(
        ReplayDevices::new(script).with_frame_interval(Duration::from_millis(cli.frame_interval_ms)),
    );
    let settings = Arc::new(SettingsStore::new(config.settings)?);
    let mut session = SessionController::new(config.session, settings.clone());
    let dispatcher = CommandDispatcher::new(
        settings,
        Arc::clone(&devices),
        cli.output.clone().unwrap_or_else(default_save_path),
    );

    let (notify_tx, notify_rx) = unbounded();
    let mut display = spawn_display(session.start(Arc::clone(&devices))?, notify_tx.clone())?;

    let (command_tx, mut command_rx) = unbounded::<String>();
    spawn_command_reader(cli.commands.as_ref(), command_tx)?;

    log::info!("Session started, commands: toggle undo clear save retry thickness color theme status stop");

    let mut halted: Option<String> = None;
    let mut commands_open = true;
    loop {
        let input = select! {
            recv(notify_rx) -> event => Input::Session(event),
            recv(command_rx) -> line => Input::Command(line),
        };

        match input {
            Input::Session(Ok(SessionEvent::Finished)) => {
                log::info!("Replay finished");
                break;
            }
            Input::Session(Ok(SessionEvent::Failed { message })) => {
                eprintln!("Session halted: {message}. Enter 'retry' or 'stop'.");
                halted = Some(message);
            }
            Input::Session(Ok(SessionEvent::Frame(_))) | Input::Session(Err(_)) => {}
            Input::Command(Ok(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<SessionCommand>() {
                    Ok(command) => command,
                    Err(err) => {
                        eprintln!("{err}");
                        continue;
                    }
                };
                match dispatcher.execute(&mut session, command) {
                    Ok(CommandOutcome::Applied) => {}
                    Ok(CommandOutcome::Saved { path, written }) => {
                        if written {
                            println!("Saved {}", path.display());
                        } else {
                            println!("Nothing to save yet");
                        }
                    }
                    Ok(CommandOutcome::Status(status)) => println!("{status}"),
                    Ok(CommandOutcome::Restarted(events)) => {
                        finish_display(display);
                        display = spawn_display(events, notify_tx.clone())?;
                        halted = None;
                    }
                    Ok(CommandOutcome::Stopped) => break,
                    Err(err) => eprintln!("{err}"),
                }
            }
            Input::Command(Err(_)) => {
                log::debug!("Command input closed");
                command_rx = never();
                commands_open = false;
            }
        }

        // Nothing can retry once the command input is gone
        if let (Some(message), false) = (&halted, commands_open) {
            session.stop()?;
            finish_display(display);
            anyhow::bail!("Session halted: {message}");
        }
    }

    session.stop()?;
    finish_display(display);

    if let Some(output) = &cli.output {
        if session.save(output)? {
            println!("Saved {}", output.display());
        }
    }
    log::info!("Session ended with {} strokes", session.stroke_count());
    Ok(())
}

/// Drains session events, counting frames until the loop ends
///
/// Stands in for a display: frames are consumed here so the loop never blocks.
fn spawn_display(
    events: Receiver<SessionEvent>,
    notify: Sender<SessionEvent>,
) -> anyhow::Result<JoinHandle<u64>> {
    let handle = thread::Builder::new()
        .name("air-canvas-display".to_string())
        .spawn(move || {
            let mut frames = 0u64;
            for event in events.iter() {
                match event {
                    SessionEvent::Frame(frame) => {
                        frames += 1;
                        log::trace!("Frame {frames}: {}x{}", frame.width, frame.height);
                    }
                    end => {
                        if notify.send(end).is_err() {
                            log::debug!("Control loop gone");
                        }
                        break;
                    }
                }
            }
            frames
        })
        .context("Failed to spawn display thread")?;
    Ok(handle)
}

fn finish_display(display: JoinHandle<u64>) {
    match display.join() {
        Ok(frames) => log::info!("Displayed {frames} frames"),
        Err(_) => log::error!("Display thread panicked"),
    }
}

/// Forwards command lines from a file or stdin
fn spawn_command_reader(source: Option<&PathBuf>, commands: Sender<String>) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead + Send> = match source {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    // Detached: a stdin read cannot be interrupted
    thread::Builder::new()
        .name("air-canvas-commands".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if commands.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::warn!("Failed to read command: {err}");
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn command reader")?;
    Ok(())
}
