//! Frame-processing loop
//!
//! Runs on its own thread: reads a frame, classifies the hand, updates the
//! board, composites, and hands the result to the display channel. Devices
//! are acquired once per run and released on every exit path by their guards.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender, TrySendError};

use crate::app::controller::SessionError;
use crate::app::state::{BoardState, FrameEvent, FramePhase, FrameStateMachine, GestureOutcome};
use crate::config::{Backdrop, ChannelOrder, SessionConfig, StyleProvider};
use crate::domain::gesture::{GestureExtractor, GestureState};
use crate::platform::capture::{
    CameraGuard, CaptureError, DetectorGuard, DeviceProvider, FrameSource, LandmarkSource,
};
use crate::ui::renderer::{CanvasRenderer, RenderedFrame, StrokeLayout};

/// How long the loop waits to deliver its final event before giving up
const FINAL_EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// Output of the frame loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A composited frame ready for display
    Frame(Arc<RenderedFrame>),
    /// The loop halted on a fatal error; the consumer may close or retry
    Failed { message: String },
    /// The frame source ran out of frames
    Finished,
}

pub(crate) type SharedBoard = Arc<Mutex<BoardState>>;
pub(crate) type SharedSnapshot = Arc<Mutex<Option<Arc<RenderedFrame>>>>;

pub(crate) fn lock_board(board: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    board.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything one run of the loop needs
pub(crate) struct FrameLoop {
    pub board: SharedBoard,
    pub snapshot: SharedSnapshot,
    pub settings: Arc<dyn StyleProvider>,
    pub config: SessionConfig,
    pub events: Sender<SessionEvent>,
    pub shutdown: Arc<AtomicBool>,
}

impl FrameLoop {
    /// Runs until stopped, the source is exhausted, or a read fails
    pub fn run(self, devices: Arc<dyn DeviceProvider>) {
        log::info!(
            "Frame loop starting ({} gesture, {:?} backdrop)",
            self.config.gesture.name(),
            self.config.backdrop
        );

        let (mut camera, mut detector) = match acquire(devices.as_ref()) {
            Ok(guards) => guards,
            Err(err) => {
                log::error!("Frame loop could not start: {err}");
                self.send_final(SessionEvent::Failed {
                    message: err.to_string(),
                });
                return;
            }
        };

        let extractor = GestureExtractor::new(self.config.gesture);
        let renderer = CanvasRenderer::new();
        let mut frames: u64 = 0;
        let mut phase = FramePhase::AwaitFrame;

        while phase == FramePhase::AwaitFrame && !self.shutdown.load(Ordering::Relaxed) {
            match self.cycle(&mut *camera, &mut *detector, &extractor, &renderer) {
                Ok(next) => {
                    frames += 1;
                    phase = next;
                }
                Err(SessionError::Capture(CaptureError::EndOfStream)) => {
                    log::info!("Frame source exhausted after {frames} frames");
                    self.send_final(SessionEvent::Finished);
                    break;
                }
                Err(err) => {
                    log::error!("Frame loop halted after {frames} frames: {err}");
                    self.send_final(SessionEvent::Failed {
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        log::info!("Frame loop stopped");
        // Guards drop here and release the devices
    }

    /// Processes exactly one frame
    ///
    /// # Returns
    /// The phase the cycle ended in, `AwaitFrame` when the next frame may be
    /// read. A failed read closes the open stroke before the error is returned.
    pub fn cycle(
        &self,
        camera: &mut dyn FrameSource,
        detector: &mut dyn LandmarkSource,
        extractor: &GestureExtractor,
        renderer: &CanvasRenderer,
    ) -> Result<FramePhase, SessionError> {
        let mut phase = FramePhase::AwaitFrame;

        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(err) => {
                phase = FrameStateMachine::process_event(phase, FrameEvent::FrameReadFailed);
                if phase == FramePhase::Halted {
                    // Points after a restart must not join the stroke drawn before it
                    lock_board(&self.board).hand_lost();
                }
                return Err(err.into());
            }
        };
        phase = FrameStateMachine::process_event(phase, FrameEvent::FrameRead);

        // Single-hand drawing: extra hands are ignored
        let hand = detector.detect(&frame).into_iter().next();

        let mut gesture = GestureState::NO_HAND;
        let mut outcome = GestureOutcome::default();
        match hand {
            None => {
                lock_board(&self.board).hand_lost();
                phase = FrameStateMachine::process_event(phase, FrameEvent::NoHand);
            }
            Some(hand) => {
                phase = FrameStateMachine::process_event(phase, FrameEvent::HandDetected);
                gesture = extractor.classify(Some(&hand), frame.width, frame.height);
                let style = self.settings.stroke_style();
                outcome = lock_board(&self.board).apply_gesture(&gesture, style);
                phase = FrameStateMachine::process_event(phase, FrameEvent::LedgerUpdated);
            }
        }

        let mut pixmap = match self.config.backdrop {
            Backdrop::Board => {
                renderer.generate_background(frame.width, frame.height, self.settings.theme())?
            }
            Backdrop::Camera => renderer.camera_backdrop(&frame)?,
        };
        let layout = StrokeLayout::from_ledger(&lock_board(&self.board).ledger);
        renderer.render_strokes(&mut pixmap, &layout);

        let board_frame = Arc::new(renderer.finish(&pixmap, ChannelOrder::Rgb));
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&board_frame));

        let indicator = gesture.point.filter(|_| outcome.show_indicator);
        let output = match indicator {
            None if self.config.output_order == ChannelOrder::Rgb => board_frame,
            _ => {
                if let Some(point) = indicator {
                    let radius = self.settings.stroke_style().indicator_radius();
                    renderer.render_indicator(&mut pixmap, point, self.settings.indicator_color(), radius);
                }
                Arc::new(renderer.finish(&pixmap, self.config.output_order))
            }
        };
        phase = FrameStateMachine::process_event(phase, FrameEvent::Rendered);

        match self.events.try_send(SessionEvent::Frame(output)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => log::trace!("Display lagging, dropped frame {}", frame.index),
            Err(TrySendError::Disconnected(_)) => log::trace!("No display attached"),
        }
        Ok(FrameStateMachine::process_event(phase, FrameEvent::Emitted))
    }

    fn send_final(&self, event: SessionEvent) {
        match self.events.send_timeout(event, FINAL_EVENT_TIMEOUT) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(event)) => {
                log::warn!("Display did not accept final event {event:?}")
            }
            Err(SendTimeoutError::Disconnected(_)) => log::debug!("No display attached"),
        }
    }
}

fn acquire(devices: &dyn DeviceProvider) -> Result<(CameraGuard, DetectorGuard), SessionError> {
    let camera = CameraGuard::open(devices)?;
    let detector = DetectorGuard::open(devices)?;
    Ok((camera, detector))
}
