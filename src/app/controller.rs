//! Session controller and command layer
//!
//! The controller owns the board and the frame-loop thread. Commands
//! (`toggle_draw`, `undo`, `clear`, `save`, `stop`) can be called from any
//! control surface while the loop runs; board mutations are serialized by
//! the board lock.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use thiserror::Error;

use crate::app::frame_loop::{lock_board, FrameLoop, SessionEvent, SharedBoard, SharedSnapshot};
use crate::app::state::BoardState;
use crate::config::{SessionConfig, StyleProvider};
use crate::domain::ledger::StrokeLedger;
use crate::platform::capture::{CaptureError, DeviceError, DeviceProvider};
use crate::ui::export::{save_frame, SaveError};
use crate::ui::renderer::{RenderedFrame, RendererError};

/// Frames buffered between the loop and a slow display
pub const FRAME_QUEUE_DEPTH: usize = 4;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Frame loop already running")]
    AlreadyRunning,

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RendererError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("Failed to spawn frame loop thread: {0}")]
    Spawn(std::io::Error),

    #[error("Frame loop thread panicked")]
    ThreadPanicked,
}

/// Running frame loop thread and its shutdown flag
struct FrameLoopHandle {
    shutdown: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Main session controller
///
/// Coordinates the frame loop with user commands. The board survives loop
/// restarts, so a failed camera can be retried without losing the drawing.
pub struct SessionController {
    /// Ledger and draw toggle (thread-safe)
    board: SharedBoard,
    /// Last composited board without the indicator
    snapshot: SharedSnapshot,
    /// Live drawing settings
    settings: Arc<dyn StyleProvider>,
    /// Settings fixed per session
    config: SessionConfig,
    frame_loop: Option<FrameLoopHandle>,
}

impl SessionController {
    /// Creates a controller with a blank board and drawing enabled
    pub fn new(config: SessionConfig, settings: Arc<dyn StyleProvider>) -> Self {
        Self {
            board: Arc::new(Mutex::new(BoardState::default())),
            snapshot: Arc::new(Mutex::new(None)),
            settings,
            config,
            frame_loop: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts the frame loop on a dedicated thread
    ///
    /// Devices are opened inside the loop, so opening failures arrive as a
    /// [`SessionEvent::Failed`]. After the loop halted, `stop` followed by
    /// `start` restarts it with fresh devices and the existing board.
    ///
    /// # Arguments
    /// * `devices` - Provider the loop opens its camera and landmark model from
    ///
    /// # Returns
    /// The receiver for frames and the final event, or
    /// `SessionError::AlreadyRunning` while a previous loop thread is alive
    pub fn start(
        &mut self,
        devices: Arc<dyn DeviceProvider>,
    ) -> Result<Receiver<SessionEvent>, SessionError> {
        if self.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        // Reap a loop that ended on its own
        self.stop()?;

        let (events, receiver) = bounded(FRAME_QUEUE_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let frame_loop = FrameLoop {
            board: Arc::clone(&self.board),
            snapshot: Arc::clone(&self.snapshot),
            settings: Arc::clone(&self.settings),
            config: self.config,
            events,
            shutdown: Arc::clone(&shutdown),
        };

        let thread = thread::Builder::new()
            .name("air-canvas-frames".to_string())
            .spawn(move || frame_loop.run(devices))
            .map_err(SessionError::Spawn)?;

        self.frame_loop = Some(FrameLoopHandle { shutdown, thread });
        Ok(receiver)
    }

    /// True while the frame loop thread is alive
    pub fn is_running(&self) -> bool {
        self.frame_loop
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    /// Stops the frame loop and waits for its devices to be released
    ///
    /// Safe to call repeatedly.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let Some(handle) = self.frame_loop.take() else {
            return Ok(());
        };

        handle.shutdown.store(true, Ordering::Relaxed);
        handle.thread.join().map_err(|_| SessionError::ThreadPanicked)?;
        log::debug!("Frame loop joined");
        Ok(())
    }

    /// Flips drawing on or off; returns the new state
    pub fn toggle_draw(&self) -> bool {
        lock_board(&self.board).toggle_draw()
    }

    /// Removes the most recent stroke
    pub fn undo(&self) {
        lock_board(&self.board).ledger.undo();
    }

    /// Removes every stroke
    pub fn clear(&self) {
        lock_board(&self.board).ledger.clear();
        log::info!("Board cleared");
    }

    /// Writes the last composited board to `path`
    ///
    /// Returns `Ok(false)` without writing when `path` is empty or nothing
    /// has been rendered yet.
    pub fn save(&self, path: &Path) -> Result<bool, SessionError> {
        if path.as_os_str().is_empty() {
            return Ok(false);
        }
        let Some(frame) = self.last_frame() else {
            log::warn!("Nothing rendered yet, skipping save to {}", path.display());
            return Ok(false);
        };
        Ok(save_frame(&frame, path)?)
    }

    pub fn is_draw_enabled(&self) -> bool {
        lock_board(&self.board).draw_enabled
    }

    /// Number of non-empty strokes on the board
    pub fn stroke_count(&self) -> usize {
        lock_board(&self.board).ledger.stroke_count()
    }

    /// Copy of the current ledger
    pub fn ledger(&self) -> StrokeLedger {
        lock_board(&self.board).ledger.clone()
    }

    /// Last composited board snapshot
    pub fn last_frame(&self) -> Option<Arc<RenderedFrame>> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            log::error!("Session shutdown failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsStore;
    use crate::domain::landmarks::{index, Hand, Landmark};
    use crate::platform::capture::{FrameSource, LandmarkSource};
    use crate::platform::replay::{ReplayDevices, ReplayEntry, ReplayScript};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn pinch(x: f32, y: f32) -> ReplayEntry {
        let mut landmarks = vec![Landmark::new(0.5, 0.9, 0.0); index::COUNT];
        landmarks[index::INDEX_FINGER_TIP] = Landmark::new(x, y, 0.0);
        landmarks[index::THUMB_TIP] = Landmark::new(x + 0.01, y, 0.0);
        ReplayEntry::Frame {
            width: 64,
            height: 48,
            hand: Some(Hand::new(landmarks)),
        }
    }

    fn no_hand() -> ReplayEntry {
        ReplayEntry::Frame {
            width: 64,
            height: 48,
            hand: None,
        }
    }

    fn controller() -> SessionController {
        SessionController::new(SessionConfig::default(), Arc::new(SettingsStore::default()))
    }

    /// Drains events until the loop reports how it ended
    fn wait_for_end(events: &Receiver<SessionEvent>) -> SessionEvent {
        loop {
            match events.recv_timeout(TIMEOUT).expect("frame loop went silent") {
                SessionEvent::Frame(_) => continue,
                end => return end,
            }
        }
    }

    /// Replay devices that count camera releases
    struct TrackedDevices {
        inner: ReplayDevices,
        released: Arc<AtomicUsize>,
    }

    struct TrackedCamera {
        inner: Box<dyn FrameSource>,
        released: Arc<AtomicUsize>,
    }

    impl FrameSource for TrackedCamera {
        fn read_frame(&mut self) -> Result<crate::platform::capture::Frame, CaptureError> {
            self.inner.read_frame()
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl DeviceProvider for TrackedDevices {
        fn open_camera(&self) -> Result<Box<dyn FrameSource>, DeviceError> {
            Ok(Box::new(TrackedCamera {
                inner: self.inner.open_camera()?,
                released: Arc::clone(&self.released),
            }))
        }

        fn open_detector(&self) -> Result<Box<dyn LandmarkSource>, DeviceError> {
            self.inner.open_detector()
        }
    }

    #[test_log::test]
    fn replay_session_draws_and_saves() {
        let mut session = controller();
        let devices = ReplayDevices::new(ReplayScript::new(vec![
            pinch(0.2, 0.2),
            pinch(0.4, 0.2),
            no_hand(),
            pinch(0.2, 0.6),
            pinch(0.6, 0.6),
            no_hand(),
        ]));

        let events = session.start(Arc::new(devices)).unwrap();
        assert_eq!(wait_for_end(&events), SessionEvent::Finished);
        session.stop().unwrap();

        assert_eq!(session.stroke_count(), 2);
        assert!(!session.is_running());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.png");
        assert!(session.save(&path).unwrap());
        let saved = image::open(&path).unwrap();
        assert_eq!((saved.width(), saved.height()), (64, 48));
    }

    #[test]
    fn save_without_path_or_frame_is_skipped() {
        let session = controller();
        assert!(!session.save(Path::new("")).unwrap());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("early.png");
        assert!(!session.save(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn commands_mutate_the_board() {
        let mut session = controller();
        let devices = ReplayDevices::new(ReplayScript::new(vec![
            pinch(0.1, 0.1),
            pinch(0.2, 0.1),
            no_hand(),
            pinch(0.1, 0.5),
            pinch(0.2, 0.5),
            no_hand(),
        ]));
        let events = session.start(Arc::new(devices)).unwrap();
        wait_for_end(&events);

        assert_eq!(session.stroke_count(), 2);
        session.undo();
        assert_eq!(session.stroke_count(), 1);
        session.clear();
        assert!(session.ledger().is_blank());

        assert!(!session.toggle_draw());
        assert!(!session.is_draw_enabled());
        assert!(session.toggle_draw());
    }

    #[test]
    fn paused_drawing_records_nothing() {
        let mut session = controller();
        session.toggle_draw();
        let devices = ReplayDevices::new(ReplayScript::new(vec![pinch(0.3, 0.3), pinch(0.5, 0.3)]));

        let events = session.start(Arc::new(devices)).unwrap();
        assert_eq!(wait_for_end(&events), SessionEvent::Finished);
        assert!(session.ledger().is_blank());
    }

    #[test_log::test]
    fn failure_is_signaled_and_retry_keeps_board() {
        let mut session = controller();
        let devices = Arc::new(ReplayDevices::new(ReplayScript::new(vec![
            pinch(0.1, 0.1),
            pinch(0.3, 0.1),
            ReplayEntry::Failure {
                fail: "camera unplugged".to_string(),
            },
            no_hand(),
            pinch(0.1, 0.7),
            pinch(0.3, 0.7),
        ])));

        let events = session.start(devices.clone()).unwrap();
        match wait_for_end(&events) {
            SessionEvent::Failed { message } => assert!(message.contains("camera unplugged")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(session.stroke_count(), 1);

        // Retry after the loop halted on its own
        session.stop().unwrap();
        let events = session.start(devices).unwrap();
        assert_eq!(wait_for_end(&events), SessionEvent::Finished);
        assert_eq!(session.stroke_count(), 2);
    }

    #[test]
    fn retry_starts_a_fresh_stroke() {
        let mut session = controller();
        let devices = Arc::new(ReplayDevices::new(ReplayScript::new(vec![
            pinch(0.1, 0.1),
            pinch(0.2, 0.1),
            ReplayEntry::Failure {
                fail: "camera unplugged".to_string(),
            },
            pinch(0.8, 0.8),
            pinch(0.9, 0.8),
        ])));

        let events = session.start(devices.clone()).unwrap();
        assert!(matches!(wait_for_end(&events), SessionEvent::Failed { .. }));
        session.stop().unwrap();

        let events = session.start(devices).unwrap();
        assert_eq!(wait_for_end(&events), SessionEvent::Finished);

        let ledger = session.ledger();
        assert_eq!(ledger.stroke_count(), 2);
        assert_eq!(ledger.strokes()[0].len(), 2);
        assert_eq!(ledger.strokes()[1].len(), 2);
    }

    #[test]
    fn commands_interleave_safely_with_running_loop() {
        // Alternating pinch and release keeps the loop opening and closing strokes
        let entries: Vec<_> = (0..2_000)
            .map(|i| {
                if i % 7 == 6 {
                    no_hand()
                } else {
                    pinch(0.1 + (i % 7) as f32 * 0.1, 0.5)
                }
            })
            .collect();
        let devices = ReplayDevices::new(ReplayScript::new(entries))
            .with_frame_interval(Duration::from_millis(1));

        let mut session = controller();
        let _events = session.start(Arc::new(devices)).unwrap();

        let check = |ledger: StrokeLedger| {
            let strokes = ledger.strokes();
            assert!(!strokes.is_empty());
            assert!(strokes[..strokes.len() - 1].iter().all(|stroke| !stroke.is_empty()));
        };

        for round in 0..200 {
            match round % 4 {
                0 => session.undo(),
                1 | 3 => {
                    session.toggle_draw();
                }
                _ => session.clear(),
            }
            check(session.ledger());
            thread::sleep(Duration::from_millis(1));
        }

        session.stop().unwrap();
        check(session.ledger());
    }

    #[test]
    fn stop_is_idempotent_and_releases_camera() {
        let released = Arc::new(AtomicUsize::new(0));
        let endless: Vec<_> = (0..10_000).map(|i| pinch(0.1 + (i % 50) as f32 * 0.01, 0.5)).collect();
        let devices = TrackedDevices {
            inner: ReplayDevices::new(ReplayScript::new(endless))
                .with_frame_interval(Duration::from_millis(2)),
            released: Arc::clone(&released),
        };

        let mut session = controller();
        let _events = session.start(Arc::new(devices)).unwrap();
        assert!(session.is_running());
        assert!(matches!(
            session.start(Arc::new(ReplayDevices::new(ReplayScript::default()))),
            Err(SessionError::AlreadyRunning)
        ));

        session.stop().unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert!(!session.is_running());

        session.stop().unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn device_failure_is_signaled() {
        let mut session = controller();
        let events = session
            .start(Arc::new(ReplayDevices::new(ReplayScript::default())))
            .unwrap();
        match wait_for_end(&events) {
            SessionEvent::Failed { message } => assert!(message.contains("camera")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
