//! Session state management
//!
//! Defines the per-frame phase machine driven by the frame loop and the
//! board state (ledger plus draw toggle) shared with the control surface.

use crate::domain::core::StrokeStyle;
use crate::domain::gesture::GestureState;
use crate::domain::ledger::StrokeLedger;

/// Phase of one frame-processing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePhase {
    /// Blocking on the camera for the next frame
    #[default]
    AwaitFrame,
    /// Running hand detection on the frame
    Classify,
    /// Updating the ledger from the gesture
    Mutate,
    /// Compositing the board
    Render,
    /// Handing the finished frame to the display sink
    Emit,
    /// The loop stopped after a failed frame read
    Halted,
}

/// Events that move a cycle between phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    FrameRead,
    FrameReadFailed,
    HandDetected,
    NoHand,
    LedgerUpdated,
    Rendered,
    Emitted,
}

/// State machine for frame phase transitions
pub struct FrameStateMachine;

impl FrameStateMachine {
    /// Processes an event and returns the next phase
    ///
    /// Events that do not apply to the current phase leave it unchanged.
    pub fn process_event(current: FramePhase, event: FrameEvent) -> FramePhase {
        let next = match (current, event) {
            (FramePhase::AwaitFrame, FrameEvent::FrameRead) => FramePhase::Classify,
            (FramePhase::AwaitFrame, FrameEvent::FrameReadFailed) => FramePhase::Halted,

            (FramePhase::Classify, FrameEvent::HandDetected) => FramePhase::Mutate,
            // Lost tracking skips extraction
            (FramePhase::Classify, FrameEvent::NoHand) => FramePhase::Render,

            (FramePhase::Mutate, FrameEvent::LedgerUpdated) => FramePhase::Render,
            (FramePhase::Render, FrameEvent::Rendered) => FramePhase::Emit,
            (FramePhase::Emit, FrameEvent::Emitted) => FramePhase::AwaitFrame,

            (state, _) => state,
        };
        log::trace!("FRAME PHASE: {current:?} -> {next:?} on {event:?}");
        next
    }
}

/// Ledger and draw toggle, mutated as one unit
///
/// Kept behind a single lock so toggling (flip plus boundary) and the frame
/// loop's check-then-append can never interleave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub ledger: StrokeLedger,
    pub draw_enabled: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            ledger: StrokeLedger::new(),
            draw_enabled: true,
        }
    }
}

/// Outcome of applying one frame's gesture to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureOutcome {
    /// A point was appended to the open stroke
    pub appended: bool,
    /// The cursor indicator should be drawn
    pub show_indicator: bool,
}

impl BoardState {
    /// Flips drawing on or off and closes the open stroke
    pub fn toggle_draw(&mut self) -> bool {
        self.draw_enabled = !self.draw_enabled;
        self.ledger.check_boundary();
        log::info!("Drawing: {}", if self.draw_enabled { "ON" } else { "OFF" });
        self.draw_enabled
    }

    /// Applies a classified gesture from a frame with a visible hand
    ///
    /// An inactive gesture closes the open stroke. An active one appends when
    /// drawing is enabled, otherwise it asks for the indicator.
    pub fn apply_gesture(&mut self, gesture: &GestureState, style: StrokeStyle) -> GestureOutcome {
        if !gesture.active {
            self.ledger.check_boundary();
            return GestureOutcome::default();
        }

        let appended = self.ledger.append(self.draw_enabled, gesture, style);
        GestureOutcome {
            appended,
            show_indicator: !self.draw_enabled && !appended && gesture.point.is_some(),
        }
    }

    /// Handles a frame without a visible hand
    pub fn hand_lost(&mut self) {
        self.ledger.check_boundary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::{Point, Rgb};

    fn style() -> StrokeStyle {
        StrokeStyle::new(6, Rgb::new(0, 255, 0))
    }

    fn gesture(active: bool) -> GestureState {
        GestureState {
            active,
            point: Some(Point::new(4, 4)),
        }
    }

    #[test]
    fn default_phase_awaits_frame() {
        assert_eq!(FramePhase::default(), FramePhase::AwaitFrame);
    }

    #[test]
    fn full_cycle_with_hand() {
        let mut phase = FramePhase::AwaitFrame;
        for (event, expected) in [
            (FrameEvent::FrameRead, FramePhase::Classify),
            (FrameEvent::HandDetected, FramePhase::Mutate),
            (FrameEvent::LedgerUpdated, FramePhase::Render),
            (FrameEvent::Rendered, FramePhase::Emit),
            (FrameEvent::Emitted, FramePhase::AwaitFrame),
        ] {
            phase = FrameStateMachine::process_event(phase, event);
            assert_eq!(phase, expected);
        }
    }

    #[test]
    fn no_hand_skips_mutation() {
        let phase = FrameStateMachine::process_event(FramePhase::Classify, FrameEvent::NoHand);
        assert_eq!(phase, FramePhase::Render);
    }

    #[test]
    fn read_failure_halts() {
        let phase =
            FrameStateMachine::process_event(FramePhase::AwaitFrame, FrameEvent::FrameReadFailed);
        assert_eq!(phase, FramePhase::Halted);

        // Halted is terminal
        let phase = FrameStateMachine::process_event(phase, FrameEvent::FrameRead);
        assert_eq!(phase, FramePhase::Halted);
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let phase = FrameStateMachine::process_event(FramePhase::Render, FrameEvent::HandDetected);
        assert_eq!(phase, FramePhase::Render);
    }

    #[test]
    fn toggle_flips_and_closes_stroke() {
        let mut board = BoardState::default();
        assert!(board.draw_enabled);
        board.apply_gesture(&gesture(true), style());

        assert!(!board.toggle_draw());
        assert_eq!(board.ledger.strokes().len(), 2);
        assert!(board.ledger.current().is_empty());

        assert!(board.toggle_draw());
        assert_eq!(board.ledger.strokes().len(), 2);
    }

    #[test]
    fn active_gesture_appends_when_enabled() {
        let mut board = BoardState::default();
        let outcome = board.apply_gesture(&gesture(true), style());
        assert_eq!(
            outcome,
            GestureOutcome {
                appended: true,
                show_indicator: false
            }
        );
        assert_eq!(board.ledger.current().len(), 1);
    }

    #[test]
    fn active_gesture_shows_indicator_when_disabled() {
        let mut board = BoardState::default();
        board.toggle_draw();
        let before = board.ledger.clone();

        let outcome = board.apply_gesture(&gesture(true), style());

        assert!(outcome.show_indicator);
        assert!(!outcome.appended);
        assert_eq!(board.ledger, before);
    }

    #[test]
    fn inactive_gesture_and_lost_hand_close_stroke() {
        let mut board = BoardState::default();
        board.apply_gesture(&gesture(true), style());
        let outcome = board.apply_gesture(&gesture(false), style());
        assert_eq!(outcome, GestureOutcome::default());
        assert_eq!(board.ledger.strokes().len(), 2);

        board.apply_gesture(&gesture(true), style());
        board.hand_lost();
        assert_eq!(board.ledger.strokes().len(), 3);
        assert_eq!(board.ledger.stroke_count(), 2);
    }
}
