//! Stroke ledger: the persistent, editable collection of drawn strokes
//!
//! The ledger always holds at least one stroke. The last stroke is the open
//! ("current") stroke that receives new points; every stroke before it is
//! closed and non-empty. A trailing empty stroke only exists as the
//! receptacle for future points.

use log::debug;

use crate::domain::core::{Point, StrokeStyle};
use crate::domain::gesture::GestureState;

/// A recorded point together with the style active when it was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrokePoint {
    pub point: Point,
    pub style: StrokeStyle,
}

/// Straight segment between two consecutive stroke points
///
/// Drawn with the style of the earlier point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub style: StrokeStyle,
}

/// One continuous gesture-drawn line, in temporal order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stroke {
    points: Vec<StrokePoint>,
}

impl Stroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Segments between consecutive points; empty for strokes with fewer than 2 points
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|pair| Segment {
            from: pair[0].point,
            to: pair[1].point,
            style: pair[0].style,
        })
    }

    fn push(&mut self, point: Point, style: StrokeStyle) {
        self.points.push(StrokePoint { point, style });
    }
}

/// Ordered collection of strokes with open/closed stroke tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrokeLedger {
    strokes: Vec<Stroke>,
}

impl Default for StrokeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeLedger {
    /// Creates a ledger holding one empty open stroke
    pub fn new() -> Self {
        Self {
            strokes: vec![Stroke::new()],
        }
    }

    /// All strokes, the open one last
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// The open stroke that receives new points
    pub fn current(&self) -> &Stroke {
        // The ledger is never empty
        &self.strokes[self.strokes.len() - 1]
    }

    /// Number of non-empty strokes
    pub fn stroke_count(&self) -> usize {
        self.strokes.iter().filter(|stroke| !stroke.is_empty()).count()
    }

    /// True when nothing has been drawn
    pub fn is_blank(&self) -> bool {
        self.strokes.len() == 1 && self.current().is_empty()
    }

    /// Appends the gesture's point to the open stroke
    ///
    /// # Arguments
    /// * `draw_enabled` - User toggle; nothing is recorded while it is off
    /// * `gesture` - This frame's classification, recorded only when active
    /// * `style` - Thickness and color frozen into the new point
    ///
    /// # Returns
    /// Whether a point was recorded
    pub fn append(&mut self, draw_enabled: bool, gesture: &GestureState, style: StrokeStyle) -> bool {
        if !draw_enabled {
            return false;
        }
        let Some(point) = gesture.active_point() else {
            return false;
        };
        self.current_mut().push(point, style);
        true
    }

    /// Closes the open stroke if it has points, opening a fresh empty one
    ///
    /// Idempotent while the open stroke is empty.
    pub fn check_boundary(&mut self) {
        if !self.current().is_empty() {
            self.strokes.push(Stroke::new());
            debug!("Stroke closed, {} strokes on the board", self.stroke_count());
        }
    }

    /// Removes the most recent stroke
    ///
    /// A non-empty open stroke is discarded on its own. An empty open stroke
    /// is removed together with the closed stroke before it. The ledger is
    /// then left with a trailing empty stroke, or reset when nothing remains.
    pub fn undo(&mut self) {
        let remove = if self.current().is_empty() { 2 } else { 1 };
        self.strokes.truncate(self.strokes.len().saturating_sub(remove));

        if self.strokes.is_empty() {
            self.clear();
        } else {
            self.check_boundary();
        }
        debug!("Undo, {} strokes on the board", self.stroke_count());
    }

    /// Discards every stroke, leaving one empty open stroke
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.strokes.push(Stroke::new());
    }

    fn current_mut(&mut self) -> &mut Stroke {
        let last = self.strokes.len() - 1;
        &mut self.strokes[last]
    }
}
