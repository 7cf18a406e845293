//! Drag gesture classification
//!
//! A single-shot recognizer: pointer movement accumulates while the card is
//! held, and the first move that crosses the threshold commits one of the
//! four corner answers. After a commit the gesture ignores further input
//! until `reset` is called for the next card.

use glam::Vec2;

use super::entity::Corner;
use crate::consts::DRAG_THRESHOLD;

/// Outcome of feeding one pointer move to the gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// Not dragging, or already committed
    Ignored,
    /// Still below threshold; move the card's top-left here
    Track(Vec2),
    /// Threshold crossed; the answer is locked in
    Commit(Corner),
}

#[derive(Debug, Clone)]
pub struct DragGesture {
    threshold: f32,
    /// Pointer offset inside the card at pointer-down
    origin: Vec2,
    cumulative: Vec2,
    dragging: bool,
    committed: bool,
}

impl Default for DragGesture {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD)
    }
}

impl DragGesture {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            origin: Vec2::ZERO,
            cumulative: Vec2::ZERO,
            dragging: false,
            committed: false,
        }
    }

    /// Pointer pressed on the card
    pub fn begin(&mut self, origin: Vec2) {
        if self.committed {
            return;
        }
        self.origin = origin;
        self.cumulative = Vec2::ZERO;
        self.dragging = true;
    }

    /// Pointer released before the threshold; accumulated movement is dropped
    pub fn end(&mut self) {
        self.dragging = false;
        self.cumulative = Vec2::ZERO;
    }

    /// Feed one pointer move: `client` is the pointer position, `movement`
    /// the per-event delta.
    pub fn update(&mut self, client: Vec2, movement: Vec2) -> DragUpdate {
        if !self.dragging || self.committed {
            return DragUpdate::Ignored;
        }

        self.cumulative += movement;
        if self.crossed() {
            self.committed = true;
            self.dragging = false;
            DragUpdate::Commit(Corner::from_direction(self.cumulative.x, self.cumulative.y))
        } else {
            DragUpdate::Track(client - self.origin)
        }
    }

    /// Horizontal movement only counts once both axes have moved
    fn crossed(&self) -> bool {
        let c = self.cumulative;
        (c.x != 0.0 && c.y != 0.0 && c.x.abs() > self.threshold) || c.y.abs() > self.threshold
    }

    /// Arm the gesture for a new card
    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn cumulative(&self) -> Vec2 {
        self.cumulative
    }
}
