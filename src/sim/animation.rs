//! Per-frame fall of the moving card
//!
//! The fall runs as an explicit task owned by the session: started when a
//! set begins, cancelled when the answer locks in or the set is torn down.

use glam::Vec2;

use super::entity::MovingCard;
use super::geometry::Edges;

/// Whether the host should schedule another animation frame for this task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    Continue,
    Stop,
}

/// Handle for one card's fall animation
#[derive(Debug, Clone)]
pub struct AnimationTask {
    id: u64,
    step: f32,
    cancelled: bool,
    frames: u64,
}

impl AnimationTask {
    pub fn start(id: u64, step: f32) -> Self {
        log::trace!("Animation task {} started (step {})", id, step);
        Self {
            id,
            step,
            cancelled: false,
            frames: 0,
        }
    }

    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::trace!("Animation task {} cancelled after {} frames", self.id, self.frames);
        }
        self.cancelled = true;
    }

    pub fn is_running(&self) -> bool {
        !self.cancelled
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance one frame.
    ///
    /// The fall accumulates every frame but is only applied while the card is
    /// not held, so a released card catches up on the distance it missed.
    /// Returns the card's new top-left when it moved.
    pub fn step(&mut self, card: &mut MovingCard, edges: &Edges) -> (FrameRequest, Option<Vec2>) {
        if self.cancelled || !card.active {
            self.cancel();
            return (FrameRequest::Stop, None);
        }

        self.frames += 1;
        card.accumulator += self.step;
        if card.dragging {
            return (FrameRequest::Continue, None);
        }

        let pos = Vec2::new(edges.left, edges.top + card.accumulator);
        card.accumulator = 0.0;
        (FrameRequest::Continue, Some(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> MovingCard {
        MovingCard {
            nationality: "japanese".into(),
            dragging: false,
            active: true,
            accumulator: 0.0,
        }
    }

    fn edges(left: f32, top: f32) -> Edges {
        Edges {
            top,
            bottom: top + 200.0,
            left,
            right: left + 150.0,
        }
    }

    #[test]
    fn test_falls_one_step_per_frame() {
        let mut task = AnimationTask::start(1, 1.0);
        let mut c = card();
        let (req, pos) = task.step(&mut c, &edges(320.0, 0.0));
        assert_eq!(req, FrameRequest::Continue);
        assert_eq!(pos, Some(Vec2::new(320.0, 1.0)));
        assert_eq!(c.accumulator, 0.0);
        assert_eq!(task.frames(), 1);
    }

    #[test]
    fn test_held_card_catches_up_on_release() {
        let mut task = AnimationTask::start(1, 2.0);
        let mut c = card();
        c.dragging = true;
        for _ in 0..3 {
            assert_eq!(task.step(&mut c, &edges(0.0, 50.0)), (FrameRequest::Continue, None));
        }
        assert_eq!(c.accumulator, 6.0);

        c.dragging = false;
        let (_, pos) = task.step(&mut c, &edges(0.0, 50.0));
        assert_eq!(pos, Some(Vec2::new(0.0, 58.0)));
    }

    #[test]
    fn test_stops_when_cancelled_or_inactive() {
        let mut task = AnimationTask::start(1, 1.0);
        let mut c = card();
        task.cancel();
        assert_eq!(task.step(&mut c, &edges(0.0, 0.0)), (FrameRequest::Stop, None));
        assert!(!task.is_running());

        let mut task = AnimationTask::start(2, 1.0);
        c.active = false;
        assert_eq!(task.step(&mut c, &edges(0.0, 0.0)), (FrameRequest::Stop, None));
        assert!(!task.is_running());
        assert_eq!(task.frames(), 0);
    }
}
