//! Flag Drop - a drag-to-answer nationality quiz
//!
//! Core modules:
//! - `sim`: Game logic (geometry, collision, gestures, animation, session)
//! - `platform`: Renderer capability with headless and DOM backends
//! - `config`: Data-driven game rules and image manifest
//! - `ui`: Scoreboard and modal markup

pub mod config;
pub mod error;
pub mod platform;
pub mod sim;
pub mod ui;

pub use config::{GameConfig, ImageEntry, TargetSpec};
pub use error::{GameError, Result};

/// Game configuration constants
pub mod consts {
    /// Sets played before the results modal
    pub const SETS_PER_SESSION: u32 = 10;

    /// Vertical fall per animation frame (layout units)
    pub const FALL_STEP: f32 = 1.0;
    /// Accumulated drag distance that commits an answer
    pub const DRAG_THRESHOLD: f32 = 20.0;

    /// Collision sampling period
    pub const COLLISION_INTERVAL_MS: f64 = 100.0;
    /// Card travel time toward the chosen target before scoring
    pub const ANSWER_TRAVEL_MS: f64 = 600.0;
    /// Result animation time before the set is cleared
    pub const RESULT_DELAY_MS: f64 = 1000.0;

    /// Score deltas
    pub const CORRECT_POINTS: i32 = 20;
    pub const WRONG_POINTS: i32 = -5;

    /// Moving card defaults
    pub const CARD_WIDTH: f32 = 150.0;
    pub const CARD_HEIGHT: f32 = 200.0;
    pub const CARD_LEFT_FRACTION: f32 = 0.4;

    /// Corner target defaults
    pub const TARGET_WIDTH: f32 = 160.0;
    pub const TARGET_HEIGHT: f32 = 180.0;
    pub const TARGET_MARGIN: f32 = 24.0;

    /// Mount point ids
    pub const ROOT_MOUNT: &str = "page-wrapper";
    pub const PLAY_AREA_MOUNT: &str = "gameplay-area";
}

/// Upper-case the first character ("korean" -> "Korean")
pub fn display_name(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("korean"), "Korean");
        assert_eq!(display_name("t"), "T");
        assert_eq!(display_name(""), "");
    }
}
