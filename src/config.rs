//! Game rules, layout and image manifest
//!
//! Everything tunable lives here. The manifest is read-only data drained one
//! image per set; it is validated up front so a session never runs dry.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, Result};
use crate::sim::Corner;

/// One portrait in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub nationality: String,
    pub url: String,
}

impl ImageEntry {
    pub fn new(nationality: &str, url: &str) -> Self {
        Self {
            nationality: nationality.to_string(),
            url: url.to_string(),
        }
    }
}

/// One corner answer box
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub nationality: String,
    pub corner: Corner,
    pub flag_url: String,
}

/// Element ids the game mounts under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mounts {
    /// Page wrapper holding header and play area
    pub root: String,
    /// Play area holding cards, targets and the modal
    pub play_area: String,
}

impl Default for Mounts {
    fn default() -> Self {
        Self {
            root: ROOT_MOUNT.to_string(),
            play_area: PLAY_AREA_MOUNT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Session ===
    pub sets_per_session: u32,
    pub correct_points: i32,
    pub wrong_points: i32,
    /// Shuffle the manifest at each reset (None keeps manifest order)
    pub shuffle_seed: Option<u64>,

    // === Motion ===
    pub fall_step: f32,
    pub drag_threshold: f32,

    // === Timing ===
    pub collision_interval_ms: f64,
    pub answer_travel_ms: f64,
    pub result_delay_ms: f64,

    // === Layout ===
    /// (width, height)
    pub card_size: Vec2,
    /// Card start position as a fraction of the viewport width
    pub card_left_fraction: f32,
    pub target_size: Vec2,
    pub target_margin: f32,
    pub mounts: Mounts,

    /// Check the card against every target each tick, not only the first
    pub collide_all_targets: bool,

    pub targets: Vec<TargetSpec>,
    pub manifest: Vec<ImageEntry>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sets_per_session: SETS_PER_SESSION,
            correct_points: CORRECT_POINTS,
            wrong_points: WRONG_POINTS,
            shuffle_seed: None,

            fall_step: FALL_STEP,
            drag_threshold: DRAG_THRESHOLD,

            collision_interval_ms: COLLISION_INTERVAL_MS,
            answer_travel_ms: ANSWER_TRAVEL_MS,
            result_delay_ms: RESULT_DELAY_MS,

            card_size: Vec2::new(CARD_WIDTH, CARD_HEIGHT),
            card_left_fraction: CARD_LEFT_FRACTION,
            target_size: Vec2::new(TARGET_WIDTH, TARGET_HEIGHT),
            target_margin: TARGET_MARGIN,
            mounts: Mounts::default(),

            collide_all_targets: false,

            targets: default_targets(),
            manifest: default_manifest(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sets_per_session == 0 {
            return Err(GameError::InvalidConfig("sets_per_session must be > 0".into()));
        }
        if !(self.fall_step > 0.0) || !(self.drag_threshold > 0.0) {
            return Err(GameError::InvalidConfig(
                "fall_step and drag_threshold must be > 0".into(),
            ));
        }
        if !(self.collision_interval_ms > 0.0)
            || self.answer_travel_ms < 0.0
            || self.result_delay_ms < 0.0
        {
            return Err(GameError::InvalidConfig("timings out of range".into()));
        }
        if self.card_size.min_element() <= 0.0 || self.target_size.min_element() <= 0.0 {
            return Err(GameError::InvalidConfig("sizes must be > 0".into()));
        }

        if self.targets.len() != Corner::ALL.len() {
            return Err(GameError::InvalidTargets(format!(
                "expected {} targets, got {}",
                Corner::ALL.len(),
                self.targets.len()
            )));
        }
        let corners: HashSet<Corner> = self.targets.iter().map(|t| t.corner).collect();
        if corners.len() != self.targets.len() {
            return Err(GameError::InvalidTargets("corners must be distinct".into()));
        }
        if self.targets.iter().any(|t| t.nationality.is_empty()) {
            return Err(GameError::InvalidTargets("empty nationality".into()));
        }

        let needed = self.sets_per_session as usize;
        if self.manifest.len() < needed {
            return Err(GameError::ManifestTooShort {
                needed,
                available: self.manifest.len(),
            });
        }

        let known: HashSet<&str> = self.targets.iter().map(|t| t.nationality.as_str()).collect();
        for image in &self.manifest {
            if !known.contains(image.nationality.as_str()) {
                log::warn!(
                    "Image {} has nationality '{}' with no target; it can never be answered correctly",
                    image.url,
                    image.nationality
                );
            }
        }

        Ok(())
    }

    /// Target configured for a corner
    pub fn target_at(&self, corner: Corner) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.corner == corner)
    }

    /// Fresh image queue for one session
    pub fn image_queue(&self, rng: Option<&mut Pcg32>) -> VecDeque<ImageEntry> {
        let mut images = self.manifest.clone();
        if let Some(rng) = rng {
            images.shuffle(rng);
        }
        images.into()
    }

    /// Load config from the page (WASM only)
    ///
    /// Reads JSON from `<script id="flag-drop-config" type="application/json">`.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::CONFIG_ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded config from #{}", Self::CONFIG_ELEMENT_ID);
                    return config;
                }
                Err(e) => log::warn!("Ignoring page config: {}", e),
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Element holding page-supplied JSON config
    #[cfg(target_arch = "wasm32")]
    const CONFIG_ELEMENT_ID: &'static str = "flag-drop-config";

    /// Native default
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    /// Read a JSON config file (native only)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| GameError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

fn default_targets() -> Vec<TargetSpec> {
    [
        ("japanese", Corner::TopLeft, "images/flags/japan_flag.png"),
        ("chineese", Corner::TopRight, "images/flags/china_flag.png"),
        ("korean", Corner::BottomLeft, "images/flags/korea.png"),
        ("thai", Corner::BottomRight, "images/flags/thailand.png"),
    ]
    .into_iter()
    .map(|(nationality, corner, flag_url)| TargetSpec {
        nationality: nationality.to_string(),
        corner,
        flag_url: flag_url.to_string(),
    })
    .collect()
}

fn default_manifest() -> Vec<ImageEntry> {
    [
        ("japanese", "images/japan17.jpeg"),
        ("korean", "images/korea8.jpeg"),
        ("chineese", "images/chin2.jpg"),
        ("chineese", "images/chin9.jpg"),
        ("korean", "images/korea1.jpeg"),
        ("japanese", "images/japan20.jpg"),
        ("japanese", "images/japan10.jpg"),
        ("thai", "images/thai8.jpg"),
        ("japanese", "images/japan14.jpg"),
        ("chineese", "images/chin1.jpg"),
        ("chineese", "images/chin11.jpg"),
        ("japanese", "images/japan8.jpg"),
        ("chineese", "images/chin13.jpg"),
        ("japanese", "images/japan20.jpg"),
        ("japanese", "images/japan6.jpg"),
        ("chineese", "images/chin16.jpg"),
        ("thai", "images/thai10.jpg"),
        ("japanese", "images/japan4.jpg"),
        ("korean", "images/korea3.jpeg"),
        ("thai", "images/thai4.jpg"),
        ("japanese", "images/japan20.jpg"),
        ("thai", "images/thai1.jpg"),
        ("thai", "images/thai13.png"),
        ("japanese", "images/japan16.jpg"),
        ("chineese", "images/chin6.jpg"),
        ("korean", "images/korea6.jpeg"),
        ("thai", "images/thai6.jpg"),
        ("japanese", "images/japan11.jpeg"),
        ("japanese", "images/japan9.jpg"),
        ("chineese", "images/chin4.jpeg"),
    ]
    .into_iter()
    .map(|(nationality, url)| ImageEntry::new(nationality, url))
    .collect()
}
