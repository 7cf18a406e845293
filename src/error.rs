//! Error types
//!
//! Only startup and configuration problems are errors. Runtime oddities
//! (late callbacks, drags off-screen, double clicks) are absorbed by state flags.

use thiserror::Error;

/// Game error type
#[derive(Debug, Error)]
pub enum GameError {
    /// Image manifest cannot cover a full session
    #[error("image manifest has {available} entries, a session needs {needed}")]
    ManifestTooShort { needed: usize, available: usize },

    /// Render target missing at mount time
    #[error("mount point not found: {0}")]
    MountMissing(String),

    /// Target list is not the four distinct corners
    #[error("invalid targets: {0}")]
    InvalidTargets(String),

    /// Rule values out of range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Malformed JSON configuration
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// Renderer backend failure
    #[error("render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
