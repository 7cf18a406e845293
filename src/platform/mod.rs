//! Platform abstraction layer
//!
//! - `renderer`: the capability the game renders through
//! - `headless`: in-memory backend (native demo, tests)
//! - `dom`: browser backend (wasm32)

#[cfg(target_arch = "wasm32")]
pub mod dom;
pub mod headless;
pub mod renderer;

#[cfg(target_arch = "wasm32")]
pub use dom::DomRenderer;
pub use headless::{HeadlessClock, HeadlessRenderer, run_for};
pub use renderer::{
    ElementHandle, ElementSpec, PointerInput, PointerKind, Renderer, StyleMap, parse_length, px,
};
