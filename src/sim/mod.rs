//! Game logic
//!
//! Geometry, collision, gesture and animation code here is pure: no renderer,
//! no platform calls, no wall clock. `session` ties them together and talks
//! to the world only through the `Renderer` capability.

pub mod animation;
pub mod collision;
pub mod entity;
pub mod gesture;
pub mod geometry;
pub mod schedule;
pub mod session;

pub use animation::{AnimationTask, FrameRequest};
pub use collision::{CollisionResult, collide, detect};
pub use entity::{CollisionSides, Corner, Entity, EntityKind, FixedTarget, MovingCard};
pub use geometry::{Edges, Geometry, LayoutBox, compute_geometry};
pub use gesture::{DragGesture, DragUpdate};
pub use schedule::{Scheduler, TimerId};
pub use session::{GameEvent, Session, SessionPhase};
