//! Axis-aligned collision detection
//!
//! Discrete and non-resolving: a check answers "touching or not" and which
//! edges touch. No penetration depth, no response.

use super::entity::{CollisionSides, Entity};
use super::geometry::Geometry;

/// Result of a collision check between `a` and `b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResult {
    /// Whether the boxes touch or overlap
    pub hit: bool,
    /// Touching edges of `a`
    pub a: CollisionSides,
    /// Touching edges of `b`
    pub b: CollisionSides,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            a: CollisionSides::NONE,
            b: CollisionSides::NONE,
        }
    }
}

/// Left/right tags from the horizontal center offset `dx = a.x - b.x`.
///
/// Positive dx tags `a.right` / `b.left`. Aligned centers tag both sides.
fn horizontal_sides(dx: f32) -> (CollisionSides, CollisionSides) {
    let mut a = CollisionSides::NONE;
    if dx > 0.0 {
        a.right = true;
    } else if dx < 0.0 {
        a.left = true;
    } else {
        a.left = true;
        a.right = true;
    }
    (a, a.mirrored())
}

/// Top/bottom tags from the vertical center offset `dy = a.y - b.y`.
///
/// Screen y grows downward: positive dy means `b` sits above `a`, tagging
/// `a.top` / `b.bottom`. Aligned centers tag both sides.
fn vertical_sides(dy: f32) -> (CollisionSides, CollisionSides) {
    let mut a = CollisionSides::NONE;
    if dy > 0.0 {
        a.top = true;
    } else if dy < 0.0 {
        a.bottom = true;
    } else {
        a.top = true;
        a.bottom = true;
    }
    (a, a.mirrored())
}

/// Check two boxes for contact
pub fn collide(a: &Geometry, b: &Geometry) -> CollisionResult {
    let d = a.center - b.center;
    let min = a.half_extents() + b.half_extents();

    if d.x.abs() > min.x || d.y.abs() > min.y {
        return CollisionResult::miss();
    }

    let (a_sides, b_sides) = if d.x.abs() == min.x {
        // Edge contact on the left or right only
        horizontal_sides(d.x)
    } else if d.y.abs() == min.y {
        // Edge contact on the top or bottom only
        vertical_sides(d.y)
    } else {
        let (ha, hb) = horizontal_sides(d.x);
        let (va, vb) = vertical_sides(d.y);
        (ha.union(&va), hb.union(&vb))
    };

    CollisionResult {
        hit: true,
        a: a_sides,
        b: b_sides,
    }
}

/// Check two entities and record the outcome on both.
///
/// A hit sets `colliding` and adds the touching sides; a miss clears both
/// entities' collision state.
pub fn detect(a: &mut Entity, b: &mut Entity) -> CollisionResult {
    let result = collide(&a.geometry, &b.geometry);
    if result.hit {
        a.sides = a.sides.union(&result.a);
        b.sides = b.sides.union(&result.b);
        a.colliding = true;
        b.colliding = true;
    } else {
        a.clear_collision();
        b.clear_collision();
    }
    result
}
