//! Game entities
//!
//! One `Entity` record for every positioned object. Behavior differs by
//! `EntityKind`; geometry and collision state are shared.

use serde::{Deserialize, Serialize};

use super::geometry::{Geometry, LayoutBox, compute_geometry};

/// Screen corner a fixed target sits in, and the answer a gesture selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// Corner selected by a drag vector's direction (screen space, y down).
    /// Zero counts as left / top.
    pub fn from_direction(dx: f32, dy: f32) -> Self {
        match (dx > 0.0, dy > 0.0) {
            (true, true) => Corner::BottomRight,
            (true, false) => Corner::TopRight,
            (false, true) => Corner::BottomLeft,
            (false, false) => Corner::TopLeft,
        }
    }

    /// CSS position class
    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top-left",
            Corner::TopRight => "top-right",
            Corner::BottomLeft => "bottom-left",
            Corner::BottomRight => "bottom-right",
        }
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }
}

/// Which edges of an entity touch another entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionSides {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl CollisionSides {
    pub const NONE: Self = Self {
        top: false,
        bottom: false,
        left: false,
        right: false,
    };

    /// The sides the other entity of a pair sees (top <-> bottom, left <-> right)
    pub fn mirrored(&self) -> Self {
        Self {
            top: self.bottom,
            bottom: self.top,
            left: self.right,
            right: self.left,
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            top: self.top || other.top,
            bottom: self.bottom || other.bottom,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.top || self.bottom || self.left || self.right)
    }
}

/// A corner answer box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedTarget {
    pub nationality: String,
    pub corner: Corner,
}

/// The falling portrait card of the current set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingCard {
    pub nationality: String,
    /// Pointer is holding the card
    pub dragging: bool,
    /// Card still falls and takes part in collision checks
    pub active: bool,
    /// Fall distance not yet applied to the layout
    pub accumulator: f32,
}

/// Entity behavior tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Fixed(FixedTarget),
    Moving(MovingCard),
    /// Degenerate floor sentinel at the bottom of the viewport
    Boundary,
}

/// A positioned, sized game object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub kind: EntityKind,
    pub geometry: Geometry,
    pub sides: CollisionSides,
    pub colliding: bool,
}

impl Entity {
    pub fn new(id: u32, kind: EntityKind) -> Self {
        Self {
            id,
            kind,
            geometry: Geometry::default(),
            sides: CollisionSides::NONE,
            colliding: false,
        }
    }

    pub fn fixed(id: u32, nationality: impl Into<String>, corner: Corner) -> Self {
        Self::new(
            id,
            EntityKind::Fixed(FixedTarget {
                nationality: nationality.into(),
                corner,
            }),
        )
    }

    pub fn moving(id: u32, nationality: impl Into<String>) -> Self {
        Self::new(
            id,
            EntityKind::Moving(MovingCard {
                nationality: nationality.into(),
                dragging: false,
                active: false,
                accumulator: 0.0,
            }),
        )
    }

    pub fn boundary(id: u32) -> Self {
        Self::new(id, EntityKind::Boundary)
    }

    /// Re-derive geometry from the current layout
    pub fn refresh(&mut self, layout: Option<LayoutBox>) {
        self.geometry = compute_geometry(layout);
    }

    pub fn clear_collision(&mut self) {
        self.sides = CollisionSides::NONE;
        self.colliding = false;
    }

    pub fn nationality(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Fixed(t) => Some(&t.nationality),
            EntityKind::Moving(c) => Some(&c.nationality),
            EntityKind::Boundary => None,
        }
    }

    pub fn corner(&self) -> Option<Corner> {
        match &self.kind {
            EntityKind::Fixed(t) => Some(t.corner),
            _ => None,
        }
    }

    pub fn as_moving(&self) -> Option<&MovingCard> {
        match &self.kind {
            EntityKind::Moving(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_moving_mut(&mut self) -> Option<&mut MovingCard> {
        match &mut self.kind {
            EntityKind::Moving(c) => Some(c),
            _ => None,
        }
    }
}
