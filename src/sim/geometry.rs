//! Axis-aligned boxes read back from the render target
//!
//! Geometry is always derived from the element's current layout. Call
//! `compute_geometry` after moving an element and before testing it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rendered box as reported by the renderer (screen space, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBox {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutBox {
    /// Box from its top-left corner and size
    pub fn from_origin(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            bottom: top + height,
            left,
            right: left + width,
            width,
            height,
        }
    }
}

/// Edge coordinates of a box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

/// Center, size and edges of an entity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub center: Vec2,
    /// (width, height)
    pub size: Vec2,
    pub edges: Edges,
}

impl Geometry {
    /// Build geometry from edges; center and size follow from them
    pub fn from_edges(edges: Edges) -> Self {
        Self {
            center: Vec2::new(
                (edges.left + edges.right) / 2.0,
                (edges.top + edges.bottom) / 2.0,
            ),
            size: Vec2::new(edges.right - edges.left, edges.bottom - edges.top),
            edges,
        }
    }

    /// Geometry centered on `center` with the given (width, height)
    pub fn centered(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self::from_edges(Edges {
            top: center.y - half.y,
            bottom: center.y + half.y,
            left: center.x - half.x,
            right: center.x + half.x,
        })
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size / 2.0
    }
}

/// Read an element's geometry from its layout box.
///
/// Detached elements (no layout yet) yield zeroed geometry.
pub fn compute_geometry(layout: Option<LayoutBox>) -> Geometry {
    match layout {
        Some(b) => Geometry::from_edges(Edges {
            top: b.top,
            bottom: b.bottom,
            left: b.left,
            right: b.right,
        }),
        None => Geometry::default(),
    }
}
