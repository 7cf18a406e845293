//! Renderer capability
//!
//! The game never touches the page directly. It creates, styles and removes
//! elements through this trait, reads back their layout, and receives pointer
//! input for elements it subscribed to.

use glam::Vec2;

use crate::error::Result;
use crate::sim::LayoutBox;

/// Opaque reference to a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(pub u32);

/// Ordered inline style declarations (CSS property names, kebab-case)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder form of `set`
    pub fn with(mut self, property: &str, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Set a property, replacing an earlier value
    pub fn set(&mut self, property: &str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value,
            None => self.0.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Apply every declaration of `other` on top of this map
    pub fn merge(&mut self, other: &StyleMap) {
        for (p, v) in other.iter() {
            self.set(p, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything needed to create one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub styles: StyleMap,
    pub attributes: Vec<(String, String)>,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    /// Space-separated class list
    pub fn classes(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    pub fn styles(mut self, styles: StyleMap) -> Self {
        self.styles.merge(&styles);
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.push((name.to_string(), value.into()));
        self
    }

    /// Value of the `id` attribute, if any
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == "id")
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
}

/// One pointer event on a subscribed element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub target: ElementHandle,
    pub kind: PointerKind,
    /// Pointer position in the viewport
    pub client: Vec2,
    /// Pointer position inside the target element
    pub offset: Vec2,
    /// Movement since the previous pointer event
    pub movement: Vec2,
}

pub trait Renderer {
    /// Create an element and attach it under the element whose id is `mount`
    fn create_element(&mut self, mount: &str, spec: &ElementSpec) -> Result<ElementHandle>;

    fn set_inline_styles(&mut self, handle: ElementHandle, styles: &StyleMap);

    /// Replace the element's content with an HTML fragment
    fn render(&mut self, handle: ElementHandle, html: &str);

    fn remove_element(&mut self, handle: ElementHandle);

    /// Remove every element under the mount point (the mount itself stays)
    fn remove_all_under_mount(&mut self, mount: &str);

    /// Current rendered box, or None when the element has no layout
    fn query_layout_box(&self, handle: ElementHandle) -> Option<LayoutBox>;

    /// Viewport size (width, height)
    fn viewport(&self) -> Vec2;

    /// Start delivering pointer down/move/up events for this element
    fn subscribe_pointer(&mut self, handle: ElementHandle) -> Result<()>;

    /// Take pointer events received since the last call, oldest first
    fn drain_pointer_events(&mut self) -> Vec<PointerInput>;
}

/// Parse a CSS length in px or % (of `reference`)
pub fn parse_length(value: &str, reference: f32) -> Option<f32> {
    let value = value.trim();
    if let Some(px) = value.strip_suffix("px") {
        px.trim().parse().ok()
    } else if let Some(pct) = value.strip_suffix('%') {
        pct.trim().parse::<f32>().ok().map(|p| p / 100.0 * reference)
    } else {
        value.parse().ok()
    }
}

/// Format a length in px
pub fn px(value: f32) -> String {
    format!("{}px", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_map_replaces() {
        let mut styles = StyleMap::new().with("top", "0px").with("left", "40%");
        styles.set("top", "10px");
        assert_eq!(styles.get("top"), Some("10px"));
        assert_eq!(styles.iter().count(), 2);

        styles.merge(&StyleMap::new().with("left", "5px").with("opacity", "0"));
        assert_eq!(styles.get("left"), Some("5px"));
        assert_eq!(styles.get("opacity"), Some("0"));
    }

    #[test]
    fn test_element_spec_builder() {
        let spec = ElementSpec::new("div")
            .classes("box  target-box top-left")
            .attr("id", "nat-thai");
        assert_eq!(spec.classes, vec!["box", "target-box", "top-left"]);
        assert_eq!(spec.id(), Some("nat-thai"));
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("150px", 0.0), Some(150.0));
        assert_eq!(parse_length("40%", 800.0), Some(320.0));
        assert_eq!(parse_length("12.5", 0.0), Some(12.5));
        assert_eq!(parse_length("auto", 100.0), None);
        assert_eq!(px(3.5), "3.5px");
    }
}
