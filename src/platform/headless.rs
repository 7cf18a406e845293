//! In-memory renderer
//!
//! Keeps an element tree with inline styles and derives layout from
//! `top`/`left`/`bottom`/`right`/`width`/`height` declarations, everything
//! positioned against the viewport. Used by the native demo and by tests,
//! which inject pointer input with `push_pointer`.
//!
//! `HeadlessClock` and `run_for` stand in for the browser's
//! `requestAnimationFrame` loop and collision `setInterval`.

use std::collections::{BTreeMap, HashSet, VecDeque};

use glam::Vec2;

use super::renderer::{ElementHandle, ElementSpec, PointerInput, PointerKind, Renderer, StyleMap, parse_length};
use crate::consts::ROOT_MOUNT;
use crate::error::{GameError, Result};
use crate::sim::{LayoutBox, Session};

#[derive(Debug, Clone)]
pub struct HeadlessElement {
    pub tag: String,
    pub classes: Vec<String>,
    pub styles: StyleMap,
    pub attributes: Vec<(String, String)>,
    pub html: String,
    /// Id of the mount this element was attached under
    pub mount: String,
    pub pointer: bool,
}

impl HeadlessElement {
    pub fn id(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == "id")
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug)]
pub struct HeadlessRenderer {
    viewport: Vec2,
    /// Mount ids that exist outside the game (the host page)
    static_mounts: HashSet<String>,
    elements: BTreeMap<ElementHandle, HeadlessElement>,
    next_handle: u32,
    pointer_queue: VecDeque<PointerInput>,
}

impl HeadlessRenderer {
    /// Page with the default root mount
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_mounts(width, height, &[ROOT_MOUNT])
    }

    pub fn with_mounts(width: f32, height: f32, mounts: &[&str]) -> Self {
        Self {
            viewport: Vec2::new(width, height),
            static_mounts: mounts.iter().map(|m| m.to_string()).collect(),
            elements: BTreeMap::new(),
            next_handle: 1,
            pointer_queue: VecDeque::new(),
        }
    }

    pub fn element(&self, handle: ElementHandle) -> Option<&HeadlessElement> {
        self.elements.get(&handle)
    }

    pub fn contains(&self, handle: ElementHandle) -> bool {
        self.elements.contains_key(&handle)
    }

    pub fn element_by_id(&self, id: &str) -> Option<ElementHandle> {
        self.elements
            .iter()
            .find(|(_, el)| el.id() == Some(id))
            .map(|(h, _)| *h)
    }

    pub fn elements_with_class(&self, class: &str) -> Vec<ElementHandle> {
        self.elements
            .iter()
            .filter(|(_, el)| el.has_class(class))
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Queue a pointer event; dropped unless the target is subscribed
    pub fn push_pointer(&mut self, input: PointerInput) {
        match self.elements.get(&input.target) {
            Some(el) if el.pointer => self.pointer_queue.push_back(input),
            _ => log::trace!("Dropping pointer event for unsubscribed {:?}", input.target),
        }
    }

    /// Queue a full press-move-release on `target`.
    ///
    /// The press lands at `offset` inside the element; each delta moves the
    /// pointer from `start`.
    pub fn push_drag(
        &mut self,
        target: ElementHandle,
        start: Vec2,
        offset: Vec2,
        deltas: &[Vec2],
        release: bool,
    ) {
        let mut client = start;
        self.push_pointer(PointerInput {
            target,
            kind: PointerKind::Down,
            client,
            offset,
            movement: Vec2::ZERO,
        });
        for &delta in deltas {
            client += delta;
            self.push_pointer(PointerInput {
                target,
                kind: PointerKind::Move,
                client,
                offset,
                movement: delta,
            });
        }
        if release {
            self.push_pointer(PointerInput {
                target,
                kind: PointerKind::Up,
                client,
                offset,
                movement: Vec2::ZERO,
            });
        }
    }

    /// Drop a host-page mount and everything attached under it
    pub fn detach_mount(&mut self, mount: &str) {
        self.static_mounts.remove(mount);
        self.remove_all_under_mount(mount);
    }

    fn mount_exists(&self, mount: &str) -> bool {
        self.static_mounts.contains(mount) || self.elements.values().any(|el| el.id() == Some(mount))
    }

    /// Handles of every element attached (directly or not) under `mount`
    fn descendants(&self, mount: &str) -> Vec<ElementHandle> {
        let mut found = Vec::new();
        let mut pending = vec![mount.to_string()];
        while let Some(m) = pending.pop() {
            for (h, el) in &self.elements {
                if el.mount == m {
                    found.push(*h);
                    if let Some(id) = el.id() {
                        pending.push(id.to_string());
                    }
                }
            }
        }
        found
    }
}

impl Renderer for HeadlessRenderer {
    fn create_element(&mut self, mount: &str, spec: &ElementSpec) -> Result<ElementHandle> {
        if !self.mount_exists(mount) {
            return Err(GameError::MountMissing(mount.to_string()));
        }
        let handle = ElementHandle(self.next_handle);
        self.next_handle += 1;
        self.elements.insert(
            handle,
            HeadlessElement {
                tag: spec.tag.clone(),
                classes: spec.classes.clone(),
                styles: spec.styles.clone(),
                attributes: spec.attributes.clone(),
                html: String::new(),
                mount: mount.to_string(),
                pointer: false,
            },
        );
        Ok(handle)
    }

    fn set_inline_styles(&mut self, handle: ElementHandle, styles: &StyleMap) {
        if let Some(el) = self.elements.get_mut(&handle) {
            el.styles.merge(styles);
        }
    }

    fn render(&mut self, handle: ElementHandle, html: &str) {
        if let Some(el) = self.elements.get_mut(&handle) {
            el.html = html.to_string();
        }
    }

    fn remove_element(&mut self, handle: ElementHandle) {
        let Some(el) = self.elements.remove(&handle) else {
            return;
        };
        if let Some(id) = el.id() {
            for child in self.descendants(id) {
                self.elements.remove(&child);
            }
        }
        self.pointer_queue.retain(|p| p.target != handle);
    }

    fn remove_all_under_mount(&mut self, mount: &str) {
        for handle in self.descendants(mount) {
            self.elements.remove(&handle);
        }
        let elements = &self.elements;
        self.pointer_queue.retain(|p| elements.contains_key(&p.target));
    }

    fn query_layout_box(&self, handle: ElementHandle) -> Option<LayoutBox> {
        let el = self.elements.get(&handle)?;
        let styles = &el.styles;
        if styles.get("display") == Some("none") {
            return None;
        }

        let (vw, vh) = (self.viewport.x, self.viewport.y);
        let len = |prop: &str, reference: f32| styles.get(prop).and_then(|v| parse_length(v, reference));

        let width = len("width", vw).unwrap_or(0.0);
        let height = len("height", vh).unwrap_or(0.0);
        let left = len("left", vw)
            .or_else(|| len("right", vw).map(|r| vw - r - width))
            .unwrap_or(0.0);
        let top = len("top", vh)
            .or_else(|| len("bottom", vh).map(|b| vh - b - height))
            .unwrap_or(0.0);

        Some(LayoutBox::from_origin(left, top, width, height))
    }

    fn viewport(&self) -> Vec2 {
        self.viewport
    }

    fn subscribe_pointer(&mut self, handle: ElementHandle) -> Result<()> {
        match self.elements.get_mut(&handle) {
            Some(el) => {
                el.pointer = true;
                Ok(())
            }
            None => Err(GameError::Render(format!("no element {:?}", handle))),
        }
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerInput> {
        self.pointer_queue.drain(..).collect()
    }
}

/// Fixed-rate frame clock with a second, slower interval timer
#[derive(Debug, Clone)]
pub struct HeadlessClock {
    now_ms: f64,
    frame_ms: f64,
    interval_ms: f64,
    next_interval_ms: f64,
}

impl HeadlessClock {
    pub fn new(frame_ms: f64, interval_ms: f64) -> Self {
        Self {
            now_ms: 0.0,
            frame_ms,
            interval_ms,
            next_interval_ms: interval_ms,
        }
    }

    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Advance one frame; returns how many interval ticks fell inside it
    pub fn tick(&mut self) -> u32 {
        self.now_ms += self.frame_ms;
        let mut fired = 0;
        while self.interval_ms > 0.0 && self.next_interval_ms <= self.now_ms {
            self.next_interval_ms += self.interval_ms;
            fired += 1;
        }
        fired
    }
}

/// Drive `session` for `duration_ms` of simulated time
pub fn run_for<R: Renderer>(session: &mut Session<R>, clock: &mut HeadlessClock, duration_ms: f64) {
    let until = clock.now() + duration_ms;
    while clock.now() < until {
        for _ in 0..clock.tick() {
            session.collision_tick();
        }
        session.frame(clock.now());
    }
}
