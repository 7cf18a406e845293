//! Browser DOM renderer (wasm32)
//!
//! Elements are real `HtmlElement`s; layout comes from
//! `getBoundingClientRect`. Pointer listeners push into a shared inbox the
//! session drains once per animation frame.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement, PointerEvent};

use super::renderer::{ElementHandle, ElementSpec, PointerInput, PointerKind, Renderer, StyleMap};
use crate::error::{GameError, Result};
use crate::sim::LayoutBox;

type PointerClosure = Closure<dyn FnMut(PointerEvent)>;

const POINTER_EVENTS: [(&str, PointerKind); 3] = [
    ("pointerdown", PointerKind::Down),
    ("pointermove", PointerKind::Move),
    ("pointerup", PointerKind::Up),
];

fn js_err(e: JsValue) -> GameError {
    GameError::Render(format!("{:?}", e))
}

pub struct DomRenderer {
    document: Document,
    elements: HashMap<ElementHandle, HtmlElement>,
    listeners: HashMap<ElementHandle, Vec<(&'static str, PointerClosure)>>,
    inbox: Rc<RefCell<VecDeque<PointerInput>>>,
    next_handle: u32,
}

impl DomRenderer {
    pub fn new() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GameError::Render("no document".into()))?;
        Ok(Self {
            document,
            elements: HashMap::new(),
            listeners: HashMap::new(),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            next_handle: 1,
        })
    }

    fn apply_styles(element: &HtmlElement, styles: &StyleMap) {
        let style = element.style();
        for (property, value) in styles.iter() {
            if let Err(e) = style.set_property(property, value) {
                log::warn!("Failed to set {}: {:?}", property, e);
            }
        }
    }

    fn detach_listeners(&mut self, handle: ElementHandle) {
        let (Some(element), Some(listeners)) =
            (self.elements.get(&handle), self.listeners.remove(&handle))
        else {
            return;
        };
        for (name, closure) in listeners {
            let _ = element
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
    }
}

impl Renderer for DomRenderer {
    fn create_element(&mut self, mount: &str, spec: &ElementSpec) -> Result<ElementHandle> {
        let parent = self
            .document
            .get_element_by_id(mount)
            .ok_or_else(|| GameError::MountMissing(mount.to_string()))?;

        let element: HtmlElement = self
            .document
            .create_element(&spec.tag)
            .map_err(js_err)?
            .dyn_into()
            .map_err(|_| GameError::Render(format!("<{}> is not an HtmlElement", spec.tag)))?;

        if !spec.classes.is_empty() {
            element.set_class_name(&spec.classes.join(" "));
        }
        for (name, value) in &spec.attributes {
            element.set_attribute(name, value).map_err(js_err)?;
        }
        Self::apply_styles(&element, &spec.styles);
        parent.append_child(&element).map_err(js_err)?;

        let handle = ElementHandle(self.next_handle);
        self.next_handle += 1;
        self.elements.insert(handle, element);
        Ok(handle)
    }

    fn set_inline_styles(&mut self, handle: ElementHandle, styles: &StyleMap) {
        if let Some(element) = self.elements.get(&handle) {
            Self::apply_styles(element, styles);
        }
    }

    fn render(&mut self, handle: ElementHandle, html: &str) {
        if let Some(element) = self.elements.get(&handle) {
            element.set_inner_html(html);
        }
    }

    fn remove_element(&mut self, handle: ElementHandle) {
        self.detach_listeners(handle);
        if let Some(element) = self.elements.remove(&handle) {
            element.remove();
        }
        self.inbox.borrow_mut().retain(|p| p.target != handle);
    }

    fn remove_all_under_mount(&mut self, mount: &str) {
        match self.document.get_element_by_id(mount) {
            Some(root) => root.set_inner_html(""),
            None => log::warn!("remove_all_under_mount: #{} not found", mount),
        }
        let detached: Vec<ElementHandle> = self
            .elements
            .iter()
            .filter(|(_, el)| !el.is_connected())
            .map(|(h, _)| *h)
            .collect();
        for handle in detached {
            self.detach_listeners(handle);
            self.elements.remove(&handle);
        }
        let elements = &self.elements;
        self.inbox
            .borrow_mut()
            .retain(|p| elements.contains_key(&p.target));
    }

    fn query_layout_box(&self, handle: ElementHandle) -> Option<LayoutBox> {
        let element = self.elements.get(&handle)?;
        if !element.is_connected() {
            return None;
        }
        let rect = element.get_bounding_client_rect();
        Some(LayoutBox {
            top: rect.top() as f32,
            bottom: rect.bottom() as f32,
            left: rect.left() as f32,
            right: rect.right() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        })
    }

    fn viewport(&self) -> Vec2 {
        let Some(window) = web_sys::window() else {
            return Vec2::ZERO;
        };
        let dim = |v: std::result::Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
        };
        Vec2::new(dim(window.inner_width()), dim(window.inner_height()))
    }

    fn subscribe_pointer(&mut self, handle: ElementHandle) -> Result<()> {
        let element = self
            .elements
            .get(&handle)
            .ok_or_else(|| GameError::Render(format!("no element {:?}", handle)))?;

        let mut closures = Vec::with_capacity(POINTER_EVENTS.len());
        for (name, kind) in POINTER_EVENTS {
            let inbox = self.inbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                inbox.borrow_mut().push_back(PointerInput {
                    target: handle,
                    kind,
                    client: Vec2::new(event.client_x() as f32, event.client_y() as f32),
                    offset: Vec2::new(event.offset_x() as f32, event.offset_y() as f32),
                    movement: Vec2::new(event.movement_x() as f32, event.movement_y() as f32),
                });
            });
            element
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .map_err(js_err)?;
            closures.push((name, closure));
        }
        self.listeners.insert(handle, closures);
        Ok(())
    }

    fn drain_pointer_events(&mut self) -> Vec<PointerInput> {
        self.inbox.borrow_mut().drain(..).collect()
    }
}
