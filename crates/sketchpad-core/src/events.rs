//! Typed publish/subscribe for shape lifecycle events.

use crate::graphic::ShapeId;
use kurbo::{Point, Vec2};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future for the before-delete hooks. Not `Send`: the container is
/// single-threaded.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Event names the bus dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GraphCreate,
    GraphClick,
    GraphDelete,
    AddLine,
    AddDot,
    DelLine,
    DelDot,
    FocusPath,
    FocusDot,
    CanvasPan,
    CanvasScale,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GraphCreate => "graph.create",
            EventKind::GraphClick => "graph.click",
            EventKind::GraphDelete => "graph.delete",
            EventKind::AddLine => "add.line",
            EventKind::AddDot => "add.dot",
            EventKind::DelLine => "del.line",
            EventKind::DelDot => "del.dot",
            EventKind::FocusPath => "focus.path",
            EventKind::FocusDot => "focus.dot",
            EventKind::CanvasPan => "canvas.pan",
            EventKind::CanvasScale => "canvas.scale",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of shape an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
    Polygon,
    Line,
    Marker,
}

/// `{id, name}` payload carried by shape-level events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphInfo {
    pub id: ShapeId,
    pub name: Option<String>,
    #[serde(skip)]
    pub kind: GraphKind,
}

/// Payload for vertex-level line events.
#[derive(Debug, Clone, PartialEq)]
pub struct DotInfo {
    pub id: ShapeId,
    pub index: usize,
    pub point: Point,
}

/// An event delivered to bus listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SketchEvent {
    Create(GraphInfo),
    Click(GraphInfo),
    Delete(GraphInfo),
    AddLine(GraphInfo),
    AddDot(DotInfo),
    DelLine(GraphInfo),
    DelDot(DotInfo),
    FocusPath(GraphInfo),
    FocusDot(DotInfo),
    Pan { offset: Vec2 },
    Scale { zoom: f64, offset: Vec2 },
}

impl SketchEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SketchEvent::Create(_) => EventKind::GraphCreate,
            SketchEvent::Click(_) => EventKind::GraphClick,
            SketchEvent::Delete(_) => EventKind::GraphDelete,
            SketchEvent::AddLine(_) => EventKind::AddLine,
            SketchEvent::AddDot(_) => EventKind::AddDot,
            SketchEvent::DelLine(_) => EventKind::DelLine,
            SketchEvent::DelDot(_) => EventKind::DelDot,
            SketchEvent::FocusPath(_) => EventKind::FocusPath,
            SketchEvent::FocusDot(_) => EventKind::FocusDot,
            SketchEvent::Pan { .. } => EventKind::CanvasPan,
            SketchEvent::Scale { .. } => EventKind::CanvasScale,
        }
    }

    /// Shape-level payload, if this event carries one.
    pub fn graph(&self) -> Option<&GraphInfo> {
        match self {
            SketchEvent::Create(info)
            | SketchEvent::Click(info)
            | SketchEvent::Delete(info)
            | SketchEvent::AddLine(info)
            | SketchEvent::DelLine(info)
            | SketchEvent::FocusPath(info) => Some(info),
            _ => None,
        }
    }
}

/// Outcome of a before-delete hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteVerdict {
    Proceed,
    Veto,
}

/// Handle returned by [`EventBus::on`], used to detach a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&SketchEvent)>;
type BeforeDeleteHook = Box<dyn Fn(&GraphInfo) -> BoxFuture<'static, DeleteVerdict>>;

/// Ordered listener lists keyed by event name.
///
/// Dispatch is synchronous and runs listeners in registration order.
/// Listeners only see the event, never the container, so they cannot
/// re-enter dispatch.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<EventKind, Vec<(ListenerId, Handler)>>,
    before_delete: Vec<(ListenerId, BeforeDeleteHook)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    /// Register a listener for `kind`.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&SketchEvent) + 'static,
    {
        let id = self.allocate_id();
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener, _)| *listener != id);
        before != list.len()
    }

    /// Remove every listener for `kind`.
    pub fn off_all(&mut self, kind: EventKind) {
        self.handlers.remove(&kind);
    }

    /// Drop all listeners and hooks.
    pub fn clear(&mut self) {
        self.handlers.clear();
        self.before_delete.clear();
    }

    /// Dispatch `event` to its listeners. Returns `false` when nobody listens.
    pub fn emit(&mut self, event: &SketchEvent) -> bool {
        match self.handlers.get_mut(&event.kind()) {
            Some(list) if !list.is_empty() => {
                for (_, handler) in list.iter_mut() {
                    handler(event);
                }
                true
            }
            _ => false,
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Register a `graph.beforeDel` hook, awaited before a delete proceeds.
    pub fn on_before_delete<F>(&mut self, hook: F) -> ListenerId
    where
        F: Fn(&GraphInfo) -> BoxFuture<'static, DeleteVerdict> + 'static,
    {
        let id = self.allocate_id();
        self.before_delete.push((id, Box::new(hook)));
        id
    }

    pub fn off_before_delete(&mut self, id: ListenerId) -> bool {
        let before = self.before_delete.len();
        self.before_delete.retain(|(hook, _)| *hook != id);
        before != self.before_delete.len()
    }

    /// Start every before-delete hook for `info`, in registration order.
    ///
    /// The returned futures borrow nothing from the bus, so the caller can
    /// await them while holding the container mutably.
    pub fn before_delete(&self, info: &GraphInfo) -> Vec<BoxFuture<'static, DeleteVerdict>> {
        self.before_delete
            .iter()
            .map(|(_, hook)| hook(info))
            .collect()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("handlers", &counts)
            .field("before_delete", &self.before_delete.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn info(id: &str) -> GraphInfo {
        GraphInfo {
            id: ShapeId::from(id),
            name: Some("zone".to_string()),
            kind: GraphKind::Polygon,
        }
    }

    #[test]
    fn test_emit_in_registration_order() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = log.clone();
            bus.on(EventKind::GraphCreate, move |_| log.borrow_mut().push(tag));
        }

        assert!(bus.emit(&SketchEvent::Create(info("a"))));
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_only_matching_kind() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        bus.on(EventKind::GraphClick, move |_| *counter.borrow_mut() += 1);

        assert!(!bus.emit(&SketchEvent::Create(info("a"))));
        assert!(bus.emit(&SketchEvent::Click(info("a"))));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_off_by_handle_and_by_name() {
        let mut bus = EventBus::new();
        let a = bus.on(EventKind::AddDot, |_| {});
        let _b = bus.on(EventKind::AddDot, |_| {});
        assert_eq!(bus.listener_count(EventKind::AddDot), 2);

        assert!(bus.off(EventKind::AddDot, a));
        assert!(!bus.off(EventKind::AddDot, a));
        assert_eq!(bus.listener_count(EventKind::AddDot), 1);

        bus.off_all(EventKind::AddDot);
        assert_eq!(bus.listener_count(EventKind::AddDot), 0);
        assert!(!bus.off(EventKind::DelDot, a));
    }

    #[test]
    fn test_event_names() {
        assert_eq!(EventKind::GraphCreate.to_string(), "graph.create");
        assert_eq!(EventKind::DelDot.as_str(), "del.dot");
        assert_eq!(
            SketchEvent::Pan { offset: Vec2::ZERO }.kind(),
            EventKind::CanvasPan
        );
    }

    #[test]
    fn test_graph_info_payload_shape() {
        let json = serde_json::to_value(info("abc")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "abc", "name": "zone"}));
    }

    #[test]
    fn test_before_delete_hooks_are_collected_in_order() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        bus.on_before_delete(move |info| {
            log.borrow_mut().push(info.id.to_string());
            Box::pin(async { DeleteVerdict::Proceed })
        });
        let id = bus.on_before_delete(|_| Box::pin(async { DeleteVerdict::Veto }));

        assert_eq!(bus.before_delete(&info("x")).len(), 2);
        assert_eq!(*seen.borrow(), vec!["x".to_string()]);

        assert!(bus.off_before_delete(id));
        assert_eq!(bus.before_delete(&info("y")).len(), 1);

        bus.clear();
        assert!(bus.before_delete(&info("z")).is_empty());
    }
}
