use std::{any::Any, fmt, sync::Arc, time::Duration};

use bevy_ecs::{hierarchy::ChildOf, prelude::*};
use bevy_math::Vec2;
use crossbeam_queue::SegQueue;
use tracing::{debug, trace};

use crate::ecs::{Attributes, ElementValue};

/// Type-erased UI action emitted by element listeners.
pub struct UiEvent {
    pub entity: Entity,
    pub action: Box<dyn Any + Send + Sync>,
}

impl fmt::Debug for UiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiEvent")
            .field("entity", &self.entity)
            .field("action", &"<type-erased>")
            .finish()
    }
}

impl UiEvent {
    #[must_use]
    pub fn new(entity: Entity, action: Box<dyn Any + Send + Sync>) -> Self {
        Self { entity, action }
    }

    #[must_use]
    pub fn typed<T: Any + Send + Sync>(entity: Entity, action: T) -> Self {
        Self {
            entity,
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn into_action<T: Any + Send + Sync>(self) -> Option<TypedUiEvent<T>> {
        match self.action.downcast::<T>() {
            Ok(action) => Some(TypedUiEvent {
                entity: self.entity,
                action: *action,
            }),
            Err(_) => None,
        }
    }
}

/// Typed UI event produced from a type-erased [`UiEvent`] queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedUiEvent<T> {
    pub entity: Entity,
    pub action: T,
}

/// Lock-free queue shared between listeners and the action drain system.
#[derive(Resource, Clone, Debug)]
pub struct UiEventQueue {
    queue: Arc<SegQueue<UiEvent>>,
}

impl Default for UiEventQueue {
    fn default() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }
}

impl UiEventQueue {
    pub fn push(&self, event: UiEvent) {
        self.queue.push(event);
    }

    pub fn push_typed<T: Any + Send + Sync>(&self, entity: Entity, action: T) {
        self.push(UiEvent::typed(entity, action));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain queue entries and keep only typed actions.
    ///
    /// Note: entries with other action types are discarded.
    #[must_use]
    pub fn drain_actions<T: Any + Send + Sync>(&self) -> Vec<TypedUiEvent<T>> {
        let mut drained = Vec::new();
        while let Some(event) = self.queue.pop() {
            if let Some(event) = event.into_action::<T>() {
                drained.push(event);
            }
        }
        drained
    }
}

/// Event types listeners can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEventType {
    Click,
    Input,
    Change,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl DomEventType {
    /// Maps `on<type>` attribute keys to event types.
    #[must_use]
    pub fn from_handler_key(key: &str) -> Option<Self> {
        match key {
            "onclick" => Some(Self::Click),
            "oninput" => Some(Self::Input),
            "onchange" => Some(Self::Change),
            _ => None,
        }
    }
}

/// Payload of a dispatched DOM event.
///
/// Touch points are page coordinates. `None` means the event carried no touch list entry.
#[derive(Debug, Clone, PartialEq)]
pub enum DomEventKind {
    Click,
    Input { value: String },
    Change { value: String },
    TouchStart { touch: Option<Vec2> },
    TouchMove { touch: Option<Vec2> },
    TouchEnd { changed_touch: Option<Vec2> },
}

/// A DOM event aimed at `target`, stamped with the time it happened.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub target: Entity,
    pub kind: DomEventKind,
    pub time_stamp: Duration,
}

impl DomEvent {
    #[must_use]
    pub fn new(target: Entity, kind: DomEventKind, time_stamp: Duration) -> Self {
        Self {
            target,
            kind,
            time_stamp,
        }
    }

    #[must_use]
    pub fn click(target: Entity, time_stamp: Duration) -> Self {
        Self::new(target, DomEventKind::Click, time_stamp)
    }

    #[must_use]
    pub fn event_type(&self) -> DomEventType {
        match self.kind {
            DomEventKind::Click => DomEventType::Click,
            DomEventKind::Input { .. } => DomEventType::Input,
            DomEventKind::Change { .. } => DomEventType::Change,
            DomEventKind::TouchStart { .. } => DomEventType::TouchStart,
            DomEventKind::TouchMove { .. } => DomEventType::TouchMove,
            DomEventKind::TouchEnd { .. } => DomEventType::TouchEnd,
        }
    }

    /// Value carried by input/change events.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            DomEventKind::Input { value } | DomEventKind::Change { value } => Some(value),
            _ => None,
        }
    }
}

type EmitFn = dyn Fn(&DomEvent) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync;

/// Listener attached to an element.
#[derive(Clone)]
pub enum EventHandler {
    /// Maps the event to a typed action pushed into [`UiEventQueue`].
    Emit(Arc<EmitFn>),
    /// Runs element-local behaviour directly against the world.
    ///
    /// The entity argument is the element the listener is registered on.
    Native(fn(&mut World, Entity, &DomEvent)),
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Emit(_) => f.write_str("EventHandler::Emit(..)"),
            Self::Native(_) => f.write_str("EventHandler::Native(..)"),
        }
    }
}

impl EventHandler {
    /// Emit a clone of `action` for every event.
    #[must_use]
    pub fn emit<T: Any + Clone + Send + Sync>(action: T) -> Self {
        Self::Emit(Arc::new(move |_| {
            Some(Box::new(action.clone()) as Box<dyn Any + Send + Sync>)
        }))
    }

    /// Emit the action built from the event, if any.
    #[must_use]
    pub fn emit_with<T, F>(build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&DomEvent) -> Option<T> + Send + Sync + 'static,
    {
        Self::Emit(Arc::new(move |event| {
            build(event).map(|action| Box::new(action) as Box<dyn Any + Send + Sync>)
        }))
    }

    #[must_use]
    pub fn native(listener: fn(&mut World, Entity, &DomEvent)) -> Self {
        Self::Native(listener)
    }
}

/// Listeners registered on an element, in registration order.
#[derive(Component, Debug, Clone, Default)]
pub struct Listeners(pub Vec<(DomEventType, EventHandler)>);

impl Listeners {
    fn matching(&self, event_type: DomEventType) -> Vec<EventHandler> {
        self.0
            .iter()
            .filter(|(kind, _)| *kind == event_type)
            .map(|(_, handler)| handler.clone())
            .collect()
    }
}

/// Dispatch `event` to its target and bubble it up to the root.
///
/// Returns the number of listeners invoked.
pub fn dispatch_dom_event(world: &mut World, event: &DomEvent) -> usize {
    if world.get_entity(event.target).is_err() {
        debug!(target_entity = ?event.target, "dropping event for detached element");
        return 0;
    }

    if event.event_type() == DomEventType::Click
        && world
            .get::<Attributes>(event.target)
            .is_some_and(|attrs| attrs.has("disabled"))
    {
        trace!(target_entity = ?event.target, "click on disabled element ignored");
        return 0;
    }

    if let Some(value) = event.value() {
        world
            .entity_mut(event.target)
            .insert(ElementValue(value.to_string()));
    }

    let mut path = vec![event.target];
    let mut cursor = event.target;
    while let Some(parent) = world.get::<ChildOf>(cursor).map(ChildOf::parent) {
        path.push(parent);
        cursor = parent;
    }

    let event_type = event.event_type();
    let mut invoked = 0;
    for node in path {
        let Some(handlers) = world
            .get::<Listeners>(node)
            .map(|listeners| listeners.matching(event_type))
        else {
            continue;
        };

        for handler in handlers {
            invoked += 1;
            match handler {
                EventHandler::Emit(build) => {
                    if let Some(action) = build(event) {
                        let queue = world.resource::<UiEventQueue>();
                        queue.push(UiEvent::new(node, action));
                    }
                }
                EventHandler::Native(listener) => listener(world, node, event),
            }
        }
    }

    trace!(?event_type, invoked, "dispatched dom event");
    invoked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Signal {
        Clicked,
        Typed(String),
    }

    fn world_with_queue() -> World {
        let mut world = World::new();
        world.init_resource::<UiEventQueue>();
        world
    }

    fn on_click(signal: Signal) -> Listeners {
        Listeners(vec![(DomEventType::Click, EventHandler::emit(signal))])
    }

    #[test]
    fn click_bubbles_from_child_to_listening_parent() {
        let mut world = world_with_queue();
        let parent = world.spawn(on_click(Signal::Clicked)).id();
        let child = world.spawn(ChildOf(parent)).id();

        let invoked = dispatch_dom_event(&mut world, &DomEvent::click(child, Duration::ZERO));

        assert_eq!(invoked, 1);
        let actions = world.resource::<UiEventQueue>().drain_actions::<Signal>();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].entity, parent);
        assert_eq!(actions[0].action, Signal::Clicked);
    }

    #[test]
    fn disabled_target_swallows_clicks() {
        let mut world = world_with_queue();
        let mut attrs = Attributes::default();
        attrs.0.insert("disabled".to_string(), String::new());
        let button = world.spawn((attrs, on_click(Signal::Clicked))).id();

        let click = DomEvent::click(button, Duration::ZERO);
        assert_eq!(dispatch_dom_event(&mut world, &click), 0);
        assert!(world.resource::<UiEventQueue>().is_empty());
    }

    #[test]
    fn input_updates_value_before_listeners_run() {
        let mut world = world_with_queue();
        let typed = EventHandler::emit_with(|event| {
            let value = event.value()?;
            Some(Signal::Typed(value.to_string()))
        });
        let listeners = Listeners(vec![(DomEventType::Input, typed)]);
        let input = world.spawn(listeners).id();

        let event = DomEvent::new(
            input,
            DomEventKind::Input {
                value: "comets".to_string(),
            },
            Duration::ZERO,
        );
        dispatch_dom_event(&mut world, &event);

        let value = world.get::<ElementValue>(input).expect("value");
        assert_eq!(value.0, "comets");
        let actions = world.resource::<UiEventQueue>().drain_actions::<Signal>();
        assert_eq!(actions[0].action, Signal::Typed("comets".to_string()));
    }

    #[test]
    fn events_for_despawned_targets_are_dropped() {
        let mut world = world_with_queue();
        let gone = world.spawn_empty().id();
        world.despawn(gone);

        let click = DomEvent::click(gone, Duration::ZERO);
        assert_eq!(dispatch_dom_event(&mut world, &click), 0);
    }
}
