//! Element descriptions and their materialisation into the ECS world.
//!
//! [`h`] mirrors the usual hyperscript helper: a tag, a list of attributes and a list of
//! children. A handful of attribute keys get native treatment:
//!
//! - `class` becomes the element's [`StyleClass`] list,
//! - `onclick`, `oninput` and `onchange` become [`Listeners`],
//! - `value` becomes the element's [`ElementValue`].
//!
//! Every other key is stored verbatim in [`Attributes`]. Boolean attributes are only
//! present when `true`.

use std::{collections::BTreeMap, fmt, sync::Arc};

use bevy_ecs::{
    hierarchy::{ChildOf, Children},
    prelude::*,
};

use crate::{
    ecs::{Attributes, Element, ElementValue, TextNode},
    events::{DomEventType, EventHandler, Listeners},
    styling::StyleClass,
};

/// Hook run on a freshly mounted element, after its children were spawned.
pub type MountHook = Arc<dyn Fn(&mut World, Entity) + Send + Sync>;

/// Attribute value accepted by [`h`].
#[derive(Debug, Clone)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
    Handler(EventHandler),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<EventHandler> for AttrValue {
    fn from(value: EventHandler) -> Self {
        Self::Handler(value)
    }
}

/// Child accepted by [`h`].
#[derive(Debug, Clone)]
pub enum Child {
    Text(String),
    Element(ElementSpec),
    /// Skipped when mounting.
    Empty,
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ElementSpec> for Child {
    fn from(value: ElementSpec) -> Self {
        Self::Element(value)
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Description of an element subtree, materialised by [`mount`].
#[derive(Clone, Default)]
pub struct ElementSpec {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub value: Option<String>,
    pub listeners: Vec<(DomEventType, EventHandler)>,
    pub children: Vec<Child>,
    on_mount: Vec<MountHook>,
}

impl fmt::Debug for ElementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSpec")
            .field("tag", &self.tag)
            .field("classes", &self.classes)
            .field("attributes", &self.attributes)
            .field("value", &self.value)
            .field("listeners", &self.listeners.len())
            .field("children", &self.children)
            .field("on_mount", &self.on_mount.len())
            .finish()
    }
}

impl ElementSpec {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Apply one attribute, honouring the special keys.
    #[must_use]
    pub fn attr(mut self, key: &str, value: AttrValue) -> Self {
        match (key, value) {
            ("class", AttrValue::Text(classes)) => {
                self.classes = classes.split_whitespace().map(str::to_string).collect();
            }
            ("value", AttrValue::Text(value)) => self.value = Some(value),
            (key, AttrValue::Handler(handler)) => match DomEventType::from_handler_key(key) {
                Some(event_type) => self.listeners.push((event_type, handler)),
                None => tracing::warn!(key, "ignoring handler bound to a non-event attribute"),
            },
            (key, AttrValue::Text(value)) => {
                self.attributes.insert(key.to_string(), value);
            }
            (key, AttrValue::Flag(true)) => {
                self.attributes.insert(key.to_string(), String::new());
            }
            (_, AttrValue::Flag(false)) => {}
        }
        self
    }

    /// Register a listener for any event type (`addEventListener`).
    #[must_use]
    pub fn listen(mut self, event_type: DomEventType, handler: EventHandler) -> Self {
        self.listeners.push((event_type, handler));
        self
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn on_mount(mut self, hook: impl Fn(&mut World, Entity) + Send + Sync + 'static) -> Self {
        self.on_mount.push(Arc::new(hook));
        self
    }
}

/// Build an element description from a tag, attributes and children.
#[must_use]
pub fn h<'a>(
    tag: &str,
    attrs: impl IntoIterator<Item = (&'a str, AttrValue)>,
    children: impl IntoIterator<Item = Child>,
) -> ElementSpec {
    let mut spec = ElementSpec::new(tag);
    for (key, value) in attrs {
        spec = spec.attr(key, value);
    }
    for child in children {
        spec = spec.child(child);
    }
    spec
}

/// Materialise `spec` as the last child of `parent`.
pub fn mount(world: &mut World, parent: Entity, spec: &ElementSpec) -> Entity {
    let mut entity = world.spawn((
        Element::new(spec.tag.clone()),
        StyleClass(spec.classes.clone()),
        Attributes(spec.attributes.clone()),
        ChildOf(parent),
    ));
    if let Some(value) = &spec.value {
        entity.insert(ElementValue(value.clone()));
    }
    if !spec.listeners.is_empty() {
        entity.insert(Listeners(spec.listeners.clone()));
    }
    let entity = entity.id();

    for child in &spec.children {
        match child {
            Child::Text(text) => {
                world.spawn((TextNode(text.clone()), ChildOf(entity)));
            }
            Child::Element(child) => {
                mount(world, entity, child);
            }
            Child::Empty => {}
        }
    }

    for hook in &spec.on_mount {
        hook(world, entity);
    }

    entity
}

/// Despawn every child of `parent` (`innerHTML = ''`).
pub fn clear_children(world: &mut World, parent: Entity) {
    for child in child_entities(world, parent) {
        world.despawn(child);
    }
}

#[must_use]
pub fn child_entities(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<Children>(entity)
        .map(|children| children.iter().collect::<Vec<_>>())
        .unwrap_or_default()
}

/// Concatenated text of all descendant text nodes.
#[must_use]
pub fn text_content(world: &World, entity: Entity) -> String {
    let mut out = String::new();
    collect_text(world, entity, &mut out);
    out
}

fn collect_text(world: &World, entity: Entity, out: &mut String) {
    if let Some(TextNode(text)) = world.get::<TextNode>(entity) {
        out.push_str(text);
        return;
    }
    for child in child_entities(world, entity) {
        collect_text(world, child, out);
    }
}

/// Simple `tag`, `.class` or `tag.class[.class]` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    #[must_use]
    pub fn parse(selector: &str) -> Self {
        let mut parts = selector.trim().split('.');
        let tag = parts
            .next()
            .filter(|tag| !tag.is_empty())
            .map(str::to_ascii_lowercase);
        let classes = parts
            .filter(|class| !class.is_empty())
            .map(str::to_string)
            .collect();
        Self { tag, classes }
    }

    #[must_use]
    pub fn matches(&self, world: &World, entity: Entity) -> bool {
        let Some(element) = world.get::<Element>(entity) else {
            return false;
        };
        if self.tag.as_ref().is_some_and(|tag| *tag != element.tag) {
            return false;
        }
        let classes = world.get::<StyleClass>(entity);
        self.classes
            .iter()
            .all(|class| classes.is_some_and(|list| list.contains(class)))
    }
}

/// Descendants of `root` matching `selector`, in document order.
#[must_use]
pub fn query_selector_all(world: &World, root: Entity, selector: &str) -> Vec<Entity> {
    let selector = Selector::parse(selector);
    let mut found = Vec::new();
    let mut stack = child_entities(world, root);
    stack.reverse();
    while let Some(entity) = stack.pop() {
        if selector.matches(world, entity) {
            found.push(entity);
        }
        let mut children = child_entities(world, entity);
        children.reverse();
        stack.extend(children);
    }
    found
}

#[must_use]
pub fn query_selector(world: &World, root: Entity, selector: &str) -> Option<Entity> {
    query_selector_all(world, root, selector).first().copied()
}

/// Indented, human-readable dump of a subtree.
#[must_use]
pub fn outline(world: &World, entity: Entity) -> String {
    let mut out = String::new();
    write_outline(world, entity, 0, &mut out);
    out
}

fn write_outline(world: &World, entity: Entity, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    if let Some(TextNode(text)) = world.get::<TextNode>(entity) {
        out.push_str(&format!("{indent}\"{text}\"\n"));
        return;
    }
    let Some(element) = world.get::<Element>(entity) else {
        return;
    };

    let mut line = format!("{indent}<{}", element.tag);
    if let Some(classes) = world.get::<StyleClass>(entity) {
        for class in &classes.0 {
            line.push('.');
            line.push_str(class);
        }
    }
    if let Some(attrs) = world.get::<Attributes>(entity) {
        for key in ["id", "disabled", "selected"] {
            if attrs.has(key) {
                line.push_str(&format!(" {key}"));
            }
        }
    }
    if let Some(ElementValue(value)) = world.get::<ElementValue>(entity) {
        line.push_str(&format!(" value=\"{value}\""));
    }
    line.push('>');
    out.push_str(&line);
    out.push('\n');

    for child in child_entities(world, entity) {
        write_outline(world, child, depth + 1, out);
    }
}
