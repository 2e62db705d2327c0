use std::collections::BTreeMap;

use bevy_ecs::prelude::*;

/// Marker component for document roots (mount points).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DomRoot;

/// Element node with its lower-case tag name.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
}

impl Element {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Text node content.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct TextNode(pub String);

/// Plain (non-special) attributes of an element.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(pub BTreeMap<String, String>);

impl Attributes {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

/// Live value of form controls (`input`, `select`, `option`).
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementValue(pub String);

/// Entity that owns the application subtree.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountPoint(pub Entity);

/// Fixed id of the application mount point.
pub const MOUNT_POINT_ID: &str = "app";
