use bevy_ecs::prelude::*;

use crate::{facts::Fact, topics::RANDOM_TOPIC};

/// The single application state record. Rendering reads nothing else.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub facts: Vec<Fact>,
    pub fact_topic: String,
    pub search_query: String,
    pub is_searching: bool,
    /// When set, completed topic loads append instead of replacing.
    pub(crate) appending: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            facts: Vec::new(),
            fact_topic: RANDOM_TOPIC.to_string(),
            search_query: String::new(),
            is_searching: false,
            appending: false,
        }
    }
}

impl FeedState {
    #[must_use]
    pub fn with_topic(topic: impl Into<String>) -> Self {
        Self {
            fact_topic: topic.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_appending(&self) -> bool {
        self.appending
    }
}

/// Pending full re-render, plus how many renders have run.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderRequest {
    pub pending: bool,
    pub renders: u64,
}

/// Ask the render loop to rebuild the tree at the end of the current frame.
pub fn request_render(world: &mut World) {
    world.resource_mut::<RenderRequest>().pending = true;
}
