use bevy_ecs::prelude::*;
use tracing::debug;

use crate::{
    config::FeedConfig,
    events::UiEventQueue,
    fetch::{LoadOrigin, load_facts, search_facts},
    state::{FeedState, request_render},
};

/// Actions emitted by the feed's controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    /// The search input changed.
    SetSearchQuery(String),
    /// The search button was pressed.
    SubmitSearch,
    /// A topic was picked in the selector.
    SelectTopic(String),
}

/// Apply queued [`FeedAction`]s to [`FeedState`].
pub fn drain_feed_actions(world: &mut World) {
    let events = world.resource::<UiEventQueue>().drain_actions::<FeedAction>();
    if events.is_empty() {
        return;
    }

    for event in events {
        debug!(action = ?event.action, "feed action");
        match event.action {
            FeedAction::SetSearchQuery(query) => {
                world.resource_mut::<FeedState>().search_query = query;
                request_render(world);
            }
            FeedAction::SubmitSearch => {
                let query = world.resource::<FeedState>().search_query.clone();
                search_facts(world, &query);
            }
            FeedAction::SelectTopic(topic) => {
                world.resource_mut::<FeedState>().fact_topic = topic.clone();
                let count = world.resource::<FeedConfig>().feed.initial_count;
                load_facts(world, &topic, count, LoadOrigin::TopicChange);
                request_render(world);
            }
        }
    }
}
