use bevy_ecs::prelude::*;
use tracing::debug;

use crate::{
    config::FeedConfig,
    fetch::{LoadOrigin, load_facts},
    layout::{LayoutBox, Viewport},
    state::FeedState,
};

/// Marks the empty element trailing the card list.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollSentinel;

/// Intersection observer watching at most one sentinel.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct SentinelObserver {
    pub target: Option<Entity>,
    pub root_margin: f32,
    pub connected: bool,
}

impl SentinelObserver {
    #[must_use]
    pub fn new(root_margin: f32) -> Self {
        Self {
            root_margin,
            ..Self::default()
        }
    }

    pub fn observe(&mut self, target: Entity) {
        self.target = Some(target);
        self.connected = true;
    }

    pub fn disconnect(&mut self) {
        self.target = None;
        self.connected = false;
    }

    /// The observed entity, while connected.
    #[must_use]
    pub fn observed(&self) -> Option<Entity> {
        self.target.filter(|_| self.connected)
    }
}

/// Replace any previous observation with `sentinel`.
pub fn setup_infinite_scroll(world: &mut World, sentinel: Entity) {
    let mut observer = world.resource_mut::<SentinelObserver>();
    observer.disconnect();
    observer.observe(sentinel);
}

/// When the observed sentinel enters the viewport (plus root margin), disconnect and load
/// one more page in appending mode.
pub fn poll_sentinel_intersection(world: &mut World) {
    let (target, margin) = {
        let observer = world.resource::<SentinelObserver>();
        let Some(target) = observer.observed() else {
            return;
        };
        (target, observer.root_margin)
    };
    let Some(layout_box) = world.get::<LayoutBox>(target).copied() else {
        return;
    };
    if !world.resource::<Viewport>().intersects(&layout_box, margin) {
        return;
    }

    debug!(?target, top = layout_box.top, "sentinel intersecting viewport");
    world.resource_mut::<SentinelObserver>().disconnect();
    let topic = {
        let mut state = world.resource_mut::<FeedState>();
        state.appending = true;
        state.fact_topic.clone()
    };
    let count = world.resource::<FeedConfig>().feed.append_count;
    load_facts(world, &topic, count, LoadOrigin::InfiniteScroll);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchBridge;

    fn world(scroll_top: f32) -> (World, Entity) {
        let mut world = World::new();
        world.init_resource::<FeedState>();
        world.init_resource::<FetchBridge>();
        world.init_resource::<FeedConfig>();
        world.insert_resource(Viewport {
            scroll_top,
            width: 420.0,
            height: 100.0,
        });
        world.insert_resource(SentinelObserver::new(50.0));
        let sentinel = world
            .spawn((
                ScrollSentinel,
                LayoutBox {
                    top: 400.0,
                    height: 0.0,
                    width: 420.0,
                },
            ))
            .id();
        setup_infinite_scroll(&mut world, sentinel);
        (world, sentinel)
    }

    #[test]
    fn hidden_sentinel_keeps_observing() {
        let (mut world, sentinel) = world(0.0);

        poll_sentinel_intersection(&mut world);

        let observed = world.resource::<SentinelObserver>().observed();
        assert_eq!(observed, Some(sentinel));
        assert!(!world.resource::<FeedState>().is_appending());
        assert_eq!(world.resource::<FetchBridge>().in_flight(), 0);
    }

    #[test]
    fn margin_pre_triggers_and_fires_once() {
        let (mut world, _) = world(260.0);

        poll_sentinel_intersection(&mut world);
        poll_sentinel_intersection(&mut world);

        assert_eq!(world.resource::<SentinelObserver>().observed(), None);
        assert!(world.resource::<FeedState>().is_appending());
        assert_eq!(world.resource::<FetchBridge>().in_flight(), 1);
    }

    #[test]
    fn observing_a_new_sentinel_replaces_the_old_one() {
        let (mut world, old) = world(0.0);
        let new = world.spawn(ScrollSentinel).id();

        setup_infinite_scroll(&mut world, new);

        let observer = world.resource::<SentinelObserver>();
        assert_eq!(observer.observed(), Some(new));
        assert_ne!(observer.observed(), Some(old));
    }
}
