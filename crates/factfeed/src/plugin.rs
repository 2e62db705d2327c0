use bevy_app::{App, Plugin, PostUpdate, PreUpdate, Startup, Update};
use bevy_ecs::{prelude::*, schedule::IntoScheduleConfigs};
use tracing::info;

use crate::{
    actions::drain_feed_actions,
    config::FeedConfig,
    ecs::{Attributes, DomRoot, Element, MOUNT_POINT_ID, MountPoint},
    events::UiEventQueue,
    fetch::{
        FetchBridge, LoadOrigin, apply_fetch_results, ensure_task_pool_initialized, load_facts,
        spawn_fetch_tasks,
    },
    layout::{LayoutMetrics, Viewport},
    render::{render, render_if_requested},
    scroll::{SentinelObserver, poll_sentinel_intersection},
    state::{FeedState, RenderRequest},
    styling::{AnimatedClasses, StyleClass, commit_style_animations},
};

/// Wires the fact feed into a [`bevy_app::App`].
///
/// Uses the [`FeedConfig`] resource when one is already inserted. A
/// [`FactSourceHandle`](crate::fetch::FactSourceHandle) must be inserted before the app
/// first updates.
#[derive(Default)]
pub struct FactFeedPlugin;

impl Plugin for FactFeedPlugin {
    fn build(&self, app: &mut App) {
        ensure_task_pool_initialized();

        let config = app
            .world()
            .get_resource::<FeedConfig>()
            .cloned()
            .unwrap_or_default();

        app.insert_resource(FeedState::with_topic(config.feed.initial_topic.clone()))
            .insert_resource(Viewport::from_config(&config.layout))
            .insert_resource(LayoutMetrics(config.layout.clone()))
            .insert_resource(SentinelObserver::new(config.scroll.root_margin))
            .init_resource::<RenderRequest>()
            .init_resource::<UiEventQueue>()
            .init_resource::<FetchBridge>()
            .init_resource::<AnimatedClasses>()
            .insert_resource(config)
            .add_systems(Startup, (spawn_mount_point, render, load_initial_facts).chain())
            .add_systems(PreUpdate, drain_feed_actions)
            .add_systems(
                Update,
                (
                    poll_sentinel_intersection,
                    spawn_fetch_tasks,
                    apply_fetch_results,
                )
                    .chain(),
            )
            .add_systems(
                PostUpdate,
                (render_if_requested, commit_style_animations).chain(),
            );
    }
}

fn spawn_mount_point(world: &mut World) {
    let mut attributes = Attributes::default();
    attributes
        .0
        .insert("id".to_string(), MOUNT_POINT_ID.to_string());
    let root = world
        .spawn((
            DomRoot,
            Element::new("div"),
            StyleClass::default(),
            attributes,
        ))
        .id();
    world.insert_resource(MountPoint(root));
}

fn load_initial_facts(world: &mut World) {
    let (topic, count) = {
        let state = world.resource::<FeedState>();
        let config = world.resource::<FeedConfig>();
        (state.fact_topic.clone(), config.feed.initial_count)
    };
    info!(topic, count, "starting feed");
    load_facts(world, &topic, count, LoadOrigin::Initial);
}
