use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use bevy_app::App;
use bevy_ecs::prelude::*;
use bevy_math::Vec2;
use tracing::debug;

use crate::{
    client::{FactSource, WikipediaClient},
    config::FeedConfig,
    dom::{query_selector_all, text_content},
    ecs::MountPoint,
    events::{DomEvent, DomEventKind, UiEventQueue, dispatch_dom_event},
    fetch::{FactSourceHandle, FetchBridge},
    layout::Viewport,
    plugin::FactFeedPlugin,
    state::{FeedState, RenderRequest},
};

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Owns the feed's [`App`] and drives it frame by frame.
///
/// The first frame runs on construction, so the page is mounted and the initial load is in
/// flight once `new` returns.
pub struct FeedApp {
    app: App,
    started: Instant,
}

impl FeedApp {
    pub fn new(config: FeedConfig, source: Arc<dyn FactSource>) -> Self {
        let mut app = App::new();
        app.insert_resource(config)
            .insert_resource(FactSourceHandle(source))
            .add_plugins(FactFeedPlugin);
        app.update();
        Self {
            app,
            started: Instant::now(),
        }
    }

    /// Feed backed by the live encyclopedia API.
    pub fn with_wikipedia(config: FeedConfig) -> Result<Self> {
        let client = WikipediaClient::new(&config.api)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn update(&mut self) {
        self.app.update();
    }

    fn is_idle(&self) -> bool {
        let world = self.app.world();
        world.resource::<FetchBridge>().in_flight() == 0
            && world.resource::<UiEventQueue>().is_empty()
            && !world.resource::<RenderRequest>().pending
    }

    /// Update until no fetch is in flight and nothing is queued, for two frames in a row.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut idle_frames = 0;
        while idle_frames < 2 {
            self.app.update();
            if self.is_idle() {
                idle_frames += 1;
                continue;
            }
            idle_frames = 0;
            if Instant::now() >= deadline {
                debug!(?timeout, "feed did not settle");
                return false;
            }
            thread::sleep(IDLE_POLL_INTERVAL);
        }
        true
    }

    /// Time since the app started, for stamping events.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Dispatch a DOM event. Emitted actions apply on the next update.
    pub fn dispatch(&mut self, event: DomEvent) -> usize {
        dispatch_dom_event(self.app.world_mut(), &event)
    }

    pub fn click(&mut self, target: Entity, at: Duration) -> usize {
        self.dispatch(DomEvent::click(target, at))
    }

    pub fn input(&mut self, target: Entity, value: impl Into<String>) -> usize {
        let at = self.now();
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::Input {
                value: value.into(),
            },
            at,
        ))
    }

    pub fn change(&mut self, target: Entity, value: impl Into<String>) -> usize {
        let at = self.now();
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::Change {
                value: value.into(),
            },
            at,
        ))
    }

    /// Touch start, move and end for a drag from `from` to `to`.
    pub fn swipe(&mut self, target: Entity, from: Vec2, to: Vec2, at: Duration) {
        let middle = from.lerp(to, 0.5);
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::TouchStart { touch: Some(from) },
            at,
        ));
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::TouchMove {
                touch: Some(middle),
            },
            at,
        ));
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::TouchMove { touch: Some(to) },
            at,
        ));
        self.dispatch(DomEvent::new(
            target,
            DomEventKind::TouchEnd {
                changed_touch: Some(to),
            },
            at,
        ));
    }

    /// Scroll the viewport so its top edge sits at `y`.
    pub fn scroll_to(&mut self, y: f32) {
        self.app.world_mut().resource_mut::<Viewport>().scroll_top = y.max(0.0);
    }

    #[must_use]
    pub fn state(&self) -> &FeedState {
        self.app.world().resource::<FeedState>()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    /// The `#app` mount point, once the first frame ran.
    #[must_use]
    pub fn root(&self) -> Option<Entity> {
        self.app
            .world()
            .get_resource::<MountPoint>()
            .map(|mount_point| mount_point.0)
    }

    /// Mounted elements matching `selector`, in document order.
    #[must_use]
    pub fn query(&self, selector: &str) -> Vec<Entity> {
        self.root()
            .map(|root| query_selector_all(self.world(), root, selector))
            .unwrap_or_default()
    }

    /// Visible text of the whole page.
    #[must_use]
    pub fn text(&self) -> String {
        self.root()
            .map(|root| text_content(self.world(), root))
            .unwrap_or_default()
    }
}
