//! Fact cards and their like gestures.
//!
//! A card likes itself on a double tap (two clicks or two touch ends inside the double-tap
//! window) or on a leftward swipe. Liking restarts the heart's burst animation.

use std::time::Duration;

use bevy_ecs::prelude::*;
use bevy_math::Vec2;
use tracing::debug;

use crate::{
    config::{FeedConfig, GestureConfig},
    dom::{Child, ElementSpec, child_entities, h},
    events::{DomEvent, DomEventKind, DomEventType, EventHandler},
    layout::force_reflow,
    styling::{LIKE_BURST_CLASS, StyleClass},
};

/// Marks the heart glyph overlaid on a card.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeOverlay;

/// Per-card gesture tracking. Lives as long as the card element.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct CardGesture {
    pub last_tap: Option<Duration>,
    pub start: Vec2,
    pub swiping: bool,
}

/// Inline style for the `index`-th card: relative positioning plus staggered entrance.
#[must_use]
pub fn card_style(index: usize) -> String {
    let delay = index * 60;
    let fade_in = format!("fadeInUp .5s ease forwards {delay}ms");
    let pop_in = format!("popIn .5s ease forwards {}ms", delay + 120);
    format!("position: relative; animation: {fade_in}, {pop_in}")
}

/// `div.card > h3, p, div.heart` with the like gestures attached.
#[must_use]
pub fn card(title: &str, text: &str, index: usize) -> ElementSpec {
    let heart_attrs = [("class", "heart".into()), ("style", "top: 40%;".into())];
    let heart = h("div", heart_attrs, ["❤".into()]).on_mount(|world, entity| {
        world.entity_mut(entity).insert(LikeOverlay);
    });

    let title = h("h3", [], [title.into()]);
    let body = h("p", [], [text.into()]);
    let style = card_style(index);
    let attrs = [("class", "card".into()), ("style", style.into())];
    let children: [Child; 3] = [title.into(), body.into(), heart.into()];

    let tap = EventHandler::native(on_tap);
    let touch_start = EventHandler::native(on_touch_start);
    let touch_move = EventHandler::native(on_touch_move);
    let swipe_end = EventHandler::native(on_swipe_end);

    // Tap runs before swipe on a touch end.
    h("div", attrs, children)
        .listen(DomEventType::Click, tap.clone())
        .listen(DomEventType::TouchEnd, tap)
        .listen(DomEventType::TouchStart, touch_start)
        .listen(DomEventType::TouchMove, touch_move)
        .listen(DomEventType::TouchEnd, swipe_end)
        .on_mount(|world, entity| {
            world.entity_mut(entity).insert(CardGesture::default());
        })
}

fn gestures(world: &World) -> GestureConfig {
    world
        .get_resource::<FeedConfig>()
        .map(|config| config.gestures.clone())
        .unwrap_or_default()
}

/// Heart overlay of `card`, if it is still mounted.
#[must_use]
pub fn heart_of(world: &World, card: Entity) -> Option<Entity> {
    child_entities(world, card)
        .into_iter()
        .find(|child| world.get::<LikeOverlay>(*child).is_some())
}

/// Restart the heart animation: drop the class, force a reflow, add it back.
pub fn like(world: &mut World, card: Entity) {
    let Some(heart) = heart_of(world, card) else {
        return;
    };
    if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
        classes.remove(LIKE_BURST_CLASS);
    }
    let width = force_reflow(world, heart);
    if let Some(mut classes) = world.get_mut::<StyleClass>(heart) {
        classes.add(LIKE_BURST_CLASS);
    }
    debug!(?card, width, "card liked");
}

fn on_tap(world: &mut World, card: Entity, event: &DomEvent) {
    let window = gestures(world).double_tap_window();
    let now = event.time_stamp;
    let is_double = {
        let Some(mut gesture) = world.get_mut::<CardGesture>(card) else {
            return;
        };
        let is_double = gesture
            .last_tap
            .is_some_and(|last| now.saturating_sub(last) < window);
        gesture.last_tap = if is_double { None } else { Some(now) };
        is_double
    };
    if is_double {
        like(world, card);
    }
}

fn on_touch_start(world: &mut World, card: Entity, event: &DomEvent) {
    let DomEventKind::TouchStart { touch: Some(at) } = event.kind else {
        return;
    };
    if let Some(mut gesture) = world.get_mut::<CardGesture>(card) {
        gesture.start = at;
        gesture.swiping = false;
    }
}

fn on_touch_move(world: &mut World, card: Entity, event: &DomEvent) {
    let DomEventKind::TouchMove { touch: Some(at) } = event.kind else {
        return;
    };
    let config = gestures(world);
    let Some(mut gesture) = world.get_mut::<CardGesture>(card) else {
        return;
    };
    let delta = (at - gesture.start).abs();
    if !gesture.swiping
        && delta.x > config.swipe_start_px
        && delta.x > delta.y * config.swipe_dominance
    {
        gesture.swiping = true;
    }
}

fn on_swipe_end(world: &mut World, card: Entity, event: &DomEvent) {
    let config = gestures(world);
    let Some(start) = world
        .get::<CardGesture>(card)
        .filter(|gesture| gesture.swiping)
        .map(|gesture| gesture.start)
    else {
        return;
    };
    // A touch end without a changed touch leaves the swipe armed.
    let DomEventKind::TouchEnd {
        changed_touch: Some(point),
    } = event.kind
    else {
        return;
    };
    let delta_x = point.x - start.x;
    if delta_x < -config.swipe_like_px {
        like(world, card);
    }
    if let Some(mut gesture) = world.get_mut::<CardGesture>(card) {
        gesture.swiping = false;
    }
}
