//! The feed view and the full-rebuild render loop.

use bevy_ecs::prelude::*;
use tracing::debug;

use crate::{
    actions::FeedAction,
    card::card,
    dom::{Child, ElementSpec, clear_children, h, mount},
    ecs::MountPoint,
    events::EventHandler,
    layout::layout_document,
    scroll::{ScrollSentinel, setup_infinite_scroll},
    state::{FeedState, RenderRequest},
    topics::{TOPICS, topic_name},
};

pub const SEARCH_PLACEHOLDER: &str = "Search Wikipedia for facts...";

/// Title shown on every fact card.
pub const CARD_TITLE: &str = "Fact";

/// Whole application view for `state`.
#[must_use]
pub fn app_view(state: &FeedState) -> ElementSpec {
    h("div", [], [top_bar().into(), feed(state).into()])
}

fn top_bar() -> ElementSpec {
    let label: Child = "Facts".into();
    let pill = h("button", [("class", "pill active".into())], [label]);
    h("div", [("class", "topbar".into())], [pill.into()])
}

fn feed(state: &FeedState) -> ElementSpec {
    h(
        "div",
        [],
        [
            search_bar(state).into(),
            topic_bar(state).into(),
            card_list(state).into(),
        ],
    )
}

fn search_bar(state: &FeedState) -> ElementSpec {
    let on_input = EventHandler::emit_with(|event| {
        let value = event.value()?;
        Some(FeedAction::SetSearchQuery(value.to_string()))
    });
    let input = h(
        "input",
        [
            ("class", "input".into()),
            ("placeholder", SEARCH_PLACEHOLDER.into()),
            ("value", state.search_query.clone().into()),
            ("oninput", on_input.into()),
        ],
        [],
    );

    let disabled = state.search_query.trim().is_empty() || state.is_searching;
    let label = if state.is_searching {
        "Searching..."
    } else {
        "Search"
    };
    let submit = EventHandler::emit(FeedAction::SubmitSearch);
    let button = h("button", [("class", "btn".into())], [label.into()])
        .attr("disabled", disabled.into())
        .attr("onclick", submit.into());

    let controls: [Child; 2] = [input.into(), button.into()];
    h("div", [("class", "bar".into())], controls)
}

/// Text of the indicator next to the topic selector.
#[must_use]
pub fn topic_indicator(state: &FeedState) -> String {
    if !state.search_query.is_empty() && !state.facts.is_empty() {
        format!("Search Results: \"{}\"", state.search_query)
    } else {
        topic_name(&state.fact_topic).to_string()
    }
}

fn topic_bar(state: &FeedState) -> ElementSpec {
    let indicator: Child = topic_indicator(state).into();
    let label = h("span", [("class", "muted".into())], [indicator]);
    let children: [Child; 2] = [label.into(), topic_selector(state).into()];
    h("div", [("class", "topicbar".into())], children)
}

fn topic_selector(state: &FeedState) -> ElementSpec {
    let options = TOPICS.iter().map(|topic| {
        let selected = topic.id == state.fact_topic;
        let attrs = [("value", topic.id.into()), ("selected", selected.into())];
        Child::from(h("option", attrs, [topic.name.into()]))
    });
    let on_change = EventHandler::emit_with(|event| {
        let value = event.value()?;
        Some(FeedAction::SelectTopic(value.to_string()))
    });

    let attrs = [("class", "input".into()), ("onchange", on_change.into())];
    h("select", attrs, options)
}

fn card_list(state: &FeedState) -> ElementSpec {
    let sentinel = h("div", [], []).on_mount(|world, entity| {
        world.entity_mut(entity).insert(ScrollSentinel);
    });

    let facts = state.facts.iter().enumerate();
    let cards = facts.map(|(index, fact)| {
        let spec = card(CARD_TITLE, &fact.text, index);
        Child::from(spec)
    });
    let children = cards.chain(std::iter::once(sentinel.into()));
    h("div", [("class", "list".into())], children)
}

/// Throw away the mounted tree and build it again from [`FeedState`].
pub fn render(world: &mut World) {
    let Some(root) = world.get_resource::<MountPoint>().map(|mount| mount.0) else {
        return;
    };
    let view = app_view(world.resource::<FeedState>());

    clear_children(world, root);
    mount(world, root, &view);

    let mut sentinels = world.query_filtered::<Entity, With<ScrollSentinel>>();
    let sentinel = sentinels.iter(world).next();
    if let Some(sentinel) = sentinel {
        setup_infinite_scroll(world, sentinel);
    }
    layout_document(world);

    let mut request = world.resource_mut::<RenderRequest>();
    request.pending = false;
    request.renders += 1;
    debug!(renders = request.renders, "rendered feed");
}

/// Render once if anything asked for it this frame.
pub fn render_if_requested(world: &mut World) {
    if world.resource::<RenderRequest>().pending {
        render(world);
    }
}
