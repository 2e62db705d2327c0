use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use bevy_ecs::prelude::*;
use bevy_math::Vec2;

use crate::{
    ElementValue, FactSource, FeedAction, FeedApp, FeedConfig, LayoutBox, RandomPage,
    ScrollSentinel, SearchHit, StyleAnimation, UiEventQueue, heart_of, render, search_facts,
    text_content,
};

const SETTLE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Random(usize),
    Search(String, usize),
}

#[derive(Default)]
struct RecordingSource {
    calls: Mutex<Vec<Call>>,
    fail: AtomicBool,
}

impl RecordingSource {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: Call) -> Result<()> {
        self.calls.lock().expect("calls lock").push(call);
        if self.fail.load(Ordering::SeqCst) {
            Err(anyhow!("network unreachable"))
        } else {
            Ok(())
        }
    }
}

impl FactSource for RecordingSource {
    fn random_pages(&self, count: usize) -> Result<Vec<RandomPage>> {
        self.record(Call::Random(count))?;
        Ok((0..count)
            .map(|i| RandomPage {
                title: Some(format!("Page {i}")),
                extract: Some(format!("Random extract number {i}.")),
            })
            .collect())
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.record(Call::Search(term.to_string(), limit))?;
        Ok((0..limit)
            .map(|i| SearchHit {
                title: Some(format!("{term} {i}")),
                snippet: Some(format!(
                    "About <span class=\"searchmatch\">{term}</span> number {i}"
                )),
            })
            .collect())
    }
}

/// Small viewport with no pre-trigger margin, so the sentinel starts out of view.
fn test_config() -> FeedConfig {
    let mut config = FeedConfig::default();
    config.layout.viewport_height = 40.0;
    config.scroll.root_margin = 0.0;
    config
}

fn settled_feed(source: &Arc<RecordingSource>) -> FeedApp {
    let mut feed = FeedApp::new(test_config(), source.clone());
    assert!(feed.run_until_idle(SETTLE), "initial load should settle");
    feed
}

fn first(feed: &FeedApp, selector: &str) -> Entity {
    feed.query(selector)
        .first()
        .copied()
        .unwrap_or_else(|| panic!("no element matches {selector}"))
}

fn like_starts(feed: &FeedApp, card: Entity) -> u32 {
    heart_of(feed.world(), card)
        .and_then(|heart| feed.world().get::<StyleAnimation>(heart))
        .map_or(0, |animation| animation.starts)
}

fn sentinel_top(feed: &mut FeedApp) -> f32 {
    let world = feed.world_mut();
    let mut sentinels = world.query_filtered::<&LayoutBox, With<ScrollSentinel>>();
    sentinels
        .iter(world)
        .next()
        .map(|layout_box| layout_box.top)
        .expect("sentinel should be laid out")
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

#[test]
fn startup_loads_a_page_of_random_facts() {
    let source = Arc::new(RecordingSource::default());
    let feed = settled_feed(&source);

    assert_eq!(source.calls(), [Call::Random(12)]);
    let state = feed.state();
    assert_eq!(state.facts.len(), 12);
    assert_eq!(state.facts[3].text, "Random extract number 3.");
    assert!(state.facts[0].id.starts_with("fact-"));
    assert_eq!(state.facts[0].topic.as_deref(), Some("random"));
    assert_eq!(feed.query("div.card").len(), 12);
    assert!(feed.text().contains("Random Facts"));
}

#[test]
fn topic_change_searches_for_the_topic_verbatim() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);

    let select = first(&feed, "select.input");
    feed.change(select, "human-body");
    assert!(feed.run_until_idle(SETTLE));

    assert_eq!(
        source.calls().last(),
        Some(&Call::Search("human-body".to_string(), 12))
    );
    let state = feed.state();
    assert_eq!(state.fact_topic, "human-body");
    assert_eq!(state.facts.len(), 12);
    assert_eq!(state.facts[0].text, "About human-body number 0");
    assert!(feed.text().contains("Human Body"));
}

#[test]
fn failed_fresh_load_shows_exactly_count_fallbacks() {
    let source = Arc::new(RecordingSource::default());
    source.set_failing(true);
    let feed = settled_feed(&source);

    let texts = feed
        .state()
        .facts
        .iter()
        .map(|fact| fact.text.clone())
        .collect::<Vec<_>>();
    let expected = (1..=12)
        .map(|n| format!("Fallback Fact #{n}"))
        .collect::<Vec<_>>();
    assert_eq!(texts, expected);
    assert!(feed.state().facts.iter().all(|fact| fact.topic.is_none()));
}

#[test]
fn sentinel_intersection_appends_exactly_one_page() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let before = feed.state().facts.clone();

    let top = sentinel_top(&mut feed);
    feed.scroll_to(top);
    assert!(feed.run_until_idle(SETTLE));

    assert_eq!(source.calls(), [Call::Random(12), Call::Random(8)]);
    let state = feed.state();
    assert_eq!(state.facts.len(), 20);
    assert_eq!(state.facts[..12], before[..]);
    assert!(!state.is_appending());
    assert_eq!(feed.query("div.card").len(), 20);
}

#[test]
fn failed_append_keeps_existing_facts_and_adds_fallbacks() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let before = feed.state().facts.clone();

    source.set_failing(true);
    let top = sentinel_top(&mut feed);
    feed.scroll_to(top);
    assert!(feed.run_until_idle(SETTLE));

    let state = feed.state();
    assert_eq!(state.facts.len(), 20);
    assert_eq!(state.facts[..12], before[..]);
    assert_eq!(state.facts[12].text, "Fallback Fact #1");
    assert_eq!(state.facts[19].text, "Fallback Fact #8");
    assert!(!state.is_appending());
}

#[test]
fn double_click_within_window_restarts_the_like_once() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let cards = feed.query("div.card");

    feed.click(cards[0], ms(10_000));
    feed.click(cards[0], ms(10_100));
    feed.update();
    assert_eq!(like_starts(&feed, cards[0]), 1);

    feed.click(cards[1], ms(20_000));
    feed.update();
    assert_eq!(like_starts(&feed, cards[1]), 0);

    feed.click(cards[2], ms(30_000));
    feed.click(cards[2], ms(30_500));
    feed.update();
    assert_eq!(like_starts(&feed, cards[2]), 0);
}

#[test]
fn repeated_likes_restart_the_animation_each_time() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let card = first(&feed, "div.card");

    for pair in 0..3u64 {
        let base = 10_000 + pair * 1_000;
        feed.click(card, ms(base));
        feed.click(card, ms(base + 100));
        feed.update();
    }

    assert_eq!(like_starts(&feed, card), 3);
}

#[test]
fn left_swipe_likes_but_right_swipe_does_not() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let cards = feed.query("div.card");

    feed.swipe(
        cards[0],
        Vec2::new(300.0, 100.0),
        Vec2::new(140.0, 110.0),
        ms(5_000),
    );
    feed.update();
    assert_eq!(like_starts(&feed, cards[0]), 1);

    feed.swipe(
        cards[1],
        Vec2::new(100.0, 100.0),
        Vec2::new(300.0, 100.0),
        ms(6_000),
    );
    feed.update();
    assert_eq!(like_starts(&feed, cards[1]), 0);
}

#[test]
fn blank_search_is_a_no_op() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let before = feed.state().facts.clone();

    let input = first(&feed, "input.input");
    feed.input(input, "   ");
    assert!(feed.run_until_idle(SETTLE));

    let button = first(&feed, "button.btn");
    assert_eq!(feed.click(button, ms(1_000)), 0, "blank query disables search");
    search_facts(feed.world_mut(), "   ");
    feed.world()
        .resource::<UiEventQueue>()
        .push_typed(button, FeedAction::SubmitSearch);
    assert!(feed.run_until_idle(SETTLE));

    assert!(!feed.state().is_searching);
    assert_eq!(feed.state().facts, before);
    assert_eq!(source.calls(), [Call::Random(12)]);
}

#[test]
fn search_replaces_facts_tagged_with_the_raw_query() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);

    let input = first(&feed, "input.input");
    feed.input(input, "  moon ");
    feed.update();

    let input = first(&feed, "input.input");
    assert_eq!(
        feed.world().get::<ElementValue>(input).map(|v| v.0.as_str()),
        Some("  moon ")
    );
    let button = first(&feed, "button.btn");
    feed.click(button, ms(2_000));
    assert!(feed.run_until_idle(SETTLE));

    assert_eq!(
        source.calls().last(),
        Some(&Call::Search("moon".to_string(), 10))
    );
    let state = feed.state();
    assert!(!state.is_searching);
    assert_eq!(state.facts.len(), 10);
    assert_eq!(state.facts[0].text, "About moon number 0");
    assert!(state.facts[0].id.starts_with("search-"));
    assert!(
        state
            .facts
            .iter()
            .all(|fact| fact.topic.as_deref() == Some("  moon "))
    );
    assert!(feed.text().contains("Search Results: \"  moon \""));
    let button = first(&feed, "button.btn");
    assert_eq!(text_content(feed.world(), button), "Search");
}

#[test]
fn failed_search_leaves_the_list_alone() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);
    let before = feed.state().facts.clone();

    source.set_failing(true);
    search_facts(feed.world_mut(), "moon");
    assert!(feed.state().is_searching);
    assert!(feed.run_until_idle(SETTLE));

    assert!(!feed.state().is_searching);
    assert_eq!(feed.state().facts, before);
}

#[test]
fn rerendering_unchanged_state_keeps_text_identical() {
    let source = Arc::new(RecordingSource::default());
    let mut feed = settled_feed(&source);

    let first_text = feed.text();
    let renders = feed.world().resource::<crate::RenderRequest>().renders;
    render(feed.world_mut());
    render(feed.world_mut());

    assert_eq!(feed.text(), first_text);
    assert_eq!(
        feed.world().resource::<crate::RenderRequest>().renders,
        renders + 2
    );
    assert_eq!(feed.query("div.card").len(), 12);
    assert_eq!(feed.query("div.list").len(), 1);
}
