use std::sync::Arc;

use anyhow::{Result, anyhow};
use bevy_ecs::prelude::*;
use bevy_tasks::{AsyncComputeTaskPool, TaskPool};
use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, info, warn};

use crate::{
    client::{FactSource, RandomPage, SearchHit},
    config::FeedConfig,
    facts::{facts_from_texts, fallback_facts, strip_markup, timestamp_millis, truncate_words},
    state::{FeedState, request_render},
    topics::RANDOM_TOPIC,
};

/// Why a topic load was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Initial,
    TopicChange,
    InfiniteScroll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCommand {
    LoadTopic {
        topic: String,
        count: usize,
        origin: LoadOrigin,
    },
    Search {
        query: String,
    },
}

#[derive(Debug)]
pub enum FetchResult {
    TopicLoaded {
        topic: String,
        count: usize,
        origin: LoadOrigin,
        texts: Result<Vec<String>>,
    },
    SearchFinished {
        query: String,
        texts: Result<Vec<String>>,
    },
}

/// Shared handle to the active [`FactSource`].
#[derive(Resource, Clone)]
pub struct FactSourceHandle(pub Arc<dyn FactSource>);

/// Stands in when no [`FactSourceHandle`] was installed; every request fails.
struct MissingSource;

impl FactSource for MissingSource {
    fn random_pages(&self, _count: usize) -> Result<Vec<RandomPage>> {
        Err(anyhow!("no fact source installed"))
    }

    fn search(&self, _term: &str, _limit: usize) -> Result<Vec<SearchHit>> {
        Err(anyhow!("no fact source installed"))
    }
}

/// Channels between the schedule and network tasks.
#[derive(Resource)]
pub struct FetchBridge {
    cmd_tx: Sender<FetchCommand>,
    cmd_rx: Receiver<FetchCommand>,
    result_tx: Sender<FetchResult>,
    result_rx: Receiver<FetchResult>,
    in_flight: usize,
}

impl Default for FetchBridge {
    fn default() -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        let (result_tx, result_rx) = unbounded();
        Self {
            cmd_tx,
            cmd_rx,
            result_tx,
            result_rx,
            in_flight: 0,
        }
    }
}

impl FetchBridge {
    /// Requests sent but not yet applied.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

pub(crate) fn ensure_task_pool_initialized() {
    let _ = AsyncComputeTaskPool::get_or_init(TaskPool::new);
}

fn send_command(world: &mut World, cmd: FetchCommand) {
    let mut bridge = world.resource_mut::<FetchBridge>();
    if bridge.cmd_tx.send(cmd).is_ok() {
        bridge.in_flight += 1;
    }
}

/// Load `count` facts for `topic`; the result replaces or appends depending on
/// [`FeedState::is_appending`] when it lands.
pub fn load_facts(world: &mut World, topic: &str, count: usize, origin: LoadOrigin) {
    info!(topic, count, ?origin, "loading facts");
    send_command(
        world,
        FetchCommand::LoadTopic {
            topic: topic.to_string(),
            count,
            origin,
        },
    );
}

/// Run a free-text search. Blank queries are ignored.
pub fn search_facts(world: &mut World, query: &str) {
    if query.trim().is_empty() {
        debug!("ignoring blank search");
        return;
    }
    world.resource_mut::<FeedState>().is_searching = true;
    request_render(world);
    info!(query, "searching facts");
    send_command(
        world,
        FetchCommand::Search {
            query: query.to_string(),
        },
    );
}

/// Topic loads: random pages for [`RANDOM_TOPIC`], otherwise the topic is the search term.
fn load_topic_texts(
    source: &dyn FactSource,
    topic: &str,
    count: usize,
    max_words: usize,
) -> Result<Vec<String>> {
    let texts = if topic == RANDOM_TOPIC {
        source
            .random_pages(count)?
            .into_iter()
            .map(|page| {
                let text = page
                    .extract
                    .filter(|extract| !extract.is_empty())
                    .or(page.title)
                    .unwrap_or_default();
                truncate_words(&text, max_words)
            })
            .collect()
    } else {
        source
            .search(topic, count)?
            .into_iter()
            .map(|hit| {
                let text = hit
                    .snippet
                    .map(|snippet| strip_markup(&snippet))
                    .filter(|extract| !extract.is_empty())
                    .or(hit.title)
                    .unwrap_or_default();
                truncate_words(&text, max_words)
            })
            .collect()
    };
    Ok(texts)
}

fn search_texts(
    source: &dyn FactSource,
    query: &str,
    limit: usize,
    max_words: usize,
) -> Result<Vec<String>> {
    let texts = source
        .search(query.trim(), limit)?
        .into_iter()
        .map(|hit| {
            let raw = hit
                .snippet
                .filter(|snippet| !snippet.is_empty())
                .or(hit.title)
                .unwrap_or_default();
            truncate_words(&strip_markup(&raw), max_words)
        })
        .collect();
    Ok(texts)
}

fn run_fetch_command(
    source: &dyn FactSource,
    config: &FeedConfig,
    cmd: FetchCommand,
) -> FetchResult {
    let max_words = config.feed.max_words;
    match cmd {
        FetchCommand::LoadTopic {
            topic,
            count,
            origin,
        } => {
            let texts = load_topic_texts(source, &topic, count, max_words);
            FetchResult::TopicLoaded {
                topic,
                count,
                origin,
                texts,
            }
        }
        FetchCommand::Search { query } => {
            let texts = search_texts(source, &query, config.feed.search_limit, max_words);
            FetchResult::SearchFinished { query, texts }
        }
    }
}

/// Move queued commands onto the async compute pool.
pub fn spawn_fetch_tasks(world: &mut World) {
    let cmd_rx = world.resource::<FetchBridge>().cmd_rx.clone();
    if cmd_rx.is_empty() {
        return;
    }
    let result_tx = world.resource::<FetchBridge>().result_tx.clone();
    let source: Arc<dyn FactSource> = match world.get_resource::<FactSourceHandle>() {
        Some(handle) => handle.0.clone(),
        None => {
            warn!("no fact source installed, requests will fail");
            Arc::new(MissingSource)
        }
    };
    let config = world.resource::<FeedConfig>().clone();

    while let Ok(cmd) = cmd_rx.try_recv() {
        let source = source.clone();
        let config = config.clone();
        let result_tx = result_tx.clone();
        debug!(?cmd, "spawning fetch task");

        AsyncComputeTaskPool::get()
            .spawn(async move {
                let result = run_fetch_command(source.as_ref(), &config, cmd);
                let _ = result_tx.send(result);
            })
            .detach();
    }
}

/// Apply completed fetches to [`FeedState`] in completion order.
pub fn apply_fetch_results(world: &mut World) {
    let result_rx = world.resource::<FetchBridge>().result_rx.clone();

    while let Ok(result) = result_rx.try_recv() {
        {
            let mut bridge = world.resource_mut::<FetchBridge>();
            bridge.in_flight = bridge.in_flight.saturating_sub(1);
        }

        match result {
            FetchResult::TopicLoaded {
                topic,
                count,
                origin,
                texts,
            } => apply_topic_load(world, &topic, count, origin, texts),
            FetchResult::SearchFinished { query, texts } => apply_search(world, &query, texts),
        }
        request_render(world);
    }
}

fn apply_topic_load(
    world: &mut World,
    topic: &str,
    count: usize,
    origin: LoadOrigin,
    texts: Result<Vec<String>>,
) {
    let stamp = timestamp_millis();
    let incoming = match texts {
        Ok(texts) => facts_from_texts("fact", stamp, texts, Some(topic)),
        Err(err) => {
            warn!(topic, count, "fact load failed, using fallbacks: {err:#}");
            fallback_facts(stamp, count)
        }
    };

    let mut state = world.resource_mut::<FeedState>();
    debug!(
        topic,
        received = incoming.len(),
        appending = state.appending,
        "applying fact load"
    );
    if state.appending {
        state.facts.extend(incoming);
    } else {
        state.facts = incoming;
    }
    if origin == LoadOrigin::InfiniteScroll {
        state.appending = false;
    }
}

fn apply_search(world: &mut World, query: &str, texts: Result<Vec<String>>) {
    let mut state = world.resource_mut::<FeedState>();
    match texts {
        Ok(texts) => {
            state.facts = facts_from_texts("search", timestamp_millis(), texts, Some(query));
        }
        Err(err) => warn!(query, "search failed, keeping current facts: {err:#}"),
    }
    state.is_searching = false;
}
