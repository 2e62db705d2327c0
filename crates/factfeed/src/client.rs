use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use reqwest::{
    StatusCode, Url,
    blocking::{Client, Response},
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::config::ApiConfig;

/// A page returned by the random-page generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RandomPage {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub extract: Option<String>,
}

/// A hit returned by the full-text search list.
///
/// `snippet` still contains the API's highlighting markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RandomResponse {
    #[serde(default)]
    query: Option<RandomQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct RandomQuery {
    #[serde(default)]
    pages: BTreeMap<String, RandomPage>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

/// Where facts come from.
///
/// Implementations block; callers run them on a task pool.
pub trait FactSource: Send + Sync + 'static {
    fn random_pages(&self, count: usize) -> Result<Vec<RandomPage>>;

    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

/// Blocking client for the MediaWiki action API.
#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    endpoint: Url,
}

impl WikipediaClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("invalid encyclopedia endpoint `{}`", config.endpoint))?;
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, endpoint })
    }

    /// `generator=random` query restricted to the main namespace, with plain-text intros.
    #[must_use]
    pub fn random_pages_url(&self, count: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("generator", "random")
            .append_pair("grnnamespace", "0")
            .append_pair("prop", "extracts")
            .append_key_only("exintro")
            .append_key_only("explaintext")
            .append_pair("origin", "*")
            .append_pair("grnlimit", &count.to_string());
        url
    }

    /// `list=search` query for `term`, used verbatim.
    #[must_use]
    pub fn search_url(&self, term: &str, limit: usize) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("action", "query")
            .append_pair("format", "json")
            .append_pair("list", "search")
            .append_pair("srsearch", term)
            .append_pair("origin", "*")
            .append_pair("srlimit", &limit.to_string());
        url
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "encyclopedia request");
        let response = self
            .http
            .get(url.clone())
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        decode_json(response)
    }
}

impl FactSource for WikipediaClient {
    fn random_pages(&self, count: usize) -> Result<Vec<RandomPage>> {
        let response: RandomResponse = self.get_json(self.random_pages_url(count))?;
        Ok(ordered_pages(response))
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let response: SearchResponse = self.get_json(self.search_url(term, limit))?;
        Ok(response.query.map(|q| q.search).unwrap_or_default())
    }
}

fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response
        .text()
        .unwrap_or_else(|err| format!("<unreadable body: {err}>"));
    decode_json_from_body(status, &body)
}

fn decode_json_from_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T> {
    if !status.is_success() {
        return Err(anyhow!("request failed: status={status}, body={body}"));
    }

    serde_json::from_str::<T>(body)
        .with_context(|| format!("failed to decode json: status={status}, body={body}"))
}

/// Pages keyed by page id come back in ascending numeric id order; other keys follow.
fn ordered_pages(response: RandomResponse) -> Vec<RandomPage> {
    let mut pages = response
        .query
        .map(|query| query.pages.into_iter().collect::<Vec<_>>())
        .unwrap_or_default();
    pages.sort_by_key(|(key, _)| match key.parse::<u64>() {
        Ok(id) => (false, id),
        Err(_) => (true, 0),
    });
    pages.into_iter().map(|(_, page)| page).collect()
}
