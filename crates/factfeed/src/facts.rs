use std::{
    sync::LazyLock,
    time::{SystemTime, UNIX_EPOCH},
};

use regex::Regex;

static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid markup pattern"));

/// One displayed snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub id: String,
    pub text: String,
    pub topic: Option<String>,
}

/// Remove every `<...>` tag from an API snippet.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    MARKUP.replace_all(html, "").into_owned()
}

/// Keep at most `max_words` words.
///
/// Text within the limit is returned untouched. Longer text is re-joined with single spaces
/// and gets a `...` suffix unless the cut already ends a sentence.
#[must_use]
pub fn truncate_words(text: &str, max_words: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let words = text.split_whitespace().collect::<Vec<_>>();
    if words.len() <= max_words {
        return text.to_string();
    }
    let cut = words[..max_words].join(" ");
    if cut.ends_with('.') {
        cut
    } else {
        format!("{cut}...")
    }
}

/// Milliseconds since the Unix epoch, used to stamp fact ids.
#[must_use]
pub fn timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Wrap already-truncated texts into facts with `<prefix>-<stamp>-<index>` ids.
#[must_use]
pub fn facts_from_texts(
    prefix: &str,
    stamp: u128,
    texts: Vec<String>,
    topic: Option<&str>,
) -> Vec<Fact> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Fact {
            id: format!("{prefix}-{stamp}-{i}"),
            text,
            topic: topic.map(str::to_string),
        })
        .collect()
}

/// Placeholder facts substituted when a topic load fails.
#[must_use]
pub fn fallback_facts(stamp: u128, count: usize) -> Vec<Fact> {
    (0..count)
        .map(|i| Fact {
            id: format!("fallback-{stamp}-{i}"),
            text: format!("Fallback Fact #{}", i + 1),
            topic: None,
        })
        .collect()
}
