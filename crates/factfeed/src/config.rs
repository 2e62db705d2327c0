use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Default public encyclopedia endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Whole-application configuration, loaded from RON.
///
/// Every section falls back to its defaults, so a config file only needs the keys it changes:
///
/// ```
/// let config = factfeed::FeedConfig::from_ron_str("(feed: (append_count: 4))").unwrap();
/// assert_eq!(config.feed.append_count, 4);
/// assert_eq!(config.feed.initial_count, 12);
/// ```
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub api: ApiConfig,
    pub feed: FeedLimits,
    pub gestures: GestureConfig,
    pub scroll: ScrollConfig,
    pub layout: LayoutConfig,
}

impl FeedConfig {
    pub fn from_ron_str(source: &str) -> Result<Self> {
        ron::from_str(source).context("failed to parse feed config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let context = || format!("invalid config {}", path.display());
        Self::from_ron_str(&source).with_context(context)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: format!("factfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLimits {
    pub initial_topic: String,
    pub initial_count: usize,
    pub append_count: usize,
    pub search_limit: usize,
    pub max_words: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            initial_topic: crate::topics::RANDOM_TOPIC.to_string(),
            initial_count: 12,
            append_count: 8,
            search_limit: 10,
            max_words: 55,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub double_tap_window_ms: u64,
    /// Horizontal travel before a touch counts as a swipe.
    pub swipe_start_px: f32,
    /// How many times larger than the vertical travel the horizontal travel must be.
    pub swipe_dominance: f32,
    /// Leftward displacement at touch end that likes the card.
    pub swipe_like_px: f32,
}

impl GestureConfig {
    #[must_use]
    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            double_tap_window_ms: 300,
            swipe_start_px: 50.0,
            swipe_dominance: 2.0,
            swipe_like_px: 120.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Pre-trigger margin around the viewport, in pixels.
    pub root_margin: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { root_margin: 200.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub line_height: f32,
    pub chars_per_line: usize,
    pub control_height: f32,
    pub card_padding: f32,
    /// Classes laid out horizontally (children share one line).
    pub row_classes: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            viewport_width: 420.0,
            viewport_height: 860.0,
            line_height: 20.0,
            chars_per_line: 48,
            control_height: 36.0,
            card_padding: 16.0,
            row_classes: vec![
                "topbar".to_string(),
                "bar".to_string(),
                "topicbar".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = FeedConfig::from_ron_str("()").expect("defaults");
        assert_eq!(config, FeedConfig::default());
        let window = config.gestures.double_tap_window();
        assert_eq!(window, Duration::from_millis(300));
        assert_eq!(config.scroll.root_margin, 200.0);
        assert_eq!(config.feed.max_words, 55);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = FeedConfig::from_ron_str(
            r#"(
                api: (endpoint: "http://localhost:8080/w/api.php"),
                gestures: (swipe_like_px: 90.0),
            )"#,
        )
        .expect("partial config should parse");

        assert_eq!(config.api.endpoint, "http://localhost:8080/w/api.php");
        assert!(config.api.user_agent.starts_with("factfeed/"));
        assert_eq!(config.gestures.swipe_like_px, 90.0);
        assert_eq!(config.gestures.swipe_start_px, 50.0);
    }

    #[test]
    fn malformed_config_reports_context() {
        let err = FeedConfig::from_ron_str("(feed: (append_count: \"many\"))")
            .expect_err("string count should fail");
        assert!(err.to_string().contains("failed to parse feed config"));
    }

    #[test]
    fn shipped_config_parses() {
        let shipped = include_str!("../../../assets/factfeed.ron");
        let config = FeedConfig::from_ron_str(shipped).expect("shipped");
        assert_eq!(config.feed.initial_count, 12);
        assert_eq!(config.feed.append_count, 8);
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = "/definitely/not/here.ron";
        let err = FeedConfig::load(path).expect_err("missing file");
        assert!(format!("{err:#}").contains(path));
    }
}
