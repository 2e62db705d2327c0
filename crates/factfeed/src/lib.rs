//! A card feed of short encyclopedia facts, driven by a Bevy ECS app.
//!
//! The page is a retained element tree stored as ECS entities under a single `#app` mount
//! point. It is rebuilt from [`FeedState`] after every state change. `factfeed` provides:
//! - a hyperscript-style builder ([`h`]) and DOM event dispatch with bubbling,
//! - topic loads and free-text search against the MediaWiki API on a task pool,
//! - fact cards with double-tap and swipe "like" gestures,
//! - infinite scroll through a sentinel observed against the viewport.
//!
//! # Minimal setup
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use factfeed::{FeedApp, FeedConfig};
//!
//! let mut feed = FeedApp::with_wikipedia(FeedConfig::default()).unwrap();
//! feed.run_until_idle(Duration::from_secs(10));
//! println!("{}", feed.state().facts.len());
//! ```
#![forbid(unsafe_code)]

pub mod actions;
pub mod card;
pub mod client;
pub mod config;
pub mod dom;
pub mod ecs;
pub mod events;
pub mod facts;
pub mod fetch;
pub mod layout;
pub mod logging;
pub mod plugin;
pub mod render;
pub mod runner;
pub mod scroll;
pub mod state;
pub mod styling;
pub mod topics;

pub use bevy_app;
pub use bevy_ecs;
pub use bevy_math;
pub use bevy_tasks;

pub use actions::*;
pub use card::*;
pub use client::*;
pub use config::*;
pub use dom::*;
pub use ecs::*;
pub use events::*;
pub use facts::*;
pub use fetch::*;
pub use layout::*;
pub use logging::*;
pub use plugin::*;
pub use render::*;
pub use runner::*;
pub use scroll::*;
pub use state::*;
pub use styling::*;
pub use topics::*;

#[cfg(test)]
mod tests;
