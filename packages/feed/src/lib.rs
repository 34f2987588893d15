#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Live incident feed for the dispatch map.
//!
//! The feed is built in three steps, each usable on its own:
//!
//! 1. [`score`]: every incident gets a priority (severity weight plus a
//!    recency term) and the list is sorted by it, highest first.
//! 2. [`spatial`]: incidents further than the configured radius from the
//!    current view center are hidden, using a flat-earth distance in
//!    degrees scaled to kilometres.
//! 3. [`markers`]: the visible set is diffed against the markers already
//!    on the map, producing add/remove/recolor operations.
//!
//! [`FeedComposer`] ties the three together and reloads whenever the
//! server's change stream reports a write. [`DispatchClient`] is the HTTP
//! client for that server.

pub mod client;
pub mod composer;
pub mod markers;
pub mod score;
pub mod spatial;
pub mod sse;

pub use client::DispatchClient;
pub use composer::{FeedComposer, FeedFilter, FeedSource};
pub use markers::{Marker, MarkerColor, MarkerOp, MarkerSet};
pub use score::{RankedIncident, priority, rank};

use thiserror::Error;

/// Errors from loading or streaming the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with an error body.
    #[error("Server returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `error` message.
        message: String,
    },
}
