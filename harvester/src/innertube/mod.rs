//! Access to the platform's rendered channel pages and its internal ("innertube") JSON API.
//!
//! The harvesting stages never talk to HTTP directly. They go through [`InnertubeApi`], which
//! has exactly the three calls the pipeline needs:
//!
//! - [`InnertubeApi::channel_page`]: `GET` a channel tab and return the rendered HTML, which
//!   embeds the channel's browse id and a first batch of tiles.
//! - [`InnertubeApi::browse`]: `POST /youtubei/v1/browse`, either seeded with a browse id and a
//!   tab-selecting `params` blob, or continued from an opaque cursor.
//! - [`InnertubeApi::next`]: `POST /youtubei/v1/next` for a single video, which returns the
//!   watch page's primary/secondary info, engagement panels and a `videoDetails` block.
//!
//! [`InnertubeClient`] is the reqwest-backed implementation used in production.

pub mod client;
pub mod types;

pub use client::InnertubeClient;
pub use types::BrowseQuery;

use crate::types::VideoRef;
use serde_json::Value;
use std::future::Future;

/// The upstream calls the harvester depends on.
///
/// Every call is a suspension point and may fail; callers decide how soft that failure is.
pub trait InnertubeApi {
    /// Fetches the rendered HTML of a channel tab.
    fn channel_page(&self, url: &str) -> impl Future<Output = eyre::Result<String>> + Send;

    /// Fetches one listing page.
    fn browse(&self, query: BrowseQuery<'_>) -> impl Future<Output = eyre::Result<Value>> + Send;

    /// Fetches the watch-page payload for one video.
    fn next(&self, video: &VideoRef) -> impl Future<Output = eyre::Result<Value>> + Send;
}
