//! Per-video metadata harvesting for video-platform channels.
//!
//! A run takes a list of channel tabs and, for each one concurrently:
//!
//! 1. fetches the rendered tab to resolve the channel's browse id and the first tiles
//!    ([`discovery`]),
//! 2. pages through the tab's listing with continuation cursors, up to a cap ([`paginator`]),
//! 3. fetches and extracts every listed video's watch payload with bounded concurrency
//!    ([`orchestrator`], [`detail`]).
//!
//! The per-channel records are then concatenated into a [`Dataset`]. Nothing that goes wrong
//! for one channel, page or video stops the others.

pub mod config;
pub mod dataset;
pub mod detail;
pub mod discovery;
pub mod error;
pub mod innertube;
pub mod number;
pub mod orchestrator;
pub mod paginator;
pub mod text;
pub mod types;
pub mod walker;

#[cfg(test)]
mod mock;

pub use config::HarvestConfig;
pub use dataset::{ChannelSummary, Dataset, VideoRecord};
pub use error::HarvestError;
pub use innertube::{InnertubeApi, InnertubeClient};
pub use types::{ChannelTarget, ContentKind, VideoRef};

use futures::future::join_all;
use jiff::Timestamp;
use orchestrator::FetchReport;
use paginator::Paginator;
use tracing::instrument;

/// How one channel's harvest went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub target: ChannelTarget,
    /// `None` if discovery failed.
    pub browse_id: Option<String>,
    /// Refs listed after pagination, i.e. the number of detail fetches attempted.
    pub discovered: usize,
    pub report: FetchReport,
}

/// Runs the harvesting pipeline against an [`InnertubeApi`].
#[derive(Debug)]
pub struct Harvester<A> {
    api: A,
    config: HarvestConfig,
}

impl<A: InnertubeApi> Harvester<A> {
    pub fn new(api: A, config: HarvestConfig) -> Self {
        Self {
            api,
            config: config.normalized(),
        }
    }

    /// Harvests every target concurrently and aggregates the results in target order.
    pub async fn harvest(&self, targets: &[ChannelTarget]) -> Dataset {
        let outcomes = join_all(targets.iter().map(|target| self.harvest_channel(target))).await;
        let failed = outcomes.iter().filter(|o| o.browse_id.is_none()).count();
        tracing::info!(
            channels = targets.len(),
            failed_channels = failed,
            "all channels done"
        );
        Dataset::aggregate(
            Timestamp::now(),
            outcomes.into_iter().map(|o| o.report.records).collect(),
        )
    }

    /// Discovers, paginates and fetches one channel tab.
    #[instrument(skip_all, fields(channel = %target.url, kind = %target.content_kind))]
    pub async fn harvest_channel(&self, target: &ChannelTarget) -> ChannelOutcome {
        let discovery = match discovery::discover(&self.api, target).await {
            Ok(discovery) => discovery,
            Err(e) => {
                tracing::warn!(error = %e, "skipping channel");
                return ChannelOutcome {
                    target: target.clone(),
                    browse_id: None,
                    discovered: 0,
                    report: FetchReport::default(),
                };
            }
        };

        let listing = Paginator::new(
            &self.api,
            self.config.max_videos_per_channel,
            self.config.page_delay,
        )
        .paginate(&discovery.browse_id, target.content_kind, discovery.refs)
        .await;

        let refs: Vec<VideoRef> = listing.refs.into_iter().collect();
        let report =
            orchestrator::fetch_details(&self.api, &refs, self.config.concurrency_per_channel)
                .await;

        tracing::info!(
            browse_id = %discovery.browse_id,
            listed = refs.len(),
            records = report.records.len(),
            "channel done"
        );
        ChannelOutcome {
            target: target.clone(),
            browse_id: Some(discovery.browse_id),
            discovered: refs.len(),
            report,
        }
    }
}
