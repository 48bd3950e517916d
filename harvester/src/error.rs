//! The soft failures a harvest can run into.
//!
//! None of these abort a run. Each one is confined to the unit of work it occurred in (a
//! channel, a listing page, a single video), logged, and counted.

use crate::types::VideoRef;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// No browse id could be resolved for a channel; it contributes no records.
    #[error("could not resolve a channel id for {url}: {reason}")]
    DiscoveryFailed { url: String, reason: String },

    /// A listing page request failed; pagination stops with what it has.
    #[error("listing page {page} for {browse_id} failed: {reason}")]
    PageFetchFailed {
        browse_id: String,
        page: usize,
        reason: String,
    },

    /// The detail request for a video failed outright.
    #[error("fetching details for {video} failed: {reason}")]
    DetailFetchFailed { video: VideoRef, reason: String },

    /// The detail payload lacked the sections every watch page has.
    #[error("details for {video} do not look like a watch page")]
    DetailParseFailed { video: VideoRef },
}

/// Renders an [`eyre::Report`] with its whole context chain on one line.
pub(crate) fn chain(report: &eyre::Report) -> String {
    format!("{report:#}")
}
