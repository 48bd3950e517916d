//! Cursor-driven listing of a channel tab beyond what the rendered page shows.
//!
//! The first request is seeded with the browse id and the tab's `params` blob; every later
//! request replays the continuation cursor found in the previous response. The platform gives
//! no reliable end-of-list signal, so we stop on whichever comes first:
//!
//! - the configured cap is reached,
//! - a response carries no further cursor,
//! - a continuation page adds nothing we have not seen (end of list, or the platform looping),
//! - a request fails.
//!
//! Every one of these is a normal outcome. Whatever was collected up to that point is kept.

use crate::error::{HarvestError, chain};
use crate::innertube::{BrowseQuery, InnertubeApi};
use crate::types::{ContentKind, VideoRef};
use crate::walker;
use indexmap::IndexSet;
use serde_json::Value;
use std::time::Duration;
use tracing::instrument;

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CursorExhausted,
    CapReached,
    NoNewRefs,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOutcome {
    /// Every ref collected, discovery's first, in the order they were found.
    pub refs: IndexSet<VideoRef>,
    /// Listing requests that returned a response.
    pub pages_fetched: usize,
    pub stop_reason: StopReason,
}

#[derive(Debug)]
pub struct Paginator<'a, A> {
    api: &'a A,
    cap: usize,
    page_delay: Duration,
}

impl<'a, A: InnertubeApi> Paginator<'a, A> {
    pub fn new(api: &'a A, cap: usize, page_delay: Duration) -> Self {
        Self {
            api,
            cap,
            page_delay,
        }
    }

    /// Extends `discovered` with the channel tab's listing, never beyond the cap.
    #[instrument(skip(self, discovered), fields(cap = self.cap, discovered = discovered.len()))]
    pub async fn paginate(
        &self,
        browse_id: &str,
        kind: ContentKind,
        mut discovered: IndexSet<VideoRef>,
    ) -> PaginationOutcome {
        discovered.truncate(self.cap);
        let mut listing = Listing {
            refs: discovered,
            pages_fetched: 0,
            cap: self.cap,
        };
        if listing.is_full() {
            return listing.finish(StopReason::CapReached);
        }

        let seed = BrowseQuery::Seed { browse_id, kind };
        let mut cursor = match self.fetch(browse_id, 1, seed).await {
            Some(page) => {
                let added = listing.absorb(&page);
                tracing::debug!(added, total = listing.refs.len(), "seed page");
                walker::find_continuation(&page)
            }
            None => return listing.finish(StopReason::FetchFailed),
        };

        let mut page_number = 1;
        loop {
            page_number += 1;
            if listing.is_full() {
                return listing.finish(StopReason::CapReached);
            }
            let Some(token) = cursor.take() else {
                return listing.finish(StopReason::CursorExhausted);
            };
            if page_number > 2 && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            let query = BrowseQuery::Continuation { token: &token };
            let Some(page) = self.fetch(browse_id, page_number, query).await else {
                return listing.finish(StopReason::FetchFailed);
            };
            let added = listing.absorb(&page);
            tracing::debug!(
                page = page_number,
                added,
                total = listing.refs.len(),
                "continuation page"
            );
            if added == 0 {
                return listing.finish(StopReason::NoNewRefs);
            }
            cursor = walker::find_continuation(&page);
        }
    }

    async fn fetch(&self, browse_id: &str, page: usize, query: BrowseQuery<'_>) -> Option<Value> {
        match self.api.browse(query).await {
            Ok(response) => Some(response),
            Err(e) => {
                let err = HarvestError::PageFetchFailed {
                    browse_id: browse_id.to_string(),
                    page,
                    reason: chain(&e),
                };
                tracing::warn!(error = %err, "stopping pagination");
                None
            }
        }
    }
}

/// Accumulated state of one channel's pagination loop.
struct Listing {
    refs: IndexSet<VideoRef>,
    pages_fetched: usize,
    cap: usize,
}

impl Listing {
    fn is_full(&self) -> bool {
        self.refs.len() >= self.cap
    }

    /// Adds the page's unseen refs, up to the cap, and returns how many were added.
    fn absorb(&mut self, page: &Value) -> usize {
        self.pages_fetched += 1;
        let mut found = IndexSet::new();
        walker::find_video_refs(page, &mut found);

        let before = self.refs.len();
        for video in found {
            if self.is_full() {
                break;
            }
            self.refs.insert(video);
        }
        self.refs.len() - before
    }

    fn finish(self, stop_reason: StopReason) -> PaginationOutcome {
        tracing::info!(
            total = self.refs.len(),
            pages = self.pages_fetched,
            reason = ?stop_reason,
            "pagination finished"
        );
        PaginationOutcome {
            refs: self.refs,
            pages_fetched: self.pages_fetched,
            stop_reason,
        }
    }
}
