//! Bounded-concurrency detail fetching for one channel's refs.

use crate::dataset::VideoRecord;
use crate::detail;
use crate::error::HarvestError;
use crate::innertube::InnertubeApi;
use crate::types::VideoRef;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::instrument;

/// What came of fetching one channel's details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Successful records, in the same order as the refs they came from.
    pub records: Vec<VideoRecord>,
    pub attempted: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
}

/// Fetches details for every ref, with at most `concurrency` requests in flight.
///
/// Failed refs are logged and dropped; they never abort the others.
#[instrument(skip_all, fields(refs = refs.len(), concurrency = concurrency))]
pub async fn fetch_details<A: InnertubeApi>(
    api: &A,
    refs: &[VideoRef],
    concurrency: usize,
) -> FetchReport {
    let semaphore = Semaphore::new(concurrency.max(1));
    let tasks = refs.iter().map(|video| {
        let semaphore = &semaphore;
        async move {
            // the semaphore is never closed
            let _permit = semaphore.acquire().await.ok();
            detail::fetch_video_record(api, video).await
        }
    });
    let results = join_all(tasks).await;

    let mut report = FetchReport {
        attempted: refs.len(),
        ..FetchReport::default()
    };
    for result in results {
        match result {
            Ok(record) => report.records.push(record),
            Err(e) => {
                match e {
                    HarvestError::DetailParseFailed { .. } => report.parse_failures += 1,
                    _ => report.fetch_failures += 1,
                }
                tracing::debug!(error = %e, "dropping video");
            }
        }
    }

    tracing::info!(
        fetched = report.records.len(),
        fetch_failures = report.fetch_failures,
        parse_failures = report.parse_failures,
        "details fetched"
    );
    report
}
