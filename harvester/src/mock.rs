//! In-memory [`InnertubeApi`] for tests, plus builders for realistic payloads.

use crate::innertube::{BrowseQuery, InnertubeApi};
use crate::types::VideoRef;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves canned responses and records how it was called.
///
/// Anything not registered fails the way a real network error would.
#[derive(Debug, Default)]
pub(crate) struct MockApi {
    pages: HashMap<String, String>,
    seeds: HashMap<String, Value>,
    continuations: HashMap<String, Value>,
    details: HashMap<String, Value>,
    detail_delay: Duration,
    browse_log: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_calls: AtomicUsize,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub(crate) fn with_seed(mut self, browse_id: &str, response: Value) -> Self {
        self.seeds.insert(browse_id.to_string(), response);
        self
    }

    pub(crate) fn with_continuation(mut self, token: &str, response: Value) -> Self {
        self.continuations.insert(token.to_string(), response);
        self
    }

    pub(crate) fn with_video(mut self, video_id: &str, response: Value) -> Self {
        self.details.insert(video_id.to_string(), response);
        self
    }

    /// Makes every detail call take `delay`, so that calls overlap.
    pub(crate) fn with_detail_delay(mut self, delay: Duration) -> Self {
        self.detail_delay = delay;
        self
    }

    /// Browse calls in the order they were made: `seed:<browse id>` or `cont:<token>`.
    pub(crate) fn browse_log(&self) -> Vec<String> {
        self.browse_log.lock().unwrap().clone()
    }

    /// The largest number of detail calls that were unresolved at the same time.
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn next_calls(&self) -> usize {
        self.next_calls.load(Ordering::SeqCst)
    }
}

impl InnertubeApi for MockApi {
    async fn channel_page(&self, url: &str) -> eyre::Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| eyre::eyre!("GET {url} failed with status 404 Not Found"))
    }

    async fn browse(&self, query: BrowseQuery<'_>) -> eyre::Result<Value> {
        let (entry, response) = match query {
            BrowseQuery::Seed { browse_id, .. } => {
                (format!("seed:{browse_id}"), self.seeds.get(browse_id))
            }
            BrowseQuery::Continuation { token } => {
                (format!("cont:{token}"), self.continuations.get(token))
            }
        };
        self.browse_log.lock().unwrap().push(entry.clone());
        response
            .cloned()
            .ok_or_else(|| eyre::eyre!("browse {entry} failed with status 500"))
    }

    async fn next(&self, video: &VideoRef) -> eyre::Result<Value> {
        self.next_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.detail_delay.is_zero() {
            tokio::time::sleep(self.detail_delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.details
            .get(video.as_str())
            .cloned()
            .ok_or_else(|| eyre::eyre!("next for {video} timed out"))
    }
}

/// A browse response listing `ids` as rich-item tiles, with an optional continuation.
pub(crate) fn browse_page(ids: &[&str], token: Option<&str>) -> Value {
    let mut items: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({ "richItemRenderer": { "content": { "videoRenderer": {
                "videoId": id,
                "title": { "runs": [{ "text": format!("tile {id}") }] }
            }}}})
        })
        .collect();
    if let Some(token) = token {
        items.push(json!({ "continuationItemRenderer": {
            "continuationEndpoint": { "continuationCommand": {
                "token": token,
                "request": "CONTINUATION_REQUEST_TYPE_BROWSE"
            }}
        }}));
    }
    json!({
        "onResponseReceivedActions": [{
            "appendContinuationItemsAction": { "continuationItems": items }
        }]
    })
}

/// A rendered channel page embedding `browse_id` and an initial-data blob with `ids`.
pub(crate) fn channel_html(browse_id: &str, ids: &[&str]) -> String {
    let initial = browse_page(ids, None);
    format!(
        r#"<!DOCTYPE html><html><head><script nonce="x">var ytcfg = {{}};</script></head><body>
<script nonce="x">var ytInitialData = {initial};</script>
<script>window.meta = {{"header":{{"c4TabbedHeaderRenderer":{{"channelId":"{browse_id}"}}}},"endpoint":{{"browseEndpoint":{{"browseId":"{browse_id}"}}}}}};</script>
</body></html>"#
    )
}

/// A well-formed `next` response for one video.
pub(crate) fn watch_page(video_id: &str, title: &str) -> Value {
    json!({
        "contents": { "twoColumnWatchNextResults": { "results": { "results": { "contents": [
            { "videoPrimaryInfoRenderer": {
                "title": { "runs": [{ "text": title }] },
                "viewCount": { "videoViewCountRenderer": {
                    "viewCount": { "simpleText": "12,345 views" },
                    "shortViewCount": { "simpleText": "12K views" }
                }},
                "dateText": { "simpleText": "Mar 3, 2025" },
                "videoActions": { "menuRenderer": { "topLevelButtons": [
                    { "toggleButtonRenderer": { "defaultText": {
                        "accessibility": { "accessibilityData": {
                            "label": "like this video along with 321 other people"
                        }},
                        "simpleText": "321"
                    }}}
                ]}}
            }},
            { "videoSecondaryInfoRenderer": {
                "owner": { "videoOwnerRenderer": {
                    "title": { "runs": [{
                        "text": "Some Channel",
                        "navigationEndpoint": { "browseEndpoint": { "browseId": "UCowner" } }
                    }]},
                    "navigationEndpoint": { "browseEndpoint": { "browseId": "UCowner" } },
                    "subscriberCountText": { "simpleText": "1.5M subscribers" }
                }}
            }}
        ]}}}},
        "engagementPanels": [
            { "engagementPanelSectionListRenderer": {
                "panelIdentifier": "engagement-panel-structured-description",
                "content": { "structuredDescriptionContentRenderer": { "items": [
                    { "videoDescriptionHeaderRenderer": { "factoid": [
                        { "factoidRenderer": {
                            "value": { "simpleText": "1.2K" },
                            "label": { "simpleText": "Likes" }
                        }},
                        { "factoidRenderer": {
                            "value": { "simpleText": "12,345" },
                            "label": { "simpleText": "Views" }
                        }}
                    ]}}
                ]}}
            }},
            { "engagementPanelSectionListRenderer": {
                "panelIdentifier": "engagement-panel-comments-section",
                "header": { "engagementPanelTitleHeaderRenderer": {
                    "title": { "runs": [{ "text": "Comments" }] },
                    "contextualInfo": { "runs": [{ "text": "87" }] }
                }}
            }}
        ],
        "videoDetails": {
            "videoId": video_id,
            "lengthSeconds": "754",
            "channelId": "UCowner"
        }
    })
}
