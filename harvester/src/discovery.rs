//! Resolving a channel tab URL into a browse id and the tiles rendered on the page itself.

use crate::error::{HarvestError, chain};
use crate::innertube::InnertubeApi;
use crate::types::{ChannelTarget, ContentKind, VideoRef};
use crate::walker;
use indexmap::IndexSet;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::instrument;

/// Browse-id embeddings, in priority order.
static BROWSE_ID_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r#""browseId":"(UC[a-zA-Z0-9_-]+)""#).expect("browseId pattern is valid"),
        Regex::new(r#""channelId":"(UC[a-zA-Z0-9_-]+)""#).expect("channelId pattern is valid"),
    ]
});

/// Bare short ids in the contexts they show up in when a shorts tab has no usable embed.
static SHORT_ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#""videoId":"([a-zA-Z0-9_-]{11})""#).expect("videoId pattern is valid"),
        Regex::new(r#""contentId":"([a-zA-Z0-9_-]{11})""#).expect("contentId pattern is valid"),
        Regex::new(r"/shorts/([a-zA-Z0-9_-]{11})").expect("shorts link pattern is valid"),
    ]
});

const INITIAL_DATA_MARKERS: [&str; 2] = ["var ytInitialData = ", r#"window["ytInitialData"] = "#];

/// What the rendered channel page told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub browse_id: String,
    /// Tiles found on the page, in page order.
    pub refs: IndexSet<VideoRef>,
}

/// Fetches `target`'s page and extracts its browse id and initial tiles.
///
/// Failing to fetch the page and failing to find a browse id are the same thing to the caller:
/// the channel cannot be harvested.
#[instrument(skip_all, fields(channel = %target.url))]
pub async fn discover<A: InnertubeApi>(
    api: &A,
    target: &ChannelTarget,
) -> Result<Discovery, HarvestError> {
    let html = api
        .channel_page(&target.url)
        .await
        .map_err(|e| HarvestError::DiscoveryFailed {
            url: target.url.clone(),
            reason: chain(&e),
        })?;

    let discovery = parse_channel_page(&html, target.content_kind).ok_or_else(|| {
        HarvestError::DiscoveryFailed {
            url: target.url.clone(),
            reason: "no browseId or channelId in page".to_string(),
        }
    })?;

    tracing::info!(
        browse_id = %discovery.browse_id,
        initial = discovery.refs.len(),
        "resolved channel"
    );
    Ok(discovery)
}

/// Extracts the browse id and initial tiles from a rendered channel page.
///
/// Returns `None` only when no browse id is present. A page whose embedded data is missing or
/// malformed still yields a [`Discovery`], just with fewer (possibly zero) refs.
pub fn parse_channel_page(html: &str, kind: ContentKind) -> Option<Discovery> {
    let browse_id = extract_browse_id(html)?;

    let mut refs = IndexSet::new();
    match extract_initial_data(html) {
        Some(initial) => {
            walker::find_video_refs(&initial, &mut refs);
        }
        None => tracing::warn!(%browse_id, "page has no parseable ytInitialData"),
    }

    if kind == ContentKind::ShortForm && refs.is_empty() {
        scan_short_ids(html, &mut refs);
        if !refs.is_empty() {
            tracing::debug!(%browse_id, found = refs.len(), "recovered shorts from raw page text");
        }
    }

    Some(Discovery { browse_id, refs })
}

/// The first browse id embedded in `html`, trying `browseId` before `channelId`.
pub fn extract_browse_id(html: &str) -> Option<String> {
    BROWSE_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(html))
        .map(|caps| caps[1].to_string())
}

/// Parses the `ytInitialData` object assigned in one of the page's inline scripts.
pub fn extract_initial_data(html: &str) -> Option<Value> {
    INITIAL_DATA_MARKERS.iter().find_map(|marker| {
        let start = html.find(marker)? + marker.len();
        // the object is followed by `;</script>`; read exactly one JSON value and stop there
        let mut values = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
        match values.next()? {
            Ok(value @ Value::Object(_)) => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "malformed ytInitialData");
                None
            }
        }
    })
}

/// Adds every id matched by the permissive short-id patterns to `refs`.
pub fn scan_short_ids(html: &str, refs: &mut IndexSet<VideoRef>) {
    for re in SHORT_ID_PATTERNS.iter() {
        refs.extend(
            re.captures_iter(html)
                .filter_map(|caps| VideoRef::parse(&caps[1])),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, channel_html};
    use pretty_assertions::assert_eq;

    fn ids(refs: &IndexSet<VideoRef>) -> Vec<&str> {
        refs.iter().map(VideoRef::as_str).collect()
    }

    #[test]
    fn browse_id_prefers_browse_id_key() {
        let html = r#"{"channelId":"UCsecond"} {"browseId":"UCfirst"}"#;
        assert_eq!(extract_browse_id(html).as_deref(), Some("UCfirst"));
    }

    #[test]
    fn browse_id_falls_back_to_channel_id() {
        let html = r#"{"browseId":"FEwhat_to_watch","channelId":"UC_x5XG1OV2P6uZZ5FSM9Ttw"}"#;
        assert_eq!(
            extract_browse_id(html).as_deref(),
            Some("UC_x5XG1OV2P6uZZ5FSM9Ttw")
        );
        assert_eq!(extract_browse_id("<html></html>"), None);
    }

    #[test]
    fn initial_data_is_read_from_inline_script() {
        let html = channel_html("UCxxxx", &["aaaaaaaaaaa", "bbbbbbbbbbb"]);
        let discovery = parse_channel_page(&html, ContentKind::LongForm).unwrap();
        assert_eq!(discovery.browse_id, "UCxxxx");
        assert_eq!(ids(&discovery.refs), ["aaaaaaaaaaa", "bbbbbbbbbbb"]);
    }

    #[test]
    fn window_assignment_is_also_recognized() {
        let html = r#"<script>window["ytInitialData"] = {"videoRenderer":{"videoId":"ccccccccccc"}};</script>"browseId":"UCabc""#;
        let discovery = parse_channel_page(html, ContentKind::LongForm).unwrap();
        assert_eq!(ids(&discovery.refs), ["ccccccccccc"]);
    }

    #[test]
    fn malformed_embed_yields_empty_refs_not_failure() {
        let html = r#"<script>var ytInitialData = {"broken": ;</script>"browseId":"UCabc""#;
        let discovery = parse_channel_page(html, ContentKind::LongForm).unwrap();
        assert_eq!(discovery.browse_id, "UCabc");
        assert!(discovery.refs.is_empty());
    }

    #[test]
    fn shorts_fall_back_to_raw_text() {
        let html = concat!(
            r#""browseId":"UCshorts" "#,
            r#"<a href="/shorts/short000001">"#,
            r#"{"videoId":"short000002"} {"contentId":"short000003"} "#,
            r#"<a href="/shorts/short000001">"#
        );
        let discovery = parse_channel_page(html, ContentKind::ShortForm).unwrap();
        let mut found = ids(&discovery.refs);
        found.sort_unstable();
        assert_eq!(found, ["short000001", "short000002", "short000003"]);

        // long-form tabs never use the permissive scan
        let discovery = parse_channel_page(html, ContentKind::LongForm).unwrap();
        assert!(discovery.refs.is_empty());
    }

    #[test]
    fn missing_browse_id_is_a_discovery_failure() {
        assert_eq!(parse_channel_page("<html>nothing</html>", ContentKind::LongForm), None);
    }

    #[tokio::test]
    async fn unreachable_page_is_a_discovery_failure() {
        let api = MockApi::new();
        let target = ChannelTarget::from_url("https://www.youtube.com/@gone/videos");
        let err = discover(&api, &target).await.unwrap_err();
        assert!(matches!(err, HarvestError::DiscoveryFailed { .. }), "{err}");
    }

    #[tokio::test]
    async fn discover_reads_fetched_page() {
        let url = "https://www.youtube.com/@someone/videos";
        let api = MockApi::new().with_channel_page(url, channel_html("UCxxxx", &["aaaaaaaaaaa"]));
        let discovery = discover(&api, &ChannelTarget::from_url(url)).await.unwrap();
        assert_eq!(discovery.browse_id, "UCxxxx");
        assert_eq!(ids(&discovery.refs), ["aaaaaaaaaaa"]);
    }
}
