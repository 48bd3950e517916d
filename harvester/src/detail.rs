//! Turning a watch-page (`next`) payload into a [`VideoRecord`].
//!
//! Every field is read through a short chain of locators, tried in order until one produces a
//! value. The watch page is redesigned often enough that most fields have moved at least once,
//! and the older locations tend to linger for a while on some videos. A field none of its
//! locators can find gets its default (0 or [`UNKNOWN`]); only a payload without the primary and
//! secondary info sections is rejected outright.

use crate::dataset::{UNKNOWN, VideoRecord};
use crate::error::{HarvestError, chain};
use crate::innertube::InnertubeApi;
use crate::number::parse_count;
use crate::text::{collect_text, non_empty_text};
use crate::types::VideoRef;
use crate::walker::{self, Visit};
use serde_json::Value;

const RESULTS_POINTER: &str = "/contents/twoColumnWatchNextResults/results/results/contents";

/// Fetches the watch payload for `video` and extracts its record.
pub async fn fetch_video_record<A: InnertubeApi>(
    api: &A,
    video: &VideoRef,
) -> Result<VideoRecord, HarvestError> {
    let payload = api
        .next(video)
        .await
        .map_err(|e| HarvestError::DetailFetchFailed {
            video: video.clone(),
            reason: chain(&e),
        })?;
    extract_video_record(video, &payload).ok_or_else(|| HarvestError::DetailParseFailed {
        video: video.clone(),
    })
}

/// Extracts a record from a `next` payload.
///
/// Returns `None` when the payload has fewer than two result sections or has neither the
/// primary nor the secondary info renderer.
pub fn extract_video_record(video: &VideoRef, payload: &Value) -> Option<VideoRecord> {
    let page = WatchPage::new(payload)?;

    let channel_id = first_of(&page, CHANNEL_ID);
    let channel_url = match &channel_id {
        Some(id) => format!("https://www.youtube.com/channel/{id}"),
        None => UNKNOWN.to_string(),
    };
    let id = video.as_str();

    Some(VideoRecord {
        video_id: id.to_string(),
        title: first_of(&page, TITLE).unwrap_or_else(unknown),
        views: first_of(&page, VIEWS).unwrap_or(0),
        likes: first_of(&page, LIKES).unwrap_or(0),
        comments: first_of(&page, COMMENTS).unwrap_or(0),
        duration: page
            .length_seconds()
            .map(format_duration)
            .unwrap_or_else(unknown),
        date_posted: first_of(&page, DATE_POSTED).unwrap_or_else(unknown),
        subscribers: first_of(&page, SUBSCRIBERS).unwrap_or(0),
        channel_name: first_of(&page, CHANNEL_NAME).unwrap_or_else(unknown),
        channel_id: channel_id.unwrap_or_else(unknown),
        channel_url,
        video_url: format!("https://www.youtube.com/watch?v={id}"),
        thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
    })
}

/// `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = total_seconds % 3600 / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// The sections of a watch payload the locators read from.
struct WatchPage<'a> {
    payload: &'a Value,
    primary: Option<&'a Value>,
    secondary: Option<&'a Value>,
    panels: &'a [Value],
}

impl<'a> WatchPage<'a> {
    fn new(payload: &'a Value) -> Option<Self> {
        let results = payload.pointer(RESULTS_POINTER)?.as_array()?;
        if results.len() < 2 {
            return None;
        }
        let section = |key: &str| results.iter().find_map(|entry| entry.get(key));
        let primary = section("videoPrimaryInfoRenderer");
        let secondary = section("videoSecondaryInfoRenderer");
        if primary.is_none() && secondary.is_none() {
            return None;
        }
        let panels = payload
            .get("engagementPanels")
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice);
        Some(Self {
            payload,
            primary,
            secondary,
            panels,
        })
    }

    fn primary(&self, pointer: &str) -> Option<&'a Value> {
        self.primary?.pointer(pointer)
    }

    fn owner(&self, pointer: &str) -> Option<&'a Value> {
        self.secondary?
            .pointer("/owner/videoOwnerRenderer")?
            .pointer(pointer)
    }

    fn details(&self, key: &str) -> Option<&'a Value> {
        self.payload.get("videoDetails")?.get(key)
    }

    fn panel_renderers(&self) -> impl Iterator<Item = &'a Value> {
        self.panels
            .iter()
            .filter_map(|panel| panel.get("engagementPanelSectionListRenderer"))
    }

    /// `lengthSeconds` shows up both as a string and as a number.
    fn length_seconds(&self) -> Option<u64> {
        match self.details("lengthSeconds")? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

type Locator<T> = fn(&WatchPage<'_>) -> Option<T>;

fn first_of<T>(page: &WatchPage<'_>, locators: &[Locator<T>]) -> Option<T> {
    locators.iter().find_map(|locate| locate(page))
}

const TITLE: &[Locator<String>] = &[
    |page: &WatchPage<'_>| non_empty_text(page.primary("/title")),
    |page: &WatchPage<'_>| non_empty_text(page.details("title")),
];

const VIEWS: &[Locator<u64>] = &[
    |page: &WatchPage<'_>| count(page.primary("/viewCount/videoViewCountRenderer/viewCount")),
    |page: &WatchPage<'_>| count(page.details("viewCount")),
];

// each of these treats 0 as not found
const LIKES: &[Locator<u64>] = &[
    likes_from_factoids,
    likes_from_toggle_button,
    likes_from_view_model,
];

const COMMENTS: &[Locator<u64>] = &[comments_from_panel];

const CHANNEL_NAME: &[Locator<String>] = &[
    |page: &WatchPage<'_>| non_empty_text(page.owner("/title")),
    |page: &WatchPage<'_>| non_empty_text(page.details("author")),
];

const CHANNEL_ID: &[Locator<String>] = &[
    |page: &WatchPage<'_>| browse_id(page.owner("/navigationEndpoint/browseEndpoint/browseId")),
    |page: &WatchPage<'_>| {
        browse_id(page.owner("/title/runs/0/navigationEndpoint/browseEndpoint/browseId"))
    },
    |page: &WatchPage<'_>| browse_id(page.details("channelId")),
];

const SUBSCRIBERS: &[Locator<u64>] =
    &[|page: &WatchPage<'_>| count(page.owner("/subscriberCountText"))];

const DATE_POSTED: &[Locator<String>] =
    &[|page: &WatchPage<'_>| non_empty_text(page.primary("/dateText"))];

fn count(node: Option<&Value>) -> Option<u64> {
    parse_count(&collect_text(node))
}

fn browse_id(node: Option<&Value>) -> Option<String> {
    node?
        .as_str()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn mentions_likes(label: &str) -> bool {
    let label = label.to_lowercase();
    label.contains("like") && !label.contains("dislike")
}

fn positive(count: Option<u64>) -> Option<u64> {
    count.filter(|&n| n > 0)
}

/// The "Likes" factoid in the structured description header.
fn likes_from_factoids(page: &WatchPage<'_>) -> Option<u64> {
    page.panel_renderers()
        .filter_map(|panel| panel.pointer("/content/structuredDescriptionContentRenderer/items"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|item| item.pointer("/videoDescriptionHeaderRenderer/factoid"))
        .filter_map(Value::as_array)
        .flatten()
        .filter_map(|factoid| factoid.get("factoidRenderer"))
        .filter(|factoid| mentions_likes(&collect_text(factoid.get("label"))))
        .find_map(|factoid| positive(count(factoid.get("value"))))
}

/// The accessibility label of the legacy like toggle button.
fn likes_from_toggle_button(page: &WatchPage<'_>) -> Option<u64> {
    page.primary("/videoActions/menuRenderer/topLevelButtons")?
        .as_array()?
        .iter()
        .filter_map(|button| {
            button
                .pointer("/toggleButtonRenderer/defaultText/accessibility/accessibilityData/label")?
                .as_str()
        })
        .filter(|label| mentions_likes(label))
        .find_map(|label| positive(parse_count(label)))
}

/// The accessibility text of the segmented like button view model, wherever it is nested.
fn likes_from_view_model(page: &WatchPage<'_>) -> Option<u64> {
    let actions = page.primary("/videoActions/menuRenderer/topLevelButtons")?;
    let mut likes = None;
    walker::walk(actions, |node| {
        let Some(text) = node
            .get("buttonViewModel")
            .and_then(|button| button.get("accessibilityText"))
            .and_then(Value::as_str)
        else {
            return Visit::Descend;
        };
        if mentions_likes(text) {
            likes = positive(parse_count(text));
        }
        if likes.is_some() {
            Visit::Stop
        } else {
            Visit::Prune
        }
    });
    likes
}

/// The count shown next to the title of the comments engagement panel.
///
/// If several panels qualify, the last one in the payload wins.
fn comments_from_panel(page: &WatchPage<'_>) -> Option<u64> {
    page.panel_renderers()
        .filter(|panel| {
            panel
                .get("panelIdentifier")
                .and_then(Value::as_str)
                .is_some_and(|id| id.to_lowercase().contains("comments"))
        })
        .filter_map(|panel| {
            count(panel.pointer("/header/engagementPanelTitleHeaderRenderer/contextualInfo"))
        })
        .last()
}
