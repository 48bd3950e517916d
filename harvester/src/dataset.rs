//! The harvested records and the dataset they are aggregated into.

use indexmap::IndexMap;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Placeholder for string fields that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Everything we know about one video.
///
/// Numeric fields are 0 and string fields are [`UNKNOWN`] when the payload didn't have them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// `MM:SS`, or `HH:MM:SS` for an hour or more.
    pub duration: String,
    /// As displayed, e.g. "Mar 3, 2025" or "Premiered 2 days ago".
    pub date_posted: String,
    pub subscribers: u64,
    pub channel_name: String,
    pub channel_id: String,
    pub channel_url: String,
    pub video_url: String,
    pub thumbnail_url: String,
}

/// The output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub generated_at: Timestamp,
    pub total_videos: usize,
    pub total_channels: usize,
    pub videos: Vec<VideoRecord>,
}

impl Dataset {
    /// Concatenates per-channel results, in channel order.
    ///
    /// Records are not deduplicated across channels: a video that two targets both list
    /// appears twice, once under each.
    pub fn aggregate(generated_at: Timestamp, per_channel: Vec<Vec<VideoRecord>>) -> Self {
        let total_channels = per_channel.len();
        let videos: Vec<VideoRecord> = per_channel.into_iter().flatten().collect();
        Self {
            generated_at,
            total_videos: videos.len(),
            total_channels,
            videos,
        }
    }

    /// Per-channel totals, grouped by channel name in order of first appearance.
    pub fn channel_summaries(&self) -> Vec<ChannelSummary> {
        let mut by_channel: IndexMap<&str, ChannelSummary> = IndexMap::new();
        for video in &self.videos {
            let summary = by_channel
                .entry(video.channel_name.as_str())
                .or_insert_with(|| ChannelSummary {
                    channel_name: video.channel_name.clone(),
                    subscribers: video.subscribers,
                    ..ChannelSummary::default()
                });
            // upstream counts are untrusted and may be near u64::MAX
            summary.videos += 1;
            summary.views = summary.views.saturating_add(video.views);
            summary.likes = summary.likes.saturating_add(video.likes);
            summary.comments = summary.comments.saturating_add(video.comments);
        }
        by_channel
            .into_values()
            .map(|mut summary| {
                summary.average_views = rounded_average(summary.views, summary.videos as u64);
                summary
            })
            .collect()
    }

    /// Likes plus comments, as a percentage of views.
    pub fn engagement_rate(&self) -> f64 {
        let views = self.videos.iter().map(|v| v.views).fold(0, u64::saturating_add);
        if views == 0 {
            return 0.0;
        }
        let engaged = self
            .videos
            .iter()
            .map(|v| v.likes.saturating_add(v.comments))
            .fold(0, u64::saturating_add);
        engaged as f64 / views as f64 * 100.0
    }
}

/// `total / count`, rounded half up.
fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let (quotient, remainder) = (total / count, total % count);
    // remainder * 2 >= count, without overflowing
    if remainder >= count - remainder {
        quotient + 1
    } else {
        quotient
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSummary {
    pub channel_name: String,
    pub videos: usize,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub average_views: u64,
    /// Taken from the channel's first record.
    pub subscribers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, channel: &str, views: u64, likes: u64) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            title: format!("title {id}"),
            views,
            likes,
            comments: 1,
            duration: "01:00".to_string(),
            date_posted: UNKNOWN.to_string(),
            subscribers: 1_000,
            channel_name: channel.to_string(),
            channel_id: format!("UC{channel}"),
            channel_url: format!("https://www.youtube.com/channel/UC{channel}"),
            video_url: format!("https://www.youtube.com/watch?v={id}"),
            thumbnail_url: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
        }
    }

    fn one_record(views: u64, likes: u64) -> Dataset {
        Dataset::aggregate(
            Timestamp::UNIX_EPOCH,
            vec![vec![record("aaaaaaaaaaa", "one", views, likes)]],
        )
    }

    #[test]
    fn aggregation_keeps_channel_order_and_cross_channel_duplicates() {
        let first = vec![record("aaaaaaaaaaa", "one", 10, 1), record("bbbbbbbbbbb", "one", 20, 2)];
        let second = vec![record("aaaaaaaaaaa", "two", 10, 1)];
        let empty = Vec::new();
        let dataset = Dataset::aggregate(Timestamp::UNIX_EPOCH, vec![first, empty, second]);

        assert_eq!(dataset.total_channels, 3);
        assert_eq!(dataset.total_videos, 3);
        let ids: Vec<_> = dataset.videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, ["aaaaaaaaaaa", "bbbbbbbbbbb", "aaaaaaaaaaa"]);
    }

    #[test]
    fn serializes_with_rfc3339_timestamp() {
        let dataset = one_record(5, 0);
        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["generated_at"], "1970-01-01T00:00:00Z");
        assert_eq!(json["total_videos"], 1);
        assert_eq!(
            json["videos"][0]["thumbnail_url"],
            "https://i.ytimg.com/vi/aaaaaaaaaaa/hqdefault.jpg"
        );

        let back: Dataset = serde_json::from_value(json).unwrap();
        assert_eq!(back, dataset);
    }

    #[test]
    fn summaries_group_by_channel() {
        let dataset = Dataset::aggregate(
            Timestamp::UNIX_EPOCH,
            vec![
                vec![record("aaaaaaaaaaa", "one", 10, 1), record("bbbbbbbbbbb", "one", 21, 2)],
                vec![record("ccccccccccc", "two", 100, 10)],
            ],
        );
        let summaries = dataset.channel_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(
            summaries[0],
            ChannelSummary {
                channel_name: "one".to_string(),
                videos: 2,
                views: 31,
                likes: 3,
                comments: 2,
                average_views: 16,
                subscribers: 1_000,
            }
        );
        assert_eq!(summaries[1].views, 100);
    }

    #[test]
    fn averages_round_half_up() {
        assert_eq!(rounded_average(31, 2), 16);
        assert_eq!(rounded_average(30, 4), 8);
        assert_eq!(rounded_average(29, 4), 7);
        assert_eq!(rounded_average(u64::MAX, 1), u64::MAX);
        assert_eq!(rounded_average(u64::MAX, 2), u64::MAX / 2 + 1);
        assert_eq!(rounded_average(0, 0), 0);
    }

    #[test]
    fn huge_counts_saturate() {
        let views = crate::number::parse_count("18,446,744,073,709,551,615 views").unwrap();
        assert_eq!(views, u64::MAX);
        let dataset = Dataset::aggregate(
            Timestamp::UNIX_EPOCH,
            vec![vec![
                record("aaaaaaaaaaa", "one", views, u64::MAX),
                record("bbbbbbbbbbb", "one", views, 1),
            ]],
        );

        let summaries = dataset.channel_summaries();
        assert_eq!(summaries[0].views, u64::MAX);
        assert_eq!(summaries[0].likes, u64::MAX);
        assert_eq!(summaries[0].average_views, u64::MAX / 2 + 1);
        assert_eq!(dataset.engagement_rate(), 100.0);
    }

    #[test]
    fn engagement_rate_handles_zero_views() {
        let dataset = one_record(0, 0);
        assert_eq!(dataset.engagement_rate(), 0.0);

        let dataset = one_record(200, 9);
        // (9 likes + 1 comment) / 200 views
        assert_eq!(dataset.engagement_rate(), 5.0);
    }
}
