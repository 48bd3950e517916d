//! Value types shared by the discovery, pagination and detail stages.

use std::fmt;

/// Which listing of a channel we are harvesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// Regular uploads, listed under the channel's "Videos" tab.
    LongForm,
    /// Vertical reels, listed under the channel's "Shorts" tab.
    ShortForm,
}

impl ContentKind {
    /// Infers the kind from a channel tab URL; anything that is not a `/shorts` tab is long-form.
    pub fn from_url(url: &str) -> Self {
        if url.contains("/shorts") {
            Self::ShortForm
        } else {
            Self::LongForm
        }
    }

    /// The opaque browse `params` blob that selects this listing tab.
    pub fn listing_params(self) -> &'static str {
        match self {
            Self::LongForm => "EgZ2aWRlb3PyBgQKAjoA",
            Self::ShortForm => "EgZzaG9ydHPyBgUKA5oBAA%3D%3D",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LongForm => f.write_str("videos"),
            Self::ShortForm => f.write_str("shorts"),
        }
    }
}

/// One channel tab to harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub url: String,
    pub content_kind: ContentKind,
}

impl ChannelTarget {
    /// Builds a target whose content kind is inferred from the URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let content_kind = ContentKind::from_url(&url);
        Self { url, content_kind }
    }
}

/// An 11-character platform video identifier.
///
/// Construction goes through [`VideoRef::parse`], so a `VideoRef` is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoRef(String);

impl VideoRef {
    pub const LEN: usize = 11;

    pub fn parse(id: &str) -> Option<Self> {
        let valid = id.len() == Self::LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(id.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
