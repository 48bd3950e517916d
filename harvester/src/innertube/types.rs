//! Request bodies for the internal browse and next endpoints.

use crate::config::ClientIdentity;
use crate::types::{ContentKind, VideoRef};
use serde::Serialize;

/// One page request against the browse endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseQuery<'a> {
    /// The first listing page of a channel tab.
    Seed {
        browse_id: &'a str,
        kind: ContentKind,
    },
    /// Any later page, addressed only by the cursor the previous page handed out.
    Continuation { token: &'a str },
}

/// The `context.client` block every request carries.
#[derive(Debug, Serialize)]
pub struct ClientContext<'a> {
    pub client: ClientInfo<'a>,
}

#[derive(Debug, Serialize)]
pub struct ClientInfo<'a> {
    #[serde(rename = "clientName")]
    pub name: &'a str,
    #[serde(rename = "clientVersion")]
    pub version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gl: Option<&'a str>,
}

impl<'a> ClientContext<'a> {
    /// Name and version only.
    pub fn bare(identity: &'a ClientIdentity) -> Self {
        Self {
            client: ClientInfo {
                name: &identity.name,
                version: &identity.version,
                hl: None,
                gl: None,
            },
        }
    }

    /// Name and version plus locale and region.
    pub fn localized(identity: &'a ClientIdentity) -> Self {
        Self {
            client: ClientInfo {
                hl: Some(&identity.locale),
                gl: Some(&identity.region),
                ..Self::bare(identity).client
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowseBody<'a> {
    Seed {
        context: ClientContext<'a>,
        #[serde(rename = "browseId")]
        browse_id: &'a str,
        params: &'a str,
    },
    Continuation {
        context: ClientContext<'a>,
        continuation: &'a str,
    },
}

impl<'a> BrowseBody<'a> {
    pub fn new(identity: &'a ClientIdentity, query: BrowseQuery<'a>) -> Self {
        match query {
            BrowseQuery::Seed { browse_id, kind } => Self::Seed {
                context: ClientContext::localized(identity),
                browse_id,
                params: kind.listing_params(),
            },
            BrowseQuery::Continuation { token } => Self::Continuation {
                context: ClientContext::bare(identity),
                continuation: token,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NextBody<'a> {
    pub context: ClientContext<'a>,
    #[serde(rename = "videoId")]
    pub video_id: &'a str,
}

impl<'a> NextBody<'a> {
    pub fn new(identity: &'a ClientIdentity, video: &'a VideoRef) -> Self {
        Self {
            context: ClientContext::bare(identity),
            video_id: video.as_str(),
        }
    }
}
