//! Run configuration.
//!
//! A [`HarvestConfig`] is built once, before the pipeline starts, and is never mutated after
//! that. The client identity, the limits and the API key all live here.

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_CLIENT_VERSION: &str = "2.20251125.06.00";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_CONCURRENCY_PER_CHANNEL: usize = 20;
pub const DEFAULT_MAX_VIDEOS_PER_CHANNEL: usize = 100;

const ENV_PREFIX: &str = "YT_HARVEST_";

/// How we identify ourselves to the API.
///
/// The same value feeds both the JSON `context.client` block and the `x-youtube-client-*`
/// headers, so the two can't drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// `clientName` in payloads, e.g. `WEB`.
    pub name: String,
    /// Numeric form of the client name, sent as `x-youtube-client-name`.
    pub id: String,
    pub version: String,
    /// `hl`
    pub locale: String,
    /// `gl`
    pub region: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: "WEB".to_string(),
            id: "1".to_string(),
            version: DEFAULT_CLIENT_VERSION.to_string(),
            locale: "en".to_string(),
            region: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub client: ClientIdentity,
    pub user_agent: String,
    /// Detail fetches allowed in flight at once, per channel.
    pub concurrency_per_channel: usize,
    /// Upper bound on the number of videos collected for one channel.
    pub max_videos_per_channel: usize,
    /// Pause between continuation requests while paging a listing.
    pub page_delay: Duration,
    pub connect_timeout: Duration,
    /// Ceiling on the whole request, connect included.
    pub request_timeout: Duration,
    /// Outbound requests allowed in flight at once, across all hosts.
    pub max_connections: usize,
    /// Outbound requests allowed in flight at once to a single host.
    pub max_connections_per_host: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            client: ClientIdentity::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency_per_channel: DEFAULT_CONCURRENCY_PER_CHANNEL,
            max_videos_per_channel: DEFAULT_MAX_VIDEOS_PER_CHANNEL,
            page_delay: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            max_connections: 100,
            max_connections_per_host: 30,
        }
    }
}

impl HarvestConfig {
    /// Defaults overlaid with any `YT_HARVEST_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_var_string)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        if let Some(base_url) = get("BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(api_key) = get("API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Some(version) = get("CLIENT_VERSION") {
            config.client.version = version;
        }
        if let Some(n) = parsed(&get, "CONCURRENCY") {
            config.concurrency_per_channel = n;
        }
        if let Some(n) = parsed(&get, "MAX_VIDEOS") {
            config.max_videos_per_channel = n;
        }
        if let Some(ms) = parsed(&get, "PAGE_DELAY_MS") {
            config.page_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parsed(&get, "CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed(&get, "REQUEST_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parsed(&get, "MAX_CONNECTIONS") {
            config.max_connections = n;
        }
        if let Some(n) = parsed(&get, "MAX_CONNECTIONS_PER_HOST") {
            config.max_connections_per_host = n;
        }
        config.normalized()
    }

    /// Clamps limits that would otherwise deadlock the pipeline.
    pub fn normalized(mut self) -> Self {
        self.concurrency_per_channel = self.concurrency_per_channel.max(1);
        self.max_connections = self.max_connections.max(1);
        self.max_connections_per_host = self.max_connections_per_host.max(1);
        self
    }

    pub fn browse_url(&self) -> String {
        self.endpoint("browse")
    }

    pub fn next_url(&self) -> String {
        self.endpoint("next")
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/youtubei/v1/{name}", self.base_url)
    }
}

fn parsed<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                key = %format!("{ENV_PREFIX}{key}"),
                value = %raw,
                "ignoring unparseable setting"
            );
            None
        }
    }
}

fn env_var_string(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
