//! HTTP client for the channel pages and the internal browse/next endpoints.

use crate::config::{ClientIdentity, HarvestConfig};
use crate::innertube::InnertubeApi;
use crate::innertube::types::{BrowseBody, BrowseQuery, NextBody};
use crate::types::VideoRef;
use eyre::Context;
use http::Method;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::instrument;

/// How much of an error response body to keep in the error message.
const ERROR_BODY_EXCERPT: usize = 200;

/// Admission control for outbound requests.
///
/// reqwest pools connections but does not cap how many are open at once, so requests take a
/// permit from a global gate and from their host's gate for as long as they are in flight.
#[derive(Debug, Clone)]
struct ConnectionGate {
    total: Arc<Semaphore>,
    per_host_limit: usize,
    per_host: Arc<Mutex<HashMap<String, Arc<Semaphore>>>>,
}

impl ConnectionGate {
    fn new(total: usize, per_host: usize) -> Self {
        Self {
            total: Arc::new(Semaphore::new(total)),
            per_host_limit: per_host,
            per_host: Default::default(),
        }
    }

    fn host_gate(&self, host: &str) -> Arc<Semaphore> {
        let mut gates = self
            .per_host
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        gates
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }

    /// Waits until a request to `url` may proceed. Dropping the returned permits releases it.
    async fn admit(&self, url: &str) -> eyre::Result<[OwnedSemaphorePermit; 2]> {
        let parsed = reqwest::Url::parse(url).with_context(|| format!("parse URL {url}"))?;
        let host = parsed.host_str().unwrap_or_default();
        // always host first, then global, so two requests can never wait on each other
        let host_permit = self
            .host_gate(host)
            .acquire_owned()
            .await
            .context("per-host connection gate closed")?;
        let total_permit = self
            .total
            .clone()
            .acquire_owned()
            .await
            .context("connection gate closed")?;
        Ok([host_permit, total_permit])
    }
}

/// Production [`InnertubeApi`] implementation.
///
/// Cheap to clone; clones share the connection pool and the admission gates.
#[derive(Debug, Clone)]
pub struct InnertubeClient {
    client: reqwest::Client,
    identity: Arc<ClientIdentity>,
    api_key: Option<String>,
    browse_url: String,
    next_url: String,
    gate: ConnectionGate,
}

impl InnertubeClient {
    /// Builds a client whose every request identifies itself consistently with `config.client`.
    pub fn new(config: &HarvestConfig) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .default_headers(default_headers(config)?)
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            client,
            identity: Arc::new(config.client.clone()),
            api_key: config.api_key.clone(),
            browse_url: config.browse_url(),
            next_url: config.next_url(),
            gate: ConnectionGate::new(config.max_connections, config.max_connections_per_host),
        })
    }

    /// Sends one request and checks its status.
    ///
    /// The API key (if any) is attached as the `key` query parameter to every POST, and POSTs
    /// get a JSON body and content type.
    #[instrument(skip(self, json_body), level = tracing::Level::TRACE)]
    async fn send(
        &self,
        method: Method,
        url: &str,
        json_body: Option<&impl Serialize>,
    ) -> eyre::Result<reqwest::Response> {
        let _permits = self.gate.admit(url).await?;

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = json_body {
            if let Some(key) = &self.api_key {
                request = request.query(&[("key", key.as_str())]);
            }
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .json(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("send {method} request to {url}"))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let excerpt: String = error_text.chars().take(ERROR_BODY_EXCERPT).collect();
            return Err(eyre::eyre!(
                "{method} {url} failed with status {status_code}: {excerpt}"
            ));
        }

        Ok(response)
    }

    async fn post_json(&self, url: &str, body: &impl Serialize) -> eyre::Result<Value> {
        self.send(Method::POST, url, Some(body))
            .await?
            .json()
            .await
            .with_context(|| format!("parse response from {url} as JSON"))
    }
}

impl InnertubeApi for InnertubeClient {
    #[instrument(skip(self))]
    async fn channel_page(&self, url: &str) -> eyre::Result<String> {
        self.send(Method::GET, url, None::<&()>)
            .await?
            .text()
            .await
            .context("read channel page body")
    }

    #[instrument(skip(self))]
    async fn browse(&self, query: BrowseQuery<'_>) -> eyre::Result<Value> {
        let body = BrowseBody::new(&self.identity, query);
        self.post_json(&self.browse_url, &body)
            .await
            .context("browse request")
    }

    #[instrument(skip_all, fields(video = %video))]
    async fn next(&self, video: &VideoRef) -> eyre::Result<Value> {
        let body = NextBody::new(&self.identity, video);
        self.post_json(&self.next_url, &body)
            .await
            .context("next request")
    }
}

fn default_headers(config: &HarvestConfig) -> eyre::Result<HeaderMap> {
    let origin = config.base_url.trim_end_matches('/');
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_str(origin).context("origin header")?,
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(&format!("{origin}/")).context("referer header")?,
    );
    headers.insert(
        "x-youtube-client-name",
        HeaderValue::from_str(&config.client.id).context("client name header")?,
    );
    headers.insert(
        "x-youtube-client-version",
        HeaderValue::from_str(&config.client.version).context("client version header")?,
    );
    Ok(headers)
}
