//! HTTP plumbing for the MediaWiki API
//!
//! This module handles:
//! - Building the HTTP client with the bot's user agent
//! - Per-site sessions resolving the endpoint template
//! - Status checking and JSON decoding of replies
//! - The continuation loop shared by every multi-page query
//! - Raw asset downloads

use crate::api::types::ApiReply;
use crate::config::{ApiConfig, UserAgentConfig};
use crate::{MirrorError, Result};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use url::Url;

/// Shared HTTP client for all wiki API traffic
///
/// Holds no per-site state; call [`ApiClient::session`] to talk to one wiki.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    endpoint: String,
    page_limit: u32,
}

impl ApiClient {
    /// Builds a client from the API and user agent configuration
    pub fn new(api: &ApiConfig, user_agent: &UserAgentConfig) -> Result<Self> {
        let http = build_http_client(api, user_agent)?;
        Ok(Self {
            http,
            endpoint: api.endpoint.clone(),
            page_limit: api.page_limit,
        })
    }

    /// Opens a session scoped to one wiki host
    pub fn session(&self, site: &str) -> Result<SiteSession<'_>> {
        let endpoint = Url::parse(&self.endpoint.replace("{site}", site))?;
        Ok(SiteSession {
            client: self,
            site: site.to_string(),
            endpoint,
        })
    }

    /// Downloads a raw asset
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Remote {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub(crate) fn page_limit(&self) -> u32 {
        self.page_limit
    }
}

/// Formats the user agent string: `Name/Version (+contact)`
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    format!(
        "{}/{} (+{})",
        config.bot_name, config.bot_version, config.contact
    )
}

/// Builds an HTTP client with proper configuration
fn build_http_client(api: &ApiConfig, user_agent: &UserAgentConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent_string(user_agent))
        .timeout(Duration::from_secs(api.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .https_only(api.endpoint.starts_with("https://"))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// A handle for one wiki's API endpoint
///
/// Lives only as long as the fetch that opened it.
#[derive(Debug)]
pub struct SiteSession<'a> {
    pub(crate) client: &'a ApiClient,
    site: String,
    endpoint: Url,
}

impl<'a> SiteSession<'a> {
    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issues one GET against the endpoint and decodes the reply
    ///
    /// Fails with `Remote` on a non-success status and with `Protocol` if the
    /// API answers with an `error` object.
    pub async fn get(&self, params: &[(String, String)]) -> Result<ApiReply> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(params);

        tracing::debug!("GET {}", url);
        let response = self.client.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Remote {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let reply: ApiReply = response.json().await?;
        if let Some(error) = &reply.error {
            return Err(MirrorError::Protocol(format!(
                "API error '{}' from {}: {}",
                error.code, self.site, error.info
            )));
        }
        Ok(reply)
    }

    /// Runs a query to exhaustion, following continuation markers
    ///
    /// Every reply is handed to `on_page`. When a reply carries a `continue`
    /// object its members are sent back with the next request (replacing base
    /// parameters of the same name); the loop ends at the first reply without
    /// one. `pause` is slept between consecutive requests.
    pub async fn paginate<F>(
        &self,
        base: &[(String, String)],
        pause: Duration,
        mut on_page: F,
    ) -> Result<()>
    where
        F: FnMut(ApiReply) -> Result<()>,
    {
        let mut continuation: Option<Map<String, Value>> = None;

        loop {
            let params = merge_continuation(base, continuation.as_ref());
            let reply = self.get(&params).await?;
            let next = reply.continuation.clone();
            on_page(reply)?;

            match next {
                Some(next) if !next.is_empty() => {
                    if continuation.as_ref() == Some(&next) {
                        return Err(MirrorError::Protocol(format!(
                            "Continuation did not advance on {}",
                            self.site
                        )));
                    }
                    continuation = Some(next);
                }
                _ => break,
            }

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        Ok(())
    }
}

/// Overlays continuation members onto the base parameters
fn merge_continuation(
    base: &[(String, String)],
    continuation: Option<&Map<String, Value>>,
) -> Vec<(String, String)> {
    let Some(continuation) = continuation else {
        return base.to_vec();
    };

    let mut params: Vec<(String, String)> = base
        .iter()
        .filter(|(key, _)| !continuation.contains_key(key))
        .cloned()
        .collect();
    for (key, value) in continuation {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        params.push((key.clone(), value));
    }
    params
}
