//! HTTP client for the gateway's admin endpoints

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use litelog_core::error::{LitelogError, Result};
use litelog_core::source::LogSource;
use litelog_core::types::{KeyToken, LogEntry, TimeWindow, VirtualKey};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of keys requested from `/key/list`
const KEY_LIST_SIZE: &str = "100";

/// Date format the spend-logs endpoint expects
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const KEY_LIST_PATH: &str = "/key/list";
const SPEND_LOGS_PATH: &str = "/spend/logs/ui";

#[derive(Deserialize)]
struct KeyListResponse {
    #[serde(default)]
    keys: Vec<VirtualKey>,
}

#[derive(Deserialize)]
struct LogPageResponse {
    #[serde(default)]
    data: Vec<LogEntry>,
}

/// Admin API client authenticated with the gateway's master key
#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    admin_api_key: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for `base_url` using `admin_api_key` as bearer token
    pub fn new(base_url: &str, admin_api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("litelog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_http_client(base_url, admin_api_key, client)
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_http_client(
        base_url: &str,
        admin_api_key: &str,
        client: reqwest::Client,
    ) -> Result<Self> {
        let base_url = base_url.trim();
        let admin_api_key = admin_api_key.trim();
        if base_url.is_empty() || admin_api_key.is_empty() {
            return Err(LitelogError::not_configured());
        }
        let base_url =
            Url::parse(base_url).map_err(|e| LitelogError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LitelogError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            base_url,
            admin_api_key: admin_api_key.to_string(),
            client,
        })
    }

    /// Build `{base}{path}?{query}`; the base URL's own path and query are replaced
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url.set_query(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// GET `url` and decode the JSON body; an empty body yields `None`
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!("GET {}", url.path());
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.admin_api_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LitelogError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(
            "Response for {}: {}",
            url.path(),
            String::from_utf8_lossy(&body)
        );
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

fn format_query_date(dt: &DateTime<Utc>) -> String {
    dt.format(QUERY_DATE_FORMAT).to_string()
}

#[async_trait]
impl LogSource for GatewayClient {
    async fn fetch_keys(&self) -> Result<Vec<VirtualKey>> {
        let url = self.endpoint(
            KEY_LIST_PATH,
            &[
                ("return_full_object", "true"),
                ("sort_order", "desc"),
                ("size", KEY_LIST_SIZE),
            ],
        );
        let response: Option<KeyListResponse> = self.get_json(url).await?;
        Ok(response.map(|r| r.keys).unwrap_or_default())
    }

    async fn fetch_logs(
        &self,
        token: &KeyToken,
        window: &TimeWindow,
        page_size: u32,
    ) -> Result<Vec<LogEntry>> {
        let start = format_query_date(&window.start);
        let end = format_query_date(&window.end);
        let page_size = page_size.to_string();
        let url = self.endpoint(
            SPEND_LOGS_PATH,
            &[
                ("api_key", token.as_str()),
                ("start_date", start.as_str()),
                ("end_date", end.as_str()),
                ("page_size", page_size.as_str()),
            ],
        );
        let response: Option<LogPageResponse> = self.get_json(url).await?;
        Ok(response.map(|r| r.data).unwrap_or_default())
    }
}
