//! Core domain types for litelog
//!
//! This module contains the records returned by the gateway (`LogEntry`,
//! `VirtualKey`), the strongly-typed key token used to partition the cache,
//! and the time window and fetch parameters the pagination controller works
//! with.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Smallest accepted lookback span in hours
pub const MIN_LOOKBACK_HOURS: u32 = 1;
/// Largest accepted lookback span in hours (7 days)
pub const MAX_LOOKBACK_HOURS: u32 = 168;
/// Lookback used when nothing is configured
pub const DEFAULT_LOOKBACK_HOURS: u32 = 24;
/// Smallest accepted page size
pub const MIN_PAGE_SIZE: u32 = 10;
/// Largest accepted page size
pub const MAX_PAGE_SIZE: u32 = 500;
/// Page size used when nothing is configured
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Strongly-typed virtual key token
///
/// The token is the bearer credential of a virtual key and doubles as its
/// identifier and as the partition key of the window cache.
///
/// # Examples
/// ```
/// use litelog_core::types::KeyToken;
///
/// let token = KeyToken::new("sk-1234");
/// assert_eq!(token.as_str(), "sk-1234");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyToken(String);

impl KeyToken {
    /// Create a new KeyToken
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for KeyToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Opaque JSON payload attached to a log entry
///
/// The bytes are the compact JSON encoding of whatever the gateway returned.
/// Nothing in the core interprets them; the terminal crate pretty-prints them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(Vec<u8>);

impl Payload {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw bytes of the payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes held
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload holds no bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        serde_json::to_vec(&value)
            .map(Payload)
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match serde_json::from_slice::<serde_json::Value>(&self.0) {
            Ok(value) => value.serialize(serializer),
            Err(_) => serializer.serialize_str(&String::from_utf8_lossy(&self.0)),
        }
    }
}

/// One request log record from `/spend/logs/ui`
///
/// Timestamps are kept as the strings the gateway sent; malformed entries
/// are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub request_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub model: String,
    #[serde(rename = "startTime", default)]
    pub start_time: String,
    #[serde(rename = "endTime", default)]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spend: f64,
    #[serde(default)]
    pub total_tokens: Option<u64>,
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cache_hit: Option<String>,
    #[serde(default)]
    pub custom_llm_provider: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(rename = "proxy_server_request", default)]
    pub request_payload: Option<Payload>,
    #[serde(rename = "response", default)]
    pub response_payload: Option<Payload>,
}

impl LogEntry {
    /// Whether the gateway marked the request as successful
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Parsed start time, if it is valid RFC 3339
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    /// Parsed end time, if it is valid RFC 3339
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_time)
    }

    /// Request duration in seconds
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.started_at()?;
        let end = self.ended_at()?;
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }

    /// `scheme://host` of the upstream API base
    pub fn api_base_origin(&self) -> Option<String> {
        let url = reqwest::Url::parse(self.api_base.as_deref()?).ok()?;
        let host = url.host_str()?;
        Some(format!("{}://{}", url.scheme(), host))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    // The gateway sometimes omits the offset; treat those as UTC.
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A virtual API key from `/key/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualKey {
    pub token: KeyToken,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_name: String,
    #[serde(default)]
    pub key_alias: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spend: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

impl VirtualKey {
    /// Identifier of the key (its token)
    pub fn id(&self) -> &KeyToken {
        &self.token
    }

    /// Alias when set, otherwise the key name
    pub fn display_name(&self) -> &str {
        match self.key_alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.key_name,
        }
    }

    /// Whether `needle` names this key by token, alias, or key name
    pub fn matches(&self, needle: &str) -> bool {
        self.token.as_str() == needle
            || self.key_alias.as_deref() == Some(needle)
            || self.key_name == needle
    }
}

/// The `[start, end]` range a cached entry list covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window from explicit bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of length `span` that ends at `end`
    pub fn ending_at(end: DateTime<Utc>, span: Duration) -> Self {
        Self {
            start: end - span,
            end,
        }
    }

    /// The window of length `span` immediately before this one
    pub fn preceding(&self, span: Duration) -> Self {
        Self::ending_at(self.start, span)
    }

    /// Length of the window
    pub fn span(&self) -> Duration {
        self.end - self.start
    }
}

/// Lookback and page size applied to one fetch
///
/// Both values are clamped into their accepted ranges on construction.
///
/// # Examples
/// ```
/// use litelog_core::types::WindowParams;
///
/// let params = WindowParams::new(1000, 1);
/// assert_eq!(params.lookback_hours(), 168);
/// assert_eq!(params.page_size(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowParams {
    lookback_hours: u32,
    page_size: u32,
}

impl WindowParams {
    /// Create clamped parameters
    pub fn new(lookback_hours: u32, page_size: u32) -> Self {
        Self {
            lookback_hours: lookback_hours.clamp(MIN_LOOKBACK_HOURS, MAX_LOOKBACK_HOURS),
            page_size: page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE),
        }
    }

    pub fn lookback_hours(&self) -> u32 {
        self.lookback_hours
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Lookback as a duration
    pub fn lookback(&self) -> Duration {
        Duration::hours(i64::from(self.lookback_hours))
    }
}

impl Default for WindowParams {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK_HOURS, DEFAULT_PAGE_SIZE)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `"True"`, `true`, or a number for flag-like string fields
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
