//! Domain DTOs for the Healthchecks.io management API.
//!
//! # Design
//! `Check` is the outbound payload for create and update. Every field is an
//! `Option`: `None` is left off the wire, `Some` is always sent, including
//! `Some(String::new())` and `Some(0)`. This keeps "leave unchanged" and
//! "clear this field" distinct on update.
//!
//! `CheckResponse` and `Channel` are the inbound shapes. The service has no
//! `id` field on checks; `CheckResponse::id` derives it from `update_url`
//! on every call so it cannot go stale.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Check configuration sent on create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Space-separated tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// Expected period in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Grace period in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace: Option<u64>,
    /// Cron expression. Takes precedence over `timeout` server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    /// Comma-separated channel names or ids, `"*"` for all channels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<String>,
    /// Allowed ping methods: `""` for any, `"POST"` for POST only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub methods: Option<String>,
    /// Field names the server uses as a dedup key on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<Vec<String>>,
}

impl Check {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Detach every notification channel on the next update.
    pub fn clear_channels(&mut self) -> &mut Self {
        self.channels = Some(String::new());
        self
    }

    /// Accept pings with any HTTP method again.
    pub fn clear_methods(&mut self) -> &mut Self {
        self.methods = Some(String::new());
        self
    }

    pub fn clear_tags(&mut self) -> &mut Self {
        self.tags = Some(String::new());
        self
    }

    pub fn clear_desc(&mut self) -> &mut Self {
        self.desc = Some(String::new());
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A check as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub tags: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_zero")]
    pub grace: u64,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_zero")]
    pub timeout: u64,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub schedule: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub tz: String,
    /// Comma-separated channel ids.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub channels: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub methods: String,
    /// `"new"`, `"up"`, `"grace"`, `"down"`, `"paused"`... as defined by the service.
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub status: String,
    /// ISO 8601 timestamp of the most recent ping.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_ping: Option<String>,
    #[serde(rename = "n_pings", default, deserialize_with = "nullable", skip_serializing_if = "is_zero")]
    pub pings: u64,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub ping_url: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub pause_url: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub update_url: String,
}

impl CheckResponse {
    /// Identifier of the check: the last path segment of `update_url`.
    /// Empty when the URL is empty.
    pub fn id(&self) -> &str {
        self.update_url.rsplit('/').next().unwrap_or_default()
    }

    /// Indented JSON of the full check.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for CheckResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "{e}"),
        }
    }
}

/// A notification channel (email, Slack, webhook...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Channel {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(e) => write!(f, "{e}"),
        }
    }
}

/// Envelope of `GET /checks/`.
#[derive(Debug, Deserialize)]
pub(crate) struct CheckList {
    #[serde(default)]
    pub checks: Vec<CheckResponse>,
}

/// Envelope of `GET /channels/`.
#[derive(Debug, Deserialize)]
pub(crate) struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Body of a failed request.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, deserialize_with = "nullable")]
    pub error: String,
}

/// Treat JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}
