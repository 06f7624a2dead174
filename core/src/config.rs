//! Static client configuration.
//!
//! Loading the credential (environment, secrets store, config file) is the
//! embedding application's job; this type only carries the values.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://healthchecks.io/api/v1";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: String,
    #[serde(default = "default_base_url", deserialize_with = "trimmed_base_url")]
    pub base_url: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            content_type: default_content_type(),
        }
    }

    /// Point the client at another deployment. A trailing `/` is dropped.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("content_type", &self.content_type)
            .finish()
    }
}

fn trimmed_base_url<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let base_url = String::deserialize(deserializer)?;
    Ok(base_url.trim_end_matches('/').to_string())
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}
