use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "redmine-desk";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const API_KEY_HEADER: &str = "X-Redmine-API-Key";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Connection settings for a single Redmine server.
#[derive(Clone, Debug)]
pub struct RedmineConfig {
    pub base_url: String,
    pub api_key: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl RedmineConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Base URL with every trailing slash removed.
    pub fn api_root(&self) -> &str {
        normalize_base_url(&self.base_url)
    }
}

/// Strips trailing slashes so paths can be appended with a single `/`.
pub fn normalize_base_url(url: &str) -> &str {
    url.trim_end_matches('/')
}
