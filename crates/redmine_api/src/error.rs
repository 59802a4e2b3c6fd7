//! Error model used by Redmine API client operations.

use std::io;

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedmineError>;

/// Longest slice of a response body carried into an error message.
const BODY_SNIPPET_CHARS: usize = 200;

/// Represents the failure modes of a Redmine request: non-success HTTP statuses (with the validation messages Redmine returns in its `errors` array), rejected credentials, timeouts, unreachable servers, undecodable payloads and other unexpected errors.
#[derive(Debug, Error)]
pub enum RedmineError {
    #[error("http {status}: {message}")]
    Http {
        status: StatusCode,
        errors: Vec<String>,
        message: String,
    },
    #[error("authentication error ({status}): {message}")]
    Authentication { status: StatusCode, message: String },
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl RedmineError {
    /// Constructs an HTTP error variant, extracting Redmine's `errors` list from the body.
    pub fn http(status: StatusCode, body: &str) -> Self {
        RedmineError::Http {
            status,
            errors: extract_errors(body),
            message: body_snippet(body),
        }
    }

    /// Rejected credentials. The status is already part of `Display`, so the
    /// message only carries what the server said.
    pub fn authentication(status: StatusCode, body: &str) -> Self {
        let snippet = body_snippet(body);
        RedmineError::Authentication {
            status,
            message: if snippet.is_empty() {
                "access denied".to_string()
            } else {
                snippet
            },
        }
    }

    /// True when no response was received at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, RedmineError::Network(_) | RedmineError::Timeout(_))
    }

    /// Best human-readable description: Redmine's validation messages when
    /// present, otherwise the error's own description.
    pub fn user_message(&self) -> String {
        match self {
            RedmineError::Http { errors, .. } if !errors.is_empty() => errors.join("; "),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for RedmineError {
    /// Converts reqwest errors into semantic RedmineError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RedmineError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            RedmineError::Http {
                status,
                errors: Vec::new(),
                message: err.to_string(),
            }
        } else if err.is_connect() || err.is_request() || err.is_builder() {
            // Builder errors mean the URL could not be formed; nothing was sent.
            RedmineError::Network(err.to_string())
        } else if err.is_decode() {
            RedmineError::Serialization(err.to_string())
        } else {
            RedmineError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RedmineError {
    /// Converts serde_json decode/encode failures into serialization errors.
    fn from(err: serde_json::Error) -> Self {
        RedmineError::Serialization(err.to_string())
    }
}

/// Whitespace-collapsed body, cut to `BODY_SNIPPET_CHARS`.
fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= BODY_SNIPPET_CHARS {
        return collapsed;
    }
    let mut snippet: String = collapsed.chars().take(BODY_SNIPPET_CHARS - 1).collect();
    snippet.push('…');
    snippet
}

fn extract_errors(body: &str) -> Vec<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value.get("errors").and_then(|errors| errors.as_array()).map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
        })
        .unwrap_or_default()
}
