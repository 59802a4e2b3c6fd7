//! Input state edited by the user between operations.

use clap::ValueEnum;
use redmine_api::{IssueQuery, NewIssue, RedmineConfig, UploadHandle};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ISSUE_LIMIT: u32 = 25;
pub const DEFAULT_FILTER_USER: &str = "me";

/// Server address and API key as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub base_url: String,
    pub api_key: String,
}

impl Connection {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !is_blank(&self.base_url) && !is_blank(&self.api_key)
    }

    pub fn to_config(&self) -> RedmineConfig {
        RedmineConfig::new(self.base_url.trim(), self.api_key.trim())
    }
}

/// Fields of the new-issue form. Identifiers are kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueForm {
    pub project_id: String,
    pub subject: String,
    pub description: String,
    pub assigned_to_id: String,
    pub priority_id: String,
    pub category_id: String,
    pub tracker_id: String,
}

impl IssueForm {
    pub fn has_required_fields(&self) -> bool {
        !is_blank(&self.project_id) && !is_blank(&self.subject)
    }

    pub fn to_new_issue(&self, uploads: &[UploadHandle]) -> NewIssue {
        NewIssue {
            project_id: self.project_id.trim().to_string(),
            subject: self.subject.clone(),
            description: self.description.clone(),
            assigned_to_id: non_empty(&self.assigned_to_id),
            priority_id: non_empty(&self.priority_id),
            category_id: non_empty(&self.category_id),
            tracker_id: non_empty(&self.tracker_id),
            uploads: if uploads.is_empty() {
                None
            } else {
                Some(uploads.to_vec())
            },
        }
    }

    /// Clears everything but the project, which doubles as the project
    /// selection used for category lookups.
    pub fn reset_after_create(&mut self) {
        *self = IssueForm {
            project_id: std::mem::take(&mut self.project_id),
            ..IssueForm::default()
        };
    }
}

/// Which user relation the issue list filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    #[default]
    Author,
    Assigned,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueFilter {
    pub filter_type: FilterType,
    pub user_id: String,
    pub status_id: String,
    pub project_id: String,
    pub limit: u32,
}

impl Default for IssueFilter {
    fn default() -> Self {
        Self {
            filter_type: FilterType::Author,
            user_id: DEFAULT_FILTER_USER.to_string(),
            status_id: String::new(),
            project_id: String::new(),
            limit: DEFAULT_ISSUE_LIMIT,
        }
    }
}

impl IssueFilter {
    pub fn to_query(&self) -> IssueQuery {
        let user = non_empty(&self.user_id);
        let (author_id, assigned_to_id) = match self.filter_type {
            FilterType::Author => (user, None),
            FilterType::Assigned => (None, user),
            FilterType::All => (None, None),
        };
        IssueQuery {
            limit: self.limit,
            author_id,
            assigned_to_id,
            status_id: non_empty(&self.status_id),
            project_id: non_empty(&self.project_id),
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
