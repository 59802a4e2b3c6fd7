//! Lifecycle state published for every user-triggered operation.
//!
//! Each operation moves `Idle -> Pending -> Succeeded | Failed`; a failed
//! precondition goes straight from `Idle` to `Failed` without `Pending`.

use serde::Serialize;

/// Every operation the client can run against the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    TestConnection,
    CreateIssue,
    ListIssues,
    ListProjects,
    ListUsers,
    ListPriorities,
    ListCategories,
    ListTrackers,
    UploadFiles,
    IssueDetail,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::TestConnection,
        Operation::CreateIssue,
        Operation::ListIssues,
        Operation::ListProjects,
        Operation::ListUsers,
        Operation::ListPriorities,
        Operation::ListCategories,
        Operation::ListTrackers,
        Operation::UploadFiles,
        Operation::IssueDetail,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::TestConnection => "test_connection",
            Operation::CreateIssue => "create_issue",
            Operation::ListIssues => "list_issues",
            Operation::ListProjects => "list_projects",
            Operation::ListUsers => "list_users",
            Operation::ListPriorities => "list_priorities",
            Operation::ListCategories => "list_categories",
            Operation::ListTrackers => "list_trackers",
            Operation::UploadFiles => "upload_files",
            Operation::IssueDetail => "issue_detail",
        }
    }
}

/// Failure classes surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required field was empty; no request was sent.
    Precondition,
    /// The server rejected the API key (401/403).
    Auth,
    /// No response at all: DNS, refused connection, TLS, timeout.
    Unreachable,
    /// Any other non-success response or undecodable payload.
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message)
    }
}

/// Success summary: a headline message plus optional secondary detail
/// (the identity line of a connection test, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub detail: Option<String>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OperationState {
    #[default]
    Idle,
    Pending,
    Succeeded(Notice),
    Failed(OperationError),
}

impl OperationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, OperationState::Pending)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationState::Succeeded(_))
    }

    /// Message shown in the operation's message slot, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            OperationState::Succeeded(notice) => Some(notice.message.as_str()),
            OperationState::Failed(error) => Some(error.message.as_str()),
            OperationState::Idle | OperationState::Pending => None,
        }
    }

    pub fn error(&self) -> Option<&OperationError> {
        match self {
            OperationState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            OperationState::Succeeded(notice) => Some(notice),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_indices_match_declaration_order() {
        for (position, operation) in Operation::ALL.iter().enumerate() {
            assert_eq!(operation.index(), position);
        }
    }

    #[test]
    fn message_slot_is_empty_while_idle_or_pending() {
        assert_eq!(OperationState::Idle.message(), None);
        assert_eq!(OperationState::Pending.message(), None);
        let failed = OperationState::Failed(OperationError::precondition("missing"));
        assert_eq!(failed.message(), Some("missing"));
        assert_eq!(failed.error().map(|e| e.kind), Some(ErrorKind::Precondition));
    }

    #[test]
    fn state_serializes_with_tag() {
        let state = OperationState::Succeeded(Notice::new("ok"));
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["state"], "succeeded");
        assert_eq!(value["message"], "ok");
    }
}
