use serde::{Deserialize, Serialize};

use super::{Attachment, PageInfo, UploadHandle, User};

/// `{id, name}` reference to another Redmine record (status, tracker, project, ...).
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NamedRef {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct IdRef {
    pub id: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Issue {
    pub id: u64,
    #[serde(default)]
    pub subject: String,
    pub description: Option<String>,
    pub status: Option<NamedRef>,
    pub author: Option<User>,
    pub assigned_to: Option<User>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub tracker: Option<NamedRef>,
    pub priority: Option<NamedRef>,
    pub project: Option<NamedRef>,
    pub category: Option<NamedRef>,
    pub fixed_version: Option<NamedRef>,
    pub parent: Option<IdRef>,
    pub estimated_hours: Option<f64>,
    pub spent_hours: Option<f64>,
    pub done_ratio: Option<u8>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub watchers: Vec<User>,
    #[serde(default)]
    pub children: Vec<Issue>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// Change-history entry recorded against an issue.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Journal {
    pub id: u64,
    pub user: Option<User>,
    pub notes: Option<String>,
    pub created_on: Option<String>,
    pub private_notes: Option<bool>,
    #[serde(default)]
    pub details: Vec<JournalDetail>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct JournalDetail {
    pub property: String,
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Relation {
    pub id: u64,
    pub issue_id: u64,
    pub issue_to_id: u64,
    pub relation_type: String,
    pub delay: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssuesPage {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueEnvelope {
    pub issue: Issue,
}

/// Issue-creation payload. Identifiers are sent exactly as entered; optional
/// fields are omitted from the body when unset.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub project_id: String,
    pub subject: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploads: Option<Vec<UploadHandle>>,
}

#[derive(Debug, Serialize, Clone)]
pub struct NewIssueEnvelope<'a> {
    pub issue: &'a NewIssue,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_new_issue_serializes_without_optional_keys() {
        let issue = NewIssue {
            project_id: "7".into(),
            subject: "Bug".into(),
            ..NewIssue::default()
        };
        let body = serde_json::to_value(NewIssueEnvelope { issue: &issue }).unwrap();
        assert_eq!(
            body,
            json!({"issue": {"project_id": "7", "subject": "Bug", "description": ""}})
        );
    }

    #[test]
    fn uploads_serialize_without_missing_description() {
        let issue = NewIssue {
            project_id: "1".into(),
            subject: "With file".into(),
            uploads: Some(vec![UploadHandle {
                token: "7.abc".into(),
                filename: "log.txt".into(),
                content_type: "text/plain".into(),
                description: None,
            }]),
            ..NewIssue::default()
        };
        let body = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            body["uploads"],
            json!([{"token": "7.abc", "filename": "log.txt", "content_type": "text/plain"}])
        );
    }

    #[test]
    fn detail_payload_with_nested_collections_parses() {
        let payload = json!({
            "issue": {
                "id": 42,
                "subject": "Crash on save",
                "status": {"id": 1, "name": "New"},
                "parent": {"id": 40},
                "attachments": [{
                    "id": 3, "filename": "trace.log", "filesize": 2048,
                    "content_type": "text/plain",
                    "content_url": "http://r/attachments/download/3/trace.log",
                    "author": {"id": 5, "name": "Ada"},
                    "created_on": "2024-03-01T10:00:00Z"
                }],
                "journals": [{
                    "id": 9, "user": {"id": 5, "name": "Ada"}, "notes": "",
                    "created_on": "2024-03-02T10:00:00Z", "private_notes": false,
                    "details": [{"property": "attr", "name": "status_id", "old_value": "1", "new_value": "2"}]
                }],
                "watchers": [{"id": 6, "name": "Grace"}],
                "children": [{"id": 43, "subject": "Sub-task", "tracker": {"id": 1, "name": "Bug"}}],
                "relations": [{"id": 1, "issue_id": 42, "issue_to_id": 44, "relation_type": "relates", "delay": null}]
            }
        });
        let envelope: IssueEnvelope = serde_json::from_value(payload).unwrap();
        let issue = envelope.issue;
        assert_eq!(issue.parent, Some(IdRef { id: 40 }));
        assert_eq!(issue.attachments[0].filesize, 2048);
        assert_eq!(issue.journals[0].details[0].new_value.as_deref(), Some("2"));
        assert_eq!(issue.watchers.len(), 1);
        assert_eq!(issue.children[0].subject, "Sub-task");
        assert_eq!(issue.relations[0].relation_type, "relates");
    }
}
