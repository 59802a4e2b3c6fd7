//! Presentation-facing row types and formatting helpers.
//!
//! Converts API records into flat, display-ready shapes so a front end
//! (the command line in this crate) never reaches into nested optionals.

use chrono::{DateTime, Local};
use redmine_api::{Attachment, Issue, Journal, NamedRef, Relation, User};
use serde::Serialize;

/// Represents one line of the issue list: id, subject, status, assignee and last update.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub id: u64,
    pub subject: String,
    pub status: String,
    pub tracker: String,
    pub assignee: String,
    pub updated: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            id: issue.id,
            subject: issue.subject.clone(),
            status: ref_name(issue.status.as_ref()),
            tracker: ref_name(issue.tracker.as_ref()),
            assignee: user_name(issue.assigned_to.as_ref()),
            updated: issue
                .updated_on
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
        }
    }
}

/// Represents an attachment line of the detail view with a human-readable size.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRow {
    pub id: u64,
    pub filename: String,
    pub size: String,
    pub content_type: String,
    pub author: String,
    pub created: String,
    pub url: String,
}

impl From<&Attachment> for AttachmentRow {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id,
            filename: attachment.filename.clone(),
            size: format_file_size(attachment.filesize),
            content_type: attachment.content_type.clone().unwrap_or_default(),
            author: user_name(attachment.author.as_ref()),
            created: attachment
                .created_on
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default(),
            url: attachment.content_url.clone().unwrap_or_default(),
        }
    }
}

fn ref_name(value: Option<&NamedRef>) -> String {
    value
        .and_then(|named| named.name.clone())
        .unwrap_or_else(|| "-".to_string())
}

fn user_name(user: Option<&User>) -> String {
    user.and_then(User::display_name)
        .unwrap_or_else(|| "-".to_string())
}

/// Formats a byte count with binary units and at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0usize;
    while exponent + 1 < UNITS.len() && bytes >= 1024u64.pow(exponent as u32 + 1) {
        exponent += 1;
    }
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[exponent])
}

/// Renders a Redmine timestamp in local time, or returns it untouched when
/// it does not parse.
pub fn format_timestamp(value: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z").ok())
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn journal_line(journal: &Journal) -> String {
    let mut line = format!(
        "{} · {}",
        user_name(journal.user.as_ref()),
        journal
            .created_on
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_default()
    );
    for detail in &journal.details {
        line.push_str(&format!(
            "\n    {}: {} → {}",
            detail.name,
            detail.old_value.as_deref().unwrap_or("∅"),
            detail.new_value.as_deref().unwrap_or("∅")
        ));
    }
    if let Some(notes) = journal.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        line.push_str(&format!("\n    {}", notes));
    }
    line
}

fn relation_line(relation: &Relation) -> String {
    match relation.delay {
        Some(delay) => format!(
            "#{} {} #{} ({} d)",
            relation.issue_id, relation.relation_type, relation.issue_to_id, delay
        ),
        None => format!(
            "#{} {} #{}",
            relation.issue_id, relation.relation_type, relation.issue_to_id
        ),
    }
}

/// Text lines of the issue detail view, section by section.
pub fn issue_detail_lines(issue: &Issue) -> Vec<String> {
    let mut lines = vec![
        format!("#{} {}", issue.id, issue.subject),
        format!(
            "Proyecto: {} · Tracker: {} · Estado: {} · Prioridad: {}",
            ref_name(issue.project.as_ref()),
            ref_name(issue.tracker.as_ref()),
            ref_name(issue.status.as_ref()),
            ref_name(issue.priority.as_ref())
        ),
        format!(
            "Autor: {} · Asignado: {}",
            user_name(issue.author.as_ref()),
            user_name(issue.assigned_to.as_ref())
        ),
    ];
    if let Some(parent) = issue.parent {
        lines.push(format!("Padre: #{}", parent.id));
    }
    if let Some(done) = issue.done_ratio {
        lines.push(format!("Progreso: {}%", done));
    }
    if let Some(description) = issue.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(String::new());
        lines.push(description.trim().to_string());
    }
    if !issue.attachments.is_empty() {
        lines.push(String::new());
        lines.push(format!("Adjuntos ({})", issue.attachments.len()));
        for row in issue.attachments.iter().map(AttachmentRow::from) {
            lines.push(format!("  {} ({}) {}", row.filename, row.size, row.url));
        }
    }
    if !issue.journals.is_empty() {
        lines.push(String::new());
        lines.push(format!("Historial ({})", issue.journals.len()));
        lines.extend(issue.journals.iter().map(|j| format!("  {}", journal_line(j))));
    }
    if !issue.watchers.is_empty() {
        let names: Vec<String> = issue.watchers.iter().map(|w| user_name(Some(w))).collect();
        lines.push(format!("Observadores: {}", names.join(", ")));
    }
    if !issue.children.is_empty() {
        lines.push(format!("Subtareas ({})", issue.children.len()));
        lines.extend(
            issue
                .children
                .iter()
                .map(|child| format!("  #{} {}", child.id, child.subject)),
        );
    }
    if !issue.relations.is_empty() {
        lines.push(format!("Relaciones ({})", issue.relations.len()));
        lines.extend(issue.relations.iter().map(|r| format!("  {}", relation_line(r))));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_sizes_use_binary_units() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024 * 1024), "5120 GB");
    }

    #[test]
    fn unparseable_timestamp_is_returned_verbatim() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp("2024-03-01T10:00:00Z").len(), "2024-03-01 10:00".len());
    }

    #[test]
    fn issue_row_flattens_optional_references() {
        let issue: Issue = serde_json::from_value(json!({
            "id": 5,
            "subject": "Printer on fire",
            "status": {"id": 1, "name": "New"},
            "assigned_to": {"id": 2, "name": "Grace"}
        }))
        .unwrap();
        let row = IssueRow::from(&issue);
        assert_eq!(row.status, "New");
        assert_eq!(row.assignee, "Grace");
        assert_eq!(row.tracker, "-");
        assert_eq!(row.updated, "");
    }

    #[test]
    fn detail_lines_list_every_section_present() {
        let issue: Issue = serde_json::from_value(json!({
            "id": 42,
            "subject": "Crash",
            "description": "Steps...",
            "attachments": [{"id": 1, "filename": "a.log", "filesize": 2048, "content_url": "http://r/a.log"}],
            "journals": [{"id": 1, "user": {"id": 1, "name": "Ada"}, "notes": "Looking",
                          "details": [{"property": "attr", "name": "status_id", "old_value": "1", "new_value": "2"}]}],
            "watchers": [{"id": 2, "name": "Grace"}],
            "children": [{"id": 43, "subject": "Sub"}],
            "relations": [{"id": 1, "issue_id": 42, "issue_to_id": 50, "relation_type": "blocks", "delay": null}]
        }))
        .unwrap();
        let text = issue_detail_lines(&issue).join("\n");
        assert!(text.contains("a.log (2 KB) http://r/a.log"));
        assert!(text.contains("status_id: 1 → 2"));
        assert!(text.contains("Observadores: Grace"));
        assert!(text.contains("#43 Sub"));
        assert!(text.contains("#42 blocks #50"));
    }
}
