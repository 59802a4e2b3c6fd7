//! Typed Redmine REST API client crate used by the desk client component.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use reqwest::StatusCode;

pub use client::{IssueQuery, RedmineClient, ISSUE_DETAIL_INCLUDES, REFERENCE_PAGE_SIZE};
pub use config::{normalize_base_url, RedmineConfig, API_KEY_HEADER, OCTET_STREAM};
pub use error::{RedmineError, Result};
pub use models::{
    Attachment, Category, IdRef, Issue, IssuesPage, Journal, JournalDetail, NamedRef, NewIssue,
    PageInfo, Priority, Project, ProjectsPage, Relation, Tracker, UploadHandle, UploadReceipt,
    User, UsersPage,
};
