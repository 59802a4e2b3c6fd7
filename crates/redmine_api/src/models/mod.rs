mod attachment;
mod enumeration;
mod issue;
mod page;
mod project;
mod user;

pub use attachment::{Attachment, UploadHandle, UploadReceipt, UploadResponse};
pub use enumeration::{
    CategoriesResponse, Category, PrioritiesResponse, Priority, Tracker, TrackersResponse,
};
pub use issue::{
    IdRef, Issue, IssueEnvelope, IssuesPage, Journal, JournalDetail, NamedRef, NewIssue,
    NewIssueEnvelope, Relation,
};
pub use page::PageInfo;
pub use project::{Project, ProjectsPage};
pub use user::{CurrentUserEnvelope, User, UsersPage};
