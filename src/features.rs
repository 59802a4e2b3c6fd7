//! Feature sets selecting how much of the Redmine surface is exposed.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::state::Operation;

/// `Basic` covers connection testing and issue create/list, `Reference`
/// adds the lookup lists used by the issue form, `Full` adds attachments
/// and the issue detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    Basic,
    Reference,
    #[default]
    Full,
}

impl FeatureSet {
    pub fn allows(self, operation: Operation) -> bool {
        match operation {
            Operation::TestConnection | Operation::CreateIssue | Operation::ListIssues => true,
            Operation::ListProjects
            | Operation::ListUsers
            | Operation::ListPriorities
            | Operation::ListCategories
            | Operation::ListTrackers => self != FeatureSet::Basic,
            Operation::UploadFiles | Operation::IssueDetail => self == FeatureSet::Full,
        }
    }
}
