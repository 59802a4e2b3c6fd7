use serde::Deserialize;

use super::PageInfo;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub identifier: Option<String>,
    pub description: Option<String>,
    pub status: Option<u8>,
    pub is_public: Option<bool>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectsPage {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub page: PageInfo,
}
