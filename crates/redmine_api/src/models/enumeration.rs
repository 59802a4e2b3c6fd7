//! Reference data used to fill issue forms: priorities, trackers and
//! per-project categories. These endpoints are not paged.

use serde::Deserialize;

use super::{NamedRef, User};

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Priority {
    pub id: u64,
    pub name: String,
    pub is_default: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrioritiesResponse {
    #[serde(default)]
    pub issue_priorities: Vec<Priority>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub project: Option<NamedRef>,
    pub assigned_to: Option<User>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub issue_categories: Vec<Category>,
    pub total_count: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Tracker {
    pub id: u64,
    pub name: String,
    pub default_status: Option<NamedRef>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackersResponse {
    #[serde(default)]
    pub trackers: Vec<Tracker>,
}
