//! User models returned by Redmine identity and user endpoints.

use serde::Deserialize;

use super::PageInfo;

/// Represents a Redmine user, either a full account record (`/users.json`, `/users/current.json`) or the `{id, name}` reference embedded in issues.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: Option<String>,
    pub login: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub mail: Option<String>,
    pub created_on: Option<String>,
    pub updated_on: Option<String>,
    pub last_login_on: Option<String>,
    pub status: Option<u8>,
}

impl User {
    /// Returns `name` when present, else the first/last name pair.
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            return Some(name.to_string());
        }
        let full = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            None
        } else {
            Some(full)
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CurrentUserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UsersPage {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(flatten)]
    pub page: PageInfo,
}
