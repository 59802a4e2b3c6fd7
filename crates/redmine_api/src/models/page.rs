use serde::Deserialize;

/// Paging envelope carried by every paged list response. Values are
/// reported as received; the client never requests further pages itself.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageInfo {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
}
