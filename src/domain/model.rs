use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// 單一追蹤項目，跨服務時只以識別字串比較
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchlistItem(String);

impl WatchlistItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WatchlistItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WatchlistItem {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WatchlistItem {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 有序集合，確保回寫順序固定
pub type Watchlist = BTreeSet<WatchlistItem>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub to_add_to_a: Watchlist,
    pub to_add_to_b: Watchlist,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.to_add_to_a.is_empty() && self.to_add_to_b.is_empty()
    }

    pub fn swap(self) -> Self {
        Self {
            to_add_to_a: self.to_add_to_b,
            to_add_to_b: self.to_add_to_a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Stop at the first failed write.
    FailFast,
    /// Attempt every item and collect failures.
    #[default]
    Continue,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub item: WatchlistItem,
    pub cause: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteBackReport {
    pub service: String,
    pub added: Vec<WatchlistItem>,
    pub failed: Vec<ItemFailure>,
}

impl WriteBackReport {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Default::default()
        }
    }

    pub fn attempted(&self) -> usize {
        self.added.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub service_a: String,
    pub service_b: String,
    pub fetched_a: usize,
    pub fetched_b: usize,
    pub planned_for_a: Vec<WatchlistItem>,
    pub planned_for_b: Vec<WatchlistItem>,
    pub write_back_a: Option<WriteBackReport>,
    pub write_back_b: Option<WriteBackReport>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl SyncReport {
    pub fn total_added(&self) -> usize {
        self.write_backs().map(|r| r.added.len()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.write_backs().map(|r| r.failed.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        self.write_backs().any(|r| !r.is_success())
    }

    fn write_backs(&self) -> impl Iterator<Item = &WriteBackReport> {
        self.write_back_a.iter().chain(self.write_back_b.iter())
    }
}
