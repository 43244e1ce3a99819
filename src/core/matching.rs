use crate::core::{ItemMatcher, WatchlistItem};
use serde::{Deserialize, Serialize};

/// Raw identity: two items match only when their identifiers are equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl ItemMatcher for ExactMatcher {
    fn key(&self, item: &WatchlistItem) -> String {
        item.as_str().to_string()
    }
}

/// 標題正規化：小寫、去除標點、壓縮空白
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedTitleMatcher;

impl ItemMatcher for NormalizedTitleMatcher {
    fn key(&self, item: &WatchlistItem) -> String {
        let cleaned: String = item
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .to_lowercase();

        cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    #[default]
    Exact,
    Normalized,
}

pub fn matcher_for(strategy: MatchStrategy) -> Box<dyn ItemMatcher> {
    match strategy {
        MatchStrategy::Exact => Box::new(ExactMatcher),
        MatchStrategy::Normalized => Box::new(NormalizedTitleMatcher),
    }
}
