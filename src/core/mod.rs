pub mod matching;
pub mod reconciler;
pub mod sync;

pub use crate::domain::model::{
    DiffResult, ItemFailure, SyncReport, Watchlist, WatchlistItem, WritePolicy, WriteBackReport,
};
pub use crate::domain::ports::{ConfigProvider, ItemMatcher, WatchlistService};
pub use crate::utils::error::Result;
