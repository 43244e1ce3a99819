pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::http::HttpWatchlistClient;
pub use config::toml_config::SyncConfig;
pub use core::sync::{SyncEngine, SyncOptions};
pub use domain::model::{DiffResult, SyncReport, Watchlist, WatchlistItem, WritePolicy};
pub use utils::error::{Result, SyncError};
