use crate::core::matching::MatchStrategy;
use crate::domain::model::{ItemFailure, Watchlist, WatchlistItem, WritePolicy, WriteBackReport};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;

/// 一個遠端觀看清單服務（每個帳號一個實例）
#[async_trait]
pub trait WatchlistService: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Watchlist>;

    async fn add_item(&self, item: &WatchlistItem) -> Result<()>;

    /// Writes each item in set order, one request per item.
    async fn add(&self, items: &Watchlist, policy: WritePolicy) -> Result<WriteBackReport> {
        let mut report = WriteBackReport::new(self.name());

        for item in items {
            match self.add_item(item).await {
                Ok(()) => {
                    tracing::info!("Added {} to {} watchlist", item, self.name());
                    report.added.push(item.clone());
                }
                Err(e) => match policy {
                    WritePolicy::FailFast => {
                        tracing::error!("❌ Failed to add {} to {}: {}", item, self.name(), e);
                        return Err(SyncError::WriteBackAborted {
                            service: self.name().to_string(),
                            added: report.added,
                            item: item.clone(),
                            source: Box::new(e),
                            other: None,
                        });
                    }
                    WritePolicy::Continue => {
                        tracing::warn!("⚠️ Failed to add {} to {}: {}", item, self.name(), e);
                        report.failed.push(ItemFailure {
                            item: item.clone(),
                            cause: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(report)
    }
}

/// Maps an item to the key used for cross-service identity.
pub trait ItemMatcher: Send + Sync {
    fn key(&self, item: &WatchlistItem) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn concurrent(&self) -> bool;
    fn write_policy(&self) -> WritePolicy;
    fn match_strategy(&self) -> MatchStrategy;
    fn dry_run(&self) -> bool;
    fn monitoring_enabled(&self) -> bool;
}
