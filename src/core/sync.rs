use crate::adapters::http::{build_session, HttpWatchlistClient};
use crate::config::toml_config::SyncConfig;
use crate::core::matching::{matcher_for, MatchStrategy};
use crate::core::reconciler::diff_with;
use crate::core::{
    ConfigProvider, DiffResult, ItemMatcher, SyncReport, Watchlist, WatchlistService, WritePolicy,
    WriteBackReport,
};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use std::fmt;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Start,
    FetchBoth,
    Reconcile,
    WriteBackBoth,
    Done,
    Failed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Start => "start",
            SyncPhase::FetchBoth => "fetch",
            SyncPhase::Reconcile => "reconcile",
            SyncPhase::WriteBackBoth => "write-back",
            SyncPhase::Done => "done",
            SyncPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Run the two fetches, and the two write-backs, concurrently.
    pub concurrent: bool,
    pub write_policy: WritePolicy,
    pub dry_run: bool,
    pub matching: MatchStrategy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrent: true,
            write_policy: WritePolicy::Continue,
            dry_run: false,
            matching: MatchStrategy::Exact,
        }
    }
}

impl SyncOptions {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            concurrent: config.concurrent(),
            write_policy: config.write_policy(),
            dry_run: config.dry_run(),
            matching: config.match_strategy(),
        }
    }
}

/// 同步流程：取得兩邊清單 → 比對 → 回寫
pub struct SyncEngine<A: WatchlistService, B: WatchlistService> {
    service_a: A,
    service_b: B,
    options: SyncOptions,
    matcher: Box<dyn ItemMatcher>,
    monitor: SystemMonitor,
}

impl<A: WatchlistService, B: WatchlistService> SyncEngine<A, B> {
    pub fn new(service_a: A, service_b: B, options: SyncOptions) -> Self {
        Self::new_with_monitoring(service_a, service_b, options, false)
    }

    pub fn new_with_monitoring(
        service_a: A,
        service_b: B,
        options: SyncOptions,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            service_a,
            service_b,
            matcher: matcher_for(options.matching),
            options,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Replaces the matcher chosen by `options.matching`.
    pub fn with_matcher(mut self, matcher: Box<dyn ItemMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub async fn run(&self) -> Result<SyncReport> {
        let started_at = Utc::now();
        let clock = Instant::now();

        self.enter(SyncPhase::Start);
        tracing::info!(
            "🚀 Starting watchlist sync: {} <-> {} (concurrent: {}, policy: {:?}, dry run: {})",
            self.service_a.name(),
            self.service_b.name(),
            self.options.concurrent,
            self.options.write_policy,
            self.options.dry_run
        );

        match self.execute().await {
            Ok((fetched, diff, write_backs)) => {
                let (write_back_a, write_back_b) = match write_backs {
                    Some((a, b)) => (Some(a), Some(b)),
                    None => (None, None),
                };

                let report = SyncReport {
                    service_a: self.service_a.name().to_string(),
                    service_b: self.service_b.name().to_string(),
                    fetched_a: fetched.0,
                    fetched_b: fetched.1,
                    planned_for_a: diff.to_add_to_a.into_iter().collect(),
                    planned_for_b: diff.to_add_to_b.into_iter().collect(),
                    write_back_a,
                    write_back_b,
                    dry_run: self.options.dry_run,
                    started_at,
                    finished_at: Utc::now(),
                    elapsed_ms: u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX),
                };

                self.enter(SyncPhase::Done);
                self.monitor.log_final_stats();
                if report.has_failures() {
                    tracing::warn!(
                        "⚠️ Watchlists synchronized with {} failed additions ({} added)",
                        report.total_failed(),
                        report.total_added()
                    );
                } else {
                    tracing::info!("✅ Watchlists have been synchronized");
                }
                Ok(report)
            }
            Err(e) => {
                self.enter(SyncPhase::Failed);
                tracing::error!(
                    "❌ Watchlist sync failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    async fn execute(
        &self,
    ) -> Result<((usize, usize), DiffResult, Option<(WriteBackReport, WriteBackReport)>)> {
        self.enter(SyncPhase::FetchBoth);
        let (list_a, list_b) = self.fetch_both().await?;
        self.monitor.log_stats("Fetch");

        self.enter(SyncPhase::Reconcile);
        let diff = diff_with(&list_a, &list_b, self.matcher.as_ref());
        tracing::info!(
            "🔍 {} items to add to {}, {} items to add to {}",
            diff.to_add_to_a.len(),
            self.service_a.name(),
            diff.to_add_to_b.len(),
            self.service_b.name()
        );

        if self.options.dry_run {
            tracing::info!("🔍 DRY RUN MODE - no write requests will be issued");
            log_plan(self.service_a.name(), &diff.to_add_to_a);
            log_plan(self.service_b.name(), &diff.to_add_to_b);
            return Ok(((list_a.len(), list_b.len()), diff, None));
        }

        self.enter(SyncPhase::WriteBackBoth);
        let write_backs = self.write_back_both(&diff).await?;
        self.monitor.log_stats("Write-back");

        Ok(((list_a.len(), list_b.len()), diff, Some(write_backs)))
    }

    async fn fetch_both(&self) -> Result<(Watchlist, Watchlist)> {
        if self.options.concurrent {
            tokio::try_join!(fetch_one(&self.service_a), fetch_one(&self.service_b))
        } else {
            let list_a = fetch_one(&self.service_a).await?;
            let list_b = fetch_one(&self.service_b).await?;
            Ok((list_a, list_b))
        }
    }

    async fn write_back_both(&self, diff: &DiffResult) -> Result<(WriteBackReport, WriteBackReport)> {
        let policy = self.options.write_policy;
        if self.options.concurrent {
            // 兩邊都跑完再合併，失敗時另一邊的結果附在錯誤上
            let (result_a, result_b) = tokio::join!(
                self.service_a.add(&diff.to_add_to_a, policy),
                self.service_b.add(&diff.to_add_to_b, policy)
            );
            match (result_a, result_b) {
                (Ok(report_a), Ok(report_b)) => Ok((report_a, report_b)),
                (Err(e), Ok(report_b)) => Err(e.with_other_report(report_b)),
                (Ok(report_a), Err(e)) => Err(e.with_other_report(report_a)),
                (Err(e_a), Err(e_b)) => match e_b.into_partial_report() {
                    Ok(report_b) => Err(e_a.with_other_report(report_b)),
                    Err(_) => Err(e_a),
                },
            }
        } else {
            let report_a = self.service_a.add(&diff.to_add_to_a, policy).await?;
            let report_b = self.service_b.add(&diff.to_add_to_b, policy).await?;
            Ok((report_a, report_b))
        }
    }

    fn enter(&self, phase: SyncPhase) {
        tracing::debug!("➡️ Sync phase: {}", phase);
    }
}

impl SyncEngine<HttpWatchlistClient, HttpWatchlistClient> {
    /// Builds both HTTP clients over one shared connection pool.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let session = build_session()?;
        let service_a = HttpWatchlistClient::new(config.service_a.clone(), session.clone())?;
        let service_b = HttpWatchlistClient::new(config.service_b.clone(), session)?;

        Ok(Self::new_with_monitoring(
            service_a,
            service_b,
            SyncOptions::from_config(config),
            config.monitoring_enabled(),
        ))
    }
}

async fn fetch_one<S: WatchlistService>(service: &S) -> Result<Watchlist> {
    tracing::debug!("Fetching watchlist from {}", service.name());
    let list = service.fetch().await?;
    tracing::info!("📥 Fetched {} items from {}", list.len(), service.name());
    Ok(list)
}

fn log_plan(service: &str, items: &Watchlist) {
    for item in items {
        tracing::info!("Would add {} to {} watchlist", item, service);
    }
}
