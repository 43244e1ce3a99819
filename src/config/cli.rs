use crate::config::toml_config::{MonitoringConfig, SyncConfig};
use crate::core::WritePolicy;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "watchlist-sync")]
#[command(about = "Synchronize two movie/show watchlists in one pass")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "watchlist-sync.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Fetch and reconcile only, without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Fetch and write one service after the other
    #[arg(long)]
    pub sequential: bool,

    /// Abort write-back at the first failed item
    #[arg(long)]
    pub fail_fast: bool,

    /// Write the sync report as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl CliArgs {
    /// 命令列參數覆蓋檔案設定
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if self.dry_run {
            config.sync.dry_run = true;
            tracing::info!("🔧 Dry run enabled from command line");
        }
        if self.sequential {
            config.sync.concurrent = false;
            tracing::info!("🔧 Sequential mode enabled from command line");
        }
        if self.fail_fast {
            config.sync.write_policy = WritePolicy::FailFast;
            tracing::info!("🔧 Write policy overridden to fail_fast");
        }
        if let Some(enabled) = self.monitor {
            config.monitoring = Some(MonitoringConfig { enabled });
            tracing::info!("🔧 Monitoring overridden to: {}", enabled);
        }
    }
}
