use clap::Parser;
use watchlist_sync::utils::{logger, validation::Validate};
use watchlist_sync::{CliArgs, SyncConfig, SyncEngine, SyncError, SyncReport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting watchlist-sync");
    tracing::info!("📁 Loading configuration from: {}", args.config.display());

    let mut config = match SyncConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config.display(), e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };
    args.apply_overrides(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!(
        "✅ Configuration loaded: {} ({} <-> {})",
        config.sync.name,
        config.service_a.name,
        config.service_b.name
    );

    let engine = match SyncEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    match engine.run().await {
        Ok(report) => {
            print_summary(&report);
            if let Some(path) = &args.report {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(path, json)?;
                tracing::info!("📁 Report saved to: {}", path.display());
            }
            if report.has_failures() {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            if let SyncError::WriteBackAborted {
                other: Some(other), ..
            } = &e
            {
                eprintln!(
                    "   {}: {} added, {} failed",
                    other.service,
                    other.added.len(),
                    other.failed.len()
                );
            }
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn print_summary(report: &SyncReport) {
    if report.dry_run {
        println!(
            "🔍 Dry run: would add {} items to {} and {} items to {}",
            report.planned_for_a.len(),
            report.service_a,
            report.planned_for_b.len(),
            report.service_b
        );
        return;
    }

    println!("✅ Watchlists have been synchronized");
    for write_back in [&report.write_back_a, &report.write_back_b].into_iter().flatten() {
        println!(
            "   {}: {} added, {} failed",
            write_back.service,
            write_back.added.len(),
            write_back.failed.len()
        );
        for failure in &write_back.failed {
            println!("   ❌ {}: {}", failure.item, failure.cause);
        }
    }
}
