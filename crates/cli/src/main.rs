use clap::Parser;
use ferrous_cache_domain::{CliOverrides, Config};
use ferrous_cache_infrastructure::dns::CacheMultiplexer;
use tracing::{error, info};

mod bootstrap;

#[derive(Parser)]
#[command(name = "ferrous-cache")]
#[command(version)]
#[command(about = "Ferrous Cache - namespaced DNS record and response cache")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Cache namespace, repeat for several (replaces the configured list)
    #[arg(long = "namespace", value_name = "NAME")]
    namespaces: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        namespaces: cli.namespaces.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    let config_file = cli.config.clone().or_else(Config::get_config_path);
    info!("Starting Ferrous Cache v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_file = config_file.as_deref().unwrap_or("default"),
        namespaces = ?config.cache.namespaces,
        active_eviction = config.cache.active_eviction,
        eviction_interval_secs = config.cache.eviction_interval_secs,
        "Configuration loaded"
    );

    let cache = match CacheMultiplexer::from_config(&config.cache) {
        Ok(cache) => cache,
        Err(e) => {
            error!(error = %e, "Cache failed to start");
            std::process::exit(1);
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    cache.stop().await;
    info!("Cache shutdown complete");
    Ok(())
}
