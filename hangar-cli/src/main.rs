//! Hangar CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hangar_config::{load_config, Config, LogFormat, SupervisorSettings};
use hangar_runtime::{
    DetachedSupervisor, HotReloadWatcher, RestartingSupervisor, RuntimeFactory, RuntimeRegistry,
    ShutdownSignal, SignalHandler, SupervisorConfig, Watcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hangar")]
#[command(about = "Hangar plugin daemon", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon: watch every configured root until shut down
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "hangar.yaml", env = "HANGAR_CONFIG")]
        config: PathBuf,

        /// Log level override (trace, debug, info, warn, error)
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Run a single watch pass over one root and print what was loaded
    Scan {
        /// Plugin root to scan
        #[arg(short, long)]
        root: PathBuf,

        /// Platform to dispatch plugins to
        #[arg(short, long, default_value = "local")]
        platform: String,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "hangar.yaml", env = "HANGAR_CONFIG")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            let path = config;
            let config = load_config(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;

            let level = log_level.unwrap_or_else(|| config.logging.level.clone());
            init_tracing(&level, config.logging.format)?;

            tracing::info!(config = %path.display(), "Starting Hangar daemon");
            serve(config).await
        }

        Commands::Scan { root, platform } => {
            init_tracing("info", LogFormat::Text)?;

            let watcher = Watcher::new(
                RuntimeRegistry::new(),
                Arc::new(RuntimeFactory::with_builtin()),
                Arc::new(DetachedSupervisor),
            );
            let report = watcher.watch(&root, &platform).await;

            for name in &report.loaded {
                println!("loaded       {name}");
            }
            for name in &report.unsupported {
                println!("unsupported  {name}");
            }
            for name in &report.raced {
                println!("raced        {name}");
            }
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Platform: {}", cfg.daemon.platform);
                    tracing::info!("  Roots: {}", cfg.daemon.roots.len());
                    tracing::info!("  Hot reload: {}", cfg.daemon.hot_reload);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Hangar plugin daemon");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let shutdown = ShutdownSignal::new();
    let registry = RuntimeRegistry::new();

    let supervisor =
        RestartingSupervisor::new(supervisor_config(&config.supervisor), shutdown.clone());
    let watcher = Watcher::new(
        registry.clone(),
        Arc::new(RuntimeFactory::with_builtin()),
        Arc::new(supervisor),
    )
    .with_channel_capacity(config.daemon.channel_capacity);

    let mut passes = Vec::with_capacity(config.daemon.roots.len());
    for root in &config.daemon.roots {
        let watcher = watcher.clone();
        let root = root.clone();
        let platform = config.daemon.platform.clone();
        let interval = config.daemon.scan_interval;
        let shutdown = shutdown.clone();
        passes.push(tokio::spawn(async move {
            watcher.run_periodic(root, platform, interval, shutdown).await
        }));
    }

    let mut hot_reload = if config.daemon.hot_reload {
        let mut hot = HotReloadWatcher::new(
            watcher.clone(),
            config.daemon.roots.clone(),
            config.daemon.platform.clone(),
        );
        hot.start()?;
        hot.run()?;
        Some(hot)
    } else {
        None
    };

    tokio::spawn(SignalHandler::new(shutdown.clone()).run());

    shutdown.wait().await;
    tracing::info!("Shutting down");

    if let Some(hot) = hot_reload.as_mut() {
        hot.stop();
    }
    for pass in passes {
        if let Err(e) = pass.await {
            tracing::warn!(error = %e, "Watch task ended abnormally");
        }
    }
    registry.stop_all().await;

    tracing::info!("Hangar daemon stopped");
    Ok(())
}

fn supervisor_config(settings: &SupervisorSettings) -> SupervisorConfig {
    SupervisorConfig {
        max_restarts: settings.max_restarts,
        restart_backoff: settings.restart_backoff,
        health_check_interval: settings.health_check_interval,
    }
}

fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let (text, json) = match format {
        LogFormat::Text => (
            Some(tracing_subscriber::fmt::layer().with_target(false).with_level(true)),
            None,
        ),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into()))
        .try_init()?;

    Ok(())
}
