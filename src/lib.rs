pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod services;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use config::ObservabilityConfig;
use services::Scheduler;
use state::AppState;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_metrics(&config)?;
    init_logging(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Created config.toml");
            } else {
                println!("config.toml already exists");
            }
            Ok(())
        }

        Commands::Daemon => run_daemon(config).await,

        Commands::Lookup { id, full } => {
            let state = AppState::new(config).await?;
            cli::cmd_lookup(state.service.as_ref(), &id, full).await
        }

        Commands::Search { query, details } => {
            let state = AppState::new(config).await?;
            cli::cmd_search(state.service.as_ref(), &query.join(" "), details).await
        }

        Commands::Autocomplete { prefix } => {
            let state = AppState::new(config).await?;
            cli::cmd_autocomplete(state.service.as_ref(), &prefix.join(" ")).await
        }

        Commands::Sweep => {
            let state = AppState::new(config).await?;
            let scheduler =
                Scheduler::new(Arc::clone(&state.service), state.config.scheduler.clone());
            cli::cmd_sweep(&scheduler).await
        }

        Commands::Stats => {
            let state = AppState::new(config).await?;
            cli::cmd_stats(state.service.as_ref()).await
        }
    }
}

fn init_metrics(config: &Config) -> anyhow::Result<()> {
    if !config.observability.metrics_enabled {
        return Ok(());
    }

    use metrics_exporter_prometheus::PrometheusBuilder;

    if let Some(port) = config.observability.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", addr);
    } else {
        PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
    }

    Ok(())
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = loki_builder(&config.observability)?.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

/// Loki labels from config; `app` defaults to `foodcache` unless configured.
fn loki_builder(observability: &ObservabilityConfig) -> anyhow::Result<tracing_loki::Builder> {
    let mut builder = tracing_loki::builder();
    if !observability.loki_labels.contains_key("app") {
        builder = builder.label("app", "foodcache")?;
    }
    for (key, value) in &observability.loki_labels {
        builder = builder.label(key.as_str(), value.as_str())?;
    }
    Ok(builder)
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "foodcache v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let state = AppState::new(config).await?;
    state.store.ping().await.context("Database is not reachable")?;

    let scheduler = Arc::new(Scheduler::new(
        Arc::clone(&state.service),
        state.config.scheduler.clone(),
    ));

    let scheduler_handle = {
        let sched = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = sched.start().await {
                error!("Scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loki_url() -> url::Url {
        url::Url::parse("http://localhost:3100").unwrap()
    }

    #[test]
    fn loki_layer_builds_from_default_config() {
        let config = Config::default();
        let builder = loki_builder(&config.observability).unwrap();
        assert!(builder.build_url(loki_url()).is_ok());
    }

    #[test]
    fn loki_adds_app_label_when_not_configured() {
        let mut config = Config::default();
        config.observability.loki_labels.clear();
        config
            .observability
            .loki_labels
            .insert("env".to_string(), "staging".to_string());

        let builder = loki_builder(&config.observability).unwrap();
        assert!(builder.build_url(loki_url()).is_ok());
    }

    #[test]
    fn loki_accepts_overridden_app_label() {
        let mut config = Config::default();
        config
            .observability
            .loki_labels
            .insert("app".to_string(), "foodcache-eu".to_string());

        assert!(loki_builder(&config.observability).is_ok());
    }
}
