//! OpsHub Server — Business Operations Dashboard
//!
//! Main entry point that wires the plugin system together and keeps the
//! process alive until a shutdown signal arrives.

use std::sync::Arc;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use opshub_core::config::AppConfig;
use opshub_core::error::AppError;
use opshub_plugin::bus::EventBus;
use opshub_plugin::loader::PluginLoader;
use opshub_plugin::registry::PluginRegistry;
use opshub_plugin::resolver::PluginResolver;

use plugin_finance::FinancePlugin;
use plugin_ops::OpsPlugin;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("OPSHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting OpsHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Event bus ────────────────────────────────────────
    let bus = Arc::new(EventBus::with_config(&config.events));

    // ── Step 2: Built-in module implementations ──────────────────
    let registry = Arc::new(PluginRegistry::new());
    let resolver = Arc::new(PluginResolver::new());
    resolver
        .register_builtin(
            plugin_ops::MODULE_NAME,
            Arc::new(OpsPlugin::new(Arc::clone(&bus))),
        )
        .await;
    resolver
        .register_builtin(
            plugin_finance::MODULE_NAME,
            Arc::new(FinancePlugin::new(Arc::clone(&bus))),
        )
        .await;

    // ── Step 3: Plugin discovery ─────────────────────────────────
    let loader = PluginLoader::new(
        config.plugins.clone(),
        Arc::clone(&registry),
        Arc::clone(&resolver),
    );

    if config.plugins.auto_load {
        tracing::info!(dir = %config.plugins.modules_dir, "Loading modules...");
        let active = loader.load_plugins().await;
        tracing::info!("Loaded {} module(s)", active.len());

        let snapshot = loader.client_snapshot().await;
        match serde_json::to_string(&snapshot) {
            Ok(json) => tracing::debug!(snapshot = %json, "Client snapshot ready"),
            Err(e) => tracing::warn!("Failed to serialize client snapshot: {}", e),
        }
    } else {
        tracing::info!("Module auto-load disabled");
    }

    // ── Step 4: Wait for shutdown ────────────────────────────────
    tracing::info!("OpsHub running, press Ctrl+C to stop");
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, deactivating modules...");

    for module in registry.get_all().await {
        if let Err(e) = module.deactivate().await {
            tracing::warn!(module = %module.name(), "Deactivation failed: {}", e);
        }
    }

    tracing::info!("OpsHub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
