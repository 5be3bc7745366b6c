//! KaziCash Offline - command-line host for the KaziCash offline cache.
//!
//! Each invocation behaves like one page load of the app: the saved
//! registration is restored, the active cache manager version (if any)
//! controls fetches, and lifecycle commands run against the worker host.

mod args;
mod config;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use kazicash_core::http::{Request, Served};
use kazicash_core::network::{HttpNetwork, Network};
use kazicash_core::registration::{RegistrationController, UpdateOutcome, WorkerHost};
use kazicash_core::OfflineSignal;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Command, FetchArgs};
use config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Log file prefix inside `<cache_dir>/logs`
const LOG_FILE_PREFIX: &str = "kazicash-offline.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and to a daily file in the cache directory. The
/// returned guard flushes the file writer on drop.
fn init_tracing(cache_dir: &Path) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = if std::fs::create_dir_all(cache_dir.join("logs")).is_ok() {
        let appender = tracing_appender::rolling::daily(cache_dir.join("logs"), LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    config.apply_overrides(cli.origin, cli.cache_dir);
    let cache_dir = config.cache_dir()?;
    let _guard = init_tracing(&cache_dir);
    info!(command = ?cli.cmd, cache_dir = %cache_dir.display(), "KaziCash offline starting");

    if cli.cmd == Command::Config {
        return show_config(&config);
    }

    let app_url = config.app_url()?;
    let network: Arc<dyn Network> = Arc::new(HttpNetwork::with_timeout(Duration::from_secs(
        config.request_timeout_secs,
    ))?);
    let mut host = WorkerHost::open(app_url, &cache_dir, network.clone(), config.retention())?;
    if !config.workers_enabled {
        host = host.without_worker_support();
    }
    let controller = Arc::new(RegistrationController::with_script_url(
        Arc::new(host),
        config.script_url.clone(),
    ));

    match cli.cmd {
        Command::Register => register(&controller).await,
        Command::Update => update(&controller).await,
        Command::ForceUpdate => force_update(&controller).await,
        Command::Fetch(args) => fetch(&controller, network.as_ref(), args).await,
        Command::Status => status(&controller, network.as_ref()).await,
        Command::Caches => caches(&controller).await,
        Command::Unregister => {
            if controller.host().unregister().await {
                println!("Unregistered");
            } else {
                println!("Not registered");
            }
            Ok(())
        }
        Command::Config => show_config(&config),
    }
}

async fn register(controller: &Arc<RegistrationController>) -> Result<()> {
    let phase = controller
        .spawn_register()
        .await
        .context("Registration task failed")?;
    match phase {
        Some(phase) => println!("Service worker {}", phase.label()),
        None => println!("Offline support unavailable; running online-only"),
    }
    Ok(())
}

async fn update(controller: &RegistrationController) -> Result<()> {
    match controller.check_for_updates().await {
        Some(UpdateOutcome::Unchanged) => println!("Up to date"),
        Some(UpdateOutcome::Installed {
            cache_name,
            activated: true,
        }) => println!("Installed and activated {}", cache_name),
        Some(UpdateOutcome::Installed { cache_name, .. }) => {
            println!("Installed {}; run force-update to activate it", cache_name)
        }
        Some(UpdateOutcome::InstallFailed { cache_name, reason }) => {
            println!("Install of {} failed: {}", cache_name, reason)
        }
        None => println!("Update check failed; see the log for details"),
    }
    Ok(())
}

async fn force_update(controller: &RegistrationController) -> Result<()> {
    if !controller.force_update().await {
        println!("No active service worker");
        return Ok(());
    }
    if let Some(status) = controller.host().status().await {
        println!(
            "Active: {}",
            status.active.as_deref().unwrap_or("none")
        );
    }
    Ok(())
}

async fn fetch(
    controller: &RegistrationController,
    network: &dyn Network,
    FetchArgs { path, navigate }: FetchArgs,
) -> Result<()> {
    let host = controller.host();
    let signal = OfflineSignal::probe(network, host.app_url()).await;
    if let Some(banner) = signal.view().banner() {
        eprintln!("{}", banner);
    }

    let url = host
        .app_url()
        .join(&path)
        .with_context(|| format!("Invalid path: {}", path))?;
    let request = if navigate {
        Request::navigate(url)
    } else {
        Request::get(url)
    };

    let Served { response, source } = host
        .fetch(&request)
        .await
        .context("Request failed and no service worker controls this page")?;
    eprintln!(
        "{} {} ({})",
        response.status,
        response.status_text,
        source.label()
    );
    println!("{}", response.text());
    Ok(())
}

async fn status(controller: &RegistrationController, network: &dyn Network) -> Result<()> {
    let host = controller.host();
    let signal = OfflineSignal::probe(network, host.app_url()).await;

    println!("Origin:        {}", host.app_url());
    println!("Connectivity:  {:?}", signal.connectivity());
    match host.status().await {
        Some(status) => {
            let phase = status.phase().map(|p| p.label()).unwrap_or("no version");
            println!("Registration:  {} ({})", status.script_url, phase);
            println!("  scope:       {}", status.scope);
            println!("  waiting:     {}", status.waiting.as_deref().unwrap_or("-"));
            println!("  active:      {}", status.active.as_deref().unwrap_or("-"));
            println!("  controlled:  {}", status.controlled);
        }
        None => println!("Registration:  none"),
    }
    Ok(())
}

async fn caches(controller: &RegistrationController) -> Result<()> {
    let summaries = controller.host().storage().summaries().await;
    if summaries.is_empty() {
        println!("No cache stores");
        return Ok(());
    }
    for summary in summaries {
        println!(
            "{:<20} {:>5} entries ({} precached)  updated {}",
            summary.name,
            summary.entries,
            summary.precached,
            summary.last_updated.as_deref().unwrap_or("never")
        );
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::config_path()?;
    if !path.exists() {
        config.save().context("Failed to write default configuration")?;
        println!("Wrote defaults to {}", path.display());
    } else {
        println!("{}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
