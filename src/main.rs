use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;

use study_router::config::watcher::ConfigWatcher;
use study_router::config::{load_config, RouterConfig};
use study_router::lifecycle::{self, Shutdown, Signal};
use study_router::observability::{logging, metrics};
use study_router::NavigationServer;

#[derive(Parser)]
#[command(name = "study-router")]
#[command(about = "Navigation host for the study quiz route table", long_about = None)]
struct Args {
    /// TOML configuration file. Without it the built-in table and defaults are used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the route table when the configuration file changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("study-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.navigation.base_path,
        request_timeout_secs = config.listener.request_timeout_secs,
        config_file = ?args.config,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let services = lifecycle::build_services(&config)?;
    lifecycle::startup::warm_up(&services.navigator).await;

    // Config updates arrive from the file watcher and from SIGHUP.
    let (reload_tx, config_updates, _watch_guard) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            let tx = watcher.sender();
            let guard = if args.watch { Some(watcher.run()?) } else { None };
            (tx, rx, guard)
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (tx, rx, None)
        }
    };

    let listener = lifecycle::startup::bind(&config).await?;
    let server =
        NavigationServer::new(config, services.navigator.clone(), services.history.clone());

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, config_updates, server_shutdown));

    loop {
        match lifecycle::next_signal().await? {
            Signal::Terminate => {
                shutdown.trigger();
                break;
            }
            Signal::Reload => match &args.config {
                Some(path) => match load_config(path) {
                    Ok(new_config) => {
                        tracing::info!(path = ?path, "Reloading configuration on SIGHUP");
                        let _ = reload_tx.send(new_config);
                    }
                    Err(e) => {
                        metrics::record_table_reload("rejected");
                        tracing::error!(
                            error = %e,
                            "Failed to reload config. Keeping current route table."
                        );
                    }
                },
                None => tracing::warn!("SIGHUP ignored, no configuration file"),
            },
        }
    }

    server_task.await??;
    shutdown.drain(Duration::from_secs(5)).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
