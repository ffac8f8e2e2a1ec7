use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

use study_router::config::{load_config, ConfigError, RouterConfig};
use study_router::http::response::{route_rows, NavigationBody};
use study_router::RouteTable;
use study_router::routing::MatchOptions;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Inspect and query the study router", long_about = None)]
struct Cli {
    /// Base URL of a running navigation host.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Configuration file for offline commands. Defaults to the built-in table.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and route table
    Check,
    /// Print the compiled route table
    Routes {
        #[arg(long)]
        json: bool,
    },
    /// Resolve a path against the table without loading views
    Resolve { target: String },
    /// Navigate on a running host
    Remote { target: String },
    /// Show the view history of a running host
    History,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => match load(&cli.config) {
            Ok(config) => {
                let table = build_table(&config)?;
                println!("ok: {} routes, fallback '{}'", table.len(), table.fallback().path);
            }
            Err(ConfigError::Validation(errors)) => {
                for error in &errors {
                    eprintln!("error: {}", error);
                }
                eprintln!("{} problem(s) found", errors.len());
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        },
        Commands::Routes { json } => {
            let table = offline_table(&cli.config)?;
            let rows = route_rows(&table);
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in rows {
                    let target = match (&row.view, &row.redirect) {
                        (_, Some(redirect)) => format!("-> {}", redirect),
                        (Some(view), None) => view.clone(),
                        (None, None) => String::new(),
                    };
                    println!(
                        "{:indent$}{:<32} {:<20} {}",
                        "",
                        row.path,
                        row.name.as_deref().unwrap_or("-"),
                        target,
                        indent = row.depth * 2
                    );
                }
            }
        }
        Commands::Resolve { target } => {
            let config = load(&cli.config)?;
            let table = build_table(&config)?;
            let resolution = table.resolve(&target);
            let body =
                NavigationBody::from_resolution(&resolution, &config.navigation.default_title);
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Commands::Remote { target } => {
            let path = if target.starts_with('/') { target } else { format!("/{}", target) };
            let res = reqwest::get(format!("{}{}", cli.url.trim_end_matches('/'), path)).await?;
            print_response(res).await?;
        }
        Commands::History => {
            let url = format!("{}/_router/history", cli.url.trim_end_matches('/'));
            let res = reqwest::get(url).await?;
            print_response(res).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load(path: &Option<PathBuf>) -> Result<RouterConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(RouterConfig::default()),
    }
}

fn offline_table(path: &Option<PathBuf>) -> Result<RouteTable, ConfigError> {
    build_table(&load(path)?)
}

fn build_table(config: &RouterConfig) -> Result<RouteTable, ConfigError> {
    RouteTable::build(&config.routes, MatchOptions::from(&config.navigation))
        .map_err(ConfigError::Validation)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_server_error() {
        eprintln!("Error: host returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    // 404 still carries the not-found navigation
    if !status.is_success() {
        eprintln!("Status: {}", status);
    }
    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
