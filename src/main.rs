//! Host process: wires the config store, vault store, engine, and
//! watcher together behind a minimal command-line surface.

use archivist::watch::{self, DEFAULT_SETTLE_DELAY};
use archivist::{ArchiveConfig, ArchiveEngine, ConfigStore, VaultStore};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: archivist <scan|watch> <vault-path> [--config <file>] [--dry-run]");
}

struct Args {
    command: String,
    vault: PathBuf,
    config_dir: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let command = args.next().ok_or("missing command")?;
    let vault = PathBuf::from(args.next().ok_or("missing vault path")?);

    let mut config_dir = None;
    let mut dry_run = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let dir = args.next().ok_or("--config requires a path")?;
                config_dir = Some(PathBuf::from(dir));
            }
            "--dry-run" => dry_run = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
    }

    Ok(Args {
        command,
        vault,
        config_dir,
        dry_run,
    })
}

fn load_config(config_dir: Option<PathBuf>, dry_run: bool) -> Result<ArchiveConfig, String> {
    let store = match config_dir {
        Some(dir) => ConfigStore::with_base_dir(dir),
        None => ConfigStore::new()?,
    };
    let mut config = store.load()?;
    if dry_run {
        config.dry_run = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    // Initialize tracing with RUST_LOG env filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,archivist=info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(2);
        }
    };

    let config = match load_config(args.config_dir, args.dry_run) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };

    let store = match VaultStore::new(args.vault) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(1);
        }
    };
    let engine = Arc::new(ArchiveEngine::new(store, &config));

    match args.command.as_str() {
        "scan" => {
            let summary = match tokio::task::spawn_blocking({
                let engine = Arc::clone(&engine);
                move || engine.scan_all()
            })
            .await
            {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::error!("Scan task failed: {}", e);
                    process::exit(1);
                }
            };

            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::error!("Failed to render summary: {}", e),
            }
            if !summary.success() {
                process::exit(1);
            }
        }
        "watch" => {
            let handle = watch::create_watcher_handle();
            if let Err(e) = watch::start_watcher(handle.clone(), engine, DEFAULT_SETTLE_DELAY) {
                tracing::error!("{}", e);
                process::exit(1);
            }

            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
            let _ = watch::stop_watcher(handle);
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            process::exit(2);
        }
    }
}
