// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Javelin daemon (javelind)
//!
//! Backend of the editor-integrated assistant: binds a local socket,
//! advertises the port via a port file, and serves analysis, index and
//! debug RPCs over the framed s-expression protocol.
//!
//! Architecture:
//! - Project router: owns the client socket, correlates call-ids
//! - Analyzer / Indexer / Debug controller: independent actors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::path::PathBuf;

use javelin_core::Config;
use javelin_daemon::{cleanup, lifecycle, startup, DaemonPaths};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Configuration file name at the project root.
const CONFIG_FILE: &str = ".javelin";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut project_root = std::env::current_dir()?;
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("javelind {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("javelind {}", env!("CARGO_PKG_VERSION"));
                println!("Javelin daemon - editor-integrated analysis and debug backend");
                println!();
                println!("USAGE:");
                println!("    javelind [project-root]");
                println!();
                println!("Reads `{CONFIG_FILE}` at the project root, binds a local TCP");
                println!("socket and advertises the chosen port in the cache directory's");
                println!("port file. The editor client connects there.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            path => project_root = PathBuf::from(path),
        }
    }

    // Load configuration (immutable afterwards).
    let config_path = project_root.join(CONFIG_FILE);
    let config = Config::load(&config_path)?;
    let paths = DaemonPaths::resolve(&config)?;

    std::fs::create_dir_all(&paths.cache_dir)?;
    rotate_log_if_needed(&paths.log_path);
    let log_guard = setup_logging(&paths)?;

    info!(root = %config.root_dir.display(), "starting daemon");

    let started = match startup(&config, &paths).await {
        Ok(started) => started,
        Err(lifecycle::LifecycleError::LockFailed(_)) => {
            eprintln!("javelind is already running for this project");
            if let Ok(port) = std::fs::read_to_string(&paths.port_file) {
                eprintln!("  port: {}", port.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    info!(port = started.port, "daemon ready");
    // Signal ready for the parent process (editor waiting for startup).
    println!("READY {}", started.port);

    let shutdown = std::sync::Arc::clone(&started.shutdown);
    let router = tokio::spawn(started.router.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = router => {
            info!("router stopped");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
            shutdown.notify_one();
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
            shutdown.notify_one();
        }
    }

    cleanup(&paths);
    info!("daemon stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    paths: &DaemonPaths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let file_appender = tracing_appender::rolling::never(
        &paths.cache_dir,
        paths
            .log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
