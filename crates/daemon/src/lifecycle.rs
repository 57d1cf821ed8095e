// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup wiring, port advertising, shutdown.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use javelin_adapters::compiler::NoopCompiler;
use javelin_adapters::vm::JdwpConnector;
use javelin_analyzer::Analyzer;
use javelin_core::Config;
use javelin_debug::DebugController;
use javelin_index::{Indexer, IndexerMsg, SymbolIndex};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tracing::info;

use crate::env::cache_dir;
use crate::router::{Router, RouterCtx};

/// Mailbox depth of the router's reply/event channel.
const ROUTER_MAILBOX: usize = 256;

/// Errors from daemon startup/shutdown
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no usable cache directory")]
    NoCacheDir,

    #[error("another instance holds the lock")]
    LockFailed(std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] javelin_core::ConfigError),

    #[error("index error: {0}")]
    Index(#[from] javelin_index::IndexError),
}

/// Filesystem layout of one daemon instance.
#[derive(Debug, Clone)]
pub struct DaemonPaths {
    /// Cache root for this project (hash of its root path).
    pub cache_dir: PathBuf,
    /// Index directory, exclusively owned by the indexer actor.
    pub index_dir: PathBuf,
    /// Advertises the chosen TCP port.
    pub port_file: PathBuf,
    /// Single-instance lock.
    pub lock_path: PathBuf,
    /// Daemon log file.
    pub log_path: PathBuf,
}

impl DaemonPaths {
    /// Resolve the per-project cache layout.
    pub fn resolve(config: &Config) -> Result<DaemonPaths, LifecycleError> {
        let key = sanitize(&config.root_dir.to_string_lossy());
        let cache_dir = cache_dir()?.join(key);
        Ok(DaemonPaths {
            index_dir: cache_dir.join("index"),
            port_file: cache_dir.join("port"),
            lock_path: cache_dir.join("daemon.lock"),
            log_path: cache_dir.join("daemon.log"),
            cache_dir,
        })
    }
}

fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Result of daemon startup: the router to run and the port it serves on.
pub struct StartupResult {
    pub router: Router,
    pub port: u16,
    pub shutdown: Arc<Notify>,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Wire the component actors, bind the socket, advertise the port.
pub async fn startup(
    config: &Config,
    paths: &DaemonPaths,
) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&paths.cache_dir)?;

    let lock_file = File::create(&paths.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    let (router_tx, router_rx) = mpsc::channel(ROUTER_MAILBOX);

    // Indexer owns the on-disk index exclusively.
    let index = SymbolIndex::open(&paths.index_dir)?;
    let indexer_tx = Indexer::spawn(index, router_tx.clone());

    // The compilers are external collaborators; the daemon wires the no-op
    // adapter until one is attached.
    let compiler = Arc::new(NoopCompiler);
    let analyzer_tx = Analyzer::spawn(
        Arc::clone(&compiler),
        compiler,
        router_tx.clone(),
        indexer_tx.clone(),
    );

    let debug_tx = DebugController::spawn(
        JdwpConnector,
        config.source_roots.clone(),
        router_tx.clone(),
    );

    if config.index_on_startup {
        let _ = indexer_tx
            .send(IndexerMsg::Initialize {
                classpath: config.index_classpath(),
                includes: config.only_include_in_index.clone(),
                excludes: config.exclude_from_index.clone(),
            })
            .await;
    } else {
        info!("index-on-startup disabled");
    }

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    write_port_file(&paths.port_file, port)?;
    info!(port, "listening");

    let shutdown = Arc::new(Notify::new());
    let router = Router::new(
        listener,
        router_rx,
        RouterCtx {
            analyzer_tx,
            debug_tx,
            shutdown: Arc::clone(&shutdown),
        },
    );

    Ok(StartupResult {
        router,
        port,
        shutdown,
        lock_file,
    })
}

fn write_port_file(path: &std::path::Path, port: u16) -> Result<(), LifecycleError> {
    let mut file = File::create(path)?;
    writeln!(file, "{port}")?;
    Ok(())
}

/// Remove the advertised port on the way out; best-effort.
pub fn cleanup(paths: &DaemonPaths) {
    let _ = std::fs::remove_file(&paths.port_file);
}
