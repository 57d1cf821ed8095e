// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Indexer actor.
//!
//! Owns the index directory exclusively and processes its mailbox
//! sequentially. `Initialize` decides whether to re-index, runs the
//! walker/writer pipeline when it must, and announces readiness; queries
//! reply through the router with the caller's call-id.

use std::path::PathBuf;
use std::time::Duration;

use javelin_core::msg::{RouterMsg, RpcPayload};
use javelin_core::symbol::SymbolSearchResult;
use javelin_core::{ClientEvent, RpcErrorKind};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

use crate::classpath::ClasspathScanner;
use crate::metadata::{hash_classpath, should_reindex, IndexUserMetadata};
use crate::search::{import_suggestions, keyword_search};
use crate::store::{IndexError, SymbolIndex};
use crate::writer::{run_writer, IndexWriteEvent, WRITER_MAILBOX};

/// Upper bound on one initialization attempt.
const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(3 * 60 * 60);

/// Mailbox depth for the actor itself.
const MAILBOX: usize = 256;

/// A message on the Indexer's mailbox.
#[derive(Debug)]
pub enum IndexerMsg {
    /// Decide whether to re-index; rebuild when needed; announce readiness.
    Initialize {
        classpath: Vec<PathBuf>,
        includes: Vec<String>,
        excludes: Vec<String>,
    },
    /// Upsert one symbol by its unique name.
    Insert(SymbolSearchResult),
    /// Delete by exact name.
    Remove(String),
    /// Flush outstanding writes and refresh the reader.
    Commit,
    KeywordSearch {
        keywords: Vec<String>,
        limit: usize,
        types_only: bool,
        call_id: i64,
    },
    ImportSuggestions {
        names: Vec<String>,
        limit: usize,
        call_id: i64,
    },
}

/// The Indexer actor.
pub struct Indexer {
    index: Option<SymbolIndex>,
    rx: mpsc::Receiver<IndexerMsg>,
    router_tx: mpsc::Sender<RouterMsg>,
}

impl Indexer {
    pub fn new(
        index: SymbolIndex,
        rx: mpsc::Receiver<IndexerMsg>,
        router_tx: mpsc::Sender<RouterMsg>,
    ) -> Indexer {
        Indexer {
            index: Some(index),
            rx,
            router_tx,
        }
    }

    /// Spawn the actor, returning its mailbox.
    pub fn spawn(index: SymbolIndex, router_tx: mpsc::Sender<RouterMsg>) -> mpsc::Sender<IndexerMsg> {
        let (tx, rx) = mpsc::channel(MAILBOX);
        tokio::spawn(Indexer::new(index, rx, router_tx).run());
        tx
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            self.handle(msg).await;
        }
    }

    async fn handle(&mut self, msg: IndexerMsg) {
        match msg {
            IndexerMsg::Initialize {
                classpath,
                includes,
                excludes,
            } => match self.initialize(classpath, includes, excludes).await {
                Ok(rebuilt) => {
                    info!(rebuilt, "index ready");
                    let _ = self.router_tx.send(RouterMsg::Async(ClientEvent::IndexerReady)).await;
                }
                Err(e) => error!(error = %e, "index initialization failed"),
            },

            IndexerMsg::Insert(result) => {
                if let Some(index) = self.index.as_mut() {
                    if let Err(e) = index.insert(&result) {
                        error!(error = %e, name = result.name(), "index insert failed");
                    }
                }
            }

            IndexerMsg::Remove(name) => {
                if let Some(index) = self.index.as_mut() {
                    if let Err(e) = index.remove(&name) {
                        error!(error = %e, name, "index remove failed");
                    }
                }
            }

            IndexerMsg::Commit => {
                if let Some(index) = self.index.as_mut() {
                    if let Err(e) = index.commit_keeping_metadata() {
                        error!(error = %e, "index commit failed");
                    }
                }
            }

            IndexerMsg::KeywordSearch {
                keywords,
                limit,
                types_only,
                call_id,
            } => {
                let reply = match self.index.as_ref() {
                    Some(index) => keyword_search(index, &keywords, limit, types_only),
                    None => Ok(Vec::new()),
                };
                self.reply(call_id, reply.map(RpcPayload::SymbolSearchResults))
                    .await;
            }

            IndexerMsg::ImportSuggestions {
                names,
                limit,
                call_id,
            } => {
                let reply = match self.index.as_ref() {
                    Some(index) => import_suggestions(index, &names, limit),
                    None => Ok(names.iter().map(|_| Vec::new()).collect()),
                };
                self.reply(call_id, reply.map(RpcPayload::ImportSuggestions))
                    .await;
            }
        }
    }

    async fn reply(&self, call_id: i64, result: Result<RpcPayload, IndexError>) {
        let msg = match result {
            Ok(payload) => RouterMsg::RpcResult { call_id, payload },
            Err(e) => RouterMsg::error(call_id, RpcErrorKind::IndexerException, e.to_string()),
        };
        let _ = self.router_tx.send(msg).await;
    }

    /// The re-index decision and, when it bites, the full rebuild pipeline.
    ///
    /// Returns whether a rebuild ran. Blocks this actor until the writer
    /// acknowledges the final stop event (bounded by [`INITIALIZE_TIMEOUT`]).
    async fn initialize(
        &mut self,
        classpath: Vec<PathBuf>,
        includes: Vec<String>,
        excludes: Vec<String>,
    ) -> Result<bool, IndexError> {
        let scanner = ClasspathScanner::new(&includes, &excludes)?;

        let hash_input = classpath.clone();
        let proposed =
            tokio::task::spawn_blocking(move || hash_classpath(&hash_input))
                .await
                .map_err(|_| IndexError::BuildTimeout)?;

        let index = self.index.take().ok_or(IndexError::WriterBusy)?;
        if !should_reindex(index.metadata().as_ref(), &proposed) {
            info!("index is current, skipping rebuild");
            self.index = Some(index);
            return Ok(false);
        }

        let mut index = index.rebuild()?;
        let fields = index.fields();
        let writer = index.take_writer()?;
        let metadata = IndexUserMetadata::current(proposed);

        let (event_tx, event_rx) = mpsc::channel(WRITER_MAILBOX);
        let writer_task =
            tokio::task::spawn_blocking(move || run_writer(writer, fields, event_rx, metadata));

        let (ack_tx, ack_rx) = oneshot::channel();
        let walker = tokio::task::spawn_blocking(move || {
            for entry in &classpath {
                if let Err(e) = scanner.scan(entry, &mut |result| {
                    let _ = event_tx.blocking_send(IndexWriteEvent::Insert(result));
                }) {
                    error!(entry = %entry.display(), error = %e, "classpath scan failed");
                }
            }
            let _ = event_tx.blocking_send(IndexWriteEvent::Stop(ack_tx));
        });

        // Block until the writer acknowledges the stop event.
        let ack = tokio::time::timeout(INITIALIZE_TIMEOUT, ack_rx).await;
        let _ = walker.await;
        let (writer, write_result) = writer_task
            .await
            .map_err(|_| IndexError::BuildTimeout)?;
        index.restore_writer(writer)?;
        self.index = Some(index);

        write_result?;
        match ack {
            Ok(Ok(())) => Ok(true),
            Ok(Err(_)) => Err(IndexError::BuildTimeout),
            Err(_) => Err(IndexError::BuildTimeout),
        }
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
