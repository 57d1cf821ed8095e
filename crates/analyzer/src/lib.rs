// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! javelin-analyzer: the semantic-analysis façade actor.
//!
//! Mediates editor requests to the presentation and Java compiler
//! adapters. Until the initial full type-check completes, every RPC aborts
//! with `analyzer-not-ready`; afterwards requests run on the actor task
//! and any failure is reported as `analyzer-exception`, never propagated.

pub mod patch;

pub use patch::{apply_edits, SourceEdit};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use javelin_adapters::compiler::{CompilerError, JavaCompiler, PresentationCompiler};
use javelin_core::event::NoteLang;
use javelin_core::msg::{RouterMsg, RpcPayload};
use javelin_core::semantic::SymbolDesignations;
use javelin_core::{ClientEvent, Note, RpcErrorKind};
use javelin_index::IndexerMsg;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Mailbox depth for the actor.
const MAILBOX: usize = 256;

/// A semantic-analysis request, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyzerReq {
    RemoveFile { file: PathBuf },
    ReloadAll,
    ReloadFiles { files: Vec<PathBuf> },
    PatchSource { file: PathBuf, edits: Vec<SourceEdit> },
    Completions {
        file: PathBuf,
        point: i64,
        max_results: usize,
        case_sensitive: bool,
        reload: bool,
    },
    UsesOfSymAtPoint { file: PathBuf, point: i64 },
    PackageMemberCompletion { path: String, prefix: String },
    InspectTypeAtPoint { file: PathBuf, point: i64 },
    InspectTypeById { id: i64 },
    SymbolAtPoint { file: PathBuf, point: i64 },
    InspectPackageByPath { path: String },
    TypeAtPoint { file: PathBuf, point: i64 },
    TypeById { id: i64 },
    TypeByName { name: String },
    TypeByNameAtPoint { name: String, file: PathBuf, point: i64 },
    CallCompletion { id: i64 },
    SymbolDesignations {
        file: PathBuf,
        start: i64,
        end: i64,
        kinds: Vec<String>,
    },
    ImportSuggestions { names: Vec<String>, limit: usize },
    PublicSymbolSearch { keywords: Vec<String>, limit: usize },
    RefactorCancel { id: i64 },
}

/// A message on the Analyzer's mailbox.
#[derive(Debug)]
pub enum AnalyzerMsg {
    Rpc { req: AnalyzerReq, call_id: i64 },
    /// The background initial compile finished.
    TypecheckDone { result: Result<Vec<Note>, String> },
}

/// The Analyzer actor.
pub struct Analyzer<P, J> {
    scala: Arc<P>,
    java: Arc<J>,
    ready: bool,
    /// Outstanding refactoring state, dropped on cancel.
    pending_refactors: HashSet<i64>,
    rx: mpsc::Receiver<AnalyzerMsg>,
    router_tx: mpsc::Sender<RouterMsg>,
    indexer_tx: mpsc::Sender<IndexerMsg>,
}

impl<P, J> Analyzer<P, J>
where
    P: PresentationCompiler,
    J: JavaCompiler,
{
    /// Spawn the actor and kick the initial full type-check on a background
    /// task. Returns the actor's mailbox.
    pub fn spawn(
        scala: Arc<P>,
        java: Arc<J>,
        router_tx: mpsc::Sender<RouterMsg>,
        indexer_tx: mpsc::Sender<IndexerMsg>,
    ) -> mpsc::Sender<AnalyzerMsg> {
        let (tx, rx) = mpsc::channel(MAILBOX);

        let compiler = Arc::clone(&scala);
        let own_tx = tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || compiler.full_typecheck())
                .await
                .map_err(|e| CompilerError::Crashed(e.to_string()))
                .and_then(|r| r)
                .map_err(|e| e.to_string());
            let _ = own_tx.send(AnalyzerMsg::TypecheckDone { result }).await;
        });

        let actor = Analyzer {
            scala,
            java,
            ready: false,
            pending_refactors: HashSet::new(),
            rx,
            router_tx,
            indexer_tx,
        };
        tokio::spawn(actor.run());
        tx
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                AnalyzerMsg::TypecheckDone { result } => self.typecheck_done(result).await,
                AnalyzerMsg::Rpc { req, call_id } => self.handle_rpc(req, call_id).await,
            }
        }
    }

    async fn typecheck_done(&mut self, result: Result<Vec<Note>, String>) {
        match result {
            Ok(notes) => {
                info!(notes = notes.len(), "initial type-check complete");
                if !notes.is_empty() {
                    self.emit(ClientEvent::CompilerNotes {
                        lang: NoteLang::Scala,
                        notes,
                    })
                    .await;
                }
                self.emit(ClientEvent::FullTypeCheckComplete).await;
                self.ready = true;
                self.emit(ClientEvent::AnalyzerReady).await;
                let _ = self.indexer_tx.send(IndexerMsg::Commit).await;
            }
            Err(e) => {
                // The gate stays closed; clients keep getting 209.
                error!(error = %e, "initial type-check failed");
            }
        }
    }

    async fn handle_rpc(&mut self, req: AnalyzerReq, call_id: i64) {
        if !self.ready {
            let _ = self
                .router_tx
                .send(RouterMsg::error(
                    call_id,
                    RpcErrorKind::AnalyzerNotReady,
                    "analyzer is not ready",
                ))
                .await;
            return;
        }

        // Forwarded requests reply through the indexer with our call-id.
        match req {
            AnalyzerReq::ImportSuggestions { names, limit } => {
                let _ = self
                    .indexer_tx
                    .send(IndexerMsg::ImportSuggestions {
                        names,
                        limit,
                        call_id,
                    })
                    .await;
                return;
            }
            AnalyzerReq::PublicSymbolSearch { keywords, limit } => {
                let _ = self
                    .indexer_tx
                    .send(IndexerMsg::KeywordSearch {
                        keywords,
                        limit,
                        types_only: false,
                        call_id,
                    })
                    .await;
                return;
            }
            other => {
                let reply = self.dispatch(other).await;
                let msg = match reply {
                    Ok(payload) => RouterMsg::RpcResult { call_id, payload },
                    Err(RequestError::FileNotFound(file)) => RouterMsg::error(
                        call_id,
                        RpcErrorKind::FileNotFound,
                        file.display().to_string(),
                    ),
                    Err(RequestError::Failed(detail)) => {
                        error!(error = %detail, "analyzer request failed");
                        RouterMsg::error(call_id, RpcErrorKind::AnalyzerException, detail)
                    }
                };
                let _ = self.router_tx.send(msg).await;
            }
        }
    }

    async fn dispatch(&mut self, req: AnalyzerReq) -> Result<RpcPayload, RequestError> {
        match req {
            AnalyzerReq::RemoveFile { file } => {
                self.scala.remove_file(&file);
                Ok(RpcPayload::True)
            }

            AnalyzerReq::ReloadAll => {
                self.scala.reload_all().map_err(RequestError::failed)?;
                Ok(RpcPayload::True)
            }

            AnalyzerReq::ReloadFiles { files } => {
                let (java, scala): (Vec<PathBuf>, Vec<PathBuf>) =
                    files.into_iter().partition(|f| is_java(f));
                if !scala.is_empty() {
                    self.scala
                        .reload_files(&scala)
                        .map_err(RequestError::failed)?;
                }
                if !java.is_empty() {
                    let notes = self
                        .java
                        .reload_files(&java)
                        .map_err(RequestError::failed)?;
                    if !notes.is_empty() {
                        self.emit(ClientEvent::CompilerNotes {
                            lang: NoteLang::Java,
                            notes,
                        })
                        .await;
                    }
                }
                Ok(RpcPayload::True)
            }

            AnalyzerReq::PatchSource { file, edits } => {
                let original = std::fs::read_to_string(&file)
                    .map_err(|_| RequestError::FileNotFound(file.clone()))?;
                let patched = apply_edits(&original, &edits);
                self.scala
                    .patch_source(&file, &patched)
                    .map_err(RequestError::failed)?;
                Ok(RpcPayload::True)
            }

            AnalyzerReq::Completions {
                file,
                point,
                max_results,
                case_sensitive,
                reload,
            } => {
                if reload {
                    self.scala
                        .reload_files(std::slice::from_ref(&file))
                        .map_err(RequestError::failed)?;
                }
                let list = self
                    .scala
                    .completions_at(&file, point, max_results, case_sensitive);
                Ok(RpcPayload::CompletionList(list))
            }

            AnalyzerReq::UsesOfSymAtPoint { file, point } => Ok(RpcPayload::SourceRanges(
                self.scala.uses_of_sym_at(&file, point),
            )),

            AnalyzerReq::PackageMemberCompletion { path, prefix } => Ok(RpcPayload::Completions(
                self.scala.package_member_completion(&path, &prefix),
            )),

            AnalyzerReq::InspectTypeAtPoint { file, point } => Ok(RpcPayload::TypeInspect(
                self.scala.inspect_type_at_point(&file, point),
            )),

            AnalyzerReq::InspectTypeById { id } => {
                Ok(RpcPayload::TypeInspect(self.scala.inspect_type_by_id(id)))
            }

            AnalyzerReq::SymbolAtPoint { file, point } => {
                Ok(RpcPayload::SymbolInfo(self.scala.symbol_at_point(&file, point)))
            }

            AnalyzerReq::InspectPackageByPath { path } => {
                Ok(RpcPayload::PackageInfo(self.scala.inspect_package_by_path(&path)))
            }

            AnalyzerReq::TypeAtPoint { file, point } => {
                Ok(RpcPayload::TypeInfo(self.scala.type_at_point(&file, point)))
            }

            AnalyzerReq::TypeById { id } => Ok(RpcPayload::TypeInfo(self.scala.type_by_id(id))),

            AnalyzerReq::TypeByName { name } => {
                Ok(RpcPayload::TypeInfo(self.scala.type_by_name(&name)))
            }

            AnalyzerReq::TypeByNameAtPoint { name, .. } => {
                Ok(RpcPayload::TypeInfo(self.scala.type_by_name(&name)))
            }

            AnalyzerReq::CallCompletion { id } => {
                Ok(RpcPayload::CallCompletion(self.scala.call_completion(id)))
            }

            AnalyzerReq::SymbolDesignations {
                file,
                start,
                end,
                kinds,
            } => {
                let designations = if is_scala(&file) {
                    self.scala.symbol_designations(&file, start, end, &kinds)
                } else {
                    SymbolDesignations {
                        file,
                        designations: Vec::new(),
                    }
                };
                Ok(RpcPayload::SymbolDesignations(designations))
            }

            AnalyzerReq::RefactorCancel { id } => {
                self.pending_refactors.remove(&id);
                Ok(RpcPayload::True)
            }

            // Handled before dispatch.
            AnalyzerReq::ImportSuggestions { .. } | AnalyzerReq::PublicSymbolSearch { .. } => {
                Err(RequestError::Failed("unroutable request".to_string()))
            }
        }
    }

    async fn emit(&self, event: ClientEvent) {
        let _ = self.router_tx.send(RouterMsg::Async(event)).await;
    }
}

enum RequestError {
    FileNotFound(PathBuf),
    Failed(String),
}

impl RequestError {
    fn failed(e: impl std::fmt::Display) -> RequestError {
        RequestError::Failed(e.to_string())
    }
}

fn is_java(file: &Path) -> bool {
    file.extension().is_some_and(|ext| ext == "java")
}

fn is_scala(file: &Path) -> bool {
    file.extension().is_some_and(|ext| ext == "scala")
}

#[cfg(test)]
#[path = "analyzer_tests.rs"]
mod tests;
