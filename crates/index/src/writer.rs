// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dedicated writer actor of the build pipeline.
//!
//! The classpath walker enqueues events on a bounded mailbox as fast as the
//! disk permits; the writer drains sequentially. A stop event commits the
//! batch (stamping the user metadata) and acks, unblocking `initialize`.

use javelin_core::symbol::SymbolSearchResult;
use tantivy::{IndexWriter, Term};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::metadata::IndexUserMetadata;
use crate::store::{document_of, Fields, IndexError};

/// Mailbox bound between the walker and the writer.
pub const WRITER_MAILBOX: usize = 1024;

/// An event on the writer mailbox.
pub enum IndexWriteEvent {
    Insert(SymbolSearchResult),
    Remove(String),
    /// Commit everything written so far and acknowledge.
    Stop(oneshot::Sender<()>),
}

/// Drain the mailbox into the index writer. Blocking; run on a blocking
/// task. Returns the writer so the caller can restore it.
pub fn run_writer(
    mut writer: IndexWriter,
    fields: Fields,
    mut rx: mpsc::Receiver<IndexWriteEvent>,
    metadata: IndexUserMetadata,
) -> (IndexWriter, Result<(), IndexError>) {
    let mut written: u64 = 0;
    let result = loop {
        let Some(event) = rx.blocking_recv() else {
            // Walker dropped the channel without a stop; leave the batch
            // uncommitted so a retry starts clean.
            break Ok(());
        };
        match event {
            IndexWriteEvent::Insert(result) => {
                writer.delete_term(Term::from_field_text(fields.name, result.name()));
                if let Err(e) = writer.add_document(document_of(&fields, &result)) {
                    break Err(IndexError::Tantivy(e));
                }
                written += 1;
            }
            IndexWriteEvent::Remove(name) => {
                writer.delete_term(Term::from_field_text(fields.name, &name));
            }
            IndexWriteEvent::Stop(ack) => {
                let committed = (|| -> Result<(), IndexError> {
                    let mut prepared = writer.prepare_commit()?;
                    prepared.set_payload(&metadata.to_json());
                    prepared.commit()?;
                    Ok(())
                })();
                debug!(written, "index writer stopping");
                let _ = ack.send(());
                break committed;
            }
        }
    };
    (writer, result)
}
