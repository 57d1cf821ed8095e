// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk symbol index.
//!
//! One document per symbol: analyzed `tags`/`localNameTags` fields feed the
//! keyword queries, stored fields reconstruct the result, and a fast
//! `nameLen` field backs the 1/length relevance tweak. User metadata rides
//! on the commit payload so it is atomic with the writes.

use std::path::{Path, PathBuf};

use javelin_core::symbol::{DeclaredAs, MethodSymbol, SourcePosition, SymbolSearchResult, TypeSymbol};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST, STORED, STRING,
};
use tantivy::tokenizer::WhitespaceTokenizer;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use thiserror::Error;
use tracing::info;

use crate::metadata::IndexUserMetadata;
use crate::tokenizer::tokenize;

/// Errors from index operations
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("invalid filter pattern: {0}")]
    BadPattern(String),

    #[error("index writer is busy")]
    WriterBusy,

    #[error("index build timed out")]
    BuildTimeout,
}

/// Name of the analyzer registered for the tokenized fields. The fields are
/// pre-tokenized by [`tokenize`], so the analyzer only splits on whitespace.
const SYMBOL_TOKENIZER: &str = "symbol_whitespace";

/// Document discriminator values.
pub const DOC_TYPE_TYPE: &str = "type";
pub const DOC_TYPE_METHOD: &str = "method";

/// Heap the index writer may use before flushing a segment.
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Schema handles for the symbol documents.
#[derive(Debug, Clone, Copy)]
pub struct Fields {
    pub tags: Field,
    pub local_name_tags: Field,
    pub doc_type: Field,
    pub name: Field,
    pub local_name: Field,
    pub decl_as: Field,
    pub file: Field,
    pub offset: Field,
    pub owner: Field,
    pub name_len: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder = Schema::builder();
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(SYMBOL_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqs);
    let analyzed = TextOptions::default().set_indexing_options(indexing);

    let fields = Fields {
        tags: builder.add_text_field("tags", analyzed.clone()),
        local_name_tags: builder.add_text_field("localNameTags", analyzed),
        doc_type: builder.add_text_field("docType", STRING | STORED),
        name: builder.add_text_field("name", STRING | STORED),
        local_name: builder.add_text_field("localName", STORED),
        decl_as: builder.add_text_field("declAs", STORED),
        file: builder.add_text_field("file", STORED),
        offset: builder.add_i64_field("offset", STORED),
        owner: builder.add_text_field("owner", STORED),
        name_len: builder.add_u64_field("nameLen", FAST),
    };
    (builder.build(), fields)
}

/// Open (or create) the symbol index directory.
pub struct SymbolIndex {
    index: Index,
    writer: Option<IndexWriter>,
    reader: IndexReader,
    fields: Fields,
    path: PathBuf,
}

impl SymbolIndex {
    /// Open the index at `path`, creating it when missing. A directory that
    /// cannot be opened (stale lock, corrupt meta) is rebuilt rather than
    /// reported.
    pub fn open(path: &Path) -> Result<SymbolIndex, IndexError> {
        let (schema, fields) = build_schema();
        std::fs::create_dir_all(path)?;
        let index = match Index::open_in_dir(path) {
            Ok(index) => index,
            Err(e) => {
                info!(path = %path.display(), error = %e, "unusable index directory, rebuilding");
                std::fs::remove_dir_all(path)?;
                std::fs::create_dir_all(path)?;
                Index::create_in_dir(path, schema)?
            }
        };
        index
            .tokenizers()
            .register(SYMBOL_TOKENIZER, WhitespaceTokenizer::default());
        let writer = index.writer(WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(SymbolIndex {
            index,
            writer: Some(writer),
            reader,
            fields,
            path: path.to_path_buf(),
        })
    }

    /// Tear down the on-disk directory and start over empty.
    pub fn rebuild(self) -> Result<SymbolIndex, IndexError> {
        let path = self.path.clone();
        drop(self);
        std::fs::remove_dir_all(&path)?;
        SymbolIndex::open(&path)
    }

    pub fn fields(&self) -> Fields {
        self.fields
    }

    pub fn searcher(&self) -> tantivy::Searcher {
        self.reader.searcher()
    }

    /// User metadata of the last commit, when present.
    pub fn metadata(&self) -> Option<IndexUserMetadata> {
        let metas = self.index.load_metas().ok()?;
        IndexUserMetadata::from_json(metas.payload.as_deref()?)
    }

    /// Upsert one symbol by its unique `name` term.
    pub fn insert(&mut self, result: &SymbolSearchResult) -> Result<(), IndexError> {
        let fields = self.fields;
        let writer = self.writer.as_mut().ok_or(IndexError::WriterBusy)?;
        writer.delete_term(Term::from_field_text(fields.name, result.name()));
        writer.add_document(document_of(&fields, result))?;
        Ok(())
    }

    /// Delete by exact `name`.
    pub fn remove(&mut self, name: &str) -> Result<(), IndexError> {
        let fields = self.fields;
        let writer = self.writer.as_mut().ok_or(IndexError::WriterBusy)?;
        writer.delete_term(Term::from_field_text(fields.name, name));
        Ok(())
    }

    /// Flush outstanding writes, stamping `metadata` on the commit, then
    /// refresh the reader.
    pub fn commit(&mut self, metadata: &IndexUserMetadata) -> Result<(), IndexError> {
        let writer = self.writer.as_mut().ok_or(IndexError::WriterBusy)?;
        let mut prepared = writer.prepare_commit()?;
        prepared.set_payload(&metadata.to_json());
        prepared.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    /// Commit reusing the previous metadata (plain `commit()` operation).
    pub fn commit_keeping_metadata(&mut self) -> Result<(), IndexError> {
        let metadata = self.metadata().unwrap_or_default();
        self.commit(&metadata)
    }

    /// Hand the writer to the build pipeline; [`SymbolIndex::restore_writer`]
    /// must follow.
    pub fn take_writer(&mut self) -> Result<IndexWriter, IndexError> {
        self.writer.take().ok_or(IndexError::WriterBusy)
    }

    pub fn restore_writer(&mut self, writer: IndexWriter) -> Result<(), IndexError> {
        self.writer = Some(writer);
        self.reader.reload()?;
        Ok(())
    }

    /// Number of live documents, for diagnostics and tests.
    pub fn num_docs(&self) -> u64 {
        self.searcher().num_docs()
    }
}

/// Build the tantivy document for one symbol result.
pub fn document_of(fields: &Fields, result: &SymbolSearchResult) -> TantivyDocument {
    let mut doc = TantivyDocument::new();
    doc.add_text(fields.tags, tokenize(result.name()));
    doc.add_text(fields.local_name_tags, tokenize(result.local_name()));
    doc.add_text(fields.name, result.name());
    doc.add_text(fields.local_name, result.local_name());
    doc.add_u64(fields.name_len, result.name().len() as u64);
    doc.add_text(fields.decl_as, result.declared_as().as_str());
    if let Some(pos) = result.pos() {
        doc.add_text(fields.file, pos.file.to_string_lossy());
        doc.add_i64(fields.offset, pos.offset);
    }
    match result {
        SymbolSearchResult::Type(_) => {
            doc.add_text(fields.doc_type, DOC_TYPE_TYPE);
        }
        SymbolSearchResult::Method(method) => {
            doc.add_text(fields.doc_type, DOC_TYPE_METHOD);
            doc.add_text(fields.owner, &method.owner);
        }
    }
    doc
}

/// Reconstruct a symbol result from a stored document.
pub fn result_of(fields: &Fields, doc: &TantivyDocument) -> Option<SymbolSearchResult> {
    let text = |field: Field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let name = text(fields.name)?;
    let local_name = text(fields.local_name)?;
    let doc_type = text(fields.doc_type)?;
    let pos = match (text(fields.file), doc.get_first(fields.offset).and_then(|v| v.as_i64())) {
        (Some(file), Some(offset)) => Some(SourcePosition {
            file: PathBuf::from(file),
            offset,
        }),
        _ => None,
    };

    if doc_type == DOC_TYPE_METHOD {
        Some(SymbolSearchResult::Method(MethodSymbol {
            name,
            local_name,
            owner: text(fields.owner)?,
            pos,
        }))
    } else {
        let declared_as = match text(fields.decl_as).as_deref() {
            Some("trait") => DeclaredAs::Trait,
            Some("object") => DeclaredAs::Object,
            _ => DeclaredAs::Class,
        };
        Some(SymbolSearchResult::Type(TypeSymbol {
            name,
            local_name,
            declared_as,
            pos,
        }))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
