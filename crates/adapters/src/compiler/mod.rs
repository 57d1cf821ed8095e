// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiler adapters.
//!
//! The presentation compiler and the Java compiler are external
//! collaborators; the Analyzer only sees these traits. Requests run on the
//! Analyzer's actor task and must complete, so the methods are synchronous.

mod noop;

pub use noop::NoopCompiler;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CompilerCall, FakeCompiler};

use std::path::Path;
use std::path::PathBuf;

use javelin_core::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionList, Note, PackageInfo, SourceRange,
    SymbolDesignations, SymbolInfo, TypeInfo, TypeInspectInfo,
};
use thiserror::Error;

/// Errors from compiler operations
#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("compiler crashed: {0}")]
    Crashed(String),

    #[error("compile failed: {0}")]
    CompileFailed(String),
}

/// The incremental type-checker behind most semantic requests.
pub trait PresentationCompiler: Send + Sync + 'static {
    /// Run the initial full type-check. Called once, on a background task.
    fn full_typecheck(&self) -> Result<Vec<Note>, CompilerError>;

    /// Re-kick a full reload of every known source.
    fn reload_all(&self) -> Result<(), CompilerError>;

    /// Reload the given sources from disk.
    fn reload_files(&self, files: &[PathBuf]) -> Result<(), CompilerError>;

    /// Replace one source's contents with an edited text.
    fn patch_source(&self, file: &Path, text: &str) -> Result<(), CompilerError>;

    /// Forget a source entirely.
    fn remove_file(&self, file: &Path);

    fn completions_at(
        &self,
        file: &Path,
        point: i64,
        max_results: usize,
        case_sensitive: bool,
    ) -> CompletionList;

    fn uses_of_sym_at(&self, file: &Path, point: i64) -> Vec<SourceRange>;

    fn package_member_completion(&self, path: &str, prefix: &str) -> Vec<CompletionInfo>;

    fn type_at_point(&self, file: &Path, point: i64) -> Option<TypeInfo>;

    fn type_by_id(&self, id: i64) -> Option<TypeInfo>;

    fn type_by_name(&self, name: &str) -> Option<TypeInfo>;

    fn symbol_at_point(&self, file: &Path, point: i64) -> Option<SymbolInfo>;

    fn inspect_type_at_point(&self, file: &Path, point: i64) -> Option<TypeInspectInfo>;

    fn inspect_type_by_id(&self, id: i64) -> Option<TypeInspectInfo>;

    fn inspect_package_by_path(&self, path: &str) -> Option<PackageInfo>;

    fn call_completion(&self, id: i64) -> Option<CallCompletionInfo>;

    /// Designations for a region; callers guarantee `file` is a
    /// target-language source.
    fn symbol_designations(
        &self,
        file: &Path,
        start: i64,
        end: i64,
        kinds: &[String],
    ) -> SymbolDesignations;
}

/// The batch Java compiler; only reload flows through it.
pub trait JavaCompiler: Send + Sync + 'static {
    /// Compile the given Java sources, returning their diagnostics.
    fn reload_files(&self, files: &[PathBuf]) -> Result<Vec<Note>, CompilerError>;
}
