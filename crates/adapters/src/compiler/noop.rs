// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op compiler adapter.
//!
//! Stands in for both compilers when the server runs without a compiler
//! backend attached (source-load disabled, or headless index-only runs).

use std::path::{Path, PathBuf};

use javelin_core::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionList, Note, PackageInfo, SourceRange,
    SymbolDesignations, SymbolInfo, TypeInfo, TypeInspectInfo,
};

use super::{CompilerError, JavaCompiler, PresentationCompiler};

/// Compiler adapter that accepts everything and knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompiler;

impl PresentationCompiler for NoopCompiler {
    fn full_typecheck(&self) -> Result<Vec<Note>, CompilerError> {
        Ok(Vec::new())
    }

    fn reload_all(&self) -> Result<(), CompilerError> {
        Ok(())
    }

    fn reload_files(&self, _files: &[PathBuf]) -> Result<(), CompilerError> {
        Ok(())
    }

    fn patch_source(&self, _file: &Path, _text: &str) -> Result<(), CompilerError> {
        Ok(())
    }

    fn remove_file(&self, _file: &Path) {}

    fn completions_at(
        &self,
        _file: &Path,
        _point: i64,
        _max_results: usize,
        _case_sensitive: bool,
    ) -> CompletionList {
        CompletionList {
            prefix: String::new(),
            completions: Vec::new(),
        }
    }

    fn uses_of_sym_at(&self, _file: &Path, _point: i64) -> Vec<SourceRange> {
        Vec::new()
    }

    fn package_member_completion(&self, _path: &str, _prefix: &str) -> Vec<CompletionInfo> {
        Vec::new()
    }

    fn type_at_point(&self, _file: &Path, _point: i64) -> Option<TypeInfo> {
        None
    }

    fn type_by_id(&self, _id: i64) -> Option<TypeInfo> {
        None
    }

    fn type_by_name(&self, _name: &str) -> Option<TypeInfo> {
        None
    }

    fn symbol_at_point(&self, _file: &Path, _point: i64) -> Option<SymbolInfo> {
        None
    }

    fn inspect_type_at_point(&self, _file: &Path, _point: i64) -> Option<TypeInspectInfo> {
        None
    }

    fn inspect_type_by_id(&self, _id: i64) -> Option<TypeInspectInfo> {
        None
    }

    fn inspect_package_by_path(&self, _path: &str) -> Option<PackageInfo> {
        None
    }

    fn call_completion(&self, _id: i64) -> Option<CallCompletionInfo> {
        None
    }

    fn symbol_designations(
        &self,
        file: &Path,
        _start: i64,
        _end: i64,
        _kinds: &[String],
    ) -> SymbolDesignations {
        SymbolDesignations {
            file: file.to_path_buf(),
            designations: Vec::new(),
        }
    }
}

impl JavaCompiler for NoopCompiler {
    fn reload_files(&self, _files: &[PathBuf]) -> Result<Vec<Note>, CompilerError> {
        Ok(Vec::new())
    }
}
