// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake compiler adapter for testing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use javelin_core::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionList, Note, PackageInfo, SourceRange,
    SymbolDesignations, SymbolInfo, TypeInfo, TypeInspectInfo,
};
use parking_lot::{Condvar, Mutex};

use super::{CompilerError, JavaCompiler, PresentationCompiler};

/// Recorded compiler interaction
#[derive(Debug, Clone, PartialEq)]
pub enum CompilerCall {
    FullTypecheck,
    ReloadAll,
    ReloadFiles(Vec<PathBuf>),
    PatchSource { file: PathBuf, text: String },
    RemoveFile(PathBuf),
    JavaReload(Vec<PathBuf>),
}

#[derive(Default)]
struct FakeCompilerState {
    calls: Vec<CompilerCall>,
    typecheck_notes: Vec<Note>,
    completions: Option<CompletionList>,
    uses: Vec<SourceRange>,
    package_members: Vec<CompletionInfo>,
    type_info: Option<TypeInfo>,
    type_inspect: Option<TypeInspectInfo>,
    symbol_info: Option<SymbolInfo>,
    package_info: Option<PackageInfo>,
    call_completion: Option<CallCompletionInfo>,
    designations: Vec<(String, i64, i64)>,
    fail_typecheck: Option<String>,
    hold_typecheck: bool,
}

/// Fake compiler adapter for testing.
///
/// Records every call and serves scripted results. The initial type-check
/// can be held open so tests can observe the not-ready gate.
#[derive(Clone, Default)]
pub struct FakeCompiler {
    inner: Arc<(Mutex<FakeCompilerState>, Condvar)>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CompilerCall> {
        self.inner.0.lock().calls.clone()
    }

    /// Hold the initial type-check open until [`FakeCompiler::release_typecheck`].
    pub fn hold_typecheck(&self) {
        self.inner.0.lock().hold_typecheck = true;
    }

    /// Release a held initial type-check.
    pub fn release_typecheck(&self) {
        let mut state = self.inner.0.lock();
        state.hold_typecheck = false;
        self.inner.1.notify_all();
    }

    /// Make the initial type-check fail with the given message.
    pub fn fail_typecheck(&self, msg: &str) {
        self.inner.0.lock().fail_typecheck = Some(msg.to_string());
    }

    pub fn set_typecheck_notes(&self, notes: Vec<Note>) {
        self.inner.0.lock().typecheck_notes = notes;
    }

    pub fn set_completions(&self, list: CompletionList) {
        self.inner.0.lock().completions = Some(list);
    }

    pub fn set_uses(&self, uses: Vec<SourceRange>) {
        self.inner.0.lock().uses = uses;
    }

    pub fn set_package_members(&self, members: Vec<CompletionInfo>) {
        self.inner.0.lock().package_members = members;
    }

    pub fn set_type_info(&self, info: TypeInfo) {
        self.inner.0.lock().type_info = Some(info);
    }

    pub fn set_type_inspect(&self, info: TypeInspectInfo) {
        self.inner.0.lock().type_inspect = Some(info);
    }

    pub fn set_symbol_info(&self, info: SymbolInfo) {
        self.inner.0.lock().symbol_info = Some(info);
    }

    pub fn set_package_info(&self, info: PackageInfo) {
        self.inner.0.lock().package_info = Some(info);
    }

    pub fn set_call_completion(&self, info: CallCompletionInfo) {
        self.inner.0.lock().call_completion = Some(info);
    }

    /// Script designations as (kind, start, end) triples.
    pub fn set_designations(&self, designations: Vec<(String, i64, i64)>) {
        self.inner.0.lock().designations = designations;
    }

    fn record(&self, call: CompilerCall) {
        self.inner.0.lock().calls.push(call);
    }
}

impl PresentationCompiler for FakeCompiler {
    fn full_typecheck(&self) -> Result<Vec<Note>, CompilerError> {
        self.record(CompilerCall::FullTypecheck);
        let mut state = self.inner.0.lock();
        while state.hold_typecheck {
            self.inner.1.wait(&mut state);
        }
        if let Some(msg) = state.fail_typecheck.clone() {
            return Err(CompilerError::CompileFailed(msg));
        }
        Ok(state.typecheck_notes.clone())
    }

    fn reload_all(&self) -> Result<(), CompilerError> {
        self.record(CompilerCall::ReloadAll);
        Ok(())
    }

    fn reload_files(&self, files: &[PathBuf]) -> Result<(), CompilerError> {
        self.record(CompilerCall::ReloadFiles(files.to_vec()));
        Ok(())
    }

    fn patch_source(&self, file: &Path, text: &str) -> Result<(), CompilerError> {
        self.record(CompilerCall::PatchSource {
            file: file.to_path_buf(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn remove_file(&self, file: &Path) {
        self.record(CompilerCall::RemoveFile(file.to_path_buf()));
    }

    fn completions_at(
        &self,
        _file: &Path,
        _point: i64,
        max_results: usize,
        _case_sensitive: bool,
    ) -> CompletionList {
        let state = self.inner.0.lock();
        let mut list = state.completions.clone().unwrap_or(CompletionList {
            prefix: String::new(),
            completions: Vec::new(),
        });
        if max_results > 0 {
            list.completions.truncate(max_results);
        }
        list
    }

    fn uses_of_sym_at(&self, _file: &Path, _point: i64) -> Vec<SourceRange> {
        self.inner.0.lock().uses.clone()
    }

    fn package_member_completion(&self, _path: &str, prefix: &str) -> Vec<CompletionInfo> {
        self.inner
            .0
            .lock()
            .package_members
            .iter()
            .filter(|m| m.name.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn type_at_point(&self, _file: &Path, _point: i64) -> Option<TypeInfo> {
        self.inner.0.lock().type_info.clone()
    }

    fn type_by_id(&self, id: i64) -> Option<TypeInfo> {
        self.inner.0.lock().type_info.clone().filter(|t| t.id == id)
    }

    fn type_by_name(&self, name: &str) -> Option<TypeInfo> {
        self.inner
            .0
            .lock()
            .type_info
            .clone()
            .filter(|t| t.full_name == name)
    }

    fn symbol_at_point(&self, _file: &Path, _point: i64) -> Option<SymbolInfo> {
        self.inner.0.lock().symbol_info.clone()
    }

    fn inspect_type_at_point(&self, _file: &Path, _point: i64) -> Option<TypeInspectInfo> {
        self.inner.0.lock().type_inspect.clone()
    }

    fn inspect_type_by_id(&self, _id: i64) -> Option<TypeInspectInfo> {
        self.inner.0.lock().type_inspect.clone()
    }

    fn inspect_package_by_path(&self, _path: &str) -> Option<PackageInfo> {
        self.inner.0.lock().package_info.clone()
    }

    fn call_completion(&self, _id: i64) -> Option<CallCompletionInfo> {
        self.inner.0.lock().call_completion.clone()
    }

    fn symbol_designations(
        &self,
        file: &Path,
        start: i64,
        end: i64,
        kinds: &[String],
    ) -> SymbolDesignations {
        let designations = self
            .inner
            .0
            .lock()
            .designations
            .iter()
            .filter(|(kind, s, e)| kinds.contains(kind) && *s >= start && *e <= end)
            .map(|(kind, s, e)| javelin_core::semantic::SymbolDesignation {
                kind: kind.clone(),
                start: *s,
                end: *e,
            })
            .collect();
        SymbolDesignations {
            file: file.to_path_buf(),
            designations,
        }
    }
}

impl JavaCompiler for FakeCompiler {
    fn reload_files(&self, files: &[PathBuf]) -> Result<Vec<Note>, CompilerError> {
        self.record(CompilerCall::JavaReload(files.to_vec()));
        Ok(Vec::new())
    }
}
