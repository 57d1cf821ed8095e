// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Basename-to-files index for breakpoint resolution.
//!
//! The debug wire only names sources by their unqualified file name; this
//! map resolves those back to canonical project files. Rebuilt whenever
//! project sources change.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Map from unqualified file name to the canonical source files bearing it.
#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    by_basename: HashMap<String, BTreeSet<PathBuf>>,
}

impl SourceMap {
    /// Index every source file under the given roots.
    pub fn build(source_roots: &[PathBuf]) -> SourceMap {
        let mut map = SourceMap::default();
        for root in source_roots {
            for entry in walkdir::WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                let is_source = entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "scala" || ext == "java");
                if is_source {
                    map.add(entry.path());
                }
            }
        }
        map
    }

    pub fn add(&mut self, file: &Path) {
        if let Some(basename) = file.file_name() {
            self.by_basename
                .entry(basename.to_string_lossy().into_owned())
                .or_default()
                .insert(file.to_path_buf());
        }
    }

    pub fn lookup(&self, basename: &str) -> Option<&BTreeSet<PathBuf>> {
        self.by_basename.get(basename)
    }

    /// Canonical file for a wire source name, falling back to the raw
    /// source path the class file recorded.
    pub fn canonicalize(&self, source_name: &str, source_path: &str) -> PathBuf {
        self.lookup(source_name)
            .and_then(|files| files.iter().next().cloned())
            .unwrap_or_else(|| PathBuf::from(source_path))
    }
}

#[cfg(test)]
#[path = "source_map_tests.rs"]
mod tests;
