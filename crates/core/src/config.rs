// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration: a single keyword-map s-expression at the project
//! root, immutable after load.
//!
//! Multi-module projects nest module plists under `:subprojects`; when
//! `:active-subproject` names one, list-valued keys concatenate, scalar keys
//! are overridden by the subproject, and modules named in
//! `:depends-on-modules` are merged transitively.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::sexp::{Sexp, SexpError};

/// Errors from loading or interpreting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Sexp(#[from] SexpError),

    #[error("config is not a keyword map")]
    NotAPlist,

    #[error("active subproject not found: {0}")]
    UnknownSubproject(String),
}

/// Immutable project configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub root_dir: PathBuf,
    pub name: String,
    pub package: String,
    pub module_name: Option<String>,
    pub version: Option<String>,
    pub source_roots: Vec<PathBuf>,
    pub reference_source_roots: Vec<PathBuf>,
    pub compile_deps: Vec<PathBuf>,
    pub compile_jars: Vec<PathBuf>,
    pub runtime_deps: Vec<PathBuf>,
    pub runtime_jars: Vec<PathBuf>,
    pub test_deps: Vec<PathBuf>,
    pub target: Option<PathBuf>,
    pub test_target: Option<PathBuf>,
    /// Inverse of `:disable-index-on-startup`.
    pub index_on_startup: bool,
    /// Inverse of `:disable-source-load-on-startup`.
    pub source_load_on_startup: bool,
    /// Inverse of `:disable-scala-jars-on-classpath`.
    pub include_stdlib_jars: bool,
    /// Regular expressions; when non-empty, only matching names are indexed.
    pub only_include_in_index: Vec<String>,
    /// Regular expressions; matching names are never indexed.
    pub exclude_from_index: Vec<String>,
    pub compiler_args: Vec<String>,
    pub builder_args: Vec<String>,
    pub java_compiler_args: Vec<String>,
    pub java_compiler_version: Option<String>,
    /// Opaque preferences handed to the external formatter.
    pub formatting_prefs: Vec<(String, Sexp)>,
}

impl Config {
    /// Read and interpret the configuration file at `path`.
    ///
    /// `:root-dir` defaults to the file's parent directory.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let sexp = Sexp::parse(&text)?;
        let default_root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Config::from_sexp(&sexp, &default_root)
    }

    /// Interpret an already-parsed keyword map.
    pub fn from_sexp(sexp: &Sexp, default_root: &Path) -> Result<Config, ConfigError> {
        if sexp.as_list().is_none() {
            return Err(ConfigError::NotAPlist);
        }
        let merged = merge_active_subproject(sexp)?;
        let view = PlistView::of(&merged);

        let root_dir = view
            .string(&["root-dir"])
            .map(PathBuf::from)
            .unwrap_or_else(|| default_root.to_path_buf());

        Ok(Config {
            root_dir,
            name: view.string(&["name", "project-name"]).unwrap_or_default(),
            package: view
                .string(&["package", "project-package"])
                .unwrap_or_default(),
            module_name: view.string(&["module-name"]),
            version: view.string(&["version"]),
            source_roots: view.paths(&["source-roots", "sources"]),
            reference_source_roots: view.paths(&["reference-source-roots"]),
            compile_deps: view.paths(&["compile-deps"]),
            compile_jars: view.paths(&["compile-jars"]),
            runtime_deps: view.paths(&["runtime-deps"]),
            runtime_jars: view.paths(&["runtime-jars"]),
            test_deps: view.paths(&["test-deps"]),
            target: view.string(&["target"]).map(PathBuf::from),
            test_target: view.string(&["test-target"]).map(PathBuf::from),
            index_on_startup: !view.flag(&["disable-index-on-startup"]),
            source_load_on_startup: !view.flag(&["disable-source-load-on-startup"]),
            include_stdlib_jars: !view.flag(&["disable-scala-jars-on-classpath"]),
            only_include_in_index: view.strings(&["only-include-in-index"]),
            exclude_from_index: view.strings(&["exclude-from-index"]),
            compiler_args: view.strings(&["compiler-args"]),
            builder_args: view.strings(&["builder-args"]),
            java_compiler_args: view.strings(&["java-compiler-args"]),
            java_compiler_version: view.string(&["java-compiler-version"]),
            formatting_prefs: view.pairs("formatting-prefs"),
        })
    }

    /// Every classpath entry the indexer should scan, in configuration order.
    pub fn index_classpath(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for entry in self
            .compile_deps
            .iter()
            .chain(&self.compile_jars)
            .chain(&self.runtime_deps)
            .chain(&self.runtime_jars)
            .chain(&self.test_deps)
        {
            if seen.insert(entry.clone()) {
                out.push(entry.clone());
            }
        }
        out
    }
}

/// Merge the active subproject (and its transitive module dependencies) into
/// the top-level plist, producing a flat keyword map.
fn merge_active_subproject(top: &Sexp) -> Result<Sexp, ConfigError> {
    let active = match top.plist_get("active-subproject").and_then(Sexp::as_str) {
        Some(name) => name.to_string(),
        None => return Ok(top.clone()),
    };

    let subprojects: Vec<&Sexp> = top
        .plist_get("subprojects")
        .and_then(Sexp::as_list)
        .map(|items| items.iter().collect())
        .unwrap_or_default();

    let find = |name: &str| {
        subprojects.iter().copied().find(|sp| {
            sp.plist_get("module-name").and_then(Sexp::as_str) == Some(name)
        })
    };

    let root = find(&active).ok_or_else(|| ConfigError::UnknownSubproject(active.clone()))?;

    // Depth-first over :depends-on-modules, active module first.
    let mut order: Vec<&Sexp> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<&Sexp> = vec![root];
    visited.insert(active.clone());
    while let Some(module) = stack.pop() {
        order.push(module);
        if let Some(deps) = module.plist_get("depends-on-modules").and_then(Sexp::as_list) {
            for dep in deps {
                if let Some(dep_name) = dep.as_str() {
                    if visited.insert(dep_name.to_string()) {
                        if let Some(found) = find(dep_name) {
                            stack.push(found);
                        }
                    }
                }
            }
        }
    }

    // Rebuild a flat plist: scalars resolve module-first then main; lists
    // concatenate main + modules in traversal order.
    let mut merged: Vec<Sexp> = Vec::new();
    let mut emitted: HashSet<String> = HashSet::new();
    let sources: Vec<&Sexp> = std::iter::once(top).chain(order.iter().copied()).collect();

    for source in &sources {
        let Some(items) = source.as_list() else {
            continue;
        };
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            let Sexp::Keyword(key) = item else { continue };
            let Some(value) = iter.next() else { break };
            if key == "subprojects" || key == "active-subproject" || key == "depends-on-modules" {
                continue;
            }
            if matches!(value, Sexp::List(_)) {
                // List values concatenate across every merged source.
                let combined: Vec<Sexp> = sources
                    .iter()
                    .filter_map(|s| s.plist_get(key))
                    .filter_map(|v| v.as_list().map(<[Sexp]>::to_vec))
                    .flatten()
                    .collect();
                if emitted.insert(key.clone()) {
                    merged.push(Sexp::Keyword(key.clone()));
                    merged.push(Sexp::List(combined));
                }
            } else {
                // Scalars: subproject overrides main, so prefer the module
                // occurrence over the top-level one.
                let chosen = order
                    .iter()
                    .filter_map(|m| m.plist_get(key))
                    .next()
                    .unwrap_or(value);
                if emitted.insert(key.clone()) {
                    merged.push(Sexp::Keyword(key.clone()));
                    merged.push(chosen.clone());
                }
            }
        }
    }

    Ok(Sexp::List(merged))
}

/// Read-only keyword-map accessor with synonym support.
struct PlistView<'a> {
    plist: &'a Sexp,
}

impl<'a> PlistView<'a> {
    fn of(plist: &'a Sexp) -> Self {
        PlistView { plist }
    }

    fn get(&self, keys: &[&str]) -> Option<&'a Sexp> {
        keys.iter().find_map(|k| self.plist.plist_get(k))
    }

    fn string(&self, keys: &[&str]) -> Option<String> {
        self.get(keys).and_then(Sexp::as_str).map(str::to_string)
    }

    fn flag(&self, keys: &[&str]) -> bool {
        self.get(keys).is_some_and(Sexp::is_truthy)
    }

    fn strings(&self, keys: &[&str]) -> Vec<String> {
        self.get(keys)
            .and_then(Sexp::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Sexp::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn paths(&self, keys: &[&str]) -> Vec<PathBuf> {
        self.strings(keys).into_iter().map(PathBuf::from).collect()
    }

    fn pairs(&self, key: &str) -> Vec<(String, Sexp)> {
        let Some(items) = self.plist.plist_get(key).and_then(Sexp::as_list) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut iter = items.iter();
        while let Some(item) = iter.next() {
            if let Sexp::Keyword(k) = item {
                if let Some(v) = iter.next() {
                    out.push((k.clone(), v.clone()));
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
