// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Classpath walker.
//!
//! Scans every classpath entry (directories descended, archives opened),
//! parses class-file headers, and emits a symbol result per accepted class
//! and public method. Acceptance = public access + validity predicates +
//! the configured include/exclude regular expressions.

use std::io::Read;
use std::path::Path;

use javelin_core::symbol::{
    local_name_of, DeclaredAs, MethodSymbol, SymbolSearchResult, TypeSymbol,
};
use regex::Regex;
use tracing::{debug, warn};

use crate::classfile::{parse_class_header, ClassHeader};
use crate::store::IndexError;

/// A type name is indexable when `$` appears either not at all or only as
/// the final character. This keeps companion-object markers and drops
/// synthetic inner classes.
pub fn valid_type(name: &str) -> bool {
    match name.find('$') {
        None => true,
        Some(idx) => idx == name.len() - 1,
    }
}

/// A method name is indexable when it carries no `$` and is neither a
/// constructor nor the `this` self-reference.
pub fn valid_method(name: &str) -> bool {
    !name.contains('$') && name != "<init>" && name != "this"
}

/// Walks classpath entries and emits accepted symbol results.
pub struct ClasspathScanner {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl ClasspathScanner {
    pub fn new(includes: &[String], excludes: &[String]) -> Result<ClasspathScanner, IndexError> {
        let compile = |patterns: &[String]| -> Result<Vec<Regex>, IndexError> {
            patterns
                .iter()
                .map(|p| Regex::new(p).map_err(|e| IndexError::BadPattern(e.to_string())))
                .collect()
        };
        Ok(ClasspathScanner {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
        })
    }

    /// Include/exclude filter on a fully qualified type name.
    pub fn accepts(&self, name: &str) -> bool {
        if !self.includes.is_empty() && !self.includes.iter().any(|re| re.is_match(name)) {
            return false;
        }
        !self.excludes.iter().any(|re| re.is_match(name))
    }

    /// Scan one classpath entry, invoking `emit` per accepted result.
    pub fn scan(
        &self,
        entry: &Path,
        emit: &mut dyn FnMut(SymbolSearchResult),
    ) -> Result<(), IndexError> {
        if entry.is_dir() {
            self.scan_directory(entry, emit)
        } else if is_archive(entry) {
            self.scan_archive(entry, emit)
        } else {
            debug!(entry = %entry.display(), "skipping unrecognized classpath entry");
            Ok(())
        }
    }

    fn scan_directory(
        &self,
        dir: &Path,
        emit: &mut dyn FnMut(SymbolSearchResult),
    ) -> Result<(), IndexError> {
        for file in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "class"))
        {
            match std::fs::read(file.path()) {
                Ok(bytes) => self.emit_class(&bytes, emit),
                Err(e) => warn!(file = %file.path().display(), error = %e, "unreadable class file"),
            }
        }
        Ok(())
    }

    fn scan_archive(
        &self,
        jar: &Path,
        emit: &mut dyn FnMut(SymbolSearchResult),
    ) -> Result<(), IndexError> {
        let file = std::fs::File::open(jar)?;
        let mut archive = match zip::ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(e) => {
                warn!(jar = %jar.display(), error = %e, "unreadable archive");
                return Ok(());
            }
        };
        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            if !entry.name().ends_with(".class") {
                continue;
            }
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            if entry.read_to_end(&mut bytes).is_ok() {
                self.emit_class(&bytes, emit);
            }
        }
        Ok(())
    }

    fn emit_class(&self, bytes: &[u8], emit: &mut dyn FnMut(SymbolSearchResult)) {
        let header = match parse_class_header(bytes) {
            Ok(header) => header,
            Err(e) => {
                debug!(error = %e, "skipping undecodable class file");
                return;
            }
        };
        if !header.is_public() || !valid_type(&header.name) || !self.accepts(&header.name) {
            return;
        }
        for result in results_of(&header) {
            emit(result);
        }
    }
}

/// Symbol results of one accepted class header: the type itself plus one
/// method result per public valid method.
pub fn results_of(header: &ClassHeader) -> Vec<SymbolSearchResult> {
    let declared_as = if header.is_interface() {
        DeclaredAs::Trait
    } else if header.name.ends_with('$') {
        DeclaredAs::Object
    } else {
        DeclaredAs::Class
    };

    let mut results = vec![SymbolSearchResult::Type(TypeSymbol {
        name: header.name.clone(),
        local_name: local_name_of(&header.name).to_string(),
        declared_as,
        pos: None,
    })];

    for method in &header.methods {
        if !method.is_public() || !valid_method(&method.name) {
            continue;
        }
        let name = format!("{}.{}", header.name, method.name);
        results.push(SymbolSearchResult::Method(MethodSymbol {
            local_name: method.name.clone(),
            owner: header.name.clone(),
            name,
            pos: None,
        }));
    }
    results
}

fn is_archive(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "jar" || ext == "zip")
}

#[cfg(test)]
#[path = "classpath_tests.rs"]
mod tests;
