// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symbol search results produced by the classpath scan and served by the
//! index queries.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a type or member is declared on the JVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredAs {
    Class,
    Trait,
    Object,
    Method,
}

impl DeclaredAs {
    /// Wire symbol for this declaration kind.
    pub fn as_str(self) -> &'static str {
        match self {
            DeclaredAs::Class => "class",
            DeclaredAs::Trait => "trait",
            DeclaredAs::Object => "object",
            DeclaredAs::Method => "method",
        }
    }
}

/// A character-offset position in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub file: PathBuf,
    /// Character offset from the start of the file, never negative.
    pub offset: i64,
}

/// A type found in the classpath scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSymbol {
    /// Fully qualified name, e.g. `java.util.List`.
    pub name: String,
    /// Trailing segment of `name`, e.g. `List`.
    pub local_name: String,
    pub declared_as: DeclaredAs,
    pub pos: Option<SourcePosition>,
}

/// A method found in the classpath scan. `declared_as` is always `method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    /// Fully qualified name, e.g. `java.util.List.add`.
    pub name: String,
    /// Trailing segment of `name`, e.g. `add`.
    pub local_name: String,
    /// Fully qualified name of the declaring type.
    pub owner: String,
    pub pos: Option<SourcePosition>,
}

/// Tagged result variant served by index queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SymbolSearchResult {
    Type(TypeSymbol),
    Method(MethodSymbol),
}

impl SymbolSearchResult {
    /// Fully qualified name of the symbol.
    pub fn name(&self) -> &str {
        match self {
            SymbolSearchResult::Type(t) => &t.name,
            SymbolSearchResult::Method(m) => &m.name,
        }
    }

    /// Local (last-segment) name of the symbol.
    pub fn local_name(&self) -> &str {
        match self {
            SymbolSearchResult::Type(t) => &t.local_name,
            SymbolSearchResult::Method(m) => &m.local_name,
        }
    }

    pub fn declared_as(&self) -> DeclaredAs {
        match self {
            SymbolSearchResult::Type(t) => t.declared_as,
            SymbolSearchResult::Method(_) => DeclaredAs::Method,
        }
    }

    pub fn pos(&self) -> Option<&SourcePosition> {
        match self {
            SymbolSearchResult::Type(t) => t.pos.as_ref(),
            SymbolSearchResult::Method(m) => m.pos.as_ref(),
        }
    }

    /// Owner type name; present only for methods.
    pub fn owner(&self) -> Option<&str> {
        match self {
            SymbolSearchResult::Type(_) => None,
            SymbolSearchResult::Method(m) => Some(&m.owner),
        }
    }
}

/// Trailing `.`-segment of a fully qualified name.
///
/// `local_name_of("java.util.List") == "List"`; a name with no dots is its
/// own local name.
pub fn local_name_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

#[cfg(test)]
#[path = "symbol_tests.rs"]
mod tests;
