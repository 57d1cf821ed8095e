// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semantic-analysis values exchanged with the compiler adapters and
//! serialized onto the wire by the protocol conversions.

use std::path::PathBuf;

use crate::symbol::{DeclaredAs, SourcePosition};

/// Severity of a compiler note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSeverity {
    Error,
    Warn,
    Info,
}

impl NoteSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            NoteSeverity::Error => "error",
            NoteSeverity::Warn => "warn",
            NoteSeverity::Info => "info",
        }
    }
}

/// A diagnostic reported by one of the compilers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub file: PathBuf,
    pub msg: String,
    /// Character range of the offending code.
    pub beg: i64,
    pub end: i64,
    /// 1-based line and column.
    pub line: u32,
    pub col: u32,
    pub severity: NoteSeverity,
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionInfo {
    pub name: String,
    pub type_sig: String,
    pub is_callable: bool,
    /// Higher sorts earlier in the editor popup.
    pub relevance: i32,
}

/// Completion candidates for a point, with the prefix they complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionList {
    pub prefix: String,
    pub completions: Vec<CompletionInfo>,
}

/// A character range within one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub file: PathBuf,
    pub start: i64,
    pub end: i64,
}

/// A type known to the presentation compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Compiler-assigned id, usable with the by-id requests.
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub declared_as: DeclaredAs,
    pub pos: Option<SourcePosition>,
}

/// A type with its members and companions, for the inspect requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInspectInfo {
    pub type_info: TypeInfo,
    pub companion_id: Option<i64>,
    pub interfaces: Vec<TypeInfo>,
}

/// A symbol resolved at a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub local_name: String,
    pub decl_pos: Option<SourcePosition>,
    pub type_info: TypeInfo,
    pub is_callable: bool,
}

/// A package and its member types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    pub name: String,
    pub full_name: String,
    pub members: Vec<TypeInfo>,
}

/// One parameter section of a callable signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSection {
    /// (name, type name) pairs in declaration order.
    pub params: Vec<(String, String)>,
    pub is_implicit: bool,
}

/// Signature help for a callable, by completion id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallCompletionInfo {
    pub result_type: TypeInfo,
    pub param_sections: Vec<ParamSection>,
}

/// One highlighted region for semantic designations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDesignation {
    /// Designation kind, one of the kinds the client asked for.
    pub kind: String,
    pub start: i64,
    pub end: i64,
}

/// All designations within a requested region of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolDesignations {
    pub file: PathBuf,
    pub designations: Vec<SymbolDesignation>,
}
