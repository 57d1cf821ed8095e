// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message payloads flowing back to the Project router.
//!
//! Component actors never touch the socket; they post one of these and the
//! router's single writer task serializes it onto the wire. Exactly one
//! `RpcResult`/`RpcError` is posted per replying call-id.

use crate::debug::{DebugBacktrace, DebugValue};
use crate::breakpoint::Breakpoint;
use crate::error::RpcErrorKind;
use crate::event::ClientEvent;
use crate::semantic::{
    CallCompletionInfo, CompletionInfo, CompletionList, PackageInfo, SourceRange,
    SymbolDesignations, SymbolInfo, TypeInfo, TypeInspectInfo,
};
use crate::symbol::{SymbolSearchResult, TypeSymbol};

/// Domain value of a successful reply, converted to wire form by the router.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcPayload {
    /// Plain `t` acknowledgement.
    True,
    Bool(bool),
    Str(String),
    CompletionList(CompletionList),
    Completions(Vec<CompletionInfo>),
    SourceRanges(Vec<SourceRange>),
    TypeInfo(Option<TypeInfo>),
    TypeInspect(Option<TypeInspectInfo>),
    SymbolInfo(Option<SymbolInfo>),
    PackageInfo(Option<PackageInfo>),
    CallCompletion(Option<CallCompletionInfo>),
    SymbolDesignations(SymbolDesignations),
    SymbolSearchResults(Vec<SymbolSearchResult>),
    /// One ranked list per requested type name, in request order.
    ImportSuggestions(Vec<Vec<TypeSymbol>>),
    Breakpoints {
        active: Vec<Breakpoint>,
        pending: Vec<Breakpoint>,
    },
    DebugValue(DebugValue),
    Backtrace(DebugBacktrace),
}

/// A message posted to the Project router by a component actor.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterMsg {
    /// Successful reply for `call_id`.
    RpcResult { call_id: i64, payload: RpcPayload },
    /// Abort reply for `call_id`.
    RpcError {
        call_id: i64,
        kind: RpcErrorKind,
        detail: String,
    },
    /// Unsolicited event frame.
    Async(ClientEvent),
}

impl RouterMsg {
    /// Convenience constructor for abort replies.
    pub fn error(call_id: i64, kind: RpcErrorKind, detail: impl Into<String>) -> Self {
        RouterMsg::RpcError {
            call_id,
            kind,
            detail: detail.into(),
        }
    }
}
