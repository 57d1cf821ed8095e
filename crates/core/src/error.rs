// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC error-kind enumeration.
//!
//! Clients match on the numeric codes, so the values here are wire contract
//! and must never change.

/// Numeric error kind carried in `(:return (:abort code detail) call-id)`
/// replies and in unsolicited protocol-error frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum RpcErrorKind {
    UnexpectedCompilerError = 101,
    AnalyzerInitializing = 102,
    BuildingProject = 103,
    BuildComplete = 104,
    Misc = 105,
    DebuggerException = 200,
    RpcException = 201,
    MalformedRpc = 202,
    UnrecognizedForm = 203,
    UnrecognizedRpc = 204,
    BuilderException = 205,
    PeekUndoFailed = 206,
    ExecUndoFailed = 207,
    FormatFailed = 208,
    AnalyzerNotReady = 209,
    AnalyzerException = 210,
    FileNotFound = 211,
    IndexerException = 212,
}

impl RpcErrorKind {
    /// The numeric wire code for this kind.
    pub fn code(self) -> i64 {
        self as i64
    }
}
