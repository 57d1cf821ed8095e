// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! javelin-core: Core library for the Javelin analysis/debug server
//!
//! Domain types shared by every component: the s-expression dialect used on
//! the wire and in the configuration file, the project configuration model,
//! symbol search results, breakpoints, the debug value model, the RPC
//! error-kind enumeration, and the message payloads exchanged between actors.

pub mod breakpoint;
pub mod config;
pub mod debug;
pub mod error;
pub mod event;
pub mod msg;
pub mod semantic;
pub mod sexp;
pub mod symbol;

pub use breakpoint::{Breakpoint, LineSourcePosition};
pub use config::{Config, ConfigError};
pub use debug::{
    DebugBacktrace, DebugLocation, DebugStackFrame, DebugStackLocal, DebugValue, ObjectId,
    ThreadId,
};
pub use error::RpcErrorKind;
pub use event::{ClientEvent, NoteLang};
pub use msg::{RouterMsg, RpcPayload};
pub use semantic::{
    CallCompletionInfo, CompletionInfo, CompletionList, Note, NoteSeverity, PackageInfo,
    ParamSection, SourceRange, SymbolDesignation, SymbolDesignations, SymbolInfo, TypeInfo,
    TypeInspectInfo,
};
pub use sexp::{Sexp, SexpError};
pub use symbol::{local_name_of, DeclaredAs, MethodSymbol, SourcePosition, SymbolSearchResult, TypeSymbol};
