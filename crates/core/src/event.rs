// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous events forwarded to the editor client.
//!
//! Events are independent of RPC replies and carry no call-id.

use crate::breakpoint::LineSourcePosition;
use crate::debug::{ObjectId, ThreadId};
use crate::semantic::Note;

/// Which compiler produced a batch of notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteLang {
    Scala,
    Java,
}

/// An event the server pushes to the client unsolicited.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The analyzer accepted its first full type-check; RPCs are now served.
    AnalyzerReady,
    /// A full type-check pass finished (initial or re-kicked).
    FullTypeCheckComplete,
    /// The symbol index finished building and is queryable.
    IndexerReady,
    /// Diagnostics from one of the compilers.
    CompilerNotes { lang: NoteLang, notes: Vec<Note> },
    /// All previously reported notes are stale.
    ClearAllNotes { lang: NoteLang },

    // -- debug --
    DebugVmStart,
    DebugVmDisconnect,
    DebugBreak {
        thread_id: ThreadId,
        thread_name: String,
        pos: LineSourcePosition,
    },
    DebugStep {
        thread_id: ThreadId,
        thread_name: String,
        pos: LineSourcePosition,
    },
    DebugException {
        exception_id: ObjectId,
        thread_id: ThreadId,
        thread_name: String,
        catch_pos: Option<LineSourcePosition>,
    },
    DebugThreadStart {
        thread_id: ThreadId,
    },
    DebugThreadDeath {
        thread_id: ThreadId,
    },
    /// A line of output from the target VM's stdout/stderr monitors.
    DebugOutput {
        text: String,
    },
}
