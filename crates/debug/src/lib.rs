// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! javelin-debug: the debug controller actor.
//!
//! Owns at most one target VM, translates its event stream into client
//! events, resolves breakpoints (active vs pending), materializes
//! backtraces, and mirrors values through the pinned-object table.

pub mod controller;
pub mod source_map;
pub mod values;

pub use controller::{DebugController, DebugMsg, DebugReq, StepKind};
pub use source_map::SourceMap;
pub use values::{backtrace, mirror_value, summary_of, target_to_string, PinnedObjects};
