// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! javelin-daemon: the wire fabric and supervisor.
//!
//! The codec frames s-expressions with a hex length header, the protocol
//! conversions map domain values onto the wire, the Project router owns the
//! client socket and call-id correlation, and the lifecycle module wires
//! the actors together at startup.

pub mod codec;
pub mod env;
pub mod lifecycle;
pub mod router;
pub mod wire;

pub use codec::{read_frame, write_frame, CodecError, MAX_FRAME_SIZE};
pub use lifecycle::{cleanup, startup, DaemonPaths, LifecycleError, StartupResult};
pub use router::{Router, RouterCtx, PROTOCOL_VERSION};
pub use wire::{
    abort_reply, event_to_wire, ok_reply, parse_frame, payload_to_wire, protocol_error,
    ParseError, RpcRequest,
};
