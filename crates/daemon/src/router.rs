// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Project router.
//!
//! Owns the client socket: reads framed RPCs, routes them by owner to the
//! Analyzer or Debug controller with the client's call-id, and serializes
//! every outbound frame (replies and events) through this single task so
//! writes never interleave. One local client at a time.

use std::sync::Arc;

use javelin_analyzer::AnalyzerMsg;
use javelin_core::msg::RouterMsg;
use javelin_core::sexp::Sexp;
use javelin_core::RpcErrorKind;
use javelin_debug::DebugMsg;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info, warn};

use crate::codec::{read_frame, write_frame, CodecError};
use crate::wire::{
    abort_reply, event_to_wire, ok_reply, parse_frame, payload_to_wire, protocol_error, RpcRequest,
};

/// Server identity reported by `connection-info`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Handles to the component actors the router dispatches into.
pub struct RouterCtx {
    pub analyzer_tx: mpsc::Sender<AnalyzerMsg>,
    pub debug_tx: mpsc::Sender<DebugMsg>,
    pub shutdown: Arc<Notify>,
}

/// The Project router actor.
pub struct Router {
    listener: TcpListener,
    router_rx: mpsc::Receiver<RouterMsg>,
    ctx: RouterCtx,
}

impl Router {
    pub fn new(listener: TcpListener, router_rx: mpsc::Receiver<RouterMsg>, ctx: RouterCtx) -> Router {
        Router {
            listener,
            router_rx,
            ctx,
        }
    }

    /// Accept clients one at a time until shutdown.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                _ = self.ctx.shutdown.notified() => {
                    info!("router shutting down");
                    return;
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            info!(%peer, "client connected");
                            if self.serve(stream).await {
                                return;
                            }
                            info!("client disconnected");
                        }
                        Err(e) => error!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }

    /// Serve one client until it disconnects. Returns true on shutdown.
    ///
    /// A dedicated reader task feeds decoded frames through a channel so
    /// the select below only ever cancels channel receives, never a read
    /// in the middle of a frame. All writes stay on this task.
    async fn serve(&mut self, stream: TcpStream) -> bool {
        let (reader, mut writer) = stream.into_split();
        let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
        let read_task = tokio::spawn(read_loop(reader, inbound_tx));

        let shutdown = loop {
            tokio::select! {
                // Replies and events from the component actors.
                msg = self.router_rx.recv() => {
                    let Some(msg) = msg else { break true };
                    if write_router_msg(&mut writer, &msg).await.is_err() {
                        break false;
                    }
                }

                // Inbound RPCs.
                inbound = inbound_rx.recv() => {
                    match inbound {
                        Some(Inbound::Frame(frame)) => {
                            if self.dispatch(frame, &mut writer).await {
                                break true;
                            }
                        }
                        Some(Inbound::BadPayload(detail)) => {
                            let frame = protocol_error(RpcErrorKind::MalformedRpc, &detail);
                            if write_frame(&mut writer, &frame).await.is_err() {
                                break false;
                            }
                        }
                        Some(Inbound::Closed) | None => break false,
                    }
                }
            }
        };
        read_task.abort();
        shutdown
    }

    /// Route one parsed frame. Returns true when the client asked for
    /// shutdown.
    async fn dispatch(&mut self, frame: Sexp, writer: &mut OwnedWriteHalf) -> bool {
        debug!(frame = %frame, "received frame");
        match parse_frame(&frame) {
            Ok((RpcRequest::ConnectionInfo, call_id)) => {
                let _ = write_frame(writer, &ok_reply(call_id, connection_info())).await;
            }
            Ok((RpcRequest::Shutdown, call_id)) => {
                let _ = write_frame(writer, &ok_reply(call_id, Sexp::True)).await;
                self.ctx.shutdown.notify_one();
                return true;
            }
            Ok((RpcRequest::Analyzer(req), call_id)) => {
                if self
                    .ctx
                    .analyzer_tx
                    .send(AnalyzerMsg::Rpc { req, call_id })
                    .await
                    .is_err()
                {
                    let reply =
                        abort_reply(call_id, RpcErrorKind::RpcException, "analyzer is gone");
                    let _ = write_frame(writer, &reply).await;
                }
            }
            Ok((RpcRequest::Debug(req), call_id)) => {
                if self
                    .ctx
                    .debug_tx
                    .send(DebugMsg::Rpc { req, call_id })
                    .await
                    .is_err()
                {
                    let reply =
                        abort_reply(call_id, RpcErrorKind::RpcException, "debugger is gone");
                    let _ = write_frame(writer, &reply).await;
                }
            }
            Err(e) => {
                warn!(detail = e.detail(), code = e.kind().code(), "undecodable rpc");
                let _ = write_frame(writer, &protocol_error(e.kind(), e.detail())).await;
            }
        }
        false
    }
}

/// One decoded unit off the socket.
enum Inbound {
    Frame(Sexp),
    /// Frame boundary held but the payload would not parse.
    BadPayload(String),
    Closed,
}

/// Read frames until the stream closes or desynchronizes.
async fn read_loop(mut reader: tokio::net::tcp::OwnedReadHalf, tx: mpsc::Sender<Inbound>) {
    loop {
        let inbound = match read_frame(&mut reader).await {
            Ok(frame) => Inbound::Frame(frame),
            Err(CodecError::Sexp(e)) => {
                warn!(error = %e, "malformed payload");
                Inbound::BadPayload(e.to_string())
            }
            Err(CodecError::ConnectionClosed) => Inbound::Closed,
            Err(e) => {
                warn!(error = %e, "unreadable frame, closing connection");
                Inbound::Closed
            }
        };
        let closing = matches!(inbound, Inbound::Closed);
        if tx.send(inbound).await.is_err() || closing {
            return;
        }
    }
}

async fn write_router_msg(
    writer: &mut OwnedWriteHalf,
    msg: &RouterMsg,
) -> Result<(), CodecError> {
    let frame = match msg {
        RouterMsg::RpcResult { call_id, payload } => {
            ok_reply(*call_id, payload_to_wire(payload))
        }
        RouterMsg::RpcError {
            call_id,
            kind,
            detail,
        } => abort_reply(*call_id, *kind, detail),
        RouterMsg::Async(event) => event_to_wire(event),
    };
    write_frame(writer, &frame).await
}

/// `(:pid nil :implementation (:name "javelin") :version "…")`
fn connection_info() -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("pid"),
        Sexp::Nil,
        Sexp::keyword("implementation"),
        Sexp::list(vec![Sexp::keyword("name"), Sexp::string("javelin")]),
        Sexp::keyword("version"),
        Sexp::string(PROTOCOL_VERSION),
    ])
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
