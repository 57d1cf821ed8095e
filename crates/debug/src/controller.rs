// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The debug controller state machine.
//!
//! One actor, one target VM, three states: `Disconnected`, `Connecting`
//! (connection up, VM start event not yet seen) and `Running`. Requests
//! and translated VM events share the mailbox, so same-line breakpoint
//! races settle in arrival order. The connection handle sits behind a
//! mutex because the wire client's pump enriches events concurrently; the
//! pump never touches the controller's maps.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use javelin_adapters::vm::{
    RawValue, RequestId, ResolvedLocation, StepDepth, VmConnection, VmConnector, VmError, VmEvent,
};
use javelin_core::breakpoint::{Breakpoint, LineSourcePosition};
use javelin_core::debug::{DebugLocation, ThreadId};
use javelin_core::msg::{RouterMsg, RpcPayload};
use javelin_core::{ClientEvent, RpcErrorKind};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::source_map::SourceMap;
use crate::values::{backtrace, mirror_value, target_to_string, to_debug_value, PinnedObjects};

/// Mailbox depth for the actor.
const MAILBOX: usize = 256;

/// A debug request, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugReq {
    StartVm { command_line: String },
    AttachVm { host: String, port: u16 },
    StopVm,
    ActiveVm,
    SetBreakpoint { file: PathBuf, line: u32 },
    ClearBreakpoint { file: PathBuf, line: u32 },
    ClearAllBreakpoints,
    ListBreakpoints,
    Continue,
    Step { thread_id: ThreadId, depth: StepKind },
    Backtrace { thread_id: ThreadId, from: u32, count: i32 },
    Value { location: DebugLocation },
    ToString { thread_id: ThreadId, location: DebugLocation },
    SetValue { location: DebugLocation, text: String },
}

/// Step depth requested by the client; stride is always one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Into,
    Over,
    Out,
}

impl From<StepKind> for StepDepth {
    fn from(kind: StepKind) -> StepDepth {
        match kind {
            StepKind::Into => StepDepth::Into,
            StepKind::Over => StepDepth::Over,
            StepKind::Out => StepDepth::Out,
        }
    }
}

/// A message on the controller's mailbox.
#[derive(Debug)]
pub enum DebugMsg {
    Rpc { req: DebugReq, call_id: i64 },
    Vm(VmEvent),
}

/// Per-connection state.
struct ActiveVm<V: VmConnection> {
    conn: Arc<Mutex<V>>,
    /// Source basename → loaded classes declaring it.
    classes_by_basename: HashMap<String, Vec<i64>>,
    /// Installed breakpoints with their event-request ids.
    active: HashMap<LineSourcePosition, Vec<RequestId>>,
    pins: PinnedObjects,
}

enum VmState<V: VmConnection> {
    Disconnected,
    Connecting(ActiveVm<V>),
    Running(ActiveVm<V>),
}

impl<V: VmConnection> VmState<V> {
    fn vm_mut(&mut self) -> Option<&mut ActiveVm<V>> {
        match self {
            VmState::Disconnected => None,
            VmState::Connecting(vm) | VmState::Running(vm) => Some(vm),
        }
    }
}

/// The Debug controller actor.
pub struct DebugController<C: VmConnector> {
    connector: Arc<C>,
    state: VmState<C::Conn>,
    /// Breakpoints with no loaded class yet, keyed by their positions.
    pending: Vec<Breakpoint>,
    source_map: SourceMap,
    rx: mpsc::Receiver<DebugMsg>,
    own_tx: mpsc::Sender<DebugMsg>,
    router_tx: mpsc::Sender<RouterMsg>,
}

impl<C: VmConnector> DebugController<C> {
    /// Spawn the actor. `source_roots` feed the basename-to-file map used
    /// to canonicalize positions in events and backtraces.
    pub fn spawn(
        connector: C,
        source_roots: Vec<PathBuf>,
        router_tx: mpsc::Sender<RouterMsg>,
    ) -> mpsc::Sender<DebugMsg> {
        let (tx, rx) = mpsc::channel(MAILBOX);
        let actor = DebugController {
            connector: Arc::new(connector),
            state: VmState::Disconnected,
            pending: Vec::new(),
            source_map: SourceMap::build(&source_roots),
            rx,
            own_tx: tx.clone(),
            router_tx,
        };
        tokio::spawn(actor.run());
        tx
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                DebugMsg::Rpc { req, call_id } => self.handle_rpc(req, call_id).await,
                DebugMsg::Vm(event) => self.handle_vm_event(event).await,
            }
        }
    }

    // ── Requests ─────────────────────────────────────────────────────────

    async fn handle_rpc(&mut self, req: DebugReq, call_id: i64) {
        let reply = match req {
            DebugReq::StartVm { command_line } => {
                let connector = Arc::clone(&self.connector);
                let conn = tokio::task::spawn_blocking(move || connector.launch(&command_line))
                    .await
                    .unwrap_or(Err(VmError::Disconnected));
                self.connected(conn).await
            }
            DebugReq::AttachVm { host, port } => {
                let connector = Arc::clone(&self.connector);
                let conn = tokio::task::spawn_blocking(move || connector.attach(&host, port))
                    .await
                    .unwrap_or(Err(VmError::Disconnected));
                self.connected(conn).await
            }
            DebugReq::StopVm => {
                self.disconnect(true).await;
                Ok(RpcPayload::True)
            }
            DebugReq::ActiveVm => Ok(RpcPayload::Bool(!matches!(
                self.state,
                VmState::Disconnected
            ))),
            DebugReq::SetBreakpoint { file, line } => self.set_breakpoint(file, line),
            DebugReq::ClearBreakpoint { file, line } => self.clear_breakpoint(&file, line),
            DebugReq::ClearAllBreakpoints => self.clear_all_breakpoints(),
            DebugReq::ListBreakpoints => {
                let active = match self.state.vm_mut() {
                    Some(vm) => vm
                        .active
                        .keys()
                        .map(|pos| Breakpoint { pos: pos.clone() })
                        .collect(),
                    None => Vec::new(),
                };
                Ok(RpcPayload::Breakpoints {
                    active,
                    pending: self.pending.clone(),
                })
            }
            DebugReq::Continue => self.with_vm(|vm| {
                vm.conn.lock().resume()?;
                Ok(RpcPayload::True)
            }),
            DebugReq::Step { thread_id, depth } => self.with_vm(|vm| {
                let mut conn = vm.conn.lock();
                // One concurrent step request per thread is the platform
                // contract; a blanket delete is safe because at most one
                // stepping operation is ever outstanding.
                conn.delete_step_requests()?;
                conn.new_step_request(thread_id, depth.into())?;
                conn.resume()?;
                Ok(RpcPayload::True)
            }),
            DebugReq::Backtrace {
                thread_id,
                from,
                count,
            } => {
                let source_map = self.source_map.clone();
                self.with_vm(|vm| {
                    let mut conn = vm.conn.lock();
                    let bt = backtrace(&mut *conn, &mut vm.pins, &source_map, thread_id, from, count)?;
                    Ok(RpcPayload::Backtrace(bt))
                })
            }
            DebugReq::Value { location } => self.with_vm(|vm| {
                let raw = read_location(vm, &location)?;
                let mut conn = vm.conn.lock();
                Ok(RpcPayload::DebugValue(to_debug_value(
                    &mut *conn,
                    &mut vm.pins,
                    &raw,
                )))
            }),
            DebugReq::ToString {
                thread_id,
                location,
            } => self.with_vm(|vm| {
                let raw = read_location(vm, &location)?;
                let mut conn = vm.conn.lock();
                let text = target_to_string(&mut *conn, &mut vm.pins, thread_id, &raw)?;
                Ok(RpcPayload::Str(text))
            }),
            DebugReq::SetValue { location, text } => {
                let done = self.set_value(&location, &text);
                Ok(RpcPayload::Bool(done))
            }
        };

        let msg = match reply {
            Ok(payload) => RouterMsg::RpcResult { call_id, payload },
            Err(e) => RouterMsg::error(call_id, RpcErrorKind::DebuggerException, e.to_string()),
        };
        let _ = self.router_tx.send(msg).await;
    }

    fn with_vm(
        &mut self,
        f: impl FnOnce(&mut ActiveVm<C::Conn>) -> Result<RpcPayload, VmError>,
    ) -> Result<RpcPayload, VmError> {
        match self.state.vm_mut() {
            Some(vm) => f(vm),
            None => Err(VmError::Disconnected),
        }
    }

    /// A fresh connection: keep it in `Connecting` until its start event,
    /// and pump its translated events into this mailbox.
    async fn connected(&mut self, conn: Result<C::Conn, VmError>) -> Result<RpcPayload, VmError> {
        let mut conn = conn?;
        if !matches!(self.state, VmState::Disconnected) {
            self.disconnect(true).await;
        }

        if let Some(mut events) = conn.take_events() {
            let own_tx = self.own_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    if own_tx.send(DebugMsg::Vm(event)).await.is_err() {
                        break;
                    }
                }
            });
        }

        self.state = VmState::Connecting(ActiveVm {
            conn: Arc::new(Mutex::new(conn)),
            classes_by_basename: HashMap::new(),
            active: HashMap::new(),
            pins: PinnedObjects::default(),
        });
        Ok(RpcPayload::True)
    }

    /// Tear the VM down; active breakpoints migrate back to pending so the
    /// next start re-installs them.
    async fn disconnect(&mut self, emit: bool) {
        let state = std::mem::replace(&mut self.state, VmState::Disconnected);
        let vm = match state {
            VmState::Disconnected => return,
            VmState::Connecting(vm) | VmState::Running(vm) => vm,
        };
        for pos in vm.active.into_keys() {
            let breakpoint = Breakpoint { pos };
            if !self.pending.contains(&breakpoint) {
                self.pending.push(breakpoint);
            }
        }
        vm.conn.lock().dispose();
        if emit {
            self.emit(ClientEvent::DebugVmDisconnect).await;
        }
    }

    // ── Breakpoints ──────────────────────────────────────────────────────

    fn set_breakpoint(&mut self, file: PathBuf, line: u32) -> Result<RpcPayload, VmError> {
        let breakpoint = Breakpoint::new(file, line);
        let installed = match self.state.vm_mut() {
            Some(vm) => install_breakpoint(vm, &breakpoint)?,
            None => false,
        };
        if installed {
            self.pending.retain(|b| b != &breakpoint);
        } else if !self.pending.contains(&breakpoint) {
            info!(file = %breakpoint.pos.file.display(), line, "breakpoint pending");
            self.pending.push(breakpoint);
        }
        Ok(RpcPayload::True)
    }

    fn clear_breakpoint(&mut self, file: &std::path::Path, line: u32) -> Result<RpcPayload, VmError> {
        let pos = LineSourcePosition::new(file, line);
        self.pending.retain(|b| b.pos != pos);
        if let Some(vm) = self.state.vm_mut() {
            if let Some(requests) = vm.active.remove(&pos) {
                vm.conn.lock().clear_breakpoints(&requests)?;
            }
        }
        Ok(RpcPayload::True)
    }

    fn clear_all_breakpoints(&mut self) -> Result<RpcPayload, VmError> {
        self.pending.clear();
        if let Some(vm) = self.state.vm_mut() {
            vm.active.clear();
            vm.conn.lock().clear_all_breakpoints()?;
        }
        Ok(RpcPayload::True)
    }

    /// Re-attempt pending breakpoints, optionally only those whose source
    /// basename matches a freshly prepared class.
    fn retry_pending(&mut self, basename: Option<&str>) {
        let Some(vm) = self.state.vm_mut() else {
            return;
        };
        let mut still_pending = Vec::new();
        for breakpoint in std::mem::take(&mut self.pending) {
            let matches = basename.is_none_or(|b| breakpoint.pos.basename() == b);
            if !matches {
                still_pending.push(breakpoint);
                continue;
            }
            match install_breakpoint(vm, &breakpoint) {
                Ok(true) => {
                    info!(file = %breakpoint.pos.file.display(), line = breakpoint.pos.line,
                          "pending breakpoint installed");
                }
                Ok(false) => still_pending.push(breakpoint),
                Err(e) => {
                    warn!(error = %e, "breakpoint install failed");
                    still_pending.push(breakpoint);
                }
            }
        }
        self.pending = still_pending;
    }

    // ── Value mutation ───────────────────────────────────────────────────

    /// Only stack slots are mutable; anything else reports failure without
    /// aborting the call.
    fn set_value(&mut self, location: &DebugLocation, text: &str) -> bool {
        let DebugLocation::StackSlot {
            thread_id,
            frame_index,
            offset,
        } = location
        else {
            return false;
        };
        let Some(vm) = self.state.vm_mut() else {
            return false;
        };
        let mut conn = vm.conn.lock();
        let Ok(signature) = conn.slot_signature(*thread_id, *frame_index, *offset) else {
            return false;
        };
        let Some(value) = mirror_value(&mut *conn, &signature, text) else {
            return false;
        };
        conn.set_slot_value(*thread_id, *frame_index, *offset, value)
            .is_ok()
    }

    // ── VM events ────────────────────────────────────────────────────────

    async fn handle_vm_event(&mut self, event: VmEvent) {
        match event {
            VmEvent::VmStart => {
                self.vm_started();
                self.emit(ClientEvent::DebugVmStart).await;
            }
            VmEvent::VmDeath | VmEvent::Disconnected => {
                if !matches!(self.state, VmState::Disconnected) {
                    self.disconnect(true).await;
                }
            }
            VmEvent::ClassPrepare {
                type_id,
                name,
                source_name,
            } => {
                let Some(vm) = self.state.vm_mut() else { return };
                let Some(source_name) = source_name else { return };
                vm.classes_by_basename
                    .entry(source_name.clone())
                    .or_default()
                    .push(type_id);
                tracing::debug!(class = name, source = source_name, "class prepared");
                self.retry_pending(Some(&source_name));
            }
            VmEvent::Breakpoint {
                thread_id,
                location,
            } => match self.locate(location) {
                Some(pos) => {
                    let name = self.thread_name(thread_id);
                    self.emit(ClientEvent::DebugBreak {
                        thread_id,
                        thread_name: name,
                        pos,
                    })
                    .await;
                }
                None => warn!(thread_id, "breakpoint at unresolvable location"),
            },
            VmEvent::Step {
                thread_id,
                location,
            } => match self.locate(location) {
                Some(pos) => {
                    let name = self.thread_name(thread_id);
                    self.emit(ClientEvent::DebugStep {
                        thread_id,
                        thread_name: name,
                        pos,
                    })
                    .await;
                }
                None => warn!(thread_id, "step at unresolvable location"),
            },
            VmEvent::ExceptionThrown {
                thread_id,
                exception,
                catch_location,
            } => {
                if let Some(vm) = self.state.vm_mut() {
                    vm.pins.pin(exception);
                }
                let catch_pos = catch_location.map(|loc| LineSourcePosition {
                    file: self.source_map.canonicalize(&loc.source_name, &loc.source_path),
                    line: loc.line,
                });
                let name = self.thread_name(thread_id);
                self.emit(ClientEvent::DebugException {
                    exception_id: exception,
                    thread_id,
                    thread_name: name,
                    catch_pos,
                })
                .await;
            }
            VmEvent::ThreadStart { thread_id } => {
                self.emit(ClientEvent::DebugThreadStart { thread_id }).await;
            }
            VmEvent::ThreadDeath { thread_id } => {
                self.emit(ClientEvent::DebugThreadDeath { thread_id }).await;
            }
            VmEvent::Output { line } => {
                self.emit(ClientEvent::DebugOutput { text: line }).await;
            }
        }
    }

    /// VM start: index every loaded class by source basename, promote the
    /// connection to `Running`, install what can be installed, resume.
    fn vm_started(&mut self) {
        let state = std::mem::replace(&mut self.state, VmState::Disconnected);
        let mut vm = match state {
            VmState::Connecting(vm) | VmState::Running(vm) => vm,
            VmState::Disconnected => return,
        };

        let classes = vm.conn.lock().all_classes().unwrap_or_default();
        for class in classes {
            if let Some(source) = class.source_name {
                vm.classes_by_basename
                    .entry(source)
                    .or_default()
                    .push(class.type_id);
            }
        }
        self.state = VmState::Running(vm);
        self.retry_pending(None);
        if let Some(vm) = self.state.vm_mut() {
            if let Err(e) = vm.conn.lock().resume() {
                warn!(error = %e, "resume after start failed");
            }
        }
    }

    fn locate(&mut self, location: Option<ResolvedLocation>) -> Option<LineSourcePosition> {
        let loc = location?;
        Some(LineSourcePosition {
            file: self.source_map.canonicalize(&loc.source_name, &loc.source_path),
            line: loc.line,
        })
    }

    fn thread_name(&mut self, thread_id: ThreadId) -> String {
        self.state
            .vm_mut()
            .and_then(|vm| vm.conn.lock().thread_name(thread_id).ok())
            .unwrap_or_default()
    }

    async fn emit(&self, event: ClientEvent) {
        let _ = self.router_tx.send(RouterMsg::Async(event)).await;
    }
}

/// Dereference a client-named location into a raw value, pinning whatever
/// comes back. Object references must have been pinned before.
fn read_location<V: VmConnection>(
    vm: &mut ActiveVm<V>,
    location: &DebugLocation,
) -> Result<RawValue, VmError> {
    let value = match location {
        DebugLocation::ObjectReference { object_id } => {
            if !vm.pins.contains(*object_id) {
                return Err(VmError::UnknownObject(*object_id));
            }
            let type_name = vm.conn.lock().object_type_name(*object_id)?;
            if type_name == "java.lang.String" {
                RawValue::StringRef(*object_id)
            } else if type_name.ends_with("[]") {
                RawValue::ArrayRef(*object_id)
            } else {
                RawValue::ObjectRef(*object_id)
            }
        }
        DebugLocation::ObjectField {
            object_id,
            field_name,
        } => {
            if !vm.pins.contains(*object_id) {
                return Err(VmError::UnknownObject(*object_id));
            }
            vm.conn.lock().field_value(*object_id, field_name)?
        }
        DebugLocation::ArrayElement { object_id, index } => {
            if !vm.pins.contains(*object_id) {
                return Err(VmError::UnknownObject(*object_id));
            }
            vm.conn
                .lock()
                .array_elements(*object_id, *index, 1)?
                .into_iter()
                .next()
                .ok_or(VmError::AbsentInformation)?
        }
        DebugLocation::StackSlot {
            thread_id,
            frame_index,
            offset,
        } => vm.conn.lock().slot_value(*thread_id, *frame_index, *offset)?,
    };
    vm.pins.pin_value(&value);
    Ok(value)
}

/// Resolve and install one breakpoint. Returns whether any location was
/// found; installed request ids land in the active set.
fn install_breakpoint<V: VmConnection>(
    vm: &mut ActiveVm<V>,
    breakpoint: &Breakpoint,
) -> Result<bool, VmError> {
    let basename = breakpoint.pos.basename();
    let Some(classes) = vm.classes_by_basename.get(&basename).cloned() else {
        return Ok(false);
    };

    let mut conn = vm.conn.lock();
    // Dedup by (source path, source name, line).
    let mut seen: Vec<(String, String, u32)> = Vec::new();
    let mut locations: Vec<ResolvedLocation> = Vec::new();
    for type_id in classes {
        for location in conn.locations_of_line(type_id, breakpoint.pos.line)? {
            let key = (
                location.source_path.clone(),
                location.source_name.clone(),
                location.line,
            );
            if !seen.contains(&key) {
                seen.push(key);
                locations.push(location);
            }
        }
    }
    if locations.is_empty() {
        return Ok(false);
    }

    let mut requests = Vec::with_capacity(locations.len());
    for location in &locations {
        requests.push(conn.set_breakpoint(location)?);
    }
    drop(conn);
    vm.active.insert(breakpoint.pos.clone(), requests);
    Ok(true)
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
