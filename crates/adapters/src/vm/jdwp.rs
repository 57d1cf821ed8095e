// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JDWP client for the target VM.
//!
//! Packets are length-prefixed: `length(u32) id(u32) flags(u8)` then either
//! `cmdset(u8) cmd(u8)` for commands or `errorcode(u16)` for replies
//! (flag 0x80). A reader thread routes replies to waiting callers by packet
//! id and forwards composite event packets to the pump thread, which
//! resolves locations to source coordinates and emits [`VmEvent`]s. The
//! pump never calls back into the controller.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use javelin_core::debug::{ObjectId, ThreadId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use super::{
    signature_to_name, ClassSummary, FrameData, LocalVariable, RawValue, RequestId,
    ResolvedLocation, StepDepth, ThreadSummary, VmConnection, VmError, VmEvent,
};

const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// How long a caller waits for a reply before giving up.
const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// How long `launch` waits for the debuggee to dial back.
const ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

// Command set / command pairs.
const VM_VERSION: (u8, u8) = (1, 1);
const VM_ALL_CLASSES: (u8, u8) = (1, 3);
const VM_ALL_THREADS: (u8, u8) = (1, 4);
const VM_DISPOSE: (u8, u8) = (1, 6);
const VM_ID_SIZES: (u8, u8) = (1, 7);
const VM_RESUME: (u8, u8) = (1, 9);
const VM_CREATE_STRING: (u8, u8) = (1, 11);
const REFTYPE_SIGNATURE: (u8, u8) = (2, 1);
const REFTYPE_FIELDS: (u8, u8) = (2, 4);
const REFTYPE_METHODS: (u8, u8) = (2, 5);
const REFTYPE_SOURCE_FILE: (u8, u8) = (2, 7);
const CLASSTYPE_SUPERCLASS: (u8, u8) = (3, 1);
const METHOD_LINE_TABLE: (u8, u8) = (6, 1);
const METHOD_VARIABLE_TABLE: (u8, u8) = (6, 2);
const OBJREF_REFERENCE_TYPE: (u8, u8) = (9, 1);
const OBJREF_GET_VALUES: (u8, u8) = (9, 2);
const OBJREF_INVOKE_METHOD: (u8, u8) = (9, 6);
const STRING_VALUE: (u8, u8) = (10, 1);
const THREAD_NAME: (u8, u8) = (11, 1);
const THREAD_FRAMES: (u8, u8) = (11, 6);
const ARRAY_LENGTH: (u8, u8) = (13, 1);
const ARRAY_GET_VALUES: (u8, u8) = (13, 2);
const EVENTREQ_SET: (u8, u8) = (15, 1);
const EVENTREQ_CLEAR: (u8, u8) = (15, 2);
const EVENTREQ_CLEAR_ALL_BREAKPOINTS: (u8, u8) = (15, 3);
const FRAME_GET_VALUES: (u8, u8) = (16, 1);
const FRAME_SET_VALUES: (u8, u8) = (16, 2);
const FRAME_THIS_OBJECT: (u8, u8) = (16, 3);
const EVENT_COMPOSITE: (u8, u8) = (64, 100);

// Event kinds.
const EK_SINGLE_STEP: u8 = 1;
const EK_BREAKPOINT: u8 = 2;
const EK_EXCEPTION: u8 = 4;
const EK_THREAD_START: u8 = 6;
const EK_THREAD_DEATH: u8 = 7;
const EK_CLASS_PREPARE: u8 = 8;
const EK_CLASS_UNLOAD: u8 = 9;
const EK_VM_START: u8 = 90;
const EK_VM_DEATH: u8 = 99;

// Suspend policies.
const SUSPEND_NONE: u8 = 0;
const SUSPEND_ALL: u8 = 2;

// Event request modifier kinds.
const MOD_COUNT: u8 = 1;
const MOD_LOCATION_ONLY: u8 = 7;
const MOD_EXCEPTION_ONLY: u8 = 8;
const MOD_STEP: u8 = 10;

// Step sizes and depths.
const STEP_SIZE_LINE: u32 = 1;

// Value tags.
const TAG_ARRAY: u8 = b'[';
const TAG_BYTE: u8 = b'B';
const TAG_CHAR: u8 = b'C';
const TAG_OBJECT: u8 = b'L';
const TAG_FLOAT: u8 = b'F';
const TAG_DOUBLE: u8 = b'D';
const TAG_INT: u8 = b'I';
const TAG_LONG: u8 = b'J';
const TAG_SHORT: u8 = b'S';
const TAG_VOID: u8 = b'V';
const TAG_BOOLEAN: u8 = b'Z';
const TAG_STRING: u8 = b's';
const TAG_THREAD: u8 = b't';
const TAG_THREAD_GROUP: u8 = b'g';
const TAG_CLASS_LOADER: u8 = b'l';
const TAG_CLASS_OBJECT: u8 = b'c';

// Wire error codes with dedicated handling.
const ERR_ABSENT_INFORMATION: u16 = 101;
const ERR_NATIVE_METHOD: u16 = 511;

const INVOKE_SINGLE_THREADED: u32 = 0x02;

/// Identifier field widths negotiated with the target.
#[derive(Debug, Clone, Copy)]
struct IdSizes {
    field: usize,
    method: usize,
    object: usize,
    ref_type: usize,
    frame: usize,
}

// ── Byte cursors ─────────────────────────────────────────────────────────────

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VmError> {
        if self.pos + n > self.buf.len() {
            return Err(VmError::Corrupt("packet truncated".to_string()));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, VmError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, VmError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, VmError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn i32(&mut self) -> Result<i32, VmError> {
        Ok(self.u32()? as i32)
    }

    fn u64(&mut self) -> Result<u64, VmError> {
        let b = self.take(8)?;
        let mut out = [0u8; 8];
        out.copy_from_slice(b);
        Ok(u64::from_be_bytes(out))
    }

    fn id(&mut self, size: usize) -> Result<i64, VmError> {
        let b = self.take(size)?;
        let mut out: u64 = 0;
        for byte in b {
            out = (out << 8) | u64::from(*byte);
        }
        Ok(out as i64)
    }

    fn string(&mut self) -> Result<String, VmError> {
        let len = self.u32()? as usize;
        let b = self.take(len)?;
        String::from_utf8(b.to_vec()).map_err(|_| VmError::Corrupt("bad utf8".to_string()))
    }

    fn tagged_value(&mut self, sizes: &IdSizes) -> Result<RawValue, VmError> {
        let tag = self.u8()?;
        self.value_for_tag(tag, sizes)
    }

    fn value_for_tag(&mut self, tag: u8, sizes: &IdSizes) -> Result<RawValue, VmError> {
        let value = match tag {
            TAG_VOID => RawValue::Void,
            TAG_BOOLEAN => RawValue::Boolean(self.u8()? != 0),
            TAG_BYTE => RawValue::Byte(self.u8()? as i8),
            TAG_CHAR => RawValue::Char(self.u16()?),
            TAG_SHORT => RawValue::Short(self.u16()? as i16),
            TAG_INT => RawValue::Int(self.i32()?),
            TAG_LONG => RawValue::Long(self.u64()? as i64),
            TAG_FLOAT => RawValue::Float(f32::from_bits(self.u32()?)),
            TAG_DOUBLE => RawValue::Double(f64::from_bits(self.u64()?)),
            TAG_STRING => match self.id(sizes.object)? {
                0 => RawValue::Null,
                id => RawValue::StringRef(id),
            },
            TAG_ARRAY => match self.id(sizes.object)? {
                0 => RawValue::Null,
                id => RawValue::ArrayRef(id),
            },
            TAG_OBJECT | TAG_THREAD | TAG_THREAD_GROUP | TAG_CLASS_LOADER | TAG_CLASS_OBJECT => {
                match self.id(sizes.object)? {
                    0 => RawValue::Null,
                    id => RawValue::ObjectRef(id),
                }
            }
            other => return Err(VmError::Corrupt(format!("unknown value tag {other}"))),
        };
        Ok(value)
    }

    fn location(&mut self, sizes: &IdSizes) -> Result<RawLocation, VmError> {
        let tag = self.u8()?;
        let class_id = self.id(sizes.ref_type)?;
        let method_id = self.id(sizes.method)?;
        let index = self.u64()?;
        Ok(RawLocation {
            tag,
            class_id,
            method_id,
            index,
        })
    }
}

#[derive(Default)]
struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    fn new() -> Self {
        ByteWriter::default()
    }

    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i32(&mut self, v: i32) -> &mut Self {
        self.u32(v as u32)
    }

    fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn id(&mut self, size: usize, v: i64) -> &mut Self {
        let bytes = (v as u64).to_be_bytes();
        self.buf.extend_from_slice(&bytes[8 - size..]);
        self
    }

    fn string(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    fn tagged_value(&mut self, value: &RawValue, sizes: &IdSizes) -> &mut Self {
        match value {
            RawValue::Void => self.u8(TAG_VOID),
            RawValue::Null => self.u8(TAG_OBJECT).id(sizes.object, 0),
            RawValue::Boolean(b) => self.u8(TAG_BOOLEAN).u8(u8::from(*b)),
            RawValue::Byte(b) => self.u8(TAG_BYTE).u8(*b as u8),
            RawValue::Char(c) => self.u8(TAG_CHAR).u16(*c),
            RawValue::Short(s) => self.u8(TAG_SHORT).u16(*s as u16),
            RawValue::Int(i) => self.u8(TAG_INT).i32(*i),
            RawValue::Long(l) => self.u8(TAG_LONG).u64(*l as u64),
            RawValue::Float(f) => self.u8(TAG_FLOAT).u32(f.to_bits()),
            RawValue::Double(d) => self.u8(TAG_DOUBLE).u64(d.to_bits()),
            RawValue::StringRef(id) => self.u8(TAG_STRING).id(sizes.object, *id),
            RawValue::ArrayRef(id) => self.u8(TAG_ARRAY).id(sizes.object, *id),
            RawValue::ObjectRef(id) => self.u8(TAG_OBJECT).id(sizes.object, *id),
        }
    }
}

// ── Transport ────────────────────────────────────────────────────────────────

enum RawPacket {
    Composite(Vec<u8>),
    Disconnected,
}

struct Transport {
    writer: Mutex<TcpStream>,
    next_id: AtomicU32,
    pending: Mutex<HashMap<u32, std_mpsc::Sender<Result<Vec<u8>, u16>>>>,
    alive: AtomicBool,
}

impl Transport {
    fn new(stream: TcpStream) -> Arc<Transport> {
        Arc::new(Transport {
            writer: Mutex::new(stream),
            next_id: AtomicU32::new(1),
            pending: Mutex::new(HashMap::new()),
            alive: AtomicBool::new(true),
        })
    }

    /// Issue a command and wait for its reply payload.
    fn command(&self, cmd: (u8, u8), payload: &[u8]) -> Result<Vec<u8>, VmError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(VmError::Disconnected);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = std_mpsc::channel();
        self.pending.lock().insert(id, tx);

        let total = 11 + payload.len();
        let mut frame = Vec::with_capacity(total);
        frame.extend_from_slice(&(total as u32).to_be_bytes());
        frame.extend_from_slice(&id.to_be_bytes());
        frame.push(0); // flags
        frame.push(cmd.0);
        frame.push(cmd.1);
        frame.extend_from_slice(payload);

        {
            let mut writer = self.writer.lock();
            if let Err(e) = writer.write_all(&frame) {
                self.pending.lock().remove(&id);
                return Err(VmError::Io(e));
            }
        }

        match rx.recv_timeout(REPLY_TIMEOUT) {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(code)) => Err(VmError::Wire(code)),
            Err(std_mpsc::RecvTimeoutError::Timeout) => {
                self.pending.lock().remove(&id);
                Err(VmError::Timeout)
            }
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(VmError::Disconnected),
        }
    }

    /// Fail every waiting caller; called when the socket dies.
    fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.pending.lock().clear();
        let writer = self.writer.lock();
        let _ = writer.shutdown(std::net::Shutdown::Both);
    }
}

/// Reader thread: routes replies by id, forwards composite events.
fn run_reader(
    mut stream: TcpStream,
    transport: Arc<Transport>,
    raw_tx: std_mpsc::Sender<RawPacket>,
) {
    loop {
        let mut len_buf = [0u8; 4];
        if stream.read_exact(&mut len_buf).is_err() {
            break;
        }
        let len = u32::from_be_bytes(len_buf) as usize;
        if len < 11 {
            break;
        }
        let mut rest = vec![0u8; len - 4];
        if stream.read_exact(&mut rest).is_err() {
            break;
        }
        let id = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let flags = rest[4];
        if flags & 0x80 != 0 {
            let code = u16::from_be_bytes([rest[5], rest[6]]);
            let data = rest[7..].to_vec();
            if let Some(tx) = transport.pending.lock().remove(&id) {
                let _ = tx.send(if code == 0 { Ok(data) } else { Err(code) });
            }
        } else {
            let cmd = (rest[5], rest[6]);
            if cmd == EVENT_COMPOSITE {
                if raw_tx.send(RawPacket::Composite(rest[7..].to_vec())).is_err() {
                    break;
                }
            } else {
                trace!(set = cmd.0, cmd = cmd.1, "ignoring unsolicited command");
            }
        }
    }
    transport.shutdown();
    let _ = raw_tx.send(RawPacket::Disconnected);
}

// ── Type information cache ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MethodInfo {
    id: i64,
    name: String,
    signature: String,
}

#[derive(Debug, Clone)]
struct LineEntry {
    code_index: u64,
    line: u32,
}

#[derive(Default)]
struct TypeCache {
    signatures: HashMap<i64, String>,
    sources: HashMap<i64, Option<String>>,
    methods: HashMap<i64, Vec<MethodInfo>>,
    line_tables: HashMap<(i64, i64), Option<Vec<LineEntry>>>,
}

#[derive(Debug, Clone, Copy)]
struct RawLocation {
    #[allow(dead_code)]
    tag: u8,
    class_id: i64,
    method_id: i64,
    index: u64,
}

/// Shared lookup side of the connection, usable from the pump thread.
struct Lookups {
    transport: Arc<Transport>,
    sizes: IdSizes,
    cache: Mutex<TypeCache>,
}

impl Lookups {
    fn class_signature(&self, type_id: i64) -> Result<String, VmError> {
        if let Some(sig) = self.cache.lock().signatures.get(&type_id) {
            return Ok(sig.clone());
        }
        let mut payload = ByteWriter::new();
        payload.id(self.sizes.ref_type, type_id);
        let reply = self.transport.command(REFTYPE_SIGNATURE, &payload.buf)?;
        let sig = ByteReader::new(&reply).string()?;
        self.cache
            .lock()
            .signatures
            .insert(type_id, sig.clone());
        Ok(sig)
    }

    fn class_name(&self, type_id: i64) -> Result<String, VmError> {
        Ok(signature_to_name(&self.class_signature(type_id)?))
    }

    fn class_source(&self, type_id: i64) -> Result<Option<String>, VmError> {
        if let Some(source) = self.cache.lock().sources.get(&type_id) {
            return Ok(source.clone());
        }
        let mut payload = ByteWriter::new();
        payload.id(self.sizes.ref_type, type_id);
        let source = match self.transport.command(REFTYPE_SOURCE_FILE, &payload.buf) {
            Ok(reply) => Some(ByteReader::new(&reply).string()?),
            Err(VmError::Wire(ERR_ABSENT_INFORMATION)) => None,
            Err(e) => return Err(e),
        };
        self.cache.lock().sources.insert(type_id, source.clone());
        Ok(source)
    }

    fn class_methods(&self, type_id: i64) -> Result<Vec<MethodInfo>, VmError> {
        if let Some(methods) = self.cache.lock().methods.get(&type_id) {
            return Ok(methods.clone());
        }
        let mut payload = ByteWriter::new();
        payload.id(self.sizes.ref_type, type_id);
        let reply = self.transport.command(REFTYPE_METHODS, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()?;
        let mut methods = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = r.id(self.sizes.method)?;
            let name = r.string()?;
            let signature = r.string()?;
            let _mod_bits = r.u32()?;
            methods.push(MethodInfo {
                id,
                name,
                signature,
            });
        }
        self.cache.lock().methods.insert(type_id, methods.clone());
        Ok(methods)
    }

    fn line_table(&self, class_id: i64, method_id: i64) -> Result<Option<Vec<LineEntry>>, VmError> {
        if let Some(table) = self.cache.lock().line_tables.get(&(class_id, method_id)) {
            return Ok(table.clone());
        }
        let mut payload = ByteWriter::new();
        payload
            .id(self.sizes.ref_type, class_id)
            .id(self.sizes.method, method_id);
        let table = match self.transport.command(METHOD_LINE_TABLE, &payload.buf) {
            Ok(reply) => {
                let mut r = ByteReader::new(&reply);
                let _start = r.u64()?;
                let _end = r.u64()?;
                let count = r.u32()?;
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let code_index = r.u64()?;
                    let line = r.u32()?;
                    entries.push(LineEntry { code_index, line });
                }
                entries.sort_by_key(|e| e.code_index);
                Some(entries)
            }
            Err(VmError::Wire(ERR_ABSENT_INFORMATION)) | Err(VmError::Wire(ERR_NATIVE_METHOD)) => {
                None
            }
            Err(e) => return Err(e),
        };
        self.cache
            .lock()
            .line_tables
            .insert((class_id, method_id), table.clone());
        Ok(table)
    }

    fn superclass(&self, class_id: i64) -> Result<Option<i64>, VmError> {
        let mut payload = ByteWriter::new();
        payload.id(self.sizes.ref_type, class_id);
        let reply = self.transport.command(CLASSTYPE_SUPERCLASS, &payload.buf)?;
        let id = ByteReader::new(&reply).id(self.sizes.ref_type)?;
        Ok((id != 0).then_some(id))
    }

    /// Package-relative source path, JDI style: package dirs + source name.
    fn source_path(&self, class_name: &str, source_name: &str) -> String {
        match class_name.rfind('.') {
            Some(idx) => format!("{}/{}", class_name[..idx].replace('.', "/"), source_name),
            None => source_name.to_string(),
        }
    }

    /// Resolve a raw location to source coordinates, or `None` when the
    /// class carries no debug info.
    fn resolve(&self, raw: &RawLocation) -> Result<Option<ResolvedLocation>, VmError> {
        if raw.class_id == 0 {
            return Ok(None);
        }
        let class_name = self.class_name(raw.class_id)?;
        let Some(source_name) = self.class_source(raw.class_id)? else {
            return Ok(None);
        };
        let methods = self.class_methods(raw.class_id)?;
        let method_name = methods
            .iter()
            .find(|m| m.id == raw.method_id)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        let Some(table) = self.line_table(raw.class_id, raw.method_id)? else {
            return Ok(None);
        };
        let line = table
            .iter()
            .take_while(|e| e.code_index <= raw.index)
            .last()
            .or_else(|| table.first())
            .map(|e| e.line);
        let Some(line) = line else {
            return Ok(None);
        };
        Ok(Some(ResolvedLocation {
            class_id: raw.class_id,
            method_id: raw.method_id,
            code_index: raw.index,
            source_path: self.source_path(&class_name, &source_name),
            class_name,
            method_name,
            source_name,
            line,
        }))
    }
}

// ── Event pump ───────────────────────────────────────────────────────────────

fn run_pump(
    raw_rx: std_mpsc::Receiver<RawPacket>,
    lookups: Arc<Lookups>,
    event_tx: mpsc::UnboundedSender<VmEvent>,
) {
    while let Ok(packet) = raw_rx.recv() {
        let data = match packet {
            RawPacket::Composite(data) => data,
            RawPacket::Disconnected => {
                let _ = event_tx.send(VmEvent::Disconnected);
                break;
            }
        };
        match parse_composite(&data, &lookups) {
            Ok(events) => {
                for event in events {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => warn!(error = %e, "dropping undecodable event packet"),
        }
    }
}

fn parse_composite(data: &[u8], lookups: &Lookups) -> Result<Vec<VmEvent>, VmError> {
    let sizes = lookups.sizes;
    let mut r = ByteReader::new(data);
    let _suspend_policy = r.u8()?;
    let count = r.u32()?;
    let mut events = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let kind = r.u8()?;
        let _request_id = r.i32()?;
        match kind {
            EK_VM_START => {
                let _thread = r.id(sizes.object)?;
                events.push(VmEvent::VmStart);
            }
            EK_VM_DEATH => {
                events.push(VmEvent::VmDeath);
            }
            EK_SINGLE_STEP | EK_BREAKPOINT => {
                let thread_id = r.id(sizes.object)?;
                let raw = r.location(&sizes)?;
                let location = lookups.resolve(&raw).unwrap_or_default();
                events.push(if kind == EK_BREAKPOINT {
                    VmEvent::Breakpoint {
                        thread_id,
                        location,
                    }
                } else {
                    VmEvent::Step {
                        thread_id,
                        location,
                    }
                });
            }
            EK_EXCEPTION => {
                let thread_id = r.id(sizes.object)?;
                let _throw_location = r.location(&sizes)?;
                let _tag = r.u8()?;
                let exception = r.id(sizes.object)?;
                let catch_raw = r.location(&sizes)?;
                let catch_location = lookups.resolve(&catch_raw).unwrap_or_default();
                events.push(VmEvent::ExceptionThrown {
                    thread_id,
                    exception,
                    catch_location,
                });
            }
            EK_THREAD_START | EK_THREAD_DEATH => {
                let thread_id = r.id(sizes.object)?;
                events.push(if kind == EK_THREAD_START {
                    VmEvent::ThreadStart { thread_id }
                } else {
                    VmEvent::ThreadDeath { thread_id }
                });
            }
            EK_CLASS_PREPARE => {
                let _thread = r.id(sizes.object)?;
                let _ref_type_tag = r.u8()?;
                let type_id = r.id(sizes.ref_type)?;
                let signature = r.string()?;
                let _status = r.i32()?;
                let name = signature_to_name(&signature);
                let source_name = lookups.class_source(type_id).unwrap_or(None);
                events.push(VmEvent::ClassPrepare {
                    type_id,
                    name,
                    source_name,
                });
            }
            EK_CLASS_UNLOAD => {
                let _signature = r.string()?;
            }
            other => {
                // Unknown kinds make the rest of the packet unreadable.
                return Err(VmError::Corrupt(format!("unknown event kind {other}")));
            }
        }
    }
    Ok(events)
}

// ── Connection ───────────────────────────────────────────────────────────────

/// Live JDWP connection to a launched or attached target VM.
pub struct JdwpConnection {
    lookups: Arc<Lookups>,
    events_rx: Option<mpsc::UnboundedReceiver<VmEvent>>,
    step_requests: Vec<RequestId>,
    child: Option<Child>,
    disposed: bool,
}

impl JdwpConnection {
    /// Attach to a VM already listening on `host:port`.
    pub fn attach(host: &str, port: u16) -> Result<JdwpConnection, VmError> {
        let stream = TcpStream::connect((host, port))?;
        JdwpConnection::from_stream(stream, None)
    }

    /// Launch `command_line` with the debug agent injected and wait for it
    /// to dial back. The first token must be the VM executable.
    pub fn launch(command_line: &str) -> Result<JdwpConnection, VmError> {
        let mut tokens = command_line.split_whitespace();
        let exe = tokens
            .next()
            .ok_or_else(|| VmError::LaunchFailed("empty command line".to_string()))?;
        let rest: Vec<&str> = tokens.collect();

        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let agent = format!(
            "-agentlib:jdwp=transport=dt_socket,server=n,suspend=y,address=127.0.0.1:{port}"
        );

        let mut child = Command::new(exe)
            .arg(agent)
            .args(&rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VmError::LaunchFailed(e.to_string()))?;

        listener.set_nonblocking(true)?;
        let deadline = Instant::now() + ACCEPT_TIMEOUT;
        let stream = loop {
            match listener.accept() {
                Ok((stream, _)) => break stream,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if let Ok(Some(status)) = child.try_wait() {
                        return Err(VmError::LaunchFailed(format!(
                            "target exited before connecting: {status}"
                        )));
                    }
                    if Instant::now() > deadline {
                        let _ = child.kill();
                        return Err(VmError::LaunchFailed(
                            "target never connected".to_string(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => return Err(VmError::Io(e)),
            }
        };
        stream.set_nonblocking(false)?;
        JdwpConnection::from_stream(stream, Some(child))
    }

    fn from_stream(mut stream: TcpStream, child: Option<Child>) -> Result<JdwpConnection, VmError> {
        // Handshake both ways before any packet.
        stream.write_all(HANDSHAKE)?;
        let mut reply = [0u8; 14];
        stream.read_exact(&mut reply)?;
        if &reply != HANDSHAKE {
            return Err(VmError::Handshake);
        }

        let reader_stream = stream.try_clone()?;
        let transport = Transport::new(stream);
        let (raw_tx, raw_rx) = std_mpsc::channel();
        {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || run_reader(reader_stream, transport, raw_tx));
        }

        let sizes = {
            let reply = transport.command(VM_ID_SIZES, &[])?;
            let mut r = ByteReader::new(&reply);
            IdSizes {
                field: r.u32()? as usize,
                method: r.u32()? as usize,
                object: r.u32()? as usize,
                ref_type: r.u32()? as usize,
                frame: r.u32()? as usize,
            }
        };

        if let Ok(reply) = transport.command(VM_VERSION, &[]) {
            let mut r = ByteReader::new(&reply);
            if let Ok(description) = r.string() {
                debug!(target = description, "attached to target vm");
            }
        }

        let lookups = Arc::new(Lookups {
            transport: Arc::clone(&transport),
            sizes,
            cache: Mutex::new(TypeCache::default()),
        });

        let (event_tx, events_rx) = mpsc::unbounded_channel();
        {
            let lookups = Arc::clone(&lookups);
            let event_tx = event_tx.clone();
            std::thread::spawn(move || run_pump(raw_rx, lookups, event_tx));
        }

        let mut conn = JdwpConnection {
            lookups,
            events_rx: Some(events_rx),
            step_requests: Vec::new(),
            child,
            disposed: false,
        };
        conn.spawn_output_monitors(&event_tx);
        conn.register_standard_requests()?;
        Ok(conn)
    }

    fn spawn_output_monitors(&mut self, event_tx: &mpsc::UnboundedSender<VmEvent>) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        if let Some(stdout) = child.stdout.take() {
            let tx = event_tx.clone();
            std::thread::spawn(move || monitor_output(stdout, tx));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = event_tx.clone();
            std::thread::spawn(move || monitor_output(stderr, tx));
        }
    }

    fn register_standard_requests(&mut self) -> Result<(), VmError> {
        for kind in [EK_CLASS_PREPARE, EK_THREAD_START, EK_THREAD_DEATH] {
            let mut payload = ByteWriter::new();
            payload.u8(kind).u8(SUSPEND_NONE).u32(0);
            self.transport().command(EVENTREQ_SET, &payload.buf)?;
        }
        // Uncaught exceptions only, suspending everything for inspection.
        let mut payload = ByteWriter::new();
        payload
            .u8(EK_EXCEPTION)
            .u8(SUSPEND_ALL)
            .u32(1)
            .u8(MOD_EXCEPTION_ONLY)
            .id(self.sizes().ref_type, 0)
            .u8(0)
            .u8(1);
        self.transport().command(EVENTREQ_SET, &payload.buf)?;
        Ok(())
    }

    fn transport(&self) -> &Transport {
        &self.lookups.transport
    }

    fn sizes(&self) -> IdSizes {
        self.lookups.sizes
    }

    /// Fields of a class and all its superclasses, declaration order.
    fn fields_of(&self, type_id: i64) -> Result<Vec<(i64, i64, String, String)>, VmError> {
        let sizes = self.sizes();
        let mut out = Vec::new();
        let mut current = Some(type_id);
        while let Some(class_id) = current {
            let mut payload = ByteWriter::new();
            payload.id(sizes.ref_type, class_id);
            let reply = self.transport().command(REFTYPE_FIELDS, &payload.buf)?;
            let mut r = ByteReader::new(&reply);
            let count = r.u32()?;
            for _ in 0..count {
                let field_id = r.id(sizes.field)?;
                let name = r.string()?;
                let signature = r.string()?;
                let _mod_bits = r.u32()?;
                out.push((class_id, field_id, name, signature));
            }
            current = match self.lookups.superclass(class_id) {
                Ok(superclass) => superclass,
                // Interfaces have no superclass command; stop the walk.
                Err(VmError::Wire(_)) => None,
                Err(e) => return Err(e),
            };
        }
        Ok(out)
    }

    fn reference_type_of(&self, object: ObjectId) -> Result<i64, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.id(sizes.object, object);
        let reply = self
            .transport()
            .command(OBJREF_REFERENCE_TYPE, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let _tag = r.u8()?;
        r.id(sizes.ref_type)
    }

    /// Frame ids with raw locations for `[from, from+count)`.
    fn raw_frames(
        &self,
        thread: ThreadId,
        from: u32,
        count: i32,
    ) -> Result<Vec<(i64, RawLocation)>, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, thread)
            .u32(from)
            .i32(count);
        let reply = self.transport().command(THREAD_FRAMES, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()?;
        let mut frames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let frame_id = r.id(sizes.frame)?;
            let location = r.location(&sizes)?;
            frames.push((frame_id, location));
        }
        Ok(frames)
    }

    /// Variable table rows visible at `code_index`, excluding `this`.
    fn visible_variables(
        &self,
        location: &RawLocation,
    ) -> Result<(u32, Vec<(u32, String, String)>), VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.ref_type, location.class_id)
            .id(sizes.method, location.method_id);
        let reply = match self
            .transport()
            .command(METHOD_VARIABLE_TABLE, &payload.buf)
        {
            Ok(reply) => reply,
            Err(VmError::Wire(ERR_ABSENT_INFORMATION)) | Err(VmError::Wire(ERR_NATIVE_METHOD)) => {
                return Ok((0, Vec::new()))
            }
            Err(e) => return Err(e),
        };
        let mut r = ByteReader::new(&reply);
        let arg_count = r.u32()?;
        let count = r.u32()?;
        let mut slots = Vec::new();
        for _ in 0..count {
            let code_index = r.u64()?;
            let name = r.string()?;
            let signature = r.string()?;
            let length = r.u32()?;
            let slot = r.u32()?;
            let visible = location.index >= code_index
                && location.index < code_index + u64::from(length).max(1);
            if visible && name != "this" {
                slots.push((slot, name, signature));
            }
        }
        Ok((arg_count, slots))
    }

    fn frame_slot_values(
        &self,
        thread: ThreadId,
        frame_id: i64,
        slots: &[(u32, String, String)],
    ) -> Result<Vec<RawValue>, VmError> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, thread)
            .id(sizes.frame, frame_id)
            .u32(slots.len() as u32);
        for (slot, _, signature) in slots {
            payload.u32(*slot).u8(signature.bytes().next().unwrap_or(TAG_OBJECT));
        }
        let reply = self.transport().command(FRAME_GET_VALUES, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()? as usize;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(r.tagged_value(&sizes)?);
        }
        Ok(values)
    }

    fn frame_this_object(&self, thread: ThreadId, frame_id: i64) -> Result<Option<ObjectId>, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.id(sizes.object, thread).id(sizes.frame, frame_id);
        let reply = self.transport().command(FRAME_THIS_OBJECT, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        match r.tagged_value(&sizes)? {
            RawValue::ObjectRef(id) | RawValue::StringRef(id) | RawValue::ArrayRef(id) => {
                Ok(Some(id))
            }
            _ => Ok(None),
        }
    }

    /// Locate a slot's table row in a frame.
    fn find_slot(
        &self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<(i64, (u32, String, String)), VmError> {
        let frames = self.raw_frames(thread, frame_index, 1)?;
        let (frame_id, location) = frames
            .into_iter()
            .next()
            .ok_or_else(|| VmError::Corrupt("no such frame".to_string()))?;
        let (_, vars) = self.visible_variables(&location)?;
        let row = vars
            .into_iter()
            .find(|(s, _, _)| *s == slot)
            .ok_or(VmError::AbsentInformation)?;
        Ok((frame_id, row))
    }
}

fn monitor_output<R: Read + Send + 'static>(source: R, tx: mpsc::UnboundedSender<VmEvent>) {
    let reader = BufReader::new(source);
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if tx.send(VmEvent::Output { line }).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

impl VmConnection for JdwpConnection {
    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let _ = self.transport().command(VM_DISPOSE, &[]);
        self.transport().shutdown();
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_modifiable(&self) -> bool {
        !self.disposed
    }

    fn resume(&mut self) -> Result<(), VmError> {
        self.transport().command(VM_RESUME, &[])?;
        Ok(())
    }

    fn threads(&mut self) -> Result<Vec<ThreadSummary>, VmError> {
        let sizes = self.sizes();
        let reply = self.transport().command(VM_ALL_THREADS, &[])?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()?;
        let mut ids = Vec::with_capacity(count as usize);
        for _ in 0..count {
            ids.push(r.id(sizes.object)?);
        }
        let mut threads = Vec::with_capacity(ids.len());
        for id in ids {
            threads.push(ThreadSummary {
                id,
                name: self.thread_name(id).unwrap_or_default(),
            });
        }
        Ok(threads)
    }

    fn all_classes(&mut self) -> Result<Vec<ClassSummary>, VmError> {
        let sizes = self.sizes();
        let reply = self.transport().command(VM_ALL_CLASSES, &[])?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()?;
        let mut classes = Vec::new();
        for _ in 0..count {
            let _ref_type_tag = r.u8()?;
            let type_id = r.id(sizes.ref_type)?;
            let signature = r.string()?;
            let _status = r.u32()?;
            if !signature.starts_with('L') {
                continue;
            }
            self.lookups
                .cache
                .lock()
                .signatures
                .insert(type_id, signature.clone());
            let source_name = self.lookups.class_source(type_id).unwrap_or(None);
            classes.push(ClassSummary {
                type_id,
                name: signature_to_name(&signature),
                source_name,
            });
        }
        Ok(classes)
    }

    fn locations_of_line(
        &mut self,
        type_id: i64,
        line: u32,
    ) -> Result<Vec<ResolvedLocation>, VmError> {
        let class_name = self.lookups.class_name(type_id)?;
        let Some(source_name) = self.lookups.class_source(type_id)? else {
            return Ok(Vec::new());
        };
        let source_path = self.lookups.source_path(&class_name, &source_name);
        let mut locations = Vec::new();
        for method in self.lookups.class_methods(type_id)? {
            let Some(table) = self.lookups.line_table(type_id, method.id)? else {
                continue;
            };
            for entry in table.iter().filter(|e| e.line == line) {
                locations.push(ResolvedLocation {
                    class_id: type_id,
                    method_id: method.id,
                    code_index: entry.code_index,
                    class_name: class_name.clone(),
                    method_name: method.name.clone(),
                    source_name: source_name.clone(),
                    source_path: source_path.clone(),
                    line,
                });
            }
        }
        Ok(locations)
    }

    fn set_breakpoint(&mut self, location: &ResolvedLocation) -> Result<RequestId, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload
            .u8(EK_BREAKPOINT)
            .u8(SUSPEND_ALL)
            .u32(1)
            .u8(MOD_LOCATION_ONLY)
            .u8(1) // CLASS type tag
            .id(sizes.ref_type, location.class_id)
            .id(sizes.method, location.method_id)
            .u64(location.code_index);
        let reply = self.transport().command(EVENTREQ_SET, &payload.buf)?;
        ByteReader::new(&reply).i32()
    }

    fn clear_breakpoints(&mut self, requests: &[RequestId]) -> Result<(), VmError> {
        for request in requests {
            let mut payload = ByteWriter::new();
            payload.u8(EK_BREAKPOINT).i32(*request);
            match self.transport().command(EVENTREQ_CLEAR, &payload.buf) {
                Ok(_) | Err(VmError::Wire(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn clear_all_breakpoints(&mut self) -> Result<(), VmError> {
        self.transport()
            .command(EVENTREQ_CLEAR_ALL_BREAKPOINTS, &[])?;
        Ok(())
    }

    fn delete_step_requests(&mut self) -> Result<(), VmError> {
        for request in std::mem::take(&mut self.step_requests) {
            let mut payload = ByteWriter::new();
            payload.u8(EK_SINGLE_STEP).i32(request);
            match self.transport().command(EVENTREQ_CLEAR, &payload.buf) {
                Ok(_) | Err(VmError::Wire(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn new_step_request(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), VmError> {
        let sizes = self.sizes();
        let depth = match depth {
            StepDepth::Into => 0u32,
            StepDepth::Over => 1,
            StepDepth::Out => 2,
        };
        let mut payload = ByteWriter::new();
        payload
            .u8(EK_SINGLE_STEP)
            .u8(SUSPEND_ALL)
            .u32(2)
            .u8(MOD_COUNT)
            .i32(1)
            .u8(MOD_STEP)
            .id(sizes.object, thread)
            .u32(STEP_SIZE_LINE)
            .u32(depth);
        let reply = self.transport().command(EVENTREQ_SET, &payload.buf)?;
        let request = ByteReader::new(&reply).i32()?;
        self.step_requests.push(request);
        Ok(())
    }

    fn thread_name(&mut self, thread: ThreadId) -> Result<String, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.id(sizes.object, thread);
        let reply = self.transport().command(THREAD_NAME, &payload.buf)?;
        ByteReader::new(&reply).string()
    }

    fn frames(
        &mut self,
        thread: ThreadId,
        from: u32,
        count: i32,
    ) -> Result<Vec<FrameData>, VmError> {
        let raw = self.raw_frames(thread, from, count)?;
        let mut frames = Vec::with_capacity(raw.len());
        for (offset, (frame_id, location)) in raw.into_iter().enumerate() {
            let resolved = self.lookups.resolve(&location).unwrap_or_default();
            let (num_args, vars) = self.visible_variables(&location).unwrap_or((0, Vec::new()));
            let values = self
                .frame_slot_values(thread, frame_id, &vars)
                .unwrap_or_default();
            let locals = vars
                .into_iter()
                .zip(values)
                .map(|((slot, name, signature), value)| LocalVariable {
                    slot,
                    name,
                    signature,
                    value,
                })
                .collect();
            let this_object = self.frame_this_object(thread, frame_id).unwrap_or(None);
            let class_name = match resolved.as_ref() {
                Some(loc) => Some(loc.class_name.clone()),
                None => self.lookups.class_name(location.class_id).ok(),
            };
            frames.push(FrameData {
                index: from + offset as u32,
                this_object,
                class_name,
                method_name: resolved.as_ref().map(|l| l.method_name.clone()),
                source_name: resolved.as_ref().map(|l| l.source_name.clone()),
                source_path: resolved.as_ref().map(|l| l.source_path.clone()),
                line: resolved.as_ref().map(|l| l.line),
                num_args,
                locals,
            });
        }
        Ok(frames)
    }

    fn object_type_name(&mut self, object: ObjectId) -> Result<String, VmError> {
        let type_id = self.reference_type_of(object)?;
        self.lookups.class_name(type_id)
    }

    fn field_value(&mut self, object: ObjectId, field_name: &str) -> Result<RawValue, VmError> {
        let sizes = self.sizes();
        let type_id = self.reference_type_of(object)?;
        let fields = self.fields_of(type_id)?;
        let (_, field_id, _, _) = fields
            .into_iter()
            .find(|(_, _, name, _)| name == field_name)
            .ok_or_else(|| VmError::Unsupported(format!("no field {field_name}")))?;
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, object)
            .u32(1)
            .id(sizes.field, field_id);
        let reply = self.transport().command(OBJREF_GET_VALUES, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let count = r.u32()?;
        if count != 1 {
            return Err(VmError::Corrupt("expected one field value".to_string()));
        }
        r.tagged_value(&sizes)
    }

    fn array_length(&mut self, object: ObjectId) -> Result<u32, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.id(sizes.object, object);
        let reply = self.transport().command(ARRAY_LENGTH, &payload.buf)?;
        Ok(ByteReader::new(&reply).i32()?.max(0) as u32)
    }

    fn array_element_type(&mut self, object: ObjectId) -> Result<String, VmError> {
        let type_id = self.reference_type_of(object)?;
        let signature = self.lookups.class_signature(type_id)?;
        let element = signature.strip_prefix('[').unwrap_or(&signature);
        Ok(signature_to_name(element))
    }

    fn array_elements(
        &mut self,
        object: ObjectId,
        first: u32,
        count: u32,
    ) -> Result<Vec<RawValue>, VmError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, object)
            .u32(first)
            .u32(count);
        let reply = self.transport().command(ARRAY_GET_VALUES, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let tag = r.u8()?;
        let count = r.u32()? as usize;
        let tagged = matches!(
            tag,
            TAG_OBJECT
                | TAG_STRING
                | TAG_ARRAY
                | TAG_THREAD
                | TAG_THREAD_GROUP
                | TAG_CLASS_LOADER
                | TAG_CLASS_OBJECT
        );
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(if tagged {
                r.tagged_value(&sizes)?
            } else {
                r.value_for_tag(tag, &sizes)?
            });
        }
        Ok(values)
    }

    fn string_value(&mut self, object: ObjectId) -> Result<String, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.id(sizes.object, object);
        let reply = self.transport().command(STRING_VALUE, &payload.buf)?;
        ByteReader::new(&reply).string()
    }

    fn slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<RawValue, VmError> {
        let (frame_id, row) = self.find_slot(thread, frame_index, slot)?;
        let values = self.frame_slot_values(thread, frame_id, &[row])?;
        values
            .into_iter()
            .next()
            .ok_or_else(|| VmError::Corrupt("missing slot value".to_string()))
    }

    fn slot_signature(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<String, VmError> {
        let (_, (_, _, signature)) = self.find_slot(thread, frame_index, slot)?;
        Ok(signature)
    }

    fn set_slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
        value: RawValue,
    ) -> Result<(), VmError> {
        let sizes = self.sizes();
        let (frame_id, _) = self.find_slot(thread, frame_index, slot)?;
        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, thread)
            .id(sizes.frame, frame_id)
            .u32(1)
            .u32(slot)
            .tagged_value(&value, &sizes);
        self.transport().command(FRAME_SET_VALUES, &payload.buf)?;
        Ok(())
    }

    fn create_string(&mut self, text: &str) -> Result<ObjectId, VmError> {
        let sizes = self.sizes();
        let mut payload = ByteWriter::new();
        payload.string(text);
        let reply = self.transport().command(VM_CREATE_STRING, &payload.buf)?;
        ByteReader::new(&reply).id(sizes.object)
    }

    fn invoke_to_string(
        &mut self,
        thread: ThreadId,
        object: ObjectId,
    ) -> Result<String, VmError> {
        let sizes = self.sizes();
        let type_id = self.reference_type_of(object)?;

        // Walk up until a class declares toString().
        let mut current = Some(type_id);
        let mut found = None;
        while let Some(class_id) = current {
            if let Some(method) = self
                .lookups
                .class_methods(class_id)?
                .into_iter()
                .find(|m| m.name == "toString" && m.signature == "()Ljava/lang/String;")
            {
                found = Some((class_id, method.id));
                break;
            }
            current = self.lookups.superclass(class_id).unwrap_or(None);
        }
        let (class_id, method_id) =
            found.ok_or_else(|| VmError::Unsupported("no toString method".to_string()))?;

        let mut payload = ByteWriter::new();
        payload
            .id(sizes.object, object)
            .id(sizes.object, thread)
            .id(sizes.ref_type, class_id)
            .id(sizes.method, method_id)
            .u32(0)
            .u32(INVOKE_SINGLE_THREADED);
        let reply = self
            .transport()
            .command(OBJREF_INVOKE_METHOD, &payload.buf)?;
        let mut r = ByteReader::new(&reply);
        let value = r.tagged_value(&sizes)?;
        let _exception_tag = r.u8()?;
        let exception = r.id(sizes.object)?;
        if exception != 0 {
            return Err(VmError::Unsupported("toString raised".to_string()));
        }
        match value {
            RawValue::StringRef(id) => self.string_value(id),
            RawValue::Null => Ok("null".to_string()),
            other => Err(VmError::Corrupt(format!(
                "toString returned non-string {other:?}"
            ))),
        }
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<VmEvent>> {
        self.events_rx.take()
    }
}

impl Drop for JdwpConnection {
    fn drop(&mut self) {
        self.dispose();
    }
}
