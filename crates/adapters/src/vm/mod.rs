// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Target-VM debug connection.
//!
//! `VmConnection` is the seam between the Debug controller and the platform
//! debug wire protocol. The real implementation speaks JDWP over a socket
//! (`jdwp.rs`); tests use the scripted [`FakeVm`].
//!
//! Events from the target arrive on a pump task and are delivered through
//! the receiver returned by [`VmConnection::take_events`]; the controller
//! must never be called back from the pump.

mod jdwp;

pub use jdwp::JdwpConnection;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnector, FakeVm, FakeVmState, VmCall};

use javelin_core::debug::{ObjectId, ThreadId};
use thiserror::Error;
use tokio::sync::mpsc;

/// Identifier of an installed event request (breakpoint or step).
pub type RequestId = i32;

/// Errors from target-VM operations
#[derive(Debug, Error)]
pub enum VmError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("debug wire error code {0}")]
    Wire(u16),

    #[error("handshake failed")]
    Handshake,

    #[error("vm disconnected")]
    Disconnected,

    #[error("launch failed: {0}")]
    LaunchFailed(String),

    #[error("unknown object id: {0}")]
    UnknownObject(ObjectId),

    #[error("no line info available")]
    AbsentInformation,

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("reply corrupt: {0}")]
    Corrupt(String),

    #[error("reply timed out")]
    Timeout,
}

/// A value read from the target VM, tagged the way the wire tags it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Void,
    Null,
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    StringRef(ObjectId),
    ArrayRef(ObjectId),
    ObjectRef(ObjectId),
}

impl RawValue {
    /// The object id behind this value, when it is a reference.
    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            RawValue::StringRef(id) | RawValue::ArrayRef(id) | RawValue::ObjectRef(id) => {
                Some(*id)
            }
            _ => None,
        }
    }
}

/// A live thread in the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub name: String,
}

/// A loaded reference type in the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSummary {
    pub type_id: i64,
    /// Dotted binary name, e.g. `com.example.Foo$`.
    pub name: String,
    /// Unqualified source file name, when debug info carries it.
    pub source_name: Option<String>,
}

/// A code location resolved to source coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub class_id: i64,
    pub method_id: i64,
    pub code_index: u64,
    pub class_name: String,
    pub method_name: String,
    pub source_name: String,
    /// Slash-separated path the compiler recorded, falls back to the name.
    pub source_path: String,
    pub line: u32,
}

/// A visible local variable slot with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub slot: u32,
    pub name: String,
    /// JNI type signature of the declared type.
    pub signature: String,
    pub value: RawValue,
}

/// One stack frame of a suspended thread.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameData {
    pub index: u32,
    pub this_object: Option<ObjectId>,
    pub class_name: Option<String>,
    pub method_name: Option<String>,
    pub source_name: Option<String>,
    pub source_path: Option<String>,
    pub line: Option<u32>,
    pub num_args: u32,
    /// Empty when the method carries no variable table.
    pub locals: Vec<LocalVariable>,
}

/// Step granularity requested by the client. Stride is always one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDepth {
    Into,
    Over,
    Out,
}

/// An event translated off the target's event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum VmEvent {
    VmStart,
    VmDeath,
    Disconnected,
    ClassPrepare {
        type_id: i64,
        name: String,
        source_name: Option<String>,
    },
    Breakpoint {
        thread_id: ThreadId,
        location: Option<ResolvedLocation>,
    },
    Step {
        thread_id: ThreadId,
        location: Option<ResolvedLocation>,
    },
    ExceptionThrown {
        thread_id: ThreadId,
        exception: ObjectId,
        catch_location: Option<ResolvedLocation>,
    },
    ThreadStart {
        thread_id: ThreadId,
    },
    ThreadDeath {
        thread_id: ThreadId,
    },
    /// One line from the target process's stdout or stderr.
    Output {
        line: String,
    },
}

/// Connection to a target VM.
///
/// All methods are synchronous; the Debug controller serializes access
/// behind its adapter mutex. `dispose` is idempotent and safe after the
/// target has already gone away.
pub trait VmConnection: Send + 'static {
    /// Tear down the connection and release the target.
    fn dispose(&mut self);

    /// Whether mirrored values may be written and methods invoked.
    fn is_modifiable(&self) -> bool;

    fn resume(&mut self) -> Result<(), VmError>;

    fn threads(&mut self) -> Result<Vec<ThreadSummary>, VmError>;

    fn all_classes(&mut self) -> Result<Vec<ClassSummary>, VmError>;

    /// Locations of `line` across the class itself and all its methods.
    fn locations_of_line(
        &mut self,
        type_id: i64,
        line: u32,
    ) -> Result<Vec<ResolvedLocation>, VmError>;

    /// Install a breakpoint request (SUSPEND_ALL) at the location.
    fn set_breakpoint(&mut self, location: &ResolvedLocation) -> Result<RequestId, VmError>;

    fn clear_breakpoints(&mut self, requests: &[RequestId]) -> Result<(), VmError>;

    fn clear_all_breakpoints(&mut self) -> Result<(), VmError>;

    /// Delete every outstanding step request.
    fn delete_step_requests(&mut self) -> Result<(), VmError>;

    /// Install a one-shot line step request for the thread.
    fn new_step_request(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), VmError>;

    fn thread_name(&mut self, thread: ThreadId) -> Result<String, VmError>;

    /// Frames `[from, from+count)`; `count = -1` reads to the end.
    fn frames(&mut self, thread: ThreadId, from: u32, count: i32)
        -> Result<Vec<FrameData>, VmError>;

    fn object_type_name(&mut self, object: ObjectId) -> Result<String, VmError>;

    fn field_value(&mut self, object: ObjectId, field_name: &str) -> Result<RawValue, VmError>;

    fn array_length(&mut self, object: ObjectId) -> Result<u32, VmError>;

    /// Dotted element type name of an array object.
    fn array_element_type(&mut self, object: ObjectId) -> Result<String, VmError>;

    fn array_elements(
        &mut self,
        object: ObjectId,
        first: u32,
        count: u32,
    ) -> Result<Vec<RawValue>, VmError>;

    fn string_value(&mut self, object: ObjectId) -> Result<String, VmError>;

    fn slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<RawValue, VmError>;

    /// Declared JNI signature of a local slot.
    fn slot_signature(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<String, VmError>;

    fn set_slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
        value: RawValue,
    ) -> Result<(), VmError>;

    /// Mirror a string into the target, returning its reference.
    fn create_string(&mut self, text: &str) -> Result<ObjectId, VmError>;

    /// Invoke the target's `toString()` on `thread` (single-threaded).
    fn invoke_to_string(&mut self, thread: ThreadId, object: ObjectId)
        -> Result<String, VmError>;

    /// Take the translated event stream. Yields `None` after the first call.
    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<VmEvent>>;
}

/// Factory for target-VM connections; the Debug controller is generic over
/// it so tests can hand out scripted fakes.
pub trait VmConnector: Send + Sync + 'static {
    type Conn: VmConnection;

    /// Launch a command line with the debug agent injected.
    fn launch(&self, command_line: &str) -> Result<Self::Conn, VmError>;

    /// Attach to a VM already listening for a debugger.
    fn attach(&self, host: &str, port: u16) -> Result<Self::Conn, VmError>;
}

/// The production connector, speaking JDWP.
#[derive(Debug, Clone, Copy, Default)]
pub struct JdwpConnector;

impl VmConnector for JdwpConnector {
    type Conn = JdwpConnection;

    fn launch(&self, command_line: &str) -> Result<JdwpConnection, VmError> {
        JdwpConnection::launch(command_line)
    }

    fn attach(&self, host: &str, port: u16) -> Result<JdwpConnection, VmError> {
        JdwpConnection::attach(host, port)
    }
}

/// Convert a JNI type signature to a dotted display name.
///
/// `Ljava/lang/String;` → `java.lang.String`, `[I` → `int[]`, `I` → `int`.
pub fn signature_to_name(sig: &str) -> String {
    match sig.chars().next() {
        Some('L') => sig
            .trim_start_matches('L')
            .trim_end_matches(';')
            .replace('/', "."),
        Some('[') => format!("{}[]", signature_to_name(&sig[1..])),
        Some('Z') => "boolean".to_string(),
        Some('B') => "byte".to_string(),
        Some('C') => "char".to_string(),
        Some('S') => "short".to_string(),
        Some('I') => "int".to_string(),
        Some('J') => "long".to_string(),
        Some('F') => "float".to_string(),
        Some('D') => "double".to_string(),
        Some('V') => "void".to_string(),
        _ => sig.to_string(),
    }
}
