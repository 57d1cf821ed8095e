// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake target-VM connection for testing.
//!
//! Scripted classes, threads, frames and values; tests inject events
//! through a cloned handle and inspect the recorded calls afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use javelin_core::debug::{ObjectId, ThreadId};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{
    ClassSummary, FrameData, RawValue, RequestId, ResolvedLocation, StepDepth, ThreadSummary,
    VmConnection, VmConnector, VmError, VmEvent,
};

/// Connector that hands out clones of one scripted [`FakeVm`].
#[derive(Clone)]
pub struct FakeConnector {
    vm: FakeVm,
    pub fail_launch: bool,
}

impl FakeConnector {
    pub fn new(vm: FakeVm) -> Self {
        FakeConnector {
            vm,
            fail_launch: false,
        }
    }
}

impl VmConnector for FakeConnector {
    type Conn = FakeVm;

    fn launch(&self, _command_line: &str) -> Result<FakeVm, VmError> {
        if self.fail_launch {
            return Err(VmError::LaunchFailed("scripted failure".to_string()));
        }
        Ok(self.vm.clone())
    }

    fn attach(&self, _host: &str, _port: u16) -> Result<FakeVm, VmError> {
        Ok(self.vm.clone())
    }
}

/// Recorded VM interaction
#[derive(Debug, Clone, PartialEq)]
pub enum VmCall {
    Dispose,
    Resume,
    SetBreakpoint(ResolvedLocation),
    ClearBreakpoints(Vec<RequestId>),
    ClearAllBreakpoints,
    DeleteStepRequests,
    NewStepRequest { thread: ThreadId, depth: StepDepth },
    SetSlotValue { thread: ThreadId, frame: u32, slot: u32, value: RawValue },
    CreateString(String),
    InvokeToString { thread: ThreadId, object: ObjectId },
}

/// Scripted state behind a [`FakeVm`].
#[derive(Default)]
pub struct FakeVmState {
    pub calls: Vec<VmCall>,
    pub disposed: bool,
    pub classes: Vec<ClassSummary>,
    pub threads: Vec<ThreadSummary>,
    pub line_locations: HashMap<(i64, u32), Vec<ResolvedLocation>>,
    pub frames: HashMap<ThreadId, Vec<FrameData>>,
    pub object_types: HashMap<ObjectId, String>,
    pub fields: HashMap<(ObjectId, String), RawValue>,
    pub arrays: HashMap<ObjectId, (String, Vec<RawValue>)>,
    pub strings: HashMap<ObjectId, String>,
    pub to_strings: HashMap<ObjectId, String>,
    pub installed_breakpoints: Vec<(RequestId, ResolvedLocation)>,
    pub step_requests: Vec<(ThreadId, StepDepth)>,
    next_request: RequestId,
    next_string: ObjectId,
}

/// Fake target-VM connection for testing
#[derive(Clone)]
pub struct FakeVm {
    state: Arc<Mutex<FakeVmState>>,
    events_tx: mpsc::UnboundedSender<VmEvent>,
    events_rx: Arc<Mutex<Option<mpsc::UnboundedReceiver<VmEvent>>>>,
}

impl Default for FakeVm {
    fn default() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        FakeVm {
            state: Arc::new(Mutex::new(FakeVmState {
                next_request: 1,
                next_string: 9000,
                ..FakeVmState::default()
            })),
            events_tx,
            events_rx: Arc::new(Mutex::new(Some(events_rx))),
        }
    }
}

impl FakeVm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<VmCall> {
        self.state.lock().calls.clone()
    }

    /// Inject an event as if the pump translated it off the wire.
    pub fn push_event(&self, event: VmEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Mutate the scripted state.
    pub fn script(&self, f: impl FnOnce(&mut FakeVmState)) {
        f(&mut self.state.lock());
    }

    pub fn add_class(&self, type_id: i64, name: &str, source_name: Option<&str>) {
        self.state.lock().classes.push(ClassSummary {
            type_id,
            name: name.to_string(),
            source_name: source_name.map(str::to_string),
        });
    }

    /// Script a line location inside `method` of an already-added class.
    pub fn add_line_location(&self, type_id: i64, line: u32, method: &str) {
        let mut state = self.state.lock();
        let class = state
            .classes
            .iter()
            .find(|c| c.type_id == type_id)
            .cloned();
        let Some(class) = class else { return };
        let source_name = class.source_name.clone().unwrap_or_default();
        let location = ResolvedLocation {
            class_id: type_id,
            method_id: state.line_locations.len() as i64 + 1,
            code_index: u64::from(line),
            class_name: class.name.clone(),
            method_name: method.to_string(),
            source_name: source_name.clone(),
            source_path: source_name,
            line,
        };
        state
            .line_locations
            .entry((type_id, line))
            .or_default()
            .push(location);
    }

    pub fn add_thread(&self, id: ThreadId, name: &str) {
        self.state.lock().threads.push(ThreadSummary {
            id,
            name: name.to_string(),
        });
    }

    pub fn set_frames(&self, thread: ThreadId, frames: Vec<FrameData>) {
        self.state.lock().frames.insert(thread, frames);
    }

    pub fn set_object(&self, object: ObjectId, type_name: &str) {
        self.state
            .lock()
            .object_types
            .insert(object, type_name.to_string());
    }

    pub fn set_field(&self, object: ObjectId, name: &str, value: RawValue) {
        self.state
            .lock()
            .fields
            .insert((object, name.to_string()), value);
    }

    pub fn set_array(&self, object: ObjectId, element_type: &str, values: Vec<RawValue>) {
        self.state
            .lock()
            .arrays
            .insert(object, (element_type.to_string(), values));
    }

    pub fn set_string(&self, object: ObjectId, value: &str) {
        self.state.lock().strings.insert(object, value.to_string());
    }

    pub fn set_to_string(&self, object: ObjectId, value: &str) {
        self.state
            .lock()
            .to_strings
            .insert(object, value.to_string());
    }

    /// Installed breakpoints as (request, location) pairs.
    pub fn installed_breakpoints(&self) -> Vec<(RequestId, ResolvedLocation)> {
        self.state.lock().installed_breakpoints.clone()
    }

    fn record(&self, call: VmCall) {
        self.state.lock().calls.push(call);
    }

    fn find_local(
        &self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<super::LocalVariable, VmError> {
        let state = self.state.lock();
        state
            .frames
            .get(&thread)
            .and_then(|frames| frames.iter().find(|f| f.index == frame_index))
            .and_then(|frame| frame.locals.iter().find(|l| l.slot == slot))
            .cloned()
            .ok_or(VmError::AbsentInformation)
    }
}

impl VmConnection for FakeVm {
    fn dispose(&mut self) {
        let mut state = self.state.lock();
        if !state.disposed {
            state.disposed = true;
            state.calls.push(VmCall::Dispose);
        }
    }

    fn is_modifiable(&self) -> bool {
        !self.state.lock().disposed
    }

    fn resume(&mut self) -> Result<(), VmError> {
        self.record(VmCall::Resume);
        Ok(())
    }

    fn threads(&mut self) -> Result<Vec<ThreadSummary>, VmError> {
        Ok(self.state.lock().threads.clone())
    }

    fn all_classes(&mut self) -> Result<Vec<ClassSummary>, VmError> {
        Ok(self.state.lock().classes.clone())
    }

    fn locations_of_line(
        &mut self,
        type_id: i64,
        line: u32,
    ) -> Result<Vec<ResolvedLocation>, VmError> {
        Ok(self
            .state
            .lock()
            .line_locations
            .get(&(type_id, line))
            .cloned()
            .unwrap_or_default())
    }

    fn set_breakpoint(&mut self, location: &ResolvedLocation) -> Result<RequestId, VmError> {
        self.record(VmCall::SetBreakpoint(location.clone()));
        let mut state = self.state.lock();
        let request = state.next_request;
        state.next_request += 1;
        state
            .installed_breakpoints
            .push((request, location.clone()));
        Ok(request)
    }

    fn clear_breakpoints(&mut self, requests: &[RequestId]) -> Result<(), VmError> {
        self.record(VmCall::ClearBreakpoints(requests.to_vec()));
        self.state
            .lock()
            .installed_breakpoints
            .retain(|(id, _)| !requests.contains(id));
        Ok(())
    }

    fn clear_all_breakpoints(&mut self) -> Result<(), VmError> {
        self.record(VmCall::ClearAllBreakpoints);
        self.state.lock().installed_breakpoints.clear();
        Ok(())
    }

    fn delete_step_requests(&mut self) -> Result<(), VmError> {
        self.record(VmCall::DeleteStepRequests);
        self.state.lock().step_requests.clear();
        Ok(())
    }

    fn new_step_request(&mut self, thread: ThreadId, depth: StepDepth) -> Result<(), VmError> {
        self.record(VmCall::NewStepRequest { thread, depth });
        self.state.lock().step_requests.push((thread, depth));
        Ok(())
    }

    fn thread_name(&mut self, thread: ThreadId) -> Result<String, VmError> {
        self.state
            .lock()
            .threads
            .iter()
            .find(|t| t.id == thread)
            .map(|t| t.name.clone())
            .ok_or(VmError::Disconnected)
    }

    fn frames(
        &mut self,
        thread: ThreadId,
        from: u32,
        count: i32,
    ) -> Result<Vec<FrameData>, VmError> {
        let state = self.state.lock();
        let all = state.frames.get(&thread).cloned().unwrap_or_default();
        let from = from as usize;
        if from >= all.len() {
            return Ok(Vec::new());
        }
        let to = if count < 0 {
            all.len()
        } else {
            (from + count as usize).min(all.len())
        };
        Ok(all[from..to].to_vec())
    }

    fn object_type_name(&mut self, object: ObjectId) -> Result<String, VmError> {
        let state = self.state.lock();
        if let Some(name) = state.object_types.get(&object) {
            return Ok(name.clone());
        }
        if state.strings.contains_key(&object) {
            return Ok("java.lang.String".to_string());
        }
        if let Some((element, _)) = state.arrays.get(&object) {
            return Ok(format!("{element}[]"));
        }
        Err(VmError::UnknownObject(object))
    }

    fn field_value(&mut self, object: ObjectId, field_name: &str) -> Result<RawValue, VmError> {
        self.state
            .lock()
            .fields
            .get(&(object, field_name.to_string()))
            .cloned()
            .ok_or_else(|| VmError::Unsupported(format!("no field {field_name}")))
    }

    fn array_length(&mut self, object: ObjectId) -> Result<u32, VmError> {
        self.state
            .lock()
            .arrays
            .get(&object)
            .map(|(_, values)| values.len() as u32)
            .ok_or(VmError::UnknownObject(object))
    }

    fn array_element_type(&mut self, object: ObjectId) -> Result<String, VmError> {
        self.state
            .lock()
            .arrays
            .get(&object)
            .map(|(element, _)| element.clone())
            .ok_or(VmError::UnknownObject(object))
    }

    fn array_elements(
        &mut self,
        object: ObjectId,
        first: u32,
        count: u32,
    ) -> Result<Vec<RawValue>, VmError> {
        let state = self.state.lock();
        let (_, values) = state
            .arrays
            .get(&object)
            .ok_or(VmError::UnknownObject(object))?;
        let first = first as usize;
        let to = (first + count as usize).min(values.len());
        Ok(values.get(first..to).unwrap_or_default().to_vec())
    }

    fn string_value(&mut self, object: ObjectId) -> Result<String, VmError> {
        self.state
            .lock()
            .strings
            .get(&object)
            .cloned()
            .ok_or(VmError::UnknownObject(object))
    }

    fn slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<RawValue, VmError> {
        Ok(self.find_local(thread, frame_index, slot)?.value)
    }

    fn slot_signature(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
    ) -> Result<String, VmError> {
        Ok(self.find_local(thread, frame_index, slot)?.signature)
    }

    fn set_slot_value(
        &mut self,
        thread: ThreadId,
        frame_index: u32,
        slot: u32,
        value: RawValue,
    ) -> Result<(), VmError> {
        self.record(VmCall::SetSlotValue {
            thread,
            frame: frame_index,
            slot,
            value: value.clone(),
        });
        let mut state = self.state.lock();
        let local = state
            .frames
            .get_mut(&thread)
            .and_then(|frames| frames.iter_mut().find(|f| f.index == frame_index))
            .and_then(|frame| frame.locals.iter_mut().find(|l| l.slot == slot))
            .ok_or(VmError::AbsentInformation)?;
        local.value = value;
        Ok(())
    }

    fn create_string(&mut self, text: &str) -> Result<ObjectId, VmError> {
        self.record(VmCall::CreateString(text.to_string()));
        let mut state = self.state.lock();
        let id = state.next_string;
        state.next_string += 1;
        state.strings.insert(id, text.to_string());
        Ok(id)
    }

    fn invoke_to_string(
        &mut self,
        thread: ThreadId,
        object: ObjectId,
    ) -> Result<String, VmError> {
        self.record(VmCall::InvokeToString { thread, object });
        self.state
            .lock()
            .to_strings
            .get(&object)
            .cloned()
            .ok_or(VmError::UnknownObject(object))
    }

    fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<VmEvent>> {
        self.events_rx.lock().take()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
