// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value mirroring: the pinned-object table, value summaries, text-to-value
//! mirroring for slot writes, and backtrace materialization.

use std::collections::HashMap;
use std::sync::OnceLock;

use javelin_core::breakpoint::LineSourcePosition;
use javelin_core::debug::{
    DebugBacktrace, DebugStackFrame, DebugStackLocal, DebugValue, ObjectId, ThreadId,
};
use javelin_adapters::vm::{signature_to_name, RawValue, VmConnection, VmError};
use regex::Regex;

use crate::source_map::SourceMap;

/// Boxed reference-cell types whose summaries dereference to `elem`.
fn runtime_ref_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)] // literal pattern, cannot fail
    fn compile() -> Regex {
        Regex::new(r"^scala\.runtime\.\w+Ref$").unwrap()
    }
    PATTERN.get_or_init(compile)
}

/// How many array elements a summary renders.
const ARRAY_SUMMARY_ELEMS: u32 = 3;

/// Server-side table retaining every object the client has been shown, so
/// later `DebugValueReq` locations can dereference across suspend/resume.
/// Evicted wholesale on VM disconnect. Primitives are never pinned.
#[derive(Debug, Default)]
pub struct PinnedObjects {
    ids: HashMap<ObjectId, ()>,
}

impl PinnedObjects {
    pub fn pin(&mut self, id: ObjectId) {
        self.ids.insert(id, ());
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Pin the object behind a value, when there is one.
    pub fn pin_value(&mut self, value: &RawValue) {
        if let Some(id) = value.object_id() {
            self.pin(id);
        }
    }
}

/// Non-ambiguous string rendering of a value.
///
/// Booleans and numbers render decimal, chars single-quoted, strings
/// double-quoted, arrays `Array[a, b, c]` up to three elements, boxed
/// reference cells dereference to their `elem` field, any other reference
/// is `Instance of <local type name>`. Everything rendered gets pinned.
pub fn summary_of(
    conn: &mut dyn VmConnection,
    pins: &mut PinnedObjects,
    value: &RawValue,
) -> String {
    match value {
        RawValue::Void => "void".to_string(),
        RawValue::Null => "null".to_string(),
        RawValue::Boolean(b) => b.to_string(),
        RawValue::Byte(b) => b.to_string(),
        RawValue::Char(c) => {
            let ch = char::from_u32(u32::from(*c)).unwrap_or('?');
            format!("'{ch}'")
        }
        RawValue::Short(s) => s.to_string(),
        RawValue::Int(i) => i.to_string(),
        RawValue::Long(l) => l.to_string(),
        RawValue::Float(f) => f.to_string(),
        RawValue::Double(d) => d.to_string(),
        RawValue::StringRef(id) => {
            pins.pin(*id);
            let chars = conn.string_value(*id).unwrap_or_default();
            format!("\"{chars}\"")
        }
        RawValue::ArrayRef(id) => {
            pins.pin(*id);
            let shown = conn
                .array_elements(*id, 0, ARRAY_SUMMARY_ELEMS)
                .unwrap_or_default();
            let rendered: Vec<String> = shown
                .iter()
                .map(|element| summary_of(conn, pins, element))
                .collect();
            format!("Array[{}]", rendered.join(", "))
        }
        RawValue::ObjectRef(id) => {
            pins.pin(*id);
            let type_name = conn.object_type_name(*id).unwrap_or_default();
            if runtime_ref_pattern().is_match(&type_name) {
                match conn.field_value(*id, "elem") {
                    Ok(elem) => {
                        pins.pin_value(&elem);
                        return summary_of(conn, pins, &elem);
                    }
                    Err(_) => {}
                }
            }
            let local = type_name.rsplit('.').next().unwrap_or(&type_name);
            format!("Instance of {local}")
        }
    }
}

/// Mirror a value into the client-facing model, pinning its backing object.
pub fn to_debug_value(
    conn: &mut dyn VmConnection,
    pins: &mut PinnedObjects,
    value: &RawValue,
) -> DebugValue {
    let summary = summary_of(conn, pins, value);
    match value {
        RawValue::Null | RawValue::Void => DebugValue::Null,
        RawValue::Boolean(_) => primitive("boolean", summary),
        RawValue::Byte(_) => primitive("byte", summary),
        RawValue::Char(_) => primitive("char", summary),
        RawValue::Short(_) => primitive("short", summary),
        RawValue::Int(_) => primitive("int", summary),
        RawValue::Long(_) => primitive("long", summary),
        RawValue::Float(_) => primitive("float", summary),
        RawValue::Double(_) => primitive("double", summary),
        RawValue::StringRef(id) => DebugValue::Str {
            object_id: *id,
            summary,
        },
        RawValue::ArrayRef(id) => DebugValue::Array {
            object_id: *id,
            length: conn.array_length(*id).unwrap_or(0),
            element_type: conn.array_element_type(*id).unwrap_or_default(),
            summary,
        },
        RawValue::ObjectRef(id) => DebugValue::Object {
            object_id: *id,
            type_name: conn.object_type_name(*id).unwrap_or_default(),
            summary,
        },
    }
}

fn primitive(type_name: &str, summary: String) -> DebugValue {
    DebugValue::Primitive {
        type_name: type_name.to_string(),
        summary,
    }
}

/// The target's own rendering of a value, per the `toString` contract:
/// arrays report their length, strings return the raw characters, objects
/// invoke `toString()` on the given thread (only when the VM is
/// modifiable), primitives and null fall back to the summary.
pub fn target_to_string(
    conn: &mut dyn VmConnection,
    pins: &mut PinnedObjects,
    thread: ThreadId,
    value: &RawValue,
) -> Result<String, VmError> {
    match value {
        RawValue::ArrayRef(id) => {
            let length = conn.array_length(*id)?;
            Ok(format!("<array of {length} element(s)>"))
        }
        RawValue::StringRef(id) => conn.string_value(*id),
        RawValue::ObjectRef(id) => {
            if conn.is_modifiable() {
                conn.invoke_to_string(thread, *id)
            } else {
                Ok(summary_of(conn, pins, value))
            }
        }
        other => Ok(summary_of(conn, pins, other)),
    }
}

/// Mirror `text` into a value matching the declared JNI signature.
///
/// Numerics parse base-10, a char takes the first character, a string
/// trims one pair of surrounding double quotes. Anything else is
/// unsupported and yields `None`.
pub fn mirror_value(
    conn: &mut dyn VmConnection,
    signature: &str,
    text: &str,
) -> Option<RawValue> {
    match signature {
        "B" => text.parse::<i8>().ok().map(RawValue::Byte),
        "S" => text.parse::<i16>().ok().map(RawValue::Short),
        "I" => text.parse::<i32>().ok().map(RawValue::Int),
        "J" => text.parse::<i64>().ok().map(RawValue::Long),
        "F" => text.parse::<f32>().ok().map(RawValue::Float),
        "D" => text.parse::<f64>().ok().map(RawValue::Double),
        "C" => text.chars().next().map(|c| RawValue::Char(c as u16)),
        "Ljava/lang/String;" => {
            let trimmed = if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
                &text[1..text.len() - 1]
            } else {
                text
            };
            conn.create_string(trimmed).ok().map(RawValue::StringRef)
        }
        _ => None,
    }
}

/// Materialize frames `[from, from+count)` of a suspended thread
/// (`count = -1` reads to the end). Absent information falls back to
/// defaults rather than failing the whole backtrace.
pub fn backtrace(
    conn: &mut dyn VmConnection,
    pins: &mut PinnedObjects,
    source_map: &SourceMap,
    thread: ThreadId,
    from: u32,
    count: i32,
) -> Result<DebugBacktrace, VmError> {
    let thread_name = conn.thread_name(thread).unwrap_or_default();
    let frames = conn.frames(thread, from, count)?;

    let mut out = Vec::with_capacity(frames.len());
    for frame in frames {
        let locals = frame
            .locals
            .iter()
            .map(|local| DebugStackLocal {
                offset: local.slot,
                name: local.name.clone(),
                type_name: signature_to_name(&local.signature),
                summary: summary_of(conn, pins, &local.value),
            })
            .collect();

        let this_object_id = match frame.this_object {
            Some(id) => {
                pins.pin(id);
                id
            }
            None => -1,
        };

        let source_name = frame.source_name.clone().unwrap_or_default();
        let source_path = frame.source_path.clone().unwrap_or_else(|| source_name.clone());
        out.push(DebugStackFrame {
            index: frame.index,
            locals,
            num_args: frame.num_args,
            class_name: frame.class_name.clone().unwrap_or_else(|| "Class".to_string()),
            method_name: frame.method_name.clone().unwrap_or_else(|| "Method".to_string()),
            pc_position: LineSourcePosition {
                file: source_map.canonicalize(&source_name, &source_path),
                line: frame.line.unwrap_or(0),
            },
            this_object_id,
        });
    }

    Ok(DebugBacktrace {
        frames: out,
        thread_id: thread,
        thread_name,
    })
}

#[cfg(test)]
#[path = "values_tests.rs"]
mod tests;
