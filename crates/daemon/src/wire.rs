// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol conversions: domain values ↔ wire expressions.
//!
//! Three shapes travel the wire: requests `(:swank-rpc form call-id)`,
//! replies `(:return (:ok value) call-id)` / `(:return (:abort code detail)
//! call-id)`, and events `(event-tag payload…)` with no call-id.

use std::path::PathBuf;

use javelin_analyzer::{AnalyzerReq, SourceEdit};
use javelin_core::breakpoint::Breakpoint;
use javelin_core::debug::{DebugBacktrace, DebugLocation, DebugValue};
use javelin_core::event::NoteLang;
use javelin_core::msg::RpcPayload;
use javelin_core::semantic::{
    CallCompletionInfo, CompletionInfo, Note, PackageInfo, SymbolDesignations, TypeInfo,
    TypeInspectInfo,
};
use javelin_core::sexp::Sexp;
use javelin_core::symbol::{SymbolSearchResult, TypeSymbol};
use javelin_core::{ClientEvent, RpcErrorKind};
use javelin_debug::{DebugReq, StepKind};

/// A decoded request with its routing target.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcRequest {
    /// Answered by the router itself.
    ConnectionInfo,
    /// Shut the server down; answered before the socket closes.
    Shutdown,
    Analyzer(AnalyzerReq),
    Debug(DebugReq),
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The envelope is not a well-formed `(:swank-rpc form call-id)`.
    Malformed(String),
    /// The form inside the envelope is not a call shape we know.
    UnrecognizedForm(String),
    /// The call name is not a known RPC.
    UnrecognizedRpc(String),
}

impl ParseError {
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            ParseError::Malformed(_) => RpcErrorKind::MalformedRpc,
            ParseError::UnrecognizedForm(_) => RpcErrorKind::UnrecognizedForm,
            ParseError::UnrecognizedRpc(_) => RpcErrorKind::UnrecognizedRpc,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            ParseError::Malformed(d) | ParseError::UnrecognizedForm(d) | ParseError::UnrecognizedRpc(d) => d,
        }
    }
}

// ── Inbound ──────────────────────────────────────────────────────────────────

/// Decode `(:swank-rpc form call-id)` into a routed request.
pub fn parse_frame(frame: &Sexp) -> Result<(RpcRequest, i64), ParseError> {
    let items = frame
        .as_list()
        .ok_or_else(|| ParseError::Malformed("frame is not a list".to_string()))?;
    match items {
        [Sexp::Keyword(tag), form, Sexp::Int(call_id)] if tag == "swank-rpc" => {
            let request = parse_form(form)?;
            Ok((request, *call_id))
        }
        _ => Err(ParseError::Malformed(
            "expected (:swank-rpc form call-id)".to_string(),
        )),
    }
}

fn parse_form(form: &Sexp) -> Result<RpcRequest, ParseError> {
    let items = form
        .as_list()
        .ok_or_else(|| ParseError::UnrecognizedForm("call form is not a list".to_string()))?;
    let [Sexp::Symbol(op), args @ ..] = items else {
        return Err(ParseError::UnrecognizedForm(
            "call form does not start with a symbol".to_string(),
        ));
    };

    let malformed = |what: &str| ParseError::Malformed(format!("{op}: {what}"));

    let str_at = |i: usize| -> Result<&str, ParseError> {
        args.get(i)
            .and_then(Sexp::as_str)
            .ok_or_else(|| malformed("expected a string argument"))
    };
    let int_at = |i: usize| -> Result<i64, ParseError> {
        args.get(i)
            .and_then(Sexp::as_int)
            .ok_or_else(|| malformed("expected an integer argument"))
    };
    let bool_at = |i: usize| -> Result<bool, ParseError> {
        args.get(i)
            .map(Sexp::is_truthy)
            .ok_or_else(|| malformed("expected a boolean argument"))
    };
    // String lists on the wire; clients may send bare symbols instead.
    let strings_at = |i: usize| -> Result<Vec<String>, ParseError> {
        args.get(i)
            .and_then(Sexp::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        Sexp::Str(s) => Some(s.clone()),
                        Sexp::Symbol(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect()
            })
            .ok_or_else(|| malformed("expected a list argument"))
    };
    let path_at = |i: usize| -> Result<PathBuf, ParseError> { Ok(PathBuf::from(str_at(i)?)) };

    let request = match op.as_str() {
        "swank:connection-info" => RpcRequest::ConnectionInfo,
        "swank:shutdown-server" => RpcRequest::Shutdown,

        // -- analyzer --
        "swank:remove-file" => RpcRequest::Analyzer(AnalyzerReq::RemoveFile { file: path_at(0)? }),
        "swank:reload-all" => RpcRequest::Analyzer(AnalyzerReq::ReloadAll),
        "swank:reload-files" => RpcRequest::Analyzer(AnalyzerReq::ReloadFiles {
            files: strings_at(0)?.into_iter().map(PathBuf::from).collect(),
        }),
        "swank:patch-source" => RpcRequest::Analyzer(AnalyzerReq::PatchSource {
            file: path_at(0)?,
            edits: parse_edits(args.get(1), op)?,
        }),
        "swank:completions" => RpcRequest::Analyzer(AnalyzerReq::Completions {
            file: path_at(0)?,
            point: int_at(1)?,
            max_results: int_at(2)?.max(0) as usize,
            case_sensitive: bool_at(3)?,
            reload: bool_at(4)?,
        }),
        "swank:uses-of-symbol-at-point" => RpcRequest::Analyzer(AnalyzerReq::UsesOfSymAtPoint {
            file: path_at(0)?,
            point: int_at(1)?,
        }),
        "swank:package-member-completion" => {
            RpcRequest::Analyzer(AnalyzerReq::PackageMemberCompletion {
                path: str_at(0)?.to_string(),
                prefix: str_at(1)?.to_string(),
            })
        }
        "swank:inspect-type-at-point" => RpcRequest::Analyzer(AnalyzerReq::InspectTypeAtPoint {
            file: path_at(0)?,
            point: int_at(1)?,
        }),
        "swank:inspect-type-by-id" => {
            RpcRequest::Analyzer(AnalyzerReq::InspectTypeById { id: int_at(0)? })
        }
        "swank:symbol-at-point" => RpcRequest::Analyzer(AnalyzerReq::SymbolAtPoint {
            file: path_at(0)?,
            point: int_at(1)?,
        }),
        "swank:inspect-package-by-path" => {
            RpcRequest::Analyzer(AnalyzerReq::InspectPackageByPath {
                path: str_at(0)?.to_string(),
            })
        }
        "swank:type-at-point" => RpcRequest::Analyzer(AnalyzerReq::TypeAtPoint {
            file: path_at(0)?,
            point: int_at(1)?,
        }),
        "swank:type-by-id" => RpcRequest::Analyzer(AnalyzerReq::TypeById { id: int_at(0)? }),
        "swank:type-by-name" => RpcRequest::Analyzer(AnalyzerReq::TypeByName {
            name: str_at(0)?.to_string(),
        }),
        "swank:type-by-name-at-point" => RpcRequest::Analyzer(AnalyzerReq::TypeByNameAtPoint {
            name: str_at(0)?.to_string(),
            file: path_at(1)?,
            point: int_at(2)?,
        }),
        "swank:call-completion" => {
            RpcRequest::Analyzer(AnalyzerReq::CallCompletion { id: int_at(0)? })
        }
        "swank:symbol-designations" => RpcRequest::Analyzer(AnalyzerReq::SymbolDesignations {
            file: path_at(0)?,
            start: int_at(1)?,
            end: int_at(2)?,
            kinds: strings_at(3)?,
        }),
        "swank:import-suggestions" => RpcRequest::Analyzer(AnalyzerReq::ImportSuggestions {
            names: strings_at(0)?,
            limit: int_at(1)?.max(0) as usize,
        }),
        "swank:public-symbol-search" => RpcRequest::Analyzer(AnalyzerReq::PublicSymbolSearch {
            keywords: strings_at(0)?,
            limit: int_at(1)?.max(0) as usize,
        }),
        "swank:refactor-cancel" => {
            RpcRequest::Analyzer(AnalyzerReq::RefactorCancel { id: int_at(0)? })
        }

        // -- debugger --
        "swank:debug-start" => RpcRequest::Debug(DebugReq::StartVm {
            command_line: str_at(0)?.to_string(),
        }),
        "swank:debug-attach" => RpcRequest::Debug(DebugReq::AttachVm {
            host: str_at(0)?.to_string(),
            port: parse_port(args.get(1)).ok_or_else(|| malformed("expected a port"))?,
        }),
        "swank:debug-stop" => RpcRequest::Debug(DebugReq::StopVm),
        "swank:debug-active-vm" => RpcRequest::Debug(DebugReq::ActiveVm),
        "swank:debug-set-break" => RpcRequest::Debug(DebugReq::SetBreakpoint {
            file: path_at(0)?,
            line: int_at(1)?.max(0) as u32,
        }),
        "swank:debug-clear-break" => RpcRequest::Debug(DebugReq::ClearBreakpoint {
            file: path_at(0)?,
            line: int_at(1)?.max(0) as u32,
        }),
        "swank:debug-clear-all-breaks" => RpcRequest::Debug(DebugReq::ClearAllBreakpoints),
        "swank:debug-list-breakpoints" => RpcRequest::Debug(DebugReq::ListBreakpoints),
        "swank:debug-continue" => RpcRequest::Debug(DebugReq::Continue),
        "swank:debug-step" => RpcRequest::Debug(DebugReq::Step {
            thread_id: int_at(0)?,
            depth: StepKind::Into,
        }),
        "swank:debug-next" => RpcRequest::Debug(DebugReq::Step {
            thread_id: int_at(0)?,
            depth: StepKind::Over,
        }),
        "swank:debug-step-out" => RpcRequest::Debug(DebugReq::Step {
            thread_id: int_at(0)?,
            depth: StepKind::Out,
        }),
        "swank:debug-backtrace" => RpcRequest::Debug(DebugReq::Backtrace {
            thread_id: int_at(0)?,
            from: int_at(1)?.max(0) as u32,
            count: int_at(2)? as i32,
        }),
        "swank:debug-value" => RpcRequest::Debug(DebugReq::Value {
            location: parse_location(args.first(), op)?,
        }),
        "swank:debug-to-string" => RpcRequest::Debug(DebugReq::ToString {
            thread_id: int_at(0)?,
            location: parse_location(args.get(1), op)?,
        }),
        "swank:debug-set-value" => RpcRequest::Debug(DebugReq::SetValue {
            location: parse_location(args.first(), op)?,
            text: str_at(1)?.to_string(),
        }),

        other => return Err(ParseError::UnrecognizedRpc(other.to_string())),
    };
    Ok(request)
}

fn parse_port(arg: Option<&Sexp>) -> Option<u16> {
    match arg? {
        Sexp::Int(i) => u16::try_from(*i).ok(),
        Sexp::Str(s) => s.parse().ok(),
        _ => None,
    }
}

/// Edits: `(("+" offset text) ("-" from to) ("*" from to text))`.
fn parse_edits(arg: Option<&Sexp>, op: &str) -> Result<Vec<SourceEdit>, ParseError> {
    let malformed = |what: &str| ParseError::Malformed(format!("{op}: {what}"));
    let items = arg
        .and_then(Sexp::as_list)
        .ok_or_else(|| malformed("expected an edit list"))?;
    let mut edits = Vec::with_capacity(items.len());
    for item in items {
        let edit = item.as_list().ok_or_else(|| malformed("edit is not a list"))?;
        match edit {
            [Sexp::Str(kind), Sexp::Int(offset), Sexp::Str(text)] if kind == "+" => {
                edits.push(SourceEdit::Insert {
                    offset: *offset,
                    text: text.clone(),
                });
            }
            [Sexp::Str(kind), Sexp::Int(from), Sexp::Int(to)] if kind == "-" => {
                edits.push(SourceEdit::Delete {
                    from: *from,
                    to: *to,
                });
            }
            [Sexp::Str(kind), Sexp::Int(from), Sexp::Int(to), Sexp::Str(text)] if kind == "*" => {
                edits.push(SourceEdit::Replace {
                    from: *from,
                    to: *to,
                    text: text.clone(),
                });
            }
            _ => return Err(malformed("unknown edit shape")),
        }
    }
    Ok(edits)
}

/// Locations: `(:type reference :object-id N)`, `(:type field :object-id N
/// :field name)`, `(:type element :object-id N :index I)`, `(:type slot
/// :thread-id T :frame F :offset O)`.
fn parse_location(arg: Option<&Sexp>, op: &str) -> Result<DebugLocation, ParseError> {
    let malformed = |what: &str| ParseError::Malformed(format!("{op}: {what}"));
    let plist = arg.ok_or_else(|| malformed("expected a location"))?;
    let kind = plist
        .plist_get("type")
        .and_then(|v| match v {
            Sexp::Symbol(s) => Some(s.as_str()),
            Sexp::Str(s) => Some(s.as_str()),
            _ => None,
        })
        .ok_or_else(|| malformed("location has no :type"))?;
    let int_key = |key: &str| -> Result<i64, ParseError> {
        plist
            .plist_get(key)
            .and_then(Sexp::as_int)
            .ok_or_else(|| malformed("location field missing"))
    };
    let location = match kind {
        "reference" => DebugLocation::ObjectReference {
            object_id: int_key("object-id")?,
        },
        "field" => DebugLocation::ObjectField {
            object_id: int_key("object-id")?,
            field_name: plist
                .plist_get("field")
                .and_then(Sexp::as_str)
                .ok_or_else(|| malformed("location has no :field"))?
                .to_string(),
        },
        "element" => DebugLocation::ArrayElement {
            object_id: int_key("object-id")?,
            index: int_key("index")?.max(0) as u32,
        },
        "slot" => DebugLocation::StackSlot {
            thread_id: int_key("thread-id")?,
            frame_index: int_key("frame")?.max(0) as u32,
            offset: int_key("offset")?.max(0) as u32,
        },
        _ => return Err(malformed("unknown location type")),
    };
    Ok(location)
}

// ── Outbound ─────────────────────────────────────────────────────────────────

/// `(:return (:ok value) call-id)`
pub fn ok_reply(call_id: i64, value: Sexp) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("return"),
        Sexp::list(vec![Sexp::keyword("ok"), value]),
        Sexp::Int(call_id),
    ])
}

/// `(:return (:abort code detail) call-id)`
pub fn abort_reply(call_id: i64, kind: RpcErrorKind, detail: &str) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("return"),
        Sexp::list(vec![
            Sexp::keyword("abort"),
            Sexp::Int(kind.code()),
            Sexp::string(detail),
        ]),
        Sexp::Int(call_id),
    ])
}

/// Unsolicited `(:protocol-error code detail)`, no call-id.
pub fn protocol_error(kind: RpcErrorKind, detail: &str) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("protocol-error"),
        Sexp::Int(kind.code()),
        Sexp::string(detail),
    ])
}

/// Render a reply payload into its wire value.
pub fn payload_to_wire(payload: &RpcPayload) -> Sexp {
    match payload {
        RpcPayload::True => Sexp::True,
        RpcPayload::Bool(b) => Sexp::bool(*b),
        RpcPayload::Str(s) => Sexp::string(s.clone()),
        RpcPayload::CompletionList(list) => Sexp::list(vec![
            Sexp::keyword("prefix"),
            Sexp::string(list.prefix.clone()),
            Sexp::keyword("completions"),
            Sexp::list(list.completions.iter().map(completion_to_wire).collect()),
        ]),
        RpcPayload::Completions(completions) => {
            Sexp::list(completions.iter().map(completion_to_wire).collect())
        }
        RpcPayload::SourceRanges(ranges) => Sexp::list(
            ranges
                .iter()
                .map(|r| {
                    Sexp::list(vec![
                        Sexp::keyword("file"),
                        path_to_wire(&r.file),
                        Sexp::keyword("start"),
                        Sexp::Int(r.start),
                        Sexp::keyword("end"),
                        Sexp::Int(r.end),
                    ])
                })
                .collect(),
        ),
        RpcPayload::TypeInfo(info) => option_to_wire(info.as_ref(), type_info_to_wire),
        RpcPayload::TypeInspect(info) => option_to_wire(info.as_ref(), type_inspect_to_wire),
        RpcPayload::SymbolInfo(info) => option_to_wire(info.as_ref(), |s| {
            let mut out = vec![
                Sexp::keyword("name"),
                Sexp::string(s.name.clone()),
                Sexp::keyword("local-name"),
                Sexp::string(s.local_name.clone()),
                Sexp::keyword("type"),
                type_info_to_wire(&s.type_info),
                Sexp::keyword("is-callable"),
                Sexp::bool(s.is_callable),
            ];
            if let Some(pos) = &s.decl_pos {
                out.push(Sexp::keyword("decl-pos"));
                out.push(source_pos_to_wire(pos));
            }
            Sexp::list(out)
        }),
        RpcPayload::PackageInfo(info) => option_to_wire(info.as_ref(), package_to_wire),
        RpcPayload::CallCompletion(info) => option_to_wire(info.as_ref(), call_completion_to_wire),
        RpcPayload::SymbolDesignations(d) => designations_to_wire(d),
        RpcPayload::SymbolSearchResults(results) => {
            Sexp::list(results.iter().map(search_result_to_wire).collect())
        }
        RpcPayload::ImportSuggestions(lists) => Sexp::list(
            lists
                .iter()
                .map(|types| Sexp::list(types.iter().map(type_symbol_to_wire).collect()))
                .collect(),
        ),
        RpcPayload::Breakpoints { active, pending } => Sexp::list(vec![
            Sexp::keyword("active"),
            Sexp::list(active.iter().map(breakpoint_to_wire).collect()),
            Sexp::keyword("pending"),
            Sexp::list(pending.iter().map(breakpoint_to_wire).collect()),
        ]),
        RpcPayload::DebugValue(value) => debug_value_to_wire(value),
        RpcPayload::Backtrace(bt) => backtrace_to_wire(bt),
    }
}

/// Render an asynchronous event frame.
pub fn event_to_wire(event: &ClientEvent) -> Sexp {
    match event {
        ClientEvent::AnalyzerReady => Sexp::list(vec![Sexp::keyword("compiler-ready")]),
        ClientEvent::FullTypeCheckComplete => {
            Sexp::list(vec![Sexp::keyword("full-typecheck-finished")])
        }
        ClientEvent::IndexerReady => Sexp::list(vec![Sexp::keyword("indexer-ready")]),
        ClientEvent::CompilerNotes { lang, notes } => {
            let tag = match lang {
                NoteLang::Scala => "scala-notes",
                NoteLang::Java => "java-notes",
            };
            Sexp::list(vec![
                Sexp::keyword(tag),
                Sexp::list(vec![
                    Sexp::keyword("notes"),
                    Sexp::list(notes.iter().map(note_to_wire).collect()),
                ]),
            ])
        }
        ClientEvent::ClearAllNotes { lang } => {
            let tag = match lang {
                NoteLang::Scala => "clear-all-scala-notes",
                NoteLang::Java => "clear-all-java-notes",
            };
            Sexp::list(vec![Sexp::keyword(tag)])
        }
        ClientEvent::DebugVmStart => debug_event(type_tag("start")),
        ClientEvent::DebugVmDisconnect => debug_event(type_tag("disconnect")),
        ClientEvent::DebugBreak {
            thread_id,
            thread_name,
            pos,
        } => debug_event(vec![
            type_tag("breakpoint"),
            thread_fields(*thread_id, thread_name),
            vec![
                Sexp::keyword("file"),
                path_to_wire(&pos.file),
                Sexp::keyword("line"),
                Sexp::Int(i64::from(pos.line)),
            ],
        ]
        .concat()),
        ClientEvent::DebugStep {
            thread_id,
            thread_name,
            pos,
        } => debug_event(vec![
            type_tag("step"),
            thread_fields(*thread_id, thread_name),
            vec![
                Sexp::keyword("file"),
                path_to_wire(&pos.file),
                Sexp::keyword("line"),
                Sexp::Int(i64::from(pos.line)),
            ],
        ]
        .concat()),
        ClientEvent::DebugException {
            exception_id,
            thread_id,
            thread_name,
            catch_pos,
        } => {
            let mut fields = type_tag("exception");
            fields.push(Sexp::keyword("exception"));
            fields.push(Sexp::Int(*exception_id));
            fields.extend(thread_fields(*thread_id, thread_name));
            if let Some(pos) = catch_pos {
                fields.push(Sexp::keyword("file"));
                fields.push(path_to_wire(&pos.file));
                fields.push(Sexp::keyword("line"));
                fields.push(Sexp::Int(i64::from(pos.line)));
            }
            debug_event(fields)
        }
        ClientEvent::DebugThreadStart { thread_id } => {
            let mut fields = type_tag("thread-start");
            fields.push(Sexp::keyword("thread-id"));
            fields.push(Sexp::Int(*thread_id));
            debug_event(fields)
        }
        ClientEvent::DebugThreadDeath { thread_id } => {
            let mut fields = type_tag("thread-death");
            fields.push(Sexp::keyword("thread-id"));
            fields.push(Sexp::Int(*thread_id));
            debug_event(fields)
        }
        ClientEvent::DebugOutput { text } => {
            let mut fields = type_tag("output");
            fields.push(Sexp::keyword("body"));
            fields.push(Sexp::string(text.clone()));
            debug_event(fields)
        }
    }
}

fn debug_event(fields: Vec<Sexp>) -> Sexp {
    Sexp::list(vec![Sexp::keyword("debug-event"), Sexp::list(fields)])
}

fn type_tag(name: &str) -> Vec<Sexp> {
    vec![Sexp::keyword("type"), Sexp::symbol(name)]
}

fn thread_fields(thread_id: i64, thread_name: &str) -> Vec<Sexp> {
    vec![
        Sexp::keyword("thread-id"),
        Sexp::Int(thread_id),
        Sexp::keyword("thread-name"),
        Sexp::string(thread_name),
    ]
}

fn option_to_wire<T>(value: Option<&T>, f: impl Fn(&T) -> Sexp) -> Sexp {
    match value {
        Some(v) => f(v),
        None => Sexp::Nil,
    }
}

fn path_to_wire(path: &std::path::Path) -> Sexp {
    Sexp::string(path.to_string_lossy().into_owned())
}

fn source_pos_to_wire(pos: &javelin_core::symbol::SourcePosition) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("file"),
        path_to_wire(&pos.file),
        Sexp::keyword("offset"),
        Sexp::Int(pos.offset),
    ])
}

fn completion_to_wire(c: &CompletionInfo) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("name"),
        Sexp::string(c.name.clone()),
        Sexp::keyword("type-sig"),
        Sexp::string(c.type_sig.clone()),
        Sexp::keyword("is-callable"),
        Sexp::bool(c.is_callable),
        Sexp::keyword("relevance"),
        Sexp::Int(i64::from(c.relevance)),
    ])
}

fn type_info_to_wire(t: &TypeInfo) -> Sexp {
    let mut out = vec![
        Sexp::keyword("name"),
        Sexp::string(t.name.clone()),
        Sexp::keyword("full-name"),
        Sexp::string(t.full_name.clone()),
        Sexp::keyword("decl-as"),
        Sexp::symbol(t.declared_as.as_str()),
        Sexp::keyword("type-id"),
        Sexp::Int(t.id),
    ];
    if let Some(pos) = &t.pos {
        out.push(Sexp::keyword("pos"));
        out.push(source_pos_to_wire(pos));
    }
    Sexp::list(out)
}

fn type_inspect_to_wire(t: &TypeInspectInfo) -> Sexp {
    let mut out = vec![Sexp::keyword("type"), type_info_to_wire(&t.type_info)];
    if let Some(companion) = t.companion_id {
        out.push(Sexp::keyword("companion-id"));
        out.push(Sexp::Int(companion));
    }
    out.push(Sexp::keyword("interfaces"));
    out.push(Sexp::list(t.interfaces.iter().map(type_info_to_wire).collect()));
    Sexp::list(out)
}

fn package_to_wire(p: &PackageInfo) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("name"),
        Sexp::string(p.name.clone()),
        Sexp::keyword("full-name"),
        Sexp::string(p.full_name.clone()),
        Sexp::keyword("members"),
        Sexp::list(p.members.iter().map(type_info_to_wire).collect()),
    ])
}

fn call_completion_to_wire(c: &CallCompletionInfo) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("result-type"),
        type_info_to_wire(&c.result_type),
        Sexp::keyword("param-sections"),
        Sexp::list(
            c.param_sections
                .iter()
                .map(|section| {
                    Sexp::list(vec![
                        Sexp::keyword("params"),
                        Sexp::list(
                            section
                                .params
                                .iter()
                                .map(|(name, ty)| {
                                    Sexp::list(vec![
                                        Sexp::string(name.clone()),
                                        Sexp::string(ty.clone()),
                                    ])
                                })
                                .collect(),
                        ),
                        Sexp::keyword("is-implicit"),
                        Sexp::bool(section.is_implicit),
                    ])
                })
                .collect(),
        ),
    ])
}

fn designations_to_wire(d: &SymbolDesignations) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("file"),
        path_to_wire(&d.file),
        Sexp::keyword("syms"),
        Sexp::list(
            d.designations
                .iter()
                .map(|s| {
                    Sexp::list(vec![
                        Sexp::symbol(s.kind.clone()),
                        Sexp::Int(s.start),
                        Sexp::Int(s.end),
                    ])
                })
                .collect(),
        ),
    ])
}

fn note_to_wire(n: &Note) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("file"),
        path_to_wire(&n.file),
        Sexp::keyword("msg"),
        Sexp::string(n.msg.clone()),
        Sexp::keyword("beg"),
        Sexp::Int(n.beg),
        Sexp::keyword("end"),
        Sexp::Int(n.end),
        Sexp::keyword("line"),
        Sexp::Int(i64::from(n.line)),
        Sexp::keyword("col"),
        Sexp::Int(i64::from(n.col)),
        Sexp::keyword("severity"),
        Sexp::symbol(n.severity.as_str()),
    ])
}

fn type_symbol_to_wire(t: &TypeSymbol) -> Sexp {
    let mut out = vec![
        Sexp::keyword("type"),
        Sexp::symbol("type"),
        Sexp::keyword("name"),
        Sexp::string(t.name.clone()),
        Sexp::keyword("local-name"),
        Sexp::string(t.local_name.clone()),
        Sexp::keyword("decl-as"),
        Sexp::symbol(t.declared_as.as_str()),
    ];
    if let Some(pos) = &t.pos {
        out.push(Sexp::keyword("pos"));
        out.push(source_pos_to_wire(pos));
    }
    Sexp::list(out)
}

fn search_result_to_wire(result: &SymbolSearchResult) -> Sexp {
    match result {
        SymbolSearchResult::Type(t) => type_symbol_to_wire(t),
        SymbolSearchResult::Method(m) => {
            let mut out = vec![
                Sexp::keyword("type"),
                Sexp::symbol("method"),
                Sexp::keyword("name"),
                Sexp::string(m.name.clone()),
                Sexp::keyword("local-name"),
                Sexp::string(m.local_name.clone()),
                Sexp::keyword("decl-as"),
                Sexp::symbol("method"),
                Sexp::keyword("owner-name"),
                Sexp::string(m.owner.clone()),
            ];
            if let Some(pos) = &m.pos {
                out.push(Sexp::keyword("pos"));
                out.push(source_pos_to_wire(pos));
            }
            Sexp::list(out)
        }
    }
}

fn breakpoint_to_wire(b: &Breakpoint) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("file"),
        path_to_wire(&b.pos.file),
        Sexp::keyword("line"),
        Sexp::Int(i64::from(b.pos.line)),
    ])
}

fn debug_value_to_wire(value: &DebugValue) -> Sexp {
    let mut out = vec![Sexp::keyword("val-type")];
    match value {
        DebugValue::Null => {
            out.push(Sexp::symbol("null"));
        }
        DebugValue::Primitive { type_name, summary } => {
            out.push(Sexp::symbol("prim"));
            out.push(Sexp::keyword("type-name"));
            out.push(Sexp::string(type_name.clone()));
            out.push(Sexp::keyword("summary"));
            out.push(Sexp::string(summary.clone()));
        }
        DebugValue::Str { object_id, summary } => {
            out.push(Sexp::symbol("str"));
            out.push(Sexp::keyword("object-id"));
            out.push(Sexp::Int(*object_id));
            out.push(Sexp::keyword("summary"));
            out.push(Sexp::string(summary.clone()));
        }
        DebugValue::Array {
            object_id,
            length,
            element_type,
            summary,
        } => {
            out.push(Sexp::symbol("arr"));
            out.push(Sexp::keyword("object-id"));
            out.push(Sexp::Int(*object_id));
            out.push(Sexp::keyword("length"));
            out.push(Sexp::Int(i64::from(*length)));
            out.push(Sexp::keyword("element-type"));
            out.push(Sexp::string(element_type.clone()));
            out.push(Sexp::keyword("summary"));
            out.push(Sexp::string(summary.clone()));
        }
        DebugValue::Object {
            object_id,
            type_name,
            summary,
        } => {
            out.push(Sexp::symbol("obj"));
            out.push(Sexp::keyword("object-id"));
            out.push(Sexp::Int(*object_id));
            out.push(Sexp::keyword("type-name"));
            out.push(Sexp::string(type_name.clone()));
            out.push(Sexp::keyword("summary"));
            out.push(Sexp::string(summary.clone()));
        }
    }
    Sexp::list(out)
}

fn backtrace_to_wire(bt: &DebugBacktrace) -> Sexp {
    Sexp::list(vec![
        Sexp::keyword("frames"),
        Sexp::list(
            bt.frames
                .iter()
                .map(|frame| {
                    Sexp::list(vec![
                        Sexp::keyword("index"),
                        Sexp::Int(i64::from(frame.index)),
                        Sexp::keyword("locals"),
                        Sexp::list(
                            frame
                                .locals
                                .iter()
                                .map(|local| {
                                    Sexp::list(vec![
                                        Sexp::keyword("index"),
                                        Sexp::Int(i64::from(local.offset)),
                                        Sexp::keyword("name"),
                                        Sexp::string(local.name.clone()),
                                        Sexp::keyword("type-name"),
                                        Sexp::string(local.type_name.clone()),
                                        Sexp::keyword("summary"),
                                        Sexp::string(local.summary.clone()),
                                    ])
                                })
                                .collect(),
                        ),
                        Sexp::keyword("num-args"),
                        Sexp::Int(i64::from(frame.num_args)),
                        Sexp::keyword("class-name"),
                        Sexp::string(frame.class_name.clone()),
                        Sexp::keyword("method-name"),
                        Sexp::string(frame.method_name.clone()),
                        Sexp::keyword("pc-location"),
                        Sexp::list(vec![
                            Sexp::keyword("file"),
                            path_to_wire(&frame.pc_position.file),
                            Sexp::keyword("line"),
                            Sexp::Int(i64::from(frame.pc_position.line)),
                        ]),
                        Sexp::keyword("this-object-id"),
                        Sexp::Int(frame.this_object_id),
                    ])
                })
                .collect(),
        ),
        Sexp::keyword("thread-id"),
        Sexp::Int(bt.thread_id),
        Sexp::keyword("thread-name"),
        Sexp::string(bt.thread_name.clone()),
    ])
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
