// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use javelin_core::symbol::{DeclaredAs, MethodSymbol};
use yare::parameterized;

fn parse(text: &str) -> Result<(RpcRequest, i64), ParseError> {
    parse_frame(&Sexp::parse(text).unwrap())
}

// ── Envelope ─────────────────────────────────────────────────────────────────

#[test]
fn parses_the_rpc_envelope() {
    let (request, call_id) = parse("(:swank-rpc (swank:connection-info) 42)").unwrap();
    assert_eq!(request, RpcRequest::ConnectionInfo);
    assert_eq!(call_id, 42);
}

#[parameterized(
    not_rpc = { "(:something-else (swank:connection-info) 42)" },
    missing_id = { "(:swank-rpc (swank:connection-info))" },
    id_not_int = { "(:swank-rpc (swank:connection-info) \"42\")" },
    bare_atom = { "42" },
)]
fn malformed_envelopes_are_202(text: &str) {
    let err = parse(text).unwrap_err();
    assert_eq!(err.kind().code(), 202);
}

#[test]
fn non_symbol_form_is_203() {
    let err = parse("(:swank-rpc (42 1) 7)").unwrap_err();
    assert_eq!(err.kind().code(), 203);
}

#[test]
fn unknown_rpc_name_is_204() {
    let err = parse("(:swank-rpc (swank:no-such-op 1) 7)").unwrap_err();
    assert_eq!(err.kind().code(), 204);
}

#[test]
fn bad_arguments_of_known_op_are_202() {
    let err = parse("(:swank-rpc (swank:type-by-id \"not-an-int\") 7)").unwrap_err();
    assert_eq!(err.kind().code(), 202);
}

// ── Analyzer forms ───────────────────────────────────────────────────────────

#[test]
fn parses_completions() {
    let (request, _) = parse(
        "(:swank-rpc (swank:completions \"/src/Foo.scala\" 117 10 t nil) 1)",
    )
    .unwrap();
    assert_eq!(
        request,
        RpcRequest::Analyzer(AnalyzerReq::Completions {
            file: "/src/Foo.scala".into(),
            point: 117,
            max_results: 10,
            case_sensitive: true,
            reload: false,
        })
    );
}

#[test]
fn parses_patch_source_edits() {
    let (request, _) = parse(
        r#"(:swank-rpc (swank:patch-source "/src/Foo.scala"
             (("+" 6 "inserted") ("-" 7 10) ("*" 12 14 "replaced"))) 2)"#,
    )
    .unwrap();
    assert_eq!(
        request,
        RpcRequest::Analyzer(AnalyzerReq::PatchSource {
            file: "/src/Foo.scala".into(),
            edits: vec![
                SourceEdit::Insert {
                    offset: 6,
                    text: "inserted".to_string()
                },
                SourceEdit::Delete { from: 7, to: 10 },
                SourceEdit::Replace {
                    from: 12,
                    to: 14,
                    text: "replaced".to_string()
                },
            ],
        })
    );
}

#[test]
fn parses_import_suggestions() {
    let (request, _) =
        parse("(:swank-rpc (swank:import-suggestions (\"List\" \"Map\") 5) 3)").unwrap();
    assert_eq!(
        request,
        RpcRequest::Analyzer(AnalyzerReq::ImportSuggestions {
            names: vec!["List".to_string(), "Map".to_string()],
            limit: 5,
        })
    );
}

#[test]
fn parses_symbol_designations() {
    let (request, _) = parse(
        "(:swank-rpc (swank:symbol-designations \"/src/Foo.scala\" 0 100 (var val)) 4)",
    )
    .unwrap();
    // Kinds may arrive as bare symbols.
    match request {
        RpcRequest::Analyzer(AnalyzerReq::SymbolDesignations { kinds, .. }) => {
            assert_eq!(kinds, vec!["var".to_string(), "val".to_string()]);
        }
        other => panic!("unexpected request: {other:?}"),
    }

    let (request, _) = parse(
        "(:swank-rpc (swank:symbol-designations \"/src/Foo.scala\" 0 100 (\"var\" \"val\")) 4)",
    )
    .unwrap();
    match request {
        RpcRequest::Analyzer(AnalyzerReq::SymbolDesignations { kinds, .. }) => {
            assert_eq!(kinds, vec!["var".to_string(), "val".to_string()]);
        }
        other => panic!("unexpected request: {other:?}"),
    }
}

// ── Debug forms ──────────────────────────────────────────────────────────────

#[test]
fn parses_breakpoint_forms() {
    let (request, _) =
        parse("(:swank-rpc (swank:debug-set-break \"/src/Foo.scala\" 42) 5)").unwrap();
    assert_eq!(
        request,
        RpcRequest::Debug(DebugReq::SetBreakpoint {
            file: "/src/Foo.scala".into(),
            line: 42,
        })
    );
}

#[parameterized(
    step = { "swank:debug-step", StepKind::Into },
    next = { "swank:debug-next", StepKind::Over },
    out = { "swank:debug-step-out", StepKind::Out },
)]
fn parses_step_variants(op: &str, expected: StepKind) {
    let (request, _) = parse(&format!("(:swank-rpc ({op} 9) 5)")).unwrap();
    assert_eq!(
        request,
        RpcRequest::Debug(DebugReq::Step {
            thread_id: 9,
            depth: expected,
        })
    );
}

#[test]
fn parses_debug_locations() {
    let (request, _) = parse(
        "(:swank-rpc (swank:debug-value (:type field :object-id 17 :field \"name\")) 6)",
    )
    .unwrap();
    assert_eq!(
        request,
        RpcRequest::Debug(DebugReq::Value {
            location: DebugLocation::ObjectField {
                object_id: 17,
                field_name: "name".to_string(),
            },
        })
    );

    let (request, _) = parse(
        "(:swank-rpc (swank:debug-set-value (:type slot :thread-id 1 :frame 0 :offset 2) \"42\") 7)",
    )
    .unwrap();
    assert_eq!(
        request,
        RpcRequest::Debug(DebugReq::SetValue {
            location: DebugLocation::StackSlot {
                thread_id: 1,
                frame_index: 0,
                offset: 2,
            },
            text: "42".to_string(),
        })
    );
}

#[test]
fn parses_attach_with_string_or_int_port() {
    let (request, _) = parse("(:swank-rpc (swank:debug-attach \"localhost\" 5005) 8)").unwrap();
    assert_eq!(
        request,
        RpcRequest::Debug(DebugReq::AttachVm {
            host: "localhost".to_string(),
            port: 5005,
        })
    );
    let (request, _) =
        parse("(:swank-rpc (swank:debug-attach \"localhost\" \"5005\") 8)").unwrap();
    assert!(matches!(request, RpcRequest::Debug(DebugReq::AttachVm { port: 5005, .. })));
}

// ── Replies ──────────────────────────────────────────────────────────────────

#[test]
fn ok_reply_has_the_reply_shape() {
    let reply = ok_reply(42, Sexp::True);
    assert_eq!(reply.to_string(), "(:return (:ok t) 42)");
}

#[test]
fn abort_reply_carries_numeric_kind() {
    let reply = abort_reply(42, RpcErrorKind::AnalyzerNotReady, "analyzer is not ready");
    assert_eq!(
        reply.to_string(),
        "(:return (:abort 209 \"analyzer is not ready\") 42)"
    );
}

#[test]
fn protocol_error_has_no_call_id() {
    let frame = protocol_error(RpcErrorKind::MalformedRpc, "bad frame");
    assert_eq!(frame.to_string(), "(:protocol-error 202 \"bad frame\")");
}

// ── Payload rendering ────────────────────────────────────────────────────────

#[test]
fn renders_search_results() {
    let results = vec![
        SymbolSearchResult::Type(TypeSymbol {
            name: "java.util.List".to_string(),
            local_name: "List".to_string(),
            declared_as: DeclaredAs::Trait,
            pos: None,
        }),
        SymbolSearchResult::Method(MethodSymbol {
            name: "java.util.List.add".to_string(),
            local_name: "add".to_string(),
            owner: "java.util.List".to_string(),
            pos: None,
        }),
    ];
    let wire = payload_to_wire(&RpcPayload::SymbolSearchResults(results));
    let text = wire.to_string();
    assert!(text.contains(":name \"java.util.List\""));
    assert!(text.contains(":decl-as trait"));
    assert!(text.contains(":owner-name \"java.util.List\""));
}

#[test]
fn renders_breakpoint_lists() {
    let wire = payload_to_wire(&RpcPayload::Breakpoints {
        active: vec![Breakpoint::new("/src/Foo.scala", 42)],
        pending: vec![Breakpoint::new("/src/Bar.scala", 7)],
    });
    assert_eq!(
        wire.to_string(),
        "(:active ((:file \"/src/Foo.scala\" :line 42)) :pending ((:file \"/src/Bar.scala\" :line 7)))"
    );
}

#[test]
fn renders_debug_values() {
    let wire = payload_to_wire(&RpcPayload::DebugValue(DebugValue::Str {
        object_id: 23,
        summary: "\"hi\"".to_string(),
    }));
    let text = wire.to_string();
    assert!(text.starts_with("(:val-type str"));
    assert!(text.contains(":object-id 23"));
}

#[test]
fn none_payloads_render_nil() {
    assert_eq!(payload_to_wire(&RpcPayload::TypeInfo(None)), Sexp::Nil);
    assert_eq!(payload_to_wire(&RpcPayload::SymbolInfo(None)), Sexp::Nil);
}

// ── Events ───────────────────────────────────────────────────────────────────

#[test]
fn events_carry_no_call_id() {
    let wire = event_to_wire(&ClientEvent::AnalyzerReady);
    assert_eq!(wire.to_string(), "(:compiler-ready)");

    let wire = event_to_wire(&ClientEvent::DebugBreak {
        thread_id: 1,
        thread_name: "main".to_string(),
        pos: javelin_core::breakpoint::LineSourcePosition::new("/src/Foo.scala", 42),
    });
    assert_eq!(
        wire.to_string(),
        "(:debug-event (:type breakpoint :thread-id 1 :thread-name \"main\" :file \"/src/Foo.scala\" :line 42))"
    );
}

#[test]
fn note_events_tag_their_language() {
    let note = Note {
        file: "/src/Foo.scala".into(),
        msg: "not found".to_string(),
        beg: 10,
        end: 12,
        line: 2,
        col: 4,
        severity: javelin_core::semantic::NoteSeverity::Error,
    };
    let wire = event_to_wire(&ClientEvent::CompilerNotes {
        lang: NoteLang::Scala,
        notes: vec![note],
    });
    let text = wire.to_string();
    assert!(text.starts_with("(:scala-notes"));
    assert!(text.contains(":severity error"));
}
