// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use javelin_adapters::vm::{FakeConnector, FakeVm, FrameData, LocalVariable, VmCall};
use javelin_core::debug::DebugValue;

struct Fixture {
    vm: FakeVm,
    tx: mpsc::Sender<DebugMsg>,
    router_rx: mpsc::Receiver<RouterMsg>,
}

fn fixture() -> Fixture {
    let vm = FakeVm::new();
    let connector = FakeConnector::new(vm.clone());
    let (router_tx, router_rx) = mpsc::channel(64);
    let tx = DebugController::spawn(connector, Vec::new(), router_tx);
    Fixture { vm, tx, router_rx }
}

async fn rpc(fx: &Fixture, req: DebugReq, call_id: i64) {
    fx.tx.send(DebugMsg::Rpc { req, call_id }).await.unwrap();
}

async fn expect_result(fx: &mut Fixture, call_id: i64) -> RpcPayload {
    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcResult {
            call_id: got,
            payload,
        }) => {
            assert_eq!(got, call_id);
            payload
        }
        other => panic!("expected result for {call_id}, got {other:?}"),
    }
}

async fn expect_event(fx: &mut Fixture) -> ClientEvent {
    match fx.router_rx.recv().await {
        Some(RouterMsg::Async(event)) => event,
        other => panic!("expected event, got {other:?}"),
    }
}

/// Wait for an effect of an injected event; events travel through the
/// pump task and are not ordered against directly sent RPCs.
async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition never met");
}

/// Start the VM and drive it to `Running` through the start event.
async fn started(fx: &mut Fixture) {
    rpc(
        fx,
        DebugReq::StartVm {
            command_line: "java com.example.Main".to_string(),
        },
        1,
    )
    .await;
    assert_eq!(expect_result(fx, 1).await, RpcPayload::True);

    fx.vm.push_event(VmEvent::VmStart);
    assert_eq!(expect_event(fx).await, ClientEvent::DebugVmStart);
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn start_reports_active_and_resumes_on_vm_start() {
    let mut fx = fixture();
    rpc(&fx, DebugReq::ActiveVm, 1).await;
    assert_eq!(expect_result(&mut fx, 1).await, RpcPayload::Bool(false));

    started(&mut fx).await;

    rpc(&fx, DebugReq::ActiveVm, 2).await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::Bool(true));
    assert!(fx.vm.calls().contains(&VmCall::Resume));
}

#[tokio::test]
async fn requests_without_a_vm_abort_with_200() {
    let mut fx = fixture();
    rpc(&fx, DebugReq::Continue, 5).await;
    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcError { call_id, kind, .. }) => {
            assert_eq!(call_id, 5);
            assert_eq!(kind.code(), 200);
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn vm_death_migrates_active_breakpoints_to_pending() {
    let mut fx = fixture();
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::SetBreakpoint {
            file: "/src/Foo.scala".into(),
            line: 42,
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::True);

    fx.vm.push_event(VmEvent::VmDeath);
    assert_eq!(expect_event(&mut fx).await, ClientEvent::DebugVmDisconnect);
    assert!(fx.vm.calls().contains(&VmCall::Dispose));

    // The breakpoint survives as pending for the next session.
    rpc(&fx, DebugReq::ListBreakpoints, 3).await;
    match expect_result(&mut fx, 3).await {
        RpcPayload::Breakpoints { active, pending } => {
            assert!(active.is_empty());
            assert_eq!(pending, vec![Breakpoint::new("/src/Foo.scala", 42)]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

// ── Breakpoints ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn breakpoint_installs_when_class_is_loaded() {
    let mut fx = fixture();
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::SetBreakpoint {
            file: "/src/Foo.scala".into(),
            line: 42,
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::True);
    assert_eq!(fx.vm.installed_breakpoints().len(), 1);

    rpc(&fx, DebugReq::ListBreakpoints, 3).await;
    match expect_result(&mut fx, 3).await {
        RpcPayload::Breakpoints { active, pending } => {
            assert_eq!(active.len(), 1);
            assert!(pending.is_empty());
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn pending_breakpoint_promotes_on_class_prepare() {
    let mut fx = fixture();
    started(&mut fx).await;

    // No class for Foo.scala yet: success reply, recorded pending.
    rpc(
        &fx,
        DebugReq::SetBreakpoint {
            file: "/src/Foo.scala".into(),
            line: 42,
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::True);
    assert!(fx.vm.installed_breakpoints().is_empty());

    // The class arrives; the breakpoint installs with no client action.
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    fx.vm.push_event(VmEvent::ClassPrepare {
        type_id: 10,
        name: "com.example.Foo".to_string(),
        source_name: Some("Foo.scala".to_string()),
    });
    let vm = fx.vm.clone();
    wait_until(move || !vm.installed_breakpoints().is_empty()).await;

    rpc(&fx, DebugReq::ListBreakpoints, 3).await;
    match expect_result(&mut fx, 3).await {
        RpcPayload::Breakpoints { active, pending } => {
            assert_eq!(active, vec![Breakpoint::new("/src/Foo.scala", 42)]);
            assert!(pending.is_empty());
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    assert_eq!(fx.vm.installed_breakpoints().len(), 1);
}

#[tokio::test]
async fn pending_and_active_sets_stay_disjoint() {
    let mut fx = fixture();
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    // One resolvable, one not.
    rpc(
        &fx,
        DebugReq::SetBreakpoint {
            file: "/src/Foo.scala".into(),
            line: 42,
        },
        2,
    )
    .await;
    rpc(
        &fx,
        DebugReq::SetBreakpoint {
            file: "/src/Bar.scala".into(),
            line: 7,
        },
        3,
    )
    .await;
    expect_result(&mut fx, 2).await;
    expect_result(&mut fx, 3).await;

    rpc(&fx, DebugReq::ListBreakpoints, 4).await;
    match expect_result(&mut fx, 4).await {
        RpcPayload::Breakpoints { active, pending } => {
            assert_eq!(active, vec![Breakpoint::new("/src/Foo.scala", 42)]);
            assert_eq!(pending, vec![Breakpoint::new("/src/Bar.scala", 7)]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn last_arrived_rpc_wins_for_same_line() {
    let mut fx = fixture();
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    let file: std::path::PathBuf = "/src/Foo.scala".into();
    rpc(&fx, DebugReq::SetBreakpoint { file: file.clone(), line: 42 }, 2).await;
    rpc(&fx, DebugReq::ClearBreakpoint { file: file.clone(), line: 42 }, 3).await;
    rpc(&fx, DebugReq::SetBreakpoint { file: file.clone(), line: 42 }, 4).await;
    expect_result(&mut fx, 2).await;
    expect_result(&mut fx, 3).await;
    expect_result(&mut fx, 4).await;

    rpc(&fx, DebugReq::ListBreakpoints, 5).await;
    match expect_result(&mut fx, 5).await {
        RpcPayload::Breakpoints { active, .. } => {
            assert_eq!(active, vec![Breakpoint::new(&file, 42)]);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn clear_all_empties_both_sets() {
    let mut fx = fixture();
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    rpc(&fx, DebugReq::SetBreakpoint { file: "/src/Foo.scala".into(), line: 42 }, 2).await;
    rpc(&fx, DebugReq::SetBreakpoint { file: "/src/Bar.scala".into(), line: 7 }, 3).await;
    expect_result(&mut fx, 2).await;
    expect_result(&mut fx, 3).await;

    rpc(&fx, DebugReq::ClearAllBreakpoints, 4).await;
    expect_result(&mut fx, 4).await;

    rpc(&fx, DebugReq::ListBreakpoints, 5).await;
    match expect_result(&mut fx, 5).await {
        RpcPayload::Breakpoints { active, pending } => {
            assert!(active.is_empty());
            assert!(pending.is_empty());
        }
        other => panic!("unexpected payload: {other:?}"),
    }
    assert!(fx.vm.calls().contains(&VmCall::ClearAllBreakpoints));
}

// ── Stepping & events ────────────────────────────────────────────────────────

#[tokio::test]
async fn step_deletes_previous_requests_then_resumes() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::Step {
            thread_id: 1,
            depth: StepKind::Over,
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::True);

    let calls = fx.vm.calls();
    let delete_at = calls
        .iter()
        .position(|c| *c == VmCall::DeleteStepRequests)
        .unwrap();
    let step_at = calls
        .iter()
        .position(|c| matches!(c, VmCall::NewStepRequest { thread: 1, .. }))
        .unwrap();
    let resume_at = calls.iter().rposition(|c| *c == VmCall::Resume).unwrap();
    assert!(delete_at < step_at && step_at < resume_at);
}

#[tokio::test]
async fn breakpoint_event_reaches_client_with_position() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    fx.vm.add_class(10, "com.example.Foo", Some("Foo.scala"));
    fx.vm.add_line_location(10, 42, "run");
    started(&mut fx).await;

    let location = fx.vm.locations_of_line(10, 42).unwrap().remove(0);
    fx.vm.push_event(VmEvent::Breakpoint {
        thread_id: 1,
        location: Some(location),
    });

    match expect_event(&mut fx).await {
        ClientEvent::DebugBreak {
            thread_id,
            thread_name,
            pos,
        } => {
            assert_eq!(thread_id, 1);
            assert_eq!(thread_name, "main");
            assert_eq!(pos.line, 42);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn exception_event_pins_the_exception_object() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    fx.vm.set_object(55, "java.lang.RuntimeException");
    started(&mut fx).await;

    fx.vm.push_event(VmEvent::ExceptionThrown {
        thread_id: 1,
        exception: 55,
        catch_location: None,
    });
    match expect_event(&mut fx).await {
        ClientEvent::DebugException {
            exception_id,
            thread_id,
            catch_pos,
            ..
        } => {
            assert_eq!(exception_id, 55);
            assert_eq!(thread_id, 1);
            assert!(catch_pos.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // The pinned exception can now be dereferenced.
    rpc(
        &fx,
        DebugReq::Value {
            location: DebugLocation::ObjectReference { object_id: 55 },
        },
        2,
    )
    .await;
    match expect_result(&mut fx, 2).await {
        RpcPayload::DebugValue(DebugValue::Object { object_id, .. }) => {
            assert_eq!(object_id, 55)
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

// ── Values ───────────────────────────────────────────────────────────────────

/// Backtrace pins `this`; its fields can then be read and re-read through
/// freshly pinned ids.
#[tokio::test]
async fn value_pinning_round_trip() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    fx.vm.set_object(17, "com.example.Widget");
    fx.vm.set_string(23, "widget-name");
    fx.vm.set_field(17, "name", javelin_adapters::vm::RawValue::StringRef(23));
    fx.vm.set_frames(
        1,
        vec![FrameData {
            index: 0,
            this_object: Some(17),
            class_name: Some("com.example.Widget".to_string()),
            method_name: Some("run".to_string()),
            source_name: Some("Widget.scala".to_string()),
            source_path: Some("com/example/Widget.scala".to_string()),
            line: Some(3),
            num_args: 0,
            locals: Vec::new(),
        }],
    );
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::Backtrace {
            thread_id: 1,
            from: 0,
            count: -1,
        },
        2,
    )
    .await;
    let this_id = match expect_result(&mut fx, 2).await {
        RpcPayload::Backtrace(bt) => bt.frames[0].this_object_id,
        other => panic!("unexpected payload: {other:?}"),
    };
    assert_eq!(this_id, 17);

    // Dereference a field of the pinned `this`.
    rpc(
        &fx,
        DebugReq::Value {
            location: DebugLocation::ObjectField {
                object_id: this_id,
                field_name: "name".to_string(),
            },
        },
        3,
    )
    .await;
    let string_id = match expect_result(&mut fx, 3).await {
        RpcPayload::DebugValue(DebugValue::Str { object_id, summary }) => {
            assert_eq!(summary, "\"widget-name\"");
            object_id
        }
        other => panic!("unexpected payload: {other:?}"),
    };

    // The returned value was pinned in turn and resolves to the same string.
    rpc(
        &fx,
        DebugReq::Value {
            location: DebugLocation::ObjectReference {
                object_id: string_id,
            },
        },
        4,
    )
    .await;
    match expect_result(&mut fx, 4).await {
        RpcPayload::DebugValue(DebugValue::Str { summary, .. }) => {
            assert_eq!(summary, "\"widget-name\"")
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn unpinned_object_reference_is_an_error() {
    let mut fx = fixture();
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::Value {
            location: DebugLocation::ObjectReference { object_id: 999 },
        },
        2,
    )
    .await;
    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcError { kind, .. }) => assert_eq!(kind.code(), 200),
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn set_value_mirrors_into_stack_slot() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    fx.vm.set_frames(
        1,
        vec![FrameData {
            index: 0,
            this_object: None,
            class_name: None,
            method_name: None,
            source_name: None,
            source_path: None,
            line: None,
            num_args: 0,
            locals: vec![LocalVariable {
                slot: 2,
                name: "count".to_string(),
                signature: "I".to_string(),
                value: javelin_adapters::vm::RawValue::Int(1),
            }],
        }],
    );
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::SetValue {
            location: DebugLocation::StackSlot {
                thread_id: 1,
                frame_index: 0,
                offset: 2,
            },
            text: "42".to_string(),
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::Bool(true));
    assert_eq!(
        fx.vm.slot_value(1, 0, 2).unwrap(),
        javelin_adapters::vm::RawValue::Int(42)
    );
}

#[tokio::test]
async fn set_value_rejects_non_slot_locations_without_aborting() {
    let mut fx = fixture();
    fx.vm.set_object(17, "com.example.Widget");
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::SetValue {
            location: DebugLocation::ObjectField {
                object_id: 17,
                field_name: "name".to_string(),
            },
            text: "x".to_string(),
        },
        2,
    )
    .await;
    assert_eq!(expect_result(&mut fx, 2).await, RpcPayload::Bool(false));
}

#[tokio::test]
async fn to_string_for_arrays_reports_element_count() {
    let mut fx = fixture();
    fx.vm.add_thread(1, "main");
    fx.vm.set_array(
        30,
        "int",
        vec![
            javelin_adapters::vm::RawValue::Int(1),
            javelin_adapters::vm::RawValue::Int(2),
        ],
    );
    fx.vm.set_frames(
        1,
        vec![FrameData {
            index: 0,
            this_object: None,
            class_name: None,
            method_name: None,
            source_name: None,
            source_path: None,
            line: None,
            num_args: 0,
            locals: vec![LocalVariable {
                slot: 0,
                name: "xs".to_string(),
                signature: "[I".to_string(),
                value: javelin_adapters::vm::RawValue::ArrayRef(30),
            }],
        }],
    );
    started(&mut fx).await;

    rpc(
        &fx,
        DebugReq::ToString {
            thread_id: 1,
            location: DebugLocation::StackSlot {
                thread_id: 1,
                frame_index: 0,
                offset: 0,
            },
        },
        2,
    )
    .await;
    assert_eq!(
        expect_result(&mut fx, 2).await,
        RpcPayload::Str("<array of 2 element(s)>".to_string())
    );
}
