// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::classfile::{ACC_INTERFACE, ACC_PUBLIC};
use javelin_core::symbol::DeclaredAs;
use yare::parameterized;

// ── Validity predicates ──────────────────────────────────────────────────────

#[parameterized(
    plain = { "com.example.Foo", true },
    object_marker = { "com.example.Foo$", true },
    inner = { "com.example.Foo$Bar", false },
    synthetic = { "com.example.Foo$1", false },
    nested_marker = { "com.example.Foo$Bar$", false },
)]
fn type_validity(name: &str, expected: bool) {
    assert_eq!(valid_type(name), expected);
}

#[parameterized(
    plain = { "render", true },
    ctor = { "<init>", false },
    self_ref = { "this", false },
    synthetic = { "apply$default$1", false },
    clinit = { "<clinit>", true },
)]
fn method_validity(name: &str, expected: bool) {
    assert_eq!(valid_method(name), expected);
}

// ── Include/exclude filters ──────────────────────────────────────────────────

#[test]
fn empty_filters_accept_everything() {
    let scanner = ClasspathScanner::new(&[], &[]).unwrap();
    assert!(scanner.accepts("anything.at.All"));
}

#[test]
fn includes_restrict_and_excludes_reject() {
    let scanner = ClasspathScanner::new(
        &["^com\\.example\\.".to_string()],
        &["Internal$".to_string()],
    )
    .unwrap();
    assert!(scanner.accepts("com.example.Widget"));
    assert!(!scanner.accepts("org.other.Widget"));
    assert!(!scanner.accepts("com.example.WidgetInternal"));
}

#[test]
fn bad_pattern_is_an_error() {
    assert!(ClasspathScanner::new(&["(".to_string()], &[]).is_err());
}

// ── Result shaping ───────────────────────────────────────────────────────────

fn header(name: &str, access: u16, methods: &[(&str, u16)]) -> crate::classfile::ClassHeader {
    crate::classfile::ClassHeader {
        name: name.to_string(),
        access_flags: access,
        fields: Vec::new(),
        methods: methods
            .iter()
            .map(|(name, access)| crate::classfile::MemberInfo {
                access_flags: *access,
                name: name.to_string(),
                descriptor: "()V".to_string(),
            })
            .collect(),
    }
}

#[test]
fn class_yields_type_plus_public_methods() {
    let header = header(
        "com.example.Widget",
        ACC_PUBLIC,
        &[("render", ACC_PUBLIC), ("secret", 0), ("<init>", ACC_PUBLIC)],
    );
    let results = results_of(&header);

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name(), "com.example.Widget");
    assert_eq!(results[0].declared_as(), DeclaredAs::Class);
    assert_eq!(results[1].name(), "com.example.Widget.render");
    assert_eq!(results[1].owner(), Some("com.example.Widget"));
    assert_eq!(results[1].local_name(), "render");
}

#[test]
fn interface_is_declared_trait() {
    let results = results_of(&header("com.example.Renderer", ACC_PUBLIC | ACC_INTERFACE, &[]));
    assert_eq!(results[0].declared_as(), DeclaredAs::Trait);
}

#[test]
fn terminal_dollar_is_declared_object() {
    let results = results_of(&header("com.example.Registry$", ACC_PUBLIC, &[]));
    assert_eq!(results[0].declared_as(), DeclaredAs::Object);
    assert_eq!(results[0].local_name(), "Registry$");
}

#[test]
fn method_owner_matches_emitted_type() {
    let results = results_of(&header("com.example.Widget", ACC_PUBLIC, &[("go", ACC_PUBLIC)]));
    let owner = results[1].owner().unwrap();
    assert!(results.iter().any(|r| r.name() == owner));
}
