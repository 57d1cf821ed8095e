// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

// ── Parsing ──────────────────────────────────────────────────────────────────

#[test]
fn parses_atoms() {
    assert_eq!(Sexp::parse("nil").unwrap(), Sexp::Nil);
    assert_eq!(Sexp::parse("t").unwrap(), Sexp::True);
    assert_eq!(Sexp::parse("42").unwrap(), Sexp::Int(42));
    assert_eq!(Sexp::parse("-7").unwrap(), Sexp::Int(-7));
    assert_eq!(Sexp::parse(":key").unwrap(), Sexp::keyword("key"));
    assert_eq!(Sexp::parse("swank:ping").unwrap(), Sexp::symbol("swank:ping"));
    assert_eq!(Sexp::parse("\"hi\"").unwrap(), Sexp::string("hi"));
}

#[test]
fn parses_nested_lists() {
    let parsed = Sexp::parse("(:return (:ok 1) 42)").unwrap();
    assert_eq!(
        parsed,
        Sexp::list(vec![
            Sexp::keyword("return"),
            Sexp::list(vec![Sexp::keyword("ok"), Sexp::Int(1)]),
            Sexp::Int(42),
        ])
    );
}

#[test]
fn parses_escaped_strings() {
    assert_eq!(
        Sexp::parse(r#""a\"b\\c\nd""#).unwrap(),
        Sexp::string("a\"b\\c\nd")
    );
}

#[test]
fn empty_list_is_distinct_from_nil_atom() {
    assert_eq!(Sexp::parse("()").unwrap(), Sexp::List(vec![]));
    assert_eq!(Sexp::parse("nil").unwrap(), Sexp::Nil);
}

#[test]
fn nil_reads_as_empty_list() {
    assert_eq!(Sexp::Nil.as_list(), Some(&[][..]));
}

#[test]
fn skips_comments_and_whitespace() {
    let text = "; config\n(:name \"demo\") ; trailing\n";
    let parsed = Sexp::parse(text).unwrap();
    assert_eq!(
        parsed,
        Sexp::list(vec![Sexp::keyword("name"), Sexp::string("demo")])
    );
}

#[test]
fn dash_alone_is_a_symbol() {
    assert_eq!(Sexp::parse("-").unwrap(), Sexp::symbol("-"));
}

#[test]
fn negative_prefixed_word_is_a_symbol() {
    assert_eq!(Sexp::parse("-foo").unwrap(), Sexp::symbol("-foo"));
}

#[parameterized(
    unterminated = { "(1 2" },
    close_only = { ")" },
    empty = { "" },
    trailing = { "1 2" },
)]
fn rejects_malformed(input: &str) {
    assert!(Sexp::parse(input).is_err());
}

#[test]
fn int_out_of_range() {
    assert_eq!(
        Sexp::parse("99999999999999999999999"),
        Err(SexpError::IntOutOfRange { offset: 0 })
    );
}

// ── Property lists ───────────────────────────────────────────────────────────

#[test]
fn plist_get_finds_values() {
    let plist = Sexp::parse("(:name \"x\" :version 3 :flag t)").unwrap();
    assert_eq!(plist.plist_get("name"), Some(&Sexp::string("x")));
    assert_eq!(plist.plist_get("version"), Some(&Sexp::Int(3)));
    assert_eq!(plist.plist_get("flag"), Some(&Sexp::True));
    assert_eq!(plist.plist_get("missing"), None);
}

#[test]
fn plist_get_skips_non_keyword_noise() {
    let plist = Sexp::parse("(1 :name \"x\")").unwrap();
    assert_eq!(plist.plist_get("name"), Some(&Sexp::string("x")));
}

// ── Printing ─────────────────────────────────────────────────────────────────

#[test]
fn prints_reply_shape() {
    let reply = Sexp::list(vec![
        Sexp::keyword("return"),
        Sexp::list(vec![Sexp::keyword("ok"), Sexp::True]),
        Sexp::Int(7),
    ]);
    assert_eq!(reply.to_string(), "(:return (:ok t) 7)");
}

#[test]
fn prints_escapes() {
    assert_eq!(Sexp::string("a\"b\\c").to_string(), r#""a\"b\\c""#);
}

// ── Round trip ───────────────────────────────────────────────────────────────

fn arb_sexp() -> impl Strategy<Value = Sexp> {
    let leaf = prop_oneof![
        Just(Sexp::Nil),
        Just(Sexp::True),
        any::<i64>().prop_map(Sexp::Int),
        "[a-z][a-z0-9-]{0,8}".prop_map(Sexp::Keyword),
        "[a-z][a-z0-9:-]{0,8}"
            .prop_filter("reserved atoms", |s| s != "nil" && s != "t")
            .prop_map(Sexp::Symbol),
        ".{0,12}".prop_map(Sexp::Str),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Sexp::List)
    })
}

proptest! {
    #[test]
    fn print_parse_round_trip(value in arb_sexp()) {
        let printed = value.to_string();
        let reparsed = Sexp::parse(&printed).unwrap();
        prop_assert_eq!(reparsed, value);
    }
}
