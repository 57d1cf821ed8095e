// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    nested = { "java.util.List", "List" },
    single = { "List", "List" },
    deep = { "scala.collection.immutable.HashMap", "HashMap" },
    trailing_object = { "com.example.Registry$", "Registry$" },
)]
fn local_name_is_trailing_segment(name: &str, expected: &str) {
    assert_eq!(local_name_of(name), expected);
}

#[test]
fn type_accessors() {
    let sym = SymbolSearchResult::Type(TypeSymbol {
        name: "java.util.List".to_string(),
        local_name: "List".to_string(),
        declared_as: DeclaredAs::Trait,
        pos: None,
    });
    assert_eq!(sym.name(), "java.util.List");
    assert_eq!(sym.local_name(), "List");
    assert_eq!(sym.declared_as(), DeclaredAs::Trait);
    assert_eq!(sym.owner(), None);
}

#[test]
fn method_accessors() {
    let sym = SymbolSearchResult::Method(MethodSymbol {
        name: "java.util.List.add".to_string(),
        local_name: "add".to_string(),
        owner: "java.util.List".to_string(),
        pos: Some(SourcePosition {
            file: "/src/List.java".into(),
            offset: 120,
        }),
    });
    assert_eq!(sym.declared_as(), DeclaredAs::Method);
    assert_eq!(sym.owner(), Some("java.util.List"));
    assert_eq!(sym.pos().map(|p| p.offset), Some(120));
}

#[test]
fn local_name_invariant_holds_for_constructed_symbols() {
    let name = "com.foo.Bar";
    let sym = TypeSymbol {
        name: name.to_string(),
        local_name: local_name_of(name).to_string(),
        declared_as: DeclaredAs::Class,
        pos: None,
    };
    assert!(sym.name.ends_with(&sym.local_name));
    assert_eq!(
        sym.name[..sym.name.len() - sym.local_name.len()].chars().last(),
        Some('.')
    );
}
