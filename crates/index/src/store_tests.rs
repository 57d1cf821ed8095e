// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::indexmap;

fn type_result(name: &str) -> SymbolSearchResult {
    SymbolSearchResult::Type(TypeSymbol {
        name: name.to_string(),
        local_name: javelin_core::symbol::local_name_of(name).to_string(),
        declared_as: DeclaredAs::Class,
        pos: None,
    })
}

fn method_result(owner: &str, method: &str) -> SymbolSearchResult {
    SymbolSearchResult::Method(MethodSymbol {
        name: format!("{owner}.{method}"),
        local_name: method.to_string(),
        owner: owner.to_string(),
        pos: None,
    })
}

fn open_temp() -> (tempfile::TempDir, SymbolIndex) {
    let dir = tempfile::tempdir().unwrap();
    let index = SymbolIndex::open(&dir.path().join("index")).unwrap();
    (dir, index)
}

fn all_results(index: &SymbolIndex) -> Vec<SymbolSearchResult> {
    let searcher = index.searcher();
    let fields = index.fields();
    let mut out = Vec::new();
    for (segment_ord, segment) in searcher.segment_readers().iter().enumerate() {
        for doc_id in segment.doc_ids_alive() {
            let doc: TantivyDocument = searcher
                .doc(tantivy::DocAddress::new(segment_ord as u32, doc_id))
                .unwrap();
            if let Some(result) = result_of(&fields, &doc) {
                out.push(result);
            }
        }
    }
    out
}

// ── Write path ───────────────────────────────────────────────────────────────

#[test]
fn insert_commit_read_back() {
    let (_dir, mut index) = open_temp();
    index.insert(&type_result("java.util.List")).unwrap();
    index
        .insert(&method_result("java.util.List", "add"))
        .unwrap();
    index
        .commit(&IndexUserMetadata::current(indexmap! {}))
        .unwrap();

    assert_eq!(index.num_docs(), 2);
    let results = all_results(&index);
    assert!(results.contains(&type_result("java.util.List")));
    assert!(results.contains(&method_result("java.util.List", "add")));
}

#[test]
fn insert_is_upsert_by_name() {
    let (_dir, mut index) = open_temp();
    index.insert(&type_result("com.example.Foo")).unwrap();
    index.insert(&type_result("com.example.Foo")).unwrap();
    index
        .commit(&IndexUserMetadata::current(indexmap! {}))
        .unwrap();
    assert_eq!(index.num_docs(), 1);
}

#[test]
fn remove_deletes_by_exact_name() {
    let (_dir, mut index) = open_temp();
    index.insert(&type_result("com.example.Keep")).unwrap();
    index.insert(&type_result("com.example.Drop")).unwrap();
    index.remove("com.example.Drop").unwrap();
    index
        .commit(&IndexUserMetadata::current(indexmap! {}))
        .unwrap();

    let names: Vec<String> = all_results(&index)
        .iter()
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(names, vec!["com.example.Keep".to_string()]);
}

// ── Metadata on the commit ───────────────────────────────────────────────────

#[test]
fn commit_carries_user_metadata() {
    let (_dir, mut index) = open_temp();
    let metadata = IndexUserMetadata::current(indexmap! {
        "/cp/a.jar".to_string() => "h1".to_string(),
    });
    index.insert(&type_result("com.example.Foo")).unwrap();
    index.commit(&metadata).unwrap();

    assert_eq!(index.metadata(), Some(metadata));
}

#[test]
fn metadata_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index");
    let metadata = IndexUserMetadata::current(indexmap! {
        "/cp/a.jar".to_string() => "h1".to_string(),
    });
    {
        let mut index = SymbolIndex::open(&path).unwrap();
        index.insert(&type_result("com.example.Foo")).unwrap();
        index.commit(&metadata).unwrap();
    }
    let index = SymbolIndex::open(&path).unwrap();
    assert_eq!(index.metadata(), Some(metadata));
    assert_eq!(index.num_docs(), 1);
}

#[test]
fn fresh_index_has_no_metadata() {
    let (_dir, index) = open_temp();
    assert_eq!(index.metadata(), None);
}

// ── Document invariants ──────────────────────────────────────────────────────

#[test]
fn documents_keep_local_name_suffix_and_owner_shape() {
    let (_dir, mut index) = open_temp();
    index
        .insert(&type_result("scala.collection.immutable.List"))
        .unwrap();
    index
        .insert(&method_result("scala.collection.immutable.List", "map"))
        .unwrap();
    index
        .commit(&IndexUserMetadata::current(indexmap! {}))
        .unwrap();

    for result in all_results(&index) {
        // localName is the trailing segment of name.
        assert_eq!(
            result.local_name(),
            javelin_core::symbol::local_name_of(result.name())
        );
        match &result {
            SymbolSearchResult::Type(_) => assert!(result.owner().is_none()),
            SymbolSearchResult::Method(_) => assert!(result.owner().is_some()),
        }
    }
}

#[test]
fn rebuild_starts_empty() {
    let (_dir, mut index) = open_temp();
    index.insert(&type_result("com.example.Foo")).unwrap();
    index
        .commit(&IndexUserMetadata::current(indexmap! {}))
        .unwrap();

    let index = index.rebuild().unwrap();
    assert_eq!(index.num_docs(), 0);
    assert_eq!(index.metadata(), None);
}
