// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use javelin_core::symbol::{DeclaredAs, TypeSymbol};

/// Minimal public class file with one public method `go()V`.
fn class_bytes(name_slash: &str) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let mut utf8 = |s: &str| {
        let mut e = vec![1u8];
        e.extend_from_slice(&(s.len() as u16).to_be_bytes());
        e.extend_from_slice(s.as_bytes());
        pool.push(e);
        pool.len() as u16
    };
    let name_idx = utf8(name_slash);
    let go_idx = utf8("go");
    let desc_idx = utf8("()V");
    pool.push({
        let mut e = vec![7u8];
        e.extend_from_slice(&name_idx.to_be_bytes());
        e
    });
    let class_idx = pool.len() as u16;

    let mut out = Vec::new();
    out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&52u16.to_be_bytes());
    out.extend_from_slice(&(pool.len() as u16 + 1).to_be_bytes());
    for entry in &pool {
        out.extend_from_slice(entry);
    }
    out.extend_from_slice(&0x0001u16.to_be_bytes()); // ACC_PUBLIC
    out.extend_from_slice(&class_idx.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // super
    out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
    out.extend_from_slice(&0u16.to_be_bytes()); // fields
    out.extend_from_slice(&1u16.to_be_bytes()); // methods
    out.extend_from_slice(&0x0001u16.to_be_bytes());
    out.extend_from_slice(&go_idx.to_be_bytes());
    out.extend_from_slice(&desc_idx.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // method attributes
    out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
    out
}

struct Fixture {
    _dir: tempfile::TempDir,
    classes: std::path::PathBuf,
    tx: mpsc::Sender<IndexerMsg>,
    router_rx: mpsc::Receiver<RouterMsg>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let classes = dir.path().join("classes");
    std::fs::create_dir_all(classes.join("com/example")).unwrap();
    std::fs::write(
        classes.join("com/example/Widget.class"),
        class_bytes("com/example/Widget"),
    )
    .unwrap();

    let index = SymbolIndex::open(&dir.path().join("index")).unwrap();
    let (router_tx, router_rx) = mpsc::channel(64);
    let tx = Indexer::spawn(index, router_tx);
    Fixture {
        _dir: dir,
        classes,
        tx,
        router_rx,
    }
}

async fn initialize(fixture: &Fixture) {
    fixture
        .tx
        .send(IndexerMsg::Initialize {
            classpath: vec![fixture.classes.clone()],
            includes: Vec::new(),
            excludes: Vec::new(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn initialize_builds_index_and_announces_readiness() {
    let mut fx = fixture();
    initialize(&fx).await;

    assert_eq!(
        fx.router_rx.recv().await,
        Some(RouterMsg::Async(ClientEvent::IndexerReady))
    );

    fx.tx
        .send(IndexerMsg::KeywordSearch {
            keywords: vec!["widget".to_string()],
            limit: 10,
            types_only: false,
            call_id: 7,
        })
        .await
        .unwrap();

    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcResult {
            call_id,
            payload: RpcPayload::SymbolSearchResults(results),
        }) => {
            assert_eq!(call_id, 7);
            let names: Vec<&str> = results.iter().map(SymbolSearchResult::name).collect();
            assert!(names.contains(&"com.example.Widget"));
            assert!(names.contains(&"com.example.Widget.go"));
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn second_initialize_skips_rebuild() {
    let mut fx = fixture();
    initialize(&fx).await;
    assert!(fx.router_rx.recv().await.is_some());

    // The skip path must not rewrite the committed index state.
    let meta_path = fx._dir.path().join("index/meta.json");
    let before = std::fs::metadata(&meta_path).unwrap().modified().unwrap();

    initialize(&fx).await;
    assert_eq!(
        fx.router_rx.recv().await,
        Some(RouterMsg::Async(ClientEvent::IndexerReady))
    );
    let after = std::fs::metadata(&meta_path).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn insert_then_commit_is_queryable() {
    let mut fx = fixture();
    fx.tx
        .send(IndexerMsg::Insert(SymbolSearchResult::Type(TypeSymbol {
            name: "com.example.Added".to_string(),
            local_name: "Added".to_string(),
            declared_as: DeclaredAs::Class,
            pos: None,
        })))
        .await
        .unwrap();
    fx.tx.send(IndexerMsg::Commit).await.unwrap();

    fx.tx
        .send(IndexerMsg::KeywordSearch {
            keywords: vec!["added".to_string()],
            limit: 10,
            types_only: true,
            call_id: 1,
        })
        .await
        .unwrap();

    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcResult {
            payload: RpcPayload::SymbolSearchResults(results),
            ..
        }) => assert_eq!(results.len(), 1),
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn import_suggestions_reply_per_name() {
    let mut fx = fixture();
    initialize(&fx).await;
    assert!(fx.router_rx.recv().await.is_some());

    fx.tx
        .send(IndexerMsg::ImportSuggestions {
            names: vec!["Widget".to_string(), "Nothing".to_string()],
            limit: 5,
            call_id: 3,
        })
        .await
        .unwrap();

    match fx.router_rx.recv().await {
        Some(RouterMsg::RpcResult {
            call_id,
            payload: RpcPayload::ImportSuggestions(lists),
        }) => {
            assert_eq!(call_id, 3);
            assert_eq!(lists.len(), 2);
            assert_eq!(lists[0][0].name, "com.example.Widget");
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}
