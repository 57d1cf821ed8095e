// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::indexmap;

fn meta(version: i32, hashes: IndexMap<String, String>) -> IndexUserMetadata {
    IndexUserMetadata {
        index_version: version,
        file_hashes: hashes,
    }
}

// ── Re-index decision ────────────────────────────────────────────────────────

#[test]
fn missing_metadata_forces_rebuild() {
    let proposed = indexmap! {};
    assert!(should_reindex(None, &proposed));
}

#[test]
fn old_version_forces_rebuild() {
    let hashes = indexmap! { "a".to_string() => "h1".to_string() };
    let on_disk = meta(INDEX_VERSION - 1, hashes.clone());
    assert!(should_reindex(Some(&on_disk), &hashes));
}

#[test]
fn unknown_hash_forces_rebuild() {
    let on_disk = meta(
        INDEX_VERSION,
        indexmap! { "a".to_string() => "h1".to_string() },
    );
    let proposed = indexmap! {
        "a".to_string() => "h1".to_string(),
        "b".to_string() => "h2".to_string(),
    };
    assert!(should_reindex(Some(&on_disk), &proposed));
}

#[test]
fn changed_hash_forces_rebuild() {
    let on_disk = meta(
        INDEX_VERSION,
        indexmap! { "a".to_string() => "h1".to_string() },
    );
    let proposed = indexmap! { "a".to_string() => "h2".to_string() };
    assert!(should_reindex(Some(&on_disk), &proposed));
}

#[test]
fn same_version_and_subset_skips_rebuild() {
    let on_disk = meta(
        INDEX_VERSION,
        indexmap! {
            "a".to_string() => "h1".to_string(),
            "b".to_string() => "h2".to_string(),
        },
    );
    // Identical set.
    let proposed = on_disk.file_hashes.clone();
    assert!(!should_reindex(Some(&on_disk), &proposed));

    // Disappeared files do not force a rebuild.
    let proposed = indexmap! { "a".to_string() => "h1".to_string() };
    assert!(!should_reindex(Some(&on_disk), &proposed));
}

// ── Metadata serialization ───────────────────────────────────────────────────

#[test]
fn metadata_round_trips_through_json() {
    let original = IndexUserMetadata::current(indexmap! {
        "/cp/a.jar".to_string() => "abc123".to_string(),
    });
    let parsed = IndexUserMetadata::from_json(&original.to_json()).unwrap();
    assert_eq!(parsed, original);
    assert_eq!(parsed.index_version, INDEX_VERSION);
}

#[test]
fn metadata_json_uses_wire_key_names() {
    let json = IndexUserMetadata::current(indexmap! {}).to_json();
    assert!(json.contains("indexVersion"));
    assert!(json.contains("fileHashes"));
}

// ── Hashing ──────────────────────────────────────────────────────────────────

#[test]
fn file_hash_is_stable_and_content_sensitive() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("lib.jar");
    std::fs::write(&jar, b"bytes-one").unwrap();

    let first = hash_classpath_entry(&jar).unwrap();
    let again = hash_classpath_entry(&jar).unwrap();
    assert_eq!(first, again);

    std::fs::write(&jar, b"bytes-two").unwrap();
    assert_ne!(hash_classpath_entry(&jar).unwrap(), first);
}

#[test]
fn directory_hash_tracks_class_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("com")).unwrap();
    std::fs::write(dir.path().join("com/A.class"), b"aaaa").unwrap();

    let first = hash_classpath_entry(dir.path()).unwrap();
    std::fs::write(dir.path().join("com/B.class"), b"bb").unwrap();
    assert_ne!(hash_classpath_entry(dir.path()).unwrap(), first);
}

#[test]
fn hash_classpath_skips_missing_entries() {
    let dir = tempfile::tempdir().unwrap();
    let jar = dir.path().join("real.jar");
    std::fs::write(&jar, b"x").unwrap();

    let hashes = hash_classpath(&[jar.clone(), dir.path().join("missing.jar")]);
    assert_eq!(hashes.len(), 1);
    assert!(hashes.contains_key(&jar.to_string_lossy().into_owned()));
}
