// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index user metadata and the re-index decision.
//!
//! The metadata rides on the index commit so that it is atomic with the
//! writes it describes. Readers that find an older version force a rebuild.

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Version stamped into every commit. Bump when the document schema or the
/// tokenization changes so stale indexes rebuild.
pub const INDEX_VERSION: i32 = 4;

/// User metadata committed atomically with index writes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexUserMetadata {
    #[serde(rename = "indexVersion")]
    pub index_version: i32,
    /// Absolute classpath entry path → content hash (hex).
    #[serde(rename = "fileHashes")]
    pub file_hashes: IndexMap<String, String>,
}

impl IndexUserMetadata {
    /// Metadata for a fresh commit at the current version.
    pub fn current(file_hashes: IndexMap<String, String>) -> Self {
        IndexUserMetadata {
            index_version: INDEX_VERSION,
            file_hashes,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

/// Decide whether the on-disk index must be torn down and rebuilt.
///
/// Rebuild iff the on-disk version is older than [`INDEX_VERSION`] or the
/// proposed hash set contains any pair the on-disk map lacks. Files that
/// disappeared do not force a rebuild; unknown hashes do.
pub fn should_reindex(
    on_disk: Option<&IndexUserMetadata>,
    proposed: &IndexMap<String, String>,
) -> bool {
    let Some(on_disk) = on_disk else {
        return true;
    };
    if on_disk.index_version < INDEX_VERSION {
        return true;
    }
    proposed
        .iter()
        .any(|(path, hash)| on_disk.file_hashes.get(path) != Some(hash))
}

/// Content hash of one classpath entry, hex-encoded.
///
/// Jars hash their bytes; directories hash the sorted relative paths and
/// sizes of the class files under them, which is cheap and changes whenever
/// a compile output changes.
pub fn hash_classpath_entry(path: &Path) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let meta = std::fs::metadata(path)?;
    if meta.is_file() {
        let mut file = std::fs::File::open(path)?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
    } else {
        let mut entries: Vec<(String, u64)> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e
                    .path()
                    .strip_prefix(path)
                    .unwrap_or(e.path())
                    .to_string_lossy()
                    .into_owned();
                let len = e.metadata().map(|m| m.len()).unwrap_or(0);
                (rel, len)
            })
            .collect();
        entries.sort();
        for (rel, len) in entries {
            hasher.update(rel.as_bytes());
            hasher.update(len.to_be_bytes());
        }
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// Proposed hash map for a classpath, skipping entries that do not exist.
pub fn hash_classpath(entries: &[std::path::PathBuf]) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for entry in entries {
        if let Ok(hash) = hash_classpath_entry(entry) {
            out.insert(entry.to_string_lossy().into_owned(), hash);
        }
    }
    out
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
