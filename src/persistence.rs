//! Chain snapshot persistence for powledger
//!
//! Every seal appends one snapshot holding the whole chain as JSON. A
//! snapshot is named `<unix millis>-<hex sha256 of its content>`, so its
//! integrity can be checked from the name alone when the ledger starts.

use crate::blockchain::Block;
use crate::crypto::sha256_hex;
use crate::error::ChainError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Abstraction over snapshot storage backends.
pub trait SnapshotStore: Send + Sync {
    /// Snapshot names in lexical order.
    fn list(&self) -> Result<Vec<String>, ChainError>;
    fn read(&self, name: &str) -> Result<Vec<u8>, ChainError>;
    fn append(&self, name: &str, bytes: &[u8]) -> Result<(), ChainError>;
}

pub fn snapshot_name(timestamp_millis: i64, content: &[u8]) -> String {
    format!("{}-{}", timestamp_millis, sha256_hex(content))
}

/// True when `content` hashes to the digest embedded in `name`.
pub fn snapshot_is_trusted(name: &str, content: &[u8]) -> bool {
    name.split('-').nth(1) == Some(sha256_hex(content).as_str())
}

/// Scans `names` in order and returns the chain of the last snapshot that
/// reads, matches its name hash and parses. Earlier valid snapshots are not
/// merged in.
pub fn load_latest_valid_chain(
    store: &dyn SnapshotStore,
    names: &[String],
) -> Option<(String, Vec<Block>)> {
    let mut latest = None;
    for name in names {
        let content = match store.read(name) {
            Ok(content) => content,
            Err(e) => {
                warn!(snapshot = %name, "Skipping unreadable snapshot: {}", e);
                continue;
            }
        };
        if !snapshot_is_trusted(name, &content) {
            warn!(snapshot = %name, "Skipping snapshot whose content does not match its hash");
            continue;
        }
        match serde_json::from_slice::<Vec<Block>>(&content) {
            Ok(chain) => latest = Some((name.clone(), chain)),
            Err(e) => warn!(snapshot = %name, "Skipping unparsable snapshot: {}", e),
        }
    }
    latest
}

/// Snapshots stored as files in one directory.
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, ChainError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            ChainError::SnapshotError(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(FsSnapshotStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn list(&self) -> Result<Vec<String>, ChainError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ChainError> {
        fs::read(self.dir.join(name))
            .map_err(|e| ChainError::SnapshotError(format!("Failed to read {}: {}", name, e)))
    }

    fn append(&self, name: &str, bytes: &[u8]) -> Result<(), ChainError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(name))
            .map_err(|e| ChainError::SnapshotError(format!("Failed to open {}: {}", name, e)))?;
        file.write_all(bytes)
            .map_err(|e| ChainError::SnapshotError(format!("Failed to write {}: {}", name, e)))
    }
}

/// Simple in-memory store useful for tests and ephemeral runs. Clones share
/// the same files.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    files: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn list(&self) -> Result<Vec<String>, ChainError> {
        Ok(self.files.lock().keys().cloned().collect())
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, ChainError> {
        self.files
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| ChainError::SnapshotError(format!("No snapshot named {}", name)))
    }

    fn append(&self, name: &str, bytes: &[u8]) -> Result<(), ChainError> {
        self.files
            .lock()
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Blockchain;
    use tempfile::TempDir;

    fn chain_json(blocks: usize) -> Vec<u8> {
        let mut ledger = Blockchain::new().unwrap();
        for i in 1..blocks {
            ledger.seal_block(0, "0", &format!("h{}", i));
        }
        serde_json::to_vec(&ledger.chain).unwrap()
    }

    #[test]
    fn test_snapshot_name_embeds_hash() {
        let name = snapshot_name(1_700_000_000_000, b"[]");
        assert_eq!(name, format!("1700000000000-{}", sha256_hex(b"[]")));
        assert!(snapshot_is_trusted(&name, b"[]"));
        assert!(!snapshot_is_trusted(&name, b"[ ]"));
        assert!(!snapshot_is_trusted("no-dash-hash", b"[]"));
    }

    #[test]
    fn test_last_valid_snapshot_wins() {
        let store = InMemorySnapshotStore::new();
        let short = chain_json(1);
        let long = chain_json(3);
        store.append(&snapshot_name(2, &short), &short).unwrap();
        store.append(&snapshot_name(1, &long), &long).unwrap();

        let names = store.list().unwrap();
        let (name, chain) = load_latest_valid_chain(&store, &names).unwrap();
        assert_eq!(name, snapshot_name(2, &short));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_tampered_and_garbage_snapshots_skipped() {
        let store = InMemorySnapshotStore::new();
        let good = chain_json(2);
        store.append(&snapshot_name(1, &good), &good).unwrap();

        let tampered_name = snapshot_name(2, &good);
        store.append(&tampered_name, b" ").unwrap();

        let garbage = b"not json".to_vec();
        store.append(&snapshot_name(3, &garbage), &garbage).unwrap();

        let names = store.list().unwrap();
        let (name, chain) = load_latest_valid_chain(&store, &names).unwrap();
        assert_eq!(name, snapshot_name(1, &good));
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_no_valid_snapshot() {
        let store = InMemorySnapshotStore::new();
        store.append("5-deadbeef", b"[]").unwrap();
        let names = store.list().unwrap();
        assert!(load_latest_valid_chain(&store, &names).is_none());
    }

    #[test]
    fn test_fs_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::open(temp_dir.path().join("BlockFiles")).unwrap();
        assert!(store.list().unwrap().is_empty());

        store.append("2-b", b"second").unwrap();
        store.append("1-a", b"first").unwrap();
        store.append("1-a", b"+more").unwrap();
        fs::create_dir(store.dir().join("nested")).unwrap();

        assert_eq!(store.list().unwrap(), vec!["1-a".to_string(), "2-b".to_string()]);
        assert_eq!(store.read("1-a").unwrap(), b"first+more".to_vec());
        assert!(matches!(store.read("3-c"), Err(ChainError::SnapshotError(_))));
    }

    #[test]
    fn test_in_memory_clones_share_files() {
        let store = InMemorySnapshotStore::new();
        let clone = store.clone();
        clone.append("1-a", b"x").unwrap();
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
    }
}
