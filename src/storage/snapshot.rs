use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::storage::memory::{MemoryStore, StoreState};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const SNAPSHOT_FILE: &str = "snapshot.json";
pub const SNAPSHOT_CHECKSUM_FILE: &str = "snapshot.sha256";
pub const SNAPSHOT_PREV_FILE: &str = "snapshot.json.prev";
pub const SNAPSHOT_PREV_CHECKSUM_FILE: &str = "snapshot.sha256.prev";
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub format_version: u32,
    pub state: StoreState,
}

/// Writes the store contents to `dir`, replacing any previous snapshot.
///
/// A verified current snapshot is first copied to the `.prev` pair. Body and
/// checksum are then each persisted through a temp file and rename. If the
/// process dies between the two renames, `load_snapshot` sees a mismatched
/// primary pair and falls back to `.prev`.
pub fn write_snapshot(store: &MemoryStore, dir: &Path) -> Result<(), LedgerError> {
    fs::create_dir_all(dir)?;
    let snapshot = SnapshotFile {
        format_version: SNAPSHOT_FORMAT_VERSION,
        state: store.state(),
    };
    let bytes =
        serde_json::to_vec_pretty(&snapshot).map_err(|e| LedgerError::Encode(e.to_string()))?;

    // A torn primary must not overwrite the last good copy.
    if read_verified(dir, SNAPSHOT_FILE, SNAPSHOT_CHECKSUM_FILE).is_ok() {
        copy_synced(&dir.join(SNAPSHOT_FILE), &dir.join(SNAPSHOT_PREV_FILE))?;
        copy_synced(
            &dir.join(SNAPSHOT_CHECKSUM_FILE),
            &dir.join(SNAPSHOT_PREV_CHECKSUM_FILE),
        )?;
    }

    persist_atomic(dir, SNAPSHOT_FILE, &bytes)?;
    persist_atomic(dir, SNAPSHOT_CHECKSUM_FILE, sha256_hex(&bytes).as_bytes())?;
    fsync_dir(dir)?;

    info!(
        dir = %dir.display(),
        seq = snapshot.state.seq,
        collections = snapshot.state.collections.len(),
        "snapshot written"
    );
    Ok(())
}

/// Loads the primary snapshot, or the `.prev` pair when the primary fails
/// verification.
pub fn load_snapshot(dir: &Path) -> Result<MemoryStore, LedgerError> {
    let primary_err = match read_verified(dir, SNAPSHOT_FILE, SNAPSHOT_CHECKSUM_FILE) {
        Ok(snapshot) => {
            debug!(dir = %dir.display(), seq = snapshot.state.seq, "snapshot loaded");
            return Ok(MemoryStore::from_state(snapshot.state));
        }
        Err(err) => err,
    };
    if !dir.join(SNAPSHOT_PREV_FILE).exists() {
        return Err(primary_err);
    }
    let snapshot = read_verified(dir, SNAPSHOT_PREV_FILE, SNAPSHOT_PREV_CHECKSUM_FILE)
        .map_err(|_| {
            LedgerError::Validation(format!("{primary_err}; previous snapshot also unusable"))
        })?;
    warn!(
        dir = %dir.display(),
        seq = snapshot.state.seq,
        error = %primary_err,
        "primary snapshot unusable; loaded previous snapshot"
    );
    Ok(MemoryStore::from_state(snapshot.state))
}

/// Loads the snapshot in `dir` if one exists, otherwise starts empty. Every
/// collection named by `config` is declared either way.
pub fn load_or_init(dir: &Path, config: &LedgerConfig) -> Result<MemoryStore, LedgerError> {
    let store = if dir.join(SNAPSHOT_FILE).exists() || dir.join(SNAPSHOT_PREV_FILE).exists() {
        load_snapshot(dir)?
    } else {
        MemoryStore::new()
    };
    for name in config.collection_names() {
        store.declare_collection(name);
    }
    Ok(store)
}

fn read_verified(dir: &Path, body: &str, checksum: &str) -> Result<SnapshotFile, LedgerError> {
    let bytes = fs::read(dir.join(body))?;
    let expected = fs::read_to_string(dir.join(checksum))
        .map_err(|_| LedgerError::Validation(format!("{checksum} missing")))?;
    let actual = sha256_hex(&bytes);
    if expected.trim() != actual {
        return Err(LedgerError::Validation(format!(
            "snapshot checksum mismatch: expected {}, got {actual}",
            expected.trim()
        )));
    }
    let snapshot: SnapshotFile =
        serde_json::from_slice(&bytes).map_err(|e| LedgerError::Decode(e.to_string()))?;
    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(LedgerError::Validation(format!(
            "unsupported snapshot format version {}",
            snapshot.format_version
        )));
    }
    Ok(snapshot)
}

fn persist_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<(), LedgerError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(name)).map_err(|e| LedgerError::Io(e.error))?;
    Ok(())
}

fn copy_synced(from: &Path, to: &Path) -> Result<(), LedgerError> {
    let data = fs::read(from)?;
    fs::write(to, data)?;
    fs::OpenOptions::new().read(true).open(to)?.sync_all()?;
    Ok(())
}

fn fsync_dir(path: &Path) -> Result<(), LedgerError> {
    fs::File::open(path)?.sync_all()?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{
        SNAPSHOT_CHECKSUM_FILE, SNAPSHOT_FILE, SNAPSHOT_PREV_FILE, load_or_init, load_snapshot,
        write_snapshot,
    };
    use crate::config::LedgerConfig;
    use crate::storage::{MemoryStore, PrivateDataStore};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn snapshot_round_trips_store_contents() {
        let dir = tempdir().expect("temp dir");
        let store = MemoryStore::with_collections(["c1", "c2"]);
        store.put_private_data("c1", "k", b"\x01\x02").expect("put");
        write_snapshot(&store, dir.path()).expect("write");

        let loaded = load_snapshot(dir.path()).expect("load");
        assert_eq!(loaded.state(), store.state());
        assert_eq!(
            loaded.get_private_data("c1", "k").expect("get"),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn tampered_snapshot_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let store = MemoryStore::with_collections(["c1"]);
        store.put_private_data("c1", "k", b"v").expect("put");
        write_snapshot(&store, dir.path()).expect("write");

        let path = dir.path().join(SNAPSHOT_FILE);
        let mut body = fs::read_to_string(&path).expect("read");
        body.push(' ');
        fs::write(&path, body).expect("tamper");

        let err = load_snapshot(dir.path()).expect_err("checksum mismatch");
        assert_eq!(err.code_str(), "validation");
    }

    #[test]
    fn load_or_init_declares_configured_collections() {
        let dir = tempdir().expect("temp dir");
        let config = LedgerConfig::default();
        let store = load_or_init(dir.path(), &config).expect("fresh store");
        assert_eq!(store.collections().len(), 3);
        assert_eq!(store.current_seq(), 0);
    }

    #[test]
    fn body_without_matching_checksum_falls_back_to_previous() {
        let dir = tempdir().expect("temp dir");
        let config = LedgerConfig::default();
        let store = MemoryStore::for_config(&config);
        store
            .put_private_data("collectionProducts", "first", b"1")
            .expect("put");
        write_snapshot(&store, dir.path()).expect("first write");
        let first_state = store.state();
        let first_checksum =
            fs::read(dir.path().join(SNAPSHOT_CHECKSUM_FILE)).expect("read checksum");

        store
            .put_private_data("collectionProducts", "second", b"2")
            .expect("put");
        write_snapshot(&store, dir.path()).expect("second write");
        // Crash after the body rename but before the checksum rename.
        fs::write(dir.path().join(SNAPSHOT_CHECKSUM_FILE), first_checksum).expect("rewind");

        let loaded = load_or_init(dir.path(), &config).expect("previous snapshot");
        assert_eq!(loaded.state(), first_state);
        assert_eq!(loaded.current_seq(), 1);
    }

    #[test]
    fn torn_primary_does_not_replace_previous_copy() {
        let dir = tempdir().expect("temp dir");
        let store = MemoryStore::with_collections(["c1"]);
        store.put_private_data("c1", "k", b"v1").expect("put");
        write_snapshot(&store, dir.path()).expect("write v1");
        store.put_private_data("c1", "k", b"v2").expect("put");
        write_snapshot(&store, dir.path()).expect("write v2");
        let prev = fs::read(dir.path().join(SNAPSHOT_PREV_FILE)).expect("prev exists");

        fs::write(dir.path().join(SNAPSHOT_FILE), b"{torn").expect("tear");
        store.put_private_data("c1", "k", b"v3").expect("put");
        write_snapshot(&store, dir.path()).expect("write v3");

        assert_eq!(
            fs::read(dir.path().join(SNAPSHOT_PREV_FILE)).expect("prev kept"),
            prev
        );
        let loaded = load_snapshot(dir.path()).expect("load v3");
        assert_eq!(loaded.get_private_data("c1", "k").expect("get"), Some(b"v3".to_vec()));
    }

    #[test]
    fn both_copies_unusable_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let store = MemoryStore::with_collections(["c1"]);
        write_snapshot(&store, dir.path()).expect("write");
        write_snapshot(&store, dir.path()).expect("write again");
        fs::write(dir.path().join(SNAPSHOT_FILE), b"x").expect("tear primary");
        fs::write(dir.path().join(SNAPSHOT_PREV_FILE), b"y").expect("tear prev");

        let err = load_snapshot(dir.path()).expect_err("nothing usable");
        assert_eq!(err.code_str(), "validation");
        assert!(err.to_string().contains("previous snapshot also unusable"));
    }
}
