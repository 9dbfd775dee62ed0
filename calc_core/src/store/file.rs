//! # JSON File Store
//!
//! Persists the whole document store to one JSON file with safety features:
//! - **Atomic saves**: Write to .tmp, sync, rename to prevent corruption
//! - **File locking**: One writer at a time, also across a shared drive
//! - **Version validation**: Refuse files written by an incompatible schema
//!
//! Every successful write is saved before the call returns, so the file
//! always reflects exactly the writes that succeeded. There is no batching:
//! a multi-document creation that fails halfway stays half-written on disk.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "modified": "2026-01-01T00:00:00Z",
//!   "collections": {
//!     "materials": [ { "id": "…", "data": { "name": "Steel Rod", … } } ]
//!   }
//! }
//! ```
//!
//! The lock lives next to the store as `<file>.lock` and records who holds it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::store::{CollectionPath, DocumentStore, JsonFileStore};
//! use std::path::Path;
//!
//! let store = JsonFileStore::open(Path::new("catalog.json"), "estimator@example.com")?;
//! for (id, doc) in store.list(&CollectionPath::materials())? {
//!     println!("{id}: {}", doc["name"]);
//! }
//! // Lock is released when the store is dropped
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CollectionPath, Document, DocumentStore, MemoryStore};
use crate::errors::{CalcError, CalcResult};

/// Current schema version for store files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Serialized shape of a store file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    version: String,
    modified: DateTime<Utc>,
    collections: MemoryStore,
}

impl StoreFile {
    fn empty() -> Self {
        StoreFile {
            version: SCHEMA_VERSION.to_string(),
            modified: Utc::now(),
            collections: MemoryStore::new(),
        }
    }
}

/// Lock file metadata stored in .lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// User identifier (email or username)
    pub user_id: String,
    /// Machine name where lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

/// Get the hostname of the current machine
fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Uses both:
/// 1. OS-level file locking (via fs2) for process safety
/// 2. .lock file with metadata for user visibility
#[derive(Debug)]
pub struct FileLock {
    /// Path to the locked store file
    store_path: PathBuf,
    /// Path to the lock file
    lock_path: PathBuf,
    /// The underlying file handle (keeps OS lock)
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on a store file.
    ///
    /// The OS lock decides who holds the store. The `.lock` metadata only
    /// describes the holder, so a file left behind by a dead process is taken
    /// over as soon as its OS lock is gone. Returns `CalcError::FileLocked`
    /// when another process holds the OS lock.
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        // No truncate here: the holder's metadata must survive a failed attempt
        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CalcError::io("create lock", lock_path.display().to_string(), e.to_string()))?;

        // Non-blocking: a second writer fails fast instead of hanging
        if lock_file.try_lock_exclusive().is_err() {
            return Err(match read_lock_info(&lock_path) {
                Ok(holder) => CalcError::file_locked(
                    path.display().to_string(),
                    format!("{} ({})", holder.user_id, holder.machine),
                    holder.locked_at.to_rfc3339(),
                ),
                Err(_) => CalcError::file_locked(
                    path.display().to_string(),
                    "another process".to_string(),
                    "unknown".to_string(),
                ),
            });
        }

        if let Ok(previous) = read_lock_info(&lock_path) {
            warn!(
                path = %path.display(),
                holder = %previous.user_id,
                pid = previous.pid,
                "taking over stale store lock"
            );
        }

        let lock_json = serde_json::to_string_pretty(&info)?;
        let write_err = |e: std::io::Error| CalcError::io("write lock", lock_path.display().to_string(), e.to_string());

        lock_file.set_len(0).map_err(write_err)?;
        lock_file.seek(SeekFrom::Start(0)).map_err(write_err)?;
        lock_file.write_all(lock_json.as_bytes()).map_err(write_err)?;

        lock_file
            .sync_all()
            .map_err(|e| CalcError::io("sync lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %path.display(), user = %info.user_id, "store lock acquired");

        Ok(FileLock {
            store_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if a file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if a live process holds it, `None` if available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        let file = File::open(&lock_path).ok()?;
        if file.try_lock_shared().is_ok() {
            let _ = file.unlock();
            return None;
        }
        read_lock_info(&lock_path).ok()
    }

    /// Get the path to the locked store file
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
        // OS lock is released when _lock_file is dropped
    }
}

/// Get the lock file path for a store file
fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut lock_path = store_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

/// Read lock info from a lock file
fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let mut file = File::open(lock_path)
        .map_err(|e| CalcError::io("read lock", lock_path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::io("read lock", lock_path.display().to_string(), e.to_string()))?;

    Ok(serde_json::from_str(&contents)?)
}

/// Write a store file with atomic semantics.
///
/// 1. Serialize to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename over the real file
fn save_store(contents: &StoreFile, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(contents)?;

    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::io("create temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::io("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .sync_all()
        .map_err(|e| CalcError::io("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::io("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp_path = path.to_path_buf();
    let extension = tmp_path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    tmp_path.set_extension(extension);
    tmp_path
}

/// Load and version-check a store file.
fn load_store(path: &Path) -> CalcResult<StoreFile> {
    let mut file = File::open(path).map_err(|e| CalcError::io("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::io("read", path.display().to_string(), e.to_string()))?;

    let store: StoreFile = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
        reason: format!("Invalid JSON in {}: {}", path.display(), e),
    })?;

    validate_version(&store.version)?;

    Ok(store)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions, a newer minor is a breaking change
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

/// Document store persisted to a single JSON file.
///
/// Opening for writing takes the file lock for the lifetime of the store.
/// A read-only store never locks and rejects every write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    contents: StoreFile,
    lock: Option<FileLock>,
}

impl JsonFileStore {
    /// Open (or start) a store file for reading and writing.
    ///
    /// A missing file is treated as an empty store and is created on first write.
    pub fn open(path: &Path, user_id: impl Into<String>) -> CalcResult<Self> {
        let lock = FileLock::acquire(path, user_id)?;
        let contents = if path.exists() {
            load_store(path)?
        } else {
            info!(path = %path.display(), "starting new store file");
            StoreFile::empty()
        };
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            contents,
            lock: Some(lock),
        })
    }

    /// Open a store file for reading only. Does not take the lock.
    pub fn open_read_only(path: &Path) -> CalcResult<Self> {
        if let Some(holder) = FileLock::check(path) {
            debug!(
                path = %path.display(),
                holder = %holder.user_id,
                "store is locked by another writer, reading anyway"
            );
        }
        let contents = if path.exists() {
            load_store(path)?
        } else {
            StoreFile::empty()
        };
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            contents,
            lock: None,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the store was last written
    pub fn modified(&self) -> DateTime<Utc> {
        self.contents.modified
    }

    /// Whether writes are allowed
    pub fn is_writable(&self) -> bool {
        self.lock.is_some()
    }

    /// Apply a mutation to a copy of the contents, save it, then commit.
    ///
    /// On a failed save the in-memory state stays equal to the file.
    fn write_through<T>(&mut self, op: impl FnOnce(&mut MemoryStore) -> CalcResult<T>) -> CalcResult<T> {
        if self.lock.is_none() {
            return Err(CalcError::io(
                "write",
                self.path.display().to_string(),
                "store was opened read-only",
            ));
        }
        let mut next = self.contents.clone();
        let out = op(&mut next.collections)?;
        next.modified = Utc::now();
        save_store(&next, &self.path)?;
        self.contents = next;
        Ok(out)
    }
}

impl DocumentStore for JsonFileStore {
    fn get(&self, collection: &CollectionPath, id: &str) -> CalcResult<Document> {
        self.contents.collections.get(collection, id)
    }

    fn list(&self, collection: &CollectionPath) -> CalcResult<Vec<(String, Document)>> {
        self.contents.collections.list(collection)
    }

    fn put(&mut self, collection: &CollectionPath, id: Option<&str>, document: Document) -> CalcResult<String> {
        self.write_through(|store| store.put(collection, id, document))
    }

    fn update(&mut self, collection: &CollectionPath, id: &str, partial: Document) -> CalcResult<()> {
        self.write_through(|store| store.update(collection, id, partial))
    }

    fn delete(&mut self, collection: &CollectionPath, id: &str) -> CalcResult<()> {
        self.write_through(|store| store.delete(collection, id))
    }
}
