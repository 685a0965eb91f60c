// ============================================================================
// HISTORY STORE — recency-ordered record store with capacity trimming
// ============================================================================

use std::io::BufWriter;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::EncodedImage;
use crate::presets::MAX_HISTORY_SIZE;

/// Magic string at the head of the store file.
const STORE_MAGIC_V1: &str = "SFH1";

/// Upper bound on records accepted from a store file.
/// Prevents memory exhaustion from crafted files.
const MAX_FILE_RECORDS: usize = 4_096;

/// One generated (or upscaled) image kept in history or favorites.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub image: EncodedImage,
    pub width: u32,
    pub height: u32,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub seed: Option<u32>,
}

impl HistoryRecord {
    pub fn new(
        image: EncodedImage,
        width: u32,
        height: u32,
        prompt: String,
        negative_prompt: Option<String>,
        created_at: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            image,
            width,
            height,
            prompt,
            negative_prompt,
            created_at,
            seed: None,
        }
    }
}

/// Error type for store operations.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Serialize(e) => write!(f, "Serialization error: {}", e),
            StoreError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for StoreError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        StoreError::Serialize(e.to_string())
    }
}

/// A recency-ordered record store. Capacity trimming (keep newest N) is the
/// store's responsibility, not the caller's.
pub trait HistoryStore {
    /// Insert or replace a record, then trim past capacity.
    fn put(&mut self, record: HistoryRecord) -> Result<(), StoreError>;

    /// All records, newest first. Equal timestamps keep insertion order.
    fn get_all(&self) -> Result<Vec<HistoryRecord>, StoreError>;

    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Replace the whole contents (used when syncing favorites wholesale).
    fn replace_all(&mut self, records: Vec<HistoryRecord>) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
//  In-memory store
// ---------------------------------------------------------------------------

/// Volatile store, mostly useful for tests and previews.
pub struct MemoryStore {
    records: Vec<HistoryRecord>,
    capacity: usize,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

/// Sort newest first (stable, so equal timestamps keep insertion order)
/// and drop everything past `capacity`.
fn trim_newest(records: &mut Vec<HistoryRecord>, capacity: usize) {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.truncate(capacity);
}

impl HistoryStore for MemoryStore {
    fn put(&mut self, record: HistoryRecord) -> Result<(), StoreError> {
        self.records.retain(|r| r.id != record.id);
        self.records.push(record);
        trim_newest(&mut self.records, self.capacity);
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.records.retain(|r| r.id != id);
        Ok(())
    }

    fn replace_all(&mut self, records: Vec<HistoryRecord>) -> Result<(), StoreError> {
        self.records = records;
        trim_newest(&mut self.records, self.capacity);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
//  File-backed store
// ---------------------------------------------------------------------------

/// Serializable store file contents.
#[derive(Serialize, Deserialize)]
struct StoreFileV1 {
    magic: String,
    records: Vec<HistoryRecord>,
}

/// Bincode-on-disk store. The whole record list is loaded at open and
/// rewritten after every mutation — history files stay small (≤ 50 records)
/// so this is far cheaper than it sounds.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Vec<HistoryRecord>,
    capacity: usize,
}

impl FileStore {
    /// Open (or create) a store at `path` with the given capacity.
    pub fn open(path: &Path, capacity: usize) -> Result<Self, StoreError> {
        let records = if path.exists() {
            let raw = std::fs::read(path)?;
            Self::parse(&raw)?
        } else {
            Vec::new()
        };
        let mut store = Self {
            path: path.to_path_buf(),
            records,
            capacity,
        };
        trim_newest(&mut store.records, store.capacity);
        Ok(store)
    }

    fn parse(raw: &[u8]) -> Result<Vec<HistoryRecord>, StoreError> {
        // bincode encodes a String as an 8-byte length prefix + UTF-8 data,
        // so a 4-char magic sits at bytes 8..12.
        if raw.len() < 12 {
            return Err(StoreError::InvalidFormat("File too small".into()));
        }
        let magic = std::str::from_utf8(&raw[8..12]).unwrap_or("");
        if magic != STORE_MAGIC_V1 {
            return Err(StoreError::InvalidFormat(format!("Unknown magic '{}'", magic)));
        }
        let file: StoreFileV1 = bincode::deserialize(raw)?;
        if file.records.len() > MAX_FILE_RECORDS {
            return Err(StoreError::InvalidFormat(format!(
                "Record count {} exceeds the limit",
                file.records.len()
            )));
        }
        Ok(file.records)
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let writer = BufWriter::new(file);
        let contents = StoreFileV1 {
            magic: STORE_MAGIC_V1.to_string(),
            records: self.records.clone(),
        };
        bincode::serialize_into(writer, &contents)?;
        Ok(())
    }
}

impl HistoryStore for FileStore {
    fn put(&mut self, record: HistoryRecord) -> Result<(), StoreError> {
        self.records.retain(|r| r.id != record.id);
        self.records.push(record);
        trim_newest(&mut self.records, self.capacity);
        self.persist()
    }

    fn get_all(&self) -> Result<Vec<HistoryRecord>, StoreError> {
        Ok(self.records.clone())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.records.retain(|r| r.id != id);
        self.persist()
    }

    fn replace_all(&mut self, records: Vec<HistoryRecord>) -> Result<(), StoreError> {
        self.records = records;
        trim_newest(&mut self.records, self.capacity);
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MIME_PNG;

    fn record(prompt: &str, created_at: u64) -> HistoryRecord {
        HistoryRecord::new(
            EncodedImage {
                mime_type: MIME_PNG.to_string(),
                data: vec![1, 2, 3],
            },
            4,
            4,
            prompt.to_string(),
            None,
            created_at,
        )
    }

    #[test]
    fn get_all_returns_newest_first() {
        let mut store = MemoryStore::new(10);
        store.put(record("a", 100)).unwrap();
        store.put(record("c", 300)).unwrap();
        store.put(record("b", 200)).unwrap();

        let all = store.get_all().unwrap();
        let prompts: Vec<&str> = all.iter().map(|r| r.prompt.as_str()).collect();
        assert_eq!(prompts, ["c", "b", "a"]);
    }

    #[test]
    fn put_trims_past_capacity_keeping_newest() {
        let mut store = MemoryStore::new(3);
        for t in 0..5u64 {
            store.put(record(&format!("p{}", t), t)).unwrap();
        }
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].prompt, "p4");
        assert_eq!(all[2].prompt, "p2");
    }

    #[test]
    fn delete_removes_by_id() {
        let mut store = MemoryStore::new(10);
        let r = record("x", 1);
        let id = r.id.clone();
        store.put(r).unwrap();
        store.put(record("y", 2)).unwrap();

        store.delete(&id).unwrap();
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "y");
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("scenefe-test-{}", Uuid::new_v4()));
        let path = dir.join("history.sfh");

        {
            let mut store = FileStore::open(&path, 10).unwrap();
            store.put(record("persisted", 42)).unwrap();
        }
        let store = FileStore::open(&path, 10).unwrap();
        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].prompt, "persisted");
        assert_eq!(all[0].created_at, 42);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_unknown_magic() {
        let dir = std::env::temp_dir().join(format!("scenefe-test-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bogus.sfh");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let err = FileStore::open(&path, 10).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFormat(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
