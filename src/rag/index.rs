//! Vector index for semantic search.
//!
//! A store holds named collections of [`IndexEntry`] values. The persistent
//! store keeps everything in one SQLite file; the in-memory store backs tests
//! and throwaway sessions. Both rank by brute-force cosine similarity, which is
//! plenty for a single resume.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use thiserror::Error;

use super::models::{CollectionState, IndexEntry, IndexStats, ScoredEntry};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Batch {batch} failed: {source}")]
    Batch {
        batch: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Collection not found: {0}")]
    CollectionMissing(String),

    #[error("Index lock poisoned: {0}")]
    Poisoned(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Default number of entries written per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Operations on a single named collection.
pub trait VectorIndex: Send {
    /// Collection name.
    fn name(&self) -> &str;

    /// Insert or replace entries by id. Either every entry lands or none do.
    fn upsert(&mut self, entries: &[IndexEntry]) -> Result<()>;

    /// Swap the whole collection for `entries`.
    ///
    /// On failure the previous entries and recorded dimension are kept.
    fn replace_all(&mut self, entries: &[IndexEntry]) -> Result<()>;

    /// The `k` nearest entries, closest first. `k` is clamped to the collection size.
    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>>;

    /// Number of entries in the collection.
    fn count(&self) -> Result<usize>;

    /// Remove every entry.
    fn clear(&mut self) -> Result<()>;

    /// Remove the given ids. Unknown ids are ignored.
    fn delete(&mut self, ids: &[String]) -> Result<()>;

    /// Summary of the collection contents.
    fn stats(&self) -> Result<IndexStats>;
}

/// A store of named collections.
pub trait IndexProvider {
    type Collection: VectorIndex;

    /// Open a collection, creating an empty one if it does not exist yet.
    fn get_or_create(&self, name: &str) -> Result<(Self::Collection, CollectionState)>;

    /// Drop a collection and all its entries. Returns whether it existed.
    fn delete_collection(&self, name: &str) -> Result<bool>;
}

// ============================================================================
// SQLite store
// ============================================================================

/// Persistent store rooted at a local directory.
pub struct SqliteIndexProvider {
    db_path: PathBuf,
    batch_size: usize,
}

impl SqliteIndexProvider {
    /// File name of the database inside the store directory.
    pub const DB_FILE: &'static str = "index.sqlite3";

    /// Create a store in `store_dir`, creating the directory if needed.
    pub fn new(store_dir: &Path, batch_size: usize) -> Result<Self> {
        std::fs::create_dir_all(store_dir)?;

        Ok(Self {
            db_path: store_dir.join(Self::DB_FILE),
            batch_size: batch_size.max(1),
        })
    }

    /// Get the database path.
    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }

    fn open(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                dimensions INTEGER,
                created_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            -- Embeddings are f32 little-endian blobs
            CREATE TABLE IF NOT EXISTS entries (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                section TEXT NOT NULL,
                document TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
            "#,
        )?;

        Ok(conn)
    }
}

impl IndexProvider for SqliteIndexProvider {
    type Collection = SqliteCollection;

    fn get_or_create(&self, name: &str) -> Result<(SqliteCollection, CollectionState)> {
        let conn = self.open()?;

        let existing: Option<Option<i64>> = conn
            .query_row(
                "SELECT dimensions FROM collections WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        let (dimensions, state) = match existing {
            Some(dims) => (dims.map(|d| d as usize), CollectionState::Existing),
            None => {
                conn.execute("INSERT INTO collections (name) VALUES (?1)", params![name])?;
                (None, CollectionState::Created)
            }
        };

        log::info!(
            "{} collection '{}' at {:?}",
            match state {
                CollectionState::Created => "Created",
                CollectionState::Existing => "Connected to existing",
            },
            name,
            self.db_path
        );

        Ok((
            SqliteCollection {
                conn,
                name: name.to_string(),
                batch_size: self.batch_size,
                dimensions,
            },
            state,
        ))
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM entries WHERE collection = ?1", params![name])?;
        let removed = tx.execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}

/// A collection inside the SQLite store.
pub struct SqliteCollection {
    conn: Connection,
    name: String,
    batch_size: usize,
    dimensions: Option<usize>,
}

impl SqliteCollection {
    fn ensure_exists(&self) -> Result<()> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE name = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        if found == 0 {
            return Err(IndexError::CollectionMissing(self.name.clone()));
        }
        Ok(())
    }

    fn load_entries(&self) -> Result<Vec<IndexEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, section, document, embedding FROM entries WHERE collection = ?1 ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map(params![self.name], |row| {
                Ok(IndexEntry {
                    id: row.get(0)?,
                    metadata: super::models::EntryMetadata {
                        section: row.get(1)?,
                    },
                    document: row.get(2)?,
                    embedding: deserialize_embedding(&row.get::<_, Vec<u8>>(3)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }
}

fn write_batch(tx: &Transaction, collection: &str, batch: &[IndexEntry]) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO entries (collection, id, section, document, embedding) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;

    for entry in batch {
        stmt.execute(params![
            collection,
            entry.id,
            entry.metadata.section,
            entry.document,
            serialize_embedding(&entry.embedding),
        ])?;
    }

    Ok(())
}

impl SqliteCollection {
    /// Write `entries` in batches inside one transaction, optionally
    /// deleting the current entries first.
    fn write(&mut self, entries: &[IndexEntry], replace: bool) -> Result<()> {
        let recorded = if replace { None } else { self.dimensions };
        let dimensions = check_dimensions(entries, recorded)?;
        if dimensions.is_none() && !replace {
            return Ok(());
        }
        self.ensure_exists()?;

        let tx = self.conn.transaction()?;
        if replace {
            tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.name])?;
        }

        for (batch, chunk) in entries.chunks(self.batch_size).enumerate() {
            write_batch(&tx, &self.name, chunk)
                .map_err(|source| IndexError::Batch { batch, source })?;
            log::debug!(
                "Wrote batch {} ({} entries) to '{}'",
                batch,
                chunk.len(),
                self.name
            );
        }

        tx.execute(
            "UPDATE collections SET dimensions = ?1 WHERE name = ?2",
            params![dimensions.map(|d| d as i64), self.name],
        )?;
        tx.commit()?;

        self.dimensions = dimensions;
        Ok(())
    }
}

impl VectorIndex for SqliteCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn upsert(&mut self, entries: &[IndexEntry]) -> Result<()> {
        self.write(entries, false)
    }

    fn replace_all(&mut self, entries: &[IndexEntry]) -> Result<()> {
        self.write(entries, true)
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = self.dimensions {
            if embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        Ok(rank(embedding, self.load_entries()?, k))
    }

    fn count(&self) -> Result<usize> {
        self.ensure_exists()?;
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE collection = ?1",
            params![self.name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn clear(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries WHERE collection = ?1", params![self.name])?;
        tx.execute(
            "UPDATE collections SET dimensions = NULL WHERE name = ?1",
            params![self.name],
        )?;
        tx.commit()?;

        self.dimensions = None;
        Ok(())
    }

    fn delete(&mut self, ids: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare_cached("DELETE FROM entries WHERE collection = ?1 AND id = ?2")?;
            for id in ids {
                stmt.execute(params![self.name, id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn stats(&self) -> Result<IndexStats> {
        let entry_count = self.count()?;

        let mut stmt = self
            .conn
            .prepare("SELECT section FROM entries WHERE collection = ?1 ORDER BY rowid")?;
        let sections = stmt
            .query_map(params![self.name], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(IndexStats {
            collection: self.name.clone(),
            entry_count,
            dimensions: self.dimensions,
            sections: distinct_in_order(sections),
        })
    }
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Default)]
struct MemoryData {
    entries: Vec<IndexEntry>,
    dimensions: Option<usize>,
}

type Registry = Arc<Mutex<HashMap<String, Arc<Mutex<MemoryData>>>>>;

/// Process-local store. Handles to the same name share entries.
#[derive(Clone)]
pub struct MemoryIndexProvider {
    collections: Registry,
    batch_size: usize,
}

impl Default for MemoryIndexProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl MemoryIndexProvider {
    pub fn new(batch_size: usize) -> Self {
        Self {
            collections: Arc::new(Mutex::new(HashMap::new())),
            batch_size: batch_size.max(1),
        }
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> IndexError {
    IndexError::Poisoned(err.to_string())
}

impl IndexProvider for MemoryIndexProvider {
    type Collection = MemoryCollection;

    fn get_or_create(&self, name: &str) -> Result<(MemoryCollection, CollectionState)> {
        let mut collections = self.collections.lock().map_err(poisoned)?;

        let state = if collections.contains_key(name) {
            CollectionState::Existing
        } else {
            CollectionState::Created
        };
        let data = collections.entry(name.to_string()).or_default().clone();

        Ok((
            MemoryCollection {
                name: name.to_string(),
                data,
                registry: Arc::clone(&self.collections),
                batch_size: self.batch_size,
            },
            state,
        ))
    }

    fn delete_collection(&self, name: &str) -> Result<bool> {
        let mut collections = self.collections.lock().map_err(poisoned)?;
        Ok(collections.remove(name).is_some())
    }
}

/// A collection inside a [`MemoryIndexProvider`].
pub struct MemoryCollection {
    name: String,
    data: Arc<Mutex<MemoryData>>,
    registry: Registry,
    batch_size: usize,
}

impl MemoryCollection {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryData>> {
        let registered = self
            .registry
            .lock()
            .map_err(poisoned)?
            .get(&self.name)
            .map(|data| Arc::ptr_eq(data, &self.data))
            .unwrap_or(false);
        if !registered {
            return Err(IndexError::CollectionMissing(self.name.clone()));
        }
        self.data.lock().map_err(poisoned)
    }

    /// Insert or replace `entries` by id into `target`, batch by batch.
    fn merge(&self, target: &mut Vec<IndexEntry>, entries: &[IndexEntry]) {
        for (batch, chunk) in entries.chunks(self.batch_size).enumerate() {
            for entry in chunk {
                match target.iter_mut().find(|e| e.id == entry.id) {
                    Some(existing) => *existing = entry.clone(),
                    None => target.push(entry.clone()),
                }
            }
            log::debug!("Wrote batch {} ({} entries) to '{}'", batch, chunk.len(), self.name);
        }
    }
}

impl VectorIndex for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn upsert(&mut self, entries: &[IndexEntry]) -> Result<()> {
        let mut data = self.lock()?;
        let Some(dimensions) = check_dimensions(entries, data.dimensions)? else {
            return Ok(());
        };

        self.merge(&mut data.entries, entries);
        data.dimensions = Some(dimensions);
        Ok(())
    }

    fn replace_all(&mut self, entries: &[IndexEntry]) -> Result<()> {
        let mut data = self.lock()?;
        let dimensions = check_dimensions(entries, None)?;

        let mut fresh = Vec::with_capacity(entries.len());
        self.merge(&mut fresh, entries);
        data.entries = fresh;
        data.dimensions = dimensions;
        Ok(())
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredEntry>> {
        let data = self.lock()?;
        if k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = data.dimensions {
            if embedding.len() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        Ok(rank(embedding, data.entries.clone(), k))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.lock()?.entries.len())
    }

    fn clear(&mut self) -> Result<()> {
        let mut data = self.lock()?;
        data.entries.clear();
        data.dimensions = None;
        Ok(())
    }

    fn delete(&mut self, ids: &[String]) -> Result<()> {
        let mut data = self.lock()?;
        data.entries.retain(|e| !ids.contains(&e.id));
        Ok(())
    }

    fn stats(&self) -> Result<IndexStats> {
        let data = self.lock()?;
        Ok(IndexStats {
            collection: self.name.clone(),
            entry_count: data.entries.len(),
            dimensions: data.dimensions,
            sections: distinct_in_order(
                data.entries.iter().map(|e| e.metadata.section.clone()).collect(),
            ),
        })
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Check that every entry has the same dimension as the collection.
///
/// Returns the dimension to record, or `None` when there is nothing to write.
fn check_dimensions(entries: &[IndexEntry], recorded: Option<usize>) -> Result<Option<usize>> {
    let Some(first) = entries.first() else {
        return Ok(None);
    };

    let expected = recorded.unwrap_or(first.embedding.len());
    for entry in entries {
        if entry.embedding.len() != expected || entry.embedding.is_empty() {
            return Err(IndexError::DimensionMismatch {
                expected,
                actual: entry.embedding.len(),
            });
        }
    }

    Ok(Some(expected))
}

/// Score every candidate against the query and keep the best `k`.
fn rank(query: &[f32], candidates: Vec<IndexEntry>, k: usize) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = candidates
        .into_iter()
        .map(|entry| ScoredEntry {
            score: cosine_similarity(query, &entry.embedding),
            entry,
        })
        .collect();

    // Sort by score descending
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}

fn distinct_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// Serialize embedding to binary blob.
fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from binary blob.
fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}
