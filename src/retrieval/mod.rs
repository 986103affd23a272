// Retrieval engine
// Ingestion, similarity queries, deletion via index rebuild, and persistence


use std::collections::HashSet;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::index::FlatIndex;
use crate::store::{
    DocumentEntry, DocumentMetadata, DocumentSummary, RetrievedDocument, StoreSnapshot,
};
use crate::{RagError, Result};

const INDEX_FILE: &str = "index.bin";
const METADATA_FILE: &str = "metadata.json";
const TMP_EXTENSION: &str = "tmp";

const INDEX_MAGIC: [u8; 4] = *b"ADIX";
const INDEX_FORMAT_VERSION: u32 = 1;
// Magic + version + dimension + row count
const INDEX_HEADER_BYTES: u64 = 4 + 4 + 8 + 8;

/// The document ingestion and similarity-retrieval engine.
///
/// Owns the vector index, the document store, and the position map, and
/// keeps them consistent across ingestion, deletion, and restarts. The
/// engine is single-writer: callers that interleave reads with ingestion or
/// deletion must guard it with one mutual-exclusion boundary (a `Mutex` is
/// enough), since deletion swaps the index, store, and position map as a
/// unit.
#[derive(Debug)]
pub struct RetrievalEngine {
    persist_dir: PathBuf,
    index: FlatIndex,
    store: StoreSnapshot,
}

impl RetrievalEngine {
    /// Open the engine against a persistence directory.
    ///
    /// If both persisted artifacts exist they are loaded and cross-checked;
    /// if neither exists a fresh empty corpus is initialized. Exactly one
    /// artifact present, or a malformed artifact, is corruption: startup
    /// halts with [`RagError::CorruptState`] rather than silently discarding
    /// a real corpus as an empty one.
    #[inline]
    pub fn open<P: AsRef<Path>>(persist_dir: P, dimension: usize) -> Result<Self> {
        let persist_dir = persist_dir.as_ref().to_path_buf();
        fs::create_dir_all(&persist_dir)
            .map_err(|e| RagError::Storage(format!("Failed to create corpus directory: {}", e)))?;

        let index_path = persist_dir.join(INDEX_FILE);
        let metadata_path = persist_dir.join(METADATA_FILE);

        let engine = match (index_path.exists(), metadata_path.exists()) {
            (true, true) => {
                let index = read_index_file(&index_path, dimension)?;
                let store = read_metadata_file(&metadata_path)?;
                store.check_invariants(index.len())?;

                info!(
                    "Loaded corpus: {} documents, {} vectors",
                    store.documents.len(),
                    index.len()
                );
                Self {
                    persist_dir,
                    index,
                    store,
                }
            }
            (false, false) => {
                debug!("No persisted corpus found, starting empty");
                Self {
                    persist_dir,
                    index: FlatIndex::new(dimension),
                    store: StoreSnapshot::default(),
                }
            }
            (index_present, _) => {
                let (present, missing) = if index_present {
                    (INDEX_FILE, METADATA_FILE)
                } else {
                    (METADATA_FILE, INDEX_FILE)
                };
                return Err(RagError::CorruptState(format!(
                    "Found {} but not {} in {}",
                    present,
                    missing,
                    persist_dir.display()
                )));
            }
        };

        Ok(engine)
    }

    /// The fixed embedding dimension of the underlying index.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Number of stored documents.
    #[inline]
    pub fn document_count(&self) -> usize {
        self.store.documents.len()
    }

    /// Number of indexed chunk vectors across all documents.
    #[inline]
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    /// Ingest a document: append its chunk embeddings to the index as one
    /// contiguous batch, extend the position map, record the document entry,
    /// and persist.
    ///
    /// Duplicate ids are rejected rather than overwritten, and a document
    /// must carry at least one embedded chunk. If persisting fails after the
    /// in-memory mutation, memory and disk diverge until the next successful
    /// write; the caller should retry with a fresh document id.
    #[inline]
    pub fn ingest(
        &mut self,
        document_id: &str,
        text: String,
        metadata: DocumentMetadata,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<()> {
        if self.store.documents.contains_key(document_id) {
            return Err(RagError::DuplicateDocument(document_id.to_string()));
        }

        if embeddings.is_empty() {
            return Err(RagError::Embedding(format!(
                "Document {} produced no embedded chunks",
                document_id
            )));
        }

        let start = self.index.add_batch(&embeddings)?;
        let chunk_rows: Vec<usize> = (start..start + embeddings.len()).collect();

        self.store
            .row_owners
            .extend(std::iter::repeat_n(document_id.to_string(), embeddings.len()));
        self.store.documents.insert(
            document_id.to_string(),
            DocumentEntry {
                text,
                metadata,
                chunk_rows,
            },
        );

        self.persist()?;

        info!(
            "Ingested document {} with {} chunks ({} total vectors)",
            document_id,
            embeddings.len(),
            self.index.len()
        );
        Ok(())
    }

    /// Find the documents most similar to a query embedding.
    ///
    /// Searches the `k` nearest chunk vectors, then deduplicates by owning
    /// document, keeping the first (best-distance) occurrence of each, so at
    /// most `k` distinct documents come back ranked by their best-matching
    /// chunk. An empty corpus yields an empty result, never an error.
    #[inline]
    pub fn query(&self, query_embedding: &[f32], k: usize) -> Result<Vec<RetrievedDocument>> {
        if self.index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let hits = self.index.search(query_embedding, k)?;

        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for (row, distance) in hits {
            // Rows past the position map would mean a broken invariant;
            // skip them instead of panicking mid-query
            let Some(owner) = self.store.row_owners.get(row) else {
                warn!("Search returned row {} beyond position map", row);
                continue;
            };

            if !seen.insert(owner.clone()) {
                continue;
            }

            if let Some(entry) = self.store.documents.get(owner) {
                debug!(
                    "Query hit: document {} via row {} (distance {:.4})",
                    owner, row, distance
                );
                results.push(RetrievedDocument {
                    id: owner.clone(),
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                });
            }
        }

        Ok(results)
    }

    /// Delete a document, rebuilding the index without its vectors.
    ///
    /// The flat index has no row-deletion primitive, so every surviving row
    /// is replayed in ascending order into a fresh index, position map, and
    /// store; surviving documents get newly assigned contiguous positions in
    /// the compacted row order. The rebuilt state is swapped in as a unit
    /// and then persisted. O(total rows), a deliberate simplicity tradeoff
    /// for an admin-curated, low-churn corpus.
    #[inline]
    pub fn delete(&mut self, document_id: &str) -> Result<()> {
        let Some(entry) = self.store.documents.get(document_id) else {
            return Err(RagError::NotFound(document_id.to_string()));
        };
        let deleted_rows: HashSet<usize> = entry.chunk_rows.iter().copied().collect();

        let mut new_index = FlatIndex::new(self.index.dimension());
        let mut new_store = StoreSnapshot::default();

        for (old_row, vector) in self.index.rows().enumerate() {
            if deleted_rows.contains(&old_row) {
                continue;
            }

            let owner = &self.store.row_owners[old_row];
            let new_row = new_index.add(vector)?;
            new_store.row_owners.push(owner.clone());

            let surviving = new_store
                .documents
                .entry(owner.clone())
                .or_insert_with(|| {
                    let original = &self.store.documents[owner];
                    DocumentEntry {
                        text: original.text.clone(),
                        metadata: original.metadata.clone(),
                        chunk_rows: Vec::new(),
                    }
                });
            surviving.chunk_rows.push(new_row);
        }

        // Swap the rebuilt state in as a unit, then persist
        self.index = new_index;
        self.store = new_store;
        self.persist()?;

        info!(
            "Deleted document {} ({} documents, {} vectors remain)",
            document_id,
            self.store.documents.len(),
            self.index.len()
        );
        Ok(())
    }

    /// List every stored document, sorted by upload date then id.
    #[inline]
    pub fn list(&self) -> Vec<DocumentSummary> {
        self.store
            .documents
            .iter()
            .map(|(id, entry)| DocumentSummary {
                id: id.clone(),
                filename: entry.metadata.filename.clone(),
                file_type: entry.metadata.file_type,
                upload_date: entry.metadata.upload_date,
            })
            .sorted_by(|a, b| {
                a.upload_date
                    .cmp(&b.upload_date)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .collect()
    }

    /// Write both artifacts to the persistence directory.
    ///
    /// Each artifact is written to a temporary file and renamed into place
    /// so a crash mid-write never leaves a truncated artifact behind.
    fn persist(&self) -> Result<()> {
        write_index_file(&self.persist_dir.join(INDEX_FILE), &self.index)?;
        write_metadata_file(&self.persist_dir.join(METADATA_FILE), &self.store)?;
        debug!(
            "Persisted corpus to {} ({} vectors)",
            self.persist_dir.display(),
            self.index.len()
        );
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &StoreSnapshot {
        &self.store
    }
}

fn write_index_file(path: &Path, index: &FlatIndex) -> Result<()> {
    let tmp_path = path.with_extension(TMP_EXTENSION);
    let file = fs::File::create(&tmp_path)
        .map_err(|e| RagError::Storage(format!("Failed to create index file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    let write_err = |e| RagError::Storage(format!("Failed to write index file: {}", e));

    writer.write_all(&INDEX_MAGIC).map_err(write_err)?;
    writer
        .write_all(&INDEX_FORMAT_VERSION.to_le_bytes())
        .map_err(write_err)?;
    writer
        .write_all(&(index.dimension() as u64).to_le_bytes())
        .map_err(write_err)?;
    writer
        .write_all(&(index.len() as u64).to_le_bytes())
        .map_err(write_err)?;

    for value in index.raw_data() {
        writer.write_all(&value.to_le_bytes()).map_err(write_err)?;
    }

    writer.flush().map_err(write_err)?;
    fs::rename(&tmp_path, path)
        .map_err(|e| RagError::Storage(format!("Failed to finalize index file: {}", e)))?;
    Ok(())
}

fn read_index_file(path: &Path, expected_dimension: usize) -> Result<FlatIndex> {
    let file = fs::File::open(path)
        .map_err(|e| RagError::CorruptState(format!("Failed to open index file: {}", e)))?;
    let file_len = file
        .metadata()
        .map_err(|e| RagError::CorruptState(format!("Failed to stat index file: {}", e)))?
        .len();
    let mut reader = BufReader::new(file);

    let read_err = |e| RagError::CorruptState(format!("Failed to read index file: {}", e));

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(read_err)?;
    if magic != INDEX_MAGIC {
        return Err(RagError::CorruptState(
            "Index file has wrong magic bytes".to_string(),
        ));
    }

    let mut u32_buf = [0u8; 4];
    reader.read_exact(&mut u32_buf).map_err(read_err)?;
    let version = u32::from_le_bytes(u32_buf);
    if version != INDEX_FORMAT_VERSION {
        return Err(RagError::CorruptState(format!(
            "Unsupported index format version {}",
            version
        )));
    }

    let mut u64_buf = [0u8; 8];
    reader.read_exact(&mut u64_buf).map_err(read_err)?;
    let dimension = u64::from_le_bytes(u64_buf) as usize;
    if dimension != expected_dimension {
        return Err(RagError::CorruptState(format!(
            "Index dimension {} does not match configured dimension {}",
            dimension, expected_dimension
        )));
    }

    reader.read_exact(&mut u64_buf).map_err(read_err)?;
    let rows = u64::from_le_bytes(u64_buf);

    // The header values are untrusted; size everything with checked
    // arithmetic and cross-check against the actual file length before
    // allocating anything proportional to the declared row count
    let expected_len = rows
        .checked_mul(dimension as u64)
        .and_then(|values| values.checked_mul(4))
        .and_then(|bytes| bytes.checked_add(INDEX_HEADER_BYTES))
        .ok_or_else(|| {
            RagError::CorruptState(format!("Index row count {} is implausible", rows))
        })?;
    if file_len != expected_len {
        return Err(RagError::CorruptState(format!(
            "Index file length {} does not match declared {} rows of dimension {}",
            file_len, rows, dimension
        )));
    }

    let value_count = (rows as usize) * dimension;
    let mut data = Vec::with_capacity(value_count);
    let mut f32_buf = [0u8; 4];
    for _ in 0..value_count {
        reader.read_exact(&mut f32_buf).map_err(read_err)?;
        data.push(f32::from_le_bytes(f32_buf));
    }

    FlatIndex::from_raw(dimension, data)
}

fn write_metadata_file(path: &Path, store: &StoreSnapshot) -> Result<()> {
    let tmp_path = path.with_extension(TMP_EXTENSION);
    let file = fs::File::create(&tmp_path)
        .map_err(|e| RagError::Storage(format!("Failed to create metadata file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer(&mut writer, store)
        .map_err(|e| RagError::Storage(format!("Failed to write metadata file: {}", e)))?;
    writer
        .flush()
        .map_err(|e| RagError::Storage(format!("Failed to write metadata file: {}", e)))?;

    fs::rename(&tmp_path, path)
        .map_err(|e| RagError::Storage(format!("Failed to finalize metadata file: {}", e)))?;
    Ok(())
}

fn read_metadata_file(path: &Path) -> Result<StoreSnapshot> {
    let file = fs::File::open(path)
        .map_err(|e| RagError::CorruptState(format!("Failed to open metadata file: {}", e)))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader)
        .map_err(|e| RagError::CorruptState(format!("Failed to parse metadata file: {}", e)))
}
