// Document store types
// Maps document ids to their text, metadata, and owned vector-index rows


use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extraction::FileType;
use crate::{RagError, Result};

/// Metadata recorded for every ingested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub file_type: FileType,
    pub upload_date: DateTime<Utc>,
}

/// A stored document: its full extracted text, metadata, and the ordered
/// list of vector-index rows it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub text: String,
    pub metadata: DocumentMetadata,
    /// Rows in the vector index belonging to this document, in chunk order.
    /// Always a contiguous ascending range at ingest time; reassigned (still
    /// contiguous per document) when a deletion rebuilds the index.
    pub chunk_rows: Vec<usize>,
}

/// Summary row returned by the listing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub upload_date: DateTime<Utc>,
}

/// A document returned from a similarity query, ranked by its best chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// The serialized document store and position map, persisted alongside the
/// vector index as one logical unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Document id -> entry.
    pub documents: HashMap<String, DocumentEntry>,
    /// Position map: one owning document id per vector-index row, in row
    /// order. `row_owners.len()` must always equal the index row count.
    pub row_owners: Vec<String>,
}

impl StoreSnapshot {
    /// Validate the store against a vector-index row count.
    ///
    /// Checks the invariants the rest of the engine relies on: the position
    /// map mirrors the index row for row, every row is owned by a known
    /// document, and the documents' row lists partition `0..row_count`
    /// without overlap or gaps.
    #[inline]
    pub fn check_invariants(&self, row_count: usize) -> Result<()> {
        if self.row_owners.len() != row_count {
            return Err(RagError::CorruptState(format!(
                "Position map has {} entries but index has {} rows",
                self.row_owners.len(),
                row_count
            )));
        }

        let mut seen = HashSet::with_capacity(row_count);
        for (id, entry) in &self.documents {
            for &row in &entry.chunk_rows {
                if row >= row_count {
                    return Err(RagError::CorruptState(format!(
                        "Document {} claims row {} beyond index size {}",
                        id, row, row_count
                    )));
                }
                if self.row_owners[row] != *id {
                    return Err(RagError::CorruptState(format!(
                        "Row {} owned by {} in position map but claimed by {}",
                        row, self.row_owners[row], id
                    )));
                }
                if !seen.insert(row) {
                    return Err(RagError::CorruptState(format!(
                        "Row {} claimed by more than one document",
                        row
                    )));
                }
            }
        }

        if seen.len() != row_count {
            return Err(RagError::CorruptState(format!(
                "{} of {} index rows are unowned",
                row_count - seen.len(),
                row_count
            )));
        }

        Ok(())
    }
}
