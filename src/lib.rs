use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Duplicate document id: {0}")]
    DuplicateDocument(String),

    #[error("Corrupt persisted state: {0}")]
    CorruptState(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod auth;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extraction;
pub mod generation;
pub mod index;
pub mod retrieval;
pub mod store;
