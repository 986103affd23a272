// Embeddings module
// Chunking of extracted text and the Gemini embedding client

pub mod chunking;
pub mod gemini;

pub use chunking::{ChunkingConfig, chunk_text};
pub use gemini::GeminiClient;
