
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for text chunking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Character budget per chunk, counting each word plus one separating
    /// space. A soft target: a single word longer than the budget still
    /// becomes its own chunk.
    pub max_chunk_chars: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_chunk_chars: 1000,
        }
    }
}

/// Split text into bounded-length word chunks ready for embedding.
///
/// Words are accumulated greedily until the next word would push the chunk
/// past `max_chunk_chars` (each word costs its character length plus one for
/// the separating space). No words are dropped, split, or reordered, so
/// joining the chunks with single spaces reproduces the whitespace-normalized
/// input. Empty or all-whitespace text yields no chunks; a single word longer
/// than the budget is emitted as its own oversized chunk.
#[inline]
pub fn chunk_text(text: &str, max_chunk_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    // Running cost in characters, counting one separator per word
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len + word_len + 1 > max_chunk_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len += word_len + 1;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    debug!(
        "Chunked {} chars into {} chunks (budget {})",
        text.len(),
        chunks.len(),
        max_chunk_chars
    );
    chunks
}
