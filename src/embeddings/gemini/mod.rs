
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use url::Url;

use crate::RagError;
use crate::config::GeminiConfig;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 768;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

const TASK_RETRIEVAL_DOCUMENT: &str = "RETRIEVAL_DOCUMENT";
const TASK_RETRIEVAL_QUERY: &str = "RETRIEVAL_QUERY";

/// Client for the Gemini generative-language API: embeddings for retrieval
/// and text completion for answer generation.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: Url,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    embedding_dimension: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
    #[serde(rename = "taskType")]
    task_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 1.0,
            top_k: 1,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

impl GeminiClient {
    #[inline]
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let base_url =
            Url::parse(&config.endpoint).context("Failed to parse Gemini endpoint URL")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            api_key: config.resolve_api_key()?,
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            embedding_dimension: config.embedding_dimension as usize,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// The embedding dimension this client expects from the API.
    #[inline]
    pub fn embedding_dimension(&self) -> usize {
        self.embedding_dimension
    }

    /// Embed one document chunk for indexing.
    #[inline]
    pub fn embed_document_chunk(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, TASK_RETRIEVAL_DOCUMENT)
    }

    /// Embed a user question for similarity search.
    #[inline]
    pub fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(text, TASK_RETRIEVAL_QUERY)
    }

    /// Embed a batch of document chunks, skipping chunks that fail.
    ///
    /// A per-chunk embedding failure is logged and the chunk is dropped
    /// rather than failing the whole batch, so ingestion can proceed with
    /// fewer vectors than chunks. Order of the surviving vectors matches
    /// chunk order. `on_chunk` is called with each chunk's position after it
    /// has been attempted, whether or not it embedded, so callers can drive
    /// progress reporting.
    #[inline]
    pub fn embed_document_chunks<F>(&self, chunks: &[String], mut on_chunk: F) -> Vec<Vec<f32>>
    where
        F: FnMut(usize),
    {
        let mut embeddings = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            match self.embed_document_chunk(chunk) {
                Ok(vector) => embeddings.push(vector),
                Err(e) => {
                    warn!("Skipping chunk {} of {}: {}", i + 1, chunks.len(), e);
                }
            }
            on_chunk(i);
        }

        debug!(
            "Embedded {} of {} chunks",
            embeddings.len(),
            chunks.len()
        );
        embeddings
    }

    fn embed(&self, text: &str, task_type: &str) -> Result<Vec<f32>> {
        debug!(
            "Generating {} embedding for text (length: {})",
            task_type,
            text.len()
        );

        let request = EmbedRequest {
            model: self.embedding_model.clone(),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
            task_type: task_type.to_string(),
        };

        let url = self.endpoint_url(&self.embedding_model, "embedContent")?;
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate embedding")?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        let vector = embed_response.embedding.values;
        if vector.len() != self.embedding_dimension {
            return Err(RagError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding_dimension,
                vector.len()
            ))
            .into());
        }

        Ok(vector)
    }

    /// Run a text completion against the chat model.
    #[inline]
    pub fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Generating completion for prompt (length: {})", prompt.len());

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let url = self.endpoint_url(&self.chat_model, "generateContent")?;
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize generation request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Failed to generate completion")?;

        let response: GenerateResponse =
            serde_json::from_str(&response_text).context("Failed to parse generation response")?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| RagError::Generation("Model returned no candidates".to_string()))?;

        Ok(text)
    }

    fn endpoint_url(&self, model: &str, method: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("/v1beta/{}:{}", model, method))
            .context("Failed to build API URL")?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> std::result::Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.base_url);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}
