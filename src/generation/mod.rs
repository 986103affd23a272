// Answer generation
// Turns retrieved context and a question into a grounded natural-language answer

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use tracing::debug;

use crate::embeddings::GeminiClient;
use crate::store::RetrievedDocument;

const NO_CONTEXT_REPLY: &str =
    "I couldn't find anything in the knowledge base about that. Try rephrasing the \
     question, or ask an administrator to upload documents covering the topic.";

/// A generated answer together with the documents it was grounded in.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

/// Answer a question from retrieved context.
///
/// With no retrieved documents the model is not called at all; a fixed
/// fallback reply comes back instead, so the assistant never invents an
/// answer without grounding.
#[inline]
pub fn answer_question(
    client: &GeminiClient,
    question: &str,
    context_documents: &[RetrievedDocument],
) -> Result<Answer> {
    if context_documents.is_empty() {
        debug!("No retrieved context for question, skipping generation");
        return Ok(Answer {
            text: NO_CONTEXT_REPLY.to_string(),
            sources: Vec::new(),
        });
    }

    let prompt = build_prompt(question, context_documents);
    let text = client
        .complete(&prompt)
        .context("Failed to generate answer")?;

    Ok(Answer {
        text,
        sources: source_filenames(context_documents),
    })
}

/// Build the grounding prompt: retrieved document text as context, then the
/// question, with instructions to stay within the context.
fn build_prompt(question: &str, documents: &[RetrievedDocument]) -> String {
    let context = documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful assistant answering questions about an organization's \
         document collection. Answer using only the context below. If the context \
         does not contain the answer, say so instead of guessing.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer clearly and concisely, citing specifics from the context where helpful."
    )
}

fn source_filenames(documents: &[RetrievedDocument]) -> Vec<String> {
    documents
        .iter()
        .map(|doc| doc.metadata.filename.clone())
        .collect()
}

/// Render a source list for display beneath an answer.
#[inline]
pub fn format_sources(answer: &Answer) -> String {
    answer
        .sources
        .iter()
        .map(|filename| format!("- {}", filename))
        .collect::<Vec<_>>()
        .join("\n")
}
