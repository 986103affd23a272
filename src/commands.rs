use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::config::Config;
use crate::embeddings::{GeminiClient, chunk_text};
use crate::extraction::{FileType, extract_text};
use crate::generation::{answer_question, format_sources};
use crate::retrieval::RetrievalEngine;
use crate::store::DocumentMetadata;
use crate::RagError;

const ADMIN_PASSWORD_ENV_VAR: &str = "ASKDOCS_ADMIN_PASSWORD";

/// Extract, chunk, embed, and ingest a file into the knowledge base.
#[inline]
pub fn add_document(file: &Path, declared_type: Option<FileType>) -> Result<()> {
    require_admin()?;

    let config = Config::load()?;
    let file_type = match declared_type {
        Some(t) => t,
        None => FileType::from_path(file)?,
    };
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| RagError::Extraction(format!("Invalid file path: {}", file.display())))?;

    info!("Adding document {} as {}", filename, file_type);

    let text = extract_text(file, file_type)?;
    let chunks = chunk_text(&text, config.chunking.max_chunk_chars);
    if chunks.is_empty() {
        return Err(RagError::Extraction(format!(
            "No text could be extracted from {}",
            filename
        ))
        .into());
    }

    let client = GeminiClient::new(&config.gemini)?;
    let embeddings = embed_with_progress(&client, &chunks);

    let mut engine = RetrievalEngine::open(
        config.vector_db_path(),
        config.gemini.embedding_dimension as usize,
    )?;

    let document_id = Uuid::new_v4().to_string();
    let metadata = DocumentMetadata {
        filename: filename.clone(),
        file_type,
        upload_date: chrono::Utc::now(),
    };
    let chunk_total = chunks.len();
    let embedded = embeddings.len();

    engine.ingest(&document_id, text, metadata, embeddings)?;

    println!(
        "{} Added {} to the knowledge base",
        style("✓").green(),
        style(&filename).bold()
    );
    println!("  Document id: {}", document_id);
    println!("  Chunks embedded: {}/{}", embedded, chunk_total);
    Ok(())
}

fn embed_with_progress(client: &GeminiClient, chunks: &[String]) -> Vec<Vec<f32>> {
    let bar = ProgressBar::new(chunks.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("Embedding chunks {bar:30} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let embeddings = client.embed_document_chunks(chunks, |_| bar.inc(1));
    bar.finish_and_clear();
    embeddings
}

/// Answer a question from the knowledge base.
#[inline]
pub fn ask_question(question: &str) -> Result<()> {
    let config = Config::load()?;
    let client = GeminiClient::new(&config.gemini)?;
    let engine = RetrievalEngine::open(
        config.vector_db_path(),
        config.gemini.embedding_dimension as usize,
    )?;

    let query_embedding = client
        .embed_query(question)
        .context("Failed to embed the question")?;
    let documents = engine.query(&query_embedding, config.retrieval.top_k)?;

    let answer = answer_question(&client, question, &documents)?;

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("{}", style("Sources:").bold());
        println!("{}", format_sources(&answer));
    }
    Ok(())
}

/// List every document in the knowledge base.
#[inline]
pub fn list_documents() -> Result<()> {
    require_admin()?;

    let config = Config::load()?;
    let engine = RetrievalEngine::open(
        config.vector_db_path(),
        config.gemini.embedding_dimension as usize,
    )?;

    let documents = engine.list();
    if documents.is_empty() {
        println!("The knowledge base is empty.");
        println!("Use 'askdocs add <file>' to upload a document.");
        return Ok(());
    }

    println!("Documents ({} total):", documents.len());
    println!();
    for doc in &documents {
        println!("{} {}", style("•").cyan(), style(&doc.filename).bold());
        println!("    Id:       {}", doc.id);
        println!("    Type:     {}", doc.file_type);
        println!(
            "    Uploaded: {}",
            doc.upload_date.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Delete a document by id, rebuilding the index without its vectors.
#[inline]
pub fn delete_document(document_id: &str) -> Result<()> {
    require_admin()?;

    let config = Config::load()?;
    let mut engine = RetrievalEngine::open(
        config.vector_db_path(),
        config.gemini.embedding_dimension as usize,
    )?;

    engine.delete(document_id)?;
    println!(
        "{} Removed document {} from the knowledge base",
        style("✓").green(),
        document_id
    );
    Ok(())
}

/// Show corpus statistics and storage locations.
#[inline]
pub fn show_status() -> Result<()> {
    let config = Config::load()?;
    let engine = RetrievalEngine::open(
        config.vector_db_path(),
        config.gemini.embedding_dimension as usize,
    )?;

    println!("{}", style("Knowledge base status").bold().cyan());
    println!("  Documents:        {}", engine.document_count());
    println!("  Indexed chunks:   {}", engine.chunk_count());
    println!("  Vector dimension: {}", engine.dimension());
    println!("  Corpus directory: {}", config.vector_db_path().display());
    println!("  Config file:      {}", config.config_file_path().display());
    Ok(())
}

/// Gate admin operations behind the admin password, when one is configured.
///
/// The password comes from `ASKDOCS_ADMIN_PASSWORD`; with it unset the
/// commands run ungated, which suits a single-user local install.
fn require_admin() -> Result<()> {
    let Ok(password) = env::var(ADMIN_PASSWORD_ENV_VAR) else {
        warn!(
            "{} not set; admin commands are not password-protected",
            ADMIN_PASSWORD_ENV_VAR
        );
        return Ok(());
    };

    let auth = AuthService::new(password);
    let attempt = Password::new()
        .with_prompt("Admin password")
        .interact()
        .context("Failed to read admin password")?;

    if !auth.check_password(&attempt) {
        return Err(RagError::Auth("Invalid admin password".to_string()).into());
    }

    Ok(())
}
