// Text extraction
// Turns an uploaded file of a declared type into raw text for chunking

#[cfg(test)]
mod tests;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use pulldown_cmark::{Options, Parser, html};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
    Json,
    Md,
}

impl FileType {
    /// Detect the file type from a path's extension.
    #[inline]
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                RagError::Extraction(format!("No file extension on {}", path.display()))
            })?;
        extension.parse()
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Md => "md",
        }
    }
}

impl FromStr for FileType {
    type Err = RagError;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Md),
            other => Err(RagError::Extraction(format!(
                "Unsupported file type: {} (expected pdf, txt, json, or md)",
                other
            ))),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract raw text from a file of the declared type.
#[inline]
pub fn extract_text(path: &Path, file_type: FileType) -> Result<String> {
    debug!("Extracting text from {} as {}", path.display(), file_type);

    match file_type {
        FileType::Pdf => extract_from_pdf(path),
        FileType::Txt => extract_from_text(path),
        FileType::Json => extract_from_json(path),
        FileType::Md => extract_from_markdown(path),
    }
}

fn extract_from_pdf(path: &Path) -> Result<String> {
    pdf_extract::extract_text(path)
        .map_err(|e| RagError::Extraction(format!("Failed to extract PDF text: {}", e)))
}

fn extract_from_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| RagError::Extraction(format!("Failed to read text file: {}", e)))
}

fn extract_from_json(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| RagError::Extraction(format!("Failed to read JSON file: {}", e)))?;

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| RagError::Extraction(format!("Malformed JSON: {}", e)))?;

    serde_json::to_string_pretty(&value)
        .map_err(|e| RagError::Extraction(format!("Failed to format JSON: {}", e)))
}

fn extract_from_markdown(path: &Path) -> Result<String> {
    let markdown = fs::read_to_string(path)
        .map_err(|e| RagError::Extraction(format!("Failed to read markdown file: {}", e)))?;

    let parser = Parser::new_ext(&markdown, Options::empty());
    let mut rendered = String::with_capacity(markdown.len());
    html::push_html(&mut rendered, parser);
    Ok(rendered)
}
