
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, settings::API_KEY_ENV_VAR};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Askdocs Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = Config::load().context("Failed to load existing configuration")?;

    eprintln!("{}", style("Gemini API").bold().yellow());
    eprintln!(
        "Configure access to the Gemini API used for embeddings and answers. \
         Leave the key empty to use the {} environment variable.",
        API_KEY_ENV_VAR
    );
    eprintln!();

    let api_key: String = Password::new()
        .with_prompt("API key")
        .allow_empty_password(true)
        .interact()?;
    if !api_key.trim().is_empty() {
        config.gemini.api_key = api_key;
    }

    config.gemini.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(config.gemini.embedding_model.clone())
        .interact_text()?;

    config.gemini.chat_model = Input::new()
        .with_prompt("Chat model")
        .default(config.gemini.chat_model.clone())
        .interact_text()?;

    config.chunking.max_chunk_chars = Input::new()
        .with_prompt("Chunk budget (characters)")
        .default(config.chunking.max_chunk_chars)
        .interact_text()?;

    config.retrieval.top_k = Input::new()
        .with_prompt("Chunks retrieved per query")
        .default(config.retrieval.top_k)
        .interact_text()?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();
    eprintln!("{}", style("Gemini API").bold().yellow());
    eprintln!("  Endpoint:            {}", config.gemini.endpoint);
    eprintln!("  Embedding model:     {}", config.gemini.embedding_model);
    eprintln!("  Chat model:          {}", config.gemini.chat_model);
    eprintln!(
        "  Embedding dimension: {}",
        config.gemini.embedding_dimension
    );
    eprintln!("  API key:             {}", mask_key(&config.gemini.api_key));
    eprintln!();
    eprintln!("{}", style("Chunking").bold().yellow());
    eprintln!("  Chunk budget:        {}", config.chunking.max_chunk_chars);
    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    eprintln!("  Top k:               {}", config.retrieval.top_k);
    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).cyan()
    );
    eprintln!(
        "Corpus directory: {}",
        style(config.vector_db_path().display()).cyan()
    );

    Ok(())
}

/// Show only the tail of a configured key, or note that the environment
/// variable will be used.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.trim().chars().collect();
    if chars.is_empty() {
        return format!("(unset, will use {})", API_KEY_ENV_VAR);
    }
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
