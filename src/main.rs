use std::path::PathBuf;

use askdocs::Result;
use askdocs::commands::{
    add_document, ask_question, delete_document, list_documents, show_status,
};
use askdocs::config::{run_interactive_config, show_config};
use askdocs::extraction::FileType;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "Retrieval-augmented question answering over an uploaded document corpus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Gemini API access and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Add a document to the knowledge base (admin)
    Add {
        /// Path to the document (pdf, txt, json, or md)
        file: PathBuf,
        /// Override the file type detected from the extension
        #[arg(long, value_name = "TYPE")]
        file_type: Option<FileType>,
    },
    /// Ask a question against the knowledge base
    Ask {
        /// The question to answer
        question: String,
    },
    /// List all documents in the knowledge base (admin)
    List,
    /// Delete a document from the knowledge base (admin)
    Delete {
        /// Document id to delete
        id: String,
    },
    /// Show knowledge base statistics
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Add { file, file_type } => {
            add_document(&file, file_type)?;
        }
        Commands::Ask { question } => {
            ask_question(&question)?;
        }
        Commands::List => {
            list_documents()?;
        }
        Commands::Delete { id } => {
            delete_document(&id)?;
        }
        Commands::Status => {
            show_status()?;
        }
    }

    Ok(())
}
