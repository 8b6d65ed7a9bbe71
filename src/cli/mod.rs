//! CLI module for the RAG pipeline
//!
//! Provides subcommands that run the pipelines over in-memory backends:
//! - `components`: list every registered component as JSON
//! - `ingest`: ingest files and print the per-document results
//! - `query`: ingest files, then run a retrieval over them

pub mod components;
pub mod ingest;
pub mod query;
mod workspace;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP RAG Pipeline - Pluggable ingestion and retrieval
#[derive(Parser)]
#[command(name = "pmp-rag-pipeline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List registered components and their configuration schemas
    Components,

    /// Ingest files into a collection
    Ingest(ingest::IngestArgs),

    /// Ingest files, then query them
    Query(query::QueryArgs),
}

/// Load `.env` and the layered configuration, then install logging
pub fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    config
}
