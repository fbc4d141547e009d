//! CLI module - Command-line interface for Foodgram
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Load ingredients from a CSV or JSON file
    ImportIngredients {
        /// File to read
        #[arg(long)]
        path: PathBuf,

        /// Input format; guessed from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<ImportFormat>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportFormat {
    Csv,
    Json,
}

pub use commands::*;
