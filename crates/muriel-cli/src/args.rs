//! Command-line argument definitions for the Muriel CLI.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Headless tools for Muriel schematics
#[derive(Parser, Debug)]
#[command(name = "muriel", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a saved diagram to SVG
    Export {
        /// Symbol catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,

        /// Saved diagram record (JSON)
        #[arg(long)]
        diagram: PathBuf,

        /// Editor configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Path to the output SVG file
        #[arg(short, long, default_value = "out.svg")]
        output: PathBuf,
    },

    /// List stored diagrams, newest first
    List {
        /// Storage directory; defaults to the user data directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Report which symbols parse and which fall back to a placeholder shape
    CheckCatalog {
        /// Symbol catalog (JSON)
        #[arg(long)]
        catalog: PathBuf,
    },
}
