//! Command-line argument definitions for the Classmark CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the text to annotate, where annotations
//! come from (a saved model, a session script, heuristic pre-annotation),
//! where the result goes, and how verbose logging is.

use clap::Parser;

/// Command-line arguments for the Classmark annotation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input text file
    #[arg(help = "Path to the text to annotate")]
    pub input: String,

    /// Path to the output JSON file
    #[arg(short, long, default_value = "annotations.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Existing annotations (JSON model or export envelope) to start from
    #[arg(short, long)]
    pub annotations: Option<String>,

    /// Session script replayed against the text
    #[arg(short, long)]
    pub script: Option<String>,

    /// Pre-annotate the text with the built-in heuristic analyzer
    #[arg(long)]
    pub pre_annotate: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
