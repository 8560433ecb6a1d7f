//! CLI module for Cutframe
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// Cutframe terminal video editor
///
/// Pick a video, trim it, apply a colour filter and export the result into
/// the shared media folder.
#[derive(Parser)]
#[command(name = "cutframe")]
#[command(about = "Cutframe - pick, trim, filter and save videos from the terminal")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format (pretty or json)
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: String,

    /// Configuration file (default: ./cutframe.toml when present)
    #[arg(long, env = "CUTFRAME_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive editing session
    Session,
    /// Run pick, trim, filter and save in one go
    Edit(args::EditArgs),
    /// List videos saved to the gallery
    Gallery(args::GalleryArgs),
}
