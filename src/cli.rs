//! Command-line interface definition.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mediastore", version, about = "Keep local media files in an embedded database")]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "MEDIASTORE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (repeatable)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Save a file; its name becomes its id, replacing any record with that id
    Save {
        /// File to save; omitting it is the same as dismissing a picker
        path: Option<PathBuf>,
        /// Accept filter, e.g. "video/*,.mkv" (defaults to the configured filter)
        #[arg(short, long)]
        accept: Option<String>,
    },
    /// List stored media
    List,
    /// Write a stored record back out as a file
    Get {
        id: String,
        /// Destination (defaults to the record's name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete a stored record (deleting an unknown id does nothing)
    Delete { id: String },
    /// Show storage quota usage
    Usage,
}
