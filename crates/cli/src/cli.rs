use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ebookfill")]
#[command(author, version, about = "Bulk ebook format conversion for Calibre libraries")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert every library book lacking a format and import the results
    AddFormat {
        /// Calibre library path
        #[arg(short, long)]
        library: Option<PathBuf>,

        /// Target format, e.g. mobi
        #[arg(short, long)]
        format: Option<String>,

        #[command(flatten)]
        run: RunArgs,

        /// Directory for converted files (a temporary directory by default)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Keep the temporary directory after importing
        #[arg(long)]
        keep_output: bool,
    },

    /// Convert files without touching a library
    Convert {
        /// Target format, e.g. mobi
        #[arg(short, long)]
        format: Option<String>,

        /// Directory for converted files
        #[arg(short, long)]
        output_dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Files to convert
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List the books of a library with their format files
    List {
        /// Calibre library path
        #[arg(short, long)]
        library: Option<PathBuf>,
    },
}

impl Commands {
    /// Run options of the converting subcommands.
    pub fn run_args(&self) -> Option<&RunArgs> {
        match self {
            Self::AddFormat { run, .. } | Self::Convert { run, .. } => Some(run),
            Self::List { .. } => None,
        }
    }
}

/// Options shared by the converting subcommands.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Number of parallel conversions [default: 8]
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Show what would be converted without converting
    #[arg(long)]
    pub dry_run: bool,
}
