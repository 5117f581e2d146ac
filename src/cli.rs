use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spforge")]
#[command(author, version, about = "Inspect, build and migrate ucfb material and texture assets")]
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

#[derive(Subcommand)]
pub enum Commands {
    /// Print the chunk tree of a ucfb file
    Inspect {
        /// File to inspect
        #[arg(required = true)]
        file: PathBuf,

        /// Only descend this many levels below the root chunk
        #[arg(long)]
        max_depth: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Work with material assets
    #[command(subcommand)]
    Material(MaterialCommands),

    /// Work with texture assets
    #[command(subcommand)]
    Texture(TextureCommands),

    /// Re-save assets stored with an older schema version
    Update {
        /// Directory to scan
        #[arg(required = true)]
        dir: PathBuf,

        /// Show what would be done without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum MaterialCommands {
    /// Decode a material and display it
    Show {
        /// Material file
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a material from a TOML description
    Build {
        /// Description file
        #[arg(required = true)]
        description: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum TextureCommands {
    /// Decode a texture and display it
    Show {
        /// Texture file
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON (texel data omitted)
        #[arg(long)]
        json: bool,
    },
}
