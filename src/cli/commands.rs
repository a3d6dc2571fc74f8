//! CLI command definitions using clap

use crate::freshness::FreshnessPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// estat - fetch and cache Eurostat indicators
#[derive(Debug, Parser)]
#[command(name = "estat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where and how long to cache (shared by fetch commands)
#[derive(Debug, Clone, clap::Args)]
pub struct CacheArgs {
    /// Cache root directory (overrides config)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Do not read or write the cache
    #[arg(long, conflicts_with = "cache_dir")]
    pub no_cache: bool,

    /// Maximum cache age: seconds, 12h, 2d, unbounded, schedule, or a date
    #[arg(long, value_parser = parse_policy)]
    pub max_age: Option<FreshnessPolicy>,
}

fn parse_policy(s: &str) -> Result<FreshnessPolicy, String> {
    s.parse()
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch one or more datasets
    Fetch {
        /// Dataset identifiers (e.g. nama_10_gdp)
        #[arg(required = true)]
        ids: Vec<String>,

        #[command(flatten)]
        cache: CacheArgs,

        /// Keep observation flags instead of stripping them
        #[arg(long)]
        keep_markers: bool,

        /// Strip the old bulk-download flag alphabet
        #[arg(long, conflicts_with = "keep_markers")]
        legacy_markers: bool,

        /// Print arrays as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the table of contents
    Catalog {
        /// Only show entries whose title or code contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Manage estat configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration values
    Set {
        /// Cache root directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Default maximum cache age for datasets
        #[arg(long)]
        max_age: Option<String>,

        /// Dataset endpoint
        #[arg(long)]
        base_url: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
