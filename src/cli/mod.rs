//! CLI module - Command-line interface for foodcache
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// foodcache - Nutrition lookup cache
/// Serves food searches and details from a local store, asking the provider only on a miss
#[derive(Parser)]
#[command(name = "foodcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as background daemon with the eviction scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Show one food by provider id
    #[command(alias = "l")]
    Lookup {
        /// Provider food id
        id: String,
        /// Fetch full nutrient detail if only a stub is cached
        #[arg(long)]
        full: bool,
    },

    /// Search foods by free text
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Print the cached entry for every result
        #[arg(long)]
        details: bool,
    },

    /// Suggest completions for a partial query
    #[command(alias = "ac")]
    Autocomplete {
        /// Partial query
        #[arg(required = true)]
        prefix: Vec<String>,
    },

    /// Evict stale rows from all caches now
    Sweep,

    /// Show cache row counts
    Stats,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
