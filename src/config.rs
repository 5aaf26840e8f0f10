//! Configuration for opening inputs and for the `pims` command line.
//!
//! [`ReaderConfig`] carries the options a reader backend receives when it is
//! constructed. Every option can be given as a command-line flag or an
//! environment variable with the `PIMS_` prefix, and has a default:
//!
//! - `PIMS_GLOB_ORDER` - Order of glob matches: `sorted` or `filesystem` (default: sorted)
//! - `PIMS_BLOCK_SIZE` - Block size in bytes for the per-source block cache (default: 64KB)
//! - `PIMS_CACHE_BLOCKS` - Blocks cached per source (default: 64)
//! - `PIMS_MAX_PAGES` - Maximum pages read from one container (default: 65536)
//!
//! # Example
//!
//! ```
//! use pims::config::{GlobOrder, ReaderConfig};
//!
//! let config = ReaderConfig {
//!     glob_order: GlobOrder::Filesystem,
//!     ..ReaderConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::format::tiff::DEFAULT_MAX_PAGES;
use crate::io::{DEFAULT_BLOCK_CACHE_CAPACITY, DEFAULT_BLOCK_SIZE};

// =============================================================================
// Reader Configuration
// =============================================================================

/// Order in which the files matched by a glob pattern become planes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GlobOrder {
    /// Lexicographic by path.
    #[default]
    Sorted,
    /// Whatever order the directory listing returns.
    Filesystem,
}

/// Options passed to a reader backend when it is constructed.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Order of files matched by a glob pattern.
    #[arg(long, value_enum, default_value_t = GlobOrder::Sorted, env = "PIMS_GLOB_ORDER")]
    pub glob_order: GlobOrder,

    /// Block size in bytes for the per-source block cache.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE, env = "PIMS_BLOCK_SIZE")]
    pub block_size: usize,

    /// Maximum number of blocks cached per source.
    #[arg(long, default_value_t = DEFAULT_BLOCK_CACHE_CAPACITY, env = "PIMS_CACHE_BLOCKS")]
    pub cache_blocks: usize,

    /// Maximum number of pages read from a single container.
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES, env = "PIMS_MAX_PAGES")]
    pub max_pages: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            glob_order: GlobOrder::Sorted,
            block_size: DEFAULT_BLOCK_SIZE,
            cache_blocks: DEFAULT_BLOCK_CACHE_CAPACITY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl ReaderConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.block_size < 1024 || self.block_size > 16 * 1024 * 1024 {
            return Err("block_size must be between 1KB and 16MB".to_string());
        }
        if self.cache_blocks == 0 {
            return Err("cache_blocks must be greater than 0".to_string());
        }
        if self.max_pages == 0 {
            return Err("max_pages must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// pims - lazy image stacks from files, globs and streams.
#[derive(Parser, Debug)]
#[command(name = "pims")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the shape, dtype and metadata of an input without decoding it.
    Info {
        /// File path or glob pattern.
        input: String,

        #[command(flatten)]
        reader: ReaderConfig,
    },

    /// Decode planes and print summary statistics.
    Read {
        /// File path or glob pattern.
        input: String,

        /// Decode only this plane. All planes are decoded when omitted.
        #[arg(short, long)]
        index: Option<usize>,

        #[command(flatten)]
        reader: ReaderConfig,
    },

    /// Print the content type each name classifies as.
    Mime {
        /// File names or patterns.
        #[arg(required = true)]
        names: Vec<String>,
    },
}

// =============================================================================
// Tests
// =============================================================================
