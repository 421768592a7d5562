//! # logseq-reflect
//!
//! Converts a LogSeq workspace into markdown that Reflect can import.
//!
//! ## Features
//!
//! - Block references and embeds resolved to excerpts with a page link
//! - Journals renamed to `YYYY-MM-DD.md` and given a readable date header
//! - Page titles derived from LogSeq's namespaced file names
//! - Tasks, properties, admonitions and tags rewritten to Reflect markdown
//! - Atomic file operations with optional backups
//! - `backlinks.txt` and `tags.txt` indexes of every link target
//!
//! ## Quick Start
//!
//! ```no_run
//! use logseq_reflect::{Config, Converter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .workspace_dir("./notes")
//!     .output_dir("./notes-reflect")
//!     .build()?;
//!
//! Converter::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Scanner**: Finds documents below `journals/` and `pages/`
//! 2. **Resolver**: Indexes every block id before anything is rewritten
//! 3. **Processors**: Ordered text rewrites, see [`processor::shared_pipeline`]
//! 4. **Writer**: Persists documents and the link index

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod converter;
mod date;
mod error;
mod file;
mod filter;
mod pipeline;
mod scanner;
mod vocabulary;
mod writer;

pub mod processor;

pub use config::{Config, ConfigBuilder, DEFAULT_TYPES_PATH, default_output_dir};
pub use converter::{ConversionStats, Converter};
pub use date::{format_header_date, format_index_date, journal_output_name, parse_journal_file_name};
pub use error::{Error, Result};
pub use file::{FileKind, JOURNALS_DIR, PAGES_DIR, SourceFile};
pub use filter::FileFilterConfig;
pub use pipeline::{PipelineOutput, Processor, ProcessorPipeline, Transformed};
pub use vocabulary::TypeVocabulary;
pub use writer::{BACKLINKS_FILE, TAGS_FILE};

/// Runs a complete conversion with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Workspace directory doesn't exist or is inaccessible
/// - Output directory cannot be created
///
/// Failures on individual files are counted in [`ConversionStats`] instead.
///
/// # Examples
///
/// ```no_run
/// use logseq_reflect::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .workspace_dir(".")
///     .dry_run(true)
///     .build()?;
///
/// let stats = run(config)?;
/// println!("{} files would change", stats.changed_files);
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<ConversionStats> {
    Converter::new(config)?.run()
}
