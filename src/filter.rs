//! Path filtering for workspace discovery.
//!
//! LogSeq keeps version history and backups under `logseq/bak`, and those
//! trees contain files shaped exactly like journals and pages. The filter
//! keeps them out of a conversion run.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

const DEFAULT_EXCLUDED_DIRECTORIES: &[&str] = &["**/logseq", "**/.git", "**/.recycle"];

/// Configuration for file filtering with glob patterns.
///
/// Allows selective file and directory exclusion during workspace scanning.
#[derive(Debug, Clone)]
pub struct FileFilterConfig {
    exclude_files: Vec<String>,
    exclude_directories: Vec<String>,
}

impl Default for FileFilterConfig {
    fn default() -> Self {
        Self {
            exclude_files: Vec::new(),
            exclude_directories: DEFAULT_EXCLUDED_DIRECTORIES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

impl FileFilterConfig {
    /// Creates a configuration that excludes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            exclude_files: Vec::new(),
            exclude_directories: Vec::new(),
        }
    }

    /// Replaces the file exclusion patterns.
    #[must_use]
    pub fn exclude_files(mut self, patterns: Vec<String>) -> Self {
        self.exclude_files = patterns;
        self
    }

    /// Replaces the directory exclusion patterns.
    #[must_use]
    pub fn exclude_directories(mut self, patterns: Vec<String>) -> Self {
        self.exclude_directories = patterns;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FileFilter {
    exclude_files: GlobSet,
    exclude_directories: GlobSet,
}

impl FileFilter {
    /// Compiles the configured glob patterns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid glob.
    pub(crate) fn new(config: &FileFilterConfig) -> Result<Self> {
        Ok(Self {
            exclude_files: Self::build_globset(&config.exclude_files)?,
            exclude_directories: Self::build_globset(&config.exclude_directories)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    /// Returns false when the directory itself or any ancestor is excluded.
    pub(crate) fn should_enter(&self, dir: &Path) -> bool {
        !dir.ancestors().any(|a| self.exclude_directories.is_match(a))
    }

    pub(crate) fn should_process(&self, path: &Path) -> bool {
        if path
            .ancestors()
            .skip(1)
            .any(|a| self.exclude_directories.is_match(a))
        {
            return false;
        }

        !self.exclude_files.is_match(path)
    }
}
