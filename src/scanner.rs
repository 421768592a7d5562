use crate::file::{FileKind, SourceFile, is_markdown};
use crate::filter::FileFilter;
use crate::{
    config::Config,
    error::{Error, Result},
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone)]
pub(crate) struct ScanStats {
    /// Markdown files seen below journal or page directories
    pub(crate) total_files: usize,

    /// Journal files accepted
    pub(crate) journal_files: usize,

    /// Page files accepted
    pub(crate) page_files: usize,

    /// Files excluded by the filter
    pub(crate) skipped_files: usize,

    /// Walk errors encountered
    pub(crate) errors: usize,
}

/// Finds journal and page documents below a workspace root.
///
/// Every directory named `journals` or `pages` counts, at any depth, unless
/// the file filter excludes it. A file's kind comes from the nearest such
/// directory above it.
pub(crate) struct Scanner {
    root_dir: PathBuf,
    output_dir: PathBuf,
    file_filter: FileFilter,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid filter patterns.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            root_dir: config.workspace_dir.clone(),
            output_dir: config.output_dir.clone(),
            file_filter: FileFilter::new(&config.file_filter_config)?,
        })
    }

    /// Scans the workspace, returning documents sorted by relative path.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace root cannot be read.
    pub(crate) fn scan(&self) -> Result<(Vec<SourceFile>, ScanStats)> {
        std::fs::read_dir(&self.root_dir).map_err(|e| Error::io(&self.root_dir, e))?;

        let mut files = Vec::new();
        let mut stats = ScanStats::default();

        debug!("Scanning {}", self.root_dir.display());

        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.should_enter(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {e}");
                    stats.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            let relative_path = self.relative(entry.path());
            let Some(kind) = Self::kind_of(&relative_path) else {
                continue;
            };
            stats.total_files += 1;

            if !self.file_filter.should_process(&relative_path) {
                debug!("Excluded by filter: {}", relative_path.display());
                stats.skipped_files += 1;
                continue;
            }

            trace!("Found {} {}", kind.label(), relative_path.display());
            match kind {
                FileKind::Journal => stats.journal_files += 1,
                FileKind::Page => stats.page_files += 1,
            }
            files.push(SourceFile::new(entry.path().to_path_buf(), relative_path, kind));
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        debug!(
            "Scan complete: {} candidates, {} journals, {} pages, {} skipped, {} errors",
            stats.total_files, stats.journal_files, stats.page_files, stats.skipped_files, stats.errors
        );

        if files.is_empty() {
            warn!(
                "No journal or page files found in {}",
                self.root_dir.display()
            );
        }

        Ok((files, stats))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        pathdiff::diff_paths(path, &self.root_dir).unwrap_or_else(|| path.to_path_buf())
    }

    /// Filters directories by their workspace-relative path, so a workspace
    /// that itself lives below an excluded name is still scanned.
    fn should_enter(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        if entry.path() == self.output_dir {
            debug!("Skipping output directory {}", entry.path().display());
            return false;
        }
        self.file_filter.should_enter(&self.relative(entry.path()))
    }

    /// Nearest `journals` or `pages` directory in the file's parent chain.
    fn kind_of(relative_path: &Path) -> Option<FileKind> {
        relative_path
            .parent()?
            .components()
            .rev()
            .find_map(|c| FileKind::from_dir_name(&c.as_os_str().to_string_lossy()))
    }
}
