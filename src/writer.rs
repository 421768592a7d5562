use crate::{
    config::Config,
    error::{Error, Result},
    processor::LinkIndex,
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// File listing every page link target, one per line.
pub const BACKLINKS_FILE: &str = "backlinks.txt";

/// File listing every tag, one per line.
pub const TAGS_FILE: &str = "tags.txt";

/// Writes converted documents below the output directory.
pub(crate) struct Writer {
    output_dir: PathBuf,
    backup_existing: bool,
}

impl Writer {
    /// Creates a new writer from configuration.
    pub(crate) fn new(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            backup_existing: config.backup_existing,
        }
    }

    /// Creates the output directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub(crate) fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))
    }

    /// Full output path for a path relative to the output directory.
    pub(crate) fn output_path(&self, relative: &Path) -> PathBuf {
        self.output_dir.join(relative)
    }

    /// Writes one converted document, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if any file system operation fails.
    pub(crate) fn write_document(&self, relative: &Path, content: &str) -> Result<PathBuf> {
        let path = self.output_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        self.write_file_atomic(&path, content)?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Writes `backlinks.txt` and `tags.txt`, sorted, one entry per line.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be written.
    pub(crate) fn write_link_index(&self, links: &LinkIndex) -> Result<()> {
        let backlinks = links.backlinks();
        let tags = links.tags();

        self.write_file_atomic(&self.output_dir.join(BACKLINKS_FILE), &lines(&backlinks))?;
        self.write_file_atomic(&self.output_dir.join(TAGS_FILE), &lines(&tags))?;

        info!(
            "Wrote {} backlinks and {} tags to {}",
            backlinks.len(),
            tags.len(),
            self.output_dir.display()
        );
        Ok(())
    }

    /// Writes a file atomically with optional backup.
    ///
    /// # Process
    ///
    /// 1. Creates backup if file exists and backup is enabled
    /// 2. Writes content to temporary file
    /// 3. Syncs temporary file to disk
    /// 4. Atomically renames temporary file to target path
    fn write_file_atomic(&self, path: &Path, content: &str) -> Result<()> {
        if path.exists() && self.backup_existing {
            Self::backup_file(path)?;
        }

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::config(format!("Invalid output path: {}", path.display())))?;
        let mut temp_name = file_name.to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| Error::io(&temp_path, e))?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        Ok(())
    }

    /// Creates a timestamped backup of an existing file.
    fn backup_file(path: &Path) -> Result<()> {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S%f");

        let filename = path
            .file_name()
            .ok_or_else(|| Error::config("Invalid file path"))?
            .to_string_lossy();

        let backup_path = path.with_file_name(format!("{filename}.backup.{timestamp}"));

        fs::copy(path, &backup_path).map_err(|e| Error::io(&backup_path, e))?;

        debug!("Created backup: {}", backup_path.display());
        Ok(())
    }
}

fn lines(entries: &[String]) -> String {
    entries.iter().map(|entry| format!("{entry}\n")).collect()
}
