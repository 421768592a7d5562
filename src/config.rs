use crate::error::{Error, Result};
use crate::filter::FileFilterConfig;
use std::path::{Path, PathBuf};

/// Default location of the types vocabulary, relative to the working directory.
pub const DEFAULT_TYPES_PATH: &str = "categories_config/types.txt";

const OUTPUT_DIR_SUFFIX: &str = " (Reflect format)";

/// Configuration for a conversion run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// LogSeq workspace holding `journals/` and `pages/`
    pub workspace_dir: PathBuf,

    /// Directory that receives the converted files
    pub output_dir: PathBuf,

    /// File with one type-prefix word per line
    pub types_path: PathBuf,

    /// Directory and file exclusion patterns
    pub file_filter_config: FileFilterConfig,

    /// Dry run mode (no file writes)
    pub dry_run: bool,

    /// Create backups of existing output files
    pub backup_existing: bool,

    /// Write `backlinks.txt` and `tags.txt` next to the converted files
    pub write_link_index: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use logseq_reflect::Config;
    ///
    /// let config = Config::builder()
    ///     .workspace_dir("./notes")
    ///     .dry_run(true)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Workspace directory doesn't exist or is not a directory
    /// - Output directory is the workspace itself
    pub fn validate(&self) -> Result<()> {
        validate_workspace(&self.workspace_dir)?;

        if self.output_dir.exists() && self.output_dir.is_file() {
            return Err(Error::config(format!(
                "Output path is a file: {}",
                self.output_dir.display()
            )));
        }

        if let (Ok(workspace), Ok(output)) = (
            self.workspace_dir.canonicalize(),
            self.output_dir.canonicalize(),
        ) {
            if workspace == output {
                return Err(Error::config(format!(
                    "Output directory must differ from the workspace: {}",
                    self.output_dir.display()
                )));
            }
        }

        Ok(())
    }
}

fn validate_workspace(workspace: &Path) -> Result<()> {
    if !workspace.exists() {
        return Err(Error::config(format!(
            "Workspace directory does not exist: {}",
            workspace.display()
        )));
    }

    if !workspace.is_dir() {
        return Err(Error::config(format!(
            "Workspace path is not a directory: {}",
            workspace.display()
        )));
    }

    Ok(())
}

/// Sibling directory `"<workspace name> (Reflect format)"`.
///
/// # Errors
///
/// Returns an error if the workspace path cannot be resolved to a named directory.
pub fn default_output_dir(workspace: &Path) -> Result<PathBuf> {
    let resolved = workspace
        .canonicalize()
        .map_err(|e| Error::io(workspace, e))?;

    let name = resolved.file_name().ok_or_else(|| {
        Error::config(format!(
            "Cannot derive an output directory from '{}'; pass one explicitly",
            workspace.display()
        ))
    })?;

    let mut output_name = name.to_os_string();
    output_name.push(OUTPUT_DIR_SUFFIX);
    Ok(resolved.with_file_name(output_name))
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    workspace_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    types_path: Option<PathBuf>,
    file_filter_config: Option<FileFilterConfig>,
    dry_run: bool,
    backup_existing: bool,
    write_link_index: Option<bool>,
}

impl ConfigBuilder {
    /// Sets the LogSeq workspace to convert.
    #[must_use]
    pub fn workspace_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(path.into());
        self
    }

    /// Sets the output directory for converted files.
    ///
    /// Defaults to a sibling of the workspace named `"<workspace> (Reflect format)"`.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the types vocabulary file.
    #[must_use]
    pub fn types_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.types_path = Some(path.into());
        self
    }

    /// Sets the file filtering configuration.
    #[must_use]
    pub fn file_filter_config(mut self, config: FileFilterConfig) -> Self {
        self.file_filter_config = Some(config);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Enables or disables backup creation.
    #[must_use]
    pub fn backup_existing(mut self, enabled: bool) -> Self {
        self.backup_existing = enabled;
        self
    }

    /// Enables or disables writing `backlinks.txt` and `tags.txt`.
    #[must_use]
    pub fn write_link_index(mut self, enabled: bool) -> Self {
        self.write_link_index = Some(enabled);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let workspace_dir = self.workspace_dir.unwrap_or_else(|| PathBuf::from("."));
        validate_workspace(&workspace_dir)?;

        let output_dir = match self.output_dir {
            Some(dir) => dir,
            None => default_output_dir(&workspace_dir)?,
        };

        let config = Config {
            workspace_dir,
            output_dir,
            types_path: self
                .types_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TYPES_PATH)),
            file_filter_config: self.file_filter_config.unwrap_or_default(),
            dry_run: self.dry_run,
            backup_existing: self.backup_existing,
            write_link_index: self.write_link_index.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let workspace = temp.child("notes");
        workspace.create_dir_all().unwrap();

        let config = Config::builder()
            .workspace_dir(workspace.path())
            .build()
            .unwrap();

        assert!(!config.dry_run);
        assert!(!config.backup_existing);
        assert!(config.write_link_index);
        assert_eq!(config.types_path, PathBuf::from(DEFAULT_TYPES_PATH));
        assert_eq!(
            config.output_dir.file_name().unwrap(),
            "notes (Reflect format)"
        );
        assert_eq!(
            config.output_dir.parent().unwrap(),
            workspace.path().canonicalize().unwrap().parent().unwrap()
        );
    }

    #[test]
    fn test_invalid_workspace_dir() {
        let result = Config::builder()
            .workspace_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_workspace_is_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("notes.md");
        file.touch().unwrap();

        let result = Config::builder().workspace_dir(file.path()).build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_output_equal_to_workspace_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();

        let result = Config::builder()
            .workspace_dir(temp.path())
            .output_dir(temp.path())
            .build();
        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_explicit_settings() {
        let temp = assert_fs::TempDir::new().unwrap();

        let config = Config::builder()
            .workspace_dir(temp.path())
            .output_dir(temp.child("out").path())
            .types_path("types.txt")
            .dry_run(true)
            .backup_existing(true)
            .write_link_index(false)
            .build()
            .unwrap();

        assert!(config.dry_run);
        assert!(config.backup_existing);
        assert!(!config.write_link_index);
        assert_eq!(config.output_dir, temp.child("out").path());
    }
}
