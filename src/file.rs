use crate::date::{journal_output_name, parse_journal_file_name};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name holding daily journals.
pub const JOURNALS_DIR: &str = "journals";

/// Directory name holding named pages.
pub const PAGES_DIR: &str = "pages";

/// Kind of LogSeq document, decided by the directory it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Daily note named `YYYY_MM_DD.md`
    Journal,
    /// Named page
    Page,
}

impl FileKind {
    /// Kind for a directory called `journals` or `pages`.
    #[must_use]
    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            JOURNALS_DIR => Some(Self::Journal),
            PAGES_DIR => Some(Self::Page),
            _ => None,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Page => "page",
        }
    }
}

/// A markdown document found in the workspace.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Path relative to the workspace root
    pub relative_path: PathBuf,

    /// Journal or page
    pub kind: FileKind,
}

impl SourceFile {
    /// Creates a source file entry.
    #[must_use]
    pub const fn new(absolute_path: PathBuf, relative_path: PathBuf, kind: FileKind) -> Self {
        Self {
            absolute_path,
            relative_path,
            kind,
        }
    }

    /// File name without directories.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.relative_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Reads the document as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an IO error, or [`Error::InvalidUtf8`] for non UTF-8 content.
    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.absolute_path).map_err(|e| Error::read(&self.absolute_path, e))
    }

    /// Date encoded in a journal file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJournalName`] if the name is not `YYYY_MM_DD.md`.
    pub fn journal_date(&self) -> Result<NaiveDate> {
        parse_journal_file_name(&self.file_name())
            .ok_or_else(|| Error::invalid_journal_name(&self.relative_path))
    }

    /// Output path relative to the output directory.
    ///
    /// Journals are renamed to `YYYY-MM-DD.md`; pages keep their path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidJournalName`] for a journal with a non-date name.
    pub fn output_relative_path(&self) -> Result<PathBuf> {
        match self.kind {
            FileKind::Page => Ok(self.relative_path.clone()),
            FileKind::Journal => {
                let name = journal_output_name(self.journal_date()?);
                Ok(self.relative_path.with_file_name(name))
            }
        }
    }
}

/// Checks for a `.md` extension, any case.
#[must_use]
pub(crate) fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn journal(name: &str) -> SourceFile {
        SourceFile::new(
            PathBuf::from("/notes/journals").join(name),
            PathBuf::from("journals").join(name),
            FileKind::Journal,
        )
    }

    #[test]
    fn test_kind_from_dir_name() {
        assert_eq!(FileKind::from_dir_name("journals"), Some(FileKind::Journal));
        assert_eq!(FileKind::from_dir_name("pages"), Some(FileKind::Page));
        assert_eq!(FileKind::from_dir_name("assets"), None);
    }

    #[test]
    fn test_journal_output_renamed() {
        let file = journal("2025_04_14.md");

        assert_eq!(
            file.output_relative_path().unwrap(),
            PathBuf::from("journals/2025-04-14.md")
        );
        assert_eq!(
            file.journal_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 14).unwrap()
        );
    }

    #[test]
    fn test_bad_journal_name() {
        let err = journal("meeting.md").output_relative_path().unwrap_err();
        assert!(matches!(err, Error::InvalidJournalName { .. }));
    }

    #[test]
    fn test_page_output_keeps_path() {
        let file = SourceFile::new(
            PathBuf::from("/notes/pages/a.md"),
            PathBuf::from("pages/a.md"),
            FileKind::Page,
        );
        assert_eq!(file.output_relative_path().unwrap(), PathBuf::from("pages/a.md"));
        assert_eq!(file.file_name(), "a.md");
    }

    #[test]
    fn test_read_invalid_utf8() {
        let temp = assert_fs::TempDir::new().unwrap();
        let child = temp.child("pages/bad.md");
        child.write_binary(&[0xff, 0xfe, 0x00]).unwrap();

        let file = SourceFile::new(child.path().to_path_buf(), PathBuf::from("pages/bad.md"), FileKind::Page);
        assert!(matches!(file.read().unwrap_err(), Error::InvalidUtf8 { .. }));
    }

    #[test]
    fn test_is_markdown() {
        assert!(is_markdown(Path::new("a.md")));
        assert!(is_markdown(Path::new("A.MD")));
        assert!(!is_markdown(Path::new("a.txt")));
        assert!(!is_markdown(Path::new("md")));
    }
}
