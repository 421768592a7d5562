//! Document titles: page titles from file names, journal date headers, and
//! the indentation fix for the first line below a title.

use super::mark_fenced;
use super::title::flatten_title;
use crate::date::format_header_date;
use crate::error::{Error, Result};
use crate::pipeline::{Processor, Transformed};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static ALIAS_PROPERTY: Lazy<Regex> = Lazy::new(|| Regex::new(r"alias::[ \t]*(.*)").unwrap());

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+\S").unwrap());

static INDENTED_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+(-\s+)").unwrap());

fn first_line(content: &str) -> &str {
    content.trim().split('\n').next().unwrap_or("")
}

/// Sets a page's `# ` title from its file name, with aliases appended.
#[derive(Debug, Clone)]
pub struct PageTitle {
    path: PathBuf,
}

impl PageTitle {
    /// Creates a title processor for the page stored at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn title(&self) -> Result<String> {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .ok_or_else(|| Error::processor("page-title", format!("'{}' has no file name", self.path.display())))?;

        let title = flatten_title(&stem);
        if title.is_empty() {
            return Err(Error::processor(
                "page-title",
                format!("cannot derive a title from '{}'", self.path.display()),
            ));
        }
        Ok(title)
    }
}

impl Processor for PageTitle {
    fn name(&self) -> &'static str {
        "page-title"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let mut title = format!("# {}", self.title()?);
        let mut body = content.to_string();

        if let Some(caps) = ALIAS_PROPERTY.captures(content) {
            for alias in caps[1].split(',').map(str::trim).filter(|a| !a.is_empty()) {
                title.push_str(" // ");
                title.push_str(&flatten_title(alias));
            }
            body = content
                .split('\n')
                .filter(|line| !ALIAS_PROPERTY.is_match(line))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let rewritten = if first_line(&body).starts_with("# ") {
            let mut replaced = false;
            body.split('\n')
                .map(|line| {
                    if !replaced && !line.trim().is_empty() {
                        replaced = true;
                        title.as_str()
                    } else {
                        line
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            format!("{title}\n\n{}", body.trim())
        };

        Ok(Transformed::compare(content, rewritten))
    }
}

/// Prepends a `# <date>` header to a journal unless it already has a title.
#[derive(Debug, Clone)]
pub struct DateHeader {
    header: String,
}

impl DateHeader {
    /// Creates a header processor for the journal of `date`.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            header: format_header_date(date),
        }
    }
}

impl Processor for DateHeader {
    fn name(&self) -> &'static str {
        "date-header"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        if first_line(content).starts_with("# ") {
            return Ok(Transformed::unchanged(content));
        }
        Ok(Transformed::new(format!("# {}\n\n{content}", self.header), true))
    }
}

/// Removes indentation in front of the first bullet after the `# ` title.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstContentIndentation;

impl Processor for FirstContentIndentation {
    fn name(&self) -> &'static str {
        "first-content-indentation"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let mut title_found = false;
        let mut content_found = false;

        let lines: Vec<String> = mark_fenced(content)
            .into_iter()
            .map(|(line, fenced)| {
                if fenced {
                    content_found = true;
                    return line.to_string();
                }
                if TITLE_LINE.is_match(line.trim()) {
                    title_found = true;
                    return line.to_string();
                }
                if line.trim().is_empty() {
                    return line.to_string();
                }
                if title_found && !content_found {
                    content_found = true;
                    return INDENTED_BULLET.replace(line, "$1").into_owned();
                }
                content_found = true;
                line.to_string()
            })
            .collect();

        Ok(Transformed::compare(content, lines.join("\n")))
    }
}
