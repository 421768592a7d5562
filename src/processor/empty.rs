use super::mark_fenced;
use crate::error::Result;
use crate::pipeline::{Processor, Transformed};
use once_cell::sync::Lazy;
use regex::Regex;

static EMPTY_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s*$").unwrap());

static TASK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-\s*\[[ x]\]").unwrap());

/// Removes bullets left empty by earlier processors and the blank line
/// after a task, unless that blank line separates the task from a heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContentCleaner;

impl Processor for EmptyContentCleaner {
    fn name(&self) -> &'static str {
        "empty-content"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let lines = mark_fenced(content);

        let kept: Vec<&str> = lines
            .iter()
            .enumerate()
            .filter(|&(i, &(line, fenced))| {
                if fenced {
                    return true;
                }
                if EMPTY_BULLET.is_match(line) {
                    return false;
                }
                if i > 0 && line.trim().is_empty() && TASK_LINE.is_match(lines[i - 1].0) {
                    return lines
                        .get(i + 1)
                        .is_some_and(|(next, _)| next.trim_start().starts_with('#'));
                }
                true
            })
            .map(|(_, &(line, _))| line)
            .collect();

        Ok(Transformed::compare(content, kept.join("\n")))
    }
}
