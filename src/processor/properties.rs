//! LogSeq block properties (`key:: value` lines).
//!
//! Reflect has no block properties. Block ids and boolean flags are removed
//! early, before references are resolved; everything else is removed later by
//! [`Properties`], which also turns `background-color::` into a highlight.

use super::{mark_fenced, rewrite_prose};
use crate::error::Result;
use crate::pipeline::{Processor, Transformed};
use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_ID_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*id::[ \t]*[0-9a-f]{7,8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}[ \t]*$",
    )
    .unwrap()
});

static BOOLEAN_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[a-z-]+:: (?:true|false)").unwrap());

static PROPERTY_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[A-Za-z0-9_.-]+::").unwrap());

static BACKGROUND_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*background-color::").unwrap());

static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*-\s*)(.*)$").unwrap());

static HEADING_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+\s+)(.*)$").unwrap());

/// Blanks `id:: <uuid>` lines and removes `key:: true|false` flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockIdLines;

impl Processor for BlockIdLines {
    fn name(&self) -> &'static str {
        "block-id-lines"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let cleaned = rewrite_prose(content, |chunk| {
            let cleaned = BLOCK_ID_LINE.replace_all(chunk, "");
            BOOLEAN_PROPERTY.replace_all(&cleaned, "").into_owned()
        });
        Ok(Transformed::compare(content, cleaned))
    }
}

/// Removes property lines, applies background highlights and collapses
/// runs of blank lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Properties;

impl Properties {
    /// Highlights the nearest preceding content line outside code.
    fn highlight(lines: &mut [(String, bool)]) {
        let Some(target) = lines
            .iter_mut()
            .rev()
            .filter(|(_, fenced)| !fenced)
            .map(|(line, _)| line)
            .find(|line| !line.trim().is_empty() && !PROPERTY_LINE.is_match(line))
        else {
            return;
        };

        let Some(caps) = BULLET.captures(target) else {
            return;
        };
        let prefix = &caps[1];
        let text = &caps[2];

        let highlighted = match HEADING_MARKER.captures(text) {
            Some(heading) => format!("{prefix}{}=={}==", &heading[1], &heading[2]),
            None => format!("{prefix}=={text}=="),
        };
        *target = highlighted;
    }
}

impl Processor for Properties {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let mut kept: Vec<(String, bool)> = Vec::new();

        for (line, fenced) in mark_fenced(content) {
            if fenced {
                kept.push((line.to_string(), true));
                continue;
            }
            if BACKGROUND_COLOR.is_match(line) {
                Self::highlight(&mut kept);
                continue;
            }
            if PROPERTY_LINE.is_match(line) {
                continue;
            }
            kept.push((line.to_string(), false));
        }

        let mut collapsed: Vec<(String, bool)> = Vec::with_capacity(kept.len());
        for (line, fenced) in kept {
            if fenced {
                collapsed.push((line, true));
                continue;
            }
            let blank = line.trim().is_empty();
            if blank && collapsed.last().is_some_and(|(l, f)| !f && l.is_empty()) {
                continue;
            }
            collapsed.push((if blank { String::new() } else { line }, false));
        }

        let rewritten = collapsed
            .into_iter()
            .map(|(line, _)| line)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Transformed::compare(content, rewritten))
    }
}
