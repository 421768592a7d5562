//! Cross-document block reference resolution.
//!
//! LogSeq lets any block carry an `id:: <uuid>` property and be referenced
//! from anywhere as `((uuid))` or embedded as `{{embed ((uuid))}}`. Reflect
//! has no block identity, so every reference is rendered as an italic
//! excerpt of the referenced block plus a link to its page.
//!
//! Resolution happens in two phases. [`BlockResolver::collect`] scans the
//! whole workspace once and builds the [`BlockIndex`]; only after that may
//! [`Processor::process`] substitute references in individual documents.

use super::rewrite_prose;
use crate::error::{Error, Result};
use crate::file::{JOURNALS_DIR, PAGES_DIR, is_markdown};
use crate::pipeline::{Processor, Transformed};
use crate::vocabulary::TypeVocabulary;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument, trace, warn};
use walkdir::WalkDir;

/// Directories directly below the workspace root that hold collectable notes.
pub const COLLECTED_DIRECTORIES: [&str; 2] = [JOURNALS_DIR, PAGES_DIR];

static BLOCK_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{7,8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static ID_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(.*?)\bid::[ \t]*([0-9a-f]{7,8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})(?:$|[^0-9a-f-])",
    )
    .unwrap()
});

static PROPERTY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:-\s+)?[A-Za-z0-9_.-]+::").unwrap());

static FIRST_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t\r]*$").unwrap());

static HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#+\s+(.*)$").unwrap());

static EMBED_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\{\{embed\s+\(\(([0-9a-f]{7,8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\)\)\s*\}\}",
    )
    .unwrap()
});

static INLINE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\(([0-9a-f]{7,8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})\)\)").unwrap()
});

static PAGE_EMBED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{embed\s+\[\[([^\]]+)\]\]\s*\}\}").unwrap());

static LEFTOVER_EMBED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{embed\s+.*?\}\}").unwrap());

static SOURCE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)#\+BEGIN_SRC\b.*?#\+END_SRC|#\+BEGIN_QUERY\b.*?#\+END_QUERY").unwrap()
});

static QUERY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*-?[ \t]*\{\{query.*?\}\}.*$").unwrap());

const TASK_MARKERS: [(&str, &str); 3] = [("TODO", "[ ]"), ("DOING", "[ ]"), ("DONE", "[x]")];

/// A collected block: its identifier, a display excerpt and the page it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    /// Normalized block identifier
    pub block_id: String,

    /// Human-readable content of the block
    pub excerpt: String,

    /// Display title of the page holding the block
    pub source_page: String,
}

/// Lookup table of collected blocks, at most one record per identifier.
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    records: BTreeMap<String, BlockRecord>,
}

impl BlockIndex {
    /// Inserts a record, returning the one it replaced.
    pub fn insert(&mut self, record: BlockRecord) -> Option<BlockRecord> {
        self.records.insert(record.block_id.clone(), record)
    }

    /// Looks up a block by identifier.
    #[must_use]
    pub fn get(&self, block_id: &str) -> Option<&BlockRecord> {
        self.records.get(block_id)
    }

    /// Number of collected blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockRecord> {
        self.records.values()
    }
}

/// Replaces block references with excerpts of the referenced blocks.
#[derive(Debug, Clone, Default)]
pub struct BlockResolver {
    index: BlockIndex,
    types: TypeVocabulary,
    collected: bool,
}

impl BlockResolver {
    /// Creates an empty resolver that strips `types` prefixes from link targets.
    #[must_use]
    pub fn new(types: TypeVocabulary) -> Self {
        Self {
            index: BlockIndex::default(),
            types,
            collected: false,
        }
    }

    /// Scans the workspace's `journals` and `pages` directories for block ids.
    ///
    /// Files are visited journals first, then pages, each in file name
    /// order. When an identifier occurs more than once the last file
    /// visited wins. Unreadable files are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace root is not a readable directory.
    #[instrument(skip(self), fields(workspace = %workspace.display()))]
    pub fn collect(&mut self, workspace: &Path) -> Result<usize> {
        if !workspace.is_dir() {
            return Err(Error::io(
                workspace,
                io::Error::new(io::ErrorKind::NotFound, "workspace root is not a directory"),
            ));
        }
        fs::read_dir(workspace).map_err(|e| Error::io(workspace, e))?;

        let mut files = 0;
        for dir in COLLECTED_DIRECTORIES {
            let root = workspace.join(dir);
            if !root.is_dir() {
                debug!("No {dir} directory in workspace");
                continue;
            }

            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Walk error while collecting blocks: {e}");
                        continue;
                    }
                };
                if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                    continue;
                }

                let path = entry.path();
                let content = match fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Skipping {} during block collection: {}", path.display(), Error::read(path, e));
                        continue;
                    }
                };

                files += 1;
                let page = page_title(path, &content);
                let found = self.collect_document(&page, &content);
                if found > 0 {
                    trace!("{found} block ids in {}", path.display());
                }
            }
        }

        self.collected = true;
        info!(
            "Collected {} block references from {files} files",
            self.index.len()
        );
        Ok(self.index.len())
    }

    fn collect_document(&mut self, source_page: &str, content: &str) -> usize {
        let records = extract_blocks(content, source_page);
        let found = records.len();
        for record in records {
            debug!(block_id = %record.block_id, page = %record.source_page, "Found block: {}", record.excerpt);
            if let Some(previous) = self.index.insert(record) {
                debug!(
                    "Block {} was already collected from '{}', last one wins",
                    previous.block_id, previous.source_page
                );
            }
        }
        found
    }

    /// The collected lookup table.
    #[must_use]
    pub const fn index(&self) -> &BlockIndex {
        &self.index
    }

    /// Returns true once [`BlockResolver::collect`] has completed.
    #[must_use]
    pub const fn is_collected(&self) -> bool {
        self.collected
    }

    fn render(&self, record: &BlockRecord) -> String {
        let link = self.types.strip_prefix(&record.source_page);
        if record.excerpt.is_empty() {
            format!("_([[{link}]])_")
        } else {
            format!("_{} ([[{link}]])_", record.excerpt)
        }
    }

    fn substitute_embeds(&self, content: &str) -> String {
        if !content.contains("{{embed") {
            return content.to_string();
        }

        content
            .split('\n')
            .map(|line| self.substitute_embeds_in_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn substitute_embeds_in_line(&self, line: &str) -> String {
        let mut current = line.to_string();
        let mut search_from = 0;

        while let Some(caps) = EMBED_REFERENCE.captures_at(&current, search_from) {
            let Some(token) = caps.get(0) else { break };
            let Some(record) = self.index.get(&caps[1]) else {
                search_from = token.end();
                continue;
            };

            let replacement = self.render(record);
            let before = &current[..token.start()];
            let after = &current[token.end()..];
            let indent = &before[..before.len() - before.trim_start().len()];
            let lead = &before[indent.len()..];
            let (is_bullet, rest) = split_bullet(lead);

            let rebuilt = if !rest.trim().is_empty() {
                format!("{before}{replacement}{after}")
            } else if is_bullet {
                format!("{indent}- {replacement}{after}")
            } else {
                format!("{indent}{replacement}{after}")
            };

            search_from = rebuilt.len() - after.len();
            current = rebuilt;
        }

        current
    }

    fn substitute_inline(&self, content: &str) -> String {
        INLINE_REFERENCE
            .replace_all(content, |caps: &Captures<'_>| match self.index.get(&caps[1]) {
                Some(record) => self.render(record),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

impl Processor for BlockResolver {
    fn name(&self) -> &'static str {
        "block-references"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        if !self.collected {
            return Err(Error::NotCollected);
        }

        let cleaned = rewrite_prose(content, |chunk| {
            // Embeds wrap an inline reference, so they must be consumed first.
            let resolved = self.substitute_embeds(chunk);
            let resolved = self.substitute_inline(&resolved);
            remove_orphans(&resolved)
        });

        Ok(Transformed::compare(content, cleaned))
    }
}

/// Removes unresolved references and source-only constructs Reflect cannot render.
///
/// Page embeds become plain page links. `#+BEGIN_SRC` and `#+BEGIN_QUERY`
/// blocks are dropped; other `#+BEGIN_` blocks are kept.
#[must_use]
pub fn remove_orphans(content: &str) -> String {
    let content = PAGE_EMBED.replace_all(content, "[[$1]]");
    let content = LEFTOVER_EMBED.replace_all(&content, "");
    let content = INLINE_REFERENCE.replace_all(&content, "");
    let content = SOURCE_BLOCK.replace_all(&content, "");
    QUERY_LINE.replace_all(&content, "").into_owned()
}

/// Returns true for a well-formed block identifier.
#[must_use]
pub fn is_block_id(candidate: &str) -> bool {
    BLOCK_ID.is_match(candidate)
}

/// Display title of a page: its first `# ` heading, else its file name.
///
/// File names use LogSeq's namespace encoding, so `jira___Improve_X.md`
/// becomes `jira/Improve X`.
#[must_use]
pub fn page_title(path: &Path, content: &str) -> String {
    if let Some(caps) = FIRST_HEADING.captures(content) {
        return caps[1].trim().to_string();
    }

    path.file_stem()
        .map(|stem| {
            stem.to_string_lossy()
                .replace("___", "/")
                .replace("%2F", "/")
                .replace('_', " ")
        })
        .unwrap_or_default()
}

/// Extracts every well-formed `id::` block from one document.
#[must_use]
pub fn extract_blocks(content: &str, source_page: &str) -> Vec<BlockRecord> {
    let lines: Vec<&str> = content.lines().collect();

    lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let caps = ID_PROPERTY.captures(line)?;
            let block_id = &caps[2];

            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let (_, inline_text) = split_bullet(prefix.trim());
            let source = if inline_text.trim().is_empty() {
                excerpt_source(&lines[..i]).unwrap_or("")
            } else {
                prefix
            };

            Some(BlockRecord {
                block_id: block_id.to_string(),
                excerpt: normalize_excerpt(source),
                source_page: source_page.to_string(),
            })
        })
        .collect()
}

/// Nearest preceding line with real content, skipping blanks and properties.
fn excerpt_source<'a>(preceding: &[&'a str]) -> Option<&'a str> {
    preceding
        .iter()
        .rev()
        .find(|line| !line.trim().is_empty() && !PROPERTY_LINE.is_match(line))
        .copied()
}

fn normalize_excerpt(line: &str) -> String {
    let (_, text) = split_bullet(line.trim());
    let text = text.trim();

    if let Some(caps) = HEADING_LINE.captures(text) {
        return format!("**{}**", caps[1].trim());
    }

    for (marker, checkbox) in TASK_MARKERS {
        if let Some(rest) = text.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return format!("{checkbox} {}", rest.trim()).trim_end().to_string();
            }
        }
    }

    text.to_string()
}

/// Splits a single leading `-` bullet marker off `text`.
fn split_bullet(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            (true, rest.trim_start())
        }
        _ => (false, text),
    }
}
