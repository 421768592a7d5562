//! Inline and block markup that Reflect spells differently.

use super::{rewrite_outside_fences, rewrite_prose};
use crate::error::Result;
use crate::pipeline::{Processor, Transformed};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ORDERED_ITEM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^([ \t]*)-[ \t]+(.+?)\r?\n[ \t]*logseq\.order-list-type::[ \t]*number[ \t]*\r?\n?")
        .unwrap()
});

static ADMONITION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*-\s*)?#\+BEGIN_([A-Z]+)").unwrap());

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]+)\]\(([^)]+)\)(?:\{[^}]*\})?").unwrap());

/// Placeholder page for assets that are not carried over.
pub const MISSING_ASSET_PAGE: &str = "logseq-import-missing-asset";

/// Replaces ASCII arrows with their Unicode glyphs outside code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arrows;

impl Processor for Arrows {
    fn name(&self) -> &'static str {
        "arrows"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rewritten = rewrite_outside_fences(content, |line| {
            line.replace("->", "→")
                .replace("=>", "→")
                .replace("<-", "←")
                .replace("<=", "←")
        });
        Ok(Transformed::compare(content, rewritten))
    }
}

/// Replaces image embeds with a link to the missing-asset page.
#[derive(Debug, Clone, Copy, Default)]
pub struct Image;

impl Processor for Image {
    fn name(&self) -> &'static str {
        "images"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        if !IMAGE.is_match(content) {
            return Ok(Transformed::unchanged(content));
        }

        let rewritten = rewrite_prose(content, |chunk| {
            IMAGE
                .replace_all(chunk, |caps: &Captures<'_>| {
                    let file = caps[2].rsplit(['/', '\\']).next().unwrap_or(&caps[2]);
                    format!("[[{MISSING_ASSET_PAGE}]]: `{file}`")
                })
                .into_owned()
        });
        Ok(Transformed::compare(content, rewritten))
    }
}

/// Turns bullets tagged `logseq.order-list-type:: number` into `1.` items.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedList;

impl Processor for OrderedList {
    fn name(&self) -> &'static str {
        "ordered-list"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rewritten = rewrite_prose(content, |chunk| {
            ORDERED_ITEM
                .replace_all(chunk, |caps: &Captures<'_>| {
                    let newline = if caps[0].ends_with('\n') { "\n" } else { "" };
                    format!("{}1. {}{newline}", &caps[1], &caps[2])
                })
                .into_owned()
        });
        Ok(Transformed::compare(content, rewritten))
    }
}

/// Admonition kinds and the emoji shown in their heading.
const ADMONITIONS: [(&str, &str); 4] = [
    ("IMPORTANT", "‼️"),
    ("WARNING", "⚠️"),
    ("TIP", "💡"),
    ("NOTE", "ℹ️"),
];

const QUOTE: &str = "QUOTE";

/// How a `#+BEGIN_X` block is rendered.
#[derive(Debug, Clone, Copy)]
enum BlockStyle {
    /// Heading with the kind's emoji, then italic lines
    Callout(&'static str),
    /// Plain quote lines
    Quote,
}

/// Converts `#+BEGIN_NOTE` style blocks into Reflect blockquotes.
///
/// For admonitions the first line of the block becomes a `##` heading with
/// the kind's emoji and the remaining non-blank lines become italic quote
/// lines. `#+BEGIN_QUOTE` blocks become plain quote lines. Inside a bullet
/// the quote continues at the bullet's text column. Other block kinds are
/// left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Admonition;

impl Admonition {
    fn style(kind: &str) -> Option<BlockStyle> {
        if kind == QUOTE {
            return Some(BlockStyle::Quote);
        }
        ADMONITIONS
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, emoji)| BlockStyle::Callout(emoji))
    }

    fn continuation(list_prefix: &str) -> String {
        match list_prefix.rfind("- ") {
            Some(pos) => format!("{}  {}", &list_prefix[..pos], &list_prefix[pos + 2..]),
            None => format!("{list_prefix}  "),
        }
    }

    fn quote_lines(style: BlockStyle, block: &[&str]) -> Vec<String> {
        let mut body = block
            .iter()
            .map(|b| b.trim())
            .filter(|b| !b.is_empty())
            .peekable();
        match style {
            BlockStyle::Callout(emoji) => {
                let Some(first) = block.first() else {
                    return Vec::new();
                };
                body.next_if(|b| *b == first.trim());
                let heading = format!("> ## {emoji} {}", first.trim());
                std::iter::once(heading.trim_end().to_string())
                    .chain(body.map(|b| format!("> _{b}_")))
                    .collect()
            }
            BlockStyle::Quote => body.map(|b| format!("> {b}")).collect(),
        }
    }

    fn convert(chunk: &str) -> String {
        let lines: Vec<&str> = chunk.split('\n').collect();
        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let start = ADMONITION_START.captures(line).and_then(|caps| {
                let kind = caps.get(2)?.as_str();
                let style = Self::style(kind)?;
                let prefix = caps.get(1).map_or("", |m| m.as_str());
                Some((kind.to_string(), style, prefix.to_string()))
            });
            let Some((kind, style, list_prefix)) = start else {
                out.push(line.to_string());
                i += 1;
                continue;
            };

            let end_marker = format!("#+END_{kind}");
            let mut block: Vec<&str> = Vec::new();
            i += 1;
            while i < lines.len() {
                let inner = lines[i].trim_start();
                if inner.starts_with(&end_marker) {
                    break;
                }
                block.push(inner);
                i += 1;
            }

            let quoted = Self::quote_lines(style, &block);
            if !quoted.is_empty() {
                if list_prefix.is_empty() {
                    out.extend(quoted);
                    let next = lines.get(i + 1).map_or("", |l| l.trim());
                    if !next.is_empty() {
                        out.push(String::new());
                    }
                } else {
                    let continuation = Self::continuation(&list_prefix);
                    let mut quoted = quoted.into_iter();
                    if let Some(first) = quoted.next() {
                        out.push(format!("{list_prefix}{first}"));
                    }
                    out.extend(quoted.map(|q| format!("{continuation}{q}")));
                }
            }
            i += 1;
        }

        out.join("\n")
    }
}

impl Processor for Admonition {
    fn name(&self) -> &'static str {
        "admonitions"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rewritten = rewrite_prose(content, Self::convert);
        Ok(Transformed::compare(content, rewritten))
    }
}
