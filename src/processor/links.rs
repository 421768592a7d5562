//! Page links, tags and the workspace-wide link index.
//!
//! [`TagToBacklink`] and [`BacklinkCollector`] accumulate every tag and page
//! link seen during a run into a shared [`LinkIndex`], which the converter
//! writes out as `tags.txt` and `backlinks.txt` once all files are done.

use super::{mark_fenced, rewrite_outside_fences, rewrite_prose};
use super::title::namespaced_title_case;
use crate::date::{format_header_date, format_index_date};
use crate::error::Result;
use crate::pipeline::{Processor, Transformed};
use crate::vocabulary::TypeVocabulary;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static WIKI_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").unwrap());

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\w])#([A-Za-z0-9_-]+)").unwrap());

static NUMERIC_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[\s-](\d{2})[\s-](\d{2})$").unwrap());

static HEADER_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{3}, [A-Za-z]+ \d{1,2}(?:st|nd|rd|th), \d{4}$").unwrap()
});

#[derive(Debug, Default)]
struct LinkState {
    tags: BTreeSet<String>,
    backlinks: BTreeSet<String>,
    journal_dates: HashMap<String, String>,
}

/// Tags and page links found across a conversion run.
///
/// Shared between processors behind an [`Arc`]; all access goes through an
/// internal mutex.
#[derive(Debug, Default)]
pub struct LinkIndex {
    state: Mutex<LinkState>,
}

impl LinkIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remembers a journal date so links to its header text map back to `YYYY/MM/DD`.
    pub fn register_journal_date(&self, date: NaiveDate) {
        self.lock()
            .journal_dates
            .insert(format_header_date(date), format_index_date(date));
    }

    /// Records a tag, lowercased.
    pub fn record_tag(&self, tag: &str) {
        self.lock().tags.insert(tag.to_lowercase());
    }

    /// Records the target of a page link.
    ///
    /// `2025-04-14` and `2025 04 14` are stored as `2025/04/14`; header
    /// dates such as `Mon, April 14th, 2025` are mapped back through the
    /// known journal dates when possible.
    pub fn record_backlink(&self, link: &str) {
        let mut state = self.lock();

        if let Some(caps) = NUMERIC_DATE.captures(link) {
            let index_date = format!("{}/{}/{}", &caps[1], &caps[2], &caps[3]);
            let parsed = NaiveDate::parse_from_str(&index_date, "%Y/%m/%d");
            if let Ok(date) = parsed {
                state
                    .journal_dates
                    .insert(format_header_date(date), index_date.clone());
            }
            state.backlinks.insert(index_date);
            return;
        }

        if HEADER_DATE.is_match(link) {
            let mapped = state.journal_dates.get(link).cloned();
            state.backlinks.insert(mapped.unwrap_or_else(|| link.to_string()));
            return;
        }

        state.backlinks.insert(link.to_string());
    }

    /// Sorted, de-duplicated tags.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        self.lock().tags.iter().cloned().collect()
    }

    /// Sorted, de-duplicated link targets with header dates mapped to `YYYY/MM/DD`.
    #[must_use]
    pub fn backlinks(&self) -> Vec<String> {
        let state = self.lock();
        state
            .backlinks
            .iter()
            .map(|link| state.journal_dates.get(link).unwrap_or(link).clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of distinct tags.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.lock().tags.len()
    }

    /// Number of distinct link targets.
    #[must_use]
    pub fn backlink_count(&self) -> usize {
        self.lock().backlinks.len()
    }
}

/// Turns `#tag` into a `[[/tag/]]` page link and records the tag.
///
/// Words from the types vocabulary stay plain tags. Code fences are skipped.
#[derive(Debug, Clone)]
pub struct TagToBacklink {
    types: TypeVocabulary,
    links: Arc<LinkIndex>,
}

impl TagToBacklink {
    /// Creates a tag converter recording into `links`.
    #[must_use]
    pub const fn new(types: TypeVocabulary, links: Arc<LinkIndex>) -> Self {
        Self { types, links }
    }
}

impl Processor for TagToBacklink {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rewritten = rewrite_outside_fences(content, |line| {
            TAG.replace_all(line, |caps: &Captures<'_>| {
                let tag = &caps[2];
                if self.types.contains(tag) {
                    return caps[0].to_string();
                }
                self.links.record_tag(tag);
                format!("{}[[/{}/]]", &caps[1], tag.to_lowercase())
            })
            .into_owned()
        });
        Ok(Transformed::compare(content, rewritten))
    }
}

/// Title cases the text of every `[[link]]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLink;

impl Processor for WikiLink {
    fn name(&self) -> &'static str {
        "wiki-links"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rewritten = rewrite_prose(content, |chunk| {
            WIKI_LINK
                .replace_all(chunk, |caps: &Captures<'_>| {
                    format!("[[{}]]", namespaced_title_case(&caps[1]))
                })
                .into_owned()
        });
        Ok(Transformed::compare(content, rewritten))
    }
}

/// Records every `[[link]]` target without touching the content.
#[derive(Debug, Clone)]
pub struct BacklinkCollector {
    links: Arc<LinkIndex>,
}

impl BacklinkCollector {
    /// Creates a collector recording into `links`.
    #[must_use]
    pub const fn new(links: Arc<LinkIndex>) -> Self {
        Self { links }
    }
}

impl Processor for BacklinkCollector {
    fn name(&self) -> &'static str {
        "backlinks"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        for (line, _) in mark_fenced(content).into_iter().filter(|(_, fenced)| !fenced) {
            for caps in WIKI_LINK.captures_iter(line) {
                self.links.record_backlink(&caps[1]);
            }
        }
        Ok(Transformed::unchanged(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_tags_become_links() {
        let links = Arc::new(LinkIndex::new());
        let processor = TagToBacklink::new(TypeVocabulary::default(), Arc::clone(&links));
        let out = processor.process("- reading #Books and #rust-lang").unwrap();

        assert_eq!(out.content, "- reading [[/books/]] and [[/rust-lang/]]");
        assert!(out.changed);
        assert_eq!(links.tags(), vec!["books", "rust-lang"]);
    }

    #[test]
    fn test_headings_and_anchors_are_not_tags() {
        let links = Arc::new(LinkIndex::new());
        let processor = TagToBacklink::new(TypeVocabulary::default(), Arc::clone(&links));
        let content = "## Heading\n- see page#section\n- #+BEGIN_NOTE";
        let out = processor.process(content).unwrap();

        assert!(!out.changed);
        assert!(links.tags().is_empty());
    }

    #[test]
    fn test_type_tags_kept() {
        let links = Arc::new(LinkIndex::new());
        let processor = TagToBacklink::new(TypeVocabulary::from_words(["jira"]), Arc::clone(&links));
        let out = processor.process("#jira #urgent").unwrap();

        assert_eq!(out.content, "#jira [[/urgent/]]");
        assert_eq!(links.tag_count(), 1);
    }

    #[test]
    fn test_tags_in_code_fence_kept() {
        let links = Arc::new(LinkIndex::new());
        let processor = TagToBacklink::new(TypeVocabulary::default(), Arc::clone(&links));
        let content = "- ```python\n  #comment\n  ```";

        assert!(!processor.process(content).unwrap().changed);
    }

    #[test]
    fn test_wiki_links_title_cased() {
        let out = WikiLink
            .process("see [[the art of war]] and [[Repo/Core/design notes]] and [[/books/]]")
            .unwrap();
        assert_eq!(
            out.content,
            "see [[The Art of War]] and [[repo/core/Design Notes]] and [[/books/]]"
        );
    }

    #[test]
    fn test_backlinks_collected_unchanged() {
        let links = Arc::new(LinkIndex::new());
        let collector = BacklinkCollector::new(Arc::clone(&links));
        let out = collector.process("[[Zeta]] [[Alpha]] [[Alpha]]").unwrap();

        assert!(!out.changed);
        assert_eq!(links.backlinks(), vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_wiki_links_in_code_untouched() {
        let links = Arc::new(LinkIndex::new());
        let content = "- ```\nmatrix[[i]][[j]]\n```\n- [[my page]]";

        let out = WikiLink.process(content).unwrap();
        assert_eq!(out.content, "- ```\nmatrix[[i]][[j]]\n```\n- [[My Page]]");

        BacklinkCollector::new(Arc::clone(&links)).process(content).unwrap();
        assert_eq!(links.backlinks(), vec!["my page"]);
    }

    #[test]
    fn test_numeric_dates_normalized() {
        let links = LinkIndex::new();
        links.record_backlink("2025-04-14");
        links.record_backlink("2025 04 15");

        assert_eq!(links.backlinks(), vec!["2025/04/14", "2025/04/15"]);
    }

    #[test]
    fn test_header_dates_mapped_through_journals() {
        let links = LinkIndex::new();
        links.register_journal_date(date(2025, 4, 17));
        links.record_backlink("Thu, April 17th, 2025");
        links.record_backlink("Fri, April 18th, 2025");

        assert_eq!(links.backlinks(), vec!["2025/04/17", "Fri, April 18th, 2025"]);
    }

    #[test]
    fn test_header_date_mapped_when_journal_registered_later() {
        let links = LinkIndex::new();
        links.record_backlink("Thu, April 17th, 2025");
        links.register_journal_date(date(2025, 4, 17));

        assert_eq!(links.backlinks(), vec!["2025/04/17"]);
        assert_eq!(links.backlink_count(), 1);
    }
}
