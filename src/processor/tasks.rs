use super::rewrite_prose;
use crate::error::Result;
use crate::pipeline::{Processor, Transformed};
use once_cell::sync::Lazy;
use regex::Regex;

static LOGBOOK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\s+:LOGBOOK:.*?:END:").unwrap());

static CANCELLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-[ \t]+(?:CANCELLED|CANCELED)[ \t]+(.*)").unwrap());

static WAITING: Lazy<Regex> = Lazy::new(|| Regex::new(r"-[ \t]+WAITING[ \t]+(.*)").unwrap());

const MARKERS: [(&str, &str); 3] = [
    ("- TODO ", "- [ ] "),
    ("- DONE ", "- [x] "),
    ("- DOING ", "- [ ] "),
];

/// Converts LogSeq task markers to Reflect checkboxes and drops logbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskCleaner;

impl Processor for TaskCleaner {
    fn name(&self) -> &'static str {
        "tasks"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let cleaned = rewrite_prose(content, |chunk| {
            let cleaned = LOGBOOK.replace_all(chunk, "");
            let cleaned = CANCELLED.replace_all(&cleaned, "- [x] ~~${1}~~");
            let mut cleaned = WAITING.replace_all(&cleaned, "- [ ] ${1}").into_owned();

            for (marker, checkbox) in MARKERS {
                cleaned = cleaned.replace(marker, checkbox);
            }
            cleaned
        });

        Ok(Transformed::compare(content, cleaned))
    }
}
