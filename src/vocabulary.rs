//! The "types" vocabulary: lowercase words used as a leading namespace
//! segment (`jira/Improve X`) or leading word (`jira Improve X`) of a page title.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Flat set of lowercase type-prefix words.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeVocabulary {
    words: BTreeSet<String>,
}

impl TypeVocabulary {
    /// Builds a vocabulary from the given words, lowercased.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    /// Loads one word per line. A missing or unreadable file yields an empty vocabulary.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let vocabulary = Self::from_words(contents.lines());
                debug!(
                    "Loaded {} type prefixes from {}",
                    vocabulary.len(),
                    path.display()
                );
                vocabulary
            }
            Err(e) => {
                debug!("No types vocabulary at {} ({e})", path.display());
                Self::default()
            }
        }
    }

    /// Returns true if `word` (any case) is a type prefix.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Number of words in the vocabulary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Drops a leading type token from a page title.
    ///
    /// `jira/Improve X` and `jira Improve X` both become `Improve X` when
    /// `jira` is a known type. Anything else is returned unchanged.
    #[must_use]
    pub fn strip_prefix<'a>(&self, title: &'a str) -> &'a str {
        if self.words.is_empty() {
            return title;
        }

        if let Some((head, rest)) = title.split_once('/') {
            let rest = rest.trim();
            if self.contains(head.trim()) && !rest.is_empty() {
                return rest;
            }
        }

        if let Some((head, rest)) = title.split_once(char::is_whitespace) {
            let rest = rest.trim();
            if self.contains(head) && !rest.is_empty() {
                return rest;
            }
        }

        title
    }
}
