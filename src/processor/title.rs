//! Title casing shared by page titles and wiki links.

const SMALL_WORDS: &[&str] = &[
    "a", "an", "the", "and", "but", "or", "for", "nor", "as", "at", "by", "from", "in", "into",
    "near", "of", "on", "onto", "to", "with",
];

/// Uppercases the first character and lowercases the rest.
pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

/// Title cases space-separated words.
///
/// The first and last words are always capitalized; small words in between
/// are lowercased. Runs of spaces are kept as they are.
pub(crate) fn title_case(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i != 0 && i != last && SMALL_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title case for a possibly namespaced name: `Repo/SUB/my notes` becomes
/// `repo/sub/My Notes`.
pub(crate) fn namespaced_title_case(text: &str) -> String {
    match text.rsplit_once('/') {
        Some((namespace, last)) => format!("{}/{}", namespace.to_lowercase(), title_case(last)),
        None => title_case(text),
    }
}

/// Flattens a LogSeq file or alias name into plain words and title cases it.
pub(crate) fn flatten_title(name: &str) -> String {
    let flat = name
        .replace("___", " ")
        .replace("%2F", " ")
        .replace(['/', '_'], " ");
    let collapsed = flat.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(&collapsed)
}
