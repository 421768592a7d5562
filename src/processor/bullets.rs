//! Bullet hierarchy rewriting.
//!
//! LogSeq indents every block below a heading by one extra tab. Reflect
//! treats a heading as a section, so the blocks under it are promoted by one
//! tab stop while their relative nesting is kept.
//!
//! The document is parsed into an arena of [`BulletNode`]s from its tab
//! indentation, then re-emitted recursively. Lines inside fenced code are
//! verbatim: they hang off the fence opener, never re-leveled, so a `#`
//! comment in code is never read as a heading.

use crate::error::Result;
use crate::pipeline::{Processor, Transformed};

const FENCE: &str = "```";

/// One line of the document and its place in the indentation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletNode<'a> {
    /// The line as it appeared in the input
    pub line: &'a str,

    /// The line without its leading tabs
    pub text: &'a str,

    /// Number of leading tab characters
    pub depth: usize,

    /// Part of a fenced code region
    pub verbatim: bool,

    /// Arena indices of child nodes, in document order
    pub children: Vec<usize>,
}

/// Indentation tree of a document, stored as an arena.
#[derive(Debug, Clone, Default)]
pub struct BulletTree<'a> {
    nodes: Vec<BulletNode<'a>>,
    roots: Vec<usize>,
}

impl<'a> BulletTree<'a> {
    /// Builds the tree with an explicit stack of open ancestors.
    #[must_use]
    pub fn parse(content: &'a str) -> Self {
        let mut tree = Self::default();
        let mut stack: Vec<usize> = Vec::new();
        let mut in_fence = false;

        for line in content.split('\n') {
            let text = line.trim_start_matches('\t');
            let depth = line.len() - text.len();

            if in_fence {
                if text.trim() == FENCE {
                    in_fence = false;
                }
                tree.attach(stack.last().copied(), line, text, depth, true);
                continue;
            }

            while stack.last().is_some_and(|&top| tree.nodes[top].depth >= depth) {
                stack.pop();
            }
            let id = tree.attach(stack.last().copied(), line, text, depth, false);
            stack.push(id);

            in_fence = opens_fence(text);
        }

        tree
    }

    fn attach(
        &mut self,
        parent: Option<usize>,
        line: &'a str,
        text: &'a str,
        depth: usize,
        verbatim: bool,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(BulletNode {
            line,
            text,
            depth,
            verbatim,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// All nodes in document order.
    #[must_use]
    pub fn nodes(&self) -> &[BulletNode<'a>] {
        &self.nodes
    }

    /// Arena indices of top-level nodes.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Re-emits the document with heading sections promoted one level.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.emit(&self.roots, None, &mut out);
        out.join("\n")
    }

    fn emit(&self, ids: &[usize], heading_level: Option<usize>, out: &mut Vec<String>) {
        for &id in ids {
            let node = &self.nodes[id];

            let child_level = if node.verbatim {
                out.push(node.line.to_string());
                heading_level
            } else if is_heading(node.text) {
                out.push(node.line.to_string());
                Some(1)
            } else if let Some(level) = heading_level {
                let depth = node.depth.saturating_sub(level);
                out.push(format!("{}{}", "\t".repeat(depth), node.text));
                heading_level
            } else {
                out.push(node.line.to_string());
                None
            };

            self.emit(&node.children, child_level, out);
        }
    }
}

/// Promotes blocks nested under headings by one tab stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulletHierarchy;

impl Processor for BulletHierarchy {
    fn name(&self) -> &'static str {
        "bullet-hierarchy"
    }

    fn process(&self, content: &str) -> Result<Transformed> {
        let rendered = BulletTree::parse(content).render();
        Ok(Transformed::compare(content, rendered))
    }
}

/// Markdown heading: one to six `#` followed by whitespace or end of line.
pub(crate) fn is_heading(text: &str) -> bool {
    let text = text.trim_start();
    let hashes = text.bytes().take_while(|&b| b == b'#').count();
    (1..=6).contains(&hashes) && text[hashes..].chars().next().is_none_or(char::is_whitespace)
}

/// A fence opener, bulleted or not, that does not close on the same line.
pub(crate) fn opens_fence(text: &str) -> bool {
    let text = text.trim_start();
    let text = text.strip_prefix("- ").map_or(text, str::trim_start);
    text.strip_prefix(FENCE)
        .is_some_and(|rest| !rest.contains(FENCE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rewrite(content: &str) -> Transformed {
        BulletHierarchy.process(content).unwrap()
    }

    #[test]
    fn test_heading_children_promoted_one_level() {
        let out = rewrite("## Heading\n\t- A\n\t\t- B");

        assert_eq!(out.content, "## Heading\n- A\n\t- B");
        assert!(out.changed);
    }

    #[test]
    fn test_lines_outside_headings_untouched() {
        let content = "- A\n\t- B\n\t\t- C\nplain";
        let out = rewrite(content);

        assert_eq!(out.content, content);
        assert!(!out.changed);
    }

    #[test]
    fn test_non_bullet_children_promoted() {
        let out = rewrite("# Title\n\t- item\n\t  continuation\n\tnote:: x");
        assert_eq!(out.content, "# Title\n- item\n  continuation\nnote:: x");
    }

    #[test]
    fn test_nested_heading_resets_level() {
        let out = rewrite("- parent\n\t## Section\n\t\t- child\n\t\t\t- grandchild");
        assert_eq!(
            out.content,
            "- parent\n\t## Section\n\t- child\n\t\t- grandchild"
        );
    }

    #[test]
    fn test_depth_jump_under_heading_promotes_once_per_pass() {
        // Idempotence only holds for one-tab steps; a jump settles over passes.
        let first = rewrite("## H\n\t\t- a");
        assert_eq!(first.content, "## H\n\t- a");

        let second = rewrite(&first.content);
        assert_eq!(second.content, "## H\n- a");
        assert!(second.changed);

        let third = rewrite(&second.content);
        assert!(!third.changed);
    }

    #[test]
    fn test_tag_line_is_not_a_heading() {
        let content = "#project\n\t- item";
        assert_eq!(rewrite(content).content, content);
        assert!(is_heading("### Deep"));
        assert!(is_heading("#"));
        assert!(!is_heading("####### Seven"));
        assert!(!is_heading("- ## bulleted"));
    }

    #[test]
    fn test_code_fence_is_verbatim() {
        let content = "## Setup\n\t- Run this:\n\t- ```bash\n\t  # install deps\n\t  make\n# not a heading\n\t  ```\n\t- done";
        let out = rewrite(content);

        assert_eq!(
            out.content,
            "## Setup\n- Run this:\n- ```bash\n\t  # install deps\n\t  make\n# not a heading\n\t  ```\n- done"
        );
    }

    #[test]
    fn test_one_line_fence_does_not_open_region() {
        assert!(!opens_fence("- ```inline```"));
        assert!(opens_fence("- ```rust"));
        assert!(opens_fence("```"));

        let out = rewrite("# T\n\t- ```x```\n\t- after");
        assert_eq!(out.content, "# T\n- ```x```\n- after");
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let content = "# T\n\t- ```\n\t\t# code";
        let tree = BulletTree::parse(content);

        assert!(tree.nodes()[2].verbatim);
        assert_eq!(rewrite(content).content, "# T\n- ```\n\t\t# code");
    }

    #[test]
    fn test_parse_builds_hierarchy() {
        let tree = BulletTree::parse("- a\n\t- b\n\t\t- c\n\t- d\n- e");

        assert_eq!(tree.roots(), &[0, 4]);
        assert_eq!(tree.nodes()[0].children, vec![1, 3]);
        assert_eq!(tree.nodes()[1].children, vec![2]);
        assert_eq!(tree.nodes()[2].depth, 2);
        assert_eq!(tree.nodes()[2].text, "- c");
    }

    #[test]
    fn test_trailing_newline_kept() {
        let out = rewrite("## H\n\t- A\n");
        assert_eq!(out.content, "## H\n- A\n");
    }

    #[test]
    fn test_empty_document() {
        let out = rewrite("");
        assert_eq!(out.content, "");
        assert!(!out.changed);
    }

    fn outline() -> impl Strategy<Value = String> {
        prop::collection::vec((0usize..4, any::<bool>(), "[a-z]{1,8}"), 1..24).prop_map(|rows| {
            let mut depth = 0;
            let mut lines = Vec::with_capacity(rows.len());
            for (i, (wanted, heading, word)) in rows.into_iter().enumerate() {
                depth = if i == 0 { 0 } else { wanted.min(depth + 1) };
                if heading && depth == 0 {
                    lines.push(format!("## {word}"));
                } else {
                    lines.push(format!("{}- {word}", "\t".repeat(depth)));
                }
            }
            lines.join("\n")
        })
    }

    proptest! {
        #[test]
        fn test_rewrite_is_idempotent(content in outline()) {
            let once = rewrite(&content);
            let twice = rewrite(&once.content);

            prop_assert_eq!(&twice.content, &once.content);
            prop_assert!(!twice.changed);
        }

        #[test]
        fn test_fence_contents_are_invariant(
            before in outline(),
            code in prop::collection::vec("\t{0,3}[#a-z =]{0,12}", 1..8),
        ) {
            let code: Vec<String> = code
                .into_iter()
                .filter(|line| line.trim() != FENCE)
                .collect();
            let content = format!(
                "{before}\n## Code\n\t- ```python\n{}\n\t  ```\n\t- after",
                code.join("\n")
            );
            let out = rewrite(&content);
            let lines: Vec<&str> = out.content.split('\n').collect();
            let start = lines
                .iter()
                .position(|line| *line == "- ```python")
                .unwrap();

            for (offset, line) in code.iter().enumerate() {
                prop_assert_eq!(lines[start + 1 + offset], line.as_str());
            }
        }
    }
}
