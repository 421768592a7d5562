//! Content processors that rewrite LogSeq markdown into Reflect markdown.
//!
//! Each processor is one small rewrite. [`shared_pipeline`] chains them in
//! the order every document goes through; the converter puts a
//! [`PageTitle`] or [`DateHeader`] in front depending on the file kind.

mod bullets;
mod empty;
mod headers;
mod links;
mod markup;
mod properties;
mod resolver;
mod tasks;
mod title;

pub use bullets::{BulletHierarchy, BulletNode, BulletTree};
pub use empty::EmptyContentCleaner;
pub use headers::{DateHeader, FirstContentIndentation, PageTitle};
pub use links::{BacklinkCollector, LinkIndex, TagToBacklink, WikiLink};
pub use markup::{Admonition, Arrows, Image, MISSING_ASSET_PAGE, OrderedList};
pub use properties::{BlockIdLines, Properties};
pub use resolver::{
    BlockIndex, BlockRecord, BlockResolver, COLLECTED_DIRECTORIES, extract_blocks, is_block_id,
    page_title, remove_orphans,
};
pub use tasks::TaskCleaner;

use crate::pipeline::{Processor, ProcessorPipeline};
use crate::vocabulary::TypeVocabulary;
use std::sync::Arc;

/// Builds the processor chain shared by journals and pages.
///
/// `resolver` must already be collected; `links` receives the tags and
/// page links seen in every document the pipeline processes.
#[must_use]
pub fn shared_pipeline(
    resolver: Arc<BlockResolver>,
    links: &Arc<LinkIndex>,
    types: &TypeVocabulary,
) -> ProcessorPipeline {
    let processors: Vec<Arc<dyn Processor>> = vec![
        Arc::new(OrderedList),
        Arc::new(Admonition),
        Arc::new(BlockIdLines),
        resolver,
        Arc::new(TaskCleaner),
        Arc::new(Properties),
        Arc::new(EmptyContentCleaner),
        Arc::new(BulletHierarchy),
        Arc::new(FirstContentIndentation),
        Arc::new(Arrows),
        Arc::new(TagToBacklink::new(types.clone(), Arc::clone(links))),
        Arc::new(WikiLink),
        Arc::new(Image),
        Arc::new(BacklinkCollector::new(Arc::clone(links))),
    ];
    ProcessorPipeline::new(processors)
}

/// Pairs every line with whether it belongs to a fenced code block.
///
/// The opening and closing fence lines count as fenced. An unclosed fence
/// runs to the end of the document.
pub(crate) fn mark_fenced(content: &str) -> Vec<(&str, bool)> {
    let mut in_fence = false;

    content
        .split('\n')
        .map(|line| {
            if in_fence {
                if line.trim() == "```" {
                    in_fence = false;
                }
                (line, true)
            } else if bullets::opens_fence(line) {
                in_fence = true;
                (line, true)
            } else {
                (line, false)
            }
        })
        .collect()
}

/// Applies `rewrite` to every line that is not part of a fenced code block.
pub(crate) fn rewrite_outside_fences<F>(content: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    mark_fenced(content)
        .into_iter()
        .map(|(line, fenced)| if fenced { line.to_string() } else { rewrite(line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Applies `rewrite` to each run of consecutive lines outside fenced code.
///
/// For rewrites whose patterns span lines; fenced lines are copied as is.
pub(crate) fn rewrite_prose<F>(content: &str, mut rewrite: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out: Vec<String> = Vec::new();
    let mut prose: Vec<&str> = Vec::new();

    for (line, fenced) in mark_fenced(content) {
        if !fenced {
            prose.push(line);
            continue;
        }
        if !prose.is_empty() {
            out.push(rewrite(&prose.join("\n")));
            prose.clear();
        }
        out.push(line.to_string());
    }
    if !prose.is_empty() {
        out.push(rewrite(&prose.join("\n")));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use proptest::prelude::*;

    const PAGE: &str = "# Support\n- ## Business Hour Support\n  id:: abcd1234-5678-90ab-cdef-1234567890ab\n  collapsed:: true\n\t- Mon to Fri #help\n";

    fn pipeline(types: TypeVocabulary) -> (ProcessorPipeline, Arc<LinkIndex>, assert_fs::TempDir) {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("pages/support.md").write_str(PAGE).unwrap();

        let mut resolver = BlockResolver::new(types.clone());
        resolver.collect(temp.path()).unwrap();

        let links = Arc::new(LinkIndex::new());
        (shared_pipeline(Arc::new(resolver), &links, &types), links, temp)
    }

    #[test]
    fn test_shared_pipeline_order() {
        let (pipeline, _, _temp) = pipeline(TypeVocabulary::default());

        assert_eq!(
            pipeline.names(),
            vec![
                "ordered-list",
                "admonitions",
                "block-id-lines",
                "block-references",
                "tasks",
                "properties",
                "empty-content",
                "bullet-hierarchy",
                "first-content-indentation",
                "arrows",
                "tags",
                "wiki-links",
                "images",
                "backlinks",
            ]
        );
    }

    #[test]
    fn test_page_through_full_pipeline() {
        let (pipeline, links, _temp) = pipeline(TypeVocabulary::default());
        let pipeline = pipeline.prepend(Arc::new(PageTitle::new("pages/on call.md")));

        let content = "- TODO check ((abcd1234-5678-90ab-cdef-1234567890ab)) -> [[escalation policy]]\n- ## Rota\n\t- week one #oncall\n";
        let out = pipeline.run(content);

        assert!(out.failures.is_empty());
        assert!(out.changed);
        assert_eq!(
            out.content,
            "# On Call\n\n- [ ] check _**Business Hour Support** ([[Support]])_ → [[Escalation Policy]]\n- ## Rota\n\t- week one [[/oncall/]]"
        );
        assert_eq!(links.tags(), vec!["oncall"]);
        assert_eq!(
            links.backlinks(),
            vec!["/oncall/", "Escalation Policy", "Support"]
        );
    }

    #[test]
    fn test_uncollected_resolver_degrades_gracefully() {
        let links = Arc::new(LinkIndex::new());
        let types = TypeVocabulary::default();
        let pipeline = shared_pipeline(Arc::new(BlockResolver::new(types.clone())), &links, &types);

        let out = pipeline.run("- DONE see ((abcd1234-5678-90ab-cdef-1234567890ab))");
        assert_eq!(out.failures.len(), 1);
        assert_eq!(
            out.content,
            "- [x] see ((abcd1234-5678-90ab-cdef-1234567890ab))"
        );
    }

    #[test]
    fn test_rewrite_outside_fences() {
        let out = rewrite_outside_fences("a\n```\na\n```\na", str::to_uppercase);
        assert_eq!(out, "A\n```\na\n```\nA");
    }

    #[test]
    fn test_rewrite_prose_keeps_fences() {
        let out = rewrite_prose("a\nb\n- ```\nc\n```\nd", |chunk| chunk.replace('\n', "+"));
        assert_eq!(out, "a+b\n- ```\nc\n```\nd");
    }

    #[test]
    fn test_mark_fenced_unclosed() {
        let marked = mark_fenced("a\n```rust\nb");
        assert_eq!(marked, vec![("a", false), ("```rust", true), ("b", true)]);
    }

    #[test]
    fn test_code_block_survives_full_pipeline() {
        let (pipeline, links, _temp) = pipeline(TypeVocabulary::default());
        let code = "\t- ```rust\n\t  fn main() {\n\t      std::process::exit(1);\n\n\n\t      Foo::new();\n\t  }\n\t  ```";
        let content = format!("- Example:\n{code}\n- after");

        let out = pipeline.run(&content);

        assert!(out.failures.is_empty());
        assert!(out.content.contains(code));
        assert_eq!(out.content, content);
        assert!(links.backlinks().is_empty());
    }

    fn code_line() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "",
            "std::process::exit(1);",
            "Foo::new();",
            "# not a heading",
            "## nor this",
            "key:: value",
            "  id:: abcd1234-5678-90ab-cdef-1234567890ab",
            "background-color:: red",
            "- TODO inside code",
            "- DONE done:: true",
            "-",
            "let tag = \"#work\";",
            "a -> b => c",
            "see ((abcd1234-5678-90ab-cdef-1234567890ab))",
            "{{embed ((abcd1234-5678-90ab-cdef-1234567890ab))}}",
            "{{query (todo now)}}",
            "[[lower case link]] ![alt](img.png)",
            "#+BEGIN_NOTE",
        ])
        .prop_map(|line| if line.is_empty() { String::new() } else { format!("\t  {line}") })
    }

    proptest! {
        #[test]
        fn test_fenced_code_is_byte_identical(body in prop::collection::vec(code_line(), 0..12)) {
            let (pipeline, _links, _temp) = pipeline(TypeVocabulary::default());
            let block = format!("\t- ```rust\n{}\n\t  ```", body.join("\n"));
            let content = format!("# Notes\n- Example:\n{block}\n- after");

            let out = pipeline.run(&content);

            prop_assert!(out.content.contains(&block), "fence changed: {:?}", out.content);
        }
    }
}
