use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Result of running one processor over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Rewritten document text
    pub content: String,

    /// Whether the processor considers the document changed
    pub changed: bool,
}

impl Transformed {
    /// Creates a result with an explicit changed flag.
    #[must_use]
    pub const fn new(content: String, changed: bool) -> Self {
        Self { content, changed }
    }

    /// Returns the input untouched.
    #[must_use]
    pub fn unchanged(content: &str) -> Self {
        Self::new(content.to_string(), false)
    }

    /// Builds a result whose flag is a byte comparison with the input.
    #[must_use]
    pub fn compare(original: &str, content: String) -> Self {
        let changed = content != original;
        Self::new(content, changed)
    }
}

/// A single content rewriter.
///
/// Implementations must be thread-safe; stateful processors guard their
/// state internally.
pub trait Processor: Send + Sync {
    /// Short stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Rewrites one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the processor cannot handle this document. The
    /// pipeline discards the attempted change and carries on.
    fn process(&self, content: &str) -> Result<Transformed>;
}

/// Outcome of running a whole pipeline over one document.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final document text
    pub content: String,

    /// Logical OR of every processor's changed flag
    pub changed: bool,

    /// Failures of individual processors, in pipeline order
    pub failures: Vec<Error>,
}

/// Ordered chain of processors applied to one document.
///
/// Cloning is cheap: processors are shared, so a stateful processor such as
/// the block reference resolver is visible to every pipeline holding it.
#[derive(Clone, Default)]
pub struct ProcessorPipeline {
    processors: Vec<Arc<dyn Processor>>,
}

impl ProcessorPipeline {
    /// Creates a pipeline from processors in registration order.
    #[must_use]
    pub fn new(processors: Vec<Arc<dyn Processor>>) -> Self {
        Self { processors }
    }

    /// Returns a pipeline with `processor` run before everything else.
    #[must_use]
    pub fn prepend(&self, processor: Arc<dyn Processor>) -> Self {
        let mut processors = Vec::with_capacity(self.processors.len() + 1);
        processors.push(processor);
        processors.extend(self.processors.iter().cloned());
        Self { processors }
    }

    /// Appends a processor.
    pub fn push(&mut self, processor: Arc<dyn Processor>) {
        self.processors.push(processor);
    }

    /// Number of registered processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Returns true if no processor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Processor names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.processors.iter().map(|p| p.name()).collect()
    }

    /// Runs every processor and reports failures alongside the result.
    ///
    /// A failing processor's change is dropped and the next processor sees
    /// the text exactly as it stood before the failure.
    #[must_use]
    pub fn run(&self, content: &str) -> PipelineOutput {
        let mut current = content.to_string();
        let mut changed = false;
        let mut failures = Vec::new();

        for processor in &self.processors {
            match processor.process(&current) {
                Ok(out) => {
                    if out.changed {
                        trace!("{} changed the document", processor.name());
                    }
                    changed |= out.changed;
                    current = out.content;
                }
                Err(e) => {
                    warn!("Processor {} failed, keeping previous content: {e}", processor.name());
                    failures.push(e);
                }
            }
        }

        PipelineOutput {
            content: current,
            changed,
            failures,
        }
    }

    /// Runs every processor, returning the text and the changed flag.
    #[must_use]
    pub fn process(&self, content: &str) -> (String, bool) {
        let out = self.run(content);
        (out.content, out.changed)
    }
}

impl fmt::Debug for ProcessorPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorPipeline")
            .field("processors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Append(&'static str);

    impl Processor for Append {
        fn name(&self) -> &'static str {
            "append"
        }

        fn process(&self, content: &str) -> Result<Transformed> {
            Ok(Transformed::compare(content, format!("{content}{}", self.0)))
        }
    }

    struct Identity;

    impl Processor for Identity {
        fn name(&self) -> &'static str {
            "identity"
        }

        fn process(&self, content: &str) -> Result<Transformed> {
            Ok(Transformed::unchanged(content))
        }
    }

    struct Failing;

    impl Processor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn process(&self, _content: &str) -> Result<Transformed> {
            Err(Error::processor("failing", "bad rule"))
        }
    }

    #[test]
    fn test_processors_run_in_order() {
        let pipeline = ProcessorPipeline::new(vec![Arc::new(Append("a")), Arc::new(Append("b"))]);
        let (content, changed) = pipeline.process("x");

        assert_eq!(content, "xab");
        assert!(changed);
    }

    #[test]
    fn test_unchanged_when_no_processor_changes() {
        let pipeline = ProcessorPipeline::new(vec![Arc::new(Identity), Arc::new(Identity)]);
        let (content, changed) = pipeline.process("x");

        assert_eq!(content, "x");
        assert!(!changed);
    }

    #[test]
    fn test_failure_keeps_previous_content_and_continues() {
        let pipeline = ProcessorPipeline::new(vec![
            Arc::new(Append("a")),
            Arc::new(Failing),
            Arc::new(Append("b")),
        ]);
        let out = pipeline.run("x");

        assert_eq!(out.content, "xab");
        assert!(out.changed);
        assert_eq!(out.failures.len(), 1);
        assert!(out.failures[0].is_processor());
    }

    #[test]
    fn test_only_failures_is_unchanged() {
        let pipeline = ProcessorPipeline::new(vec![Arc::new(Failing)]);
        let out = pipeline.run("notes");

        assert_eq!(out.content, "notes");
        assert!(!out.changed);
        assert_eq!(out.failures.len(), 1);
    }

    #[test]
    fn test_prepend() {
        let base = ProcessorPipeline::new(vec![Arc::new(Append("b"))]);
        let pipeline = base.prepend(Arc::new(Append("a")));

        assert_eq!(pipeline.process("x").0, "xab");
        assert_eq!(base.len(), 1);
        assert_eq!(pipeline.names(), vec!["append", "append"]);
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = ProcessorPipeline::default();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.process("x"), ("x".to_string(), false));
    }
}
