use crate::{
    config::Config,
    error::Result,
    file::{FileKind, SourceFile},
    pipeline::ProcessorPipeline,
    processor::{BlockResolver, DateHeader, LinkIndex, PageTitle, shared_pipeline},
    scanner::Scanner,
    vocabulary::TypeVocabulary,
    writer::Writer,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Statistics collected during a conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Journal files found
    pub journal_files: usize,

    /// Page files found
    pub page_files: usize,

    /// Files whose content was rewritten
    pub changed_files: usize,

    /// Journals written under a new name
    pub renamed_files: usize,

    /// Files excluded by the filter or with an unusable name
    pub skipped_files: usize,

    /// Files that could not be read or written
    pub failed_files: usize,

    /// Individual processor failures across all files
    pub processor_failures: usize,

    /// Block references collected from the workspace
    pub block_references: usize,

    /// Distinct tags converted to links
    pub tags: usize,

    /// Distinct page link targets
    pub backlinks: usize,

    /// Number of files written
    pub files_written: usize,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Output directory path
    pub output_directory: String,

    /// Total execution time
    pub duration: Duration,

    /// Time spent collecting block references
    pub collect_duration: Duration,

    /// Time spent converting and writing documents
    pub convert_duration: Duration,
}

impl ConversionStats {
    /// Total journal and page files found.
    #[must_use]
    pub const fn total_files(&self) -> usize {
        self.journal_files + self.page_files
    }

    /// Serializes the statistics as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            LogSeq → Reflect Conversion                ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!(
            "║ Files Found:          {:>8}                        ║",
            self.total_files()
        );
        println!(
            "║   - Journals:         {:>8}                        ║",
            self.journal_files
        );
        println!(
            "║   - Pages:            {:>8}                        ║",
            self.page_files
        );
        println!("║                                                       ║");
        println!(
            "║ Content Changed:      {:>8}                        ║",
            self.changed_files
        );
        println!(
            "║ Journals Renamed:     {:>8}                        ║",
            self.renamed_files
        );
        println!(
            "║ Skipped:              {:>8}                        ║",
            self.skipped_files
        );
        println!(
            "║ Failed:               {:>8}                        ║",
            self.failed_files
        );
        println!(
            "║ Processor Failures:   {:>8}                        ║",
            self.processor_failures
        );
        println!("║                                                       ║");
        println!(
            "║ Block References:     {:>8}                        ║",
            self.block_references
        );
        println!(
            "║ Tags:                 {:>8}                        ║",
            self.tags
        );
        println!(
            "║ Backlinks:            {:>8}                        ║",
            self.backlinks
        );
        println!("║                                                       ║");
        println!(
            "║ Files Written:        {:>8}                        ║",
            self.files_written
        );
        println!("║ Output Directory:                                     ║");
        println!(
            "║   {}                                              ║",
            self.output_directory
        );
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Collecting:       {:>8.2}s                     ║",
            self.collect_duration.as_secs_f64()
        );
        println!(
            "║   - Converting:       {:>8.2}s                     ║",
            self.convert_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        if self.dry_run {
            println!("║                                                       ║");
            println!("║ ⚠ No files were written (dry run mode)               ║");
        }
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Converts a LogSeq workspace into Reflect markdown.
pub struct Converter {
    config: Config,
    scanner: Scanner,
    writer: Writer,
}

impl Converter {
    /// Creates a new converter with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - File filter patterns are invalid
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let scanner = Scanner::new(&config)?;
        let writer = Writer::new(&config);

        Ok(Self {
            config,
            scanner,
            writer,
        })
    }

    /// Executes the conversion and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Scan**: Finds journal and page files below the workspace
    /// 2. **Collect**: Indexes every block id in `journals/` and `pages/`
    /// 3. **Convert**: Runs each document through its processor pipeline
    /// 4. **Write**: Persists documents and the link index
    ///
    /// Per-file failures are logged and counted; they do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace cannot be read or the output
    /// directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use logseq_reflect::{Config, Converter};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .workspace_dir("./notes")
    ///     .build()?;
    ///
    /// let stats = Converter::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(workspace = %self.config.workspace_dir.display()))]
    pub fn run(self) -> Result<ConversionStats> {
        let start_time = Instant::now();
        let mut stats = ConversionStats {
            dry_run: self.config.dry_run,
            output_directory: self.config.output_dir.display().to_string(),
            ..ConversionStats::default()
        };

        info!("Converting LogSeq workspace");
        info!("Output directory: {}", self.config.output_dir.display());

        info!("Stage 1/3: Scanning workspace...");
        let (files, scan_stats) = self.scanner.scan()?;
        stats.journal_files = scan_stats.journal_files;
        stats.page_files = scan_stats.page_files;
        stats.skipped_files = scan_stats.skipped_files;
        info!(
            "✓ Found {} journals and {} pages",
            stats.journal_files, stats.page_files
        );

        info!("Stage 2/3: Collecting block references...");
        let collect_start = Instant::now();
        let types = TypeVocabulary::load(&self.config.types_path);
        let mut resolver = BlockResolver::new(types.clone());
        stats.block_references = resolver.collect(&self.config.workspace_dir)?;

        let links = Arc::new(LinkIndex::new());
        for file in files.iter().filter(|f| f.kind == FileKind::Journal) {
            if let Ok(date) = file.journal_date() {
                links.register_journal_date(date);
            }
        }
        let pipeline = shared_pipeline(Arc::new(resolver), &links, &types);
        stats.collect_duration = collect_start.elapsed();
        info!(
            "✓ Collected {} block references in {:.2}s",
            stats.block_references,
            stats.collect_duration.as_secs_f64()
        );

        info!("Stage 3/3: Converting documents...");
        let convert_start = Instant::now();
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
        } else {
            self.writer.prepare()?;
        }

        for file in &files {
            self.convert_file(file, &pipeline, &mut stats);
        }

        stats.tags = links.tag_count();
        stats.backlinks = links.backlink_count();
        if self.config.write_link_index && !self.config.dry_run {
            match self.writer.write_link_index(&links) {
                Ok(()) => stats.files_written += 2,
                Err(e) => {
                    warn!("Failed to write link index: {e}");
                    stats.failed_files += 1;
                }
            }
        }
        stats.convert_duration = convert_start.elapsed();

        stats.duration = start_time.elapsed();
        info!(
            "✓ Converted {} files ({} changed, {} failed) in {:.2}s",
            stats.total_files(),
            stats.changed_files,
            stats.failed_files,
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }

    /// Converts one document, recording the outcome in `stats`.
    fn convert_file(&self, file: &SourceFile, shared: &ProcessorPipeline, stats: &mut ConversionStats) {
        let pipeline = match file.kind {
            FileKind::Journal => match file.journal_date() {
                Ok(date) => shared.prepend(Arc::new(DateHeader::new(date))),
                Err(e) => {
                    warn!("Skipping journal: {e}");
                    stats.skipped_files += 1;
                    return;
                }
            },
            FileKind::Page => shared.prepend(Arc::new(PageTitle::new(&file.relative_path))),
        };

        let output_relative = match file.output_relative_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping {}: {e}", file.relative_path.display());
                stats.skipped_files += 1;
                return;
            }
        };

        let content = match file.read() {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {e}", file.relative_path.display());
                stats.failed_files += 1;
                return;
            }
        };

        let out = pipeline.run(&content);
        stats.processor_failures += out.failures.len();
        if out.changed {
            stats.changed_files += 1;
        }

        let renamed = output_relative != file.relative_path;
        if renamed {
            stats.renamed_files += 1;
        }

        if self.config.dry_run {
            let target = self.writer.output_path(&output_relative);
            if renamed {
                info!("Would save to {} (renamed from {})", target.display(), file.file_name());
            } else {
                info!("Would save to {}", target.display());
            }
            return;
        }

        match self.writer.write_document(&output_relative, &out.content) {
            Ok(path) => {
                debug!("{} → {}", file.relative_path.display(), path.display());
                stats.files_written += 1;
            }
            Err(e) => {
                warn!("Failed to write {}: {e}", output_relative.display());
                stats.failed_files += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{BACKLINKS_FILE, TAGS_FILE};
    use assert_fs::prelude::*;
    use std::path::Path;

    fn create_workspace() -> assert_fs::TempDir {
        let temp = assert_fs::TempDir::new().unwrap();
        let notes = temp.child("notes");
        notes
            .child("pages/support.md")
            .write_str("# Support\n- Business hours\n  id:: abcd1234-5678-90ab-cdef-1234567890ab\n")
            .unwrap();
        notes
            .child("journals/2025_04_14.md")
            .write_str("- TODO call ((abcd1234-5678-90ab-cdef-1234567890ab)) #work\n")
            .unwrap();
        notes.child("journals/notes.md").write_str("- stray").unwrap();
        temp
    }

    fn create_test_config(root: &Path, dry_run: bool) -> Config {
        Config::builder()
            .workspace_dir(root.join("notes"))
            .output_dir(root.join("out"))
            .types_path(root.join("types.txt"))
            .dry_run(dry_run)
            .build()
            .unwrap()
    }

    #[test]
    fn test_converter_basic_execution() {
        let temp = create_workspace();
        let stats = Converter::new(create_test_config(temp.path(), false))
            .unwrap()
            .run()
            .unwrap();

        let out = temp.child("out");
        out.child("journals/2025-04-14.md").assert(
            "# Mon, April 14th, 2025\n\n- [ ] call _Business hours ([[Support]])_ [[/work/]]",
        );
        out.child("pages/support.md").assert("# Support\n- Business hours\n");
        out.child(BACKLINKS_FILE).assert("/work/\nSupport\n");
        out.child(TAGS_FILE).assert("work\n");
        assert!(!out.child("journals/notes.md").exists());

        assert_eq!(stats.journal_files, 2);
        assert_eq!(stats.page_files, 1);
        assert_eq!(stats.skipped_files, 1);
        assert_eq!(stats.renamed_files, 1);
        assert_eq!(stats.changed_files, 2);
        assert_eq!(stats.block_references, 1);
        assert_eq!(stats.files_written, 4);
        assert_eq!(stats.failed_files, 0);
        assert_eq!(stats.processor_failures, 0);
    }

    #[test]
    fn test_converter_dry_run() {
        let temp = create_workspace();
        let stats = Converter::new(create_test_config(temp.path(), true))
            .unwrap()
            .run()
            .unwrap();

        assert!(stats.dry_run);
        assert_eq!(stats.files_written, 0);
        assert_eq!(stats.changed_files, 2);
        assert!(!temp.child("out").exists());
    }

    #[test]
    fn test_converter_counts_unreadable_file() {
        let temp = create_workspace();
        temp.child("notes/pages/binary.md")
            .write_binary(&[0xff, 0xfe, 0xfd])
            .unwrap();

        let stats = Converter::new(create_test_config(temp.path(), false))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.files_written, 4);
    }

    #[test]
    fn test_converter_without_link_index() {
        let temp = create_workspace();
        let config = Config::builder()
            .workspace_dir(temp.path().join("notes"))
            .output_dir(temp.path().join("out"))
            .write_link_index(false)
            .build()
            .unwrap();

        let stats = Converter::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files_written, 2);
        assert!(!temp.child("out").child(BACKLINKS_FILE).exists());
    }

    #[test]
    fn test_converter_strips_type_prefix_in_links() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("types.txt").write_str("jira\n").unwrap();
        temp.child("notes/pages/jira___Improve X.md")
            .write_str("- Ticket body\n  id:: abcd1234-5678-90ab-cdef-1234567890ab\n")
            .unwrap();
        temp.child("notes/pages/index.md")
            .write_str("- See ((abcd1234-5678-90ab-cdef-1234567890ab))")
            .unwrap();

        Converter::new(create_test_config(temp.path(), false))
            .unwrap()
            .run()
            .unwrap();

        temp.child("out/pages/index.md")
            .assert("# Index\n\n- See _Ticket body ([[Improve X]])_");
    }

    #[test]
    fn test_stats_json() {
        let stats = ConversionStats {
            journal_files: 3,
            page_files: 2,
            ..ConversionStats::default()
        };

        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["journal_files"], 3);
        assert_eq!(stats.total_files(), 5);
    }
}
