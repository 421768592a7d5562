use anyhow::Context;
use clap::Parser;
use logseq_reflect::{Config, Converter, DEFAULT_TYPES_PATH};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "logseq-reflect",
    version,
    author,
    about = "Convert a LogSeq workspace into Reflect markdown",
    long_about = "Convert a LogSeq workspace into markdown that Reflect can import.\n\n\
    This tool reads every journal and page below the workspace, resolves block \
    references, renames journals to YYYY-MM-DD.md and rewrites LogSeq-only syntax \
    (tasks, properties, admonitions, tags) into Reflect markdown.\n\n\
    USAGE EXAMPLES:\n  \
      # Convert the current directory\n  \
      logseq-reflect\n\n  \
      # Convert a workspace into a chosen directory\n  \
      logseq-reflect --workspace ./notes --output-dir ./notes-reflect\n\n  \
      # Preview the changes without writing anything\n  \
      logseq-reflect --workspace ./notes --dry-run\n\n  \
      # Strip type prefixes listed in a custom vocabulary\n  \
      logseq-reflect --types-path ./types.txt --json"
)]
struct Cli {
    /// LogSeq workspace holding journals/ and pages/
    #[arg(short, long, default_value = ".", value_name = "PATH")]
    workspace: PathBuf,

    /// Output directory [default: "<workspace> (Reflect format)" next to the workspace]
    #[arg(short, long, value_name = "PATH")]
    output_dir: Option<PathBuf>,

    /// File with one type prefix per line, stripped from page links
    #[arg(
        long,
        env = "LOGSEQ2REFLECT_TYPES_PATH",
        default_value = DEFAULT_TYPES_PATH,
        value_name = "FILE"
    )]
    types_path: PathBuf,

    /// Dry run (don't write files)
    #[arg(long)]
    dry_run: bool,

    /// Back up output files before overwriting them
    #[arg(long)]
    backup: bool,

    /// Don't write backlinks.txt and tags.txt
    #[arg(long)]
    no_link_index: bool,

    /// Print run statistics as JSON instead of the summary table
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    let mut builder = Config::builder()
        .workspace_dir(cli.workspace)
        .types_path(cli.types_path)
        .dry_run(cli.dry_run)
        .backup_existing(cli.backup)
        .write_link_index(!cli.no_link_index);

    if let Some(output_dir) = cli.output_dir {
        builder = builder.output_dir(output_dir);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = Converter::new(config)
        .context("Failed to create converter")?
        .run()
        .context("Conversion failed")?;

    if cli.json {
        println!("{}", stats.to_json().context("Failed to encode statistics")?);
    } else {
        stats.print_summary();
        if stats.dry_run {
            println!("Run without --dry-run to apply these changes.");
        }
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("logseq_reflect=info"),
        1 => EnvFilter::new("logseq_reflect=debug"),
        _ => EnvFilter::new("logseq_reflect=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .init();

    Ok(())
}
