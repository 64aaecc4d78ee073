//! memdiff command-line tool.
//!
//! Reads files fully into memory and runs them through the memdiff core:
//! unified diffs, three- and four-way merges, and generation / validation of
//! the TOML configuration file.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use memdiff_core::config::{EngineConfig, IgnoreSpace};
use memdiff_core::output::{diff_label, write_index_header, Revision};
use memdiff_core::DiffEngine;

/// Default configuration file looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "memdiff.toml";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// In-memory line diff and merge.
#[derive(Parser, Debug)]
#[command(
    name = "memdiff",
    version,
    about = "Line-based unified diffs and three/four-way merges"
)]
struct Cli {
    /// Path to the TOML configuration file (default: ./memdiff.toml if present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a unified diff of two files.
    Diff(DiffArgs),

    /// Merge the changes from ORIGINAL to LATEST into MODIFIED.
    Merge(MergeArgs),

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./memdiff.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Args, Debug)]
struct CompareFlags {
    /// Treat runs of whitespace as a single space.
    #[arg(short = 'b', long, conflicts_with = "ignore_all_space")]
    ignore_space_change: bool,

    /// Ignore all whitespace.
    #[arg(short = 'w', long)]
    ignore_all_space: bool,

    /// Treat all line terminators as equal.
    #[arg(long)]
    ignore_eol_style: bool,

    /// Ignore a missing newline on the last line.
    #[arg(long)]
    ignore_eol_at_eof: bool,
}

#[derive(Args, Debug)]
struct DiffArgs {
    original: PathBuf,
    modified: PathBuf,

    /// Lines of context around each change.
    #[arg(short = 'U', long = "unified", value_name = "N")]
    context: Option<usize>,

    /// Header label; give twice for the original and modified side.
    #[arg(short = 'L', long = "label", value_name = "LABEL")]
    labels: Vec<String>,

    /// Label the original side with this revision and the modified side
    /// as the working copy.
    #[arg(short, long, value_name = "REV", conflicts_with = "labels")]
    revision: Option<u64>,

    /// Precede the diff with an `Index:` header for PATH.
    #[arg(long, value_name = "PATH")]
    index: Option<String>,

    #[command(flatten)]
    compare: CompareFlags,
}

#[derive(Args, Debug)]
struct MergeArgs {
    original: PathBuf,
    modified: PathBuf,
    latest: PathBuf,

    /// Common ancestor of ORIGINAL and MODIFIED.
    #[arg(long, value_name = "PATH")]
    ancestor: Option<PathBuf>,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include the original text inside conflicts.
    #[arg(long)]
    show_original: bool,

    /// Narrow conflicts to the lines that really differ.
    #[arg(long)]
    resolve_conflicts: bool,

    #[arg(long, value_name = "TEXT")]
    marker_modified: Option<String>,

    #[arg(long, value_name = "TEXT")]
    marker_original: Option<String>,

    #[arg(long, value_name = "TEXT")]
    marker_separator: Option<String>,

    #[arg(long, value_name = "TEXT")]
    marker_latest: Option<String>,

    #[command(flatten)]
    compare: CompareFlags,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output).map(|()| ExitCode::SUCCESS),
        Commands::Validate => {
            let path = cli
                .config
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            cmd_validate(&path).map(|()| ExitCode::SUCCESS)
        }
        Commands::Diff(args) => {
            let config = load_config(cli.config.as_deref())?;
            cmd_diff(config, args).map(|()| ExitCode::SUCCESS)
        }
        Commands::Merge(args) => {
            let config = load_config(cli.config.as_deref())?;
            let conflicted = cmd_merge(config, args)?;
            Ok(if conflicted {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                debug!("no configuration file, using defaults");
                return Ok(EngineConfig::default());
            }
            default
        }
    };

    EngineConfig::load_and_validate(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn apply_compare_flags(config: &mut EngineConfig, flags: &CompareFlags) {
    if flags.ignore_space_change {
        config.diff.ignore_space = IgnoreSpace::Change;
    }
    if flags.ignore_all_space {
        config.diff.ignore_space = IgnoreSpace::All;
    }
    config.diff.ignore_eol_style |= flags.ignore_eol_style;
    config.diff.ignore_eol_at_eof |= flags.ignore_eol_at_eof;
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_diff(mut config: EngineConfig, args: DiffArgs) -> Result<()> {
    apply_compare_flags(&mut config, &args.compare);
    if let Some(context) = args.context {
        config.unified.context_size = context;
    }
    if args.labels.len() > 2 {
        anyhow::bail!("at most two labels may be given, got {}", args.labels.len());
    }

    let original = read_input(&args.original)?;
    let modified = read_input(&args.modified)?;

    let (original_label, modified_label) = header_labels(&args);
    let engine = DiffEngine::new(config).context("invalid diff options")?;

    let mut out = std::io::stdout().lock();
    let mut diff = Vec::new();
    let changed = engine
        .write_unified(&mut diff, &original, &modified, &original_label, &modified_label)
        .context("failed to produce unified diff")?;

    if changed {
        if let Some(index) = &args.index {
            write_index_header(&mut out, engine.config().unified.header_encoding, index)
                .context("failed to write index header")?;
        }
        out.write_all(&diff).context("failed to write diff")?;
    }
    out.flush().context("failed to flush output")?;
    Ok(())
}

fn header_labels(args: &DiffArgs) -> (String, String) {
    let original = args.original.display().to_string();
    let modified = args.modified.display().to_string();

    if let Some(rev) = args.revision {
        return (
            diff_label(&original, Revision::Number(rev)),
            diff_label(&modified, Revision::WorkingCopy),
        );
    }

    let mut labels = args.labels.iter().cloned();
    (
        labels.next().unwrap_or(original),
        labels.next().unwrap_or(modified),
    )
}

/// Returns whether conflicts remain in the output.
fn cmd_merge(mut config: EngineConfig, args: MergeArgs) -> Result<bool> {
    apply_compare_flags(&mut config, &args.compare);
    let merge = &mut config.merge;
    merge.show_original_in_conflict |= args.show_original;
    merge.resolve_conflicts |= args.resolve_conflicts;
    for (slot, value) in [
        (&mut merge.markers.modified, args.marker_modified),
        (&mut merge.markers.original, args.marker_original),
        (&mut merge.markers.separator, args.marker_separator),
        (&mut merge.markers.latest, args.marker_latest),
    ] {
        if value.is_some() {
            *slot = value;
        }
    }

    let engine = DiffEngine::new(config).context("invalid merge options")?;

    let original = read_input(&args.original)?;
    let modified = read_input(&args.modified)?;
    let latest = read_input(&args.latest)?;

    let outcome = match &args.ancestor {
        Some(ancestor) => {
            let ancestor = read_input(ancestor)?;
            engine.merge_with_ancestor(&original, &modified, &latest, &ancestor)
        }
        None => engine.merge(&original, &modified, &latest),
    }
    .context("merge failed")?;

    match &args.output {
        Some(path) => std::fs::write(path, &outcome.content)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(&outcome.content)
                .and_then(|()| out.flush())
                .context("failed to write merge result")?;
        }
    }

    if outcome.has_conflicts() {
        let lines: Vec<String> = outcome
            .summary
            .conflicts
            .iter()
            .map(|c| format!("{}-{}", c.start_line, c.end_line))
            .collect();
        eprintln!(
            "{} conflict(s) at lines {}",
            outcome.summary.conflicts.len(),
            lines.join(", ")
        );
        return Ok(true);
    }
    Ok(false)
}

fn cmd_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    let body = EngineConfig::default()
        .to_toml()
        .context("failed to serialize default configuration")?;
    let contents = format!(
        "# memdiff configuration\n\
         # ignore_space: \"none\", \"change\" or \"all\"\n\
         # header_encoding / marker_encoding: \"utf-8\", \"iso-8859-1\" or \"us-ascii\"\n\n\
         {body}"
    );
    std::fs::write(output, contents).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Validate with: memdiff validate --config {}", output.display());

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        EngineConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All values are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let markers = &config.merge.markers;
    println!();
    println!("Configuration summary:");
    println!("  Ignore space     : {:?}", config.diff.ignore_space);
    println!("  Ignore EOL style : {}", config.diff.ignore_eol_style);
    println!("  Ignore EOL at EOF: {}", config.diff.ignore_eol_at_eof);
    println!("  Context lines    : {}", config.unified.context_size);
    println!("  Header encoding  : {}", config.unified.header_encoding);
    println!("  Marker encoding  : {}", config.merge.marker_encoding);
    println!("  Show original    : {}", config.merge.show_original_in_conflict);
    println!("  Resolve conflicts: {}", config.merge.resolve_conflicts);
    println!(
        "  Markers          : {} / {} / {} / {}",
        markers.modified(),
        markers.original(),
        markers.separator(),
        markers.latest()
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}
