use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::XrefConfig;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use xref_context::ContextSelector;
use xref_graph::CallGraphEngine;
use xref_index::Index;
use xref_program::{FunctionRecord, GoLoader, Program, ProgramLoader, SourceCache};

mod config;
mod scan;

#[derive(Parser)]
#[command(name = "xref")]
#[command(about = "Call graphs and context references for Go codebases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// TOML config file (default: <ROOT>/.xref.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe every function as one JSON line
    Scan(ScanArgs),

    /// List callers of a function
    Callers(QueryArgs),

    /// List callees of a function
    Callees(QueryArgs),

    /// Select context references for a function
    Refs(RefsArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Module root (directory containing go.mod)
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Write JSONL here instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long)]
    max_callers: Option<usize>,

    #[arg(long)]
    max_callees: Option<usize>,

    /// References per function (capped at 8)
    #[arg(long)]
    max_refs: Option<usize>,

    /// Lines per reference excerpt (capped at 120)
    #[arg(long)]
    max_lines: Option<usize>,

    /// Add counterpart methods (Open/Close, Get/Set, ...) to context refs
    #[arg(long)]
    counterparts: bool,

    /// Include unexported functions
    #[arg(long)]
    include_private: bool,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Repo-relative file declaring the function
    #[arg(long)]
    file: String,

    /// `Name`, `(T).Name` or `(*T).Name`
    #[arg(long)]
    symbol: String,

    /// Maximum edges (defaults to the configured caller/callee limit)
    #[arg(long)]
    max: Option<usize>,
}

#[derive(Args)]
struct RefsArgs {
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Repo-relative file declaring the method
    #[arg(long)]
    file: String,

    /// Bare method name
    #[arg(long)]
    name: String,

    /// Parenthesized receiver, e.g. "(*T)"
    #[arg(long)]
    recv: Option<String>,

    #[arg(long)]
    max_refs: Option<usize>,

    #[arg(long)]
    max_lines: Option<usize>,

    #[arg(long)]
    counterparts: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Scan(args) => run_scan(args, cli.config.as_deref()),
        Commands::Callers(args) => run_query(args, cli.config.as_deref(), Direction::Callers),
        Commands::Callees(args) => run_query(args, cli.config.as_deref(), Direction::Callees),
        Commands::Refs(args) => run_refs(args, cli.config.as_deref()),
    }
}

/// Load the program once; every failure degrades to "no program"
fn load_program(root: &Path) -> Option<Arc<Program>> {
    match GoLoader::new().load(root) {
        Ok(Some(program)) => Some(Arc::new(program)),
        Ok(None) => {
            log::info!("No go.mod under {}, nothing to analyze", root.display());
            None
        }
        Err(e) => {
            log::warn!("Failed to load program under {}: {e}", root.display());
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_scan(args: ScanArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = XrefConfig::load(config_path, &args.root)?;
    if let Some(max) = args.max_callers {
        config.max_callers = max;
    }
    if let Some(max) = args.max_callees {
        config.max_callees = max;
    }
    if let Some(max) = args.max_refs {
        config.context_refs.max_refs = max;
    }
    if let Some(max) = args.max_lines {
        config.context_refs.max_lines = max;
    }
    if args.counterparts {
        config.enable_counterparts();
    }
    config.include_private |= args.include_private;

    let entries = match load_program(&args.root) {
        Some(program) => scan::scan(program, &config),
        None => Vec::new(),
    };

    match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            scan::write_jsonl(&entries, BufWriter::new(file))?;
            log::info!("Wrote {} records to {}", entries.len(), path.display());
        }
        None => {
            let stdout = io::stdout();
            scan::write_jsonl(&entries, BufWriter::new(stdout.lock()))?;
        }
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Direction {
    Callers,
    Callees,
}

fn run_query(args: QueryArgs, config_path: Option<&Path>, direction: Direction) -> Result<()> {
    let config = XrefConfig::load(config_path, &args.root)?;

    let engine = CallGraphEngine::new();
    if let Err(e) = engine.init(&args.root) {
        // advisory: the engine is ready with empty graphs
        log::warn!("Call graph unavailable: {e}");
    }

    let edges = match direction {
        Direction::Callers => engine.get_callers(
            &args.file,
            &args.symbol,
            args.max.unwrap_or(config.max_callers),
        ),
        Direction::Callees => engine.get_callees(
            &args.file,
            &args.symbol,
            args.max.unwrap_or(config.max_callees),
        ),
    };
    print_json(&edges)
}

fn run_refs(args: RefsArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = XrefConfig::load(config_path, &args.root)?;
    if let Some(max) = args.max_refs {
        config.context_refs.max_refs = max;
    }
    if let Some(max) = args.max_lines {
        config.context_refs.max_lines = max;
    }
    if args.counterparts {
        config.enable_counterparts();
    }

    let (index, source) = match load_program(&args.root) {
        Some(program) => (
            Index::build(Arc::clone(&program)),
            SourceCache::from_program(&program),
        ),
        None => (Index::empty(), SourceCache::new()),
    };
    let selector = ContextSelector::new(config.context_refs, Arc::new(index), source);

    let record = FunctionRecord::new(args.file, args.name, args.recv);
    let refs = selector.select(&record);
    print_json(&refs)?;
    io::stdout().flush()?;
    Ok(())
}
