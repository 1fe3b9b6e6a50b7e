//! fsharvest - index files by extension and mirror them by format.
//!
//! Usage:
//!   fsharvest index                      Build the cache and show statistics
//!   fsharvest find <NAME>                List directories holding NAME
//!   fsharvest save -f .pdf -d 0 -o DIR   Copy matching files into DIR
//!   fsharvest --help                     Show help
//!
//! Every command walks the system roots unless `--root LABEL=PATH` is given.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fsharvest_core::{HarvestConfig, HarvestError, Root, SearchConfig};
use fsharvest_index::CacheIndex;
use fsharvest_ops::{Harvester, SaveReport};
use fsharvest_scan::{FixedRoots, RootProvider, SystemRoots};

#[derive(Parser)]
#[command(
    name = "fsharvest",
    version,
    about = "Concurrent filesystem harvester",
    long_about = "fsharvest walks one or more filesystem roots on a bounded worker pool.\n\n\
                  It can index every file by extension for fast name lookups, or \
                  copy every file of the requested formats into a flattened mirror \
                  of its source tree."
)]
struct Cli {
    /// Root to walk, as LABEL=PATH (repeatable; defaults to the system roots)
    #[arg(short, long = "root", value_name = "LABEL=PATH", global = true)]
    roots: Vec<String>,

    /// Worker pool capacity (defaults to the number of CPUs)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// Print how long the operation took
    #[arg(short, long, global = true)]
    time: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the extension index and show a summary
    Index {
        /// Number of extensions to list
        #[arg(short = 'n', long, default_value = "20")]
        top: usize,

        /// Output format
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// List every directory containing a file with exactly this name
    Find {
        /// File name, including extension (case-sensitive)
        name: String,

        /// Output format
        #[arg(long, default_value = "text")]
        output: OutputFormat,
    },

    /// Copy files of the given formats into a mirrored tree
    Save {
        /// Extension to collect, e.g. ".pdf" or "PDF" (repeatable)
        #[arg(short, long = "format", value_name = "EXT")]
        formats: Vec<String>,

        /// Directory levels to descend below each root (0 = unlimited)
        #[arg(short, long, allow_negative_numbers = true)]
        depth: Option<i32>,

        /// Output directory
        #[arg(short, long, required_unless_present = "config")]
        out: Option<PathBuf>,

        /// TOML file with `formats`, `depth` and `output_root`; flags override it
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    if let Err(report) = run(cli) {
        // Harvest failures carry their own exit status.
        if let Some(err) = report.downcast_ref::<HarvestError>() {
            let code = err.status_code();
            eprintln!("Error: {report:#}");
            debug!(code, "Exiting with status code");
            std::process::exit(code);
        }
        return Err(report);
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let start = Instant::now();
    let mut harvester = build_harvester(&cli)?;

    match cli.command {
        Command::Index { top, output } => {
            let index = harvester.build_cache().context("Indexing failed")?;
            print_index(index, top, output)?;
        }
        Command::Find { name, output } => {
            let found = harvester
                .find_by_name(&name)
                .with_context(|| format!("Lookup of {name} failed"))?;
            print_found(&name, &found, output)?;
        }
        Command::Save {
            formats,
            depth,
            out,
            config,
        } => {
            let search = load_search_config(config, formats, depth, out)?;
            eprintln!(
                "Saving {} format(s) to {}...",
                search.formats.len(),
                search.output_root.display()
            );
            harvester.configure(search);
            let report = harvester.save().context("Save failed")?;
            print_save(&report);
        }
    }

    if cli.time {
        eprintln!("Finished in {}", format_duration(start.elapsed()));
    }

    Ok(())
}

/// Set up tracing on stderr so stdout stays machine-readable.
fn setup_logging(verbose: bool) -> Result<()> {
    let default = if verbose {
        "fsharvest=debug,warn"
    } else {
        "fsharvest=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn build_harvester(cli: &Cli) -> Result<Harvester> {
    let mut config = HarvestConfig::default();
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }

    let roots: Box<dyn RootProvider> = if cli.roots.is_empty() {
        Box::new(SystemRoots)
    } else {
        let roots = cli
            .roots
            .iter()
            .map(|arg| {
                Root::parse(arg)
                    .ok_or_else(|| eyre!("Invalid root '{arg}', expected LABEL=PATH"))
            })
            .collect::<Result<Vec<_>>>()?;
        Box::new(FixedRoots::new(roots))
    };

    let harvester = Harvester::new(config, roots)?;
    debug!(
        threads = harvester.pool().capacity(),
        cache_on_lookup = harvester.config().cache_on_lookup,
        "Harvester ready"
    );
    Ok(harvester)
}

/// Merge the optional config file with command-line overrides.
fn load_search_config(
    path: Option<PathBuf>,
    formats: Vec<String>,
    depth: Option<i32>,
    out: Option<PathBuf>,
) -> Result<SearchConfig> {
    let mut search = match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            SearchConfig::from_toml_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => SearchConfig::configure(Vec::<String>::new(), 0, PathBuf::new()),
    };

    if !formats.is_empty() {
        search.formats = formats.iter().collect();
    }
    if let Some(depth) = depth {
        search.depth = depth;
    }
    if let Some(out) = out {
        search.output_root = out;
    }

    Ok(search)
}

fn print_index(index: &CacheIndex, top_n: usize, format: OutputFormat) -> Result<()> {
    let stats = index.stats();
    let counts: Vec<_> = index.extension_counts().into_iter().take(top_n).collect();

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(60));
            println!(
                " {} files, {} extensions",
                stats.records, stats.extensions
            );
            println!(
                " {} directories listed, {} skipped",
                stats.walk.dirs_listed, stats.walk.dirs_skipped
            );
            println!(" Indexed in {}", format_duration(index.elapsed()));
            println!("{}", "─".repeat(60));
            println!();

            for count in &counts {
                println!("  {:<20} {:>10}", count.extension.as_str(), count.files);
            }

            let remaining = stats.extensions.saturating_sub(counts.len());
            if remaining > 0 {
                println!("  ... and {} more", remaining);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "files": stats.records,
                "extensions": stats.extensions,
                "dirs_listed": stats.walk.dirs_listed,
                "dirs_skipped": stats.walk.dirs_skipped,
                "elapsed_ms": index.elapsed().as_millis() as u64,
                "top": counts,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_found(name: &str, found: &[PathBuf], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if found.is_empty() {
                eprintln!("No file named {name}");
                return Ok(());
            }
            for dir in found {
                println!("{}", dir.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(found)?);
        }
    }

    Ok(())
}

fn print_save(report: &SaveReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} written ({}), {} failed",
        report.written,
        format_size(report.bytes_written),
        report.failed
    );
    println!(
        " {} staged, {} unreadable, source: {}",
        report.staged,
        report.read_failures,
        if report.from_cache { "cache" } else { "traversal" }
    );
    if let Some(walk) = report.walk {
        println!(
            " {} directories listed, {} skipped",
            walk.dirs_listed, walk.dirs_skipped
        );
    }
    println!("{}", "─".repeat(60));
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn format_duration(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}
