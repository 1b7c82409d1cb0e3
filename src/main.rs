//! SnapDiff - a regression-testing engine for columnar before/after snapshots
//!
//! Walks two directory trees, pairs files by relative path, and runs the
//! comparison pipeline (`snapdiff::orchestrator`) against every pair in
//! parallel via the crate's own directory-level driver. Ported from the
//! original tool's own CLI idiom: `clap`
//! subcommands, `rayon`-parallel scheduling, `comfy-table` summaries,
//! `indicatif` progress bars.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use snapdiff::config::load_config;
use snapdiff::model::{Config, Rules};
use snapdiff::result_log::last_status_per_pair;
use snapdiff::{run_directory_comparison, PairRunResult, ProgressReporter};
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "SnapDiff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every matching file under two directory trees
    Compare {
        /// Directory holding the "before" snapshot
        before: PathBuf,

        /// Directory holding the "after" snapshot
        after: PathBuf,

        /// Path to a TOML config file (key_uniqueness_threshold,
        /// datetime_parse_threshold, fuzzy_match_threshold)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Absolute floating-point tolerance for the precise comparator
        #[arg(long, default_value = "0.0")]
        float_tolerance: f64,

        /// Columns to drop from both sides before comparing (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ignore_columns: Vec<String>,

        /// Skip the checksum fast path and always fall through to the
        /// precise (or fuzzy) comparator
        #[arg(long)]
        skip_checksum: bool,

        /// Directory to write one Markdown report per pair into
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Append each pair's verdict to this JSONL result log
        #[arg(long)]
        result_log: Option<PathBuf>,

        /// Skip pairs already logged as IDENTICAL* in --result-log
        #[arg(long)]
        skip_known_identical: bool,

        /// Verbose per-pair output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            before,
            after,
            config,
            float_tolerance,
            ignore_columns,
            skip_checksum,
            report_dir,
            result_log,
            skip_known_identical,
            verbose,
        } => run_compare(
            &before,
            &after,
            config.as_deref(),
            float_tolerance,
            ignore_columns,
            skip_checksum,
            report_dir.as_deref(),
            result_log.as_deref(),
            skip_known_identical,
            verbose,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_compare(
    before: &std::path::Path,
    after: &std::path::Path,
    config_path: Option<&std::path::Path>,
    float_tolerance: f64,
    ignore_columns: Vec<String>,
    skip_checksum: bool,
    report_dir: Option<&std::path::Path>,
    result_log: Option<&std::path::Path>,
    skip_known_identical: bool,
    verbose: bool,
) -> Result<()> {
    println!("{}", style("SnapDiff").cyan().bold());
    println!("{}", style("═".repeat(60)).dim());

    let config = match config_path {
        Some(path) => load_config(path).with_context(|| format!("failed to load config at {}", path.display()))?,
        None => Config::default(),
    };
    let rules = Rules {
        float_tolerance,
        ignore_columns: ignore_columns.into_iter().collect::<HashSet<_>>(),
    };

    if skip_known_identical {
        if let Some(log_path) = result_log {
            let known = last_status_per_pair(log_path).unwrap_or_default();
            let already_identical = known.values().filter(|e| e.status.starts_with("IDENTICAL") || e.status.starts_with("FUZZY_IDENTICAL")).count();
            if already_identical > 0 {
                println!(
                    "  {} {} pairs already known identical in the result log",
                    style("i").dim(),
                    already_identical
                );
            }
        }
    }

    println!("\n{} Comparing pairs...", style("[1/1]").bold());
    let pb = create_progress_bar_placeholder();
    let reporter = IndicatifReporter { bar: pb };

    let results = run_directory_comparison(
        before,
        after,
        &config,
        &rules,
        skip_checksum,
        report_dir,
        result_log,
        Some(&reporter),
    )?;

    reporter.bar.finish_with_message("Done");

    println!("\n{}", style("Results Summary").cyan().bold());
    println!("{}", style("─".repeat(60)).dim());
    display_summary_table(&results);

    if verbose && !results.is_empty() {
        println!("\n{}", style("Comparison Details").cyan().bold());
        println!("{}", style("─".repeat(60)).dim());
        display_results_table(&results);
    }

    println!("\n{} Complete", style("✓").green().bold());
    Ok(())
}

struct IndicatifReporter {
    bar: ProgressBar,
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, total: u64, message: &str) {
        self.bar.set_length(total);
        self.bar.set_message(message.to_string());
    }
    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }
    fn finish(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }
}

fn create_progress_bar_placeholder() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("invalid progress bar template")
            .progress_chars("█▓░"),
    );
    pb
}

fn display_summary_table(results: &[PairRunResult]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Count").fg(Color::Cyan),
    ]);

    let total = results.len();
    let identical = results.iter().filter(|r| r.outcome.result.is_identical()).count();
    let differences = results
        .iter()
        .filter(|r| r.outcome.result.status_str.ends_with("DIFFERENCES_FOUND"))
        .count();
    let read_errors = results.iter().filter(|r| r.outcome.result.status_str == "READ_ERROR").count();

    table.add_row(vec![Cell::new("Pairs compared"), Cell::new(total)]);
    table.add_row(vec![Cell::new("Identical").fg(Color::Green), Cell::new(identical).fg(Color::Green)]);
    table.add_row(vec![Cell::new("Differences found").fg(Color::Yellow), Cell::new(differences).fg(Color::Yellow)]);
    table.add_row(vec![Cell::new("Read errors").fg(Color::Red), Cell::new(read_errors).fg(Color::Red)]);

    println!("{table}");
}

fn display_results_table(results: &[PairRunResult]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).apply_modifier(UTF8_ROUND_CORNERS);
    table.set_header(vec![
        Cell::new("Pair").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Report").fg(Color::Cyan),
    ]);

    for result in results {
        let status_color = if result.outcome.result.is_identical() {
            Color::Green
        } else if result.outcome.result.status_str == "READ_ERROR" {
            Color::Red
        } else {
            Color::Yellow
        };

        table.add_row(vec![
            Cell::new(result.pair.relative_path.display().to_string()),
            Cell::new(&result.outcome.result.status_str).fg(status_color),
            Cell::new(result.outcome.result.report_path.clone().unwrap_or_default()),
        ]);
    }

    println!("{table}");
}
