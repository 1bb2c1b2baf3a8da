//! `reelbeam` command line.
//!
//! ```sh
//! reelbeam run --input wiki_movie_plots_deduped.csv --rows 500
//! reelbeam --parallel query space love war --top 5 --save
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reelbeam::logging::{Verbosity, init_subscriber};
use reelbeam::{ExecMode, PipelineConfig, Session, ValidationProfile, WriteMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reelbeam", version, about = "Movie-plot ETL and keyword search")]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root for the store, the validation report and saved query results.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Run stages on the parallel engine.
    #[arg(long, global = true)]
    parallel: bool,

    /// Worker threads for the parallel engine (implies --parallel).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform, validate and store the source file.
    Run {
        /// Source CSV (optionally .gz / .zst).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Read at most this many rows.
        #[arg(long)]
        rows: Option<usize>,

        #[arg(long)]
        min_plot_words: Option<u32>,

        #[arg(long)]
        min_rows: Option<usize>,

        #[arg(long, value_enum)]
        validation: Option<ProfileArg>,

        /// Keep partitions of decades absent from this run.
        #[arg(long)]
        keep_partitions: bool,
    },
    /// Search stored plots for one or more keywords.
    Query {
        #[arg(required = true)]
        keywords: Vec<String>,

        /// Results per keyword.
        #[arg(long)]
        top: Option<usize>,

        /// Write `query_<keyword>.json` into the output directory.
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProfileArg {
    Exact,
    Scaled,
}

impl From<ProfileArg> for ValidationProfile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Exact => Self::Exact,
            ProfileArg::Scaled => Self::Scaled,
        }
    }
}

fn base_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.output_dir {
        cfg.output_dir.clone_from(dir);
    }
    if cli.parallel || cli.threads.is_some() {
        let partitions = match cfg.mode {
            ExecMode::Parallel { partitions, .. } => partitions,
            ExecMode::Sequential => None,
        };
        let threads = cli.threads.or(match cfg.mode {
            ExecMode::Parallel { threads, .. } => threads,
            ExecMode::Sequential => None,
        });
        cfg.mode = ExecMode::Parallel {
            threads,
            partitions,
        };
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color)?;
    let mut cfg = base_config(&cli)?;

    match cli.command {
        Command::Run {
            input,
            rows,
            min_plot_words,
            min_rows,
            validation,
            keep_partitions,
        } => {
            if let Some(input) = input {
                cfg.input = input;
            }
            cfg.row_limit = rows.or(cfg.row_limit);
            cfg.min_plot_words = min_plot_words.unwrap_or(cfg.min_plot_words);
            cfg.min_rows = min_rows.unwrap_or(cfg.min_rows);
            if let Some(p) = validation {
                cfg.validation = Some(p.into());
            }
            if keep_partitions {
                cfg.write_mode = WriteMode::OverwritePartitions;
            }

            let session = Session::new(cfg)?;
            let summary = session.run()?;
            println!(
                "ingested {} rows, kept {} after transform",
                summary.rows_ingested, summary.rows_after_transform
            );
            for (name, outcome) in &summary.report.checks {
                let mark = if outcome.passed { "PASS" } else { "FAIL" };
                println!("  [{mark}] {name}: {}", outcome.description);
            }
            for p in &summary.partitions {
                println!("  {} rows -> {}", p.rows, p.path.display());
            }
            println!(
                "validation report: {}",
                session.config().report_path().display()
            );
        }
        Command::Query {
            keywords,
            top,
            save,
        } => {
            cfg.top_n = top.unwrap_or(cfg.top_n);
            let session = Session::new(cfg)?;
            let engine = session.query_engine()?;
            for keyword in &keywords {
                let result = engine.search(keyword, session.config().top_n);
                print!("{}", result.render());
                if save {
                    let path = result.save_json(&session.config().output_dir)?;
                    println!("saved {}", path.display());
                }
                println!();
            }
        }
    }
    Ok(())
}
