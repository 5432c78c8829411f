#![forbid(unsafe_code)]
//! # character_logratio CLI
//!
//! Builds the year-by-word log-ratio matrix and its trend summary from one
//! or more character tables.
//!
//! ## Example
//! ```bash
//! cargo run --release -- --lexicon PersonalNames.txt --metadata meta.csv \
//!     --out new_bio_logratio chars_pre23.tsv chars_post23.tsv
//! ```
//!
//! See `--help` for all available options.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use character_logratio::{PipelineOptions, run};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Tab-separated character tables (charid, words, chargender, pubdate, authgender or docid)
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Number of most frequent words kept as the vocabulary
    #[arg(long, default_value_t = 6000)]
    vocab_size: usize,

    /// Characters drawn with replacement per (year, author gender) cell
    #[arg(long, default_value_t = 3000)]
    sample_size: usize,

    /// Comma-separated table mapping docid to authgender
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Personal names to keep out of the vocabulary (one per line)
    #[arg(long)]
    lexicon: PathBuf,

    /// Base name of the output files; existing outputs are never overwritten
    #[arg(long)]
    out: String,

    /// Directory the outputs are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Seed for resampling; drawn at random and recorded in the manifest if omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the Dunning, rank, weighted-rank and proportion-difference matrices
    #[arg(long, default_value_t = false)]
    extra_contrasts: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let opts = PipelineOptions {
        vocab_size: cli.vocab_size,
        sample_size: cli.sample_size,
        seed: cli.seed,
        lexicon: cli.lexicon,
        metadata: cli.metadata,
        sources: cli.sources,
        out_dir: cli.out_dir,
        out_name: cli.out,
        extra_contrasts: cli.extra_contrasts,
    };

    match run(&opts) {
        Ok(report) => {
            println!(
                "Wrote {} years x {} words to {} (seed {})",
                report.analysis.log_ratio.rows().count(),
                report.analysis.vocabulary.len(),
                report.paths.matrix.display(),
                report.manifest.seed
            );
            if !report.manifest.missing_sources.is_empty() {
                eprintln!("Skipped missing sources:");
                for s in &report.manifest.missing_sources {
                    eprintln!("  {s}");
                }
            }
        }
        Err(e) => {
            error!("Error: {e:#}");
            process::exit(1);
        }
    }
}
