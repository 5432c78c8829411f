//! # character_logratio
//!
//! Measures how the words attached to fictional characters differ between
//! female and male authors, year by year, over 1780–2007.
//!
//! The pipeline ingests character tables into a (year, author gender) grid,
//! resamples an equal number of characters per cell, fixes a frequency
//! ranked vocabulary, counts words per cell and contrasts the female and
//! male counts. The primary result is a year-by-word matrix of
//! Laplace-smoothed log-ratios plus a per-word trend summary.
//!
//! ## Example
//! ```no_run
//! use character_logratio::{PipelineOptions, run};
//! use std::path::PathBuf;
//!
//! let opts = PipelineOptions {
//!     lexicon: PathBuf::from("PersonalNames.txt"),
//!     sources: vec![PathBuf::from("characters.tsv")],
//!     out_name: "logratio".into(),
//!     seed: Some(1),
//!     ..PipelineOptions::default()
//! };
//! let report = run(&opts).unwrap();
//! println!("{} words", report.analysis.vocabulary.len());
//! ```

pub mod contrast;
pub mod export;
pub mod grid;
pub mod ingest;
pub mod lexicon;
pub mod pipeline;
pub mod resample;
pub mod trend;
pub mod vectorize;
pub mod vocab;
pub mod years;

pub use contrast::{ContrastMatrix, dunning, log_ratio, proportion_difference, rank_transform};
pub use export::{MatrixFile, OutputPaths, read_matrix};
pub use grid::{CharacterRow, Grid, GridBuilder, RowOutcome};
pub use lexicon::NameLexicon;
pub use pipeline::{Analysis, PipelineOptions, RunReport, analyze, run};
pub use resample::{Resampler, Selection};
pub use trend::{TrendFit, WordTrend};
pub use vectorize::{CountTable, CountVector};
pub use vocab::Vocabulary;
