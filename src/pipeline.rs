//! Orchestration: runs the stages in dependency order and writes the results.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use log::{info, warn};
use serde::Serialize;

use crate::contrast::{
    ContrastMatrix, dunning_matrix, log_ratio_matrix, proportion_difference_matrix, rank_matrices,
};
use crate::export::{OutputPaths, StagedFiles, write_gender_sums, write_matrix, write_trends};
use crate::grid::{Grid, GridBuilder, IngestStats};
use crate::ingest::{AuthorMetadata, partition_sources, read_source};
use crate::lexicon::NameLexicon;
use crate::resample::{DEFAULT_SAMPLE_SIZE, Resampler, Selection};
use crate::trend::{WordTrend, summarize};
use crate::vectorize::{CountTable, GenderSums, gender_sums};
use crate::vocab::{DEFAULT_VOCAB_SIZE, Vocabulary};

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub vocab_size: usize,
    pub sample_size: usize,
    /// Drawn at random and recorded in the manifest when absent.
    pub seed: Option<u64>,
    pub lexicon: PathBuf,
    pub metadata: Option<PathBuf>,
    pub sources: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub out_name: String,
    /// Also write the Dunning, rank, weighted-rank and proportion matrices.
    pub extra_contrasts: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            vocab_size: DEFAULT_VOCAB_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
            seed: None,
            lexicon: PathBuf::new(),
            metadata: None,
            sources: Vec::new(),
            out_dir: PathBuf::from("."),
            out_name: String::new(),
            extra_contrasts: false,
        }
    }
}

impl PipelineOptions {
    pub fn validate(&self) -> Result<()> {
        if self.vocab_size == 0 {
            bail!("vocabulary size must be a positive integer");
        }
        if self.sample_size == 0 {
            bail!("sample size must be a positive integer");
        }
        if self.out_name.is_empty() {
            bail!("an output name is required");
        }
        if self.out_name.contains(['/', '\\']) {
            bail!("output name {:?} must not contain a path separator", self.out_name);
        }
        if self.sources.is_empty() {
            bail!("at least one source file is required");
        }
        Ok(())
    }

    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths::new(&self.out_dir, &self.out_name, self.extra_contrasts)
    }
}

/// The four secondary contrast matrices.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraContrasts {
    pub dunning: ContrastMatrix,
    pub rank: ContrastMatrix,
    pub weighted_rank: ContrastMatrix,
    pub proportion_difference: ContrastMatrix,
}

impl ExtraContrasts {
    pub fn compute(counts: &CountTable) -> Self {
        let (weighted_rank, rank) = rank_matrices(counts);
        ExtraContrasts {
            dunning: dunning_matrix(counts),
            rank,
            weighted_rank,
            proportion_difference: proportion_difference_matrix(counts),
        }
    }

    /// In the same order as [`crate::export::EXTRA_SUFFIXES`].
    pub fn matrices(&self) -> [&ContrastMatrix; 4] {
        [
            &self.dunning,
            &self.rank,
            &self.weighted_rank,
            &self.proportion_difference,
        ]
    }
}

/// In-memory result of the statistical stages.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub seed: u64,
    pub selection: Selection,
    pub vocabulary: Vocabulary,
    pub gender_sums: Vec<GenderSums>,
    pub extras: Option<ExtraContrasts>,
    pub log_ratio: ContrastMatrix,
    pub trends: Vec<WordTrend>,
}

/// Resample, build the vocabulary, count, contrast and summarize.
pub fn analyze(
    grid: &Grid,
    lexicon: &NameLexicon,
    vocab_size: usize,
    sample_size: usize,
    seed: u64,
    extra_contrasts: bool,
) -> Analysis {
    let selection = Resampler::seeded(seed, sample_size).select(grid);
    info!("Characters selected");

    let vocabulary = Vocabulary::build(&selection, grid, lexicon, vocab_size);
    let counts = CountTable::build(&selection, grid, &vocabulary);
    let gender_sums = gender_sums(&selection, grid);
    let extras = extra_contrasts.then(|| ExtraContrasts::compute(&counts));

    let width = counts.width();
    let log_ratio = log_ratio_matrix(&counts.into_smoothed(), width);
    info!("Log-ratio matrix computed");

    let trends = summarize(&log_ratio, &vocabulary);
    let insufficient = trends.iter().filter(|t| t.is_insufficient()).count();
    if insufficient > 0 {
        warn!("{insufficient} words have too few years for a trend fit");
    }

    Analysis {
        seed,
        selection,
        vocabulary,
        gender_sums,
        extras,
        log_ratio,
        trends,
    }
}

/// Run metadata written next to the outputs.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub created: String,
    pub seed: u64,
    pub vocab_size_requested: usize,
    pub vocab_size: usize,
    pub sample_size: usize,
    pub sources: Vec<String>,
    pub missing_sources: Vec<String>,
    pub metadata: Option<String>,
    pub characters: usize,
    pub pool_entries: usize,
    pub rows: IngestStats,
    pub insufficient_trends: usize,
    pub outputs: Vec<String>,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub paths: OutputPaths,
    pub analysis: Analysis,
    pub manifest: Manifest,
}

fn display(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

fn load_metadata(path: Option<&Path>) -> Result<Option<AuthorMetadata>> {
    match path {
        Some(p) if p.is_file() => AuthorMetadata::load(p).map(Some),
        Some(p) => {
            warn!(
                "I cannot find {}. This will be okay if the data itself contains authgender.",
                p.display()
            );
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Ingest every usable source into a sealed grid.
pub fn build_grid(sources: &[PathBuf], metadata: Option<&AuthorMetadata>) -> Result<Grid> {
    let mut builder = GridBuilder::new();
    for source in sources {
        read_source(source, metadata, &mut builder)?;
    }
    let grid = builder.finalize();
    let stats = grid.stats();
    info!(
        "Characters read from file: {} admitted, {} excluded",
        stats.admitted,
        stats.excluded()
    );
    Ok(grid)
}

/// The whole run: validate, ingest, analyze, write.
pub fn run(opts: &PipelineOptions) -> Result<RunReport> {
    opts.validate()?;
    let paths = opts.output_paths();
    paths.ensure_absent()?;

    let (sources, missing) = partition_sources(&opts.sources);
    if sources.is_empty() {
        bail!("none of the {} source files could be found", opts.sources.len());
    }
    let lexicon = NameLexicon::load(&opts.lexicon)?;
    info!("Loaded {} personal names", lexicon.len());
    let metadata = load_metadata(opts.metadata.as_deref())?;

    let grid = build_grid(&sources, metadata.as_ref())?;
    let seed = opts.seed.unwrap_or_else(rand::random);
    info!("Resampling with seed {seed}");
    let analysis = analyze(
        &grid,
        &lexicon,
        opts.vocab_size,
        opts.sample_size,
        seed,
        opts.extra_contrasts,
    );

    let mut staged = StagedFiles::new();
    staged.stage(&paths.slopes, |w| write_trends(w, &analysis.trends))?;
    staged.stage(&paths.gender_sums, |w| write_gender_sums(w, &analysis.gender_sums))?;
    if let Some(extras) = &analysis.extras {
        for (path, matrix) in paths.extras.iter().zip(extras.matrices()) {
            staged.stage(path, |w| write_matrix(w, matrix, &analysis.vocabulary))?;
        }
    }

    let manifest = Manifest {
        created: Local::now().to_rfc3339(),
        seed,
        vocab_size_requested: opts.vocab_size,
        vocab_size: analysis.vocabulary.len(),
        sample_size: opts.sample_size,
        sources: display(&sources),
        missing_sources: display(&missing),
        metadata: metadata
            .as_ref()
            .and(opts.metadata.as_deref())
            .map(|p| p.display().to_string()),
        characters: grid.num_characters(),
        pool_entries: grid.num_entries(),
        rows: grid.stats(),
        insufficient_trends: analysis.trends.iter().filter(|t| t.is_insufficient()).count(),
        outputs: paths.all().map(|p| p.display().to_string()).collect(),
    };
    staged
        .stage(&paths.manifest, |w| {
            serde_json::to_writer_pretty(&mut *w, &manifest)?;
            Ok(writeln!(w)?)
        })
        .context("writing run manifest")?;
    // Matrix last: its presence marks a complete run.
    staged.stage(&paths.matrix, |w| write_matrix(w, &analysis.log_ratio, &analysis.vocabulary))?;
    staged.commit()?;
    info!("Results written to {}", paths.matrix.display());

    Ok(RunReport {
        paths,
        analysis,
        manifest,
    })
}
