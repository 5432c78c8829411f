//! Matrix Writer: tabular outputs and the run manifest.
//!
//! Every file is written to a temporary file beside its destination. Only
//! when all of them are complete are they moved into place, without
//! clobbering, and the matrix goes last: a run that fails part way leaves
//! no matrix behind and an existing result is never replaced.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, WriterBuilder};
use log::warn;
use tempfile::NamedTempFile;

use crate::contrast::ContrastMatrix;
use crate::trend::WordTrend;
use crate::vectorize::GenderSums;
use crate::vocab::Vocabulary;

/// Written where a statistic is undefined (no fit, zero deviation).
pub const MISSING: &str = "NA";

pub const TREND_HEADER: [&str; 7] = [
    "word",
    "slope",
    "mean",
    "intercept",
    "change",
    "approachmid",
    "approachstd",
];

pub const GENDER_SUMS_HEADER: [&str; 5] = [
    "year",
    "womenbywomen",
    "menbywomen",
    "womenbymen",
    "menbymen",
];

/// Extra matrices, by file suffix.
pub const EXTRA_SUFFIXES: [&str; 4] = ["dunning", "rank", "weightedrank", "diffprop"];

/// Destination of every file a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPaths {
    pub matrix: PathBuf,
    pub slopes: PathBuf,
    pub gender_sums: PathBuf,
    pub manifest: PathBuf,
    pub extras: Vec<PathBuf>,
}

impl OutputPaths {
    pub fn new(dir: &Path, name: &str, with_extras: bool) -> Self {
        let file = |suffix: &str| dir.join(format!("{name}{suffix}"));
        let extras = if with_extras {
            EXTRA_SUFFIXES
                .iter()
                .map(|s| file(&format!(".{s}.csv")))
                .collect()
        } else {
            Vec::new()
        };
        OutputPaths {
            matrix: file(".csv"),
            slopes: file(".slopes.csv"),
            gender_sums: file(".gendersums.tsv"),
            manifest: file(".manifest.json"),
            extras,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.matrix, &self.slopes, &self.gender_sums, &self.manifest]
            .into_iter()
            .chain(self.extras.iter())
    }

    /// Refuse to run when any output is already present.
    pub fn ensure_absent(&self) -> Result<()> {
        if let Some(existing) = self.all().find(|p| p.exists()) {
            bail!(
                "{} already exists, and I refuse to overwrite it",
                existing.display()
            );
        }
        Ok(())
    }
}

/// Output files filled in temporary files beside their destinations and
/// moved into place together by [`StagedFiles::commit`].
#[derive(Debug, Default)]
pub struct StagedFiles {
    files: Vec<(PathBuf, NamedTempFile)>,
}

impl StagedFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write through `fill` into a temporary file in the directory of `path`.
    /// Nothing is visible at `path` until the commit.
    pub fn stage<F>(&mut self, path: &Path, fill: F) -> Result<()>
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        let temp = NamedTempFile::new_in(parent)
            .with_context(|| format!("creating temporary file in {}", parent.display()))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            fill(&mut writer).with_context(|| format!("writing {}", path.display()))?;
            writer.flush()?;
        }
        self.files.push((path.to_path_buf(), temp));
        Ok(())
    }

    /// Move the staged files into place in staging order, never replacing an
    /// existing file. If one move fails, the files already placed are removed
    /// and the remaining temporary files are discarded.
    pub fn commit(self) -> Result<()> {
        let mut placed: Vec<PathBuf> = Vec::with_capacity(self.files.len());
        for (path, temp) in self.files {
            if let Err(e) = temp.persist_noclobber(&path) {
                for p in &placed {
                    if let Err(err) = fs::remove_file(p) {
                        warn!("Could not remove {}: {}", p.display(), err);
                    }
                }
                bail!("{}: {}", path.display(), e.error);
            }
            placed.push(path);
        }
        Ok(())
    }
}

fn number(v: f64) -> String {
    v.to_string()
}

fn optional(v: Option<f64>) -> String {
    v.map_or_else(|| MISSING.to_string(), number)
}

/// Header `thedate` plus the vocabulary, then one row per year.
pub fn write_matrix(
    out: &mut dyn Write,
    matrix: &ContrastMatrix,
    vocab: &Vocabulary,
) -> Result<()> {
    if matrix.width() != vocab.len() {
        bail!(
            "matrix has {} columns but the vocabulary has {} words",
            matrix.width(),
            vocab.len()
        );
    }
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(std::iter::once("thedate").chain(vocab.words().iter().map(String::as_str)))?;
    for (year, row) in matrix.rows() {
        wtr.write_record(std::iter::once(year.to_string()).chain(row.iter().copied().map(number)))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_trends(out: &mut dyn Write, trends: &[WordTrend]) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    wtr.write_record(TREND_HEADER)?;
    for t in trends {
        wtr.write_record([
            t.word.clone(),
            optional(t.slope()),
            number(t.mean),
            optional(t.intercept()),
            number(t.change),
            number(t.approach_mid),
            optional(t.approach_std),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_gender_sums(out: &mut dyn Write, sums: &[GenderSums]) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b'\t').from_writer(out);
    wtr.write_record(GENDER_SUMS_HEADER)?;
    for s in sums {
        wtr.write_record([
            s.year.to_string(),
            s.women_by_women.to_string(),
            s.men_by_women.to_string(),
            s.women_by_men.to_string(),
            s.men_by_men.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// A matrix file read back: column words, years, and values.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFile {
    pub words: Vec<String>,
    pub years: Vec<i32>,
    pub values: Vec<Vec<f64>>,
}

impl MatrixFile {
    pub fn column(&self, word: &str) -> Option<Vec<f64>> {
        let idx = self.words.iter().position(|w| w == word)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }
}

/// Read a matrix written by [`write_matrix`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
///
/// let matrix = character_logratio::read_matrix(Path::new("new_bio_logratio.csv"))?;
/// if let Some(she) = matrix.column("she") {
///     println!("{} years of she", she.len());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn read_matrix(path: &Path) -> Result<MatrixFile> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_matrix_from(io::BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))
}

/// # Example
/// ```
/// use character_logratio::export::read_matrix_from;
///
/// let matrix = read_matrix_from("thedate,she,he\n1780,0.5,-1\n".as_bytes()).unwrap();
/// assert_eq!(matrix.years, vec![1780]);
/// assert_eq!(matrix.column("he"), Some(vec![-1.0]));
/// ```
pub fn read_matrix_from<R: io::Read>(input: R) -> Result<MatrixFile> {
    let mut rdr = ReaderBuilder::new().from_reader(input);
    let headers = rdr.headers()?.clone();
    let mut columns = headers.iter();
    if columns.next() != Some("thedate") {
        bail!("first column must be thedate");
    }
    let words: Vec<String> = columns.map(String::from).collect();

    let mut years = Vec::new();
    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut fields = record.iter();
        let year = fields.next().unwrap_or_default().parse::<i32>()?;
        let row = fields
            .map(|f| f.parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()?;
        years.push(year);
        values.push(row);
    }
    Ok(MatrixFile {
        words,
        years,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendFit;
    use crate::years::{NUM_YEARS, all_years};

    fn matrix(width: usize) -> ContrastMatrix {
        let rows: Vec<Vec<f64>> = (0..NUM_YEARS)
            .map(|i| (0..width).map(|j| i as f64 * 0.5 - j as f64).collect::<Vec<f64>>())
            .collect();
        ContrastMatrix::from_rows(rows, width)
    }

    #[test]
    fn matrix_round_trip_keeps_years_and_columns() {
        let vocab = Vocabulary::from_words(["she", "he", "said"]);
        let m = matrix(3);
        let mut buf = Vec::new();
        write_matrix(&mut buf, &m, &vocab).unwrap();
        let back = read_matrix_from(buf.as_slice()).unwrap();
        assert_eq!(back.words, vocab.words());
        assert_eq!(back.years, all_years().collect::<Vec<_>>());
        assert_eq!(back.values.len(), NUM_YEARS);
        assert_eq!(back.column("he").unwrap(), m.column(1));
    }

    #[test]
    fn matrix_width_must_match_vocabulary() {
        let vocab = Vocabulary::from_words(["one"]);
        let mut buf = Vec::new();
        assert!(write_matrix(&mut buf, &matrix(2), &vocab).is_err());
    }

    #[test]
    fn trends_mark_insufficient_data() {
        let trends = [WordTrend {
            word: "rare".into(),
            fit: TrendFit::InsufficientData { points: 1 },
            mean: 0.5,
            change: 0.0,
            approach_mid: 0.25,
            approach_std: None,
        }];
        let mut buf = Vec::new();
        write_trends(&mut buf, &trends).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("word,slope,mean,intercept,change,approachmid,approachstd")
        );
        assert_eq!(lines.next(), Some("rare,NA,0.5,NA,0,0.25,NA"));
    }

    #[test]
    fn gender_sums_are_tab_separated() {
        let sums = [GenderSums {
            year: 1800,
            women_by_women: 1,
            men_by_women: 2,
            women_by_men: 3,
            men_by_men: 4,
        }];
        let mut buf = Vec::new();
        write_gender_sums(&mut buf, &sums).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "year\twomenbywomen\tmenbywomen\twomenbymen\tmenbymen\n1800\t1\t2\t3\t4\n"
        );
    }

    #[test]
    fn commit_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        let mut first = StagedFiles::new();
        first.stage(&target, |w| Ok(w.write_all(b"first")?)).unwrap();
        first.commit().unwrap();
        let mut second = StagedFiles::new();
        second.stage(&target, |w| Ok(w.write_all(b"second")?)).unwrap();
        let err = second.commit().unwrap_err();
        assert!(err.to_string().contains("out.csv"));
        assert_eq!(fs::read_to_string(&target).unwrap(), "first");
    }

    #[test]
    fn failed_commit_leaves_no_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "run", false);
        let mut staged = StagedFiles::new();
        for p in [&paths.slopes, &paths.gender_sums, &paths.matrix] {
            staged.stage(p, |w| Ok(w.write_all(b"new")?)).unwrap();
        }
        fs::write(&paths.gender_sums, "theirs").unwrap();

        let err = staged.commit().unwrap_err();
        assert!(err.to_string().contains("run.gendersums.tsv"));
        assert!(!paths.matrix.exists());
        assert!(!paths.slopes.exists());
        assert_eq!(fs::read_to_string(&paths.gender_sums).unwrap(), "theirs");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn ensure_absent_names_the_collision() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::new(dir.path(), "run", true);
        assert!(paths.ensure_absent().is_ok());
        fs::write(&paths.slopes, "x").unwrap();
        let err = paths.ensure_absent().unwrap_err();
        assert!(err.to_string().contains("run.slopes.csv"));
        assert_eq!(paths.extras.len(), 4);
    }
}
