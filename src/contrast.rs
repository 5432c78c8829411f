//! Contrast Engine: year-by-word statistics comparing female-authored and
//! male-authored character vocabularies.
//!
//! All statistics take the female vector first. Each year is computed
//! independently, so the matrix builders run the years in parallel and
//! collect them back in ascending order.

use log::error;
use rayon::prelude::*;

use crate::vectorize::{CountTable, SmoothedTable, SmoothedVector};
use crate::years::{FIRST_YEAR, LAST_YEAR, NUM_YEARS, contains_year, year_offset};

/// Common total both genders are scaled to before differencing.
pub const PROPORTION_SCALE: f64 = 5000.0;

/// Signed Dunning log-likelihood per word.
///
/// The sign follows the male side: negative where male-authored characters
/// use the word less than the pooled rate predicts, positive otherwise.
/// Words absent from either side, and any cell of the 2×2 table
/// that would need the log of zero or a division by zero, score 0.
///
/// # Example
/// ```
/// use character_logratio::dunning;
///
/// let g = dunning(&[10, 0, 5], &[5, 3, 5]);
/// assert!(g[0] < 0.0);
/// assert_eq!(g[1], 0.0);
/// assert!(g[2] > 0.0);
/// ```
pub fn dunning(female: &[u64], male: &[u64]) -> Vec<f64> {
    assert_eq!(female.len(), male.len(), "count vectors differ in length");
    let total_f = female.iter().sum::<u64>() as f64;
    let total_m = male.iter().sum::<u64>() as f64;
    female
        .iter()
        .zip(male)
        .map(|(&f, &m)| signed_g(f, m, total_f, total_m).unwrap_or(0.0))
        .collect()
}

fn signed_g(f: u64, m: u64, total_f: f64, total_m: f64) -> Option<f64> {
    if f == 0 || m == 0 {
        return None;
    }
    let (f, m) = (f as f64, m as f64);
    let p = (f + m) / (total_f + total_m);
    let expected_m = total_m * p;
    let table = [
        (f, total_f * p),
        (total_f - f, total_f * (1.0 - p)),
        (m, expected_m),
        (total_m - m, total_m * (1.0 - p)),
    ];
    let mut g = 0.0;
    for (observed, expected) in table {
        if observed <= 0.0 || expected <= 0.0 {
            return None;
        }
        g += observed * (observed / expected).ln();
    }
    if !g.is_finite() {
        return None;
    }
    Some(if expected_m > m { -g } else { g })
}

/// Ranks and magnitude-weighted ranks for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedYear {
    pub ranks: Vec<i64>,
    pub weighted: Vec<f64>,
}

/// Replace log-likelihoods by signed ranks.
///
/// Pairs are sorted by (value, index). The k negative values take ranks
/// -k..=-1 in that order, the positive ones 1, 2, ... and zeros stay 0.
/// Each rank is then multiplied by the word's share of all counts that year.
///
/// # Example
/// ```
/// use character_logratio::rank_transform;
///
/// let ranked = rank_transform(&[-2.0, 0.0, 3.0, -0.5], &[1, 0, 2, 1], &[1, 0, 0, 0]);
/// assert_eq!(ranked.ranks, vec![-2, 0, 1, -1]);
/// assert!((ranked.weighted[2] - 0.4).abs() < 1e-12);
/// ```
pub fn rank_transform(g: &[f64], female: &[u64], male: &[u64]) -> RankedYear {
    let mut decorated: Vec<(f64, usize)> = g.iter().copied().zip(0..).collect();
    decorated.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut ranks = vec![0_i64; g.len()];
    let mut negative = -(g.iter().filter(|&&v| v < 0.0).count() as i64);
    let mut positive = 1_i64;
    for (value, index) in decorated {
        if value < 0.0 {
            ranks[index] = negative;
            negative += 1;
        } else if value > 0.0 {
            ranks[index] = positive;
            positive += 1;
        }
    }

    let zeros = g.iter().filter(|&&v| v == 0.0).count();
    let zero_ranks = ranks.iter().filter(|&&r| r == 0).count();
    if zeros != zero_ranks {
        error!("rank transform: {zeros} zero scores but {zero_ranks} zero ranks");
    }

    let magnitude: Vec<u64> = female.iter().zip(male).map(|(f, m)| f + m).collect();
    let total = magnitude.iter().sum::<u64>() as f64;
    let weighted = ranks
        .iter()
        .zip(&magnitude)
        .map(|(&r, &mag)| if total > 0.0 { r as f64 * mag as f64 / total } else { 0.0 })
        .collect();
    RankedYear { ranks, weighted }
}

/// Female minus male after scaling each side to [`PROPORTION_SCALE`]. A side
/// with no counts contributes zeros.
pub fn proportion_difference(female: &[u64], male: &[u64]) -> Vec<f64> {
    let f = scale_to(female, PROPORTION_SCALE);
    let m = scale_to(male, PROPORTION_SCALE);
    f.iter().zip(&m).map(|(a, b)| a - b).collect()
}

fn scale_to(counts: &[u64], target: f64) -> Vec<f64> {
    let total = counts.iter().sum::<u64>();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|&c| c as f64 * target / total as f64)
        .collect()
}

/// ln(female probability / male probability) over smoothed counts.
pub fn log_ratio(female: &SmoothedVector, male: &SmoothedVector) -> Vec<f64> {
    let f = female.probabilities();
    let m = male.probabilities();
    f.iter().zip(&m).map(|(a, b)| (a / b).ln()).collect()
}

/// One row per year from [`FIRST_YEAR`] to [`LAST_YEAR`], one column per
/// vocabulary word.
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastMatrix {
    rows: Vec<Vec<f64>>,
    width: usize,
}

impl ContrastMatrix {
    pub fn from_rows(rows: Vec<Vec<f64>>, width: usize) -> Self {
        assert_eq!(rows.len(), NUM_YEARS, "one row per year expected");
        assert!(rows.iter().all(|r| r.len() == width), "ragged contrast matrix");
        ContrastMatrix { rows, width }
    }

    fn by_year(width: usize, f: impl Fn(i32) -> Vec<f64> + Sync + Send) -> Self {
        let rows: Vec<Vec<f64>> = (FIRST_YEAR..=LAST_YEAR).into_par_iter().map(f).collect();
        Self::from_rows(rows, width)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Values for one year, in vocabulary order.
    ///
    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`.
    pub fn row(&self, year: i32) -> &[f64] {
        assert!(contains_year(year), "year {year} outside {FIRST_YEAR}..={LAST_YEAR}");
        &self.rows[year_offset(year)]
    }

    /// Rows in year order.
    pub fn rows(&self) -> impl Iterator<Item = (i32, &[f64])> {
        (FIRST_YEAR..=LAST_YEAR).zip(self.rows.iter().map(Vec::as_slice))
    }

    /// All years' values for one word.
    pub fn column(&self, word: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[word]).collect()
    }
}

pub fn dunning_matrix(counts: &CountTable) -> ContrastMatrix {
    ContrastMatrix::by_year(counts.width(), |year| {
        let (f, m) = counts.pair(year);
        dunning(f, m)
    })
}

/// Magnitude-weighted ranks and plain ranks, in that order.
pub fn rank_matrices(counts: &CountTable) -> (ContrastMatrix, ContrastMatrix) {
    let years: Vec<RankedYear> = (FIRST_YEAR..=LAST_YEAR)
        .into_par_iter()
        .map(|year| {
            let (f, m) = counts.pair(year);
            rank_transform(&dunning(f, m), f, m)
        })
        .collect();
    let width = counts.width();
    let ranks: Vec<Vec<f64>> = years
        .iter()
        .map(|y| y.ranks.iter().map(|&r| r as f64).collect::<Vec<f64>>())
        .collect();
    let weighted: Vec<Vec<f64>> = years.into_iter().map(|y| y.weighted).collect();
    (
        ContrastMatrix::from_rows(weighted, width),
        ContrastMatrix::from_rows(ranks, width),
    )
}

pub fn proportion_difference_matrix(counts: &CountTable) -> ContrastMatrix {
    ContrastMatrix::by_year(counts.width(), |year| {
        let (f, m) = counts.pair(year);
        proportion_difference(f, m)
    })
}

pub fn log_ratio_matrix(smoothed: &SmoothedTable, width: usize) -> ContrastMatrix {
    ContrastMatrix::by_year(width, |year| {
        let (f, m) = smoothed.pair(year);
        log_ratio(f, m)
    })
}
