//! Trend Summarizer: per-word linear trend of the log-ratio across years.
//!
//! A log-ratio of exactly zero means the smoothed probabilities were equal;
//! such years are left out of the regression but still count toward the
//! century means, which always use the full column.

use rayon::prelude::*;

use crate::contrast::ContrastMatrix;
use crate::vocab::Vocabulary;
use crate::years::{EARLY_WINDOW, FIRST_YEAR, LATE_WINDOW, NINETEENTH_CENTURY};

/// Fewer non-missing years than this and no line is fitted.
pub const MIN_FIT_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendFit {
    Fitted {
        slope: f64,
        intercept: f64,
        /// Population standard deviation of the fitted (non-missing) values.
        std_dev: f64,
    },
    InsufficientData {
        points: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordTrend {
    pub word: String,
    pub fit: TrendFit,
    pub mean: f64,
    /// Mean after 1900 minus mean before.
    pub change: f64,
    pub approach_mid: f64,
    /// `approach_mid` over the fit's standard deviation; `None` when there is
    /// no fit or the deviation is zero.
    pub approach_std: Option<f64>,
}

impl WordTrend {
    pub fn slope(&self) -> Option<f64> {
        match self.fit {
            TrendFit::Fitted { slope, .. } => Some(slope),
            TrendFit::InsufficientData { .. } => None,
        }
    }

    pub fn intercept(&self) -> Option<f64> {
        match self.fit {
            TrendFit::Fitted { intercept, .. } => Some(intercept),
            TrendFit::InsufficientData { .. } => None,
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self.fit, TrendFit::InsufficientData { .. })
    }
}

/// Summarize one word's column. `column[i]` belongs to year `FIRST_YEAR + i`.
///
/// # Example
/// ```
/// use character_logratio::trend::summarize_column;
/// use character_logratio::years::NUM_YEARS;
///
/// let mut column = vec![0.0; NUM_YEARS];
/// column[0] = 1.0; // 1780
/// column[10] = 2.0; // 1790
/// let trend = summarize_column("she", &column);
/// assert!((trend.slope().unwrap() - 0.1).abs() < 1e-12);
///
/// column[10] = 0.0;
/// assert!(summarize_column("she", &column).is_insufficient());
/// ```
pub fn summarize_column(word: &str, column: &[f64]) -> WordTrend {
    let (xs, ys): (Vec<f64>, Vec<f64>) = column
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(i, &v)| (f64::from(FIRST_YEAR) + i as f64, v))
        .unzip();
    let fit = fit_line(&xs, &ys);

    let change = mean(&column[NINETEENTH_CENTURY.end..]) - mean(&column[NINETEENTH_CENTURY]);
    let approach_mid = mean(&column[EARLY_WINDOW]).abs() - mean(&column[LATE_WINDOW]).abs();
    let approach_std = match fit {
        TrendFit::Fitted { std_dev, .. } if std_dev > 0.0 => Some(approach_mid / std_dev),
        _ => None,
    };

    WordTrend {
        word: word.to_string(),
        fit,
        mean: mean(column),
        change,
        approach_mid,
        approach_std,
    }
}

/// Ordinary least squares of `ys` on `xs`.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> TrendFit {
    let n = xs.len();
    if n < MIN_FIT_POINTS {
        return TrendFit::InsufficientData { points: n };
    }
    let mean_x = mean(xs);
    let mean_y = mean(ys);
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return TrendFit::InsufficientData { points: n };
    }
    let slope = sxy / sxx;
    TrendFit::Fitted {
        slope,
        intercept: mean_y - slope * mean_x,
        std_dev: (syy / n as f64).sqrt(),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// One summary per vocabulary word, in vocabulary order.
pub fn summarize(matrix: &ContrastMatrix, vocab: &Vocabulary) -> Vec<WordTrend> {
    assert_eq!(matrix.width(), vocab.len(), "matrix and vocabulary disagree");
    vocab
        .words()
        .par_iter()
        .enumerate()
        .map(|(i, word)| summarize_column(word, &matrix.column(i)))
        .collect()
}
