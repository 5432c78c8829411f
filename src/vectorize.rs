//! Vectorizer: per-cell word counts over the fixed vocabulary.

use log::info;

use crate::grid::Grid;
use crate::resample::Selection;
use crate::vocab::Vocabulary;
use crate::years::{AuthorGender, CharGender, Cells, all_years};

/// Raw occurrence counts for one (year, author gender) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountVector(Vec<u64>);

impl CountVector {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Add one to every element. Consumes the raw counts so smoothing can
    /// only happen once.
    pub fn into_smoothed(mut self) -> SmoothedVector {
        for c in &mut self.0 {
            *c += 1;
        }
        SmoothedVector(self.0)
    }
}

impl From<Vec<u64>> for CountVector {
    fn from(v: Vec<u64>) -> Self {
        CountVector(v)
    }
}

/// Laplace-smoothed counts: every element is at least one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothedVector(Vec<u64>);

impl SmoothedVector {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Counts divided by their total.
    pub fn probabilities(&self) -> Vec<f64> {
        let total = self.total() as f64;
        self.0.iter().map(|&c| c as f64 / total).collect()
    }
}

/// Count vectors for every cell, all of length |vocabulary|.
#[derive(Debug, Clone, PartialEq)]
pub struct CountTable {
    cells: Cells<CountVector>,
    width: usize,
}

impl CountTable {
    pub fn build(selection: &Selection, grid: &Grid, vocab: &Vocabulary) -> Self {
        let width = vocab.len();
        let cells = selection.cells().map(|_, _, chars| {
            let mut counts = vec![0_u64; width];
            for &id in chars {
                for word in grid.words(id) {
                    if let Some(idx) = vocab.index_of(word) {
                        counts[idx] += 1;
                    }
                }
            }
            CountVector(counts)
        });
        let table = CountTable { cells, width };
        info!("Counted {} vocabulary tokens", table.grand_total());
        table
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`.
    pub fn get(&self, year: i32, gender: AuthorGender) -> &CountVector {
        self.cells.get(year, gender)
    }

    pub fn grand_total(&self) -> u64 {
        self.cells.values().map(CountVector::total).sum()
    }

    /// Female and male vectors for one year.
    pub fn pair(&self, year: i32) -> (&[u64], &[u64]) {
        (
            self.get(year, AuthorGender::Female).as_slice(),
            self.get(year, AuthorGender::Male).as_slice(),
        )
    }

    /// Apply Laplace smoothing to every cell, exactly once.
    pub fn into_smoothed(self) -> SmoothedTable {
        SmoothedTable {
            cells: self.cells.into_map(CountVector::into_smoothed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedTable {
    cells: Cells<SmoothedVector>,
}

impl SmoothedTable {
    pub fn pair(&self, year: i32) -> (&SmoothedVector, &SmoothedVector) {
        (
            self.cells.get(year, AuthorGender::Female),
            self.cells.get(year, AuthorGender::Male),
        )
    }
}

/// Selected characters per year, split by character and author gender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenderSums {
    pub year: i32,
    pub women_by_women: u64,
    pub men_by_women: u64,
    pub women_by_men: u64,
    pub men_by_men: u64,
}

pub fn gender_sums(selection: &Selection, grid: &Grid) -> Vec<GenderSums> {
    all_years()
        .map(|year| {
            let mut sums = GenderSums {
                year,
                ..GenderSums::default()
            };
            for author in AuthorGender::ALL {
                for &id in selection.cell(year, author) {
                    let slot = match (author, grid.char_gender(id)) {
                        (AuthorGender::Female, CharGender::Female) => &mut sums.women_by_women,
                        (AuthorGender::Female, CharGender::Male) => &mut sums.men_by_women,
                        (AuthorGender::Male, CharGender::Female) => &mut sums.women_by_men,
                        (AuthorGender::Male, CharGender::Male) => &mut sums.men_by_men,
                    };
                    *slot += 1;
                }
            }
            sums
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CharacterRow, GridBuilder};
    use crate::resample::Resampler;

    fn single_character_grid() -> Grid {
        let mut b = GridBuilder::new();
        b.ingest(CharacterRow {
            id: "c1",
            words: "the the dog",
            char_gender: "f",
            author_gender: Some("f"),
            pubdate: "1900",
        })
        .unwrap();
        b.finalize()
    }

    #[test]
    fn single_character_counts_for_every_draw() {
        let grid = single_character_grid();
        let vocab = Vocabulary::from_words(["the", "dog"]);
        for seed in 0..5 {
            let sel = Resampler::seeded(seed, 1).select(&grid);
            let table = CountTable::build(&sel, &grid, &vocab);
            assert_eq!(table.get(1900, AuthorGender::Female).as_slice(), &[2, 1]);
            assert_eq!(table.get(1900, AuthorGender::Male).as_slice(), &[0, 0]);
        }
    }

    #[test]
    fn repeats_count_with_multiplicity() {
        let grid = single_character_grid();
        let vocab = Vocabulary::from_words(["dog"]);
        let sel = Resampler::seeded(0, 4).select(&grid);
        let table = CountTable::build(&sel, &grid, &vocab);
        assert_eq!(table.get(1900, AuthorGender::Female).as_slice(), &[4]);
        assert_eq!(table.grand_total(), 4);
    }

    #[test]
    fn smoothing_adds_one_everywhere() {
        let smoothed = CountVector::from(vec![0, 0, 5]).into_smoothed();
        assert_eq!(smoothed.as_slice(), &[1, 1, 6]);
        assert_eq!(smoothed.total(), 8);
        let p = smoothed.probabilities();
        assert!((p[2] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn gender_sums_split_by_author_and_character() {
        let grid = single_character_grid();
        let sel = Resampler::seeded(9, 3).select(&grid);
        let sums = gender_sums(&sel, &grid);
        assert_eq!(sums.len(), crate::years::NUM_YEARS);
        let y1900 = sums.iter().find(|s| s.year == 1900).unwrap();
        assert_eq!(y1900.women_by_women, 3);
        assert_eq!(y1900.men_by_men, 0);
    }
}
