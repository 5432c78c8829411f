//! Stratified resampling: a fixed number of characters per grid cell.
//!
//! Corpora are heavily imbalanced by year and by author gender. Drawing the
//! same number of characters with replacement from every non-empty cell
//! gives each cell equal weight in the vocabulary and in the contrasts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::{CharId, Grid};
use crate::years::{AuthorGender, Cells};

pub const DEFAULT_SAMPLE_SIZE: usize = 3000;

/// Per-cell draws. Empty where the grid cell was empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    cells: Cells<Vec<CharId>>,
}

impl Selection {
    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`.
    pub fn cell(&self, year: i32, gender: AuthorGender) -> &[CharId] {
        self.cells.get(year, gender)
    }

    pub fn cells(&self) -> &Cells<Vec<CharId>> {
        &self.cells
    }

    /// Every selected handle, cell by cell, repeats included.
    pub fn iter_all(&self) -> impl Iterator<Item = CharId> + '_ {
        self.cells.values().flatten().copied()
    }
}

pub struct Resampler {
    rng: StdRng,
    sample_size: usize,
}

impl Resampler {
    pub fn seeded(seed: u64, sample_size: usize) -> Self {
        Resampler {
            rng: StdRng::seed_from_u64(seed),
            sample_size,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Draw `sample_size` handles uniformly with replacement from each pool.
    /// Cells are visited in canonical order so a seed fixes the outcome.
    pub fn select(&mut self, grid: &Grid) -> Selection {
        let n = self.sample_size;
        let rng = &mut self.rng;
        let cells = grid.pools().map(|_, _, pool| {
            if pool.is_empty() {
                return Vec::new();
            }
            (0..n)
                .map(|_| pool[rng.random_range(0..pool.len())])
                .collect()
        });
        Selection { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CharacterRow, GridBuilder};

    fn grid_with(rows: &[(&str, i32, &str)]) -> Grid {
        let mut b = GridBuilder::new();
        for &(id, year, auth) in rows {
            b.ingest(CharacterRow {
                id,
                words: "w",
                char_gender: "f",
                author_gender: Some(auth),
                pubdate: &year.to_string(),
            })
            .unwrap();
        }
        b.finalize()
    }

    #[test]
    fn non_empty_cells_get_exactly_n() {
        let grid = grid_with(&[("a", 1800, "f"), ("b", 1800, "f"), ("c", 1950, "m")]);
        let sel = Resampler::seeded(7, 25).select(&grid);
        for (year, gender, pool) in grid.pools().iter() {
            let expected = if pool.is_empty() { 0 } else { 25 };
            assert_eq!(sel.cell(year, gender).len(), expected, "{year} {gender}");
        }
        let pool = grid.pool(1800, AuthorGender::Female);
        assert!(sel
            .cell(1800, AuthorGender::Female)
            .iter()
            .all(|id| pool.contains(id)));
    }

    #[test]
    fn draws_with_replacement() {
        let grid = grid_with(&[("only", 1900, "m")]);
        let sel = Resampler::seeded(1, 10).select(&grid);
        let cell = sel.cell(1900, AuthorGender::Male);
        assert_eq!(cell.len(), 10);
        assert!(cell.iter().all(|&id| id == cell[0]));
    }

    #[test]
    fn same_seed_same_selection() {
        let grid = grid_with(&[("a", 1820, "f"), ("b", 1820, "f"), ("c", 1820, "f")]);
        let first = Resampler::seeded(42, 50).select(&grid);
        let second = Resampler::seeded(42, 50).select(&grid);
        assert_eq!(first, second);
    }

    #[test]
    fn repeated_calls_do_not_exhaust_pools() {
        let grid = grid_with(&[("a", 1820, "f"), ("b", 1820, "f")]);
        let mut r = Resampler::seeded(3, 100);
        let first = r.select(&grid);
        let second = r.select(&grid);
        assert_eq!(second.cell(1820, AuthorGender::Female).len(), 100);
        assert_eq!(first.iter_all().count(), second.iter_all().count());
    }
}
