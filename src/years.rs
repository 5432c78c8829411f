//! The fixed publication-year domain and the two gender partitions.
//!
//! Every matrix in the crate has one row per year in `FIRST_YEAR..=LAST_YEAR`,
//! so row positions and calendar years convert through [`year_offset`]. The
//! trend windows below are named by the years they cover and resolve to row
//! ranges at compile time.

use std::fmt;
use std::ops::Range;

pub const FIRST_YEAR: i32 = 1780;
pub const LAST_YEAR: i32 = 2007;
pub const NUM_YEARS: usize = (LAST_YEAR - FIRST_YEAR + 1) as usize;

/// Row position of `year` in a year-indexed matrix.
pub const fn year_offset(year: i32) -> usize {
    (year - FIRST_YEAR) as usize
}

/// Rows 1780..1900, compared against everything after for "change".
pub const NINETEENTH_CENTURY: Range<usize> = 0..year_offset(1900);
/// Rows 1780..1840.
pub const EARLY_WINDOW: Range<usize> = 0..year_offset(1840);
/// Rows 1930..1990.
pub const LATE_WINDOW: Range<usize> = year_offset(1930)..year_offset(1990);

pub fn contains_year(year: i32) -> bool {
    (FIRST_YEAR..=LAST_YEAR).contains(&year)
}

/// All years of the domain, ascending.
pub fn all_years() -> impl Iterator<Item = i32> {
    FIRST_YEAR..=LAST_YEAR
}

/// Gender of a text's author. Only these two values form grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorGender {
    Female,
    Male,
}

impl AuthorGender {
    /// Cell iteration order: female first, then male.
    pub const ALL: [AuthorGender; 2] = [AuthorGender::Female, AuthorGender::Male];

    /// Only the exact codes `f` and `m` are accepted.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "f" => Some(AuthorGender::Female),
            "m" => Some(AuthorGender::Male),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            AuthorGender::Female => 0,
            AuthorGender::Male => 1,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            AuthorGender::Female => "f",
            AuthorGender::Male => "m",
        }
    }
}

impl fmt::Display for AuthorGender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Gender of a fictional character. Unknown (`u…`) characters never get this far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharGender {
    Female,
    Male,
}

impl CharGender {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "f" => Some(CharGender::Female),
            "m" => Some(CharGender::Male),
            _ => None,
        }
    }
}

/// One value per (year, author gender) cell, years ascending, female before male.
#[derive(Debug, Clone, PartialEq)]
pub struct Cells<T> {
    slots: Vec<T>,
}

impl<T> Cells<T> {
    pub fn from_fn(mut f: impl FnMut(i32, AuthorGender) -> T) -> Self {
        let mut slots = Vec::with_capacity(NUM_YEARS * AuthorGender::ALL.len());
        for year in all_years() {
            for gender in AuthorGender::ALL {
                slots.push(f(year, gender));
            }
        }
        Cells { slots }
    }

    fn slot(year: i32, gender: AuthorGender) -> usize {
        assert!(contains_year(year), "year {year} outside {FIRST_YEAR}..={LAST_YEAR}");
        year_offset(year) * AuthorGender::ALL.len() + gender.index()
    }

    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`. Rows are filtered
    /// with [`contains_year`] before they reach a cell.
    pub fn get(&self, year: i32, gender: AuthorGender) -> &T {
        &self.slots[Self::slot(year, gender)]
    }

    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`.
    pub fn get_mut(&mut self, year: i32, gender: AuthorGender) -> &mut T {
        &mut self.slots[Self::slot(year, gender)]
    }

    /// Cells in canonical order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (i32, AuthorGender, &T)> {
        all_years()
            .flat_map(|y| AuthorGender::ALL.into_iter().map(move |g| (y, g)))
            .zip(self.slots.iter())
            .map(|((y, g), v)| (y, g, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter()
    }

    pub fn map<U>(&self, mut f: impl FnMut(i32, AuthorGender, &T) -> U) -> Cells<U> {
        Cells {
            slots: self.iter().map(|(y, g, v)| f(y, g, v)).collect(),
        }
    }

    pub fn into_map<U>(self, mut f: impl FnMut(T) -> U) -> Cells<U> {
        Cells {
            slots: self.slots.into_iter().map(&mut f).collect(),
        }
    }
}

impl<T: Default> Default for Cells<T> {
    fn default() -> Self {
        Cells::from_fn(|_, _| T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_domain_has_228_rows() {
        assert_eq!(NUM_YEARS, 228);
        assert_eq!(all_years().count(), NUM_YEARS);
        assert_eq!(year_offset(LAST_YEAR), NUM_YEARS - 1);
    }

    #[test]
    fn windows_match_row_positions() {
        assert_eq!(NINETEENTH_CENTURY, 0..120);
        assert_eq!(EARLY_WINDOW, 0..60);
        assert_eq!(LATE_WINDOW, 150..210);
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(contains_year(1780));
        assert!(contains_year(2007));
        assert!(!contains_year(1779));
        assert!(!contains_year(2008));
    }

    #[test]
    fn cells_iterate_years_then_genders() {
        let cells = Cells::from_fn(|y, g| (y, g));
        let first: Vec<_> = cells.values().take(3).copied().collect();
        assert_eq!(
            first,
            vec![
                (1780, AuthorGender::Female),
                (1780, AuthorGender::Male),
                (1781, AuthorGender::Female)
            ]
        );
        assert_eq!(*cells.get(2007, AuthorGender::Male), (2007, AuthorGender::Male));
        assert_eq!(cells.values().count(), NUM_YEARS * 2);
    }

    #[test]
    #[should_panic(expected = "outside 1780..=2007")]
    fn cells_reject_years_outside_the_grid() {
        let cells: Cells<u8> = Cells::default();
        cells.get(1779, AuthorGender::Female);
    }

    #[test]
    fn author_gender_codes_are_exact() {
        assert_eq!(AuthorGender::from_code("f"), Some(AuthorGender::Female));
        assert_eq!(AuthorGender::from_code("m"), Some(AuthorGender::Male));
        assert_eq!(AuthorGender::from_code("F"), None);
        assert_eq!(AuthorGender::from_code("u"), None);
        assert_eq!(AuthorGender::from_code(""), None);
    }
}
