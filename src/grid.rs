//! Grid Builder: organizes characters into (publication year, author gender) cells.
//!
//! Ingestion goes through a [`GridBuilder`] that is fed one row at a time,
//! possibly from several files, and is sealed with [`GridBuilder::finalize`]
//! into an immutable [`Grid`] that the resampler reads.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::Serialize;

use crate::years::{AuthorGender, CharGender, Cells, contains_year};

/// Compact handle for a character id. Pools and selections store these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharId(u32);

impl CharId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: String,
    pub gender: CharGender,
    pub words: Vec<String>,
}

/// One input row with the author gender already resolved (or not).
#[derive(Debug, Clone, Copy)]
pub struct CharacterRow<'a> {
    pub id: &'a str,
    /// Whitespace-delimited tokens.
    pub words: &'a str,
    pub char_gender: &'a str,
    /// `None` when neither an inline value nor a metadata entry was found.
    pub author_gender: Option<&'a str>,
    /// Publication year as written. Only parsed once the row has passed the
    /// gender filters, so excluded rows may carry anything here.
    pub pubdate: &'a str,
}

/// Why a row was left out of the grid. These are data filters, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    UnknownCharGender,
    UnresolvedAuthorGender,
    InvalidAuthorGender,
    YearOutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Admitted(CharId),
    Excluded(Exclusion),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub admitted: usize,
    pub unknown_char_gender: usize,
    pub unresolved_author_gender: usize,
    pub invalid_author_gender: usize,
    pub year_out_of_range: usize,
}

impl IngestStats {
    fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Admitted(_) => self.admitted += 1,
            RowOutcome::Excluded(Exclusion::UnknownCharGender) => self.unknown_char_gender += 1,
            RowOutcome::Excluded(Exclusion::UnresolvedAuthorGender) => {
                self.unresolved_author_gender += 1
            }
            RowOutcome::Excluded(Exclusion::InvalidAuthorGender) => {
                self.invalid_author_gender += 1
            }
            RowOutcome::Excluded(Exclusion::YearOutOfRange) => self.year_out_of_range += 1,
        }
    }

    pub fn excluded(&self) -> usize {
        self.unknown_char_gender
            + self.unresolved_author_gender
            + self.invalid_author_gender
            + self.year_out_of_range
    }
}

#[derive(Debug, Default)]
pub struct GridBuilder {
    ids: HashMap<String, CharId>,
    characters: Vec<Character>,
    pools: Cells<Vec<CharId>>,
    stats: IngestStats,
}

impl GridBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row. Excluded rows leave the builder untouched apart from the
    /// statistics. For a row that passes the gender filters, a `pubdate` that
    /// is not an integer or a character gender other than `f`, `m` or `u…`
    /// is malformed and returns an error.
    ///
    /// An id seen before keeps its handle and gains another pool entry; its
    /// words and gender are replaced by this row's.
    pub fn ingest(&mut self, row: CharacterRow<'_>) -> Result<RowOutcome> {
        let outcome = self.admit(row)?;
        self.stats.record(outcome);
        if let RowOutcome::Excluded(reason) = outcome {
            debug!("excluded {} ({:?})", row.id, reason);
        }
        Ok(outcome)
    }

    fn admit(&mut self, row: CharacterRow<'_>) -> Result<RowOutcome> {
        if row.char_gender.starts_with('u') {
            return Ok(RowOutcome::Excluded(Exclusion::UnknownCharGender));
        }
        let Some(code) = row.author_gender else {
            return Ok(RowOutcome::Excluded(Exclusion::UnresolvedAuthorGender));
        };
        let Some(author_gender) = AuthorGender::from_code(code) else {
            return Ok(RowOutcome::Excluded(Exclusion::InvalidAuthorGender));
        };
        let year: i32 = row
            .pubdate
            .parse()
            .with_context(|| format!("pubdate {:?} is not an integer", row.pubdate))?;
        if !contains_year(year) {
            return Ok(RowOutcome::Excluded(Exclusion::YearOutOfRange));
        }
        let Some(char_gender) = CharGender::from_code(row.char_gender) else {
            bail!(
                "character {} has gender {:?}; expected f, m or u",
                row.id,
                row.char_gender
            );
        };

        let character = Character {
            id: row.id.to_string(),
            gender: char_gender,
            words: row.words.split_whitespace().map(String::from).collect(),
        };
        let handle = match self.ids.get(row.id) {
            Some(&handle) => {
                self.characters[handle.index()] = character;
                handle
            }
            None => {
                let handle = CharId(u32::try_from(self.characters.len())?);
                self.ids.insert(row.id.to_string(), handle);
                self.characters.push(character);
                handle
            }
        };
        self.pools.get_mut(year, author_gender).push(handle);
        Ok(RowOutcome::Admitted(handle))
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Seal the accumulated state.
    pub fn finalize(self) -> Grid {
        Grid {
            characters: self.characters,
            pools: self.pools,
            stats: self.stats,
        }
    }
}

/// Sealed grid: every pool entry resolves to a recorded character.
#[derive(Debug)]
pub struct Grid {
    characters: Vec<Character>,
    pools: Cells<Vec<CharId>>,
    stats: IngestStats,
}

impl Grid {
    /// Admitted handles for one cell, in ingestion order.
    ///
    /// # Panics
    /// If `year` is outside `FIRST_YEAR..=LAST_YEAR`.
    pub fn pool(&self, year: i32, gender: AuthorGender) -> &[CharId] {
        self.pools.get(year, gender)
    }

    pub fn pools(&self) -> &Cells<Vec<CharId>> {
        &self.pools
    }

    pub fn character(&self, id: CharId) -> &Character {
        &self.characters[id.index()]
    }

    pub fn words(&self, id: CharId) -> &[String] {
        &self.character(id).words
    }

    pub fn char_gender(&self, id: CharId) -> CharGender {
        self.character(id).gender
    }

    /// Distinct character ids.
    pub fn num_characters(&self) -> usize {
        self.characters.len()
    }

    /// Pool entries across all cells, duplicates included.
    pub fn num_entries(&self) -> usize {
        self.pools.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row<'a>(
        id: &'a str,
        year: &'a str,
        auth: Option<&'a str>,
        chargender: &'a str,
    ) -> CharacterRow<'a> {
        CharacterRow {
            id,
            words: "the dog barked",
            char_gender: chargender,
            author_gender: auth,
            pubdate: year,
        }
    }

    #[test]
    fn admits_valid_row_into_its_cell() {
        let mut b = GridBuilder::new();
        let out = b.ingest(row("c1", "1900", Some("f"), "m")).unwrap();
        let grid = b.finalize();
        let RowOutcome::Admitted(id) = out else {
            panic!("expected admission, got {out:?}");
        };
        assert_eq!(grid.pool(1900, AuthorGender::Female), &[id]);
        assert!(grid.pool(1900, AuthorGender::Male).is_empty());
        assert_eq!(grid.words(id), &["the", "dog", "barked"]);
        assert_eq!(grid.char_gender(id), CharGender::Male);
    }

    #[test]
    fn excludes_by_reason() {
        let mut b = GridBuilder::new();
        let cases = [
            (row("a", "1900", Some("f"), "u"), Exclusion::UnknownCharGender),
            (row("b", "1900", Some("f"), "unknown"), Exclusion::UnknownCharGender),
            (row("c", "1900", None, "f"), Exclusion::UnresolvedAuthorGender),
            (row("d", "1900", Some("u"), "f"), Exclusion::InvalidAuthorGender),
            (row("e", "1900", Some("F"), "f"), Exclusion::InvalidAuthorGender),
            (row("f", "1779", Some("m"), "f"), Exclusion::YearOutOfRange),
            (row("g", "2008", Some("m"), "f"), Exclusion::YearOutOfRange),
        ];
        for (r, reason) in cases {
            assert_eq!(b.ingest(r).unwrap(), RowOutcome::Excluded(reason), "{}", r.id);
        }
        let stats = b.stats();
        assert_eq!(stats.admitted, 0);
        assert_eq!(stats.excluded(), 7);
        assert_eq!(stats.year_out_of_range, 2);
        let grid = b.finalize();
        assert_eq!(grid.num_entries(), 0);
        assert_eq!(grid.num_characters(), 0);
    }

    #[test]
    fn boundary_years_are_admitted() {
        let mut b = GridBuilder::new();
        b.ingest(row("first", "1780", Some("m"), "f")).unwrap();
        b.ingest(row("last", "2007", Some("m"), "f")).unwrap();
        let grid = b.finalize();
        assert_eq!(grid.pool(1780, AuthorGender::Male).len(), 1);
        assert_eq!(grid.pool(2007, AuthorGender::Male).len(), 1);
    }

    #[test]
    fn duplicate_ids_are_two_pool_entries_with_latest_words() {
        let mut b = GridBuilder::new();
        b.ingest(row("dup", "1850", Some("f"), "f")).unwrap();
        b.ingest(CharacterRow {
            words: "cat",
            ..row("dup", "1850", Some("f"), "m")
        })
        .unwrap();
        let grid = b.finalize();
        let pool = grid.pool(1850, AuthorGender::Female);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0], pool[1]);
        assert_eq!(grid.words(pool[0]), &["cat"]);
        assert_eq!(grid.char_gender(pool[0]), CharGender::Male);
        assert_eq!(grid.num_characters(), 1);
    }

    #[test]
    fn pubdate_is_parsed_only_after_gender_filters() {
        let mut b = GridBuilder::new();
        let cases = [
            (row("u", "", Some("f"), "u"), Exclusion::UnknownCharGender),
            (row("none", "", None, "f"), Exclusion::UnresolvedAuthorGender),
            (row("odd", "n.d.", Some("unknown"), "f"), Exclusion::InvalidAuthorGender),
        ];
        for (r, reason) in cases {
            assert_eq!(b.ingest(r).unwrap(), RowOutcome::Excluded(reason), "{}", r.id);
        }
        let err = b.ingest(row("kept", "", Some("f"), "f")).unwrap_err();
        assert!(err.to_string().contains("not an integer"));
        assert_eq!(b.stats().excluded(), 3);
    }

    #[test]
    fn malformed_char_gender_is_an_error() {
        let mut b = GridBuilder::new();
        let err = b.ingest(row("x", "1900", Some("f"), "q")).unwrap_err();
        assert!(err.to_string().contains("expected f, m or u"));
    }
}
