//! Vocabulary Builder: the ranked word list every vector and matrix is indexed by.

use std::collections::HashMap;

use log::info;

use crate::grid::Grid;
use crate::lexicon::NameLexicon;
use crate::resample::Selection;

pub const DEFAULT_VOCAB_SIZE: usize = 6000;

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    words: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Count tokens over every selected character (repeats included), drop
    /// name leaks and keep the `size` most frequent.
    pub fn build(selection: &Selection, grid: &Grid, lexicon: &NameLexicon, size: usize) -> Self {
        let tokens = selection
            .iter_all()
            .flat_map(|id| grid.words(id))
            .map(String::as_str)
            .filter(|w| !lexicon.is_name_leak(w));
        let ranked = sort_map_to_vec(count_words(tokens));
        info!("The data includes {} words", ranked.len());

        let vocab = Vocabulary::from_words(ranked.into_iter().take(size).map(|(w, _)| w));
        info!("Vocabulary sorted, top {} kept", vocab.len());
        vocab
    }

    /// Vocabulary in the given order. Later duplicates are ignored.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Vocabulary {
            words: Vec::new(),
            index: HashMap::new(),
        };
        for word in words {
            let word = word.into();
            if vocab.index.contains_key(&word) {
                continue;
            }
            vocab.index.insert(word.clone(), vocab.words.len());
            vocab.words.push(word);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }
}

/// Token frequencies plus the order in which each token was first seen.
pub struct WordCounts {
    counts: HashMap<String, (u64, usize)>,
}

/// Count the quantity of each token.
pub fn count_words<'a>(tokens: impl IntoIterator<Item = &'a str>) -> WordCounts {
    let mut counts: HashMap<String, (u64, usize)> = HashMap::new();
    for token in tokens {
        if let Some(entry) = counts.get_mut(token) {
            entry.0 += 1;
        } else {
            let seen = counts.len();
            counts.insert(token.to_owned(), (1, seen));
        }
    }
    WordCounts { counts }
}

/// Sort counted tokens by descending frequency; equal counts keep
/// first-seen order.
pub fn sort_map_to_vec(frequency: WordCounts) -> Vec<(String, u64)> {
    let mut vec_sorted: Vec<(String, (u64, usize))> = frequency.counts.into_iter().collect();
    vec_sorted.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    vec_sorted.into_iter().map(|(w, (n, _))| (w, n)).collect()
}
