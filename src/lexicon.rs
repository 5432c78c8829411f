//! Personal-name lexicon used to keep gendered names out of the vocabulary.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Prefix the tokenizer puts on speech-attribution tokens ("said-elizabeth").
pub const SAID_PREFIX: &str = "said-";

#[derive(Debug, Clone, Default)]
pub struct NameLexicon {
    names: HashSet<String>,
}

impl NameLexicon {
    /// Load a newline-delimited UTF-8 name list. Trailing whitespace is
    /// stripped and blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading name lexicon {}", path.display()))?;
        Ok(Self::from_text(&content))
    }

    pub fn from_text(content: &str) -> Self {
        content.lines().map(str::trim_end).collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// True for a bare lexicon name or `said-` followed by one.
    pub fn is_name_leak(&self, token: &str) -> bool {
        if self.names.contains(token) {
            return true;
        }
        token
            .strip_prefix(SAID_PREFIX)
            .is_some_and(|rest| self.names.contains(rest))
    }
}

impl<'a> FromIterator<&'a str> for NameLexicon {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        NameLexicon { names }
    }
}
