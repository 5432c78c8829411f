//! Reading character tables and the optional author metadata table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};

use crate::grid::{CharacterRow, GridBuilder};

/// Document id → author gender, read from a comma-separated table.
#[derive(Debug, Clone, Default)]
pub struct AuthorMetadata {
    by_docid: HashMap<String, String>,
}

impl AuthorMetadata {
    /// The document id comes from a `docid` column, or from the first
    /// column when the header has none. An `authgender` column is required.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .from_path(path)
            .with_context(|| format!("opening metadata {}", path.display()))?;
        let headers = reader.headers()?.clone();
        let id_col = column(&headers, &["docid"]).unwrap_or(0);
        let gender_col = column(&headers, &["authgender"])
            .ok_or_else(|| anyhow!("metadata {} has no authgender column", path.display()))?;

        let mut by_docid = HashMap::new();
        for (line, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("{}: record {}", path.display(), line + 1))?;
            let docid = record.get(id_col).unwrap_or_default().trim();
            let gender = record.get(gender_col).unwrap_or_default().trim();
            by_docid.insert(docid.to_string(), gender.to_string());
        }
        info!("Metadata: {} documents from {}", by_docid.len(), path.display());
        Ok(AuthorMetadata { by_docid })
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        AuthorMetadata {
            by_docid: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn author_gender(&self, docid: &str) -> Option<&str> {
        self.by_docid.get(docid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_docid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_docid.is_empty()
    }
}

/// Split paths into those that exist and those that don't. Missing ones
/// are logged; the caller decides whether an empty result is fatal.
pub fn partition_sources(paths: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let (found, missing): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.iter().cloned().partition(|p| p.is_file());
    for p in &missing {
        warn!("Cannot find {}", p.display());
    }
    (found, missing)
}

/// Column positions resolved once per file from its header.
struct Columns {
    charid: usize,
    words: usize,
    char_gender: usize,
    pubdate: usize,
    authgender: Option<usize>,
    docid: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, path: &Path) -> Result<Self> {
        let require = |names: &[&str]| {
            column(headers, names).ok_or_else(|| {
                anyhow!("{} is missing required column {}", path.display(), names.join("/"))
            })
        };
        let authgender = column(headers, &["authgender"]);
        let docid = column(headers, &["docid"]);
        if authgender.is_none() && docid.is_none() {
            return Err(anyhow!(
                "{} has neither an authgender nor a docid column",
                path.display()
            ));
        }
        Ok(Columns {
            charid: require(&["charid"])?,
            words: require(&["words"])?,
            char_gender: require(&["chargender", "gender"])?,
            pubdate: require(&["pubdate"])?,
            authgender,
            docid,
        })
    }
}

/// First header matching any of `names`, in preference order.
fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
}

/// Feed every row of one tab-separated character table into `builder`.
/// Returns the number of rows read.
pub fn read_source(
    path: &Path,
    metadata: Option<&AuthorMetadata>,
    builder: &mut GridBuilder,
) -> Result<usize> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .clone();
    let cols = Columns::resolve(&headers, path)?;

    let mut rows = 0;
    for record in reader.records() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        let line = record.position().map_or(0, |p| p.line());
        let field = |idx: usize| {
            record
                .get(idx)
                .map(str::trim)
                .ok_or_else(|| anyhow!("{}:{}: short row", path.display(), line))
        };

        let author_gender = match cols.authgender {
            Some(idx) => Some(field(idx)?),
            None => {
                let docid = field(cols.docid.unwrap_or_default())?;
                metadata.and_then(|m| m.author_gender(docid))
            }
        };
        builder
            .ingest(CharacterRow {
                id: field(cols.charid)?,
                words: field(cols.words)?,
                char_gender: field(cols.char_gender)?,
                author_gender,
                pubdate: field(cols.pubdate)?,
            })
            .with_context(|| format!("{}:{}", path.display(), line))?;
        rows += 1;
    }
    info!("Read {} rows from {}", rows, path.display());
    Ok(rows)
}
