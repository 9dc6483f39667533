//! Universe files and listing filters.
//!
//! A universe can be a TOML file (`symbols = [...]`, optionally grouped under
//! `[sectors]`) or a plain text file with one symbol per line (`#` starts a
//! comment). Either way the result is deduplicated in first-seen order.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::provider::{DataError, UniverseProvider};
use crate::domain::Symbol;

/// Longest exchange symbol kept from a listing.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Substrings that mark index, partly-paid and other non-equity listings.
pub const EXCLUDED_FRAGMENTS: [&str; 3] = ["NIFTY", "-", "&"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sectors: BTreeMap<String, Vec<Symbol>>,
}

impl Universe {
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            sectors: BTreeMap::new(),
        }
    }

    /// Load from `.toml`, or from plain text for any other extension.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml")) {
            Self::from_toml(&content)
        } else {
            Ok(Self::from_text(&content))
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        toml::from_str(content)
            .map_err(|e| DataError::Other(format!("parse universe TOML: {e}")))
    }

    pub fn from_text(content: &str) -> Self {
        Self::from_symbols(
            content
                .lines()
                .map(|line| line.split('#').next().unwrap_or_default().trim())
                .filter(|line| !line.is_empty()),
        )
    }

    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self).map_err(|e| DataError::Other(format!("serialize universe: {e}")))
    }

    /// Every symbol (top-level list first, then sectors by name), deduplicated.
    pub fn all_symbols(&self) -> Vec<Symbol> {
        dedup(
            self.symbols
                .iter()
                .chain(self.sectors.values().flatten())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        )
    }

    pub fn len(&self) -> usize {
        self.all_symbols().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove repeats, keeping the first occurrence.
pub fn dedup(symbols: impl IntoIterator<Item = Symbol>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Whether a raw listing symbol is a plain equity worth scanning.
pub fn is_listing_equity(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && !EXCLUDED_FRAGMENTS.iter().any(|f| symbol.contains(f))
}

/// Apply the listing filter, dedup and truncate to `limit`.
pub fn filter_listing_symbols<'a>(
    raw: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<Symbol> {
    let kept = raw
        .into_iter()
        .map(str::trim)
        .filter(|s| is_listing_equity(s))
        .map(str::to_string);
    let mut symbols = dedup(kept);
    symbols.truncate(limit);
    symbols
}

/// Universe read from a file on disk.
#[derive(Debug, Clone)]
pub struct FileUniverse {
    path: PathBuf,
    limit: Option<usize>,
}

impl FileUniverse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl UniverseProvider for FileUniverse {
    fn name(&self) -> &str {
        "file"
    }

    fn symbols(&self) -> Result<Vec<Symbol>, DataError> {
        let mut symbols = Universe::from_file(&self.path)?.all_symbols();
        if let Some(limit) = self.limit {
            symbols.truncate(limit);
        }
        Ok(symbols)
    }
}

/// Fixed in-memory universe.
impl UniverseProvider for Universe {
    fn name(&self) -> &str {
        "static"
    }

    fn symbols(&self) -> Result<Vec<Symbol>, DataError> {
        Ok(self.all_symbols())
    }
}
