use std::collections::HashSet;
use std::path::Path;
use serde::{Deserialize, Serialize};
use ss_core::{Error, Result};

/// An RSS/Atom endpoint of one outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const BUILTIN_SOURCES: &[(&str, &str)] = &[
    ("GMA", "https://data.gmanetwork.com/gno/rss/news/feed.xml"),
    ("Daily Inquirer", "https://www.inquirer.net/fullfeed"),
    ("Manila Bulletin", "https://mb.com.ph/rss/news"),
    ("ABS-CBN", "https://news.abs-cbn.com/feed/"),
    ("Rappler", "https://www.rappler.com/feed/"),
    ("Philstar", "https://www.philstar.com/rss/headlines"),
    ("Manila Times", "https://www.manilatimes.net/news/feed/"),
    ("BusinessWorld", "https://www.bworldonline.com/feed"),
    ("The Daily Tribune", "https://www.tribune.net.ph/feed"),
];

/// Ordered, read-only mapping from outlet name to feed URL.
///
/// Lookups are exact: "gma" is not "GMA".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCatalog {
    sources: Vec<Source>,
}

impl SourceCatalog {
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name.as_str()) {
                return Err(Error::Config(format!("Duplicate source name: {}", source.name)));
            }
        }
        Ok(Self { sources })
    }

    /// Load a catalog from a JSON array of `{"name": ..., "url": ...}` objects.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let sources: Vec<Source> = serde_json::from_str(&raw)?;
        Self::new(sources)
    }

    pub fn get(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn url(&self, name: &str) -> Option<&str> {
        self.get(name).map(|s| s.url.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self {
            sources: BUILTIN_SOURCES
                .iter()
                .map(|(name, url)| Source::new(*name, *url))
                .collect(),
        }
    }
}
