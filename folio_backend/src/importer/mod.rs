//! Feed importers that refresh the "recently watched" and "recently read"
//! tables from external feeds.

pub mod books;
pub mod movies;
pub mod rss;
pub mod runner;
pub mod sink;
pub mod source;

pub use runner::ImportRunner;
pub use sink::MediaSink;
pub use source::{build_http_client, HttpSource};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImporterKind {
    Movies,
    Books,
}

impl ImporterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImporterKind::Movies => "movies",
            ImporterKind::Books => "books",
        }
    }
}

impl fmt::Display for ImporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows accepted by one importer pass plus bookkeeping for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch<T> {
    pub records: Vec<T>,
    /// Feed items (movies) or detail pages (books) examined.
    pub scanned: usize,
    pub skipped: usize,
}

impl<T> Default for ImportBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            scanned: 0,
            skipped: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub importer: ImporterKind,
    pub count: usize,
    pub scanned: usize,
    pub skipped: usize,
}
