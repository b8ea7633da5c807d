use super::books::collect_books;
use super::movies::collect_movies;
use super::sink::MediaSink;
use super::source::HttpSource;
use super::{ImportBatch, ImportSummary, ImporterKind};
use crate::config::ImporterConfig;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Runs importers against a shared source and sink. Runs of the same
/// importer are serialized; movies and books may overlap.
#[derive(Clone)]
pub struct ImportRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    config: ImporterConfig,
    source: Arc<dyn HttpSource>,
    sink: Arc<dyn MediaSink>,
    movies: Mutex<()>,
    books: Mutex<()>,
}

impl ImportRunner {
    pub fn new(
        config: ImporterConfig,
        source: Arc<dyn HttpSource>,
        sink: Arc<dyn MediaSink>,
    ) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                config,
                source,
                sink,
                movies: Mutex::new(()),
                books: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.inner.config
    }

    pub async fn run(&self, kind: ImporterKind) -> Result<ImportSummary> {
        let started = Instant::now();
        tracing::info!(importer = %kind, "import started");
        let result = match kind {
            ImporterKind::Movies => self.run_movies().await,
            ImporterKind::Books => self.run_books().await,
        };
        match &result {
            Ok(summary) => tracing::info!(
                importer = %kind,
                count = summary.count,
                scanned = summary.scanned,
                skipped = summary.skipped,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "import finished"
            ),
            Err(err) => tracing::error!(importer = %kind, error = ?err, "import failed"),
        }
        result
    }

    /// Runs every importer in turn, stopping at the first failure.
    pub async fn run_all(&self) -> Result<Vec<ImportSummary>> {
        let mut summaries = Vec::new();
        for kind in [ImporterKind::Movies, ImporterKind::Books] {
            summaries.push(self.run(kind).await?);
        }
        Ok(summaries)
    }

    async fn run_movies(&self) -> Result<ImportSummary> {
        let _guard = self.inner.movies.lock().await;
        let batch = collect_movies(self.inner.source.as_ref(), &self.inner.config).await?;
        self.inner.sink.replace_movies(&batch.records).await?;
        Ok(summarize(ImporterKind::Movies, &batch))
    }

    async fn run_books(&self) -> Result<ImportSummary> {
        let _guard = self.inner.books.lock().await;
        let batch = collect_books(self.inner.source.as_ref(), &self.inner.config).await?;
        self.inner.sink.replace_books(&batch.records).await?;
        Ok(summarize(ImporterKind::Books, &batch))
    }
}

fn summarize<T>(importer: ImporterKind, batch: &ImportBatch<T>) -> ImportSummary {
    ImportSummary {
        importer,
        count: batch.records.len(),
        scanned: batch.scanned,
        skipped: batch.skipped,
    }
}
