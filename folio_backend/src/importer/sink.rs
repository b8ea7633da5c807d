//! Destination tables for imported media. Every sink applies the same
//! contract: after a successful replace the table holds exactly the given
//! rows, and it is never observed empty mid-way.

use crate::database::models::{RecentBookRecord, RecentMovieRecord};
use crate::database::repositories::RecentMediaRepository;
use crate::database::Database;
use crate::remote::{Query, RemoteStore};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

pub const MOVIES_TABLE: &str = "recent_movies";
pub const BOOKS_TABLE: &str = "recent_books";

#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn replace_movies(&self, movies: &[RecentMovieRecord]) -> Result<()>;
    async fn replace_books(&self, books: &[RecentBookRecord]) -> Result<()>;
}

#[async_trait]
impl MediaSink for Database {
    async fn replace_movies(&self, movies: &[RecentMovieRecord]) -> Result<()> {
        let removed = self.in_transaction(|repos| {
            let media = repos.recent_media();
            for (position, movie) in movies.iter().enumerate() {
                media.upsert_movie(movie, position)?;
            }
            let keep: Vec<String> = movies.iter().map(|m| m.external_id.clone()).collect();
            media.prune_movies(&keep)
        })?;
        tracing::debug!(table = MOVIES_TABLE, kept = movies.len(), removed, "replaced rows");
        Ok(())
    }

    async fn replace_books(&self, books: &[RecentBookRecord]) -> Result<()> {
        let removed = self.in_transaction(|repos| {
            let media = repos.recent_media();
            for (position, book) in books.iter().enumerate() {
                media.upsert_book(book, position)?;
            }
            let keep: Vec<String> = books.iter().map(|b| b.external_id.clone()).collect();
            media.prune_books(&keep)
        })?;
        tracing::debug!(table = BOOKS_TABLE, kept = books.len(), removed, "replaced rows");
        Ok(())
    }
}

#[async_trait]
impl MediaSink for RemoteStore {
    async fn replace_movies(&self, movies: &[RecentMovieRecord]) -> Result<()> {
        let keep = movies.iter().map(|m| m.external_id.clone()).collect();
        replace_remote(self, MOVIES_TABLE, movies, keep).await
    }

    async fn replace_books(&self, books: &[RecentBookRecord]) -> Result<()> {
        let keep = books.iter().map(|b| b.external_id.clone()).collect();
        replace_remote(self, BOOKS_TABLE, books, keep).await
    }
}

/// Upserts first so readers never see an empty table, then prunes stale
/// rows. A failed prune leaves extra rows behind until the next run.
async fn replace_remote<T: Serialize + Sync>(
    store: &RemoteStore,
    table: &str,
    rows: &[T],
    keep: Vec<String>,
) -> Result<()> {
    if !rows.is_empty() {
        store.upsert(table, rows, "external_id").await?;
    }
    let stale = Query::new().not_in("external_id", &keep);
    if let Err(err) = store.delete(table, &stale).await {
        tracing::warn!(table, error = ?err, "failed to prune stale rows");
    }
    Ok(())
}
