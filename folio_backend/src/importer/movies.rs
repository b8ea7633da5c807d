use super::rss::{parse_items, RssItem};
use super::source::HttpSource;
use super::ImportBatch;
use crate::config::ImporterConfig;
use crate::database::models::RecentMovieRecord;
use crate::utils::normalize_feed_date;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// How many watch-log entries are kept.
pub const MOVIE_LIMIT: usize = 4;
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    credits: TmdbCredits,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    #[serde(default)]
    name: String,
    #[serde(default)]
    job: String,
}

impl TmdbMovie {
    fn director(&self) -> String {
        self.credits
            .crew
            .iter()
            .find(|member| member.job == "Director")
            .map(|member| member.name.clone())
            .unwrap_or_default()
    }

    fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{POSTER_BASE_URL}{path}"))
    }
}

/// Reads the first [`MOVIE_LIMIT`] watch-log entries and resolves each one
/// against the movie metadata API. Entries that fail are skipped.
pub async fn collect_movies(
    source: &dyn HttpSource,
    config: &ImporterConfig,
) -> Result<ImportBatch<RecentMovieRecord>> {
    let api_key = config.require_tmdb_api_key()?;
    let feed_url = config.require_movie_feed_url()?;

    let feed = source
        .get_text(feed_url)
        .await
        .context("failed to fetch watch-log feed")?;
    let items = parse_items(&feed).context("failed to parse watch-log feed")?;

    let mut batch = ImportBatch::default();
    let mut seen = HashSet::new();
    for item in items.into_iter().take(MOVIE_LIMIT) {
        batch.scanned += 1;
        let Some(movie_id) = item.get("tmdb:movieId") else {
            tracing::warn!(
                importer = "movies",
                link = item.get("link").unwrap_or_default(),
                "feed item has no movie id, skipping"
            );
            batch.skipped += 1;
            continue;
        };
        let entry_id = diary_entry_id(&item, movie_id, batch.scanned, &mut seen);
        match resolve_movie(source, config, api_key, movie_id, entry_id, &item).await {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                tracing::warn!(
                    importer = "movies",
                    tmdb_id = movie_id,
                    error = ?err,
                    "movie metadata lookup failed, skipping"
                );
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

/// Identifies a watch-log entry: the item guid, else its permalink, else the
/// movie id. A key already used in this run gets the feed position appended.
fn diary_entry_id(
    item: &RssItem,
    movie_id: &str,
    position: usize,
    seen: &mut HashSet<String>,
) -> String {
    let base = item
        .get("guid")
        .or_else(|| item.get("link"))
        .unwrap_or(movie_id)
        .to_string();
    if seen.insert(base.clone()) {
        return base;
    }
    let unique = format!("{base}#{position}");
    seen.insert(unique.clone());
    unique
}

async fn resolve_movie(
    source: &dyn HttpSource,
    config: &ImporterConfig,
    api_key: &str,
    movie_id: &str,
    entry_id: String,
    item: &RssItem,
) -> Result<RecentMovieRecord> {
    let url = format!(
        "{}/movie/{movie_id}?api_key={api_key}&append_to_response=credits",
        config.tmdb_api_base.trim_end_matches('/')
    );
    let body = source.get_text(&url).await?;
    let movie: TmdbMovie =
        serde_json::from_str(&body).context("failed to decode movie metadata")?;

    Ok(RecentMovieRecord {
        external_id: entry_id,
        tmdb_id: movie_id.to_string(),
        director: movie.director(),
        poster_url: movie.poster_url(),
        title: movie.title,
        watched_date: item
            .get("letterboxd:watchedDate")
            .and_then(normalize_feed_date),
        source_permalink: item.get("link").unwrap_or_default().to_string(),
    })
}
