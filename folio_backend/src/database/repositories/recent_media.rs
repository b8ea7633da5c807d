use crate::database::models::{RecentBookRecord, RecentMovieRecord};
use crate::utils::now_utc_iso;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};

pub(super) struct SqliteRecentMediaRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> SqliteRecentMediaRepository<'conn> {
    fn prune(&self, table: &str, keep: &[String]) -> Result<usize> {
        if keep.is_empty() {
            return Ok(self.conn.execute(&format!("DELETE FROM {table}"), [])?);
        }
        let placeholders = vec!["?"; keep.len()].join(", ");
        let sql = format!("DELETE FROM {table} WHERE external_id NOT IN ({placeholders})");
        Ok(self.conn.execute(&sql, params_from_iter(keep.iter()))?)
    }
}

impl<'conn> super::RecentMediaRepository for SqliteRecentMediaRepository<'conn> {
    fn upsert_movie(&self, record: &RecentMovieRecord, position: usize) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO recent_movies (external_id, tmdb_id, title, director, poster_url,
                                       watched_date, source_permalink, position, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(external_id) DO UPDATE SET
                tmdb_id = excluded.tmdb_id,
                title = excluded.title,
                director = excluded.director,
                poster_url = excluded.poster_url,
                watched_date = excluded.watched_date,
                source_permalink = excluded.source_permalink,
                position = excluded.position,
                imported_at = excluded.imported_at
            "#,
            params![
                record.external_id,
                record.tmdb_id,
                record.title,
                record.director,
                record.poster_url,
                record.watched_date,
                record.source_permalink,
                position as i64,
                now_utc_iso()
            ],
        )?;
        Ok(())
    }

    fn prune_movies(&self, keep: &[String]) -> Result<usize> {
        self.prune("recent_movies", keep)
    }

    fn list_movies(&self) -> Result<Vec<RecentMovieRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT external_id, tmdb_id, title, director, poster_url, watched_date,
                   source_permalink
            FROM recent_movies
            ORDER BY position ASC
            "#,
        )?;
        let movies = stmt
            .query_map([], |row| {
                Ok(RecentMovieRecord {
                    external_id: row.get(0)?,
                    tmdb_id: row.get(1)?,
                    title: row.get(2)?,
                    director: row.get(3)?,
                    poster_url: row.get(4)?,
                    watched_date: row.get(5)?,
                    source_permalink: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    fn upsert_book(&self, record: &RecentBookRecord, position: usize) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO recent_books (external_id, title, author, cover_url, read_date,
                                      source_permalink, genre, position, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                cover_url = excluded.cover_url,
                read_date = excluded.read_date,
                source_permalink = excluded.source_permalink,
                genre = excluded.genre,
                position = excluded.position,
                imported_at = excluded.imported_at
            "#,
            params![
                record.external_id,
                record.title,
                record.author,
                record.cover_url,
                record.read_date,
                record.source_permalink,
                record.genre,
                position as i64,
                now_utc_iso()
            ],
        )?;
        Ok(())
    }

    fn prune_books(&self, keep: &[String]) -> Result<usize> {
        self.prune("recent_books", keep)
    }

    fn list_books(&self) -> Result<Vec<RecentBookRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT external_id, title, author, cover_url, read_date, source_permalink, genre
            FROM recent_books
            ORDER BY position ASC
            "#,
        )?;
        let books = stmt
            .query_map([], |row| {
                Ok(RecentBookRecord {
                    external_id: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    cover_url: row.get(3)?,
                    read_date: row.get(4)?,
                    source_permalink: row.get(5)?,
                    genre: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }
}
