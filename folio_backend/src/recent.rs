//! Read side of the imported "recently watched" and "recently read" lists.

use crate::database::models::{RecentBookRecord, RecentMovieRecord};
use crate::database::repositories::RecentMediaRepository;
use crate::database::Database;
use crate::importer::sink::{BOOKS_TABLE, MOVIES_TABLE};
use crate::remote::{Query, RemoteStore};
use anyhow::Result;

/// Reads from wherever the importers write: the hosted store when one is
/// configured, the local database otherwise.
#[derive(Clone)]
pub struct RecentMediaService {
    database: Database,
    remote: Option<RemoteStore>,
}

impl RecentMediaService {
    pub fn new(database: Database, remote: Option<RemoteStore>) -> Self {
        Self { database, remote }
    }

    pub async fn movies(&self) -> Result<Vec<RecentMovieRecord>> {
        match &self.remote {
            Some(remote) => {
                let query = Query::new().order("watched_date", false);
                remote.select(MOVIES_TABLE, &query).await
            }
            None => self
                .database
                .with_repositories(|repos| repos.recent_media().list_movies()),
        }
    }

    pub async fn books(&self) -> Result<Vec<RecentBookRecord>> {
        match &self.remote {
            Some(remote) => {
                let query = Query::new().order("read_date", false);
                remote.select(BOOKS_TABLE, &query).await
            }
            None => self
                .database
                .with_repositories(|repos| repos.recent_media().list_books()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;
    use crate::importer::MediaSink;

    #[tokio::test]
    async fn local_reads_follow_import_order() {
        let db = test_database();
        let books = ["b2", "b1"].map(|id| RecentBookRecord {
            external_id: id.into(),
            title: format!("Title {id}"),
            author: "Author".into(),
            cover_url: None,
            read_date: None,
            source_permalink: String::new(),
            genre: "Classics".into(),
        });
        db.replace_books(&books).await.unwrap();

        let service = RecentMediaService::new(db, None);
        let ids: Vec<_> = service
            .books()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.external_id)
            .collect();
        assert_eq!(ids, vec!["b2", "b1"]);
        assert!(service.movies().await.unwrap().is_empty());
    }
}
