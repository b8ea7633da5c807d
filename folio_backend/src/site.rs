//! Homepage section visibility and journal entries.

use crate::database::models::{HomepageSectionRecord, JournalEntryRecord};
use crate::database::repositories::{JournalRepository, SectionRepository};
use crate::database::Database;
use crate::error::ServiceError;
use crate::remote::{Query, RemoteStore};
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SECTIONS_TABLE: &str = "homepage_sections";

/// Section visibility, kept in the hosted table when a remote store is
/// attached and in the local database otherwise.
#[derive(Clone)]
pub struct SectionService {
    database: Database,
    remote: Option<RemoteStore>,
}

impl SectionService {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Option<RemoteStore>) -> Self {
        self.remote = remote;
        self
    }

    pub async fn list_visible(&self) -> Result<Vec<HomepageSectionRecord>> {
        self.list(true).await
    }

    pub async fn list_all(&self) -> Result<Vec<HomepageSectionRecord>> {
        self.list(false).await
    }

    async fn list(&self, visible_only: bool) -> Result<Vec<HomepageSectionRecord>> {
        let Some(remote) = &self.remote else {
            return self
                .database
                .with_repositories(|repos| repos.sections().list(visible_only));
        };
        let mut query = Query::new();
        if visible_only {
            query = query.eq("visible", true);
        }
        remote
            .select(SECTIONS_TABLE, &query.order("display_order", true))
            .await
    }

    pub async fn set_visible(&self, key: &str, visible: bool) -> Result<()> {
        let updated = match &self.remote {
            Some(remote) => {
                let by_key = Query::new().eq("key", key);
                let existing: Vec<HomepageSectionRecord> =
                    remote.select(SECTIONS_TABLE, &by_key.clone().limit(1)).await?;
                if !existing.is_empty() {
                    remote
                        .update(SECTIONS_TABLE, &by_key, &serde_json::json!({ "visible": visible }))
                        .await?;
                }
                !existing.is_empty()
            }
            None => self
                .database
                .with_repositories(|repos| repos.sections().set_visible(key, visible))?,
        };
        if !updated {
            return Err(ServiceError::not_found(format!("section {key}")));
        }
        tracing::info!(section = key, visible, "homepage section toggled");
        Ok(())
    }
}

#[derive(Clone)]
pub struct JournalService {
    database: Database,
}

impl JournalService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list_published(&self) -> Result<Vec<JournalEntryRecord>> {
        self.database
            .with_repositories(|repos| repos.journal().list(true))
    }

    pub fn create(&self, input: JournalEntryInput) -> Result<JournalEntryRecord> {
        if input.title.trim().is_empty() || input.body.trim().is_empty() {
            return Err(ServiceError::invalid(
                "journal entries need a title and a body",
            ));
        }
        let record = JournalEntryRecord {
            id: Uuid::new_v4().to_string(),
            title: input.title.trim().to_string(),
            body: input.body,
            entry_date: input
                .entry_date
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            published: input.published,
        };
        self.database
            .with_repositories(|repos| repos.journal().create(&record))?;
        Ok(record)
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.journal().delete(id))?;
        if !deleted {
            return Err(ServiceError::not_found(format!("journal entry {id}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalEntryInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub entry_date: Option<String>,
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionVisibilityRequest {
    pub visible: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteStoreConfig;
    use crate::database::test_database;
    use axum::extract::{OriginalUri, State};
    use axum::http::{Method, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::any;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn hidden_sections_drop_out_of_the_public_list() {
        let service = SectionService::new(test_database());
        let before = service.list_visible().await.unwrap().len();
        service.set_visible("gallery", false).await.unwrap();
        let visible = service.list_visible().await.unwrap();
        assert_eq!(visible.len(), before - 1);
        assert!(visible.iter().all(|s| s.key != "gallery"));
        assert_eq!(service.list_all().await.unwrap().len(), before);

        assert!(service.set_visible("nonexistent", true).await.is_err());
    }

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Hosted table holding a single `gallery` section.
    async fn sections_api(
        State(seen): State<Seen>,
        method: Method,
        OriginalUri(uri): OriginalUri,
    ) -> Response {
        seen.lock().unwrap().push(format!("{method} {uri}"));
        if method == Method::PATCH {
            return StatusCode::NO_CONTENT.into_response();
        }
        let query = uri.query().unwrap_or_default();
        if query.contains("key=eq.") && !query.contains("key=eq.gallery") {
            return Json(Vec::<HomepageSectionRecord>::new()).into_response();
        }
        Json(vec![HomepageSectionRecord {
            key: "gallery".into(),
            label: "Gallery".into(),
            visible: true,
            display_order: 3,
        }])
        .into_response()
    }

    #[tokio::test]
    async fn remote_sections_are_toggled_in_the_hosted_table() {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/*path", any(sections_api))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let remote = RemoteStore::new(
            &RemoteStoreConfig {
                url: format!("http://{addr}"),
                service_key: "service".into(),
            },
            reqwest::Client::new(),
        );
        let service = SectionService::new(test_database()).with_remote(Some(remote));

        let visible = service.list_visible().await.unwrap();
        assert_eq!(visible.len(), 1);
        service.set_visible("gallery", false).await.unwrap();
        let err = service.set_visible("nonexistent", true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotFound(_))
        ));

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen[0],
            "GET /rest/v1/homepage_sections?select=*&visible=eq.true&order=display_order.asc"
        );
        assert_eq!(
            seen[1],
            "GET /rest/v1/homepage_sections?select=*&key=eq.gallery&limit=1"
        );
        assert_eq!(seen[2], "PATCH /rest/v1/homepage_sections?key=eq.gallery");
        assert!(seen.iter().all(|req| !req.contains("PATCH /rest/v1/homepage_sections?key=eq.nonexistent")));
    }

    #[test]
    fn only_published_journal_entries_are_listed() {
        let service = JournalService::new(test_database());
        service
            .create(JournalEntryInput {
                title: "Public".into(),
                body: "hello".into(),
                entry_date: Some("2024-01-02".into()),
                published: true,
            })
            .unwrap();
        let draft = service
            .create(JournalEntryInput {
                title: "Draft".into(),
                body: "wip".into(),
                entry_date: None,
                published: false,
            })
            .unwrap();
        let listed = service.list_published().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Public");
        service.delete(&draft.id).unwrap();
    }
}
