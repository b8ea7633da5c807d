use crate::database::models::LabNoteRecord;
use crate::database::repositories::LabNoteRepository;
use crate::database::Database;
use crate::error::ServiceError;
use crate::utils::now_utc_iso;
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct LabNoteService {
    database: Database,
}

impl LabNoteService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list_published(&self) -> Result<Vec<LabNoteView>> {
        self.database.with_repositories(|repos| {
            let notes = repos.lab_notes().list(true)?;
            Ok(notes.into_iter().map(LabNoteView::from_record).collect())
        })
    }

    /// Drafts are indistinguishable from missing notes on the public side.
    pub fn get_published(&self, id: &str) -> Result<Option<LabNoteView>> {
        self.database.with_repositories(|repos| {
            let note = repos.lab_notes().get(id)?;
            Ok(note
                .filter(|note| note.published)
                .map(LabNoteView::from_record))
        })
    }

    pub fn list_all(&self) -> Result<Vec<LabNoteRecord>> {
        self.database
            .with_repositories(|repos| repos.lab_notes().list(false))
    }

    pub fn create(&self, input: LabNoteInput) -> Result<LabNoteRecord> {
        input.validate()?;
        let record = input.into_record(Uuid::new_v4().to_string(), now_utc_iso(), None);
        self.database.with_repositories(|repos| {
            repos.lab_notes().create(&record)?;
            Ok(())
        })?;
        tracing::info!(note_id = %record.id, published = record.published, "lab note created");
        Ok(record)
    }

    pub fn update(&self, id: &str, input: LabNoteInput) -> Result<LabNoteRecord> {
        input.validate()?;
        self.database.with_repositories(|repos| {
            let notes = repos.lab_notes();
            let existing = notes
                .get(id)?
                .ok_or_else(|| ServiceError::not_found(format!("lab note {id}")))?;
            let record = input.into_record(existing.id, existing.created_at, Some(now_utc_iso()));
            notes.update(&record)?;
            Ok(record)
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.lab_notes().delete(id))?;
        if !deleted {
            return Err(ServiceError::not_found(format!("lab note {id}")));
        }
        Ok(())
    }
}

/// Editor payload for creating or replacing a lab note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabNoteInput {
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub read_time: String,
    /// Defaults to today when omitted.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub content: BTreeMap<String, String>,
    #[serde(default)]
    pub tabs: Option<serde_json::Value>,
    #[serde(default)]
    pub admin_comment: Option<String>,
}

impl LabNoteInput {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::invalid("lab note title may not be empty"));
        }
        if let Some(tabs) = &self.tabs {
            if !tabs.is_array() && !tabs.is_object() {
                return Err(ServiceError::invalid(
                    "lab note tabs must be a JSON array or object",
                ));
            }
        }
        Ok(())
    }

    fn into_record(
        self,
        id: String,
        created_at: String,
        updated_at: Option<String>,
    ) -> LabNoteRecord {
        let tags = self
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        LabNoteRecord {
            id,
            title: self.title.trim().to_string(),
            excerpt: self.excerpt,
            category: self.category,
            tags,
            read_time: self.read_time,
            date: self
                .date
                .filter(|date| !date.trim().is_empty())
                .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
            published: self.published,
            content: self.content,
            tabs: self.tabs,
            admin_comment: self.admin_comment.filter(|c| !c.trim().is_empty()),
            created_at,
            updated_at,
        }
    }
}

/// Public projection of a lab note. The admin comment never leaves the
/// admin endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabNoteView {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub read_time: String,
    pub date: String,
    pub content: BTreeMap<String, String>,
    pub tabs: Option<serde_json::Value>,
}

impl LabNoteView {
    fn from_record(record: LabNoteRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            excerpt: record.excerpt,
            category: record.category,
            tags: record.tags,
            read_time: record.read_time,
            date: record.date,
            content: record.content,
            tabs: record.tabs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;

    fn input(title: &str, published: bool) -> LabNoteInput {
        LabNoteInput {
            title: title.into(),
            tags: vec![" rust ".into(), "".into()],
            date: Some("2024-04-01".into()),
            published,
            admin_comment: Some("needs diagrams".into()),
            ..Default::default()
        }
    }

    #[test]
    fn drafts_stay_private() {
        let service = LabNoteService::new(test_database());
        let draft = service.create(input("Draft", false)).unwrap();
        let public = service.create(input("Public", true)).unwrap();

        let listed = service.list_published().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, public.id);
        assert!(service.get_published(&draft.id).unwrap().is_none());
        assert_eq!(service.list_all().unwrap().len(), 2);
    }

    #[test]
    fn create_normalizes_tags_and_keeps_comment_private() {
        let service = LabNoteService::new(test_database());
        let created = service.create(input("Tags", true)).unwrap();
        assert_eq!(created.tags, vec!["rust".to_string()]);
        assert_eq!(created.admin_comment.as_deref(), Some("needs diagrams"));

        let view = serde_json::to_value(service.get_published(&created.id).unwrap().unwrap()).unwrap();
        assert!(view.get("admin_comment").is_none());
    }

    #[test]
    fn update_preserves_created_at_and_sets_updated_at() {
        let service = LabNoteService::new(test_database());
        let created = service.create(input("Before", false)).unwrap();
        let updated = service.update(&created.id, input("After", true)).unwrap();
        assert_eq!(updated.title, "After");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn missing_notes_and_blank_titles_are_reported() {
        let service = LabNoteService::new(test_database());
        let err = service.update("nope", input("x", true)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::NotFound(_))
        ));
        let err = service.create(input("   ", true)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Invalid(_))
        ));
        assert!(service.delete("nope").is_err());
    }
}
