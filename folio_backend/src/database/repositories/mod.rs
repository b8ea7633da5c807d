mod gallery;
mod journal;
mod lab_notes;
mod recent_media;
mod resumes;
mod sections;
mod tech_stack;
mod todos;

use super::models::{
    GalleryImageRecord, HomepageSectionRecord, JournalEntryRecord, LabNoteRecord,
    RecentBookRecord, RecentMovieRecord, ResumeRecord, TechStackRecord, TodoItemRecord,
    TodoListRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait LabNoteRepository {
    fn create(&self, record: &LabNoteRecord) -> Result<()>;
    fn update(&self, record: &LabNoteRecord) -> Result<bool>;
    fn get(&self, id: &str) -> Result<Option<LabNoteRecord>>;
    /// Newest first by `date`.
    fn list(&self, published_only: bool) -> Result<Vec<LabNoteRecord>>;
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait TodoRepository {
    fn create_list(&self, record: &TodoListRecord) -> Result<()>;
    fn update_list(&self, id: &str, title: &str, description: Option<&str>) -> Result<bool>;
    fn get_list(&self, id: &str) -> Result<Option<TodoListRecord>>;
    /// Pinned lists first, then newest.
    fn list_lists(&self) -> Result<Vec<TodoListRecord>>;
    fn set_pinned(&self, id: &str, pinned: bool) -> Result<bool>;
    fn count_pinned(&self) -> Result<usize>;
    fn delete_list(&self, id: &str) -> Result<bool>;
    fn add_item(&self, record: &TodoItemRecord) -> Result<()>;
    fn update_item(&self, id: &str, text: Option<&str>, completed: Option<bool>) -> Result<bool>;
    fn get_item(&self, id: &str) -> Result<Option<TodoItemRecord>>;
    fn delete_item(&self, id: &str) -> Result<bool>;
    fn items_for_list(&self, list_id: &str) -> Result<Vec<TodoItemRecord>>;
    fn next_item_order(&self, list_id: &str) -> Result<i64>;
}

pub trait GalleryRepository {
    fn create(&self, record: &GalleryImageRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<GalleryImageRecord>>;
    fn list(&self) -> Result<Vec<GalleryImageRecord>>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn set_order(&self, id: &str, display_order: i64) -> Result<bool>;
    fn next_order(&self) -> Result<i64>;
}

pub trait TechStackRepository {
    fn create(&self, record: &TechStackRecord) -> Result<()>;
    fn list(&self) -> Result<Vec<TechStackRecord>>;
    fn delete(&self, id: &str) -> Result<bool>;
    fn set_order(&self, id: &str, display_order: i64) -> Result<bool>;
    fn next_order(&self) -> Result<i64>;
}

pub trait ResumeRepository {
    fn insert(&self, record: &ResumeRecord) -> Result<()>;
    fn latest(&self) -> Result<Option<ResumeRecord>>;
}

pub trait JournalRepository {
    fn create(&self, record: &JournalEntryRecord) -> Result<()>;
    fn list(&self, published_only: bool) -> Result<Vec<JournalEntryRecord>>;
    fn delete(&self, id: &str) -> Result<bool>;
}

pub trait SectionRepository {
    fn list(&self, visible_only: bool) -> Result<Vec<HomepageSectionRecord>>;
    fn set_visible(&self, key: &str, visible: bool) -> Result<bool>;
}

pub trait RecentMediaRepository {
    fn upsert_movie(&self, record: &RecentMovieRecord, position: usize) -> Result<()>;
    /// Removes every movie whose id is not in `keep`. Returns rows removed.
    fn prune_movies(&self, keep: &[String]) -> Result<usize>;
    fn list_movies(&self) -> Result<Vec<RecentMovieRecord>>;
    fn upsert_book(&self, record: &RecentBookRecord, position: usize) -> Result<()>;
    fn prune_books(&self, keep: &[String]) -> Result<usize>;
    fn list_books(&self) -> Result<Vec<RecentBookRecord>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn lab_notes(&self) -> impl LabNoteRepository + '_ {
        lab_notes::SqliteLabNoteRepository { conn: self.conn }
    }

    pub fn todos(&self) -> impl TodoRepository + '_ {
        todos::SqliteTodoRepository { conn: self.conn }
    }

    pub fn gallery(&self) -> impl GalleryRepository + '_ {
        gallery::SqliteGalleryRepository { conn: self.conn }
    }

    pub fn tech_stack(&self) -> impl TechStackRepository + '_ {
        tech_stack::SqliteTechStackRepository { conn: self.conn }
    }

    pub fn resumes(&self) -> impl ResumeRepository + '_ {
        resumes::SqliteResumeRepository { conn: self.conn }
    }

    pub fn journal(&self) -> impl JournalRepository + '_ {
        journal::SqliteJournalRepository { conn: self.conn }
    }

    pub fn sections(&self) -> impl SectionRepository + '_ {
        sections::SqliteSectionRepository { conn: self.conn }
    }

    pub fn recent_media(&self) -> impl RecentMediaRepository + '_ {
        recent_media::SqliteRecentMediaRepository { conn: self.conn }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;
    use std::collections::BTreeMap;

    fn note(id: &str, date: &str, published: bool) -> LabNoteRecord {
        let mut content = BTreeMap::new();
        content.insert("intro".to_string(), "Hello".to_string());
        LabNoteRecord {
            id: id.into(),
            title: format!("Note {id}"),
            excerpt: "excerpt".into(),
            category: "rust".into(),
            tags: vec!["sqlite".into(), "axum".into()],
            read_time: "5 min".into(),
            date: date.into(),
            published,
            content,
            tabs: Some(serde_json::json!([{ "id": "intro", "label": "Intro" }])),
            admin_comment: Some("private".into()),
            created_at: "2024-01-01T00:00:00Z".into(),
            updated_at: None,
        }
    }

    #[test]
    fn lab_notes_round_trip_json_columns() {
        let db = test_database();
        db.with_repositories(|repos| {
            repos.lab_notes().create(&note("n1", "2024-02-01", true))?;
            let fetched = repos.lab_notes().get("n1")?.expect("note");
            assert_eq!(fetched.tags, vec!["sqlite".to_string(), "axum".to_string()]);
            assert_eq!(fetched.content.get("intro").map(String::as_str), Some("Hello"));
            assert!(fetched.tabs.is_some());
            assert_eq!(fetched.admin_comment.as_deref(), Some("private"));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn published_filter_and_date_order() {
        let db = test_database();
        db.with_repositories(|repos| {
            repos.lab_notes().create(&note("old", "2023-05-01", true))?;
            repos.lab_notes().create(&note("draft", "2024-06-01", false))?;
            repos.lab_notes().create(&note("new", "2024-03-01", true))?;

            let public: Vec<String> = repos
                .lab_notes()
                .list(true)?
                .into_iter()
                .map(|n| n.id)
                .collect();
            assert_eq!(public, vec!["new".to_string(), "old".to_string()]);
            assert_eq!(repos.lab_notes().list(false)?.len(), 3);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn deleting_a_list_cascades_to_items() {
        let db = test_database();
        db.with_repositories(|repos| {
            repos.todos().create_list(&TodoListRecord {
                id: "l1".into(),
                title: "Reading".into(),
                description: None,
                pinned: false,
                created_at: "2024-01-01T00:00:00Z".into(),
            })?;
            repos.todos().add_item(&TodoItemRecord {
                id: "i1".into(),
                list_id: "l1".into(),
                text: "Dune".into(),
                completed: false,
                display_order: 0,
                created_at: "2024-01-01T00:00:00Z".into(),
            })?;
            assert!(repos.todos().delete_list("l1")?);
            assert!(repos.todos().get_item("i1")?.is_none());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn default_sections_are_seeded_once() {
        let db = test_database();
        db.ensure_migrations().unwrap();
        let sections = db
            .with_repositories(|repos| repos.sections().list(false))
            .unwrap();
        assert_eq!(sections.first().map(|s| s.key.as_str()), Some("hero"));
        let keys: std::collections::HashSet<_> = sections.iter().map(|s| &s.key).collect();
        assert_eq!(keys.len(), sections.len());
    }

    #[test]
    fn prune_keeps_only_listed_ids() {
        let db = test_database();
        db.with_repositories(|repos| {
            for (idx, id) in ["a", "b", "c"].iter().enumerate() {
                repos.recent_media().upsert_movie(
                    &RecentMovieRecord {
                        external_id: id.to_string(),
                        tmdb_id: format!("{idx}"),
                        title: id.to_uppercase(),
                        director: String::new(),
                        poster_url: None,
                        watched_date: None,
                        source_permalink: format!("https://example.test/{id}"),
                    },
                    idx,
                )?;
            }
            let removed = repos.recent_media().prune_movies(&["b".to_string()])?;
            assert_eq!(removed, 2);
            let left = repos.recent_media().list_movies()?;
            assert_eq!(left.len(), 1);
            assert_eq!(left[0].external_id, "b");

            assert_eq!(repos.recent_media().prune_movies(&[])?, 1);
            assert!(repos.recent_media().list_movies()?.is_empty());
            Ok(())
        })
        .unwrap();
    }
}
