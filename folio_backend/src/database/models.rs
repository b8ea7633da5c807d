use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabNoteRecord {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub read_time: String,
    pub date: String,
    pub published: bool,
    /// Section id -> section text.
    pub content: BTreeMap<String, String>,
    pub tabs: Option<serde_json::Value>,
    pub admin_comment: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoListRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub pinned: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItemRecord {
    pub id: String,
    pub list_id: String,
    pub text: String,
    pub completed: bool,
    pub display_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GalleryImageRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_path: String,
    pub display_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechStackRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    pub icon: Option<String>,
    pub display_order: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResumeRecord {
    pub id: String,
    pub object_key: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub checksum: String,
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalEntryRecord {
    pub id: String,
    pub title: String,
    pub body: String,
    pub entry_date: String,
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HomepageSectionRecord {
    pub key: String,
    pub label: String,
    pub visible: bool,
    pub display_order: i64,
}

/// Cache row written by the movie importer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentMovieRecord {
    /// One per diary entry, so rewatches of the same film are separate rows.
    pub external_id: String,
    pub tmdb_id: String,
    pub title: String,
    pub director: String,
    pub poster_url: Option<String>,
    pub watched_date: Option<String>,
    pub source_permalink: String,
}

/// Cache row written by the book importer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentBookRecord {
    pub external_id: String,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub read_date: Option<String>,
    pub source_permalink: String,
    pub genre: String,
}
