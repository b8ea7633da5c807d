pub mod models;
pub mod repositories;

use crate::config::FolioPaths;
use anyhow::{anyhow, Result};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS lab_notes (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        excerpt TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        read_time TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        content TEXT NOT NULL DEFAULT '{}',
        tabs TEXT,
        admin_comment TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_lab_notes_published ON lab_notes(published, date);

    CREATE TABLE IF NOT EXISTS todo_lists (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        pinned INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS todo_items (
        id TEXT PRIMARY KEY,
        list_id TEXT NOT NULL,
        text TEXT NOT NULL,
        completed INTEGER NOT NULL DEFAULT 0,
        display_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        FOREIGN KEY (list_id) REFERENCES todo_lists(id) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_todo_items_list ON todo_items(list_id);

    CREATE TABLE IF NOT EXISTS gallery_images (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT,
        image_path TEXT NOT NULL,
        display_order INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tech_stack (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        icon TEXT,
        display_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS resumes (
        id TEXT PRIMARY KEY,
        object_key TEXT NOT NULL,
        original_name TEXT,
        mime TEXT,
        size_bytes INTEGER NOT NULL,
        checksum TEXT NOT NULL,
        uploaded_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS journal_entries (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        entry_date TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS homepage_sections (
        key TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        visible INTEGER NOT NULL DEFAULT 1,
        display_order INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS recent_movies (
        external_id TEXT PRIMARY KEY,
        tmdb_id TEXT NOT NULL,
        title TEXT NOT NULL,
        director TEXT NOT NULL,
        poster_url TEXT,
        watched_date TEXT,
        source_permalink TEXT NOT NULL,
        position INTEGER NOT NULL,
        imported_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS recent_books (
        external_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        cover_url TEXT,
        read_date TEXT,
        source_permalink TEXT NOT NULL,
        genre TEXT NOT NULL,
        position INTEGER NOT NULL,
        imported_at TEXT NOT NULL
    );
"#;

const DEFAULT_SECTIONS: &[(&str, &str)] = &[
    ("hero", "Hero"),
    ("about", "About"),
    ("lab-notes", "Lab Notes"),
    ("tech-stack", "Tech Stack"),
    ("gallery", "Gallery"),
    ("todos", "Todo Lists"),
    ("journal", "Journal"),
    ("recently", "Recently Watched & Read"),
    ("resume", "Resume"),
];

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &FolioPaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    /// Applies the schema and seeds the default homepage sections. Returns
    /// whether the database file was created by this process.
    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            seed_sections(conn)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    pub fn with_repositories<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    /// Runs `f` inside a single transaction. The transaction commits only
    /// when `f` returns `Ok`.
    pub fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T>,
    {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let value = f(repositories::SqliteRepositories::new(&tx))?;
            tx.commit()?;
            Ok(value)
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))?;
        f(&guard)
    }
}

fn seed_sections(conn: &Connection) -> Result<()> {
    for (order, (key, label)) in DEFAULT_SECTIONS.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO homepage_sections (key, label, visible, display_order) VALUES (?1, ?2, 1, ?3)",
            params![key, label, order as i64],
        )?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn test_database() -> Database {
    let conn = Connection::open_in_memory().expect("in-memory db");
    let db = Database::from_connection(conn, true);
    db.ensure_migrations().expect("migrations");
    db
}
