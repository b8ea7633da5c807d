use crate::database::models::LabNoteRecord;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteLabNoteRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, excerpt, category, tags, read_time, date, published,
           content, tabs, admin_comment, created_at, updated_at
    FROM lab_notes
"#;

/// Raw row with the JSON columns still encoded.
struct LabNoteRow {
    id: String,
    title: String,
    excerpt: String,
    category: String,
    tags: String,
    read_time: String,
    date: String,
    published: bool,
    content: String,
    tabs: Option<String>,
    admin_comment: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

impl LabNoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            excerpt: row.get(2)?,
            category: row.get(3)?,
            tags: row.get(4)?,
            read_time: row.get(5)?,
            date: row.get(6)?,
            published: row.get::<_, i64>(7)? != 0,
            content: row.get(8)?,
            tabs: row.get(9)?,
            admin_comment: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_record(self) -> Result<LabNoteRecord> {
        let tags = serde_json::from_str(&self.tags)
            .with_context(|| format!("lab note {} has malformed tags", self.id))?;
        let content = serde_json::from_str(&self.content)
            .with_context(|| format!("lab note {} has malformed content", self.id))?;
        let tabs = self
            .tabs
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .with_context(|| format!("lab note {} has malformed tabs", self.id))?;
        Ok(LabNoteRecord {
            id: self.id,
            title: self.title,
            excerpt: self.excerpt,
            category: self.category,
            tags,
            read_time: self.read_time,
            date: self.date,
            published: self.published,
            content,
            tabs,
            admin_comment: self.admin_comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

struct EncodedColumns {
    tags: String,
    content: String,
    tabs: Option<String>,
}

fn encode(record: &LabNoteRecord) -> Result<EncodedColumns> {
    Ok(EncodedColumns {
        tags: serde_json::to_string(&record.tags)?,
        content: serde_json::to_string(&record.content)?,
        tabs: record.tabs.as_ref().map(serde_json::to_string).transpose()?,
    })
}

impl<'conn> super::LabNoteRepository for SqliteLabNoteRepository<'conn> {
    fn create(&self, record: &LabNoteRecord) -> Result<()> {
        let encoded = encode(record)?;
        self.conn.execute(
            r#"
            INSERT INTO lab_notes (id, title, excerpt, category, tags, read_time, date, published,
                                   content, tabs, admin_comment, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.id,
                record.title,
                record.excerpt,
                record.category,
                encoded.tags,
                record.read_time,
                record.date,
                if record.published { 1 } else { 0 },
                encoded.content,
                encoded.tabs,
                record.admin_comment,
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn update(&self, record: &LabNoteRecord) -> Result<bool> {
        let encoded = encode(record)?;
        let changed = self.conn.execute(
            r#"
            UPDATE lab_notes SET
                title = ?2, excerpt = ?3, category = ?4, tags = ?5, read_time = ?6,
                date = ?7, published = ?8, content = ?9, tabs = ?10,
                admin_comment = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.title,
                record.excerpt,
                record.category,
                encoded.tags,
                record.read_time,
                record.date,
                if record.published { 1 } else { 0 },
                encoded.content,
                encoded.tabs,
                record.admin_comment,
                record.updated_at
            ],
        )?;
        Ok(changed > 0)
    }

    fn get(&self, id: &str) -> Result<Option<LabNoteRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                LabNoteRow::from_row,
            )
            .optional()?;
        row.map(LabNoteRow::into_record).transpose()
    }

    fn list(&self, published_only: bool) -> Result<Vec<LabNoteRecord>> {
        let sql = if published_only {
            format!("{SELECT_COLUMNS} WHERE published = 1 ORDER BY date DESC, created_at DESC")
        } else {
            format!("{SELECT_COLUMNS} ORDER BY date DESC, created_at DESC")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], LabNoteRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(LabNoteRow::into_record).collect()
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM lab_notes WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
