use crate::database::models::ResumeRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub(super) struct SqliteResumeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::ResumeRepository for SqliteResumeRepository<'conn> {
    fn insert(&self, record: &ResumeRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO resumes (id, object_key, original_name, mime, size_bytes, checksum, uploaded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.object_key,
                record.original_name,
                record.mime,
                record.size_bytes,
                record.checksum,
                record.uploaded_at
            ],
        )?;
        Ok(())
    }

    fn latest(&self) -> Result<Option<ResumeRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT id, object_key, original_name, mime, size_bytes, checksum, uploaded_at
                FROM resumes
                ORDER BY uploaded_at DESC, rowid DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    Ok(ResumeRecord {
                        id: row.get(0)?,
                        object_key: row.get(1)?,
                        original_name: row.get(2)?,
                        mime: row.get(3)?,
                        size_bytes: row.get(4)?,
                        checksum: row.get(5)?,
                        uploaded_at: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
