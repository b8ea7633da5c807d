use crate::database::models::JournalEntryRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteJournalRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::JournalRepository for SqliteJournalRepository<'conn> {
    fn create(&self, record: &JournalEntryRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO journal_entries (id, title, body, entry_date, published) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.title,
                record.body,
                record.entry_date,
                if record.published { 1 } else { 0 }
            ],
        )?;
        Ok(())
    }

    fn list(&self, published_only: bool) -> Result<Vec<JournalEntryRecord>> {
        let sql = if published_only {
            "SELECT id, title, body, entry_date, published FROM journal_entries WHERE published = 1 ORDER BY entry_date DESC"
        } else {
            "SELECT id, title, body, entry_date, published FROM journal_entries ORDER BY entry_date DESC"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let entries = stmt
            .query_map([], |row| {
                Ok(JournalEntryRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    body: row.get(2)?,
                    entry_date: row.get(3)?,
                    published: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM journal_entries WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
