use crate::database::models::TechStackRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteTechStackRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::TechStackRepository for SqliteTechStackRepository<'conn> {
    fn create(&self, record: &TechStackRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tech_stack (id, name, category, icon, display_order) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.name,
                record.category,
                record.icon,
                record.display_order
            ],
        )?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<TechStackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, icon, display_order FROM tech_stack ORDER BY display_order ASC, name ASC",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(TechStackRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    icon: row.get(3)?,
                    display_order: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM tech_stack WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn set_order(&self, id: &str, display_order: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE tech_stack SET display_order = ?2 WHERE id = ?1",
            params![id, display_order],
        )?;
        Ok(changed > 0)
    }

    fn next_order(&self) -> Result<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM tech_stack",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}
