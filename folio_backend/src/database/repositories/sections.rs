use crate::database::models::HomepageSectionRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteSectionRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::SectionRepository for SqliteSectionRepository<'conn> {
    fn list(&self, visible_only: bool) -> Result<Vec<HomepageSectionRecord>> {
        let sql = if visible_only {
            "SELECT key, label, visible, display_order FROM homepage_sections WHERE visible = 1 ORDER BY display_order ASC"
        } else {
            "SELECT key, label, visible, display_order FROM homepage_sections ORDER BY display_order ASC"
        };
        let mut stmt = self.conn.prepare(sql)?;
        let sections = stmt
            .query_map([], |row| {
                Ok(HomepageSectionRecord {
                    key: row.get(0)?,
                    label: row.get(1)?,
                    visible: row.get::<_, i64>(2)? != 0,
                    display_order: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sections)
    }

    fn set_visible(&self, key: &str, visible: bool) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE homepage_sections SET visible = ?2 WHERE key = ?1",
            params![key, if visible { 1 } else { 0 }],
        )?;
        Ok(changed > 0)
    }
}
