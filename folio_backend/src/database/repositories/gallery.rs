use crate::database::models::GalleryImageRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteGalleryRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_image(row: &Row<'_>) -> rusqlite::Result<GalleryImageRecord> {
    Ok(GalleryImageRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image_path: row.get(3)?,
        display_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl<'conn> super::GalleryRepository for SqliteGalleryRepository<'conn> {
    fn create(&self, record: &GalleryImageRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO gallery_images (id, title, description, image_path, display_order, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.title,
                record.description,
                record.image_path,
                record.display_order,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<GalleryImageRecord>> {
        let image = self
            .conn
            .query_row(
                "SELECT id, title, description, image_path, display_order, created_at FROM gallery_images WHERE id = ?1",
                params![id],
                map_image,
            )
            .optional()?;
        Ok(image)
    }

    fn list(&self) -> Result<Vec<GalleryImageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, description, image_path, display_order, created_at FROM gallery_images ORDER BY display_order ASC, created_at ASC",
        )?;
        let images = stmt
            .query_map([], map_image)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM gallery_images WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn set_order(&self, id: &str, display_order: i64) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE gallery_images SET display_order = ?2 WHERE id = ?1",
            params![id, display_order],
        )?;
        Ok(changed > 0)
    }

    fn next_order(&self) -> Result<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(display_order) + 1, 0) FROM gallery_images",
            [],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}
