//! Gallery images and the tech stack: ordered lists the admin panel
//! rearranges with drag and drop.

use crate::database::models::{GalleryImageRecord, TechStackRecord};
use crate::database::repositories::{GalleryRepository, TechStackRepository};
use crate::database::Database;
use crate::error::ServiceError;
use crate::files::{FileService, SaveFileInput, GALLERY_BUCKET};
use crate::utils::now_utc_iso;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Clone)]
pub struct GalleryService {
    database: Database,
    files: FileService,
}

impl GalleryService {
    pub fn new(database: Database, files: FileService) -> Self {
        Self { database, files }
    }

    pub fn list(&self) -> Result<Vec<GalleryImageView>> {
        let images = self
            .database
            .with_repositories(|repos| repos.gallery().list())?;
        Ok(images
            .into_iter()
            .map(|record| self.view(record))
            .collect())
    }

    pub async fn add_image(&self, input: NewGalleryImage) -> Result<GalleryImageView> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::invalid("gallery image title may not be empty"));
        }
        let stored = self
            .files
            .store_object(GALLERY_BUCKET, input.file)
            .await?;
        let record = self.database.with_repositories(|repos| {
            let gallery = repos.gallery();
            let record = GalleryImageRecord {
                id: Uuid::new_v4().to_string(),
                title: input.title.trim().to_string(),
                description: input.description.filter(|d| !d.trim().is_empty()),
                image_path: stored.key.clone(),
                display_order: gallery.next_order()?,
                created_at: now_utc_iso(),
            };
            gallery.create(&record)?;
            Ok(record)
        })?;
        Ok(self.view(record))
    }

    /// Applies a drag-and-drop order: `ids[i]` gets position `i`. The new
    /// order must name every image exactly once.
    pub fn reorder(&self, ids: &[String]) -> Result<()> {
        self.database.in_transaction(|repos| {
            let gallery = repos.gallery();
            let existing: HashSet<String> =
                gallery.list()?.into_iter().map(|image| image.id).collect();
            ensure_permutation(&existing, ids, "gallery image")?;
            for (position, id) in ids.iter().enumerate() {
                gallery.set_order(id, position as i64)?;
            }
            Ok(())
        })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let record = self.database.with_repositories(|repos| {
            let gallery = repos.gallery();
            let record = gallery
                .get(id)?
                .ok_or_else(|| ServiceError::not_found(format!("gallery image {id}")))?;
            gallery.delete(id)?;
            Ok(record)
        })?;
        if let Err(err) = self
            .files
            .delete_object(GALLERY_BUCKET, &record.image_path)
            .await
        {
            tracing::warn!(error = ?err, image_id = %id, "failed to remove gallery object");
        }
        Ok(())
    }

    fn view(&self, record: GalleryImageRecord) -> GalleryImageView {
        GalleryImageView {
            url: self.files.public_url(GALLERY_BUCKET, &record.image_path),
            id: record.id,
            title: record.title,
            description: record.description,
            display_order: record.display_order,
            created_at: record.created_at,
        }
    }
}

#[derive(Clone)]
pub struct TechStackService {
    database: Database,
}

impl TechStackService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn list(&self) -> Result<Vec<TechStackRecord>> {
        self.database
            .with_repositories(|repos| repos.tech_stack().list())
    }

    pub fn create(&self, input: TechStackInput) -> Result<TechStackRecord> {
        if input.name.trim().is_empty() || input.category.trim().is_empty() {
            return Err(ServiceError::invalid(
                "tech stack entries need a name and a category",
            ));
        }
        self.database.with_repositories(|repos| {
            let stack = repos.tech_stack();
            let record = TechStackRecord {
                id: Uuid::new_v4().to_string(),
                name: input.name.trim().to_string(),
                category: input.category.trim().to_string(),
                icon: input.icon,
                display_order: stack.next_order()?,
            };
            stack.create(&record)?;
            Ok(record)
        })
    }

    pub fn reorder(&self, ids: &[String]) -> Result<()> {
        self.database.in_transaction(|repos| {
            let stack = repos.tech_stack();
            let existing: HashSet<String> =
                stack.list()?.into_iter().map(|entry| entry.id).collect();
            ensure_permutation(&existing, ids, "tech stack entry")?;
            for (position, id) in ids.iter().enumerate() {
                stack.set_order(id, position as i64)?;
            }
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let deleted = self
            .database
            .with_repositories(|repos| repos.tech_stack().delete(id))?;
        if !deleted {
            return Err(ServiceError::not_found(format!("tech stack entry {id}")));
        }
        Ok(())
    }
}

fn ensure_permutation(existing: &HashSet<String>, ids: &[String], what: &str) -> Result<()> {
    let requested: HashSet<&String> = ids.iter().collect();
    if requested.len() != ids.len() {
        return Err(ServiceError::invalid(format!("duplicate {what} in new order")));
    }
    if let Some(unknown) = ids.iter().find(|id| !existing.contains(*id)) {
        return Err(ServiceError::not_found(format!("{what} {unknown}")));
    }
    if ids.len() != existing.len() {
        return Err(ServiceError::invalid(format!(
            "new order must list every {what} ({} expected, got {})",
            existing.len(),
            ids.len()
        )));
    }
    Ok(())
}

pub struct NewGalleryImage {
    pub title: String,
    pub description: Option<String>,
    pub file: SaveFileInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryImageView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub display_order: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechStackInput {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolioPaths;
    use crate::database::test_database;
    use tempfile::tempdir;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    fn image(title: &str) -> NewGalleryImage {
        NewGalleryImage {
            title: title.into(),
            description: None,
            file: SaveFileInput {
                original_name: Some(format!("{title}.png")),
                mime: None,
                data: PNG_BYTES.to_vec(),
            },
        }
    }

    #[tokio::test]
    async fn gallery_reorder_follows_drag_and_drop() {
        let temp = tempdir().unwrap();
        let db = test_database();
        let files = FileService::new(
            db.clone(),
            FolioPaths::from_base_dir(temp.path()).unwrap(),
            "http://folio.test".into(),
        );
        let service = GalleryService::new(db, files);

        let a = service.add_image(image("a")).await.unwrap();
        let b = service.add_image(image("b")).await.unwrap();
        let c = service.add_image(image("c")).await.unwrap();
        assert!(a.url.starts_with("http://folio.test/storage/gallery/"));

        service
            .reorder(&[c.id.clone(), a.id.clone(), b.id.clone()])
            .unwrap();
        let order: Vec<_> = service.list().unwrap().into_iter().map(|i| i.title).collect();
        assert_eq!(order, vec!["c", "a", "b"]);

        // Partial orders are refused and leave the stored order untouched.
        assert!(service.reorder(&[a.id.clone(), b.id.clone()]).is_err());
        assert!(service
            .reorder(&[a.id.clone(), a.id.clone(), b.id.clone()])
            .is_err());
        let order: Vec<_> = service.list().unwrap().into_iter().map(|i| i.title).collect();
        assert_eq!(order, vec!["c", "a", "b"]);

        service.delete(&a.id).await.unwrap();
        assert_eq!(service.list().unwrap().len(), 2);
    }

    #[test]
    fn tech_stack_appends_then_reorders() {
        let service = TechStackService::new(test_database());
        let rust = service
            .create(TechStackInput {
                name: "Rust".into(),
                category: "language".into(),
                icon: None,
            })
            .unwrap();
        let sqlite = service
            .create(TechStackInput {
                name: "SQLite".into(),
                category: "storage".into(),
                icon: Some("db".into()),
            })
            .unwrap();
        assert_eq!(sqlite.display_order, 1);

        service.reorder(&[sqlite.id.clone(), rust.id.clone()]).unwrap();
        let names: Vec<_> = service.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["SQLite", "Rust"]);

        assert!(service
            .reorder(&[sqlite.id.clone(), "ghost".to_string()])
            .is_err());
    }
}
