use crate::config::FolioConfig;
use crate::database::Database;
use anyhow::{Context, Result};
use std::fs;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub database: Database,
}

pub async fn initialize(config: &FolioConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    create_dir_if_missing(&config.paths.data_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.storage_dir, &mut directories_created)?;
    create_dir_if_missing(&config.paths.logs_dir, &mut directories_created)?;

    let database = Database::connect(&config.paths)
        .with_context(|| format!("failed to open {}", config.paths.db_path.display()))?;
    let database_initialized = database.ensure_migrations()?;

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        database,
    })
}

fn create_dir_if_missing(path: &std::path::Path, created: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        created.push(path.display().to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolioPaths;
    use tempfile::tempdir;

    #[tokio::test]
    async fn initialize_creates_layout_once() {
        let temp = tempdir().unwrap();
        let config = FolioConfig::new(0, FolioPaths::from_base_dir(temp.path()).unwrap());

        let first = initialize(&config).await.unwrap();
        assert_eq!(first.directories_created.len(), 3);
        assert!(first.database_initialized);
        assert!(config.paths.db_path.exists());
        drop(first);

        let second = initialize(&config).await.unwrap();
        assert!(second.directories_created.is_empty());
        assert!(!second.database_initialized);
    }
}
