use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BOOK_SCAN_LIMIT: usize = 30;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct FolioConfig {
    pub api_port: u16,
    pub paths: FolioPaths,
    pub admin_key: Option<String>,
    pub public_url: Option<String>,
    pub store: StoreConfig,
    pub importer: ImporterConfig,
    pub file: FileConfig,
}

impl FolioConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match non_empty_var("FOLIO_BASE_DIR") {
            Some(base) => FolioPaths::from_base_dir(base)?,
            None => FolioPaths::discover()?,
        };
        let api_port = env::var("FOLIO_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        Ok(Self {
            api_port,
            paths,
            admin_key: non_empty_var("FOLIO_ADMIN_KEY"),
            public_url: non_empty_var("FOLIO_PUBLIC_URL"),
            store: StoreConfig::from_env()?,
            importer: ImporterConfig::from_env(),
            file: FileConfig::from_env(),
        })
    }

    /// Local-only configuration rooted at `paths`, used by tests and embedders.
    pub fn new(api_port: u16, paths: FolioPaths) -> Self {
        Self {
            api_port,
            paths,
            admin_key: None,
            public_url: None,
            store: StoreConfig::Local,
            importer: ImporterConfig::default(),
            file: FileConfig::default(),
        }
    }

    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    pub fn with_importer(mut self, importer: ImporterConfig) -> Self {
        self.importer = importer;
        self
    }

    /// Prefix used when handing out public object URLs.
    pub fn public_base_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", self.api_port))
            .trim_end_matches('/')
            .to_string()
    }
}

/// Where importer results are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Local,
    Remote(RemoteStoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStoreConfig {
    pub url: String,
    pub service_key: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mode = env::var("FOLIO_STORE").unwrap_or_else(|_| "local".to_string());
        Self::resolve(
            &mode,
            non_empty_var("FOLIO_STORE_URL"),
            non_empty_var("FOLIO_STORE_SERVICE_KEY"),
        )
    }

    fn resolve(
        mode: &str,
        url: Option<String>,
        service_key: Option<String>,
    ) -> Result<Self, ConfigError> {
        match mode.trim().to_lowercase().as_str() {
            "" | "local" => Ok(StoreConfig::Local),
            "remote" => {
                let url = url.ok_or(ConfigError::Missing("FOLIO_STORE_URL"))?;
                let service_key =
                    service_key.ok_or(ConfigError::Missing("FOLIO_STORE_SERVICE_KEY"))?;
                Ok(StoreConfig::Remote(RemoteStoreConfig { url, service_key }))
            }
            other => Err(ConfigError::Invalid {
                name: "FOLIO_STORE",
                reason: format!("expected `local` or `remote`, got `{other}`"),
            }),
        }
    }
}

/// Importer settings. Required values stay optional here and are checked
/// when the importer that needs them runs.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    pub tmdb_api_key: Option<String>,
    pub movie_feed_url: Option<String>,
    pub book_feed_url: Option<String>,
    pub book_scan_limit: usize,
    pub interval_secs: Option<u64>,
    pub tmdb_api_base: String,
    pub goodreads_base: String,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            movie_feed_url: None,
            book_feed_url: None,
            book_scan_limit: DEFAULT_BOOK_SCAN_LIMIT,
            interval_secs: None,
            tmdb_api_base: "https://api.themoviedb.org/3".to_string(),
            goodreads_base: "https://www.goodreads.com".to_string(),
        }
    }
}

impl ImporterConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tmdb_api_key: non_empty_var("TMDB_API_KEY"),
            movie_feed_url: non_empty_var("FOLIO_MOVIE_FEED_URL"),
            book_feed_url: non_empty_var("FOLIO_BOOK_FEED_URL"),
            book_scan_limit: env::var("FOLIO_BOOK_SCAN_LIMIT")
                .ok()
                .and_then(|raw| raw.parse::<usize>().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_BOOK_SCAN_LIMIT),
            interval_secs: env::var("FOLIO_IMPORT_INTERVAL_SECS")
                .ok()
                .and_then(|raw| raw.parse::<u64>().ok())
                .filter(|secs| *secs > 0),
            ..defaults
        }
    }

    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("TMDB_API_KEY"))
    }

    pub fn require_movie_feed_url(&self) -> Result<&str, ConfigError> {
        self.movie_feed_url
            .as_deref()
            .ok_or(ConfigError::Missing("FOLIO_MOVIE_FEED_URL"))
    }

    pub fn require_book_feed_url(&self) -> Result<&str, ConfigError> {
        self.book_feed_url
            .as_deref()
            .ok_or(ConfigError::Missing("FOLIO_BOOK_FEED_URL"))
    }
}

#[derive(Debug, Clone)]
pub struct FileConfig {
    pub max_upload_bytes: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl FileConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = env::var("FOLIO_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Self { max_upload_bytes }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FolioPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub storage_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl FolioPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("folio.db");
        let storage_dir = base.join("storage");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            db_path,
            storage_dir,
            logs_dir,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|raw| {
        if raw.trim().is_empty() {
            None
        } else {
            Some(raw)
        }
    })
}
