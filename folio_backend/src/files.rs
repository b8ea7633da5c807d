use crate::config::FolioPaths;
use crate::database::models::ResumeRecord;
use crate::database::repositories::ResumeRepository;
use crate::database::Database;
use crate::error::ServiceError;
use crate::remote::{Query, RemoteStore};
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use blake3::Hasher;
use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const RESUME_BUCKET: &str = "resumes";
pub const GALLERY_BUCKET: &str = "gallery";
const RESUMES_TABLE: &str = "resumes";

/// Object storage for uploads. Objects live at `storage/<bucket>/<key>` on
/// disk and are served under `/storage/<bucket>/<key>`, unless a remote
/// store is attached, in which case objects and resume rows live there.
#[derive(Clone)]
pub struct FileService {
    database: Database,
    paths: FolioPaths,
    public_base_url: String,
    remote: Option<RemoteStore>,
}

impl FileService {
    pub fn new(database: Database, paths: FolioPaths, public_base_url: String) -> Self {
        Self {
            database,
            paths,
            public_base_url,
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: Option<RemoteStore>) -> Self {
        self.remote = remote;
        self
    }

    pub async fn store_object(&self, bucket: &str, input: SaveFileInput) -> Result<StoredObject> {
        if input.data.is_empty() {
            return Err(ServiceError::invalid("file data may not be empty"));
        }
        validate_segment(bucket)?;

        let object_id = Uuid::new_v4().to_string();
        let original_name = input.original_name.as_deref().map(sanitize_filename);
        let key = match original_name
            .as_deref()
            .and_then(|name| Path::new(name).extension().and_then(|ext| ext.to_str()))
        {
            Some(ext) if !ext.is_empty() => format!("{object_id}.{}", ext.to_lowercase()),
            _ => object_id,
        };

        let mut hasher = Hasher::new();
        hasher.update(&input.data);
        let checksum = format!("blake3:{}", hasher.finalize().to_hex());
        let mime = infer::get(&input.data)
            .map(|kind| kind.mime_type().to_string())
            .or(input.mime);
        let size_bytes = input.data.len() as i64;

        match &self.remote {
            Some(remote) => {
                let content_type = mime.clone().unwrap_or_else(|| guess_mime(&key).to_string());
                remote.upload(bucket, &key, input.data, &content_type).await?;
            }
            None => {
                let absolute_path = self.paths.storage_dir.join(bucket).join(&key);
                if let Some(parent) = absolute_path.parent() {
                    fs::create_dir_all(parent).await.with_context(|| {
                        format!("failed to create storage directory {}", parent.display())
                    })?;
                }
                fs::write(&absolute_path, &input.data).await.with_context(|| {
                    format!("failed to write object to {}", absolute_path.display())
                })?;
            }
        }

        tracing::info!(bucket, key = %key, size = size_bytes, "stored object");

        Ok(StoredObject {
            public_url: self.public_url(bucket, &key),
            bucket: bucket.to_string(),
            key,
            original_name,
            mime,
            size_bytes,
            checksum,
        })
    }

    /// Locates an object for download. `None` when it does not exist.
    pub async fn open_object(&self, bucket: &str, key: &str) -> Result<Option<ObjectBody>> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        if let Some(remote) = &self.remote {
            return Ok(remote.download(bucket, key).await?.map(ObjectBody::Memory));
        }
        let absolute_path = self.paths.storage_dir.join(bucket).join(key);
        if fs::metadata(&absolute_path).await.is_err() {
            tracing::debug!(path = %absolute_path.display(), "object missing on disk");
            return Ok(None);
        }
        Ok(Some(ObjectBody::Disk(absolute_path)))
    }

    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        if let Some(remote) = &self.remote {
            return remote.remove(bucket, key).await;
        }
        let absolute_path = self.paths.storage_dir.join(bucket).join(key);
        fs::remove_file(&absolute_path)
            .await
            .with_context(|| format!("failed to remove {}", absolute_path.display()))
    }

    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        match &self.remote {
            Some(remote) => remote.public_url(bucket, key),
            None => format!("{}/storage/{bucket}/{key}", self.public_base_url),
        }
    }

    /// Stores a new resume. Older uploads stay on disk; the newest row wins.
    pub async fn save_resume(&self, input: SaveFileInput) -> Result<ResumeView> {
        let stored = self.store_object(RESUME_BUCKET, input).await?;
        let record = ResumeRecord {
            id: Uuid::new_v4().to_string(),
            object_key: stored.key.clone(),
            original_name: stored.original_name.clone(),
            mime: stored.mime.clone(),
            size_bytes: stored.size_bytes,
            checksum: stored.checksum.clone(),
            uploaded_at: now_utc_iso(),
        };
        match &self.remote {
            Some(remote) => remote.insert(RESUMES_TABLE, std::slice::from_ref(&record)).await?,
            None => self
                .database
                .with_repositories(|repos| repos.resumes().insert(&record))?,
        }
        Ok(ResumeView::from_record(record, stored.public_url))
    }

    pub async fn latest_resume(&self) -> Result<Option<FileDownload>> {
        let record = match &self.remote {
            Some(remote) => {
                let query = Query::new().order("uploaded_at", false).limit(1);
                let rows: Vec<ResumeRecord> = remote.select(RESUMES_TABLE, &query).await?;
                rows.into_iter().next()
            }
            None => self
                .database
                .with_repositories(|repos| repos.resumes().latest())?,
        };
        let Some(record) = record else {
            return Ok(None);
        };
        let Some(body) = self.open_object(RESUME_BUCKET, &record.object_key).await? else {
            tracing::warn!(object_key = %record.object_key, "resume row points at a missing object");
            return Ok(None);
        };
        let public_url = self.public_url(RESUME_BUCKET, &record.object_key);
        Ok(Some(FileDownload {
            metadata: ResumeView::from_record(record, public_url),
            body,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct SaveFileInput {
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub checksum: String,
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeView {
    pub id: String,
    pub original_name: Option<String>,
    pub mime: Option<String>,
    pub size_bytes: i64,
    pub checksum: String,
    pub uploaded_at: String,
    pub url: String,
}

impl ResumeView {
    fn from_record(record: ResumeRecord, url: String) -> Self {
        Self {
            id: record.id,
            original_name: record.original_name,
            mime: record.mime,
            size_bytes: record.size_bytes,
            checksum: record.checksum,
            uploaded_at: record.uploaded_at,
            url,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectBody {
    Disk(PathBuf),
    Memory(Bytes),
}

#[derive(Debug, Clone)]
pub struct FileDownload {
    pub metadata: ResumeView,
    pub body: ObjectBody,
}

/// Maps a file extension to a content type for objects stored without one.
pub fn guess_mime(name: &str) -> &'static str {
    match Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

fn validate_segment(segment: &str) -> Result<()> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if valid {
        Ok(())
    } else {
        Err(ServiceError::invalid(format!("invalid storage path segment `{segment}`")))
    }
}

fn sanitize_filename(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|file| file.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteStoreConfig;
    use crate::database::test_database;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::routing::any;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n";

    fn service(base: &Path) -> FileService {
        let paths = FolioPaths::from_base_dir(base).expect("paths");
        FileService::new(test_database(), paths, "http://folio.test".into())
    }

    #[tokio::test]
    async fn resume_upload_becomes_latest() {
        let temp = tempdir().expect("tempdir");
        let service = service(temp.path());

        assert!(service.latest_resume().await.unwrap().is_none());

        service
            .save_resume(SaveFileInput {
                original_name: Some("old cv.pdf".into()),
                mime: None,
                data: PDF_BYTES.to_vec(),
            })
            .await
            .expect("first upload");
        let second = service
            .save_resume(SaveFileInput {
                original_name: Some("cv.pdf".into()),
                mime: Some("application/pdf".into()),
                data: PDF_BYTES.to_vec(),
            })
            .await
            .expect("second upload");

        assert_eq!(second.original_name.as_deref(), Some("cv.pdf"));
        assert_eq!(second.mime.as_deref(), Some("application/pdf"));
        assert!(second.checksum.starts_with("blake3:"));
        assert!(second.url.starts_with("http://folio.test/storage/resumes/"));

        let latest = service
            .latest_resume()
            .await
            .unwrap()
            .expect("resume present");
        assert_eq!(latest.metadata.id, second.id);
        match latest.body {
            ObjectBody::Disk(path) => assert!(path.exists()),
            ObjectBody::Memory(_) => panic!("local storage should serve from disk"),
        }
    }

    #[tokio::test]
    async fn empty_uploads_are_rejected() {
        let temp = tempdir().expect("tempdir");
        let err = service(temp.path())
            .store_object(
                GALLERY_BUCKET,
                SaveFileInput {
                    original_name: Some("empty.png".into()),
                    mime: None,
                    data: Vec::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ServiceError>(),
            Some(&ServiceError::Invalid("file data may not be empty".into()))
        );
    }

    #[tokio::test]
    async fn traversal_keys_are_refused() {
        let temp = tempdir().expect("tempdir");
        let service = service(temp.path());
        assert!(service.open_object(GALLERY_BUCKET, "..").await.is_err());
        assert!(service
            .open_object(GALLERY_BUCKET, "../data/folio.db")
            .await
            .is_err());
        assert!(service
            .open_object(GALLERY_BUCKET, "missing.png")
            .await
            .unwrap()
            .is_none());
    }

    #[derive(Default)]
    struct HostedState {
        objects: HashMap<String, Vec<u8>>,
        resumes: Vec<serde_json::Value>,
    }

    type Hosted = Arc<Mutex<HostedState>>;

    async fn hosted_api(
        State(hosted): State<Hosted>,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> Response {
        let path = uri.path().to_string();
        let mut hosted = hosted.lock().unwrap();
        if let Some(object) = path.strip_prefix("/storage/v1/object/") {
            if method == Method::POST {
                hosted.objects.insert(object.to_string(), body.to_vec());
                return StatusCode::OK.into_response();
            }
            if method == Method::DELETE {
                hosted.objects.remove(object);
                return StatusCode::OK.into_response();
            }
            return match hosted.objects.get(object) {
                Some(data) => data.clone().into_response(),
                None => StatusCode::NOT_FOUND.into_response(),
            };
        }
        if path == "/rest/v1/resumes" {
            if method == Method::POST {
                let rows: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
                hosted.resumes.extend(rows);
                return StatusCode::CREATED.into_response();
            }
            let latest: Vec<_> = hosted.resumes.last().cloned().into_iter().collect();
            return Json(latest).into_response();
        }
        StatusCode::NOT_FOUND.into_response()
    }

    async fn hosted_store() -> (RemoteStore, Hosted) {
        let hosted: Hosted = Arc::default();
        let app = Router::new()
            .route("/*path", any(hosted_api))
            .with_state(hosted.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let remote = RemoteStore::new(
            &RemoteStoreConfig {
                url: format!("http://{addr}"),
                service_key: "service".into(),
            },
            reqwest::Client::new(),
        );
        (remote, hosted)
    }

    #[tokio::test]
    async fn remote_storage_keeps_objects_and_resume_rows_off_disk() {
        let temp = tempdir().expect("tempdir");
        let (remote, hosted) = hosted_store().await;
        let service = service(temp.path()).with_remote(Some(remote));

        let resume = service
            .save_resume(SaveFileInput {
                original_name: Some("cv.pdf".into()),
                mime: None,
                data: PDF_BYTES.to_vec(),
            })
            .await
            .expect("upload");
        assert!(resume.url.contains("/storage/v1/object/public/resumes/"));
        assert!(!temp.path().join("storage").join(RESUME_BUCKET).exists());
        assert_eq!(hosted.lock().unwrap().resumes.len(), 1);

        let latest = service
            .latest_resume()
            .await
            .unwrap()
            .expect("resume present");
        assert_eq!(latest.metadata.id, resume.id);
        match &latest.body {
            ObjectBody::Memory(data) => assert_eq!(&data[..], PDF_BYTES),
            ObjectBody::Disk(_) => panic!("remote storage should serve from memory"),
        }

        assert!(service
            .open_object(GALLERY_BUCKET, "gone.png")
            .await
            .unwrap()
            .is_none());

        let key = resume.url.rsplit('/').next().unwrap().to_string();
        service.delete_object(RESUME_BUCKET, &key).await.unwrap();
        assert!(hosted.lock().unwrap().objects.is_empty());
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("../../my cv (1).pdf"), "my_cv__1_.pdf");
        assert_eq!(guess_mime("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime("notes"), "application/octet-stream");
    }
}
