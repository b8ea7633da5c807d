use super::auth::AdminAccess;
use super::{ApiError, AppState};
use crate::files::{guess_mime, ObjectBody, ResumeView, SaveFileInput};
use anyhow::Context;
use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{
    header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
    HeaderValue, StatusCode,
};
use axum::response::Response;
use axum::Json;
use std::collections::HashMap;
use tokio::fs::File as TokioFile;
use tokio_util::io::ReaderStream;

/// A multipart form with at most one `file` part plus plain text fields.
pub(crate) struct UploadForm {
    pub file: Option<SaveFileInput>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub(crate) async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = UploadForm {
            file: None,
            fields: HashMap::new(),
        };
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| ApiError::BadRequest(err.body_text()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let original_name = field.file_name().map(|s| s.to_string());
                let mime = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.body_text()))?;
                form.file = Some(SaveFileInput {
                    original_name,
                    mime,
                    data: data.to_vec(),
                });
            } else if !name.is_empty() {
                let value = field
                    .text()
                    .await
                    .map_err(|err| ApiError::BadRequest(err.body_text()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub(crate) fn take_file(&mut self) -> Result<SaveFileInput, ApiError> {
        self.file
            .take()
            .ok_or_else(|| ApiError::BadRequest("missing file field".into()))
    }

    pub(crate) fn take_field(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

pub(crate) async fn upload_resume_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeView>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let resume = state.file_service().save_resume(file).await?;
    tracing::info!(resume_id = %resume.id, size = resume.size_bytes, "resume uploaded");
    Ok((StatusCode::CREATED, Json(resume)))
}

pub(crate) async fn download_resume_handler(
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let Some(download) = state.file_service().latest_resume().await? else {
        return Err(ApiError::NotFound("resume not found".into()));
    };
    let content_type = download
        .metadata
        .mime
        .clone()
        .unwrap_or_else(|| "application/pdf".into());
    let mut response = object_response(download.body, &content_type).await?;
    let headers = response.headers_mut();

    if let Ok(value) = HeaderValue::from_str(&download.metadata.size_bytes.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    if let Some(name) = download.metadata.original_name.as_deref() {
        let safe = name.replace('"', "");
        let value = format!("inline; filename=\"{safe}\"");
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(CONTENT_DISPOSITION, value);
        }
    }
    Ok(response)
}

pub(crate) async fn download_object_handler(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let Some(body) = state.file_service().open_object(&bucket, &key).await? else {
        return Err(ApiError::NotFound(format!("object {bucket}/{key} not found")));
    };
    let mut response = object_response(body, guess_mime(&key)).await?;
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400"));
    Ok(response)
}

async fn object_response(object: ObjectBody, content_type: &str) -> Result<Response, ApiError> {
    let body = match object {
        ObjectBody::Disk(path) => {
            let file = TokioFile::open(&path)
                .await
                .with_context(|| format!("unable to open {}", path.display()))?;
            Body::from_stream(ReaderStream::new(file))
        }
        ObjectBody::Memory(bytes) => Body::from(bytes),
    };
    let mut response = Response::new(body);
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    Ok(response)
}
