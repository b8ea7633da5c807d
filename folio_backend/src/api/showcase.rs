use super::auth::AdminAccess;
use super::files::UploadForm;
use super::{ApiError, ApiResult, AppState};
use crate::database::models::TechStackRecord;
use crate::showcase::{
    GalleryImageView, GalleryService, NewGalleryImage, ReorderRequest, TechStackInput,
    TechStackService,
};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

fn gallery(state: &AppState) -> GalleryService {
    GalleryService::new(state.database.clone(), state.file_service())
}

pub(crate) async fn list_gallery_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<GalleryImageView>> {
    Ok(Json(gallery(&state).list()?))
}

pub(crate) async fn upload_gallery_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<GalleryImageView>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let title = form
        .take_field("title")
        .ok_or_else(|| ApiError::BadRequest("missing title field".into()))?;
    let image = gallery(&state)
        .add_image(NewGalleryImage {
            title,
            description: form.take_field("description"),
            file,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

pub(crate) async fn reorder_gallery_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    gallery(&state).reorder(&req.ids)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_gallery_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    gallery(&state).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_tech_stack_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<TechStackRecord>> {
    let service = TechStackService::new(state.database.clone());
    Ok(Json(service.list()?))
}

pub(crate) async fn create_tech_stack_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(input): Json<TechStackInput>,
) -> Result<(StatusCode, Json<TechStackRecord>), ApiError> {
    let service = TechStackService::new(state.database.clone());
    let entry = service.create(input)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub(crate) async fn reorder_tech_stack_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<StatusCode, ApiError> {
    let service = TechStackService::new(state.database.clone());
    service.reorder(&req.ids)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_tech_stack_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = TechStackService::new(state.database.clone());
    service.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
