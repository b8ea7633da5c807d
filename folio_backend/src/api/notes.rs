use super::auth::AdminAccess;
use super::{ApiError, ApiResult, AppState};
use crate::database::models::LabNoteRecord;
use crate::notes::{LabNoteInput, LabNoteService, LabNoteView};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub(crate) async fn list_published_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<LabNoteView>> {
    let service = LabNoteService::new(state.database.clone());
    Ok(Json(service.list_published()?))
}

pub(crate) async fn get_published_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<LabNoteView> {
    let service = LabNoteService::new(state.database.clone());
    match service.get_published(&id)? {
        Some(note) => Ok(Json(note)),
        None => Err(ApiError::NotFound(format!("lab note {id} not found"))),
    }
}

pub(crate) async fn list_all_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> ApiResult<Vec<LabNoteRecord>> {
    let service = LabNoteService::new(state.database.clone());
    Ok(Json(service.list_all()?))
}

pub(crate) async fn create_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(input): Json<LabNoteInput>,
) -> Result<(StatusCode, Json<LabNoteRecord>), ApiError> {
    let service = LabNoteService::new(state.database.clone());
    let note = service.create(input)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub(crate) async fn update_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<LabNoteInput>,
) -> ApiResult<LabNoteRecord> {
    let service = LabNoteService::new(state.database.clone());
    Ok(Json(service.update(&id, input)?))
}

pub(crate) async fn delete_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = LabNoteService::new(state.database.clone());
    service.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
