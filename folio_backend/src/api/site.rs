use super::auth::AdminAccess;
use super::{ApiError, ApiResult, AppState};
use crate::database::models::{HomepageSectionRecord, JournalEntryRecord};
use crate::site::{JournalEntryInput, JournalService, SectionService, SectionVisibilityRequest};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub(crate) async fn list_visible_sections_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<HomepageSectionRecord>> {
    let service = SectionService::new(state.database.clone()).with_remote(state.remote.clone());
    Ok(Json(service.list_visible().await?))
}

pub(crate) async fn list_all_sections_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> ApiResult<Vec<HomepageSectionRecord>> {
    let service = SectionService::new(state.database.clone()).with_remote(state.remote.clone());
    Ok(Json(service.list_all().await?))
}

pub(crate) async fn set_section_visibility_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SectionVisibilityRequest>,
) -> Result<StatusCode, ApiError> {
    let service = SectionService::new(state.database.clone()).with_remote(state.remote.clone());
    service.set_visible(&key, req.visible).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn list_journal_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<JournalEntryRecord>> {
    let service = JournalService::new(state.database.clone());
    Ok(Json(service.list_published()?))
}

pub(crate) async fn create_journal_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(input): Json<JournalEntryInput>,
) -> Result<(StatusCode, Json<JournalEntryRecord>), ApiError> {
    let service = JournalService::new(state.database.clone());
    let entry = service.create(input)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub(crate) async fn delete_journal_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = JournalService::new(state.database.clone());
    service.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
