use super::auth::AdminAccess;
use super::{ApiError, ApiResult, AppState};
use crate::database::models::TodoItemRecord;
use crate::todos::{
    CreateTodoListInput, TodoListView, TodoService, UpdateTodoItemInput, UpdateTodoListInput,
};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub(crate) struct PinRequest {
    pinned: bool,
}

#[derive(Deserialize)]
pub(crate) struct AddItemRequest {
    text: String,
}

pub(crate) async fn list_handler(State(state): State<AppState>) -> ApiResult<Vec<TodoListView>> {
    let service = TodoService::new(state.database.clone());
    Ok(Json(service.list()?))
}

pub(crate) async fn create_list_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Json(input): Json<CreateTodoListInput>,
) -> Result<(StatusCode, Json<TodoListView>), ApiError> {
    let service = TodoService::new(state.database.clone());
    let list = service.create_list(input)?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub(crate) async fn update_list_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTodoListInput>,
) -> Result<StatusCode, ApiError> {
    let service = TodoService::new(state.database.clone());
    service.update_list(&id, input)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn pin_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PinRequest>,
) -> Result<StatusCode, ApiError> {
    let service = TodoService::new(state.database.clone());
    service.set_pinned(&id, req.pinned)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn delete_list_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = TodoService::new(state.database.clone());
    service.delete_list(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_item_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<TodoItemRecord>), ApiError> {
    let service = TodoService::new(state.database.clone());
    let item = service.add_item(&list_id, &req.text)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub(crate) async fn update_item_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateTodoItemInput>,
) -> ApiResult<TodoItemRecord> {
    let service = TodoService::new(state.database.clone());
    Ok(Json(service.update_item(&id, input)?))
}

pub(crate) async fn delete_item_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = TodoService::new(state.database.clone());
    service.delete_item(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
