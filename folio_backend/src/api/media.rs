use super::{ApiResult, AppState};
use crate::database::models::{RecentBookRecord, RecentMovieRecord};
use crate::recent::RecentMediaService;
use axum::extract::State;
use axum::Json;

pub(crate) async fn list_movies_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<RecentMovieRecord>> {
    let service = RecentMediaService::new(state.database.clone(), state.remote.clone());
    Ok(Json(service.movies().await?))
}

pub(crate) async fn list_books_handler(
    State(state): State<AppState>,
) -> ApiResult<Vec<RecentBookRecord>> {
    let service = RecentMediaService::new(state.database.clone(), state.remote.clone());
    Ok(Json(service.books().await?))
}
