//! Importer triggers. These keep the function-style contract the site
//! frontend already speaks: `{"success": true, "count": n}` on success and
//! a 500 with `{"error": "..."}` otherwise.

use super::AppState;
use crate::importer::ImporterKind;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ImportSuccess {
    success: bool,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ImportFailure {
    error: String,
}

pub(crate) async fn import_movies_handler(State(state): State<AppState>) -> Response {
    run_import(&state, ImporterKind::Movies).await
}

pub(crate) async fn import_books_handler(State(state): State<AppState>) -> Response {
    run_import(&state, ImporterKind::Books).await
}

async fn run_import(state: &AppState, kind: ImporterKind) -> Response {
    match state.importer.run(kind).await {
        Ok(summary) => Json(ImportSuccess {
            success: true,
            count: summary.count,
        })
        .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ImportFailure {
                error: format!("{err:#}"),
            }),
        )
            .into_response(),
    }
}
