mod auth;
mod files;
mod functions;
mod media;
mod notes;
mod showcase;
mod site;
mod todos;

pub use auth::ADMIN_KEY_HEADER;

use crate::config::FolioConfig;
use crate::database::Database;
use crate::error::ServiceError;
use crate::files::FileService;
use crate::importer::ImportRunner;
use crate::remote::RemoteStore;
use anyhow::Result;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: FolioConfig,
    pub database: Database,
    pub importer: ImportRunner,
    pub remote: Option<RemoteStore>,
}

impl AppState {
    pub(crate) fn file_service(&self) -> FileService {
        FileService::new(
            self.database.clone(),
            self.config.paths.clone(),
            self.config.public_base_url(),
        )
        .with_remote(self.remote.clone())
    }
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { message: msg }),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    message: "admin key required".into(),
                },
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { message: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        message: "internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

/// Domain errors raised by the services keep their meaning over HTTP;
/// everything else is an internal failure.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ServiceError>() {
            Some(not_found @ ServiceError::NotFound(_)) => ApiError::NotFound(not_found.to_string()),
            Some(ServiceError::Invalid(reason)) => ApiError::BadRequest(reason.clone()),
            None => ApiError::Internal(err),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
    admin_enabled: bool,
    store: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
        admin_enabled: state.config.admin_key.is_some(),
        store: if state.remote.is_some() { "remote" } else { "local" },
    })
}

pub fn router(state: AppState) -> Router {
    let max_upload_bytes = state.config.file.max_upload_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/functions/import-movies", post(functions::import_movies_handler))
        .route("/functions/import-books", post(functions::import_books_handler))
        .route("/lab-notes", get(notes::list_published_handler))
        .route("/lab-notes/:id", get(notes::get_published_handler))
        .route("/todos", get(todos::list_handler))
        .route("/gallery", get(showcase::list_gallery_handler))
        .route("/tech-stack", get(showcase::list_tech_stack_handler))
        .route("/journal", get(site::list_journal_handler))
        .route("/sections", get(site::list_visible_sections_handler))
        .route("/resume", get(files::download_resume_handler))
        .route("/storage/:bucket/*key", get(files::download_object_handler))
        .route("/recent/movies", get(media::list_movies_handler))
        .route("/recent/books", get(media::list_books_handler))
        .route(
            "/admin/lab-notes",
            get(notes::list_all_handler).post(notes::create_handler),
        )
        .route(
            "/admin/lab-notes/:id",
            put(notes::update_handler).delete(notes::delete_handler),
        )
        .route("/admin/todos", post(todos::create_list_handler))
        .route(
            "/admin/todos/:id",
            put(todos::update_list_handler).delete(todos::delete_list_handler),
        )
        .route("/admin/todos/:id/pin", post(todos::pin_handler))
        .route("/admin/todos/:id/items", post(todos::add_item_handler))
        .route(
            "/admin/todo-items/:id",
            put(todos::update_item_handler).delete(todos::delete_item_handler),
        )
        .route("/admin/gallery", post(showcase::upload_gallery_handler))
        .route("/admin/gallery/reorder", post(showcase::reorder_gallery_handler))
        .route(
            "/admin/gallery/:id",
            axum::routing::delete(showcase::delete_gallery_handler),
        )
        .route("/admin/tech-stack", post(showcase::create_tech_stack_handler))
        .route(
            "/admin/tech-stack/reorder",
            post(showcase::reorder_tech_stack_handler),
        )
        .route(
            "/admin/tech-stack/:id",
            axum::routing::delete(showcase::delete_tech_stack_handler),
        )
        .route("/admin/journal", post(site::create_journal_handler))
        .route(
            "/admin/journal/:id",
            axum::routing::delete(site::delete_journal_handler),
        )
        .route("/admin/sections", get(site::list_all_sections_handler))
        .route("/admin/sections/:key", put(site::set_section_visibility_handler))
        .route("/admin/resume", post(files::upload_resume_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes as usize))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let Some(port) = start_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port.saturating_add(MAX_PORT_ATTEMPTS - 1)
    )
}

pub async fn serve_http(state: AppState) -> Result<()> {
    let requested_port = state.config.api_port;
    tracing::info!(
        max_body_limit_mb = state.config.file.max_upload_bytes / (1024 * 1024),
        admin_enabled = state.config.admin_key.is_some(),
        "configured HTTP API"
    );
    let router = router(state);

    let (listener, actual_port) = find_available_port(requested_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != requested_port {
        tracing::warn!(
            requested_port,
            actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
