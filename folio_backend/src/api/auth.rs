use super::{ApiError, AppState};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Proof that the request carried the configured admin key. Admin routes
/// take this as an argument; with no key configured every admin request is
/// rejected.
pub(crate) struct AdminAccess;

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_key.as_deref() else {
            tracing::debug!("admin request refused, no admin key configured");
            return Err(ApiError::Unauthorized);
        };
        let provided = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // blake3::Hash equality is constant time.
        if blake3::hash(provided.as_bytes()) == blake3::hash(expected.as_bytes()) {
            Ok(AdminAccess)
        } else {
            tracing::warn!(path = %parts.uri.path(), "admin request with wrong key");
            Err(ApiError::Unauthorized)
        }
    }
}
