//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use study_notes_core::{messages, ports::PortError};
use tracing::debug;

use crate::error::ApiError;
use crate::web::auth::{session_id_from_headers, AuthUser};
use crate::web::state::AppState;

/// Middleware that validates the session and extracts the user_id.
///
/// If valid, inserts an `AuthUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session_id = session_id_from_headers(req.headers())
        .ok_or_else(|| PortError::Unauthorized(messages::SESSION_INVALID.to_string()))?;

    let user_id = state.users.resolve_session(&session_id).await.map_err(|e| {
        debug!("Rejected session: {}", e);
        e
    })?;

    req.extensions_mut().insert(AuthUser {
        user_id,
        session_id,
    });
    Ok(next.run(req).await)
}
