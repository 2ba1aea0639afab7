//! services/api/src/web/users.rs
//!
//! Account endpoints: registration, login/logout, profile management and
//! password recovery.

use crate::error::ApiError;
use crate::web::auth::{clear_session_cookie, session_cookie, ApiJson, ApiPath, AuthUser};
use crate::web::notes::FlashcardResponse;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_notes_core::domain::User;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Login result. `session_token` doubles as a bearer token for non-browser clients.
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    post,
    path = "/user/create-user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Username or email already in use")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .register(
            req.username.as_deref(),
            req.email.as_deref(),
            req.password.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; sets the session cookie", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state
        .users
        .login(req.username.as_deref(), req.password.as_deref())
        .await?;

    let max_age = state.users.settings().session_ttl.num_seconds();
    let cookie = session_cookie(&session.id, max_age, state.config.secure_cookies);
    let response = LoginResponse {
        user: user.into(),
        session_token: session.id,
        expires_at: session.expires_at,
    };
    Ok(([(header::SET_COOKIE, cookie)], Json(response)))
}

#[utoipa::path(
    post,
    path = "/user/logout",
    responses(
        (status = 200, description = "Logout successful; clears the session cookie", body = MessageResponse),
        (status = 401, description = "No active session")
    ),
    tag = "users"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.logout(&auth.session_id).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Json(MessageResponse::new("Logged out successfully.")),
    ))
}

#[utoipa::path(
    get,
    path = "/user/get-user/{user_id}",
    params(("user_id" = Uuid, Path, description = "The user to read")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get(auth.user_id, user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/user/update-user/{user_id}",
    params(("user_id" = Uuid, Path, description = "The user to update")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid email"),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email already in use")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .update(
            auth.user_id,
            user_id,
            req.username.as_deref(),
            req.email.as_deref(),
        )
        .await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/user/delete-user/{user_id}",
    params(("user_id" = Uuid, Path, description = "The user to delete")),
    responses(
        (status = 200, description = "User and all their data deleted", body = MessageResponse),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.users.delete(auth.user_id, user_id).await?;
    Ok((
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Json(MessageResponse::new("User deleted successfully.")),
    ))
}

#[utoipa::path(
    get,
    path = "/user/list-users",
    responses(
        (status = 200, description = "Every registered user", body = [UserResponse]),
        (status = 403, description = "Caller is not an administrator")
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list(auth.user_id).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/user/fetch-flashcards/{user_id}",
    params(("user_id" = Uuid, Path, description = "The owner of the flashcards")),
    responses(
        (status = 200, description = "Flashcards across all of the user's notes", body = [FlashcardResponse]),
        (status = 403, description = "Not your account")
    ),
    tag = "users"
)]
pub async fn fetch_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<Vec<FlashcardResponse>>, ApiError> {
    let cards = state.flashcards.list_for_user(auth.user_id, user_id).await?;
    Ok(Json(cards.into_iter().map(FlashcardResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/user/change-password/{user_id}",
    params(("user_id" = Uuid, Path, description = "The account whose password changes")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed; other sessions revoked", body = MessageResponse),
        (status = 400, description = "Missing fields or wrong current password"),
        (status = 403, description = "Not your account")
    ),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .users
        .change_password(
            auth.user_id,
            user_id,
            req.current_password.as_deref(),
            req.new_password.as_deref(),
            Some(&auth.session_id),
        )
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully.")))
}

#[utoipa::path(
    post,
    path = "/user/request-password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link issued", body = MessageResponse),
        (status = 400, description = "Email missing"),
        (status = 404, description = "No account with this email")
    ),
    tag = "users"
)]
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .users
        .request_password_reset(req.email.as_deref())
        .await?;
    Ok(Json(MessageResponse::new(
        "Password reset link sent to your email.",
    )))
}

#[utoipa::path(
    post,
    path = "/user/password-reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Missing fields, mismatch, or expired/invalid token")
    ),
    tag = "users"
)]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .users
        .reset_password(
            req.token.as_deref(),
            req.new_password.as_deref(),
            req.confirm_password.as_deref(),
        )
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset successfully.")))
}
