use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, PublicUser, RefreshResponse, UserRequest},
        extractors::{AuthUser, RefreshToken},
    },
    error::{AppError, AppResult},
    extract::AppJson,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", post(register).put(update_user))
}

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/revoke", post(revoke))
}

fn require_fields(email: &str, password: &str) -> AppResult<()> {
    if email.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    require_fields(&payload.email, &payload.password)?;
    let user = state
        .credentials
        .create_user(&payload.email, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UserRequest>,
) -> AppResult<Json<PublicUser>> {
    require_fields(&payload.email, &payload.password)?;
    let user = state
        .credentials
        .update_user(user_id, &payload.email, &payload.password)
        .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .credentials
        .verify_password(&payload.email, &payload.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state.tokens.issue_access(user.id)?;
    let refresh_token = state.tokens.issue_refresh(user.id)?;

    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        token,
        refresh_token,
    }))
}

#[instrument(skip(state, refresh))]
pub async fn refresh(
    State(state): State<AppState>,
    refresh: RefreshToken,
) -> AppResult<Json<RefreshResponse>> {
    if state.credentials.find_by_id(refresh.user_id).await?.is_none() {
        warn!(user_id = refresh.user_id, "refresh for unknown user");
        return Err(AppError::InvalidCredentials);
    }
    let token = state.tokens.issue_access(refresh.user_id)?;
    Ok(Json(RefreshResponse { token }))
}

#[instrument(skip(state, refresh))]
pub async fn revoke(State(state): State<AppState>, refresh: RefreshToken) -> AppResult<StatusCode> {
    state.tokens.revoke(&refresh.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
