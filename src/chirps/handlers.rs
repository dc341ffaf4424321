use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    chirps::dto::{Chirp, CreateChirpRequest},
    error::AppResult,
    extract::{AppJson, AppPath},
    state::AppState,
};

pub fn chirp_routes() -> Router<AppState> {
    Router::new()
        .route("/chirps", get(list_chirps).post(create_chirp))
        .route("/chirps/:id", get(get_chirp))
}

#[instrument(skip(state, payload))]
pub async fn create_chirp(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<CreateChirpRequest>,
) -> AppResult<(StatusCode, Json<Chirp>)> {
    let chirp = state.chirps.post(&payload.body).await?;
    Ok((StatusCode::CREATED, Json(chirp)))
}

#[instrument(skip(state))]
pub async fn list_chirps(State(state): State<AppState>) -> AppResult<Json<Vec<Chirp>>> {
    Ok(Json(state.chirps.list().await?))
}

#[instrument(skip(state))]
pub async fn get_chirp(
    State(state): State<AppState>,
    AppPath(id): AppPath<u64>,
) -> AppResult<Json<Chirp>> {
    Ok(Json(state.chirps.get(id).await?))
}
