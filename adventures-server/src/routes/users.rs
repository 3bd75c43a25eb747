//! User registration and lookup

use adventures_core::{User, UserId};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::routes::{AppError, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{id}", get(get_user))
}

/// Request body for registering a user
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

/// POST /users - Register a user known to the identity provider
async fn register_user(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .adventures()
        .lock()
        .register_user(&req.username, &req.email)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let id: UserId = id.parse()?;
    let user = state.adventures().lock().user(id)?;
    Ok(Json(user))
}
