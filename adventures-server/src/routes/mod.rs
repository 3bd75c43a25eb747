pub mod adventures;
pub mod search;
pub mod users;

use adventures_core::{AdventureError, AdventureId, Caller, ErrorKind, UserId};
use axum::{
    Form, Json, Router,
    extract::{
        FromRequest, FromRequestParts, Request,
        rejection::{FormRejection, JsonRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::state::AppState;

/// Header carrying the authenticated user's id, set by the session layer in
/// front of this server. Requests without it are anonymous.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(adventures::router())
        .merge(search::router())
        .merge(users::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Danger,
}

/// One-line message for the client plus where to go next.
#[derive(Serialize, Deserialize, Debug)]
pub struct Notice {
    pub level: Level,
    pub message: String,
    pub redirect: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
            redirect: redirect.into(),
        }
    }

    pub fn success(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(Level::Success, message, redirect)
    }

    pub fn warning(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(Level::Warning, message, redirect)
    }
}

/// Convert errors to notice responses
pub struct AppError {
    error: anyhow::Error,
    redirect: &'static str,
}

impl AppError {
    /// Send the client somewhere other than `/` after this error.
    pub fn redirect_to(mut self, redirect: &'static str) -> Self {
        self.redirect = redirect;
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self.error.downcast_ref::<AdventureError>() {
            Some(AdventureError::LoginRequired) => {
                (StatusCode::UNAUTHORIZED, AdventureError::LoginRequired.to_string())
            }
            Some(err) => match err.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                ErrorKind::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, err.to_string()),
                ErrorKind::Internal => internal(&self.error),
            },
            None => internal(&self.error),
        };

        let body = Json(Notice::new(Level::Danger, message, self.redirect));
        (status, body).into_response()
    }
}

fn internal(error: &anyhow::Error) -> (StatusCode, String) {
    error!(error = %error, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong".to_string(),
    )
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            error: err.into(),
            redirect: "/",
        }
    }
}

/// The caller, read from [`USER_ID_HEADER`].
pub struct Identity(pub Caller);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Identity(Caller::Anonymous));
        };

        let raw = value.to_str().map_err(|_| {
            AdventureError::InvalidInput(format!("{USER_ID_HEADER} header is not valid text"))
        })?;
        let id: UserId = raw.parse()?;

        Ok(Identity(Caller::User(id)))
    }
}

/// A JSON body; unreadable bodies become a 400 notice.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AdventureError::InvalidInput(rejection.body_text()))?;

        Ok(JsonBody(value))
    }
}

/// A form body; unreadable bodies become a 400 notice.
pub struct FormBody<T>(pub T);

impl<S, T> FromRequest<S> for FormBody<T>
where
    Form<T>: FromRequest<S, Rejection = FormRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AdventureError::InvalidInput(rejection.body_text()))?;

        Ok(FormBody(value))
    }
}

/// Parse an adventure id from a path segment.
pub fn adventure_id(raw: &str) -> Result<AdventureId, AppError> {
    Ok(raw.parse::<AdventureId>()?)
}
