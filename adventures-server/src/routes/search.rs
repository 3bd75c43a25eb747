//! Map search endpoint

use adventures_core::{SearchQuery, listing::SearchHit};
use axum::{Json, Router, extract::State, routing::post};

use crate::routes::{AppError, Identity, JsonBody};
use crate::state::AppState;

const SEARCH_PAGE: &str = "/adventures/search";

pub fn router() -> Router<AppState> {
    Router::new().route(SEARCH_PAGE, post(search))
}

/// POST /adventures/search - Active adventures with a waypoint in the box
async fn search(
    State(state): State<AppState>,
    Identity(caller): Identity,
    body: Result<JsonBody<SearchQuery>, AppError>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let JsonBody(query) = body.map_err(|e| e.redirect_to(SEARCH_PAGE))?;
    let hits = state
        .adventures()
        .lock()
        .search(&caller, &query)
        .map_err(|e| AppError::from(e).redirect_to(SEARCH_PAGE))?;

    Ok(Json(hits))
}
