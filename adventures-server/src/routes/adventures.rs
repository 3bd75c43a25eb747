//! Adventure lifecycle endpoints

use std::collections::HashMap;

use adventures_core::{
    AdventureError, AdventureForm, AdventureResult, JoinOutcome, LeaveOutcome, Mode,
    WaypointSubmission,
    listing::{AdventureDetail, EditView, ListedAdventure, MyAdventures},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::routes::{AppError, FormBody, Identity, JsonBody, Notice, adventure_id};
use crate::state::AppState;

/// Formats accepted for `date` in form submissions, besides RFC 3339.
/// Times without an offset are taken as UTC.
const FORM_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/adventures", get(all_adventures).post(create_adventure))
        .route("/adventures/mine", get(my_adventures))
        .route("/adventures/new", post(create_adventure_form))
        .route(
            "/adventures/{id}",
            get(show_adventure).put(edit_adventure).delete(delete_adventure),
        )
        .route("/adventures/{id}/edit", get(edit_view).post(edit_adventure_form))
        .route("/adventures/{id}/join", post(join_adventure))
        .route("/adventures/{id}/leave", post(leave_adventure))
}

/// GET /adventures - Every active adventure
async fn all_adventures(
    State(state): State<AppState>,
    Identity(caller): Identity,
) -> Result<Json<Vec<ListedAdventure>>, AppError> {
    let listed = state.adventures().lock().all_adventures(&caller)?;
    Ok(Json(listed))
}

/// GET /adventures/mine - Adventures the caller created or joined
async fn my_adventures(
    State(state): State<AppState>,
    Identity(caller): Identity,
) -> Result<Json<MyAdventures>, AppError> {
    let mine = state.adventures().lock().my_adventures(&caller)?;
    Ok(Json(mine))
}

/// POST /adventures - Create from a JSON body
async fn create_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    JsonBody(form): JsonBody<AdventureForm>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    let id = state.adventures().lock().create(&caller, &form)?;

    Ok((
        StatusCode::CREATED,
        Json(Notice::success(
            "Adventure item was successfully created",
            format!("/adventures/{id}"),
        )),
    ))
}

/// POST /adventures/new - Create from form fields with `marker_N` waypoints
async fn create_adventure_form(
    State(state): State<AppState>,
    Identity(caller): Identity,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Result<(StatusCode, Json<Notice>), AppError> {
    // Anonymous callers learn they must log in before hearing about bad fields
    caller.require_login()?;
    let form = form_from_fields(&fields)?;
    let id = state.adventures().lock().create(&caller, &form)?;

    Ok((
        StatusCode::CREATED,
        Json(Notice::success(
            "Adventure item was successfully created",
            format!("/adventures/{id}"),
        )),
    ))
}

/// GET /adventures/{id} - Details of one active adventure
async fn show_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<AdventureDetail>, AppError> {
    let id = adventure_id(&id)?;
    let detail = state.adventures().lock().show(&caller, id)?;
    Ok(Json(detail))
}

/// GET /adventures/{id}/edit - Current values for the edit form
async fn edit_view(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<EditView>, AppError> {
    let id = adventure_id(&id)?;
    let view = state.adventures().lock().edit_view(&caller, id)?;
    Ok(Json(view))
}

/// PUT /adventures/{id} - Edit from a JSON body
async fn edit_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<AdventureForm>,
) -> Result<Json<Notice>, AppError> {
    let id = adventure_id(&id)?;
    state.adventures().lock().edit(&caller, id, &form)?;

    Ok(Json(Notice::success(
        "Adventure has been successfully edited",
        "/",
    )))
}

/// POST /adventures/{id}/edit - Edit from form fields
async fn edit_adventure_form(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
    FormBody(fields): FormBody<HashMap<String, String>>,
) -> Result<Json<Notice>, AppError> {
    let id = adventure_id(&id)?;
    caller.require_login()?;
    let form = form_from_fields(&fields)?;
    state.adventures().lock().edit(&caller, id, &form)?;

    Ok(Json(Notice::success(
        "Adventure has been successfully edited",
        "/",
    )))
}

/// DELETE /adventures/{id}
async fn delete_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Notice>, AppError> {
    let id = adventure_id(&id)?;
    state.adventures().lock().delete(&caller, id)?;

    Ok(Json(Notice::success("Your adventure has been deleted", "/")))
}

/// POST /adventures/{id}/join
async fn join_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Notice>, AppError> {
    let id = adventure_id(&id)?;
    let outcome = state.adventures().lock().join(&caller, id)?;

    let notice = match outcome {
        JoinOutcome::Joined => Notice::success("You have joined this adventure", "/"),
        JoinOutcome::AlreadyJoined => {
            Notice::warning("You have already joined this adventure", "/")
        }
    };
    Ok(Json(notice))
}

/// POST /adventures/{id}/leave
async fn leave_adventure(
    State(state): State<AppState>,
    Identity(caller): Identity,
    Path(id): Path<String>,
) -> Result<Json<Notice>, AppError> {
    let id = adventure_id(&id)?;
    let outcome = state.adventures().lock().leave(&caller, id)?;

    let notice = match outcome {
        LeaveOutcome::Left => Notice::success("You have left the adventure", "/"),
        LeaveOutcome::NotJoined => Notice::warning("You have not joined this adventure", "/"),
    };
    Ok(Json(notice))
}

/// Build an [`AdventureForm`] from flat form fields: `date`, `info`, `mode`
/// and `marker_0`, `marker_1`, ...
fn form_from_fields(fields: &HashMap<String, String>) -> AdventureResult<AdventureForm> {
    let date = fields
        .get("date")
        .filter(|raw| !raw.trim().is_empty())
        .ok_or(AdventureError::MissingField("date"))?;
    let date = parse_form_date(date).ok_or(AdventureError::InvalidField("date"))?;

    let mode = match fields.get("mode").filter(|raw| !raw.trim().is_empty()) {
        Some(raw) => raw.parse::<Mode>()?,
        None => Mode::default(),
    };

    Ok(AdventureForm {
        date,
        info: fields.get("info").cloned().unwrap_or_default(),
        mode,
        waypoints: WaypointSubmission::from_indexed_fields(fields),
    })
}

fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    FORM_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{
        app,
        testing::{Payload, send},
    };
    use axum::http::Method;
    use chrono::TimeZone;
    use serde_json::json;

    struct Fixture {
        app: Router,
        john: i64,
        jane: i64,
    }

    fn fixture() -> Fixture {
        let state = AppState::in_memory();
        let (john, jane) = {
            let mut adventures = state.adventures().lock();
            let john = adventures.register_user("john", "john@example.com").unwrap();
            let jane = adventures.register_user("jane", "jane@example.com").unwrap();
            (john.id.0, jane.id.0)
        };

        Fixture {
            app: app(state),
            john,
            jane,
        }
    }

    fn new_adventure(markers: &[&str]) -> Payload {
        Payload::Json(json!({
            "date": "2100-05-01T09:00:00Z",
            "info": "Some info today",
            "mode": "amateurish",
            "waypoints": markers,
        }))
    }

    async fn create(fixture: &Fixture, markers: &[&str]) -> String {
        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures",
            Some(fixture.john),
            new_adventure(markers),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["redirect"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_then_show() {
        let fixture = fixture();
        let location = create(&fixture, &["(1.0, 2.0)", "(3.0, 4.0)"]).await;

        let (status, body) = send(&fixture.app, Method::GET, &location, None, Payload::Empty).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "john");
        assert_eq!(body["mode"], "amateurish");
        assert_eq!(body["joined"], 1);
        assert_eq!(body["markers"], json!([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[tokio::test]
    async fn test_create_drops_unusable_waypoint_entries() {
        let fixture = fixture();
        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures",
            Some(fixture.john),
            Payload::Json(json!({
                "date": "2100-05-01T09:00:00Z",
                "info": "Mixed list",
                "waypoints": ["(1, 2)", [3.0, 4.0], 5, null],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let location = body["redirect"].as_str().unwrap();
        let (_, detail) = send(&fixture.app, Method::GET, location, None, Payload::Empty).await;
        assert_eq!(detail["markers"], json!([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[tokio::test]
    async fn test_unknown_mode_is_a_notice() {
        let fixture = fixture();

        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures",
            Some(fixture.john),
            Payload::Json(json!({
                "date": "2100-05-01T09:00:00Z",
                "info": "Some info today",
                "mode": "extreme",
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["level"], "danger");
        assert_eq!(body["redirect"], "/");
    }

    #[tokio::test]
    async fn test_create_requires_login() {
        let fixture = fixture();

        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures",
            None,
            new_adventure(&[]),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Please log in to access this page");
    }

    #[tokio::test]
    async fn test_create_from_form_reads_markers_until_gap() {
        let fixture = fixture();
        let encoded = "date=2100-05-01+09%3A00&info=Ride&mode=2\
                       &marker_0=%281%2C+2%29&marker_1=%283%2C+4%29&marker_3=%285%2C+6%29";

        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures/new",
            Some(fixture.john),
            Payload::Form(encoded.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let location = body["redirect"].as_str().unwrap();
        let (_, detail) = send(&fixture.app, Method::GET, location, None, Payload::Empty).await;
        assert_eq!(detail["mode"], "professional");
        assert_eq!(detail["markers"], json!([[1.0, 2.0], [3.0, 4.0]]));
    }

    #[tokio::test]
    async fn test_create_from_form_requires_date() {
        let fixture = fixture();

        let (status, body) = send(
            &fixture.app,
            Method::POST,
            "/adventures/new",
            Some(fixture.john),
            Payload::Form("info=Ride".to_string()),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing date");
    }

    #[tokio::test]
    async fn test_join_and_leave_notices() {
        let fixture = fixture();
        let location = create(&fixture, &[]).await;
        let join = format!("{location}/join");
        let leave = format!("{location}/leave");
        let jane = Some(fixture.jane);

        let (_, body) = send(&fixture.app, Method::POST, &join, jane, Payload::Empty).await;
        assert_eq!(body["level"], "success");
        let (_, body) = send(&fixture.app, Method::POST, &join, jane, Payload::Empty).await;
        assert_eq!(body["level"], "warning");

        let (_, body) = send(&fixture.app, Method::POST, &leave, jane, Payload::Empty).await;
        assert_eq!(body["message"], "You have left the adventure");
        let (_, body) = send(&fixture.app, Method::POST, &leave, jane, Payload::Empty).await;
        assert_eq!(body["message"], "You have not joined this adventure");
    }

    #[tokio::test]
    async fn test_creator_leave_is_forbidden() {
        let fixture = fixture();
        let location = create(&fixture, &[]).await;

        let (status, body) = send(
            &fixture.app,
            Method::POST,
            &format!("{location}/leave"),
            Some(fixture.john),
            Payload::Empty,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "You cannot leave this adventure");
    }

    #[tokio::test]
    async fn test_only_creator_edits_and_deletes() {
        let fixture = fixture();
        let location = create(&fixture, &["(1, 1)"]).await;

        let (status, _) = send(
            &fixture.app,
            Method::DELETE,
            &location,
            Some(fixture.jane),
            Payload::Empty,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &fixture.app,
            Method::PUT,
            &location,
            Some(fixture.john),
            new_adventure(&["(7, 7)"]),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, view) = send(
            &fixture.app,
            Method::GET,
            &format!("{location}/edit"),
            Some(fixture.john),
            Payload::Empty,
        )
        .await;
        assert_eq!(view["markers"], json!([[7.0, 7.0]]));

        let (status, _) = send(
            &fixture.app,
            Method::DELETE,
            &location,
            Some(fixture.john),
            Payload::Empty,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&fixture.app, Method::GET, &location, None, Payload::Empty).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bad_ids_are_rejected() {
        let fixture = fixture();

        for uri in ["/adventures/0", "/adventures/9223372036854775807", "/adventures/abc"] {
            let (status, _) = send(&fixture.app, Method::GET, uri, None, Payload::Empty).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_listings() {
        let fixture = fixture();
        let location = create(&fixture, &["(1, 2)"]).await;
        send(
            &fixture.app,
            Method::POST,
            &format!("{location}/join"),
            Some(fixture.jane),
            Payload::Empty,
        )
        .await;

        let (_, all) = send(
            &fixture.app,
            Method::GET,
            "/adventures",
            Some(fixture.jane),
            Payload::Empty,
        )
        .await;
        assert_eq!(all[0]["action"], 1);
        assert_eq!(all[0]["joined"], 2);

        let (_, mine) = send(
            &fixture.app,
            Method::GET,
            "/adventures/mine",
            Some(fixture.jane),
            Payload::Empty,
        )
        .await;
        assert_eq!(mine["created"], json!([]));
        assert_eq!(mine["joined"][0]["info"], "Some info today");

        let (status, _) =
            send(&fixture.app, Method::GET, "/adventures/mine", None, Payload::Empty).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_parse_form_date() {
        let expected = Utc.with_ymd_and_hms(2100, 5, 1, 9, 0, 0).unwrap();

        assert_eq!(parse_form_date("2100-05-01 09:00"), Some(expected));
        assert_eq!(parse_form_date("2100-05-01T09:00"), Some(expected));
        assert_eq!(parse_form_date("2100-05-01 09:00:00"), Some(expected));
        assert_eq!(parse_form_date("2100-05-01T11:00:00+02:00"), Some(expected));
        assert_eq!(parse_form_date("next tuesday"), None);
    }
}
