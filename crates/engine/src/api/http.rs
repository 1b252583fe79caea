//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use netevent_shared::{
    ErrorResponse, EventData, EventDetailsData, FieldErrorData, NewEvent, UpdateEvent,
};
use serde::Deserialize;

use super::convert::{event_data, event_details_data};
use crate::app::App;
use crate::use_cases::events::EventError;
use crate::use_cases::validation::ValidationErrors;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Events
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    include_deleted: bool,
}

async fn list_events(
    State(app): State<Arc<App>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<EventData>>, ApiError> {
    let events = app
        .use_cases
        .events
        .list
        .execute(query.include_deleted)
        .await?;
    Ok(Json(events.iter().map(event_data).collect()))
}

async fn create_event(
    State(app): State<Arc<App>>,
    Json(input): Json<NewEvent>,
) -> Result<(StatusCode, Json<EventData>), ApiError> {
    let events = &app.use_cases.events;
    events.validate.validate_new(&input).await?;
    let event = events.create.execute(input).await?;
    Ok((StatusCode::CREATED, Json(event_data(&event))))
}

async fn get_event(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<EventDetailsData>, ApiError> {
    let details = app.use_cases.events.details.execute(id).await?;
    Ok(Json(event_details_data(&details)))
}

async fn update_event(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    Json(input): Json<UpdateEvent>,
) -> Result<Json<EventData>, ApiError> {
    let events = &app.use_cases.events;
    events.validate.validate_update(&id, &input).await?;
    let event = events.update.execute(id, input).await?;
    Ok(Json(event_data(&event)))
}

async fn delete_event(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<EventData>, ApiError> {
    let event = app.use_cases.events.delete.execute(id).await?;
    Ok(Json(event_data(&event)))
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    BadRequest(String),
    NotFound(String),
    Unavailable,
    Internal(String),
}

impl From<EventError> for ApiError {
    fn from(e: EventError) -> Self {
        match e {
            EventError::Validation(errors) => Self::Validation(errors),
            EventError::InvalidReference { .. } => Self::BadRequest(e.to_string()),
            EventError::NotFound { .. } => Self::NotFound(e.to_string()),
            EventError::Cancelled => Self::Unavailable,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                let fields = errors
                    .iter()
                    .map(|e| FieldErrorData {
                        field: e.field().to_string(),
                        message: e.to_string(),
                    })
                    .collect();
                let body = ErrorResponse::new("Validation failed").with_fields(fields);
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(msg))).into_response()
            }
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new("Operation cancelled")),
            )
                .into_response(),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal error")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use chrono::{TimeZone, Utc};
    use netevent_domain::{EventTypeId, UserId};
    use tower::ServiceExt;

    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::memory::InMemoryStore;

    fn app() -> Router {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let store = Arc::new(InMemoryStore::new(clock.clone()).with_open_references());
        let app = App::new(store.clone().into(), store, clock, None);
        routes().with_state(Arc::new(app))
    }

    fn body(name: &str, max_participants: u32) -> String {
        serde_json::json!({
            "tags": [],
            "tasks": [],
            "facilityHistories": [],
            "name": name,
            "language": "en",
            "eventTypeId": EventTypeId::new().to_string(),
            "mode": "online",
            "location": "web",
            "accommodation": "none",
            "registrationCloseDate": "2024-02-01T00:00:00Z",
            "startDate": "2024-02-02T00:00:00Z",
            "endDate": "2024-02-03T00:00:00Z",
            "maxParticipants": max_participants,
            "description": "Webinar",
            "ownerId": UserId::new().to_string(),
            "budget": 0.0,
            "image": "w.png",
            "customFields": []
        })
        .to_string()
    }

    fn post(json: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_then_fetch_event() {
        let router = app();

        let response = router.clone().oneshot(post(body("Webinar", 10))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();

        let request = Request::builder()
            .uri(format!("/api/events/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let details = json_body(response).await;
        assert_eq!(details["name"], "Webinar");
        assert_eq!(details["tasks"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn invalid_payload_lists_field_errors() {
        let response = app().oneshot(post(body("", 0))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let error = json_body(response).await;
        let fields: Vec<&str> = error["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"maxParticipants"));
    }

    #[tokio::test]
    async fn unknown_event_is_404() {
        let request = Request::builder()
            .uri(format!("/api/events/{}", netevent_domain::EventId::new()))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_400() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/events/not-an-id")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
