//! HTTP handler functions for the dispatch API.

use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::header,
    web,
};
use chrono::Utc;
use orbit_auth::{AuthError, authenticate, require_officer};
use orbit_database::DbError;
use orbit_database_models::{DEFAULT_WINDOW_HOURS, FeedQuery, MAX_WINDOW_HOURS, NewIncident};
use orbit_server_models::{
    ApiError, ApiHealth, ChangeEvent, CreateIncidentRequest, FeedQueryParams, UpdateNotesRequest,
    UpdateStatusRequest,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::AppState;

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "operational".to_string(),
        timestamp: Utc::now(),
    })
}

/// `GET /api/incidents`
///
/// Incidents created within the last `hours` (default 24), newest first.
/// Internal notes are stripped unless the caller is an officer; a missing
/// or invalid session is not an error here.
pub async fn list_incidents(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<FeedQueryParams>,
) -> HttpResponse {
    let hours = params.hours.unwrap_or(DEFAULT_WINDOW_HOURS);
    let Some(query) = FeedQuery::window(params.incident_type, hours, Utc::now()) else {
        return HttpResponse::BadRequest().json(ApiError::new(format!(
            "hours must be at most {MAX_WINDOW_HOURS}"
        )));
    };
    let query = query.with_limit(params.limit);

    let officer = match authorization(&req) {
        Some(value) => {
            match authenticate(state.verifier.as_ref(), state.store.as_ref(), Some(value)).await {
                Ok(session) => session.is_officer(),
                Err(AuthError::MissingToken | AuthError::InvalidSession) => false,
                Err(e) => return auth_failure(&e),
            }
        }
        None => false,
    };

    match state.store.query_feed(&query).await {
        Ok(incidents) => {
            let incidents: Vec<_> = if officer {
                incidents
            } else {
                incidents.into_iter().map(|i| i.redacted()).collect()
            };
            HttpResponse::Ok().json(incidents)
        }
        Err(e) => store_failure("Feed query failed", &e),
    }
}

/// `POST /api/incidents`
///
/// Stores a new report as `pending`.
pub async fn create_incident(
    state: web::Data<AppState>,
    body: web::Json<CreateIncidentRequest>,
) -> HttpResponse {
    let new: NewIncident = body.into_inner().into();

    match state.store.insert_incident(&new).await {
        Ok(incident) => {
            log::info!(
                "New {} incident {} ({})",
                incident.incident_type,
                incident.id,
                incident.severity
            );
            state.publish(ChangeEvent::insert(incident.id));
            HttpResponse::Created().json(incident)
        }
        Err(e) => store_failure("Insert failed", &e),
    }
}

/// `PATCH /api/incidents/{id}/status`
///
/// Officer only. The session is checked before the body is parsed.
pub async fn update_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    if let Err(e) = require_officer(
        state.verifier.as_ref(),
        state.store.as_ref(),
        authorization(&req),
    )
    .await
    {
        return auth_failure(&e);
    }

    let Some(id) = parse_id(&path) else {
        return not_found();
    };

    let body: UpdateStatusRequest = match parse_body(&body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match state.store.update_status(id, body.status).await {
        Ok(Some(incident)) => {
            log::info!("Incident {id} marked {}", incident.status);
            state.publish(ChangeEvent::update(id));
            HttpResponse::Ok().json(incident)
        }
        Ok(None) => not_found(),
        Err(e @ DbError::InvalidTransition { .. }) => {
            HttpResponse::Conflict().json(ApiError::new(e.to_string()))
        }
        Err(e) => store_failure("Status update failed", &e),
    }
}

/// `PATCH /api/incidents/{id}/notes`
///
/// Officer only. The session is checked before the body is parsed.
pub async fn update_notes(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    if let Err(e) = require_officer(
        state.verifier.as_ref(),
        state.store.as_ref(),
        authorization(&req),
    )
    .await
    {
        return auth_failure(&e);
    }

    let Some(id) = parse_id(&path) else {
        return not_found();
    };

    let body: UpdateNotesRequest = match parse_body(&body) {
        Ok(body) => body,
        Err(resp) => return resp,
    };

    match state.store.update_notes(id, &body.notes).await {
        Ok(Some(incident)) => {
            state.publish(ChangeEvent::update(id));
            HttpResponse::Ok().json(incident)
        }
        Ok(None) => not_found(),
        Err(e) => store_failure("Notes update failed", &e),
    }
}

/// Turns a malformed JSON body into `400` + `{error}`.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Turns malformed query parameters into `400` + `{error}`.
pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
    InternalError::from_response(err, response).into()
}

/// Decodes a JSON body, answering `400` + `{error}` when it is malformed.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, HttpResponse> {
    serde_json::from_slice(body)
        .map_err(|e| HttpResponse::BadRequest().json(ApiError::new(e.to_string())))
}

fn authorization(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// A path segment that is not a UUID cannot name a stored incident.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiError::new("Incident not found"))
}

fn store_failure(context: &str, e: &DbError) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
}

fn auth_failure(e: &AuthError) -> HttpResponse {
    match e {
        AuthError::MissingToken | AuthError::InvalidSession => {
            HttpResponse::Unauthorized().json(ApiError::new(e.to_string()))
        }
        AuthError::Forbidden { .. } => HttpResponse::Forbidden().json(ApiError::new(e.to_string())),
        _ => {
            log::error!("Session check failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
    }
}
