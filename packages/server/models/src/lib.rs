#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request, response and event types for the dispatch server.
//!
//! These types are serialized to JSON for the REST API and the change
//! stream. They are shared by the server and by the feed client so both
//! ends agree on the wire contract.

use chrono::{DateTime, Utc};
use orbit_database_models::NewIncident;
use orbit_incident_models::{Coordinate, IncidentStatus, IncidentType, Severity};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /api/incidents`.
///
/// Unknown fields (including any `status` a client tries to set) are
/// ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIncidentRequest {
    /// Latitude of the report.
    pub lat: f64,
    /// Longitude of the report.
    pub lng: f64,
    /// Emergency category.
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Reporter's description.
    pub description: String,
    /// Urgency tier.
    pub severity: Severity,
    /// Public URL of uploaded evidence.
    #[serde(default)]
    pub media_url: Option<String>,
}

impl From<CreateIncidentRequest> for NewIncident {
    fn from(req: CreateIncidentRequest) -> Self {
        Self {
            incident_type: req.incident_type,
            description: req.description,
            severity: req.severity,
            media_url: req.media_url,
            location: Coordinate::new(req.lng, req.lat),
        }
    }
}

/// Body of `PATCH /api/incidents/{id}/status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status.
    pub status: IncidentStatus,
}

/// Body of `PATCH /api/incidents/{id}/notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotesRequest {
    /// Replacement notes text.
    pub notes: String,
}

/// Query parameters for `GET /api/incidents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQueryParams {
    /// Exact type filter.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub incident_type: Option<IncidentType>,
    /// Rolling window in hours (default 24).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<u32>,
    /// Maximum number of results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Always `"operational"` while the process is serving.
    pub status: String,
    /// Server time of the check.
    pub timestamp: DateTime<Utc>,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// What happened to the incident table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// A new incident was stored.
    Insert,
    /// An incident's status or notes changed.
    Update,
    /// Events were dropped for this subscriber; reload everything.
    Resync,
}

/// A change notification pushed on `GET /api/incidents/events`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What happened.
    pub kind: ChangeKind,
    /// Affected incident, absent for [`ChangeKind::Resync`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<Uuid>,
}

impl ChangeEvent {
    /// An insert of `id`.
    #[must_use]
    pub const fn insert(id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Insert,
            incident_id: Some(id),
        }
    }

    /// An update of `id`.
    #[must_use]
    pub const fn update(id: Uuid) -> Self {
        Self {
            kind: ChangeKind::Update,
            incident_id: Some(id),
        }
    }

    /// A request to reload everything.
    #[must_use]
    pub const fn resync() -> Self {
        Self {
            kind: ChangeKind::Resync,
            incident_id: None,
        }
    }
}
