//! `PostGIS` query functions for incidents and profiles.
//!
//! All statements use `query_raw_params()` / `exec_raw_params()` with
//! positional parameters. Identifiers travel as text and are cast to
//! `uuid` inside the statement.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use orbit_database_models::{FeedQuery, NewIncident};
use orbit_incident_models::{
    Coordinate, Incident, IncidentStatus, IncidentType, Role, Severity,
};
use switchy_database::{Database, DatabaseValue, Row};
use uuid::Uuid;

use crate::DbError;

/// Columns selected from `incidents` (or returned by `RETURNING`).
const INCIDENT_COLUMNS: &str = "id::text AS id, type, description, severity, media_url,
     status, internal_notes,
     ST_X(location::geometry) AS longitude,
     ST_Y(location::geometry) AS latitude,
     created_at";

/// Columns selected from the `incident_view` read view.
const VIEW_COLUMNS: &str = "id::text AS id, type, description, severity, media_url,
     status, internal_notes, longitude, latitude, created_at";

/// Inserts a new incident with status `pending`.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails or the returned row cannot be
/// converted.
pub async fn insert_incident(
    db: &dyn Database,
    id: Uuid,
    incident: &NewIncident,
    created_at: DateTime<Utc>,
) -> Result<Incident, DbError> {
    let sql = format!(
        "INSERT INTO incidents (
            id, type, description, severity, media_url, location, status, created_at
         ) VALUES (
            $1::uuid, $2, $3, $4, $5,
            ST_SetSRID(ST_MakePoint($6, $7), 4326)::geography,
            $8, $9
         )
         RETURNING {INCIDENT_COLUMNS}"
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                DatabaseValue::String(id.to_string()),
                DatabaseValue::String(incident.incident_type.as_ref().to_string()),
                DatabaseValue::String(incident.description.clone()),
                DatabaseValue::String(incident.severity.as_ref().to_string()),
                incident
                    .media_url
                    .as_ref()
                    .map_or(DatabaseValue::Null, |u| DatabaseValue::String(u.clone())),
                DatabaseValue::Real64(incident.location.longitude),
                DatabaseValue::Real64(incident.location.latitude),
                DatabaseValue::String(IncidentStatus::Pending.as_ref().to_string()),
                DatabaseValue::DateTime(created_at.naive_utc()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Insert returned no row".to_string(),
    })?;

    incident_from_row(row)
}

/// Fetches a single incident by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be converted.
pub async fn get_incident(db: &dyn Database, id: Uuid) -> Result<Option<Incident>, DbError> {
    let sql = format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE id = $1::uuid");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::String(id.to_string())])
        .await?;

    rows.first().map(incident_from_row).transpose()
}

/// Sets the status of an incident, refusing to move a verified incident
/// back to pending.
///
/// The guard is part of the `UPDATE` itself. Returns `Ok(None)` when no
/// incident has this id.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the incident exists but the
/// transition is backwards, or [`DbError`] if the query fails.
pub async fn update_status(
    db: &dyn Database,
    id: Uuid,
    status: IncidentStatus,
) -> Result<Option<Incident>, DbError> {
    let sql = format!(
        "UPDATE incidents SET status = $2
         WHERE id = $1::uuid
           AND NOT (status = 'verified' AND $2 = 'pending')
         RETURNING {INCIDENT_COLUMNS}"
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                DatabaseValue::String(id.to_string()),
                DatabaseValue::String(status.as_ref().to_string()),
            ],
        )
        .await?;

    if let Some(row) = rows.first() {
        return incident_from_row(row).map(Some);
    }

    match get_incident(db, id).await? {
        Some(current) => Err(DbError::InvalidTransition {
            from: current.status,
            to: status,
        }),
        None => Ok(None),
    }
}

/// Overwrites the dispatcher notes of an incident.
///
/// Returns `Ok(None)` when no incident has this id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the row cannot be converted.
pub async fn update_notes(
    db: &dyn Database,
    id: Uuid,
    notes: &str,
) -> Result<Option<Incident>, DbError> {
    let sql = format!(
        "UPDATE incidents SET internal_notes = $2
         WHERE id = $1::uuid
         RETURNING {INCIDENT_COLUMNS}"
    );

    let rows = db
        .query_raw_params(
            &sql,
            &[
                DatabaseValue::String(id.to_string()),
                DatabaseValue::String(notes.to_string()),
            ],
        )
        .await?;

    rows.first().map(incident_from_row).transpose()
}

/// Loads incidents from `incident_view` matching the feed filter, newest
/// first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or a row cannot be converted.
pub async fn query_feed(db: &dyn Database, query: &FeedQuery) -> Result<Vec<Incident>, DbError> {
    let mut sql = format!("SELECT {VIEW_COLUMNS} FROM incident_view WHERE created_at > $1");
    let mut params = vec![DatabaseValue::DateTime(query.since.naive_utc())];
    let mut param_idx = 2u32;

    if let Some(incident_type) = query.incident_type {
        write!(sql, " AND type = ${param_idx}").unwrap();
        params.push(DatabaseValue::String(incident_type.as_ref().to_string()));
        param_idx += 1;
    }

    sql.push_str(" ORDER BY created_at DESC");

    if let Some(limit) = query.limit {
        write!(sql, " LIMIT ${param_idx}").unwrap();
        params.push(DatabaseValue::Int64(i64::from(limit)));
    }

    let rows = db.query_raw_params(&sql, &params).await?;

    rows.iter().map(incident_from_row).collect()
}

/// Looks up the role of a user in the `profiles` table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_user_role(db: &dyn Database, user_id: Uuid) -> Result<Option<Role>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT role FROM profiles WHERE id = $1::uuid",
            &[DatabaseValue::String(user_id.to_string())],
        )
        .await?;

    Ok(rows.first().map(|row| {
        let role: String = row.to_value("role").unwrap_or_default();
        Role::from_profile(&role)
    }))
}

/// Converts a row selected with [`INCIDENT_COLUMNS`] or [`VIEW_COLUMNS`].
fn incident_from_row(row: &Row) -> Result<Incident, DbError> {
    let id: String = row.to_value("id").map_err(|e| conversion("id", &e))?;
    let id = Uuid::parse_str(&id).map_err(|e| conversion("id", &e))?;

    let incident_type: String = row.to_value("type").map_err(|e| conversion("type", &e))?;
    let incident_type = incident_type
        .parse::<IncidentType>()
        .map_err(|e| conversion("type", &e))?;

    let severity: String = row
        .to_value("severity")
        .map_err(|e| conversion("severity", &e))?;
    let severity = severity
        .parse::<Severity>()
        .map_err(|e| conversion("severity", &e))?;

    let status: String = row.to_value("status").map_err(|e| conversion("status", &e))?;
    let status = status
        .parse::<IncidentStatus>()
        .map_err(|e| conversion("status", &e))?;

    let longitude: f64 = row
        .to_value("longitude")
        .map_err(|e| conversion("longitude", &e))?;
    let latitude: f64 = row
        .to_value("latitude")
        .map_err(|e| conversion("latitude", &e))?;

    let created_at: NaiveDateTime = row
        .to_value("created_at")
        .map_err(|e| conversion("created_at", &e))?;

    Ok(Incident {
        id,
        incident_type,
        description: row.to_value("description").unwrap_or_default(),
        severity,
        media_url: row.to_value("media_url").unwrap_or(None),
        location: Coordinate::new(longitude, latitude),
        status,
        internal_notes: row.to_value("internal_notes").unwrap_or(None),
        created_at: DateTime::<Utc>::from_naive_utc_and_offset(created_at, Utc),
    })
}

fn conversion(column: &str, err: &dyn std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to parse {column}: {err}"),
    }
}
