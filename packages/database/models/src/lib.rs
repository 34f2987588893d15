#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Insert payloads and query parameters for the incident store.
//!
//! These types describe what the store is asked to do. API request types
//! live in `orbit_server_models` and convert into these.

use chrono::{DateTime, Duration, Utc};
use orbit_incident_models::{Coordinate, IncidentType, Severity};
use serde::{Deserialize, Serialize};

/// Default rolling window for feed queries, in hours.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

/// Longest rolling window accepted for feed queries (100 years).
pub const MAX_WINDOW_HOURS: u32 = 24 * 365 * 100;

/// A new incident as accepted by the ingestion endpoint.
///
/// Carries no status: every new incident starts out pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    /// Emergency category.
    pub incident_type: IncidentType,
    /// Reporter's description.
    pub description: String,
    /// Urgency tier.
    pub severity: Severity,
    /// Public URL of uploaded evidence.
    pub media_url: Option<String>,
    /// Reported position.
    pub location: Coordinate,
}

/// Parameters for loading the incident feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Exact type match, `None` for all types.
    pub incident_type: Option<IncidentType>,
    /// Only incidents created strictly after this instant.
    pub since: DateTime<Utc>,
    /// Maximum number of rows, `None` for no limit.
    pub limit: Option<u32>,
}

impl FeedQuery {
    /// Builds a query covering the last `hours` hours before `now`.
    ///
    /// Returns `None` when `hours` exceeds [`MAX_WINDOW_HOURS`] or the
    /// window start is not representable.
    #[must_use]
    pub fn window(
        incident_type: Option<IncidentType>,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        if hours > MAX_WINDOW_HOURS {
            return None;
        }

        let since = now.checked_sub_signed(Duration::hours(i64::from(hours)))?;
        Some(Self {
            incident_type,
            since,
            limit: None,
        })
    }

    /// Sets the row limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }
}
