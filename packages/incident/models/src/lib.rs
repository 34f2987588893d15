#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident, severity, status and coordinate types.
//!
//! An [`Incident`] is the only entity in the dispatch system. Every other
//! crate (store, server, feed composer) speaks in terms of these types, so
//! the closed enumerations defined here are the single source of truth for
//! what a report may contain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Coarse urgency tier of an incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Minor, non-urgent report.
    Low,
    /// Needs attention soon.
    Medium,
    /// Critical, immediate response.
    High,
}

impl Severity {
    /// Base ranking weight for this tier.
    ///
    /// Tiers are spaced far enough apart that the recency term of the
    /// priority score never lets a lower tier overtake a higher one.
    #[must_use]
    pub const fn weight(self) -> u32 {
        match self {
            Self::Low => 100,
            Self::Medium => 500,
            Self::High => 1000,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }
}

/// Category of a reported emergency.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentType {
    /// Structure, vehicle or wild fire
    Fire,
    /// Road traffic accident
    Accident,
    /// Medical emergency
    Medical,
    /// Damaged roads, power lines, water mains
    Infrastructure,
}

impl IncidentType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Fire,
            Self::Accident,
            Self::Medical,
            Self::Infrastructure,
        ]
    }
}

/// Officer confirmation state of an incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IncidentStatus {
    /// Submitted, not yet confirmed.
    #[default]
    Pending,
    /// Confirmed by an officer.
    Verified,
}

impl IncidentStatus {
    /// Whether an incident currently in `self` may be moved to `next`.
    ///
    /// The lifecycle only moves forward: a verified incident never goes
    /// back to pending. Re-applying the current status is allowed.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        !matches!((self, next), (Self::Verified, Self::Pending))
    }
}

/// Role string stored in the `profiles` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Dispatch officer, may verify and annotate incidents.
    Officer,
    /// Any other authenticated user.
    Citizen,
}

impl Role {
    /// Maps a raw `profiles.role` value. Anything other than `officer` is
    /// treated as an unprivileged citizen.
    #[must_use]
    pub fn from_profile(role: &str) -> Self {
        if role.trim().eq_ignore_ascii_case("officer") {
            Self::Officer
        } else {
            Self::Citizen
        }
    }
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in degrees.
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Latitude in degrees.
    #[serde(rename = "lat")]
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a longitude/latitude pair.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// A single reported emergency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier, assigned at creation.
    pub id: Uuid,
    /// Emergency category.
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    /// Reporter's description.
    pub description: String,
    /// Urgency tier.
    pub severity: Severity,
    /// Public URL of the photo/video evidence, if any.
    pub media_url: Option<String>,
    /// Where the incident was reported.
    pub location: Coordinate,
    /// Officer confirmation state.
    pub status: IncidentStatus,
    /// Dispatcher notes. Only populated for officers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_notes: Option<String>,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
}

impl Incident {
    /// Strips officer-only fields before handing the record to an
    /// unprivileged reader.
    #[must_use]
    pub fn redacted(mut self) -> Self {
        self.internal_notes = None;
        self
    }
}
