//! Priority scoring and ranking.
//!
//! `priority = weight(severity) + created_at_ms / 10_000_000`
//!
//! The recency term grows by 8.64 per day. The smallest gap between two
//! severity weights is 400, which is roughly 46 days of recency, so within
//! any realistic feed window a higher severity always ranks first and the
//! recency term only orders incidents of the same severity.

use orbit_incident_models::Incident;

/// Divisor applied to the creation time in epoch milliseconds.
pub const RECENCY_DIVISOR: f64 = 10_000_000.0;

/// An incident paired with its priority score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedIncident {
    /// The incident.
    pub incident: Incident,
    /// Priority score; higher is more urgent.
    pub priority: f64,
}

/// Computes the priority score of an incident.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn priority(incident: &Incident) -> f64 {
    let recency = incident.created_at.timestamp_millis() as f64 / RECENCY_DIVISOR;
    f64::from(incident.severity.weight()) + recency
}

/// Scores and sorts incidents by descending priority.
///
/// The sort is stable: incidents with identical scores keep their input
/// order.
#[must_use]
pub fn rank(incidents: Vec<Incident>) -> Vec<RankedIncident> {
    let mut ranked: Vec<RankedIncident> = incidents
        .into_iter()
        .map(|incident| RankedIncident {
            priority: priority(&incident),
            incident,
        })
        .collect();

    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    ranked
}
