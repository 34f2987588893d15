//! Plain-text rendering of feed rows and marker changes.

use chrono::{DateTime, Utc};
use geo::Point;
use orbit_feed::{MarkerOp, RankedIncident, spatial};
use orbit_incident_models::Incident;

/// One feed row: rank, severity, type, status, distance, age, then the
/// description on a second line.
pub fn feed_row(
    position: usize,
    ranked: &RankedIncident,
    center: Point<f64>,
    now: DateTime<Utc>,
) -> String {
    let incident = &ranked.incident;
    let distance = spatial::distance_km(center, spatial::to_point(incident.location));

    format!(
        "{position:>3}. [{severity:<6}] {kind:<14} {status:<8} {distance:>6.1} km  {age:>5}  {id}\n     {description}",
        severity = incident.severity.as_ref(),
        kind = incident.incident_type.as_ref(),
        status = incident.status.as_ref(),
        age = age(incident, now),
        id = incident.id,
        description = incident.description,
    )
}

/// Compact age such as `45s`, `12m` or `3h`.
pub fn age(incident: &Incident, now: DateTime<Utc>) -> String {
    let seconds = (now - incident.created_at).num_seconds().max(0);
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

/// Counts of each marker operation, e.g. `+2 -1 ~1`.
pub fn marker_summary(ops: &[MarkerOp]) -> String {
    let (mut added, mut removed, mut recolored) = (0, 0, 0);
    for op in ops {
        match op {
            MarkerOp::Add(_) => added += 1,
            MarkerOp::Remove(_) => removed += 1,
            MarkerOp::Recolor { .. } => recolored += 1,
        }
    }
    format!("+{added} -{removed} ~{recolored}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use orbit_feed::{Marker, MarkerColor, priority};
    use orbit_incident_models::{Coordinate, IncidentStatus, IncidentType, Severity};
    use uuid::Uuid;

    fn incident(created_at: DateTime<Utc>) -> Incident {
        Incident {
            id: Uuid::nil(),
            incident_type: IncidentType::Infrastructure,
            description: "Bridge railing collapsed".to_string(),
            severity: Severity::Low,
            media_url: None,
            location: Coordinate::new(85.2, 25.6),
            status: IncidentStatus::Verified,
            internal_notes: None,
            created_at,
        }
    }

    #[test]
    fn ages() {
        let now = Utc::now();
        assert_eq!(age(&incident(now - Duration::seconds(5)), now), "5s");
        assert_eq!(age(&incident(now - Duration::minutes(12)), now), "12m");
        assert_eq!(age(&incident(now - Duration::hours(3)), now), "3h");
        assert_eq!(age(&incident(now - Duration::days(2)), now), "2d");
        assert_eq!(age(&incident(now + Duration::seconds(30)), now), "0s");
    }

    #[test]
    fn row_contains_distance_and_description() {
        let now = Utc::now();
        let incident = incident(now - Duration::minutes(3));
        let ranked = RankedIncident {
            priority: priority(&incident),
            incident,
        };

        let row = feed_row(1, &ranked, Point::new(85.1, 25.6), now);
        assert!(row.starts_with("  1. [low   ] INFRASTRUCTURE verified"));
        assert!(row.contains("11.1 km"));
        assert!(row.ends_with("Bridge railing collapsed"));
    }

    #[test]
    fn summarizes_ops() {
        let id = Uuid::new_v4();
        let ops = [
            MarkerOp::Add(Marker {
                incident_id: id,
                position: Point::new(0.0, 0.0),
                color: MarkerColor::Pending,
            }),
            MarkerOp::Recolor {
                incident_id: id,
                color: MarkerColor::Verified,
            },
            MarkerOp::Remove(Uuid::new_v4()),
        ];
        assert_eq!(marker_summary(&ops), "+1 -1 ~1");
        assert_eq!(marker_summary(&[]), "+0 -0 ~0");
    }
}
