//! Map markers and their reconciliation.
//!
//! [`MarkerSet`] owns the markers currently shown on the map, keyed by
//! incident id. [`MarkerSet::reconcile`] compares that state with a fresh
//! incident list and returns the minimal operations to bring the map in
//! line. Running it twice with the same input yields no operations the
//! second time.

use std::collections::{BTreeMap, BTreeSet, btree_map};

use geo::Point;
use orbit_incident_models::{Incident, IncidentStatus};
use uuid::Uuid;

use crate::spatial::{to_point, within_radius};

/// Marker fill, derived from the incident's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerColor {
    /// Red.
    Verified,
    /// Amber.
    Pending,
}

impl MarkerColor {
    /// CSS hex color.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Verified => "#ff3131",
            Self::Pending => "#ffc107",
        }
    }
}

impl From<IncidentStatus> for MarkerColor {
    fn from(status: IncidentStatus) -> Self {
        match status {
            IncidentStatus::Verified => Self::Verified,
            IncidentStatus::Pending => Self::Pending,
        }
    }
}

/// A marker on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// Incident the marker belongs to.
    pub incident_id: Uuid,
    /// Position (x = longitude, y = latitude).
    pub position: Point<f64>,
    /// Current fill.
    pub color: MarkerColor,
}

impl Marker {
    fn for_incident(incident: &Incident) -> Self {
        Self {
            incident_id: incident.id,
            position: to_point(incident.location),
            color: incident.status.into(),
        }
    }
}

/// A single change to apply to the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerOp {
    /// Place a new marker.
    Add(Marker),
    /// Take the marker for this incident off the map.
    Remove(Uuid),
    /// Change the fill of an existing marker.
    Recolor {
        /// Incident whose marker changes.
        incident_id: Uuid,
        /// New fill.
        color: MarkerColor,
    },
}

/// The markers currently on the map.
#[derive(Debug, Default, Clone)]
pub struct MarkerSet {
    markers: BTreeMap<Uuid, Marker>,
}

impl MarkerSet {
    /// An empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers on the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the map has no markers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Looks up the marker for an incident.
    #[must_use]
    pub fn get(&self, incident_id: &Uuid) -> Option<&Marker> {
        self.markers.get(incident_id)
    }

    /// Iterates markers in incident id order.
    pub fn iter(&self) -> btree_map::Values<'_, Uuid, Marker> {
        self.markers.values()
    }

    /// Brings the map in line with `incidents`, showing only those within
    /// `radius_km` of `center`.
    ///
    /// Removals come first, then additions and recolors in input order.
    /// The operations are applied to `self` before returning.
    pub fn reconcile<'a, I>(
        &mut self,
        incidents: I,
        center: Point<f64>,
        radius_km: f64,
    ) -> Vec<MarkerOp>
    where
        I: IntoIterator<Item = &'a Incident>,
    {
        let mut wanted = Vec::new();
        let mut wanted_ids = BTreeSet::new();
        for incident in incidents {
            if !within_radius(center, to_point(incident.location), radius_km) {
                continue;
            }
            if wanted_ids.insert(incident.id) {
                wanted.push(Marker::for_incident(incident));
            }
        }

        let mut ops = Vec::new();

        let stale: Vec<Uuid> = self
            .markers
            .keys()
            .filter(|id| !wanted_ids.contains(id))
            .copied()
            .collect();
        for id in stale {
            self.markers.remove(&id);
            ops.push(MarkerOp::Remove(id));
        }

        for marker in wanted {
            match self.markers.get_mut(&marker.incident_id) {
                Some(existing) if existing.color != marker.color => {
                    existing.color = marker.color;
                    ops.push(MarkerOp::Recolor {
                        incident_id: marker.incident_id,
                        color: marker.color,
                    });
                }
                Some(_) => {}
                None => {
                    self.markers.insert(marker.incident_id, marker);
                    ops.push(MarkerOp::Add(marker));
                }
            }
        }

        if !ops.is_empty() {
            log::debug!(
                "Marker reconcile: {} op(s), {} marker(s) on map",
                ops.len(),
                self.markers.len()
            );
        }

        ops
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a Marker;
    type IntoIter = btree_map::Values<'a, Uuid, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orbit_incident_models::{Coordinate, IncidentType, Severity};

    use crate::spatial::{DEFAULT_RADIUS_KM, default_center};

    fn incident(lng: f64, lat: f64, status: IncidentStatus) -> Incident {
        Incident {
            id: Uuid::new_v4(),
            incident_type: IncidentType::Fire,
            description: "Smoke from warehouse".to_string(),
            severity: Severity::High,
            media_url: None,
            location: Coordinate::new(lng, lat),
            status,
            internal_notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn colors_follow_status() {
        assert_eq!(MarkerColor::from(IncidentStatus::Verified).hex(), "#ff3131");
        assert_eq!(MarkerColor::from(IncidentStatus::Pending).hex(), "#ffc107");
    }

    #[test]
    fn adds_only_incidents_in_radius() {
        let near = incident(85.11, 25.61, IncidentStatus::Pending);
        let far = incident(86.5, 25.6, IncidentStatus::Pending);
        let mut set = MarkerSet::new();

        let ops = set.reconcile([&near, &far], default_center(), DEFAULT_RADIUS_KM);

        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], MarkerOp::Add(m) if m.incident_id == near.id));
        assert_eq!(set.len(), 1);
        assert!(set.get(&far.id).is_none());
    }

    #[test]
    fn reconcile_is_idempotent() {
        let a = incident(85.1, 25.6, IncidentStatus::Pending);
        let b = incident(85.12, 25.58, IncidentStatus::Verified);
        let mut set = MarkerSet::new();

        let first = set.reconcile([&a, &b], default_center(), DEFAULT_RADIUS_KM);
        assert_eq!(first.len(), 2);

        let second = set.reconcile([&a, &b], default_center(), DEFAULT_RADIUS_KM);
        assert!(second.is_empty());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn status_change_recolors_in_place() {
        let mut a = incident(85.1, 25.6, IncidentStatus::Pending);
        let mut set = MarkerSet::new();
        set.reconcile([&a], default_center(), DEFAULT_RADIUS_KM);

        a.status = IncidentStatus::Verified;
        let ops = set.reconcile([&a], default_center(), DEFAULT_RADIUS_KM);

        assert_eq!(
            ops,
            vec![MarkerOp::Recolor {
                incident_id: a.id,
                color: MarkerColor::Verified,
            }]
        );
        assert_eq!(set.get(&a.id).unwrap().color, MarkerColor::Verified);
    }

    #[test]
    fn removes_markers_that_left_the_view() {
        let a = incident(85.1, 25.6, IncidentStatus::Pending);
        let b = incident(85.15, 25.6, IncidentStatus::Pending);
        let mut set = MarkerSet::new();
        set.reconcile([&a, &b], default_center(), DEFAULT_RADIUS_KM);

        // b dropped out of the feed
        let ops = set.reconcile([&a], default_center(), DEFAULT_RADIUS_KM);
        assert_eq!(ops, vec![MarkerOp::Remove(b.id)]);

        // view moved away from a
        let ops = set.reconcile([&a], Point::new(90.0, 30.0), DEFAULT_RADIUS_KM);
        assert_eq!(ops, vec![MarkerOp::Remove(a.id)]);
        assert!(set.is_empty());
    }

    #[test]
    fn duplicate_ids_produce_one_marker() {
        let a = incident(85.1, 25.6, IncidentStatus::Pending);
        let mut set = MarkerSet::new();

        let ops = set.reconcile([&a, &a], default_center(), DEFAULT_RADIUS_KM);
        assert_eq!(ops.len(), 1);
        assert_eq!(set.len(), 1);
    }
}
