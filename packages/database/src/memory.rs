//! In-process [`IncidentStore`] used by tests and local development.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orbit_database_models::{FeedQuery, NewIncident};
use orbit_incident_models::{Incident, IncidentStatus, Role};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{DbError, IncidentStore};

/// Incident store that keeps every record in memory.
///
/// Applies the same forward-only status rule as the `PostGIS` store.
#[derive(Default)]
pub struct MemoryStore {
    incidents: RwLock<BTreeMap<Uuid, Incident>>,
    roles: RwLock<BTreeMap<Uuid, Role>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a profile role for a user.
    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        self.roles.write().await.insert(user_id, role);
    }

    /// Inserts an incident with an explicit creation time.
    pub async fn insert_at(&self, incident: &NewIncident, created_at: DateTime<Utc>) -> Incident {
        let record = Incident {
            id: Uuid::new_v4(),
            incident_type: incident.incident_type,
            description: incident.description.clone(),
            severity: incident.severity,
            media_url: incident.media_url.clone(),
            location: incident.location,
            status: IncidentStatus::Pending,
            internal_notes: None,
            created_at,
        };
        self.incidents
            .write()
            .await
            .insert(record.id, record.clone());
        record
    }
}

#[async_trait]
impl IncidentStore for MemoryStore {
    async fn insert_incident(&self, incident: &NewIncident) -> Result<Incident, DbError> {
        Ok(self.insert_at(incident, Utc::now()).await)
    }

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>, DbError> {
        Ok(self.incidents.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IncidentStatus,
    ) -> Result<Option<Incident>, DbError> {
        let mut incidents = self.incidents.write().await;
        let Some(incident) = incidents.get_mut(&id) else {
            return Ok(None);
        };

        if !incident.status.can_transition_to(status) {
            return Err(DbError::InvalidTransition {
                from: incident.status,
                to: status,
            });
        }

        incident.status = status;
        Ok(Some(incident.clone()))
    }

    async fn update_notes(&self, id: Uuid, notes: &str) -> Result<Option<Incident>, DbError> {
        let mut incidents = self.incidents.write().await;
        Ok(incidents.get_mut(&id).map(|incident| {
            incident.internal_notes = Some(notes.to_string());
            incident.clone()
        }))
    }

    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<Incident>, DbError> {
        let incidents = self.incidents.read().await;
        let mut matching: Vec<Incident> = incidents
            .values()
            .filter(|i| i.created_at > query.since)
            .filter(|i| {
                query
                    .incident_type
                    .is_none_or(|wanted| i.incident_type == wanted)
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if let Some(limit) = query.limit {
            matching.truncate(limit as usize);
        }

        Ok(matching)
    }

    async fn user_role(&self, user_id: Uuid) -> Result<Option<Role>, DbError> {
        Ok(self.roles.read().await.get(&user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use orbit_incident_models::{Coordinate, IncidentType, Severity};

    fn report(incident_type: IncidentType, severity: Severity) -> NewIncident {
        NewIncident {
            incident_type,
            description: "Smoke visible from the highway".to_string(),
            severity,
            media_url: None,
            location: Coordinate::new(85.1, 25.6),
        }
    }

    #[tokio::test]
    async fn new_incidents_start_pending() {
        let store = MemoryStore::new();
        let incident = store
            .insert_incident(&report(IncidentType::Fire, Severity::High))
            .await
            .unwrap();

        assert_eq!(incident.status, IncidentStatus::Pending);
        assert_eq!(
            store.get_incident(incident.id).await.unwrap(),
            Some(incident)
        );
    }

    #[tokio::test]
    async fn status_cannot_move_backwards() {
        let store = MemoryStore::new();
        let incident = store
            .insert_incident(&report(IncidentType::Medical, Severity::Low))
            .await
            .unwrap();

        let verified = store
            .update_status(incident.id, IncidentStatus::Verified)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(verified.status, IncidentStatus::Verified);

        let err = store
            .update_status(incident.id, IncidentStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));

        assert!(
            store
                .update_status(Uuid::new_v4(), IncidentStatus::Verified)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn notes_overwrite_previous_value() {
        let store = MemoryStore::new();
        let incident = store
            .insert_incident(&report(IncidentType::Accident, Severity::Medium))
            .await
            .unwrap();

        store.update_notes(incident.id, "first").await.unwrap();
        let updated = store
            .update_notes(incident.id, "second")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.internal_notes.as_deref(), Some("second"));
        assert_eq!(updated.status, IncidentStatus::Pending);
    }

    #[tokio::test]
    async fn feed_filters_by_type_and_window() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let recent_fire = store
            .insert_at(&report(IncidentType::Fire, Severity::High), now)
            .await;
        store
            .insert_at(
                &report(IncidentType::Fire, Severity::High),
                now - Duration::hours(30),
            )
            .await;
        store
            .insert_at(&report(IncidentType::Medical, Severity::Low), now)
            .await;

        let query =
            FeedQuery::window(Some(IncidentType::Fire), 24, now + Duration::seconds(1)).unwrap();
        let feed = store.query_feed(&query).await.unwrap();

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, recent_fire.id);

        let all = store
            .query_feed(&FeedQuery::window(None, 24, now + Duration::seconds(1)).unwrap())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn feed_limit_keeps_newest() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let mut ids = Vec::new();
        for minutes in [30, 20, 10] {
            let incident = store
                .insert_at(
                    &report(IncidentType::Accident, Severity::Medium),
                    now - Duration::minutes(minutes),
                )
                .await;
            ids.push(incident.id);
        }

        let query = FeedQuery::window(None, 24, now)
            .unwrap()
            .with_limit(Some(2));
        let feed = store.query_feed(&query).await.unwrap();

        let got: Vec<Uuid> = feed.iter().map(|i| i.id).collect();
        assert_eq!(got, vec![ids[2], ids[1]]);
    }

    #[tokio::test]
    async fn roles_are_looked_up_by_user() {
        let store = MemoryStore::new();
        let officer = Uuid::new_v4();
        store.set_role(officer, Role::Officer).await;

        assert_eq!(store.user_role(officer).await.unwrap(), Some(Role::Officer));
        assert_eq!(store.user_role(Uuid::new_v4()).await.unwrap(), None);
    }
}
