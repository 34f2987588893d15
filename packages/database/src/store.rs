//! The [`IncidentStore`] trait and its `PostGIS` implementation.

use std::sync::Arc;

use async_trait::async_trait;
use orbit_database_models::{FeedQuery, NewIncident};
use orbit_incident_models::{Incident, IncidentStatus, Role};
use switchy_database::Database;
use uuid::Uuid;

use crate::{DbError, queries};

/// Persistence operations needed by the dispatch server.
///
/// Every mutating method returns the record as stored after the change, or
/// `Ok(None)` when no incident has the given id.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Stores a new incident with a fresh id, status `pending`, and the
    /// current time as its creation timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if persistence fails.
    async fn insert_incident(&self, incident: &NewIncident) -> Result<Incident, DbError>;

    /// Fetches one incident.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>, DbError>;

    /// Moves an incident to `status`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTransition`] for a verified -> pending
    /// request, or [`DbError`] if persistence fails.
    async fn update_status(
        &self,
        id: Uuid,
        status: IncidentStatus,
    ) -> Result<Option<Incident>, DbError>;

    /// Overwrites the dispatcher notes.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if persistence fails.
    async fn update_notes(&self, id: Uuid, notes: &str) -> Result<Option<Incident>, DbError>;

    /// Loads the feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the query fails.
    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<Incident>, DbError>;

    /// Looks up the profile role of an authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the lookup fails.
    async fn user_role(&self, user_id: Uuid) -> Result<Option<Role>, DbError>;
}

/// [`IncidentStore`] backed by a `PostGIS` database.
pub struct PostgisStore {
    db: Arc<dyn Database>,
}

impl PostgisStore {
    /// Wraps an open database connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl IncidentStore for PostgisStore {
    async fn insert_incident(&self, incident: &NewIncident) -> Result<Incident, DbError> {
        queries::insert_incident(
            self.db.as_ref(),
            Uuid::new_v4(),
            incident,
            chrono::Utc::now(),
        )
        .await
    }

    async fn get_incident(&self, id: Uuid) -> Result<Option<Incident>, DbError> {
        queries::get_incident(self.db.as_ref(), id).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: IncidentStatus,
    ) -> Result<Option<Incident>, DbError> {
        queries::update_status(self.db.as_ref(), id, status).await
    }

    async fn update_notes(&self, id: Uuid, notes: &str) -> Result<Option<Incident>, DbError> {
        queries::update_notes(self.db.as_ref(), id, notes).await
    }

    async fn query_feed(&self, query: &FeedQuery) -> Result<Vec<Incident>, DbError> {
        queries::query_feed(self.db.as_ref(), query).await
    }

    async fn user_role(&self, user_id: Uuid) -> Result<Option<Role>, DbError> {
        queries::get_user_role(self.db.as_ref(), user_id).await
    }
}
