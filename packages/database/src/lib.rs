#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident store for orbit dispatch.
//!
//! Uses `switchy_database` against `PostGIS` and `switchy_schema` for
//! embedded SQL migrations. Spatial columns are written with
//! `ST_MakePoint` and read back as typed longitude/latitude columns, so
//! callers never see a textual geometry literal.
//!
//! Handlers and the feed composer talk to the [`IncidentStore`] trait.
//! [`PostgisStore`] is the production implementation; [`MemoryStore`]
//! keeps everything in process for tests and local development.

pub mod db;
pub mod memory;
pub mod queries;
pub mod store;

pub use memory::MemoryStore;
pub use store::{IncidentStore, PostgisStore};

use include_dir::{Dir, include_dir};
use orbit_incident_models::IncidentStatus;
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

/// Embedded SQL migrations from the `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// The requested status change would move an incident backwards.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: IncidentStatus,
        /// Requested status.
        to: IncidentStatus,
    },
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}
