#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for incident reporting and dispatch.
//!
//! Citizens submit reports through `POST /api/incidents`; officers verify
//! them and attach internal notes through the `PATCH` endpoints. Every
//! write is announced on an in-process broadcast channel that clients
//! follow via `GET /api/incidents/events` to keep their live feed current.

pub mod config;
mod events;
mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use orbit_auth::{AuthError, AuthServiceClient, SessionVerifier};
use orbit_database::{DbError, IncidentStore, PostgisStore, db, run_migrations};
use orbit_server_models::ChangeEvent;
use thiserror::Error;
use tokio::sync::broadcast;

pub use config::ServerConfig;

/// Change events buffered per subscriber before it is considered lagging.
pub const CHANGE_BUFFER: usize = 256;

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or serving failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not open the database connection.
    #[error("Database connection failed: {message}")]
    Connect {
        /// Underlying error message.
        message: String,
    },

    /// Migrations failed.
    #[error(transparent)]
    Database(#[from] DbError),

    /// Auth service client could not be configured.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Shared application state.
pub struct AppState {
    /// Incident persistence.
    pub store: Arc<dyn IncidentStore>,
    /// Access token verification.
    pub verifier: Arc<dyn SessionVerifier>,
    /// Publishes change events to SSE subscribers.
    pub changes: broadcast::Sender<ChangeEvent>,
}

impl AppState {
    /// Creates state with a fresh change channel.
    #[must_use]
    pub fn new(store: Arc<dyn IncidentStore>, verifier: Arc<dyn SessionVerifier>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            store,
            verifier,
            changes,
        }
    }

    /// Announces a change to every connected subscriber.
    pub fn publish(&self, event: ChangeEvent) {
        match self.changes.send(event) {
            Ok(n) => log::debug!("Published {:?} to {n} subscriber(s)", event.kind),
            Err(_) => log::trace!("No subscribers for {:?}", event.kind),
        }
    }
}

/// Registers every route on an app or scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .app_data(web::QueryConfig::default().error_handler(handlers::query_error))
        .route("/health", web::get().to(handlers::health))
        .service(
            web::scope("/api/incidents")
                .route("", web::get().to(handlers::list_incidents))
                .route("", web::post().to(handlers::create_incident))
                .route("/events", web::get().to(events::subscribe))
                .route("/{id}/status", web::patch().to(handlers::update_status))
                .route("/{id}/notes", web::patch().to(handlers::update_notes)),
        );
}

fn cors(frontend_url: Option<&str>) -> Cors {
    frontend_url.map_or_else(Cors::permissive, |origin| {
        Cors::default()
            .allowed_origin(origin)
            .allowed_methods(["GET", "POST", "PATCH", "OPTIONS"])
            .allow_any_header()
    })
}

/// Starts the dispatch API server.
///
/// Connects to the `PostGIS` database, runs migrations, configures the
/// auth service client, and starts the Actix-Web HTTP server. The caller
/// provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the database, migrations, or auth service
/// configuration fail, or if the HTTP server cannot bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env();

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .map_err(|e| ServerError::Connect {
            message: e.to_string(),
        })?;

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref()).await?;

    let verifier = AuthServiceClient::from_env()?;

    let state = web::Data::new(AppState::new(
        Arc::new(PostgisStore::new(Arc::from(db_conn))),
        Arc::new(verifier),
    ));

    match &config.frontend_url {
        Some(origin) => log::info!("CORS restricted to {origin}"),
        None => log::warn!("FRONTEND_URL not set, allowing any origin"),
    }
    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    let frontend_url = config.frontend_url.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(cors(frontend_url.as_deref()))
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
