#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Session verification and officer authorization.
//!
//! Sessions are issued by an external auth service; this crate only
//! checks them. A request is authorized for officer actions when:
//!
//! 1. it carries an `Authorization: Bearer <access token>` header,
//! 2. the auth service resolves that token to a user id, and
//! 3. the user's `profiles.role` is `officer`.
//!
//! Token verification sits behind the [`SessionVerifier`] trait so the
//! server can be exercised with [`StaticVerifier`] in tests.

pub mod service;

use std::collections::BTreeMap;

use async_trait::async_trait;
use orbit_database::{DbError, IncidentStore};
use orbit_incident_models::Role;
use thiserror::Error;
use uuid::Uuid;

pub use service::AuthServiceClient;

/// Errors from session verification and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// HTTP request to the auth service failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No bearer token on the request.
    #[error("Missing bearer token")]
    MissingToken,

    /// The auth service did not recognise the token.
    #[error("Invalid or expired session")]
    InvalidSession,

    /// Authenticated, but not allowed to perform the action.
    #[error("Access denied: {role} is not an officer")]
    Forbidden {
        /// Role of the authenticated user.
        role: Role,
    },

    /// Role lookup failed.
    #[error("Profile lookup failed: {0}")]
    Database(#[from] DbError),

    /// Auth service response could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description.
        message: String,
    },
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Auth service user id.
    pub user_id: Uuid,
    /// Role from the `profiles` table.
    pub role: Role,
}

impl Session {
    /// Whether this caller may verify and annotate incidents.
    #[must_use]
    pub fn is_officer(&self) -> bool {
        self.role == Role::Officer
    }
}

/// Resolves an access token to the user it was issued for.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Returns the user id for a valid token, or `None` if the token is
    /// unknown or expired.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the verification backend is unreachable or
    /// answers with something unexpected.
    async fn verify(&self, access_token: &str) -> Result<Option<Uuid>, AuthError>;
}

/// A [`SessionVerifier`] with a fixed token table.
#[derive(Debug, Default, Clone)]
pub struct StaticVerifier {
    tokens: BTreeMap<String, Uuid>,
}

impl StaticVerifier {
    /// Creates a verifier that knows no tokens.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token for a user.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: Uuid) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl SessionVerifier for StaticVerifier {
    async fn verify(&self, access_token: &str) -> Result<Option<Uuid>, AuthError> {
        Ok(self.tokens.get(access_token).copied())
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// The scheme is matched case-insensitively; an empty token is treated as
/// absent.
#[must_use]
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let header = header?.trim();
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the caller behind an `Authorization` header.
///
/// Users without a profile row are treated as citizens.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] or [`AuthError::InvalidSession`] when
/// the caller cannot be identified, or the underlying verifier/store error.
pub async fn authenticate(
    verifier: &dyn SessionVerifier,
    store: &dyn IncidentStore,
    authorization: Option<&str>,
) -> Result<Session, AuthError> {
    let token = bearer_token(authorization).ok_or(AuthError::MissingToken)?;
    let user_id = verifier
        .verify(token)
        .await?
        .ok_or(AuthError::InvalidSession)?;
    let role = store.user_role(user_id).await?.unwrap_or(Role::Citizen);

    log::debug!("Authenticated user {user_id} as {role}");

    Ok(Session { user_id, role })
}

/// Like [`authenticate`], but additionally requires the officer role.
///
/// # Errors
///
/// Returns [`AuthError::Forbidden`] for authenticated non-officers, plus
/// everything [`authenticate`] can return.
pub async fn require_officer(
    verifier: &dyn SessionVerifier,
    store: &dyn IncidentStore,
    authorization: Option<&str>,
) -> Result<Session, AuthError> {
    let session = authenticate(verifier, store, authorization).await?;
    if session.is_officer() {
        Ok(session)
    } else {
        log::warn!("Rejected officer action from user {}", session.user_id);
        Err(AuthError::Forbidden { role: session.role })
    }
}
