//! Client for the hosted auth service's user endpoint.
//!
//! `GET {base_url}/auth/v1/user` with the project API key and the caller's
//! access token returns the user record for a live session, and `401` for
//! an unknown or expired one.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{AuthError, SessionVerifier};

/// Verifies access tokens against the auth service.
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AuthServiceClient {
    /// Creates a client for the auth service at `base_url`.
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Creates a client from `SUPABASE_URL` and `SUPABASE_SERVICE_ROLE_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if either variable is unset.
    pub fn from_env() -> Result<Self, AuthError> {
        let base_url = require_env("SUPABASE_URL")?;
        let api_key = require_env("SUPABASE_SERVICE_ROLE_KEY")?;
        Ok(Self::new(&base_url, &api_key))
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }
}

#[async_trait]
impl SessionVerifier for AuthServiceClient {
    async fn verify(&self, access_token: &str) -> Result<Option<Uuid>, AuthError> {
        let resp = self
            .client
            .get(self.user_url())
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Ok(None);
        }

        let body: serde_json::Value = resp.error_for_status()?.json().await?;
        parse_user_response(&body).map(Some)
    }
}

/// Extracts the user id from the auth service's user record.
fn parse_user_response(body: &serde_json::Value) -> Result<Uuid, AuthError> {
    let id = body["id"].as_str().ok_or_else(|| AuthError::Parse {
        message: "Missing id in auth user response".to_string(),
    })?;

    Uuid::parse_str(id).map_err(|e| AuthError::Parse {
        message: format!("Invalid user id {id}: {e}"),
    })
}

fn require_env(name: &str) -> Result<String, AuthError> {
    std::env::var(name).map_err(|_| AuthError::Config {
        message: format!("{name} environment variable not set"),
    })
}
