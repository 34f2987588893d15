//! HTTP client for the dispatch server.
//!
//! Covers the REST endpoints and the `text/event-stream` change feed. Write
//! endpoints that need an officer session send the configured access token
//! as a bearer token.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use orbit_incident_models::{Incident, IncidentStatus};
use orbit_server_models::{
    ApiError, ApiHealth, ChangeEvent, CreateIncidentRequest, FeedQueryParams, UpdateNotesRequest,
    UpdateStatusRequest,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    FeedError, FeedSource,
    sse::{SseFrame, SseParser},
};

/// Name of the SSE event carrying a [`ChangeEvent`].
pub const CHANGE_EVENT: &str = "change";

/// Client for one dispatch server.
#[derive(Debug, Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl DispatchClient {
    /// Creates an anonymous client for the server at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attaches an access token to every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// `GET /health`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the server is unreachable or unhealthy.
    pub async fn health(&self) -> Result<ApiHealth, FeedError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        decode(resp).await
    }

    /// `GET /api/incidents`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure or an error response.
    pub async fn list_incidents(&self, query: &FeedQueryParams) -> Result<Vec<Incident>, FeedError> {
        let resp = self
            .authorized(self.client.get(self.url("/api/incidents")))
            .query(query)
            .send()
            .await?;
        decode(resp).await
    }

    /// `POST /api/incidents`. The server always stores the report as pending.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] on transport failure or an error response.
    pub async fn submit(&self, request: &CreateIncidentRequest) -> Result<Incident, FeedError> {
        let resp = self
            .authorized(self.client.post(self.url("/api/incidents")))
            .json(request)
            .send()
            .await?;
        decode(resp).await
    }

    /// `PATCH /api/incidents/{id}/status`. Requires an officer token.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Api`] with 401/403 without an officer session,
    /// 404 for an unknown id and 409 for a verified to pending change.
    pub async fn set_status(&self, id: Uuid, status: IncidentStatus) -> Result<Incident, FeedError> {
        let resp = self
            .authorized(
                self.client
                    .patch(self.url(&format!("/api/incidents/{id}/status"))),
            )
            .json(&UpdateStatusRequest { status })
            .send()
            .await?;
        decode(resp).await
    }

    /// `PATCH /api/incidents/{id}/notes`. Requires an officer token.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Api`] with 401/403 without an officer session
    /// and 404 for an unknown id.
    pub async fn set_notes(&self, id: Uuid, notes: &str) -> Result<Incident, FeedError> {
        let resp = self
            .authorized(
                self.client
                    .patch(self.url(&format!("/api/incidents/{id}/notes"))),
            )
            .json(&UpdateNotesRequest {
                notes: notes.to_string(),
            })
            .send()
            .await?;
        decode(resp).await
    }

    /// Opens `GET /api/incidents/events` and yields change notifications
    /// until the server closes the stream.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the stream cannot be opened. Errors while
    /// reading are yielded as stream items.
    pub async fn subscribe(
        &self,
    ) -> Result<impl Stream<Item = Result<ChangeEvent, FeedError>> + Send + use<>, FeedError> {
        let resp = self
            .client
            .get(self.url("/api/incidents/events"))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let resp = ensure_success(resp).await?;

        log::info!("Subscribed to change events at {}", self.base_url);

        let mut chunks = resp.bytes_stream();
        Ok(async_stream::try_stream! {
            let mut parser = SseParser::new();
            while let Some(chunk) = chunks.next().await {
                let chunk = chunk.map_err(FeedError::Http)?;
                for frame in parser.push(&chunk) {
                    if let Some(event) = parse_change(&frame)? {
                        yield event;
                    }
                }
            }
            log::info!("Change stream closed by server");
        })
    }
}

#[async_trait]
impl FeedSource for DispatchClient {
    async fn fetch(&self, query: &FeedQueryParams) -> Result<Vec<Incident>, FeedError> {
        self.list_incidents(query).await
    }
}

/// Interprets an SSE frame as a change notification. Frames for other
/// event names are skipped.
///
/// # Errors
///
/// Returns [`FeedError::Json`] if a change frame carries malformed data.
pub fn parse_change(frame: &SseFrame) -> Result<Option<ChangeEvent>, FeedError> {
    match frame.event.as_deref() {
        Some(CHANGE_EVENT) | None if !frame.data.is_empty() => {
            Ok(Some(serde_json::from_str(&frame.data)?))
        }
        _ => Ok(None),
    }
}

async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, FeedError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await?;
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(FeedError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, FeedError> {
    let resp = ensure_success(resp).await?;
    Ok(resp.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbit_server_models::ChangeKind;

    fn frame(event: Option<&str>, data: &str) -> SseFrame {
        SseFrame {
            event: event.map(str::to_string),
            data: data.to_string(),
        }
    }

    #[test]
    fn parses_change_frames() {
        let id = Uuid::new_v4();
        let data = format!(r#"{{"kind":"update","incident_id":"{id}"}}"#);

        let event = parse_change(&frame(Some("change"), &data)).unwrap().unwrap();
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.incident_id, Some(id));

        let event = parse_change(&frame(None, r#"{"kind":"resync"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(event, ChangeEvent::resync());
    }

    #[test]
    fn skips_other_events_and_rejects_bad_json() {
        assert_eq!(parse_change(&frame(Some("ping"), "{}")).unwrap(), None);
        assert_eq!(parse_change(&frame(Some("change"), "")).unwrap(), None);
        assert!(parse_change(&frame(Some("change"), "not json")).is_err());
    }

    #[test]
    fn builds_urls_without_double_slash() {
        let client = DispatchClient::new("http://localhost:3000/");
        assert_eq!(client.url("/health"), "http://localhost:3000/health");
    }
}
