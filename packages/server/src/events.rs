//! `GET /api/incidents/events`: change notifications as Server-Sent Events.

use actix_web::{HttpResponse, http::header, web};
use futures::Stream;
use orbit_server_models::ChangeEvent;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::AppState;

/// Formats a change as one `event: change` frame.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if the event cannot be serialized.
pub fn change_frame(event: &ChangeEvent) -> Result<web::Bytes, serde_json::Error> {
    let data = serde_json::to_string(event)?;
    Ok(web::Bytes::from(format!("event: change\ndata: {data}\n\n")))
}

/// Yields every event received on `rx` until the channel closes.
///
/// When the receiver falls behind the channel buffer, the dropped events
/// are replaced by a single [`ChangeEvent::resync`].
pub fn changes(mut rx: broadcast::Receiver<ChangeEvent>) -> impl Stream<Item = ChangeEvent> {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield event,
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Change subscriber lagged by {skipped} event(s), sending resync");
                    yield ChangeEvent::resync();
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

/// Streams every change published after the client connects.
pub async fn subscribe(state: web::Data<AppState>) -> HttpResponse {
    let rx = state.changes.subscribe();
    log::debug!(
        "Change subscriber connected ({} total)",
        state.changes.receiver_count()
    );

    let events = changes(rx);
    let stream = async_stream::stream! {
        for await event in events {
            match change_frame(&event) {
                Ok(frame) => yield Ok::<_, actix_web::Error>(frame),
                Err(e) => log::error!("Failed to encode change event: {e}"),
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(stream)
}
