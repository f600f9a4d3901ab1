// src/api/stream.rs — Server-sent events for gallery screens

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

use crate::api::ApiState;
use crate::gallery::realtime::{RealtimeEvent, RealtimeHub};

fn to_event(event: &RealtimeEvent) -> Option<Event> {
    match Event::default().json_data(event) {
        Ok(e) => Some(e),
        Err(e) => {
            tracing::warn!("Failed to encode realtime event: {e}");
            None
        }
    }
}

/// GET /api/talkart/stream — `connected`, `recent`, then live `new_artwork` events.
pub async fn stream(
    State(state): State<ApiState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe();
    tracing::debug!(clients = state.hub.client_count(), "Gallery screen connected");

    let events = async_stream::stream! {
        for event in &subscription.initial {
            if let Some(e) = to_event(event) {
                yield Ok::<Event, Infallible>(e);
            }
        }
        let mut receiver = subscription.receiver;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Some(e) = to_event(&event) {
                        yield Ok::<Event, Infallible>(e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Gallery screen fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(events)
}

/// Send a `ping` event to every screen on a fixed period.
pub fn spawn_keepalive(hub: Arc<RealtimeHub>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // first tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            hub.ping();
        }
    })
}
