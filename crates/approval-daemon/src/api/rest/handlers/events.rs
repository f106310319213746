//! Event streaming handler

use crate::api::rest::state::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::{self, Stream};
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Stream committed workflow events via SSE
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.workflow.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(envelope) => {
                let event = match Event::default()
                    .event(envelope.event.name())
                    .json_data(&envelope)
                {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to encode event for SSE");
                        Event::default().comment("encode-error")
                    }
                };
                Some((Ok(event), rx))
            }
            Err(RecvError::Lagged(skipped)) => {
                // Client lagged behind, continue
                Some((Ok(Event::default().comment(format!("lagged {}", skipped))), rx))
            }
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
