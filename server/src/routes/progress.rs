//! Server-sent publish progress.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

use crate::state::AppState;

/// SSE event name carrying a `PublishProgressEvent`.
pub const PUBLISH_EVENT: &str = "publish";

/// `GET /api/commit/progress`
///
/// Subscribers only see events sent after they connect. A slow client
/// that falls behind skips the missed events.
pub async fn publish_progress(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.pipeline.broadcaster().subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|received| match received {
        Ok(event) => match Event::default().event(PUBLISH_EVENT).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                log::warn!("Failed to encode progress event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            log::warn!("Progress subscriber lagged, skipped {} event(s)", skipped);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
