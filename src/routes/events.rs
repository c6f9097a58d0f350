use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures_util::Stream;
use tokio::sync::broadcast;

use crate::auth::extractor::AuthUser;
use crate::state::SharedState;

/// Live change feed for the authenticated user's room. At-most-once: a slow
/// consumer that lags simply misses events and reconciles by refetching.
pub async fn subscribe(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events.subscribe(auth.user_id);

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let sse = SseEvent::default()
                        .event(event.name)
                        .data(event.payload.to_string());
                    return Some((Ok::<_, Infallible>(sse), rx));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("event stream lagged, skipped {skipped}");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
