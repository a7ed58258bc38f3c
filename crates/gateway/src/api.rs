//! `/api` routes: chat over SSE, the event feed, and read models.
//!
//! Endpoints:
//! - `POST /api/chat`               — answer one message, streamed as SSE
//! - `GET  /api/events`             — SSE feed of every session event
//! - `GET  /api/transcript`         — rendered conversation
//! - `GET  /api/loading`            — current model loading state
//! - `GET  /api/profile/documents`  — the retrieval corpus
//! - `POST /api/reset`              — clear conversation and transcript

use crate::SharedState;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
};
use folio_assistant::{AssistantEvent, LoadingState, ProfileDocument, TranscriptEntry};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::StreamExt;
use tracing::{info, warn};

pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/events", get(events_handler))
        .route("/transcript", get(transcript_handler))
        .route("/loading", get(loading_handler))
        .route("/profile/documents", get(documents_handler))
        .route("/reset", post(reset_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn to_sse(event: &AssistantEvent) -> SseEvent {
    let data = serde_json::to_string(event).unwrap_or_default();
    SseEvent::default().event(event.kind()).data(data)
}

/// `POST /api/chat` — run one turn and stream its events.
///
/// The stream ends after the turn's `done: true` event. The turn itself runs
/// on its own task, so a client that disconnects early does not cancel it.
async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    let mut session = Arc::clone(&state.session).try_lock_owned().map_err(|_| {
        api_error(
            StatusCode::CONFLICT,
            "a response is already being generated",
        )
    })?;

    info!(message_len = message.len(), "Chat request");

    // Subscribe before the turn starts so no event is missed
    let rx = state.events.subscribe();
    tokio::spawn(async move {
        session.submit_query(&message).await;
    });

    Ok(Sse::new(turn_events(rx)).keep_alive(KeepAlive::default()))
}

/// Forward events until (and including) the final streaming event.
fn turn_events(
    rx: broadcast::Receiver<AssistantEvent>,
) -> impl futures::Stream<Item = Result<SseEvent, Infallible>> {
    futures::stream::unfold(Some(rx), |rx| async move {
        let mut rx = rx?;
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let finished = event.is_final();
                    return Some((Ok(to_sse(&event)), (!finished).then_some(rx)));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Chat stream lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

/// `GET /api/events` — every session event, for as long as the client stays.
async fn events_handler(
    State(state): State<SharedState>,
) -> Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx)
        .filter_map(|result| result.ok())
        .map(|event| Ok(to_sse(&event)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// `GET /api/transcript` — waits for any running turn to finish.
async fn transcript_handler(State(state): State<SharedState>) -> Json<Vec<TranscriptEntry>> {
    let session = state.session.lock().await;
    Json(session.transcript().to_vec())
}

async fn loading_handler(State(state): State<SharedState>) -> Json<LoadingState> {
    Json(state.loading.current())
}

async fn documents_handler(State(state): State<SharedState>) -> Json<Vec<ProfileDocument>> {
    Json(state.documents.clone())
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    status: &'static str,
}

async fn reset_handler(
    State(state): State<SharedState>,
) -> Result<Json<ResetResponse>, ApiError> {
    let mut session = state.session.try_lock().map_err(|_| {
        api_error(
            StatusCode::CONFLICT,
            "cannot reset while a response is being generated",
        )
    })?;
    session.reset();
    Ok(Json(ResetResponse { status: "reset" }))
}
