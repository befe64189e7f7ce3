//! Live comment streaming over WebSocket
//!
//! One socket per model. Outbound frames are `CommentEvent`s from the
//! fan-out topic; inbound text frames are comment submissions with the
//! same shape as the HTTP endpoint. A failed submission answers with an
//! error frame on this socket only, the connection stays open.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::{ApiError, CreateCommentRequest};
use crate::domain::broadcast::EventStream;
use crate::domain::upload::UploadId;

pub async fn comments_ws(
    State(state): State<AppState>,
    Path(model_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let model_id = UploadId::new(model_id);
    // subscribe before upgrading so an unknown model still gets a JSON 404
    let events = state.comment_service.subscribe(&model_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, model_id, events)))
}

async fn handle_socket(
    socket: WebSocket,
    state: AppState,
    model_id: UploadId,
    mut events: EventStream,
) {
    let (sink, mut inbound) = socket.split();
    let sink = Arc::new(tokio::sync::Mutex::new(sink));

    let forward_sink = sink.clone();
    let forward = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "Failed to encode comment event");
                    continue;
                }
            };
            if forward_sink
                .lock()
                .await
                .send(Message::Text(payload.into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(Ok(message)) = inbound.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let request: CreateCommentRequest = match serde_json::from_str(&text) {
            Ok(request) => request,
            Err(e) => {
                debug!(model_id = %model_id, error = %e, "Ignoring malformed comment frame");
                continue;
            }
        };

        if let Err(e) = state
            .comment_service
            .create(&model_id, &request.author, &request.body)
            .await
        {
            let frame = serde_json::json!({
                "type": "error",
                "message": e.to_string(),
            });
            let _ = sink
                .lock()
                .await
                .send(Message::Text(frame.to_string().into()))
                .await;
        }
    }

    forward.abort();
    debug!(model_id = %model_id, "Comment socket closed");
}
