/**
 * WebSocket Endpoint
 *
 * Transport adapter for the room protocol: `GET /rooms` upgrades to a
 * WebSocket carrying one JSON event per text frame. Authentication happens
 * BEFORE the upgrade - the bearer token rides in the `token` query
 * parameter (browsers cannot set headers on WebSocket requests), and an
 * invalid token is a plain 401 with no socket ever opened.
 *
 * # Connection lifecycle
 *
 * Each connection runs a writer task draining the session's outbound
 * channel into the socket, while the reader loop decodes inbound frames
 * and feeds them to the gateway. Socket close, from either side, tears
 * down the session through `CollabGateway::disconnect` so remaining room
 * members see the departure.
 */

use crate::error::CollabError;
use crate::gateway::events::{ClientEvent, ServerEvent};
use crate::gateway::handler::RoomSession;
use crate::server::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Handle WebSocket upgrade (GET /rooms?token=...)
///
/// A missing token is an authentication failure, not a malformed request.
pub async fn rooms_handler(
    State(app_state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Result<Response, CollabError> {
    let token = query
        .get("token")
        .ok_or_else(|| CollabError::unauthenticated("no token provided"))?;
    let principal = app_state.verifier.verify(token)?;
    tracing::info!("[Gateway] Upgrading connection for {}", principal.display_name);

    Ok(ws.on_upgrade(move |socket| run_connection(socket, app_state, principal)))
}

async fn run_connection(
    socket: WebSocket,
    app_state: AppState,
    principal: crate::auth::verifier::Principal,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let mut session = RoomSession::new(principal, event_tx);

    // Writer task: everything the gateway addresses to this session goes
    // out as one text frame. Ends when the channel closes on teardown.
    let writer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!("[Gateway] Failed to serialize event: {:?}", e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(_) => break,
        };
        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => app_state.gateway.handle(&mut session, event).await,
                Err(e) => {
                    tracing::debug!("[Gateway] Undecodable frame: {}", e);
                    session.reply(ServerEvent::RequestFailed {
                        code: "validationError".into(),
                        reason: format!("undecodable event: {}", e),
                        id: None,
                        media_id: None,
                    });
                }
            },
            Message::Close(_) => break,
            // Pings are answered by axum automatically; binary frames are
            // not part of the protocol.
            _ => {}
        }
    }

    app_state.gateway.disconnect(&session);
    writer.abort();
}
