use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::jwt::verify_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Push an event to every open socket of `user_id`. Dropped silently when nobody listens.
pub fn broadcast(state: &AppState, user_id: Uuid, event: &str, payload: Value) {
    if let Some(tx) = state.ws_tx.as_ref() {
        let msg = serde_json::json!({
            "type": event,
            "user_id": user_id,
            "payload": payload,
        });
        let _ = tx.send(msg.to_string());
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let user_id = match authenticate_ws(&state, query.token.as_deref()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("WebSocket auth failed: {}", e);
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

fn authenticate_ws(state: &AppState, token: Option<&str>) -> Result<Uuid, &'static str> {
    let token = token.ok_or("Missing token query parameter")?;
    let token_data = verify_token(token, &state.config.jwt_secret)
        .map_err(|_| "Invalid or expired token")?;
    Ok(token_data.claims.sub)
}

/// Only messages addressed to `user_id` are forwarded.
fn is_for_user(msg: &str, user_id: Uuid) -> bool {
    serde_json::from_str::<Value>(msg)
        .ok()
        .and_then(|v| v.get("user_id").and_then(|u| u.as_str()).map(str::to_owned))
        .is_some_and(|target| target == user_id.to_string())
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    let Some(mut rx) = state.ws_tx.as_ref().map(|tx| tx.subscribe()) else {
        tracing::warn!(user_id = %user_id, "WebSocket broadcast channel not initialized");
        return;
    };
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            if !is_for_user(&msg, user_id) {
                continue;
            }
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_filtered_by_user() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mine = serde_json::json!({ "type": "check_in_recorded", "user_id": me }).to_string();
        let theirs = serde_json::json!({ "type": "check_in_recorded", "user_id": other }).to_string();

        assert!(is_for_user(&mine, me));
        assert!(!is_for_user(&theirs, me));
        assert!(!is_for_user("not json", me));
    }
}
