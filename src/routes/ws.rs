//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::store::StoreError;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "prepdeck_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "prepdeck_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "prepdeck_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => {
            debug!(target = "prepdeck_backend", payload = %trunc_for_log(&txt, 256), "WS rejected payload");
            ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }
          }
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "prepdeck_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "prepdeck_backend", "WebSocket disconnected");
}

fn store_error_reply(e: StoreError) -> ServerWsMessage {
  error!(target: "prepdeck_backend", error = %e, "WS request failed at the store");
  ServerWsMessage::Error { message: e.to_string() }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::DailyChallenges { visitor_id } => match get_daily(state, &visitor_id).await {
      Ok(set) => {
        tracing::info!(target: "challenge", visitor = %visitor_id, found = set.is_some(), "WS daily challenges served");
        ServerWsMessage::DailyChallenges { set }
      }
      Err(e) => store_error_reply(e),
    },

    ClientWsMessage::GenerateChallenges { visitor_id } => {
      match get_or_create(state, &visitor_id).await {
        Ok(set) => {
          tracing::info!(target: "challenge", visitor = %visitor_id, date = %set.date, "WS daily challenges generated");
          ServerWsMessage::DailyChallenges { set: Some(set) }
        }
        Err(e) => store_error_reply(e),
      }
    }

    ClientWsMessage::UpdateProgress { visitor_id, updates } => {
      match update_progress(state, &visitor_id, &updates).await {
        Ok((newly_completed, all_completed)) => {
          tracing::info!(target: "challenge", visitor = %visitor_id, newly = newly_completed.len(), all_completed, "WS progress update applied");
          ServerWsMessage::Progress { newly_completed, all_completed }
        }
        Err(e) => store_error_reply(e),
      }
    }

    ClientWsMessage::ClaimBonus { visitor_id } => match claim_bonus(state, &visitor_id).await {
      Ok((success, bonus)) => {
        tracing::info!(target: "challenge", visitor = %visitor_id, success, bonus, "WS bonus claim evaluated");
        ServerWsMessage::Bonus { success, bonus }
      }
      Err(e) => store_error_reply(e),
    },

    ClientWsMessage::History { visitor_id, limit } => {
      match history(state, &visitor_id, limit).await {
        Ok(sets) => ServerWsMessage::History { sets },
        Err(e) => store_error_reply(e),
      }
    }

    ClientWsMessage::Streak { visitor_id } => match completion_streak(state, &visitor_id).await {
      Ok(streak) => ServerWsMessage::Streak { streak },
      Err(e) => store_error_reply(e),
    },
  }
}
