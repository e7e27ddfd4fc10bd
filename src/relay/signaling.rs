use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use warp::ws::Message;

use super::room::RoomManager;
use super::server::RelayServer;
use crate::games::{TicTacToeState, WordGuessState};

/// Every message on the wire: a flat JSON object with a `type` tag.
/// Negotiation payloads (`offer`, `answer`, `candidate`) are opaque to
/// the server and are only parsed far enough to classify them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// A browser announcing it wants to be paired. `join` is accepted
    /// as a legacy alias.
    #[serde(alias = "join")]
    ClientReady {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },

    /// Sent to the first-connected peer when its room fills up; the
    /// recipient initiates negotiation as the offering side.
    PeerConnected,

    Offer {
        offer: serde_json::Value,
    },

    Answer {
        answer: serde_json::Value,
    },

    Candidate {
        candidate: serde_json::Value,
    },

    EndCall,

    #[serde(alias = "chat_message")]
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<String>,
        message: String,
    },

    TicTacToeMove {
        cell: usize,
    },

    TicTacToeRestart,

    TicTacToeState {
        state: TicTacToeState,
    },

    GuessGameMove {
        letter: String,
    },

    GuessGameRestart,

    GuessGameHint,

    GuessGameState {
        state: WordGuessState,
    },

    #[serde(rename_all = "camelCase")]
    YoutubeState {
        state: i64,
        current_time: f64,
    },

    #[serde(rename_all = "camelCase")]
    YoutubeVideo {
        video_id: String,
    },
}

/// Per-connection glue between a WebSocket and the relay server. Owns
/// the identity token generated at connect time.
pub struct SignalingHandler {
    server: Arc<RelayServer>,
    sender: mpsc::UnboundedSender<Message>,
    peer_id: String,
}

impl SignalingHandler {
    pub fn new(server: Arc<RelayServer>, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            server,
            sender,
            peer_id: RoomManager::generate_peer_id(),
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub async fn handle_text(&mut self, text: &str) {
        self.server
            .route(&self.peer_id, text, &self.sender)
            .await;
    }

    pub async fn cleanup(&mut self) {
        self.server.remove_peer(&self.peer_id).await;
    }
}
