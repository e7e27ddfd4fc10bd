use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use warp::ws::Message;

use super::room::{PairingUpdate, RoomManager};
use super::signaling::RelayMessage;
use crate::error::Result;
use crate::games::{TicTacToeState, WordGuessState};
use crate::wordgen::WordSource;

fn encode(message: &RelayMessage) -> Result<String> {
    Ok(serde_json::to_string(message)?)
}

/// The authoritative game states owned by one room. Created when the
/// room pairs, replaced on restart or depopulation, dropped with the
/// room.
struct RoomGames {
    tic_tac_toe: TicTacToeState,
    word_guess: WordGuessState,
}

impl RoomGames {
    fn new(secret: String) -> Self {
        Self {
            tic_tac_toe: TicTacToeState::new(),
            word_guess: WordGuessState::new(secret),
        }
    }
}

/// Pairs connections into rooms, relays negotiation envelopes
/// point-to-point, broadcasts chat and sync pulses, and owns the game
/// state machines. All mutation happens inside the dispatch of a single
/// message; clients never touch game state directly.
pub struct RelayServer {
    room_manager: Arc<RoomManager>,
    senders: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>,
    games: Arc<RwLock<HashMap<String, RoomGames>>>,
    word_source: Arc<WordSource>,
    default_room: String,
}

impl RelayServer {
    pub fn new(word_source: WordSource, default_room: impl Into<String>) -> Self {
        Self {
            room_manager: RoomManager::new(),
            senders: Arc::new(RwLock::new(HashMap::new())),
            games: Arc::new(RwLock::new(HashMap::new())),
            word_source: Arc::new(word_source),
            default_room: default_room.into(),
        }
    }

    /// Classify and dispatch one inbound message. Malformed payloads are
    /// dropped and logged; nothing a client sends can tear the server
    /// down.
    pub async fn route(&self, peer_id: &str, raw: &str, sender: &mpsc::UnboundedSender<Message>) {
        let message = match serde_json::from_str::<RelayMessage>(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(peer_id = %peer_id, error = %e, "Dropping malformed message");
                return;
            }
        };

        if let RelayMessage::ClientReady { room_id } = &message {
            let room_id = room_id
                .clone()
                .unwrap_or_else(|| self.default_room.clone());
            self.register_peer(peer_id, room_id, sender).await;
            return;
        }

        // Everything past this point requires room membership.
        let peer = match self.room_manager.get_peer(peer_id).await {
            Some(peer) => peer,
            None => {
                tracing::debug!(peer_id = %peer_id, "Ignoring message from unregistered peer");
                return;
            }
        };
        let room_id = peer.room_id.clone();

        match message {
            RelayMessage::ClientReady { .. } => {}

            // Negotiation envelopes are point-to-point: the other room
            // member gets the raw text verbatim, never a broadcast.
            RelayMessage::Offer { .. }
            | RelayMessage::Answer { .. }
            | RelayMessage::Candidate { .. }
            | RelayMessage::EndCall => {
                self.relay_to_other(peer_id, raw).await;
            }

            // Chat and playback pulses go to every room member, sender
            // included, so all clients reconcile against one path.
            RelayMessage::Chat { .. }
            | RelayMessage::YoutubeState { .. }
            | RelayMessage::YoutubeVideo { .. } => {
                self.broadcast_raw(&room_id, raw).await;
            }

            RelayMessage::TicTacToeMove { cell } => {
                let role = match peer.role {
                    Some(role) => role,
                    None => {
                        tracing::debug!(peer_id = %peer_id, "Move from unpaired peer, dropping");
                        return;
                    }
                };

                let accepted = {
                    let mut games = self.games.write().await;
                    games.get_mut(&room_id).and_then(|games| {
                        if games.tic_tac_toe.apply_move(cell, role) {
                            Some(games.tic_tac_toe.clone())
                        } else {
                            None
                        }
                    })
                };

                match accepted {
                    Some(state) => {
                        self.broadcast_message(&room_id, &RelayMessage::TicTacToeState { state })
                            .await;
                    }
                    None => {
                        tracing::debug!(peer_id = %peer_id, cell, "Rejected tic-tac-toe move");
                    }
                }
            }

            RelayMessage::TicTacToeRestart => {
                let state = {
                    let mut games = self.games.write().await;
                    match games.get_mut(&room_id) {
                        Some(games) => {
                            games.tic_tac_toe.restart();
                            Some(games.tic_tac_toe.clone())
                        }
                        None => None,
                    }
                };

                if let Some(state) = state {
                    tracing::info!(room_id = %room_id, "Tic-tac-toe restarted");
                    self.broadcast_message(&room_id, &RelayMessage::TicTacToeState { state })
                        .await;
                }
            }

            RelayMessage::GuessGameMove { letter } => {
                let mut chars = letter.chars();
                let letter = match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => {
                        tracing::debug!(peer_id = %peer_id, "Guess is not a single letter, dropping");
                        return;
                    }
                };

                let accepted = {
                    let mut games = self.games.write().await;
                    games.get_mut(&room_id).and_then(|games| {
                        if games.word_guess.guess(letter) {
                            Some(games.word_guess.clone())
                        } else {
                            None
                        }
                    })
                };

                match accepted {
                    Some(state) => {
                        self.broadcast_message(&room_id, &RelayMessage::GuessGameState { state })
                            .await;
                    }
                    None => {
                        tracing::debug!(peer_id = %peer_id, %letter, "Rejected letter guess");
                    }
                }
            }

            RelayMessage::GuessGameRestart => {
                // Draw the word before taking the lock; the generator may
                // block for a few seconds on its network timeout.
                let secret = self.word_source.generate_word().await;
                let state = {
                    let mut games = self.games.write().await;
                    match games.get_mut(&room_id) {
                        Some(games) => {
                            games.word_guess = WordGuessState::new(secret);
                            Some(games.word_guess.clone())
                        }
                        None => None,
                    }
                };

                if let Some(state) = state {
                    tracing::info!(room_id = %room_id, "Guess game restarted");
                    self.broadcast_message(&room_id, &RelayMessage::GuessGameState { state })
                        .await;
                }
            }

            RelayMessage::GuessGameHint => {
                let secret = {
                    let games = self.games.read().await;
                    match games.get(&room_id) {
                        Some(games) => games.word_guess.secret().to_string(),
                        None => return,
                    }
                };

                // The lock is not held across the generator call, so the
                // word may be replaced by a restart or a departure while
                // we wait. attach_hint verifies the hint still applies.
                let hint = self.word_source.generate_hint(&secret).await;

                if let Some(state) = self.attach_hint(&room_id, &secret, hint).await {
                    self.broadcast_message(&room_id, &RelayMessage::GuessGameState { state })
                        .await;
                }
            }

            // These only ever originate on the server.
            RelayMessage::PeerConnected
            | RelayMessage::TicTacToeState { .. }
            | RelayMessage::GuessGameState { .. } => {
                tracing::debug!(peer_id = %peer_id, "Dropping server-origin message type from client");
            }
        }
    }

    /// Deregister a closed connection. If its partner stays behind, the
    /// games are reinitialized and fresh states pushed to the survivor.
    pub async fn remove_peer(&self, peer_id: &str) {
        {
            let mut senders = self.senders.write().await;
            senders.remove(peer_id);
        }

        if let Some(departure) = self.room_manager.remove_peer(peer_id).await {
            if departure.remaining.is_some() {
                self.reset_games(&departure.room_id).await;
                self.broadcast_states(&departure.room_id).await;
            } else {
                let mut games = self.games.write().await;
                games.remove(&departure.room_id);
            }
        }
    }

    async fn register_peer(
        &self,
        peer_id: &str,
        room_id: String,
        sender: &mpsc::UnboundedSender<Message>,
    ) {
        if self.room_manager.get_peer(peer_id).await.is_some() {
            tracing::debug!(peer_id = %peer_id, "Duplicate client_ready, ignoring");
            return;
        }

        {
            let mut senders = self.senders.write().await;
            senders.insert(peer_id.to_string(), sender.clone());
        }

        match self
            .room_manager
            .add_peer(room_id.clone(), peer_id.to_string())
            .await
        {
            Ok(PairingUpdate::Waiting) => {}
            Ok(PairingUpdate::Paired { initiator }) => {
                self.reset_games(&room_id).await;
                // Exactly one notification, to the first-connected peer,
                // which then creates the offer.
                self.send_message(&initiator, &RelayMessage::PeerConnected)
                    .await;
                self.broadcast_states(&room_id).await;
            }
            Err(e) => {
                tracing::warn!(peer_id = %peer_id, room_id = %room_id, error = %e, "Rejecting connection");
                let mut senders = self.senders.write().await;
                senders.remove(peer_id);
            }
        }
    }

    /// Write a generated hint back to the room's word game, but only if
    /// the secret is still the one the hint was generated for. A stale
    /// hint is dropped rather than attached to a word it does not
    /// describe.
    async fn attach_hint(
        &self,
        room_id: &str,
        secret: &str,
        hint: String,
    ) -> Option<WordGuessState> {
        let mut games = self.games.write().await;
        match games.get_mut(room_id) {
            Some(games) if games.word_guess.secret() == secret => {
                games.word_guess.set_hint(hint);
                Some(games.word_guess.clone())
            }
            Some(_) => {
                tracing::debug!(room_id = %room_id, "Word changed during hint generation, dropping hint");
                None
            }
            None => None,
        }
    }

    async fn reset_games(&self, room_id: &str) {
        let secret = self.word_source.generate_word().await;
        let mut games = self.games.write().await;
        games.insert(room_id.to_string(), RoomGames::new(secret));
        tracing::info!(room_id = %room_id, "Game states reinitialized");
    }

    /// Push full snapshots of both games to everyone in the room.
    async fn broadcast_states(&self, room_id: &str) {
        let states = {
            let games = self.games.read().await;
            games
                .get(room_id)
                .map(|g| (g.tic_tac_toe.clone(), g.word_guess.clone()))
        };

        if let Some((tic_tac_toe, word_guess)) = states {
            self.broadcast_message(room_id, &RelayMessage::TicTacToeState { state: tic_tac_toe })
                .await;
            self.broadcast_message(room_id, &RelayMessage::GuessGameState { state: word_guess })
                .await;
        }
    }

    async fn relay_to_other(&self, peer_id: &str, raw: &str) {
        match self.room_manager.other_member(peer_id).await {
            Some(other) => self.send_raw(&other, raw).await,
            // The room may not be paired yet; relaying into the void is
            // a legitimate no-op.
            None => tracing::debug!(peer_id = %peer_id, "No partner to relay to"),
        }
    }

    async fn broadcast_message(&self, room_id: &str, message: &RelayMessage) {
        match encode(message) {
            Ok(text) => self.broadcast_raw(room_id, &text).await,
            Err(e) => tracing::error!(room_id = %room_id, error = %e, "Dropping broadcast"),
        }
    }

    async fn broadcast_raw(&self, room_id: &str, text: &str) {
        for member in self.room_manager.room_members(room_id).await {
            self.send_raw(&member, text).await;
        }
    }

    async fn send_message(&self, peer_id: &str, message: &RelayMessage) {
        match encode(message) {
            Ok(text) => self.send_raw(peer_id, &text).await,
            Err(e) => tracing::error!(peer_id = %peer_id, error = %e, "Dropping message"),
        }
    }

    async fn send_raw(&self, peer_id: &str, text: &str) {
        let senders = self.senders.read().await;
        if let Some(sender) = senders.get(peer_id) {
            if sender.send(Message::text(text)).is_err() {
                tracing::debug!(peer_id = %peer_id, "Peer channel closed, dropping message");
            }
        }
    }
}
