use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::RelayError;

/// Turn-taking identity assigned to a peer once its room is paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    X,
    O,
}

impl PlayerRole {
    pub fn other(self) -> Self {
        match self {
            PlayerRole::X => PlayerRole::O,
            PlayerRole::O => PlayerRole::X,
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerRole::X => write!(f, "X"),
            PlayerRole::O => write!(f, "O"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Peer {
    pub id: String,
    pub room_id: String,
    /// None until the room holds two peers.
    pub role: Option<PlayerRole>,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    /// Connection order matters: members[0] becomes X on pairing.
    pub members: Vec<String>,
    pub created_at: std::time::SystemTime,
}

/// What happened to a room when a peer was added.
#[derive(Debug, Clone)]
pub enum PairingUpdate {
    /// Room now holds a single peer waiting for a partner.
    Waiting,
    /// Room just filled up. `initiator` is the first-connected peer and
    /// must be told to start the media negotiation as the offering side.
    Paired { initiator: String },
}

/// What happened to a room when a peer was removed.
#[derive(Debug, Clone)]
pub struct Departure {
    pub room_id: String,
    pub remaining: Option<String>,
}

pub struct RoomManager {
    rooms: Arc<RwLock<HashMap<String, Room>>>,
    peers: Arc<RwLock<HashMap<String, Peer>>>,
}

impl RoomManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            peers: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Generate an opaque identity token for a new connection
    pub fn generate_peer_id() -> String {
        let mut rng = rand::thread_rng();
        format!("peer_{:08x}", rng.gen::<u32>())
    }

    /// Register a peer in a room. Rooms hold at most two peers; the
    /// transition from one to two assigns roles by connection order
    /// (first = X, second = O).
    pub async fn add_peer(&self, room_id: String, peer_id: String) -> Result<PairingUpdate, RelayError> {
        let mut rooms = self.rooms.write().await;
        let mut peers = self.peers.write().await;

        if peers.contains_key(&peer_id) {
            return Err(RelayError::PeerAlreadyExists(peer_id));
        }

        let room = rooms.entry(room_id.clone()).or_insert_with(|| Room {
            id: room_id.clone(),
            members: Vec::new(),
            created_at: std::time::SystemTime::now(),
        });

        // A third connection must not disturb an active pair.
        if room.members.len() >= 2 {
            return Err(RelayError::RoomFull(room_id));
        }

        room.members.push(peer_id.clone());
        peers.insert(
            peer_id.clone(),
            Peer {
                id: peer_id.clone(),
                room_id: room_id.clone(),
                role: None,
            },
        );

        if room.members.len() == 2 {
            let first = room.members[0].clone();
            let second = room.members[1].clone();

            if let Some(peer) = peers.get_mut(&first) {
                peer.role = Some(PlayerRole::X);
            }
            if let Some(peer) = peers.get_mut(&second) {
                peer.role = Some(PlayerRole::O);
            }

            tracing::info!(room_id = %room_id, first = %first, second = %second, "Room paired, roles assigned");
            Ok(PairingUpdate::Paired { initiator: first })
        } else {
            tracing::info!(peer_id = %peer_id, room_id = %room_id, "Peer waiting for a partner");
            Ok(PairingUpdate::Waiting)
        }
    }

    /// Remove a peer from its room.
    /// Returns the departure info if the peer was registered. A peer left
    /// alone in the room loses its role until a new partner connects.
    pub async fn remove_peer(&self, peer_id: &str) -> Option<Departure> {
        let mut rooms = self.rooms.write().await;
        let mut peers = self.peers.write().await;

        let peer = peers.remove(peer_id)?;

        let remaining = if let Some(room) = rooms.get_mut(&peer.room_id) {
            room.members.retain(|id| id != peer_id);

            if room.members.is_empty() {
                tracing::info!(room_id = %peer.room_id, "Last peer left, closing room");
                rooms.remove(&peer.room_id);
                None
            } else {
                let remaining_id = room.members[0].clone();
                if let Some(p) = peers.get_mut(&remaining_id) {
                    p.role = None;
                }
                tracing::info!(
                    peer_id = %peer_id,
                    room_id = %peer.room_id,
                    remaining = %remaining_id,
                    "Peer left room"
                );
                Some(remaining_id)
            }
        } else {
            None
        };

        Some(Departure {
            room_id: peer.room_id,
            remaining,
        })
    }

    /// Get peer information
    pub async fn get_peer(&self, peer_id: &str) -> Option<Peer> {
        let peers = self.peers.read().await;
        peers.get(peer_id).cloned()
    }

    /// Role of a peer, None while its room is unpaired
    pub async fn role_of(&self, peer_id: &str) -> Option<PlayerRole> {
        let peers = self.peers.read().await;
        peers.get(peer_id).and_then(|p| p.role)
    }

    /// The other member of the peer's room, if the room is paired
    pub async fn other_member(&self, peer_id: &str) -> Option<String> {
        let room_id = {
            let peers = self.peers.read().await;
            peers.get(peer_id)?.room_id.clone()
        };
        let rooms = self.rooms.read().await;
        let room = rooms.get(&room_id)?;
        room.members.iter().find(|id| *id != peer_id).cloned()
    }

    /// All member ids of a room, in connection order
    pub async fn room_members(&self, room_id: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    /// Check if a room exists
    pub async fn room_exists(&self, room_id: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms.contains_key(room_id)
    }
}
