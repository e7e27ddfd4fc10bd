use thiserror::Error;

/// Custom error types for the relay server
#[derive(Debug, Error)]
pub enum RelayError {
    /// Room and peer management errors
    #[error("Room {0} already has two participants")]
    RoomFull(String),

    #[error("Peer {0} already registered")]
    PeerAlreadyExists(String),

    /// Signaling errors
    #[error("Failed to serialize message: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// External word/hint generation errors
    #[error("Word generation request failed: {0}")]
    WordGenerationFailed(String),
}

/// Convenience type alias for Results using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// Helper to create word-generation errors
    pub fn wordgen(msg: impl Into<String>) -> Self {
        RelayError::WordGenerationFailed(msg.into())
    }
}
