//! Pairing error types.

use super::models::PlayerId;
use thiserror::Error;

/// Pairing errors
#[derive(Debug, Error)]
pub enum PairingError {
    /// Storage collaborator failed or is unreachable
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Player already received their one bye
    #[error("Player {0} already has a bye")]
    DuplicateBye(PlayerId),

    /// Odd player count but every player already had a bye
    #[error("No eligible bye candidate among {players} players")]
    NoEligibleByeCandidate { players: usize },

    /// A regular match needs two distinct players
    #[error("Player {0} cannot play against themselves")]
    InvalidMatch(PlayerId),

    /// Player is not registered
    #[error("Player not found: {0}")]
    UnknownPlayer(PlayerId),
}

impl PairingError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            PairingError::Database(_) => "Storage unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error came from the storage collaborator
    pub fn is_storage(&self) -> bool {
        matches!(self, PairingError::Database(_))
    }
}

/// Result type for pairing operations
pub type PairingResult<T> = Result<T, PairingError>;
