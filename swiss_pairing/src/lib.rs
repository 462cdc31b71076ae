//! # Swiss Pairing
//!
//! Standings and next-round pairings for Swiss-system tournaments.
//!
//! Players are ranked by wins, and each round pairs neighbours in the
//! standings while never repeating a match. With an odd player count the
//! lowest-ranked player who has not yet had one receives a bye (a free win),
//! at most once per tournament.
//!
//! ## Core Modules
//!
//! - [`tournament`]: models, errors, standings, match history, and the
//!   pairing engine
//! - [`db`]: the storage collaborator trait with PostgreSQL and in-memory
//!   implementations
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use swiss_pairing::{MemoryTournamentRepository, PairingConfig, PairingEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), swiss_pairing::PairingError> {
//! let repo = Arc::new(MemoryTournamentRepository::with_players(&["Ann", "Bob", "Cat"]));
//! let engine = PairingEngine::new(repo, PairingConfig::default());
//!
//! let round = engine.next_round_pairings().await?;
//! assert_eq!(round.pairings.len(), 1);
//! assert_eq!(round.bye.map(|p| p.name), Some("Cat".to_string()));
//! # Ok(())
//! # }
//! ```

/// Storage collaborator: connection pool, repository trait, implementations.
pub mod db;

/// Standings, match history, and pairing.
pub mod tournament;

pub use db::{MemoryTournamentRepository, PgTournamentRepository, TournamentRepository};
pub use tournament::{
    MatchHistory, MatchRecord, Pairing, PairingConfig, PairingEngine, PairingError,
    PairingResult, PairingStrategy, Player, PlayerId, RoundPairings, RoundStart, StandingRow,
    StandingsProvider, UnpairablePlayer, max_matching,
};
