//! Swiss-system tournament pairing.
//!
//! This module provides:
//! - Standings ranked by wins, ties broken by player id
//! - Rematch and bye bookkeeping
//! - Next-round pairing with one bye per player per tournament
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swiss_pairing::db::{Database, DatabaseConfig};
//! use swiss_pairing::tournament::{PairingConfig, PairingEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::from_env()).await?;
//!     let engine = PairingEngine::new(Arc::new(db.repository()), PairingConfig::from_env());
//!
//!     let round = engine.next_round_pairings().await?;
//!     for p in &round.pairings {
//!         println!("{} ({}) vs {} ({})", p.name1, p.id1, p.name2, p.id2);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod history;
pub mod models;
pub mod pairing;
pub mod standings;

pub use config::{PairingConfig, PairingStrategy};
pub use errors::{PairingError, PairingResult};
pub use history::MatchHistory;
pub use models::{
    MatchRecord, Pairing, Player, PlayerId, RoundPairings, RoundStart, StandingRow,
    UnpairablePlayer,
};
pub use pairing::{PairingEngine, max_matching};
pub use standings::StandingsProvider;
