//! In-memory implementation of `TournamentRepository`.
//!
//! Mirrors the PostgreSQL store's semantics without durability. Useful for
//! tests, benchmarks, and embedders that keep a tournament in one process.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::repository::TournamentRepository;
use crate::tournament::standings::{lowest_ranked_without_bye, rank};
use crate::tournament::{
    MatchRecord, PairingError, PairingResult, Player, PlayerId, RoundStart, StandingRow,
};

#[derive(Debug)]
struct State {
    players: Vec<Player>,
    matches: Vec<MatchRecord>,
    next_id: PlayerId,
}

impl Default for State {
    fn default() -> Self {
        Self {
            players: Vec::new(),
            matches: Vec::new(),
            next_id: 1,
        }
    }
}

impl State {
    fn ensure_registered(&self, id: PlayerId) -> PairingResult<()> {
        if self.players.iter().any(|p| p.id == id) {
            Ok(())
        } else {
            Err(PairingError::UnknownPlayer(id))
        }
    }

    fn standings(&self) -> Vec<StandingRow> {
        let mut tally: HashMap<PlayerId, (i64, i64)> = HashMap::new();
        for record in &self.matches {
            match *record {
                MatchRecord::Regular { winner, loser } => {
                    let w = tally.entry(winner).or_default();
                    w.0 += 1;
                    w.1 += 1;
                    tally.entry(loser).or_default().1 += 1;
                }
                MatchRecord::Bye { player } => {
                    let b = tally.entry(player).or_default();
                    b.0 += 1;
                    b.1 += 1;
                }
            }
        }

        let mut rows: Vec<StandingRow> = self
            .players
            .iter()
            .map(|p| {
                let (wins, matches_played) = tally.get(&p.id).copied().unwrap_or_default();
                StandingRow {
                    id: p.id,
                    name: p.name.clone(),
                    wins,
                    matches_played,
                }
            })
            .collect();
        rank(&mut rows);
        rows
    }
}

/// Process-local tournament store
#[derive(Debug, Default)]
pub struct MemoryTournamentRepository {
    state: Mutex<State>,
    offline: AtomicBool,
}

impl MemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given players registered in order (ids 1..=n)
    pub fn with_players(names: &[&str]) -> Self {
        let repo = Self::new();
        {
            let mut state = repo.lock();
            for name in names {
                let id = state.next_id;
                state.next_id += 1;
                state.players.push(Player::new(id, *name));
            }
        }
        repo
    }

    /// Simulate an unreachable store: every call fails with
    /// `sqlx::Error::PoolTimedOut` until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> PairingResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PairingError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl TournamentRepository for MemoryTournamentRepository {
    async fn register_player(&self, name: &str) -> PairingResult<PlayerId> {
        self.check_online()?;
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.players.push(Player::new(id, name));
        Ok(id)
    }

    async fn count_players(&self) -> PairingResult<usize> {
        self.check_online()?;
        Ok(self.lock().players.len())
    }

    async fn delete_matches(&self) -> PairingResult<()> {
        self.check_online()?;
        self.lock().matches.clear();
        Ok(())
    }

    async fn delete_players(&self) -> PairingResult<()> {
        self.check_online()?;
        let mut state = self.lock();
        state.matches.clear();
        state.players.clear();
        Ok(())
    }

    async fn get_standings(&self) -> PairingResult<Vec<StandingRow>> {
        self.check_online()?;
        Ok(self.lock().standings())
    }

    async fn start_round(&self) -> PairingResult<RoundStart> {
        self.check_online()?;
        let mut state = self.lock();
        let standings = state.standings();
        if standings.len() % 2 == 0 {
            return Ok(RoundStart {
                standings,
                bye: None,
            });
        }

        let had_bye: HashSet<PlayerId> = state
            .matches
            .iter()
            .filter(|m| m.is_bye())
            .map(MatchRecord::winner)
            .collect();
        let Some(idx) = lowest_ranked_without_bye(&standings, &had_bye) else {
            return Err(PairingError::NoEligibleByeCandidate {
                players: standings.len(),
            });
        };
        let player = standings[idx].player();
        state.matches.push(MatchRecord::Bye { player: player.id });

        Ok(RoundStart {
            standings,
            bye: Some(player),
        })
    }

    async fn record_match(&self, record: MatchRecord) -> PairingResult<()> {
        self.check_online()?;
        let mut state = self.lock();

        match record {
            MatchRecord::Regular { winner, loser } => {
                if winner == loser {
                    return Err(PairingError::InvalidMatch(winner));
                }
                state.ensure_registered(winner)?;
                state.ensure_registered(loser)?;
            }
            MatchRecord::Bye { player } => {
                state.ensure_registered(player)?;
                if state.matches.contains(&record) {
                    return Err(PairingError::DuplicateBye(player));
                }
            }
        }

        state.matches.push(record);
        Ok(())
    }

    async fn has_played(&self, a: PlayerId, b: PlayerId) -> PairingResult<bool> {
        self.check_online()?;
        Ok(self.lock().matches.iter().any(|m| m.is_between(a, b)))
    }

    async fn has_received_bye(&self, id: PlayerId) -> PairingResult<bool> {
        self.check_online()?;
        Ok(self
            .lock()
            .matches
            .contains(&MatchRecord::Bye { player: id }))
    }

    async fn list_matches(&self) -> PairingResult<Vec<MatchRecord>> {
        self.check_online()?;
        Ok(self.lock().matches.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_assigns_sequential_ids() {
        let repo = MemoryTournamentRepository::new();
        assert_eq!(repo.register_player("Ann").await.unwrap(), 1);
        assert_eq!(repo.register_player("Ann").await.unwrap(), 2);
        assert_eq!(repo.count_players().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_standings_count_wins_and_byes() {
        let repo = MemoryTournamentRepository::with_players(&["Ann", "Bob", "Cat"]);
        repo.record_match(MatchRecord::Regular { winner: 2, loser: 1 })
            .await
            .unwrap();
        repo.record_match(MatchRecord::Bye { player: 3 })
            .await
            .unwrap();

        let standings = repo.get_standings().await.unwrap();
        let ids: Vec<_> = standings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!((standings[0].wins, standings[0].matches_played), (1, 1));
        assert_eq!((standings[1].wins, standings[1].matches_played), (1, 1));
        assert_eq!((standings[2].wins, standings[2].matches_played), (0, 1));
    }

    #[tokio::test]
    async fn test_second_bye_is_rejected() {
        let repo = MemoryTournamentRepository::with_players(&["Ann"]);
        repo.record_match(MatchRecord::Bye { player: 1 })
            .await
            .unwrap();

        let err = repo
            .record_match(MatchRecord::Bye { player: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::DuplicateBye(1)));
        assert_eq!(repo.list_matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_and_unknown_players_are_rejected() {
        let repo = MemoryTournamentRepository::with_players(&["Ann", "Bob"]);

        let err = repo
            .record_match(MatchRecord::Regular { winner: 1, loser: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::InvalidMatch(1)));

        let err = repo
            .record_match(MatchRecord::Regular { winner: 1, loser: 9 })
            .await
            .unwrap_err();
        assert!(matches!(err, PairingError::UnknownPlayer(9)));
    }

    #[tokio::test]
    async fn test_delete_players_clears_history() {
        let repo = MemoryTournamentRepository::with_players(&["Ann", "Bob"]);
        repo.record_match(MatchRecord::Regular { winner: 1, loser: 2 })
            .await
            .unwrap();

        repo.delete_players().await.unwrap();
        assert_eq!(repo.count_players().await.unwrap(), 0);
        assert!(repo.list_matches().await.unwrap().is_empty());
        // ids are never reused, like a SERIAL column
        assert_eq!(repo.register_player("Cat").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_start_round_without_candidate_writes_nothing() {
        let repo = MemoryTournamentRepository::with_players(&["Ann"]);
        repo.record_match(MatchRecord::Bye { player: 1 })
            .await
            .unwrap();

        let err = repo.start_round().await.unwrap_err();
        assert!(matches!(err, PairingError::NoEligibleByeCandidate { players: 1 }));
        assert_eq!(repo.list_matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let repo = MemoryTournamentRepository::with_players(&["Ann"]);
        repo.set_offline(true);

        let err = repo.get_standings().await.unwrap_err();
        assert!(matches!(err, PairingError::Database(sqlx::Error::PoolTimedOut)));
        assert!(repo.has_received_bye(1).await.is_err());
        assert!(repo.start_round().await.is_err());

        repo.set_offline(false);
        assert!(repo.get_standings().await.is_ok());
    }
}
