//! Rematch and bye bookkeeping over the match store.

use log::debug;
use std::sync::Arc;

use super::errors::{PairingError, PairingResult};
use super::models::{MatchRecord, PlayerId};
use crate::db::TournamentRepository;

/// Answers "have these two met?" and "has this player had a bye?", and
/// records new results.
#[derive(Clone)]
pub struct MatchHistory {
    repo: Arc<dyn TournamentRepository>,
}

impl MatchHistory {
    pub fn new(repo: Arc<dyn TournamentRepository>) -> Self {
        Self { repo }
    }

    /// Whether `a` and `b` already played, regardless of who won
    pub async fn has_played(&self, a: PlayerId, b: PlayerId) -> PairingResult<bool> {
        self.repo.has_played(a, b).await
    }

    pub async fn has_bye_already(&self, id: PlayerId) -> PairingResult<bool> {
        self.repo.has_received_bye(id).await
    }

    /// Award a bye (a free win) to `id`.
    ///
    /// Fails with [`PairingError::DuplicateBye`] if the player already had
    /// one. The store enforces the same rule, which covers a concurrent
    /// caller slipping in between the check and the insert.
    pub async fn record_bye(&self, id: PlayerId) -> PairingResult<()> {
        if self.has_bye_already(id).await? {
            return Err(PairingError::DuplicateBye(id));
        }
        self.repo.record_match(MatchRecord::Bye { player: id }).await?;
        debug!("Recorded bye for player {id}");
        Ok(())
    }

    /// Record a played match. Rematches are not rejected here.
    pub async fn record_match(&self, winner: PlayerId, loser: PlayerId) -> PairingResult<()> {
        if winner == loser {
            return Err(PairingError::InvalidMatch(winner));
        }
        self.repo
            .record_match(MatchRecord::Regular { winner, loser })
            .await?;
        debug!("Recorded match: {winner} beat {loser}");
        Ok(())
    }

    /// Every recorded match, byes included, in recording order
    pub async fn matches(&self) -> PairingResult<Vec<MatchRecord>> {
        self.repo.list_matches().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTournamentRepository;

    fn history(names: &[&str]) -> MatchHistory {
        MatchHistory::new(Arc::new(MemoryTournamentRepository::with_players(names)))
    }

    #[tokio::test]
    async fn test_has_played_ignores_reporting_order() {
        let history = history(&["Ann", "Bob", "Cat"]);
        history.record_match(2, 1).await.unwrap();

        assert!(history.has_played(1, 2).await.unwrap());
        assert!(history.has_played(2, 1).await.unwrap());
        assert!(!history.has_played(1, 3).await.unwrap());
    }

    #[tokio::test]
    async fn test_bye_is_not_a_played_match() {
        let history = history(&["Ann"]);
        history.record_bye(1).await.unwrap();

        assert!(history.has_bye_already(1).await.unwrap());
        assert!(!history.has_played(1, 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_bye_fails() {
        let history = history(&["Ann", "Bob"]);
        history.record_bye(2).await.unwrap();

        let err = history.record_bye(2).await.unwrap_err();
        assert!(matches!(err, PairingError::DuplicateBye(2)));
        assert_eq!(history.matches().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rematch_is_recorded() {
        let history = history(&["Ann", "Bob"]);
        history.record_match(1, 2).await.unwrap();
        history.record_match(2, 1).await.unwrap();

        assert_eq!(history.matches().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_self_match_is_invalid() {
        let history = history(&["Ann"]);
        let err = history.record_match(1, 1).await.unwrap_err();
        assert!(matches!(err, PairingError::InvalidMatch(1)));
        assert!(history.matches().await.unwrap().is_empty());
    }
}
