//! Standings derived from recorded match history.

use std::collections::HashSet;
use std::sync::Arc;

use super::errors::PairingResult;
use super::models::{PlayerId, RoundStart, StandingRow};
use crate::db::TournamentRepository;

/// Sort standings by wins descending, ties broken by player id ascending.
///
/// The sort is stable, so two calls over the same rows always agree.
pub fn rank(rows: &mut [StandingRow]) {
    rows.sort_by(|a, b| b.wins.cmp(&a.wins).then(a.id.cmp(&b.id)));
}

/// Index of the lowest-ranked player in `ranked` who has not had a bye
pub(crate) fn lowest_ranked_without_bye(
    ranked: &[StandingRow],
    had_bye: &HashSet<PlayerId>,
) -> Option<usize> {
    ranked.iter().rposition(|row| !had_bye.contains(&row.id))
}

/// Produces the ranked player list the pairing engine works from
#[derive(Clone)]
pub struct StandingsProvider {
    repo: Arc<dyn TournamentRepository>,
}

impl StandingsProvider {
    pub fn new(repo: Arc<dyn TournamentRepository>) -> Self {
        Self { repo }
    }

    /// Current standings, highest wins first.
    ///
    /// Ranking is re-applied here so ordering never depends on how the
    /// store happens to sort ties. Storage errors are returned unchanged.
    pub async fn standings(&self) -> PairingResult<Vec<StandingRow>> {
        let mut rows = self.repo.get_standings().await?;
        rank(&mut rows);
        Ok(rows)
    }

    /// Standings for pairing a new round.
    ///
    /// With an odd player count the store records a bye for the
    /// lowest-ranked player without one, reading and writing under one
    /// lock so concurrent callers see each other's byes.
    pub async fn standings_for_round(&self) -> PairingResult<RoundStart> {
        let mut start = self.repo.start_round().await?;
        rank(&mut start.standings);
        Ok(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTournamentRepository;
    use crate::tournament::{MatchRecord, PairingError};

    fn row(id: i32, wins: i64) -> StandingRow {
        StandingRow {
            id,
            name: format!("P{id}"),
            wins,
            matches_played: wins,
        }
    }

    #[test]
    fn test_rank_breaks_ties_by_id() {
        let mut rows = vec![row(4, 1), row(2, 0), row(3, 1), row(1, 0)];
        rank(&mut rows);
        let ids: Vec<_> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_bye_candidate_scans_from_the_bottom() {
        let rows = vec![row(3, 2), row(1, 1), row(2, 0)];
        assert_eq!(lowest_ranked_without_bye(&rows, &HashSet::new()), Some(2));
        assert_eq!(lowest_ranked_without_bye(&rows, &HashSet::from([2])), Some(1));
        assert_eq!(lowest_ranked_without_bye(&rows, &HashSet::from([1, 2, 3])), None);
    }

    #[tokio::test]
    async fn test_round_start_records_bye_for_odd_count() {
        let repo = Arc::new(MemoryTournamentRepository::with_players(&["Ann", "Bob", "Cat"]));
        let provider = StandingsProvider::new(repo.clone());

        let start = provider.standings_for_round().await.unwrap();
        let ids: Vec<_> = start.standings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(start.bye.map(|p| p.id), Some(3));
        assert!(repo.has_received_bye(3).await.unwrap());

        let start = provider.standings_for_round().await.unwrap();
        assert_eq!(start.standings[0].id, 3);
        assert_eq!(start.bye.map(|p| p.id), Some(2));
    }

    #[tokio::test]
    async fn test_round_start_even_count_writes_nothing() {
        let repo = Arc::new(MemoryTournamentRepository::with_players(&["Ann", "Bob"]));
        let start = StandingsProvider::new(repo.clone())
            .standings_for_round()
            .await
            .unwrap();
        assert!(start.bye.is_none());
        assert!(repo.list_matches().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_standings_are_repeatable() {
        let repo = Arc::new(MemoryTournamentRepository::with_players(&[
            "Ann", "Bob", "Cat", "Dan",
        ]));
        repo.record_match(MatchRecord::Regular { winner: 4, loser: 1 })
            .await
            .unwrap();
        let provider = StandingsProvider::new(repo);

        let first = provider.standings().await.unwrap();
        let second = provider.standings().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].id, 4);
    }

    #[tokio::test]
    async fn test_standings_propagate_storage_errors() {
        let repo = Arc::new(MemoryTournamentRepository::with_players(&["Ann"]));
        repo.set_offline(true);
        let provider = StandingsProvider::new(repo);

        let err = provider.standings().await.unwrap_err();
        assert!(matches!(err, PairingError::Database(sqlx::Error::PoolTimedOut)));
    }
}
