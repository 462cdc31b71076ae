//! Storage collaborator trait and its PostgreSQL implementation.
//!
//! The pairing components never reach for global state; each one holds an
//! `Arc<dyn TournamentRepository>` handed to it at construction.

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row};
use std::collections::HashSet;

use crate::tournament::standings::{lowest_ranked_without_bye, rank};
use crate::tournament::{
    MatchRecord, PairingError, PairingResult, PlayerId, RoundStart, StandingRow,
};

/// Advisory lock key serializing round starts across every connection
const ROUND_START_LOCK: i64 = 0x5357_4953_5321;

/// Trait for tournament storage operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Register a player; the store assigns a unique id
    async fn register_player(&self, name: &str) -> PairingResult<PlayerId>;

    /// Number of registered players
    async fn count_players(&self) -> PairingResult<usize>;

    /// Remove every match record, byes included
    async fn delete_matches(&self) -> PairingResult<()>;

    /// Remove every player together with their match records
    async fn delete_players(&self) -> PairingResult<()>;

    /// Players ranked by wins descending, ties by id ascending
    async fn get_standings(&self) -> PairingResult<Vec<StandingRow>>;

    /// Read the standings and, when the player count is odd, record a bye
    /// for the lowest-ranked player who has not had one.
    ///
    /// Runs as one atomic step: two concurrent callers never base their
    /// bye on the same snapshot. Fails with `NoEligibleByeCandidate` and
    /// writes nothing when every player already had a bye.
    async fn start_round(&self) -> PairingResult<RoundStart>;

    /// Record a match outcome or a bye
    async fn record_match(&self, record: MatchRecord) -> PairingResult<()>;

    /// Whether `a` and `b` have met in a regular match, in either order
    async fn has_played(&self, a: PlayerId, b: PlayerId) -> PairingResult<bool>;

    /// Whether the player has already received a bye
    async fn has_received_bye(&self, id: PlayerId) -> PairingResult<bool>;

    /// Full match history in recording order
    async fn list_matches(&self) -> PairingResult<Vec<MatchRecord>>;
}

/// PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn register_player(&self, name: &str) -> PairingResult<PlayerId> {
        let row = sqlx::query("INSERT INTO players (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("id"))
    }

    async fn count_players(&self) -> PairingResult<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS num FROM players")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("num") as usize)
    }

    async fn delete_matches(&self) -> PairingResult<()> {
        sqlx::query("DELETE FROM matches")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_players(&self) -> PairingResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM matches").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM players").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_standings(&self) -> PairingResult<Vec<StandingRow>> {
        Ok(fetch_standings(&self.pool).await?)
    }

    async fn start_round(&self) -> PairingResult<RoundStart> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ROUND_START_LOCK)
            .execute(&mut *tx)
            .await?;

        let mut standings = fetch_standings(&mut *tx).await?;
        rank(&mut standings);
        if standings.len() % 2 == 0 {
            tx.commit().await?;
            return Ok(RoundStart {
                standings,
                bye: None,
            });
        }

        let had_bye: HashSet<PlayerId> =
            sqlx::query("SELECT winner FROM matches WHERE winner = loser")
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .map(|r| r.get("winner"))
                .collect();

        // Dropping the transaction rolls it back and releases the lock.
        let Some(idx) = lowest_ranked_without_bye(&standings, &had_bye) else {
            return Err(PairingError::NoEligibleByeCandidate {
                players: standings.len(),
            });
        };
        let player = standings[idx].player();

        sqlx::query("INSERT INTO matches (winner, loser) VALUES ($1, $1)")
            .bind(player.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(RoundStart {
            standings,
            bye: Some(player),
        })
    }

    async fn record_match(&self, record: MatchRecord) -> PairingResult<()> {
        let (winner, loser) = record.to_columns();
        if !record.is_bye() && winner == loser {
            return Err(PairingError::InvalidMatch(winner));
        }

        let result = sqlx::query("INSERT INTO matches (winner, loser) VALUES ($1, $2)")
            .bind(winner)
            .bind(loser)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if record.is_bye() && e.is_unique_violation() => {
                Err(PairingError::DuplicateBye(winner))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn has_played(&self, a: PlayerId, b: PlayerId) -> PairingResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM matches
                WHERE winner <> loser
                  AND ((winner = $1 AND loser = $2) OR (winner = $2 AND loser = $1))
            ) AS played
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("played"))
    }

    async fn has_received_bye(&self, id: PlayerId) -> PairingResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM matches WHERE winner = $1 AND loser = $1) AS had_bye",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("had_bye"))
    }

    async fn list_matches(&self) -> PairingResult<Vec<MatchRecord>> {
        let rows = sqlx::query("SELECT winner, loser FROM matches ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| MatchRecord::from_columns(r.get("winner"), r.get("loser")))
            .collect())
    }
}

async fn fetch_standings<'e, E: PgExecutor<'e>>(
    executor: E,
) -> Result<Vec<StandingRow>, sqlx::Error> {
    // A bye row (winner = loser) joins once, so it adds one win and one match.
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name,
               COUNT(m.id) FILTER (WHERE m.winner = p.id) AS wins,
               COUNT(m.id) AS matches_played
        FROM players p
        LEFT JOIN matches m ON m.winner = p.id OR m.loser = p.id
        GROUP BY p.id, p.name
        ORDER BY wins DESC, p.id ASC
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| StandingRow {
            id: r.get("id"),
            name: r.get("name"),
            wins: r.get("wins"),
            matches_played: r.get("matches_played"),
        })
        .collect())
}
