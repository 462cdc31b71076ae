//! SQL schema for the tournament store.
//!
//! A bye is stored as a match whose winner and loser are the same player.
//! The partial unique index allows at most one such row per player, so a
//! racing second bye fails at the storage layer.

/// Idempotent schema applied by [`Database::migrate`](super::Database::migrate)
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS players (
    id   SERIAL PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id     SERIAL PRIMARY KEY,
    winner INTEGER NOT NULL REFERENCES players (id),
    loser  INTEGER NOT NULL REFERENCES players (id)
);

CREATE UNIQUE INDEX IF NOT EXISTS matches_one_bye_per_player
    ON matches (winner) WHERE winner = loser;

CREATE INDEX IF NOT EXISTS matches_winner_loser_idx
    ON matches (winner, loser);
"#;
