//! Tournament data models for Swiss-system play.

use serde::{Deserialize, Serialize};

/// Player ID type (assigned by the store on registration)
pub type PlayerId = i32;

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Full name as registered (need not be unique)
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A recorded match outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchRecord {
    /// A played game between two distinct players
    Regular { winner: PlayerId, loser: PlayerId },
    /// A free win awarded to a player with no opponent this round
    Bye { player: PlayerId },
}

impl MatchRecord {
    /// Decode the `(winner, loser)` storage encoding, where a bye is stored
    /// as a player beating themselves.
    pub fn from_columns(winner: PlayerId, loser: PlayerId) -> Self {
        if winner == loser {
            MatchRecord::Bye { player: winner }
        } else {
            MatchRecord::Regular { winner, loser }
        }
    }

    /// Encode into `(winner, loser)` columns
    pub fn to_columns(&self) -> (PlayerId, PlayerId) {
        match *self {
            MatchRecord::Regular { winner, loser } => (winner, loser),
            MatchRecord::Bye { player } => (player, player),
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, MatchRecord::Bye { .. })
    }

    /// Whether this is a regular match between `a` and `b`, in either order
    pub fn is_between(&self, a: PlayerId, b: PlayerId) -> bool {
        match *self {
            MatchRecord::Regular { winner, loser } => {
                (winner == a && loser == b) || (winner == b && loser == a)
            }
            MatchRecord::Bye { .. } => false,
        }
    }

    pub fn winner(&self) -> PlayerId {
        match *self {
            MatchRecord::Regular { winner, .. } => winner,
            MatchRecord::Bye { player } => player,
        }
    }
}

/// One row of the standings table, derived from match history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub id: PlayerId,
    pub name: String,
    /// Matches won, byes included
    pub wins: i64,
    /// Matches played, byes included
    pub matches_played: i64,
}

impl StandingRow {
    pub fn player(&self) -> Player {
        Player::new(self.id, self.name.clone())
    }
}

/// Standings read at the start of a round, with the bye recorded against
/// that same snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundStart {
    /// Ranked standings as they were before the bye
    pub standings: Vec<StandingRow>,
    pub bye: Option<Player>,
}

/// A single pairing for the next round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub id1: PlayerId,
    pub name1: String,
    pub id2: PlayerId,
    pub name2: String,
}

impl Pairing {
    pub fn new(first: &StandingRow, second: &StandingRow) -> Self {
        Self {
            id1: first.id,
            name1: first.name.clone(),
            id2: second.id,
            name2: second.name.clone(),
        }
    }
}

/// A player who could find no opponent they have not already played.
///
/// Not an error: the round is still produced, and the caller decides what
/// to do with the stranded player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpairablePlayer {
    pub id: PlayerId,
    pub name: String,
}

/// Everything produced by one call to the pairing engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundPairings {
    /// Pairings in rank order, strongest table first
    pub pairings: Vec<Pairing>,
    /// Player awarded (and recorded with) a bye this round
    pub bye: Option<Player>,
    /// Players left without a partner this round
    pub unpaired: Vec<UnpairablePlayer>,
}

impl RoundPairings {
    /// IDs of every player seated in a pairing, in table order
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.pairings
            .iter()
            .flat_map(|p| [p.id1, p.id2])
            .collect()
    }

    /// Whether every player in the round was either seated or given the bye
    pub fn is_complete(&self) -> bool {
        self.unpaired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_record_column_encoding() {
        assert_eq!(MatchRecord::from_columns(3, 3), MatchRecord::Bye { player: 3 });
        assert_eq!(
            MatchRecord::from_columns(1, 2),
            MatchRecord::Regular {
                winner: 1,
                loser: 2
            }
        );
        assert_eq!(MatchRecord::Bye { player: 7 }.to_columns(), (7, 7));
    }

    #[test]
    fn test_is_between_is_symmetric() {
        let record = MatchRecord::Regular {
            winner: 1,
            loser: 2,
        };
        assert!(record.is_between(1, 2));
        assert!(record.is_between(2, 1));
        assert!(!record.is_between(1, 3));
        assert!(!MatchRecord::Bye { player: 1 }.is_between(1, 1));
    }

    #[test]
    fn test_round_pairings_player_ids() {
        let a = StandingRow {
            id: 1,
            name: "Ann".to_string(),
            wins: 0,
            matches_played: 0,
        };
        let b = StandingRow {
            id: 2,
            name: "Bob".to_string(),
            wins: 0,
            matches_played: 0,
        };
        let round = RoundPairings {
            pairings: vec![Pairing::new(&a, &b)],
            bye: None,
            unpaired: vec![],
        };
        assert_eq!(round.player_ids(), vec![1, 2]);
        assert!(round.is_complete());
    }

    #[test]
    fn test_match_record_serialization() {
        let json = serde_json::to_string(&MatchRecord::Bye { player: 3 }).unwrap();
        assert_eq!(json, r#"{"Bye":{"player":3}}"#);

        let record: MatchRecord =
            serde_json::from_str(r#"{"Regular":{"winner":1,"loser":2}}"#).unwrap();
        assert_eq!(
            record,
            MatchRecord::Regular {
                winner: 1,
                loser: 2
            }
        );
    }
}
