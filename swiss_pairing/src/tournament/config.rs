//! Pairing configuration models.

use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// How players are matched once the bye (if any) is assigned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStrategy {
    /// Pair the top remaining player with the nearest-ranked opponent they
    /// have not played. Can strand a player in crowded histories.
    #[default]
    Greedy,
    /// Maximum matching over the not-yet-played graph, preferring the same
    /// rank-adjacent choices as `Greedy`.
    Matching,
}

impl std::fmt::Display for PairingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairingStrategy::Greedy => write!(f, "greedy"),
            PairingStrategy::Matching => write!(f, "matching"),
        }
    }
}

impl FromStr for PairingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(PairingStrategy::Greedy),
            "matching" => Ok(PairingStrategy::Matching),
            other => Err(format!("unknown pairing strategy: {other}")),
        }
    }
}

/// Pairing engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingConfig {
    pub strategy: PairingStrategy,
}

impl PairingConfig {
    pub fn new(strategy: PairingStrategy) -> Self {
        Self { strategy }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `PAIRING_STRATEGY`: `greedy` or `matching` (default: greedy)
    pub fn from_env() -> Self {
        let strategy = match env::var("PAIRING_STRATEGY") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{e}, falling back to {}", PairingStrategy::default());
                PairingStrategy::default()
            }),
            Err(_) => PairingStrategy::default(),
        };

        Self { strategy }
    }
}
