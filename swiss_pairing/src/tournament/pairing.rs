//! Next-round pairing engine.
//!
//! One call to [`PairingEngine::next_round_pairings`] does three things:
//!
//! 1. Reads the current standings.
//! 2. With an odd player count, gives the bye to the lowest-ranked player
//!    who has not had one, records it, and removes them from the round.
//! 3. Pairs the rest by rank adjacency, never seating two players who have
//!    already met.
//!
//! The engine keeps no state between calls.

use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::config::{PairingConfig, PairingStrategy};
use super::errors::PairingResult;
use super::history::MatchHistory;
use super::models::{Pairing, RoundPairings, RoundStart, StandingRow, UnpairablePlayer};
use super::standings::StandingsProvider;
use crate::db::TournamentRepository;

/// Swiss pairing engine
#[derive(Clone)]
pub struct PairingEngine {
    standings: StandingsProvider,
    history: MatchHistory,
    config: PairingConfig,
}

impl PairingEngine {
    /// Create an engine whose components share one repository handle
    pub fn new(repo: Arc<dyn TournamentRepository>, config: PairingConfig) -> Self {
        Self {
            standings: StandingsProvider::new(repo.clone()),
            history: MatchHistory::new(repo),
            config,
        }
    }

    pub fn standings(&self) -> &StandingsProvider {
        &self.standings
    }

    pub fn history(&self) -> &MatchHistory {
        &self.history
    }

    /// Compute the next round's pairings.
    ///
    /// Records a bye as a side effect when the player count is odd. Players
    /// who could not be given an opponent they haven't already played are
    /// returned in [`RoundPairings::unpaired`] rather than as an error.
    pub async fn next_round_pairings(&self) -> PairingResult<RoundPairings> {
        let RoundStart {
            standings: mut working,
            bye,
        } = self.standings.standings_for_round().await?;

        if let Some(player) = &bye {
            working.retain(|row| row.id != player.id);
            info!("Bye awarded to player {} ({})", player.id, player.name);
        }

        let (pairings, unpaired) = match self.config.strategy {
            PairingStrategy::Greedy => self.pair_greedy(working).await?,
            PairingStrategy::Matching => self.pair_matching(working).await?,
        };

        for player in &unpaired {
            warn!(
                "Player {} ({}) has no opponent left they haven't played; not paired this round",
                player.id, player.name
            );
        }

        let round = RoundPairings {
            pairings,
            bye,
            unpaired,
        };
        debug_assert!(seats_are_unique(&round), "player seated twice: {round:?}");

        info!(
            "Paired round: {} pairings, bye: {}, unpaired: {}",
            round.pairings.len(),
            round
                .bye
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.id.to_string()),
            round.unpaired.len()
        );

        Ok(round)
    }

    /// Take the top remaining player and seat them with the nearest-ranked
    /// player they haven't met. A player with no such opponent is dropped.
    async fn pair_greedy(
        &self,
        mut working: Vec<StandingRow>,
    ) -> PairingResult<(Vec<Pairing>, Vec<UnpairablePlayer>)> {
        let mut pairings = Vec::with_capacity(working.len() / 2);
        let mut unpaired = Vec::new();

        while !working.is_empty() {
            let first = working.remove(0);

            let mut partner = None;
            for (idx, candidate) in working.iter().enumerate() {
                if self.history.has_played(first.id, candidate.id).await? {
                    debug!("Skipping rematch {} vs {}", first.id, candidate.id);
                    continue;
                }
                partner = Some(idx);
                break;
            }

            match partner {
                Some(idx) => {
                    let second = working.remove(idx);
                    debug!("Paired {} vs {}", first.id, second.id);
                    pairings.push(Pairing::new(&first, &second));
                }
                None => unpaired.push(unpairable(&first)),
            }
        }

        Ok((pairings, unpaired))
    }

    /// Maximum matching over the not-yet-played graph, preferring the same
    /// partners as the greedy pass.
    async fn pair_matching(
        &self,
        working: Vec<StandingRow>,
    ) -> PairingResult<(Vec<Pairing>, Vec<UnpairablePlayer>)> {
        let n = working.len();
        let mut allowed = vec![vec![false; n]; n];
        for i in 0..n {
            for j in (i + 1)..n {
                let fresh = !self.history.has_played(working[i].id, working[j].id).await?;
                allowed[i][j] = fresh;
                allowed[j][i] = fresh;
            }
        }

        let mut seated = vec![false; n];
        let pairings: Vec<Pairing> = max_matching(&allowed)
            .iter()
            .map(|&(i, j)| {
                seated[i] = true;
                seated[j] = true;
                debug!("Paired {} vs {}", working[i].id, working[j].id);
                Pairing::new(&working[i], &working[j])
            })
            .collect();
        let unpaired: Vec<UnpairablePlayer> = working
            .iter()
            .zip(&seated)
            .filter(|(_, s)| !**s)
            .map(|(row, _)| unpairable(row))
            .collect();

        Ok((pairings, unpaired))
    }
}

fn unpairable(row: &StandingRow) -> UnpairablePlayer {
    UnpairablePlayer {
        id: row.id,
        name: row.name.clone(),
    }
}

fn seats_are_unique(round: &RoundPairings) -> bool {
    let mut seen = HashSet::new();
    round
        .player_ids()
        .into_iter()
        .chain(round.bye.as_ref().map(|p| p.id))
        .all(|id| seen.insert(id))
}

/// Maximum-cardinality matching on a symmetric adjacency matrix.
///
/// Indices are in rank order. Among all maximum matchings this returns the
/// one the greedy pass would prefer: the lowest free index is given its
/// nearest-ranked partner unless that would make the matching smaller. When
/// the greedy result is already maximum it is returned unchanged.
///
/// Returns index pairs `(i, j)` with `i < j`, ordered by `i`.
pub fn max_matching(allowed: &[Vec<bool>]) -> Vec<(usize, usize)> {
    let n = allowed.len();
    let mut matcher = Matcher::new(allowed);
    for v in 0..n {
        if matcher.mate[v].is_none() {
            matcher.augment_from(v);
        }
    }

    let mut pairs = Vec::with_capacity(matcher.size);
    for i in 0..n {
        if !matcher.active[i] {
            continue;
        }

        let mut seated = false;
        for j in (i + 1)..n {
            if !matcher.active[j] || !allowed[i][j] {
                continue;
            }
            if matcher.try_fix(i, j) {
                pairs.push((i, j));
                seated = true;
                break;
            }
        }

        // i is unmatched in every remaining maximum matching.
        if !seated {
            if let Some(partner) = matcher.deactivate(i) {
                matcher.augment_from(partner);
            }
        }
    }

    pairs
}

/// Edmonds' blossom algorithm over the active vertices of `allowed`.
///
/// `mate` is always a maximum matching of the active subgraph.
struct Matcher<'a> {
    allowed: &'a [Vec<bool>],
    active: Vec<bool>,
    mate: Vec<Option<usize>>,
    size: usize,
}

impl<'a> Matcher<'a> {
    fn new(allowed: &'a [Vec<bool>]) -> Self {
        let n = allowed.len();
        Self {
            allowed,
            active: vec![true; n],
            mate: vec![None; n],
            size: 0,
        }
    }

    /// Commit `(i, j)` if a maximum matching of the rest is exactly one pair
    /// smaller. Leaves the matcher untouched otherwise.
    fn try_fix(&mut self, i: usize, j: usize) -> bool {
        let saved = (self.mate.clone(), self.size);
        let target = self.size.saturating_sub(1);

        let freed = [self.deactivate(i), self.deactivate(j)];
        // Any new augmenting path ends at a vertex that just lost its mate.
        for v in freed.into_iter().flatten() {
            if self.active[v] && self.mate[v].is_none() {
                self.augment_from(v);
            }
        }

        if self.size == target {
            return true;
        }
        self.active[i] = true;
        self.active[j] = true;
        (self.mate, self.size) = saved;
        false
    }

    /// Remove `v` from the graph, returning its former mate
    fn deactivate(&mut self, v: usize) -> Option<usize> {
        self.active[v] = false;
        let partner = self.mate[v].take()?;
        self.mate[partner] = None;
        self.size -= 1;
        Some(partner)
    }

    /// Grow the matching by one along an augmenting path from `root`, if any
    fn augment_from(&mut self, root: usize) {
        let Some((end, parent)) = self.find_path(root) else {
            return;
        };

        let mut v = Some(end);
        while let Some(cur) = v {
            let Some(prev) = parent[cur] else {
                break;
            };
            let next = self.mate[prev];
            self.mate[cur] = Some(prev);
            self.mate[prev] = Some(cur);
            v = next;
        }
        self.size += 1;
    }

    /// Breadth-first alternating tree from `root`, contracting blossoms.
    /// Returns the free vertex reached and the tree's parent links.
    fn find_path(&self, root: usize) -> Option<(usize, Vec<Option<usize>>)> {
        let n = self.mate.len();
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut base: Vec<usize> = (0..n).collect();
        let mut queued = vec![false; n];
        let mut queue = VecDeque::from([root]);
        queued[root] = true;

        while let Some(v) = queue.pop_front() {
            for to in 0..n {
                if !self.active[to]
                    || !self.allowed[v][to]
                    || base[v] == base[to]
                    || self.mate[v] == Some(to)
                {
                    continue;
                }

                let to_is_outer =
                    to == root || self.mate[to].is_some_and(|m| parent[m].is_some());
                if to_is_outer {
                    let top = self.common_base(&base, &parent, v, to);
                    let mut blossom = vec![false; n];
                    self.mark_path(&base, &mut parent, &mut blossom, v, top, to);
                    self.mark_path(&base, &mut parent, &mut blossom, to, top, v);
                    for k in 0..n {
                        if blossom[base[k]] {
                            base[k] = top;
                            if !queued[k] {
                                queued[k] = true;
                                queue.push_back(k);
                            }
                        }
                    }
                } else if parent[to].is_none() {
                    parent[to] = Some(v);
                    match self.mate[to] {
                        None => return Some((to, parent)),
                        Some(m) => {
                            queued[m] = true;
                            queue.push_back(m);
                        }
                    }
                }
            }
        }

        None
    }

    /// Nearest common outer ancestor of `a` and `b` in the alternating tree
    fn common_base(
        &self,
        base: &[usize],
        parent: &[Option<usize>],
        mut a: usize,
        mut b: usize,
    ) -> usize {
        let mut on_path = vec![false; base.len()];
        loop {
            a = base[a];
            on_path[a] = true;
            match self.mate[a].and_then(|m| parent[m]) {
                Some(up) => a = up,
                None => break,
            }
        }
        loop {
            b = base[b];
            if on_path[b] {
                return b;
            }
            match self.mate[b].and_then(|m| parent[m]) {
                Some(up) => b = up,
                None => return b,
            }
        }
    }

    /// Walk from `v` up to the blossom base `top`, flagging the blossom's
    /// members and threading parent links through the cycle.
    fn mark_path(
        &self,
        base: &[usize],
        parent: &mut [Option<usize>],
        blossom: &mut [bool],
        mut v: usize,
        top: usize,
        mut child: usize,
    ) {
        while base[v] != top {
            let Some(m) = self.mate[v] else {
                break;
            };
            blossom[base[v]] = true;
            blossom[base[m]] = true;
            parent[v] = Some(child);
            child = m;
            match parent[m] {
                Some(up) => v = up,
                None => break,
            }
        }
    }
}
