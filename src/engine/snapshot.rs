//! Serializable view of a match, used by the `snapshot` command and by
//! tests comparing state before and after a rejected operation.

use std::collections::BTreeMap;

use serde::Serialize;

use super::Engine;
use crate::board::{Board, Faction, LocationId, Orderings, Player};
use crate::resolve::{ActionLocations, Combat, RoundPhase};

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub round: u32,
    pub phase: RoundPhase,
    pub continuations: &'a [RoundPhase],
    pub board: &'a Board,
    pub players: &'a BTreeMap<Faction, Player>,
    pub orderings: &'a Orderings,
    /// Groups of the innermost queue frame in serving order.
    pub queue: Vec<ActionLocations>,
    pub queue_depth: usize,
    pub combat: Option<&'a Combat>,
    pub combat_bonus_used: bool,
    pub sight_power_used: bool,
    pub spawn_window: Option<(Faction, LocationId)>,
    pub winner: Option<Faction>,
}

impl Engine {
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            round: self.round,
            phase: self.phases.current(),
            continuations: self.phases.continuations(),
            board: &self.board,
            players: &self.players,
            orderings: &self.orderings,
            queue: self.scheduler.queue(),
            queue_depth: self.scheduler.depth(),
            combat: self.combat.as_ref(),
            combat_bonus_used: self.combat_bonus_used,
            sight_power_used: self.sight_power_used,
            spawn_window: self.spawn_window,
            winner: self.winner,
        }
    }
}
