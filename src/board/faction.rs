//! Factions and the three independent orders that rank them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The number of factions a full match seats.
pub const FACTION_COUNT: usize = 6;

/// A playable faction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Red,
    Blue,
    Green,
    Gold,
    Black,
    White,
}

/// All faction variants in declaration order.
pub const ALL_FACTIONS: [Faction; FACTION_COUNT] = [
    Faction::Red,
    Faction::Blue,
    Faction::Green,
    Faction::Gold,
    Faction::Black,
    Faction::White,
];

impl Faction {
    /// Returns the lowercase name used by configuration and the text protocol.
    pub const fn name(self) -> &'static str {
        match self {
            Faction::Red => "red",
            Faction::Blue => "blue",
            Faction::Green => "green",
            Faction::Gold => "gold",
            Faction::Black => "black",
            Faction::White => "white",
        }
    }

    /// Parses a faction from its lowercase name.
    pub fn from_name(name: &str) -> Option<Faction> {
        match name {
            "red" => Some(Faction::Red),
            "blue" => Some(Faction::Blue),
            "green" => Some(Faction::Green),
            "gold" => Some(Faction::Gold),
            "black" => Some(Faction::Black),
            "white" => Some(Faction::White),
            _ => None,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The turn, tie-breaking and special-token orders of one match.
///
/// Each list is a permutation of the seated factions, best position first.
/// A faction's turn-order position is its scheduling priority; its
/// special-order position indexes the per-round special token allotment and
/// position 0 of that order holds the sight power.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderings {
    pub turn: Vec<Faction>,
    pub tie_break: Vec<Faction>,
    pub special: Vec<Faction>,
}

impl Orderings {
    /// Uses the same order for all three tracks.
    pub fn uniform(order: &[Faction]) -> Self {
        Orderings {
            turn: order.to_vec(),
            tie_break: order.to_vec(),
            special: order.to_vec(),
        }
    }

    pub fn turn_position(&self, faction: Faction) -> Option<usize> {
        position(&self.turn, faction)
    }

    pub fn tie_break_position(&self, faction: Faction) -> Option<usize> {
        position(&self.tie_break, faction)
    }

    pub fn special_position(&self, faction: Faction) -> Option<usize> {
        position(&self.special, faction)
    }

    /// The faction that wins a tie between `a` and `b`.
    ///
    /// Factions missing from the tie-breaking order lose to any listed one.
    pub fn favored(&self, a: Faction, b: Faction) -> Faction {
        let rank = |f| self.tie_break_position(f).unwrap_or(usize::MAX);
        if rank(b) < rank(a) {
            b
        } else {
            a
        }
    }

    /// Holder of the sight power (special-order position 0).
    pub fn sight_holder(&self) -> Option<Faction> {
        self.special.first().copied()
    }

    /// Holder of the tie-breaking privilege (tie-breaking position 0).
    pub fn tie_breaker(&self) -> Option<Faction> {
        self.tie_break.first().copied()
    }

    /// Returns true if every order is a permutation of `factions`.
    pub fn covers(&self, factions: &[Faction]) -> bool {
        [&self.turn, &self.tie_break, &self.special]
            .iter()
            .all(|order| is_permutation(order, factions))
    }
}

fn position(order: &[Faction], faction: Faction) -> Option<usize> {
    order.iter().position(|&f| f == faction)
}

fn is_permutation(order: &[Faction], factions: &[Faction]) -> bool {
    if order.len() != factions.len() {
        return false;
    }
    let mut a = order.to_vec();
    let mut b = factions.to_vec();
    a.sort();
    b.sort();
    a.dedup();
    a == b
}
