//! Unit kinds, their catalog entries, and units on the board.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::faction::Faction;

/// The kind of a military unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Infantry,
    Advanced,
    Ship,
    BaseAssault,
}

/// The number of unit kinds.
pub const UNIT_KIND_COUNT: usize = 4;

/// All unit kinds in index order.
pub const ALL_UNIT_KINDS: [UnitKind; UNIT_KIND_COUNT] = [
    UnitKind::Infantry,
    UnitKind::Advanced,
    UnitKind::Ship,
    UnitKind::BaseAssault,
];

impl UnitKind {
    pub const fn name(self) -> &'static str {
        match self {
            UnitKind::Infantry => "infantry",
            UnitKind::Advanced => "advanced",
            UnitKind::Ship => "ship",
            UnitKind::BaseAssault => "base_assault",
        }
    }

    pub fn from_name(name: &str) -> Option<UnitKind> {
        match name {
            "infantry" => Some(UnitKind::Infantry),
            "advanced" => Some(UnitKind::Advanced),
            "ship" => Some(UnitKind::Ship),
            "base_assault" => Some(UnitKind::BaseAssault),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Catalog entry for a unit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpec {
    pub cost: u32,
    pub attack: u32,
    /// Replaces `attack` when the defender stands on a base.
    pub base_attack: Option<u32>,
    pub defense: u32,
}

impl UnitSpec {
    /// A unit whose attack and defense both equal its cost.
    pub const fn plain(cost: u32) -> Self {
        UnitSpec {
            cost,
            attack: cost,
            base_attack: None,
            defense: cost,
        }
    }

    pub fn attack_against(&self, defender_has_base: bool) -> u32 {
        match self.base_attack {
            Some(strength) if defender_has_base => strength,
            _ => self.attack,
        }
    }
}

/// Stable identity of a unit on the board.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A unit standing in some location's garrison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Unit {
    pub id: UnitId,
    pub kind: UnitKind,
    pub faction: Faction,
    /// Routed units cannot initiate movement until the round ends.
    pub routed: bool,
}

impl Unit {
    pub fn new(id: UnitId, kind: UnitKind, faction: Faction) -> Self {
        Unit {
            id,
            kind,
            faction,
            routed: false,
        }
    }
}
