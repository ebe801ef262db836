//! Combat cards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a combat card in the registry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CardId(pub u16);

impl CardId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A combat card: strength added to its side, plus the casualty modifiers
/// the ruleset reads at resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatCard {
    pub name: String,
    pub strength: u32,
    #[serde(default)]
    pub killing_potential: u32,
    #[serde(default)]
    pub death_defense: u32,
}

impl CombatCard {
    pub fn new(name: impl Into<String>, strength: u32) -> Self {
        CombatCard {
            name: name.into(),
            strength,
            killing_potential: 0,
            death_defense: 0,
        }
    }

    pub fn with_casualties(mut self, killing_potential: u32, death_defense: u32) -> Self {
        self.killing_potential = killing_potential;
        self.death_defense = death_defense;
        self
    }
}
