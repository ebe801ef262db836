//! State of one battle and the strength tally handed to the ruleset.
//!
//! Step sequencing (assist, card, bonus, resolution, end) is owned by the
//! phase machine; this module only records what each side has committed.

use serde::{Deserialize, Serialize};

use crate::board::{ActionToken, Board, CardId, Faction, LocationId, Registry, UnitId};
use crate::error::{GameResult, IllegalState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Side::Attacker => "attacker",
            Side::Defender => "defender",
        }
    }

    pub fn from_name(name: &str) -> Option<Side> {
        match name {
            "attacker" => Some(Side::Attacker),
            "defender" => Some(Side::Defender),
            _ => None,
        }
    }
}

/// What one side has committed so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SideState {
    pub faction: Faction,
    pub token_bonus: i32,
    pub assist: i32,
    pub card: Option<CardId>,
    pub bonus: i32,
    pub used_bonus: bool,
}

impl SideState {
    fn new(faction: Faction, token_bonus: i32) -> Self {
        SideState {
            faction,
            token_bonus,
            assist: 0,
            card: None,
            bonus: 0,
            used_bonus: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Combat {
    pub source: LocationId,
    pub target: LocationId,
    pub attacking_units: Vec<UnitId>,
    pub attacker: SideState,
    pub defender: SideState,
}

impl Combat {
    /// Opens a battle for `units` moving from `source` into the hostile
    /// `target`. The attacker gets the move token's bonus; the defender gets
    /// its own token's bonus plus the target's active base defense.
    pub fn begin(
        board: &Board,
        registry: &Registry,
        token: &ActionToken,
        source: LocationId,
        target: LocationId,
        units: Vec<UnitId>,
    ) -> GameResult<Combat> {
        let src = board.location(source)?;
        let dst = board.location(target)?;
        let hostile = IllegalState::InvalidTarget {
            from: source,
            target,
        };
        let (Some(attacker), Some(defender)) = (src.owner, dst.owner) else {
            return Err(hostile.into());
        };
        if attacker == defender {
            return Err(hostile.into());
        }

        let defender_token = dst
            .token
            .and_then(|t| registry.token(t))
            .map_or(0, ActionToken::combat_bonus);
        let base = dst.base.map_or(0, |b| b.effective_defense() as i32);

        Ok(Combat {
            source,
            target,
            attacking_units: units,
            attacker: SideState::new(attacker, token.combat_bonus()),
            defender: SideState::new(defender, defender_token + base),
        })
    }

    pub fn side(&self, side: Side) -> &SideState {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideState {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }

    pub fn side_of(&self, faction: Faction) -> Option<Side> {
        if self.attacker.faction == faction {
            Some(Side::Attacker)
        } else if self.defender.faction == faction {
            Some(Side::Defender)
        } else {
            None
        }
    }

    pub(crate) fn add_assist(&mut self, side: Side, strength: i32) {
        self.side_mut(side).assist += strength;
    }

    pub(crate) fn play_card(&mut self, side: Side, card: CardId) {
        self.side_mut(side).card = Some(card);
    }

    pub fn both_cards_played(&self) -> bool {
        self.attacker.card.is_some() && self.defender.card.is_some()
    }

    pub(crate) fn apply_bonus(&mut self, side: Side, amount: i32) {
        let state = self.side_mut(side);
        state.bonus += amount;
        state.used_bonus = true;
    }

    /// Sums each side's strength on the current board.
    pub fn tally(&self, board: &Board, registry: &Registry) -> CombatTally {
        let (Some(src), Some(dst)) = (board.get(self.source), board.get(self.target)) else {
            return CombatTally::default();
        };
        let fortified = dst.base.is_some_and(|b| b.active);

        let attack: u32 = src
            .units
            .iter()
            .filter(|u| self.attacking_units.contains(&u.id))
            .map(|u| registry.unit(u.kind).attack_against(fortified))
            .sum();
        let defense: u32 = dst
            .units
            .iter()
            .filter(|u| !u.routed)
            .map(|u| registry.unit(u.kind).defense)
            .sum();

        let card = |state: &SideState| {
            state
                .card
                .and_then(|c| registry.card(c))
                .map_or(0, |c| c.strength as i32)
        };

        CombatTally {
            attacker: SideTally {
                units: attack as i32,
                token_bonus: self.attacker.token_bonus,
                assist: self.attacker.assist,
                card: card(&self.attacker),
                bonus: self.attacker.bonus,
            },
            defender: SideTally {
                units: defense as i32,
                token_bonus: self.defender.token_bonus,
                assist: self.defender.assist,
                card: card(&self.defender),
                bonus: self.defender.bonus,
            },
        }
    }
}

/// Strength breakdown of one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideTally {
    pub units: i32,
    pub token_bonus: i32,
    pub assist: i32,
    pub card: i32,
    pub bonus: i32,
}

impl SideTally {
    pub fn total(&self) -> i32 {
        self.units + self.token_bonus + self.assist + self.card + self.bonus
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CombatTally {
    pub attacker: SideTally,
    pub defender: SideTally,
}

impl CombatTally {
    pub fn side(&self, side: Side) -> &SideTally {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }
}
