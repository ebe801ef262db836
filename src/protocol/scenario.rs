//! Match configuration.
//!
//! A `Scenario` is plain data, usually read from JSON by the binary. `build`
//! validates it and produces the catalog and the initial engine `Setup`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::board::{
    Base, BoardBuilder, BoardError, CombatCard, Faction, LocationId, Orderings, Player, Registry,
    Terrain, UnitKind, MAX_CARDS, MAX_LOCATIONS,
};
use crate::engine::{RulesConfig, Setup};
use crate::resolve::SupplyTable;

/// Errors raised while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("malformed scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid board: {0}")]
    Board(#[from] BoardError),

    #[error("unknown location '{0}'")]
    UnknownLocation(String),

    #[error("unknown combat card '{0}'")]
    UnknownCard(String),

    #[error("no factions configured")]
    NoFactions,

    #[error("every ordering must list each configured faction exactly once")]
    Orderings,

    #[error("{0} has no valid supply position")]
    MissingSupply(Faction),

    #[error("{count} {kind}s exceed the limit of {max}")]
    TooMany {
        kind: &'static str,
        count: usize,
        max: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    pub name: String,
    pub terrain: Terrain,
    #[serde(default)]
    pub base: Option<Base>,
    #[serde(default)]
    pub supply: u32,
    #[serde(default)]
    pub invest: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarrisonSpec {
    pub location: String,
    pub faction: Faction,
    pub units: Vec<UnitKind>,
}

/// Starting hand of one faction. Cards are named, not numbered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandSpec {
    pub cash_in_hand: u32,
    pub cash_pool: u32,
    pub cards: Vec<String>,
    pub unit_pool: Vec<UnitKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub locations: Vec<LocationSpec>,
    pub adjacency: Vec<(String, String)>,
    #[serde(default)]
    pub garrisons: Vec<GarrisonSpec>,
    pub factions: BTreeMap<Faction, HandSpec>,
    pub orderings: Orderings,
    /// Special tokens per round by special-order position.
    pub special_allotment: Vec<u32>,
    pub supply: SupplyTable,
    #[serde(default)]
    pub cards: Vec<CombatCard>,
    #[serde(default = "first_round")]
    pub round: u32,
    #[serde(default)]
    pub threat_level: u32,
    #[serde(default)]
    pub combat_bonus_used: bool,
    #[serde(default)]
    pub rules: RulesConfig,
}

fn first_round() -> u32 {
    1
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates the scenario and assembles the catalog and engine setup.
    pub fn build(&self) -> Result<(Registry, Setup), ScenarioError> {
        if self.factions.is_empty() {
            return Err(ScenarioError::NoFactions);
        }
        let factions: Vec<Faction> = self.factions.keys().copied().collect();
        if !self.orderings.covers(&factions) {
            return Err(ScenarioError::Orderings);
        }
        for &faction in &factions {
            let known = self
                .supply
                .positions
                .get(&faction)
                .is_some_and(|&pos| pos < self.supply.limits.len());
            if !known {
                return Err(ScenarioError::MissingSupply(faction));
            }
        }

        for (kind, count, max) in [
            ("location", self.locations.len(), MAX_LOCATIONS),
            ("card", self.cards.len(), MAX_CARDS),
        ] {
            if count > max {
                return Err(ScenarioError::TooMany { kind, count, max });
            }
        }

        let registry = Registry::standard().with_cards(self.cards.clone());

        let mut builder = BoardBuilder::new();
        let mut ids: HashMap<&str, LocationId> = HashMap::new();
        for spec in &self.locations {
            let id = builder.location(spec.name.clone(), spec.terrain);
            ids.insert(spec.name.as_str(), id);
            builder.economy(id, spec.supply, spec.invest);
            if let Some(base) = spec.base {
                builder.base(id, base);
            }
        }
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| ScenarioError::UnknownLocation(name.to_string()))
        };
        for (a, b) in &self.adjacency {
            builder.connect(lookup(a.as_str())?, lookup(b.as_str())?);
        }
        for garrison in &self.garrisons {
            let at = lookup(garrison.location.as_str())?;
            for &kind in &garrison.units {
                builder.garrison(at, garrison.faction, kind);
            }
        }
        let board = builder.build()?;

        let mut players = BTreeMap::new();
        for (&faction, hand) in &self.factions {
            let mut player = Player {
                cash_in_hand: hand.cash_in_hand,
                cash_pool: hand.cash_pool,
                unit_pool: hand.unit_pool.clone(),
                ..Player::default()
            };
            for name in &hand.cards {
                let card = registry
                    .find_card(name)
                    .ok_or_else(|| ScenarioError::UnknownCard(name.clone()))?;
                player.cards.insert(card);
            }
            players.insert(faction, player);
        }

        let setup = Setup {
            board,
            players,
            orderings: self.orderings.clone(),
            special_allotment: self.special_allotment.clone(),
            supply: self.supply.clone(),
            round: self.round,
            threat_level: self.threat_level,
            combat_bonus_used: self.combat_bonus_used,
            config: self.rules,
        };
        Ok((registry, setup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "locations": [
            {"name": "Keep", "terrain": "land", "base": {"size": 1, "defense": 1, "active": true}, "invest": 2},
            {"name": "Bay", "terrain": "sea"}
        ],
        "adjacency": [["Keep", "Bay"]],
        "garrisons": [{"location": "Keep", "faction": "red", "units": ["infantry", "infantry"]}],
        "factions": {"red": {"cash_in_hand": 2, "cash_pool": 4, "cards": ["Axe"], "unit_pool": ["ship"]}},
        "orderings": {"turn": ["red"], "tie_break": ["red"], "special": ["red"]},
        "special_allotment": [1],
        "supply": {"positions": {"red": 0}, "limits": [[3, 2]]},
        "cards": [{"name": "Axe", "strength": 2, "killing_potential": 1}]
    }"#;

    #[test]
    fn builds_board_hands_and_defaults() {
        let scenario = Scenario::from_json(SMALL).expect("parse");
        let (registry, setup) = scenario.build().expect("build");
        let keep = setup.board.find("Keep").expect("keep");
        assert_eq!(setup.board[keep].units.len(), 2);
        assert_eq!(setup.board[keep].invest, 2);
        assert_eq!(setup.round, 1);
        assert_eq!(setup.config, RulesConfig::default());
        let red = &setup.players[&Faction::Red];
        assert_eq!(red.cash_total(), 6);
        assert_eq!(registry.card(crate::board::CardId(0)).map(|c| c.killing_potential), Some(1));
        assert!(red.holds_card(crate::board::CardId(0)));
    }

    #[test]
    fn rejects_unknown_names_and_bad_orderings() {
        let mut scenario = Scenario::from_json(SMALL).expect("parse");
        scenario.adjacency.push(("Keep".into(), "Nowhere".into()));
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::UnknownLocation(name)) if name == "Nowhere"
        ));

        let mut scenario = Scenario::from_json(SMALL).expect("parse");
        scenario.orderings.turn.push(Faction::Blue);
        assert!(matches!(scenario.build(), Err(ScenarioError::Orderings)));

        let mut scenario = Scenario::from_json(SMALL).expect("parse");
        scenario.supply.positions.clear();
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::MissingSupply(Faction::Red))
        ));
    }

    #[test]
    fn malformed_json_and_bad_board_are_reported() {
        assert!(matches!(
            Scenario::from_json("{"),
            Err(ScenarioError::Json(_))
        ));
        let mut scenario = Scenario::from_json(SMALL).expect("parse");
        scenario.locations[1].base = Some(Base::new(1, 1));
        let err = scenario.build().expect_err("base at sea");
        assert_eq!(err.to_string(), "invalid board: location 'Bay' has a base but is not land");
    }

    #[test]
    fn rejects_more_cards_than_ids() {
        let mut scenario = Scenario::from_json(SMALL).expect("parse");
        let axe = scenario.cards[0].clone();
        scenario.cards.resize(MAX_CARDS + 1, axe);
        let err = scenario.build().expect_err("too many cards");
        assert!(matches!(
            err,
            ScenarioError::TooMany { kind: "card", count, max: MAX_CARDS } if count == MAX_CARDS + 1
        ));
        assert_eq!(err.to_string(), "65537 cards exceed the limit of 65536");
    }
}
