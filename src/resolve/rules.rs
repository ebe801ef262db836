//! Ruleset hooks.
//!
//! The engine sequences phases and enforces legality; the numeric combat
//! outcome, retreats, event cards, bidding, threats and victory are
//! decided by a `Ruleset`. `StandardRules` is the policy the binary and the
//! tests play with; embedders can substitute their own.

use std::collections::BTreeMap;
use std::fmt;

use crate::board::{Board, Faction, LocationId, Orderings, Registry, UnitId};

use super::combat::{Combat, CombatTally, Side};

/// A nested flow an event card can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubFlow {
    Bidding,
    Threat,
}

/// Everything a ruleset may look at when judging a battle.
#[derive(Debug, Clone, Copy)]
pub struct CombatContext<'a> {
    pub board: &'a Board,
    pub registry: &'a Registry,
    pub orderings: &'a Orderings,
    pub combat: &'a Combat,
    pub tally: &'a CombatTally,
}

impl CombatContext<'_> {
    /// Units fighting on `side`: the selected movers for the attacker, the
    /// whole garrison for the defender.
    pub fn units_of(&self, side: Side) -> Vec<UnitId> {
        match side {
            Side::Attacker => self.combat.attacking_units.clone(),
            Side::Defender => self
                .board
                .get(self.combat.target)
                .map(|loc| loc.units.iter().map(|u| u.id).collect())
                .unwrap_or_default(),
        }
    }
}

/// The verdict of a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    pub victor: Side,
    /// Units removed from the board. Must belong to the combatants.
    pub casualties: Vec<UnitId>,
}

pub trait Ruleset: fmt::Debug {
    fn resolve_combat(&mut self, ctx: &CombatContext<'_>) -> CombatOutcome;

    /// Where a beaten defender falls back to. `None` destroys the survivors.
    fn retreat(&mut self, _ctx: &CombatContext<'_>, _faction: Faction) -> Option<LocationId> {
        None
    }

    fn draw_event_cards(&mut self, _round: u32) {}

    fn resolve_event_cards(&mut self, _board: &Board, _round: u32) -> Option<SubFlow> {
        None
    }

    /// Judges revealed bids. Returns true if a tie needs breaking.
    fn resolve_bids(&mut self, _bids: &BTreeMap<Faction, u32>) -> bool {
        false
    }

    fn break_tie(&mut self, _loser: Faction, _winner: Faction) {}

    fn threat_total(&mut self, _board: &Board, threat_level: u32) -> u32 {
        threat_level
    }

    fn resolve_threat(&mut self, _board: &Board, _total: u32) {}

    /// Checked at the end of every round.
    fn victor(&mut self, _board: &Board, _orderings: &Orderings, _round: u32) -> Option<Faction> {
        None
    }
}

/// Reference rules.
///
/// The stronger side wins and equal totals go to the combatant ranked
/// higher in tie-breaking order. The loser loses as many units as the
/// winner's card kills beyond the loser's card protection, cheapest first.
/// A beaten defender falls back to the lowest-id neighbour of the same
/// terrain that is empty or already its own. After `max_rounds` rounds the
/// faction holding the most bases wins.
#[derive(Debug, Clone, Default)]
pub struct StandardRules {
    pub max_rounds: Option<u32>,
}

impl StandardRules {
    pub fn new(max_rounds: Option<u32>) -> Self {
        StandardRules { max_rounds }
    }
}

impl Ruleset for StandardRules {
    fn resolve_combat(&mut self, ctx: &CombatContext<'_>) -> CombatOutcome {
        let attack = ctx.tally.attacker.total();
        let defense = ctx.tally.defender.total();
        let victor = match attack.cmp(&defense) {
            std::cmp::Ordering::Greater => Side::Attacker,
            std::cmp::Ordering::Less => Side::Defender,
            std::cmp::Ordering::Equal => {
                let favored = ctx
                    .orderings
                    .favored(ctx.combat.attacker.faction, ctx.combat.defender.faction);
                if favored == ctx.combat.attacker.faction {
                    Side::Attacker
                } else {
                    Side::Defender
                }
            }
        };
        let loser = victor.opponent();

        let card = |side: Side| {
            ctx.combat
                .side(side)
                .card
                .and_then(|c| ctx.registry.card(c))
        };
        let kills = card(victor).map_or(0, |c| c.killing_potential);
        let saves = card(loser).map_or(0, |c| c.death_defense);
        let count = kills.saturating_sub(saves) as usize;

        let home = match loser {
            Side::Attacker => ctx.combat.source,
            Side::Defender => ctx.combat.target,
        };
        let mut pool: Vec<_> = ctx
            .units_of(loser)
            .into_iter()
            .filter_map(|id| {
                let unit = ctx.board.get(home)?.unit(id)?;
                Some((ctx.registry.unit(unit.kind).cost, id))
            })
            .collect();
        pool.sort();

        CombatOutcome {
            victor,
            casualties: pool.into_iter().take(count).map(|(_, id)| id).collect(),
        }
    }

    fn retreat(&mut self, ctx: &CombatContext<'_>, faction: Faction) -> Option<LocationId> {
        let from = ctx.board.get(ctx.combat.target)?;
        from.adjacent.iter().copied().find(|&id| {
            id != ctx.combat.source
                && ctx.board.get(id).is_some_and(|loc| {
                    loc.terrain == from.terrain
                        && (loc.owner.is_none() || loc.owner == Some(faction))
                })
        })
    }

    fn victor(&mut self, board: &Board, orderings: &Orderings, round: u32) -> Option<Faction> {
        let limit = self.max_rounds?;
        if round <= limit {
            return None;
        }
        let mut bases: BTreeMap<Faction, usize> = BTreeMap::new();
        for (_, loc) in board.iter() {
            if let (Some(owner), Some(_)) = (loc.owner, loc.base) {
                *bases.entry(owner).or_default() += 1;
            }
        }
        let best = bases.values().copied().max()?;
        orderings
            .tie_break
            .iter()
            .copied()
            .find(|f| bases.get(f) == Some(&best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Base, BoardBuilder, CardId, CombatCard, Terrain, UnitKind};
    use crate::resolve::combat::SideTally;

    struct Field {
        board: Board,
        reg: Registry,
        orders: Orderings,
        combat: Combat,
    }

    fn field(attacker_card: Option<CardId>, defender_card: Option<CardId>) -> Field {
        let mut b = BoardBuilder::new();
        let camp = b.location("Camp", Terrain::Land);
        let hill = b.location("Hill", Terrain::Land);
        let refuge = b.location("Refuge", Terrain::Land);
        let gulf = b.location("Gulf", Terrain::Sea);
        b.connect(camp, hill).connect(hill, refuge).connect(hill, gulf);
        b.garrison(camp, Faction::Red, UnitKind::Infantry);
        b.garrison(hill, Faction::Blue, UnitKind::Infantry);
        b.garrison(hill, Faction::Blue, UnitKind::Advanced);
        let board = b.build().expect("board");
        let reg = Registry::standard().with_cards(vec![
            CombatCard::new("Axe", 1).with_casualties(2, 0),
            CombatCard::new("Shield", 0).with_casualties(0, 1),
        ]);
        let mv = reg.token(reg.find_token("move+0").expect("move")).expect("token");
        let units = board[camp].units.iter().map(|u| u.id).collect();
        let mut combat = Combat::begin(&board, &reg, mv, camp, hill, units).expect("combat");
        if let Some(c) = attacker_card {
            combat.play_card(Side::Attacker, c);
        }
        if let Some(c) = defender_card {
            combat.play_card(Side::Defender, c);
        }
        Field {
            board,
            reg,
            orders: Orderings::uniform(&[Faction::Red, Faction::Blue]),
            combat,
        }
    }

    fn judge(f: &Field, tally: CombatTally) -> CombatOutcome {
        let ctx = CombatContext {
            board: &f.board,
            registry: &f.reg,
            orderings: &f.orders,
            combat: &f.combat,
            tally: &tally,
        };
        StandardRules::default().resolve_combat(&ctx)
    }

    fn tally(attack: i32, defense: i32) -> CombatTally {
        CombatTally {
            attacker: SideTally {
                units: attack,
                ..Default::default()
            },
            defender: SideTally {
                units: defense,
                ..Default::default()
            },
        }
    }

    #[test]
    fn stronger_side_wins_and_ties_follow_tie_break() {
        let f = field(None, None);
        assert_eq!(judge(&f, tally(4, 3)).victor, Side::Attacker);
        assert_eq!(judge(&f, tally(2, 3)).victor, Side::Defender);
        // Red precedes Blue in tie-breaking order.
        assert_eq!(judge(&f, tally(3, 3)).victor, Side::Attacker);
    }

    #[test]
    fn casualties_are_cheapest_first_net_of_protection() {
        let f = field(Some(CardId(0)), None);
        let out = judge(&f, tally(5, 1));
        // Axe kills two: infantry (cost 1) then advanced (cost 2).
        let hill = &f.board[f.combat.target];
        let expected: Vec<_> = [UnitKind::Infantry, UnitKind::Advanced]
            .iter()
            .filter_map(|k| hill.units.iter().find(|u| u.kind == *k).map(|u| u.id))
            .collect();
        assert_eq!(out.casualties, expected);

        let f = field(Some(CardId(0)), Some(CardId(1)));
        assert_eq!(judge(&f, tally(5, 1)).casualties.len(), 1);
    }

    #[test]
    fn retreat_picks_same_terrain_free_neighbour() {
        let f = field(None, None);
        let t = tally(5, 1);
        let ctx = CombatContext {
            board: &f.board,
            registry: &f.reg,
            orderings: &f.orders,
            combat: &f.combat,
            tally: &t,
        };
        let refuge = f.board.find("Refuge");
        assert_eq!(StandardRules::default().retreat(&ctx, Faction::Blue), refuge);
    }

    #[test]
    fn victor_after_round_limit_holds_most_bases() {
        let mut b = BoardBuilder::new();
        let a = b.location("A", Terrain::Land);
        let c = b.location("C", Terrain::Land);
        b.base(a, Base::new(1, 1)).base(c, Base::new(1, 1));
        b.garrison(a, Faction::Blue, UnitKind::Infantry);
        b.garrison(c, Faction::Blue, UnitKind::Infantry);
        let board = b.build().expect("board");
        let orders = Orderings::uniform(&[Faction::Red, Faction::Blue]);
        let mut rules = StandardRules::new(Some(3));
        assert_eq!(rules.victor(&board, &orders, 3), None);
        assert_eq!(rules.victor(&board, &orders, 4), Some(Faction::Blue));
        assert_eq!(StandardRules::default().victor(&board, &orders, 99), None);
    }
}
