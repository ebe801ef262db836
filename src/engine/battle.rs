//! Combat operations: supporters declare, both sides play a card, the
//! favored side may spend the combat bonus, then the ruleset decides.

use tracing::{debug, info, warn};

use super::Engine;
use crate::board::{CardId, Faction, LocationId, UnitId};
use crate::error::{GameResult, IllegalState, InvalidInput};
use crate::movegen;
use crate::resolve::{group_locations, Combat, CombatContext, RoundPhase, Side};

impl Engine {
    /// Opens `combat`: pushes the reactive frame and enters the combat
    /// sub-chain.
    pub(super) fn begin_combat(&mut self, combat: Combat) -> GameResult<()> {
        let (source, target) = (combat.source, combat.target);
        let board = &self.board;
        let registry = &self.registry;
        let entries = board[target]
            .adjacent
            .iter()
            .copied()
            .filter(|&id| id != source)
            .filter_map(|id| {
                let loc = &board[id];
                let owner = loc.owner?;
                let token = registry.token(loc.token?)?;
                let supports = token.kind.is_reactive()
                    && movegen::reachable(board, id, token.kind).contains(&target)
                    && movegen::accepts(board, registry, token, id, target);
                supports.then_some((id, owner, token.priority))
            });
        let groups = group_locations(entries, &self.orderings);

        self.phases.jump(RoundPhase::CombatAssist)?;
        info!(
            attacker = %combat.attacker.faction,
            defender = %combat.defender.faction,
            %source,
            %target,
            supporters = groups.len(),
            "combat started"
        );
        self.scheduler.push_frame(groups);
        self.combat = Some(combat);
        self.settle()
    }

    /// Declares the supporting token on `location` for one side, or for
    /// neither with `None`.
    pub fn support(
        &mut self,
        faction: Faction,
        location: LocationId,
        side: Option<Side>,
    ) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::CombatAssist], "support")?;
        self.seat(faction)?;
        let loc = self.owned(faction, location)?;
        let token = loc.token.ok_or(IllegalState::NoToken(location))?;
        if !self.scheduler.is_eligible(faction, location) {
            return Err(IllegalState::OutOfTurn(faction).into());
        }
        let combat = self.active_combat("support")?;
        let strength = match side {
            Some(side) => {
                let fortified = self.board[combat.target].base.is_some_and(|b| b.active);
                let units: u32 = loc
                    .units
                    .iter()
                    .filter(|u| !u.routed)
                    .map(|u| {
                        let spec = self.registry.unit(u.kind);
                        match side {
                            Side::Attacker => spec.attack_against(fortified),
                            Side::Defender => spec.defense,
                        }
                    })
                    .sum();
                Some((side, self.token_spec(token)?.strength + units as i32))
            }
            None => None,
        };

        if let (Some((side, strength)), Some(combat)) = (strength, self.combat.as_mut()) {
            combat.add_assist(side, strength);
            info!(%faction, %location, side = side.name(), strength, "support declared");
        } else {
            debug!(%faction, %location, "support withheld");
        }
        self.scheduler.complete(location);
        if self.scheduler.is_drained() {
            self.advance_and_settle()?;
        }
        self.debug_check();
        Ok(())
    }

    /// Commits a combat card from hand. The step ends once both sides have.
    pub fn play_combat_card(&mut self, faction: Faction, card: CardId) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::CombatCard], "play_combat_card")?;
        let player = self.seat(faction)?;
        let combat = self.active_combat("play_combat_card")?;
        let side = combat
            .side_of(faction)
            .ok_or(IllegalState::NotCombatant(faction))?;
        self.registry
            .card(card)
            .ok_or(InvalidInput::UnknownCard(card))?;
        if combat.side(side).card.is_some() {
            return Err(IllegalState::CardAlreadyPlayed(faction).into());
        }
        if !player.holds_card(card) {
            return Err(IllegalState::CardNotInHand(card).into());
        }

        self.seat_mut(faction)?.discard_card(card);
        let both = self.combat.as_mut().is_some_and(|c| {
            c.play_card(side, card);
            c.both_cards_played()
        });
        debug!(%faction, %card, "combat card played");
        if both {
            self.advance_and_settle()?;
        }
        self.debug_check();
        Ok(())
    }

    /// Spends the once-per-match combat bonus. Only the combatant ranked
    /// higher in tie-breaking order may; declining is an explicit advance.
    pub fn use_combat_bonus(&mut self, faction: Faction) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::CombatBonus], "use_combat_bonus")?;
        self.seat(faction)?;
        let combat = self.active_combat("use_combat_bonus")?;
        let side = combat
            .side_of(faction)
            .ok_or(IllegalState::NotCombatant(faction))?;
        if self.combat_bonus_used {
            return Err(IllegalState::CombatBonusSpent.into());
        }
        let favored = self
            .orderings
            .favored(combat.attacker.faction, combat.defender.faction);
        if favored != faction {
            return Err(IllegalState::NotFavored(faction).into());
        }

        let amount = self.config.combat_bonus_strength;
        if let Some(combat) = self.combat.as_mut() {
            combat.apply_bonus(side, amount);
        }
        self.combat_bonus_used = true;
        info!(%faction, amount, "combat bonus spent");
        self.advance_and_settle()?;
        self.debug_check();
        Ok(())
    }

    /// Asks the ruleset for a verdict and applies it to the board.
    pub(super) fn resolve_combat(&mut self) {
        let Some(combat) = self.combat.clone() else {
            warn!("combat resolution without a combat");
            return;
        };
        let tally = combat.tally(&self.board, &self.registry);
        let (outcome, retreat) = {
            let ctx = CombatContext {
                board: &self.board,
                registry: &self.registry,
                orderings: &self.orderings,
                combat: &combat,
                tally: &tally,
            };
            let outcome = self.rules.resolve_combat(&ctx);
            let retreat = match outcome.victor {
                Side::Attacker => self.rules.retreat(&ctx, combat.defender.faction),
                Side::Defender => None,
            };
            (outcome, retreat)
        };
        info!(
            attack = tally.attacker.total(),
            defense = tally.defender.total(),
            victor = outcome.victor.name(),
            casualties = outcome.casualties.len(),
            "combat resolved"
        );

        let mut fallen_attackers = Vec::new();
        let mut fallen_defenders = Vec::new();
        for id in outcome.casualties {
            if combat.attacking_units.contains(&id) && self.board[combat.source].unit(id).is_some()
            {
                fallen_attackers.push(id);
            } else if self.board[combat.target].unit(id).is_some() {
                fallen_defenders.push(id);
            } else {
                warn!(unit = %id, "casualty is not fighting in this combat");
            }
        }
        self.bury(combat.source, &fallen_attackers);
        self.bury(combat.target, &fallen_defenders);

        let survivors: Vec<UnitId> = combat
            .attacking_units
            .iter()
            .copied()
            .filter(|id| !fallen_attackers.contains(id))
            .collect();

        match outcome.victor {
            Side::Attacker => {
                let defenders: Vec<UnitId> =
                    self.board[combat.target].units.iter().map(|u| u.id).collect();
                if !defenders.is_empty() {
                    self.withdraw(&combat, retreat, &defenders);
                }
                self.scheduler.discard(combat.target);
                if self.board.relocate(combat.source, combat.target, &survivors) {
                    self.scheduler.discard(combat.source);
                }
                debug!(target = %combat.target, units = survivors.len(), "attackers took the location");
            }
            Side::Defender => {
                self.board.rout(combat.source, &survivors);
                debug!(source = %combat.source, units = survivors.len(), "attackers routed");
            }
        }
    }

    /// Moves beaten defenders to `retreat`, or destroys them when there is
    /// no acceptable destination.
    fn withdraw(&mut self, combat: &Combat, retreat: Option<LocationId>, units: &[UnitId]) {
        let faction = combat.defender.faction;
        let accepted = retreat.filter(|&dest| {
            dest != combat.source
                && self.board.are_adjacent(combat.target, dest)
                && self
                    .board
                    .get(dest)
                    .is_some_and(|loc| loc.owner.is_none() || loc.owner == Some(faction))
        });
        match (retreat, accepted) {
            (_, Some(dest)) => {
                self.board.relocate(combat.target, dest, units);
                self.board.rout(dest, units);
                info!(%faction, to = %dest, units = units.len(), "defenders retreated");
            }
            (Some(dest), None) => {
                warn!(%faction, to = %dest, "retreat destination rejected, defenders destroyed");
                self.bury(combat.target, units);
            }
            (None, None) => {
                info!(%faction, units = units.len(), "defenders destroyed");
                self.bury(combat.target, units);
            }
        }
    }

    /// Removes units from the board and returns them to their owners' pools.
    fn bury(&mut self, at: LocationId, units: &[UnitId]) {
        if units.is_empty() {
            return;
        }
        let (removed, vacated) = self.board.remove_units(at, units);
        for unit in removed {
            if let Some(player) = self.players.get_mut(&unit.faction) {
                player.return_to_pool(unit.kind);
            }
        }
        if vacated {
            self.scheduler.discard(at);
        }
    }

    fn active_combat(&self, operation: &'static str) -> GameResult<&Combat> {
        self.combat.as_ref().ok_or_else(|| {
            IllegalState::WrongPhase {
                phase: self.phases.current(),
                operation,
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use crate::board::UnitKind;
    use crate::resolve::{CombatOutcome, Ruleset};

    /// Red attacks Ridge from Glen; Blue may support from Tower.
    fn attack_ridge(blue_assist: bool) -> (Engine, Ids) {
        let (mut e, ids) = planning();
        let mut placements = vec![(Faction::Red, ids.glen, "move+0")];
        if blue_assist {
            placements.push((Faction::Blue, ids.tower, "assist-a"));
        }
        to_action(&mut e, &placements);
        let movers = units_at(&e, ids.glen);
        e.use_token(Faction::Red, ids.glen, ids.ridge, &movers)
            .expect("attack");
        assert_eq!(e.phase(), RoundPhase::CombatAssist);
        (e, ids)
    }

    #[test]
    fn supported_defender_routs_and_kills_attacker() {
        let (mut e, ids) = attack_ridge(true);
        assert_eq!(e.current_actor(), Some(Faction::Blue));
        assert_eq!(e.actionable_locations(), vec![ids.tower]);
        assert_eq!(e.advance_phase(), Err(IllegalState::ReactionsPending.into()));

        e.support(Faction::Blue, ids.tower, Some(Side::Defender))
            .expect("support");
        // Assist 1 plus Tower's infantry 1 and advanced 2.
        assert_eq!(e.combat().map(|c| c.defender.assist), Some(4));
        assert_eq!(e.phase(), RoundPhase::CombatCard);

        e.play_combat_card(Faction::Red, CardId(0)).expect("red card");
        e.play_combat_card(Faction::Blue, CardId(2)).expect("blue card");
        assert_eq!(e.phase(), RoundPhase::CombatBonus);
        assert_eq!(
            e.use_combat_bonus(Faction::Blue),
            Err(IllegalState::NotFavored(Faction::Blue).into())
        );
        assert_eq!(e.advance_phase(), Ok(RoundPhase::Action));

        // Blue-blade kills the lone attacker; Glen is left empty.
        assert!(e.combat().is_none());
        assert_eq!(e.scheduler().depth(), 1);
        assert!(e.board()[ids.glen].units.is_empty());
        assert_eq!(e.board()[ids.glen].owner, None);
        assert_eq!(e.board()[ids.ridge].owner, Some(Faction::Blue));
        let red = e.player(Faction::Red).expect("red");
        assert_eq!(red.unit_pool.len(), 3);
        assert!(red.discard.contains(&CardId(0)));
        // The assist token stays where it was.
        assert!(e.board()[ids.tower].token.is_some());
    }

    #[test]
    fn attacker_wins_and_defender_retreats_routed() {
        let (mut e, ids) = planning();
        e.board.spawn(ids.glen, Faction::Red, UnitKind::Infantry);
        to_action(&mut e, &[(Faction::Red, ids.glen, "move*")]);
        let movers = units_at(&e, ids.glen);
        let defender = units_at(&e, ids.ridge);
        e.use_token(Faction::Red, ids.glen, ids.ridge, &movers)
            .expect("attack");

        // No supporters: the assist step waits for an explicit advance.
        assert!(e.scheduler().is_drained());
        assert_eq!(e.advance_phase(), Ok(RoundPhase::CombatCard));
        e.play_combat_card(Faction::Red, CardId(0)).expect("red card");
        e.play_combat_card(Faction::Blue, CardId(3)).expect("blue card");
        e.use_combat_bonus(Faction::Red).expect("bonus");
        assert!(e.combat_bonus_used());
        assert_eq!(e.phase(), RoundPhase::Action);

        assert_eq!(units_at(&e, ids.ridge), movers);
        assert_eq!(e.board()[ids.ridge].owner, Some(Faction::Red));
        assert_eq!(e.board()[ids.glen].owner, None);
        // Blue-shield cancels the kill; the defender falls back to Field.
        let field = &e.board()[ids.field];
        assert_eq!(field.owner, Some(Faction::Blue));
        assert_eq!(units_at(&e, ids.field), defender);
        assert!(field.units.iter().all(|u| u.routed));
    }

    #[test]
    fn card_step_rejects_bad_plays() {
        let (mut e, _) = attack_ridge(false);
        assert_eq!(
            e.play_combat_card(Faction::Red, CardId(0)),
            Err(IllegalState::WrongPhase {
                phase: RoundPhase::CombatAssist,
                operation: "play_combat_card"
            }
            .into())
        );
        e.advance_phase().expect("no supporters");
        assert_eq!(
            e.play_combat_card(Faction::Red, CardId(9)),
            Err(InvalidInput::UnknownCard(CardId(9)).into())
        );
        assert_eq!(
            e.play_combat_card(Faction::Red, CardId(2)),
            Err(IllegalState::CardNotInHand(CardId(2)).into())
        );
        e.play_combat_card(Faction::Red, CardId(1)).expect("red card");
        assert_eq!(
            e.play_combat_card(Faction::Red, CardId(0)),
            Err(IllegalState::CardAlreadyPlayed(Faction::Red).into())
        );
        assert_eq!(e.phase(), RoundPhase::CombatCard);
    }

    #[test]
    fn combat_bonus_is_once_per_match() {
        let (mut e, _) = attack_ridge(false);
        e.combat_bonus_used = true;
        e.advance_phase().expect("no supporters");
        e.play_combat_card(Faction::Red, CardId(0)).expect("red card");
        e.play_combat_card(Faction::Blue, CardId(2)).expect("blue card");
        assert_eq!(
            e.use_combat_bonus(Faction::Red),
            Err(IllegalState::CombatBonusSpent.into())
        );
    }

    #[derive(Debug)]
    struct AttackerAlwaysWins;

    impl Ruleset for AttackerAlwaysWins {
        fn resolve_combat(&mut self, _ctx: &CombatContext<'_>) -> CombatOutcome {
            CombatOutcome {
                victor: Side::Attacker,
                casualties: vec![UnitId(999)],
            }
        }
    }

    #[test]
    fn defenders_without_retreat_are_destroyed() {
        let (mut e, ids) = engine_with(Box::new(AttackerAlwaysWins));
        e.join(Faction::Red).expect("join");
        e.join(Faction::Blue).expect("join");
        e.start().expect("start");
        e.set_ready(Faction::Red).expect("ready");
        e.set_ready(Faction::Blue).expect("ready");
        to_action(&mut e, &[(Faction::Red, ids.glen, "move+0")]);
        let movers = units_at(&e, ids.glen);
        e.use_token(Faction::Red, ids.glen, ids.ridge, &movers)
            .expect("attack");
        e.advance_phase().expect("no supporters");
        e.play_combat_card(Faction::Red, CardId(1)).expect("red card");
        e.play_combat_card(Faction::Blue, CardId(3)).expect("blue card");
        assert_eq!(e.advance_phase(), Ok(RoundPhase::Action));

        assert_eq!(units_at(&e, ids.ridge), movers);
        let blue = e.player(Faction::Blue).expect("blue");
        assert_eq!(blue.unit_pool, vec![UnitKind::Infantry, UnitKind::Infantry]);
        assert_eq!(e.board().unit_count(Faction::Blue), 2);
    }
}
