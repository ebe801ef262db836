//! Action phase: resolving revealed tokens from the head of the queue, and
//! spawning units after an investment.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::Engine;
use crate::board::{ActionToken, Faction, LocationId, TokenKind, UnitId, UnitKind};
use crate::error::{GameResult, IllegalState, InvalidInput};
use crate::movegen;
use crate::resolve::{check_supply, move_deltas, Combat, RoundPhase};

impl Engine {
    /// Resolves the token on `source` against `target`.
    ///
    /// `units` selects the movers for a Move and is ignored otherwise. A Move
    /// into an occupied enemy location opens a combat instead of moving.
    pub fn use_token(
        &mut self,
        faction: Faction,
        source: LocationId,
        target: LocationId,
        units: &[UnitId],
    ) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::Action], "use_token")?;
        self.seat(faction)?;
        self.board.location(target)?;
        let token_id = self
            .owned(faction, source)?
            .token
            .ok_or(IllegalState::NoToken(source))?;
        let registry = Arc::clone(&self.registry);
        let token = registry
            .token(token_id)
            .ok_or(InvalidInput::UnknownToken(token_id))?;
        if token.kind.is_reactive() {
            return Err(IllegalState::ReactiveToken(token_id).into());
        }
        if !self.scheduler.is_eligible(faction, source) {
            return Err(IllegalState::OutOfTurn(faction).into());
        }
        if !movegen::valid_targets(&self.board, &registry, token, source).contains(&target) {
            return Err(IllegalState::InvalidTarget {
                from: source,
                target,
            }
            .into());
        }

        match token.kind {
            TokenKind::Move => self.resolve_move(faction, token, source, target, units)?,
            TokenKind::Blitz => self.resolve_blitz(faction, source, target),
            TokenKind::Invest => self.resolve_invest(faction, source, target),
            TokenKind::Defense | TokenKind::Assist => {
                return Err(IllegalState::ReactiveToken(token_id).into())
            }
        }
        self.debug_check();
        Ok(())
    }

    /// Forfeits the token on `source` without effect.
    pub fn skip_action(&mut self, faction: Faction, source: LocationId) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::Action], "skip_action")?;
        self.seat(faction)?;
        self.owned(faction, source)?
            .token
            .ok_or(IllegalState::NoToken(source))?;
        if !self.scheduler.is_eligible(faction, source) {
            return Err(IllegalState::OutOfTurn(faction).into());
        }

        self.finish_token(source);
        debug!(%faction, %source, "token skipped");
        self.debug_check();
        Ok(())
    }

    /// Buys a unit at the location of `faction`'s latest investment.
    pub fn spawn_unit(
        &mut self,
        faction: Faction,
        location: LocationId,
        kind: UnitKind,
    ) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::Action], "spawn_unit")?;
        let player = self.seat(faction)?;
        let loc = self.board.location(location)?;
        if self.spawn_window != Some((faction, location)) {
            return Err(IllegalState::NoSpawnWindow(faction).into());
        }
        if !loc.is_owned_by(faction) {
            return Err(IllegalState::NotOwner { faction, location }.into());
        }
        if loc.base.is_none() {
            return Err(IllegalState::NoBase(location).into());
        }
        if !player.holds_unit(kind) {
            return Err(IllegalState::UnitNotInPool(kind).into());
        }
        let cost = self.registry.unit(kind).cost;
        if player.cash_in_hand < cost {
            return Err(IllegalState::InsufficientCash {
                needed: cost,
                available: player.cash_in_hand,
            }
            .into());
        }
        if !check_supply(&self.board, &self.supply, faction, &[(location, 1)]) {
            return Err(IllegalState::SupplyExceeded(faction).into());
        }

        let hand = self.seat_mut(faction)?;
        hand.move_hand_to_pool(cost);
        hand.take_from_pool(kind);
        let id = self.board.spawn(location, faction, kind);
        info!(%faction, %location, %kind, unit = %id, cost, "unit spawned");
        self.debug_check();
        Ok(())
    }

    fn resolve_move(
        &mut self,
        faction: Faction,
        token: &ActionToken,
        source: LocationId,
        target: LocationId,
        units: &[UnitId],
    ) -> GameResult<()> {
        if units.is_empty() {
            return Err(InvalidInput::EmptySelection.into());
        }
        let src = &self.board[source];
        let mut seen = BTreeSet::new();
        for &id in units {
            if !seen.insert(id) {
                return Err(InvalidInput::DuplicateUnit(id).into());
            }
            let unit = src.unit(id).ok_or(InvalidInput::UnitNotAtLocation {
                unit: id,
                location: source,
            })?;
            if unit.routed {
                return Err(IllegalState::RoutedUnit(id).into());
            }
        }

        let dst = &self.board[target];
        let hostile = dst.is_occupied() && !dst.is_owned_by(faction);
        if hostile {
            let combat = Combat::begin(
                &self.board,
                &self.registry,
                token,
                source,
                target,
                units.to_vec(),
            )?;
            self.finish_token(source);
            return self.begin_combat(combat);
        }

        // Attacks are settled by combat; only a plain move answers to supply.
        if !check_supply(
            &self.board,
            &self.supply,
            faction,
            &move_deltas(source, target, units.len()),
        ) {
            return Err(IllegalState::SupplyExceeded(faction).into());
        }
        self.finish_token(source);
        self.board.relocate(source, target, units);
        debug!(%faction, %source, %target, count = units.len(), "units moved");
        Ok(())
    }

    fn resolve_blitz(&mut self, faction: Faction, source: LocationId, target: LocationId) {
        self.finish_token(source);
        let stripped = self.board.take_token(target);
        self.scheduler.discard(target);
        debug!(%faction, %source, %target, ?stripped, "blitz");
    }

    fn resolve_invest(&mut self, faction: Faction, source: LocationId, target: LocationId) {
        let amount = self.board[target].invest + 1;
        self.finish_token(source);
        let moved = self
            .players
            .get_mut(&faction)
            .map_or(0, |p| p.move_pool_to_hand(amount));
        self.spawn_window = Some((faction, source));
        debug!(%faction, %source, amount, moved, "invested");
    }

    /// Removes a used token from the board and the queue, and closes any
    /// open spawn window.
    fn finish_token(&mut self, source: LocationId) {
        self.board.take_token(source);
        self.scheduler.complete(source);
        self.spawn_window = None;
    }
}
