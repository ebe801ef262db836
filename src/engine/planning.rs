//! Planning operations: placing, withdrawing and switching tokens.

use tracing::{debug, info};

use super::Engine;
use crate::board::{Faction, LocationId, TokenId};
use crate::error::{GameResult, IllegalState};
use crate::resolve::{RoundPhase, Scheduler};

impl Engine {
    /// Places `token` from `faction`'s hand on a location it owns.
    pub fn place_token(
        &mut self,
        faction: Faction,
        location: LocationId,
        token: TokenId,
    ) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::PlanPlaceTokens], "place_token")?;
        let player = self.seat(faction)?;
        let loc = self.owned(faction, location)?;
        let special = self.token_spec(token)?.special;
        if loc.token.is_some() {
            return Err(IllegalState::LocationHasToken(location).into());
        }
        if !player.holds_token(token) {
            return Err(IllegalState::TokenNotHeld(token).into());
        }
        if special && player.special_used >= self.special_allotment(faction) {
            return Err(IllegalState::SpecialAllotmentExhausted(faction).into());
        }

        self.seat_mut(faction)?.take_token(token, special);
        self.board.place_token(location, token);
        debug!(%faction, %location, %token, "token placed");
        self.debug_check();
        Ok(())
    }

    /// Returns the token on `location` to its owner's hand.
    pub fn remove_token(&mut self, faction: Faction, location: LocationId) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::PlanPlaceTokens], "remove_token")?;
        self.seat(faction)?;
        let token = self
            .owned(faction, location)?
            .token
            .ok_or(IllegalState::NoToken(location))?;
        let special = self.token_spec(token)?.special;

        self.board.take_token(location);
        self.seat_mut(faction)?.return_token(token, special);
        debug!(%faction, %location, %token, "token withdrawn");
        self.debug_check();
        Ok(())
    }

    /// Sight power: swaps one revealed token for another from hand.
    ///
    /// Only the faction first in special-token order may do this, once per
    /// round. The action queue is rebuilt and the action phase begins.
    pub fn switch_token(
        &mut self,
        faction: Faction,
        location: LocationId,
        token: TokenId,
    ) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::PlanSightPower], "switch_token")?;
        let player = self.seat(faction)?;
        if self.orderings.sight_holder() != Some(faction) {
            return Err(IllegalState::NotSightHolder(faction).into());
        }
        if self.sight_power_used {
            return Err(IllegalState::SightPowerSpent.into());
        }
        let old = self
            .owned(faction, location)?
            .token
            .ok_or(IllegalState::NoToken(location))?;
        let old_special = self.token_spec(old)?.special;
        let new_special = self.token_spec(token)?.special;
        if !player.holds_token(token) {
            return Err(IllegalState::TokenNotHeld(token).into());
        }
        let committed = player.special_used - u32::from(old_special) + u32::from(new_special);
        if committed > self.special_allotment(faction) {
            return Err(IllegalState::SpecialAllotmentExhausted(faction).into());
        }

        self.board.take_token(location);
        let hand = self.seat_mut(faction)?;
        hand.return_token(old, old_special);
        hand.take_token(token, new_special);
        self.board.place_token(location, token);
        self.sight_power_used = true;
        self.scheduler = Scheduler::build(&self.board, &self.registry, &self.orderings);
        info!(%faction, %location, from = %old, to = %token, "sight power used");
        self.advance_and_settle()?;
        self.debug_check();
        Ok(())
    }
}
