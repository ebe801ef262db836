//! Sub-chains triggered by event cards: sealed bidding with tie-breaks.
//! The threat chain only needs `advance_phase`.

use tracing::{debug, info};

use super::Engine;
use crate::board::Faction;
use crate::error::{GameResult, IllegalState, InvalidInput};
use crate::resolve::RoundPhase;

impl Engine {
    /// Seals `faction`'s bid. Revealed once every seated faction has bid.
    pub fn bid(&mut self, faction: Faction, amount: u32) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::BidCollect], "bid")?;
        let player = self.seat(faction)?;
        if self.bids.contains_key(&faction) {
            return Err(IllegalState::AlreadyBid(faction).into());
        }
        if amount > player.cash_in_hand {
            return Err(InvalidInput::AmountOutOfRange {
                amount,
                max: player.cash_in_hand,
            }
            .into());
        }

        self.bids.insert(faction, amount);
        debug!(%faction, "bid sealed");
        if self.bids.len() == self.seated.len() {
            self.advance_and_settle()?;
        }
        self.debug_check();
        Ok(())
    }

    /// Pays every bid into the pool and lets the ruleset rank them.
    pub(super) fn reveal_bids(&mut self) {
        for (&faction, &amount) in &self.bids {
            if let Some(player) = self.players.get_mut(&faction) {
                player.move_hand_to_pool(amount);
            }
        }
        self.tie_pending = self.rules.resolve_bids(&self.bids);
        info!(bids = ?self.bids, tie = self.tie_pending, "bids revealed");
    }

    /// The tie-breaker settles a tied bid: `winner` goes ahead of `loser`.
    pub fn break_tie(&mut self, faction: Faction, loser: Faction, winner: Faction) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::BidTieBreak], "break_tie")?;
        self.seat(faction)?;
        if self.orderings.tie_breaker() != Some(faction) {
            return Err(IllegalState::NotTieBreaker(faction).into());
        }
        if loser == winner {
            return Err(InvalidInput::SameFaction(loser).into());
        }
        self.seat(loser)?;
        self.seat(winner)?;

        self.rules.break_tie(loser, winner);
        self.tie_pending = false;
        info!(%faction, %loser, %winner, "tie broken");
        self.advance_and_settle()?;
        self.debug_check();
        Ok(())
    }
}
