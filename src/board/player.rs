//! A faction's hand: cash, combat cards, spawnable units and tokens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::card::CardId;
use super::token::TokenId;
use super::unit::UnitKind;

/// Everything a faction holds off the board.
///
/// Cash only moves between `cash_in_hand` and `cash_pool` here, so their sum
/// is constant across every hand operation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Player {
    pub cash_in_hand: u32,
    pub cash_pool: u32,
    pub cards: BTreeSet<CardId>,
    pub discard: BTreeSet<CardId>,
    pub unit_pool: Vec<UnitKind>,
    pub tokens: BTreeSet<TokenId>,
    pub special_used: u32,
}

impl Player {
    pub fn cash_total(&self) -> u32 {
        self.cash_in_hand + self.cash_pool
    }

    /// Moves up to `amount` from the pool into hand. Returns what moved.
    pub fn move_pool_to_hand(&mut self, amount: u32) -> u32 {
        let before = self.cash_total();
        let moved = amount.min(self.cash_pool);
        self.cash_pool -= moved;
        self.cash_in_hand += moved;
        debug_assert_eq!(before, self.cash_total());
        moved
    }

    /// Moves up to `amount` from hand into the pool. Returns what moved.
    pub fn move_hand_to_pool(&mut self, amount: u32) -> u32 {
        let before = self.cash_total();
        let moved = amount.min(self.cash_in_hand);
        self.cash_in_hand -= moved;
        self.cash_pool += moved;
        debug_assert_eq!(before, self.cash_total());
        moved
    }

    pub fn holds_card(&self, card: CardId) -> bool {
        self.cards.contains(&card)
    }

    /// Moves a played card to the discard pile. When the hand runs dry the
    /// discard pile becomes the new hand.
    pub fn discard_card(&mut self, card: CardId) -> bool {
        if !self.cards.remove(&card) {
            return false;
        }
        self.discard.insert(card);
        if self.cards.is_empty() {
            self.cards = std::mem::take(&mut self.discard);
        }
        true
    }

    pub fn holds_unit(&self, kind: UnitKind) -> bool {
        self.unit_pool.contains(&kind)
    }

    pub fn take_from_pool(&mut self, kind: UnitKind) -> bool {
        match self.unit_pool.iter().position(|&k| k == kind) {
            Some(idx) => {
                self.unit_pool.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn return_to_pool(&mut self, kind: UnitKind) {
        self.unit_pool.push(kind);
    }

    pub fn holds_token(&self, token: TokenId) -> bool {
        self.tokens.contains(&token)
    }

    /// Takes a token out of hand, counting it against the special allotment
    /// when `special`.
    pub fn take_token(&mut self, token: TokenId, special: bool) -> bool {
        if !self.tokens.remove(&token) {
            return false;
        }
        if special {
            self.special_used += 1;
        }
        true
    }

    /// Returns a token to hand, releasing its special allotment.
    pub fn return_token(&mut self, token: TokenId, special: bool) {
        if self.tokens.insert(token) && special {
            self.special_used = self.special_used.saturating_sub(1);
        }
    }

    /// Restores the full token set at the start of a round.
    pub fn reset_tokens(&mut self, all: BTreeSet<TokenId>) {
        self.tokens = all;
        self.special_used = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(hand: u32, pool: u32) -> Player {
        Player {
            cash_in_hand: hand,
            cash_pool: pool,
            ..Player::default()
        }
    }

    #[test]
    fn transfers_clamp_to_available_cash() {
        let mut p = funded(1, 3);
        assert_eq!(p.move_pool_to_hand(5), 3);
        assert_eq!((p.cash_in_hand, p.cash_pool), (4, 0));
        assert_eq!(p.move_hand_to_pool(2), 2);
        assert_eq!((p.cash_in_hand, p.cash_pool), (2, 2));
        assert_eq!(p.cash_total(), 4);
    }

    #[test]
    fn discard_recycles_when_hand_empties() {
        let mut p = Player::default();
        p.cards.extend([CardId(0), CardId(1)]);
        assert!(p.discard_card(CardId(0)));
        assert_eq!(p.discard.len(), 1);
        assert!(!p.discard_card(CardId(0)));

        assert!(p.discard_card(CardId(1)));
        assert!(p.discard.is_empty());
        assert_eq!(p.cards.len(), 2);
    }

    #[test]
    fn special_tokens_are_counted() {
        let mut p = Player::default();
        p.reset_tokens([TokenId(0), TokenId(2)].into_iter().collect());
        assert!(p.take_token(TokenId(2), true));
        assert_eq!(p.special_used, 1);
        assert!(!p.take_token(TokenId(2), true));
        p.return_token(TokenId(2), true);
        assert_eq!(p.special_used, 0);
        assert!(p.holds_token(TokenId(2)));
    }

    #[test]
    fn unit_pool_take_and_return() {
        let mut p = Player::default();
        p.return_to_pool(UnitKind::Ship);
        assert!(p.take_from_pool(UnitKind::Ship));
        assert!(!p.take_from_pool(UnitKind::Ship));
        assert!(!p.holds_unit(UnitKind::Ship));
    }
}
