//! The catalog of units, tokens and combat cards shared by one match.
//!
//! Built once at startup and handed to the engine behind an `Arc`; nothing
//! mutates it afterwards.

use std::collections::BTreeSet;

use super::card::{CardId, CombatCard};
use super::token::{ActionToken, TokenId, TokenKind};
use super::unit::{UnitKind, UnitSpec, UNIT_KIND_COUNT};

/// Most combat cards a catalog can address.
pub const MAX_CARDS: usize = 1 << 16;

#[derive(Debug, Clone)]
pub struct Registry {
    units: [UnitSpec; UNIT_KIND_COUNT],
    tokens: Vec<ActionToken>,
    cards: Vec<CombatCard>,
}

impl Registry {
    pub fn new(
        units: [UnitSpec; UNIT_KIND_COUNT],
        tokens: Vec<ActionToken>,
        cards: Vec<CombatCard>,
    ) -> Self {
        Registry {
            units,
            tokens,
            cards,
        }
    }

    /// The standard unit table and the 15-token set every faction receives.
    pub fn standard() -> Self {
        let units = [
            UnitSpec::plain(1),
            UnitSpec::plain(2),
            UnitSpec::plain(1),
            UnitSpec {
                cost: 2,
                attack: 0,
                base_attack: Some(4),
                defense: 0,
            },
        ];
        let tokens = vec![
            ActionToken::new("move-1", TokenKind::Move, false, -1),
            ActionToken::new("move+0", TokenKind::Move, false, 0),
            ActionToken::new("move*", TokenKind::Move, true, 1),
            ActionToken::new("invest-a", TokenKind::Invest, false, 0),
            ActionToken::new("invest-b", TokenKind::Invest, false, 0),
            ActionToken::new("invest*", TokenKind::Invest, true, 1),
            ActionToken::new("blitz-a", TokenKind::Blitz, false, 0),
            ActionToken::new("blitz-b", TokenKind::Blitz, false, 0),
            ActionToken::new("blitz*", TokenKind::Blitz, true, 0),
            ActionToken::new("defense-a", TokenKind::Defense, false, 1),
            ActionToken::new("defense-b", TokenKind::Defense, false, 1),
            ActionToken::new("defense*", TokenKind::Defense, true, 2),
            ActionToken::new("assist-a", TokenKind::Assist, false, 1),
            ActionToken::new("assist-b", TokenKind::Assist, false, 1),
            ActionToken::new("assist*", TokenKind::Assist, true, 2),
        ];
        Registry::new(units, tokens, Vec::new())
    }

    /// Replaces the combat card list.
    pub fn with_cards(mut self, cards: Vec<CombatCard>) -> Self {
        self.cards = cards;
        self
    }

    pub fn unit(&self, kind: UnitKind) -> &UnitSpec {
        &self.units[kind.index()]
    }

    pub fn token(&self, id: TokenId) -> Option<&ActionToken> {
        self.tokens.get(id.index())
    }

    pub fn card(&self, id: CardId) -> Option<&CombatCard> {
        self.cards.get(id.index())
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn tokens(&self) -> impl Iterator<Item = (TokenId, &ActionToken)> {
        (0..=u8::MAX)
            .zip(&self.tokens)
            .map(|(i, t)| (TokenId(i), t))
    }

    /// Every token id in the catalog: the hand a faction starts each round with.
    pub fn full_token_set(&self) -> BTreeSet<TokenId> {
        self.tokens().map(|(id, _)| id).collect()
    }

    /// Finds a token by its label.
    pub fn find_token(&self, label: &str) -> Option<TokenId> {
        self.tokens()
            .find(|(_, t)| t.label == label)
            .map(|(id, _)| id)
    }

    /// Finds a card by its name.
    pub fn find_card(&self, name: &str) -> Option<CardId> {
        (0..=u16::MAX)
            .zip(&self.cards)
            .find(|(_, c)| c.name == name)
            .map(|(i, _)| CardId(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_fifteen_tokens_three_per_kind() {
        let reg = Registry::standard();
        assert_eq!(reg.token_count(), 15);
        for kind in super::super::token::ALL_TOKEN_KINDS {
            let of_kind: Vec<_> = reg.tokens().filter(|(_, t)| t.kind == kind).collect();
            assert_eq!(of_kind.len(), 3, "{kind}");
            assert_eq!(of_kind.iter().filter(|(_, t)| t.special).count(), 1, "{kind}");
        }
    }

    #[test]
    fn unit_strengths_match_costs_except_base_assault() {
        let reg = Registry::standard();
        assert_eq!(reg.unit(UnitKind::Infantry).attack_against(false), 1);
        assert_eq!(reg.unit(UnitKind::Advanced).defense, 2);
        assert_eq!(reg.unit(UnitKind::BaseAssault).attack_against(true), 4);
        assert_eq!(reg.unit(UnitKind::BaseAssault).attack_against(false), 0);
        assert_eq!(reg.unit(UnitKind::BaseAssault).cost, 2);
    }

    #[test]
    fn lookups_by_label_and_name() {
        let reg = Registry::standard().with_cards(vec![CombatCard::new("Vanguard", 2)]);
        let star = reg.find_token("move*").expect("special move");
        assert!(reg.token(star).expect("token").special);
        assert_eq!(reg.find_card("Vanguard"), Some(CardId(0)));
        assert_eq!(reg.find_card("Nope"), None);
        assert!(reg.token(TokenId(200)).is_none());
        assert_eq!(reg.full_token_set().len(), 15);
    }
}
