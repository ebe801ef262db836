//! Integer identity translation.
//!
//! Front ends speak in plain integers. `IdMap` turns them into typed ids,
//! rejecting anything that does not name a real player, location, token,
//! card or unit with `InvalidInput::InvalidId`.

use std::collections::BTreeMap;

use crate::board::{Board, CardId, Faction, LocationId, Registry, TokenId, UnitId};
use crate::error::{GameResult, IllegalState, InvalidInput};

/// A bidirectional map where both keys and values are unique.
#[derive(Debug, Clone)]
pub struct OneToOneMap<K, V> {
    forward: BTreeMap<K, V>,
    backward: BTreeMap<V, K>,
}

impl<K: Ord + Copy, V: Ord + Copy> Default for OneToOneMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy, V: Ord + Copy> OneToOneMap<K, V> {
    pub fn new() -> Self {
        OneToOneMap {
            forward: BTreeMap::new(),
            backward: BTreeMap::new(),
        }
    }

    /// Binds `key` to `value`. Returns false, changing nothing, if either
    /// side is already bound.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.forward.contains_key(&key) || self.backward.contains_key(&value) {
            return false;
        }
        self.forward.insert(key, value);
        self.backward.insert(value, key);
        true
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.forward.get(key).copied()
    }

    pub fn key_of(&self, value: &V) -> Option<K> {
        self.backward.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// Integer ids of one match.
///
/// Locations, tokens and cards use their arena index; unit ids are checked
/// against the board at lookup time. Players are bound to factions as they
/// join.
#[derive(Debug, Clone)]
pub struct IdMap {
    players: OneToOneMap<u32, Faction>,
    locations: usize,
    tokens: usize,
    cards: usize,
}

impl IdMap {
    pub fn new(board: &Board, registry: &Registry) -> Self {
        IdMap {
            players: OneToOneMap::new(),
            locations: board.len(),
            tokens: registry.token_count(),
            cards: registry.card_count(),
        }
    }

    /// Binds player `id` to `faction`.
    pub fn bind_player(&mut self, id: u32, faction: Faction) -> GameResult<()> {
        if self.players.key_of(&faction).is_some() {
            return Err(IllegalState::AlreadySeated(faction).into());
        }
        if !self.players.insert(id, faction) {
            return Err(InvalidInput::InvalidId { kind: "player", id }.into());
        }
        Ok(())
    }

    pub fn faction(&self, player: u32) -> GameResult<Faction> {
        self.players.get(&player).ok_or_else(|| {
            InvalidInput::InvalidId {
                kind: "player",
                id: player,
            }
            .into()
        })
    }

    pub fn player(&self, faction: Faction) -> Option<u32> {
        self.players.key_of(&faction)
    }

    pub fn location(&self, id: u32) -> GameResult<LocationId> {
        checked(id, self.locations, "location").map(LocationId)
    }

    pub fn token(&self, id: u32) -> GameResult<TokenId> {
        checked(id, self.tokens, "token").map(TokenId)
    }

    pub fn card(&self, id: u32) -> GameResult<CardId> {
        checked(id, self.cards, "card").map(CardId)
    }

    /// A unit currently on `board`.
    pub fn unit(&self, board: &Board, id: u32) -> GameResult<UnitId> {
        let unit = UnitId(id);
        board
            .find_unit(unit)
            .map(|_| unit)
            .ok_or_else(|| InvalidInput::InvalidId { kind: "unit", id }.into())
    }
}

/// `id` as an index of width `T`, if it is below `len`.
fn checked<T: TryFrom<u32>>(id: u32, len: usize, kind: &'static str) -> GameResult<T> {
    let in_range = usize::try_from(id).is_ok_and(|index| index < len);
    match T::try_from(id) {
        Ok(index) if in_range => Ok(index),
        _ => Err(InvalidInput::InvalidId { kind, id }.into()),
    }
}
