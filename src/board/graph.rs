//! The board graph: an arena of locations addressed by `LocationId`.
//!
//! Adjacency is stored on each location as a set of ids and is always
//! symmetric. All garrison and token mutation goes through `Board` so the
//! ownership invariants of `Location` hold after every call.

use std::collections::HashMap;
use std::ops::Index;

use serde::Serialize;

use super::faction::Faction;
use super::location::{Base, Location, LocationId, Terrain};
use super::token::TokenId;
use super::unit::{Unit, UnitId, UnitKind};
use crate::error::{GameResult, InvalidInput};

/// Most locations a board can address.
pub const MAX_LOCATIONS: usize = 1 << 16;

/// Errors raised while assembling a board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("duplicate location name '{0}'")]
    DuplicateName(String),

    #[error("location '{0}' is adjacent to itself")]
    SelfAdjacent(String),

    #[error("location '{0}' has a base but is not land")]
    BaseOffLand(String),

    #[error("location '{0}' is garrisoned by more than one faction")]
    MixedGarrison(String),

    #[error("no location with index {0}")]
    UnknownIndex(u16),

    #[error("{0} locations exceed the limit of {MAX_LOCATIONS}")]
    TooManyLocations(usize),
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    locations: Vec<Location>,
    #[serde(skip)]
    names: HashMap<String, LocationId>,
    #[serde(skip)]
    next_unit: u32,
}

impl Board {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    /// Like `get`, but reports an unknown id as invalid input.
    pub fn location(&self, id: LocationId) -> GameResult<&Location> {
        self.get(id)
            .ok_or_else(|| InvalidInput::UnknownLocation(id).into())
    }

    pub fn find(&self, name: &str) -> Option<LocationId> {
        self.names.get(name).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        (0..=u16::MAX).take(self.locations.len()).map(LocationId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Location)> {
        (0..=u16::MAX)
            .zip(&self.locations)
            .map(|(i, loc)| (LocationId(i), loc))
    }

    pub fn are_adjacent(&self, a: LocationId, b: LocationId) -> bool {
        self.get(a).is_some_and(|loc| loc.adjacent.contains(&b))
    }

    /// Locations currently owned by `faction`.
    pub fn owned_by(&self, faction: Faction) -> impl Iterator<Item = (LocationId, &Location)> {
        self.iter().filter(move |(_, loc)| loc.is_owned_by(faction))
    }

    /// Finds a unit anywhere on the board.
    pub fn find_unit(&self, id: UnitId) -> Option<(LocationId, &Unit)> {
        self.iter()
            .find_map(|(loc_id, loc)| loc.unit(id).map(|u| (loc_id, u)))
    }

    /// Total number of units `faction` has on the board.
    pub fn unit_count(&self, faction: Faction) -> usize {
        self.owned_by(faction).map(|(_, loc)| loc.units.len()).sum()
    }

    fn slot(&mut self, id: LocationId) -> &mut Location {
        &mut self.locations[id.index()]
    }

    fn fresh_unit_id(&mut self) -> UnitId {
        let id = UnitId(self.next_unit);
        self.next_unit += 1;
        id
    }

    /// Creates a new unit in `at`. The location must be unowned or owned by
    /// `faction`.
    pub(crate) fn spawn(&mut self, at: LocationId, faction: Faction, kind: UnitKind) -> UnitId {
        let id = self.fresh_unit_id();
        self.slot(at).add_unit(Unit::new(id, kind, faction));
        id
    }

    /// Moves the selected units from `from` to `to`. Returns true if `from`
    /// was vacated.
    pub(crate) fn relocate(&mut self, from: LocationId, to: LocationId, units: &[UnitId]) -> bool {
        for &id in units {
            if let Some(unit) = self.slot(from).remove_unit(id) {
                self.slot(to).add_unit(unit);
            }
        }
        !self.locations[from.index()].is_occupied()
    }

    /// Removes the selected units from `at`. Returns the removed units and
    /// whether the location was vacated.
    pub(crate) fn remove_units(&mut self, at: LocationId, units: &[UnitId]) -> (Vec<Unit>, bool) {
        let loc = self.slot(at);
        let removed: Vec<Unit> = units.iter().filter_map(|&id| loc.remove_unit(id)).collect();
        (removed, !loc.is_occupied())
    }

    pub(crate) fn rout(&mut self, at: LocationId, units: &[UnitId]) {
        for unit in self.slot(at).units.iter_mut() {
            if units.contains(&unit.id) {
                unit.routed = true;
            }
        }
    }

    pub(crate) fn unroute_all(&mut self) {
        for loc in &mut self.locations {
            for unit in &mut loc.units {
                unit.routed = false;
            }
        }
    }

    pub(crate) fn place_token(&mut self, at: LocationId, token: TokenId) {
        debug_assert!(self.locations[at.index()].is_occupied());
        self.slot(at).token = Some(token);
    }

    pub(crate) fn take_token(&mut self, at: LocationId) -> Option<TokenId> {
        self.slot(at).token.take()
    }

    pub(crate) fn clear_tokens(&mut self) {
        for loc in &mut self.locations {
            loc.token = None;
        }
    }
}

impl Index<LocationId> for Board {
    type Output = Location;

    fn index(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }
}

/// Incremental board construction. Validation happens in `build`.
#[derive(Debug, Default)]
pub struct BoardBuilder {
    locations: Vec<Location>,
    edges: Vec<(LocationId, LocationId)>,
    garrisons: Vec<(LocationId, Faction, UnitKind)>,
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a location with no base and no economy.
    ///
    /// Past `MAX_LOCATIONS` the returned id is meaningless and `build` fails.
    pub fn location(&mut self, name: impl Into<String>, terrain: Terrain) -> LocationId {
        let id = LocationId(u16::try_from(self.locations.len()).unwrap_or(u16::MAX));
        self.locations.push(Location::new(name, terrain));
        id
    }

    pub fn base(&mut self, id: LocationId, base: Base) -> &mut Self {
        if let Some(loc) = self.locations.get_mut(id.index()) {
            loc.base = Some(base);
        }
        self
    }

    pub fn economy(&mut self, id: LocationId, supply: u32, invest: u32) -> &mut Self {
        if let Some(loc) = self.locations.get_mut(id.index()) {
            loc.supply = supply;
            loc.invest = invest;
        }
        self
    }

    pub fn connect(&mut self, a: LocationId, b: LocationId) -> &mut Self {
        self.edges.push((a, b));
        self
    }

    pub fn garrison(&mut self, id: LocationId, faction: Faction, kind: UnitKind) -> &mut Self {
        self.garrisons.push((id, faction, kind));
        self
    }

    pub fn build(self) -> Result<Board, BoardError> {
        if self.locations.len() > MAX_LOCATIONS {
            return Err(BoardError::TooManyLocations(self.locations.len()));
        }
        let mut names = HashMap::with_capacity(self.locations.len());
        for (i, loc) in (0..=u16::MAX).zip(&self.locations) {
            if names.insert(loc.name.clone(), LocationId(i)).is_some() {
                return Err(BoardError::DuplicateName(loc.name.clone()));
            }
            if loc.base.is_some() && loc.terrain != Terrain::Land {
                return Err(BoardError::BaseOffLand(loc.name.clone()));
            }
        }

        let mut board = Board {
            locations: self.locations,
            names,
            next_unit: 0,
        };
        let count = board.locations.len();
        let check = |id: LocationId| {
            if id.index() < count {
                Ok(())
            } else {
                Err(BoardError::UnknownIndex(id.0))
            }
        };

        for (a, b) in self.edges {
            check(a)?;
            check(b)?;
            if a == b {
                return Err(BoardError::SelfAdjacent(board[a].name.clone()));
            }
            board.slot(a).adjacent.insert(b);
            board.slot(b).adjacent.insert(a);
        }

        for (at, faction, kind) in self.garrisons {
            check(at)?;
            if board[at].owner.is_some_and(|owner| owner != faction) {
                return Err(BoardError::MixedGarrison(board[at].name.clone()));
            }
            board.spawn(at, faction, kind);
        }

        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_land_board() -> (Board, LocationId, LocationId) {
        let mut b = BoardBuilder::new();
        let west = b.location("West", Terrain::Land);
        let east = b.location("East", Terrain::Land);
        b.connect(west, east);
        b.garrison(west, Faction::Red, UnitKind::Infantry);
        b.garrison(west, Faction::Red, UnitKind::Advanced);
        (b.build().expect("valid board"), west, east)
    }

    #[test]
    fn adjacency_is_symmetric() {
        let (board, west, east) = two_land_board();
        assert!(board.are_adjacent(west, east));
        assert!(board.are_adjacent(east, west));
        assert_eq!(board.find("East"), Some(east));
        assert_eq!(board.find("North"), None);
    }

    #[test]
    fn garrison_assigns_owner_and_unique_ids() {
        let (board, west, east) = two_land_board();
        assert_eq!(board[west].owner, Some(Faction::Red));
        assert_eq!(board[east].owner, None);
        let ids: Vec<_> = board[west].units.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![UnitId(0), UnitId(1)]);
        assert_eq!(board.unit_count(Faction::Red), 2);
    }

    #[test]
    fn relocate_transfers_ownership() {
        let (mut board, west, east) = two_land_board();
        board.place_token(west, TokenId(0));
        assert!(!board.relocate(west, east, &[UnitId(0)]));
        assert_eq!(board[east].owner, Some(Faction::Red));
        assert_eq!(board[west].token, Some(TokenId(0)));

        assert!(board.relocate(west, east, &[UnitId(1)]));
        assert_eq!(board[west].owner, None);
        assert_eq!(board[west].token, None);
        assert_eq!(board[east].units.len(), 2);
    }

    #[test]
    fn build_rejects_bad_graphs() {
        let mut b = BoardBuilder::new();
        b.location("Twin", Terrain::Land);
        b.location("Twin", Terrain::Sea);
        assert_eq!(b.build().unwrap_err(), BoardError::DuplicateName("Twin".into()));

        let mut b = BoardBuilder::new();
        let gulf = b.location("Gulf", Terrain::Sea);
        b.base(gulf, Base::new(1, 1));
        assert_eq!(b.build().unwrap_err(), BoardError::BaseOffLand("Gulf".into()));

        let mut b = BoardBuilder::new();
        let loop_ = b.location("Loop", Terrain::Land);
        b.connect(loop_, loop_);
        assert_eq!(b.build().unwrap_err(), BoardError::SelfAdjacent("Loop".into()));

        let mut b = BoardBuilder::new();
        let hill = b.location("Hill", Terrain::Land);
        b.garrison(hill, Faction::Red, UnitKind::Infantry);
        b.garrison(hill, Faction::Blue, UnitKind::Infantry);
        assert_eq!(b.build().unwrap_err(), BoardError::MixedGarrison("Hill".into()));
    }

    #[test]
    fn build_rejects_more_locations_than_ids() {
        let mut b = BoardBuilder::new();
        for i in 0..MAX_LOCATIONS {
            b.location(format!("L{i}"), Terrain::Sea);
        }
        let last = b.location("Overflow", Terrain::Sea);
        assert_eq!(last, LocationId(u16::MAX));
        assert_eq!(
            b.build().unwrap_err(),
            BoardError::TooManyLocations(MAX_LOCATIONS + 1)
        );
    }

    #[test]
    fn full_board_numbers_every_location() {
        let mut b = BoardBuilder::new();
        for i in 0..MAX_LOCATIONS {
            b.location(format!("L{i}"), Terrain::Sea);
        }
        let board = b.build().expect("board at the limit");
        assert_eq!(board.ids().count(), MAX_LOCATIONS);
        assert_eq!(board.ids().last(), Some(LocationId(u16::MAX)));
        assert_eq!(board.find("L65535"), Some(LocationId(u16::MAX)));
    }

    #[test]
    fn unknown_location_is_invalid_input() {
        let (board, _, _) = two_land_board();
        assert!(board.location(LocationId(9)).is_err());
        assert!(board.get(LocationId(9)).is_none());
    }
}
