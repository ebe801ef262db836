//! Locations of the board graph: terrain, bases, garrisons and token slots.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::faction::Faction;
use super::token::TokenId;
use super::unit::{Unit, UnitId};

/// Index of a location in the board arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LocationId(pub u16);

impl LocationId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "location #{}", self.0)
    }
}

/// The number of terrain kinds.
pub const TERRAIN_COUNT: usize = 3;

/// Terrain of a location.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Land,
    Sea,
    Port,
}

/// All terrain variants in index order.
pub const ALL_TERRAINS: [Terrain; TERRAIN_COUNT] = [Terrain::Land, Terrain::Sea, Terrain::Port];

impl Terrain {
    pub const fn name(self) -> &'static str {
        match self {
            Terrain::Land => "land",
            Terrain::Sea => "sea",
            Terrain::Port => "port",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A small set of terrains, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerrainSet(u8);

impl TerrainSet {
    pub const EMPTY: TerrainSet = TerrainSet(0);

    pub const fn single(t: Terrain) -> Self {
        TerrainSet(1 << t as u8)
    }

    pub const fn with(self, t: Terrain) -> Self {
        TerrainSet(self.0 | 1 << t as u8)
    }

    pub const fn contains(self, t: Terrain) -> bool {
        self.0 & (1 << t as u8) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Terrain> {
        ALL_TERRAINS.into_iter().filter(move |&t| self.contains(t))
    }
}

/// A fortified base. Only LAND locations carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Base {
    pub size: u32,
    pub defense: u32,
    pub active: bool,
}

impl Base {
    pub fn new(size: u32, defense: u32) -> Self {
        Base {
            size,
            defense,
            active: true,
        }
    }

    /// Defense added to a defender standing on this base.
    pub fn effective_defense(&self) -> u32 {
        if self.active {
            self.defense
        } else {
            0
        }
    }
}

/// A node of the board graph.
///
/// The owner is `None` exactly when the garrison is empty, and a placed token
/// requires both. `Board` keeps those invariants; mutate through it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub name: String,
    pub terrain: Terrain,
    pub base: Option<Base>,
    pub supply: u32,
    pub invest: u32,
    pub adjacent: BTreeSet<LocationId>,
    pub owner: Option<Faction>,
    pub units: Vec<Unit>,
    pub token: Option<TokenId>,
}

impl Location {
    pub fn new(name: impl Into<String>, terrain: Terrain) -> Self {
        Location {
            name: name.into(),
            terrain,
            base: None,
            supply: 0,
            invest: 0,
            adjacent: BTreeSet::new(),
            owner: None,
            units: Vec::new(),
            token: None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.units.is_empty()
    }

    pub fn is_owned_by(&self, faction: Faction) -> bool {
        self.owner == Some(faction)
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Places a unit into the garrison, claiming the location if unowned.
    pub(crate) fn add_unit(&mut self, unit: Unit) {
        debug_assert!(self.owner.is_none() || self.owner == Some(unit.faction));
        self.owner = Some(unit.faction);
        self.units.push(unit);
    }

    /// Takes a unit out of the garrison. Emptying the garrison also clears
    /// the owner and any placed token.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Option<Unit> {
        let idx = self.units.iter().position(|u| u.id == id)?;
        let unit = self.units.remove(idx);
        if self.units.is_empty() {
            self.owner = None;
            self.token = None;
        }
        Some(unit)
    }
}
