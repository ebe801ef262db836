//! Board representation and catalog types.
//!
//! Contains factions and their orderings, locations and the board graph,
//! units, action tokens, combat cards, player hands, and the catalog
//! registry shared by a match.

pub mod card;
pub mod faction;
pub mod graph;
pub mod invariants;
pub mod location;
pub mod player;
pub mod registry;
pub mod token;
pub mod unit;

pub use card::{CardId, CombatCard};
pub use faction::{Faction, Orderings, ALL_FACTIONS, FACTION_COUNT};
pub use graph::{Board, BoardBuilder, BoardError, MAX_LOCATIONS};
pub use invariants::{check_invariants, InvariantViolation};
pub use location::{Base, Location, LocationId, Terrain, TerrainSet, ALL_TERRAINS};
pub use player::Player;
pub use registry::{Registry, MAX_CARDS};
pub use token::{ActionToken, TokenId, TokenKind, TokenPriority, ALL_TOKEN_KINDS};
pub use unit::{Unit, UnitId, UnitKind, UnitSpec, ALL_UNIT_KINDS};
