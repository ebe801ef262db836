//! Round resolution machinery.
//!
//! Phase sequencing with its continuation stack, the action queue, supply
//! capacity checks, battle bookkeeping, and the ruleset hooks that decide
//! outcomes the engine does not fix itself.

pub mod combat;
pub mod phase;
pub mod rules;
pub mod schedule;
pub mod supply;

pub use combat::{Combat, CombatTally, Side, SideState, SideTally};
pub use phase::{Next, PhaseMachine, RoundPhase};
pub use rules::{CombatContext, CombatOutcome, Ruleset, StandardRules, SubFlow};
pub use schedule::{group_locations, ActionLocations, Scheduler};
pub use supply::{check_supply, move_deltas, ranked_armies, SupplyTable, MIN_ARMY_SIZE};
