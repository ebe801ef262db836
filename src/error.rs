//! Rejection taxonomy for engine operations.
//!
//! Every public operation either succeeds or returns a `GameError` without
//! touching any state. `InvalidInput` covers arguments that do not name
//! anything real; `IllegalState` covers well-formed requests that the rules
//! forbid right now.

use crate::board::{CardId, Faction, LocationId, TokenId, UnitId, UnitKind};
use crate::resolve::phase::RoundPhase;

/// Result alias used throughout the engine.
pub type GameResult<T> = Result<T, GameError>;

/// Top-level engine error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("illegal state: {0}")]
    IllegalState(#[from] IllegalState),
}

/// Arguments that are missing, unknown, or out of their declared range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("unknown location {0}")]
    UnknownLocation(LocationId),

    #[error("unknown token {0}")]
    UnknownToken(TokenId),

    #[error("unknown combat card {0}")]
    UnknownCard(CardId),

    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("invalid {kind} id {id}")]
    InvalidId { kind: &'static str, id: u32 },

    #[error("no units selected")]
    EmptySelection,

    #[error("unit {0} selected twice")]
    DuplicateUnit(UnitId),

    #[error("unit {unit} is not at {location}")]
    UnitNotAtLocation { unit: UnitId, location: LocationId },

    #[error("amount {amount} exceeds the allowed maximum {max}")]
    AmountOutOfRange { amount: u32, max: u32 },

    #[error("a tie needs two distinct factions, got {0} twice")]
    SameFaction(Faction),
}

/// Requests the rules forbid in the current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalState {
    #[error("'{operation}' is not allowed during {phase}")]
    WrongPhase {
        phase: RoundPhase,
        operation: &'static str,
    },

    #[error("{0} is already seated")]
    AlreadySeated(Faction),

    #[error("{0} is not seated in this match")]
    NotSeated(Faction),

    #[error("not every faction has joined yet")]
    SeatsOpen,

    #[error("{faction} does not own {location}")]
    NotOwner { faction: Faction, location: LocationId },

    #[error("{0} already holds a token")]
    LocationHasToken(LocationId),

    #[error("{0} holds no token")]
    NoToken(LocationId),

    #[error("token {0} is not in hand")]
    TokenNotHeld(TokenId),

    #[error("{0} has no special tokens left this round")]
    SpecialAllotmentExhausted(Faction),

    #[error("it is not {0}'s turn to act there")]
    OutOfTurn(Faction),

    #[error("token {0} only acts inside a combat")]
    ReactiveToken(TokenId),

    #[error("{target} is not a legal target from {from}")]
    InvalidTarget {
        from: LocationId,
        target: LocationId,
    },

    #[error("unit {0} is routed and cannot move")]
    RoutedUnit(UnitId),

    #[error("{0} would exceed its supply limits")]
    SupplyExceeded(Faction),

    #[error("{0} is not fighting in this combat")]
    NotCombatant(Faction),

    #[error("{0} has already played a combat card")]
    CardAlreadyPlayed(Faction),

    #[error("combat card {0} is not in hand")]
    CardNotInHand(CardId),

    #[error("the combat bonus has already been spent")]
    CombatBonusSpent,

    #[error("{0} is not entitled to the combat bonus")]
    NotFavored(Faction),

    #[error("the sight power has already been used this round")]
    SightPowerSpent,

    #[error("{0} does not hold the sight power")]
    NotSightHolder(Faction),

    #[error("action tokens are still waiting to be resolved")]
    ActionsPending,

    #[error("supporters are still waiting to declare")]
    ReactionsPending,

    #[error("no investment has opened a spawn window for {0}")]
    NoSpawnWindow(Faction),

    #[error("{0} has no base")]
    NoBase(LocationId),

    #[error("no {0} left in the unit pool")]
    UnitNotInPool(UnitKind),

    #[error("needs {needed} cash in hand, has {available}")]
    InsufficientCash { needed: u32, available: u32 },

    #[error("{0} has already bid")]
    AlreadyBid(Faction),

    #[error("not every faction has bid yet")]
    BidsPending,

    #[error("a tie is still waiting to be broken")]
    TiePending,

    #[error("{0} does not break ties")]
    NotTieBreaker(Faction),

    #[error("no continuation to return to")]
    NoContinuation,

    #[error("the match is over")]
    GameOver,
}
