//! Round phase sequencing.
//!
//! Phases form one main chain per round plus three nested sub-chains
//! (combat, bidding, threat). Entering a sub-chain pushes the phase to
//! resume afterwards onto a continuation stack; the last phase of a
//! sub-chain pops it.
//!
//! Main round:
//! - PreGame (first round only) -> PlanPlaceTokens
//! - EventDisplayCards -> EventResolveCards -> PlanPlaceTokens
//! - PlanPlaceTokens -> PlanRevealTokens -> PlanSightPower -> Action
//! - Action -> RoundEnd -> EventDisplayCards
//!
//! Sub-chains:
//! - CombatAssist -> CombatCard -> CombatBonus -> CombatResolution -> CombatEnd -> return
//! - BidCollect -> BidReveal -> BidTieBreak -> return
//! - ThreatDisplay -> ThreatResolve -> return

use std::fmt;

use serde::Serialize;

use crate::error::{GameResult, IllegalState};

/// The phase a match is in. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Lobby,
    PreGame,
    EventDisplayCards,
    EventResolveCards,
    PlanPlaceTokens,
    PlanRevealTokens,
    PlanSightPower,
    Action,
    RoundEnd,
    GameOver,
    CombatAssist,
    CombatCard,
    CombatBonus,
    CombatResolution,
    CombatEnd,
    BidCollect,
    BidReveal,
    BidTieBreak,
    ThreatDisplay,
    ThreatResolve,
}

/// Where a phase goes when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Phase(RoundPhase),
    /// Resume the continuation on top of the stack.
    Return,
    /// Only an explicit operation leaves this phase.
    Halt,
}

impl RoundPhase {
    pub const fn name(self) -> &'static str {
        match self {
            RoundPhase::Lobby => "lobby",
            RoundPhase::PreGame => "pre_game",
            RoundPhase::EventDisplayCards => "event_display_cards",
            RoundPhase::EventResolveCards => "event_resolve_cards",
            RoundPhase::PlanPlaceTokens => "plan_place_tokens",
            RoundPhase::PlanRevealTokens => "plan_reveal_tokens",
            RoundPhase::PlanSightPower => "plan_sight_power",
            RoundPhase::Action => "action",
            RoundPhase::RoundEnd => "round_end",
            RoundPhase::GameOver => "game_over",
            RoundPhase::CombatAssist => "combat_assist",
            RoundPhase::CombatCard => "combat_card",
            RoundPhase::CombatBonus => "combat_bonus",
            RoundPhase::CombatResolution => "combat_resolution",
            RoundPhase::CombatEnd => "combat_end",
            RoundPhase::BidCollect => "bid_collect",
            RoundPhase::BidReveal => "bid_reveal",
            RoundPhase::BidTieBreak => "bid_tie_break",
            RoundPhase::ThreatDisplay => "threat_display",
            RoundPhase::ThreatResolve => "threat_resolve",
        }
    }

    /// The successor table.
    pub const fn next(self) -> Next {
        match self {
            RoundPhase::Lobby | RoundPhase::GameOver => Next::Halt,
            RoundPhase::PreGame => Next::Phase(RoundPhase::PlanPlaceTokens),
            RoundPhase::EventDisplayCards => Next::Phase(RoundPhase::EventResolveCards),
            RoundPhase::EventResolveCards => Next::Phase(RoundPhase::PlanPlaceTokens),
            RoundPhase::PlanPlaceTokens => Next::Phase(RoundPhase::PlanRevealTokens),
            RoundPhase::PlanRevealTokens => Next::Phase(RoundPhase::PlanSightPower),
            RoundPhase::PlanSightPower => Next::Phase(RoundPhase::Action),
            RoundPhase::Action => Next::Phase(RoundPhase::RoundEnd),
            RoundPhase::RoundEnd => Next::Phase(RoundPhase::EventDisplayCards),
            RoundPhase::CombatAssist => Next::Phase(RoundPhase::CombatCard),
            RoundPhase::CombatCard => Next::Phase(RoundPhase::CombatBonus),
            RoundPhase::CombatBonus => Next::Phase(RoundPhase::CombatResolution),
            RoundPhase::CombatResolution => Next::Phase(RoundPhase::CombatEnd),
            RoundPhase::CombatEnd => Next::Return,
            RoundPhase::BidCollect => Next::Phase(RoundPhase::BidReveal),
            RoundPhase::BidReveal => Next::Phase(RoundPhase::BidTieBreak),
            RoundPhase::BidTieBreak => Next::Return,
            RoundPhase::ThreatDisplay => Next::Phase(RoundPhase::ThreatResolve),
            RoundPhase::ThreatResolve => Next::Return,
        }
    }

    /// The phase to resume after a sub-chain entered from `self`.
    ///
    /// The action phase is not done until its queue drains, so a combat
    /// started there resumes the action phase itself.
    pub const fn resume_point(self) -> Next {
        match self {
            RoundPhase::Action => Next::Phase(RoundPhase::Action),
            other => other.next(),
        }
    }

    pub const fn is_combat(self) -> bool {
        matches!(
            self,
            RoundPhase::CombatAssist
                | RoundPhase::CombatCard
                | RoundPhase::CombatBonus
                | RoundPhase::CombatResolution
                | RoundPhase::CombatEnd
        )
    }

    /// Entry points of the nested sub-chains.
    pub const fn is_sub_chain_start(self) -> bool {
        matches!(
            self,
            RoundPhase::CombatAssist | RoundPhase::BidCollect | RoundPhase::ThreatDisplay
        )
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The current phase plus the continuation stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseMachine {
    current: RoundPhase,
    stack: Vec<RoundPhase>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        PhaseMachine {
            current: RoundPhase::Lobby,
            stack: Vec::new(),
        }
    }

    pub fn current(&self) -> RoundPhase {
        self.current
    }

    /// Pending continuations, innermost last.
    pub fn continuations(&self) -> &[RoundPhase] {
        &self.stack
    }

    /// Moves to the successor of the current phase. Returns the new phase.
    pub fn advance(&mut self) -> GameResult<RoundPhase> {
        match self.current.next() {
            Next::Phase(next) => self.current = next,
            Next::Return => {
                self.current = self.stack.pop().ok_or(IllegalState::NoContinuation)?;
            }
            Next::Halt => {
                return Err(if self.current == RoundPhase::GameOver {
                    IllegalState::GameOver.into()
                } else {
                    IllegalState::WrongPhase {
                        phase: self.current,
                        operation: "advance",
                    }
                    .into()
                })
            }
        }
        Ok(self.current)
    }

    /// Enters the sub-chain starting at `start`, remembering where to resume.
    pub fn jump(&mut self, start: RoundPhase) -> GameResult<()> {
        debug_assert!(start.is_sub_chain_start());
        match self.current.resume_point() {
            Next::Phase(resume) => self.stack.push(resume),
            Next::Return | Next::Halt => {
                return Err(IllegalState::WrongPhase {
                    phase: self.current,
                    operation: "jump",
                }
                .into())
            }
        }
        self.current = start;
        Ok(())
    }

    /// Replaces the current phase outright, keeping the stack.
    pub fn goto(&mut self, phase: RoundPhase) {
        self.current = phase;
    }
}
