//! Action tokens: the five variants, their priorities and terrain rules.
//!
//! Targeting against a live board lives in `movegen::targets`; the effects
//! live in the engine. This module only holds what is fixed per token
//! instance, including the per-terrain target table that is computed once
//! when the token enters the registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::location::{Terrain, TerrainSet, ALL_TERRAINS, TERRAIN_COUNT};

/// Index of a token in the registry catalog.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenId(pub u8);

impl TokenId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scheduling priority; lower acts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenPriority(pub u8);

impl TokenPriority {
    /// Marks tokens that never enter the main action queue.
    pub const UNSCHEDULED: TokenPriority = TokenPriority(u8::MAX);

    pub const fn is_schedulable(self) -> bool {
        self.0 != u8::MAX
    }
}

/// The closed set of token variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Move,
    Blitz,
    Invest,
    Defense,
    Assist,
}

/// All token kinds in declaration order.
pub const ALL_TOKEN_KINDS: [TokenKind; 5] = [
    TokenKind::Move,
    TokenKind::Blitz,
    TokenKind::Invest,
    TokenKind::Defense,
    TokenKind::Assist,
];

impl TokenKind {
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::Move => "move",
            TokenKind::Blitz => "blitz",
            TokenKind::Invest => "invest",
            TokenKind::Defense => "defense",
            TokenKind::Assist => "assist",
        }
    }

    pub fn from_name(name: &str) -> Option<TokenKind> {
        match name {
            "move" => Some(TokenKind::Move),
            "blitz" => Some(TokenKind::Blitz),
            "invest" => Some(TokenKind::Invest),
            "defense" => Some(TokenKind::Defense),
            "assist" => Some(TokenKind::Assist),
            _ => None,
        }
    }

    /// Blitzes resolve first, then moves, then investments.
    pub const fn priority(self) -> TokenPriority {
        match self {
            TokenKind::Blitz => TokenPriority(0),
            TokenKind::Move => TokenPriority(1),
            TokenKind::Invest => TokenPriority(2),
            TokenKind::Defense | TokenKind::Assist => TokenPriority::UNSCHEDULED,
        }
    }

    /// Terrains a token of this kind may target from `source`.
    pub const fn terrain_rule(self, source: Terrain) -> TerrainSet {
        match self {
            TokenKind::Invest | TokenKind::Defense => TerrainSet::single(source),
            TokenKind::Move => match source {
                Terrain::Land => TerrainSet::single(Terrain::Land),
                Terrain::Port | Terrain::Sea => TerrainSet::single(Terrain::Sea),
            },
            TokenKind::Blitz | TokenKind::Assist => match source {
                Terrain::Land => TerrainSet::single(Terrain::Land),
                Terrain::Port => TerrainSet::single(Terrain::Sea),
                Terrain::Sea => TerrainSet::single(Terrain::Sea).with(Terrain::Land),
            },
        }
    }

    /// Kinds whose only legal target is their own location.
    pub const fn targets_self(self) -> bool {
        matches!(self, TokenKind::Invest | TokenKind::Defense)
    }

    /// Kinds that only act while a combat is underway.
    pub const fn is_reactive(self) -> bool {
        matches!(self, TokenKind::Defense | TokenKind::Assist)
    }

    /// Kinds whose strength counts as a combat bonus for their side.
    pub const fn carries_combat_bonus(self) -> bool {
        matches!(self, TokenKind::Move | TokenKind::Defense)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A token instance of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionToken {
    pub label: String,
    pub kind: TokenKind,
    pub special: bool,
    pub strength: i32,
    pub priority: TokenPriority,
    targets: [TerrainSet; TERRAIN_COUNT],
}

impl ActionToken {
    pub fn new(label: impl Into<String>, kind: TokenKind, special: bool, strength: i32) -> Self {
        let mut targets = [TerrainSet::EMPTY; TERRAIN_COUNT];
        for terrain in ALL_TERRAINS {
            targets[terrain.index()] = kind.terrain_rule(terrain);
        }
        ActionToken {
            label: label.into(),
            kind,
            special,
            strength,
            priority: kind.priority(),
            targets,
        }
    }

    /// Precomputed target terrains for a token standing on `source`.
    pub fn target_terrains(&self, source: Terrain) -> TerrainSet {
        self.targets[source.index()]
    }

    /// Bonus this token lends to its side when it starts or receives a combat.
    pub fn combat_bonus(&self) -> i32 {
        if self.kind.carries_combat_bonus() {
            self.strength
        } else {
            0
        }
    }

    /// Whether a blitz (special or not) may strip this token.
    pub fn is_blitzable_by(&self, special_blitz: bool) -> bool {
        match self.kind {
            TokenKind::Move => false,
            TokenKind::Blitz | TokenKind::Invest | TokenKind::Assist => true,
            TokenKind::Defense => special_blitz,
        }
    }
}
