//! Representation invariants of board and hands.
//!
//! These never fire in a correct engine. The engine runs them under
//! `debug_assert!` at the end of each mutating operation, and tests use them
//! as an oracle.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use super::faction::{Faction, Orderings};
use super::graph::Board;
use super::location::Terrain;
use super::player::Player;
use super::registry::Registry;

/// One broken invariant.
#[derive(Debug, Clone, Error)]
#[error("invariant violation: {message}")]
pub struct InvariantViolation {
    pub message: String,
}

fn violation(violations: &mut Vec<InvariantViolation>, message: String) {
    violations.push(InvariantViolation { message });
}

/// Checks every board and hand invariant. Returns the violations found.
#[must_use]
pub fn check_invariants(
    board: &Board,
    registry: &Registry,
    players: &BTreeMap<Faction, Player>,
    orderings: &Orderings,
    special_allotment: &[u32],
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen_units = HashSet::new();

    for (id, loc) in board.iter() {
        if loc.owner.is_none() != loc.units.is_empty() {
            violation(
                &mut violations,
                format!("{} '{}' owner/garrison mismatch", id, loc.name),
            );
        }
        if loc.token.is_some() && (loc.owner.is_none() || loc.units.is_empty()) {
            violation(
                &mut violations,
                format!("{} '{}' holds a token without a garrison", id, loc.name),
            );
        }
        if let Some(token) = loc.token {
            if registry.token(token).is_none() {
                violation(&mut violations, format!("{} holds unknown token {}", id, token));
            }
        }
        if loc.base.is_some() && loc.terrain != Terrain::Land {
            violation(&mut violations, format!("{} has a base off land", id));
        }
        if loc.adjacent.contains(&id) {
            violation(&mut violations, format!("{} is adjacent to itself", id));
        }
        for &other in &loc.adjacent {
            if !board.are_adjacent(other, id) {
                violation(
                    &mut violations,
                    format!("adjacency {} -> {} is not symmetric", id, other),
                );
            }
        }
        for unit in &loc.units {
            if Some(unit.faction) != loc.owner {
                violation(
                    &mut violations,
                    format!("unit {} of {} stands in {}", unit.id, unit.faction, id),
                );
            }
            if !seen_units.insert(unit.id) {
                violation(&mut violations, format!("unit {} appears twice", unit.id));
            }
        }
    }

    for (&faction, player) in players {
        let allotment = orderings
            .special_position(faction)
            .and_then(|pos| special_allotment.get(pos))
            .copied()
            .unwrap_or(0);
        if player.special_used > allotment {
            violation(
                &mut violations,
                format!(
                    "{} committed {} special tokens, allotment {}",
                    faction, player.special_used, allotment
                ),
            );
        }
    }

    violations
}
