//! Token targeting: reachable locations, filtered by the token's terrain
//! table and its variant predicate.

use crate::board::{ActionToken, Board, LocationId, Registry, TokenKind};

use super::reach::reachable;

/// Returns whether `token` standing on `source` may target `target`,
/// ignoring reachability.
pub fn accepts(
    board: &Board,
    registry: &Registry,
    token: &ActionToken,
    source: LocationId,
    target: LocationId,
) -> bool {
    let (Some(src), Some(dst)) = (board.get(source), board.get(target)) else {
        return false;
    };
    if !token.target_terrains(src.terrain).contains(dst.terrain) {
        return false;
    }
    match token.kind {
        TokenKind::Invest | TokenKind::Defense => source == target,
        TokenKind::Move | TokenKind::Assist => source != target,
        TokenKind::Blitz => {
            let hostile = matches!((src.owner, dst.owner), (Some(a), Some(b)) if a != b);
            hostile
                && dst.is_occupied()
                && dst
                    .token
                    .and_then(|t| registry.token(t))
                    .is_some_and(|t| t.is_blitzable_by(token.special))
        }
    }
}

/// All legal targets for `token` standing on `source`, in id order.
pub fn valid_targets(
    board: &Board,
    registry: &Registry,
    token: &ActionToken,
    source: LocationId,
) -> Vec<LocationId> {
    reachable(board, source, token.kind)
        .into_iter()
        .filter(|&target| accepts(board, registry, token, source, target))
        .collect()
}
