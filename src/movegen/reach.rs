//! Reachability over the board graph.
//!
//! Land moves may be carried across the sea: every SEA location garrisoned
//! by the moving faction acts as a transit hub whose neighbours are also
//! reachable. Everything else reaches only its direct neighbours.

use std::collections::BTreeSet;

use crate::board::{Board, Faction, LocationId, Terrain, TokenKind};

/// Locations a token of `kind` standing on `origin` could possibly reach,
/// before any terrain or targeting filter.
pub fn reachable(board: &Board, origin: LocationId, kind: TokenKind) -> BTreeSet<LocationId> {
    let Some(loc) = board.get(origin) else {
        return BTreeSet::new();
    };
    if kind.targets_self() {
        return BTreeSet::from([origin]);
    }
    match (kind, loc.terrain, loc.owner) {
        (TokenKind::Move, Terrain::Land, Some(faction)) => transport_reach(board, origin, faction),
        _ => loc.adjacent.clone(),
    }
}

/// Breadth-first search from a LAND `origin`, hopping through SEA locations
/// held by `faction`. The origin itself is never part of the result.
pub fn transport_reach(board: &Board, origin: LocationId, faction: Faction) -> BTreeSet<LocationId> {
    let mut visited = vec![false; board.len()];
    let mut reached = BTreeSet::new();
    if origin.index() >= visited.len() {
        return reached;
    }
    visited[origin.index()] = true;

    let mut queue = vec![origin];
    let mut head = 0;
    while head < queue.len() {
        let current = queue[head];
        head += 1;

        for &next in &board[current].adjacent {
            if visited[next.index()] {
                continue;
            }
            visited[next.index()] = true;
            reached.insert(next);

            let hub = &board[next];
            if hub.terrain == Terrain::Sea && hub.is_owned_by(faction) {
                queue.push(next);
            }
        }
    }

    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardBuilder, UnitKind};

    /// Shore - Gulf - Strait - Ocean - Far, with Red ships on all three seas.
    fn sea_chain(garrisoned: [bool; 3]) -> (Board, LocationId, LocationId) {
        let mut b = BoardBuilder::new();
        let shore = b.location("Shore", Terrain::Land);
        let gulf = b.location("Gulf", Terrain::Sea);
        let strait = b.location("Strait", Terrain::Sea);
        let ocean = b.location("Ocean", Terrain::Sea);
        let far = b.location("Far", Terrain::Land);
        b.connect(shore, gulf)
            .connect(gulf, strait)
            .connect(strait, ocean)
            .connect(ocean, far);
        b.garrison(shore, Faction::Red, UnitKind::Infantry);
        for (sea, held) in [gulf, strait, ocean].into_iter().zip(garrisoned) {
            if held {
                b.garrison(sea, Faction::Red, UnitKind::Ship);
            }
        }
        (b.build().expect("board"), shore, far)
    }

    #[test]
    fn three_hop_chain_carries_land_move() {
        let (board, shore, far) = sea_chain([true; 3]);
        let reach = reachable(&board, shore, TokenKind::Move);
        assert!(reach.contains(&far));
        assert!(!reach.contains(&shore));
    }

    #[test]
    fn broken_chain_stops_transport() {
        let (board, shore, far) = sea_chain([true, false, true]);
        let reach = reachable(&board, shore, TokenKind::Move);
        assert!(!reach.contains(&far));
        // The empty strait is still adjacent to a hub, just not a hub itself.
        assert!(reach.contains(&board.find("Strait").expect("strait")));
    }

    #[test]
    fn foreign_ships_do_not_transport() {
        let mut b = BoardBuilder::new();
        let shore = b.location("Shore", Terrain::Land);
        let gulf = b.location("Gulf", Terrain::Sea);
        let far = b.location("Far", Terrain::Land);
        b.connect(shore, gulf).connect(gulf, far);
        b.garrison(shore, Faction::Red, UnitKind::Infantry);
        b.garrison(gulf, Faction::Blue, UnitKind::Ship);
        let board = b.build().expect("board");
        assert!(!reachable(&board, shore, TokenKind::Move).contains(&far));
    }

    #[test]
    fn non_move_tokens_only_see_neighbours() {
        let (board, shore, far) = sea_chain([true; 3]);
        let gulf = board.find("Gulf").expect("gulf");
        assert_eq!(
            reachable(&board, shore, TokenKind::Blitz),
            BTreeSet::from([gulf])
        );
        assert!(!reachable(&board, shore, TokenKind::Assist).contains(&far));
        assert_eq!(
            reachable(&board, shore, TokenKind::Invest),
            BTreeSet::from([shore])
        );
    }
}
