//! Action resolution queue.
//!
//! Placed tokens are grouped by (owner, token priority) into
//! `ActionLocations` and served in ascending token priority, then ascending
//! turn-order position. Only the head group may act. Combats push a frame
//! of reactive groups on top of the main queue and pop it when they end.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use serde::Serialize;

use crate::board::{Board, Faction, LocationId, Orderings, Registry, TokenPriority};

/// Locations of one faction whose tokens share a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionLocations {
    pub faction: Faction,
    pub faction_priority: usize,
    pub token_priority: TokenPriority,
    pub locations: BTreeSet<LocationId>,
}

impl Ord for ActionLocations {
    fn cmp(&self, other: &Self) -> Ordering {
        self.token_priority
            .cmp(&other.token_priority)
            .then(self.faction_priority.cmp(&other.faction_priority))
            .then(self.faction.cmp(&other.faction))
            .then_with(|| self.locations.cmp(&other.locations))
    }
}

impl PartialOrd for ActionLocations {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Groups `(location, owner, priority)` entries into `ActionLocations`.
pub fn group_locations<I>(entries: I, orderings: &Orderings) -> Vec<ActionLocations>
where
    I: IntoIterator<Item = (LocationId, Faction, TokenPriority)>,
{
    let mut groups: BTreeMap<(Faction, TokenPriority), BTreeSet<LocationId>> = BTreeMap::new();
    for (loc, faction, priority) in entries {
        groups.entry((faction, priority)).or_default().insert(loc);
    }
    groups
        .into_iter()
        .map(|((faction, token_priority), locations)| ActionLocations {
            faction,
            faction_priority: orderings.turn_position(faction).unwrap_or(usize::MAX),
            token_priority,
            locations,
        })
        .collect()
}

type Frame = BinaryHeap<Reverse<ActionLocations>>;

#[derive(Debug, Clone)]
pub struct Scheduler {
    frames: Vec<Frame>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// An empty queue.
    pub fn new() -> Self {
        Scheduler {
            frames: vec![Frame::new()],
        }
    }

    /// Scans the board for placed schedulable tokens and builds the main queue.
    pub fn build(board: &Board, registry: &Registry, orderings: &Orderings) -> Self {
        let entries = board.iter().filter_map(|(id, loc)| {
            let owner = loc.owner?;
            let token = registry.token(loc.token?)?;
            token
                .priority
                .is_schedulable()
                .then_some((id, owner, token.priority))
        });
        let mut scheduler = Scheduler::new();
        scheduler.frames[0] = frame_of(group_locations(entries, orderings));
        scheduler
    }

    fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    /// The group allowed to act right now.
    pub fn head(&self) -> Option<&ActionLocations> {
        self.top().and_then(|f| f.peek()).map(|Reverse(g)| g)
    }

    pub fn current_faction(&self) -> Option<Faction> {
        self.head().map(|g| g.faction)
    }

    pub fn is_eligible(&self, faction: Faction, location: LocationId) -> bool {
        self.head()
            .is_some_and(|g| g.faction == faction && g.locations.contains(&location))
    }

    /// True when the innermost frame has nothing left to serve.
    pub fn is_drained(&self) -> bool {
        self.head().is_none()
    }

    /// Number of frames, the main queue included.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Groups of the innermost frame in serving order.
    pub fn queue(&self) -> Vec<ActionLocations> {
        let mut groups: Vec<_> = self
            .top()
            .map(|f| f.iter().map(|Reverse(g)| g.clone()).collect())
            .unwrap_or_default();
        groups.sort();
        groups
    }

    /// Marks `location` of the head group as done. Returns false if it was
    /// not in the head group.
    pub(crate) fn complete(&mut self, location: LocationId) -> bool {
        let Some(frame) = self.top_mut() else {
            return false;
        };
        let Some(mut head) = frame.peek_mut() else {
            return false;
        };
        if !head.0.locations.remove(&location) {
            return false;
        }
        if head.0.locations.is_empty() {
            std::collections::binary_heap::PeekMut::pop(head);
        }
        true
    }

    /// Drops `location` from every group of every frame.
    pub(crate) fn discard(&mut self, location: LocationId) {
        for frame in &mut self.frames {
            let mut groups = std::mem::take(frame).into_vec();
            for Reverse(g) in &mut groups {
                g.locations.remove(&location);
            }
            groups.retain(|Reverse(g)| !g.locations.is_empty());
            *frame = BinaryHeap::from(groups);
        }
    }

    pub(crate) fn push_frame(&mut self, groups: Vec<ActionLocations>) {
        self.frames.push(frame_of(groups));
    }

    /// Pops a reactive frame. The main queue is never popped.
    pub(crate) fn pop_frame(&mut self) -> bool {
        if self.frames.len() > 1 {
            self.frames.pop();
            true
        } else {
            false
        }
    }
}

fn frame_of(groups: Vec<ActionLocations>) -> Frame {
    groups.into_iter().filter(|g| !g.locations.is_empty()).map(Reverse).collect()
}
