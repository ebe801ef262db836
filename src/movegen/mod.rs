//! Target generation for action tokens.
//!
//! `reach` answers which locations a token could get to at all, including
//! sea transport for land moves; `targets` narrows that down with terrain
//! rules and the per-variant targeting predicate.

pub mod reach;
pub mod targets;

pub use reach::{reachable, transport_reach};
pub use targets::{accepts, valid_targets};
