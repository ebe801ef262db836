//! Conquest: turn-resolution engine for a territorial-conquest board game.
//!
//! Exposes the board representation, targeting, round resolution machinery,
//! the engine surface, and protocol support for use by integration tests and
//! the binary entry point.

pub mod board;
pub mod engine;
pub mod error;
pub mod movegen;
pub mod protocol;
pub mod resolve;
