//! Line command parser.
//!
//! Parses one line of input into a `Command`. Numbers stay raw here; the
//! main loop translates them through an `IdMap`.

use tracing::warn;

use crate::board::{Faction, UnitKind};
use crate::resolve::Side;

/// A parsed driver-to-engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `join <player> <faction>`
    Join { player: u32, faction: Faction },

    Start,

    /// `ready <player>`
    Ready { player: u32 },

    Advance,

    /// `place <player> <loc> <token>`
    Place { player: u32, location: u32, token: u32 },

    /// `remove <player> <loc>`
    Remove { player: u32, location: u32 },

    /// `switch <player> <loc> <token>`
    Switch { player: u32, location: u32, token: u32 },

    /// Whose turn it is and where they may act.
    Actor,

    /// `targets <loc>`
    Targets { location: u32 },

    /// `use <player> <src> <dst> [units...]`
    Use {
        player: u32,
        source: u32,
        target: u32,
        units: Vec<u32>,
    },

    /// `skip <player> <loc>`
    Skip { player: u32, location: u32 },

    /// `support <player> <loc> attacker|defender|none`
    Support {
        player: u32,
        location: u32,
        side: Option<Side>,
    },

    /// `card <player> <card>`
    Card { player: u32, card: u32 },

    /// `bonus <player>`
    Bonus { player: u32 },

    /// `spawn <player> <loc> <kind>`
    Spawn {
        player: u32,
        location: u32,
        kind: UnitKind,
    },

    /// `bid <player> <amount>`
    Bid { player: u32, amount: u32 },

    /// `tiebreak <player> <loser> <winner>`
    TieBreak {
        player: u32,
        loser: Faction,
        winner: Faction,
    },

    Phase,

    Snapshot,

    Quit,
}

/// Parses a single line of input into a `Command`.
///
/// Returns `None` for empty lines. Unknown commands and malformed arguments
/// also return `None` after a warning.
pub fn parse_command(line: &str) -> Option<Command> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&name, args) = tokens.split_first()?;
    if !COMMANDS.contains(&name) {
        warn!(command = name, "unknown command");
        return None;
    }

    let parsed = parse_args(name, args);
    if parsed.is_none() {
        warn!(line = line.trim(), "malformed arguments");
    }
    parsed
}

const COMMANDS: &[&str] = &[
    "start", "advance", "actor", "phase", "snapshot", "quit", "join", "ready", "place", "switch",
    "remove", "skip", "targets", "use", "support", "card", "bonus", "spawn", "bid", "tiebreak",
];

fn parse_args(name: &str, args: &[&str]) -> Option<Command> {
    match name {
        "start" => Some(Command::Start),
        "advance" => Some(Command::Advance),
        "actor" => Some(Command::Actor),
        "phase" => Some(Command::Phase),
        "snapshot" => Some(Command::Snapshot),
        "quit" => Some(Command::Quit),

        "join" => match args {
            [p, f] => Some(Command::Join {
                player: num(p)?,
                faction: faction(f)?,
            }),
            _ => None,
        },
        "ready" => match args {
            [p] => Some(Command::Ready { player: num(p)? }),
            _ => None,
        },
        "place" | "switch" => match args {
            [p, l, t] => {
                let (player, location, token) = (num(p)?, num(l)?, num(t)?);
                Some(if name == "place" {
                    Command::Place {
                        player,
                        location,
                        token,
                    }
                } else {
                    Command::Switch {
                        player,
                        location,
                        token,
                    }
                })
            }
            _ => None,
        },
        "remove" | "skip" => match args {
            [p, l] => {
                let (player, location) = (num(p)?, num(l)?);
                Some(if name == "remove" {
                    Command::Remove { player, location }
                } else {
                    Command::Skip { player, location }
                })
            }
            _ => None,
        },
        "targets" => match args {
            [l] => Some(Command::Targets { location: num(l)? }),
            _ => None,
        },
        "use" => match args {
            [p, s, t, units @ ..] => Some(Command::Use {
                player: num(p)?,
                source: num(s)?,
                target: num(t)?,
                units: units.iter().map(|u| num(u)).collect::<Option<_>>()?,
            }),
            _ => None,
        },
        "support" => match args {
            [p, l, s] => Some(Command::Support {
                player: num(p)?,
                location: num(l)?,
                side: match *s {
                    "none" => None,
                    other => Some(Side::from_name(other)?),
                },
            }),
            _ => None,
        },
        "card" => match args {
            [p, c] => Some(Command::Card {
                player: num(p)?,
                card: num(c)?,
            }),
            _ => None,
        },
        "bonus" => match args {
            [p] => Some(Command::Bonus { player: num(p)? }),
            _ => None,
        },
        "spawn" => match args {
            [p, l, k] => Some(Command::Spawn {
                player: num(p)?,
                location: num(l)?,
                kind: UnitKind::from_name(k)?,
            }),
            _ => None,
        },
        "bid" => match args {
            [p, a] => Some(Command::Bid {
                player: num(p)?,
                amount: num(a)?,
            }),
            _ => None,
        },
        "tiebreak" => match args {
            [p, l, w] => Some(Command::TieBreak {
                player: num(p)?,
                loser: faction(l)?,
                winner: faction(w)?,
            }),
            _ => None,
        },
        _ => None,
    }
}

fn num(token: &str) -> Option<u32> {
    token.parse().ok()
}

fn faction(token: &str) -> Option<Faction> {
    Faction::from_name(token)
}
