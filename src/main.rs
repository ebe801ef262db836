//! Conquest -- plays one match over a line protocol.
//!
//! The binary loads a scenario, then reads one command per line from stdin
//! and answers each with one line on stdout: `ok`, `error <message>`, or the
//! answer to a query. Logs go to stderr.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use conquest::engine::Engine;
use conquest::error::{GameResult, InvalidInput};
use conquest::protocol::{parse_command, Command, IdMap, Scenario};
use conquest::resolve::StandardRules;

#[derive(Debug, Parser)]
#[command(name = "conquest")]
#[command(about = "Turn-resolution engine for a territorial-conquest board game")]
struct Args {
    /// Scenario file (JSON)
    #[arg(long)]
    scenario: PathBuf,

    /// Log filter; RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log: String,
}

enum Reply {
    Ok,
    Text(String),
    Quit,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let text = match fs::read_to_string(&args.scenario) {
        Ok(text) => text,
        Err(e) => {
            error!(path = %args.scenario.display(), "cannot read scenario: {e}");
            return ExitCode::FAILURE;
        }
    };
    let (registry, setup) = match Scenario::from_json(&text).and_then(|s| s.build()) {
        Ok(built) => built,
        Err(e) => {
            error!(path = %args.scenario.display(), "{e}");
            return ExitCode::FAILURE;
        }
    };

    let rules = StandardRules::new(setup.config.max_rounds);
    let mut ids = IdMap::new(&setup.board, &registry);
    let mut engine = Engine::new(Arc::new(registry), setup, Box::new(rules));
    info!(scenario = %args.scenario.display(), "match loaded");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        let written = match execute(&mut engine, &mut ids, cmd) {
            Ok(Reply::Quit) => break,
            Ok(Reply::Ok) => writeln!(out, "ok"),
            Ok(Reply::Text(text)) => writeln!(out, "{text}"),
            Err(e) => writeln!(out, "error {e}"),
        };
        if written.and_then(|()| out.flush()).is_err() {
            break;
        }
    }

    ExitCode::SUCCESS
}

/// Runs one command against the match.
fn execute(engine: &mut Engine, ids: &mut IdMap, cmd: Command) -> GameResult<Reply> {
    match cmd {
        Command::Join { player, faction } => {
            if ids.faction(player).is_ok() {
                return Err(InvalidInput::InvalidId {
                    kind: "player",
                    id: player,
                }
                .into());
            }
            engine.join(faction)?;
            ids.bind_player(player, faction)?;
        }
        Command::Start => engine.start()?,
        Command::Ready { player } => engine.set_ready(ids.faction(player)?)?,
        Command::Advance => {
            let phase = engine.advance_phase()?;
            return Ok(Reply::Text(format!("phase {phase}")));
        }
        Command::Place {
            player,
            location,
            token,
        } => engine.place_token(
            ids.faction(player)?,
            ids.location(location)?,
            ids.token(token)?,
        )?,
        Command::Remove { player, location } => {
            engine.remove_token(ids.faction(player)?, ids.location(location)?)?
        }
        Command::Switch {
            player,
            location,
            token,
        } => engine.switch_token(
            ids.faction(player)?,
            ids.location(location)?,
            ids.token(token)?,
        )?,
        Command::Actor => {
            let text = match engine.current_actor() {
                Some(faction) => {
                    let locations: Vec<String> = engine
                        .actionable_locations()
                        .iter()
                        .map(|l| l.0.to_string())
                        .collect();
                    format!("actor {faction} {}", locations.join(" "))
                }
                None => "actor none".to_string(),
            };
            return Ok(Reply::Text(text.trim_end().to_string()));
        }
        Command::Targets { location } => {
            let targets = engine.valid_targets(ids.location(location)?)?;
            let list: Vec<String> = targets.iter().map(|l| l.0.to_string()).collect();
            return Ok(Reply::Text(format!("targets {}", list.join(" ")).trim_end().to_string()));
        }
        Command::Use {
            player,
            source,
            target,
            units,
        } => {
            let faction = ids.faction(player)?;
            let source = ids.location(source)?;
            let target = ids.location(target)?;
            let units = units
                .into_iter()
                .map(|u| ids.unit(engine.board(), u))
                .collect::<GameResult<Vec<_>>>()?;
            engine.use_token(faction, source, target, &units)?;
        }
        Command::Skip { player, location } => {
            engine.skip_action(ids.faction(player)?, ids.location(location)?)?
        }
        Command::Support {
            player,
            location,
            side,
        } => engine.support(ids.faction(player)?, ids.location(location)?, side)?,
        Command::Card { player, card } => {
            engine.play_combat_card(ids.faction(player)?, ids.card(card)?)?
        }
        Command::Bonus { player } => engine.use_combat_bonus(ids.faction(player)?)?,
        Command::Spawn {
            player,
            location,
            kind,
        } => engine.spawn_unit(ids.faction(player)?, ids.location(location)?, kind)?,
        Command::Bid { player, amount } => engine.bid(ids.faction(player)?, amount)?,
        Command::TieBreak {
            player,
            loser,
            winner,
        } => engine.break_tie(ids.faction(player)?, loser, winner)?,
        Command::Phase => return Ok(Reply::Text(format!("phase {}", engine.phase()))),
        Command::Snapshot => {
            let json = serde_json::to_string(&engine.snapshot())
                .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
            return Ok(Reply::Text(json));
        }
        Command::Quit => return Ok(Reply::Quit),
    }
    Ok(Reply::Ok)
}
