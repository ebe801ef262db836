//! Match state and the public operation surface.
//!
//! `Engine` owns the board, the hands, the phase machine, the action queue
//! and the battle in progress. Every public operation validates completely
//! before it mutates anything, so a rejected call leaves the match exactly
//! as it was. Phase entry effects run in `settle`, which keeps advancing
//! until it reaches a phase that waits for a player.

mod actions;
mod battle;
mod planning;
mod snapshot;
mod subflows;

pub use snapshot::Snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{
    check_invariants, ActionToken, Board, Faction, LocationId, Orderings, Player, Registry,
    TokenId,
};
use crate::error::{GameResult, IllegalState, InvalidInput};
use crate::movegen;
use crate::resolve::{Combat, PhaseMachine, RoundPhase, Ruleset, Scheduler, SubFlow, SupplyTable};

/// Tunable rule constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Strength added by the once-per-match combat bonus.
    pub combat_bonus_strength: i32,
    /// Rounds after which the victory hook may end the match.
    pub max_rounds: Option<u32>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            combat_bonus_strength: 1,
            max_rounds: None,
        }
    }
}

/// Initial state of a match.
#[derive(Debug, Clone)]
pub struct Setup {
    pub board: Board,
    pub players: BTreeMap<Faction, Player>,
    pub orderings: Orderings,
    /// Special tokens per round, indexed by special-order position.
    pub special_allotment: Vec<u32>,
    pub supply: SupplyTable,
    pub round: u32,
    pub threat_level: u32,
    pub combat_bonus_used: bool,
    pub config: RulesConfig,
}

/// What a phase does once it becomes current.
enum Flow {
    /// Wait for a player operation.
    Await,
    /// Move straight on to the successor.
    Continue,
    /// Enter a sub-chain.
    Jump(RoundPhase),
    /// Replace the current phase.
    Goto(RoundPhase),
}

#[derive(Debug)]
pub struct Engine {
    registry: Arc<Registry>,
    rules: Box<dyn Ruleset>,
    board: Board,
    players: BTreeMap<Faction, Player>,
    orderings: Orderings,
    special_allotment: Vec<u32>,
    supply: SupplyTable,
    config: RulesConfig,
    phases: PhaseMachine,
    scheduler: Scheduler,
    combat: Option<Combat>,
    round: u32,
    threat_level: u32,
    threat_total: Option<u32>,
    combat_bonus_used: bool,
    sight_power_used: bool,
    seated: BTreeSet<Faction>,
    ready: BTreeSet<Faction>,
    bids: BTreeMap<Faction, u32>,
    tie_pending: bool,
    spawn_window: Option<(Faction, LocationId)>,
    winner: Option<Faction>,
}

impl Engine {
    /// Creates a match waiting in the lobby.
    pub fn new(registry: Arc<Registry>, setup: Setup, rules: Box<dyn Ruleset>) -> Self {
        Engine {
            registry,
            rules,
            board: setup.board,
            players: setup.players,
            orderings: setup.orderings,
            special_allotment: setup.special_allotment,
            supply: setup.supply,
            config: setup.config,
            phases: PhaseMachine::new(),
            scheduler: Scheduler::new(),
            combat: None,
            round: setup.round.max(1),
            threat_level: setup.threat_level,
            threat_total: None,
            combat_bonus_used: setup.combat_bonus_used,
            sight_power_used: false,
            seated: BTreeSet::new(),
            ready: BTreeSet::new(),
            bids: BTreeMap::new(),
            tie_pending: false,
            spawn_window: None,
            winner: None,
        }
    }

    // ---- accessors ----

    pub fn phase(&self) -> RoundPhase {
        self.phases.current()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn player(&self, faction: Faction) -> Option<&Player> {
        self.players.get(&faction)
    }

    pub fn players(&self) -> &BTreeMap<Faction, Player> {
        &self.players
    }

    pub fn orderings(&self) -> &Orderings {
        &self.orderings
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn combat(&self) -> Option<&Combat> {
        self.combat.as_ref()
    }

    pub fn combat_bonus_used(&self) -> bool {
        self.combat_bonus_used
    }

    pub fn sight_power_used(&self) -> bool {
        self.sight_power_used
    }

    pub fn threat_total(&self) -> Option<u32> {
        self.threat_total
    }

    pub fn winner(&self) -> Option<Faction> {
        self.winner
    }

    pub fn is_seated(&self, faction: Faction) -> bool {
        self.seated.contains(&faction)
    }

    /// Special tokens `faction` may commit per round.
    pub fn special_allotment(&self, faction: Faction) -> u32 {
        self.orderings
            .special_position(faction)
            .and_then(|pos| self.special_allotment.get(pos))
            .copied()
            .unwrap_or(0)
    }

    // ---- queries ----

    /// The faction whose turn it is to act, if the current phase has one.
    pub fn current_actor(&self) -> Option<Faction> {
        match self.phases.current() {
            RoundPhase::Action | RoundPhase::CombatAssist => self.scheduler.current_faction(),
            _ => None,
        }
    }

    /// Locations the current actor may act from.
    pub fn actionable_locations(&self) -> Vec<LocationId> {
        match self.phases.current() {
            RoundPhase::Action | RoundPhase::CombatAssist => self
                .scheduler
                .head()
                .map(|g| g.locations.iter().copied().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Tokens still in `faction`'s hand.
    pub fn held_tokens(&self, faction: Faction) -> GameResult<Vec<TokenId>> {
        Ok(self.seat(faction)?.tokens.iter().copied().collect())
    }

    /// Legal targets of the token placed on `location`.
    pub fn valid_targets(&self, location: LocationId) -> GameResult<Vec<LocationId>> {
        let token = self
            .board
            .location(location)?
            .token
            .ok_or(IllegalState::NoToken(location))?;
        self.valid_targets_for(token, location)
    }

    /// Legal targets `token` would have if it stood on `location`.
    pub fn valid_targets_for(
        &self,
        token: TokenId,
        location: LocationId,
    ) -> GameResult<Vec<LocationId>> {
        self.board.location(location)?;
        let spec = self.token_spec(token)?;
        Ok(movegen::valid_targets(
            &self.board,
            &self.registry,
            spec,
            location,
        ))
    }

    // ---- lifecycle ----

    /// Claims a seat for `faction`.
    pub fn join(&mut self, faction: Faction) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::Lobby], "join")?;
        if !self.players.contains_key(&faction) {
            return Err(IllegalState::NotSeated(faction).into());
        }
        if self.seated.contains(&faction) {
            return Err(IllegalState::AlreadySeated(faction).into());
        }
        self.seated.insert(faction);
        info!(%faction, "faction joined");
        Ok(())
    }

    /// Starts the match once every configured faction is seated.
    pub fn start(&mut self) -> GameResult<()> {
        self.expect_phase(&[RoundPhase::Lobby], "start")?;
        if self.seated.len() != self.players.len() {
            return Err(IllegalState::SeatsOpen.into());
        }
        self.deal_tokens();
        let first = if self.round <= 1 {
            RoundPhase::PreGame
        } else {
            RoundPhase::EventDisplayCards
        };
        info!(round = self.round, phase = %first, "match started");
        self.phases.goto(first);
        self.settle()?;
        self.debug_check();
        Ok(())
    }

    /// Marks `faction` ready; the phase advances once everyone is.
    pub fn set_ready(&mut self, faction: Faction) -> GameResult<()> {
        self.expect_phase(
            &[
                RoundPhase::PreGame,
                RoundPhase::EventDisplayCards,
                RoundPhase::PlanPlaceTokens,
            ],
            "set_ready",
        )?;
        self.seat(faction)?;
        self.ready.insert(faction);
        debug!(%faction, "ready");
        if self.ready == self.seated {
            self.advance_and_settle()?;
        }
        self.debug_check();
        Ok(())
    }

    /// Explicitly completes the current phase.
    pub fn advance_phase(&mut self) -> GameResult<RoundPhase> {
        let phase = self.phases.current();
        let blocked: Option<IllegalState> = match phase {
            RoundPhase::GameOver => Some(IllegalState::GameOver),
            RoundPhase::Action if !self.scheduler.is_drained() => Some(IllegalState::ActionsPending),
            RoundPhase::CombatAssist if !self.scheduler.is_drained() => {
                Some(IllegalState::ReactionsPending)
            }
            RoundPhase::BidCollect if self.bids.len() < self.seated.len() => {
                Some(IllegalState::BidsPending)
            }
            RoundPhase::BidTieBreak if self.tie_pending => Some(IllegalState::TiePending),
            _ => None,
        };
        if let Some(err) = blocked {
            return Err(err.into());
        }
        self.advance_and_settle()?;
        self.debug_check();
        Ok(self.phases.current())
    }

    // ---- phase plumbing ----

    fn advance_and_settle(&mut self) -> GameResult<()> {
        let from = self.phases.current();
        let to = self.phases.advance()?;
        debug!(%from, %to, "phase advanced");
        self.settle()
    }

    /// Runs entry effects until a phase waits for input.
    fn settle(&mut self) -> GameResult<()> {
        loop {
            let phase = self.phases.current();
            info!(%phase, round = self.round, "entering phase");
            match self.on_begin(phase) {
                Flow::Await => return Ok(()),
                Flow::Continue => {
                    self.phases.advance()?;
                }
                Flow::Jump(start) => self.phases.jump(start)?,
                Flow::Goto(next) => self.phases.goto(next),
            }
        }
    }

    fn on_begin(&mut self, phase: RoundPhase) -> Flow {
        match phase {
            RoundPhase::Lobby | RoundPhase::GameOver => Flow::Await,
            RoundPhase::PreGame | RoundPhase::PlanPlaceTokens => {
                self.ready.clear();
                Flow::Await
            }
            RoundPhase::EventDisplayCards => {
                self.ready.clear();
                self.rules.draw_event_cards(self.round);
                Flow::Await
            }
            RoundPhase::EventResolveCards => {
                match self.rules.resolve_event_cards(&self.board, self.round) {
                    Some(SubFlow::Bidding) => Flow::Jump(RoundPhase::BidCollect),
                    Some(SubFlow::Threat) => Flow::Jump(RoundPhase::ThreatDisplay),
                    None => Flow::Continue,
                }
            }
            RoundPhase::PlanRevealTokens => {
                self.scheduler = Scheduler::build(&self.board, &self.registry, &self.orderings);
                debug!(groups = self.scheduler.queue().len(), "action queue built");
                Flow::Continue
            }
            RoundPhase::PlanSightPower
            | RoundPhase::Action
            | RoundPhase::CombatAssist
            | RoundPhase::CombatCard
            | RoundPhase::CombatBonus => Flow::Await,
            RoundPhase::RoundEnd => {
                self.end_round();
                match self.rules.victor(&self.board, &self.orderings, self.round) {
                    Some(faction) => {
                        info!(%faction, round = self.round, "match won");
                        self.winner = Some(faction);
                        Flow::Goto(RoundPhase::GameOver)
                    }
                    None => Flow::Continue,
                }
            }
            RoundPhase::CombatResolution => {
                self.resolve_combat();
                Flow::Continue
            }
            RoundPhase::CombatEnd => {
                self.combat = None;
                self.scheduler.pop_frame();
                Flow::Continue
            }
            RoundPhase::BidCollect => {
                self.bids.clear();
                Flow::Await
            }
            RoundPhase::BidReveal => {
                self.reveal_bids();
                Flow::Continue
            }
            RoundPhase::BidTieBreak => {
                if self.tie_pending {
                    Flow::Await
                } else {
                    Flow::Continue
                }
            }
            RoundPhase::ThreatDisplay => {
                self.threat_total = Some(self.rules.threat_total(&self.board, self.threat_level));
                Flow::Await
            }
            RoundPhase::ThreatResolve => {
                let total = self.threat_total.take().unwrap_or(self.threat_level);
                self.rules.resolve_threat(&self.board, total);
                Flow::Continue
            }
        }
    }

    fn end_round(&mut self) {
        self.board.clear_tokens();
        self.board.unroute_all();
        self.deal_tokens();
        self.scheduler = Scheduler::new();
        self.sight_power_used = false;
        self.spawn_window = None;
        self.round += 1;
    }

    fn deal_tokens(&mut self) {
        let all = self.registry.full_token_set();
        for player in self.players.values_mut() {
            player.reset_tokens(all.clone());
        }
    }

    // ---- validation helpers ----

    fn expect_phase(&self, allowed: &[RoundPhase], operation: &'static str) -> GameResult<()> {
        let phase = self.phases.current();
        if allowed.contains(&phase) {
            Ok(())
        } else if phase == RoundPhase::GameOver {
            Err(IllegalState::GameOver.into())
        } else {
            Err(IllegalState::WrongPhase { phase, operation }.into())
        }
    }

    /// The hand of a seated faction.
    fn seat(&self, faction: Faction) -> GameResult<&Player> {
        match self.players.get(&faction) {
            Some(player) if self.seated.contains(&faction) => Ok(player),
            _ => Err(IllegalState::NotSeated(faction).into()),
        }
    }

    fn seat_mut(&mut self, faction: Faction) -> GameResult<&mut Player> {
        if !self.seated.contains(&faction) {
            return Err(IllegalState::NotSeated(faction).into());
        }
        self.players
            .get_mut(&faction)
            .ok_or_else(|| IllegalState::NotSeated(faction).into())
    }

    fn token_spec(&self, token: TokenId) -> GameResult<&ActionToken> {
        self.registry
            .token(token)
            .ok_or_else(|| InvalidInput::UnknownToken(token).into())
    }

    /// Location `id`, which `faction` must own.
    fn owned(&self, faction: Faction, id: LocationId) -> GameResult<&crate::board::Location> {
        let loc = self.board.location(id)?;
        if !loc.is_owned_by(faction) {
            return Err(IllegalState::NotOwner {
                faction,
                location: id,
            }
            .into());
        }
        Ok(loc)
    }

    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            let violations = check_invariants(
                &self.board,
                &self.registry,
                &self.players,
                &self.orderings,
                &self.special_allotment,
            );
            debug_assert!(violations.is_empty(), "{violations:?}");
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A small two-faction board shared by the engine tests.
    //!
    //! ```text
    //!   Keep(R,base) -- Field -- Ridge(B) -- Tower(B,base)
    //!        |           |
    //!     Harbor(R,port)  Glen(R)
    //!        |
    //!      Bay(R ship)
    //! ```
    use super::*;
    use crate::board::{Base, BoardBuilder, CombatCard, Terrain, UnitKind};
    use crate::resolve::StandardRules;

    pub struct Ids {
        pub keep: LocationId,
        pub field: LocationId,
        pub ridge: LocationId,
        pub tower: LocationId,
        pub glen: LocationId,
        pub harbor: LocationId,
        pub bay: LocationId,
    }

    pub fn registry() -> Registry {
        Registry::standard().with_cards(vec![
            CombatCard::new("red-blade", 2).with_casualties(1, 0),
            CombatCard::new("red-shield", 0).with_casualties(0, 1),
            CombatCard::new("blue-blade", 2).with_casualties(1, 0),
            CombatCard::new("blue-shield", 0).with_casualties(0, 1),
        ])
    }

    pub fn setup() -> (Setup, Ids) {
        let mut b = BoardBuilder::new();
        let keep = b.location("Keep", Terrain::Land);
        let field = b.location("Field", Terrain::Land);
        let ridge = b.location("Ridge", Terrain::Land);
        let tower = b.location("Tower", Terrain::Land);
        let glen = b.location("Glen", Terrain::Land);
        let harbor = b.location("Harbor", Terrain::Port);
        let bay = b.location("Bay", Terrain::Sea);
        b.base(keep, Base::new(1, 1)).base(tower, Base::new(1, 1));
        b.economy(keep, 1, 2).economy(glen, 1, 1);
        b.connect(keep, field)
            .connect(field, ridge)
            .connect(ridge, tower)
            .connect(field, glen)
            .connect(keep, harbor)
            .connect(harbor, bay)
            .connect(glen, ridge);
        b.garrison(keep, Faction::Red, UnitKind::Infantry)
            .garrison(keep, Faction::Red, UnitKind::Infantry)
            .garrison(glen, Faction::Red, UnitKind::Infantry)
            .garrison(bay, Faction::Red, UnitKind::Ship)
            .garrison(ridge, Faction::Blue, UnitKind::Infantry)
            .garrison(tower, Faction::Blue, UnitKind::Infantry)
            .garrison(tower, Faction::Blue, UnitKind::Advanced);
        let board = b.build().expect("fixture board");

        let mut red = Player {
            cash_in_hand: 3,
            cash_pool: 5,
            ..Player::default()
        };
        red.cards.extend([crate::board::CardId(0), crate::board::CardId(1)]);
        red.unit_pool.extend([UnitKind::Infantry, UnitKind::Advanced]);
        let mut blue = Player {
            cash_in_hand: 3,
            cash_pool: 5,
            ..Player::default()
        };
        blue.cards.extend([crate::board::CardId(2), crate::board::CardId(3)]);
        blue.unit_pool.push(UnitKind::Infantry);

        let setup = Setup {
            board,
            players: BTreeMap::from([(Faction::Red, red), (Faction::Blue, blue)]),
            orderings: Orderings::uniform(&[Faction::Red, Faction::Blue]),
            special_allotment: vec![2, 1],
            supply: SupplyTable {
                positions: BTreeMap::from([(Faction::Red, 0), (Faction::Blue, 0)]),
                limits: vec![vec![4, 2, 1]],
            },
            round: 1,
            threat_level: 2,
            combat_bonus_used: false,
            config: RulesConfig::default(),
        };
        let ids = Ids {
            keep,
            field,
            ridge,
            tower,
            glen,
            harbor,
            bay,
        };
        (setup, ids)
    }

    pub fn engine_with(rules: Box<dyn Ruleset>) -> (Engine, Ids) {
        let (setup, ids) = setup();
        (Engine::new(Arc::new(registry()), setup, rules), ids)
    }

    pub fn engine() -> (Engine, Ids) {
        engine_with(Box::new(StandardRules::default()))
    }

    /// An engine already in PlanPlaceTokens of round one.
    pub fn planning() -> (Engine, Ids) {
        let (mut e, ids) = engine();
        e.join(Faction::Red).expect("join red");
        e.join(Faction::Blue).expect("join blue");
        e.start().expect("start");
        e.set_ready(Faction::Red).expect("ready");
        e.set_ready(Faction::Blue).expect("ready");
        assert_eq!(e.phase(), RoundPhase::PlanPlaceTokens);
        (e, ids)
    }

    pub fn token(e: &Engine, label: &str) -> TokenId {
        e.registry().find_token(label).expect("catalog token")
    }

    /// Places tokens, reveals, declines the sight power: ends in Action.
    pub fn to_action(e: &mut Engine, placements: &[(Faction, LocationId, &str)]) {
        for &(faction, loc, label) in placements {
            let t = token(e, label);
            e.place_token(faction, loc, t).expect("place token");
        }
        e.set_ready(Faction::Red).expect("ready");
        e.set_ready(Faction::Blue).expect("ready");
        assert_eq!(e.phase(), RoundPhase::PlanSightPower);
        e.advance_phase().expect("decline sight power");
    }

    pub fn units_at(e: &Engine, loc: LocationId) -> Vec<crate::board::UnitId> {
        e.board()[loc].units.iter().map(|u| u.id).collect()
    }
}
