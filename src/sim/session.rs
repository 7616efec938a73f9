/// GameSession: the round/level state machine.
///
/// ## Phases
///
///   Idle ──start()──▶ Playing ──time 0──▶ Complete
///     ▲                  │                   │
///     └─────reset()──────┴─────reset()───────┘   (Complete ──start()──▶ Playing)
///
/// ## Round replacement
///
/// When the last target edge is matched the round is frozen and a
/// `RoundCleared` event carries a `RoundTicket`. The loop schedules the ticket
/// for the grace delay and hands it back through `advance_round`, which
/// applies bonus + level + new round in one step. Tickets from an earlier
/// generation (restart/reset) or an earlier round are ignored.
///
/// If the countdown expires while a cleared round is pending, the pending
/// award is settled by the same tick that enters `Complete`.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{RulesConfig, SkyConfig};
use crate::domain::generator::generate_round;
use crate::domain::matcher::{self, EdgeOutcome};
use crate::domain::sky::{Edge, Entity, Round, Star, StarId};
use crate::sim::event::GameEvent;
use crate::sim::schedule::RoundTicket;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    Playing,
    Complete,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no catalog entries available to build a round")]
    NoContent,
}

/// Bonus computed at clear time, paid when the replacement round arrives.
#[derive(Clone, Copy, Debug)]
struct PendingAward {
    ticket: RoundTicket,
    bonus: u32,
}

pub struct GameSession<R: Rng = SmallRng> {
    phase: Phase,
    score: u32,
    time_remaining: u32,
    level: u32,
    rounds_cleared: u32,
    round: Option<Round>,
    user_edges: Vec<Edge>,
    selected: Option<StarId>,
    awaiting_content: bool,

    generation: u64,
    serial: u64,
    pending: Option<PendingAward>,

    rules: RulesConfig,
    sky: SkyConfig,
    pool: Vec<Entity>,
    rng: R,
}

/// One user edge with its correctness tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeView {
    pub edge: Edge,
    pub correct: bool,
}

/// Read-only snapshot for the presentation layer.
#[derive(Debug)]
pub struct SessionView<'a> {
    pub phase: Phase,
    pub score: u32,
    pub level: u32,
    pub time_remaining: u32,
    pub rounds_cleared: u32,
    pub entity: Option<&'a Entity>,
    pub stars: &'a [Star],
    pub edges: Vec<EdgeView>,
    pub selected: Option<StarId>,
    pub matched: usize,
    pub targets: usize,
    pub round_cleared: bool,
    pub awaiting_content: bool,
}

impl GameSession<SmallRng> {
    /// Session with a `SmallRng`, seeded when `seed` is given.
    pub fn seeded(rules: RulesConfig, sky: SkyConfig, pool: Vec<Entity>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => SmallRng::seed_from_u64(s),
            None => SmallRng::from_os_rng(),
        };
        GameSession::new(rules, sky, pool, rng)
    }
}

impl<R: Rng> GameSession<R> {
    pub fn new(rules: RulesConfig, sky: SkyConfig, pool: Vec<Entity>, rng: R) -> Self {
        GameSession {
            phase: Phase::Idle,
            score: 0,
            time_remaining: rules.session_secs,
            level: 1,
            rounds_cleared: 0,
            round: None,
            user_edges: vec![],
            selected: None,
            awaiting_content: false,
            generation: 0,
            serial: 0,
            pending: None,
            rules,
            sky,
            pool,
            rng,
        }
    }

    // ── Lifecycle ──

    /// Begin a new game from `Idle` or `Complete` (or restart a running one).
    /// Fails without side effects on counters when the pool is empty.
    pub fn start(&mut self) -> Result<Vec<GameEvent>, SessionError> {
        if self.pool.is_empty() {
            self.awaiting_content = true;
            info!("start refused: entity pool is empty");
            return Err(SessionError::NoContent);
        }

        self.generation += 1;
        self.clear_counters();
        self.phase = Phase::Playing;
        info!(generation = self.generation, pool = self.pool.len(), "game started");

        let mut events = vec![GameEvent::GameStarted];
        self.request_round(&mut events);
        Ok(events)
    }

    /// Back to pre-game defaults without starting.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.clear_counters();
        self.phase = Phase::Idle;
        debug!(generation = self.generation, "session reset");
    }

    fn clear_counters(&mut self) {
        self.score = 0;
        self.level = 1;
        self.rounds_cleared = 0;
        self.time_remaining = self.rules.session_secs;
        self.round = None;
        self.user_edges.clear();
        self.selected = None;
        self.pending = None;
        self.awaiting_content = false;
    }

    /// Replace the entity pool. A game stuck without a round picks one up
    /// immediately.
    pub fn set_pool(&mut self, pool: Vec<Entity>) -> Vec<GameEvent> {
        self.pool = pool;
        let mut events = vec![];
        if self.pool.is_empty() {
            return events;
        }
        self.awaiting_content = false;
        if self.phase == Phase::Playing && self.round.is_none() && self.pending.is_none() {
            self.request_round(&mut events);
        }
        events
    }

    // ── Countdown ──

    /// One elapsed countdown interval. No-op outside `Playing`.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        if self.phase != Phase::Playing {
            return vec![];
        }

        let mut events = vec![];
        self.time_remaining = self.time_remaining.saturating_sub(1);

        if self.time_remaining == 0 {
            if let Some(award) = self.pending.take() {
                self.settle(award, &mut events);
            }
            self.selected = None;
            self.phase = Phase::Complete;
            info!(score = self.score, level = self.level, "time up");
            events.push(GameEvent::TimeUp { score: self.score, level: self.level });
        } else if self.time_remaining <= self.rules.warning_secs {
            events.push(GameEvent::LowTime { remaining: self.time_remaining });
        }

        events
    }

    // ── Star selection ──

    /// Click on a star. Ignored outside `Playing`, while a cleared round is
    /// waiting for its replacement, and for ids not in the current round.
    pub fn star_clicked(&mut self, id: StarId) -> Vec<GameEvent> {
        let mut events = vec![];
        if self.phase != Phase::Playing || self.pending.is_some() {
            return events;
        }
        match &self.round {
            Some(r) if r.has_star(id) => {}
            _ => return events,
        }

        match self.selected {
            None => {
                self.selected = Some(id);
                events.push(GameEvent::StarSelected { star: id });
            }
            Some(sel) if sel == id => {
                self.selected = None;
                events.push(GameEvent::StarDeselected { star: id });
            }
            Some(sel) => {
                // Selection clears whatever the outcome.
                self.selected = None;
                self.try_add_edge(sel, id, &mut events);
            }
        }
        events
    }

    /// Submit a candidate edge to the matcher and apply scoring.
    /// Completing the round freezes it and emits `RoundCleared`.
    pub fn try_add_edge(&mut self, from: StarId, to: StarId, events: &mut Vec<GameEvent>) -> EdgeOutcome {
        if self.phase != Phase::Playing || self.pending.is_some() {
            return EdgeOutcome::REJECTED;
        }
        let round = match &self.round {
            Some(r) => r,
            None => return EdgeOutcome::REJECTED,
        };

        let outcome = matcher::try_add_edge(round, &mut self.user_edges, from, to);
        if !outcome.accepted {
            events.push(GameEvent::EdgeRejected);
            return outcome;
        }

        let edge = self.user_edges[self.user_edges.len() - 1];
        if outcome.correct {
            self.score = self.score.saturating_add(self.rules.points_per_edge);
        }
        debug!(from = %from, to = %to, correct = outcome.correct, "edge accepted");
        events.push(GameEvent::EdgeAccepted { edge, correct: outcome.correct });

        if outcome.correct && matcher::is_complete(round, &self.user_edges) {
            let bonus = self.time_remaining.saturating_mul(self.rules.bonus_per_second);
            let ticket = RoundTicket { generation: self.generation, serial: self.serial };
            self.pending = Some(PendingAward { ticket, bonus });
            info!(level = self.level, bonus, entity = %round.entity.name, "round cleared");
            events.push(GameEvent::RoundCleared { level: self.level, bonus, ticket });
        }
        outcome
    }

    // ── Round transitions ──

    /// Deferred half of a round clear. Stale tickets are ignored.
    pub fn advance_round(&mut self, ticket: RoundTicket) -> Vec<GameEvent> {
        let mut events = vec![];
        if self.phase != Phase::Playing {
            return events;
        }
        match self.pending {
            Some(award) if award.ticket == ticket => {
                self.pending = None;
                self.settle(award, &mut events);
                self.request_round(&mut events);
            }
            _ => debug!(?ticket, "stale round ticket ignored"),
        }
        events
    }

    /// Pay a pending award: bonus and level move together.
    fn settle(&mut self, award: PendingAward, events: &mut Vec<GameEvent>) {
        self.score = self.score.saturating_add(award.bonus);
        self.level = self.level.saturating_add(1);
        self.rounds_cleared = self.rounds_cleared.saturating_add(1);
        events.push(GameEvent::LevelUp { level: self.level, score: self.score });
    }

    fn request_round(&mut self, events: &mut Vec<GameEvent>) {
        self.serial += 1;
        self.user_edges.clear();
        self.selected = None;

        if self.pool.is_empty() {
            self.round = None;
            self.awaiting_content = true;
            events.push(GameEvent::AwaitingContent);
            return;
        }

        let idx = self.rng.random_range(0..self.pool.len());
        let round = generate_round(&self.pool[idx], &self.sky, &mut self.rng);
        debug!(
            entity = %round.entity.id,
            stars = round.stars.len(),
            targets = round.target().len(),
            "round generated"
        );
        events.push(GameEvent::RoundStarted {
            level: self.level,
            entity: round.entity.name.clone(),
            stars: round.stars.len(),
            targets: round.target().len(),
        });
        self.round = Some(round);
    }

    // ── Read access ──

    pub fn view(&self) -> SessionView<'_> {
        let (entity, stars, edges, matched, targets) = match &self.round {
            Some(r) => (
                Some(&r.entity),
                r.stars.as_slice(),
                self.user_edges
                    .iter()
                    .map(|e| EdgeView { edge: *e, correct: r.is_target(e) })
                    .collect(),
                matcher::matched_count(r, &self.user_edges),
                r.target().len(),
            ),
            None => (None, &[][..], vec![], 0, 0),
        };
        SessionView {
            phase: self.phase,
            score: self.score,
            level: self.level,
            time_remaining: self.time_remaining,
            rounds_cleared: self.rounds_cleared,
            entity,
            stars,
            edges,
            selected: self.selected,
            matched,
            targets,
            round_cleared: self.pending.is_some(),
            awaiting_content: self.awaiting_content,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn score(&self) -> u32 { self.score }
    pub fn level(&self) -> u32 { self.level }
    pub fn time_remaining(&self) -> u32 { self.time_remaining }
    pub fn selected(&self) -> Option<StarId> { self.selected }
    pub fn round(&self) -> Option<&Round> { self.round.as_ref() }
    pub fn user_edges(&self) -> &[Edge] { &self.user_edges }
    pub fn awaiting_content(&self) -> bool { self.awaiting_content }
}
