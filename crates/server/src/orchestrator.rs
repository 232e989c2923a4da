//! Session orchestrator.
//!
//! The orchestrator owns one session: the state record, the physics world,
//! the modifier subsystem and the job schedule. It is driven by a single
//! caller through [`Orchestrator::advance`], which serializes inbound
//! commands, disconnects and every periodic job on one timeline.
//!
//! # Phases
//!
//! ```text
//! lobby -> playing -> hole_review -> playing ... -> course_end
//!                                                    |-> playing (tournament, next course)
//!                                                    |-> tournament_end
//! course_end | tournament_end -> lobby   (host request only)
//! ```
//!
//! Ending a hole cancels the hole jobs before the review job is scheduled,
//! so a stale physics tick can never touch the next hole.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use fairway_sim::{
    Course, DVec3, Hole, PhysicsWorld, StrokeController, TargetDetector, build_hole,
    target_detector,
};
use fairway_wire::{PositionBatch, SessionSnapshot, client_command};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::catalog::CourseCatalog;
use crate::command_queue::{CommandQueue, Inbound};
use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionError};
use crate::modifier::{ModifierEvent, ModifierKind, ModifierSystem};
use crate::player::{Identity, Player, PlayerId};
use crate::scheduler::{HOLE_JOBS, Job, Scheduler};
use crate::scoring::{CourseScore, HoleScore, ScoreCard, course_leaderboard, hole_leaderboard};
use crate::session::{MatchMode, Phase, SessionState};
use crate::sync;
use crate::validation::{self, Command, CommandVerdict, MatchRequest};

/// Where finished balls are parked, well below any playing surface.
pub const HIDDEN_POSITION: DVec3 = DVec3::new(0.0, -10.0, 0.0);

// ============================================================================
// Outbound
// ============================================================================

/// Discrete events broadcast to every connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    HoleStarted {
        hole_index: u32,
        hole: Box<Hole>,
    },
    HoledOut {
        player_id: PlayerId,
        username: String,
        strokes: u32,
    },
    HoleEnded {
        hole_index: u32,
        par: u32,
        scores: Vec<HoleScore>,
    },
    CourseEnded {
        scores: Vec<CourseScore>,
        tournament: bool,
        course_index: u32,
        total_courses: u32,
    },
    TournamentEnded {
        scores: Vec<CourseScore>,
    },
    Modifier(ModifierEvent),
    PlayerJoined(Player),
    PlayerLeft {
        player_id: PlayerId,
    },
}

/// Everything the orchestrator asks its host to deliver.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// To the joining connection only.
    Welcome {
        player_id: PlayerId,
        snapshot: SessionSnapshot,
    },
    State(SessionSnapshot),
    Positions(PositionBatch),
    Notify(Notification),
    /// To the connection whose request failed.
    Rejected {
        player_id: PlayerId,
        error: SessionError,
    },
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    config: SessionConfig,
    state: SessionState,
    world: PhysicsWorld,
    stroke: StrokeController,
    modifiers: ModifierSystem,
    scheduler: Scheduler,
    queue: CommandQueue,
    catalog: Arc<dyn CourseCatalog>,
    /// Tournament shuffles.
    rng: Pcg64,
    /// Courses of the current match, in play order.
    course_plan: Vec<Course>,
    hole: Option<Hole>,
    detector: Option<TargetDetector>,
    /// Last position each ball was at rest above ground, this hole only.
    safe_positions: HashMap<PlayerId, DVec3>,
    last_physics_at: Option<Duration>,
    /// Session-relative time of the current `advance`.
    now: Duration,
    scores: ScoreCard,
    outbox: Vec<Outbound>,
    next_player_id: PlayerId,
    next_color_index: u32,
    /// Authoritative state changed since the last published snapshot.
    dirty: bool,
}

impl Orchestrator {
    pub fn new(config: SessionConfig, catalog: Arc<dyn CourseCatalog>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = Pcg64::seed_from_u64(config.seed);
        let modifiers = ModifierSystem::new(
            rng.random(),
            config.pickup_radius,
            config.max_held_modifiers,
        );

        Ok(Self {
            state: SessionState::default(),
            world: PhysicsWorld::new(config.tick_rate_hz),
            stroke: StrokeController::new(config.max_stroke_impulse),
            modifiers,
            scheduler: Scheduler::new(),
            queue: CommandQueue::new(config.commands_per_tick(), config.physics_period()),
            catalog,
            rng,
            course_plan: Vec::new(),
            hole: None,
            detector: None,
            safe_positions: HashMap::new(),
            last_physics_at: None,
            now: Duration::ZERO,
            scores: ScoreCard::default(),
            outbox: Vec::new(),
            next_player_id: 1,
            next_color_index: 0,
            dirty: false,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn modifiers(&self) -> &ModifierSystem {
        &self.modifiers
    }

    pub fn score_card(&self) -> &ScoreCard {
        &self.scores
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        sync::session_snapshot(&self.state)
    }

    /// Earliest time `advance` has scheduled work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Reserve an id for a new connection. The player exists once its join
    /// command has been applied.
    pub fn allocate_player_id(&mut self) -> PlayerId {
        let id = self.next_player_id;
        self.next_player_id += 1;
        id
    }

    // ------------------------------------------------------------------------
    // Inbound
    // ------------------------------------------------------------------------

    /// Validate a raw client frame and queue it.
    pub fn submit_frame(&mut self, player_id: PlayerId, bytes: &[u8]) -> CommandVerdict {
        match validation::validate_frame(bytes) {
            Ok((command, verdict)) => self.enqueue(player_id, command, verdict),
            Err(verdict) => {
                debug!("dropped frame from player {player_id}: {verdict:?}");
                verdict
            }
        }
    }

    /// Validate a decoded client command and queue it.
    pub fn submit(&mut self, player_id: PlayerId, command: client_command::Command) -> CommandVerdict {
        match validation::validate_command(command) {
            Ok((command, verdict)) => self.enqueue(player_id, command, verdict),
            Err(verdict) => {
                debug!("dropped command from player {player_id}: {verdict:?}");
                verdict
            }
        }
    }

    /// Queue an already-validated command.
    pub fn submit_command(&mut self, player_id: PlayerId, command: Command) -> CommandVerdict {
        self.enqueue(player_id, command, CommandVerdict::Accepted)
    }

    /// Queue a disconnect; it is applied in order with other inbound messages.
    pub fn disconnect(&mut self, player_id: PlayerId) {
        self.queue.push_disconnect(player_id);
    }

    fn enqueue(&mut self, player_id: PlayerId, command: Command, verdict: CommandVerdict) -> CommandVerdict {
        let name = command.name();
        let known = matches!(command, Command::Join(_))
            || self.state.players.contains_key(&player_id)
            || self.queue.has_pending_join(player_id);
        if !known {
            debug!("dropped {name} from unknown player {player_id}");
            return CommandVerdict::DroppedUnknownPlayer;
        }

        let verdict = self.queue.push_command(player_id, command, verdict);
        if !verdict.is_accepted() {
            debug!("dropped {name} from player {player_id}: {verdict:?}");
        }
        verdict
    }

    // ------------------------------------------------------------------------
    // Driving
    // ------------------------------------------------------------------------

    /// Move the session clock to `now` without running any job. Messages
    /// submitted afterwards are rate limited in the tick window of `now`.
    pub fn observe_time(&mut self, now: Duration) {
        self.now = self.now.max(now);
        self.queue.roll_window(self.now);
    }

    /// Apply queued inbound messages, run every job due at `now`, then
    /// publish one snapshot if authoritative state changed.
    pub fn advance(&mut self, now: Duration) {
        self.observe_time(now);

        for queued in self.queue.drain() {
            match queued.input {
                Inbound::Command(command) => self.apply(queued.player_id, command),
                Inbound::Disconnected => self.leave(queued.player_id),
            }
        }

        while let Some(job) = self.scheduler.pop_due(self.now) {
            self.run(job);
        }

        if self.dirty {
            self.dirty = false;
            let snapshot = self.snapshot();
            self.outbox.push(Outbound::State(snapshot));
        }
    }

    /// Take everything produced since the last drain, in emission order.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    fn run(&mut self, job: Job) {
        match job {
            Job::PhysicsTick => self.physics_tick(),
            Job::NetworkTick => self.network_tick(),
            Job::Countdown => self.countdown_tick(),
            Job::AdvanceHole => self.advance_hole(),
            Job::AdvanceCourse => self.advance_course(),
        }
    }

    fn apply(&mut self, player_id: PlayerId, command: Command) {
        match command {
            Command::Join(identity) => self.join(player_id, identity),
            Command::ToggleReady => self.toggle_ready(player_id),
            Command::StartMatch(request) => self.request_start(player_id, request),
            Command::Stroke {
                dir_x,
                dir_z,
                power,
            } => self.handle_stroke(player_id, dir_x, dir_z, power),
            Command::UseModifier { kind, target } => self.use_modifier(player_id, kind, target),
            Command::ReturnToLobby => self.return_to_lobby(player_id),
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.outbox.push(Outbound::Notify(notification));
    }

    fn reject(&mut self, player_id: PlayerId, error: SessionError) {
        self.outbox.push(Outbound::Rejected { player_id, error });
    }

    // ------------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------------

    fn join(&mut self, player_id: PlayerId, identity: Identity) {
        if self.state.players.contains_key(&player_id) {
            debug!("player {player_id} joined twice");
            return;
        }

        let lobby_has_room = self.state.phase == Phase::Lobby
            && self.state.participant_count() < self.config.max_players;
        let player = if lobby_has_room {
            let color_index = self.next_color_index;
            self.next_color_index += 1;
            Player::new(player_id, identity, color_index)
        } else if self.state.spectator_count() < self.config.max_spectators {
            Player::spectator(player_id, identity)
        } else {
            warn!("refused join from player {player_id}: session full");
            self.reject(player_id, SessionError::SessionFull);
            return;
        };

        info!(
            "{} joined as {} {player_id}",
            player.display_name(),
            if player.spectator { "spectator" } else { "player" }
        );
        if !player.spectator && self.state.host.is_none() {
            self.state.host = Some(player_id);
        }
        self.state.players.insert(player_id, player.clone());

        let snapshot = self.snapshot();
        self.outbox.push(Outbound::Welcome {
            player_id,
            snapshot,
        });
        self.notify(Notification::PlayerJoined(player));
        self.dirty = true;
    }

    fn leave(&mut self, player_id: PlayerId) {
        let Some(player) = self.state.players.remove(&player_id) else {
            return;
        };
        info!("{} (player {player_id}) left", player.display_name());

        self.world.remove_body(player_id);
        self.modifiers.forget_player(player_id);
        self.safe_positions.remove(&player_id);
        self.scores.forget(player_id);
        if self.state.is_host(player_id) {
            self.state.host = self.state.first_participant();
        }
        self.notify(Notification::PlayerLeft { player_id });
        self.dirty = true;

        if self.state.participant_count() == 0 {
            info!("no players remain; resetting session");
            self.reset_match();
            if self.state.players.is_empty() {
                self.next_color_index = 0;
            }
            return;
        }

        if self.state.phase == Phase::Playing && self.state.all_finished() {
            self.end_hole();
        }
    }

    fn toggle_ready(&mut self, player_id: PlayerId) {
        if self.state.phase != Phase::Lobby {
            return;
        }
        let Some(player) = self
            .state
            .players
            .get_mut(&player_id)
            .filter(|p| !p.spectator)
        else {
            return;
        };
        player.ready = !player.ready;
        self.dirty = true;

        if self.config.auto_start_when_ready && self.state.all_ready() {
            info!("every player is ready; starting the default course");
            let course_id = self.config.default_course_id.clone();
            self.start_match(player_id, MatchRequest::Casual { course_id });
        }
    }

    // ------------------------------------------------------------------------
    // Match progression
    // ------------------------------------------------------------------------

    fn request_start(&mut self, player_id: PlayerId, request: MatchRequest) {
        if self.state.phase != Phase::Lobby || !self.state.is_host(player_id) {
            debug!("ignored start request from player {player_id}");
            return;
        }
        let request = match request {
            MatchRequest::Casual { course_id } if course_id.trim().is_empty() => {
                MatchRequest::Casual {
                    course_id: self.config.default_course_id.clone(),
                }
            }
            other => other,
        };
        self.start_match(player_id, request);
    }

    fn start_match(&mut self, initiator: PlayerId, request: MatchRequest) {
        let (mode, plan) = match request {
            MatchRequest::Casual { course_id } => match self.catalog.get_course(&course_id) {
                Some(course) => (MatchMode::Casual, vec![course]),
                None => {
                    warn!("course `{course_id}` not found");
                    self.reject(initiator, SessionError::CourseNotFound(course_id));
                    return;
                }
            },
            MatchRequest::Tournament { length } => {
                let mut courses = self.catalog.list_courses();
                if courses.is_empty() {
                    warn!("tournament requested with an empty catalogue");
                    self.reject(initiator, SessionError::NoCoursesAvailable);
                    return;
                }
                courses.shuffle(&mut self.rng);
                courses.truncate(length as usize);
                (MatchMode::Tournament, courses)
            }
        };

        info!("starting {} match over {} course(s)", mode.as_str(), plan.len());
        self.state.mode = mode;
        self.state.course_index = 0;
        self.state.total_courses = plan.len() as u32;
        self.course_plan = plan;
        self.scores.clear();
        for player in self.state.participants_mut() {
            player.total_strokes = 0;
        }
        self.start_course(0);
    }

    fn current_course(&self) -> Option<&Course> {
        self.course_plan.get(self.state.course_index as usize)
    }

    fn start_course(&mut self, index: u32) {
        let Some(course) = self.course_plan.get(index as usize) else {
            self.end_tournament();
            return;
        };
        info!(
            "course {} ({}/{}) starting",
            course.id,
            index + 1,
            self.course_plan.len()
        );
        self.state.course_id = course.id.clone();
        self.state.course_index = index;
        self.state.hole_index = 0;
        self.start_hole(0);
    }

    /// Load hole `index` of the current course, or end the course when the
    /// index is past the last hole. Safe to call repeatedly: balls, strokes
    /// and pickups are replaced, never accumulated.
    fn start_hole(&mut self, index: u32) {
        let Some(hole) = self
            .current_course()
            .and_then(|course| course.hole(index as usize))
            .cloned()
        else {
            self.end_course();
            return;
        };

        for job in HOLE_JOBS {
            self.scheduler.cancel(job);
        }
        self.scheduler.cancel(Job::AdvanceHole);
        self.scheduler.cancel(Job::AdvanceCourse);

        self.state.phase = Phase::Playing;
        self.state.hole_index = index;
        self.state.countdown_secs = self.config.hole_time_limit_secs;

        build_hole(&mut self.world, &hole);
        self.detector = Some(target_detector(&hole));
        self.world.clear_bodies();
        for player in self.state.participants_mut() {
            player.reset_for_hole();
            let offset = DVec3::new(
                f64::from(player.color_index) * self.config.tee_spacing,
                self.config.spawn_lift,
                0.0,
            );
            let spot = hole.tee + offset;
            self.world.add_body(player.id, spot);
            self.world.set_radius(player.id, player.ball_radius);
            player.position = spot;
        }
        self.safe_positions.clear();

        info!("hole {} (par {}) starting on {}", index + 1, hole.par, self.state.course_id);
        let spawned = self.modifiers.spawn_for_hole(&hole.modifier_spawns);
        self.notify(Notification::HoleStarted {
            hole_index: index,
            hole: Box::new(hole.clone()),
        });
        self.notify(Notification::Modifier(spawned));
        self.hole = Some(hole);

        let physics_period = self.config.physics_period();
        let network_period = Duration::from_secs(1) / self.config.network_rate_hz;
        let second = Duration::from_secs(1);
        self.scheduler
            .schedule_every(Job::PhysicsTick, self.now + physics_period, physics_period);
        self.scheduler
            .schedule_every(Job::NetworkTick, self.now + network_period, network_period);
        self.scheduler
            .schedule_every(Job::Countdown, self.now + second, second);
        self.last_physics_at = Some(self.now);
        self.dirty = true;
    }

    fn end_hole(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        for job in HOLE_JOBS {
            self.scheduler.cancel(job);
        }

        let cap = self.config.max_strokes_per_hole;
        let par = self.hole.as_ref().map_or(0, |h| h.par);
        for player in self.state.participants_mut() {
            if !player.finished_hole {
                player.strokes = cap;
                player.finished_hole = true;
            }
            player.total_strokes += player.strokes;
            self.scores.record(player.id, par, player.strokes);
        }
        self.state.phase = Phase::HoleReview;

        let hole_index = self.state.hole_index;
        debug!(
            "hole {} ended at physics tick {} (digest {:016x})",
            hole_index + 1,
            self.world.tick(),
            self.world.state_digest()
        );
        info!("hole {} ended", hole_index + 1);
        let scores = hole_leaderboard(self.state.players.values(), par);
        self.notify(Notification::HoleEnded {
            hole_index,
            par,
            scores,
        });

        self.scheduler
            .schedule_once(Job::AdvanceHole, self.now + self.review_delay());
        self.dirty = true;
    }

    fn advance_hole(&mut self) {
        if self.state.phase == Phase::HoleReview {
            self.start_hole(self.state.hole_index + 1);
        }
    }

    fn end_course(&mut self) {
        for job in HOLE_JOBS {
            self.scheduler.cancel(job);
        }
        self.clear_hole();
        self.state.phase = Phase::CourseEnd;

        let tournament = self.state.mode == MatchMode::Tournament;
        info!("course {} ended", self.state.course_id);
        let scores = course_leaderboard(self.state.players.values());
        self.notify(Notification::CourseEnded {
            scores,
            tournament,
            course_index: self.state.course_index,
            total_courses: self.state.total_courses,
        });

        if tournament {
            self.scheduler
                .schedule_once(Job::AdvanceCourse, self.now + self.review_delay());
        }
        self.dirty = true;
    }

    fn advance_course(&mut self) {
        if self.state.phase == Phase::CourseEnd && self.state.mode == MatchMode::Tournament {
            self.start_course(self.state.course_index + 1);
        }
    }

    fn end_tournament(&mut self) {
        for job in HOLE_JOBS {
            self.scheduler.cancel(job);
        }
        self.clear_hole();
        self.state.phase = Phase::TournamentEnd;

        info!("tournament ended");
        let scores = course_leaderboard(self.state.players.values());
        self.notify(Notification::TournamentEnded { scores });
        self.dirty = true;
    }

    fn return_to_lobby(&mut self, player_id: PlayerId) {
        if !self.state.phase.is_terminal() || !self.state.is_host(player_id) {
            debug!("ignored return to lobby from player {player_id}");
            return;
        }
        info!("returning to lobby");
        self.reset_match();
    }

    /// Cancel every job and drop all match progress. Players stay.
    fn reset_match(&mut self) {
        self.scheduler.cancel_all();
        self.state.reset_to_lobby();
        self.modifiers.clear();
        self.clear_hole();
        self.world.clear_static_geometry();
        self.course_plan.clear();
        self.scores.clear();
        self.dirty = true;
    }

    fn clear_hole(&mut self) {
        self.world.clear_bodies();
        self.hole = None;
        self.detector = None;
        self.safe_positions.clear();
        self.last_physics_at = None;
    }

    fn review_delay(&self) -> Duration {
        Duration::from_millis(self.config.review_delay_ms)
    }

    // ------------------------------------------------------------------------
    // Periodic jobs
    // ------------------------------------------------------------------------

    fn physics_tick(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let (Some(tee), Some(detector)) = (self.hole.as_ref().map(|h| h.tee), self.detector) else {
            return;
        };

        let elapsed = self
            .last_physics_at
            .map_or(Duration::ZERO, |last| self.now.saturating_sub(last));
        self.last_physics_at = Some(self.now);
        self.world.step(elapsed.as_secs_f64());

        for event in self.modifiers.tick(&mut self.state.players, self.now) {
            self.outbox.push(Outbound::Notify(Notification::Modifier(event)));
            self.dirty = true;
        }

        let lift = DVec3::new(0.0, self.config.spawn_lift, 0.0);
        let active: Vec<PlayerId> = self
            .state
            .participants()
            .filter(|p| !p.finished_hole)
            .map(|p| p.id)
            .collect();

        let mut hole_complete = false;
        for id in active {
            let Some(player) = self.state.players.get_mut(&id) else {
                continue;
            };
            self.world.set_radius(id, player.ball_radius);
            let Some(position) = self.world.position(id) else {
                continue;
            };

            let at_rest = self.world.is_at_rest(id);
            if player.at_rest != at_rest {
                player.at_rest = at_rest;
                self.dirty = true;
            }

            if let Some(event) = self.modifiers.check_pickup(player, position.x, position.z) {
                self.outbox.push(Outbound::Notify(Notification::Modifier(event)));
                self.dirty = true;
            }

            if position.y < self.config.fall_threshold_y {
                let respawn = self.safe_positions.get(&id).copied().unwrap_or(tee) + lift;
                self.world.set_position(id, respawn);
                player.position = respawn;
                player.strokes += 1;
                player.at_rest = false;
                self.dirty = true;
                debug!("player {id} fell off the course; penalty stroke");
                continue;
            }

            if at_rest && position.y > self.config.safe_ground_y {
                self.safe_positions.insert(id, position);
            }

            let speed = self.world.linear_speed(id).unwrap_or(0.0);
            let holed = detector.contains(position, speed);
            let capped = at_rest && player.strokes >= self.config.max_strokes_per_hole;
            if !holed && !capped {
                continue;
            }

            player.finished_hole = true;
            player.at_rest = true;
            player.position = HIDDEN_POSITION;
            self.world.park(id, HIDDEN_POSITION);
            self.dirty = true;

            if holed {
                info!("{} holed out in {}", player.display_name(), player.strokes);
                let holed_out = Notification::HoledOut {
                    player_id: id,
                    username: player.display_name().to_string(),
                    strokes: player.strokes,
                };
                self.outbox.push(Outbound::Notify(holed_out));
            } else {
                info!("{} reached the stroke cap", player.display_name());
            }

            if self.state.all_finished() {
                hole_complete = true;
                break;
            }
        }

        if hole_complete {
            self.end_hole();
        }
    }

    fn network_tick(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let mut batch = PositionBatch::default();
        for player in self.state.participants_mut().filter(|p| !p.finished_hole) {
            if let Some(position) = self.world.position(player.id) {
                player.position = position;
                batch.positions.insert(player.id, position.into());
            }
        }
        if !batch.positions.is_empty() {
            self.outbox.push(Outbound::Positions(batch));
        }
    }

    fn countdown_tick(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        self.state.countdown_secs = self.state.countdown_secs.saturating_sub(1);
        self.dirty = true;
        if self.state.countdown_secs == 0 {
            info!("hole time expired");
            self.end_hole();
        }
    }

    // ------------------------------------------------------------------------
    // Gameplay commands
    // ------------------------------------------------------------------------

    fn handle_stroke(&mut self, player_id: PlayerId, dir_x: f64, dir_z: f64, power: f64) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let Some(player) = self.state.players.get_mut(&player_id) else {
            return;
        };
        if player.spectator || !player.at_rest || player.finished_hole {
            debug!("ignored stroke from player {player_id}");
            return;
        }

        player.strokes += 1;
        player.at_rest = false;

        let mut multiplier = 1.0;
        let (mut dir_x, mut dir_z) = (dir_x, dir_z);
        if std::mem::take(&mut player.effects.power_shot) {
            multiplier = self.config.power_shot_multiplier;
        }
        if std::mem::take(&mut player.effects.reversiball) {
            dir_x = -dir_x;
            dir_z = -dir_z;
        }
        player.effects.steady_aim = false;

        let impulse = self
            .stroke
            .strike(&mut self.world, player_id, dir_x, dir_z, power, multiplier);
        debug!(
            "player {player_id} stroke {} impulse {impulse:?}",
            player.strokes
        );
        self.dirty = true;
    }

    fn use_modifier(&mut self, player_id: PlayerId, kind: ModifierKind, target: Option<PlayerId>) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let result = self
            .modifiers
            .use_modifier(&mut self.state.players, player_id, kind, target, self.now);
        match result {
            Ok(event) => {
                if kind == ModifierKind::Rewind {
                    self.rewind(player_id);
                }
                debug!("player {player_id} used {}", kind.as_str());
                self.notify(Notification::Modifier(event));
                self.dirty = true;
            }
            Err(rejection) => {
                debug!("player {player_id} could not use {}: {rejection:?}", kind.as_str());
            }
        }
    }

    /// Return the ball to its last safe position and refund a stroke. With
    /// no safe position recorded this hole, nothing changes.
    fn rewind(&mut self, player_id: PlayerId) {
        let Some(player) = self.state.players.get_mut(&player_id) else {
            return;
        };
        if player.finished_hole {
            return;
        }
        if let Some(safe) = self.safe_positions.get(&player_id) {
            let position = *safe + DVec3::new(0.0, self.config.spawn_lift, 0.0);
            self.world.set_position(player_id, position);
            player.position = position;
            player.strokes = player.strokes.saturating_sub(1);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
