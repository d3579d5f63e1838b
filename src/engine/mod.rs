use crate::config::{AdversaryProfile, SessionConfig};
use crate::constants::{
    CENTER_SNAP_TOLERANCE, DECISION_WINDOW_FACTOR, LOOKAHEAD, PURSUIT_CHANCE, REDECIDE_CHANCE,
};
use crate::error::ConfigError;
use crate::grid::TileGrid;
use crate::layout::{tile_center, StaticLayout};
use crate::rng::{RandomSource, Rng};
use crate::types::{
    check_speed, Actor, AdversaryBehavior, AdversaryView, BoardView, Collectible, Direction,
    GameEvent, Lifecycle, PlayerView, Snapshot, StepOutcome,
};

mod collision_system;
mod ghost_system;
mod motion_system;
mod power_system;
mod utils;

use self::ghost_system::choose_direction;
use self::utils::{capture_points, center_of, offset};

#[derive(Clone, Debug)]
struct PlayerInternal {
    actor: Actor,
    queued: Direction,
}

#[derive(Clone, Debug)]
struct AdversaryInternal {
    name: String,
    actor: Actor,
    behavior: AdversaryBehavior,
    vulnerable: bool,
    spawn: (f64, f64),
    spawn_dir: Direction,
}

impl AdversaryInternal {
    fn respawn(&mut self) {
        self.actor.place(self.spawn.0, self.spawn.1, self.spawn_dir);
        self.vulnerable = false;
    }

    fn view(&self) -> AdversaryView {
        AdversaryView {
            name: self.name.clone(),
            x: self.actor.x,
            y: self.actor.y,
            dir: self.actor.dir,
            behavior: self.behavior,
            vulnerable: self.vulnerable,
        }
    }
}

/// Score, power-mode countdown, capture streak and lifecycle of one session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    pub score: u32,
    pub high_score: u32,
    /// Ticks of vulnerability left; zero means power mode is off.
    pub vulnerability_timer: u32,
    pub capture_combo: u32,
    pub lifecycle: Lifecycle,
    pub tick: u64,
}

/// One self-contained game: grid, entities, state and the random source that
/// drives adversary decisions. Advanced only by [`GameSession::step`].
#[derive(Clone, Debug)]
pub struct GameSession<R: RandomSource = Rng> {
    config: SessionConfig,
    layout: StaticLayout,
    grid: TileGrid,
    state: SessionState,
    player: PlayerInternal,
    adversaries: Vec<AdversaryInternal>,
    events: Vec<GameEvent>,
    rng: R,
}

impl GameSession<Rng> {
    pub fn with_seed(config: SessionConfig, seed: u32) -> Result<Self, ConfigError> {
        Self::new(config, Rng::new(seed))
    }
}

impl<R: RandomSource> GameSession<R> {
    /// Validates `config` and builds an `Idle` session with the board loaded.
    pub fn new(config: SessionConfig, rng: R) -> Result<Self, ConfigError> {
        let layout = StaticLayout::parse(
            &config.layout,
            config.width,
            config.height,
            config.adversaries.len(),
        )?;
        if !config.capture_distance.is_finite() || config.capture_distance <= 0.0 {
            return Err(ConfigError::InvalidCaptureDistance(config.capture_distance));
        }
        let player = spawn_player(&layout, &config)?;
        let adversaries = config
            .adversaries
            .iter()
            .zip(&layout.adversary_spawns)
            .map(|(profile, cell)| spawn_adversary(profile, *cell, &config))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            grid: layout.build_grid(),
            state: SessionState {
                score: 0,
                high_score: config.initial_high_score,
                vulnerability_timer: 0,
                capture_combo: 0,
                lifecycle: Lifecycle::Idle,
                tick: 0,
            },
            player,
            adversaries,
            events: Vec::new(),
            config,
            layout,
            rng,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.state.lifecycle
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn player(&self) -> &Actor {
        &self.player.actor
    }

    pub fn adversaries(&self) -> impl Iterator<Item = &Actor> {
        self.adversaries.iter().map(|adversary| &adversary.actor)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.grid.remaining_collectibles()
    }

    /// Begins play from `Idle` with a full reset. Returns `false` in any other
    /// state.
    pub fn start(&mut self) -> bool {
        if self.state.lifecycle != Lifecycle::Idle {
            return false;
        }
        self.reset();
        self.state.lifecycle = Lifecycle::Playing;
        true
    }

    /// Drops back to `Idle` from any state and starts again immediately.
    pub fn restart(&mut self) {
        self.state.lifecycle = Lifecycle::Idle;
        self.start();
    }

    /// Records the latest directional intent. Only the most recent call before
    /// a tick counts. Ignored unless the session is playing.
    pub fn queue_intent(&mut self, dir: Direction) -> bool {
        if self.state.lifecycle != Lifecycle::Playing {
            return false;
        }
        self.player.queued = dir;
        true
    }

    pub fn step(&mut self) -> StepOutcome {
        if self.state.lifecycle != Lifecycle::Playing {
            return StepOutcome::Inactive;
        }
        self.state.tick += 1;

        self.update_power_mode();
        self.move_player();
        self.move_adversaries();
        self.collect_items();
        self.resolve_collisions();

        if self.state.lifecycle == Lifecycle::Playing && self.grid.remaining_collectibles() == 0 {
            self.finish(Lifecycle::Won);
        }
        StepOutcome::Advanced
    }

    /// Events accumulate until a call with `include_events` drains them.
    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let snapshot = Snapshot {
            tick: self.state.tick,
            lifecycle: self.state.lifecycle,
            score: self.state.score,
            high_score: self.state.high_score,
            vulnerability_timer: self.state.vulnerability_timer,
            capture_combo: self.state.capture_combo,
            remaining_collectibles: self.grid.remaining_collectibles(),
            player: PlayerView {
                x: self.player.actor.x,
                y: self.player.actor.y,
                dir: self.player.actor.dir,
                queued: self.player.queued,
            },
            adversaries: self.adversaries.iter().map(|a| a.view()).collect(),
            events: if include_events {
                self.events.clone()
            } else {
                Vec::new()
            },
        };
        if include_events {
            self.events.clear();
        }
        snapshot
    }

    pub fn board(&self) -> BoardView {
        BoardView {
            width: self.grid.width(),
            height: self.grid.height(),
            tile_size: self.config.tile_size,
            tiles: self.grid.rows(),
        }
    }

    fn reset(&mut self) {
        self.grid = self.layout.build_grid();
        let (x, y) = tile_center(self.layout.player_spawn);
        self.player.actor.place(x, y, Direction::None);
        self.player.queued = Direction::None;
        for adversary in &mut self.adversaries {
            adversary.respawn();
        }
        self.state.score = 0;
        self.state.vulnerability_timer = 0;
        self.state.capture_combo = 0;
        self.state.tick = 0;
        self.events.clear();
    }

    fn finish(&mut self, outcome: Lifecycle) {
        self.state.lifecycle = outcome;
        self.state.high_score = self.state.high_score.max(self.state.score);
        let score = self.state.score;
        self.events.push(match outcome {
            Lifecycle::Won => GameEvent::Won { score },
            _ => GameEvent::Lost { score },
        });
    }
}

fn spawn_player(layout: &StaticLayout, config: &SessionConfig) -> Result<PlayerInternal, ConfigError> {
    let (x, y) = tile_center(layout.player_spawn);
    Ok(PlayerInternal {
        actor: Actor::new(x, y, Direction::None, config.player_speed())?,
        queued: Direction::None,
    })
}

fn spawn_adversary(
    profile: &AdversaryProfile,
    cell: (usize, usize),
    config: &SessionConfig,
) -> Result<AdversaryInternal, ConfigError> {
    let speed = config.adversary_speed(profile);
    check_speed(speed * config.vulnerable_speed_factor)?;
    let spawn = tile_center(cell);
    Ok(AdversaryInternal {
        name: profile.name.clone(),
        actor: Actor::new(spawn.0, spawn.1, profile.heading, speed)?,
        behavior: profile.behavior,
        vulnerable: false,
        spawn,
        spawn_dir: profile.heading,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::rng::{Rng, ScriptedRng};
    use crate::types::{Direction, GameEvent, Lifecycle, StepOutcome, TileKind};

    pub(crate) fn default_session(seed: u32) -> GameSession {
        let mut session =
            GameSession::with_seed(SessionConfig::default(), seed).expect("default config is valid");
        assert!(session.start());
        session
    }

    pub(crate) fn place_player<R: RandomSource>(
        session: &mut GameSession<R>,
        x: f64,
        y: f64,
        dir: Direction,
    ) {
        session.player.actor.place(x, y, dir);
    }

    pub(crate) fn place_adversary<R: RandomSource>(
        session: &mut GameSession<R>,
        idx: usize,
        x: f64,
        y: f64,
        dir: Direction,
    ) {
        session.adversaries[idx].actor.place(x, y, dir);
    }

    pub(crate) fn tiny_config(rows: &[&str], adversaries: usize) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            width: rows[0].len(),
            height: rows.len(),
            layout: rows.iter().map(|row| row.to_string()).collect(),
            adversaries: defaults.adversaries[..adversaries].to_vec(),
            ..defaults
        }
    }

    #[test]
    fn new_session_is_idle_and_inert() {
        let mut session =
            GameSession::with_seed(SessionConfig::default(), 1).expect("default config is valid");
        assert_eq!(session.lifecycle(), Lifecycle::Idle);
        assert!(!session.queue_intent(Direction::Right));
        assert_eq!(session.step(), StepOutcome::Inactive);
        assert_eq!(session.state().tick, 0);
        assert_eq!(session.state().high_score, 10_000);
    }

    #[test]
    fn malformed_config_refuses_to_build() {
        let config = SessionConfig {
            base_speed: 0.9,
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::with_seed(config, 1),
            Err(ConfigError::SpeedOutOfRange { .. })
        ));

        let config = SessionConfig {
            layout: vec!["####".to_string()],
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::with_seed(config, 1),
            Err(ConfigError::RowCountMismatch { .. })
        ));

        let config = SessionConfig {
            capture_distance: 0.0,
            ..SessionConfig::default()
        };
        assert!(matches!(
            GameSession::with_seed(config, 1),
            Err(ConfigError::InvalidCaptureDistance(_))
        ));
    }

    #[test]
    fn start_only_fires_from_idle() {
        let mut session = default_session(2);
        assert_eq!(session.lifecycle(), Lifecycle::Playing);
        assert!(!session.start());
    }

    #[test]
    fn moving_right_from_spawn_eats_next_pellet() {
        let mut session = default_session(3);
        assert!(session.queue_intent(Direction::Right));
        for _ in 0..3 {
            session.step();
        }
        assert_eq!(session.state().score, 0);

        for _ in 0..4 {
            session.step();
        }
        assert_eq!(session.player().tile(), (10, 14));
        assert_eq!(session.player().dir(), Direction::Right);
        assert_eq!(session.state().score, 10);
        assert_eq!(session.grid().tile_at(10, 14), TileKind::Empty);
    }

    #[test]
    fn latest_intent_wins_between_ticks() {
        let mut session = default_session(4);
        session.queue_intent(Direction::Right);
        session.queue_intent(Direction::Up);
        session.queue_intent(Direction::Left);
        session.step();
        assert_eq!(session.player().dir(), Direction::Left);
        assert!(session.player().x() < 9.5);
    }

    #[test]
    fn closing_adversary_ends_session_as_lost() {
        let mut config = tiny_config(&["#####", "#P1.#", "#####"], 1);
        config.adversaries[0].heading = Direction::Left;
        config.adversaries[0].speed_multiplier = 1.0;
        let mut session = GameSession::new(config, ScriptedRng::new(vec![0.5]))
            .expect("tiny layout is valid");
        session.start();

        let mut ticks = 0;
        while session.step() == StepOutcome::Advanced {
            ticks += 1;
            assert!(ticks < 10, "adversary never reached the player");
        }
        assert_eq!(session.lifecycle(), Lifecycle::Lost);
        let snapshot = session.build_snapshot(true);
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, GameEvent::Lost { score: 0 })));
    }

    #[test]
    fn eating_last_pellet_wins() {
        let config = tiny_config(&["#######", "#P.#1 #", "#######"], 1);
        let mut session = GameSession::new(config, ScriptedRng::new(vec![0.5]))
            .expect("tiny layout is valid");
        session.start();
        session.queue_intent(Direction::Right);

        let mut remaining = session.remaining_collectibles();
        while session.step() == StepOutcome::Advanced {
            let now = session.remaining_collectibles();
            assert!(now <= remaining);
            remaining = now;
            if session.lifecycle() == Lifecycle::Playing {
                assert!(remaining > 0);
            }
            assert!(session.state().tick < 100);
        }
        assert_eq!(session.lifecycle(), Lifecycle::Won);
        assert_eq!(session.remaining_collectibles(), 0);
        assert_eq!(session.state().score, 10);

        let frozen = session.build_snapshot(false);
        assert_eq!(session.step(), StepOutcome::Inactive);
        let after = session.build_snapshot(false);
        assert_eq!(after.score, frozen.score);
        assert_eq!((after.player.x, after.player.y), (frozen.player.x, frozen.player.y));
    }

    #[test]
    fn loss_on_last_pellet_tick_stays_lost() {
        let mut config = tiny_config(&["######", "#P.1 #", "######"], 1);
        config.adversaries[0].heading = Direction::Left;
        config.adversaries[0].speed_multiplier = 1.2;
        let mut session = GameSession::new(config, ScriptedRng::new(vec![0.5]))
            .expect("tiny layout is valid");
        session.start();
        session.queue_intent(Direction::Right);

        while session.step() == StepOutcome::Advanced {
            assert!(session.state().tick < 10);
        }

        assert_eq!(session.state().tick, 4);
        assert_eq!(session.lifecycle(), Lifecycle::Lost);
        assert_eq!(session.remaining_collectibles(), 0);
        assert_eq!(session.state().score, 10);
        let events = session.build_snapshot(true).events;
        assert!(events.iter().any(|event| matches!(event, GameEvent::Lost { score: 10 })));
        assert!(!events.iter().any(|event| matches!(event, GameEvent::Won { .. })));
    }

    #[test]
    fn events_pile_up_until_drained() {
        let mut session = default_session(10);
        place_player(&mut session, 1.5, 1.5, Direction::None);
        session.collect_items();
        place_player(&mut session, 2.5, 1.5, Direction::None);
        session.collect_items();
        assert!(session.build_snapshot(false).events.is_empty());
        assert_eq!(session.build_snapshot(true).events.len(), 2);
    }

    #[test]
    fn terminal_score_raises_high_score() {
        let config = SessionConfig {
            initial_high_score: 0,
            ..SessionConfig::default()
        };
        let mut session = GameSession::with_seed(config, 5).expect("default config is valid");
        session.start();
        place_player(&mut session, 1.5, 1.5, Direction::None);
        session.collect_items();
        place_adversary(&mut session, 0, 1.5, 1.5, Direction::Right);
        session.resolve_collisions();

        assert_eq!(session.lifecycle(), Lifecycle::Lost);
        assert_eq!(session.state().high_score, 10);
    }

    #[test]
    fn restart_from_terminal_resets_board_but_keeps_high_score() {
        let config = SessionConfig {
            initial_high_score: 0,
            ..SessionConfig::default()
        };
        let mut session = GameSession::with_seed(config, 6).expect("default config is valid");
        session.start();
        let full = session.remaining_collectibles();
        place_player(&mut session, 1.5, 1.5, Direction::None);
        session.collect_items();
        place_adversary(&mut session, 0, 1.5, 1.5, Direction::Right);
        session.resolve_collisions();
        assert!(!session.start());

        session.restart();

        assert_eq!(session.lifecycle(), Lifecycle::Playing);
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().high_score, 10);
        assert_eq!(session.state().vulnerability_timer, 0);
        assert_eq!(session.state().capture_combo, 0);
        assert_eq!(session.remaining_collectibles(), full);
        assert_eq!((session.player().x(), session.player().y()), (9.5, 14.5));
        let snapshot = session.build_snapshot(false);
        assert_eq!(snapshot.adversaries[0].x, 9.5);
        assert_eq!(snapshot.adversaries[0].y, 8.5);
        assert_eq!(snapshot.adversaries[0].dir, Direction::Right);
    }

    #[test]
    fn snapshot_drains_events_once() {
        let mut session = default_session(7);
        place_player(&mut session, 1.5, 1.5, Direction::None);
        session.collect_items();
        let first = session.build_snapshot(true);
        let second = session.build_snapshot(true);
        assert_eq!(first.events.len(), 1);
        assert!(second.events.is_empty());
    }

    #[test]
    fn board_reflects_consumed_tiles() {
        let mut session = default_session(8);
        assert_eq!(&session.board().tiles[1][1..2], ".");
        place_player(&mut session, 1.5, 1.5, Direction::None);
        session.collect_items();
        let board = session.board();
        assert_eq!(board.width, 20);
        assert_eq!(board.tile_size, 20);
        assert_eq!(&board.tiles[1][1..2], " ");
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = default_session(424_242);
        let mut b = default_session(424_242);
        let mut intents = Rng::new(99);

        for tick in 0..2_000 {
            if tick % 15 == 0 {
                let dir = Direction::CARDINALS[intents.pick_index(4)];
                a.queue_intent(dir);
                b.queue_intent(dir);
            }
            let outcome_a = a.step();
            let outcome_b = b.step();
            assert_eq!(outcome_a, outcome_b);

            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);
            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lifecycle, sb.lifecycle);
            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.y.to_bits(), sb.player.y.to_bits());
            for (ga, gb) in sa.adversaries.iter().zip(sb.adversaries.iter()) {
                assert_eq!(ga.x.to_bits(), gb.x.to_bits());
                assert_eq!(ga.y.to_bits(), gb.y.to_bits());
                assert_eq!(ga.vulnerable, gb.vulnerable);
            }
            assert_eq!(sa.events, sb.events);
            if outcome_a == StepOutcome::Inactive {
                break;
            }
        }
    }

    #[test]
    fn long_run_keeps_invariants() {
        for seed in [1u32, 77, 2_024] {
            let mut session = default_session(seed);
            let mut intents = Rng::new(seed ^ 0x5eed);
            let width = session.grid().width() as f64;
            let height = session.grid().height() as f64;
            let mut remaining = session.remaining_collectibles();
            let mut score = session.state().score;

            for tick in 0..5_000 {
                if tick % 20 == 0 {
                    session.queue_intent(Direction::CARDINALS[intents.pick_index(4)]);
                }
                if session.step() == StepOutcome::Inactive {
                    break;
                }
                let actors = std::iter::once(session.player()).chain(session.adversaries());
                for actor in actors {
                    assert!(actor.x() >= -0.5 && actor.x() < width + 0.5);
                    assert!(actor.y() >= 0.0 && actor.y() < height);
                }
                let now = session.remaining_collectibles();
                assert!(now <= remaining);
                assert!(session.state().score >= score);
                if session.lifecycle() == Lifecycle::Playing {
                    assert!(now > 0);
                }
                if session.lifecycle() == Lifecycle::Won {
                    assert_eq!(now, 0);
                }
                remaining = now;
                score = session.state().score;
            }
        }
    }
}
