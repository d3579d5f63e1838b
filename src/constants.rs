use crate::types::{AdversaryBehavior, Direction};

/// Nominal external tick cadence used by the socket adapter.
pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const DEFAULT_WIDTH: usize = 20;
pub const DEFAULT_HEIGHT: usize = 20;
pub const MAX_GRID_SIDE: usize = 128;
pub const DEFAULT_TILE_SIZE: u32 = 20;

pub const BASE_SPEED: f64 = 0.15;
/// Ceiling on any actor's per-tick speed; half a tile keeps the lookahead probe
/// from jumping over a wall tile.
pub const MAX_TICK_SPEED: f64 = 0.5;
pub const VULNERABLE_SPEED_FACTOR: f64 = 0.5;

pub const POWER_MODE_TICKS: u32 = 600;
pub const PELLET_POINTS: u32 = 10;
pub const POWER_PELLET_POINTS: u32 = 50;
pub const BASE_CAPTURE_POINTS: u32 = 200;
pub const CAPTURE_DISTANCE: f64 = 0.8;
pub const INITIAL_HIGH_SCORE: u32 = 10_000;

// Empirical tuning values. Gameplay feel depends on them; adjust, don't derive.
pub const DECISION_WINDOW_FACTOR: f64 = 1.1;
pub const REDECIDE_CHANCE: f32 = 0.1;
pub const PURSUIT_CHANCE: f32 = 0.8;
pub const LOOKAHEAD: f64 = 0.49;
pub const CENTER_SNAP_TOLERANCE: f64 = 0.1;

// Spawn marker `4` at (10, 9) opens a tile that is wall in the classic maze.
pub const DEFAULT_LAYOUT: [&str; DEFAULT_HEIGHT] = [
    "####################",
    "#........#.........#",
    "#.##.###.#.###.##.##",
    "#o##.###.#.###.##o##",
    "#..................#",
    "#.##.#.#####.#.##.##",
    "#....#...#...#.....#",
    "####.### # ###.#####",
    "   #.#   12  #.#    ",
    "####.# ##34# #.#####",
    "#   .  #   #  .    #",
    "####.# ##### #.#####",
    "#....#...#...#.....#",
    "#.##.###.#.###.##.##",
    "#o.#.....P.....#.o##",
    "##.#.#.#####.#.#.###",
    "#....#...#...#.....#",
    "#.######.#.######.##",
    "#..................#",
    "####################",
];

/// Name, behavior, speed multiplier and spawn heading of the stock adversaries.
pub const DEFAULT_ADVERSARIES: [(&str, AdversaryBehavior, f64, Direction); 4] = [
    ("blinky", AdversaryBehavior::Pursuit, 0.9, Direction::Right),
    ("pinky", AdversaryBehavior::Ambush, 0.85, Direction::Left),
    ("inky", AdversaryBehavior::Erratic, 0.8, Direction::Right),
    ("clyde", AdversaryBehavior::Erratic, 0.8, Direction::Left),
];
