use serde::{Deserialize, Serialize};

use crate::constants::MAX_TICK_SPEED;
use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    /// Enumeration order used wherever candidates are scanned; ties resolve to
    /// the earlier entry.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn vector(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::None => (0, 0),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::None => Direction::None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Wall,
    Empty,
    Pellet,
    PowerPellet,
}

impl TileKind {
    pub fn symbol(self) -> char {
        match self {
            TileKind::Wall => '#',
            TileKind::Empty => ' ',
            TileKind::Pellet => '.',
            TileKind::PowerPellet => 'o',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collectible {
    Pellet,
    PowerPellet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdversaryBehavior {
    Pursuit,
    Ambush,
    Erratic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Idle,
    Playing,
    Won,
    Lost,
}

impl Lifecycle {
    pub fn is_terminal(self) -> bool {
        matches!(self, Lifecycle::Won | Lifecycle::Lost)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Advanced,
    /// The session was not `Playing`; nothing changed.
    Inactive,
}

/// Continuous motion state shared by the player and adversaries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Actor {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) dir: Direction,
    speed: f64,
}

impl Actor {
    pub fn new(x: f64, y: f64, dir: Direction, speed: f64) -> Result<Self, ConfigError> {
        check_speed(speed)?;
        Ok(Self { x, y, dir, speed })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn dir(&self) -> Direction {
        self.dir
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn tile(&self) -> (i32, i32) {
        (self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance_to(&self, other: &Actor) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub(crate) fn place(&mut self, x: f64, y: f64, dir: Direction) {
        self.x = x;
        self.y = y;
        self.dir = dir;
    }
}

pub(crate) fn check_speed(speed: f64) -> Result<(), ConfigError> {
    if !speed.is_finite() || speed <= 0.0 || speed > MAX_TICK_SPEED {
        return Err(ConfigError::SpeedOutOfRange {
            speed,
            max: MAX_TICK_SPEED,
        });
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f64,
    pub y: f64,
    pub dir: Direction,
    pub queued: Direction,
}

#[derive(Clone, Debug, Serialize)]
pub struct AdversaryView {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub dir: Direction,
    pub behavior: AdversaryBehavior,
    pub vulnerable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PelletEaten {
        col: i32,
        row: i32,
    },
    PowerPelletEaten {
        col: i32,
        row: i32,
    },
    PowerModeStarted {
        ticks: u32,
    },
    PowerModeEnded,
    AdversaryCaptured {
        adversary: usize,
        name: String,
        points: u32,
    },
    PlayerCaught {
        adversary: usize,
        name: String,
    },
    Won {
        score: u32,
    },
    Lost {
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct BoardView {
    pub width: usize,
    pub height: usize,
    #[serde(rename = "tileSize")]
    pub tile_size: u32,
    pub tiles: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub lifecycle: Lifecycle,
    pub score: u32,
    #[serde(rename = "highScore")]
    pub high_score: u32,
    #[serde(rename = "vulnerabilityTimer")]
    pub vulnerability_timer: u32,
    #[serde(rename = "captureCombo")]
    pub capture_combo: u32,
    #[serde(rename = "remainingCollectibles")]
    pub remaining_collectibles: usize,
    pub player: PlayerView,
    pub adversaries: Vec<AdversaryView>,
    pub events: Vec<GameEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverse_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_ne!(dir.reverse(), dir);
            assert_eq!(dir.reverse().reverse(), dir);
        }
        assert_eq!(Direction::None.reverse(), Direction::None);
    }

    #[test]
    fn cardinal_vectors_are_unit_length() {
        for dir in Direction::CARDINALS {
            let (dx, dy) = dir.vector();
            assert_eq!(dx.abs() + dy.abs(), 1);
        }
        assert_eq!(Direction::None.vector(), (0, 0));
    }

    #[test]
    fn parse_move_rejects_unknown_values() {
        assert_eq!(Direction::parse_move("left"), Some(Direction::Left));
        assert_eq!(Direction::parse_move("none"), Some(Direction::None));
        assert_eq!(Direction::parse_move("diagonal"), None);
        assert_eq!(Direction::parse_move("Left"), None);
    }

    #[test]
    fn actor_rejects_speed_outside_ceiling() {
        assert!(Actor::new(1.5, 1.5, Direction::Up, 0.15).is_ok());
        assert!(Actor::new(1.5, 1.5, Direction::Up, MAX_TICK_SPEED).is_ok());
        assert!(Actor::new(1.5, 1.5, Direction::Up, 0.0).is_err());
        assert!(Actor::new(1.5, 1.5, Direction::Up, -0.1).is_err());
        assert!(Actor::new(1.5, 1.5, Direction::Up, 0.75).is_err());
        assert!(Actor::new(1.5, 1.5, Direction::Up, f64::NAN).is_err());
    }

    #[test]
    fn actor_tile_floors_negative_coordinates() {
        let actor = Actor::new(-0.25, 3.75, Direction::Left, 0.15).expect("valid actor");
        assert_eq!(actor.tile(), (-1, 3));
    }

    #[test]
    fn game_events_serialize_with_type_tag() {
        let value = serde_json::to_value(GameEvent::PelletEaten { col: 3, row: 4 })
            .expect("event should serialize");
        assert_eq!(value["type"], "pellet_eaten");
        assert_eq!(value["col"], 3);
    }
}
