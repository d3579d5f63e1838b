use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_CAPTURE_POINTS, BASE_SPEED, CAPTURE_DISTANCE, DEFAULT_ADVERSARIES, DEFAULT_HEIGHT,
    DEFAULT_LAYOUT, DEFAULT_TILE_SIZE, DEFAULT_WIDTH, INITIAL_HIGH_SCORE, PELLET_POINTS,
    POWER_MODE_TICKS, POWER_PELLET_POINTS, VULNERABLE_SPEED_FACTOR,
};
use crate::error::ConfigError;
use crate::types::{AdversaryBehavior, Direction};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub pellet: u32,
    #[serde(rename = "powerPellet")]
    pub power_pellet: u32,
    #[serde(rename = "baseCapture")]
    pub base_capture: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            pellet: PELLET_POINTS,
            power_pellet: POWER_PELLET_POINTS,
            base_capture: BASE_CAPTURE_POINTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdversaryProfile {
    pub name: String,
    pub behavior: AdversaryBehavior,
    #[serde(rename = "speedMultiplier")]
    pub speed_multiplier: f64,
    /// Heading at spawn and after every capture.
    pub heading: Direction,
}

/// Everything a session needs at construction. Never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    /// Pixels per tile; only renderers care.
    #[serde(rename = "tileSize")]
    pub tile_size: u32,
    #[serde(rename = "baseSpeed")]
    pub base_speed: f64,
    #[serde(rename = "playerSpeedMultiplier")]
    pub player_speed_multiplier: f64,
    #[serde(rename = "vulnerableSpeedFactor")]
    pub vulnerable_speed_factor: f64,
    #[serde(rename = "powerModeTicks")]
    pub power_mode_ticks: u32,
    pub scoring: ScoringConfig,
    #[serde(rename = "captureDistance")]
    pub capture_distance: f64,
    #[serde(rename = "initialHighScore")]
    pub initial_high_score: u32,
    pub adversaries: Vec<AdversaryProfile>,
    pub layout: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tile_size: DEFAULT_TILE_SIZE,
            base_speed: BASE_SPEED,
            player_speed_multiplier: 1.0,
            vulnerable_speed_factor: VULNERABLE_SPEED_FACTOR,
            power_mode_ticks: POWER_MODE_TICKS,
            scoring: ScoringConfig::default(),
            capture_distance: CAPTURE_DISTANCE,
            initial_high_score: INITIAL_HIGH_SCORE,
            adversaries: DEFAULT_ADVERSARIES
                .iter()
                .map(|(name, behavior, speed_multiplier, heading)| AdversaryProfile {
                    name: name.to_string(),
                    behavior: *behavior,
                    speed_multiplier: *speed_multiplier,
                    heading: *heading,
                })
                .collect(),
            layout: DEFAULT_LAYOUT.iter().map(|row| row.to_string()).collect(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&raw)?)
    }

    pub fn player_speed(&self) -> f64 {
        self.base_speed * self.player_speed_multiplier
    }

    pub fn adversary_speed(&self, profile: &AdversaryProfile) -> f64 {
        self.base_speed * profile.speed_multiplier
    }
}
