//! World configuration
//!
//! Every field has a default from [`crate::consts`], so a JSON file only has
//! to name the values it overrides.

use std::path::Path;

use rand::distr::Uniform;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Agent body and jump parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Fixed horizontal position
    pub x: f32,
    pub width: f32,
    pub height: f32,
    /// Velocity written on a jump (negative is up)
    pub jump_impulse: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            x: AGENT_X,
            width: AGENT_WIDTH,
            height: AGENT_HEIGHT,
            jump_impulse: JUMP_IMPULSE,
        }
    }
}

/// Obstacle track parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    pub obstacle_width: f32,
    /// Obstacles kept on the track by endless spawning
    pub lookahead: usize,
    pub spacing: f32,
    pub retire_x: f32,
    /// Minimum gap between a gap's lower edge and the floor
    pub floor_clearance: f32,
    pub spawn_gap_height: f32,
    pub gap_center_min: f32,
    pub gap_center_max: f32,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            obstacle_width: OBSTACLE_WIDTH,
            lookahead: LOOKAHEAD_COUNT,
            spacing: OBSTACLE_SPACING,
            retire_x: RETIRE_X,
            floor_clearance: FLOOR_CLEARANCE,
            spawn_gap_height: SPAWN_GAP_HEIGHT,
            gap_center_min: SPAWN_GAP_CENTER_MIN,
            gap_center_max: SPAWN_GAP_CENTER_MAX,
        }
    }
}

impl TrackSettings {
    /// Sampler for spawned gap centres
    pub fn gap_band(&self) -> Result<Uniform<f32>, ConfigError> {
        Uniform::new_inclusive(self.gap_center_min, self.gap_center_max).map_err(|err| {
            ConfigError::invalid(
                "track.gap_center_max",
                format!(
                    "cannot sample {}..={}: {}",
                    self.gap_center_min, self.gap_center_max, err
                ),
            )
        })
    }
}

/// Complete world configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub screen_width: f32,
    pub screen_height: f32,
    pub gravity: f32,
    pub pipe_speed: f32,
    pub agent: AgentSettings,
    pub track: TrackSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            gravity: GRAVITY,
            pipe_speed: PIPE_SPEED,
            agent: AgentSettings::default(),
            track: TrackSettings::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Vertical midline used by the autopilot to split high and low gaps
    pub fn midline(&self) -> f32 {
        self.screen_height / 2.0
    }

    /// Agent starting altitude
    pub fn start_y(&self) -> f32 {
        (self.screen_height / 2.0).floor()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("screen_width", self.screen_width)?;
        positive("screen_height", self.screen_height)?;
        finite("gravity", self.gravity)?;
        finite("pipe_speed", self.pipe_speed)?;
        finite("agent.x", self.agent.x)?;
        positive("agent.width", self.agent.width)?;
        positive("agent.height", self.agent.height)?;
        finite("agent.jump_impulse", self.agent.jump_impulse)?;

        let track = &self.track;
        positive("track.obstacle_width", track.obstacle_width)?;
        positive("track.spacing", track.spacing)?;
        finite("track.retire_x", track.retire_x)?;
        finite("track.floor_clearance", track.floor_clearance)?;
        positive("track.spawn_gap_height", track.spawn_gap_height)?;
        finite("track.gap_center_min", track.gap_center_min)?;
        finite("track.gap_center_max", track.gap_center_max)?;
        if track.lookahead == 0 {
            return Err(ConfigError::invalid("track.lookahead", "must be at least 1"));
        }
        if track.gap_center_min > track.gap_center_max {
            return Err(ConfigError::invalid(
                "track.gap_center_min",
                format!(
                    "{} exceeds gap_center_max {}",
                    track.gap_center_min, track.gap_center_max
                ),
            ));
        }
        track.gap_band()?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a finite number"))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {value}")))
    }
}
