//! Flappy Pilot - a side-scrolling gap runner with an autopilot
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, obstacle track, collisions, scoring)
//! - `policy`: Decision policies and the navigation heuristic
//! - `level`: Level descriptors and the built-in level table
//! - `session`: Per-connection command surface over one simulation
//! - `settings`: World configuration

pub mod error;
pub mod level;
pub mod policy;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LevelError, PolicyError};
pub use level::{LevelCatalog, LevelDescriptor};
pub use policy::{NavigationHeuristic, Policy, PolicyHandle};
pub use session::{Command, Mode, Response, Session};
pub use settings::Settings;

/// Default world constants
pub mod consts {
    /// Playfield dimensions
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;

    /// Downward acceleration added to the agent velocity every tick
    pub const GRAVITY: f32 = 0.5;
    /// Leftward obstacle movement per tick
    pub const PIPE_SPEED: f32 = 3.0;

    /// Agent defaults
    pub const AGENT_X: f32 = 100.0;
    pub const AGENT_WIDTH: f32 = 30.0;
    pub const AGENT_HEIGHT: f32 = 30.0;
    /// Velocity written on a jump (negative is up)
    pub const JUMP_IMPULSE: f32 = -8.0;

    /// Obstacle defaults
    pub const OBSTACLE_WIDTH: f32 = 50.0;
    /// Obstacles kept on the track once endless spawning kicks in
    pub const LOOKAHEAD_COUNT: usize = 4;
    /// Horizontal distance between consecutive spawned obstacles
    pub const OBSTACLE_SPACING: f32 = 250.0;
    /// Obstacles whose trailing edge reaches this x are dropped
    pub const RETIRE_X: f32 = -100.0;
    /// Minimum distance kept between a gap's lower edge and the floor
    pub const FLOOR_CLEARANCE: f32 = 10.0;
    /// Gap height of spawned obstacles
    pub const SPAWN_GAP_HEIGHT: f32 = 150.0;
    /// Spawned gap centres are drawn from this band
    pub const SPAWN_GAP_CENTER_MIN: f32 = 150.0;
    pub const SPAWN_GAP_CENTER_MAX: f32 = SCREEN_HEIGHT - 150.0;
}
