//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One frame per tick, no wall-clock time
//! - Seeded RNG only
//! - Obstacles kept in ascending x order
//! - No rendering, transport or policy dependencies

pub mod collision;
pub mod score;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod track;

pub use collision::{Collision, check_collision};
pub use score::ScoreTracker;
pub use snapshot::{AgentKinematics, AgentView, DecisionSnapshot, RenderSnapshot};
pub use state::{Agent, Obstacle, RunPhase, SimState};
pub use tick::{TickOutcome, tick};
pub use track::Track;
