//! Read-only projections of the simulation
//!
//! Snapshots own their data, so neither a policy nor a renderer can reach
//! back into the running state.

use serde::{Deserialize, Serialize};

use super::state::{Obstacle, SimState};

/// Agent kinematics as seen by a decision policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentKinematics {
    pub x: f32,
    pub y: f32,
    pub height: f32,
    pub width: f32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub velocity: f32,
}

/// Input to [`crate::policy::Policy::decide`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSnapshot {
    pub agent: AgentKinematics,
    pub pipe_speed: f32,
    /// Next obstacle to clear, if any remain
    pub current_obstacle: Option<Obstacle>,
    pub obstacles: Vec<Obstacle>,
    pub gravity: f32,
    pub floor: f32,
}

/// Agent fields a renderer needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity: f32,
}

/// Per-tick state handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub agent: AgentView,
    pub obstacles: Vec<Obstacle>,
    pub score: u64,
    pub frame: u64,
    pub terminal: bool,
    pub screen_width: f32,
    pub screen_height: f32,
    pub floor: f32,
}

impl SimState {
    pub fn decision_snapshot(&self) -> DecisionSnapshot {
        let agent = &self.agent;
        DecisionSnapshot {
            agent: AgentKinematics {
                x: agent.x(),
                y: agent.y(),
                height: agent.height(),
                width: agent.width(),
                gravity: agent.gravity,
                jump_impulse: agent.jump_impulse,
                velocity: agent.velocity,
            },
            pipe_speed: self.pipe_speed,
            current_obstacle: self.current_target().cloned(),
            obstacles: self.obstacles().to_vec(),
            gravity: agent.gravity,
            floor: self.floor,
        }
    }

    pub fn render_snapshot(&self) -> RenderSnapshot {
        let agent = &self.agent;
        RenderSnapshot {
            agent: AgentView {
                x: agent.x(),
                y: agent.y(),
                width: agent.width(),
                height: agent.height(),
                velocity: agent.velocity,
            },
            obstacles: self.obstacles().to_vec(),
            score: self.score,
            frame: self.frame,
            terminal: self.is_terminal(),
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            floor: self.floor,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::level::LevelCatalog;
    use crate::settings::Settings;
    use crate::sim::SimState;

    #[test]
    fn test_decision_snapshot_wire_names() {
        let catalog = LevelCatalog::builtin();
        let (_, level) = catalog.resolve("simple");
        let state = SimState::load(level, &Settings::default(), 3).unwrap();
        let json = serde_json::to_value(state.decision_snapshot()).unwrap();

        assert_eq!(json["agent"]["jumpImpulse"], -8.0);
        assert_eq!(json["pipeSpeed"], 3.0);
        assert_eq!(json["currentObstacle"]["x"], 400.0);
        assert!(json["currentObstacle"]["gapTop"].is_number());
        assert_eq!(json["obstacles"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_render_snapshot_reflects_state() {
        let catalog = LevelCatalog::builtin();
        let (_, level) = catalog.resolve("floor_test");
        let state = SimState::load(level, &Settings::default(), 3).unwrap();
        let render = state.render_snapshot();

        assert_eq!(render.frame, 0);
        assert!(!render.terminal);
        assert_eq!(render.screen_height, 600.0);
        assert_eq!(render.floor, state.floor());

        let json = serde_json::to_value(&render).unwrap();
        assert!(json.get("screenWidth").is_some());
        assert!(json["obstacles"].as_array().is_some_and(Vec::is_empty));
    }

    #[test]
    fn test_no_target_once_everything_cleared() {
        let catalog = LevelCatalog::builtin();
        let (_, level) = catalog.resolve("floor_test");
        let state = SimState::load(level, &Settings::default(), 3).unwrap();
        assert!(state.decision_snapshot().current_obstacle.is_none());
    }
}
