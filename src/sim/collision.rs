//! Collision detection
//!
//! Axis-aligned checks between the agent box, the ceiling, the floor and the
//! blockers above and below each obstacle gap.

use serde::{Deserialize, Serialize};

use super::state::{Agent, Obstacle};

/// What the agent hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Collision {
    Ceiling,
    Floor,
    Obstacle { id: u32 },
}

/// Check the agent against ceiling, floor and every obstacle it overlaps
/// horizontally. Ceiling wins over floor, floor over obstacles.
pub fn check_collision(agent: &Agent, obstacles: &[Obstacle], floor: f32) -> Option<Collision> {
    if agent.y() <= 0.0 {
        return Some(Collision::Ceiling);
    }

    if agent.bottom() >= floor {
        return Some(Collision::Floor);
    }

    obstacles
        .iter()
        .filter(|o| overlaps_horizontally(agent, o))
        .find(|o| agent.y() < o.gap_top || agent.bottom() > o.gap_bottom)
        .map(|o| Collision::Obstacle { id: o.id })
}

#[inline]
fn overlaps_horizontally(agent: &Agent, obstacle: &Obstacle) -> bool {
    obstacle.x < agent.x() + agent.width() && obstacle.trailing_edge() > agent.x()
}
