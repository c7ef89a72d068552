//! Score tracking keyed by obstacle identity

use std::collections::BTreeSet;

use super::state::Obstacle;

/// Remembers which obstacles have already been credited
#[derive(Debug, Clone, Default)]
pub struct ScoreTracker {
    credited: BTreeSet<u32>,
}

impl ScoreTracker {
    /// Credit the first uncredited obstacle whose trailing edge has passed
    /// `agent_x`. At most one obstacle is credited per call; a second one
    /// passing on the same tick is picked up on the next call.
    ///
    /// Ids that are no longer on the track are forgotten.
    pub fn update(&mut self, obstacles: &[Obstacle], agent_x: f32) -> Option<u32> {
        self.credited
            .retain(|id| obstacles.iter().any(|o| o.id == *id));

        let passed = obstacles
            .iter()
            .find(|o| o.trailing_edge() < agent_x && !self.credited.contains(&o.id))?;
        self.credited.insert(passed.id);
        Some(passed.id)
    }

    pub fn is_credited(&self, id: u32) -> bool {
        self.credited.contains(&id)
    }
}
