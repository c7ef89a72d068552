//! Obstacle track: advance, retire, spawn and target selection
//!
//! Obstacles are kept sorted by ascending x. Retirement removes from the
//! front and spawning appends behind the last obstacle, so the order holds
//! without re-sorting. Authored obstacles past the lookahead count wait in a
//! queue, scrolling with the track, and are promoted before any gap is
//! generated.

use std::collections::VecDeque;

use rand::Rng;
use rand::distr::{Distribution, Uniform};

use super::state::Obstacle;
use crate::settings::TrackSettings;

#[derive(Debug, Clone)]
pub struct Track {
    obstacles: Vec<Obstacle>,
    /// Authored obstacles not yet on the track, ascending x
    pending: VecDeque<Obstacle>,
    next_id: u32,
    /// Levels authored without obstacles never spawn any
    endless: bool,
}

impl Track {
    /// Wrap an x-sorted obstacle list, keeping at most `lookahead` of them
    /// on the track
    pub fn new(mut obstacles: Vec<Obstacle>, lookahead: usize) -> Self {
        debug_assert!(obstacles.windows(2).all(|w| w[0].x <= w[1].x));
        let next_id = obstacles.iter().map(|o| o.id + 1).max().unwrap_or(0);
        let endless = !obstacles.is_empty();
        let visible = lookahead.min(obstacles.len());
        let pending = obstacles.split_off(visible).into();
        Self {
            obstacles,
            pending,
            next_id,
            endless,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Authored obstacles still waiting behind the lookahead window
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the track refills itself
    pub fn is_endless(&self) -> bool {
        self.endless
    }

    /// Move every obstacle, queued ones included, left by `speed`
    pub fn advance(&mut self, speed: f32) {
        for obstacle in self.obstacles.iter_mut().chain(self.pending.iter_mut()) {
            obstacle.x -= speed;
        }
    }

    /// Drop obstacles whose trailing edge has reached `retire_x`.
    /// Returns the number removed.
    pub fn retire(&mut self, retire_x: f32) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.trailing_edge() > retire_x);
        before - self.obstacles.len()
    }

    /// Append obstacles until the track holds `settings.lookahead` of them.
    ///
    /// Queued authored obstacles come first, at their scrolled position.
    /// After that, new obstacles go `spacing` past the last one, or at
    /// `start_x` on an empty track, with a gap centre drawn from `gap_band`
    /// and shifted up if it would crowd the floor. Returns the number added.
    pub fn spawn_if_needed<R: Rng>(
        &mut self,
        settings: &TrackSettings,
        gap_band: &Uniform<f32>,
        start_x: f32,
        floor: f32,
        rng: &mut R,
    ) -> usize {
        if !self.endless {
            return 0;
        }

        let mut spawned = 0;
        while self.obstacles.len() < settings.lookahead {
            if let Some(queued) = self.pending.pop_front() {
                self.obstacles.push(queued);
                spawned += 1;
                continue;
            }

            let x = self
                .obstacles
                .last()
                .map_or(start_x, |last| last.x + settings.spacing);
            let gap_center = gap_band.sample(rng);

            let id = self.next_id;
            self.next_id += 1;
            self.obstacles.push(Obstacle::from_gap(
                id,
                x,
                settings.obstacle_width,
                gap_center,
                settings.spawn_gap_height,
                floor,
                settings.floor_clearance,
            ));
            spawned += 1;
        }
        spawned
    }

    /// First obstacle whose trailing edge is still strictly ahead of `agent_x`
    pub fn current_target(&self, agent_x: f32) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.trailing_edge() > agent_x)
    }
}
