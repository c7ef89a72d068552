//! Simulation state and core entity types
//!
//! A `SimState` is built wholesale by [`SimState::load`] and afterwards only
//! mutated by [`super::tick`].

use glam::Vec2;
use rand::SeedableRng;
use rand::distr::{Distribution, Uniform};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::score::ScoreTracker;
use super::track::Track;
use crate::error::LevelError;
use crate::level::LevelDescriptor;
use crate::settings::{Settings, TrackSettings};

/// Run lifecycle. `Running -> Terminal` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Running,
    /// Frozen after a collision
    Terminal,
}

/// The falling agent
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    /// `x` is fixed for the whole run, `y` is the top edge
    pub pos: Vec2,
    /// Vertical velocity (positive is down)
    pub velocity: f32,
    /// Width and height
    pub size: Vec2,
    pub gravity: f32,
    pub jump_impulse: f32,
}

impl Agent {
    pub fn new(x: f32, y: f32, size: Vec2, gravity: f32, jump_impulse: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            velocity: 0.0,
            size,
            gravity,
            jump_impulse,
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Bottom edge
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Overwrite velocity with the jump impulse (no stacking, no clamp)
    pub fn apply_impulse(&mut self) {
        self.velocity = self.jump_impulse;
    }

    /// Advance one tick: gravity first, then position
    pub fn integrate(&mut self, gravity: f32) {
        self.velocity += gravity;
        self.pos.y += self.velocity;
    }
}

/// A vertical obstacle with a single gap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obstacle {
    /// Stable identity, never reused within a run
    pub id: u32,
    /// Leading (left) edge
    pub x: f32,
    pub width: f32,
    /// Lower y of the upper blocker
    pub gap_top: f32,
    /// Upper y of the lower blocker
    pub gap_bottom: f32,
}

impl Obstacle {
    /// Build an obstacle from a gap centre and height, shifting the gap up
    /// when its lower edge would sit closer than `clearance` to the floor.
    pub fn from_gap(
        id: u32,
        x: f32,
        width: f32,
        gap_center: f32,
        gap_height: f32,
        floor: f32,
        clearance: f32,
    ) -> Self {
        let mut gap_top = gap_center - gap_height / 2.0;
        let mut gap_bottom = gap_center + gap_height / 2.0;
        let limit = floor - clearance;
        if gap_bottom > limit {
            let overflow = gap_bottom - limit;
            gap_top -= overflow;
            gap_bottom -= overflow;
        }
        Self {
            id,
            x,
            width,
            gap_top,
            gap_bottom,
        }
    }

    /// Trailing (right) edge
    #[inline]
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn gap_height(&self) -> f32 {
        self.gap_bottom - self.gap_top
    }

    #[inline]
    pub fn gap_center(&self) -> f32 {
        (self.gap_top + self.gap_bottom) / 2.0
    }
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct SimState {
    pub(crate) agent: Agent,
    pub(crate) track: Track,
    pub(crate) floor: f32,
    pub(crate) frame: u64,
    pub(crate) score: u64,
    pub(crate) phase: RunPhase,
    pub(crate) pipe_speed: f32,
    pub(crate) screen_width: f32,
    pub(crate) screen_height: f32,
    pub(crate) track_settings: TrackSettings,
    /// Sampler for spawned gap centres
    pub(crate) gap_band: Uniform<f32>,
    pub(crate) scorer: ScoreTracker,
    /// Seed the run was built from (reset replays it)
    seed: u64,
    pub(crate) rng: Pcg32,
}

impl SimState {
    /// Build a fresh running state from a level descriptor.
    ///
    /// The floor is drawn from the descriptor's floor range with an RNG
    /// seeded from `seed`; the same RNG later feeds spawned gaps, so equal
    /// inputs always give an identical run.
    pub fn load(
        descriptor: &LevelDescriptor,
        settings: &Settings,
        seed: u64,
    ) -> Result<Self, LevelError> {
        descriptor.validate()?;
        settings.validate()?;
        let gap_band = settings.track.gap_band()?;

        let mut rng = Pcg32::seed_from_u64(seed);
        let floor = descriptor.floor_range.sampler()?.sample(&mut rng);

        let track_settings = settings.track.clone();
        let mut specs: Vec<_> = descriptor.obstacles.iter().enumerate().collect();
        // Stable sort keeps authoring order for equal x
        specs.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));

        let mut obstacles = Vec::with_capacity(specs.len());
        for (id, (index, spec)) in specs.into_iter().enumerate() {
            let obstacle = Obstacle::from_gap(
                id as u32,
                spec.x,
                track_settings.obstacle_width,
                spec.gap_center_y,
                spec.gap_height,
                floor,
                track_settings.floor_clearance,
            );
            if obstacle.gap_top >= obstacle.gap_bottom {
                return Err(LevelError::ClippedGapInverted {
                    index,
                    gap_top: obstacle.gap_top,
                    gap_bottom: obstacle.gap_bottom,
                });
            }
            obstacles.push(obstacle);
        }

        let agent = Agent::new(
            settings.agent.x,
            settings.start_y(),
            Vec2::new(settings.agent.width, settings.agent.height),
            settings.gravity,
            settings.agent.jump_impulse,
        );

        log::debug!(
            "Built run for '{}': floor {:.1}, {} obstacles, seed {}",
            descriptor.name,
            floor,
            obstacles.len(),
            seed
        );

        Ok(Self {
            agent,
            track: Track::new(obstacles, track_settings.lookahead),
            floor,
            frame: 0,
            score: 0,
            phase: RunPhase::Running,
            pipe_speed: settings.pipe_speed,
            screen_width: settings.screen_width,
            screen_height: settings.screen_height,
            track_settings,
            gap_band,
            scorer: ScoreTracker::default(),
            seed,
            rng,
        })
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.track.obstacles()
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == RunPhase::Terminal
    }

    pub fn pipe_speed(&self) -> f32 {
        self.pipe_speed
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The obstacle the agent has to clear next
    pub fn current_target(&self) -> Option<&Obstacle> {
        self.track.current_target(self.agent.x())
    }
}
