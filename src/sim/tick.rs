//! Simulation clock
//!
//! One call advances one frame. The step order is fixed and runs to
//! completion: decision, integrate, advance track, score, collide.

use serde::{Deserialize, Serialize};

use super::collision::{Collision, check_collision};
use super::state::{RunPhase, SimState};

/// What happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// The run was already terminal; nothing changed
    Frozen,
    Advanced {
        /// Obstacle credited this frame
        credited: Option<u32>,
        /// Collision that ended the run this frame
        collision: Option<Collision>,
    },
}

/// Advance the simulation by one frame
pub fn tick(state: &mut SimState, jump: bool) -> TickOutcome {
    if state.phase == RunPhase::Terminal {
        return TickOutcome::Frozen;
    }

    state.frame += 1;

    if jump {
        state.agent.apply_impulse();
    }
    let gravity = state.agent.gravity;
    state.agent.integrate(gravity);

    state.track.advance(state.pipe_speed);
    state.track.retire(state.track_settings.retire_x);
    state.track.spawn_if_needed(
        &state.track_settings,
        &state.gap_band,
        state.screen_width,
        state.floor,
        &mut state.rng,
    );

    let credited = state
        .scorer
        .update(state.track.obstacles(), state.agent.x());
    if let Some(id) = credited {
        state.score += 1;
        log::debug!("Frame {}: cleared obstacle {} (score {})", state.frame, id, state.score);
    }

    let collision = check_collision(&state.agent, state.track.obstacles(), state.floor);
    if let Some(hit) = collision {
        state.phase = RunPhase::Terminal;
        log::debug!("Frame {}: run ended by {:?}", state.frame, hit);
    }

    TickOutcome::Advanced {
        credited,
        collision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{FloorRange, LevelCatalog, LevelDescriptor, ObstacleSpec};
    use crate::settings::Settings;
    use proptest::prelude::*;

    fn open_sky() -> LevelDescriptor {
        LevelDescriptor {
            name: "open".into(),
            description: String::new(),
            floor_range: FloorRange {
                min: 5000.0,
                max: 5000.0,
            },
            obstacles: Vec::new(),
        }
    }

    fn single_wide_gap() -> LevelDescriptor {
        LevelDescriptor {
            name: "wide".into(),
            description: String::new(),
            floor_range: FloorRange {
                min: 5000.0,
                max: 5000.0,
            },
            obstacles: vec![ObstacleSpec {
                x: 200.0,
                gap_center_y: 300.0,
                gap_height: 4000.0,
            }],
        }
    }

    #[test]
    fn test_first_tick_integrates_after_jump() {
        let mut state = SimState::load(&open_sky(), &Settings::default(), 1).unwrap();
        let outcome = tick(&mut state, true);
        assert_eq!(state.frame(), 1);
        assert_eq!(state.agent().velocity, -7.5);
        assert_eq!(state.agent().y(), 292.5);
        assert_eq!(
            outcome,
            TickOutcome::Advanced {
                credited: None,
                collision: None
            }
        );
    }

    #[test]
    fn test_free_fall_hits_floor() {
        let catalog = LevelCatalog::builtin();
        let (_, level) = catalog.resolve("floor_test");
        let mut state = SimState::load(level, &Settings::default(), 11).unwrap();

        let mut last = TickOutcome::Frozen;
        for _ in 0..200 {
            last = tick(&mut state, false);
            if state.is_terminal() {
                break;
            }
        }
        assert!(state.is_terminal());
        assert!(matches!(
            last,
            TickOutcome::Advanced {
                collision: Some(Collision::Floor),
                ..
            }
        ));
        assert!(state.agent().bottom() >= state.floor());
    }

    #[test]
    fn test_terminal_is_frozen() {
        let mut state = SimState::load(&open_sky(), &Settings::default(), 1).unwrap();
        // Climb into the ceiling
        while !state.is_terminal() {
            tick(&mut state, true);
        }
        let frame = state.frame();
        let y = state.agent().y();
        assert_eq!(tick(&mut state, true), TickOutcome::Frozen);
        assert_eq!(tick(&mut state, false), TickOutcome::Frozen);
        assert_eq!(state.frame(), frame);
        assert_eq!(state.agent().y(), y);
    }

    #[test]
    fn test_passing_an_obstacle_scores_once() {
        let mut state = SimState::load(&single_wide_gap(), &Settings::default(), 1).unwrap();
        let mut credited = Vec::new();
        // Obstacle trailing edge 250 passes agent x 100 after 51 frames
        for _ in 0..60 {
            let jump = state.agent().velocity > 2.0;
            if let TickOutcome::Advanced {
                credited: Some(id), ..
            } = tick(&mut state, jump)
            {
                credited.push(id);
            }
        }
        assert!(!state.is_terminal());
        assert_eq!(credited, vec![0]);
        assert_eq!(state.score(), 1);
    }

    proptest! {
        #[test]
        fn prop_frame_and_score_monotonic(
            decisions in proptest::collection::vec(any::<bool>(), 1..400),
            seed in any::<u64>(),
        ) {
            let catalog = LevelCatalog::builtin();
            let (_, level) = catalog.resolve("medium");
            let mut state = SimState::load(level, &Settings::default(), seed).unwrap();

            for jump in decisions {
                let was_terminal = state.is_terminal();
                let frame = state.frame();
                let score = state.score();

                tick(&mut state, jump);

                if was_terminal {
                    prop_assert!(state.is_terminal());
                    prop_assert_eq!(state.frame(), frame);
                    prop_assert_eq!(state.score(), score);
                } else {
                    prop_assert_eq!(state.frame(), frame + 1);
                    prop_assert!(state.score() >= score);
                    prop_assert!(state.score() <= score + 1);
                }
            }
        }

        #[test]
        fn prop_terminal_is_one_way(
            after in proptest::collection::vec(any::<bool>(), 1..64),
            seed in any::<u64>(),
        ) {
            let catalog = LevelCatalog::builtin();
            let (_, level) = catalog.resolve("hard");
            let mut state = SimState::load(level, &Settings::default(), seed).unwrap();
            while !state.is_terminal() {
                tick(&mut state, false);
            }
            let frozen = state.render_snapshot();
            for jump in after {
                prop_assert_eq!(tick(&mut state, jump), TickOutcome::Frozen);
            }
            prop_assert_eq!(state.render_snapshot(), frozen);
        }

        #[test]
        fn prop_track_holds_lookahead(
            decisions in proptest::collection::vec(any::<bool>(), 1..600),
            seed in any::<u64>(),
            level_id in prop::sample::select(vec!["simple", "medium", "hard", "marathon"]),
        ) {
            let settings = Settings::default();
            let catalog = LevelCatalog::builtin();
            let (_, level) = catalog.resolve(level_id);
            let mut state = SimState::load(level, &settings, seed).unwrap();
            for jump in decisions {
                tick(&mut state, jump);
                if state.is_terminal() {
                    break;
                }
                prop_assert_eq!(state.obstacles().len(), settings.track.lookahead);
                prop_assert!(state.obstacles().windows(2).all(|w| w[0].x < w[1].x));
            }
        }
    }
}
