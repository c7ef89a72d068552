//! Navigation heuristic
//!
//! Rules are checked in a fixed priority order and the first match decides:
//!
//! 1. Floor safety: jump if next frame's free fall would put the bottom edge
//!    within the safety margin of the floor.
//! 2. Obstacle emergency: with the target less than 150 px ahead, jump if
//!    five frames of free fall would sink the agent onto the gap's lower edge.
//! 3. No target: coast.
//! 4. High gap (centre at or above the midline): hold the altitude from which
//!    one jump peaks three quarters of the way up the gap. If that altitude is
//!    too close to the floor, hug the gap's lower edge instead.
//! 5. Low gap: hug the gap's lower edge as if it were the floor.

use serde::{Deserialize, Serialize};

use super::Policy;
use crate::error::PolicyError;
use crate::settings::Settings;
use crate::sim::{DecisionSnapshot, Obstacle};

/// Target closer than this (leading edge minus agent x) triggers rule 2
pub const EMERGENCY_RANGE: f32 = 150.0;
/// Frames of free fall projected by rule 2
pub const EMERGENCY_LOOKAHEAD: u32 = 5;
/// Extra clearance rule 2 keeps above the gap's lower edge
pub const EMERGENCY_PAD: f32 = 5.0;
/// Fraction of the gap height, measured up from the lower edge, that a jump
/// apex should reach
pub const APEX_TARGET_FRACTION: f32 = 0.75;
/// Hold altitudes closer than this to the floor are abandoned
pub const APEX_FLOOR_CLEARANCE: f32 = 20.0;

/// Which rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    FloorSafety,
    ObstacleEmergency,
    NoTarget,
    ApexHold,
    /// Apex hold was infeasible near the floor
    ApexFallback,
    BottomHug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub jump: bool,
    pub rule: Rule,
}

impl Verdict {
    fn new(jump: bool, rule: Rule) -> Self {
        Self { jump, rule }
    }
}

/// Stateless priority-ordered autopilot
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationHeuristic {
    /// Gaps centred at or above this y use apex hold
    pub midline: f32,
}

impl Default for NavigationHeuristic {
    fn default() -> Self {
        Self::for_settings(&Settings::default())
    }
}

impl NavigationHeuristic {
    pub fn new(midline: f32) -> Self {
        Self { midline }
    }

    /// Split high and low gaps at the world's midline
    pub fn for_settings(settings: &Settings) -> Self {
        Self::new(settings.midline())
    }

    /// Decide and report which rule fired
    pub fn explain(&self, snapshot: &DecisionSnapshot) -> Result<Verdict, PolicyError> {
        check_finite(snapshot)?;

        let agent = &snapshot.agent;
        let gravity = snapshot.gravity;
        let margin = safety_margin(agent.height, agent.width);

        // Bottom edge after one more frame without a jump
        let next_velocity = agent.velocity + gravity;
        let next_bottom = agent.y + next_velocity + agent.height;

        if next_bottom + margin >= snapshot.floor {
            return Ok(Verdict::new(true, Rule::FloorSafety));
        }

        let Some(target) = snapshot.current_obstacle.as_ref() else {
            return Ok(Verdict::new(false, Rule::NoTarget));
        };

        let distance = target.x - agent.x;
        if distance > 0.0 && distance < EMERGENCY_RANGE {
            let (projected_y, _) =
                free_fall(agent.y, agent.velocity, gravity, EMERGENCY_LOOKAHEAD);
            if projected_y + agent.height + EMERGENCY_PAD >= target.gap_bottom {
                return Ok(Verdict::new(true, Rule::ObstacleEmergency));
            }
        }

        if target.gap_center() <= self.midline {
            Ok(self.apex_hold(snapshot, target, next_bottom + margin))
        } else {
            Ok(Verdict::new(
                next_bottom + margin >= target.gap_bottom,
                Rule::BottomHug,
            ))
        }
    }

    fn apex_hold(
        &self,
        snapshot: &DecisionSnapshot,
        target: &Obstacle,
        guarded_bottom: f32,
    ) -> Verdict {
        let agent = &snapshot.agent;
        let target_y = target.gap_bottom - target.gap_height() * APEX_TARGET_FRACTION;
        let minimum_y = target_y + apex_rise(agent.jump_impulse, snapshot.gravity);

        if minimum_y >= snapshot.floor - APEX_FLOOR_CLEARANCE {
            log::trace!(
                "Hold altitude {:.1} too close to floor {:.1}, hugging gap edge",
                minimum_y,
                snapshot.floor
            );
            return Verdict::new(guarded_bottom >= target.gap_bottom, Rule::ApexFallback);
        }

        Verdict::new(agent.y >= minimum_y, Rule::ApexHold)
    }
}

impl Policy for NavigationHeuristic {
    fn name(&self) -> &str {
        "navigation-heuristic"
    }

    fn decide(&self, snapshot: &DecisionSnapshot) -> Result<bool, PolicyError> {
        self.explain(snapshot).map(|verdict| verdict.jump)
    }
}

/// Clearance kept above floors and gap edges
#[inline]
pub fn safety_margin(height: f32, width: f32) -> f32 {
    (height * 0.1).max(width * 0.1).max(5.0)
}

/// Height gained from a single impulse before gravity turns it around
#[inline]
pub fn apex_rise(jump_impulse: f32, gravity: f32) -> f32 {
    jump_impulse * jump_impulse / (2.0 * gravity)
}

/// Position and velocity after `frames` of gravity-only motion
pub fn free_fall(mut y: f32, mut velocity: f32, gravity: f32, frames: u32) -> (f32, f32) {
    for _ in 0..frames {
        velocity += gravity;
        y += velocity;
    }
    (y, velocity)
}

fn check_finite(snapshot: &DecisionSnapshot) -> Result<(), PolicyError> {
    let agent = &snapshot.agent;
    let mut fields = vec![
        ("agent.x", agent.x),
        ("agent.y", agent.y),
        ("agent.height", agent.height),
        ("agent.width", agent.width),
        ("agent.jumpImpulse", agent.jump_impulse),
        ("agent.velocity", agent.velocity),
        ("gravity", snapshot.gravity),
        ("floor", snapshot.floor),
    ];
    if let Some(target) = &snapshot.current_obstacle {
        fields.push(("currentObstacle.x", target.x));
        fields.push(("currentObstacle.gapTop", target.gap_top));
        fields.push(("currentObstacle.gapBottom", target.gap_bottom));
    }
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, _)) => Err(PolicyError::NonFiniteSnapshot { field }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::AgentKinematics;

    const FAR_FLOOR: f32 = 10_000.0;

    fn snapshot(y: f32, velocity: f32, floor: f32, target: Option<Obstacle>) -> DecisionSnapshot {
        DecisionSnapshot {
            agent: AgentKinematics {
                x: 100.0,
                y,
                height: 30.0,
                width: 30.0,
                gravity: 0.5,
                jump_impulse: -8.0,
                velocity,
            },
            pipe_speed: 3.0,
            obstacles: target.iter().cloned().collect(),
            current_obstacle: target,
            gravity: 0.5,
            floor,
        }
    }

    /// Obstacle far enough ahead that rule 2 stays quiet
    fn gap(center: f32, height: f32) -> Obstacle {
        Obstacle {
            id: 0,
            x: 400.0,
            width: 50.0,
            gap_top: center - height / 2.0,
            gap_bottom: center + height / 2.0,
        }
    }

    fn explain(snap: &DecisionSnapshot) -> Verdict {
        NavigationHeuristic::default().explain(snap).unwrap()
    }

    #[test]
    fn test_margin_and_apex_rise() {
        assert_eq!(safety_margin(30.0, 30.0), 5.0);
        assert_eq!(safety_margin(80.0, 30.0), 8.0);
        assert_eq!(apex_rise(-8.0, 0.5), 64.0);
        assert_eq!(free_fall(0.0, 0.0, 0.5, 5), (7.5, 2.5));
    }

    #[test]
    fn test_floor_rule_one_pixel_above_floor() {
        let floor = 500.0;
        let snap = snapshot(floor - 30.0 - 1.0, 0.0, floor, None);
        assert_eq!(explain(&snap), Verdict::new(true, Rule::FloorSafety));
    }

    #[test]
    fn test_floor_rule_precedes_missing_target() {
        let snap = snapshot(460.0, 6.0, 500.0, None);
        assert!(explain(&snap).jump);

        let calm = snapshot(200.0, 0.0, 500.0, None);
        assert_eq!(explain(&calm), Verdict::new(false, Rule::NoTarget));
    }

    #[test]
    fn test_apex_rule_worked_example() {
        let target = gap(150.0, 150.0);
        assert_eq!(target.gap_bottom, 225.0);
        // targetY = 112.5, minimumY = 176.5
        let low = snapshot(200.0, 0.0, FAR_FLOOR, Some(target.clone()));
        assert_eq!(explain(&low), Verdict::new(true, Rule::ApexHold));

        let high = snapshot(100.0, 0.0, FAR_FLOOR, Some(target.clone()));
        assert_eq!(explain(&high), Verdict::new(false, Rule::ApexHold));

        let boundary = snapshot(176.5, 0.0, FAR_FLOOR, Some(target));
        assert!(explain(&boundary).jump);
    }

    #[test]
    fn test_apex_infeasible_near_floor_hugs_gap_edge() {
        // Narrow gap: bottom 300, targetY 270, minimumY 334 >= 350 - 20
        let floor = 350.0;
        let target = gap(280.0, 40.0);

        // next bottom 266 + 0.5 + 30, plus margin 5 = 301.5 >= 300
        let sinking = snapshot(266.0, 0.0, floor, Some(target.clone()));
        assert_eq!(explain(&sinking), Verdict::new(true, Rule::ApexFallback));

        let clear = snapshot(200.0, 0.0, floor, Some(target));
        assert_eq!(explain(&clear), Verdict::new(false, Rule::ApexFallback));
    }

    #[test]
    fn test_bottom_hug_worked_example() {
        let target = gap(450.0, 150.0);
        assert_eq!(target.gap_bottom, 525.0);

        // next bottom = 490 + 0.5 + 30 = 520.5, + margin 5 = 525.5
        let near = snapshot(490.0, 0.0, FAR_FLOOR, Some(target.clone()));
        assert_eq!(explain(&near), Verdict::new(true, Rule::BottomHug));

        let clear = snapshot(480.0, 0.0, FAR_FLOOR, Some(target));
        assert_eq!(explain(&clear), Verdict::new(false, Rule::BottomHug));
    }

    #[test]
    fn test_emergency_overrides_apex_hold() {
        let mut target = gap(150.0, 150.0);
        target.x = 200.0;
        // Above minimumY so apex hold alone would coast, but five frames of
        // fall from y=170 with v=4 lands at 170 + 27.5 = 197.5; +30+5 >= 225
        let snap = snapshot(170.0, 4.0, FAR_FLOOR, Some(target.clone()));
        assert_eq!(explain(&snap), Verdict::new(true, Rule::ObstacleEmergency));

        // Same state with the obstacle out of range falls through to rule 4
        target.x = 260.0;
        let snap = snapshot(170.0, 4.0, FAR_FLOOR, Some(target));
        assert_eq!(explain(&snap), Verdict::new(false, Rule::ApexHold));
    }

    #[test]
    fn test_emergency_ignores_obstacle_already_overlapping() {
        let mut target = gap(450.0, 150.0);
        target.x = 90.0;
        let snap = snapshot(400.0, 0.0, FAR_FLOOR, Some(target));
        assert_eq!(explain(&snap).rule, Rule::BottomHug);
    }

    #[test]
    fn test_custom_midline() {
        let target = gap(350.0, 150.0);
        let snap = snapshot(100.0, 0.0, FAR_FLOOR, Some(target));
        assert_eq!(explain(&snap).rule, Rule::BottomHug);
        let settings = Settings {
            screen_height: 800.0,
            ..Settings::default()
        };
        let tall = NavigationHeuristic::for_settings(&settings);
        assert_eq!(tall.midline, 400.0);
        assert_eq!(tall.explain(&snap).unwrap().rule, Rule::ApexHold);
    }

    #[test]
    fn test_non_finite_snapshot_rejected() {
        let snap = snapshot(f32::NAN, 0.0, 500.0, None);
        assert_eq!(
            NavigationHeuristic::default().decide(&snap),
            Err(PolicyError::NonFiniteSnapshot { field: "agent.y" })
        );
    }
}
