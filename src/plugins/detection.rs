// Contact+position hybrid hole detection for open-field courses.
//
// Two independent signals, OR-combined: a sensor contact with the cup
// trigger (authoritative when the ball is slow enough to drop), and a planar
// distance check whose effective radius shrinks with speed so a fast shot
// grazing the cup is never captured.
use bevy::prelude::*;
use bevy_rapier3d::prelude::{RapierContext, Velocity};

use crate::plugins::ball::Ball;
use crate::plugins::config::DetectionMode;
use crate::plugins::course_manager::CourseManager;
use crate::plugins::element::{TriggerKind, TriggerVolume};

/// At or above this speed the ball always skips over the cup.
pub const CAPTURE_MAX_SPEED: f32 = 3.0;
/// Below this speed the full cup radius captures.
pub const SLOW_CAPTURE_SPEED: f32 = 0.5;

/// Effective capture radius for a ball moving at `speed`: full radius when
/// slow, shrinking linearly to zero at `CAPTURE_MAX_SPEED`.
pub fn capture_radius(hole_radius: f32, speed: f32) -> f32 {
    if speed < SLOW_CAPTURE_SPEED {
        hole_radius
    } else if speed < CAPTURE_MAX_SPEED {
        hole_radius * (1.0 - (speed - SLOW_CAPTURE_SPEED) / (CAPTURE_MAX_SPEED - SLOW_CAPTURE_SPEED))
    } else {
        0.0
    }
}

/// Height-ignored distance between two world positions.
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

/// The OR-combination: a genuine overlap reported by the physics world wins
/// whenever the ball is slow enough; otherwise fall back to the analytic
/// speed-gated radius (catches shallow grazes that never fire a contact).
pub fn is_captured(
    ball_pos: Vec3,
    ball_vel: Vec3,
    hole_pos: Vec3,
    hole_radius: f32,
    in_contact: bool,
) -> bool {
    let speed = ball_vel.length();
    if in_contact && speed < CAPTURE_MAX_SPEED {
        return true;
    }
    planar_distance(ball_pos, hole_pos) < capture_radius(hole_radius, speed)
}

/// Per-tick detector for `DetectionMode::Hybrid` courses. Reads the live
/// intersection pair between the ball and the active cup trigger as the
/// contact signal; the trigger-event path is disabled for these courses.
pub fn hybrid_hole_detection(
    rapier: Option<Res<RapierContext>>,
    manager: Option<ResMut<CourseManager>>,
    ball: Query<(Entity, &Transform, &Velocity), With<Ball>>,
    triggers: Query<(Entity, &TriggerVolume)>,
) {
    let Some(mut manager) = manager else { return };
    if manager.detection() != DetectionMode::Hybrid {
        return;
    }
    let Ok((ball_entity, ball_transform, velocity)) = ball.get_single() else {
        return;
    };
    let index = manager.current_hole_index();
    let (hole_pos, hole_radius) = match manager.current_hole() {
        Some(hole) => (hole.hole_world_position(), hole.hole_radius()),
        None => return,
    };

    for (trigger_entity, trigger) in &triggers {
        if trigger.kind != TriggerKind::HoleCup || trigger.hole_index != Some(index) {
            continue;
        }
        let in_contact = rapier
            .as_ref()
            .and_then(|ctx| ctx.intersection_pair(ball_entity, trigger_entity))
            .unwrap_or(false);
        if is_captured(
            ball_transform.translation,
            velocity.linvel,
            hole_pos,
            hole_radius,
            in_contact,
        ) {
            manager.on_ball_in_hole(index);
        }
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f32 = 0.35;

    #[test]
    fn slow_centered_ball_is_captured() {
        let hole = Vec3::new(4.0, 0.0, 8.0);
        assert!(is_captured(hole, Vec3::ZERO, hole, RADIUS, false));
        assert!(is_captured(hole, Vec3::new(0.4, 0.0, 0.0), hole, RADIUS, false));
    }

    #[test]
    fn fast_ball_is_never_captured() {
        let hole = Vec3::ZERO;
        assert!(!is_captured(hole, Vec3::new(3.0, 0.0, 0.0), hole, RADIUS, false));
        // Even a genuine contact is ignored at speed.
        assert!(!is_captured(hole, Vec3::new(5.0, 0.0, 0.0), hole, RADIUS, true));
    }

    #[test]
    fn effective_radius_shrinks_linearly() {
        // At speed 1.5 the radius is 0.35 * (1 - (1.5-0.5)/2.5) = 0.21.
        let r = capture_radius(RADIUS, 1.5);
        assert!((r - 0.21).abs() < 1e-6);

        let hole = Vec3::ZERO;
        let vel = Vec3::new(1.5, 0.0, 0.0);
        assert!(!is_captured(Vec3::new(0.25, 0.0, 0.0), vel, hole, RADIUS, false));
        assert!(is_captured(Vec3::new(0.15, 0.0, 0.0), vel, hole, RADIUS, false));
    }

    #[test]
    fn contact_wins_below_speed_gate() {
        let hole = Vec3::ZERO;
        // Off-center beyond the analytic radius, but the physics world saw
        // an overlap.
        assert!(is_captured(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), hole, RADIUS, true));
    }

    #[test]
    fn height_is_ignored_in_the_distance() {
        let hole = Vec3::new(0.0, 0.0, 0.0);
        let ball = Vec3::new(0.1, 0.8, 0.0);
        assert!(is_captured(ball, Vec3::ZERO, hole, RADIUS, false));
    }
}
