// Ball interface surface: spawn-on-request plus hazard damping. The ball's
// dynamics are integrated by the physics world, not here; this subsystem
// only creates/replaces the body and reads its state.
use bevy::math::primitives::Sphere;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{Ccd, Collider, Damping, RigidBody, Velocity};

use crate::plugins::course_manager::HazardEvent;
use crate::plugins::element::{ball_groups, SurfaceKind};

#[derive(Component)]
pub struct Ball;

/// Replace the current ball with a fresh one resting at `position` (a hole
/// start position; the spawn offset is added here).
#[derive(Event, Debug, Clone, Copy)]
pub struct BallSpawnRequest {
    pub position: Vec3,
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct BallParams {
    pub radius: f32,
    pub spawn_height_offset: f32,
    pub linear_damping: f32,
    /// Linear damping while inside a sand zone.
    pub sand_damping: f32,
}

impl Default for BallParams {
    fn default() -> Self {
        Self {
            radius: 0.2,
            spawn_height_offset: 0.05,
            linear_damping: 0.4,
            sand_damping: 4.0,
        }
    }
}

/// How many hazard zones currently overlap the ball. Overlapping zones nest;
/// damping relaxes only when the last one is left.
#[derive(Resource, Default)]
pub struct BallHazardState {
    inside: usize,
}

pub struct BallPlugin;

impl Plugin for BallPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<BallSpawnRequest>()
            .init_resource::<BallParams>()
            .init_resource::<BallHazardState>()
            .add_systems(Update, (spawn_requested_ball, apply_hazard_damping));
    }
}

fn spawn_requested_ball(
    mut commands: Commands,
    mut requests: EventReader<BallSpawnRequest>,
    params: Res<BallParams>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    existing: Query<Entity, With<Ball>>,
    mut hazard_state: ResMut<BallHazardState>,
) {
    // Coalesce to the newest request; transitions replace the ball wholesale.
    let Some(request) = requests.read().last().copied() else {
        return;
    };
    for entity in &existing {
        commands.entity(entity).despawn_recursive();
    }
    hazard_state.inside = 0;

    let spawn = request.position + Vec3::Y * (params.radius + params.spawn_height_offset);
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(Mesh::from(Sphere { radius: params.radius })),
            material: materials.add(StandardMaterial {
                base_color: Color::srgb(0.95, 0.95, 0.95),
                perceptual_roughness: 0.4,
                ..default()
            }),
            transform: Transform::from_translation(spawn),
            ..default()
        },
        Ball,
        RigidBody::Dynamic,
        Collider::ball(params.radius),
        Velocity::zero(),
        Damping { linear_damping: params.linear_damping, angular_damping: 0.8 },
        SurfaceKind::Default.friction(),
        SurfaceKind::Default.restitution(),
        ball_groups(),
        Ccd::enabled(),
        Name::new("ball"),
    ));
    info!("ball spawned at {spawn}");
}

/// Sand slows the ball: swap linear damping while at least one hazard zone
/// overlaps it.
fn apply_hazard_damping(
    mut events: EventReader<HazardEvent>,
    mut state: ResMut<BallHazardState>,
    params: Res<BallParams>,
    mut ball: Query<&mut Damping, With<Ball>>,
) {
    if events.is_empty() {
        return;
    }
    for event in events.read() {
        match event {
            HazardEvent::Entered(_) => state.inside += 1,
            HazardEvent::Exited(_) => state.inside = state.inside.saturating_sub(1),
        }
    }
    let Ok(mut damping) = ball.get_single_mut() else {
        return;
    };
    damping.linear_damping = if state.inside > 0 {
        params.sand_damping
    } else {
        params.linear_damping
    };
}
