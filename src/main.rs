// Demo wiring for the course subsystem: physics, course pipeline, ball, and
// a fixed camera. Real input/camera/UI live outside this crate; the nudge
// below exists only so the demo is playable.
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use mini_putt::prelude::*;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.52, 0.80, 0.92)))
        .insert_resource(AmbientLight {
            color: Color::srgb(0.55, 0.55, 0.60),
            brightness: 800.0,
        })
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window { title: "Mini Putt".into(), ..default() }),
            ..default()
        }))
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
        .add_plugins(CoreSimPlugin)
        .add_plugins(CourseManagerPlugin)
        .add_plugins(BallPlugin)
        .add_systems(Startup, setup_scene)
        .add_systems(Update, demo_shot)
        .run();
}

fn setup_scene(mut commands: Commands) {
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0.0, 14.0, 16.0).looking_at(Vec3::new(0.0, 0.0, 0.0), Vec3::Y),
        ..default()
    });
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 40_000.0,
            shadows_enabled: true,
            ..default()
        },
        transform: Transform::from_xyz(30.0, 60.0, 30.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}

// Space nudges the ball toward the current cup.
fn demo_shot(
    keys: Res<ButtonInput<KeyCode>>,
    manager: Option<Res<CourseManager>>,
    mut ball: Query<(&Transform, &mut Velocity), With<Ball>>,
) {
    if !keys.just_pressed(KeyCode::Space) {
        return;
    }
    let Some(manager) = manager else { return };
    let Some(hole) = manager.hole_position() else { return };
    let Ok((transform, mut velocity)) = ball.get_single_mut() else { return };
    let to_hole = hole - transform.translation;
    let dir = Vec3::new(to_hole.x, 0.0, to_hole.z).normalize_or_zero();
    velocity.linvel += dir * 4.0;
}
