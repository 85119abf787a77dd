// Free-standing sand bunker: a decorative sand disc plus a response-disabled
// trigger zone, usable outside any hole.
use bevy::prelude::*;
use bevy_rapier3d::prelude::{ActiveEvents, Collider, RigidBody, Sensor};
use uuid::Uuid;

use crate::plugins::config::ElementDef;
use crate::plugins::element::{
    trigger_groups, BuildCtx, CourseElement, ElementParts, SurfaceKind, TriggerKind, TriggerVolume,
};
use crate::plugins::hole::generate_disc_mesh;

const DEFAULT_RADIUS: f32 = 1.2;
const ZONE_HALF_HEIGHT: f32 = 0.15;
const PATCH_LIFT: f32 = 0.002;

pub struct BunkerElement {
    id: Uuid,
    name: String,
    position: Vec3,
    radius: f32,
    parts: ElementParts,
}

impl BunkerElement {
    pub fn new(name: impl Into<String>, position: Vec3, radius: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            radius,
            parts: ElementParts::default(),
        }
    }

    pub fn from_def(def: &ElementDef) -> Self {
        let radius = def.size.map(|s| s.x).unwrap_or(DEFAULT_RADIUS);
        Self::new(def.name.clone(), def.position.to_vec3(), radius)
    }
}

impl CourseElement for BunkerElement {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> &'static str {
        "bunker"
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn create_visuals(&mut self, ctx: &mut BuildCtx) -> bool {
        if self.radius <= 0.0 {
            error!("{}: non-positive bunker radius {}", self.name, self.radius);
            return false;
        }
        let group = self.parts.ensure_group(
            ctx,
            &self.name,
            Transform::from_translation(self.position),
        );
        let sand_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.84, 0.76, 0.50),
            perceptual_roughness: 1.0,
            ..default()
        });
        let patch = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(generate_disc_mesh(self.radius, 32)),
                material: sand_mat,
                transform: Transform::from_xyz(0.0, PATCH_LIFT, 0.0),
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(patch);
        true
    }

    fn create_physics(&mut self, ctx: &mut BuildCtx) -> bool {
        if self.radius <= 0.0 {
            return false;
        }
        let zone = ctx
            .commands
            .spawn((
                TransformBundle::from_transform(Transform::from_translation(
                    self.position + Vec3::Y * ZONE_HALF_HEIGHT,
                )),
                RigidBody::Fixed,
                Collider::cylinder(ZONE_HALF_HEIGHT, self.radius),
                Sensor,
                ActiveEvents::COLLISION_EVENTS,
                SurfaceKind::Sand.friction(),
                SurfaceKind::Sand.restitution(),
                trigger_groups(),
                TriggerVolume { kind: TriggerKind::BunkerZone, hole_index: None },
                Name::new(format!("{}_zone", self.name)),
            ))
            .id();
        self.parts.track_body(zone);
        true
    }

    fn destroy(&mut self, commands: &mut Commands) {
        self.parts.despawn_all(commands);
    }

    fn mesh_count(&self) -> usize {
        self.parts.mesh_count()
    }

    fn body_count(&self) -> usize {
        self.parts.body_count()
    }
}
