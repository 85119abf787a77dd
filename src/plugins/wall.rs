// Free-standing wall obstacle: a box mesh plus a fixed bumper collider.
use bevy::math::primitives::Cuboid;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, RigidBody};
use uuid::Uuid;

use crate::plugins::config::ElementDef;
use crate::plugins::element::{
    solid_groups, BuildCtx, CourseElement, ElementParts, SurfaceKind,
};

const DEFAULT_SIZE: Vec3 = Vec3::new(2.0, 0.5, 0.25);

pub struct WallElement {
    id: Uuid,
    name: String,
    position: Vec3,
    size: Vec3,
    yaw: f32,
    parts: ElementParts,
}

impl WallElement {
    pub fn new(name: impl Into<String>, position: Vec3, size: Vec3, yaw_deg: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            position,
            size,
            yaw: yaw_deg.to_radians(),
            parts: ElementParts::default(),
        }
    }

    pub fn from_def(def: &ElementDef) -> Self {
        let size = def.size.map(|s| s.to_vec3()).unwrap_or(DEFAULT_SIZE);
        Self::new(def.name.clone(), def.position.to_vec3(), size, def.rotation_deg)
    }

    fn world_transform(&self) -> Transform {
        Transform::from_translation(self.position + Vec3::Y * (self.size.y * 0.5))
            .with_rotation(Quat::from_rotation_y(self.yaw))
    }
}

impl CourseElement for WallElement {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> &'static str {
        "wall"
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn create_visuals(&mut self, ctx: &mut BuildCtx) -> bool {
        if self.size.cmple(Vec3::ZERO).any() {
            error!("{}: degenerate wall size {:?}", self.name, self.size);
            return false;
        }
        let group = self.parts.ensure_group(ctx, &self.name, self.world_transform());
        let wall_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.30, 0.18),
            perceptual_roughness: 0.8,
            ..default()
        });
        let mesh = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(Mesh::from(Cuboid { half_size: self.size * 0.5 })),
                material: wall_mat,
                transform: Transform::IDENTITY,
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(mesh);
        true
    }

    fn create_physics(&mut self, ctx: &mut BuildCtx) -> bool {
        if self.size.cmple(Vec3::ZERO).any() {
            return false;
        }
        let half = self.size * 0.5;
        let body = ctx
            .commands
            .spawn((
                TransformBundle::from_transform(self.world_transform()),
                RigidBody::Fixed,
                Collider::cuboid(half.x, half.y, half.z),
                SurfaceKind::Bumper.friction(),
                SurfaceKind::Bumper.restitution(),
                solid_groups(),
                Name::new(format!("{}_body", self.name)),
            ))
            .id();
        self.parts.track_body(body);
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
