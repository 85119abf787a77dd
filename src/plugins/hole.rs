// HoleEntity: one hole's playable surface, rim, cup, walls, trigger, start
// marker, and sand hazards.
//
// Render and physics geometry are built independently and tied only by a
// shared world transform: visuals are parented to the hole's group entity in
// group-local coordinates, physics bodies are top-level entities positioned
// at `center + local` in world space. The surface cutout exists only in the
// render mesh; the collision surface is a solid slab and the cup is realized
// purely as a trigger region.
use bevy::prelude::*;
use bevy::math::primitives::{Cuboid, Cylinder, Torus};
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy_rapier3d::prelude::{ActiveEvents, Collider, RigidBody, Sensor};
use uuid::Uuid;

use crate::plugins::config::{HazardDef, HazardShape, HoleConfiguration};
use crate::plugins::element::{
    solid_groups, trigger_groups, BuildCtx, CourseElement, CourseError, ElementParts, SurfaceKind,
    TriggerKind, TriggerVolume,
};

pub const HOLE_RADIUS: f32 = 0.35;
pub const CAPTURE_MARGIN: f32 = 0.05;
const SURFACE_HEIGHT: f32 = 0.1;
const SURFACE_THICKNESS: f32 = 0.2;
const WALL_HEIGHT: f32 = 0.4;
const WALL_THICKNESS: f32 = 0.25;
const CUP_DEPTH: f32 = 0.35;
const CUP_SEGMENTS: u32 = 48;
// Lift applied to coplanar decoration (rim, sand patches) to avoid z-fighting.
const DECAL_LIFT: f32 = 0.002;
// Vertical reach of the cup trigger around the configured hole position.
const TRIGGER_HALF_HEIGHT: f32 = 0.4;
const HAZARD_TRIGGER_HALF_HEIGHT: f32 = 0.15;

pub struct HoleEntity {
    id: Uuid,
    name: String,
    config: HoleConfiguration,
    center: Vec3,
    width: f32,
    length: f32,
    wall_height: f32,
    wall_thickness: f32,
    hole_radius: f32,
    surface_height: f32,
    parts: ElementParts,
}

impl HoleEntity {
    pub fn new(config: &HoleConfiguration) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: format!("hole_{}", config.index + 1),
            center: config.center_position(),
            width: config.course_width,
            length: config.course_length,
            wall_height: WALL_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            hole_radius: HOLE_RADIUS,
            surface_height: SURFACE_HEIGHT,
            config: config.clone(),
            parts: ElementParts::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.config.index
    }

    pub fn par(&self) -> u32 {
        self.config.par
    }

    pub fn hole_radius(&self) -> f32 {
        self.hole_radius
    }

    pub fn hole_world_position(&self) -> Vec3 {
        self.config.hole_position.to_vec3()
    }

    pub fn start_world_position(&self) -> Vec3 {
        self.config.start_position.to_vec3()
    }

    fn hole_local(&self) -> Vec3 {
        self.hole_world_position() - self.center
    }

    fn start_local(&self) -> Vec3 {
        self.start_world_position() - self.center
    }

    fn dimensions_valid(&self) -> bool {
        self.width > 2.0 * self.hole_radius && self.length > 2.0 * self.hole_radius
    }

    /// Left/right/back/front wall slabs: (name, local offset, half extents).
    fn wall_layout(&self) -> [(&'static str, Vec3, Vec3); 4] {
        let hw = self.width * 0.5;
        let hl = self.length * 0.5;
        let t = self.wall_thickness;
        let h = self.wall_height;
        let y = self.surface_height + h * 0.5;
        [
            ("wall_left", Vec3::new(-(hw + t * 0.5), y, 0.0), Vec3::new(t * 0.5, h * 0.5, hl + t)),
            ("wall_right", Vec3::new(hw + t * 0.5, y, 0.0), Vec3::new(t * 0.5, h * 0.5, hl + t)),
            ("wall_back", Vec3::new(0.0, y, -(hl + t * 0.5)), Vec3::new(hw + t, h * 0.5, t * 0.5)),
            ("wall_front", Vec3::new(0.0, y, hl + t * 0.5), Vec3::new(hw + t, h * 0.5, t * 0.5)),
        ]
    }

    /// Resolves a hazard config into world-space sensor footprints. Only
    /// "sand" is a valid kind; missing sizing data is a config error.
    fn sand_footprints(hazard: &HazardDef) -> Result<Vec<Footprint>, CourseError> {
        if hazard.kind != "sand" {
            return Err(CourseError::MalformedHazard(format!(
                "unsupported hazard kind `{}`",
                hazard.kind
            )));
        }
        if let Some(subs) = &hazard.sub_shapes {
            if subs.is_empty() {
                return Err(CourseError::MalformedHazard("empty sub_shapes".to_owned()));
            }
            return Ok(subs
                .iter()
                .map(|s| Footprint::Box { center: s.position.to_vec3(), half: s.size.to_vec3() * 0.5 })
                .collect());
        }
        let Some(size) = hazard.size else {
            return Err(CourseError::MalformedHazard("missing size".to_owned()));
        };
        let center = hazard.position.to_vec3();
        Ok(match hazard.shape {
            HazardShape::Box => vec![Footprint::Box { center, half: size.to_vec3() * 0.5 }],
            HazardShape::Circle => vec![Footprint::Disc { center, radius: size.x }],
        })
    }
}

enum Footprint {
    Box { center: Vec3, half: Vec3 },
    Disc { center: Vec3, radius: f32 },
}

impl CourseElement for HoleEntity {
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn element_type(&self) -> &'static str {
        "hole"
    }

    fn position(&self) -> Vec3 {
        self.center
    }

    fn create_visuals(&mut self, ctx: &mut BuildCtx) -> bool {
        if !self.dimensions_valid() {
            error!(
                "{}: playable extents {}x{} cannot fit the cup",
                self.name, self.width, self.length
            );
            return false;
        }

        let group = self.parts.ensure_group(
            ctx,
            &self.name,
            Transform::from_translation(self.center),
        );
        let hole_local = self.hole_local();
        let start_local = self.start_local();

        let grass = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.20, 0.58, 0.25),
            perceptual_roughness: 0.95,
            ..default()
        });
        let rim_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.92, 0.92, 0.88),
            ..default()
        });
        let cup_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.05, 0.05, 0.06),
            perceptual_roughness: 1.0,
            ..default()
        });
        let wall_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.45, 0.30, 0.18),
            perceptual_roughness: 0.8,
            ..default()
        });
        let sand_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.84, 0.76, 0.50),
            perceptual_roughness: 1.0,
            ..default()
        });
        let marker_mat = ctx.materials.add(StandardMaterial {
            base_color: Color::srgb(0.25, 0.45, 0.85),
            ..default()
        });

        // 1. Playable surface with the cup cut out of the render mesh only.
        let panel = generate_holed_panel(
            self.width,
            self.length,
            Vec2::new(hole_local.x, hole_local.z),
            self.hole_radius,
            CUP_SEGMENTS,
        );
        let surface = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(panel),
                material: grass,
                transform: Transform::from_xyz(0.0, self.surface_height, 0.0),
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(surface);

        // 2. Rim ring, lifted off the surface.
        let rim = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(Mesh::from(Torus {
                    minor_radius: 0.02,
                    major_radius: self.hole_radius,
                })),
                material: rim_mat,
                transform: Transform::from_translation(
                    hole_local + Vec3::Y * (self.surface_height + DECAL_LIFT),
                ),
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(rim);

        // 3. Cup interior, cosmetic only.
        let cup = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(generate_cup_mesh(self.hole_radius, CUP_DEPTH, CUP_SEGMENTS)),
                material: cup_mat,
                transform: Transform::from_translation(hole_local + Vec3::Y * self.surface_height),
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(cup);

        // 4. Wall visuals (colliders are built in create_physics).
        for (wall_name, offset, half) in self.wall_layout() {
            let wall = ctx
                .commands
                .spawn((
                    PbrBundle {
                        mesh: ctx.meshes.add(Mesh::from(Cuboid { half_size: half })),
                        material: wall_mat.clone(),
                        transform: Transform::from_translation(offset),
                        ..default()
                    },
                    Name::new(wall_name),
                ))
                .set_parent(group)
                .id();
            self.parts.track_mesh(wall);
        }

        // 6. Start marker pad, decoration only.
        let marker = ctx
            .commands
            .spawn(PbrBundle {
                mesh: ctx.meshes.add(Mesh::from(Cylinder { radius: 0.25, half_height: 0.01 })),
                material: marker_mat,
                transform: Transform::from_translation(
                    start_local + Vec3::Y * (self.surface_height + DECAL_LIFT),
                ),
                ..default()
            })
            .set_parent(group)
            .id();
        self.parts.track_mesh(marker);

        // 7. Sand patch visuals; malformed hazards are skipped here and again
        // on the physics side.
        let hazards = self.config.hazards.clone();
        for hazard in &hazards {
            let footprints = match Self::sand_footprints(hazard) {
                Ok(f) => f,
                Err(e) => {
                    warn!("{}: skipping hazard visual: {e}", self.name);
                    continue;
                }
            };
            for footprint in footprints {
                let (mesh, world_center) = match footprint {
                    Footprint::Box { center, half } => (
                        Mesh::from(Cuboid { half_size: Vec3::new(half.x, 0.005, half.z) }),
                        center,
                    ),
                    Footprint::Disc { center, radius } => {
                        (generate_disc_mesh(radius, CUP_SEGMENTS), center)
                    }
                };
                let local = world_center - self.center;
                let patch = ctx
                    .commands
                    .spawn(PbrBundle {
                        mesh: ctx.meshes.add(mesh),
                        material: sand_mat.clone(),
                        transform: Transform::from_xyz(
                            local.x,
                            self.surface_height + DECAL_LIFT,
                            local.z,
                        ),
                        ..default()
                    })
                    .set_parent(group)
                    .id();
                self.parts.track_mesh(patch);
            }
        }

        true
    }

    fn create_physics(&mut self, ctx: &mut BuildCtx) -> bool {
        if !self.dimensions_valid() {
            return false;
        }

        // 1. Collision surface: a solid slab with no cutout, matching the
        // render panel's world transform. The ball can never fall through the
        // seam; entering the cup is detected by the trigger alone.
        let slab = ctx
            .commands
            .spawn((
                TransformBundle::from_transform(Transform::from_translation(
                    self.center + Vec3::Y * (self.surface_height - SURFACE_THICKNESS * 0.5),
                )),
                RigidBody::Fixed,
                Collider::cuboid(self.width * 0.5, SURFACE_THICKNESS * 0.5, self.length * 0.5),
                SurfaceKind::Ground.friction(),
                SurfaceKind::Ground.restitution(),
                solid_groups(),
                Name::new(format!("{}_surface", self.name)),
            ))
            .id();
        self.parts.track_body(slab);

        // 4. Wall colliders, world position = center + local offset.
        for (wall_name, offset, half) in self.wall_layout() {
            let wall = ctx
                .commands
                .spawn((
                    TransformBundle::from_transform(Transform::from_translation(
                        self.center + offset,
                    )),
                    RigidBody::Fixed,
                    Collider::cuboid(half.x, half.y, half.z),
                    SurfaceKind::Bumper.friction(),
                    SurfaceKind::Bumper.restitution(),
                    solid_groups(),
                    Name::new(format!("{}_{}", self.name, wall_name)),
                ))
                .id();
            self.parts.track_body(wall);
        }

        // 5. Cup trigger: response-disabled cylinder at the configured hole
        // position, the sole detector of "ball entered hole".
        let trigger = ctx
            .commands
            .spawn((
                TransformBundle::from_transform(Transform::from_translation(
                    self.hole_world_position(),
                )),
                RigidBody::Fixed,
                Collider::cylinder(TRIGGER_HALF_HEIGHT, self.hole_radius + CAPTURE_MARGIN),
                Sensor,
                ActiveEvents::COLLISION_EVENTS,
                trigger_groups(),
                TriggerVolume { kind: TriggerKind::HoleCup, hole_index: Some(self.config.index) },
                Name::new(format!("{}_cup_trigger", self.name)),
            ))
            .id();
        self.parts.track_body(trigger);

        // 7. Sand zone triggers, filtered to the ball group only.
        let hazards = self.config.hazards.clone();
        for hazard in &hazards {
            let footprints = match Self::sand_footprints(hazard) {
                Ok(f) => f,
                Err(e) => {
                    warn!("{}: skipping hazard trigger: {e}", self.name);
                    continue;
                }
            };
            for footprint in footprints {
                let (collider, world_center) = match footprint {
                    Footprint::Box { center, half } => (
                        Collider::cuboid(half.x, HAZARD_TRIGGER_HALF_HEIGHT, half.z),
                        center,
                    ),
                    Footprint::Disc { center, radius } => {
                        (Collider::cylinder(HAZARD_TRIGGER_HALF_HEIGHT, radius), center)
                    }
                };
                let zone = ctx
                    .commands
                    .spawn((
                        TransformBundle::from_transform(Transform::from_translation(Vec3::new(
                            world_center.x,
                            self.center.y + self.surface_height + HAZARD_TRIGGER_HALF_HEIGHT,
                            world_center.z,
                        ))),
                        RigidBody::Fixed,
                        collider,
                        Sensor,
                        ActiveEvents::COLLISION_EVENTS,
                        SurfaceKind::Sand.friction(),
                        SurfaceKind::Sand.restitution(),
                        trigger_groups(),
                        TriggerVolume { kind: TriggerKind::BunkerZone, hole_index: Some(self.config.index) },
                        Name::new(format!("{}_sand_zone", self.name)),
                    ))
                    .id();
                self.parts.track_body(zone);
            }
        }

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

// ----------------------- Mesh generation -----------------------

/// Flat rectangular panel with a disc cut out at `hole` (panel-local XZ).
/// The subtraction is done at triangulation time: one ring of vertices on the
/// cup circle, one on the rectangle perimeter along the same rays, stitched
/// into quads. Normals face +Y.
fn generate_holed_panel(width: f32, length: f32, hole: Vec2, hole_radius: f32, segments: u32) -> Mesh {
    let segs = segments.max(8) as usize;
    let hw = width * 0.5;
    let hl = length * 0.5;

    let mut positions = Vec::with_capacity(segs * 2);
    let mut normals = Vec::with_capacity(segs * 2);
    let mut uvs = Vec::with_capacity(segs * 2);

    for i in 0..segs {
        let angle = i as f32 / segs as f32 * std::f32::consts::TAU;
        let dir = Vec2::new(angle.cos(), angle.sin());

        let inner = hole + dir * hole_radius;

        // Ray from the cup center to the rectangle perimeter. The cup lies
        // inside the rectangle, so one of the two axis hits is always finite.
        let tx = if dir.x.abs() > 1e-6 {
            (hw.copysign(dir.x) - hole.x) / dir.x
        } else {
            f32::INFINITY
        };
        let tz = if dir.y.abs() > 1e-6 {
            (hl.copysign(dir.y) - hole.y) / dir.y
        } else {
            f32::INFINITY
        };
        let outer = hole + dir * tx.min(tz);

        for p in [inner, outer] {
            positions.push([p.x, 0.0, p.y]);
            normals.push([0.0, 1.0, 0.0]);
            uvs.push([p.x / width + 0.5, p.y / length + 0.5]);
        }
    }

    let mut indices: Vec<u32> = Vec::with_capacity(segs * 6);
    for i in 0..segs {
        let j = (i + 1) % segs;
        let (inner_i, outer_i) = (2 * i as u32, 2 * i as u32 + 1);
        let (inner_j, outer_j) = (2 * j as u32, 2 * j as u32 + 1);
        indices.extend_from_slice(&[inner_i, outer_j, outer_i, inner_i, inner_j, outer_j]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Open-topped cup: inward-facing tube from y=0 down to -depth plus a bottom
/// cap. Visible only through the panel cutout above it.
fn generate_cup_mesh(radius: f32, depth: f32, segments: u32) -> Mesh {
    let segs = segments.max(8) as usize;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(segs * 3 + 2);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(positions.capacity());
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(positions.capacity());
    let mut indices: Vec<u32> = Vec::with_capacity(segs * 9);

    // Tube wall, seam column duplicated for clean UVs.
    for i in 0..=segs {
        let u = i as f32 / segs as f32;
        let angle = u * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        positions.push([radius * cos, 0.0, radius * sin]);
        normals.push([-cos, 0.0, -sin]);
        uvs.push([u, 0.0]);
        positions.push([radius * cos, -depth, radius * sin]);
        normals.push([-cos, 0.0, -sin]);
        uvs.push([u, 1.0]);
    }
    for i in 0..segs {
        let top_i = 2 * i as u32;
        let bot_i = top_i + 1;
        let top_j = top_i + 2;
        let bot_j = top_i + 3;
        indices.extend_from_slice(&[top_i, bot_i, top_j, top_j, bot_i, bot_j]);
    }

    // Bottom cap fan, facing up into the cup.
    let center = positions.len() as u32;
    positions.push([0.0, -depth, 0.0]);
    normals.push([0.0, 1.0, 0.0]);
    uvs.push([0.5, 0.5]);
    for i in 0..segs {
        let angle = i as f32 / segs as f32 * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        positions.push([radius * cos, -depth, radius * sin]);
        normals.push([0.0, 1.0, 0.0]);
        uvs.push([0.5 + cos * 0.5, 0.5 + sin * 0.5]);
    }
    for i in 0..segs {
        let a = center + 1 + i as u32;
        let b = center + 1 + ((i + 1) % segs) as u32;
        indices.extend_from_slice(&[center, b, a]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Flat disc in the XZ plane, normals +Y. Used for circular sand patches.
pub(crate) fn generate_disc_mesh(radius: f32, segments: u32) -> Mesh {
    let segs = segments.max(8) as usize;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(segs + 1);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(segs + 1);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(segs + 1);
    positions.push([0.0, 0.0, 0.0]);
    normals.push([0.0, 1.0, 0.0]);
    uvs.push([0.5, 0.5]);
    for i in 0..segs {
        let angle = i as f32 / segs as f32 * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        positions.push([radius * cos, 0.0, radius * sin]);
        normals.push([0.0, 1.0, 0.0]);
        uvs.push([0.5 + cos * 0.5, 0.5 + sin * 0.5]);
    }
    let mut indices: Vec<u32> = Vec::with_capacity(segs * 3);
    for i in 0..segs {
        let a = 1 + i as u32;
        let b = 1 + ((i + 1) % segs) as u32;
        indices.extend_from_slice(&[0, b, a]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}
