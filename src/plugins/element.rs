// Course element contract, shared mesh/body bookkeeping, and the physics
// surface presets (named materials + collision groups) used by every element.
use bevy::prelude::*;
use bevy_rapier3d::prelude::{CoefficientCombineRule, CollisionGroups, Friction, Group, Restitution};
use thiserror::Error;
use uuid::Uuid;

// ----------------------- Collision filtering -----------------------

pub const BALL_GROUP: Group = Group::GROUP_1;
pub const COURSE_GROUP: Group = Group::GROUP_2;
pub const TRIGGER_GROUP: Group = Group::GROUP_3;

/// Groups for solid course geometry (surfaces, walls, obstacles).
pub fn solid_groups() -> CollisionGroups {
    CollisionGroups::new(COURSE_GROUP, BALL_GROUP)
}

/// Groups for trigger volumes: members of the trigger group, filtered so they
/// only ever pair with the ball.
pub fn trigger_groups() -> CollisionGroups {
    CollisionGroups::new(TRIGGER_GROUP, BALL_GROUP)
}

pub fn ball_groups() -> CollisionGroups {
    CollisionGroups::new(BALL_GROUP, COURSE_GROUP | TRIGGER_GROUP)
}

// ----------------------- Named surface materials -----------------------

/// Named physics materials looked up when attaching friction/restitution to
/// bodies. Values are tuned for a ball of radius ~0.2 on a flat course.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Ground,
    Bumper,
    Sand,
    Default,
}

impl SurfaceKind {
    pub fn friction(self) -> Friction {
        let coefficient = match self {
            SurfaceKind::Ground => 0.6,
            SurfaceKind::Bumper => 0.2,
            SurfaceKind::Sand => 1.4,
            SurfaceKind::Default => 0.5,
        };
        Friction { coefficient, combine_rule: CoefficientCombineRule::Average }
    }

    pub fn restitution(self) -> Restitution {
        let coefficient = match self {
            SurfaceKind::Ground => 0.3,
            SurfaceKind::Bumper => 0.75,
            SurfaceKind::Sand => 0.05,
            SurfaceKind::Default => 0.3,
        };
        Restitution { coefficient, combine_rule: CoefficientCombineRule::Average }
    }
}

// ----------------------- Trigger volumes -----------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    HoleCup,
    BunkerZone,
}

/// Tag on sensor bodies. Triggers generate events only; they never resolve
/// motion. `hole_index` is the owning hole for cup triggers, `None` for
/// free-standing zones.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerVolume {
    pub kind: TriggerKind,
    pub hole_index: Option<usize>,
}

// ----------------------- Errors -----------------------

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("unknown element type `{0}`")]
    UnknownElementType(String),
    #[error("hole index {index} out of range for a {total}-hole course")]
    HoleIndexOutOfRange { index: usize, total: usize },
    #[error("malformed hazard: {0}")]
    MalformedHazard(String),
    #[error("config does not match element kind `{0}`")]
    MismatchedConfig(&'static str),
    #[error("{0} unavailable")]
    ResourceUnavailable(&'static str),
}

// ----------------------- Build context -----------------------

/// Borrowed world access handed to element lifecycle calls. Systems re-borrow
/// all three from the `World` every run, so a stale handle cannot survive a
/// world rebuild between holes.
pub struct BuildCtx<'w, 's, 'a> {
    pub commands: &'a mut Commands<'w, 's>,
    pub meshes: &'a mut Assets<Mesh>,
    pub materials: &'a mut Assets<StandardMaterial>,
}

// ----------------------- Bookkeeping -----------------------

/// Embeddable mesh/body ledger shared by all element variants.
///
/// Invariant: every entity an element spawns during `create()` lands in
/// exactly one of these lists (the group entity aside), and `despawn_all`
/// removes exactly that set. Lists are drained unconditionally, so disposal
/// stays correct after a partially failed build and is idempotent.
#[derive(Debug, Default)]
pub struct ElementParts {
    pub group: Option<Entity>,
    pub meshes: Vec<Entity>,
    pub bodies: Vec<Entity>,
}

impl ElementParts {
    /// Spawns the render-side group container on first use. Visual children
    /// are parented here and positioned in group-local coordinates.
    pub fn ensure_group(&mut self, ctx: &mut BuildCtx, name: &str, origin: Transform) -> Entity {
        if let Some(group) = self.group {
            return group;
        }
        let group = ctx
            .commands
            .spawn((SpatialBundle::from_transform(origin), Name::new(name.to_owned())))
            .id();
        self.group = Some(group);
        group
    }

    pub fn track_mesh(&mut self, entity: Entity) -> Entity {
        self.meshes.push(entity);
        entity
    }

    pub fn track_body(&mut self, entity: Entity) -> Entity {
        self.bodies.push(entity);
        entity
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Despawns every tracked entity and the group container. Asset handles
    /// drop with their entities; `Assets` frees the data once unreferenced.
    pub fn despawn_all(&mut self, commands: &mut Commands) {
        for entity in self.meshes.drain(..) {
            if let Some(mut cmds) = commands.get_entity(entity) {
                cmds.despawn();
            }
        }
        for entity in self.bodies.drain(..) {
            if let Some(mut cmds) = commands.get_entity(entity) {
                cmds.despawn();
            }
        }
        if let Some(group) = self.group.take() {
            if let Some(mut cmds) = commands.get_entity(group) {
                cmds.despawn_recursive();
            }
        }
    }
}

// ----------------------- Element contract -----------------------

/// A unit owning a set of visual nodes and physics bodies with a
/// create/update/destroy lifecycle. `create` is not idempotent; callers
/// invoke it exactly once per instance.
pub trait CourseElement: Send + Sync {
    fn id(&self) -> Uuid;
    fn name(&self) -> &str;
    fn element_type(&self) -> &'static str;
    /// Group origin, world space.
    fn position(&self) -> Vec3;

    fn create(&mut self, ctx: &mut BuildCtx) -> bool {
        let visuals = self.create_visuals(ctx);
        let physics = self.create_physics(ctx);
        visuals && physics
    }

    fn create_visuals(&mut self, _ctx: &mut BuildCtx) -> bool {
        true
    }

    fn create_physics(&mut self, _ctx: &mut BuildCtx) -> bool {
        true
    }

    fn update(&mut self, _dt: f32) {}

    fn destroy(&mut self, commands: &mut Commands);

    fn mesh_count(&self) -> usize;
    fn body_count(&self) -> usize;
}
