// Course sequencing: tracks the active hole, consumes trigger events, and
// runs the deferred hole-transition state machine.
//
// Transitions are deliberately one tick removed from the trigger callback
// that requested them: the collision-event pass only flags completion, and
// the structural world mutation (teardown/rebuild) happens on the following
// `update`. The pending slot doubles as the re-entrancy guard; duplicate or
// stale completion signals are dropped, never queued.
use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionEvent;

use crate::plugins::ball::{Ball, BallSpawnRequest};
use crate::plugins::config::{CourseDef, DetectionMode, ElementDef, HoleConfiguration};
use crate::plugins::detection::hybrid_hole_detection;
use crate::plugins::element::{BuildCtx, CourseElement, CourseError, TriggerKind, TriggerVolume};
use crate::plugins::hole::HoleEntity;
use crate::plugins::registry::CourseElementRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoursePhase {
    Idle,
    Building,
    Active,
    Transitioning,
    /// Terminal state after the last hole is completed.
    Complete,
}

/// Advance scheduled by a completion signal, drained on the next update.
#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    from_index: usize,
}

/// Ball entered/left a hazard zone. The payload is the trigger body.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardEvent {
    Entered(Entity),
    Exited(Entity),
}

#[derive(Resource)]
pub struct CourseManager {
    holes: Vec<HoleConfiguration>,
    element_defs: Vec<ElementDef>,
    detection: DetectionMode,
    phase: CoursePhase,
    current_hole_index: usize,
    current_hole: Option<HoleEntity>,
    standalone_elements: Vec<Box<dyn CourseElement>>,
    hole_complete: bool,
    pending: Option<PendingTransition>,
    hole_elapsed_seconds: f32,
}

impl CourseManager {
    pub fn new(def: CourseDef) -> Self {
        Self {
            holes: def.holes,
            element_defs: def.elements,
            detection: def.detection,
            phase: CoursePhase::Idle,
            current_hole_index: 0,
            current_hole: None,
            standalone_elements: Vec::new(),
            hole_complete: false,
            pending: None,
            hole_elapsed_seconds: 0.0,
        }
    }

    pub fn phase(&self) -> CoursePhase {
        self.phase
    }

    pub fn detection(&self) -> DetectionMode {
        self.detection
    }

    pub fn total_holes(&self) -> usize {
        self.holes.len()
    }

    pub fn current_hole_index(&self) -> usize {
        self.current_hole_index
    }

    /// 1-based hole number for display.
    pub fn current_hole_number(&self) -> usize {
        self.current_hole_index + 1
    }

    pub fn current_hole(&self) -> Option<&HoleEntity> {
        self.current_hole.as_ref()
    }

    pub fn has_next_hole(&self) -> bool {
        self.current_hole_index + 1 < self.holes.len()
    }

    pub fn hole_position(&self) -> Option<Vec3> {
        self.current_hole.as_ref().map(|h| h.hole_world_position())
    }

    pub fn hole_start_position(&self) -> Option<Vec3> {
        self.current_hole.as_ref().map(|h| h.start_world_position())
    }

    pub fn hole_par(&self) -> Option<u32> {
        self.current_hole.as_ref().map(|h| h.par())
    }

    /// Builds the hole at `index`. Out-of-range indices fail without touching
    /// the current hole; a degraded build is logged and kept.
    pub fn initialize_hole(&mut self, index: usize, ctx: &mut BuildCtx) -> bool {
        if index >= self.holes.len() {
            error!(
                "{}",
                CourseError::HoleIndexOutOfRange { index, total: self.holes.len() }
            );
            return false;
        }
        self.phase = CoursePhase::Building;
        let config = self.holes[index].clone();
        let mut hole = HoleEntity::new(&config);
        if !hole.create(ctx) {
            warn!(
                "hole {} built degraded; downstream must tolerate missing parts",
                index + 1
            );
        }
        info!(
            "initialized hole {} ({} meshes, {} bodies)",
            index + 1,
            hole.mesh_count(),
            hole.body_count()
        );
        self.current_hole = Some(hole);
        self.current_hole_index = index;
        self.hole_complete = false;
        self.hole_elapsed_seconds = 0.0;
        self.phase = CoursePhase::Active;
        true
    }

    pub fn clear_current_hole(&mut self, commands: &mut Commands) {
        if let Some(mut hole) = self.current_hole.take() {
            hole.destroy(commands);
        }
    }

    /// Full (re)build of the course at a 1-based hole number: free-standing
    /// elements first, then the target hole. Returns false on any failure and
    /// never panics; world access is re-borrowed fresh from the ECS each
    /// call, so a physics world rebuilt between holes cannot leave a stale
    /// handle here.
    pub fn create_course(
        &mut self,
        hole_number: usize,
        registry: &CourseElementRegistry,
        ctx: &mut BuildCtx,
    ) -> bool {
        if hole_number == 0 || hole_number > self.holes.len() {
            error!(
                "create_course: hole number {hole_number} out of range 1..={}",
                self.holes.len()
            );
            return false;
        }
        for element in &mut self.standalone_elements {
            element.destroy(ctx.commands);
        }
        self.standalone_elements = registry.create_elements_from_config(&self.element_defs, ctx);
        self.clear_current_hole(ctx.commands);
        self.initialize_hole(hole_number - 1, ctx)
    }

    /// Collision-callback entry point. Records completion exactly once for
    /// the active hole; duplicate, stale, or mid-transition signals are
    /// dropped and logged (a conflict, not an error).
    pub fn on_ball_in_hole(&mut self, hole_index: usize) -> bool {
        if self.phase != CoursePhase::Active || self.pending.is_some() {
            info!("dropping completion signal for hole {hole_index}: no hole accepting completions");
            return false;
        }
        if hole_index != self.current_hole_index {
            warn!(
                "dropping stale completion signal for hole {hole_index} (active: {})",
                self.current_hole_index
            );
            return false;
        }
        if self.hole_complete {
            info!("dropping duplicate completion signal for hole {hole_index}");
            return false;
        }
        self.hole_complete = true;
        info!(
            "ball in hole {} after {:.1}s",
            self.current_hole_number(),
            self.hole_elapsed_seconds
        );
        true
    }

    /// Per-tick drive. Tick N flags the pending transition; tick N+1 drains
    /// it and performs the teardown/rebuild, keeping structural world
    /// mutation off the collision callback's call stack.
    pub fn update(
        &mut self,
        dt: f32,
        ctx: &mut BuildCtx,
        ball_requests: &mut EventWriter<BallSpawnRequest>,
    ) {
        self.hole_elapsed_seconds += dt;
        if let Some(hole) = self.current_hole.as_mut() {
            hole.update(dt);
        }
        for element in &mut self.standalone_elements {
            element.update(dt);
        }

        if let Some(pending) = self.pending.take() {
            self.run_transition(pending, ctx, ball_requests);
            return;
        }
        if self.hole_complete && self.phase == CoursePhase::Active {
            self.pending = Some(PendingTransition { from_index: self.current_hole_index });
        }
    }

    fn run_transition(
        &mut self,
        pending: PendingTransition,
        ctx: &mut BuildCtx,
        ball_requests: &mut EventWriter<BallSpawnRequest>,
    ) {
        self.phase = CoursePhase::Transitioning;
        self.clear_current_hole(ctx.commands);

        let next = pending.from_index + 1;
        let outcome = if next < self.holes.len() {
            if self.initialize_hole(next, ctx) {
                if let Some(start) = self.hole_start_position() {
                    ball_requests.send(BallSpawnRequest { position: start });
                }
                CoursePhase::Active
            } else {
                error!("transition to hole {} failed", next + 1);
                CoursePhase::Idle
            }
        } else {
            info!("course complete after {} holes", self.holes.len());
            CoursePhase::Complete
        };

        // Guard flags always reset, whatever happened above.
        self.hole_complete = false;
        self.pending = None;
        self.phase = outcome;
    }
}

// ----------------------- Plugin & systems -----------------------

pub struct CourseManagerPlugin;

impl Plugin for CourseManagerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CourseElementRegistry>()
            .add_event::<HazardEvent>()
            .add_event::<BallSpawnRequest>()
            .add_systems(Startup, (crate::plugins::config::load_course, setup_course).chain())
            .add_systems(
                Update,
                (read_trigger_events, hybrid_hole_detection, advance_course).chain(),
            );
    }
}

/// Builds the course from the loaded definition and requests the first ball.
fn setup_course(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    def: Option<Res<CourseDef>>,
    registry: Res<CourseElementRegistry>,
    mut ball_requests: EventWriter<BallSpawnRequest>,
) {
    let Some(def) = def else {
        warn!(
            "{}; course manager not created",
            CourseError::ResourceUnavailable("course definition")
        );
        return;
    };
    let mut manager = CourseManager::new(def.clone());
    {
        let mut ctx = BuildCtx {
            commands: &mut commands,
            meshes: &mut meshes,
            materials: &mut materials,
        };
        if manager.create_course(1, &registry, &mut ctx) {
            if let Some(start) = manager.hole_start_position() {
                ball_requests.send(BallSpawnRequest { position: start });
            }
        }
    }
    commands.insert_resource(manager);
}

/// Drains rapier collision events and routes ball/trigger pairings: cup
/// triggers feed the manager (trigger-detection courses only), hazard zones
/// become `HazardEvent`s on both enter and exit.
fn read_trigger_events(
    mut events: EventReader<CollisionEvent>,
    manager: Option<ResMut<CourseManager>>,
    triggers: Query<&TriggerVolume>,
    ball: Query<Entity, With<Ball>>,
    mut hazards: EventWriter<HazardEvent>,
) {
    let Some(mut manager) = manager else {
        events.clear();
        return;
    };
    let Ok(ball_entity) = ball.get_single() else {
        events.clear();
        return;
    };
    for event in events.read() {
        let (a, b, started) = match event {
            CollisionEvent::Started(a, b, _) => (*a, *b, true),
            CollisionEvent::Stopped(a, b, _) => (*a, *b, false),
        };
        let other = if a == ball_entity {
            b
        } else if b == ball_entity {
            a
        } else {
            continue;
        };
        let Ok(trigger) = triggers.get(other) else {
            continue;
        };
        match trigger.kind {
            TriggerKind::HoleCup => {
                if started && manager.detection() == DetectionMode::Trigger {
                    if let Some(index) = trigger.hole_index {
                        manager.on_ball_in_hole(index);
                    }
                }
            }
            TriggerKind::BunkerZone => {
                hazards.send(if started {
                    HazardEvent::Entered(other)
                } else {
                    HazardEvent::Exited(other)
                });
            }
        }
    }
}

fn advance_course(
    time: Res<Time>,
    manager: Option<ResMut<CourseManager>>,
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ball_requests: EventWriter<BallSpawnRequest>,
) {
    let Some(mut manager) = manager else { return };
    let mut ctx = BuildCtx {
        commands: &mut commands,
        meshes: &mut meshes,
        materials: &mut materials,
    };
    manager.update(time.delta_seconds(), &mut ctx, &mut ball_requests);
}
