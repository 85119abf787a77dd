//! Convenience re-exports for frequently used types & plugins.
pub use crate::plugins::ball::{Ball, BallParams, BallPlugin, BallSpawnRequest};
pub use crate::plugins::bunker::BunkerElement;
pub use crate::plugins::config::{
    CourseDef, DetectionMode, ElementDef, HazardDef, HazardShape, HoleConfiguration, Vec3Def,
};
pub use crate::plugins::core_sim::{CoreSimPlugin, SimState};
pub use crate::plugins::course_manager::{
    CourseManager, CourseManagerPlugin, CoursePhase, HazardEvent,
};
pub use crate::plugins::detection::{capture_radius, is_captured, planar_distance};
pub use crate::plugins::element::{
    BuildCtx, CourseElement, CourseError, ElementParts, SurfaceKind, TriggerKind, TriggerVolume,
};
pub use crate::plugins::hole::HoleEntity;
pub use crate::plugins::registry::{CourseElementRegistry, ElementConfig, ElementKind};
pub use crate::plugins::wall::WallElement;
