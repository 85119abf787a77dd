// Course & hole configuration (RON) and the startup loader.
use bevy::prelude::*;
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::fs;

// ----------------------- Course Definition (RON) -----------------------

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Vec3Def { pub x: f32, pub y: f32, pub z: f32 }
impl Vec3Def {
    pub fn to_vec3(self) -> Vec3 { Vec3::new(self.x, self.y, self.z) }
    pub fn from_vec3(v: Vec3) -> Self { Self { x: v.x, y: v.y, z: v.z } }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum HazardShape {
    Box,
    Circle,
}

/// One box of a compound hazard footprint. Position is world space.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct HazardBoxDef {
    pub position: Vec3Def,
    pub size: Vec3Def,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HazardDef {
    /// Hazard kind tag; only "sand" builds anything today.
    pub kind: String,
    pub shape: HazardShape,
    pub position: Vec3Def,
    #[serde(default)]
    pub size: Option<Vec3Def>,
    /// Compound footprint; overrides `size` when present.
    #[serde(default)]
    pub sub_shapes: Option<Vec<HazardBoxDef>>,
}

/// Immutable per-hole input data, static for the game session.
#[derive(Debug, Deserialize, Clone)]
pub struct HoleConfiguration {
    pub index: usize,
    pub hole_position: Vec3Def,
    pub start_position: Vec3Def,
    pub course_width: f32,
    pub course_length: f32,
    pub par: u32,
    #[serde(default)]
    pub center: Option<Vec3Def>,
    #[serde(default)]
    pub hazards: Vec<HazardDef>,
}

impl HoleConfiguration {
    /// Group origin for the hole: explicit center when supplied, otherwise
    /// the midpoint of start and cup.
    pub fn center_position(&self) -> Vec3 {
        match self.center {
            Some(c) => c.to_vec3(),
            None => (self.start_position.to_vec3() + self.hole_position.to_vec3()) * 0.5,
        }
    }
}

/// Config for free-standing registry elements (bunkers, walls).
#[derive(Debug, Deserialize, Clone)]
pub struct ElementDef {
    pub kind: String,
    pub name: String,
    pub position: Vec3Def,
    #[serde(default)]
    pub size: Option<Vec3Def>,
    #[serde(default)]
    pub rotation_deg: f32,
}

/// Which hole detector is canonical for this course. Exactly one runs:
/// `Trigger` courses consume sensor collision events, `Hybrid` (open-field)
/// courses run the contact+position detector instead.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionMode {
    #[default]
    Trigger,
    Hybrid,
}

#[derive(Debug, Deserialize, Clone, Resource)]
pub struct CourseDef {
    pub name: String,
    #[serde(default)]
    pub detection: DetectionMode,
    pub holes: Vec<HoleConfiguration>,
    #[serde(default)]
    pub elements: Vec<ElementDef>,
}

impl CourseDef {
    /// Built-in three-hole layout used when no course file is available and
    /// by the integration tests.
    pub fn default_course() -> Self {
        let hole = |index: usize, hole: (f32, f32), start: (f32, f32), par: u32| HoleConfiguration {
            index,
            hole_position: Vec3Def { x: hole.0, y: 0.0, z: hole.1 },
            start_position: Vec3Def { x: start.0, y: 0.0, z: start.1 },
            course_width: 6.0,
            course_length: 20.0,
            par,
            center: None,
            hazards: Vec::new(),
        };
        Self {
            name: "default".to_owned(),
            detection: DetectionMode::Trigger,
            holes: vec![
                hole(0, (0.0, 8.0), (0.0, -8.0), 2),
                hole(1, (22.0, 8.0), (18.0, -8.0), 3),
                hole(2, (40.0, 6.0), (36.0, -8.0), 3),
            ],
            elements: Vec::new(),
        }
    }
}

// ----------------------- Loader -----------------------

/// Reads the course definition and inserts it as a resource. A pre-inserted
/// `CourseDef` (tests, tooling) is respected and left untouched.
pub fn load_course(mut commands: Commands, existing: Option<Res<CourseDef>>) {
    if existing.is_some() {
        return;
    }

    #[cfg(target_arch = "wasm32")]
    {
        // Embed the course at compile time for web (no filesystem in browser).
        let data = include_str!("../../assets/courses/course1.ron");
        match ron::from_str::<CourseDef>(data) {
            Ok(def) => commands.insert_resource(def),
            Err(e) => error!("Failed to parse embedded course: {e}"),
        }
        return;
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let path = "assets/courses/course1.ron";
        match fs::read_to_string(path) {
            Ok(data) => match ron::from_str::<CourseDef>(&data) {
                Ok(def) => commands.insert_resource(def),
                Err(e) => error!("Failed to parse {path}: {e}"),
            },
            Err(_) => {
                warn!("Course file {path} not found; using built-in course");
                commands.insert_resource(CourseDef::default_course());
            }
        }
    }
}
