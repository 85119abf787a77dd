// Element factory: maps a config type tag onto a constructor for the
// matching CourseElement variant. Dispatch is an exhaustive enum rather than
// free-form string lookup; tags are parsed once at the boundary.
use bevy::prelude::*;
use std::collections::HashMap;
use std::str::FromStr;

use crate::plugins::bunker::BunkerElement;
use crate::plugins::config::{ElementDef, HoleConfiguration};
use crate::plugins::element::{BuildCtx, CourseElement, CourseError};
use crate::plugins::hole::HoleEntity;
use crate::plugins::wall::WallElement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Hole,
    Bunker,
    Wall,
}

impl FromStr for ElementKind {
    type Err = CourseError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "hole" => Ok(ElementKind::Hole),
            "bunker" => Ok(ElementKind::Bunker),
            "wall" => Ok(ElementKind::Wall),
            other => Err(CourseError::UnknownElementType(other.to_owned())),
        }
    }
}

/// Config handed to a constructor. Holes carry the full hole configuration;
/// everything else uses the generic element def.
pub enum ElementConfig<'a> {
    Hole(&'a HoleConfiguration),
    Standalone(&'a ElementDef),
}

pub type ElementCtor = fn(&ElementConfig) -> Result<Box<dyn CourseElement>, CourseError>;

#[derive(Resource)]
pub struct CourseElementRegistry {
    ctors: HashMap<ElementKind, ElementCtor>,
}

impl Default for CourseElementRegistry {
    fn default() -> Self {
        let mut registry = Self { ctors: HashMap::new() };
        registry.register(ElementKind::Hole, |config| match config {
            ElementConfig::Hole(c) => Ok(Box::new(HoleEntity::new(c))),
            ElementConfig::Standalone(_) => Err(CourseError::MismatchedConfig("hole")),
        });
        registry.register(ElementKind::Bunker, |config| match config {
            ElementConfig::Standalone(def) => Ok(Box::new(BunkerElement::from_def(def))),
            ElementConfig::Hole(_) => Err(CourseError::MismatchedConfig("bunker")),
        });
        registry.register(ElementKind::Wall, |config| match config {
            ElementConfig::Standalone(def) => Ok(Box::new(WallElement::from_def(def))),
            ElementConfig::Hole(_) => Err(CourseError::MismatchedConfig("wall")),
        });
        registry
    }
}

impl CourseElementRegistry {
    /// Associates a kind with a constructor. Re-registering silently
    /// overwrites the previous constructor.
    pub fn register(&mut self, kind: ElementKind, ctor: ElementCtor) {
        self.ctors.insert(kind, ctor);
    }

    pub fn create_element(
        &self,
        tag: &str,
        config: &ElementConfig,
    ) -> Result<Box<dyn CourseElement>, CourseError> {
        let kind = ElementKind::from_str(tag)?;
        let ctor = self
            .ctors
            .get(&kind)
            .ok_or_else(|| CourseError::UnknownElementType(tag.to_owned()))?;
        ctor(config)
    }

    /// Instantiate, then create. A failed `create()` is logged and the
    /// degraded instance is still returned so its tracked parts stay
    /// destroyable; callers treat `false` builds as degraded, not fatal.
    pub fn create_and_initialize_element(
        &self,
        tag: &str,
        config: &ElementConfig,
        ctx: &mut BuildCtx,
    ) -> Result<Box<dyn CourseElement>, CourseError> {
        let mut element = self.create_element(tag, config)?;
        if !element.create(ctx) {
            warn!("element `{}` ({tag}) built degraded", element.name());
        }
        Ok(element)
    }

    /// Best-effort batch creation for free-standing elements. Configs with a
    /// missing or unknown tag, or whose construction fails, are skipped and
    /// logged; the batch never aborts.
    pub fn create_elements_from_config(
        &self,
        defs: &[ElementDef],
        ctx: &mut BuildCtx,
    ) -> Vec<Box<dyn CourseElement>> {
        let mut elements = Vec::with_capacity(defs.len());
        for def in defs {
            if def.kind.is_empty() {
                warn!("skipping element `{}`: missing type tag", def.name);
                continue;
            }
            match self.create_and_initialize_element(&def.kind, &ElementConfig::Standalone(def), ctx)
            {
                Ok(element) => elements.push(element),
                Err(e) => warn!("skipping element `{}`: {e}", def.name),
            }
        }
        elements
    }
}
