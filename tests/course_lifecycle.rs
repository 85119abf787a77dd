// Element lifecycle & coordinate tests: build holes/elements against a bare
// world and check what was spawned, where, and that disposal is exact.
use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use mini_putt::prelude::*;

fn test_world() -> World {
    let mut world = World::new();
    world.insert_resource(Assets::<Mesh>::default());
    world.insert_resource(Assets::<StandardMaterial>::default());
    world
}

/// Runs `f` with a BuildCtx over `world`, then applies the queued commands.
fn with_ctx<R>(world: &mut World, f: impl FnOnce(&mut BuildCtx) -> R) -> R {
    let mut state: SystemState<(
        Commands,
        ResMut<Assets<Mesh>>,
        ResMut<Assets<StandardMaterial>>,
    )> = SystemState::new(world);
    let result = {
        let (mut commands, mut meshes, mut materials) = state.get_mut(world);
        let mut ctx = BuildCtx {
            commands: &mut commands,
            meshes: &mut meshes,
            materials: &mut materials,
        };
        f(&mut ctx)
    };
    state.apply(world);
    result
}

fn entity_count(world: &World) -> usize {
    world.entities().len() as usize
}

fn sample_config() -> HoleConfiguration {
    HoleConfiguration {
        index: 0,
        hole_position: Vec3Def { x: 4.0, y: 0.0, z: 8.0 },
        start_position: Vec3Def { x: 0.0, y: 0.0, z: -8.0 },
        course_width: 6.0,
        course_length: 20.0,
        par: 2,
        center: None,
        hazards: Vec::new(),
    }
}

#[test]
fn hole_create_destroy_is_symmetric() {
    let mut world = test_world();
    let mut hole = HoleEntity::new(&sample_config());

    let created = with_ctx(&mut world, |ctx| hole.create(ctx));
    assert!(created);

    // surface, rim, cup, 4 walls, start marker
    assert_eq!(hole.mesh_count(), 8);
    // slab, 4 walls, cup trigger
    assert_eq!(hole.body_count(), 6);
    // tracked meshes + bodies + the group container
    assert_eq!(entity_count(&world), 15);

    with_ctx(&mut world, |ctx| hole.destroy(ctx.commands));
    assert_eq!(entity_count(&world), 0);
    assert_eq!(hole.mesh_count(), 0);
    assert_eq!(hole.body_count(), 0);
}

#[test]
fn hole_destroy_twice_is_safe() {
    let mut world = test_world();
    let mut hole = HoleEntity::new(&sample_config());
    with_ctx(&mut world, |ctx| hole.create(ctx));

    with_ctx(&mut world, |ctx| hole.destroy(ctx.commands));
    with_ctx(&mut world, |ctx| hole.destroy(ctx.commands));
    assert_eq!(entity_count(&world), 0);
}

#[test]
fn degraded_hole_still_cleans_up() {
    let mut world = test_world();
    let mut config = sample_config();
    // Too narrow to fit the cup: the build must fail without panicking.
    config.course_width = 0.2;
    let mut hole = HoleEntity::new(&config);

    let created = with_ctx(&mut world, |ctx| hole.create(ctx));
    assert!(!created);

    with_ctx(&mut world, |ctx| hole.destroy(ctx.commands));
    assert_eq!(entity_count(&world), 0);
}

#[test]
fn hazards_add_tracked_parts() {
    let mut world = test_world();
    let mut config = sample_config();
    config.hazards.push(HazardDef {
        kind: "sand".to_owned(),
        shape: HazardShape::Box,
        position: Vec3Def { x: 2.5, y: 0.0, z: 3.0 },
        size: Some(Vec3Def { x: 2.0, y: 0.5, z: 1.5 }),
        sub_shapes: None,
    });
    // Malformed: unknown kind, skipped without aborting the build.
    config.hazards.push(HazardDef {
        kind: "lava".to_owned(),
        shape: HazardShape::Box,
        position: Vec3Def { x: 0.0, y: 0.0, z: 0.0 },
        size: Some(Vec3Def { x: 1.0, y: 0.5, z: 1.0 }),
        sub_shapes: None,
    });
    let mut hole = HoleEntity::new(&config);

    let created = with_ctx(&mut world, |ctx| hole.create(ctx));
    assert!(created);
    assert_eq!(hole.mesh_count(), 9);
    assert_eq!(hole.body_count(), 7);

    with_ctx(&mut world, |ctx| hole.destroy(ctx.commands));
    assert_eq!(entity_count(&world), 0);
}

#[test]
fn cup_trigger_sits_at_the_configured_world_position() {
    let mut world = test_world();
    let mut hole = HoleEntity::new(&sample_config());
    with_ctx(&mut world, |ctx| hole.create(ctx));

    let mut found = None;
    let mut q = world.query::<(&TriggerVolume, &Transform)>();
    for (trigger, transform) in q.iter(&world) {
        if trigger.kind == TriggerKind::HoleCup {
            found = Some(*transform);
        }
    }
    let transform = found.expect("cup trigger body");
    // No double application of the group center.
    assert_eq!(transform.translation, Vec3::new(4.0, 0.0, 8.0));
}

#[test]
fn wall_bodies_are_offset_from_the_group_center() {
    let mut world = test_world();
    let mut hole = HoleEntity::new(&sample_config());
    with_ctx(&mut world, |ctx| hole.create(ctx));

    // center = midpoint(start, hole) = (2, 0, 0); the left wall collider sits
    // at x = 2 - (width/2 + thickness/2) = -1.125.
    let mut xs: Vec<f32> = Vec::new();
    let mut q = world.query::<(&Name, &Transform)>();
    for (name, transform) in q.iter(&world) {
        if name.as_str().ends_with("wall_left") {
            xs.push(transform.translation.x);
        }
    }
    assert!(xs.iter().any(|x| (*x - (-1.125)).abs() < 1e-6), "left wall at {xs:?}");
}

#[test]
fn registry_rejects_unknown_tags() {
    let registry = CourseElementRegistry::default();
    let def = ElementDef {
        kind: "volcano".to_owned(),
        name: "nope".to_owned(),
        position: Vec3Def { x: 0.0, y: 0.0, z: 0.0 },
        size: None,
        rotation_deg: 0.0,
    };
    let result = registry.create_element("volcano", &ElementConfig::Standalone(&def));
    assert!(matches!(result, Err(CourseError::UnknownElementType(_))));
}

#[test]
fn registry_rejects_mismatched_configs() {
    let registry = CourseElementRegistry::default();
    let config = sample_config();
    let result = registry.create_element("wall", &ElementConfig::Hole(&config));
    assert!(matches!(result, Err(CourseError::MismatchedConfig(_))));
}

#[test]
fn batch_creation_skips_bad_configs() {
    let mut world = test_world();
    let registry = CourseElementRegistry::default();
    let defs = vec![
        ElementDef {
            kind: "bunker".to_owned(),
            name: "bunker_a".to_owned(),
            position: Vec3Def { x: -10.0, y: 0.0, z: 0.0 },
            size: Some(Vec3Def { x: 1.5, y: 0.0, z: 1.5 }),
            rotation_deg: 0.0,
        },
        ElementDef {
            kind: "volcano".to_owned(),
            name: "skipped".to_owned(),
            position: Vec3Def { x: 0.0, y: 0.0, z: 0.0 },
            size: None,
            rotation_deg: 0.0,
        },
        ElementDef {
            kind: "wall".to_owned(),
            name: "divider".to_owned(),
            position: Vec3Def { x: 10.0, y: 0.0, z: 0.0 },
            size: Some(Vec3Def { x: 4.0, y: 0.6, z: 0.3 }),
            rotation_deg: 90.0,
        },
    ];

    let mut elements =
        with_ctx(&mut world, |ctx| registry.create_elements_from_config(&defs, ctx));
    assert_eq!(elements.len(), 2);
    assert!(entity_count(&world) > 0);

    with_ctx(&mut world, |ctx| {
        for element in &mut elements {
            element.destroy(ctx.commands);
        }
    });
    assert_eq!(entity_count(&world), 0);
}

#[test]
fn manager_rejects_out_of_range_indices() {
    let mut world = test_world();
    let mut manager = CourseManager::new(CourseDef::default_course());

    let total = manager.total_holes();
    let ok = with_ctx(&mut world, |ctx| manager.initialize_hole(total, ctx));
    assert!(!ok);
    assert!(manager.current_hole().is_none());

    // usize has no -1; the wraparound value must fail the same way.
    let ok = with_ctx(&mut world, |ctx| manager.initialize_hole(usize::MAX, ctx));
    assert!(!ok);
    assert!(manager.current_hole().is_none());

    // A valid hole survives a later failed call untouched.
    let ok = with_ctx(&mut world, |ctx| manager.initialize_hole(0, ctx));
    assert!(ok);
    let ok = with_ctx(&mut world, |ctx| manager.initialize_hole(total, ctx));
    assert!(!ok);
    assert_eq!(manager.current_hole_index(), 0);
    assert!(manager.current_hole().is_some());
}

#[test]
fn create_course_is_one_based() {
    let mut world = test_world();
    let registry = CourseElementRegistry::default();
    let mut manager = CourseManager::new(CourseDef::default_course());

    let ok = with_ctx(&mut world, |ctx| manager.create_course(0, &registry, ctx));
    assert!(!ok);
    let ok = with_ctx(&mut world, |ctx| manager.create_course(4, &registry, ctx));
    assert!(!ok);

    let ok = with_ctx(&mut world, |ctx| manager.create_course(2, &registry, ctx));
    assert!(ok);
    assert_eq!(manager.current_hole_index(), 1);
    assert_eq!(manager.current_hole_number(), 2);
    assert_eq!(manager.hole_par(), Some(3));
}
