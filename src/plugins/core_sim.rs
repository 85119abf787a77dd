// Core simulation timing shared by gameplay systems and tests.
use bevy::prelude::*;
use bevy::time::Fixed;

#[derive(Resource, Default, Debug)]
pub struct SimState {
    pub tick: u64,
    pub elapsed_seconds: f32,
}

impl SimState {
    pub fn advance_fixed(&mut self) {
        self.tick += 1;
        self.elapsed_seconds = self.tick as f32 / 60.0;
    }
}

pub struct CoreSimPlugin;

impl Plugin for CoreSimPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimState::default())
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .add_systems(FixedUpdate, tick_state);
    }
}

fn tick_state(mut sim: ResMut<SimState>) {
    sim.advance_fixed();
}
