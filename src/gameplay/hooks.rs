use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::app::state::GameplayState;
use crate::core::components::{CurrentDrop, Sphere};
use crate::core::system::system_order::PreStepSet;

/// Physics hooks for external power-up effects: push a sphere, override its
/// mass, delete it. The effects themselves (unlocks, durations, costs) live
/// outside the core; these events are the entire contract.
pub struct PowerUpHooksPlugin;

impl Plugin for PowerUpHooksPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ApplyImpulse>()
            .add_event::<OverrideMass>()
            .add_event::<RemoveSphere>()
            .add_systems(
                Update,
                apply_power_up_hooks
                    .in_set(PreStepSet)
                    .run_if(in_state(GameplayState::Playing)),
            );
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ApplyImpulse {
    pub sphere: Entity,
    pub impulse: Vec2,
}

/// Bounded-duration mass override; reverting is the caller's job (send the
/// tier-derived mass back when the effect expires).
#[derive(Event, Debug, Clone, Copy)]
pub struct OverrideMass {
    pub sphere: Entity,
    pub mass: f32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct RemoveSphere {
    pub sphere: Entity,
}

/// All hooks drain within the single-threaded step they were sent in.
/// Targets that are gone, or the falling sphere (no body), are skipped.
fn apply_power_up_hooks(
    mut commands: Commands,
    mut impulses: EventReader<ApplyImpulse>,
    mut masses: EventReader<OverrideMass>,
    mut removals: EventReader<RemoveSphere>,
    mut bodies: Query<&mut ExternalImpulse, (With<Sphere>, Without<CurrentDrop>)>,
    released: Query<(), (With<Sphere>, With<RigidBody>)>,
) {
    for hook in impulses.read() {
        if let Ok(mut imp) = bodies.get_mut(hook.sphere) {
            imp.impulse += hook.impulse;
        }
    }
    for hook in masses.read() {
        if released.contains(hook.sphere) {
            commands
                .entity(hook.sphere)
                .insert(ColliderMassProperties::Mass(hook.mass.max(0.0)));
        }
    }
    for hook in removals.read() {
        if released.contains(hook.sphere) {
            commands.entity(hook.sphere).despawn();
        }
    }
}
