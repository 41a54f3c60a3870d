use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::app::state::GameplayState;
use crate::core::components::{CurrentDrop, Sphere};
use crate::core::config::GameConfig;
use crate::core::system::system_order::RuleResolveSet;

/// Collision category wiring. Wall contacts affect physics but are never
/// reported to gameplay logic; the sensor only ever pairs with spheres.
pub mod groups {
    use bevy_rapier2d::prelude::{CollisionGroups, Group};

    pub const SPHERES: Group = Group::GROUP_1;
    pub const WALLS: Group = Group::GROUP_2;
    pub const SENSORS: Group = Group::GROUP_3;

    pub fn sphere() -> CollisionGroups {
        CollisionGroups::new(SPHERES, SPHERES | WALLS | SENSORS)
    }
    pub fn wall() -> CollisionGroups {
        CollisionGroups::new(WALLS, SPHERES)
    }
    pub fn sensor() -> CollisionGroups {
        CollisionGroups::new(SENSORS, SPHERES)
    }
}

/// Wrapper configuring Rapier for the flask simulation: gravity from config,
/// pipeline halt while paused / game over, and stability safeguards.
pub struct PhysicsSetupPlugin;

impl Plugin for PhysicsSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
            .add_systems(Startup, configure_rapier)
            .add_systems(Update, sync_pipeline_active)
            .add_systems(
                Update,
                (clamp_velocities, recover_diverged)
                    .in_set(RuleResolveSet)
                    .run_if(in_state(GameplayState::Playing)),
            );
    }
}

fn configure_rapier(mut rapier_cfg: Query<&mut RapierConfiguration>, cfg: Res<GameConfig>) {
    for mut rc in rapier_cfg.iter_mut() {
        rc.gravity = Vect::new(0.0, cfg.gravity.y);
    }
}

/// Halts both the rapier pipeline and the virtual clock outside `Playing`,
/// so dwell timers and creation timestamps stay consistent across pauses.
fn sync_pipeline_active(
    state: Res<State<GameplayState>>,
    mut rapier_cfg: Query<&mut RapierConfiguration>,
    mut time: ResMut<Time<Virtual>>,
) {
    if !state.is_changed() {
        return;
    }
    let active = *state.get() == GameplayState::Playing;
    for mut rc in rapier_cfg.iter_mut() {
        rc.physics_pipeline_active = active;
    }
    if active {
        time.unpause();
    } else {
        time.pause();
    }
}

/// Cap linear speed and bleed off energy above the soft threshold, keeping
/// stacked merges from going ballistic.
fn clamp_velocities(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut q: Query<&mut Velocity, (With<Sphere>, Without<CurrentDrop>)>,
) {
    let s = &cfg.spheres;
    let dt = time.delta_secs();
    for mut vel in q.iter_mut() {
        let lin = vel.linvel.length();
        if lin > s.max_speed {
            vel.linvel = vel.linvel.normalize_or_zero() * s.max_speed;
        } else if lin > s.damp_above {
            vel.linvel *= (1.0 - s.overspeed_damping * dt).max(0.0);
        }
    }
}

/// Divergence recovery: a sphere whose position or velocity went non-finite
/// is stopped and re-centered on the spawn line rather than aborting the
/// step.
fn recover_diverged(
    cfg: Res<GameConfig>,
    mut q: Query<(Entity, &mut Transform, &mut Velocity), (With<Sphere>, Without<CurrentDrop>)>,
) {
    for (entity, mut tf, mut vel) in q.iter_mut() {
        let pos_ok = tf.translation.x.is_finite() && tf.translation.y.is_finite();
        let vel_ok = vel.linvel.x.is_finite() && vel.linvel.y.is_finite();
        if pos_ok && vel_ok {
            continue;
        }
        warn!("sphere {entity:?} diverged (pos_ok={pos_ok} vel_ok={vel_ok}); resetting");
        if !pos_ok {
            tf.translation = Vec3::new(0.0, cfg.spawn_line_y(), 0.0);
        }
        *vel = Velocity::zero();
    }
}
