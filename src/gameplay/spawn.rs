use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

use crate::app::state::GameplayState;
use crate::core::components::{CreationTime, CurrentDrop, Sphere, SphereRadius, SphereTier};
use crate::core::config::GameConfig;
use crate::core::system::system_order::PreStepSet;
use crate::core::tier::{BallScale, Tier, TierTable};
use crate::gameplay::events::DropCommand;
use crate::physics::arena::ArenaBounds;
use crate::physics::world::groups;

/// Owns the "currently falling" sphere: spawns it on the drop line, applies
/// drag input, and hands it over to the physics world on release.
pub struct SpawnControllerPlugin;

impl Plugin for SpawnControllerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BallScale>()
            .init_resource::<TierTable>()
            .init_resource::<ArenaBounds>()
            .add_event::<DropCommand>()
            .add_systems(Startup, init_drop_controller)
            .add_systems(
                Update,
                (advance_spawn_state, handle_drop_commands)
                    .chain()
                    .in_set(PreStepSet)
                    .run_if(in_state(GameplayState::Playing)),
            );
    }
}

#[derive(Debug)]
pub enum DropPhase {
    /// Post-release settling window; the next sphere appears when the delay
    /// lapses.
    Arming { delay: Timer },
    /// A sphere is pinned to the spawn line awaiting release.
    Falling { sphere: Entity },
}

#[derive(Resource, Debug)]
pub struct DropController {
    phase: DropPhase,
    next_tier: Tier,
    last_x: f32,
}

impl DropController {
    pub fn new(cfg: &GameConfig) -> Self {
        Self {
            // Zero-length timer: the first sphere appears on the first step.
            phase: DropPhase::Arming {
                delay: Timer::from_seconds(0.0, TimerMode::Once),
            },
            next_tier: roll_spawn_tier(cfg),
            last_x: 0.0,
        }
    }

    pub fn current_sphere(&self) -> Option<Entity> {
        match self.phase {
            DropPhase::Falling { sphere } => Some(sphere),
            DropPhase::Arming { .. } => None,
        }
    }

    /// Pre-rolled tier of the sphere that will spawn next; external UI shows
    /// this as the preview.
    pub fn next_tier(&self) -> Tier {
        self.next_tier
    }

    /// Drop the current sphere reference and restart the arming delay.
    /// Used by reset and restore paths.
    pub fn rearm(&mut self, delay_secs: f32) {
        self.phase = DropPhase::Arming {
            delay: Timer::from_seconds(delay_secs.max(0.0), TimerMode::Once),
        };
    }
}

fn roll_spawn_tier(cfg: &GameConfig) -> Tier {
    let max = cfg.spawn.max_spawn_tier.clamp(1, crate::core::tier::MAX_TIER);
    Tier::clamped(rand::thread_rng().gen_range(1..=max))
}

fn init_drop_controller(mut commands: Commands, cfg: Res<GameConfig>) {
    commands.insert_resource(DropController::new(&cfg));
}

/// Rapier body attached to a sphere at release / merge / restore time.
/// The falling sphere never carries these.
pub fn released_body_bundle(cfg: &GameConfig, radius: f32, mass: f32) -> impl Bundle {
    (
        RigidBody::Dynamic,
        Collider::ball(radius),
        ColliderMassProperties::Mass(mass),
        Velocity::zero(),
        ExternalImpulse::default(),
        Restitution::coefficient(cfg.spheres.restitution),
        Friction::coefficient(cfg.spheres.friction),
        Damping {
            linear_damping: cfg.spheres.linear_damping,
            angular_damping: cfg.spheres.angular_damping,
        },
        ActiveEvents::COLLISION_EVENTS,
        groups::sphere(),
    )
}

fn advance_spawn_state(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    table: Res<TierTable>,
    scale: Res<BallScale>,
    bounds: Res<ArenaBounds>,
    mut ctrl: ResMut<DropController>,
) {
    let DropPhase::Arming { delay } = &mut ctrl.phase else {
        return;
    };
    delay.tick(time.delta());
    if !delay.finished() {
        return;
    }

    let tier = ctrl.next_tier;
    ctrl.next_tier = roll_spawn_tier(&cfg);
    let radius = table.radius(tier) * scale.0;
    let x = bounds.clamp_drop_x(ctrl.last_x, radius);
    let sphere = commands
        .spawn((
            Sphere,
            CurrentDrop,
            SphereTier(tier),
            SphereRadius(radius),
            Transform::from_xyz(x, bounds.spawn_line_y, 0.0),
            GlobalTransform::default(),
            Visibility::default(),
        ))
        .id();
    debug!("drop sphere {sphere:?} tier {} armed at x={x:.1}", tier.get());
    ctrl.phase = DropPhase::Falling { sphere };
}

fn handle_drop_commands(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    table: Res<TierTable>,
    scale: Res<BallScale>,
    bounds: Res<ArenaBounds>,
    mut ctrl: ResMut<DropController>,
    mut drops: EventReader<DropCommand>,
    mut q: Query<(&mut Transform, &SphereRadius, &SphereTier), With<CurrentDrop>>,
) {
    for cmd in drops.read() {
        match *cmd {
            DropCommand::BeginDrag(x) | DropCommand::UpdateDrag(x) => {
                let DropPhase::Falling { sphere } = ctrl.phase else {
                    continue; // no current sphere: silently ignored
                };
                let Ok((mut tf, radius, _)) = q.get_mut(sphere) else {
                    continue;
                };
                let clamped = bounds.clamp_drop_x(x, radius.0);
                tf.translation.x = clamped;
                ctrl.last_x = clamped;
            }
            DropCommand::Release => {
                let DropPhase::Falling { sphere } = ctrl.phase else {
                    // Double-drop guard: release while arming is a no-op.
                    debug!("release ignored: no sphere is falling");
                    continue;
                };
                let Ok((_, radius, tier)) = q.get(sphere) else {
                    continue;
                };
                let mass = table.base_mass(tier.0) * scale.0;
                commands
                    .entity(sphere)
                    .remove::<CurrentDrop>()
                    .insert((
                        CreationTime(time.elapsed_secs()),
                        released_body_bundle(&cfg, radius.0, mass),
                    ));
                ctrl.rearm(cfg.spawn.respawn_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TransformPlugin, StatesPlugin));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            50,
        )));
        app.init_state::<GameplayState>();
        app.insert_resource(GameConfig::default());
        app.add_plugins(SpawnControllerPlugin);
        app
    }

    fn current_sphere(app: &App) -> Option<Entity> {
        app.world()
            .resource::<DropController>()
            .current_sphere()
    }

    #[test]
    fn first_sphere_spawns_on_the_drop_line() {
        let mut app = setup_app();
        app.update();
        app.update();
        let sphere = current_sphere(&app).expect("a sphere should be falling");
        let tier = app.world().get::<SphereTier>(sphere).unwrap();
        assert!((1..=3).contains(&tier.0.get()));
        let tf = app.world().get::<Transform>(sphere).unwrap();
        let cfg = GameConfig::default();
        assert_eq!(tf.translation.y, cfg.spawn_line_y());
        // No physics body until release.
        assert!(app.world().get::<RigidBody>(sphere).is_none());
    }

    #[test]
    fn drag_moves_x_only_and_clamps() {
        let mut app = setup_app();
        app.update();
        app.update();
        let sphere = current_sphere(&app).unwrap();
        let radius = app.world().get::<SphereRadius>(sphere).unwrap().0;

        app.world_mut().send_event(DropCommand::BeginDrag(10_000.0));
        app.update();

        let cfg = GameConfig::default();
        let tf = app.world().get::<Transform>(sphere).unwrap();
        assert_eq!(tf.translation.x, cfg.arena.half_width() - radius);
        assert_eq!(tf.translation.y, cfg.spawn_line_y());
    }

    #[test]
    fn release_attaches_body_and_rearms() {
        let mut app = setup_app();
        app.update();
        app.update();
        let sphere = current_sphere(&app).unwrap();

        app.world_mut().send_event(DropCommand::Release);
        app.update();

        assert!(app.world().get::<RigidBody>(sphere).is_some());
        assert!(app.world().get::<Collider>(sphere).is_some());
        assert!(app.world().get::<CreationTime>(sphere).is_some());
        assert!(app.world().get::<CurrentDrop>(sphere).is_none());
        // Transiently idle right after release.
        assert!(current_sphere(&app).is_none());

        // Second release during the arming window is a silent no-op.
        app.world_mut().send_event(DropCommand::Release);
        app.update();

        // Respawn delay (0.1s) elapses within two more 50ms frames.
        app.update();
        app.update();
        let next = current_sphere(&app).expect("next sphere should spawn");
        assert_ne!(next, sphere);
    }

    #[test]
    fn input_during_arming_window_is_ignored() {
        let mut app = setup_app();
        app.update();
        app.world_mut().send_event(DropCommand::Release);
        app.update();
        assert!(current_sphere(&app).is_none());

        // Both commands arrive while no sphere is falling: silent no-ops.
        app.world_mut().send_event(DropCommand::UpdateDrag(50.0));
        app.world_mut().send_event(DropCommand::Release);
        app.update();
        app.update();
        // The controller recovered and armed the next sphere.
        assert!(current_sphere(&app).is_some());
    }
}
