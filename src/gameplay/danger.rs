use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use std::collections::HashMap;

use crate::app::state::GameplayState;
use crate::core::components::{CreationTime, CurrentDrop, DangerZone, Sphere};
use crate::core::config::GameConfig;
use crate::core::system::system_order::RuleResolveSet;
use crate::gameplay::events::GameOverEvent;

/// Watches the top sensor strip: spheres dwelling there past their grace
/// period start the overflow countdown; five continuous seconds of overflow
/// end the game.
pub struct DangerZonePlugin;

impl Plugin for DangerZonePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DangerState>()
            .add_event::<GameOverEvent>()
            .add_systems(
                Update,
                (track_danger_overlaps, escalate_danger)
                    .chain()
                    .in_set(RuleResolveSet)
                    .run_if(in_state(GameplayState::Playing)),
            );
    }
}

#[derive(Resource, Default, Debug)]
pub struct DangerState {
    /// Sphere -> sensor entry time, grace-period spheres included. The
    /// active-overflow set is derived from this each step.
    overlapping: HashMap<Entity, f32>,
    /// First instant the active-overflow set became non-empty; `None`
    /// whenever it is empty (the countdown has no partial credit).
    overflow_since: Option<f32>,
    fired: bool,
}

impl DangerState {
    /// Border-color boolean: is any past-grace sphere dwelling in the strip?
    pub fn is_hot(&self) -> bool {
        self.overflow_since.is_some()
    }

    pub fn overlapping_count(&self) -> usize {
        self.overlapping.len()
    }

    /// Remaining continuous-overflow time before game over, if counting.
    pub fn seconds_left(&self, now: f32, game_over_after: f32) -> Option<f32> {
        self.overflow_since
            .map(|since| (game_over_after - (now - since)).max(0.0))
    }

    pub fn reset(&mut self) {
        self.overlapping.clear();
        self.overflow_since = None;
        self.fired = false;
    }
}

/// Maintain the sensor-overlap map from the contact stream. Entry times are
/// recorded unconditionally; the grace filter is applied when escalating, so
/// a sphere whose grace expires while it sits in the strip still counts.
fn track_danger_overlaps(
    time: Res<Time>,
    mut state: ResMut<DangerState>,
    mut collisions: EventReader<CollisionEvent>,
    sensors: Query<(), With<DangerZone>>,
    spheres: Query<(), (With<Sphere>, Without<CurrentDrop>)>,
) {
    let now = time.elapsed_secs();
    for ev in collisions.read() {
        match ev {
            CollisionEvent::Started(a, b, _) => {
                if let Some(sphere) = sphere_of_sensor_pair(*a, *b, &sensors, &spheres) {
                    state.overlapping.entry(sphere).or_insert(now);
                }
            }
            CollisionEvent::Stopped(a, b, _) => {
                if let Some(sphere) = sphere_of_sensor_pair(*a, *b, &sensors, &spheres) {
                    state.overlapping.remove(&sphere);
                }
            }
        }
    }
}

/// For a sensor/sphere contact pair, return the sphere; `None` for any other
/// pairing (sphere-sphere, sphere-wall).
fn sphere_of_sensor_pair(
    a: Entity,
    b: Entity,
    sensors: &Query<(), With<DangerZone>>,
    spheres: &Query<(), (With<Sphere>, Without<CurrentDrop>)>,
) -> Option<Entity> {
    if sensors.contains(a) && spheres.contains(b) {
        Some(b)
    } else if sensors.contains(b) && spheres.contains(a) {
        Some(a)
    } else {
        None
    }
}

fn escalate_danger(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut state: ResMut<DangerState>,
    spheres: Query<&CreationTime, (With<Sphere>, Without<CurrentDrop>)>,
    mut game_over: EventWriter<GameOverEvent>,
    mut next_state: ResMut<NextState<GameplayState>>,
) {
    let now = time.elapsed_secs();
    // Spheres consumed by a merge leave no Stopped event until the physics
    // step after their despawn; prune directly.
    state.overlapping.retain(|e, _| spheres.contains(*e));

    let any_past_grace = state.overlapping.keys().any(|e| {
        spheres
            .get(*e)
            .is_ok_and(|created| now - created.0 >= cfg.danger.grace_period)
    });

    if !any_past_grace {
        state.overflow_since = None;
        return;
    }

    let since = *state.overflow_since.get_or_insert(now);
    if now - since >= cfg.danger.game_over_after && !state.fired {
        state.fired = true;
        game_over.write(GameOverEvent);
        next_state.set(GameplayState::GameOver);
        info!(
            "game over: danger zone overflowed continuously for {:.1}s",
            now - since
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::{SphereRadius, SphereTier};
    use crate::core::tier::Tier;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use bevy_rapier2d::rapier::prelude::CollisionEventFlags;
    use std::time::Duration;

    const STEP: f32 = 0.1;

    #[derive(Resource, Default)]
    struct GameOverLog(usize);

    fn log_game_over(mut ev: EventReader<GameOverEvent>, mut log: ResMut<GameOverLog>) {
        log.0 += ev.read().count();
    }

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TransformPlugin, StatesPlugin));
        app.insert_resource(TimeUpdateStrategy::ManualDuration(
            Duration::from_secs_f32(STEP),
        ));
        app.init_state::<GameplayState>();
        app.insert_resource(GameConfig::default());
        app.add_event::<CollisionEvent>();
        app.init_resource::<GameOverLog>();
        app.add_plugins(DangerZonePlugin);
        app.add_systems(Update, log_game_over.after(escalate_danger));
        app
    }

    fn spawn_sensor(app: &mut App) -> Entity {
        app.world_mut()
            .spawn((DangerZone, Transform::default(), GlobalTransform::default()))
            .id()
    }

    fn spawn_sphere(app: &mut App, created: f32) -> Entity {
        app.world_mut()
            .spawn((
                Sphere,
                SphereTier(Tier::MIN),
                SphereRadius(10.0),
                CreationTime(created),
                Transform::default(),
                GlobalTransform::default(),
            ))
            .id()
    }

    fn began(app: &mut App, sphere: Entity, sensor: Entity) {
        app.world_mut().send_event(CollisionEvent::Started(
            sphere,
            sensor,
            CollisionEventFlags::SENSOR,
        ));
    }

    fn ended(app: &mut App, sphere: Entity, sensor: Entity) {
        app.world_mut().send_event(CollisionEvent::Stopped(
            sphere,
            sensor,
            CollisionEventFlags::SENSOR,
        ));
    }

    fn run_secs(app: &mut App, secs: f32) {
        let steps = (secs / STEP).round() as usize;
        for _ in 0..steps {
            app.update();
        }
    }

    fn danger(app: &App) -> &DangerState {
        app.world().resource::<DangerState>()
    }

    #[test]
    fn fresh_sphere_is_ignored_until_grace_elapses() {
        let mut app = setup_app();
        let sensor = spawn_sensor(&mut app);
        app.update(); // now == STEP
        let now = app.world().resource::<Time>().elapsed_secs();
        let sphere = spawn_sphere(&mut app, now);
        began(&mut app, sphere, sensor);
        app.update();
        assert!(!danger(&app).is_hot(), "grace period must suppress overflow");

        // Grace expires while the sphere keeps dwelling: no new began event
        // is needed for it to start counting.
        run_secs(&mut app, 3.1);
        assert!(danger(&app).is_hot());
    }

    #[test]
    fn backdated_sphere_counts_immediately() {
        let mut app = setup_app();
        let sensor = spawn_sensor(&mut app);
        app.update();
        let sphere = spawn_sphere(&mut app, -10.0);
        began(&mut app, sphere, sensor);
        app.update();
        assert!(danger(&app).is_hot());
    }

    #[test]
    fn continuous_overflow_fires_game_over_exactly_once() {
        let mut app = setup_app();
        let sensor = spawn_sensor(&mut app);
        app.update();
        let sphere = spawn_sphere(&mut app, -10.0);
        began(&mut app, sphere, sensor);
        run_secs(&mut app, 5.2);

        assert_eq!(app.world().resource::<GameOverLog>().0, 1);
        assert_eq!(
            *app.world().resource::<State<GameplayState>>().get(),
            GameplayState::GameOver
        );

        // Escalation is halted in GameOver; no second event even if stepped
        // further (gameplay systems are gated off).
        run_secs(&mut app, 2.0);
        assert_eq!(app.world().resource::<GameOverLog>().0, 1);
    }

    #[test]
    fn emptying_the_zone_resets_the_countdown() {
        let mut app = setup_app();
        let sensor = spawn_sensor(&mut app);
        app.update();
        let sphere = spawn_sphere(&mut app, -10.0);
        began(&mut app, sphere, sensor);
        run_secs(&mut app, 4.9);
        assert!(danger(&app).is_hot());
        assert_eq!(app.world().resource::<GameOverLog>().0, 0);

        ended(&mut app, sphere, sensor);
        app.update();
        assert!(!danger(&app).is_hot(), "no partial credit after emptying");

        // Refill: the countdown restarts from zero.
        began(&mut app, sphere, sensor);
        run_secs(&mut app, 4.9);
        assert_eq!(app.world().resource::<GameOverLog>().0, 0);
        run_secs(&mut app, 0.3);
        assert_eq!(app.world().resource::<GameOverLog>().0, 1);
    }

    #[test]
    fn despawned_sphere_is_pruned_without_stopped_event() {
        let mut app = setup_app();
        let sensor = spawn_sensor(&mut app);
        app.update();
        let sphere = spawn_sphere(&mut app, -10.0);
        began(&mut app, sphere, sensor);
        app.update();
        assert!(danger(&app).is_hot());

        app.world_mut().entity_mut(sphere).despawn();
        app.update();
        assert!(!danger(&app).is_hot());
        assert_eq!(danger(&app).overlapping_count(), 0);
    }

    #[test]
    fn non_sensor_pairs_are_ignored() {
        let mut app = setup_app();
        let _sensor = spawn_sensor(&mut app);
        app.update();
        let a = spawn_sphere(&mut app, -10.0);
        let b = spawn_sphere(&mut app, -10.0);
        app.world_mut()
            .send_event(CollisionEvent::Started(a, b, CollisionEventFlags::empty()));
        app.update();
        assert_eq!(danger(&app).overlapping_count(), 0);
    }
}
