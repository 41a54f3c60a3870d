use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::app::state::GameplayState;
use crate::core::components::{CreationTime, Sphere, SphereRadius, SphereTier};
use crate::core::config::GameConfig;
use crate::core::system::system_order::RuleResolveSet;
use crate::core::tier::{BallScale, Tier, TierTable};
use crate::gameplay::danger::DangerState;
use crate::gameplay::events::{ResetGame, RestoreSnapshot, SetBallScale};
use crate::gameplay::merge::PendingMergeSet;
use crate::gameplay::spawn::{released_body_bundle, DropController};

/// Save/restore surface for the external persistence collaborator, plus the
/// flask-size scale handling and the external reset path.
pub struct SnapshotPlugin;

impl Plugin for SnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BallScale>()
            .init_resource::<TierTable>()
            .add_event::<RestoreSnapshot>()
            .add_event::<SetBallScale>()
            .add_event::<ResetGame>()
            .add_systems(
                Update,
                (apply_restore, apply_ball_scale)
                    .in_set(RuleResolveSet)
                    .run_if(in_state(GameplayState::Playing)),
            )
            // Reset must work from GameOver, so it is not state-gated.
            .add_systems(Update, apply_reset);
    }
}

/// Wire position: plain floats, no engine types leak to the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPosition {
    pub x: f32,
    pub y: f32,
}

/// One persisted sphere. No velocity: restored spheres start at rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereSnapshot {
    pub tier: u8,
    pub position: SnapshotPosition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData(pub Vec<SphereSnapshot>);

/// Every live sphere's tier and position, for the external save system.
/// Only released spheres (attached physics bodies) are included; the
/// currently-falling sphere has no body yet and is deliberately excluded.
pub fn live_sphere_snapshot(world: &mut World) -> SnapshotData {
    let mut q = world
        .query_filtered::<(&SphereTier, &Transform), (With<Sphere>, With<RigidBody>)>();
    SnapshotData(
        q.iter(world)
            .map(|(tier, tf)| SphereSnapshot {
                tier: tier.0.get(),
                position: SnapshotPosition {
                    x: tf.translation.x,
                    y: tf.translation.y,
                },
            })
            .collect(),
    )
}

/// Re-seed the live set from a snapshot, bypassing the falling/released
/// flow: bodies attach immediately and creation times are backdated so the
/// seeds are already past the danger grace period. Out-of-range tiers are
/// clamped, never fatal; partial data must not block gameplay resumption.
fn apply_restore(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    table: Res<TierTable>,
    scale: Res<BallScale>,
    mut restores: EventReader<RestoreSnapshot>,
    released: Query<Entity, (With<Sphere>, With<RigidBody>)>,
) {
    for RestoreSnapshot(data) in restores.read() {
        for entity in released.iter() {
            commands.entity(entity).despawn();
        }
        let backdated = time.elapsed_secs() - cfg.danger.grace_period;
        for entry in &data.0 {
            let tier = match Tier::new(entry.tier) {
                Some(t) => t,
                None => {
                    warn!(
                        "snapshot entry tier {} out of range; clamped",
                        entry.tier
                    );
                    Tier::clamped(entry.tier)
                }
            };
            let radius = table.radius(tier) * scale.0;
            let mass = table.base_mass(tier) * scale.0;
            commands.spawn((
                Sphere,
                SphereTier(tier),
                SphereRadius(radius),
                CreationTime(backdated),
                Transform::from_xyz(entry.position.x, entry.position.y, 0.0),
                GlobalTransform::default(),
                Visibility::default(),
                released_body_bundle(&cfg, radius, mass),
            ));
        }
        info!("restored {} spheres from snapshot", data.0.len());
    }
}

/// Swap every live sphere's radius/mass for the new flask scale, leaving
/// velocity and collision filtering untouched. The falling sphere only has
/// its radius re-derived (it has no body yet).
fn apply_ball_scale(
    mut commands: Commands,
    table: Res<TierTable>,
    mut scale: ResMut<BallScale>,
    mut changes: EventReader<SetBallScale>,
    mut spheres: Query<
        (Entity, &SphereTier, &mut SphereRadius, Option<&mut Collider>),
        With<Sphere>,
    >,
) {
    for SetBallScale(factor) in changes.read() {
        let factor = *factor;
        if !BallScale::is_allowed(factor) {
            warn!("rejected ball scale {factor}; allowed: {:?}", BallScale::ALLOWED);
            continue;
        }
        if (scale.0 - factor).abs() < 1e-6 {
            continue; // idempotent
        }
        scale.0 = factor;
        for (entity, tier, mut radius, collider) in spheres.iter_mut() {
            let new_radius = table.radius(tier.0) * factor;
            radius.0 = new_radius;
            if let Some(mut collider) = collider {
                *collider = Collider::ball(new_radius);
                commands
                    .entity(entity)
                    .insert(ColliderMassProperties::Mass(table.base_mass(tier.0) * factor));
            }
        }
        info!("ball scale set to {factor}");
    }
}

/// External reset: clear every sphere (current drop included), zero the
/// bookkeeping, and return to a fresh playing session.
fn apply_reset(
    mut commands: Commands,
    cfg: Res<GameConfig>,
    mut resets: EventReader<ResetGame>,
    mut danger: ResMut<DangerState>,
    mut pending: Option<ResMut<PendingMergeSet>>,
    mut ctrl: Option<ResMut<DropController>>,
    mut next_state: ResMut<NextState<GameplayState>>,
    spheres: Query<Entity, With<Sphere>>,
) {
    if resets.read().count() == 0 {
        return;
    }
    for entity in spheres.iter() {
        commands.entity(entity).despawn();
    }
    danger.reset();
    if let Some(pending) = pending.as_mut() {
        pending.0.clear();
    }
    if let Some(ctrl) = ctrl.as_mut() {
        ctrl.rearm(cfg.spawn.respawn_delay);
    }
    next_state.set(GameplayState::Playing);
    info!("session reset");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::CurrentDrop;
    use bevy::state::app::StatesPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, TransformPlugin, StatesPlugin));
        app.init_state::<GameplayState>();
        app.insert_resource(GameConfig::default());
        app.init_resource::<DangerState>();
        app.add_plugins(SnapshotPlugin);
        app
    }

    fn spawn_released(app: &mut App, tier: u8, x: f32, y: f32) -> Entity {
        let cfg = GameConfig::default();
        let table = TierTable::from_config(&cfg.tiers);
        let t = Tier::new(tier).unwrap();
        let radius = table.radius(t);
        let mass = table.base_mass(t);
        app.world_mut()
            .spawn((
                Sphere,
                SphereTier(t),
                SphereRadius(radius),
                CreationTime(0.0),
                Transform::from_xyz(x, y, 0.0),
                GlobalTransform::default(),
                released_body_bundle(&cfg, radius, mass),
            ))
            .id()
    }

    fn snapshot_multiset(app: &mut App) -> Vec<(u8, i32, i32)> {
        let mut items: Vec<(u8, i32, i32)> = live_sphere_snapshot(app.world_mut())
            .0
            .iter()
            .map(|s| (s.tier, s.position.x.round() as i32, s.position.y.round() as i32))
            .collect();
        items.sort_unstable();
        items
    }

    #[test]
    fn falling_sphere_is_excluded_from_snapshots() {
        let mut app = setup_app();
        app.update();
        spawn_released(&mut app, 2, 10.0, -50.0);
        app.world_mut().spawn((
            Sphere,
            CurrentDrop,
            SphereTier(Tier::MIN),
            SphereRadius(12.0),
            Transform::from_xyz(0.0, 324.0, 0.0),
            GlobalTransform::default(),
        ));
        let snap = live_sphere_snapshot(app.world_mut());
        assert_eq!(snap.0.len(), 1);
        assert_eq!(snap.0[0].tier, 2);
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let mut app = setup_app();
        app.update();
        spawn_released(&mut app, 1, -30.0, -100.0);
        spawn_released(&mut app, 4, 55.0, -80.0);
        spawn_released(&mut app, 12, 0.0, -200.0);

        let before = snapshot_multiset(&mut app);
        let snap = live_sphere_snapshot(app.world_mut());
        app.world_mut().send_event(RestoreSnapshot(snap));
        app.update();

        assert_eq!(snapshot_multiset(&mut app), before);
    }

    #[test]
    fn restored_spheres_are_at_rest_and_backdated() {
        let mut app = setup_app();
        app.update();
        let snap = SnapshotData(vec![SphereSnapshot {
            tier: 3,
            position: SnapshotPosition { x: 5.0, y: 300.0 },
        }]);
        app.world_mut().send_event(RestoreSnapshot(snap));
        app.update();

        let cfg = GameConfig::default();
        let mut q = app
            .world_mut()
            .query_filtered::<(&CreationTime, &Velocity), With<Sphere>>();
        let (created, vel) = q.single(app.world()).unwrap();
        let now = app.world().resource::<Time>().elapsed_secs();
        assert!(now - created.0 >= cfg.danger.grace_period);
        assert_eq!(vel.linvel, Vec2::ZERO);
    }

    #[test]
    fn corrupt_tiers_are_clamped_not_fatal() {
        let mut app = setup_app();
        app.update();
        let snap = SnapshotData(vec![
            SphereSnapshot { tier: 0, position: SnapshotPosition { x: 0.0, y: 0.0 } },
            SphereSnapshot { tier: 200, position: SnapshotPosition { x: 10.0, y: 0.0 } },
            SphereSnapshot { tier: 5, position: SnapshotPosition { x: 20.0, y: 0.0 } },
        ]);
        app.world_mut().send_event(RestoreSnapshot(snap));
        app.update();

        let mut tiers: Vec<u8> = {
            let mut q = app
                .world_mut()
                .query_filtered::<&SphereTier, With<Sphere>>();
            q.iter(app.world()).map(|t| t.0.get()).collect()
        };
        tiers.sort_unstable();
        assert_eq!(tiers, vec![1, 5, 12]);
    }

    #[test]
    fn scale_change_rederives_radius_and_mass_preserving_velocity() {
        let mut app = setup_app();
        app.update();
        let e = spawn_released(&mut app, 2, 0.0, 0.0);
        app.world_mut()
            .entity_mut(e)
            .insert(Velocity::linear(Vec2::new(3.0, -4.0)));
        let full_radius = app.world().get::<SphereRadius>(e).unwrap().0;

        app.world_mut().send_event(SetBallScale(0.5));
        app.update();

        let radius = app.world().get::<SphereRadius>(e).unwrap().0;
        assert!((radius - full_radius * 0.5).abs() < 1e-5);
        let mass = *app.world().get::<ColliderMassProperties>(e).unwrap();
        let table = TierTable::from_config(&GameConfig::default().tiers);
        match mass {
            ColliderMassProperties::Mass(m) => {
                assert!((m - table.base_mass(Tier::new(2).unwrap()) * 0.5).abs() < 1e-4)
            }
            other => panic!("expected explicit mass, got {other:?}"),
        }
        let vel = app.world().get::<Velocity>(e).unwrap();
        assert_eq!(vel.linvel, Vec2::new(3.0, -4.0));
        assert_eq!(app.world().resource::<BallScale>().0, 0.5);
    }

    #[test]
    fn disallowed_scale_is_rejected() {
        let mut app = setup_app();
        app.update();
        let e = spawn_released(&mut app, 2, 0.0, 0.0);
        let radius = app.world().get::<SphereRadius>(e).unwrap().0;

        app.world_mut().send_event(SetBallScale(0.33));
        app.update();

        assert_eq!(app.world().get::<SphereRadius>(e).unwrap().0, radius);
        assert_eq!(app.world().resource::<BallScale>().0, 1.0);
    }

    #[test]
    fn snapshot_serializes_for_the_save_collaborator() {
        let snap = SnapshotData(vec![
            SphereSnapshot { tier: 1, position: SnapshotPosition { x: -3.5, y: 10.0 } },
            SphereSnapshot { tier: 9, position: SnapshotPosition { x: 40.0, y: -120.25 } },
        ]);
        let json = serde_json::to_string(&snap).expect("encode");
        let back: SnapshotData = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, snap);
    }

    #[test]
    fn reset_clears_everything_and_resumes_playing() {
        let mut app = setup_app();
        app.update();
        spawn_released(&mut app, 3, 0.0, 0.0);
        app.world_mut()
            .resource_mut::<NextState<GameplayState>>()
            .set(GameplayState::GameOver);
        app.update();
        assert_eq!(
            *app.world().resource::<State<GameplayState>>().get(),
            GameplayState::GameOver
        );

        app.world_mut().send_event(ResetGame);
        app.update();
        app.update();

        assert_eq!(
            *app.world().resource::<State<GameplayState>>().get(),
            GameplayState::Playing
        );
        let mut q = app.world_mut().query_filtered::<(), With<Sphere>>();
        assert_eq!(q.iter(app.world()).count(), 0);
    }
}
