use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use bevy_rapier2d::rapier::prelude::CollisionEventFlags;
use smallvec::SmallVec;

use crate::app::state::GameplayState;
use crate::core::components::{
    CreationTime, CurrentDrop, Sphere, SphereRadius, SphereTier,
};
use crate::core::config::GameConfig;
use crate::core::system::system_order::RuleResolveSet;
use crate::core::tier::{BallScale, TierTable};
use crate::gameplay::events::MergeCompleted;
use crate::gameplay::spawn::released_body_bundle;

/// Decides which same-tier contact pairs merge and resolves the whole step's
/// merges as one atomic batch.
pub struct MergeResolverPlugin;

impl Plugin for MergeResolverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BallScale>()
            .init_resource::<TierTable>()
            .init_resource::<PendingMergeSet>()
            .add_event::<MergeCompleted>()
            .add_systems(
                Update,
                (collect_merge_contacts, resolve_merge_batch)
                    .chain()
                    .in_set(RuleResolveSet)
                    .run_if(in_state(GameplayState::Playing)),
            );
    }
}

/// Per-step working set of spheres flagged for merging. Consumed and cleared
/// by every resolution pass; an entity in here never outlives the step that
/// flagged it.
#[derive(Resource, Default, Debug)]
pub struct PendingMergeSet(pub SmallVec<[Entity; 8]>);

impl PendingMergeSet {
    pub fn contains(&self, e: Entity) -> bool {
        self.0.contains(&e)
    }

    pub fn insert(&mut self, e: Entity) {
        if !self.0.contains(&e) {
            self.0.push(e);
        }
    }
}

/// Flag both halves of every fresh same-tier sphere contact, skipping
/// terminal-tier spheres and anything already pending this step.
fn collect_merge_contacts(
    mut collisions: EventReader<CollisionEvent>,
    mut pending: ResMut<PendingMergeSet>,
    spheres: Query<&SphereTier, (With<Sphere>, Without<CurrentDrop>)>,
) {
    for ev in collisions.read() {
        let CollisionEvent::Started(a, b, flags) = ev else {
            continue;
        };
        if flags.contains(CollisionEventFlags::SENSOR) {
            continue; // danger-zone pairs are the monitor's business
        }
        let (Ok(tier_a), Ok(tier_b)) = (spheres.get(*a), spheres.get(*b)) else {
            continue; // wall contact or an entity gone mid-step
        };
        if tier_a.0 != tier_b.0 || tier_a.0.is_max() {
            continue;
        }
        if pending.contains(*a) || pending.contains(*b) {
            continue;
        }
        pending.insert(*a);
        pending.insert(*b);
    }
}

/// End-of-step batch resolution. Pairing order is ascending `Entity` order
/// (lower index first), which makes multi-way collisions deterministic: with
/// three equal-tier spheres pending, the two lowest-id spheres merge and the
/// third drops back to unflagged, free to re-engage on its next contact.
/// A sphere spawned by this pass is never consumed by it.
fn resolve_merge_batch(
    mut commands: Commands,
    time: Res<Time>,
    cfg: Res<GameConfig>,
    table: Res<TierTable>,
    scale: Res<BallScale>,
    mut pending: ResMut<PendingMergeSet>,
    mut merges: EventWriter<MergeCompleted>,
    spheres: Query<(&SphereTier, &Transform), (With<Sphere>, Without<CurrentDrop>)>,
) {
    if pending.0.is_empty() {
        return;
    }
    let mut batch: SmallVec<[Entity; 8]> = std::mem::take(&mut pending.0);
    batch.sort_unstable();
    batch.retain(|e| spheres.contains(*e));

    let now = time.elapsed_secs();
    while !batch.is_empty() {
        let a = batch.remove(0);
        let Ok((tier_a, tf_a)) = spheres.get(a) else {
            continue;
        };
        let partner = batch
            .iter()
            .position(|e| spheres.get(*e).is_ok_and(|(t, _)| t.0 == tier_a.0));
        let Some(idx) = partner else {
            // Unpaired: the flag is cleared (not carried over), so a fresh
            // contact next step can re-arm it.
            continue;
        };
        let b = batch.remove(idx);
        let Ok((_, tf_b)) = spheres.get(b) else {
            continue;
        };
        let Some(result_tier) = tier_a.0.next() else {
            continue; // unreachable: terminal tiers never enter the set
        };

        let midpoint = (tf_a.translation.truncate() + tf_b.translation.truncate()) * 0.5;
        commands.entity(a).despawn();
        commands.entity(b).despawn();

        let radius = table.radius(result_tier) * scale.0;
        let mass = table.base_mass(result_tier) * scale.0;
        commands.spawn((
            Sphere,
            SphereTier(result_tier),
            SphereRadius(radius),
            // Backdated: a merge result popping out inside the danger band
            // must not look freshly arrived there.
            CreationTime(now - cfg.danger.grace_period),
            Transform::from_translation(midpoint.extend(0.0)),
            GlobalTransform::default(),
            Visibility::default(),
            released_body_bundle(&cfg, radius, mass),
        ));
        merges.write(MergeCompleted {
            tier: result_tier,
            position: midpoint,
        });
        debug!(
            "merged {a:?} + {b:?} -> tier {} at {midpoint:?}",
            result_tier.get()
        );
    }
}
