use bevy::prelude::*;

use crate::core::components::{Sphere, SphereRadius, SphereTier, SphereVisual};
use crate::rendering::palette::{color_for_tier, TIER_COLORS};

/// Flat circle rendering for spheres: a shared unit mesh scaled per sphere,
/// one material per tier.
pub struct SphereVisualPlugin;

impl Plugin for SphereVisualPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_sphere_materials)
            .add_systems(Update, (attach_sphere_visuals, sync_visual_scale));
    }
}

/// Shared unit-diameter circle mesh; per-sphere scale supplies the size.
#[derive(Resource, Deref)]
pub struct CircleMesh(pub Handle<Mesh>);

#[derive(Resource)]
pub struct TierMaterials(pub Vec<Handle<ColorMaterial>>);

fn setup_sphere_materials(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let circle = meshes.add(Mesh::from(Circle { radius: 0.5 }));
    let handles = TIER_COLORS.iter().copied().map(|c| materials.add(c)).collect();
    commands.insert_resource(CircleMesh(circle));
    commands.insert_resource(TierMaterials(handles));
}

fn attach_sphere_visuals(
    mut commands: Commands,
    circle: Res<CircleMesh>,
    tiers: Res<TierMaterials>,
    q: Query<(Entity, &SphereTier, &SphereRadius), Added<Sphere>>,
) {
    for (entity, tier, radius) in q.iter() {
        let material = tiers.0[tier.0.index()].clone();
        commands.entity(entity).with_children(|parent| {
            parent.spawn((
                SphereVisual,
                Mesh2d(circle.0.clone()),
                MeshMaterial2d(material),
                Transform::from_scale(Vec3::splat(radius.0 * 2.0)),
            ));
        });
    }
}

/// Keep the visual in step with radius changes (flask scale switches).
fn sync_visual_scale(
    changed: Query<(&SphereRadius, &Children), Changed<SphereRadius>>,
    mut visuals: Query<&mut Transform, With<SphereVisual>>,
) {
    for (radius, children) in changed.iter() {
        for child in children.iter() {
            if let Ok(mut tf) = visuals.get_mut(child) {
                tf.scale = Vec3::splat(radius.0 * 2.0);
            }
        }
    }
}
