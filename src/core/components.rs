use bevy::prelude::*;

use crate::core::tier::Tier;

/// Marker component identifying a sphere entity (holds physics body &
/// collider once released).
#[derive(Component)]
pub struct Sphere;

/// The sphere's rank. Never mutated in place; merges replace the entity.
#[derive(Component, Debug, Deref, Copy, Clone, PartialEq, Eq)]
pub struct SphereTier(pub Tier);

/// Effective (scale-applied) radius used both for the collider and the
/// rendering scale.
#[derive(Component, Debug, Deref, DerefMut, Copy, Clone)]
pub struct SphereRadius(pub f32);

/// Seconds since startup at which the sphere was released or created.
/// Merge results and restored spheres carry a backdated value so the danger
/// zone grace check is already satisfied.
#[derive(Component, Debug, Copy, Clone)]
pub struct CreationTime(pub f32);

/// Marker for the single currently-falling sphere: pinned to the spawn line,
/// no physics body, moved only by drag input.
#[derive(Component)]
pub struct CurrentDrop;

/// Marker for arena boundary collider segments.
#[derive(Component)]
pub struct ArenaWall;

/// Marker for the top-strip sensor whose prolonged occupancy ends the game.
#[derive(Component)]
pub struct DangerZone;

/// Tag component for the circle mesh child used for flat sphere rendering.
#[derive(Component)]
pub struct SphereVisual;
