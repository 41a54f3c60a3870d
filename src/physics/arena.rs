use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::core::components::{ArenaWall, DangerZone};
use crate::core::config::GameConfig;
use crate::physics::world::groups;

/// Spawns the static play-area boundary and the danger-zone sensor strip.
/// The matching gizmo overlay is a rendering concern
/// ([`crate::rendering::overlay`]).
pub struct ArenaPlugin;

impl Plugin for ArenaPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_arena);
    }
}

/// Geometry derived once from config; spawn clamping and overlays read this
/// instead of recomputing.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ArenaBounds {
    pub half_width: f32,
    pub top: f32,
    pub bottom: f32,
    pub spawn_line_y: f32,
    pub danger_bottom: f32,
}

impl ArenaBounds {
    pub fn from_config(cfg: &GameConfig) -> Self {
        Self {
            half_width: cfg.arena.half_width(),
            top: cfg.arena.top_y(),
            bottom: cfg.arena.bottom_y(),
            spawn_line_y: cfg.spawn_line_y(),
            danger_bottom: cfg.arena.top_y() - cfg.danger.height,
        }
    }

    /// Clamp an X coordinate so a sphere of `radius` stays inside the walls.
    pub fn clamp_drop_x(&self, x: f32, radius: f32) -> f32 {
        let limit = (self.half_width - radius).max(0.0);
        x.clamp(-limit, limit)
    }
}

impl FromWorld for ArenaBounds {
    fn from_world(world: &mut World) -> Self {
        let cfg = world.get_resource::<GameConfig>().cloned().unwrap_or_default();
        ArenaBounds::from_config(&cfg)
    }
}

fn spawn_arena(mut commands: Commands, cfg: Res<GameConfig>) {
    let bounds = ArenaBounds::from_config(&cfg);
    let a = &cfg.arena;
    let t = a.wall_thickness;
    let half_w = a.half_width();
    let half_h = a.height * 0.5;

    // Closed loop: bottom, top, left, right. Centers sit half a thickness
    // outside the playable rectangle so the inner faces line up with it.
    let segments = [
        ("WallBottom", Vec2::new(0.0, -half_h - t * 0.5), Vec2::new(half_w + t, t * 0.5)),
        ("WallTop", Vec2::new(0.0, half_h + t * 0.5), Vec2::new(half_w + t, t * 0.5)),
        ("WallLeft", Vec2::new(-half_w - t * 0.5, 0.0), Vec2::new(t * 0.5, half_h)),
        ("WallRight", Vec2::new(half_w + t * 0.5, 0.0), Vec2::new(t * 0.5, half_h)),
    ];
    for (name, center, half_extents) in segments {
        commands.spawn((
            Name::new(name),
            ArenaWall,
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y),
            Friction::coefficient(a.friction),
            Restitution::coefficient(a.restitution),
            groups::wall(),
            Transform::from_translation(center.extend(0.0)),
            GlobalTransform::default(),
        ));
    }

    // Top strip sensor. Fixed height regardless of the flask scale factor.
    let band_center_y = bounds.top - cfg.danger.height * 0.5;
    commands.spawn((
        Name::new("DangerZone"),
        DangerZone,
        RigidBody::Fixed,
        Collider::cuboid(half_w, cfg.danger.height * 0.5),
        Sensor,
        ActiveEvents::COLLISION_EVENTS,
        groups::sensor(),
        Transform::from_xyz(0.0, band_center_y, 0.0),
        GlobalTransform::default(),
    ));

    commands.insert_resource(bounds);
    info!(
        "arena ready: {}x{} units, danger band {} units tall",
        a.width, a.height, cfg.danger.height
    );
}
