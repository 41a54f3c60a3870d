use bevy::prelude::*;

use crate::core::config::GameConfig;
use crate::core::tier::BallScale;
use crate::gameplay::danger::DangerState;
use crate::physics::arena::ArenaBounds;

/// Immediate-mode overlays: arena outline, danger band (hot/cold color) and
/// the optional scale-dependent backdrop grid. Redrawn per frame, so a flask
/// scale change regenerates the grid for free.
pub struct ArenaOverlayPlugin;

impl Plugin for ArenaOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, draw_arena_overlay);
    }
}

fn draw_arena_overlay(
    mut gizmos: Gizmos,
    cfg: Res<GameConfig>,
    bounds: Option<Res<ArenaBounds>>,
    scale: Res<BallScale>,
    danger: Option<Res<DangerState>>,
) {
    let Some(bounds) = bounds else { return };
    let o = &cfg.overlay;
    let size = Vec2::new(bounds.half_width * 2.0, bounds.top - bounds.bottom);

    if o.draw_arena {
        gizmos.rect_2d(
            Isometry2d::from_translation(Vec2::ZERO),
            size,
            Color::srgb(0.55, 0.55, 0.62),
        );
    }

    if o.draw_danger {
        let hot = danger.as_ref().map(|d| d.is_hot()).unwrap_or(false);
        let color = if hot {
            Color::srgb(1.0, 0.15, 0.20)
        } else {
            Color::srgb(0.35, 0.35, 0.42)
        };
        let band_h = bounds.top - bounds.danger_bottom;
        gizmos.rect_2d(
            Isometry2d::from_translation(Vec2::new(0.0, bounds.top - band_h * 0.5)),
            Vec2::new(size.x, band_h),
            color,
        );
    }

    // Grid spacing follows the flask scale so the backdrop reads at the same
    // granularity as the spheres.
    if o.draw_grid {
        let spacing = (o.grid_spacing * scale.0).max(4.0);
        let color = Color::srgba(0.3, 0.3, 0.36, 0.35);
        let mut x = -bounds.half_width + spacing;
        while x < bounds.half_width {
            gizmos.line_2d(Vec2::new(x, bounds.bottom), Vec2::new(x, bounds.top), color);
            x += spacing;
        }
        let mut y = bounds.bottom + spacing;
        while y < bounds.top {
            gizmos.line_2d(
                Vec2::new(-bounds.half_width, y),
                Vec2::new(bounds.half_width, y),
                color,
            );
            y += spacing;
        }
    }
}
