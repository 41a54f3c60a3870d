use bevy::prelude::*;
use serde::Deserialize;
use std::{fs, path::Path};

use crate::core::tier::MAX_TIER;

#[derive(Debug, Deserialize, Resource, Clone, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    #[serde(rename = "autoClose")]
    pub auto_close: f32,
}
impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 520.0,
            height: 860.0,
            title: "Sphere Drop".into(),
            auto_close: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GravityConfig {
    pub y: f32,
}
impl Default for GravityConfig {
    fn default() -> Self {
        Self { y: -600.0 }
    }
}

/// Static play-area rectangle. Walls are immutable for a session; the flask
/// size selector changes sphere scale, not the arena.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    pub wall_thickness: f32,
    pub friction: f32,
    pub restitution: f32,
}
impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 440.0,
            height: 720.0,
            wall_thickness: 24.0,
            friction: 0.2,
            restitution: 0.2,
        }
    }
}
impl ArenaConfig {
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }
    #[inline]
    pub fn top_y(&self) -> f32 {
        self.height * 0.5
    }
    #[inline]
    pub fn bottom_y(&self) -> f32 {
        -self.height * 0.5
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpheresConfig {
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Hard ceiling on linear speed.
    pub max_speed: f32,
    /// Above this speed extra damping kicks in (runaway energy guard).
    pub damp_above: f32,
    pub overspeed_damping: f32,
}
impl Default for SpheresConfig {
    fn default() -> Self {
        Self {
            restitution: 0.2,
            friction: 0.15,
            linear_damping: 0.05,
            angular_damping: 0.4,
            max_speed: 1200.0,
            damp_above: 750.0,
            overspeed_damping: 1.5,
        }
    }
}

/// Inputs to the precomputed tier table: `radius = base_radius +
/// (tier-1) * radius_step`, `mass = mass_unit * mass_base^(12 - tier)`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TiersConfig {
    pub base_radius: f32,
    pub radius_step: f32,
    pub mass_unit: f32,
    pub mass_base: f32,
}
impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            base_radius: 12.0,
            radius_step: 9.0,
            mass_unit: 1.0,
            mass_base: 1.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnConfig {
    /// Spawn tiers are drawn uniformly from `1..=max_spawn_tier`.
    pub max_spawn_tier: u8,
    /// Delay between a release and the next sphere appearing.
    pub respawn_delay: f32,
    /// Spawn line sits this far below the arena top.
    pub spawn_line_offset: f32,
}
impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_spawn_tier: 3,
            respawn_delay: 0.1,
            spawn_line_offset: 36.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DangerConfig {
    /// Height of the top sensor strip in world units. Not affected by the
    /// flask scale factor.
    pub height: f32,
    /// Seconds after creation during which a sphere cannot count as
    /// overflowing.
    pub grace_period: f32,
    /// Continuous overflow duration that ends the game.
    pub game_over_after: f32,
}
impl Default for DangerConfig {
    fn default() -> Self {
        Self {
            height: 80.0,
            grace_period: 3.0,
            game_over_after: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub draw_arena: bool,
    pub draw_danger: bool,
    pub draw_grid: bool,
    pub grid_spacing: f32,
}
impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            draw_arena: true,
            draw_danger: true,
            draw_grid: false,
            grid_spacing: 48.0,
        }
    }
}

#[derive(Debug, Deserialize, Resource, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub gravity: GravityConfig,
    pub arena: ArenaConfig,
    pub spheres: SpheresConfig,
    pub tiers: TiersConfig,
    pub spawn: SpawnConfig,
    pub danger: DangerConfig,
    pub overlay: OverlayConfig,
}

impl GameConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        ron::from_str(&data).map_err(|e| format!("parse RON: {e}"))
    }

    /// Missing or unparsable file degrades to defaults; the reason is
    /// returned so the caller can log it.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Largest possible sphere radius at scale 1.0.
    pub fn max_tier_radius(&self) -> f32 {
        self.tiers.base_radius + (MAX_TIER - 1) as f32 * self.tiers.radius_step
    }

    /// Y coordinate of the spawn line the falling sphere is pinned to.
    pub fn spawn_line_y(&self) -> f32 {
        self.arena.top_y() - self.spawn.spawn_line_offset
    }

    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            w.push("window dimensions must be > 0".into());
        }
        if self.window.auto_close < 0.0 {
            w.push(format!(
                "window.autoClose {} negative -> treated as disabled (should be >= 0)",
                self.window.auto_close
            ));
        }
        if self.gravity.y.abs() < 1e-4 {
            w.push("gravity.y magnitude near zero; spheres may float".into());
        }
        if self.gravity.y > 0.0 {
            w.push(format!(
                "gravity.y is positive ({}); typical configs use negative for downward",
                self.gravity.y
            ));
        }
        if !(0.0..=1.5).contains(&self.arena.restitution)
            || !(0.0..=1.5).contains(&self.spheres.restitution)
        {
            w.push("restitution outside recommended 0..1.5".into());
        }
        if self.tiers.radius_step <= 0.0 {
            w.push("tiers.radius_step must be > 0 (radius must grow with tier)".into());
        }
        if self.tiers.mass_base <= 1.0 {
            w.push(format!(
                "tiers.mass_base {} <= 1.0; mass would no longer shrink with tier",
                self.tiers.mass_base
            ));
        }
        if self.max_tier_radius() * 2.0 >= self.arena.width {
            w.push(format!(
                "arena.width {} cannot hold a top-tier sphere (diameter {})",
                self.arena.width,
                self.max_tier_radius() * 2.0
            ));
        }
        if !(1..=MAX_TIER).contains(&self.spawn.max_spawn_tier) {
            w.push(format!(
                "spawn.max_spawn_tier {} outside 1..={MAX_TIER}",
                self.spawn.max_spawn_tier
            ));
        }
        if self.spawn.respawn_delay < 0.0 {
            w.push("spawn.respawn_delay negative; treated as immediate".into());
        }
        if self.danger.height <= 0.0 || self.danger.height >= self.arena.height * 0.5 {
            w.push(format!(
                "danger.height {} should be a thin strip of the {} tall arena",
                self.danger.height, self.arena.height
            ));
        }
        if self.danger.grace_period < 0.0 || self.danger.game_over_after <= 0.0 {
            w.push("danger timings must be positive".into());
        }
        if self.spheres.max_speed <= self.spheres.damp_above {
            w.push("spheres.max_speed should exceed spheres.damp_above".into());
        }
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let warnings = GameConfig::default().validate();
        assert!(warnings.is_empty(), "default config warned: {warnings:?}");
    }

    #[test]
    fn spawn_line_sits_inside_arena() {
        let cfg = GameConfig::default();
        assert!(cfg.spawn_line_y() < cfg.arena.top_y());
        assert!(cfg.spawn_line_y() > cfg.arena.bottom_y());
    }

    #[test]
    fn shrinking_mass_base_warns() {
        let mut cfg = GameConfig::default();
        cfg.tiers.mass_base = 0.9;
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.contains("mass_base")));
    }

    #[test]
    fn partial_ron_overlays_defaults() {
        let ron = r#"(
            gravity: (y: -900.0),
            danger: (grace_period: 2.0),
        )"#;
        let cfg: GameConfig = ron::from_str(ron).expect("parse");
        assert_eq!(cfg.gravity.y, -900.0);
        assert_eq!(cfg.danger.grace_period, 2.0);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.danger.game_over_after, 5.0);
        assert_eq!(cfg.tiers.mass_base, 1.5);
    }
}
