use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::TiersConfig;

/// Highest sphere rank; two spheres of this tier never merge.
pub const MAX_TIER: u8 = 12;

/// Discrete sphere rank in `[1, MAX_TIER]`. Determines radius, mass and
/// merge eligibility. Immutable per sphere: a merge destroys both inputs and
/// creates a fresh sphere one tier higher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Tier(u8);

impl Tier {
    pub const MIN: Tier = Tier(1);
    pub const MAX: Tier = Tier(MAX_TIER);

    /// Rejects anything outside `[1, MAX_TIER]`.
    pub fn new(raw: u8) -> Option<Tier> {
        (1..=MAX_TIER).contains(&raw).then_some(Tier(raw))
    }

    /// Boundary constructor for untrusted data (snapshot restore): clamps
    /// into range instead of failing.
    pub fn clamped(raw: u8) -> Tier {
        Tier(raw.clamp(1, MAX_TIER))
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Merge result tier; `None` at the terminal tier.
    pub fn next(self) -> Option<Tier> {
        Tier::new(self.0 + 1)
    }

    #[inline]
    pub fn is_max(self) -> bool {
        self.0 == MAX_TIER
    }

    /// Zero-based index into per-tier lookup arrays.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TierInfo {
    pub radius: f32,
    pub base_mass: f32,
}

/// Precomputed radius/mass lookup, built once at startup. Radius grows
/// linearly with tier; mass shrinks exponentially (small spheres are heavy,
/// large spheres are light) with base 1.5.
#[derive(Resource, Debug, Clone)]
pub struct TierTable {
    entries: [TierInfo; MAX_TIER as usize],
}

impl TierTable {
    pub fn from_config(cfg: &TiersConfig) -> Self {
        let entries = std::array::from_fn(|i| {
            let tier = i as u8 + 1;
            TierInfo {
                radius: cfg.base_radius + i as f32 * cfg.radius_step,
                base_mass: cfg.mass_unit * cfg.mass_base.powi((MAX_TIER - tier) as i32),
            }
        });
        Self { entries }
    }

    /// Unscaled radius for a tier.
    #[inline]
    pub fn radius(&self, tier: Tier) -> f32 {
        self.entries[tier.index()].radius
    }

    /// Unscaled mass for a tier.
    #[inline]
    pub fn base_mass(&self, tier: Tier) -> f32 {
        self.entries[tier.index()].base_mass
    }
}

impl FromWorld for TierTable {
    fn from_world(world: &mut World) -> Self {
        let tiers = world
            .get_resource::<crate::core::config::GameConfig>()
            .map(|cfg| cfg.tiers.clone())
            .unwrap_or_default();
        TierTable::from_config(&tiers)
    }
}

/// Global gameplay scale factor keyed by the selected flask size. Applies
/// multiplicatively to every sphere's radius and mass; the arena itself does
/// not change.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct BallScale(pub f32);

impl BallScale {
    pub const ALLOWED: [f32; 3] = [1.0, 0.75, 0.5];

    pub fn is_allowed(factor: f32) -> bool {
        Self::ALLOWED.iter().any(|a| (a - factor).abs() < 1e-6)
    }
}

impl Default for BallScale {
    fn default() -> Self {
        BallScale(1.0)
    }
}
