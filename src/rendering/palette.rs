use bevy::prelude::*;

use crate::core::tier::{Tier, MAX_TIER};

/// One color per tier, low ranks warm and high ranks cold so a stack reads
/// at a glance.
pub const TIER_COLORS: [Color; MAX_TIER as usize] = [
    Color::srgb(1.0, 0.30, 0.30),  // 1  coral red
    Color::srgb(1.0, 0.55, 0.15),  // 2  orange
    Color::srgb(1.0, 0.80, 0.20),  // 3  amber
    Color::srgb(0.85, 0.95, 0.25), // 4  lime
    Color::srgb(0.40, 0.85, 0.35), // 5  green
    Color::srgb(0.20, 0.80, 0.65), // 6  teal
    Color::srgb(0.15, 0.70, 0.95), // 7  sky
    Color::srgb(0.25, 0.45, 1.0),  // 8  blue
    Color::srgb(0.50, 0.35, 0.95), // 9  violet
    Color::srgb(0.75, 0.30, 0.90), // 10 purple
    Color::srgb(0.95, 0.35, 0.75), // 11 magenta
    Color::srgb(0.98, 0.92, 0.80), // 12 pearl
];

#[inline]
pub fn color_for_tier(tier: Tier) -> Color {
    TIER_COLORS[tier.index()]
}
