use bevy::prelude::*;

use crate::core::components::{CurrentDrop, Sphere};
use crate::core::config::GameConfig;
use crate::gameplay::danger::DangerState;
use crate::gameplay::merge::PendingMergeSet;

/// Periodic one-line simulation stats, mirroring what an on-screen HUD
/// would show.
pub struct DebugStatsPlugin;

#[derive(Resource, Deref, DerefMut)]
struct StatsTimer(Timer);

impl Plugin for DebugStatsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(StatsTimer(Timer::from_seconds(1.0, TimerMode::Repeating)))
            .add_systems(Update, log_sim_stats);
    }
}

fn log_sim_stats(
    time: Res<Time>,
    cfg: Res<GameConfig>,
    mut timer: ResMut<StatsTimer>,
    danger: Option<Res<DangerState>>,
    pending: Option<Res<PendingMergeSet>>,
    spheres: Query<(), (With<Sphere>, Without<CurrentDrop>)>,
) {
    timer.tick(time.delta());
    if !timer.just_finished() {
        return;
    }
    let now = time.elapsed_secs();
    let overflow = danger
        .as_ref()
        .and_then(|d| d.seconds_left(now, cfg.danger.game_over_after))
        .map(|s| format!("{s:.1}s to overflow"))
        .unwrap_or_else(|| "clear".into());
    info!(
        "SIM t={:.1}s spheres={} pending_merges={} danger={}",
        now,
        spheres.iter().count(),
        pending.as_ref().map(|p| p.0.len()).unwrap_or(0),
        overflow
    );
}
