use bevy::prelude::*;

use crate::core::tier::Tier;
use crate::gameplay::snapshot::SnapshotData;

/// Fired once per completed merge; the external progression collaborator
/// scores it. The core never computes score itself.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct MergeCompleted {
    /// Tier of the sphere the merge produced.
    pub tier: Tier,
    pub position: Vec2,
}

/// Fired at most once per play session. Further stepping is blocked until an
/// external [`ResetGame`] arrives.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct GameOverEvent;

/// The only player-facing control surface the core exposes. Produced by the
/// pointer plugin or sent directly by headless callers.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum DropCommand {
    BeginDrag(f32),
    UpdateDrag(f32),
    Release,
}

/// Flask-size selection: accepted factors are 1.0, 0.75 and 0.5. Idempotent
/// when unchanged; anything else is warned about and ignored.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SetBallScale(pub f32);

/// Re-seed the live set from a persisted snapshot. Existing released spheres
/// are cleared first so a restore is a full replacement, not an overlay.
#[derive(Event, Debug, Clone)]
pub struct RestoreSnapshot(pub SnapshotData);

/// External reset after game over (or at any time): clears every sphere and
/// returns to a fresh playing session.
#[derive(Event, Debug, Default, Clone, Copy)]
pub struct ResetGame;
