use bevy::prelude::*;

/// Simulation lifecycle state. While not `Playing`, the physics pipeline is
/// halted and no merges, spawns or danger escalation happen; `GameOver` is
/// only left through an external [`crate::gameplay::events::ResetGame`].
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameplayState {
    #[default]
    Playing,
    Paused,
    GameOver,
}
